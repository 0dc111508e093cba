//! Secret masking for values that end up in listings, logs and JSON.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Width of a masked [`SafeString`].
pub const MASK_WIDTH: usize = 20;

/// Upper bound on trailing characters a masked [`SafeString`] reveals.
pub const MASK_UNMASKED: usize = 5;

/// Mask `s` to a fixed width.
///
/// Reveals at most `min(len / 3, unmasked)` trailing characters and pads the
/// head with `mask_by` up to `width` characters, so the output length does not
/// leak the secret's length. An empty input stays empty.
pub fn fixed_width(s: &str, mask_by: char, width: usize, unmasked: usize) -> String {
    if s.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = s.chars().collect();
    let shown = (chars.len() / 3).min(unmasked);
    let tail: String = chars[chars.len() - shown..].iter().collect();

    let mut out: String = std::iter::repeat_n(mask_by, width.saturating_sub(shown)).collect();
    out.push_str(&tail);
    out
}

/// A string that masks itself when serialized or debug-printed.
///
/// `Display` and [`as_str`](Self::as_str) still give the raw value, since the
/// application needs it to connect to things.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn masked(&self) -> String {
        fixed_width(&self.0, '*', MASK_WIDTH, MASK_UNMASKED)
    }
}

impl From<String> for SafeString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SafeString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SafeString({:?})", self.masked())
    }
}

impl Serialize for SafeString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.masked())
    }
}
