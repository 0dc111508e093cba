use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Deployment stage selected by the `<PREFIX>ENV` variable.
///
/// Each stage maps to its own YAML defaults file on the setup builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Dev,
    Stage,
    Prod,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Dev, Stage::Stage, Stage::Prod];

    /// Short name, as written in the selector variable.
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Dev => "dev",
            Stage::Stage => "stage",
            Stage::Prod => "prod",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a selector value names none of the known stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStage(pub String);

impl FromStr for Stage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" | "development" => Ok(Stage::Dev),
            "stage" | "staging" => Ok(Stage::Stage),
            "prod" | "production" => Ok(Stage::Prod),
            other => Err(UnknownStage(other.to_string())),
        }
    }
}

/// A config operation, independent of any CLI framework.
/// The CLI layer converts parsed clap args into this.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigAction {
    List,
    Gen { output: Option<PathBuf> },
    Get { key: String },
}
