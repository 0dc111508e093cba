//! Ancestor file lookup for the local override file.
//!
//! The search starts in a directory (the current working directory by default)
//! and walks up one parent at a time, checking `{dir}/{name}` at each level:
//!
//! ```text
//! depth 0   ./name
//! depth 1   ../name
//! depth 2   ../../name
//! ...       up to `depth` levels, or the filesystem root
//! ```
//!
//! The first candidate that opens and is a regular file wins, so the closest
//! ancestor shadows any further up. Directories named like the target are
//! skipped.

use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::DeployfigError;

/// Default number of parent directories searched for the override file.
pub const LOOKUP_DEPTH_DEFAULT: usize = 6;

/// Find `name` in the current working directory or one of its `depth` ancestors.
pub fn find_file(name: &str, depth: usize) -> Result<PathBuf, DeployfigError> {
    let cwd = std::env::current_dir().map_err(DeployfigError::CurrentDir)?;
    find_file_from(&cwd, name, depth)
}

/// Like [`find_file`] but starting from an explicit directory instead of CWD.
pub fn find_file_from(start: &Path, name: &str, depth: usize) -> Result<PathBuf, DeployfigError> {
    let not_found = || DeployfigError::NotFound {
        name: name.to_string(),
        depth,
    };
    if name.is_empty() {
        return Err(not_found());
    }

    candidates(start, name, depth)
        .find(|path| is_regular_file(path))
        .ok_or_else(not_found)
}

/// Candidate paths in increasing depth order. Yields fewer than `depth + 1`
/// entries when the root is reached first.
fn candidates<'a>(
    start: &'a Path,
    name: &'a str,
    depth: usize,
) -> impl Iterator<Item = PathBuf> + 'a {
    start
        .ancestors()
        .take(depth.saturating_add(1))
        .map(move |dir| dir.join(name))
}

fn is_regular_file(path: &Path) -> bool {
    File::open(path)
        .and_then(|f| f.metadata())
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// `root/a/b/c`, returned deepest-first: [c, b, a, root].
    fn tree(root: &TempDir) -> Vec<PathBuf> {
        let c = root.path().join("a").join("b").join("c");
        fs::create_dir_all(&c).unwrap();
        c.ancestors().take(4).map(Path::to_path_buf).collect()
    }

    #[test]
    fn finds_file_in_start_dir() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        fs::write(dirs[0].join(".env"), "A=1\n").unwrap();

        let found = find_file_from(&dirs[0], ".env", 0).unwrap();
        assert_eq!(found, dirs[0].join(".env"));
    }

    #[test]
    fn finds_file_at_each_depth_within_limit() {
        for k in 0..4 {
            let root = TempDir::new().unwrap();
            let dirs = tree(&root);
            fs::write(dirs[k].join(".env"), "A=1\n").unwrap();

            for d in k..4 {
                let found = find_file_from(&dirs[0], ".env", d).unwrap();
                assert_eq!(found, dirs[k].join(".env"), "file at depth {k}, limit {d}");
            }
        }
    }

    #[test]
    fn file_beyond_depth_is_not_found() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        fs::write(dirs[3].join(".env"), "A=1\n").unwrap();

        let err = find_file_from(&dirs[0], ".env", 2).unwrap_err();
        match err {
            DeployfigError::NotFound { name, depth } => {
                assert_eq!(name, ".env");
                assert_eq!(depth, 2);
            }
            other => panic!("Expected NotFound, got: {other:?}"),
        }
    }

    #[test]
    fn closest_ancestor_wins() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        fs::write(dirs[1].join(".env"), "NEAR=1\n").unwrap();
        fs::write(dirs[3].join(".env"), "FAR=1\n").unwrap();

        let found = find_file_from(&dirs[0], ".env", 6).unwrap();
        assert_eq!(found, dirs[1].join(".env"));
    }

    #[test]
    fn directory_with_target_name_is_skipped() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        fs::create_dir(dirs[0].join(".env")).unwrap();
        fs::write(dirs[2].join(".env"), "A=1\n").unwrap();

        let found = find_file_from(&dirs[0], ".env", 6).unwrap();
        assert_eq!(found, dirs[2].join(".env"));
        assert!(found.is_file());
    }

    #[test]
    fn only_directories_means_not_found() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        fs::create_dir(dirs[0].join(".env")).unwrap();

        let result = find_file_from(&dirs[0], ".env", 0);
        assert!(matches!(result, Err(DeployfigError::NotFound { .. })));
    }

    #[test]
    fn empty_name_is_not_found() {
        let root = TempDir::new().unwrap();
        let result = find_file_from(root.path(), "", 3);
        assert!(matches!(result, Err(DeployfigError::NotFound { .. })));
    }

    #[test]
    fn walk_stops_at_filesystem_root() {
        let root = TempDir::new().unwrap();
        let result = find_file_from(root.path(), "deployfig-surely-missing.env", usize::MAX);
        assert!(matches!(result, Err(DeployfigError::NotFound { .. })));
    }

    #[test]
    fn candidates_are_in_increasing_depth_order() {
        let root = TempDir::new().unwrap();
        let dirs = tree(&root);
        let paths: Vec<PathBuf> = candidates(&dirs[0], "x", 2).collect();
        assert_eq!(
            paths,
            vec![dirs[0].join("x"), dirs[1].join("x"), dirs[2].join("x")]
        );
    }
}
