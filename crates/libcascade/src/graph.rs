use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::{CascadeError, Result};

/// Name of a git branch. Compared by exact string equality, never normalised.
pub type BranchName = String;

/// Default location of the branch configuration, relative to the repository root.
pub const DEFAULT_CONFIG_FILE: &str = "branch-config.json";

/// Directed parent → children relationships between branches.
///
/// Children keep the order in which the configuration declares them. The
/// graph is not checked for cycles, self references or dangling children;
/// the traversal tolerates all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchGraph {
    /// Direct children of each parent branch.
    children: HashMap<BranchName, Vec<BranchName>>,
}

impl BranchGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `children` for `parent`, replacing any earlier declaration.
    pub fn insert<I, S>(&mut self, parent: impl Into<BranchName>, children: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<BranchName>,
    {
        self.children.insert(
            parent.into(),
            children.into_iter().map(Into::into).collect(),
        );
    }

    /// Direct children of `branch`; branches absent from the graph are leaves.
    pub fn children(&self, branch: &str) -> &[BranchName] {
        self.children.get(branch).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reject empty names and names git would read as an option.
    fn check_names(&self) -> std::result::Result<(), String> {
        let names = self
            .children
            .iter()
            .flat_map(|(parent, children)| std::iter::once(parent).chain(children));
        for name in names {
            if name.is_empty() || name.starts_with('-') {
                return Err(format!("invalid branch name {name:?}"));
            }
        }
        Ok(())
    }

    /// True when no branch declares any children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

impl<P, C> FromIterator<(P, Vec<C>)> for BranchGraph
where
    P: Into<BranchName>,
    C: Into<BranchName>,
{
    fn from_iter<T: IntoIterator<Item = (P, Vec<C>)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (parent, children) in iter {
            graph.insert(parent, children);
        }
        graph
    }
}

/// On-disk shape of the configuration document.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    /// Parent → children mapping; absent means nothing to cascade.
    #[serde(default)]
    branches: BranchGraph,
}

/// Serialisation format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `{"branches": {"main": ["dev"]}}`
    Json,
    /// `[branches]` table with `main = ["dev"]` entries.
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension, defaulting to JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::Toml,
            _ => Self::Json,
        }
    }

    /// Parse `contents` into a branch graph.
    pub fn parse(self, contents: &str) -> std::result::Result<BranchGraph, String> {
        let config: ConfigFile = match self {
            Self::Json => serde_json::from_str(contents).map_err(|e| e.to_string())?,
            Self::Toml => toml::from_str(contents).map_err(|e| e.to_string())?,
        };
        config.branches.check_names()?;
        Ok(config.branches)
    }
}

/// Load the branch graph from `path`.
///
/// A missing file yields [`CascadeError::ConfigMissing`], which callers treat
/// as "nothing to do" rather than a failure.
pub fn load(path: &Path) -> Result<BranchGraph> {
    if !path.exists() {
        return Err(CascadeError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path)?;
    ConfigFormat::from_path(path)
        .parse(&contents)
        .map_err(|message| CascadeError::Config {
            path: PathBuf::from(path),
            message,
        })
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn parse_json_preserves_child_order() {
        let graph = ConfigFormat::Json
            .parse(r#"{"branches": {"main": ["staging"], "staging": ["feature-y", "feature-x"]}}"#)
            .unwrap();

        assert_eq!(graph.children("main"), ["staging"]);
        assert_eq!(graph.children("staging"), ["feature-y", "feature-x"]);
        assert!(graph.children("feature-x").is_empty());
    }

    #[test]
    fn unknown_branch_is_leaf() {
        let graph: BranchGraph = [("main", vec!["dev"])].into_iter().collect();
        assert!(graph.children("dev").is_empty());
        assert!(graph.children("nope").is_empty());
    }

    #[test]
    fn missing_branches_key_is_empty_graph() {
        let graph = ConfigFormat::Json.parse(r#"{"other": 1}"#).unwrap();
        assert!(graph.is_empty());
    }

    #[test]
    fn cycles_are_accepted() {
        let graph = ConfigFormat::Json
            .parse(r#"{"branches": {"a": ["b"], "b": ["a", "b"]}}"#)
            .unwrap();
        assert_eq!(graph.children("b"), ["a", "b"]);
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let err = ConfigFormat::Json
            .parse(r#"{"branches": {"main": ["dev", 3]}}"#)
            .unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn option_like_names_are_rejected() {
        let err = ConfigFormat::Json
            .parse(r#"{"branches": {"main": ["dev", "-f"]}}"#)
            .unwrap_err();
        assert!(err.contains("\"-f\""), "{err}");

        assert!(
            ConfigFormat::Toml
                .parse("[branches]\n\"--force\" = [\"dev\"]\n")
                .is_err()
        );
        assert!(
            ConfigFormat::Json
                .parse(r#"{"branches": {"main": [""]}}"#)
                .is_err()
        );
    }

    #[test]
    fn parse_toml() {
        let graph = ConfigFormat::Toml
            .parse("[branches]\nmain = [\"dev\"]\ndev = [\"feature\"]\n")
            .unwrap();
        assert_eq!(graph.children("main"), ["dev"]);
        assert_eq!(graph.children("dev"), ["feature"]);
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("branch-config.json")),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("cascade.TOML")),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("branches")),
            ConfigFormat::Json
        );
    }

    #[test]
    fn load_missing_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);

        let err = load(&path).unwrap_err();
        assert!(matches!(err, CascadeError::ConfigMissing { .. }));
        assert_eq!(err.exit_code(), 0);
    }

    #[test]
    fn load_invalid_file() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, "{not json").unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, CascadeError::Config { .. }));
    }

    #[test]
    fn load_from_disk() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join(DEFAULT_CONFIG_FILE);
        fs::write(&path, r#"{"branches": {"main": ["dev"]}}"#).unwrap();

        let graph = load(&path).unwrap();
        assert_eq!(graph.children("main"), ["dev"]);
    }
}
