//! CLI command implementations.

pub mod target;
pub mod vars;

use anyhow::{Context, Result};
use srcgen_config::{ConfigTree, load_config};
use srcgen_core::InitContext;
use std::path::{Path, PathBuf};

/// Load and initialize the configuration.
pub fn load(config_path: &str, root_dir: Option<&str>) -> Result<ConfigTree> {
    let mut tree = load_config(config_path)
        .with_context(|| format!("Failed to parse config file: {}", config_path))?;

    let root_dir = match root_dir {
        Some(dir) => PathBuf::from(dir),
        None => config_dir(config_path)?,
    };

    tree.init(InitContext::default(), root_dir)
        .with_context(|| format!("Failed to initialize config: {}", config_path))?;
    Ok(tree)
}

/// Directory containing the config file, or the current directory.
fn config_dir(config_path: &str) -> Result<PathBuf> {
    Path::new(config_path)
        .parent()
        .map(|p| {
            if p.as_os_str().is_empty() {
                Path::new(".")
            } else {
                p
            }
        })
        .unwrap_or(Path::new("."))
        .canonicalize()
        .context("Failed to resolve root directory")
}

pub fn validate(config_path: &str, root_dir: Option<&str>) -> Result<()> {
    match load(config_path, root_dir) {
        Ok(_tree) => {
            println!("Configuration is valid");
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {:#}", e);
            std::process::exit(1);
        }
    }
}

pub fn show(config_path: &str, root_dir: Option<&str>) -> Result<()> {
    let tree = load(config_path, root_dir)?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use srcgen_config::ScopeNode;

    const CONFIG: &str = r#"
        variable "out" "${rootDir}/out"
        project "app" path="app" maven=#true
        generators project="app" folder="genMainJava" {
            generator "gen" class="gen" {
                artifact "model"
            }
        }
    "#;

    #[test]
    fn test_load_defaults_root_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srcgen.kdl");
        std::fs::write(&path, CONFIG).unwrap();

        let tree = load(path.to_str().unwrap(), None).unwrap();
        let root = dir.path().canonicalize().unwrap();
        assert_eq!(tree.root_dir(), Some(root.as_path()));
        assert_eq!(
            tree.var_map()["out"],
            format!("{}/out", root.display())
        );
        assert_eq!(
            tree.find_target_dir("gen", "model", None).unwrap(),
            root.join("app").join("src-gen/main/java")
        );
    }

    #[test]
    fn test_load_with_explicit_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srcgen.kdl");
        std::fs::write(&path, CONFIG).unwrap();

        let tree = load(path.to_str().unwrap(), Some("/elsewhere")).unwrap();
        assert_eq!(tree.var_map()["out"], "/elsewhere/out");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load("/no/such/srcgen.kdl", None).is_err());
    }
}
