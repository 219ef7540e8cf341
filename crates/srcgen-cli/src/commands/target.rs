//! Resolve the output directory of an artifact.

use anyhow::{Context, Result};
use srcgen_config::ConfigTree;
use std::path::PathBuf;
use tracing::info;

pub fn print(
    config_path: &str,
    root_dir: Option<&str>,
    generator: &str,
    artifact: &str,
    path: Option<&str>,
) -> Result<()> {
    let tree = super::load(config_path, root_dir)?;
    let dir = target_dir(&tree, generator, artifact, path)?;
    println!("{}", dir.display());
    Ok(())
}

/// Bind the artifact once and build its directory from the binding.
fn target_dir(
    tree: &ConfigTree,
    generator: &str,
    artifact: &str,
    path: Option<&str>,
) -> Result<PathBuf> {
    let binding = tree
        .find_target(generator, artifact, path)
        .context("Failed to bind artifact")?;
    info!(
        project = %binding.project.name,
        folder = %binding.folder.name,
        "Artifact bound"
    );

    let root = tree
        .root_dir()
        .context("Configuration has no root directory")?;
    Ok(binding.folder.directory(&binding.project.directory(root)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use srcgen_config::parse_config;
    use srcgen_core::InitContext;
    use std::path::Path;

    const CONFIG: &str = r#"
        project "app" path="app" maven=#true {
            folder "abstract" path="gen/abstract"
        }
        generators project="app" folder="genMainJava" {
            generator "gen" class="gen" {
                artifact "model" {
                    target pattern="Abstract" folder="abstract"
                }
            }
        }
    "#;

    #[test]
    fn test_target_dir_from_binding() {
        let mut tree = parse_config(CONFIG).unwrap();
        tree.init(InitContext::default(), "/work").unwrap();

        assert_eq!(
            target_dir(&tree, "gen", "model", Some("a/AbstractFoo.java")).unwrap(),
            Path::new("/work/app/gen/abstract")
        );
        assert_eq!(
            target_dir(&tree, "gen", "model", Some("a/Foo.java")).unwrap(),
            tree.find_target_dir("gen", "model", Some("a/Foo.java")).unwrap()
        );
    }

    #[test]
    fn test_target_dir_unknown_artifact() {
        let mut tree = parse_config(CONFIG).unwrap();
        tree.init(InitContext::default(), "/work").unwrap();

        let err = target_dir(&tree, "gen", "missing", None).unwrap_err();
        assert!(format!("{:#}", err).contains("artifact not found"));
    }
}
