//! Print resolved variables.

use anyhow::{Result, bail};
use srcgen_config::ScopeNode;
use std::collections::BTreeMap;

pub fn print(config_path: &str, root_dir: Option<&str>, project: Option<&str>) -> Result<()> {
    let tree = super::load(config_path, root_dir)?;

    let vars = match project {
        Some(name) => match tree.find_project(name) {
            Some(project) => project.var_map(),
            None => bail!("Project not found: {}", name),
        },
        None => tree.var_map(),
    };

    let sorted: BTreeMap<_, _> = vars.iter().collect();
    for (name, value) in sorted {
        println!("{} = {}", name, value);
    }
    Ok(())
}
