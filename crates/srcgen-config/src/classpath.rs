//! Extra classpath entries the plugins are loaded from.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::ConfigResult;
use crate::scope::{Scope, ScopeNode, scope_node};
use crate::variables::Variable;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClasspathKind {
    /// A directory of compiled classes.
    #[default]
    Bin,
    /// A single archive.
    Jar,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClasspathEntry {
    pub kind: ClasspathKind,
    pub path: String,
    #[serde(flatten)]
    scope: Scope,
}

impl ClasspathEntry {
    pub fn new(kind: ClasspathKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            scope: Scope::default(),
        }
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.path);
        Ok(())
    }

    pub fn resolve(&self, root_dir: &Path) -> PathBuf {
        root_dir.join(&self.path)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Classpath {
    pub entries: Vec<ClasspathEntry>,
    #[serde(flatten)]
    scope: Scope,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(mut self, entry: ClasspathEntry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        for entry in &mut self.entries {
            entry.init(self.scope.var_map())?;
        }
        Ok(())
    }

    /// Entry paths resolved against `root_dir`.
    pub fn paths(&self, root_dir: &Path) -> Vec<PathBuf> {
        self.entries.iter().map(|e| e.resolve(root_dir)).collect()
    }
}

scope_node!(ClasspathEntry, Classpath);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_resolve_against_root() {
        let mut classpath = Classpath::new()
            .with_variable(Variable::new("lib", "lib"))
            .with_entry(ClasspathEntry::new(ClasspathKind::Jar, "${lib}/gen.jar"))
            .with_entry(ClasspathEntry::new(ClasspathKind::Bin, "/abs/classes"));
        classpath.init(&HashMap::new()).unwrap();

        assert_eq!(
            classpath.paths(Path::new("/work")),
            vec![PathBuf::from("/work/lib/gen.jar"), PathBuf::from("/abs/classes")]
        );
    }
}
