//! Explicit context threaded through configuration init.

use std::path::PathBuf;
use std::sync::Arc;

use crate::PluginRegistry;

/// Plugin registry and classpath handed to `ConfigTree::init`.
///
/// The context is stored on the tree as a plain field. Nothing reads it
/// from global state.
#[derive(Debug, Clone, Default)]
pub struct InitContext {
    registry: Arc<PluginRegistry>,
    classpath: Vec<PathBuf>,
}

impl InitContext {
    pub fn new(registry: PluginRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            classpath: Vec::new(),
        }
    }

    pub fn with_classpath(mut self, classpath: Vec<PathBuf>) -> Self {
        self.classpath = classpath;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn classpath(&self) -> &[PathBuf] {
        &self.classpath
    }

    /// Append a classpath entry unless it is already present.
    pub fn add_classpath(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.classpath.contains(&path) {
            self.classpath.push(path);
        }
    }
}
