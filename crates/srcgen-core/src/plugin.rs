//! Parser and generator plugin capabilities.
//!
//! Plugins are looked up by the identifier configured in the `class`
//! attribute of a parser or generator entry. The surrounding system
//! registers a factory per identifier up front.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::{Error, Result};

/// Kind of plugin, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum PluginKind {
    #[display("parser")]
    Parser,
    #[display("generator")]
    Generator,
}

/// Fully substituted configuration handed to a plugin on initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginSettings {
    /// Configured entry name.
    pub name: String,
    /// Identifier the plugin was registered under.
    pub class_name: String,
    /// Free-form plugin properties.
    pub properties: BTreeMap<String, String>,
    /// Resolved variables visible to the configuration entry.
    pub variables: HashMap<String, String>,
}

impl PluginSettings {
    /// Look up a property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Type-erased result of a parser run, consumed by generators.
#[derive(Clone)]
pub struct Model(Arc<dyn Any + Send + Sync>);

impl Model {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model").finish_non_exhaustive()
    }
}

/// A parser turns some input into a model.
pub trait ParserPlugin: Send {
    /// Apply the configuration. Called once before `parse`.
    fn initialize(&mut self, settings: &PluginSettings) -> Result<()>;

    /// Parse the configured input.
    fn parse(&mut self) -> Result<Model>;
}

/// A generator produces artifacts from a parsed model.
pub trait GeneratorPlugin: Send {
    /// Apply the configuration. Called once before `generate`.
    fn initialize(&mut self, settings: &PluginSettings) -> Result<()>;

    /// Generate artifacts. `incremental` is set when only changed input
    /// should be regenerated.
    fn generate(&mut self, model: &Model, incremental: bool) -> Result<()>;
}

type ParserFactory = Box<dyn Fn() -> Box<dyn ParserPlugin> + Send + Sync>;
type GeneratorFactory = Box<dyn Fn() -> Box<dyn GeneratorPlugin> + Send + Sync>;

/// Factories for plugins keyed by their configured identifier.
#[derive(Default)]
pub struct PluginRegistry {
    parsers: HashMap<String, ParserFactory>,
    generators: HashMap<String, GeneratorFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser factory, replacing any factory with the same id.
    pub fn register_parser<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ParserPlugin> + Send + Sync + 'static,
    {
        self.parsers.insert(id.into(), Box::new(factory));
    }

    /// Register a generator factory, replacing any factory with the same id.
    pub fn register_generator<F>(&mut self, id: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn GeneratorPlugin> + Send + Sync + 'static,
    {
        self.generators.insert(id.into(), Box::new(factory));
    }

    pub fn create_parser(&self, id: &str) -> Result<Box<dyn ParserPlugin>> {
        let factory = self.parsers.get(id).ok_or_else(|| Error::PluginNotFound {
            kind: PluginKind::Parser,
            id: id.to_string(),
        })?;
        debug!(id, "Creating parser plugin");
        Ok(factory())
    }

    pub fn create_generator(&self, id: &str) -> Result<Box<dyn GeneratorPlugin>> {
        let factory = self
            .generators
            .get(id)
            .ok_or_else(|| Error::PluginNotFound {
                kind: PluginKind::Generator,
                id: id.to_string(),
            })?;
        debug!(id, "Creating generator plugin");
        Ok(factory())
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parsers: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        let mut generators: Vec<&str> = self.generators.keys().map(String::as_str).collect();
        parsers.sort_unstable();
        generators.sort_unstable();
        f.debug_struct("PluginRegistry")
            .field("parsers", &parsers)
            .field("generators", &generators)
            .finish()
    }
}
