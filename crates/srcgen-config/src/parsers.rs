//! Configured parser plugins.

use serde::Serialize;
use srcgen_core::{InitContext, ParserPlugin, PluginSettings};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::ConfigResult;
use crate::scope::{Named, Scope, ScopeNode, find_by_name, name_identity, scope_node};
use crate::variables::Variable;

#[derive(Debug, Clone, Default, Serialize)]
pub struct ParserConfig {
    pub name: String,
    /// Identifier the plugin is registered under.
    pub class_name: String,
    pub properties: BTreeMap<String, String>,
    #[serde(flatten)]
    scope: Scope,
}

impl ParserConfig {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.name);
        self.scope.replace_in_place(&mut self.class_name);
        for value in self.properties.values_mut() {
            self.scope.replace_in_place(value);
        }
        Ok(())
    }

    pub fn settings(&self) -> PluginSettings {
        PluginSettings {
            name: self.name.clone(),
            class_name: self.class_name.clone(),
            properties: self.properties.clone(),
            variables: self.scope.var_map().clone(),
        }
    }

    /// Create the plugin through the context's registry and initialize it.
    pub fn instantiate(&self, ctx: &InitContext) -> ConfigResult<Box<dyn ParserPlugin>> {
        let mut plugin = ctx.registry().create_parser(&self.class_name)?;
        plugin.initialize(&self.settings())?;
        debug!(parser = %self.name, class = %self.class_name, "Parser initialized");
        Ok(plugin)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Parsers {
    pub parsers: Vec<ParserConfig>,
    #[serde(flatten)]
    scope: Scope,
}

impl Parsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        for parser in &mut self.parsers {
            parser.init(self.scope.var_map())?;
        }
        Ok(())
    }

    pub fn find_parser(&self, name: &str) -> Option<&ParserConfig> {
        find_by_name(&self.parsers, name)
    }
}

impl Named for ParserConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

name_identity!(ParserConfig);
scope_node!(ParserConfig, Parsers);
