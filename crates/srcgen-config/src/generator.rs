//! Generators, their artifacts and target overrides.
//!
//! Each level may name the project and folder its output goes to. A level
//! that names neither falls back to its structural parent, up to the
//! generators list. The fallback is captured as the parent's [`Routing`]
//! while the tree is initialized.

use regex::Regex;
use serde::Serialize;
use srcgen_core::{GeneratorPlugin, InitContext, PluginSettings};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::scope::{Named, Scope, ScopeNode, find_by_name, name_identity, scope_node};
use crate::variables::Variable;
use crate::{ConfigError, ConfigResult};

/// A project/folder pair, either part possibly undefined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Routing {
    pub project: Option<String>,
    pub folder: Option<String>,
}

impl Routing {
    pub fn new(project: Option<&str>, folder: Option<&str>) -> Self {
        Self {
            project: project.map(str::to_string),
            folder: folder.map(str::to_string),
        }
    }
}

/// A node that may route output to a project folder.
pub trait RoutingNode {
    /// Project named on this node itself.
    fn project(&self) -> Option<&str>;

    /// Folder named on this node itself.
    fn folder(&self) -> Option<&str>;

    /// Defined routing of the structural parent.
    fn parent_routing(&self) -> &Routing;

    /// Own project, else the nearest one defined by an ancestor.
    ///
    /// `None` means no level defines one; `Some("")` is a defined empty name.
    fn def_project(&self) -> Option<&str> {
        self.project()
            .or_else(|| self.parent_routing().project.as_deref())
    }

    /// Own folder, else the nearest one defined by an ancestor.
    fn def_folder(&self) -> Option<&str> {
        self.folder()
            .or_else(|| self.parent_routing().folder.as_deref())
    }

    fn defined(&self) -> Routing {
        Routing::new(self.def_project(), self.def_folder())
    }
}

macro_rules! routing_node {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RoutingNode for $ty {
                fn project(&self) -> Option<&str> {
                    self.project.as_deref()
                }

                fn folder(&self) -> Option<&str> {
                    self.folder.as_deref()
                }

                fn parent_routing(&self) -> &Routing {
                    &self.parent
                }
            }
        )*
    };
}

/// Routes generated files whose path matches `pattern`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Target {
    /// Regular expression searched for anywhere in the file path.
    pub pattern: Option<String>,
    pub project: Option<String>,
    pub folder: Option<String>,
    #[serde(flatten)]
    scope: Scope,
    #[serde(skip)]
    parent: Routing,
    #[serde(skip)]
    regex: Option<Regex>,
}

impl Target {
    pub fn new(pattern: Option<&str>, project: Option<&str>, folder: Option<&str>) -> Self {
        Self {
            pattern: pattern.map(str::to_string),
            project: project.map(str::to_string),
            folder: folder.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>, routing: &Routing) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_opt_in_place(&mut self.pattern);
        self.scope.replace_opt_in_place(&mut self.project);
        self.scope.replace_opt_in_place(&mut self.folder);
        self.parent = routing.clone();

        self.regex = match &self.pattern {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                field: "target pattern".to_string(),
                message: format!("'{}': {}", pattern, e),
            })?),
            None => None,
        };
        Ok(())
    }

    /// True if no pattern is set, else whether the pattern is found in `path`.
    pub fn matches(&self, path: &str) -> bool {
        match (&self.regex, &self.pattern) {
            (Some(re), _) => re.is_match(path),
            (None, Some(pattern)) => Regex::new(pattern)
                .map(|re| re.is_match(path))
                .unwrap_or(false),
            (None, None) => true,
        }
    }
}

/// A kind of file a generator produces.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Artifact {
    pub name: String,
    pub project: Option<String>,
    pub folder: Option<String>,
    /// Checked in order, first match wins.
    pub targets: Vec<Target>,
    #[serde(flatten)]
    scope: Scope,
    #[serde(skip)]
    parent: Routing,
}

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_routing(mut self, project: Option<&str>, folder: Option<&str>) -> Self {
        self.project = project.map(str::to_string);
        self.folder = folder.map(str::to_string);
        self
    }

    pub fn with_target(mut self, target: Target) -> Self {
        self.targets.push(target);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>, routing: &Routing) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.name);
        self.scope.replace_opt_in_place(&mut self.project);
        self.scope.replace_opt_in_place(&mut self.folder);
        self.parent = routing.clone();

        let defined = self.defined();
        for target in &mut self.targets {
            target.init(self.scope.var_map(), &defined)?;
        }
        Ok(())
    }

    /// First target whose pattern matches `path`.
    pub fn find_target(&self, path: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.matches(path))
    }
}

/// A configured generator plugin.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratorConfig {
    pub name: String,
    /// Identifier the plugin is registered under.
    pub class_name: String,
    /// Parser whose model this generator consumes.
    pub parser: Option<String>,
    pub project: Option<String>,
    pub folder: Option<String>,
    pub properties: BTreeMap<String, String>,
    pub artifacts: Vec<Artifact>,
    #[serde(flatten)]
    scope: Scope,
    #[serde(skip)]
    parent: Routing,
}

impl GeneratorConfig {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            ..Self::default()
        }
    }

    pub fn with_routing(mut self, project: Option<&str>, folder: Option<&str>) -> Self {
        self.project = project.map(str::to_string);
        self.folder = folder.map(str::to_string);
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn with_artifact(mut self, artifact: Artifact) -> Self {
        self.artifacts.push(artifact);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>, routing: &Routing) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.name);
        self.scope.replace_in_place(&mut self.class_name);
        self.scope.replace_opt_in_place(&mut self.parser);
        self.scope.replace_opt_in_place(&mut self.project);
        self.scope.replace_opt_in_place(&mut self.folder);
        for value in self.properties.values_mut() {
            self.scope.replace_in_place(value);
        }
        self.parent = routing.clone();

        let defined = self.defined();
        for artifact in &mut self.artifacts {
            artifact.init(self.scope.var_map(), &defined)?;
        }
        Ok(())
    }

    pub fn find_artifact(&self, name: &str) -> Option<&Artifact> {
        find_by_name(&self.artifacts, name)
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
    pub fn instantiate(&self, ctx: &InitContext) -> ConfigResult<Box<dyn GeneratorPlugin>> {
        let mut plugin = ctx.registry().create_generator(&self.class_name)?;
        plugin.initialize(&self.settings())?;
        debug!(generator = %self.name, class = %self.class_name, "Generator initialized");
        Ok(plugin)
    }
}

/// The list of generators with the default routing for all of them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Generators {
    pub project: Option<String>,
    pub folder: Option<String>,
    pub generators: Vec<GeneratorConfig>,
    #[serde(flatten)]
    scope: Scope,
    #[serde(skip)]
    parent: Routing,
}

impl Generators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_routing(mut self, project: Option<&str>, folder: Option<&str>) -> Self {
        self.project = project.map(str::to_string);
        self.folder = folder.map(str::to_string);
        self
    }

    pub fn with_generator(mut self, generator: GeneratorConfig) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_opt_in_place(&mut self.project);
        self.scope.replace_opt_in_place(&mut self.folder);

        let defined = self.defined();
        for generator in &mut self.generators {
            generator.init(self.scope.var_map(), &defined)?;
        }
        Ok(())
    }

    pub fn find_generator(&self, name: &str) -> Option<&GeneratorConfig> {
        find_by_name(&self.generators, name)
    }
}

impl Named for Artifact {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for GeneratorConfig {
    fn name(&self) -> &str {
        &self.name
    }
}

name_identity!(Artifact, GeneratorConfig);
scope_node!(Target, Artifact, GeneratorConfig, Generators);
routing_node!(Target, Artifact, GeneratorConfig, Generators);
