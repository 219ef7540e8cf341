//! The root of a configuration.

use serde::Serialize;
use srcgen_core::InitContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::ConfigResult;
use crate::classpath::Classpath;
use crate::generator::{GeneratorConfig, Generators};
use crate::parsers::{ParserConfig, Parsers};
use crate::project::Project;
use crate::scope::{Scope, ScopeNode, find_by_name, scope_node};
use crate::variables::Variable;

/// Variable holding the root directory, injected by [`ConfigTree::init`].
pub const ROOT_DIR_VAR: &str = "rootDir";

/// Projects, parsers and generators of one source generation setup.
///
/// A tree is built first (usually by [`crate::parse_config`]) and then
/// initialized once with [`ConfigTree::init`], which substitutes all
/// variables in place. Lookups are only valid afterwards.
#[derive(Debug, Default, Serialize)]
pub struct ConfigTree {
    #[serde(flatten)]
    scope: Scope,
    pub classpath: Classpath,
    pub projects: Vec<Project>,
    pub parsers: Parsers,
    pub generators: Generators,
    root_dir: Option<PathBuf>,
    #[serde(skip)]
    context: InitContext,
    #[serde(skip)]
    initialized: bool,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn with_project(mut self, project: Project) -> Self {
        self.projects.push(project);
        self
    }

    pub fn with_parsers(mut self, parsers: Parsers) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn with_generators(mut self, generators: Generators) -> Self {
        self.generators = generators;
        self
    }

    pub fn with_classpath(mut self, classpath: Classpath) -> Self {
        self.classpath = classpath;
        self
    }

    /// Resolve all variables and substitute them throughout the tree.
    ///
    /// `root_dir` is available to every node as `${rootDir}`. The tree's
    /// classpath entries are appended to the context, which is then kept
    /// on the tree. Running init again gives the same result.
    pub fn init(&mut self, context: InitContext, root_dir: impl Into<PathBuf>) -> ConfigResult<()> {
        let root_dir = root_dir.into();
        self.initialized = false;

        self.scope
            .set_variable(Variable::new(ROOT_DIR_VAR, root_dir.display().to_string()));
        self.inherit_variables(&HashMap::new())?;
        debug!(count = self.scope.var_map().len(), "Resolved root variables");

        let vars = self.scope.var_map();
        self.classpath.init(vars)?;
        for project in &mut self.projects {
            project.init(vars)?;
        }
        self.parsers.init(vars)?;
        self.generators.init(vars)?;

        let mut context = context;
        for path in self.classpath.paths(&root_dir) {
            context.add_classpath(path);
        }
        self.context = context;
        self.root_dir = Some(root_dir);
        self.initialized = true;

        info!(
            projects = self.projects.len(),
            parsers = self.parsers.parsers.len(),
            generators = self.generators.generators.len(),
            "Configuration initialized"
        );
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Root directory passed to [`ConfigTree::init`].
    pub fn root_dir(&self) -> Option<&Path> {
        self.root_dir.as_deref()
    }

    pub fn context(&self) -> &InitContext {
        &self.context
    }

    pub fn find_project(&self, name: &str) -> Option<&Project> {
        find_by_name(&self.projects, name)
    }

    pub fn find_parser(&self, name: &str) -> Option<&ParserConfig> {
        self.parsers.find_parser(name)
    }

    pub fn find_generator(&self, name: &str) -> Option<&GeneratorConfig> {
        self.generators.find_generator(name)
    }

    /// Generators consuming the model of the named parser.
    pub fn generators_for_parser<'a>(
        &'a self,
        parser: &'a str,
    ) -> impl Iterator<Item = &'a GeneratorConfig> + 'a {
        self.generators
            .generators
            .iter()
            .filter(move |g| g.parser.as_deref() == Some(parser))
    }
}

scope_node!(ConfigTree);
