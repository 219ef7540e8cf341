//! Configuration model for the srcgen source generation pipeline.
//!
//! This crate handles:
//! - `${name}` variable resolution with cycle detection
//! - Variable scopes cascading from the root to every node
//! - Projects, folders, parsers, generators, artifacts and targets
//! - Binding generated files to project folders
//! - Parsing the KDL configuration file

pub mod binder;
pub mod classpath;
pub mod document;
pub mod error;
pub mod generator;
pub mod parsers;
pub mod project;
pub mod scope;
pub mod tree;
pub mod variables;

pub use binder::{BindingContext, BindingError, TargetBinding};
pub use classpath::{Classpath, ClasspathEntry, ClasspathKind};
pub use document::{load_config, parse_config};
pub use error::{ConfigError, ConfigResult};
pub use generator::{Artifact, GeneratorConfig, Generators, Routing, RoutingNode, Target};
pub use parsers::{ParserConfig, Parsers};
pub use project::{Folder, Project};
pub use scope::{Named, Scope, ScopeNode};
pub use tree::{ConfigTree, ROOT_DIR_VAR};
pub use variables::{Resolution, Variable, VariableSource, replace_vars, resolve};
