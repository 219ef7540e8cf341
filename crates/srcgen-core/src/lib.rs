//! Core capabilities for the srcgen source generation pipeline.
//!
//! This crate contains:
//! - Parser and generator plugin traits
//! - The plugin registry that replaces class-name based instantiation
//! - The explicit init context threaded through configuration init

pub mod context;
pub mod error;
pub mod plugin;

pub use context::InitContext;
pub use error::{Error, Result};
pub use plugin::{
    GeneratorPlugin, Model, ParserPlugin, PluginKind, PluginRegistry, PluginSettings,
};
