//! Projects and their folders.

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::scope::{Named, Scope, ScopeNode, contains_name, find_by_name, name_identity, scope_node};
use crate::variables::Variable;
use crate::{ConfigError, ConfigResult};

pub const MAIN_JAVA: &str = "mainJava";
pub const MAIN_RES: &str = "mainRes";
pub const GEN_MAIN_JAVA: &str = "genMainJava";
pub const GEN_MAIN_RES: &str = "genMainRes";
pub const TEST_JAVA: &str = "testJava";
pub const TEST_RES: &str = "testRes";
pub const GEN_TEST_JAVA: &str = "genTestJava";
pub const GEN_TEST_RES: &str = "genTestRes";

/// Standard maven layout: name, path, and whether the folder holds generated files.
const MAVEN_FOLDERS: [(&str, &str, bool); 8] = [
    (MAIN_JAVA, "src/main/java", false),
    (MAIN_RES, "src/main/resources", false),
    (GEN_MAIN_JAVA, "src-gen/main/java", true),
    (GEN_MAIN_RES, "src-gen/main/resources", true),
    (TEST_JAVA, "src/test/java", false),
    (TEST_RES, "src/test/resources", false),
    (GEN_TEST_JAVA, "src-gen/test/java", true),
    (GEN_TEST_RES, "src-gen/test/resources", true),
];

/// A directory inside a project that generated files are written to.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Folder {
    pub name: String,
    /// Relative to the project directory unless absolute.
    pub path: String,
    /// Create the directory if it does not exist.
    pub create: bool,
    /// Overwrite existing files.
    pub override_existing: bool,
    /// Remove stale files before generating.
    pub clean: bool,
    /// Files matching this pattern survive cleaning.
    pub clean_exclude: Option<String>,
    #[serde(flatten)]
    scope: Scope,
    #[serde(skip)]
    clean_exclude_regex: Option<Regex>,
}

impl Folder {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Folder for generated output: created, overwritten and cleaned.
    pub fn generated(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            create: true,
            override_existing: true,
            clean: true,
            ..Self::new(name, path)
        }
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn with_clean_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.clean_exclude = Some(pattern.into());
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.name);
        self.scope.replace_in_place(&mut self.path);
        self.scope.replace_opt_in_place(&mut self.clean_exclude);

        self.clean_exclude_regex = match &self.clean_exclude {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| ConfigError::InvalidValue {
                field: format!("clean-exclude of folder '{}'", self.name),
                message: e.to_string(),
            })?),
            None => None,
        };
        Ok(())
    }

    /// Absolute directory of this folder.
    pub fn directory(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.path)
    }

    /// Whether cleaning removes a file with this name.
    pub fn should_clean(&self, file_name: &str) -> bool {
        if !self.clean {
            return false;
        }
        match (&self.clean_exclude_regex, &self.clean_exclude) {
            (Some(re), _) => !re.is_match(file_name),
            (None, Some(pattern)) => Regex::new(pattern)
                .map(|re| !re.is_match(file_name))
                .unwrap_or(true),
            (None, None) => true,
        }
    }
}

impl Named for Folder {
    fn name(&self) -> &str {
        &self.name
    }
}

name_identity!(Folder);

/// A project generated files are written into.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Project {
    pub name: String,
    /// Relative to the configuration root directory unless absolute.
    pub path: String,
    /// Add the standard maven folders on init.
    pub maven: bool,
    pub folders: Vec<Folder>,
    #[serde(flatten)]
    scope: Scope,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_maven(mut self, maven: bool) -> Self {
        self.maven = maven;
        self
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn with_variable(mut self, variable: Variable) -> Self {
        self.scope.set_variable(variable);
        self
    }

    pub fn init(&mut self, parent: &HashMap<String, String>) -> ConfigResult<()> {
        self.inherit_variables(parent)?;
        self.scope.replace_in_place(&mut self.name);
        self.scope.replace_in_place(&mut self.path);

        for folder in &mut self.folders {
            folder.init(self.scope.var_map())?;
        }

        if self.maven {
            self.add_maven_folders()?;
        }
        Ok(())
    }

    /// Add each standard maven folder that is not declared already.
    fn add_maven_folders(&mut self) -> ConfigResult<()> {
        for (name, path, generated) in MAVEN_FOLDERS {
            if contains_name(&self.folders, name) {
                continue;
            }
            let mut folder = if generated {
                Folder::generated(name, path)
            } else {
                Folder::new(name, path)
            };
            folder.init(self.scope.var_map())?;
            debug!(project = %self.name, folder = name, "Added maven folder");
            self.folders.push(folder);
        }
        Ok(())
    }

    pub fn find_folder(&self, name: &str) -> Option<&Folder> {
        find_by_name(&self.folders, name)
    }

    /// Absolute directory of this project.
    pub fn directory(&self, root_dir: &Path) -> PathBuf {
        root_dir.join(&self.path)
    }
}

impl Named for Project {
    fn name(&self) -> &str {
        &self.name
    }
}

name_identity!(Project);
scope_node!(Folder, Project);
