//! Binding generated files to project folders.
//!
//! The lookup goes from the most specific override to the least specific
//! default: the first matching target of the artifact, then the artifact,
//! its generator and the generators list.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

use crate::generator::RoutingNode;
use crate::project::{Folder, Project};
use crate::tree::ConfigTree;

/// What was being looked up when a binding failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingContext {
    pub generator: String,
    pub artifact: String,
    pub target: Option<String>,
}

impl fmt::Display for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "generator='{}', artifact='{}'", self.generator, self.artifact)?;
        match &self.target {
            Some(target) => write!(f, ", target='{}'", target),
            None => write!(f, ", target=<none>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("configuration is not initialized")]
    NotInitialized,

    #[error("generator not found ({0})")]
    GeneratorNotFound(BindingContext),

    #[error("artifact not found ({0})")]
    ArtifactNotFound(BindingContext),

    #[error("no project name defined ({0})")]
    ProjectNameNotDefined(BindingContext),

    #[error("no folder name defined ({0})")]
    FolderNameNotDefined(BindingContext),

    #[error("project '{project}' not found ({context})")]
    ProjectNotFound {
        project: String,
        context: BindingContext,
    },

    #[error("folder '{folder}' not found in project '{project}' ({context})")]
    FolderNotFound {
        project: String,
        folder: String,
        context: BindingContext,
    },
}

/// The project folder a generated file goes to.
#[derive(Debug, Clone, Copy)]
pub struct TargetBinding<'a> {
    pub project: &'a Project,
    pub folder: &'a Folder,
}

impl ConfigTree {
    /// Find the project and folder for an artifact of a generator.
    ///
    /// With a `target_path`, the first target of the artifact matching it
    /// takes precedence.
    pub fn find_target(
        &self,
        generator: &str,
        artifact: &str,
        target_path: Option<&str>,
    ) -> Result<TargetBinding<'_>, BindingError> {
        if !self.is_initialized() {
            return Err(BindingError::NotInitialized);
        }

        let context = BindingContext {
            generator: generator.to_string(),
            artifact: artifact.to_string(),
            target: target_path.map(str::to_string),
        };

        let generator_config = self
            .find_generator(generator)
            .ok_or_else(|| BindingError::GeneratorNotFound(context.clone()))?;
        let artifact_config = generator_config
            .find_artifact(artifact)
            .ok_or_else(|| BindingError::ArtifactNotFound(context.clone()))?;

        let target = target_path.and_then(|path| artifact_config.find_target(path));
        let (project_name, folder_name) = match target {
            Some(target) => {
                debug!(%context, pattern = ?target.pattern, "Target matched");
                (target.def_project(), target.def_folder())
            }
            None => (artifact_config.def_project(), artifact_config.def_folder()),
        };

        let project_name =
            project_name.ok_or_else(|| BindingError::ProjectNameNotDefined(context.clone()))?;
        let folder_name =
            folder_name.ok_or_else(|| BindingError::FolderNameNotDefined(context.clone()))?;

        let project = self
            .find_project(project_name)
            .ok_or_else(|| BindingError::ProjectNotFound {
                project: project_name.to_string(),
                context: context.clone(),
            })?;
        let folder = project
            .find_folder(folder_name)
            .ok_or_else(|| BindingError::FolderNotFound {
                project: project_name.to_string(),
                folder: folder_name.to_string(),
                context,
            })?;

        Ok(TargetBinding { project, folder })
    }

    /// Folder for an artifact of a generator. See [`ConfigTree::find_target`].
    pub fn find_target_folder(
        &self,
        generator: &str,
        artifact: &str,
        target_path: Option<&str>,
    ) -> Result<&Folder, BindingError> {
        self.find_target(generator, artifact, target_path)
            .map(|binding| binding.folder)
    }

    /// Absolute directory of the bound folder.
    pub fn find_target_dir(
        &self,
        generator: &str,
        artifact: &str,
        target_path: Option<&str>,
    ) -> Result<PathBuf, BindingError> {
        let binding = self.find_target(generator, artifact, target_path)?;
        let root_dir = self.root_dir().ok_or(BindingError::NotInitialized)?;
        Ok(binding
            .folder
            .directory(&binding.project.directory(root_dir)))
    }
}
