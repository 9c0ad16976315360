//! Seeding a new project folder from a language template

use std::sync::Arc;

use serde::Serialize;

use crate::config::ProjectConfig;
use crate::error::{Error, Result};
use crate::path::KEY_SEPARATOR;
use crate::traits::ObjectStore;
use crate::transfer::{FolderCopier, TransferOptions, TransferReport};

/// Prefix layout for templates and projects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTemplate {
    template_root: String,
    project_root: String,
}

/// Source and destination prefixes of one seeding run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPrefixes {
    pub source: String,
    pub destination: String,
}

impl ProjectTemplate {
    pub fn new(template_root: impl Into<String>, project_root: impl Into<String>) -> Self {
        Self {
            template_root: template_root.into(),
            project_root: project_root.into(),
        }
    }

    /// Resolve the prefixes for `project_id` seeded from `language`
    pub fn prefixes(&self, project_id: &str, language: &str) -> Result<ProjectPrefixes> {
        let project_id = segment("project id", project_id)?;
        let language = segment("language", language)?;

        Ok(ProjectPrefixes {
            source: folder(&self.template_root, language),
            destination: folder(&self.project_root, project_id),
        })
    }

    /// Copy the `language` template into a fresh folder for `project_id`
    pub async fn create(
        &self,
        store: Arc<dyn ObjectStore>,
        options: TransferOptions,
        project_id: &str,
        language: &str,
    ) -> Result<TransferReport> {
        let prefixes = self.prefixes(project_id, language)?;
        tracing::info!(
            project_id,
            language,
            destination = %prefixes.destination,
            "Creating project"
        );

        FolderCopier::new(store, options)
            .copy_folder(&prefixes.source, &prefixes.destination)
            .await
    }
}

impl Default for ProjectTemplate {
    fn default() -> Self {
        Self::from(&ProjectConfig::default())
    }
}

impl From<&ProjectConfig> for ProjectTemplate {
    fn from(config: &ProjectConfig) -> Self {
        Self::new(&config.template_root, &config.project_root)
    }
}

fn segment<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::InvalidPath(format!("The {what} cannot be empty")));
    }
    if value.contains(KEY_SEPARATOR) || value == "." || value == ".." {
        return Err(Error::InvalidPath(format!(
            "The {what} '{value}' must be a single path segment"
        )));
    }
    Ok(value)
}

fn folder(root: &str, name: &str) -> String {
    let root = root.trim_end_matches(KEY_SEPARATOR);
    if root.is_empty() {
        format!("{name}{KEY_SEPARATOR}")
    } else {
        format!("{root}{KEY_SEPARATOR}{name}{KEY_SEPARATOR}")
    }
}
