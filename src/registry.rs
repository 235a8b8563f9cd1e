//! Catalog of lab definitions.
//!
//! The registry document is the system of record: it is re-read for every
//! orchestration request so edits take effect without a restart.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{LabError, Result};
use crate::shared::models::{LabPort, LabSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Yaml,
}

impl RegistryFormat {
    /// `.yaml`/`.yml` are YAML, anything else is JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => RegistryFormat::Yaml,
            _ => RegistryFormat::Json,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRegistry {
    #[serde(default)]
    labs: Vec<RawLab>,
}

#[derive(Debug, Deserialize)]
struct RawLab {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    container_name: Option<String>,
    image: Option<String>,
    #[serde(default)]
    ports: Vec<LabPort>,
    launch_url: Option<String>,
}

impl RawLab {
    fn into_spec(self, index: usize) -> Result<LabSpec> {
        let required = |value: Option<String>, field: &str| {
            value.ok_or_else(|| {
                LabError::Config(format!("lab entry {index} is missing required field `{field}`"))
            })
        };

        Ok(LabSpec {
            id: required(self.id, "id")?,
            title: required(self.title, "title")?,
            description: self.description.unwrap_or_default(),
            container_name: required(self.container_name, "container_name")?,
            image: required(self.image, "image")?,
            ports: self.ports,
            launch_url: required(self.launch_url, "launch_url")?,
        })
    }
}

/// Ordered, validated list of labs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    labs: Vec<LabSpec>,
}

impl Catalog {
    pub fn new(labs: Vec<LabSpec>) -> Result<Self> {
        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        for lab in &labs {
            if !ids.insert(lab.id.as_str()) {
                return Err(LabError::Config(format!("duplicate lab id `{}`", lab.id)));
            }
            if !names.insert(lab.container_name.as_str()) {
                return Err(LabError::Config(format!(
                    "duplicate container_name `{}` (lab `{}`)",
                    lab.container_name, lab.id
                )));
            }
        }
        Ok(Self { labs })
    }

    pub fn parse(source: &str, format: RegistryFormat) -> Result<Self> {
        let raw: RawRegistry = match format {
            RegistryFormat::Json => serde_json::from_str(source)
                .map_err(|e| LabError::Config(format!("malformed lab registry: {e}")))?,
            RegistryFormat::Yaml => serde_yaml::from_str(source)
                .map_err(|e| LabError::Config(format!("malformed lab registry: {e}")))?,
        };

        let labs = raw
            .labs
            .into_iter()
            .enumerate()
            .map(|(index, lab)| lab.into_spec(index))
            .collect::<Result<Vec<_>>>()?;
        Self::new(labs)
    }

    pub fn find(&self, lab_id: &str) -> Option<&LabSpec> {
        self.labs.iter().find(|lab| lab.id == lab_id)
    }

    pub fn get(&self, lab_id: &str) -> Result<&LabSpec> {
        self.find(lab_id)
            .ok_or_else(|| LabError::UnknownLab(lab_id.to_string()))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabSpec> {
        self.labs.iter()
    }

    pub fn len(&self) -> usize {
        self.labs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labs.is_empty()
    }

    pub fn into_labs(self) -> Vec<LabSpec> {
        self.labs
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a LabSpec;
    type IntoIter = std::slice::Iter<'a, LabSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.labs.iter()
    }
}

#[derive(Debug, Clone)]
enum Source {
    File(PathBuf),
    Fixed(Catalog),
}

/// Where lab definitions come from.
#[derive(Debug, Clone)]
pub struct LabRegistry {
    source: Source,
}

impl LabRegistry {
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::File(path.into()),
        }
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            source: Source::Fixed(catalog),
        }
    }

    pub fn load(&self) -> Result<Catalog> {
        match &self.source {
            Source::Fixed(catalog) => Ok(catalog.clone()),
            Source::File(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| {
                    LabError::Config(format!(
                        "cannot read lab registry {}: {e}",
                        path.display()
                    ))
                })?;
                let catalog = Catalog::parse(&text, RegistryFormat::from_path(path))?;
                debug!(path = %path.display(), labs = catalog.len(), "Loaded lab registry");
                Ok(catalog)
            }
        }
    }
}
