//! Application registry: resolves spaces and their apps by slug

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};
use zkform_common::{AppConfig, Error, Result, Space};

/// Lookup of spaces by slug
pub trait SpaceRegistry: Send + Sync {
    fn get_space(&self, slug: &str) -> Option<Arc<Space>>;
}

/// Registry built once from a fixed list of spaces
#[derive(Debug, Default)]
pub struct StaticSpaceRegistry {
    spaces: HashMap<String, Arc<Space>>,
}

impl StaticSpaceRegistry {
    /// Build a registry, rejecting duplicate or incomplete entries
    pub fn new(spaces: Vec<Space>) -> Result<Self> {
        let mut by_slug = HashMap::with_capacity(spaces.len());

        for space in spaces {
            validate_space(&space)?;
            let slug = space.slug.clone();
            if by_slug.insert(slug.clone(), Arc::new(space)).is_some() {
                return Err(Error::DuplicateSpace(slug));
            }
        }

        Ok(Self { spaces: by_slug })
    }

    /// Load a JSON array of spaces from `path`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        let spaces: Vec<Space> = serde_json::from_str(&data)?;

        let registry = Self::new(spaces)?;
        info!(
            "Loaded {} space(s) from {}",
            registry.spaces.len(),
            path.display()
        );
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }
}

impl SpaceRegistry for StaticSpaceRegistry {
    fn get_space(&self, slug: &str) -> Option<Arc<Space>> {
        let space = self.spaces.get(slug).cloned();
        if space.is_none() {
            debug!("Space not found: {}", slug);
        }
        space
    }
}

fn validate_space(space: &Space) -> Result<()> {
    if space.slug.is_empty() {
        return Err(Error::InvalidConfig("space with empty slug".to_string()));
    }

    let mut app_slugs = HashSet::new();
    for app in &space.apps {
        if !app_slugs.insert(app.slug()) {
            return Err(Error::InvalidConfig(format!(
                "duplicate app slug {} in space {}",
                app.slug(),
                space.slug
            )));
        }

        if let AppConfig::ZkForm(form) = app {
            if form.spreadsheet_id.is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "zkForm app {} in space {} has no spreadsheetId",
                    form.slug, space.slug
                )));
            }
        }
    }

    Ok(())
}
