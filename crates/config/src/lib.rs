//! Configuration loading and validation.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. built-in defaults,
//! 2. an optional file (TOML, YAML or JSON, chosen by extension),
//! 3. environment variables prefixed with `REBLOCK_`, using `__` to reach
//!    nested keys (`REBLOCK_EXCLUSION__MAX_NODES=500`).
//!
//! Each section is owned by the crate that consumes it; [`Config`] only
//! aggregates them and wires them into a [`Tracker`] or [`Renderer`].

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use reblock_blocks::BlockOptions;
use reblock_index::{ExclusionOptions, IndexOptions, SearchOptions, Tracker};
use reblock_render::{Renderer, WrapperSpec};
use reblock_store::StoreHandle;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix of environment variables that override configuration values.
pub const ENV_PREFIX: &str = "REBLOCK_";
const ENV_SEPARATOR: &str = "__";

/// Every tunable setting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub blocks: BlockOptions,
    pub index: IndexOptions,
    pub exclusion: ExclusionOptions,
    pub embed: WrapperSpec,
    pub search: SearchOptions,
}

impl Config {
    /// Loads defaults, then `path` (if given), then the environment, and
    /// validates the result.
    ///
    /// # Errors
    /// - [`ErrorKind::Invalid`] if `path` does not exist, has an unknown
    ///   extension, or the merged values fail [`validate()`](Self::validate).
    /// - [`ErrorKind::Load`] if a source could not be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::extract(Self::layers(path)?.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)))?;
        tracing::debug!(file = ?path, "Configuration loaded");
        Ok(config)
    }

    /// Loads defaults overridden by the file at `path` only, ignoring the
    /// environment.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::extract(Self::layers(Some(path))?)
    }

    /// Like [`load()`](Self::load), using the file at
    /// [`default_path()`](Self::default_path) when one exists.
    pub fn discover() -> Result<Self> {
        let path = Self::default_path().filter(|path| path.is_file());
        if path.is_none() {
            tracing::trace!("No configuration file found; using defaults and environment");
        }
        Self::load(path.as_deref())
    }

    /// Platform configuration directory location of the configuration file.
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "reblock").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn layers(path: Option<&Path>) -> Result<Figment> {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        let Some(path) = path else {
            return Ok(figment);
        };
        if !path.is_file() {
            exn::bail!(ErrorKind::Invalid(format!("configuration file not found: {}", path.display())));
        }
        Ok(match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => figment.merge(Toml::file(path)),
            Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
            Some("json") => figment.merge(Json::file(path)),
            _ => exn::bail!(ErrorKind::Invalid(format!("unsupported configuration format: {}", path.display()))),
        })
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values no component can work with.
    pub fn validate(&self) -> Result<()> {
        let blank = [
            ("blocks.marker", &self.blocks.marker),
            ("blocks.id_attribute", &self.blocks.id_attribute),
            ("blocks.post_type", &self.blocks.post_type),
            ("embed.wrapper_id", &self.embed.wrapper_id),
            ("embed.container_class", &self.embed.container_class),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        if let Some((key, _)) = blank {
            exn::bail!(ErrorKind::Invalid(format!("{key} must not be empty")));
        }
        if self.index.max_write_attempts == 0 {
            exn::bail!(ErrorKind::Invalid("index.max_write_attempts must be at least 1".to_string()));
        }
        if self.exclusion.max_nodes == 0 {
            exn::bail!(ErrorKind::Invalid("exclusion.max_nodes must be at least 1".to_string()));
        }
        if self.search.per_page == 0 {
            exn::bail!(ErrorKind::Invalid("search.per_page must be at least 1".to_string()));
        }
        Ok(())
    }

    /// A tracker on `store` using these settings.
    pub fn tracker(&self, store: StoreHandle) -> Tracker {
        Tracker::new(store)
            .with_blocks(self.blocks.clone())
            .with_index(self.index.clone())
            .with_exclusion(self.exclusion.clone())
            .with_search(self.search.clone())
    }

    /// A renderer on `store` using these settings.
    pub fn renderer(&self, store: StoreHandle) -> Renderer {
        Renderer::new(store).with_blocks(self.blocks.clone()).with_wrapper(self.embed.clone())
    }
}
