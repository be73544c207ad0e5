//! End-to-end build: configuration → registry → pipeline → page tree.
//!
//! ```text
//! site.toml ──load──▶ SiteConfig ──seed──▶ Registry (custom layouts, rewrites)
//!                                 ──catalog──▶ Pipeline
//! Pipeline ──run──▶ documents + outlets (+ theme default layout)
//! Registry + outlets ──validate──▶ Compositor ──compose──▶ PageTree
//! ```
//!
//! The registry is frozen once the theme's default layout (if needed) is
//! adopted; everything after that borrows it immutably.

use crate::builtin::{PluginCatalog, PluginContext};
use crate::compose::{ComposeError, Compositor, PageTree};
use crate::config::{self, ConfigError, SiteConfig};
use crate::layout::RewriteRule;
use crate::pipeline::{OutletRegistry, Pipeline, PluginError};
use crate::registry::{Registry, RegistryError};
use crate::types::DocumentSet;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
    #[error("Layout error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Compose error: {0}")]
    Compose(#[from] ComposeError),
}

/// A configured site: seeded registry plus instantiated plugins.
#[derive(Debug)]
pub struct Site {
    pub config: SiteConfig,
    registry: Registry,
    pipeline: Pipeline,
}

/// Everything one build produced.
#[derive(Debug)]
pub struct Build {
    pub config: SiteConfig,
    pub registry: Registry,
    pub outlets: OutletRegistry,
    pub documents: DocumentSet,
    pub pages: PageTree,
}

impl Build {
    /// Rewrite rules whose source matched no page.
    pub fn unused_rewrites(&self) -> Vec<&RewriteRule> {
        self.registry
            .rewrites()
            .iter()
            .filter(|rule| !self.pages.values().any(|p| p.source_path == rule.source))
            .collect()
    }
}

impl Site {
    /// Load `site.toml` and resolve plugin options relative to its directory.
    pub fn load(config_path: &Path, catalog: &PluginCatalog) -> Result<Self, BuildError> {
        let config = config::load_config(config_path)?;
        let base_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Self::from_config(config, base_dir, catalog)
    }

    pub fn from_config(
        config: SiteConfig,
        base_dir: &Path,
        catalog: &PluginCatalog,
    ) -> Result<Self, BuildError> {
        let registry = config.seed_registry()?;
        let context = PluginContext {
            base_dir: base_dir.to_path_buf(),
            title: config.title.clone(),
        };
        let pipeline = catalog.instantiate(&config.plugins, &context)?;
        Ok(Self {
            config,
            registry,
            pipeline,
        })
    }

    /// Assemble a site from an already-built registry and pipeline.
    pub fn new(config: SiteConfig, registry: Registry, pipeline: Pipeline) -> Self {
        Self {
            config,
            registry,
            pipeline,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run the pipeline, settle the default layout, and validate every outlet
    /// binding without rendering anything.
    pub fn prepare(self) -> Result<Prepared, BuildError> {
        let Site {
            config,
            mut registry,
            pipeline,
        } = self;
        let output = pipeline.run()?;

        if !registry.has_default_layout() {
            match output.default_layout {
                Some((index, layout)) => {
                    info!(plugin = index, "using default layout from theme");
                    registry.declare_default_layout(config.layout.with_banner(layout))?;
                }
                None => return Err(RegistryError::MissingDefaultLayout.into()),
            }
        }
        crate::compose::validate_outlets(&registry, &output.outlets)?;

        Ok(Prepared {
            config,
            registry,
            outlets: output.outlets,
            documents: output.documents,
        })
    }

    /// Full build.
    pub fn build(self) -> Result<Build, BuildError> {
        self.prepare()?.compose()
    }
}

/// A site whose pipeline has run and whose layouts are validated.
#[derive(Debug)]
pub struct Prepared {
    pub config: SiteConfig,
    pub registry: Registry,
    pub outlets: OutletRegistry,
    pub documents: DocumentSet,
}

impl Prepared {
    pub fn compose(self) -> Result<Build, BuildError> {
        let pages = Compositor::new(&self.registry, &self.outlets)?.compose(&self.documents)?;
        let build = Build {
            config: self.config,
            registry: self.registry,
            outlets: self.outlets,
            documents: self.documents,
            pages,
        };
        for rule in build.unused_rewrites() {
            warn!(source = %rule.source, destination = %rule.destination, "rewrite rule matched no page");
        }
        Ok(build)
    }
}
