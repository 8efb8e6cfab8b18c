use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    render::{FileTemplateEngine, HtmlDocumentEngine, RenderEngine},
    tenant::{DocumentService, Tenant, Tenants},
};

/// Configuration for document rendering.
///
/// This struct holds the settings used to wire up one rendering engine per
/// tenant: where each tenant's templates live and how generated documents are
/// tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// Base directory of all tenant templates.
    ///
    /// A tenant without its own `template_root` uses
    /// `{template_root}/{tenant}`.
    template_root: PathBuf,

    /// Creator tag stamped on generated documents.
    creator: String,

    /// The tenants that can render documents, keyed by tenant name.
    ///
    /// A tenant missing from this map cannot render anything: there is no
    /// fallback tenant.
    tenants: BTreeMap<String, TenantConfig>,
}

/// Per-tenant overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Directory holding this tenant's templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_root: Option<PathBuf>,

    /// Creator tag for this tenant's documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template_root: default_template_root(),
            creator: default_creator(),
            tenants: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Returns the base template directory.
    #[must_use]
    pub fn template_root(&self) -> &Path {
        &self.template_root
    }

    /// Returns the default creator tag.
    #[must_use]
    pub fn creator(&self) -> &str {
        &self.creator
    }

    /// Returns the configured tenants.
    #[must_use]
    pub const fn tenants(&self) -> &BTreeMap<String, TenantConfig> {
        &self.tenants
    }

    /// Adds or replaces a tenant.
    ///
    /// Returns `true` if the tenant was not configured before.
    pub fn add_tenant(&mut self, name: String, tenant: TenantConfig) -> bool {
        self.tenants.insert(name, tenant).is_none()
    }

    /// Removes a tenant.
    ///
    /// Returns `true` if the tenant was configured.
    pub fn remove_tenant(&mut self, name: &str) -> bool {
        self.tenants.remove(name).is_some()
    }

    /// The template directory of a tenant, relative paths resolved against
    /// `base`.
    #[must_use]
    pub fn tenant_template_root(&self, base: &Path, name: &str) -> PathBuf {
        let root = self
            .tenants
            .get(name)
            .and_then(|tenant| tenant.template_root.clone())
            .unwrap_or_else(|| self.template_root.join(name));
        base.join(root)
    }

    /// Builds a [`DocumentService`] with the file based template engine and
    /// the HTML document engine registered for every configured tenant.
    ///
    /// Relative template roots are resolved against `base`, usually the
    /// directory holding the configuration file.
    #[must_use]
    pub fn document_service(&self, base: &Path) -> DocumentService {
        let mut engines = Tenants::default();
        for (name, tenant) in &self.tenants {
            let creator = tenant.creator.as_deref().unwrap_or(&self.creator);
            let engine = RenderEngine::new(
                FileTemplateEngine::new(self.tenant_template_root(base, name)),
                HtmlDocumentEngine::new(creator),
            );
            engines.register(Tenant::new(name.as_str()), engine);
        }
        DocumentService::new(engines)
    }
}

fn default_template_root() -> PathBuf {
    PathBuf::from("templates")
}

fn default_creator() -> String {
    "TailoringExpert".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_template_root")]
        template_root: PathBuf,

        #[serde(default = "default_creator")]
        creator: String,

        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        tenants: BTreeMap<String, TenantConfig>,
    },
}

impl From<Versions> for super::Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                template_root,
                creator,
                tenants,
            } => Self {
                template_root,
                creator,
                tenants,
            },
        }
    }
}

impl From<super::Config> for Versions {
    fn from(config: super::Config) -> Self {
        Self::V1 {
            template_root: config.template_root,
            creator: config.creator,
            tenants: config.tenants,
        }
    }
}
