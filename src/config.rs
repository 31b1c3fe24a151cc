//! Generator configuration
//!
//! Settings come from an optional `oas-mockgen.toml` file and from command-line
//! flags; flags win. The file is looked up in this order:
//!
//! 1. an explicit `--config <FILE>`
//! 2. `oas-mockgen.toml` next to the specification file
//! 3. `oas-mockgen.toml` in the current directory
//!
//! ```toml
//! output = "src/mocks"
//! includes = "/pets,/pets/{id}"
//! codes = "200,404"
//! max_array_length = 10
//! static = true
//! base_url = true
//!
//! [ai]
//! enable = true
//! provider = "openai"
//!
//! [ai.openai]
//! api_key = "process.env.OPENAI_API_KEY"
//! model = "gpt-4o-mini"
//! ```

use crate::generator::DEFAULT_MAX_ARRAY_LENGTH;
use crate::spec::{DocumentInfo, FilterOptions};
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name looked up during discovery
pub const CONFIG_FILE_NAME: &str = "oas-mockgen.toml";

fn default_max_array_length() -> usize {
    DEFAULT_MAX_ARRAY_LENGTH
}

/// `base_url`: `true` uses the document's first server URL, a string is used as is
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BaseUrl {
    Enabled(bool),
    Fixed(String),
}

impl Default for BaseUrl {
    fn default() -> Self {
        BaseUrl::Enabled(false)
    }
}

impl BaseUrl {
    /// The prefix put in front of every handler path
    pub fn resolve(&self, info: &DocumentInfo) -> String {
        match self {
            BaseUrl::Enabled(false) => String::new(),
            BaseUrl::Enabled(true) => info.server_url.clone().unwrap_or_default(),
            BaseUrl::Fixed(url) => url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    Openai,
    Azure,
    Anthropic,
}

impl AiProvider {
    /// Configuration key of the provider's settings table
    pub fn key(self) -> &'static str {
        match self {
            AiProvider::Openai => "openai",
            AiProvider::Azure => "azure",
            AiProvider::Anthropic => "anthropic",
        }
    }
}

/// Credentials and model for one provider; values are JS expressions or plain strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    /// Azure only
    pub resource_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub enable: bool,
    pub provider: Option<AiProvider>,
    pub openai: Option<ProviderSettings>,
    pub azure: Option<ProviderSettings>,
    pub anthropic: Option<ProviderSettings>,
}

impl AiConfig {
    pub fn settings(&self, provider: AiProvider) -> Option<&ProviderSettings> {
        match provider {
            AiProvider::Openai => self.openai.as_ref(),
            AiProvider::Azure => self.azure.as_ref(),
            AiProvider::Anthropic => self.anthropic.as_ref(),
        }
    }
}

/// Everything a generation run needs besides the document itself
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeneratorConfig {
    /// Output directory; handlers go to stdout when absent
    pub output: Option<PathBuf>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    #[serde(default)]
    pub regex: bool,
    pub codes: Option<String>,
    #[serde(default = "default_max_array_length")]
    pub max_array_length: usize,
    #[serde(default, rename = "static")]
    pub static_mode: bool,
    #[serde(default)]
    pub base_url: BaseUrl,
    #[serde(default)]
    pub typescript: bool,
    #[serde(default)]
    pub echo_request_body: bool,
    pub seed: Option<u64>,
    #[serde(default)]
    pub ai: AiConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            output: None,
            includes: None,
            excludes: None,
            regex: false,
            codes: None,
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
            static_mode: false,
            base_url: BaseUrl::default(),
            typescript: false,
            echo_request_body: false,
            seed: None,
            ai: AiConfig::default(),
        }
    }
}

/// Command-line values; `None`/`false` leaves the file value in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub output: Option<PathBuf>,
    pub includes: Option<String>,
    pub excludes: Option<String>,
    pub regex: bool,
    pub codes: Option<String>,
    pub max_array_length: Option<usize>,
    pub static_mode: bool,
    pub base_url: Option<BaseUrl>,
    pub typescript: bool,
    pub echo_request_body: bool,
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    /// Parse a TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid configuration.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Load configuration following the discovery order
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing, or a discovered file is invalid.
    pub fn discover(explicit: Option<&Path>, spec_source: &str) -> anyhow::Result<Self> {
        match discover_config_path(explicit, spec_source)? {
            Some(path) => {
                info!(config = %path.display(), "using configuration file");
                Self::from_file(&path)
            }
            None => {
                debug!("no configuration file found; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Overlay command-line values
    pub fn merge(mut self, cli: ConfigOverrides) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $( if cli.$field.is_some() { self.$field = cli.$field; } )*
            };
        }
        take!(output, includes, excludes, codes, seed);
        if let Some(max) = cli.max_array_length {
            self.max_array_length = max;
        }
        if let Some(base_url) = cli.base_url {
            self.base_url = base_url;
        }
        self.regex |= cli.regex;
        self.static_mode |= cli.static_mode;
        self.typescript |= cli.typescript;
        self.echo_request_body |= cli.echo_request_body;
        self
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            includes: self.includes.clone(),
            excludes: self.excludes.clone(),
            regex: self.regex,
            codes: self.codes.clone(),
        }
    }

    /// File extension of the generated modules
    pub fn extension(&self) -> &'static str {
        if self.typescript {
            "ts"
        } else {
            "js"
        }
    }
}

/// Pick the configuration file to load, if any
///
/// # Errors
///
/// Returns an error if an explicit path does not exist.
pub fn discover_config_path(explicit: Option<&Path>, spec_source: &str) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let is_remote = spec_source.starts_with("http://") || spec_source.starts_with("https://");
    if !is_remote {
        if let Some(dir) = Path::new(spec_source).parent() {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Ok(Some(candidate));
            }
        }
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    Ok(local.is_file().then_some(local))
}
