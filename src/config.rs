use crate::errors::{GeneratorError, Result};
use crate::plugin::{InlinePlugin, Plugin, TypographyPlugin, UtilityMap};
use crate::theme::{default_theme, ThemeMap, ThemeSpec};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Content globs to scan
    pub content: Vec<String>,

    /// Theme configuration
    pub theme: ThemeConfig,

    /// Plugins, applied in order
    pub plugins: Vec<PluginSpec>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            content: vec![
                "./**/*.go".to_string(),
                "./templates/**/*.html".to_string(),
            ],
            theme: ThemeConfig::default(),
            plugins: vec![PluginSpec::Builtin(TypographyPlugin::NAME.to_string())],
        }
    }
}

/// Theme section of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Replaces the built-in base theme when present
    pub base: Option<ThemeMap>,

    /// Entries layered over the base theme
    pub extend: ThemeMap,
}

/// A plugin entry: a built-in plugin by name, or inline utilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginSpec {
    Builtin(String),
    Inline {
        name: String,
        utilities: IndexMap<String, IndexMap<String, String>>,
    },
}

impl PluginSpec {
    fn into_plugin(self) -> Result<Box<dyn Plugin>> {
        match self {
            PluginSpec::Builtin(name) => match name.as_str() {
                TypographyPlugin::NAME | "@tailwindcss/typography" => Ok(Box::new(TypographyPlugin)),
                _ => Err(GeneratorError::ConfigError {
                    message: format!("Unknown plugin '{}'", name),
                }),
            },
            PluginSpec::Inline { name, utilities } => {
                let utilities: UtilityMap = utilities
                    .into_iter()
                    .map(|(selector, declarations)| {
                        let declarations = declarations
                            .into_iter()
                            .map(|(property, value)| crate::registry::Declaration::new(property, value))
                            .collect();
                        (selector, declarations)
                    })
                    .collect();
                Ok(Box::new(InlinePlugin::new(name, utilities)))
            }
        }
    }
}

impl ConfigFile {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GeneratorError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_yaml::from_str(&content)
            .map_err(|e| GeneratorError::ConfigError {
                message: format!("Failed to parse YAML config: {}", e),
            })
    }

    /// Load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| GeneratorError::ConfigError {
                message: format!("Failed to read config file {}: {}", path.display(), e),
            })?;

        serde_json::from_str(&content)
            .map_err(|e| GeneratorError::ConfigError {
                message: format!("Failed to parse JSON config: {}", e),
            })
    }

    /// Load configuration from a file (auto-detect format)
    pub fn from_file(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(GeneratorError::ConfigError {
                message: format!(
                    "Unsupported config file format: {}. Use .yaml, .yml, or .json",
                    path.display()
                ),
            }),
        }
    }

    /// Merge with another configuration.
    ///
    /// Content globs are appended, theme extensions from `other` win, and
    /// `other`'s plugins run after ours.
    pub fn merge(mut self, other: Self) -> Self {
        for path in other.content {
            if !self.content.contains(&path) {
                self.content.push(path);
            }
        }

        if other.theme.base.is_some() {
            self.theme.base = other.theme.base;
        }
        for (category, tokens) in other.theme.extend {
            self.theme.extend.entry(category).or_default().extend(tokens);
        }

        self.plugins.extend(other.plugins);
        self
    }

    /// Build the immutable run configuration
    pub fn into_configuration(self) -> Result<Configuration> {
        let theme = ThemeSpec {
            base: self.theme.base.unwrap_or_else(default_theme),
            extend: self.theme.extend,
        };
        let plugins = self
            .plugins
            .into_iter()
            .map(PluginSpec::into_plugin)
            .collect::<Result<Vec<_>>>()?;

        Configuration::new(self.content, theme, plugins)
    }
}

/// Validated configuration for one pipeline run. Read-only once built.
pub struct Configuration {
    content: Vec<String>,
    theme: ThemeSpec,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Configuration {
    pub fn new(content: Vec<String>, theme: ThemeSpec, plugins: Vec<Box<dyn Plugin>>) -> Result<Self> {
        if content.is_empty() {
            return Err(GeneratorError::ConfigError {
                message: "At least one content glob must be configured".to_string(),
            });
        }

        Ok(Self {
            content,
            theme,
            plugins,
        })
    }

    /// Content globs as configured, duplicates included
    pub fn content(&self) -> &[String] {
        &self.content
    }

    /// Content globs with duplicates removed, first occurrence kept
    pub fn content_globs(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.content
            .iter()
            .map(String::as_str)
            .filter(|glob| seen.insert(*glob))
            .collect()
    }

    pub fn theme(&self) -> &ThemeSpec {
        &self.theme
    }

    pub fn plugins(&self) -> &[Box<dyn Plugin>] {
        &self.plugins
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("content", &self.content)
            .field("theme", &self.theme)
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .finish()
    }
}
