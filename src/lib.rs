//! windgen: utility-first CSS generation.
//!
//! Content is scanned for class-name tokens, each token is matched against a
//! registry of utilities (built-in and plugin-provided) and the matching
//! rules are rendered to a stylesheet.

#[cfg(feature = "cli")]
pub mod args;
pub mod builtins;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod content;
pub mod errors;
pub mod generator;
pub mod manifest;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod stylesheet;
pub mod theme;
pub mod tokenizer;

#[cfg(feature = "cli")]
pub use args::{BuildArgs, Cli, Commands, PipeArgs};
pub use builtins::base_registry;
#[cfg(feature = "cli")]
pub use cli::{build, handle_pipe_command, BuildResult, PerformanceStats};
pub use config::{ConfigFile, Configuration, PluginSpec};
pub use content::{collect_files, read_sources, ContentFile, SecurityConfig};
pub use errors::{GeneratorError, Result};
pub use generator::generate;
pub use manifest::{Manifest, ManifestBuilder};
pub use pipeline::{Pipeline, PipelineOutput};
pub use plugin::{InlinePlugin, Plugin, PluginContext, PluginError, PluginHost, TypographyPlugin};
pub use registry::{Declaration, UtilityRegistry, UtilityRule, UtilityValue};
pub use stylesheet::{minify_css, render, write_output, RenderOptions};
pub use theme::{default_theme, merge, Theme, ThemeMap, ThemeSpec};
pub use tokenizer::{scan, scan_all, SourceText, TokenSet, TokenizeDiagnostic};
