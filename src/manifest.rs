use crate::pipeline::PipelineOutput;
use crate::tokenizer::{scan_source, SourceText};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Metadata for the generated manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Version of the manifest format
    pub version: String,

    /// Timestamp when the manifest was generated
    pub generated_at: DateTime<Utc>,

    /// Number of content files read
    pub files_processed: usize,

    /// Number of distinct tokens found in the content
    pub tokens_found: usize,

    /// Number of utility rules generated
    pub utilities_generated: usize,

    /// Plugins applied, in order
    pub plugins: Vec<String>,

    /// Generator version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_version: Option<String>,
}

/// Per-utility information in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestUtilityInfo {
    pub selector: String,

    /// Number of declarations in the rule
    pub declarations: usize,

    /// Sources where the token was found
    pub files: Vec<String>,
}

/// Complete manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub metadata: ManifestMetadata,

    /// Utility token to rule information, in generation order
    pub utilities: IndexMap<String, ManifestUtilityInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ManifestStatistics>,
}

/// Statistics about the build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestStatistics {
    /// Total CSS size in bytes
    pub css_size_bytes: usize,

    /// CSS size after minification (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minified_size_bytes: Option<usize>,

    /// Number of files that matched patterns
    pub files_matched: usize,

    /// Number of files containing at least one generated utility
    pub files_with_utilities: usize,

    /// Sources that could not be scanned
    pub diagnostics: usize,

    /// Selectors registered more than once
    pub conflicts: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl Manifest {
    /// Create a new manifest with default metadata
    pub fn new() -> Self {
        Self {
            metadata: ManifestMetadata {
                version: "1.0.0".to_string(),
                generated_at: Utc::now(),
                files_processed: 0,
                tokens_found: 0,
                utilities_generated: 0,
                plugins: Vec::new(),
                generator_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            },
            utilities: IndexMap::new(),
            statistics: None,
        }
    }

    /// Record that `token` appears in `file`
    pub fn add_source(&mut self, token: &str, file: String) {
        if let Some(info) = self.utilities.get_mut(token) {
            if !info.files.contains(&file) {
                info.files.push(file);
            }
        }
    }

    /// Calculate and set statistics
    pub fn calculate_statistics(
        &mut self,
        css_size: usize,
        minified_size: Option<usize>,
        diagnostics: usize,
        conflicts: usize,
        processing_time_ms: Option<u64>,
    ) {
        let files_with_utilities: HashSet<&str> = self
            .utilities
            .values()
            .flat_map(|info| info.files.iter().map(String::as_str))
            .collect();

        self.statistics = Some(ManifestStatistics {
            css_size_bytes: css_size,
            minified_size_bytes: minified_size,
            files_matched: self.metadata.files_processed,
            files_with_utilities: files_with_utilities.len(),
            diagnostics,
            conflicts,
            processing_time_ms,
        });
    }

    /// Convert manifest to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({}))
    }

    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_compact_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for creating manifests
pub struct ManifestBuilder {
    manifest: Manifest,
    diagnostics: usize,
    conflicts: usize,
    start_time: Option<std::time::Instant>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        Self {
            manifest: Manifest::new(),
            diagnostics: 0,
            conflicts: 0,
            start_time: Some(std::time::Instant::now()),
        }
    }

    /// Count processing time from `start` instead of from builder creation
    pub fn started_at(mut self, start: std::time::Instant) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_files_processed(mut self, count: usize) -> Self {
        self.manifest.metadata.files_processed = count;
        self
    }

    pub fn with_plugins<I, S>(mut self, plugins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest.metadata.plugins = plugins.into_iter().map(Into::into).collect();
        self
    }

    /// Record every generated utility from a pipeline run
    pub fn with_output(mut self, output: &PipelineOutput) -> Self {
        for (token, rule) in output.matched.iter().zip(&output.rules) {
            self.manifest.utilities.insert(
                token.clone(),
                ManifestUtilityInfo {
                    selector: rule.selector.clone(),
                    declarations: rule.declarations.len(),
                    files: Vec::new(),
                },
            );
        }
        self.manifest.metadata.tokens_found = output.tokens.len();
        self.manifest.metadata.utilities_generated = output.rules.len();
        self.diagnostics = output.diagnostics.len();
        self.conflicts = output.conflicts.len();
        self
    }

    /// Attribute generated utilities to the sources they were found in.
    ///
    /// Call after [`with_output`](Self::with_output). Sources that fail to
    /// scan are ignored here; they are already counted as diagnostics.
    pub fn with_sources(mut self, sources: &[SourceText]) -> Self {
        for source in sources {
            let Ok(tokens) = scan_source(source) else {
                continue;
            };
            for token in &tokens {
                self.manifest.add_source(token, source.origin.clone());
            }
        }
        self
    }

    /// Build the final manifest with statistics
    pub fn build(mut self, css_size: usize, minified_size: Option<usize>) -> Manifest {
        let processing_time = self.start_time.map(|t| t.elapsed().as_millis() as u64);
        self.manifest.calculate_statistics(
            css_size,
            minified_size,
            self.diagnostics,
            self.conflicts,
            processing_time,
        );
        self.manifest
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
