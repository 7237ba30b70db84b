//! Pipeline driver: theme → registry → plugins → scan → generate.

use crate::builtins::base_registry;
use crate::config::Configuration;
use crate::errors::Result;
use crate::generator::generate_matched;
use crate::plugin::PluginHost;
use crate::registry::{ConflictNote, UtilityRule};
use crate::tokenizer::{scan_all, SourceText, TokenSet};

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Generated rules in token order
    pub rules: Vec<UtilityRule>,
    /// The token behind each rule, index for index
    pub matched: Vec<String>,
    /// Every token found in the sources
    pub tokens: TokenSet,
    /// Sources that could not be scanned
    pub diagnostics: Vec<crate::tokenizer::TokenizeDiagnostic>,
    /// Selectors shadowed by a later registration
    pub conflicts: Vec<ConflictNote>,
}

/// Drives a run over a fixed configuration
#[derive(Debug)]
pub struct Pipeline {
    config: Configuration,
    jobs: Option<usize>,
}

impl Pipeline {
    pub fn new(config: Configuration) -> Self {
        Self { config, jobs: None }
    }

    /// Cap the number of threads used for scanning
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = Some(jobs.max(1));
        self
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Run the pipeline over already-read content.
    ///
    /// A plugin failure aborts the run before any source is scanned.
    pub fn run(&self, sources: &[SourceText]) -> Result<PipelineOutput> {
        let theme = self.config.theme().resolve();
        tracing::debug!(categories = theme.as_map().len(), "Resolved theme");

        let registry = PluginHost::apply(self.config.plugins(), base_registry())?;
        tracing::debug!(
            literals = registry.literal_count(),
            patterns = registry.pattern_count(),
            "Built utility registry"
        );

        let (tokens, diagnostics) = scan_all(sources, self.jobs);
        tracing::debug!(sources = sources.len(), tokens = tokens.len(), "Scanned content sources");

        let (matched, rules) = generate_matched(&tokens, &registry, &theme).into_iter().unzip();

        Ok(PipelineOutput {
            rules,
            matched,
            tokens,
            diagnostics,
            conflicts: registry.conflicts().to_vec(),
        })
    }
}
