//! Class-name tokenizer.
//!
//! Scans arbitrary source text (HTML, Go templates, JSX, ...) for runs of
//! characters that can form a utility class name. No parsing of the host
//! language happens here; anything that looks like a class is reported and
//! the registry decides whether it means something.

use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Tokens found in one or more sources, in lexicographic order
pub type TokenSet = BTreeSet<String>;

/// Tokens longer than this are never utility classes
const MAX_TOKEN_LEN: usize = 128;

/// Raw content of one content source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Where the content came from (a path, `stdin`, ...)
    pub origin: String,
    pub content: Vec<u8>,
}

impl SourceText {
    pub fn new(origin: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            origin: origin.into(),
            content: content.into(),
        }
    }
}

/// Non-fatal scan failure for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizeDiagnostic {
    pub origin: String,
    pub reason: String,
}

impl fmt::Display for TokenizeDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.reason)
    }
}

fn class_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[A-Za-z][A-Za-z0-9:/\-]*(?:\.[0-9]+[A-Za-z0-9:/\-]*)*(?:\[[^\s\[\]"'`<>{};]+\])?"#)
            .expect("class pattern is a valid regex")
    })
}

/// Extract candidate class names from text. Total and idempotent.
pub fn scan(text: &str) -> TokenSet {
    class_pattern()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|token| token.len() <= MAX_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Scan one source. Binary-looking or non UTF-8 content yields a diagnostic
/// instead of tokens.
pub fn scan_source(source: &SourceText) -> Result<TokenSet, TokenizeDiagnostic> {
    if source.content.contains(&0) {
        return Err(TokenizeDiagnostic {
            origin: source.origin.clone(),
            reason: "content looks binary (contains NUL bytes)".to_string(),
        });
    }

    match std::str::from_utf8(&source.content) {
        Ok(text) => Ok(scan(text)),
        Err(e) => Err(TokenizeDiagnostic {
            origin: source.origin.clone(),
            reason: format!("content is not valid UTF-8: {}", e),
        }),
    }
}

#[derive(Default)]
struct ScanAccumulator {
    tokens: TokenSet,
    diagnostics: Vec<TokenizeDiagnostic>,
}

impl ScanAccumulator {
    fn merge(mut self, mut other: Self) -> Self {
        if self.tokens.len() < other.tokens.len() {
            std::mem::swap(&mut self.tokens, &mut other.tokens);
        }
        self.tokens.append(&mut other.tokens);
        self.diagnostics.append(&mut other.diagnostics);
        self
    }
}

/// Scan every source in parallel and union the results.
///
/// `jobs` caps the number of worker threads; `None` uses rayon's global pool.
pub fn scan_all(sources: &[SourceText], jobs: Option<usize>) -> (TokenSet, Vec<TokenizeDiagnostic>) {
    let run = || {
        sources
            .par_iter()
            .map(|source| match scan_source(source) {
                Ok(tokens) => ScanAccumulator {
                    tokens,
                    diagnostics: Vec::new(),
                },
                Err(diagnostic) => ScanAccumulator {
                    tokens: TokenSet::new(),
                    diagnostics: vec![diagnostic],
                },
            })
            .reduce(ScanAccumulator::default, ScanAccumulator::merge)
    };

    let mut result = match jobs {
        Some(num_jobs) => match rayon::ThreadPoolBuilder::new().num_threads(num_jobs).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to build scan thread pool, using global pool");
                run()
            }
        },
        None => run(),
    };

    result.diagnostics.sort_by(|a, b| a.origin.cmp(&b.origin));
    for diagnostic in &result.diagnostics {
        tracing::warn!(origin = %diagnostic.origin, reason = %diagnostic.reason, "Skipping unscannable source");
    }

    (result.tokens, result.diagnostics)
}
