use crate::registry::{UtilityRegistry, UtilityRule};
use crate::theme::Theme;
use crate::tokenizer::TokenSet;

/// Generate rules for every token the registry recognises.
///
/// Tokens are visited in lexicographic order (the `TokenSet` ordering), so
/// the output is reproducible regardless of scan order. Unknown tokens are
/// skipped. Identical selectors are not deduplicated here; that is left to
/// the stylesheet writer.
pub fn generate(tokens: &TokenSet, registry: &UtilityRegistry, theme: &Theme) -> Vec<UtilityRule> {
    generate_matched(tokens, registry, theme)
        .into_iter()
        .map(|(_, rule)| rule)
        .collect()
}

/// Like [`generate`], keeping the token each rule was generated for
pub fn generate_matched(
    tokens: &TokenSet,
    registry: &UtilityRegistry,
    theme: &Theme,
) -> Vec<(String, UtilityRule)> {
    let mut matched = Vec::new();

    for token in tokens {
        match registry.resolve(token, theme) {
            Some(rule) => matched.push((token.clone(), rule)),
            None => tracing::trace!(%token, "No utility for token"),
        }
    }

    tracing::debug!(tokens = tokens.len(), rules = matched.len(), "Generated utility rules");
    matched
}
