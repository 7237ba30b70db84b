//! Utility registry: maps class names and class-name patterns to rule factories.

use crate::theme::Theme;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A single CSS declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Declaration {
    /// CSS property name (e.g. "padding")
    pub property: String,
    /// CSS value (e.g. "1rem")
    pub value: String,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// A generated CSS rule. The selector is its identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtilityRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

impl UtilityRule {
    /// Rule for the class `class`, selector escaped as CSS requires
    pub fn for_class(class: &str, declarations: Vec<Declaration>) -> Self {
        Self {
            selector: class_selector(class),
            declarations,
        }
    }
}

/// The value part of a token, as seen by a rule factory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtilityValue {
    /// Literal registration, or a pattern token with no value (`rounded`)
    Bare,
    /// `p-4` -> `4`
    Named(String),
    /// `w-[13px]` -> `13px`; underscores become spaces
    Arbitrary(String),
}

/// Pure function from a token value and theme to declarations.
///
/// Returning `None` means the factory does not apply to this value, letting
/// another pattern with the same prefix try.
pub type RuleFactory = Arc<dyn Fn(&UtilityValue, &Theme) -> Option<Vec<Declaration>> + Send + Sync>;

/// Where a registration came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    Builtin,
    Plugin(String),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Builtin => write!(f, "builtin"),
            Origin::Plugin(name) => write!(f, "plugin:{}", name),
        }
    }
}

/// A selector registered twice; `current` shadows `previous`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictNote {
    pub selector: String,
    pub previous: Origin,
    pub current: Origin,
}

#[derive(Clone)]
struct Entry {
    origin: Origin,
    factory: RuleFactory,
}

#[derive(Clone)]
struct PatternEntry {
    prefix: String,
    origin: Origin,
    factory: RuleFactory,
}

/// Registry of utilities. Built once per run, then read-only.
#[derive(Clone, Default)]
pub struct UtilityRegistry {
    literals: IndexMap<String, Entry>,
    patterns: Vec<PatternEntry>,
    conflicts: Vec<ConflictNote>,
    origin: Option<Origin>,
}

impl fmt::Debug for UtilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtilityRegistry")
            .field("literals", &self.literals.keys().collect::<Vec<_>>())
            .field(
                "patterns",
                &self.patterns.iter().map(|p| p.prefix.as_str()).collect::<Vec<_>>(),
            )
            .field("conflicts", &self.conflicts)
            .finish()
    }
}

impl UtilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Origin recorded for subsequent registrations (built-in by default)
    pub(crate) fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    fn current_origin(&self) -> Origin {
        self.origin.clone().unwrap_or(Origin::Builtin)
    }

    /// Register a literal utility class. A later registration for the same
    /// class replaces the earlier one and records a conflict note.
    pub fn register<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn(&UtilityValue, &Theme) -> Option<Vec<Declaration>> + Send + Sync + 'static,
    {
        self.register_factory(class.into(), Arc::new(factory));
    }

    pub(crate) fn register_factory(&mut self, class: String, factory: RuleFactory) {
        let origin = self.current_origin();
        let entry = Entry {
            origin: origin.clone(),
            factory,
        };

        if let Some(previous) = self.literals.insert(class.clone(), entry) {
            let note = ConflictNote {
                selector: class_selector(&class),
                previous: previous.origin,
                current: origin,
            };
            tracing::warn!(
                selector = %note.selector,
                previous = %note.previous,
                current = %note.current,
                "Utility selector registered twice; later registration wins"
            );
            self.conflicts.push(note);
        }
    }

    /// Register a utility with fixed declarations
    pub fn register_static(&mut self, class: impl Into<String>, declarations: Vec<Declaration>) {
        self.register(class, move |_, _| Some(declarations.clone()));
    }

    /// Register a pattern matching `<prefix>-<value>` (and a bare `<prefix>`)
    pub fn register_pattern<F>(&mut self, prefix: impl Into<String>, factory: F)
    where
        F: Fn(&UtilityValue, &Theme) -> Option<Vec<Declaration>> + Send + Sync + 'static,
    {
        let origin = self.current_origin();
        self.patterns.push(PatternEntry {
            prefix: prefix.into(),
            origin,
            factory: Arc::new(factory),
        });
    }

    /// Resolve a token: literal classes first, then patterns (longest prefix
    /// first, most recent registration first among equal prefixes).
    pub fn resolve(&self, token: &str, theme: &Theme) -> Option<UtilityRule> {
        if let Some(entry) = self.literals.get(token) {
            return (entry.factory)(&UtilityValue::Bare, theme)
                .filter(|declarations| !declarations.is_empty())
                .map(|declarations| UtilityRule::for_class(token, declarations));
        }

        let mut candidates: Vec<(usize, &PatternEntry)> = self
            .patterns
            .iter()
            .enumerate()
            .filter(|(_, pattern)| token.starts_with(pattern.prefix.as_str()))
            .collect();
        candidates.sort_by(|(ia, a), (ib, b)| {
            b.prefix.len().cmp(&a.prefix.len()).then(ib.cmp(ia))
        });

        for (_, pattern) in candidates {
            let Some(value) = parse_value(token, &pattern.prefix) else {
                continue;
            };
            if let Some(declarations) = (pattern.factory)(&value, theme) {
                if !declarations.is_empty() {
                    return Some(UtilityRule::for_class(token, declarations));
                }
            }
        }

        None
    }

    /// Whether `class` has a literal registration
    pub fn contains(&self, class: &str) -> bool {
        self.literals.contains_key(class)
    }

    /// Origin of the literal registration for `class`
    pub fn origin_of(&self, class: &str) -> Option<&Origin> {
        self.literals.get(class).map(|entry| &entry.origin)
    }

    pub fn literal_count(&self) -> usize {
        self.literals.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn conflicts(&self) -> &[ConflictNote] {
        &self.conflicts
    }
}

fn parse_value(token: &str, prefix: &str) -> Option<UtilityValue> {
    let rest = token.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(UtilityValue::Bare);
    }

    let value = rest.strip_prefix('-')?;
    if value.is_empty() {
        return None;
    }

    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        if inner.is_empty() || !is_safe_arbitrary(inner) {
            return None;
        }
        return Some(UtilityValue::Arbitrary(inner.replace('_', " ")));
    }

    if value.contains('[') || value.contains(']') {
        return None;
    }

    Some(UtilityValue::Named(value.to_string()))
}

/// Arbitrary values are copied into declarations verbatim, so anything that
/// could escape the declaration (comments, backslash escapes, stray
/// parentheses) is refused.
fn is_safe_arbitrary(raw: &str) -> bool {
    if raw.contains('\\') || raw.contains("/*") || raw.contains("*/") {
        return false;
    }

    let mut depth = 0usize;
    for ch in raw.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                let Some(next) = depth.checked_sub(1) else {
                    return false;
                };
                depth = next;
            }
            _ => {}
        }
    }
    depth == 0
}

/// `.` followed by the class name with CSS escapes applied
pub fn class_selector(class: &str) -> String {
    let mut selector = String::with_capacity(class.len() + 2);
    selector.push('.');

    for (i, ch) in class.chars().enumerate() {
        if i == 0 && ch.is_ascii_digit() {
            // Leading digits must use a code point escape.
            selector.push_str(&format!("\\3{} ", ch));
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii() {
            selector.push(ch);
        } else {
            selector.push('\\');
            selector.push(ch);
        }
    }

    selector
}

/// Class name of a simple class selector (`.name`), unescaping `\x` and
/// code point (`\32 `) sequences. Returns `None` for anything that is not a
/// single class selector.
pub fn class_from_selector(selector: &str) -> Option<String> {
    let body = selector.trim().strip_prefix('.')?;
    let mut class = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                let mut hex = String::new();
                while hex.len() < 6 {
                    match chars.peek() {
                        Some(c) if c.is_ascii_hexdigit() => {
                            hex.push(*c);
                            chars.next();
                        }
                        _ => break,
                    }
                }

                if hex.is_empty() {
                    class.push(chars.next()?);
                } else {
                    let code = u32::from_str_radix(&hex, 16).ok()?;
                    class.push(char::from_u32(code)?);
                    // A single whitespace terminates the escape.
                    if chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
                        chars.next();
                    }
                }
            }
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() => class.push(c),
            _ => return None,
        }
    }

    if class.is_empty() {
        None
    } else {
        Some(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{default_theme, Theme};

    fn theme() -> Theme {
        Theme::from(default_theme())
    }

    #[test]
    fn test_literal_resolution() {
        let mut registry = UtilityRegistry::new();
        registry.register_static("flex", vec![Declaration::new("display", "flex")]);

        let rule = registry.resolve("flex", &theme()).unwrap();
        assert_eq!(rule.selector, ".flex");
        assert_eq!(rule.declarations, vec![Declaration::new("display", "flex")]);
        assert!(registry.resolve("grid", &theme()).is_none());
    }

    #[test]
    fn test_literal_beats_pattern() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("p", |_, _| Some(vec![Declaration::new("padding", "1px")]));
        registry.register_static("p-4", vec![Declaration::new("padding", "99px")]);

        let rule = registry.resolve("p-4", &theme()).unwrap();
        assert_eq!(rule.declarations[0].value, "99px");
    }

    #[test]
    fn test_pattern_uses_theme_and_arbitrary_values() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("p", |value, theme| {
            let resolved = match value {
                UtilityValue::Named(key) => theme.get("spacing", key)?.to_string(),
                UtilityValue::Arbitrary(raw) => raw.clone(),
                UtilityValue::Bare => return None,
            };
            Some(vec![Declaration::new("padding", resolved)])
        });

        let theme = theme();
        assert_eq!(registry.resolve("p-4", &theme).unwrap().declarations[0].value, "1rem");
        let arbitrary = registry.resolve("p-[13px]", &theme).unwrap();
        assert_eq!(arbitrary.declarations[0].value, "13px");
        assert_eq!(arbitrary.selector, ".p-\\[13px\\]");
        assert!(registry.resolve("p-unknown", &theme).is_none());
        assert!(registry.resolve("p", &theme).is_none());
    }

    #[test]
    fn test_longest_prefix_first() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("p", |_, _| Some(vec![Declaration::new("padding", "a")]));
        registry.register_pattern("px", |_, _| {
            Some(vec![Declaration::new("padding-left", "b")])
        });

        let rule = registry.resolve("px-4", &theme()).unwrap();
        assert_eq!(rule.declarations[0].property, "padding-left");
    }

    #[test]
    fn test_pattern_fallthrough_on_none() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("text", |value, theme| match value {
            UtilityValue::Named(key) => theme
                .get("fontSize", key)
                .map(|size| vec![Declaration::new("font-size", size)]),
            _ => None,
        });
        registry.register_pattern("text", |value, theme| match value {
            UtilityValue::Named(key) => theme
                .get("colors", key)
                .map(|color| vec![Declaration::new("color", color)]),
            _ => None,
        });

        let theme = theme();
        assert_eq!(registry.resolve("text-lg", &theme).unwrap().declarations[0].property, "font-size");
        assert_eq!(registry.resolve("text-white", &theme).unwrap().declarations[0].property, "color");
    }

    #[test]
    fn test_prefix_must_end_at_hyphen() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("p", |_, _| Some(vec![Declaration::new("padding", "0")]));

        assert!(registry.resolve("prose", &theme()).is_none());
        assert!(registry.resolve("p-", &theme()).is_none());
    }

    #[test]
    fn test_later_registration_wins_with_conflict_note() {
        let mut registry = UtilityRegistry::new();
        registry.register_static("x", vec![Declaration::new("color", "red")]);
        registry.set_origin(Origin::Plugin("override".to_string()));
        registry.register_static("x", vec![Declaration::new("color", "blue")]);

        let rule = registry.resolve("x", &theme()).unwrap();
        assert_eq!(rule.declarations[0].value, "blue");
        assert_eq!(registry.literal_count(), 1);
        assert_eq!(
            registry.conflicts(),
            &[ConflictNote {
                selector: ".x".to_string(),
                previous: Origin::Builtin,
                current: Origin::Plugin("override".to_string()),
            }]
        );
    }

    #[test]
    fn test_class_selector_escaping() {
        assert_eq!(class_selector("text-lg"), ".text-lg");
        assert_eq!(class_selector("w-1/2"), ".w-1\\/2");
        assert_eq!(class_selector("hover:bg-white"), ".hover\\:bg-white");
        assert_eq!(class_selector("bg-[#fff]"), ".bg-\\[\\#fff\\]");
        assert_eq!(class_selector("p-0.5"), ".p-0\\.5");
        assert_eq!(class_selector("2xl"), ".\\32 xl");
    }

    #[test]
    fn test_class_from_selector() {
        assert_eq!(class_from_selector(".scrollbar-stable"), Some("scrollbar-stable".to_string()));
        assert_eq!(class_from_selector(".w-1\\/2"), Some("w-1/2".to_string()));
        assert_eq!(class_from_selector("scrollbar-stable"), None);
        assert_eq!(class_from_selector(".prose h1"), None);
        assert_eq!(class_from_selector("."), None);
    }

    #[test]
    fn test_class_from_selector_code_point_escapes() {
        assert_eq!(class_from_selector(".\\32 xl-box"), Some("2xl-box".to_string()));
        assert_eq!(class_from_selector(".\\000032xl"), Some("2xl".to_string()));
        assert_eq!(class_from_selector(".\\110000 x"), None);

        for class in ["2xl", "w-1/2", "hover:bg-white", "p-0.5"] {
            assert_eq!(class_from_selector(&class_selector(class)), Some(class.to_string()));
        }
    }

    #[test]
    fn test_unsafe_arbitrary_values_are_refused() {
        let mut registry = UtilityRegistry::new();
        registry.register_pattern("w", |value, _| match value {
            UtilityValue::Arbitrary(raw) => Some(vec![Declaration::new("width", raw.as_str())]),
            _ => None,
        });

        let theme = theme();
        for token in ["w-[/*]", "w-[*/]", "w-[a/*b]", "w-[\\]", "w-[calc(1px]", "w-[1px)]", "w-[)(]"] {
            assert!(registry.resolve(token, &theme).is_none(), "{} should not resolve", token);
        }
        assert_eq!(
            registry.resolve("w-[calc(100%_-_1rem)]", &theme).unwrap().declarations[0].value,
            "calc(100% - 1rem)"
        );
        assert_eq!(registry.resolve("w-[1/2]", &theme).unwrap().declarations[0].value, "1/2");
    }
}
