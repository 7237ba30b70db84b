//! Theme resolution.
//!
//! A theme is a two-level mapping of design tokens: category (`colors`,
//! `spacing`, ...) to token (`red`, `4`, ...) to CSS value. The configured
//! `extend` map is layered over the base theme with [`merge`]: an `extend`
//! entry replaces the base entry for the same (category, token) pair and
//! every other base entry is kept.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// category -> token -> value
pub type ThemeMap = IndexMap<String, IndexMap<String, String>>;

/// Base theme plus the caller-supplied extension
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeSpec {
    pub base: ThemeMap,
    pub extend: ThemeMap,
}

impl ThemeSpec {
    /// Extension over the built-in default theme
    pub fn extending_default(extend: ThemeMap) -> Self {
        Self {
            base: default_theme(),
            extend,
        }
    }

    /// Merge `extend` over `base`
    pub fn resolve(&self) -> Theme {
        merge(&self.base, &self.extend)
    }
}

/// The resolved theme used by rule factories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme {
    values: ThemeMap,
}

impl Theme {
    pub fn get(&self, category: &str, token: &str) -> Option<&str> {
        self.values
            .get(category)
            .and_then(|tokens| tokens.get(token))
            .map(String::as_str)
    }

    pub fn category(&self, category: &str) -> Option<&IndexMap<String, String>> {
        self.values.get(category)
    }

    pub fn as_map(&self) -> &ThemeMap {
        &self.values
    }

    pub fn into_map(self) -> ThemeMap {
        self.values
    }
}

impl From<ThemeMap> for Theme {
    fn from(values: ThemeMap) -> Self {
        Self { values }
    }
}

/// Deep-merge `extend` over `base` without touching either input.
///
/// Base categories keep their order, new categories from `extend` are
/// appended. Inside a category, base tokens come first and tokens only
/// present in `extend` follow in `extend` order.
pub fn merge(base: &ThemeMap, extend: &ThemeMap) -> Theme {
    let mut values = base.clone();

    for (category, tokens) in extend {
        let target = values.entry(category.clone()).or_default();
        for (token, value) in tokens {
            target.insert(token.clone(), value.clone());
        }
    }

    Theme { values }
}

const COLORS: &[(&str, &str)] = &[
    ("inherit", "inherit"),
    ("current", "currentColor"),
    ("transparent", "transparent"),
    ("black", "#000"),
    ("white", "#fff"),
    ("gray-100", "#f3f4f6"),
    ("gray-200", "#e5e7eb"),
    ("gray-300", "#d1d5db"),
    ("gray-500", "#6b7280"),
    ("gray-600", "#4b5563"),
    ("gray-700", "#374151"),
    ("gray-900", "#111827"),
    ("red-500", "#ef4444"),
    ("red-600", "#dc2626"),
    ("green-500", "#22c55e"),
    ("green-600", "#16a34a"),
    ("blue-500", "#3b82f6"),
    ("blue-600", "#2563eb"),
    ("yellow-400", "#facc15"),
];

const SPACING: &[(&str, &str)] = &[
    ("px", "1px"),
    ("0", "0px"),
    ("0.5", "0.125rem"),
    ("1", "0.25rem"),
    ("1.5", "0.375rem"),
    ("2", "0.5rem"),
    ("3", "0.75rem"),
    ("4", "1rem"),
    ("5", "1.25rem"),
    ("6", "1.5rem"),
    ("8", "2rem"),
    ("10", "2.5rem"),
    ("12", "3rem"),
    ("16", "4rem"),
    ("20", "5rem"),
    ("24", "6rem"),
    ("32", "8rem"),
    ("48", "12rem"),
    ("64", "16rem"),
];

const FONT_SIZE: &[(&str, &str)] = &[
    ("xs", "0.75rem"),
    ("sm", "0.875rem"),
    ("base", "1rem"),
    ("lg", "1.125rem"),
    ("xl", "1.25rem"),
    ("2xl", "1.5rem"),
    ("3xl", "1.875rem"),
    ("4xl", "2.25rem"),
];

// Paired with fontSize: `text-lg` emits both.
const LINE_HEIGHT: &[(&str, &str)] = &[
    ("xs", "1rem"),
    ("sm", "1.25rem"),
    ("base", "1.5rem"),
    ("lg", "1.75rem"),
    ("xl", "1.75rem"),
    ("2xl", "2rem"),
    ("3xl", "2.25rem"),
    ("4xl", "2.5rem"),
];

const FONT_WEIGHT: &[(&str, &str)] = &[
    ("light", "300"),
    ("normal", "400"),
    ("medium", "500"),
    ("semibold", "600"),
    ("bold", "700"),
];

const BORDER_RADIUS: &[(&str, &str)] = &[
    ("none", "0px"),
    ("sm", "0.125rem"),
    ("DEFAULT", "0.25rem"),
    ("md", "0.375rem"),
    ("lg", "0.5rem"),
    ("xl", "0.75rem"),
    ("full", "9999px"),
];

const MAX_WIDTH: &[(&str, &str)] = &[
    ("sm", "24rem"),
    ("md", "28rem"),
    ("lg", "32rem"),
    ("xl", "36rem"),
    ("prose", "65ch"),
    ("full", "100%"),
    ("none", "none"),
];

/// The built-in base theme
pub fn default_theme() -> ThemeMap {
    let categories: [(&str, &[(&str, &str)]); 7] = [
        ("colors", COLORS),
        ("spacing", SPACING),
        ("fontSize", FONT_SIZE),
        ("lineHeight", LINE_HEIGHT),
        ("fontWeight", FONT_WEIGHT),
        ("borderRadius", BORDER_RADIUS),
        ("maxWidth", MAX_WIDTH),
    ];

    categories
        .iter()
        .map(|(category, tokens)| {
            let tokens = tokens
                .iter()
                .map(|(token, value)| (token.to_string(), value.to_string()))
                .collect();
            (category.to_string(), tokens)
        })
        .collect()
}
