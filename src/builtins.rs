//! Built-in utilities registered before any plugin.

use crate::registry::{Declaration, UtilityRegistry, UtilityValue};
use crate::theme::Theme;

const DISPLAY: &[(&str, &str)] = &[
    ("block", "block"),
    ("inline-block", "inline-block"),
    ("inline", "inline"),
    ("flex", "flex"),
    ("inline-flex", "inline-flex"),
    ("grid", "grid"),
    ("hidden", "none"),
];

const STATIC: &[(&str, &[(&str, &str)])] = &[
    ("flex-row", &[("flex-direction", "row")]),
    ("flex-col", &[("flex-direction", "column")]),
    ("flex-wrap", &[("flex-wrap", "wrap")]),
    ("items-start", &[("align-items", "flex-start")]),
    ("items-center", &[("align-items", "center")]),
    ("items-end", &[("align-items", "flex-end")]),
    ("justify-start", &[("justify-content", "flex-start")]),
    ("justify-center", &[("justify-content", "center")]),
    ("justify-end", &[("justify-content", "flex-end")]),
    ("justify-between", &[("justify-content", "space-between")]),
    ("text-left", &[("text-align", "left")]),
    ("text-center", &[("text-align", "center")]),
    ("text-right", &[("text-align", "right")]),
    ("italic", &[("font-style", "italic")]),
    ("underline", &[("text-decoration-line", "underline")]),
    ("uppercase", &[("text-transform", "uppercase")]),
    ("lowercase", &[("text-transform", "lowercase")]),
    ("relative", &[("position", "relative")]),
    ("absolute", &[("position", "absolute")]),
    ("fixed", &[("position", "fixed")]),
    ("sticky", &[("position", "sticky")]),
    ("overflow-auto", &[("overflow", "auto")]),
    ("overflow-hidden", &[("overflow", "hidden")]),
    ("overflow-scroll", &[("overflow", "scroll")]),
    ("overflow-x-auto", &[("overflow-x", "auto")]),
    ("overflow-y-auto", &[("overflow-y", "auto")]),
    ("border", &[("border-width", "1px")]),
    ("shadow", &[("box-shadow", "0 1px 3px 0 rgb(0 0 0 / 0.1), 0 1px 2px -1px rgb(0 0 0 / 0.1)")]),
    ("w-full", &[("width", "100%")]),
    ("h-full", &[("height", "100%")]),
    ("w-screen", &[("width", "100vw")]),
    ("h-screen", &[("height", "100vh")]),
    ("mx-auto", &[("margin-left", "auto"), ("margin-right", "auto")]),
];

/// Spacing patterns: prefix -> properties
const SPACING: &[(&str, &[&str])] = &[
    ("p", &["padding"]),
    ("px", &["padding-left", "padding-right"]),
    ("py", &["padding-top", "padding-bottom"]),
    ("pt", &["padding-top"]),
    ("pr", &["padding-right"]),
    ("pb", &["padding-bottom"]),
    ("pl", &["padding-left"]),
    ("m", &["margin"]),
    ("mx", &["margin-left", "margin-right"]),
    ("my", &["margin-top", "margin-bottom"]),
    ("mt", &["margin-top"]),
    ("mr", &["margin-right"]),
    ("mb", &["margin-bottom"]),
    ("ml", &["margin-left"]),
    ("w", &["width"]),
    ("h", &["height"]),
    ("gap", &["gap"]),
    ("gap-x", &["column-gap"]),
    ("gap-y", &["row-gap"]),
];

/// Register every built-in utility
pub fn register_builtins(registry: &mut UtilityRegistry) {
    for (class, display) in DISPLAY {
        registry.register_static(*class, vec![Declaration::new("display", *display)]);
    }

    for (class, declarations) in STATIC {
        let declarations = declarations
            .iter()
            .map(|(property, value)| Declaration::new(*property, *value))
            .collect();
        registry.register_static(*class, declarations);
    }

    for (prefix, properties) in SPACING {
        registry.register_pattern(*prefix, move |value, theme| {
            let resolved = themed_value(value, theme, "spacing")?;
            Some(
                properties
                    .iter()
                    .map(|property| Declaration::new(*property, resolved.clone()))
                    .collect(),
            )
        });
    }

    // text-{fontSize} and text-{color} share a prefix; each factory declines
    // values it does not own.
    registry.register_pattern("text", |value, theme| match value {
        UtilityValue::Named(key) => {
            let size = theme.get("fontSize", key)?;
            let mut declarations = vec![Declaration::new("font-size", size)];
            if let Some(line_height) = theme.get("lineHeight", key) {
                declarations.push(Declaration::new("line-height", line_height));
            }
            Some(declarations)
        }
        UtilityValue::Arbitrary(raw) if looks_like_length(raw) => {
            Some(vec![Declaration::new("font-size", raw.as_str())])
        }
        _ => None,
    });
    registry.register_pattern("text", |value, theme| {
        color_value(value, theme).map(|color| vec![Declaration::new("color", color)])
    });

    registry.register_pattern("bg", |value, theme| {
        color_value(value, theme).map(|color| vec![Declaration::new("background-color", color)])
    });

    registry.register_pattern("border", |value, theme| {
        color_value(value, theme).map(|color| vec![Declaration::new("border-color", color)])
    });

    registry.register_pattern("font", |value, theme| {
        themed_value(value, theme, "fontWeight")
            .map(|weight| vec![Declaration::new("font-weight", weight)])
    });

    registry.register_pattern("leading", |value, theme| {
        themed_value(value, theme, "lineHeight")
            .map(|height| vec![Declaration::new("line-height", height)])
    });

    registry.register_pattern("rounded", |value, theme| {
        let radius = match value {
            UtilityValue::Bare => theme.get("borderRadius", "DEFAULT")?.to_string(),
            other => themed_value(other, theme, "borderRadius")?,
        };
        Some(vec![Declaration::new("border-radius", radius)])
    });

    registry.register_pattern("max-w", |value, theme| {
        themed_value(value, theme, "maxWidth")
            .map(|width| vec![Declaration::new("max-width", width)])
    });
}

/// A registry holding only the built-in utilities
pub fn base_registry() -> UtilityRegistry {
    let mut registry = UtilityRegistry::new();
    register_builtins(&mut registry);
    registry
}

fn themed_value(value: &UtilityValue, theme: &Theme, category: &str) -> Option<String> {
    match value {
        UtilityValue::Named(key) => theme.get(category, key).map(str::to_string),
        UtilityValue::Arbitrary(raw) => Some(raw.clone()),
        UtilityValue::Bare => None,
    }
}

fn color_value(value: &UtilityValue, theme: &Theme) -> Option<String> {
    match value {
        UtilityValue::Named(key) => theme.get("colors", key).map(str::to_string),
        UtilityValue::Arbitrary(raw) if looks_like_color(raw) => Some(raw.clone()),
        _ => None,
    }
}

fn looks_like_color(raw: &str) -> bool {
    raw.starts_with('#') || raw.starts_with("rgb") || raw.starts_with("hsl")
}

fn looks_like_length(raw: &str) -> bool {
    raw.starts_with(|c: char| c.is_ascii_digit() || c == '.')
}
