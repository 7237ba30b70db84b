//! Plugin host.
//!
//! A plugin is invoked once during setup and handed a [`PluginContext`], a
//! staging buffer whose only capability is [`PluginContext::add_utilities`].
//! The context holds no reference to the registry or to other plugins'
//! output. Once the plugin returns successfully the host commits the staged
//! utilities; if it fails (or panics) the staged utilities are dropped and
//! setup aborts with [`GeneratorError::PluginFailure`].

use crate::errors::{GeneratorError, Result};
use crate::registry::{class_from_selector, Declaration, Origin, UtilityRegistry};
use indexmap::IndexMap;
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// selector -> declarations
pub type UtilityMap = IndexMap<String, Vec<Declaration>>;

/// Error raised by a plugin during setup
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("selector '{0}' is not a simple class selector")]
    InvalidSelector(String),

    #[error("selector '{0}' has no declarations")]
    EmptyDeclarations(String),

    #[error("{0}")]
    Failed(String),
}

/// Write-only registration capability handed to a plugin
#[derive(Debug, Default)]
pub struct PluginContext {
    staged: Vec<(String, Vec<Declaration>)>,
}

impl PluginContext {
    fn new() -> Self {
        Self::default()
    }

    /// Stage utilities. Keys are class selectors such as `.scrollbar-stable`.
    pub fn add_utilities(&mut self, rules: UtilityMap) -> std::result::Result<(), PluginError> {
        for (selector, declarations) in rules {
            let class = class_from_selector(&selector)
                .ok_or_else(|| PluginError::InvalidSelector(selector.clone()))?;
            if declarations.is_empty() {
                return Err(PluginError::EmptyDeclarations(selector));
            }
            self.staged.push((class, declarations));
        }
        Ok(())
    }

    fn into_staged(self) -> Vec<(String, Vec<Declaration>)> {
        self.staged
    }
}

/// A unit of utility registrations applied before generation
pub trait Plugin: Send + Sync {
    /// Name used in diagnostics and conflict notes
    fn name(&self) -> &str;

    fn setup(&self, ctx: &mut PluginContext) -> std::result::Result<(), PluginError>;
}

/// Applies plugins to a registry, strictly in list order
pub struct PluginHost;

impl PluginHost {
    /// Run every plugin and merge its utilities into `registry`.
    ///
    /// The first failing plugin aborts setup; its staged utilities are
    /// discarded and the error names its position in `plugins`.
    pub fn apply(plugins: &[Box<dyn Plugin>], mut registry: UtilityRegistry) -> Result<UtilityRegistry> {
        for (index, plugin) in plugins.iter().enumerate() {
            let name = plugin.name().to_string();
            let staged = Self::run_plugin(index, plugin.as_ref())?;

            tracing::debug!(index, plugin = %name, utilities = staged.len(), "Applying plugin utilities");
            registry.set_origin(Origin::Plugin(name));
            for (class, declarations) in staged {
                registry.register_static(class, declarations);
            }
        }

        registry.set_origin(Origin::Builtin);
        Ok(registry)
    }

    fn run_plugin(index: usize, plugin: &dyn Plugin) -> Result<Vec<(String, Vec<Declaration>)>> {
        let mut ctx = PluginContext::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| plugin.setup(&mut ctx)));

        let failure = |message: String| {
            tracing::warn!(index, plugin = %plugin.name(), error = %message, "Plugin setup failed");
            GeneratorError::PluginFailure {
                index,
                name: plugin.name().to_string(),
                message,
            }
        };

        match outcome {
            Ok(Ok(())) => Ok(ctx.into_staged()),
            Ok(Err(e)) => Err(failure(e.to_string())),
            Err(payload) => Err(failure(panic_message(&*payload))),
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

/// Plugin with a fixed utility map, as written inline in a configuration
#[derive(Debug, Clone)]
pub struct InlinePlugin {
    name: String,
    utilities: UtilityMap,
}

impl InlinePlugin {
    pub fn new(name: impl Into<String>, utilities: UtilityMap) -> Self {
        Self {
            name: name.into(),
            utilities,
        }
    }
}

impl Plugin for InlinePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, ctx: &mut PluginContext) -> std::result::Result<(), PluginError> {
        ctx.add_utilities(self.utilities.clone())
    }
}

/// Prose styles for rendered long-form content
#[derive(Debug, Clone, Copy, Default)]
pub struct TypographyPlugin;

impl TypographyPlugin {
    pub const NAME: &'static str = "typography";
}

impl Plugin for TypographyPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&self, ctx: &mut PluginContext) -> std::result::Result<(), PluginError> {
        let rule = |pairs: &[(&str, &str)]| -> Vec<Declaration> {
            pairs
                .iter()
                .map(|(property, value)| Declaration::new(*property, *value))
                .collect()
        };

        let mut utilities = UtilityMap::new();
        utilities.insert(
            ".prose".to_string(),
            rule(&[
                ("color", "#374151"),
                ("max-width", "65ch"),
                ("font-size", "1rem"),
                ("line-height", "1.75"),
            ]),
        );
        utilities.insert(
            ".prose-sm".to_string(),
            rule(&[("font-size", "0.875rem"), ("line-height", "1.7142857")]),
        );
        utilities.insert(
            ".prose-lg".to_string(),
            rule(&[("font-size", "1.125rem"), ("line-height", "1.7777778")]),
        );
        utilities.insert(
            ".prose-xl".to_string(),
            rule(&[("font-size", "1.25rem"), ("line-height", "1.8")]),
        );
        utilities.insert(".prose-invert".to_string(), rule(&[("color", "#d1d5db")]));

        ctx.add_utilities(utilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::base_registry;
    use crate::theme::{default_theme, Theme};

    fn utilities(entries: &[(&str, &[(&str, &str)])]) -> UtilityMap {
        entries
            .iter()
            .map(|(selector, declarations)| {
                (
                    selector.to_string(),
                    declarations
                        .iter()
                        .map(|(p, v)| Declaration::new(*p, *v))
                        .collect(),
                )
            })
            .collect()
    }

    struct FailingPlugin;

    impl Plugin for FailingPlugin {
        fn name(&self) -> &str {
            "failing"
        }

        fn setup(&self, ctx: &mut PluginContext) -> std::result::Result<(), PluginError> {
            ctx.add_utilities(utilities(&[(".half-done", &[("color", "red")])]))?;
            Err(PluginError::Failed("cannot continue".to_string()))
        }
    }

    struct PanickingPlugin;

    impl Plugin for PanickingPlugin {
        fn name(&self) -> &str {
            "panicking"
        }

        fn setup(&self, _ctx: &mut PluginContext) -> std::result::Result<(), PluginError> {
            panic!("plugin exploded");
        }
    }

    fn theme() -> Theme {
        Theme::from(default_theme())
    }

    #[test]
    fn test_inline_plugin_registers_utility() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(InlinePlugin::new(
            "scrollbar",
            utilities(&[(".scrollbar-stable", &[("overflow-y", "scroll")])]),
        ))];

        let registry = PluginHost::apply(&plugins, base_registry()).unwrap();
        let rule = registry.resolve("scrollbar-stable", &theme()).unwrap();

        assert_eq!(rule.selector, ".scrollbar-stable");
        assert_eq!(rule.declarations, vec![Declaration::new("overflow-y", "scroll")]);
        assert_eq!(
            registry.origin_of("scrollbar-stable"),
            Some(&Origin::Plugin("scrollbar".to_string()))
        );
    }

    #[test]
    fn test_later_plugin_wins() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(InlinePlugin::new("p1", utilities(&[(".x", &[("color", "red")])]))),
            Box::new(InlinePlugin::new("p2", utilities(&[(".x", &[("color", "blue")])]))),
        ];

        let registry = PluginHost::apply(&plugins, UtilityRegistry::new()).unwrap();
        let rule = registry.resolve("x", &theme()).unwrap();

        assert_eq!(rule.declarations, vec![Declaration::new("color", "blue")]);
        assert_eq!(registry.conflicts().len(), 1);
        assert_eq!(registry.conflicts()[0].previous, Origin::Plugin("p1".to_string()));
        assert_eq!(registry.conflicts()[0].current, Origin::Plugin("p2".to_string()));
    }

    #[test]
    fn test_plugin_overrides_builtin_with_conflict_note() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(InlinePlugin::new(
            "flexless",
            utilities(&[(".flex", &[("display", "block")])]),
        ))];

        let registry = PluginHost::apply(&plugins, base_registry()).unwrap();

        assert_eq!(
            registry.resolve("flex", &theme()).unwrap().declarations,
            vec![Declaration::new("display", "block")]
        );
        let note = registry.conflicts().last().unwrap();
        assert_eq!(note.selector, ".flex");
        assert_eq!(note.previous, Origin::Builtin);
    }

    #[test]
    fn test_failing_plugin_reports_position() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(TypographyPlugin),
            Box::new(FailingPlugin),
        ];

        let err = PluginHost::apply(&plugins, base_registry()).unwrap_err();
        match err {
            GeneratorError::PluginFailure { index, name, message } => {
                assert_eq!(index, 1);
                assert_eq!(name, "failing");
                assert!(message.contains("cannot continue"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_failing_plugin_discards_staged_utilities() {
        // Staged rules are only handed back after a successful setup.
        let result = PluginHost::run_plugin(0, &FailingPlugin);
        assert!(result.is_err());

        let staged = PluginHost::run_plugin(0, &TypographyPlugin).unwrap();
        assert_eq!(staged.len(), 5);
    }

    #[test]
    fn test_panicking_plugin_becomes_failure() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(PanickingPlugin)];

        let err = PluginHost::apply(&plugins, base_registry()).unwrap_err();
        match err {
            GeneratorError::PluginFailure { index, message, .. } => {
                assert_eq!(index, 0);
                assert!(message.contains("plugin exploded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_selector_rejected() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(InlinePlugin::new(
            "nested",
            utilities(&[(".prose h1", &[("font-weight", "800")])]),
        ))];

        let err = PluginHost::apply(&plugins, base_registry()).unwrap_err();
        assert!(err.to_string().contains("not a simple class selector"));
    }

    #[test]
    fn test_code_point_escaped_selector_accepted() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(InlinePlugin::new(
            "boxes",
            utilities(&[(".\\32 xl-box", &[("width", "42rem")])]),
        ))];

        let registry = PluginHost::apply(&plugins, base_registry()).unwrap();
        let rule = registry.resolve("2xl-box", &theme()).unwrap();

        assert_eq!(rule.selector, ".\\32 xl-box");
        assert_eq!(rule.declarations, vec![Declaration::new("width", "42rem")]);
    }

    #[test]
    fn test_typography_plugin() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(TypographyPlugin)];
        let registry = PluginHost::apply(&plugins, base_registry()).unwrap();

        let prose = registry.resolve("prose", &theme()).unwrap();
        assert!(prose.declarations.contains(&Declaration::new("max-width", "65ch")));
        assert!(registry.resolve("prose-invert", &theme()).is_some());
    }

    #[test]
    fn test_empty_declarations_rejected() {
        let mut ctx = PluginContext::new();
        let err = ctx
            .add_utilities(utilities(&[(".empty", &[])]))
            .unwrap_err();
        assert!(matches!(err, PluginError::EmptyDeclarations(_)));
    }
}
