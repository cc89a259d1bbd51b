//! Runs plugins in order and freezes what they registered into a
//! [`RuleIndex`].

use super::{
    BaseRule, Plugin, PluginContext, Registrations, ResolvedValue, UtilityTemplate, Variant,
    VariantKind,
};
use crate::error::PluginError;
use crate::theme::{ThemeTable, ThemeValue};
use std::collections::HashMap;
use std::sync::Arc;

/// An exact class name bound to a template and a resolved value.
#[derive(Debug, Clone)]
pub struct ExactEntry {
    pub template: Arc<UtilityTemplate>,
    pub value: ResolvedValue,
    pub plugin: Arc<str>,
}

/// Read-only lookup structure shared by matcher workers.
#[derive(Debug, Default)]
pub struct RuleIndex {
    exact: HashMap<String, ExactEntry>,
    dynamic: Vec<Arc<UtilityTemplate>>,
    variants: Vec<Variant>,
    static_variants: HashMap<String, usize>,
    base: Vec<BaseRule>,
    theme: ThemeTable,
}

impl RuleIndex {
    pub fn exact(&self, class: &str) -> Option<&ExactEntry> {
        self.exact.get(class)
    }

    /// Templates reachable by prefix, newest first.
    pub fn dynamic(&self) -> impl Iterator<Item = &UtilityTemplate> {
        self.dynamic.iter().rev().map(Arc::as_ref)
    }

    pub fn static_variant(&self, name: &str) -> Option<&VariantKind> {
        self.static_variants
            .get(name)
            .map(|&idx| &self.variants[idx].kind)
    }

    /// Functional variants whose prefix starts `token`, newest first, paired
    /// with the remainder of the token.
    pub fn functional_variants<'a>(
        &'a self,
        token: &'a str,
    ) -> impl Iterator<Item = (&'a VariantKind, &'a str)> + 'a {
        self.variants.iter().rev().filter_map(move |variant| {
            if !matches!(variant.kind, VariantKind::Functional(_)) {
                return None;
            }
            token
                .strip_prefix(variant.name.as_str())
                .map(|rest| (&variant.kind, rest))
        })
    }

    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|variant| variant.name.as_str())
    }

    pub fn base_rules(&self) -> &[BaseRule] {
        &self.base
    }

    pub fn theme(&self) -> &ThemeTable {
        &self.theme
    }

    pub fn exact_len(&self) -> usize {
        self.exact.len()
    }

    fn commit(&mut self, plugin: &str, registrations: Registrations) {
        let plugin: Arc<str> = Arc::from(plugin);
        for template in registrations.utilities {
            let template = Arc::new(template);
            for (class, value) in expand(&template, &self.theme) {
                let entry = ExactEntry {
                    template: Arc::clone(&template),
                    value,
                    plugin: Arc::clone(&plugin),
                };
                if let Some(previous) = self.exact.insert(class.clone(), entry) {
                    if previous.plugin != plugin {
                        tracing::warn!(
                            class = %class,
                            previous = %previous.plugin,
                            plugin = %plugin,
                            "utility shadowed by later plugin"
                        );
                    }
                }
            }
            if template.is_dynamic() {
                self.dynamic.push(template);
            }
        }
        for variant in registrations.variants {
            if matches!(variant.kind, VariantKind::Static(_)) {
                self.static_variants
                    .insert(variant.name.clone(), self.variants.len());
            }
            self.variants.push(variant);
        }
        self.base.extend(registrations.base);
    }
}

/// Every exact class a template produces against `theme`, in theme order,
/// followed by its extra values.
fn expand(template: &UtilityTemplate, theme: &ThemeTable) -> Vec<(String, ResolvedValue)> {
    if template.fixed {
        return vec![(template.prefix.clone(), ResolvedValue::css(""))];
    }

    let mut out = Vec::new();
    if let Some(tokens) = template
        .category
        .as_deref()
        .and_then(|category| theme.category(category))
    {
        for (key, value) in tokens.flatten() {
            let Some(css) = css_for_theme_value(&value) else {
                continue;
            };
            out.push((
                template.class_for(&key),
                ResolvedValue {
                    css,
                    theme: Some(value),
                    arbitrary: false,
                },
            ));
        }
    }
    for (key, css) in &template.values {
        out.push((template.class_for(key), ResolvedValue::css(css.as_str())));
    }
    out
}

/// `fontSize`-style pairs (`[size, { lineHeight }]`) render as their first
/// element; the declaration function reads the rest from the raw token.
fn css_for_theme_value(value: &ThemeValue) -> Option<String> {
    if let Some(css) = value.to_css() {
        return Some(css);
    }
    value.as_list()?.first()?.to_css()
}

/// Runs `plugins` in order against `theme`. A failing plugin aborts the whole
/// build; nothing it or earlier plugins registered escapes.
pub fn build(theme: ThemeTable, plugins: &[Box<dyn Plugin>]) -> Result<RuleIndex, PluginError> {
    let mut index = RuleIndex {
        theme,
        ..RuleIndex::default()
    };

    for plugin in plugins {
        let mut registrations = Registrations::default();
        {
            let mut ctx = PluginContext::new(plugin.name(), &mut index.theme, &mut registrations);
            plugin.register(&mut ctx)?;
        }
        tracing::debug!(
            plugin = plugin.name(),
            utilities = registrations.utilities.len(),
            variants = registrations.variants.len(),
            base = registrations.base.len(),
            "registered plugin"
        );
        index.commit(plugin.name(), registrations);
    }

    tracing::debug!(
        exact = index.exact.len(),
        dynamic = index.dynamic.len(),
        variants = index.variants.len(),
        "built rule index"
    );
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::build;
    use crate::error::PluginError;
    use crate::plugin::{Plugin, PluginContext, RuleBody, UtilityTemplate, VariantKind};
    use crate::theme::{ThemeTable, ThemeValue, TokenMap};

    struct Fixed {
        name: &'static str,
        value: &'static str,
    }

    impl Plugin for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
            ctx.add_static("card", RuleBody::single("padding", self.value));
            ctx.add_variant("hocus", |shape| shape.append(":hover"));
            Ok(())
        }
    }

    struct Failing;

    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
            ctx.add_static("never", RuleBody::single("color", "red"));
            Err(PluginError::Registration {
                plugin: "failing".to_string(),
                message: "refused".to_string(),
            })
        }
    }

    struct Namespaced;

    impl Plugin for Namespaced {
        fn name(&self) -> &str {
            "namespaced"
        }

        fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
            ctx.add_theme_namespace("gutters", TokenMap::from_iter([("sm", "1rem"), ("lg", "3rem")]));
            ctx.add_utility(UtilityTemplate::property("gutter", "padding-inline").theme("gutters"));
            Ok(())
        }
    }

    #[test]
    fn later_plugin_wins_on_class_collision() {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(Fixed { name: "first", value: "1rem" }),
            Box::new(Fixed { name: "second", value: "2rem" }),
        ];
        let index = build(ThemeTable::new(), &plugins).expect("pipeline builds");
        let entry = index.exact("card").expect("card registered");
        assert_eq!(&*entry.plugin, "second");
        let body = entry.template.apply(&entry.value);
        assert_eq!(body.declarations[0].value, "2rem");
        assert!(matches!(index.static_variant("hocus"), Some(VariantKind::Static(_))));
    }

    #[test]
    fn failing_plugin_aborts_build() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Failing)];
        assert!(matches!(
            build(ThemeTable::new(), &plugins),
            Err(PluginError::Registration { .. })
        ));
    }

    #[test]
    fn namespace_registered_by_plugin_feeds_its_templates() {
        let mut theme = ThemeTable::new();
        theme.set_category("gutters", TokenMap::from_iter([("lg", "4rem")]));
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(Namespaced)];
        let index = build(theme, &plugins).expect("pipeline builds");

        assert_eq!(index.exact("gutter-sm").map(|e| e.value.css.as_str()), Some("1rem"));
        assert_eq!(index.exact("gutter-lg").map(|e| e.value.css.as_str()), Some("4rem"));
        assert_eq!(
            index.theme().get("gutters.sm").and_then(ThemeValue::as_scalar),
            Some("1rem")
        );
    }
}
