//! Plugin contract and the building blocks plugins register.
//!
//! A plugin receives a [`PluginContext`] and registers utility templates,
//! variants, base rules and theme namespaces through it. The pipeline
//! ([`pipeline::build`]) runs plugins in order and freezes the result into a
//! read-only [`pipeline::RuleIndex`].

pub mod container_queries;
pub mod core;
pub mod forms;
pub mod pipeline;
pub mod typography;

use crate::config::PluginRef;
use crate::error::PluginError;
use crate::theme::{ThemeTable, ThemeValue, TokenMap};
use std::fmt;
use std::sync::Arc;

/// Output layer of an emitted rule, in serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Base,
    Components,
    Utilities,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Base, Layer::Components, Layer::Utilities];

    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Base => "base",
            Layer::Components => "components",
            Layer::Utilities => "utilities",
        }
    }

    pub(crate) fn slot(self) -> usize {
        match self {
            Layer::Base => 0,
            Layer::Components => 1,
            Layer::Utilities => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }
}

/// Declarations scoped under the matched selector plus a suffix, e.g.
/// ` > :not([hidden]) ~ :not([hidden])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NestedRule {
    pub selector_suffix: String,
    pub declarations: Vec<Declaration>,
}

/// What a declaration function produces for one resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RuleBody {
    pub declarations: Vec<Declaration>,
    pub nested: Vec<NestedRule>,
}

impl RuleBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new().decl(property, value)
    }

    pub fn decl(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.declarations.push(Declaration::new(property, value));
        self
    }

    pub fn nested(mut self, selector_suffix: impl Into<String>, declarations: Vec<Declaration>) -> Self {
        self.nested.push(NestedRule {
            selector_suffix: selector_suffix.into(),
            declarations,
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.nested.iter().all(|rule| rule.declarations.is_empty())
    }
}

/// Value handed to a declaration function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Ready-to-emit CSS text, already negated or opacity-mixed.
    pub css: String,
    /// The raw theme token when the value came from the theme.
    pub theme: Option<ThemeValue>,
    pub arbitrary: bool,
}

impl ResolvedValue {
    pub fn css(value: impl Into<String>) -> Self {
        Self {
            css: value.into(),
            theme: None,
            arbitrary: false,
        }
    }
}

/// Kind of value an arbitrary-value template accepts. Lets `text-[14px]` and
/// `text-[#333]` land on different templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Any,
    Length,
    Color,
}

pub type DeclFn = Arc<dyn Fn(&ResolvedValue) -> RuleBody + Send + Sync>;
pub type ValueParser = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Pattern plus declaration function.
///
/// A template is expanded by the pipeline into one exact class per theme key
/// and per extra value. Templates that accept arbitrary values or carry a
/// value parser additionally stay reachable by prefix for dynamic forms.
#[derive(Clone)]
pub struct UtilityTemplate {
    pub(crate) prefix: String,
    pub(crate) separator: char,
    pub(crate) category: Option<String>,
    pub(crate) values: Vec<(String, String)>,
    pub(crate) arbitrary: Option<ValueType>,
    pub(crate) parser: Option<ValueParser>,
    pub(crate) negative: bool,
    pub(crate) opacity: bool,
    pub(crate) fixed: bool,
    pub(crate) layer: Layer,
    pub(crate) declare: DeclFn,
}

impl fmt::Debug for UtilityTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UtilityTemplate")
            .field("prefix", &self.prefix)
            .field("category", &self.category)
            .field("arbitrary", &self.arbitrary)
            .field("layer", &self.layer)
            .finish_non_exhaustive()
    }
}

impl UtilityTemplate {
    pub fn new<F>(prefix: impl Into<String>, declare: F) -> Self
    where
        F: Fn(&ResolvedValue) -> RuleBody + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.into(),
            separator: '-',
            category: None,
            values: Vec::new(),
            arbitrary: None,
            parser: None,
            negative: false,
            opacity: false,
            fixed: false,
            layer: Layer::Utilities,
            declare: Arc::new(declare),
        }
    }

    /// Template whose value lands in each of `properties`.
    pub fn properties(prefix: impl Into<String>, properties: &[&str]) -> Self {
        let properties = properties.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        Self::new(prefix, move |value| {
            properties.iter().fold(RuleBody::new(), |body, property| {
                body.decl(property.as_str(), value.css.as_str())
            })
        })
    }

    pub fn property(prefix: impl Into<String>, property: &str) -> Self {
        Self::properties(prefix, &[property])
    }

    /// A class with a fixed body and no value.
    pub fn fixed(name: impl Into<String>, body: RuleBody) -> Self {
        let mut template = Self::new(name, move |_| body.clone());
        template.fixed = true;
        template
    }

    pub fn theme(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Extra named values on top of the bound theme category.
    pub fn values<I, K, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(key, value)| (key.into(), value.into())));
        self
    }

    pub fn arbitrary(mut self, value_type: ValueType) -> Self {
        self.arbitrary = Some(value_type);
        self
    }

    pub fn parse<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.parser = Some(Arc::new(parser));
        self
    }

    pub fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    pub fn opacity(mut self) -> Self {
        self.opacity = true;
        self
    }

    pub fn layer(mut self, layer: Layer) -> Self {
        self.layer = layer;
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub(crate) fn is_dynamic(&self) -> bool {
        !self.fixed && (self.arbitrary.is_some() || self.parser.is_some())
    }

    /// Class name for a key of this template; `DEFAULT` names the bare prefix.
    pub(crate) fn class_for(&self, key: &str) -> String {
        if key == "DEFAULT" {
            self.prefix.clone()
        } else {
            format!("{}{}{}", self.prefix, self.separator, key)
        }
    }

    pub(crate) fn apply(&self, value: &ResolvedValue) -> RuleBody {
        (self.declare)(value)
    }
}

/// Mutable description of the rule a variant chain is shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleShape {
    pub selector: String,
    pub pseudo_element: Option<String>,
    /// At-rule preludes, outermost first.
    pub wrappers: Vec<String>,
    pub needs_content: bool,
}

impl RuleShape {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            pseudo_element: None,
            wrappers: Vec::new(),
            needs_content: false,
        }
    }

    /// Appends to the selector, ahead of any pseudo-element.
    pub fn append(&mut self, suffix: &str) {
        self.selector.push_str(suffix);
    }

    /// Places the current selector inside `template` at `&`.
    pub fn replace_self(&mut self, template: &str) {
        self.selector = template.replace('&', &self.selector);
    }

    /// Wraps the rule in an at-rule outside every wrapper applied so far.
    pub fn wrap(&mut self, at_rule: impl Into<String>) {
        self.wrappers.insert(0, at_rule.into());
    }

    pub fn final_selector(&self) -> String {
        match &self.pseudo_element {
            Some(pseudo) => format!("{}{}", self.selector, pseudo),
            None => self.selector.clone(),
        }
    }
}

pub type VariantFn = Arc<dyn Fn(&mut RuleShape) + Send + Sync>;
pub type VariantParser = Arc<dyn Fn(&str, &mut RuleShape) -> bool + Send + Sync>;

#[derive(Clone)]
pub enum VariantKind {
    /// Matches exactly its name.
    Static(VariantFn),
    /// Matches any token starting with its name; receives the remainder and
    /// returns whether it applied.
    Functional(VariantParser),
}

#[derive(Clone)]
pub struct Variant {
    pub(crate) name: String,
    pub(crate) kind: VariantKind,
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            VariantKind::Static(_) => "static",
            VariantKind::Functional(_) => "functional",
        };
        f.debug_struct("Variant")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

/// A base-layer rule emitted once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

/// Everything one plugin registered. Committed to the index only after the
/// plugin's `register` returned `Ok`.
#[derive(Debug, Default)]
pub(crate) struct Registrations {
    pub utilities: Vec<UtilityTemplate>,
    pub variants: Vec<Variant>,
    pub base: Vec<BaseRule>,
}

pub struct PluginContext<'a> {
    plugin: &'a str,
    theme: &'a mut ThemeTable,
    registrations: &'a mut Registrations,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        plugin: &'a str,
        theme: &'a mut ThemeTable,
        registrations: &'a mut Registrations,
    ) -> Self {
        Self {
            plugin,
            theme,
            registrations,
        }
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    pub fn add_utility(&mut self, template: UtilityTemplate) {
        self.registrations.utilities.push(template);
    }

    pub fn add_static(&mut self, name: impl Into<String>, body: RuleBody) {
        self.add_utility(UtilityTemplate::fixed(name, body));
    }

    pub fn add_variant<F>(&mut self, name: impl Into<String>, transform: F)
    where
        F: Fn(&mut RuleShape) + Send + Sync + 'static,
    {
        self.registrations.variants.push(Variant {
            name: name.into(),
            kind: VariantKind::Static(Arc::new(transform)),
        });
    }

    pub fn add_functional_variant<F>(&mut self, prefix: impl Into<String>, transform: F)
    where
        F: Fn(&str, &mut RuleShape) -> bool + Send + Sync + 'static,
    {
        self.registrations.variants.push(Variant {
            name: prefix.into(),
            kind: VariantKind::Functional(Arc::new(transform)),
        });
    }

    pub fn add_base(&mut self, selector: impl Into<String>, declarations: Vec<Declaration>) {
        self.registrations.base.push(BaseRule {
            selector: selector.into(),
            declarations,
        });
    }

    /// Dotted-path theme lookup against the table as it stands now.
    pub fn theme(&self, path: &str) -> Option<&ThemeValue> {
        self.theme.get(path)
    }

    pub fn theme_category(&self, name: &str) -> Option<&TokenMap> {
        self.theme.category(name)
    }

    /// Adds a namespace for this and later plugins. Values the user already
    /// put under that name win over `defaults`.
    pub fn add_theme_namespace(&mut self, name: &str, defaults: TokenMap) {
        tracing::debug!(plugin = self.plugin, namespace = name, "registering theme namespace");
        self.theme.register_namespace(name, defaults);
    }
}

/// A unit contributing utilities, variants and theme namespaces.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError>;
}

/// Resolves a configured plugin reference to one of the built-in plugins.
pub fn builtin(reference: &PluginRef) -> Result<Box<dyn Plugin>, PluginError> {
    let name = reference.name();
    let short = name.strip_prefix("@tailwindcss/").unwrap_or(name);
    match short {
        "forms" => Ok(Box::new(forms::FormsPlugin::from_ref(reference)?)),
        "typography" => Ok(Box::new(typography::TypographyPlugin::from_ref(reference)?)),
        "container-queries" => Ok(Box::new(container_queries::ContainerQueriesPlugin)),
        _ => Err(PluginError::Unknown(name.to_string())),
    }
}

/// Converts a camelCase theme key to a CSS property name.
pub(crate) fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{builtin, kebab_case, Layer, RuleBody, RuleShape, UtilityTemplate};
    use crate::config::PluginRef;
    use crate::error::PluginError;

    #[test]
    fn resolves_builtin_plugins_by_package_name() {
        for name in [
            "@tailwindcss/forms",
            "@tailwindcss/typography",
            "@tailwindcss/container-queries",
            "forms",
        ] {
            let plugin = builtin(&PluginRef::from(name)).expect("known plugin");
            assert!(name.ends_with(plugin.name()));
        }
    }

    #[test]
    fn unknown_plugin_is_an_error() {
        match builtin(&PluginRef::from("@tailwindcss/aspect-ratio")) {
            Err(PluginError::Unknown(name)) => assert_eq!(name, "@tailwindcss/aspect-ratio"),
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("expected unknown plugin"),
        }
    }

    #[test]
    fn template_names_default_key_after_prefix() {
        let template = UtilityTemplate::property("rounded", "border-radius");
        assert_eq!(template.class_for("DEFAULT"), "rounded");
        assert_eq!(template.class_for("lg"), "rounded-lg");
        let named = UtilityTemplate::property("@container", "container-name").separator('/');
        assert_eq!(named.class_for("sidebar"), "@container/sidebar");
    }

    #[test]
    fn shape_wraps_outside_existing_wrappers() {
        let mut shape = RuleShape::new(".x");
        shape.append(":hover");
        shape.wrap("@media (min-width: 768px)");
        shape.wrap("@media print");
        shape.pseudo_element = Some("::before".to_string());
        assert_eq!(shape.final_selector(), ".x:hover::before");
        assert_eq!(shape.wrappers, vec!["@media print", "@media (min-width: 768px)"]);

        shape.replace_self(".group:hover &");
        assert_eq!(shape.selector, ".group:hover .x:hover");
    }

    #[test]
    fn empty_body_has_nothing_to_emit() {
        assert!(RuleBody::new().is_empty());
        assert!(RuleBody::new().nested(" > *", Vec::new()).is_empty());
        assert!(!RuleBody::single("display", "flex").is_empty());
        assert_eq!(Layer::ALL.map(Layer::as_str), ["base", "components", "utilities"]);
    }

    #[test]
    fn converts_camel_case_keys() {
        assert_eq!(kebab_case("marginTop"), "margin-top");
        assert_eq!(kebab_case("color"), "color");
    }
}
