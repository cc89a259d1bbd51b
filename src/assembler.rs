//! Collects emitted rules, drops duplicates and serializes them layer by
//! layer.

use crate::plugin::{BaseRule, Declaration, Layer};
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

/// A selector plus its declarations, rendered as one block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleBlock {
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

/// A fully resolved rule: selector, declarations, nested blocks sharing the
/// same wrappers, and at-rule preludes (outermost first).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmittedRule {
    pub selector: String,
    pub declarations: Vec<Declaration>,
    pub nested: Vec<RuleBlock>,
    pub wrappers: Vec<String>,
    pub layer: Layer,
}

impl EmittedRule {
    pub fn base(rule: &BaseRule) -> Self {
        Self {
            selector: rule.selector.clone(),
            declarations: rule.declarations.clone(),
            nested: Vec::new(),
            wrappers: Vec::new(),
            layer: Layer::Base,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOutput(String);

impl CssOutput {
    pub fn new(css: String) -> Self {
        Self(css)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for CssOutput {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for CssOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl From<String> for CssOutput {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<CssOutput> for String {
    fn from(value: CssOutput) -> Self {
        value.0
    }
}

/// Deduplicated rules bucketed by layer, each bucket in first-push order.
#[derive(Debug, Default)]
pub struct Stylesheet {
    seen: HashSet<EmittedRule>,
    layers: [Vec<EmittedRule>; 3],
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when an identical rule was already pushed.
    pub fn push(&mut self, rule: EmittedRule) -> bool {
        if self.seen.contains(&rule) {
            return false;
        }
        self.seen.insert(rule.clone());
        self.layers[rule.layer.slot()].push(rule);
        true
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn rules(&self, layer: Layer) -> &[EmittedRule] {
        &self.layers[layer.slot()]
    }

    pub fn render(&self, minify: bool) -> CssOutput {
        let mut sections = vec![layer_prelude(minify)];
        for layer in Layer::ALL {
            let body = self
                .rules(layer)
                .iter()
                .filter_map(|rule| render_rule(rule, minify))
                .collect::<Vec<_>>()
                .join(if minify { "" } else { "\n" });
            let block = wrap_layer_block(layer.as_str(), &body, minify);
            if !block.is_empty() {
                sections.push(block);
            }
        }

        let mut css = sections.join(if minify { "" } else { "\n\n" });
        if !minify {
            css.push('\n');
        }
        CssOutput::new(css)
    }
}

fn layer_prelude(minify: bool) -> String {
    if minify {
        "@layer base,components,utilities;".to_string()
    } else {
        "@layer base, components, utilities;".to_string()
    }
}

fn wrap_layer_block(layer: &str, css: &str, minify: bool) -> String {
    let content = css.trim();
    if content.is_empty() {
        return String::new();
    }
    if minify {
        format!("@layer {}{{{}}}", layer, content)
    } else {
        format!("@layer {} {{\n{}\n}}", layer, indent_css_block(content, 2))
    }
}

fn render_rule(rule: &EmittedRule, minify: bool) -> Option<String> {
    let blocks = std::iter::once(block(&rule.selector, &rule.declarations, minify))
        .chain(
            rule.nested
                .iter()
                .map(|nested| block(&nested.selector, &nested.declarations, minify)),
        )
        .flatten()
        .collect::<Vec<_>>();
    if blocks.is_empty() {
        return None;
    }

    let mut css = blocks.join(if minify { "" } else { "\n" });
    for wrapper in rule.wrappers.iter().rev() {
        css = if minify {
            format!("{}{{{}}}", wrapper, css)
        } else {
            format!("{} {{\n{}\n}}", wrapper, indent_css_block(&css, 2))
        };
    }
    Some(css)
}

fn block(selector: &str, declarations: &[Declaration], minify: bool) -> Option<String> {
    if declarations.is_empty() {
        return None;
    }
    if minify {
        let body = declarations
            .iter()
            .map(|decl| format_declaration(decl, true))
            .collect::<Vec<_>>()
            .join(";");
        return Some(format!("{}{{{}}}", selector, body));
    }
    let lines = declarations
        .iter()
        .map(|decl| format!("  {};", format_declaration(decl, false)))
        .collect::<Vec<_>>()
        .join("\n");
    Some(format!("{} {{\n{}\n}}", selector, lines))
}

fn format_declaration(decl: &Declaration, minify: bool) -> String {
    let important = if decl.important { " !important" } else { "" };
    if minify {
        format!("{}:{}{}", decl.property, decl.value, important.trim_start())
    } else {
        format!("{}: {}{}", decl.property, decl.value, important)
    }
}

fn indent_css_block(css: &str, spaces: usize) -> String {
    let padding = " ".repeat(spaces);
    css.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", padding, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::{EmittedRule, RuleBlock, Stylesheet};
    use crate::plugin::{BaseRule, Declaration, Layer};

    fn rule(selector: &str, property: &str, value: &str, layer: Layer) -> EmittedRule {
        EmittedRule {
            selector: selector.to_string(),
            declarations: vec![Declaration::new(property, value)],
            nested: Vec::new(),
            wrappers: Vec::new(),
            layer,
        }
    }

    #[test]
    fn deduplicates_identical_rules() {
        let mut sheet = Stylesheet::new();
        assert!(sheet.push(rule(".flex", "display", "flex", Layer::Utilities)));
        assert!(!sheet.push(rule(".flex", "display", "flex", Layer::Utilities)));
        assert!(sheet.push(rule(".flex", "display", "block", Layer::Utilities)));
        assert_eq!(sheet.len(), 2);
    }

    #[test]
    fn renders_layers_in_fixed_order() {
        let mut sheet = Stylesheet::new();
        sheet.push(rule(".mt-4", "margin-top", "1rem", Layer::Utilities));
        sheet.push(rule(".prose", "color", "#374151", Layer::Components));
        sheet.push(EmittedRule::base(&BaseRule {
            selector: "body".to_string(),
            declarations: vec![Declaration::new("margin", "0")],
        }));

        let css = sheet.render(false);
        assert!(css.starts_with("@layer base, components, utilities;\n\n@layer base {"));
        let base = css.find("@layer base {").expect("base layer");
        let components = css.find("@layer components {").expect("components layer");
        let utilities = css.find("@layer utilities {").expect("utilities layer");
        assert!(base < components && components < utilities);
        assert!(css.contains("  .mt-4 {\n    margin-top: 1rem;\n  }"));
    }

    #[test]
    fn empty_layers_are_omitted() {
        let mut sheet = Stylesheet::new();
        sheet.push(rule(".block", "display", "block", Layer::Utilities));
        let css = sheet.render(false);
        assert!(!css.contains("@layer base {"));
        assert!(!css.contains("@layer components {"));
        assert_eq!(Stylesheet::new().render(true).as_str(), "@layer base,components,utilities;");
    }

    #[test]
    fn wrappers_nest_outermost_first() {
        let mut emitted = rule(".md\\:hover\\:underline:hover", "text-decoration-line", "underline", Layer::Utilities);
        emitted.wrappers = vec![
            "@media (prefers-color-scheme: dark)".to_string(),
            "@media (min-width: 768px)".to_string(),
        ];
        let mut sheet = Stylesheet::new();
        sheet.push(emitted);
        let css = sheet.render(true);
        assert_eq!(
            css.as_str(),
            "@layer base,components,utilities;@layer utilities{@media (prefers-color-scheme: dark){@media (min-width: 768px){.md\\:hover\\:underline:hover{text-decoration-line:underline}}}}"
        );
    }

    #[test]
    fn nested_blocks_and_important() {
        let mut emitted = EmittedRule {
            selector: ".space-x-4".to_string(),
            declarations: Vec::new(),
            nested: vec![RuleBlock {
                selector: ".space-x-4 > :not([hidden]) ~ :not([hidden])".to_string(),
                declarations: vec![Declaration::new("margin-left", "1rem")],
            }],
            wrappers: Vec::new(),
            layer: Layer::Utilities,
        };
        emitted.nested[0].declarations[0].important = true;
        let mut sheet = Stylesheet::new();
        sheet.push(emitted);

        let pretty = sheet.render(false);
        assert!(!pretty.contains(".space-x-4 {"));
        assert!(pretty.contains("margin-left: 1rem !important;"));
        assert!(sheet.render(true).contains("{margin-left:1rem!important}"));
    }
}
