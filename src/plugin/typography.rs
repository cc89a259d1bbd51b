//! Prose styles for rendered markdown and CMS content.

use super::{kebab_case, Declaration, Layer, Plugin, PluginContext, RuleBody, UtilityTemplate};
use crate::config::PluginRef;
use crate::error::PluginError;
use crate::theme::{ThemeValue, TokenMap};

const SIZES: [&str; 5] = ["sm", "base", "lg", "xl", "2xl"];

const GRAY_SCALES: [&str; 2] = ["slate", "gray"];

/// Custom properties a gray scale sets: `(name, shade)` for the regular and
/// the inverted palette. `None` means white.
const PROSE_COLORS: [(&str, Option<&str>, Option<&str>); 8] = [
    ("body", Some("700"), Some("300")),
    ("headings", Some("900"), None),
    ("links", Some("900"), None),
    ("bold", Some("900"), None),
    ("code", Some("900"), None),
    ("quotes", Some("900"), Some("100")),
    ("quote-borders", Some("200"), Some("700")),
    ("hr", Some("200"), Some("700")),
];

const ELEMENT_VARIANTS: [(&str, &str); 22] = [
    ("headings", "h1, h2, h3, h4, h5, h6, th"),
    ("h1", "h1"),
    ("h2", "h2"),
    ("h3", "h3"),
    ("h4", "h4"),
    ("lead", "[class~=\"lead\"]"),
    ("p", "p"),
    ("a", "a"),
    ("blockquote", "blockquote"),
    ("figure", "figure"),
    ("figcaption", "figcaption"),
    ("strong", "strong"),
    ("em", "em"),
    ("code", "code"),
    ("pre", "pre"),
    ("ol", "ol"),
    ("ul", "ul"),
    ("li", "li"),
    ("table", "table"),
    ("th", "th"),
    ("td", "td"),
    ("img", "img"),
];

#[derive(Debug, Clone)]
pub struct TypographyPlugin {
    class_name: String,
}

impl Default for TypographyPlugin {
    fn default() -> Self {
        Self {
            class_name: "prose".to_string(),
        }
    }
}

impl TypographyPlugin {
    pub fn with_class_name(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }

    pub fn from_ref(reference: &PluginRef) -> Result<Self, PluginError> {
        match reference.option("className") {
            None => Ok(Self::default()),
            Some(name)
                if !name.is_empty()
                    && name
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') =>
            {
                Ok(Self::with_class_name(name))
            }
            Some(other) => Err(PluginError::InvalidOption {
                plugin: reference.name().to_string(),
                option: "className".to_string(),
                message: format!("'{}' is not a valid class name", other),
            }),
        }
    }

    /// Scopes an element selector to prose content outside `not-*` islands.
    fn scoped(&self, element: &str) -> String {
        format!(
            ":where({}):not(:where([class~=\"not-{}\"],[class~=\"not-{}\"] *))",
            element, self.class_name, self.class_name
        )
    }

    fn body_from_tokens(&self, tokens: &TokenMap) -> RuleBody {
        let mut body = RuleBody::new();
        for (key, value) in tokens.iter() {
            match value {
                ThemeValue::Table(nested) => {
                    let declarations = nested
                        .iter()
                        .filter_map(|(property, value)| {
                            value
                                .to_css()
                                .map(|css| Declaration::new(kebab_case(property), css))
                        })
                        .collect();
                    body = body.nested(format!(" {}", self.scoped(key)), declarations);
                }
                other => {
                    if let Some(css) = other.to_css() {
                        body = body.decl(kebab_case(key), css);
                    }
                }
            }
        }
        body
    }
}

fn default_typography() -> TokenMap {
    fn element(pairs: &[(&str, &str)]) -> ThemeValue {
        ThemeValue::Table(pairs.iter().copied().collect())
    }

    let base = TokenMap::from_iter([
        ("color", ThemeValue::scalar("var(--tw-prose-body)")),
        ("maxWidth", ThemeValue::scalar("65ch")),
        ("p", element(&[("marginTop", "1.25em"), ("marginBottom", "1.25em")])),
        (
            "a",
            element(&[
                ("color", "var(--tw-prose-links)"),
                ("textDecoration", "underline"),
                ("fontWeight", "500"),
            ]),
        ),
        (
            "strong",
            element(&[("color", "var(--tw-prose-bold)"), ("fontWeight", "600")]),
        ),
        (
            "h1",
            element(&[
                ("color", "var(--tw-prose-headings)"),
                ("fontWeight", "800"),
                ("fontSize", "2.25em"),
                ("marginTop", "0"),
                ("marginBottom", "0.8888889em"),
                ("lineHeight", "1.1111111"),
            ]),
        ),
        (
            "h2",
            element(&[
                ("color", "var(--tw-prose-headings)"),
                ("fontWeight", "700"),
                ("fontSize", "1.5em"),
                ("marginTop", "2em"),
                ("marginBottom", "1em"),
                ("lineHeight", "1.3333333"),
            ]),
        ),
        (
            "h3",
            element(&[
                ("color", "var(--tw-prose-headings)"),
                ("fontWeight", "600"),
                ("fontSize", "1.25em"),
                ("marginTop", "1.6em"),
                ("marginBottom", "0.6em"),
                ("lineHeight", "1.6"),
            ]),
        ),
        (
            "blockquote",
            element(&[
                ("fontWeight", "500"),
                ("fontStyle", "italic"),
                ("color", "var(--tw-prose-quotes)"),
                ("borderLeftWidth", "0.25rem"),
                ("borderLeftColor", "var(--tw-prose-quote-borders)"),
                ("paddingLeft", "1em"),
            ]),
        ),
        (
            "code",
            element(&[
                ("color", "var(--tw-prose-code)"),
                ("fontWeight", "600"),
                ("fontSize", "0.875em"),
            ]),
        ),
        ("ul", element(&[("listStyleType", "disc"), ("paddingLeft", "1.625em")])),
        ("ol", element(&[("listStyleType", "decimal"), ("paddingLeft", "1.625em")])),
        ("li", element(&[("marginTop", "0.5em"), ("marginBottom", "0.5em")])),
        (
            "hr",
            element(&[
                ("borderColor", "var(--tw-prose-hr)"),
                ("borderTopWidth", "1px"),
                ("marginTop", "3em"),
                ("marginBottom", "3em"),
            ]),
        ),
        ("img", element(&[("marginTop", "2em"), ("marginBottom", "2em")])),
    ]);

    let size = |font_size: &str, line_height: &str, paragraph: &str| {
        ThemeValue::Table(TokenMap::from_iter([
            ("fontSize", ThemeValue::scalar(font_size)),
            ("lineHeight", ThemeValue::scalar(line_height)),
            ("p", element(&[("marginTop", paragraph), ("marginBottom", paragraph)])),
        ]))
    };

    TokenMap::from_iter([
        ("DEFAULT", ThemeValue::Table(base)),
        ("sm", size("0.875rem", "1.7142857", "1.1428571em")),
        ("base", size("1rem", "1.75", "1.25em")),
        ("lg", size("1.125rem", "1.7777778", "1.3333333em")),
        ("xl", size("1.25rem", "1.8", "1.2em")),
        ("2xl", size("1.5rem", "1.6666667", "1.3333333em")),
    ])
}

/// The `--tw-prose-*` custom properties for one gray scale, or `None` when
/// the theme lacks a shade it needs.
fn gray_scale_declarations(ctx: &PluginContext<'_>, scale: &str) -> Option<Vec<Declaration>> {
    let shade = |shade: Option<&str>| -> Option<String> {
        match shade {
            Some(shade) => ctx
                .theme(&format!("colors.{}.{}", scale, shade))
                .and_then(ThemeValue::to_css),
            None => Some("#fff".to_string()),
        }
    };

    let mut declarations = Vec::new();
    for (name, regular, _) in PROSE_COLORS {
        declarations.push(Declaration::new(format!("--tw-prose-{}", name), shade(regular)?));
    }
    for (name, _, inverted) in PROSE_COLORS {
        declarations.push(Declaration::new(
            format!("--tw-prose-invert-{}", name),
            shade(inverted)?,
        ));
    }
    Some(declarations)
}

impl Plugin for TypographyPlugin {
    fn name(&self) -> &str {
        "typography"
    }

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.add_theme_namespace("typography", default_typography());

        let Some(default) = ctx
            .theme("typography.DEFAULT")
            .and_then(ThemeValue::as_table)
            .cloned()
        else {
            return Err(PluginError::Registration {
                plugin: self.name().to_string(),
                message: "theme.typography.DEFAULT must be a table".to_string(),
            });
        };

        let mut prose = self.body_from_tokens(&default);
        if let Some(gray) = gray_scale_declarations(ctx, "gray") {
            prose.declarations.extend(gray);
        }
        let name = self.class_name.as_str();
        ctx.add_utility(UtilityTemplate::fixed(name, prose).layer(Layer::Components));

        for size in SIZES {
            let tokens = ctx
                .theme(&format!("typography.{}", size))
                .and_then(ThemeValue::as_table)
                .cloned();
            if let Some(tokens) = tokens {
                let body = self.body_from_tokens(&tokens);
                ctx.add_utility(
                    UtilityTemplate::fixed(format!("{}-{}", name, size), body).layer(Layer::Components),
                );
            }
        }

        for scale in GRAY_SCALES {
            if let Some(declarations) = gray_scale_declarations(ctx, scale) {
                let body = RuleBody {
                    declarations,
                    nested: Vec::new(),
                };
                ctx.add_utility(
                    UtilityTemplate::fixed(format!("{}-{}", name, scale), body).layer(Layer::Components),
                );
            }
        }

        let invert = PROSE_COLORS
            .iter()
            .fold(RuleBody::new(), |body, (color, _, _)| {
                body.decl(
                    format!("--tw-prose-{}", color),
                    format!("var(--tw-prose-invert-{})", color),
                )
            });
        ctx.add_utility(
            UtilityTemplate::fixed(format!("{}-invert", name), invert).layer(Layer::Components),
        );

        for (variant, element) in ELEMENT_VARIANTS {
            let template = format!("& :is({})", self.scoped(element));
            ctx.add_variant(format!("{}-{}", name, variant), move |shape| {
                shape.replace_self(&template)
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TypographyPlugin;
    use crate::config::PluginRef;
    use crate::error::PluginError;
    use crate::plugin::core::CorePlugin;
    use crate::plugin::pipeline::{build, RuleIndex};
    use crate::plugin::{Layer, Plugin};
    use crate::theme::{default_theme, ThemeValue, TokenMap};
    use std::collections::BTreeMap;

    fn index(plugin: TypographyPlugin) -> RuleIndex {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(CorePlugin::default()), Box::new(plugin)];
        build(default_theme(), &plugins).expect("typography registers")
    }

    #[test]
    fn prose_styles_scoped_elements() {
        let index = index(TypographyPlugin::default());
        let entry = index.exact("prose").expect("prose");
        assert_eq!(entry.template.layer, Layer::Components);
        let body = entry.template.apply(&entry.value);
        assert!(body
            .declarations
            .iter()
            .any(|d| d.property == "max-width" && d.value == "65ch"));
        assert!(body
            .declarations
            .iter()
            .any(|d| d.property == "--tw-prose-body" && d.value == "#374151"));
        let paragraph = body
            .nested
            .iter()
            .find(|rule| rule.selector_suffix.starts_with(" :where(p)"))
            .expect("paragraph rule");
        assert!(paragraph
            .selector_suffix
            .contains("[class~=\"not-prose\"]"));
        assert_eq!(paragraph.declarations[0].property, "margin-top");
    }

    #[test]
    fn registers_modifiers_and_variants() {
        let index = index(TypographyPlugin::default());
        for class in ["prose-sm", "prose-2xl", "prose-slate", "prose-gray", "prose-invert"] {
            assert!(index.exact(class).is_some(), "missing {}", class);
        }
        assert!(index.static_variant("prose-headings").is_some());
        assert!(index.static_variant("prose-a").is_some());
    }

    #[test]
    fn class_name_option_renames_everything() {
        let reference = PluginRef::WithOptions {
            name: "@tailwindcss/typography".to_string(),
            options: BTreeMap::from([("className".to_string(), "wysiwyg".to_string())]),
        };
        let index = index(TypographyPlugin::from_ref(&reference).expect("valid option"));
        assert!(index.exact("wysiwyg").is_some());
        assert!(index.exact("wysiwyg-lg").is_some());
        assert!(index.exact("prose").is_none());
        assert!(index.static_variant("wysiwyg-p").is_some());
    }

    #[test]
    fn rejects_invalid_class_name() {
        let reference = PluginRef::WithOptions {
            name: "@tailwindcss/typography".to_string(),
            options: BTreeMap::from([("className".to_string(), "not valid".to_string())]),
        };
        assert!(matches!(
            TypographyPlugin::from_ref(&reference),
            Err(PluginError::InvalidOption { .. })
        ));
    }

    #[test]
    fn user_theme_extends_typography_namespace() {
        let mut theme = default_theme();
        theme.set_category(
            "typography",
            TokenMap::from_iter([(
                "DEFAULT",
                ThemeValue::Table(TokenMap::from_iter([("maxWidth", "80ch")])),
            )]),
        );
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(TypographyPlugin::default())];
        let index = build(theme, &plugins).expect("typography registers");
        let entry = index.exact("prose").expect("prose");
        let body = entry.template.apply(&entry.value);
        assert!(body
            .declarations
            .iter()
            .any(|d| d.property == "max-width" && d.value == "80ch"));
        assert!(!body.nested.is_empty());
    }
}
