//! Form control resets, either as base-layer element rules or as opt-in
//! `form-*` component classes.

use super::core::decls;
use super::{Declaration, Layer, Plugin, PluginContext, RuleBody, UtilityTemplate};
use crate::config::PluginRef;
use crate::error::PluginError;
use crate::theme::ThemeValue;

const TEXT_INPUTS: &str = "[type='text'], input:where(:not([type])), [type='email'], [type='url'], [type='password'], [type='number'], [type='date'], [type='datetime-local'], [type='month'], [type='search'], [type='tel'], [type='time'], [type='week'], [multiple], textarea, select";

const CHECKABLES: &str = "[type='checkbox'], [type='radio']";

const CHEVRON: &str = "url(\"data:image/svg+xml,%3csvg xmlns='http://www.w3.org/2000/svg' fill='none' viewBox='0 0 20 20'%3e%3cpath stroke='%236b7280' stroke-linecap='round' stroke-linejoin='round' stroke-width='1.5' d='M6 8l4 4 4-4'/%3e%3c/svg%3e\")";

const CHECKMARK: &str = "url(\"data:image/svg+xml,%3csvg viewBox='0 0 16 16' fill='white' xmlns='http://www.w3.org/2000/svg'%3e%3cpath d='M12.207 4.793a1 1 0 010 1.414l-5 5a1 1 0 01-1.414 0l-2-2a1 1 0 011.414-1.414L6.5 9.086l4.293-4.293a1 1 0 011.414 0z'/%3e%3c/svg%3e\")";

const RADIO_DOT: &str = "url(\"data:image/svg+xml,%3csvg viewBox='0 0 16 16' fill='white' xmlns='http://www.w3.org/2000/svg'%3e%3ccircle cx='8' cy='8' r='3'/%3e%3c/svg%3e\")";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormsStrategy {
    /// Element resets in the base layer plus the `form-*` classes.
    Both,
    Base,
    Class,
}

#[derive(Debug, Clone)]
pub struct FormsPlugin {
    strategy: FormsStrategy,
}

impl FormsPlugin {
    pub fn new(strategy: FormsStrategy) -> Self {
        Self { strategy }
    }

    pub fn from_ref(reference: &PluginRef) -> Result<Self, PluginError> {
        let strategy = match reference.option("strategy") {
            None => FormsStrategy::Both,
            Some("base") => FormsStrategy::Base,
            Some("class") => FormsStrategy::Class,
            Some(other) => {
                return Err(PluginError::InvalidOption {
                    plugin: reference.name().to_string(),
                    option: "strategy".to_string(),
                    message: format!("expected \"base\" or \"class\", got \"{}\"", other),
                })
            }
        };
        Ok(Self::new(strategy))
    }
}

/// Colors the resets are drawn with, read from the resolved theme.
struct Palette {
    border: String,
    accent: String,
}

impl Palette {
    fn from_theme(ctx: &PluginContext<'_>) -> Self {
        let color = |path: &str, fallback: &str| {
            ctx.theme(path)
                .and_then(ThemeValue::to_css)
                .unwrap_or_else(|| fallback.to_string())
        };
        Self {
            border: color("colors.gray.500", "#6b7280"),
            accent: color("colors.blue.600", "#2563eb"),
        }
    }

    fn text_input(&self) -> Vec<Declaration> {
        decls(&[
            ("appearance", "none"),
            ("background-color", "#fff"),
            ("border-color", self.border.as_str()),
            ("border-width", "1px"),
            ("border-radius", "0px"),
            ("padding-top", "0.5rem"),
            ("padding-right", "0.75rem"),
            ("padding-bottom", "0.5rem"),
            ("padding-left", "0.75rem"),
            ("font-size", "1rem"),
            ("line-height", "1.5rem"),
            ("--tw-shadow", "0 0 #0000"),
        ])
    }

    fn focus_ring(&self) -> Vec<Declaration> {
        let shadow = format!("0 0 0 1px {}", self.accent);
        decls(&[
            ("outline", "2px solid transparent"),
            ("outline-offset", "2px"),
            ("border-color", self.accent.as_str()),
            ("box-shadow", shadow.as_str()),
        ])
    }

    fn placeholder(&self) -> Vec<Declaration> {
        decls(&[("color", self.border.as_str()), ("opacity", "1")])
    }

    fn checkable(&self) -> Vec<Declaration> {
        decls(&[
            ("appearance", "none"),
            ("padding", "0"),
            ("print-color-adjust", "exact"),
            ("display", "inline-block"),
            ("vertical-align", "middle"),
            ("background-origin", "border-box"),
            ("user-select", "none"),
            ("flex-shrink", "0"),
            ("height", "1rem"),
            ("width", "1rem"),
            ("color", self.accent.as_str()),
            ("background-color", "#fff"),
            ("border-color", self.border.as_str()),
            ("border-width", "1px"),
            ("--tw-shadow", "0 0 #0000"),
        ])
    }

    fn checkable_focus(&self) -> Vec<Declaration> {
        let shadow = format!("0 0 0 2px #fff, 0 0 0 4px {}", self.accent);
        decls(&[
            ("outline", "2px solid transparent"),
            ("outline-offset", "2px"),
            ("box-shadow", shadow.as_str()),
        ])
    }
}

fn select_chevron() -> Vec<Declaration> {
    decls(&[
        ("background-image", CHEVRON),
        ("background-position", "right 0.5rem center"),
        ("background-repeat", "no-repeat"),
        ("background-size", "1.5em 1.5em"),
        ("padding-right", "2.5rem"),
        ("print-color-adjust", "exact"),
    ])
}

fn multiselect_reset() -> Vec<Declaration> {
    decls(&[
        ("background-image", "initial"),
        ("background-position", "initial"),
        ("background-repeat", "unset"),
        ("background-size", "initial"),
        ("padding-right", "0.75rem"),
        ("print-color-adjust", "unset"),
    ])
}

fn checked(image: &str) -> Vec<Declaration> {
    decls(&[
        ("border-color", "transparent"),
        ("background-color", "currentColor"),
        ("background-size", "100% 100%"),
        ("background-position", "center"),
        ("background-repeat", "no-repeat"),
        ("background-image", image),
    ])
}

/// Appends `suffix` to every selector in a comma-separated list.
fn each_with(selectors: &str, suffix: &str) -> String {
    selectors
        .split(", ")
        .map(|selector| format!("{}{}", selector, suffix))
        .collect::<Vec<_>>()
        .join(", ")
}

fn register_base(ctx: &mut PluginContext<'_>, palette: &Palette) {
    ctx.add_base(TEXT_INPUTS, palette.text_input());
    ctx.add_base(each_with(TEXT_INPUTS, ":focus"), palette.focus_ring());
    ctx.add_base("input::placeholder, textarea::placeholder", palette.placeholder());
    ctx.add_base("select", select_chevron());
    ctx.add_base(
        "[multiple], [size]:where(select:not([size=\"1\"]))",
        multiselect_reset(),
    );
    ctx.add_base(CHECKABLES, palette.checkable());
    ctx.add_base("[type='checkbox']", decls(&[("border-radius", "0px")]));
    ctx.add_base("[type='radio']", decls(&[("border-radius", "100%")]));
    ctx.add_base(each_with(CHECKABLES, ":focus"), palette.checkable_focus());
    ctx.add_base("[type='checkbox']:checked", checked(CHECKMARK));
    ctx.add_base("[type='radio']:checked", checked(RADIO_DOT));
}

fn register_classes(ctx: &mut PluginContext<'_>, palette: &Palette) {
    let text_like = |extra: Vec<Declaration>, placeholder: bool| {
        let mut declarations = palette.text_input();
        declarations.extend(extra);
        let mut body = RuleBody {
            declarations,
            nested: Vec::new(),
        }
        .nested(":focus", palette.focus_ring());
        if placeholder {
            body = body.nested("::placeholder", palette.placeholder());
        }
        body
    };
    let checkable = |radius: &str, image: &str| {
        let mut declarations = palette.checkable();
        declarations.push(Declaration::new("border-radius", radius));
        RuleBody {
            declarations,
            nested: Vec::new(),
        }
        .nested(":focus", palette.checkable_focus())
        .nested(":checked", checked(image))
    };

    let classes = [
        ("form-input", text_like(Vec::new(), true)),
        ("form-textarea", text_like(Vec::new(), true)),
        ("form-select", text_like(select_chevron(), false)),
        ("form-multiselect", text_like(multiselect_reset(), false)),
        ("form-checkbox", checkable("0px", CHECKMARK)),
        ("form-radio", checkable("100%", RADIO_DOT)),
    ];
    for (name, body) in classes {
        ctx.add_utility(UtilityTemplate::fixed(name, body).layer(Layer::Components));
    }
}

impl Plugin for FormsPlugin {
    fn name(&self) -> &str {
        "forms"
    }

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        let palette = Palette::from_theme(ctx);
        if matches!(self.strategy, FormsStrategy::Both | FormsStrategy::Base) {
            register_base(ctx, &palette);
        }
        if matches!(self.strategy, FormsStrategy::Both | FormsStrategy::Class) {
            register_classes(ctx, &palette);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{each_with, FormsPlugin, FormsStrategy};
    use crate::config::PluginRef;
    use crate::error::PluginError;
    use crate::plugin::core::CorePlugin;
    use crate::plugin::pipeline::{build, RuleIndex};
    use crate::plugin::{Layer, Plugin};
    use crate::theme::default_theme;
    use std::collections::BTreeMap;

    fn index(strategy: FormsStrategy) -> RuleIndex {
        let plugins: Vec<Box<dyn Plugin>> = vec![
            Box::new(CorePlugin::default()),
            Box::new(FormsPlugin::new(strategy)),
        ];
        build(default_theme(), &plugins).expect("forms registers")
    }

    fn with_strategy(value: &str) -> PluginRef {
        PluginRef::WithOptions {
            name: "@tailwindcss/forms".to_string(),
            options: BTreeMap::from([("strategy".to_string(), value.to_string())]),
        }
    }

    #[test]
    fn reads_strategy_option() {
        assert_eq!(
            FormsPlugin::from_ref(&PluginRef::from("@tailwindcss/forms"))
                .expect("default")
                .strategy,
            FormsStrategy::Both
        );
        assert_eq!(
            FormsPlugin::from_ref(&with_strategy("class")).expect("class").strategy,
            FormsStrategy::Class
        );
        assert!(matches!(
            FormsPlugin::from_ref(&with_strategy("inline")),
            Err(PluginError::InvalidOption { .. })
        ));
    }

    #[test]
    fn class_strategy_registers_components_only() {
        let core_only = index(FormsStrategy::Class).base_rules().len();
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(CorePlugin::default())];
        let baseline = build(default_theme(), &plugins).expect("core").base_rules().len();
        assert_eq!(core_only, baseline);

        let index = index(FormsStrategy::Class);
        let entry = index.exact("form-input").expect("form-input");
        assert_eq!(entry.template.layer, Layer::Components);
        let body = entry.template.apply(&entry.value);
        assert!(body.nested.iter().any(|rule| rule.selector_suffix == ":focus"));
    }

    #[test]
    fn base_strategy_adds_element_resets() {
        let index = index(FormsStrategy::Base);
        assert!(index.exact("form-input").is_none());
        assert!(index
            .base_rules()
            .iter()
            .any(|rule| rule.selector.starts_with("[type='text']")));
    }

    #[test]
    fn focus_selectors_cover_every_control() {
        assert_eq!(
            each_with("[type='checkbox'], [type='radio']", ":focus"),
            "[type='checkbox']:focus, [type='radio']:focus"
        );
    }
}
