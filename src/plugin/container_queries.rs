//! `@container` utilities and `@{size}:` container-query variants.

use super::{Plugin, PluginContext, RuleBody, RuleShape, UtilityTemplate};
use crate::error::PluginError;
use crate::matcher::normalize_arbitrary_value;
use crate::theme::TokenMap;

fn default_containers() -> TokenMap {
    TokenMap::from_iter([
        ("xs", "20rem"),
        ("sm", "24rem"),
        ("md", "28rem"),
        ("lg", "32rem"),
        ("xl", "36rem"),
        ("2xl", "42rem"),
        ("3xl", "48rem"),
        ("4xl", "56rem"),
        ("5xl", "64rem"),
        ("6xl", "72rem"),
        ("7xl", "80rem"),
    ])
}

fn is_container_name(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerQueriesPlugin;

impl Plugin for ContainerQueriesPlugin {
    fn name(&self) -> &str {
        "container-queries"
    }

    fn register(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError> {
        ctx.add_theme_namespace("containers", default_containers());

        ctx.add_static("@container", RuleBody::single("container-type", "inline-size"));
        ctx.add_static("@container-normal", RuleBody::single("container-type", "normal"));
        ctx.add_utility(
            UtilityTemplate::new("@container", |value| {
                RuleBody::single("container-type", "inline-size")
                    .decl("container-name", value.css.as_str())
            })
            .separator('/')
            .parse(|raw| is_container_name(raw).then(|| raw.to_string())),
        );

        let sizes = ctx
            .theme_category("containers")
            .map(|containers| {
                containers
                    .iter()
                    .filter_map(|(key, value)| value.as_scalar().map(|v| (key.to_string(), v.to_string())))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        ctx.add_functional_variant("@", move |rest, shape| {
            let (size, name) = match split_container_name(rest) {
                Some(parts) => parts,
                None => return false,
            };
            let width = match size.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
                Some(raw) if !raw.is_empty() => normalize_arbitrary_value(raw),
                Some(_) => return false,
                None => match sizes.iter().find(|(key, _)| key == size) {
                    Some((_, width)) => width.clone(),
                    None => return false,
                },
            };
            wrap_container(shape, name, &width);
            true
        });
        Ok(())
    }
}

/// Splits `sm/sidebar` into size and optional container name. The name part
/// must be a plain identifier.
fn split_container_name(raw: &str) -> Option<(&str, Option<&str>)> {
    if raw.is_empty() {
        return None;
    }
    match raw.rsplit_once('/') {
        Some((size, name)) if !raw.ends_with(']') => {
            if !is_container_name(name) || size.is_empty() {
                return None;
            }
            Some((size, Some(name)))
        }
        _ => Some((raw, None)),
    }
}

fn wrap_container(shape: &mut RuleShape, name: Option<&str>, width: &str) {
    let query = match name {
        Some(name) => format!("@container {} (min-width: {})", name, width),
        None => format!("@container (min-width: {})", width),
    };
    shape.wrap(query);
}

#[cfg(test)]
mod tests {
    use super::{split_container_name, ContainerQueriesPlugin};
    use crate::plugin::pipeline::build;
    use crate::plugin::{Plugin, RuleShape, VariantKind};
    use crate::theme::{default_theme, TokenMap};

    fn apply(index: &crate::plugin::pipeline::RuleIndex, variant: &str) -> Option<RuleShape> {
        let mut shape = RuleShape::new(".x");
        for (kind, rest) in index.functional_variants(variant) {
            if let VariantKind::Functional(parser) = kind {
                if parser(rest, &mut shape) {
                    return Some(shape);
                }
            }
        }
        None
    }

    #[test]
    fn size_variants_read_containers_namespace() {
        let mut theme = default_theme();
        theme.set_category("containers", TokenMap::from_iter([("sm", "30rem")]));
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(ContainerQueriesPlugin)];
        let index = build(theme, &plugins).expect("plugin registers");

        let shape = apply(&index, "@sm").expect("sm variant");
        assert_eq!(shape.wrappers, vec!["@container (min-width: 30rem)"]);
        let shape = apply(&index, "@lg/sidebar").expect("named variant");
        assert_eq!(shape.wrappers, vec!["@container sidebar (min-width: 32rem)"]);
        let shape = apply(&index, "@[17.5rem]").expect("arbitrary variant");
        assert_eq!(shape.wrappers, vec!["@container (min-width: 17.5rem)"]);
        assert!(apply(&index, "@huge").is_none());
    }

    #[test]
    fn registers_container_utilities() {
        let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(ContainerQueriesPlugin)];
        let index = build(default_theme(), &plugins).expect("plugin registers");
        assert!(index.exact("@container").is_some());
        let named = index
            .dynamic()
            .find(|template| template.prefix() == "@container")
            .expect("named container template");
        assert_eq!(named.class_for("main"), "@container/main");
    }

    #[test]
    fn splits_container_names() {
        assert_eq!(split_container_name("md"), Some(("md", None)));
        assert_eq!(split_container_name("md/main"), Some(("md", Some("main"))));
        assert_eq!(split_container_name("[10rem]"), Some(("[10rem]", None)));
        assert_eq!(split_container_name("md/"), None);
    }
}
