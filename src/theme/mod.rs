//! Design-token resolution.
//!
//! The resolved [`ThemeTable`] is built once per engine from the shipped
//! defaults and the user's `theme` section, then handed to the plugin
//! pipeline. After the pipeline finishes it is never mutated again.
//!
//! Two merge strategies exist and are always named explicitly:
//!
//! - [`MergeStrategy::Replace`]: a top-level category in the user theme
//!   replaces the base category wholesale.
//! - [`MergeStrategy::Extend`]: a category under `extend` is merged key by key
//!   into whatever the category holds after overrides, recursing into nested
//!   tables. Extend values win on collision.

mod defaults;

use serde::Deserialize;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use std::collections::BTreeMap;
use std::fmt;

pub use defaults::default_theme;

/// A single design-token value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeValue {
    Scalar(String),
    List(Vec<ThemeValue>),
    Table(TokenMap),
}

impl ThemeValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        Self::Scalar(value.into())
    }

    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Scalar(v.into())).collect())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Self::Scalar(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ThemeValue]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&TokenMap> {
        match self {
            Self::Table(map) => Some(map),
            _ => None,
        }
    }

    /// Renders the value the way it appears in a declaration: scalars verbatim,
    /// lists of scalars as a comma-separated stack (font families, shadows).
    /// Tables have no single CSS form.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Self::Scalar(value) => Some(value.clone()),
            Self::List(values) => {
                let parts = values
                    .iter()
                    .map(|value| value.as_scalar())
                    .collect::<Option<Vec<_>>>()?;
                Some(parts.join(", "))
            }
            Self::Table(_) => None,
        }
    }
}

impl From<&str> for ThemeValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<TokenMap> for ThemeValue {
    fn from(value: TokenMap) -> Self {
        Self::Table(value)
    }
}

/// Ordered key/value map with unique keys. Inserting an existing key replaces
/// the value in place, so declaration order survives overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenMap {
    entries: Vec<(String, ThemeValue)>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ThemeValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ThemeValue> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ThemeValue>) -> Option<ThemeValue> {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }
        self.entries.push((key, value));
        None
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ThemeValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Leaf entries with nested table keys joined by `-`. A nested `DEFAULT`
    /// key takes its parent's name (`red.DEFAULT` becomes `red`, top-level
    /// `DEFAULT` stays `DEFAULT`).
    pub fn flatten(&self) -> Vec<(String, ThemeValue)> {
        let mut out = Vec::new();
        flatten_into(self, None, &mut out);
        out
    }
}

fn flatten_into(map: &TokenMap, prefix: Option<&str>, out: &mut Vec<(String, ThemeValue)>) {
    for (key, value) in map.iter() {
        let name = match prefix {
            Some(prefix) if key == "DEFAULT" => prefix.to_string(),
            Some(prefix) => format!("{}-{}", prefix, key),
            None => key.to_string(),
        };
        match value {
            ThemeValue::Table(nested) => flatten_into(nested, Some(&name), out),
            leaf => out.push((name, leaf.clone())),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for TokenMap
where
    K: Into<String>,
    V: Into<ThemeValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = TokenMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    Replace,
    Extend,
}

/// Merges `incoming` into `target` using `strategy`.
pub fn merge_value(target: &mut ThemeValue, incoming: &ThemeValue, strategy: MergeStrategy) {
    match (strategy, target, incoming) {
        (MergeStrategy::Extend, ThemeValue::Table(base), ThemeValue::Table(extra)) => {
            merge_map(base, extra, MergeStrategy::Extend);
        }
        (_, target, incoming) => *target = incoming.clone(),
    }
}

pub fn merge_map(target: &mut TokenMap, incoming: &TokenMap, strategy: MergeStrategy) {
    if strategy == MergeStrategy::Replace {
        *target = incoming.clone();
        return;
    }
    for (key, value) in incoming.iter() {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, value, strategy),
            None => {
                target.insert(key, value.clone());
            }
        }
    }
}

/// User-facing `theme` section. Every key other than `extend` is a direct
/// override of the category with that name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub extend: BTreeMap<String, TokenMap>,
    #[serde(flatten)]
    pub overrides: BTreeMap<String, TokenMap>,
}

/// The resolved, immutable token table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeTable {
    categories: BTreeMap<String, TokenMap>,
}

impl ThemeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self, name: &str) -> Option<&TokenMap> {
        self.categories.get(name)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &TokenMap)> {
        self.categories.iter().map(|(name, map)| (name.as_str(), map))
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn set_category(&mut self, name: impl Into<String>, tokens: TokenMap) {
        self.categories.insert(name.into(), tokens);
    }

    /// Dotted-path lookup: `colors.red.500`, `spacing.0.5`. Keys that contain
    /// dots themselves are found by trying the longest key first.
    pub fn get(&self, path: &str) -> Option<&ThemeValue> {
        let (category, rest) = path.split_once('.')?;
        let map = self.categories.get(category)?;
        let segments = rest.split('.').collect::<Vec<_>>();
        lookup_segments(map, &segments)
    }

    /// Registers a namespace on behalf of a plugin. Values already present
    /// (from the user's theme) win over the plugin's defaults.
    pub fn register_namespace(&mut self, name: &str, defaults: TokenMap) {
        let merged = match self.categories.remove(name) {
            Some(existing) => {
                let mut merged = defaults;
                merge_map(&mut merged, &existing, MergeStrategy::Extend);
                merged
            }
            None => defaults,
        };
        self.categories.insert(name.to_string(), merged);
    }
}

fn lookup_segments<'a>(map: &'a TokenMap, segments: &[&str]) -> Option<&'a ThemeValue> {
    for split in (1..=segments.len()).rev() {
        let key = segments[..split].join(".");
        let Some(value) = map.get(&key) else {
            continue;
        };
        if split == segments.len() {
            return Some(value);
        }
        if let ThemeValue::Table(nested) = value {
            if let Some(found) = lookup_segments(nested, &segments[split..]) {
                return Some(found);
            }
        }
    }
    None
}

/// Resolves the user theme against `base`. Overrides are applied first, then
/// `extend` is layered on top, one category at a time.
pub fn resolve(base: &ThemeTable, user: &ThemeConfig) -> ThemeTable {
    let mut categories = base.categories.clone();

    for (name, tokens) in &user.overrides {
        let target = categories.entry(name.clone()).or_default();
        merge_map(target, tokens, MergeStrategy::Replace);
    }
    for (name, tokens) in &user.extend {
        let target = categories.entry(name.clone()).or_default();
        merge_map(target, tokens, MergeStrategy::Extend);
    }

    tracing::debug!(
        categories = categories.len(),
        overrides = user.overrides.len(),
        extended = user.extend.len(),
        "resolved theme"
    );
    ThemeTable { categories }
}

impl<'de> Deserialize<'de> for ThemeValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(ThemeValueVisitor)
    }
}

struct ThemeValueVisitor;

impl<'de> Visitor<'de> for ThemeValueVisitor {
    type Value = ThemeValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number, list or table")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value.to_string()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value.to_string()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<ThemeValue, E> {
        Ok(ThemeValue::Scalar(value.to_string()))
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<ThemeValue, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::new();
        while let Some(value) = seq.next_element::<ThemeValue>()? {
            values.push(value);
        }
        Ok(ThemeValue::List(values))
    }

    fn visit_map<A>(self, map: A) -> Result<ThemeValue, A::Error>
    where
        A: MapAccess<'de>,
    {
        TokenMapVisitor.visit_map(map).map(ThemeValue::Table)
    }
}

impl<'de> Deserialize<'de> for TokenMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(TokenMapVisitor)
    }
}

struct TokenMapVisitor;

impl<'de> Visitor<'de> for TokenMapVisitor {
    type Value = TokenMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a table of design tokens")
    }

    fn visit_map<A>(self, mut access: A) -> Result<TokenMap, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = TokenMap::new();
        while let Some((key, value)) = access.next_entry::<String, ThemeValue>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        MergeStrategy, ThemeConfig, ThemeTable, ThemeValue, TokenMap, default_theme, merge_map,
        resolve,
    };

    fn base() -> ThemeTable {
        let mut table = ThemeTable::new();
        table.set_category(
            "fontFamily",
            TokenMap::from_iter([
                ("sans", ThemeValue::list(["ui-sans-serif", "system-ui"])),
                ("mono", ThemeValue::list(["ui-monospace"])),
            ]),
        );
        table.set_category(
            "colors",
            TokenMap::from_iter([(
                "red",
                ThemeValue::Table(TokenMap::from_iter([("500", "#ef4444"), ("600", "#dc2626")])),
            )]),
        );
        table
    }

    #[test]
    fn extend_adds_and_overrides_keys_within_category() {
        let mut user = ThemeConfig::default();
        user.extend.insert(
            "fontFamily".to_string(),
            TokenMap::from_iter([
                ("sans", ThemeValue::list(["Foo", "sans-serif"])),
                ("display", ThemeValue::list(["Bar"])),
            ]),
        );
        let theme = resolve(&base(), &user);
        let family = theme.category("fontFamily").expect("category");

        assert_eq!(family.len(), 3);
        assert_eq!(
            family.get("sans").and_then(ThemeValue::to_css).as_deref(),
            Some("Foo, sans-serif")
        );
        assert_eq!(
            family.get("mono").and_then(ThemeValue::to_css).as_deref(),
            Some("ui-monospace")
        );
        assert!(family.contains_key("display"));
    }

    #[test]
    fn direct_override_replaces_category() {
        let mut user = ThemeConfig::default();
        user.overrides.insert(
            "fontFamily".to_string(),
            TokenMap::from_iter([("sans", ThemeValue::list(["Name Sans", "sans-serif"]))]),
        );
        let theme = resolve(&base(), &user);
        let family = theme.category("fontFamily").expect("category");

        assert_eq!(family.len(), 1);
        assert!(family.get("mono").is_none());
    }

    #[test]
    fn extend_layers_on_top_of_override_for_same_category() {
        let mut user = ThemeConfig::default();
        user.overrides.insert(
            "fontFamily".to_string(),
            TokenMap::from_iter([("sans", ThemeValue::list(["A"]))]),
        );
        user.extend.insert(
            "fontFamily".to_string(),
            TokenMap::from_iter([("sans", ThemeValue::list(["B"])), ("serif", ThemeValue::list(["C"]))]),
        );
        let theme = resolve(&base(), &user);
        let family = theme.category("fontFamily").expect("category");

        assert_eq!(family.get("sans").and_then(ThemeValue::to_css).as_deref(), Some("B"));
        assert!(family.contains_key("serif"));
        assert!(!family.contains_key("mono"));
    }

    #[test]
    fn extend_recurses_into_nested_tables() {
        let mut user = ThemeConfig::default();
        user.extend.insert(
            "colors".to_string(),
            TokenMap::from_iter([(
                "red",
                ThemeValue::Table(TokenMap::from_iter([("950", "#450a0a"), ("500", "#ff0000")])),
            )]),
        );
        let theme = resolve(&base(), &user);

        assert_eq!(
            theme.get("colors.red.600").and_then(ThemeValue::as_scalar),
            Some("#dc2626")
        );
        assert_eq!(
            theme.get("colors.red.500").and_then(ThemeValue::as_scalar),
            Some("#ff0000")
        );
        assert_eq!(
            theme.get("colors.red.950").and_then(ThemeValue::as_scalar),
            Some("#450a0a")
        );
    }

    #[test]
    fn unknown_categories_become_new_namespaces() {
        let mut user = ThemeConfig::default();
        user.extend.insert(
            "brandTokens".to_string(),
            TokenMap::from_iter([("primary", "#123456")]),
        );
        let theme = resolve(&base(), &user);
        assert_eq!(
            theme.get("brandTokens.primary").and_then(ThemeValue::as_scalar),
            Some("#123456")
        );
    }

    #[test]
    fn dotted_lookup_finds_keys_containing_dots() {
        let theme = default_theme();
        assert_eq!(
            theme.get("spacing.0.5").and_then(ThemeValue::as_scalar),
            Some("0.125rem")
        );
        assert_eq!(
            theme.get("spacing.4").and_then(ThemeValue::as_scalar),
            Some("1rem")
        );
    }

    #[test]
    fn flatten_joins_nested_keys_and_collapses_default() {
        let map = TokenMap::from_iter([
            (
                "brand",
                ThemeValue::Table(TokenMap::from_iter([("DEFAULT", "#111"), ("light", "#eee")])),
            ),
            ("black", ThemeValue::scalar("#000")),
        ]);
        let flat = map
            .flatten()
            .into_iter()
            .map(|(key, _)| key)
            .collect::<Vec<_>>();
        assert_eq!(flat, vec!["brand", "brand-light", "black"]);
    }

    #[test]
    fn replace_strategy_discards_target_entries() {
        let mut target = TokenMap::from_iter([("a", "1"), ("b", "2")]);
        merge_map(&mut target, &TokenMap::from_iter([("c", "3")]), MergeStrategy::Replace);
        assert_eq!(target.keys().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn register_namespace_keeps_user_values() {
        let mut theme = ThemeTable::new();
        theme.set_category("containers", TokenMap::from_iter([("sm", "10rem")]));
        theme.register_namespace(
            "containers",
            TokenMap::from_iter([("xs", "20rem"), ("sm", "24rem")]),
        );
        let containers = theme.category("containers").expect("namespace");
        assert_eq!(containers.get("sm").and_then(ThemeValue::as_scalar), Some("10rem"));
        assert_eq!(containers.get("xs").and_then(ThemeValue::as_scalar), Some("20rem"));
    }

    #[test]
    fn deserializes_theme_config_from_toml_in_document_order() {
        let config: ThemeConfig = toml::from_str(
            r#"
[fontFamily]
sans = ["Name Sans", "sans-serif"]

[extend.screens]
tablet = "700px"
desktop = "1100px"

[extend.opacity]
15 = 0.15
"#,
        )
        .expect("theme should parse");

        assert!(config.overrides.contains_key("fontFamily"));
        let screens = config.extend.get("screens").expect("screens");
        assert_eq!(screens.keys().collect::<Vec<_>>(), vec!["tablet", "desktop"]);
        let opacity = config.extend.get("opacity").expect("opacity");
        assert_eq!(opacity.get("15").and_then(ThemeValue::as_scalar), Some("0.15"));
    }
}
