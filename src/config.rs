use crate::error::ConfigError;
use crate::theme::ThemeConfig;
use globset::Glob;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub content: Vec<String>,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub plugins: Vec<PluginRef>,
    #[serde(default)]
    pub dark_mode: DarkMode,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub minify: bool,
    #[serde(default)]
    pub safelist: Vec<String>,
    #[serde(default)]
    pub blocklist: Vec<String>,
}

/// A plugin named in the configuration, either bare (`"@tailwindcss/forms"`)
/// or as a table carrying options (`{ name = "...", strategy = "class" }`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PluginRef {
    Name(String),
    WithOptions {
        name: String,
        #[serde(flatten)]
        options: BTreeMap<String, String>,
    },
}

impl PluginRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) => name,
            Self::WithOptions { name, .. } => name,
        }
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        match self {
            Self::Name(_) => None,
            Self::WithOptions { options, .. } => options.get(key).map(String::as_str),
        }
    }
}

impl From<&str> for PluginRef {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

/// How the `dark:` variant is expressed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DarkMode {
    #[default]
    Media,
    Class,
    Selector(String),
}

impl<'de> Deserialize<'de> for DarkMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Keyword(String),
            Pair(Vec<String>),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Keyword(keyword) => match keyword.as_str() {
                "media" => Ok(DarkMode::Media),
                "class" => Ok(DarkMode::Class),
                "selector" => Ok(DarkMode::Selector(".dark".to_string())),
                other => Err(serde::de::Error::custom(format!(
                    "unknown darkMode '{}'",
                    other
                ))),
            },
            Raw::Pair(parts) => match parts.as_slice() {
                [kind, selector] if kind == "class" || kind == "selector" => {
                    Ok(DarkMode::Selector(selector.clone()))
                }
                _ => Err(serde::de::Error::custom(
                    "darkMode list must be [\"selector\", \"<selector>\"]",
                )),
            },
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: "<inline>".into(),
            message: err.to_string(),
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::Parse {
            path: "<inline>".into(),
            message: err.to_string(),
        })
    }

    /// Checks what can be checked without touching the filesystem: every
    /// content pattern must compile.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.is_empty() {
            return Err(ConfigError::EmptyContent);
        }
        for pattern in &self.content {
            Glob::new(pattern).map_err(|err| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                message: err.to_string(),
            })?;
        }
        Ok(())
    }
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase());
    let parsed = match ext.as_deref() {
        Some("toml") => toml::from_str(&text).map_err(|err| err.to_string()),
        Some("json") => serde_json::from_str(&text).map_err(|err| err.to_string()),
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };
    let config: Config = parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(
        path = %path.display(),
        content = config.content.len(),
        plugins = config.plugins.len(),
        "loaded config"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::{load, Config, DarkMode, PluginRef};
    use crate::error::ConfigError;
    use std::fs;

    #[test]
    fn loads_toml_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stylesmith.toml");
        fs::write(
            &path,
            r#"
content = ["./index.html", "./src/elm/**/*.elm"]
plugins = ["@tailwindcss/forms", { name = "@tailwindcss/typography", className = "wysiwyg" }]

[theme.fontFamily]
sans = ["Name Sans", "sans-serif"]

[theme.extend]
"#,
        )
        .expect("write config");

        let config = load(&path).expect("config should parse");
        assert_eq!(config.content.len(), 2);
        assert_eq!(config.plugins[0], PluginRef::from("@tailwindcss/forms"));
        assert_eq!(config.plugins[1].name(), "@tailwindcss/typography");
        assert_eq!(config.plugins[1].option("className"), Some("wysiwyg"));
        assert!(config.theme.overrides.contains_key("fontFamily"));
        assert!(config.theme.extend.is_empty());
    }

    #[test]
    fn loads_json_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stylesmith.json");
        fs::write(
            &path,
            r#"{
  "content": ["./src/**/*.{html,js}"],
  "darkMode": "class",
  "theme": { "extend": { "fontFamily": { "sans": ["Foo", "sans-serif"] } } },
  "plugins": ["@tailwindcss/container-queries"]
}"#,
        )
        .expect("write config");

        let config = load(&path).expect("config should parse");
        assert_eq!(config.dark_mode, DarkMode::Class);
        assert!(config.theme.extend.contains_key("fontFamily"));
        assert!(config.theme.overrides.is_empty());
    }

    #[test]
    fn defaults_when_sections_missing() {
        let config = Config::from_toml_str("").expect("empty config should parse");
        assert_eq!(config, Config::default());
        assert_eq!(config.dark_mode, DarkMode::Media);
    }

    #[test]
    fn parses_selector_dark_mode() {
        let config = Config::from_json_str(r#"{ "darkMode": ["selector", "[data-theme=dark]"] }"#)
            .expect("config should parse");
        assert_eq!(
            config.dark_mode,
            DarkMode::Selector("[data-theme=dark]".to_string())
        );
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stylesmith.yaml");
        fs::write(&path, "content: []").expect("write config");
        assert!(matches!(load(&path), Err(ConfigError::UnsupportedFormat(_))));
    }

    #[test]
    fn validate_reports_malformed_glob() {
        let config = Config {
            content: vec!["src/**/*.{html".to_string()],
            ..Config::default()
        };
        match config.validate() {
            Err(ConfigError::InvalidGlob { pattern, .. }) => assert_eq!(pattern, "src/**/*.{html"),
            other => panic!("expected invalid glob, got {:?}", other),
        }
    }

    #[test]
    fn validate_requires_content() {
        assert!(matches!(
            Config::default().validate(),
            Err(ConfigError::EmptyContent)
        ));
    }
}
