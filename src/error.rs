use std::path::PathBuf;

/// Problems with the configuration object itself. Reported before any file is read.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("unsupported config format for {0} (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    #[error("content requires at least one glob pattern")]
    EmptyContent,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("base path not found: {0}")]
    MissingBase(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A file that could not be read. Non-fatal: the scan carries on without it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    pub path: PathBuf,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("unknown plugin '{0}'")]
    Unknown(String),

    #[error("plugin '{plugin}' has an invalid option '{option}': {message}")]
    InvalidOption {
        plugin: String,
        option: String,
        message: String,
    },

    #[error("plugin '{plugin}' failed to register: {message}")]
    Registration { plugin: String, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("build cancelled")]
    Cancelled,
}
