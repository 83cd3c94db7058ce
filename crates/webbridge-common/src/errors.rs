use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Failures reported by an engine binding when a native call cannot be
/// carried out. These never reach page script.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine not ready")]
    NotReady,

    #[error("not supported by this engine: {0}")]
    Unsupported(String),

    #[error("script evaluation failed: {0}")]
    Script(String),

    #[error("load failed: {0}")]
    Load(String),

    #[error("native engine error: {0}")]
    Native(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("navigation consumer already attached")]
    ConsumerAttached,

    #[error("session is detached from its engine")]
    Detached,

    #[error("{0}")]
    Other(String),
}
