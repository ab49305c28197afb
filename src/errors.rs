use thiserror::Error;

/// Errors raised by project mutation, persistence, configuration and the
/// outer CLI/MCP layers. Reference resolution itself never fails.
#[derive(Error, Debug)]
pub enum StoryForgeError {
    #[error("file error: {message} (path: {path})")]
    File { message: String, path: String },

    #[error("parse error: {message} (path: {path})")]
    Parse { message: String, path: String },

    #[error("project error: {message}")]
    Project { message: String },

    #[error("block not found: {category}:{block}")]
    BlockNotFound { category: String, block: String },

    #[error("block already exists: {category}:{block}")]
    BlockExists { category: String, block: String },

    #[error("stage not found: {category}:{block}:{stage}")]
    StageNotFound {
        category: String,
        block: String,
        stage: String,
    },

    #[error("version not found: {category}:{block}:{stage}:{version}")]
    VersionNotFound {
        category: String,
        block: String,
        stage: String,
        version: String,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("tool error: {message}")]
    Tool { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias for results using `StoryForgeError`.
pub type Result<T> = std::result::Result<T, StoryForgeError>;
