/// Type alias for Result with anyhow::Error as the error type.
/// Used by adapters, configuration loading and the CLI, where errors only
/// need to be reported. Pipeline outcomes use the typed errors in `error`.
pub type Result<T> = std::result::Result<T, anyhow::Error>;
