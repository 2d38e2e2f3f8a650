use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(clearmarkup_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Invalid value `{value}` for {key}")]
    #[diagnostic(
        code(clearmarkup_config::invalid_value),
        help("Fix the value in your environment or configuration file")
    )]
    InvalidValue { key: String, value: String },

    #[error("IO error: {0}")]
    #[diagnostic(code(clearmarkup_config::io))]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
