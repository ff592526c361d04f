use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to create directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to read existing document {}: {source}", path.display())]
    ReadDocument { path: PathBuf, source: io::Error },

    #[error("Failed to write temporary file in {}: {source}", dir.display())]
    WriteTemp { dir: PathBuf, source: io::Error },

    #[error("Failed to replace {}: {source}", path.display())]
    Persist { path: PathBuf, source: io::Error },

    #[error("Failed to read attachment {}: {source}", path.display())]
    ReadAttachment { path: PathBuf, source: io::Error },

    #[error("Failed to write attachment {}: {source}", path.display())]
    WriteAttachment { path: PathBuf, source: io::Error },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The configured date pattern is not a valid strftime string.
    #[error("Invalid time format: {0:?}")]
    InvalidTimeFormat(String),

    #[error("Failed to read config {}: {source}", path.display())]
    ConfigRead { path: PathBuf, source: io::Error },

    #[error("Failed to parse config {}: {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Config file not found: {}", path.display())]
    ConfigMissing { path: PathBuf },

    /// The output root is missing, not a directory, or not writable.
    #[error("Output directory {} is not usable: {source}", path.display())]
    OutputRoot { path: PathBuf, source: io::Error },
}
