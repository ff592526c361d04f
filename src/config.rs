//! Settings, resolved from (highest priority first) CLI flags, a TOML
//! config file, and built-in defaults.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::attachments::default_images_dir;
use crate::error::{Error, Result};
use crate::frontmatter::ManagedKeys;
use crate::note::{TransformOptions, validate_time_format};

pub const LOCAL_CONFIG_FILE: &str = ".bhugo.toml";

const BEAR_DATABASE: &str =
    "Library/Group Containers/9K33E3U3T4.net.shinyfrog.bear/Application Data/database.sqlite";

/// Contents of a config file. Every key is optional.
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub interval_ms: Option<u64>,
    pub hugo_dir: Option<PathBuf>,
    pub content_dir: Option<PathBuf>,
    pub note_tag: Option<String>,
    pub categories: Option<bool>,
    pub tags: Option<bool>,
    pub time_format: Option<String>,
    pub tag_line: Option<i64>,
    pub omit_non_note_tag_prefix: Option<bool>,
    pub database: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub interval: Duration,
    pub hugo_dir: PathBuf,
    pub content_dir: PathBuf,
    pub note_tag: String,
    pub categories: bool,
    pub tags: bool,
    /// chrono strftime pattern for the `date` key.
    pub time_format: String,
    pub tag_line: i64,
    pub omit_non_note_tag_prefix: bool,
    pub database: PathBuf,
    pub images_dir: PathBuf,
}

pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(BEAR_DATABASE))
}

/// Load the config file at `explicit_path`, or the first of `./.bhugo.toml`
/// and `<config dir>/bhugo/config.toml` that exists.
pub fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = if let Some(p) = explicit_path {
        if !p.exists() {
            return Err(Error::ConfigMissing {
                path: p.to_path_buf(),
            });
        }
        Some(p.to_path_buf())
    } else {
        Some(PathBuf::from(LOCAL_CONFIG_FILE))
            .filter(|p| p.exists())
            .or_else(|| {
                dirs::config_dir()
                    .map(|d| d.join("bhugo/config.toml"))
                    .filter(|p| p.exists())
            })
    };

    match path {
        None => Ok(FileConfig::default()),
        Some(path) => {
            let content = fs::read_to_string(&path).map_err(|source| Error::ConfigRead {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| Error::ConfigParse { path, source })
        }
    }
}

impl Config {
    /// Fill in defaults for everything `file` leaves out.
    ///
    /// `database` falls back to Bear's location in the home directory; when
    /// there is no home directory it stays relative.
    pub fn from_file(file: FileConfig) -> Self {
        let database = file
            .database
            .or_else(default_database_path)
            .unwrap_or_else(|| PathBuf::from("database.sqlite"));
        let images_dir = file
            .images_dir
            .unwrap_or_else(|| default_images_dir(&database));

        Self {
            interval: Duration::from_millis(file.interval_ms.unwrap_or(1000)),
            hugo_dir: file.hugo_dir.unwrap_or_else(|| PathBuf::from(".")),
            content_dir: file
                .content_dir
                .unwrap_or_else(|| PathBuf::from("content/blog")),
            note_tag: file.note_tag.unwrap_or_else(|| "blog".to_string()),
            categories: file.categories.unwrap_or(true),
            tags: file.tags.unwrap_or(false),
            time_format: file
                .time_format
                .unwrap_or_else(|| "%Y-%m-%dT%H:%M:%S%:z".to_string()),
            tag_line: file.tag_line.unwrap_or(-1),
            omit_non_note_tag_prefix: file.omit_non_note_tag_prefix.unwrap_or(true),
            database,
            images_dir,
        }
    }

    /// Reject settings that would only fail once notes start flowing.
    pub fn validate(&self) -> Result<()> {
        validate_time_format(&self.time_format)
    }

    pub fn content_root(&self) -> PathBuf {
        self.hugo_dir.join(&self.content_dir)
    }

    pub fn managed_keys(&self) -> ManagedKeys {
        ManagedKeys::new(self.categories, self.tags)
    }

    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            note_tag: self.note_tag.clone(),
            tag_line: self.tag_line,
            omit_non_note_tag_prefix: self.omit_non_note_tag_prefix,
            categories: self.categories,
            tags: self.tags,
            time_format: self.time_format.clone(),
        }
    }
}
