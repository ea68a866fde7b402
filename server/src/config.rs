use crate::filesystem::Directory;
use config::{ConfigError, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use strum::Display;

#[derive(Clone, Copy, Debug, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RegexType {
    Password,
    Slug,
    Username,
}

#[derive(Clone, Debug, Deserialize)]
pub struct PageSizes {
    pub index: i64,
    pub group: i64,
    pub profile: i64,
    pub follow: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CacheSettings {
    pub index_timeout: u64,
    pub max_entries: usize,
}

#[derive(Clone, Debug, Deserialize)]
struct Regexes {
    #[serde(with = "serde_regex")]
    password: Regex,
    #[serde(with = "serde_regex")]
    slug: Regex,
    #[serde(with = "serde_regex")]
    username: Regex,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub media_root: PathBuf,
    pub media_url: String,
    pub password_secret: String,
    pub session_lifetime_days: i64,
    pub pagination: PageSizes,
    pub cache: CacheSettings,
    regex: Regexes,
}

impl Config {
    /// Reads configuration from the bundled defaults, then an optional config.toml,
    /// then `YATUBE__`-prefixed environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            tracing::warn!("Could not read .env file. Details:\n{err}");
        }

        config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(config_path()).required(false))
            .add_source(Environment::with_prefix("YATUBE").separator("__").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn regex(&self, regex_type: RegexType) -> &Regex {
        match regex_type {
            RegexType::Password => &self.regex.password,
            RegexType::Slug => &self.regex.slug,
            RegexType::Username => &self.regex.username,
        }
    }

    /// Returns the on-disk location of a media `directory`.
    pub fn path(&self, directory: Directory) -> PathBuf {
        let name: &'static str = directory.into();
        self.media_root.join(name)
    }

    /// Returns the public URL of a media file stored at `relative_path`.
    pub fn media_url(&self, relative_path: &str) -> String {
        format!("{}/{relative_path}", self.media_url.trim_end_matches('/'))
    }
}

/// Configuration for tests: bundled defaults with an in-memory database.
#[cfg(test)]
pub fn test_config() -> Config {
    let mut config: Config = config::Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .build()
        .and_then(config::Config::try_deserialize)
        .unwrap_or_else(|err| panic!("Default config is invalid: {err}"));
    config.database_url = String::from(":memory:");
    config
}

const DEFAULT_CONFIG: &str = include_str!("../config.toml.dist");

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("YATUBE_CONFIG") {
        return PathBuf::from(path);
    }
    std::env::current_exe()
        .ok()
        .as_deref()
        .and_then(Path::parent)
        .map(|parent| parent.join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = test_config();
        assert_eq!(config.pagination.index, 10);
        assert_eq!(config.pagination.group, 12);
        assert_eq!(config.pagination.profile, 5);
        assert_eq!(config.pagination.follow, 10);
        assert_eq!(config.cache.index_timeout, 20);
        assert_eq!(config.media_url("posts/small.jpg"), "/media/posts/small.jpg");
    }

    #[test]
    fn regexes() {
        let config = test_config();
        assert!(config.regex(RegexType::Username).is_match("test.user@mail+1"));
        assert!(!config.regex(RegexType::Username).is_match("spaced name"));
        assert!(!config.regex(RegexType::Username).is_match(""));
        assert!(config.regex(RegexType::Slug).is_match("test-group_1"));
        assert!(!config.regex(RegexType::Slug).is_match("test group"));
        assert!(config.regex(RegexType::Password).is_match("long enough"));
        assert!(!config.regex(RegexType::Password).is_match("short"));
    }
}
