use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use services::voice::TranscriptionConfig;

pub const DEFAULT_DB_URL: &str = "sqlite://interview.sqlite3";
pub const DEFAULT_MIRROR_PATH: &str = "interview-mirror.json";

/// Runtime configuration from the environment (and `.env`), before CLI
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_url: String,
    pub mirror_path: Option<PathBuf>,
    pub log_filter: String,
    /// Set when a usable speech-to-text key is present.
    pub transcription: Option<TranscriptionConfig>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let db_url = std::env::var("INTERVIEW_DB_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_string(), normalize_sqlite_url);
        let mirror_path = match std::env::var("INTERVIEW_MIRROR_PATH") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) => Some(PathBuf::from(v)),
            Err(_) => Some(PathBuf::from(DEFAULT_MIRROR_PATH)),
        };
        let log_filter = std::env::var("INTERVIEW_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            db_url,
            mirror_path,
            log_filter,
            transcription: TranscriptionConfig::from_env(),
        }
    }
}

/// Turns `path`, `sqlite:path` or `sqlite://path` into an absolute
/// `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Creates the database file and its directory so the pool can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" || db_url.contains("mode=memory") {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("invalid database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("invalid database url: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("creating {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_pass_through() {
        assert_eq!(
            normalize_sqlite_url("sqlite://data/x.db".into()),
            "sqlite://data/x.db"
        );
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn bare_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:/tmp/interview.db".into());
        assert_eq!(url, "sqlite:///tmp/interview.db");
        assert!(normalize_sqlite_url("rel.db".into()).starts_with("sqlite:///"));
    }

    #[test]
    fn prepare_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("interview.sqlite3");
        prepare_sqlite_file(&format!("sqlite://{}", path.display())).unwrap();
        assert!(path.exists());
        assert!(prepare_sqlite_file("postgres://nope").is_err());
    }
}
