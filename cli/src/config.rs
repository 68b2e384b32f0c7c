use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::ffi::OsString;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Overrides the database location (useful for scripts and tests).
const DB_PATH_ENV: &str = "MEALPLAN_DB";
const DB_FILE: &str = "mealplan.db";
const API_KEY_FILE: &str = "api_key";

pub struct Config {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "mealplan")
            .context("Could not determine the mealplan data directory")?;
        Self::in_dir(dirs.data_dir(), std::env::var_os(DB_PATH_ENV))
    }

    /// Build a config rooted at `data_dir`, creating it if needed. A
    /// non-empty `db_override` replaces the default database path.
    fn in_dir(data_dir: &Path, db_override: Option<OsString>) -> Result<Self> {
        std::fs::create_dir_all(data_dir).with_context(|| {
            format!("Failed to create data directory: {}", data_dir.display())
        })?;

        let db_path = db_override
            .filter(|p| !p.is_empty())
            .map_or_else(|| data_dir.join(DB_FILE), PathBuf::from);

        Ok(Config {
            db_path,
            data_dir: data_dir.to_path_buf(),
        })
    }

    fn api_key_path(&self) -> PathBuf {
        self.data_dir.join(API_KEY_FILE)
    }

    /// Read the server's API key, generating and storing one on first use.
    pub fn load_or_create_api_key(&self) -> Result<String> {
        let path = self.api_key_path();

        if let Some(key) = read_key(&path)? {
            return Ok(key);
        }

        let key = generate_api_key();
        std::fs::write(&path, &key)
            .with_context(|| format!("Failed to write API key: {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .context("Failed to set API key file permissions")?;
        }
        tracing::info!(path = %path.display(), "generated new API key");
        eprintln!("Generated new API key: {key}");
        eprintln!("Include in requests: Authorization: Bearer {key}");
        Ok(key)
    }
}

fn read_key(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read API key: {}", path.display()))?;
    let key = contents.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

/// 32 random bytes as lowercase hex.
fn generate_api_key() -> String {
    use rand::Rng;

    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
