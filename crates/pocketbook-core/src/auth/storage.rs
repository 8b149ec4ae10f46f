use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

/// Tokens as persisted on disk. Field names match the wire names the
/// backend uses so a file written by one client version stays readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(rename = "token")]
    pub access: Option<String>,
    #[serde(rename = "refreshToken")]
    pub refresh: Option<String>,
}

/// Durable token storage backed by a JSON file.
pub struct TokenStorage {
    data_dir: PathBuf,
}

impl TokenStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Load tokens from disk. A missing file is not an error; it just
    /// means no session has been persisted yet.
    pub fn load(&self) -> Result<StoredTokens> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(StoredTokens::default());
        }
        let contents = std::fs::read_to_string(&path)
            .context("Failed to read token file")?;
        let tokens: StoredTokens = serde_json::from_str(&contents)
            .context("Failed to parse token file")?;
        Ok(tokens)
    }

    /// Save both tokens to disk.
    pub fn store(&self, access: &str, refresh: &str) -> Result<()> {
        self.write(&StoredTokens {
            access: Some(access.to_string()),
            refresh: Some(refresh.to_string()),
        })
    }

    /// Replace only the access token, keeping the stored refresh token.
    pub fn store_access(&self, access: &str) -> Result<()> {
        let mut tokens = self.load().unwrap_or_default();
        tokens.access = Some(access.to_string());
        self.write(&tokens)
    }

    /// Remove all persisted tokens.
    pub fn clear(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token file")?;
        }
        Ok(())
    }

    fn write(&self, tokens: &StoredTokens) -> Result<()> {
        let path = self.token_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(tokens)?;
        std::fs::write(path, contents).context("Failed to write token file")?;
        Ok(())
    }

    fn token_path(&self) -> PathBuf {
        self.data_dir.join(TOKEN_FILE)
    }
}
