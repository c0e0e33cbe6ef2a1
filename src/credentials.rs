use std::collections::HashMap;
use std::path::Path;

use crate::error::{GalleryError, Result};

const ACCESS_KEY: &str = "accessKey";
const SECRET_KEY: &str = "secretKey";

/// Static access-key material read from a properties file
#[derive(Clone)]
pub struct AccessKeys {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for AccessKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessKeys")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

impl AccessKeys {
    /// Read `accessKey` and `secretKey` from a properties file
    ///
    /// # Errors
    ///
    /// Returns `CredentialsUnavailable` if the file cannot be read or either
    /// key is missing or empty
    pub fn load(path: &Path) -> Result<Self> {
        let unavailable = |reason: String| GalleryError::CredentialsUnavailable {
            path: path.to_path_buf(),
            reason,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| unavailable(e.to_string()))?;
        let properties = parse_properties(&contents);

        let get = |name: &str| {
            properties
                .get(name)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or_else(|| unavailable(format!("missing `{}` entry", name)))
        };

        Ok(Self {
            access_key_id: get(ACCESS_KEY)?,
            secret_access_key: get(SECRET_KEY)?,
        })
    }
}

/// Parse `key=value` / `key: value` lines, skipping comments and blanks
fn parse_properties(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(|c: char| c == '=' || c == ':')?;
            let key = line[..split].trim();
            let value = line[split + 1..].trim();
            if key.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}
