//! Credential pair and discovery from a local credentials file.

use std::path::Path;

use crate::error::ApiError;

/// API credential pair supplied at client construction. Immutable for the
/// client's lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user_code: String,
    pub api_token: String,
}

impl Credentials {
    pub fn new(user_code: &str, api_token: &str) -> Self {
        Self {
            user_code: user_code.to_string(),
            api_token: api_token.to_string(),
        }
    }

    /// Load stored credentials from a colon-delimited `code:token` file.
    ///
    /// The first non-comment, non-blank line wins. A missing file means "no
    /// stored credentials" and returns `Ok(None)`; a file that exists but
    /// holds no parseable entry is a configuration error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Option<Self>, ApiError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ApiError::InvalidCredentialsFile(format!(
                    "{}: {e}",
                    path.display()
                )))
            }
        };
        Self::parse(&contents)
            .map(Some)
            .map_err(|msg| ApiError::InvalidCredentialsFile(format!("{}: {msg}", path.display())))
    }

    fn parse(contents: &str) -> Result<Self, String> {
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (user_code, api_token) = line
                .split_once(':')
                .ok_or_else(|| "expected a code:token line".to_string())?;
            let (user_code, api_token) = (user_code.trim(), api_token.trim());
            if user_code.is_empty() || api_token.is_empty() {
                return Err("code and token must both be non-empty".to_string());
            }
            return Ok(Self::new(user_code, api_token));
        }
        Err("no credential entry found".to_string())
    }
}
