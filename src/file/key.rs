//! File key derivation.
//!
//! A file key has the shape `<user>_<unix millis>_<original name>`. User
//! names cannot contain `_`, so the first `_` always ends the owner part and
//! `"<user>_"` is an exact ownership prefix.

use std::fmt;
use std::path::Path;

use crate::{PortalError, Result};

use super::{MAX_FILENAME_LENGTH, MAX_KEY_BYTES, MAX_USER_NAME_LENGTH};

/// Separator between the parts of a file key.
pub const KEY_SEPARATOR: char = '_';

/// Validate a user name.
///
/// Rules: non-empty, at most 64 characters, no leading `.`, no `_`, no path
/// separators, no control characters.
pub fn validate_user_name(user_name: &str) -> Result<()> {
    if user_name.is_empty() {
        return Err(PortalError::Validation("user name is required".to_string()));
    }
    if user_name.chars().count() > MAX_USER_NAME_LENGTH {
        return Err(PortalError::Validation(format!(
            "user name must be at most {MAX_USER_NAME_LENGTH} characters"
        )));
    }
    if user_name.trim() != user_name {
        return Err(PortalError::Validation(
            "user name must not start or end with whitespace".to_string(),
        ));
    }
    if user_name.starts_with('.') {
        return Err(PortalError::Validation(
            "user name must not start with '.'".to_string(),
        ));
    }
    if user_name
        .chars()
        .any(|c| c == KEY_SEPARATOR || c == '/' || c == '\\' || c.is_control())
    {
        return Err(PortalError::Validation(
            "user name must not contain '_', '/', '\\' or control characters".to_string(),
        ));
    }
    Ok(())
}

/// Reduce an uploaded file name to its last path component and validate it.
///
/// Browsers may send a full client path (`C:\Users\x\notes.txt`), so both
/// separator styles are stripped.
pub fn sanitize_file_name(file_name: &str) -> Result<String> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    if base.is_empty() || base == "." || base == ".." {
        return Err(PortalError::Validation("file name is required".to_string()));
    }
    if base.chars().count() > MAX_FILENAME_LENGTH {
        return Err(PortalError::Validation(format!(
            "file name must be at most {MAX_FILENAME_LENGTH} characters"
        )));
    }
    if base.chars().any(|c| c.is_control()) {
        return Err(PortalError::Validation(
            "file name must not contain control characters".to_string(),
        ));
    }
    Ok(base.to_string())
}

/// The ownership prefix of every key belonging to `user_name`.
pub fn owner_prefix(user_name: &str) -> String {
    format!("{user_name}{KEY_SEPARATOR}")
}

/// A parsed file key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKey {
    user_name: String,
    stamp: i64,
    file_name: String,
}

impl FileKey {
    /// Build a key for an upload happening at `stamp` (unix millis).
    ///
    /// Inputs are validated; the file name is sanitized. The encoded key
    /// must fit in [`MAX_KEY_BYTES`].
    pub fn new(user_name: &str, stamp: i64, file_name: &str) -> Result<Self> {
        validate_user_name(user_name)?;
        let file_name = sanitize_file_name(file_name)?;
        let key = Self {
            user_name: user_name.to_string(),
            stamp,
            file_name,
        };

        let encoded_len = key.to_string().len();
        if encoded_len > MAX_KEY_BYTES {
            let available = MAX_KEY_BYTES.saturating_sub(encoded_len - key.file_name.len());
            return Err(PortalError::Validation(format!(
                "file name too long: at most {available} bytes allowed for this user name"
            )));
        }
        Ok(key)
    }

    /// Build a key stamped with the current time.
    pub fn now(user_name: &str, file_name: &str) -> Result<Self> {
        Self::new(user_name, chrono::Utc::now().timestamp_millis(), file_name)
    }

    /// Parse a stored key. Returns `None` for keys this portal did not derive.
    pub fn parse(key: &str) -> Option<Self> {
        let mut parts = key.splitn(3, KEY_SEPARATOR);
        let user_name = parts.next()?;
        let stamp = parts.next()?;
        let file_name = parts.next()?;

        if user_name.is_empty() || file_name.is_empty() {
            return None;
        }
        if stamp.is_empty() || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            user_name: user_name.to_string(),
            stamp: stamp.parse().ok()?,
            file_name: file_name.to_string(),
        })
    }

    /// Owner name.
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Upload time in unix millis.
    pub fn stamp(&self) -> i64 {
        self.stamp
    }

    /// Original file name, shown to the user in place of the key.
    pub fn display_name(&self) -> &str {
        &self.file_name
    }

    /// Returns true if the key belongs to `user_name`.
    pub fn is_owned_by(&self, user_name: &str) -> bool {
        self.user_name == user_name
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{KEY_SEPARATOR}{}{KEY_SEPARATOR}{}",
            self.user_name, self.stamp, self.file_name
        )
    }
}

/// Guess a content type from a file or key name.
pub fn content_type_for(name: &str) -> String {
    mime_guess::from_path(Path::new(name))
        .first_or_octet_stream()
        .to_string()
}
