//! URL building and request body helpers layered on top of `crux_http`.
//!
//! The transport itself is Crux's `Http` capability; this module only turns
//! the configured base URL plus an endpoint path into a validated absolute URL
//! and encodes the non-JSON bodies the backend expects.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use crux_http::Http;

pub const MAX_URL_LENGTH: usize = 2048;
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum HttpError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("upload too large: {size} bytes exceeds maximum of {max} bytes")]
    BodyTooLarge { size: usize, max: usize },

    #[error("invalid multipart field '{name}': {reason}")]
    InvalidField { name: String, reason: String },

    #[error("failed to encode request body: {reason}")]
    Encode { reason: String },
}

/// Absolute `http`/`https` base URL every endpoint path is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase {
    url: Url,
}

impl ApiBase {
    pub fn parse(base: &str) -> Result<Self, HttpError> {
        let trimmed = base.trim();
        if trimmed.is_empty() {
            return Err(HttpError::InvalidUrl {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let url = Url::parse(trimmed).map_err(|e| HttpError::InvalidUrl {
            url: truncate_url(trimmed),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        if url.host_str().is_none() {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: "URL must have a host".to_string(),
            });
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(HttpError::InvalidUrl {
                url: truncate_url(trimmed),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(Self { url })
    }

    /// Resolves `path` (e.g. `/api/survey/list`) against the base, followed by
    /// `segments`, each percent-encoded as a single path segment.
    pub fn endpoint(&self, path: &str, segments: &[&str]) -> Result<String, HttpError> {
        let mut url = self.url.clone();
        {
            let mut parts = url.path_segments_mut().map_err(|()| HttpError::InvalidUrl {
                url: self.url.to_string(),
                reason: "base URL cannot have path segments".to_string(),
            })?;
            parts.pop_if_empty();
            parts.extend(path.split('/').filter(|s| !s.is_empty()));
            parts.extend(segments.iter().copied());
        }
        Ok(url.to_string())
    }
}

fn truncate_url(url: &str) -> String {
    if url.len() <= 100 {
        url.to_string()
    } else {
        let cut = (0..=100).rev().find(|&i| url.is_char_boundary(i)).unwrap_or(0);
        format!("{}...", &url[..cut])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Json,
    Multipart { boundary: String },
}

impl ContentType {
    pub fn header_value(&self) -> String {
        match self {
            ContentType::Json => "application/json".to_string(),
            ContentType::Multipart { boundary } => {
                format!("multipart/form-data; boundary={boundary}")
            }
        }
    }
}

/// A file picked by the user in the shell, handed to the core as raw bytes.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

// Keep image bytes out of logs.
impl std::fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Minimal `multipart/form-data` encoder holding file parts.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(format!("----medimap-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            body: Vec::new(),
        }
    }

    pub fn file(mut self, name: &str, upload: &FileUpload) -> Result<Self, HttpError> {
        if upload.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(HttpError::BodyTooLarge {
                size: upload.bytes.len(),
                max: MAX_UPLOAD_BYTES,
            });
        }
        Self::validate_token(name, name)?;
        Self::validate_token(name, &upload.file_name)?;
        Self::validate_token(name, &upload.mime_type)?;

        self.body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{}\"\r\n",
                upload.file_name
            )
            .as_bytes(),
        );
        self.body
            .extend_from_slice(format!("Content-Type: {}\r\n\r\n", upload.mime_type).as_bytes());
        self.body.extend_from_slice(&upload.bytes);
        self.body.extend_from_slice(b"\r\n");
        Ok(self)
    }

    /// Returns the content type header and the encoded body.
    pub fn finish(mut self) -> (ContentType, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        (
            ContentType::Multipart {
                boundary: self.boundary,
            },
            self.body,
        )
    }

    fn validate_token(field: &str, value: &str) -> Result<(), HttpError> {
        if value.is_empty() {
            return Err(HttpError::InvalidField {
                name: field.to_string(),
                reason: "value cannot be empty".to_string(),
            });
        }
        if value.chars().any(|c| c == '"' || c == '\r' || c == '\n' || c == '\0') {
            return Err(HttpError::InvalidField {
                name: field.to_string(),
                reason: "value contains quote or control characters".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}
