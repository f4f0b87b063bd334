//! Fetching the raw page container

use std::fmt;
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};

/// Default timeout for HTTP fetches
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a page container comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    Path(PathBuf),
}

impl SourceLocation {
    /// Interpret a user-supplied string: `http(s)://` is a URL, anything else a path
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Self::Url(trimmed.to_string())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Immutable bytes of a fetched container
#[derive(Clone, PartialEq, Eq)]
pub struct SourceBuffer(Arc<[u8]>);

impl SourceBuffer {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes.into())
    }
}

impl Deref for SourceBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for SourceBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for SourceBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceBuffer").field(&self.0.len()).finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("GET {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("GET {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads containers from URLs or local files
pub struct Fetcher {
    timeout: Duration,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

impl Fetcher {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn fetch(&self, location: &SourceLocation) -> Result<SourceBuffer, FetchError> {
        match location {
            SourceLocation::Url(url) => self.fetch_url(url),
            SourceLocation::Path(path) => {
                debug!("Reading container from {path:?}");
                let bytes = std::fs::read(path).map_err(|source| FetchError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(SourceBuffer::new(bytes))
            }
        }
    }

    fn fetch_url(&self, url: &str) -> Result<SourceBuffer, FetchError> {
        let http = |source: reqwest::Error| FetchError::Http {
            url: url.to_string(),
            source,
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(http)?;
        let response = client.get(url).send().map_err(http)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = response.bytes().map_err(http)?;
        info!("Fetched {} bytes from {url}", bytes.len());
        Ok(SourceBuffer::new(bytes.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        assert_eq!(
            SourceLocation::parse("https://example.org/a.tif"),
            SourceLocation::Url("https://example.org/a.tif".to_string())
        );
        assert_eq!(
            SourceLocation::parse(" scans/a.tif "),
            SourceLocation::Path(PathBuf::from("scans/a.tif"))
        );
    }

    #[test]
    fn fetch_reads_local_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"II*\0").unwrap();

        let location = SourceLocation::Path(file.path().to_path_buf());
        let buffer = Fetcher::default().fetch(&location).unwrap();
        assert_eq!(&*buffer, b"II*\0");
    }

    #[test]
    fn missing_file_is_io_error() {
        let location = SourceLocation::Path(PathBuf::from("/nonexistent/pageloupe/none.tif"));
        let err = Fetcher::default().fetch(&location).unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }
}
