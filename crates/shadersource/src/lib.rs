//! Retrieval of fragment shader source text.
//!
//! A shader is addressed by a [`SourceHandle`]: either an `http(s)` URL or a
//! local file path. Fetching is a one-shot blocking read performed during
//! bootstrap, before any GPU resource exists; there is no cache and no retry
//! policy. A failed fetch is terminal for the run.

use std::fmt;
use std::fs;
use std::path::PathBuf;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

/// Errors raised while resolving or fetching shader source.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid shader source url '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("failed to construct HTTP client")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch shader source from {url}")]
    Remote {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read shader source at {}", path.display())]
    Local {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader source at {location} is empty")]
    Empty { location: String },
}

/// Where a fragment shader lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceHandle {
    Remote(Url),
    Local(PathBuf),
}

impl SourceHandle {
    /// Parses user input into a handle.
    ///
    /// Anything starting with `http://` or `https://` is treated as a URL;
    /// everything else is a filesystem path.
    pub fn from_input(input: &str) -> Result<Self, FetchError> {
        if input.starts_with("http://") || input.starts_with("https://") {
            let url = Url::parse(input).map_err(|err| FetchError::InvalidUrl {
                input: input.to_string(),
                reason: err.to_string(),
            })?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::Local(PathBuf::from(input)))
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for SourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceHandle::Remote(url) => write!(f, "{url}"),
            SourceHandle::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Blocking fetcher for shader source text.
pub struct SourceClient {
    http: Client,
}

impl SourceClient {
    pub fn new() -> Result<Self, FetchError> {
        let http = Client::builder()
            .build()
            .map_err(|err| FetchError::Client { source: err })?;
        Ok(Self { http })
    }

    /// Retrieves the UTF-8 shader text behind the handle.
    ///
    /// An empty body is rejected: the device compiler would only produce a
    /// less useful diagnostic for it later.
    pub fn fetch(&self, handle: &SourceHandle) -> Result<String, FetchError> {
        let text = match handle {
            SourceHandle::Local(path) => {
                debug!(path = %path.display(), "reading shader source from disk");
                fs::read_to_string(path).map_err(|err| FetchError::Local {
                    path: path.clone(),
                    source: err,
                })?
            }
            SourceHandle::Remote(url) => {
                debug!(%url, "fetching shader source");
                self.http
                    .get(url.clone())
                    .send()
                    .and_then(|response| response.error_for_status())
                    .and_then(|response| response.text())
                    .map_err(|err| FetchError::Remote {
                        url: url.to_string(),
                        source: err,
                    })?
            }
        };

        if text.trim().is_empty() {
            return Err(FetchError::Empty {
                location: handle.to_string(),
            });
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_urls_as_remote_handles() {
        let handle = SourceHandle::from_input("https://example.com/shader.frag").unwrap();
        assert!(handle.is_remote());
        assert_eq!(handle.to_string(), "https://example.com/shader.frag");
    }

    #[test]
    fn parses_everything_else_as_local_paths() {
        let handle = SourceHandle::from_input("shaders/demo.frag").unwrap();
        assert_eq!(
            handle,
            SourceHandle::Local(PathBuf::from("shaders/demo.frag"))
        );
    }

    #[test]
    fn rejects_malformed_urls() {
        let result = SourceHandle::from_input("http://[not-a-url");
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn local_fetch_round_trips_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "void main() {{ gl_FragColor = vec4(1.0); }}").unwrap();

        let handle = SourceHandle::Local(file.path().to_path_buf());
        let client = SourceClient::new().unwrap();
        let text = client.fetch(&handle).unwrap();
        assert!(text.contains("gl_FragColor"));
    }

    #[test]
    fn missing_file_reports_the_path() {
        let handle = SourceHandle::Local(PathBuf::from("/nonexistent/shader.frag"));
        let client = SourceClient::new().unwrap();
        match client.fetch(&handle) {
            Err(FetchError::Local { path, .. }) => {
                assert_eq!(path, PathBuf::from("/nonexistent/shader.frag"));
            }
            other => panic!("expected a local read error, got {other:?}"),
        }
    }

    #[test]
    fn empty_source_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let handle = SourceHandle::Local(file.path().to_path_buf());
        let client = SourceClient::new().unwrap();
        assert!(matches!(
            client.fetch(&handle),
            Err(FetchError::Empty { .. })
        ));
    }
}
