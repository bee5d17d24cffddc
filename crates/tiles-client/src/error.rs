//! Error types for the client.

use std::fmt;
use std::path::PathBuf;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from fetching credit images and loading configuration.
#[derive(Debug)]
pub enum Error {
    /// HTTP request failed.
    Http {
        /// The URL that failed.
        url: String,
        /// The error message.
        message: String,
    },
    /// HTTP response had a non-success status code.
    HttpStatus {
        /// The URL that returned the error.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
    /// A `data:` URI could not be decoded.
    MalformedDataUri {
        /// Description of what was wrong.
        detail: String,
    },
    /// Image bytes could not be decoded.
    ImageDecode(image::ImageError),
    /// A configuration file could not be read or parsed.
    Config {
        /// The file that failed.
        path: PathBuf,
        /// The error message.
        message: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http { url, message } => {
                write!(f, "http request to {url} failed: {message}")
            }
            Error::HttpStatus { url, status } => {
                write!(f, "http request to {url} returned status {status}")
            }
            Error::MalformedDataUri { detail } => write!(f, "malformed data uri: {detail}"),
            Error::ImageDecode(e) => write!(f, "image decode error: {e}"),
            Error::Config { path, message } => {
                write!(f, "failed to load config {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ImageDecode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::ImageDecode(e)
    }
}
