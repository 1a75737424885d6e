use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while setting up the viewport or loading map assets.
#[derive(Debug, Error)]
pub enum Error {
    /// The viewport or drawing surface cannot be used with the given settings.
    #[error("viewport initialisation failed: {0}")]
    Initialization(String),
    /// File I/O error
    #[error("I/O error reading {}: {source}", .path.display())]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// JSON parse error
    #[error("JSON parse error in {}: {source}", .path.display())]
    Json {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying parser error.
        #[source]
        source: serde_json::Error,
    },
    /// An image could not be fetched or decoded.
    #[error("failed to load image {path}: {reason}")]
    ImageDecode {
        /// Requested image path.
        path: String,
        /// Backend error message.
        reason: String,
    },
    /// Unsupported file format (non-JSON)
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    /// Structurally invalid map or tileset file.
    #[error("invalid map: {0}")]
    InvalidMap(String),
}

impl Error {
    /// True for every failure of fetching or parsing an asset, as opposed to
    /// a startup failure of the viewport.
    pub fn is_asset_load(&self) -> bool {
        !matches!(self, Error::Initialization(_))
    }
}

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;
