use std::fmt;

use tactics_types::PayloadError;

/// Error from a backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Non-ok response. Network failures and timeouts arrive here as status 500.
    Status(u16),
    /// Body did not match the expected shape.
    Malformed(String),
    /// Body parsed but is internally inconsistent.
    Invalid(PayloadError),
    /// URL could not be built from the configured server address.
    InvalidUrl(String),
    /// WebSocket could not be opened.
    Socket(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Status(code) => write!(f, "request failed with status {}", code),
            ApiError::Malformed(e) => write!(f, "malformed response: {}", e),
            ApiError::Invalid(e) => write!(f, "invalid response: {}", e),
            ApiError::InvalidUrl(e) => write!(f, "invalid url: {}", e),
            ApiError::Socket(e) => write!(f, "websocket error: {}", e),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<PayloadError> for ApiError {
    fn from(e: PayloadError) -> Self {
        ApiError::Invalid(e)
    }
}

/// Error while fetching or decoding an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Asset could not be fetched.
    NotFound(String),
    /// Asset bytes are not a decodable image.
    Decode(String),
    /// Animation descriptor is unusable.
    Descriptor(String),
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(path) => write!(f, "asset not found: {}", path),
            AssetError::Decode(e) => write!(f, "failed to decode image: {}", e),
            AssetError::Descriptor(e) => write!(f, "bad animation descriptor: {}", e),
        }
    }
}

impl std::error::Error for AssetError {}

/// Error that aborts a map render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A tileset failed to load; nothing was drawn.
    TilesetLoad { name: String, source: AssetError },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TilesetLoad { name, source } => {
                write!(f, "failed to load tileset {}: {}", name, source)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::TilesetLoad { source, .. } => Some(source),
        }
    }
}
