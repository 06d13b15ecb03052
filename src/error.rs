use std::fmt;

/// Error taxonomy for the geo lookup service
#[derive(Debug)]
pub enum GeoError {
    /// Request string is not a syntactically valid IPv4/IPv6 address
    InvalidAddress,
    /// Transport failure while downloading a database file
    Fetch(String),
    /// A database file could not be opened as a valid MMDB reader
    Open(String),
    /// Attempt to install a malformed snapshot pair
    SwapRejected(String),
    /// Unknown IANA timezone name
    ZoneResolution(String),
    /// Local file-system error while staging downloads
    Io(std::io::Error),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidAddress => write!(f, "Invalid IP format"),
            GeoError::Fetch(msg) => write!(f, "Fetch error: {}", msg),
            GeoError::Open(msg) => write!(f, "Database open error: {}", msg),
            GeoError::SwapRejected(msg) => write!(f, "Swap rejected: {}", msg),
            GeoError::ZoneResolution(name) => write!(f, "Unknown timezone: {}", name),
            GeoError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for GeoError {}

impl From<std::io::Error> for GeoError {
    fn from(err: std::io::Error) -> Self {
        GeoError::Io(err)
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::Fetch(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoError>;
