//! Request/response models for the lookup endpoint

use serde::{Deserialize, Serialize};

/// Query parameters accepted on a lookup request
#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    /// Requested localization tag (e.g. `en`, `zh-CN`); absent means English
    pub lang: Option<String>,
}

/// JSON error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
