//! Standard response envelope shared by all hub services.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::observability::ObservedStatus;

/// Version of this shared library, reported by every service's `/lib-info`.
pub const LIB_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(data, true, message)
    }

    pub fn new(data: T, success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            data,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ObservedStatus for ApiResponse<T> {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LibInfo {
    pub version: String,
    pub library: String,
    pub description: String,
    pub timestamp: String,
}

/// Version information for the shared library, used for dependency tracking
/// across independently versioned services.
pub fn lib_info() -> LibInfo {
    LibInfo {
        version: LIB_VERSION.to_string(),
        library: env!("CARGO_PKG_NAME").to_string(),
        description: "Lean Hub shared observability utilities".to_string(),
        timestamp: Utc::now().to_rfc3339(),
    }
}
