// Version information for the plate reader node

/// Full version string with feature description
pub const VERSION: &str = "v0.3.0-distributed-stages-2025-11-04";

/// Semantic version number
pub const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

/// Build date
pub const BUILD_DATE: &str = "2025-11-04";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "plate-detection",
    "clahe-preprocessing",
    "ctc-recognition",
    "plate-normalization",
    "distributed-stages",
    "multipart-upload",
    "debug-crops",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Plate Reader Node {} ({})", VERSION_NUMBER, BUILD_DATE)
}
