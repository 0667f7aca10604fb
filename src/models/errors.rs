//! Centralized Error Handling Module
//!
//! Every failure that can abort a phase carries a unique code so that CI
//! logs can be grepped for the failing stage.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - REG_xxx: source registry (input files)
//! - SCAN_xxx: liveness scan
//! - SEED_xxx: seed-node validation
//! - OUT_xxx: output artifacts
//! - API_xxx: external price/id APIs

use std::fmt;

/// Application-wide error type
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if let Some(source) = &self.source {
            write!(f, ": {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Registry Errors (1xx)
    // ============================================
    /// Required input file is missing
    RegistryMissingFile,
    /// Input file is not valid JSON (or has the wrong shape)
    RegistryMalformedJson,
    /// Coin entry lacks a structurally required field
    RegistryInvalidCoin,

    // ============================================
    // Liveness Scan Errors (2xx)
    // ============================================
    /// Endpoint could not be reached
    ScanConnectionFailed,
    /// Endpoint did not answer in time
    ScanTimeout,
    /// Endpoint answered with something that is not an Electrum reply
    ScanInvalidResponse,

    // ============================================
    // Seed Validation Errors (3xx)
    // ============================================
    /// Schema document itself is invalid
    SeedSchemaInvalid,
    /// Registry does not conform to the schema
    SeedValidationFailed,
    /// Netid outside the representable port range
    SeedNetidOutOfRange,
    /// Node failed a reachability probe
    SeedUnreachable,

    // ============================================
    // Output Errors (4xx)
    // ============================================
    /// Failed to write an artifact
    OutputWriteFailed,
    /// Failed to render the spritemap image
    OutputImageFailed,

    // ============================================
    // External API Errors (5xx)
    // ============================================
    /// Remote API returned an error or unexpected payload
    ApiError,
    /// Remote API timeout
    ApiTimeout,

    // ============================================
    // Generic Errors (9xx)
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistryMissingFile => "REG_MISSING_FILE",
            Self::RegistryMalformedJson => "REG_MALFORMED_JSON",
            Self::RegistryInvalidCoin => "REG_INVALID_COIN",

            Self::ScanConnectionFailed => "SCAN_CONNECTION_FAILED",
            Self::ScanTimeout => "SCAN_TIMEOUT",
            Self::ScanInvalidResponse => "SCAN_INVALID_RESPONSE",

            Self::SeedSchemaInvalid => "SEED_SCHEMA_INVALID",
            Self::SeedValidationFailed => "SEED_VALIDATION_FAILED",
            Self::SeedNetidOutOfRange => "SEED_NETID_OUT_OF_RANGE",
            Self::SeedUnreachable => "SEED_UNREACHABLE",

            Self::OutputWriteFailed => "OUT_WRITE_FAILED",
            Self::OutputImageFailed => "OUT_IMAGE_FAILED",

            Self::ApiError => "API_ERROR",
            Self::ApiTimeout => "API_TIMEOUT",

            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Required file not found
    pub fn missing_file(path: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RegistryMissingFile, format!("Missing required file: {}", path))
    }

    /// Malformed JSON in an input file
    pub fn malformed_json(path: impl fmt::Display, source: serde_json::Error) -> Self {
        Self::with_source(
            ErrorCode::RegistryMalformedJson,
            format!("Invalid JSON in {}", path),
            source,
        )
    }

    /// Coin entry missing a required field
    pub fn invalid_coin(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RegistryInvalidCoin, msg)
    }

    /// Scan probe could not connect
    pub fn scan_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ScanConnectionFailed, msg)
    }

    /// Scan probe timed out
    pub fn scan_timeout(endpoint: &str) -> Self {
        Self::new(ErrorCode::ScanTimeout, format!("Timed out probing {}", endpoint))
    }

    /// Seed schema invalid
    pub fn schema_invalid(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SeedSchemaInvalid, msg)
    }

    /// Seed node unreachable
    pub fn unreachable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SeedUnreachable, msg)
    }

    /// Netid too large
    pub fn netid_out_of_range(netid: u16, max: u16) -> Self {
        Self::new(
            ErrorCode::SeedNetidOutOfRange,
            format!("netid {} exceeds maximum {}", netid, max),
        )
    }

    /// External API failure
    pub fn api(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::TimedOut => {
                Self::with_source(ErrorCode::ScanTimeout, "IO timeout", err)
            }
            _ => Self::with_source(ErrorCode::Unknown, "IO error", err),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::ApiTimeout, "Request timeout")
        } else {
            Self::new(ErrorCode::ApiError, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::RegistryMalformedJson, "JSON parse error", err)
    }
}
