//! Error types.
//!
//! The numeric core reports [`FitError`]; the binary works in terms of
//! [`AppError`], which carries the process exit code alongside the message.

/// Failure of a single fit call.
///
/// Errors are local to one call: nothing is cached or shared between fits, so
/// retrying with the same input yields the same error.
#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    /// Malformed input: length mismatch, too few samples, non-finite values,
    /// or a normalization that would divide by zero.
    Validation(String),
    /// Regression input with zero variance in x.
    DivisionByZero(String),
}

impl FitError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn division_by_zero(message: impl Into<String>) -> Self {
        Self::DivisionByZero(message.into())
    }
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Validation(msg) => write!(f, "Invalid input: {msg}"),
            FitError::DivisionByZero(msg) => write!(f, "Undefined fit (division by zero): {msg}"),
        }
    }
}

impl std::error::Error for FitError {}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::Validation(_) => 3,
            FitError::DivisionByZero(_) => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
