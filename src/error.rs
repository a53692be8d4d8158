use std::time::Duration;

/// A user-facing failure that ends the process with `exit_code`.
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

/// Why a single endpoint attempt failed.
///
/// The provider absorbs these: each one only moves it on to the next source
/// (or, eventually, to simulated data).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("undecodable payload: {0}")]
    Decode(String),
    #[error("unparsable table: {0}")]
    Parse(String),
    #[error("invalid aggregate (inscrits={inscrits}, votants={votants})")]
    InvalidAggregate { inscrits: u64, votants: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_messages_name_the_cause() {
        assert_eq!(
            FetchError::Timeout(Duration::from_millis(3000)).to_string(),
            "timed out after 3000ms"
        );
        assert_eq!(FetchError::Status(503).to_string(), "HTTP status 503");
        assert_eq!(
            FetchError::InvalidAggregate { inscrits: 0, votants: 0 }.to_string(),
            "invalid aggregate (inscrits=0, votants=0)"
        );
    }
}
