use thiserror::Error;

/// Result alias for looking glass core operations
pub type LgResult<T> = Result<T, LgError>;

/// Failures surfaced by the router core to request handlers.
///
/// None of these are retried internally; the caller decides.
#[derive(Debug, Error)]
pub enum LgError {
    #[error("invalid IP")]
    InvalidAddress,

    #[error("invalid Network")]
    InvalidNetwork,

    #[error("invalid IP Family")]
    UnsupportedFamily,

    #[error("AS Path empty")]
    AsPathEmpty,

    #[error("AS Path too long")]
    AsPathTooLong,

    #[error("AS Path malformed")]
    AsPathMalformed,

    #[error("operation unknown")]
    OperationUnknown,

    #[error("router unknown")]
    UnknownDevice,

    #[error("authentication error: {0}")]
    AuthFailed(String),

    #[error("connection error: {0}")]
    ConnectionFailed(String),

    #[error("execution error: {0}")]
    ExecFailed(String),

    /// Template could not be rendered; an internal fault, never caller input
    #[error("template rendering failed: {0}")]
    Template(String),
}

impl LgError {
    /// True for errors caused by the request parameters rather than the device
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LgError::InvalidAddress
                | LgError::InvalidNetwork
                | LgError::UnsupportedFamily
                | LgError::AsPathEmpty
                | LgError::AsPathTooLong
                | LgError::AsPathMalformed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_errors() {
        assert!(LgError::InvalidAddress.is_caller_error());
        assert!(LgError::AsPathMalformed.is_caller_error());
        assert!(!LgError::UnknownDevice.is_caller_error());
        assert!(!LgError::ExecFailed("exit status 1".into()).is_caller_error());
    }

    #[test]
    fn test_messages_carry_cause() {
        let err = LgError::ConnectionFailed("TCP connection failed: refused".into());
        assert_eq!(err.to_string(), "connection error: TCP connection failed: refused");
    }
}
