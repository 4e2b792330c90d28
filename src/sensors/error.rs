//! Location service error types and handling

/// Location and compass service errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SensorError {
    /// Location services are switched off or not permitted
    #[error("Location service is disabled")]
    ServiceDisabled,
    /// Service did not come up in time
    #[error("Location service initialization timed out after {timeout_ms}ms")]
    InitializationTimeout { timeout_ms: u64 },
    /// Service reported a failed state
    #[error("Location service failed: {details}")]
    ServiceFailed { details: String },
    /// Single reading could not be obtained
    #[error("Location reading failed: {details}")]
    ReadFailed { details: String },
    /// Too many readings failed in a row
    #[error("Location unavailable after {failures} consecutive failures")]
    TooManyFailures { failures: u32 },
}

/// Recovery strategy for a sensor failure
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoveryStrategy {
    /// Try again on the next poll
    RetryNextPoll,
    /// Restart the service and try again
    Restart,
    /// Give up for this session
    Fail,
}

impl SensorError {
    /// Get the recommended recovery strategy for this error
    pub fn recovery_strategy(&self) -> RecoveryStrategy {
        match self {
            SensorError::ReadFailed { .. } => RecoveryStrategy::RetryNextPoll,
            SensorError::ServiceFailed { .. } => RecoveryStrategy::Restart,
            SensorError::ServiceDisabled
            | SensorError::InitializationTimeout { .. }
            | SensorError::TooManyFailures { .. } => RecoveryStrategy::Fail,
        }
    }

    /// Terminal errors end location tracking for the session
    pub fn is_terminal(&self) -> bool {
        matches!(self.recovery_strategy(), RecoveryStrategy::Fail)
    }
}

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(SensorError::ServiceDisabled.is_terminal());
        assert!(SensorError::InitializationTimeout { timeout_ms: 30_000 }.is_terminal());
        assert!(SensorError::TooManyFailures { failures: 11 }.is_terminal());
        assert!(!SensorError::ReadFailed { details: "no fix".into() }.is_terminal());
        assert_eq!(
            SensorError::ServiceFailed { details: "x".into() }.recovery_strategy(),
            RecoveryStrategy::Restart
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SensorError::TooManyFailures { failures: 11 }.to_string(),
            "Location unavailable after 11 consecutive failures"
        );
    }
}
