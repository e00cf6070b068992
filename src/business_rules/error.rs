// Error types for the booking rules engine
// Each rule violation is its own variant so callers can branch on it

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the booking rules engine
///
/// Rule evaluation never touches the database, so these are all
/// deterministic outcomes of the supplied data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusinessRulesError {
    /// One or more requested services are not offered by the professional.
    /// The whole preview fails; nothing is silently dropped.
    #[error("Services not linked to professional {professional_id}: {}", format_ids(.service_ids))]
    ServiceNotLinked {
        professional_id: Uuid,
        service_ids: Vec<Uuid>,
    },

    /// Coupon is unknown, inactive, outside its validity window or not
    /// applicable to the order value
    #[error("Coupon {code} is invalid: {reason}")]
    InvalidCoupon { code: String, reason: String },

    /// Bonus point balance is below the redemption minimum
    #[error("Insufficient points: balance {balance}, minimum to redeem {required}")]
    InsufficientPoints { balance: i64, required: i64 },

    /// Business hours violate their ordering invariants
    #[error("Invalid business hours: {0}")]
    InvalidBusinessHours(String),

    /// Rules configuration is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Arithmetic produced an unrepresentable value
    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type alias for rule evaluation
pub type BRResult<T> = Result<T, BusinessRulesError>;

impl BusinessRulesError {
    /// Machine-readable code surfaced in API error bodies
    pub fn error_code(&self) -> &'static str {
        match self {
            BusinessRulesError::ServiceNotLinked { .. } => "SERVICE_NOT_LINKED",
            BusinessRulesError::InvalidCoupon { .. } => "INVALID_COUPON",
            BusinessRulesError::InsufficientPoints { .. } => "INSUFFICIENT_POINTS",
            BusinessRulesError::InvalidBusinessHours(_) => "INVALID_BUSINESS_HOURS",
            BusinessRulesError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            BusinessRulesError::CalculationError(_) => "CALCULATION_ERROR",
        }
    }

    pub(crate) fn invalid_coupon(code: &str, reason: impl Into<String>) -> Self {
        BusinessRulesError::InvalidCoupon {
            code: code.to_string(),
            reason: reason.into(),
        }
    }
}

fn format_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
