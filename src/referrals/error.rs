use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INVALID_AFFILIATE_CODE: &str = "invalid_affiliate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralErrorKind {
    HostUnavailable,
    MissingRecord,
    Internal,
}

/// Failure of a host collaborator while running a checkout hook.
///
/// These are never retried and never swallowed: the hook returns them to the
/// host pipeline, which owns the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{message}")]
pub struct ReferralError {
    pub kind: ReferralErrorKind,
    pub message: String,
}

impl ReferralError {
    pub fn new(kind: ReferralErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

pub fn host_unavailable(message: impl Into<String>) -> ReferralError {
    ReferralError::new(ReferralErrorKind::HostUnavailable, message)
}

pub fn missing_record(message: impl Into<String>) -> ReferralError {
    ReferralError::new(ReferralErrorKind::MissingRecord, message)
}

pub fn internal_error(message: impl Into<String>) -> ReferralError {
    ReferralError::new(ReferralErrorKind::Internal, message)
}

/// Shopper-facing checkout rejection. Blocks the purchase form from
/// progressing to payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{code}: {message}")]
pub struct CheckoutValidationError {
    pub code: String,
    pub message: String,
}

impl CheckoutValidationError {
    pub fn invalid_affiliate(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_AFFILIATE_CODE.to_string(),
            message: message.into(),
        }
    }
}
