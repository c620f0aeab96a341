//! Errors surfaced to the caller of payment initiation.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | PackageNotFound | 404 |
//! | MemberNotFound | 404 |
//! | PackageInactive | 400 |
//! | PackageFull | 409 |
//! | MembershipStillActive | 409 |
//! | PendingPaymentExists | 409 |
//! | Infrastructure | 500 |

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, PackageId, UserId};
use crate::domain::payment::OrderId;

/// Reasons a payment cannot be initiated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MembershipError {
    #[error("Package not found: {0}")]
    PackageNotFound(PackageId),

    #[error("Package {0} is not available for purchase")]
    PackageInactive(PackageId),

    #[error("Package {0} has no remaining slots")]
    PackageFull(PackageId),

    #[error("Member not found: {0}")]
    MemberNotFound(UserId),

    #[error("Membership is still active for {days_remaining} more day(s)")]
    MembershipStillActive { days_remaining: u32 },

    #[error("A payment is already pending for this member (order {order_id})")]
    PendingPaymentExists { order_id: OrderId },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl MembershipError {
    pub fn infrastructure(message: impl Into<String>) -> Self {
        MembershipError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            MembershipError::PackageNotFound(_) => ErrorCode::PackageNotFound,
            MembershipError::MemberNotFound(_) => ErrorCode::MemberNotFound,
            MembershipError::PackageInactive(_)
            | MembershipError::PackageFull(_)
            | MembershipError::MembershipStillActive { .. } => ErrorCode::ValidationFailed,
            MembershipError::PendingPaymentExists { .. } => ErrorCode::DuplicateOrder,
            MembershipError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MembershipError::PackageNotFound(_) | MembershipError::MemberNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            MembershipError::PackageInactive(_) => StatusCode::BAD_REQUEST,
            MembershipError::PackageFull(_)
            | MembershipError::MembershipStillActive { .. }
            | MembershipError::PendingPaymentExists { .. } => StatusCode::CONFLICT,
            MembershipError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True if the request may succeed when retried unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Infrastructure(_))
    }
}

impl From<DomainError> for MembershipError {
    fn from(err: DomainError) -> Self {
        MembershipError::Infrastructure(err.to_string())
    }
}

impl From<MembershipError> for DomainError {
    fn from(err: MembershipError) -> Self {
        DomainError::new(err.code(), err.to_string())
    }
}
