//! Multi-aggregate rules for money movements.
//!
//! Storage adapters load the payment, member and package inside one
//! transaction, call these functions, then persist every aggregate they
//! touched and apply the returned slot changes.

use crate::domain::foundation::{DomainError, ErrorCode, Money, PackageId, Timestamp};
use crate::domain::package::Package;
use crate::domain::payment::{GatewayReceipt, Payment};

use super::{Member, MembershipWindow, SlotChange};

/// Reason recorded on refunds triggered by the gateway.
pub const CHARGEBACK_REASON: &str = "Chargeback";

/// Effect of a settled payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub window: MembershipWindow,
    pub slots: SlotChange,
}

/// Marks `payment` successful and activates `member` on `package`.
///
/// # Errors
///
/// - `InvalidStateTransition` unless the payment is pending
/// - `ValidationFailed` if member or package do not belong to the payment
pub fn settle_payment(
    payment: &mut Payment,
    member: &mut Member,
    package: &Package,
    receipt: GatewayReceipt,
    now: Timestamp,
    grace_days: i64,
) -> Result<Settlement, DomainError> {
    ensure_belongs(payment, member)?;
    if payment.package_id != package.id {
        return Err(DomainError::new(
            ErrorCode::ValidationFailed,
            "Package does not match the payment",
        )
        .with_detail("order_id", payment.order_id.to_string()));
    }

    let start = member.membership.next_term_start(now);
    let window = MembershipWindow::starting(start, package.duration_months, grace_days);
    payment.mark_success(receipt, window, now)?;
    let slots = member.activate_membership(package, payment.id, window, now)?;
    Ok(Settlement { window, slots })
}

/// Refunds `payment` after a chargeback.
///
/// The membership is revoked only when `payment` had settled and paid for
/// the member's current term. A chargeback on a pending order or on an
/// earlier term refunds the payment and leaves the membership alone.
///
/// Returns the package whose slot must be released, if any.
pub fn charge_back(
    payment: &mut Payment,
    member: Option<&mut Member>,
    receipt: GatewayReceipt,
    amount: Money,
    now: Timestamp,
) -> Result<Option<PackageId>, DomainError> {
    if let Some(member) = member.as_deref() {
        ensure_belongs(payment, member)?;
    }
    let was_settled = payment.is_success();
    payment.mark_refunded(receipt, amount, CHARGEBACK_REASON, now)?;
    match member {
        Some(member) if was_settled && member.membership.is_funded_by(&payment.id) => {
            member.revoke_membership(now)
        }
        _ => Ok(None),
    }
}

fn ensure_belongs(payment: &Payment, member: &Member) -> Result<(), DomainError> {
    if payment.user_id != member.id {
        return Err(DomainError::new(
            ErrorCode::ValidationFailed,
            "Member does not match the payment",
        )
        .with_detail("order_id", payment.order_id.to_string()));
    }
    Ok(())
}
