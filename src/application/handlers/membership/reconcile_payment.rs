//! ReconcilePaymentHandler - Command handler for gateway callbacks.
//!
//! Each step is a hard gate:
//!
//! 1. Verify the callback signature. Mismatch rejects without touching state.
//! 2. Look up the payment by order id. Unknown orders are rejected.
//! 3. Apply the reported outcome. Success and chargeback run as one atomic
//!    unit over payment, member and package capacity.
//!
//! Callbacks may be duplicated or reordered, so every branch is idempotent.

use std::sync::Arc;

use http::StatusCode;
use serde_json::json;

use crate::domain::foundation::{DomainError, ErrorCode, Money, PackageId, Timestamp, UserId};
use crate::domain::gateway::{GatewayNotification, GatewaySigner, GatewayStatus, WebhookError};
use crate::domain::membership::{
    NewNotification, NotificationPriority, NotificationType, GRACE_PERIOD_DAYS,
};
use crate::domain::package::SlotClaim;
use crate::domain::payment::{OrderId, Payment, PaymentStatus};
use crate::ports::{
    ActivationOutcome, ActivationRequest, ChargebackOutcome, ChargebackRequest, EmailTemplate,
    MembershipTransitions, PaymentRepository,
};

use super::SideEffects;

/// Command carrying one gateway callback.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentCommand {
    pub notification: GatewayNotification,
}

/// What a callback changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilePaymentResult {
    /// Payment settled and membership activated.
    Activated {
        order_id: OrderId,
        user_id: UserId,
        package_id: PackageId,
        overbooked: bool,
    },
    /// Redelivery of an outcome already applied.
    AlreadyProcessed { order_id: OrderId },
    /// Gateway still processing; status message recorded.
    PendingRecorded { order_id: OrderId },
    Cancelled { order_id: OrderId },
    Failed { order_id: OrderId },
    ChargedBack {
        order_id: OrderId,
        membership_revoked: bool,
    },
}

/// Plain response for the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebhookAck {
    pub status: StatusCode,
    pub body: &'static str,
}

impl WebhookAck {
    /// Maps a reconciliation outcome to the bare status/body the gateway
    /// expects. Only signature/order failures and transient storage
    /// failures are answered with an error status.
    pub fn from_result(result: &Result<ReconcilePaymentResult, WebhookError>) -> Self {
        let status = match result {
            Ok(_) => StatusCode::OK,
            Err(e) => e.status_code(),
        };
        let body = if status == StatusCode::OK {
            "OK"
        } else {
            status.canonical_reason().unwrap_or("Error")
        };
        Self { status, body }
    }
}

/// Handler for gateway callbacks.
pub struct ReconcilePaymentHandler {
    payments: Arc<dyn PaymentRepository>,
    transitions: Arc<dyn MembershipTransitions>,
    effects: SideEffects,
    signer: GatewaySigner,
    grace_days: i64,
}

impl ReconcilePaymentHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        transitions: Arc<dyn MembershipTransitions>,
        effects: SideEffects,
        signer: GatewaySigner,
    ) -> Self {
        Self {
            payments,
            transitions,
            effects,
            signer,
            grace_days: GRACE_PERIOD_DAYS,
        }
    }

    pub fn with_grace_days(mut self, grace_days: i64) -> Self {
        self.grace_days = grace_days;
        self
    }

    /// Reconciles a callback and returns the acknowledgement to send back.
    pub async fn respond(&self, cmd: ReconcilePaymentCommand) -> WebhookAck {
        WebhookAck::from_result(&self.handle(cmd).await)
    }

    pub async fn handle(
        &self,
        cmd: ReconcilePaymentCommand,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        let notification = cmd.notification;

        // 1. Authenticity
        if let Err(e) = self.signer.verify(&notification) {
            tracing::warn!(
                order_id = %notification.order_id,
                merchant_id = %notification.merchant_id,
                status_code = notification.status_code,
                "Gateway callback signature mismatch - possible tampering or misconfiguration"
            );
            return Err(e);
        }

        // 2. Known order
        let order_id = OrderId::new(notification.order_id.clone())
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;
        let payment = self
            .payments
            .find_by_order_id(&order_id)
            .await
            .map_err(to_webhook_error)?
            .ok_or_else(|| {
                tracing::warn!(order_id = %order_id, "Gateway callback for unknown order");
                WebhookError::UnknownOrder(order_id.to_string())
            })?;
        warn_on_custom_field_mismatch(&notification, &payment);

        // 3. Outcome
        let now = Timestamp::now();
        match notification.status() {
            GatewayStatus::Success => self.on_success(&notification, payment, now).await,
            GatewayStatus::Pending => self.on_pending(&notification, payment, now).await,
            GatewayStatus::Cancelled => self.on_cancelled(&notification, payment, now).await,
            GatewayStatus::Failed => self.on_failed(&notification, payment, now).await,
            GatewayStatus::Chargeback => self.on_chargeback(&notification, payment, now).await,
            GatewayStatus::Unknown(code) => {
                tracing::warn!(
                    order_id = %order_id,
                    status_code = code,
                    "Unhandled gateway status code, ignoring"
                );
                Err(WebhookError::Ignored(format!("unhandled status code {}", code)))
            }
        }
    }

    async fn on_success(
        &self,
        notification: &GatewayNotification,
        payment: Payment,
        now: Timestamp,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        let outcome = self
            .transitions
            .activate(ActivationRequest {
                order_id: payment.order_id.clone(),
                receipt: notification.receipt(),
                now,
                grace_days: self.grace_days,
            })
            .await
            .map_err(to_webhook_error)?;

        let activation = match outcome {
            ActivationOutcome::Activated(activation) => activation,
            ActivationOutcome::AlreadySettled => {
                tracing::info!(
                    order_id = %payment.order_id,
                    "Duplicate success callback, payment already settled"
                );
                return Ok(ReconcilePaymentResult::AlreadyProcessed {
                    order_id: payment.order_id,
                });
            }
            ActivationOutcome::NotPending(status) => {
                tracing::error!(
                    order_id = %payment.order_id,
                    user_id = %payment.user_id,
                    status = %status,
                    amount = %notification.payhere_amount,
                    "Success callback for a payment the gateway already closed, needs manual review"
                );
                return Err(WebhookError::Ignored(format!("payment already {}", status)));
            }
        };

        if payment.is_cancelled_locally() {
            tracing::warn!(
                order_id = %payment.order_id,
                "Gateway settled a payment previously cancelled as stale"
            );
        }

        let overbooked = activation.slot == SlotClaim::Overbooked;
        if overbooked {
            tracing::warn!(
                order_id = %payment.order_id,
                package_id = %activation.package.id,
                current_members = activation.package.current_members,
                max_members = ?activation.package.max_members,
                "Package over capacity after settled payment"
            );
        }

        let member = &activation.member;
        let settled = &activation.payment;
        let end_date = member
            .membership
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_default();

        tracing::info!(
            order_id = %settled.order_id,
            user_id = %member.id,
            package_id = %activation.package.id,
            end_date = %end_date,
            "Membership activated"
        );

        self.effects
            .notify(
                NewNotification::new(
                    member.id,
                    NotificationType::PaymentSuccess,
                    NotificationPriority::High,
                    "Payment successful",
                    format!(
                        "Your {} membership is active until {}.",
                        activation.package.name, end_date
                    ),
                )
                .with_metadata("order_id", settled.order_id.to_string())
                .with_metadata("package_id", activation.package.id.to_string())
                .with_metadata("amount", settled.amount.to_gateway_string()),
            )
            .await;

        let data = json!({
            "name": member.profile.full_name(),
            "package": activation.package.name,
            "order_id": settled.order_id.to_string(),
            "amount": settled.amount.to_gateway_string(),
            "currency": settled.currency,
            "start_date": member.membership.start_date.map(|d| d.to_string()),
            "end_date": end_date,
            "payment_method": settled.gateway.as_ref().and_then(|g| g.method.clone()),
        });
        self.effects
            .email_member(member, EmailTemplate::MembershipActivated, data.clone());
        self.effects
            .email_member(member, EmailTemplate::PaymentReceipt, data);

        Ok(ReconcilePaymentResult::Activated {
            order_id: settled.order_id.clone(),
            user_id: member.id,
            package_id: activation.package.id,
            overbooked,
        })
    }

    async fn on_pending(
        &self,
        notification: &GatewayNotification,
        mut payment: Payment,
        now: Timestamp,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        if !payment.is_pending() {
            return Err(ignore_settled(&payment, "pending"));
        }
        payment.record_pending_status(notification.receipt(), now);
        self.write_if_pending(&payment).await?;

        tracing::info!(order_id = %payment.order_id, "Payment still pending at gateway");
        Ok(ReconcilePaymentResult::PendingRecorded {
            order_id: payment.order_id,
        })
    }

    async fn on_cancelled(
        &self,
        notification: &GatewayNotification,
        mut payment: Payment,
        now: Timestamp,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        match payment.status {
            PaymentStatus::Cancelled => {
                return Ok(ReconcilePaymentResult::AlreadyProcessed {
                    order_id: payment.order_id,
                })
            }
            PaymentStatus::Pending => {}
            _ => return Err(ignore_settled(&payment, "cancelled")),
        }
        payment
            .mark_cancelled(Some(notification.receipt()), now)
            .map_err(to_webhook_error)?;
        self.write_if_pending(&payment).await?;

        tracing::info!(order_id = %payment.order_id, "Payment cancelled");
        Ok(ReconcilePaymentResult::Cancelled {
            order_id: payment.order_id,
        })
    }

    async fn on_failed(
        &self,
        notification: &GatewayNotification,
        mut payment: Payment,
        now: Timestamp,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        match payment.status {
            PaymentStatus::Failed => {
                return Ok(ReconcilePaymentResult::AlreadyProcessed {
                    order_id: payment.order_id,
                })
            }
            PaymentStatus::Pending => {}
            _ => return Err(ignore_settled(&payment, "failed")),
        }
        let reason = notification
            .status_message
            .clone()
            .unwrap_or_else(|| "Payment failed".to_string());
        payment
            .mark_failed(notification.receipt(), reason.clone(), now)
            .map_err(to_webhook_error)?;
        self.write_if_pending(&payment).await?;

        tracing::info!(order_id = %payment.order_id, reason = %reason, "Payment failed");

        self.effects
            .notify(
                NewNotification::new(
                    payment.user_id,
                    NotificationType::PaymentFailed,
                    NotificationPriority::High,
                    "Payment failed",
                    format!("Your payment could not be completed: {}", reason),
                )
                .with_metadata("order_id", payment.order_id.to_string())
                .with_metadata("reason", reason),
            )
            .await;

        Ok(ReconcilePaymentResult::Failed {
            order_id: payment.order_id,
        })
    }

    async fn on_chargeback(
        &self,
        notification: &GatewayNotification,
        payment: Payment,
        now: Timestamp,
    ) -> Result<ReconcilePaymentResult, WebhookError> {
        let amount = Money::parse_gateway(&notification.payhere_amount).unwrap_or(payment.amount);

        let outcome = self
            .transitions
            .charge_back(ChargebackRequest {
                order_id: payment.order_id.clone(),
                receipt: notification.receipt(),
                amount,
                now,
            })
            .await
            .map_err(to_webhook_error)?;

        let chargeback = match outcome {
            ChargebackOutcome::Applied(chargeback) => chargeback,
            ChargebackOutcome::AlreadyRefunded => {
                return Ok(ReconcilePaymentResult::AlreadyProcessed {
                    order_id: payment.order_id,
                })
            }
            ChargebackOutcome::NotApplicable(status) => {
                tracing::warn!(
                    order_id = %payment.order_id,
                    status = %status,
                    "Chargeback for a payment that never settled"
                );
                return Err(WebhookError::Ignored(format!(
                    "chargeback on {} payment",
                    status
                )));
            }
        };

        let membership_revoked = chargeback.revoked.is_some();
        tracing::warn!(
            order_id = %payment.order_id,
            user_id = %payment.user_id,
            amount = %amount,
            membership_revoked,
            released_package = ?chargeback.released,
            "Payment charged back"
        );

        self.effects
            .notify(
                NewNotification::new(
                    payment.user_id,
                    NotificationType::PaymentChargeback,
                    NotificationPriority::Urgent,
                    "Payment reversed",
                    "Your payment was charged back and your membership has been deactivated.",
                )
                .with_metadata("order_id", payment.order_id.to_string())
                .with_metadata("amount", amount.to_gateway_string()),
            )
            .await;

        Ok(ReconcilePaymentResult::ChargedBack {
            order_id: payment.order_id,
            membership_revoked,
        })
    }

    async fn write_if_pending(&self, payment: &Payment) -> Result<(), WebhookError> {
        let written = self
            .payments
            .update_if_status(payment, PaymentStatus::Pending)
            .await
            .map_err(to_webhook_error)?;
        if !written {
            tracing::info!(
                order_id = %payment.order_id,
                "Payment changed concurrently, callback not applied"
            );
            return Err(WebhookError::Ignored(
                "payment changed concurrently".to_string(),
            ));
        }
        Ok(())
    }
}

fn ignore_settled(payment: &Payment, reported: &str) -> WebhookError {
    tracing::warn!(
        order_id = %payment.order_id,
        status = %payment.status,
        reported,
        "Callback outcome conflicts with recorded payment status"
    );
    WebhookError::Ignored(format!(
        "payment already {}, gateway reported {}",
        payment.status, reported
    ))
}

fn warn_on_custom_field_mismatch(notification: &GatewayNotification, payment: &Payment) {
    let user_matches = notification.user_id().map_or(true, |id| id == payment.user_id);
    let package_matches = notification
        .package_id()
        .map_or(true, |id| id == payment.package_id);
    if !user_matches || !package_matches {
        tracing::warn!(
            order_id = %payment.order_id,
            custom_1 = ?notification.custom_1,
            custom_2 = ?notification.custom_2,
            "Callback custom fields do not match the payment, using stored references"
        );
    }
}

fn to_webhook_error(err: DomainError) -> WebhookError {
    if err.is_transient() {
        tracing::error!(error = %err, "Storage failure during reconciliation, gateway will retry");
        return WebhookError::Database(err.message);
    }
    match err.code {
        ErrorCode::PaymentNotFound => WebhookError::UnknownOrder(err.message),
        _ => {
            tracing::error!(error = %err, "Reconciliation could not be applied");
            WebhookError::Ignored(err.to_string())
        }
    }
}
