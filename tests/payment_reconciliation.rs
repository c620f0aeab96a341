//! End-to-end payment flows against the in-memory adapters.

mod common;

use http::StatusCode;

use chrono::Duration;

use common::{Harness, CURRENCY};
use gym_membership::application::{
    CancelStalePaymentsCommand, CancelStalePaymentsHandler, InitiatePaymentCommand,
    ReconcilePaymentResult,
};
use gym_membership::domain::foundation::Timestamp;
use gym_membership::domain::gateway::WebhookError;
use gym_membership::domain::membership::{MembershipError, MembershipStatus};
use gym_membership::domain::payment::{OrderId, Payment, PaymentStatus};

#[tokio::test]
async fn discounted_package_purchase_activates_membership() {
    let h = Harness::new();
    let member = h.add_member("Nimal").await;
    let package = h.add_package(9000, Some(11), 3, Some(20)).await;

    let result = h
        .initiate
        .handle(InitiatePaymentCommand {
            user_id: member.id,
            package_id: package.id,
        })
        .await
        .unwrap();
    assert_eq!(result.form.amount, "8010.00");
    assert_eq!(result.form.currency, CURRENCY);
    assert_eq!(
        result.form.hash,
        h.signer
            .checkout_hash(result.payment.order_id.as_str(), result.payment.amount, CURRENCY)
    );

    let ack = h.reconcile.respond(h.callback(&result.payment, 2)).await;
    assert_eq!(ack.status, StatusCode::OK);
    assert_eq!(ack.body, "OK");

    let stored = h.store.member(&member.id).await.unwrap();
    let state = &stored.membership;
    assert_eq!(state.status, MembershipStatus::Active);
    let start = state.start_date.unwrap();
    let end = state.end_date.unwrap();
    assert_eq!(end, start.add_months(3));
    assert_eq!(state.grace_period_end_date.unwrap(), end.add_days(5));
    assert_eq!(state.package_id, Some(package.id));
    assert_eq!(state.payment_ids, vec![result.payment.id]);
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
}

#[tokio::test]
async fn forged_signature_changes_nothing() {
    let h = Harness::new();
    let member = h.add_member("Kasun").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    let result = h.reconcile.handle(h.forged_callback(&payment, 2)).await;
    assert!(matches!(result, Err(WebhookError::InvalidSignature)));

    let ack = h.reconcile.respond(h.forged_callback(&payment, 2)).await;
    assert_eq!(ack.status, StatusCode::BAD_REQUEST);

    assert!(h.store.payment(&payment.order_id).await.unwrap().is_pending());
    assert_eq!(
        h.store.member(&member.id).await.unwrap().status(),
        MembershipStatus::Inactive
    );
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 0);
    assert!(h.notifications.all().await.is_empty());
}

#[tokio::test]
async fn redelivered_success_counts_capacity_once() {
    let h = Harness::new();
    let member = h.add_member("Sunil").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    let first = h.reconcile.handle(h.callback(&payment, 2)).await.unwrap();
    let second = h.reconcile.handle(h.callback(&payment, 2)).await.unwrap();
    let third = h.reconcile.respond(h.callback(&payment, 2)).await;

    assert!(matches!(first, ReconcilePaymentResult::Activated { .. }));
    assert!(matches!(second, ReconcilePaymentResult::AlreadyProcessed { .. }));
    assert_eq!(third.status, StatusCode::OK);
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
    assert_eq!(
        h.store.member(&member.id).await.unwrap().membership.payment_ids.len(),
        1
    );
}

#[tokio::test]
async fn concurrent_deliveries_activate_once() {
    let h = Harness::new();
    let member = h.add_member("Amali").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    let (a, b) = tokio::join!(
        h.reconcile.handle(h.callback(&payment, 2)),
        h.reconcile.handle(h.callback(&payment, 2)),
    );

    let activations = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|r| matches!(r, ReconcilePaymentResult::Activated { .. }))
        .count();
    assert_eq!(activations, 1);
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
}

#[tokio::test]
async fn full_package_rejects_initiation_before_recording_payment() {
    let h = Harness::new();
    let member = h.add_member("Ruwan").await;
    let mut package = h.add_package(5000, None, 1, Some(2)).await;
    package.current_members = 2;
    h.store.put_package(package.clone()).await;

    let result = h
        .initiate
        .handle(InitiatePaymentCommand {
            user_id: member.id,
            package_id: package.id,
        })
        .await;

    assert!(matches!(result, Err(MembershipError::PackageFull(_))));
    assert_eq!(h.store.payment_count().await, 0);
}

#[tokio::test]
async fn repeated_chargeback_never_drives_capacity_negative() {
    let h = Harness::new();
    let member = h.add_member("Dilani").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;
    h.reconcile.handle(h.callback(&payment, 2)).await.unwrap();

    let first = h.reconcile.handle(h.callback(&payment, -3)).await.unwrap();
    let second = h.reconcile.handle(h.callback(&payment, -3)).await.unwrap();

    assert!(matches!(
        first,
        ReconcilePaymentResult::ChargedBack {
            membership_revoked: true,
            ..
        }
    ));
    assert!(matches!(second, ReconcilePaymentResult::AlreadyProcessed { .. }));
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 0);
    assert_eq!(
        h.store.payment(&payment.order_id).await.unwrap().status,
        PaymentStatus::Refunded
    );
    assert_eq!(
        h.store.member(&member.id).await.unwrap().status(),
        MembershipStatus::Expired
    );
}

#[tokio::test]
async fn storage_failure_asks_gateway_to_retry() {
    let h = Harness::new();
    let member = h.add_member("Chamara").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    h.store.fail_next_transaction().await;
    let ack = h.reconcile.respond(h.callback(&payment, 2)).await;
    assert_eq!(ack.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(h.store.payment(&payment.order_id).await.unwrap().is_pending());
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 0);

    let retry = h.reconcile.respond(h.callback(&payment, 2)).await;
    assert_eq!(retry.status, StatusCode::OK);
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
}

#[tokio::test]
async fn renewal_onto_another_package_moves_the_slot() {
    let h = Harness::new();
    let member = h.add_member("Ishara").await;
    let monthly = h.add_package(5000, None, 1, Some(5)).await;
    let annual = h.add_package(50000, Some(10), 12, Some(5)).await;

    let first = h.initiate(&member, &monthly).await;
    h.reconcile.handle(h.callback(&first, 2)).await.unwrap();

    // Still active, so a new initiation is refused.
    let refused = h
        .initiate
        .handle(InitiatePaymentCommand {
            user_id: member.id,
            package_id: annual.id,
        })
        .await;
    assert!(matches!(
        refused,
        Err(MembershipError::MembershipStillActive { .. })
    ));

    // Move the member into the grace period and renew from there.
    let mut lapsed = h.store.member(&member.id).await.unwrap();
    lapsed.membership.status = MembershipStatus::GracePeriod;
    h.store.put_member(lapsed).await;

    let renewal = h.initiate(&member, &annual).await;
    h.reconcile.handle(h.callback(&renewal, 2)).await.unwrap();

    assert_eq!(h.store.package(&monthly.id).await.unwrap().current_members, 0);
    assert_eq!(h.store.package(&annual.id).await.unwrap().current_members, 1);
    let renewed = h.store.member(&member.id).await.unwrap();
    assert_eq!(renewed.membership.package_id, Some(annual.id));
    assert_eq!(renewed.membership.payment_ids.len(), 2);
}

#[tokio::test]
async fn activation_email_reaches_member() {
    let h = Harness::new();
    let member = h.add_member("Tharindu").await;
    let package = h.add_package(5000, None, 1, None).await;
    let payment = h.initiate(&member, &package).await;

    h.reconcile.handle(h.callback(&payment, 2)).await.unwrap();

    // Emails run on detached tasks; give them a moment to finish.
    for _ in 0..50 {
        if h.emails.sent().await.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    let sent = h.emails.sent().await;
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.recipient == "tharindu@example.com"));
}

#[tokio::test]
async fn late_success_after_stale_cleanup_still_activates() {
    let h = Harness::new();
    let member = h.add_member("Ruwan").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    let cleanup = CancelStalePaymentsHandler::new(h.store.clone(), Some(Duration::hours(1)));
    let swept = cleanup
        .handle(CancelStalePaymentsCommand {
            now: Timestamp::now().add_days(1),
        })
        .await
        .unwrap();
    assert_eq!(swept.cancelled, 1);
    assert_eq!(
        h.store.payment(&payment.order_id).await.unwrap().status,
        PaymentStatus::Cancelled
    );

    let result = h.reconcile.handle(h.callback(&payment, 2)).await.unwrap();
    assert!(matches!(result, ReconcilePaymentResult::Activated { .. }));
    assert_eq!(
        h.store.payment(&payment.order_id).await.unwrap().status,
        PaymentStatus::Success
    );
    assert_eq!(
        h.store.member(&member.id).await.unwrap().status(),
        MembershipStatus::Active
    );
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
}

#[tokio::test]
async fn success_after_gateway_cancel_is_refused() {
    let h = Harness::new();
    let member = h.add_member("Sachini").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;
    let payment = h.initiate(&member, &package).await;

    h.reconcile.handle(h.callback(&payment, -1)).await.unwrap();
    let result = h.reconcile.handle(h.callback(&payment, 2)).await;

    assert!(matches!(result, Err(WebhookError::Ignored(_))));
    assert_eq!(
        h.store.payment(&payment.order_id).await.unwrap().status,
        PaymentStatus::Cancelled
    );
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 0);
}

#[tokio::test]
async fn chargeback_on_abandoned_order_keeps_paid_membership() {
    let h = Harness::new();
    let member = h.add_member("Lahiru").await;
    let package = h.add_package(5000, None, 1, Some(5)).await;

    let earlier = Timestamp::now().minus(Duration::hours(2));
    let abandoned = Payment::initiate(
        member.id,
        package.id,
        OrderId::generate(&member.id, earlier),
        package.discounted_amount(),
        CURRENCY,
        earlier,
    );
    h.store.put_payment(abandoned.clone()).await;

    let paid = h.initiate(&member, &package).await;
    h.reconcile.handle(h.callback(&paid, 2)).await.unwrap();

    let result = h.reconcile.handle(h.callback(&abandoned, -3)).await.unwrap();
    assert!(matches!(
        result,
        ReconcilePaymentResult::ChargedBack {
            membership_revoked: false,
            ..
        }
    ));
    assert_eq!(
        h.store.member(&member.id).await.unwrap().status(),
        MembershipStatus::Active
    );
    assert_eq!(
        h.store.payment(&paid.order_id).await.unwrap().status,
        PaymentStatus::Success
    );
    assert_eq!(
        h.store.payment(&abandoned.order_id).await.unwrap().status,
        PaymentStatus::Refunded
    );
    assert_eq!(h.store.package(&package.id).await.unwrap().current_members, 1);
}
