//! Row types and shared statements for the PostgreSQL adapters.
//!
//! Rows convert into domain aggregates with `TryFrom`; a row that does not
//! satisfy the domain's invariants is reported as a `DatabaseError`.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, PackageId, PaymentId, Timestamp, UserId,
};
use crate::domain::membership::{
    Member, MemberProfile, MembershipState, MembershipStatus, MembershipWindow,
    NotificationPreferences,
};
use crate::domain::package::{Package, PlanCategory};
use crate::domain::payment::{GatewayReceipt, OrderId, Payment, PaymentStatus, RefundDetails};

pub(super) const PACKAGE_COLUMNS: &str = "id, name, description, price_cents, duration_months, \
     discount_percent, max_members, current_members, is_active, created_at, updated_at";

pub(super) const PAYMENT_COLUMNS: &str = "id, user_id, package_id, order_id, amount_cents, \
     currency, status, gateway_payment_id, status_code, status_message, method, \
     card_holder_name, card_no, card_expiry, membership_start, membership_end, \
     grace_period_end, failure_reason, refund_cents, refund_reason, refunded_at, \
     created_at, updated_at";

/// Member columns, selected from `members m`, including the payment history.
pub(super) const MEMBER_COLUMNS: &str = "m.id, m.first_name, m.last_name, m.email, m.phone, \
     m.address, m.city, m.country, m.email_enabled, m.reminder_days, m.membership_status, \
     m.package_id, m.plan, m.start_date, m.end_date, m.grace_period_end_date, m.auto_renew, \
     m.last_payment_at, m.created_at, m.updated_at, \
     ARRAY(SELECT mp.payment_id FROM member_payments mp \
           WHERE mp.member_id = m.id ORDER BY mp.added_at, mp.payment_id) AS payment_ids";

/// Maps a sqlx failure to a `DatabaseError` naming the failed action.
pub(super) fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {} in database: {}", what, detail),
    )
}

fn ts(dt: DateTime<Utc>) -> Timestamp {
    Timestamp::from_datetime(dt)
}

fn opt_dt(t: Option<Timestamp>) -> Option<DateTime<Utc>> {
    t.map(|t| *t.as_datetime())
}

fn to_u32(what: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| corrupt(what, value))
}

// ════════════════════════════════════════════════════════════════════════════
// Packages
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PackageRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    price_cents: i64,
    duration_months: i32,
    discount_percent: Option<i16>,
    max_members: Option<i32>,
    current_members: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PackageRow> for Package {
    type Error = DomainError;

    fn try_from(row: PackageRow) -> Result<Self, Self::Error> {
        let discount_percent = row
            .discount_percent
            .map(|d| u8::try_from(d).map_err(|_| corrupt("discount_percent", d)))
            .transpose()?;
        let max_members = row
            .max_members
            .map(|m| to_u32("max_members", m))
            .transpose()?;

        Ok(Package {
            id: PackageId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            price: Money::from_cents(row.price_cents).map_err(|e| corrupt("price_cents", e))?,
            duration_months: to_u32("duration_months", row.duration_months)?,
            discount_percent,
            max_members,
            current_members: to_u32("current_members", row.current_members)?,
            is_active: row.is_active,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

pub(super) async fn lock_package(
    conn: &mut PgConnection,
    id: &PackageId,
) -> Result<Option<Package>, DomainError> {
    let sql = format!("SELECT {} FROM packages WHERE id = $1 FOR UPDATE", PACKAGE_COLUMNS);
    let row: Option<PackageRow> = sqlx::query_as(&sql)
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(db_error("lock package"))?;
    row.map(Package::try_from).transpose()
}

pub(super) async fn write_member_count(
    conn: &mut PgConnection,
    package: &Package,
) -> Result<(), DomainError> {
    let count = i32::try_from(package.current_members)
        .map_err(|_| DomainError::validation("current_members", "Member count out of range"))?;
    sqlx::query("UPDATE packages SET current_members = $2, updated_at = NOW() WHERE id = $1")
        .bind(package.id.as_uuid())
        .bind(count)
        .execute(conn)
        .await
        .map_err(db_error("update package capacity"))?;
    Ok(())
}

/// Releases one slot, flooring at zero.
pub(super) async fn release_slot(
    conn: &mut PgConnection,
    id: &PackageId,
) -> Result<(), DomainError> {
    sqlx::query(
        "UPDATE packages SET current_members = GREATEST(current_members - 1, 0), \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(id.as_uuid())
    .execute(conn)
    .await
    .map_err(db_error("release package slot"))?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Members
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
pub(super) struct MemberRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    country: Option<String>,
    email_enabled: bool,
    reminder_days: Vec<i32>,
    membership_status: String,
    package_id: Option<Uuid>,
    plan: Option<String>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    grace_period_end_date: Option<DateTime<Utc>>,
    auto_renew: bool,
    last_payment_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    payment_ids: Vec<Uuid>,
}

impl TryFrom<MemberRow> for Member {
    type Error = DomainError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let status = MembershipStatus::parse(&row.membership_status)
            .ok_or_else(|| corrupt("membership_status", &row.membership_status))?;
        let plan = row
            .plan
            .as_deref()
            .map(|p| PlanCategory::parse(p).ok_or_else(|| corrupt("plan", p)))
            .transpose()?;
        let reminder_days = row
            .reminder_days
            .into_iter()
            .map(|d| to_u32("reminder_days", d))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Member {
            id: UserId::from_uuid(row.id),
            profile: MemberProfile {
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                address: row.address,
                city: row.city,
                country: row.country,
            },
            preferences: NotificationPreferences {
                email_enabled: row.email_enabled,
                reminder_days,
            },
            membership: MembershipState {
                status,
                package_id: row.package_id.map(PackageId::from_uuid),
                plan,
                start_date: row.start_date.map(ts),
                end_date: row.end_date.map(ts),
                grace_period_end_date: row.grace_period_end_date.map(ts),
                auto_renew: row.auto_renew,
                last_payment_at: row.last_payment_at.map(ts),
                payment_ids: row.payment_ids.into_iter().map(PaymentId::from_uuid).collect(),
            },
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

pub(super) fn reminder_days_column(prefs: &NotificationPreferences) -> Vec<i32> {
    prefs
        .reminder_days
        .iter()
        .filter_map(|d| i32::try_from(*d).ok())
        .collect()
}

pub(super) async fn lock_member(
    conn: &mut PgConnection,
    id: &UserId,
) -> Result<Option<Member>, DomainError> {
    let sql = format!(
        "SELECT {} FROM members m WHERE m.id = $1 FOR UPDATE OF m",
        MEMBER_COLUMNS
    );
    let row: Option<MemberRow> = sqlx::query_as(&sql)
        .bind(id.as_uuid())
        .fetch_optional(conn)
        .await
        .map_err(db_error("lock member"))?;
    row.map(Member::try_from).transpose()
}

/// Writes the membership columns of `member`. Profile columns are untouched.
pub(super) async fn write_membership(
    conn: &mut PgConnection,
    member: &Member,
) -> Result<(), DomainError> {
    let state = &member.membership;
    sqlx::query(
        r#"
        UPDATE members SET
            membership_status = $2,
            package_id = $3,
            plan = $4,
            start_date = $5,
            end_date = $6,
            grace_period_end_date = $7,
            auto_renew = $8,
            last_payment_at = $9,
            updated_at = $10
        WHERE id = $1
        "#,
    )
    .bind(member.id.as_uuid())
    .bind(state.status.as_str())
    .bind(state.package_id.map(|p| *p.as_uuid()))
    .bind(state.plan.as_ref().map(|p| p.as_str()))
    .bind(opt_dt(state.start_date))
    .bind(opt_dt(state.end_date))
    .bind(opt_dt(state.grace_period_end_date))
    .bind(state.auto_renew)
    .bind(opt_dt(state.last_payment_at))
    .bind(member.updated_at.as_datetime())
    .execute(conn)
    .await
    .map_err(db_error("update membership"))?;
    Ok(())
}

pub(super) async fn append_payment_history(
    conn: &mut PgConnection,
    member: &Member,
    payment: &Payment,
) -> Result<(), DomainError> {
    sqlx::query(
        "INSERT INTO member_payments (member_id, payment_id, added_at) VALUES ($1, $2, $3) \
         ON CONFLICT DO NOTHING",
    )
    .bind(member.id.as_uuid())
    .bind(payment.id.as_uuid())
    .bind(payment.updated_at.as_datetime())
    .execute(conn)
    .await
    .map_err(db_error("record payment history"))?;
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Payments
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, sqlx::FromRow)]
pub(super) struct PaymentRow {
    id: Uuid,
    user_id: Uuid,
    package_id: Uuid,
    order_id: String,
    amount_cents: i64,
    currency: String,
    status: String,
    gateway_payment_id: Option<String>,
    status_code: Option<i32>,
    status_message: Option<String>,
    method: Option<String>,
    card_holder_name: Option<String>,
    card_no: Option<String>,
    card_expiry: Option<String>,
    membership_start: Option<DateTime<Utc>>,
    membership_end: Option<DateTime<Utc>>,
    grace_period_end: Option<DateTime<Utc>>,
    failure_reason: Option<String>,
    refund_cents: Option<i64>,
    refund_reason: Option<String>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let status =
            PaymentStatus::parse(&row.status).ok_or_else(|| corrupt("payment status", &row.status))?;

        let gateway = row.status_code.map(|status_code| GatewayReceipt {
            gateway_payment_id: row.gateway_payment_id,
            status_code,
            status_message: row.status_message,
            method: row.method,
            card_holder_name: row.card_holder_name,
            card_no: row.card_no,
            card_expiry: row.card_expiry,
        });

        let membership_window = match (row.membership_start, row.membership_end, row.grace_period_end) {
            (Some(start), Some(end), Some(grace)) => Some(MembershipWindow {
                start: ts(start),
                end: ts(end),
                grace_period_end: ts(grace),
            }),
            _ => None,
        };

        let refund = match (row.refund_cents, row.refunded_at) {
            (Some(cents), Some(at)) => Some(RefundDetails {
                amount: Money::from_cents(cents).map_err(|e| corrupt("refund_cents", e))?,
                reason: row.refund_reason.unwrap_or_default(),
                refunded_at: ts(at),
            }),
            _ => None,
        };

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            package_id: PackageId::from_uuid(row.package_id),
            order_id: OrderId::new(row.order_id).map_err(|e| corrupt("order_id", e))?,
            amount: Money::from_cents(row.amount_cents).map_err(|e| corrupt("amount_cents", e))?,
            currency: row.currency,
            status,
            gateway,
            membership_window,
            failure_reason: row.failure_reason,
            refund,
            created_at: ts(row.created_at),
            updated_at: ts(row.updated_at),
        })
    }
}

pub(super) async fn lock_payment(
    conn: &mut PgConnection,
    order_id: &OrderId,
) -> Result<Option<Payment>, DomainError> {
    let sql = format!("SELECT {} FROM payments WHERE order_id = $1 FOR UPDATE", PAYMENT_COLUMNS);
    let row: Option<PaymentRow> = sqlx::query_as(&sql)
        .bind(order_id.as_str())
        .fetch_optional(conn)
        .await
        .map_err(db_error("lock payment"))?;
    row.map(Payment::try_from).transpose()
}

/// Writes the mutable columns of `payment` when its stored status is
/// `expected`. Returns false when another writer got there first.
pub(super) async fn write_payment_if_status(
    conn: &mut PgConnection,
    payment: &Payment,
    expected: PaymentStatus,
) -> Result<bool, DomainError> {
    let receipt = payment.gateway.as_ref();
    let window = payment.membership_window.as_ref();
    let refund = payment.refund.as_ref();

    let result = sqlx::query(
        r#"
        UPDATE payments SET
            status = $3,
            gateway_payment_id = $4,
            status_code = $5,
            status_message = $6,
            method = $7,
            card_holder_name = $8,
            card_no = $9,
            card_expiry = $10,
            membership_start = $11,
            membership_end = $12,
            grace_period_end = $13,
            failure_reason = $14,
            refund_cents = $15,
            refund_reason = $16,
            refunded_at = $17,
            updated_at = $18
        WHERE order_id = $1 AND status = $2
        "#,
    )
    .bind(payment.order_id.as_str())
    .bind(expected.as_str())
    .bind(payment.status.as_str())
    .bind(receipt.and_then(|r| r.gateway_payment_id.clone()))
    .bind(receipt.map(|r| r.status_code))
    .bind(receipt.and_then(|r| r.status_message.clone()))
    .bind(receipt.and_then(|r| r.method.clone()))
    .bind(receipt.and_then(|r| r.card_holder_name.clone()))
    .bind(receipt.and_then(|r| r.card_no.clone()))
    .bind(receipt.and_then(|r| r.card_expiry.clone()))
    .bind(window.map(|w| *w.start.as_datetime()))
    .bind(window.map(|w| *w.end.as_datetime()))
    .bind(window.map(|w| *w.grace_period_end.as_datetime()))
    .bind(&payment.failure_reason)
    .bind(refund.map(|r| r.amount.cents()))
    .bind(refund.map(|r| r.reason.clone()))
    .bind(refund.map(|r| *r.refunded_at.as_datetime()))
    .bind(payment.updated_at.as_datetime())
    .execute(conn)
    .await
    .map_err(db_error("update payment"))?;

    Ok(result.rows_affected() > 0)
}

/// Like [`write_payment_if_status`] for a row already locked by this
/// transaction, where losing the race is impossible.
pub(super) async fn write_locked_payment(
    conn: &mut PgConnection,
    payment: &Payment,
    expected: PaymentStatus,
) -> Result<(), DomainError> {
    if write_payment_if_status(conn, payment, expected).await? {
        Ok(())
    } else {
        Err(DomainError::database(format!(
            "Locked payment {} changed status during transaction",
            payment.order_id
        )))
    }
}
