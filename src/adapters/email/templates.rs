//! HTML rendering for membership emails.

use serde_json::Value;

use crate::ports::{EmailMessage, EmailTemplate};

/// Subject and body ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

/// Renders `message` for the gym called `brand`.
///
/// Missing template variables render as empty text rather than failing the
/// send.
pub fn render(message: &EmailMessage, brand: &str) -> RenderedEmail {
    let data = &message.data;
    let name = text(data, "name");
    let greeting = if name.trim().is_empty() {
        "Hi there,".to_string()
    } else {
        format!("Hi {},", name)
    };

    let (subject, heading, body) = match message.template {
        EmailTemplate::MembershipActivated => (
            format!("Welcome to {}", brand),
            "Your membership is active",
            format!(
                "Your <strong>{}</strong> membership is now active until <strong>{}</strong>.",
                text(data, "package"),
                text(data, "end_date"),
            ),
        ),
        EmailTemplate::PaymentReceipt => (
            format!("Payment receipt {}", text(data, "order_id")),
            "Payment received",
            format!(
                "We received <strong>{} {}</strong> for <strong>{}</strong>. Order reference: {}.",
                text(data, "currency"),
                text(data, "amount"),
                text(data, "package"),
                text(data, "order_id"),
            ),
        ),
        EmailTemplate::PaymentFailed => (
            format!("Payment failed - {}", brand),
            "Payment failed",
            format!(
                "We could not process your payment for order {}. No membership was activated.",
                text(data, "order_id"),
            ),
        ),
        EmailTemplate::MembershipReminder => (
            format!(
                "Your membership ends in {} day(s)",
                text(data, "days_remaining")
            ),
            "Membership ending soon",
            format!(
                "Your membership ends on <strong>{}</strong>. Renew to keep training without interruption.",
                text(data, "end_date"),
            ),
        ),
        EmailTemplate::MembershipExpired => (
            format!("Your {} membership has ended", brand),
            "Membership ended",
            format!(
                "Your membership has ended. You keep access during the grace period until <strong>{}</strong>.",
                text(data, "grace_period_end_date"),
            ),
        ),
        EmailTemplate::GracePeriodEnding => (
            "Your grace period ends tomorrow".to_string(),
            "Last day of access",
            format!(
                "Your grace period ends on <strong>{}</strong>. Renew today to keep your access.",
                text(data, "grace_period_end_date"),
            ),
        ),
        EmailTemplate::MembershipSuspended => (
            format!("Your {} membership is suspended", brand),
            "Membership suspended",
            "Your grace period is over and your membership has been suspended. Renew any time to reactivate it.".to_string(),
        ),
    };

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>{heading}</h2>
    <p>{greeting}</p>
    <p>{body}</p>
    <hr style="border: none; border-top: 1px solid #eee; margin: 20px 0;">
    <p style="color: #999; font-size: 12px;">{brand}</p>
</body>
</html>"#,
        heading = heading,
        greeting = escape(&greeting),
        body = body,
        brand = escape(brand),
    );

    RenderedEmail { subject, html }
}

fn text(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => escape(s),
        Some(Value::Null) | None => String::new(),
        Some(other) => escape(&other.to_string()),
    }
}

fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
