//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `PackageRepository` - Package catalog
//! - `PaymentRepository` - Payment ledger keyed by order id
//! - `MemberRepository` - Member profiles and membership queries
//! - `MembershipTransitions` - Atomic payment/member/capacity changes
//!
//! ## Side-Effect Ports
//!
//! - `EmailSender` - Transactional email
//! - `NotificationStore` - In-app notifications

mod email_sender;
mod member_repository;
mod membership_transitions;
mod notification_store;
mod package_repository;
mod payment_repository;

pub use email_sender::{EmailMessage, EmailSender, EmailTemplate};
pub use member_repository::MemberRepository;
pub use membership_transitions::{
    Activation, ActivationOutcome, ActivationRequest, Chargeback, ChargebackOutcome,
    ChargebackRequest, MembershipTransitions, Suspension,
};
pub use notification_store::NotificationStore;
pub use package_repository::PackageRepository;
pub use payment_repository::{PaymentRepository, SaveResult};
