//! Member repository port.
//!
//! Profile writes and membership writes are separate paths: nothing on this
//! port can change membership status or dates of an existing member.
//! Membership changes go through
//! [`MembershipTransitions`](super::MembershipTransitions).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::membership::{
    Member, MemberProfile, MembershipStatus, NotificationPreferences,
};

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Registers a new member.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the member already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, member: &Member) -> Result<(), DomainError>;

    /// Finds a member by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<Member>, DomainError>;

    /// All members currently in `status`.
    async fn find_by_membership_status(
        &self,
        status: MembershipStatus,
    ) -> Result<Vec<Member>, DomainError>;

    /// Replaces profile data and notification preferences.
    ///
    /// # Errors
    ///
    /// - `MemberNotFound` if the member doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update_profile(
        &self,
        id: &UserId,
        profile: &MemberProfile,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError>;
}
