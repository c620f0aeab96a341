//! Package repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PackageId};
use crate::domain::package::Package;

/// Read/write access to the package catalog.
///
/// Capacity counters are not written through this port during
/// reconciliation or sweeps; those go through
/// [`MembershipTransitions`](super::MembershipTransitions) so they change in
/// the same transaction as the membership.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    /// Inserts or replaces a package definition.
    async fn save(&self, package: &Package) -> Result<(), DomainError>;

    /// Finds a package by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &PackageId) -> Result<Option<Package>, DomainError>;
}
