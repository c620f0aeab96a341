//! PostgreSQL implementation of PackageRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, PackageId};
use crate::domain::package::Package;
use crate::ports::PackageRepository;

use super::rows::{db_error, PackageRow, PACKAGE_COLUMNS};

pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PackageRepository for PostgresPackageRepository {
    async fn save(&self, package: &Package) -> Result<(), DomainError> {
        let duration = i32::try_from(package.duration_months)
            .map_err(|_| DomainError::validation("duration_months", "Duration out of range"))?;
        let max_members = package
            .max_members
            .map(i32::try_from)
            .transpose()
            .map_err(|_| DomainError::validation("max_members", "Capacity out of range"))?;
        let current = i32::try_from(package.current_members)
            .map_err(|_| DomainError::validation("current_members", "Member count out of range"))?;

        sqlx::query(
            r#"
            INSERT INTO packages (
                id, name, description, price_cents, duration_months, discount_percent,
                max_members, current_members, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price_cents = EXCLUDED.price_cents,
                duration_months = EXCLUDED.duration_months,
                discount_percent = EXCLUDED.discount_percent,
                max_members = EXCLUDED.max_members,
                is_active = EXCLUDED.is_active,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(package.id.as_uuid())
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.price.cents())
        .bind(duration)
        .bind(package.discount_percent.map(i16::from))
        .bind(max_members)
        .bind(current)
        .bind(package.is_active)
        .bind(package.created_at.as_datetime())
        .bind(package.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("save package"))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &PackageId) -> Result<Option<Package>, DomainError> {
        let sql = format!("SELECT {} FROM packages WHERE id = $1", PACKAGE_COLUMNS);
        let row: Option<PackageRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find package"))?;

        row.map(Package::try_from).transpose()
    }
}
