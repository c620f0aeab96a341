//! PostgreSQL implementation of MemberRepository.
//!
//! Membership columns are written only by the transition adapter; this
//! repository inserts members and updates profile columns.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::membership::{
    Member, MemberProfile, MembershipStatus, NotificationPreferences,
};
use crate::ports::MemberRepository;

use super::rows::{db_error, reminder_days_column, MemberRow, MEMBER_COLUMNS};

pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MemberRepository for PostgresMemberRepository {
    async fn insert(&self, member: &Member) -> Result<(), DomainError> {
        let profile = &member.profile;
        sqlx::query(
            r#"
            INSERT INTO members (
                id, first_name, last_name, email, phone, address, city, country,
                email_enabled, reminder_days, membership_status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(member.id.as_uuid())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.country)
        .bind(member.preferences.email_enabled)
        .bind(reminder_days_column(&member.preferences))
        .bind(member.membership.status.as_str())
        .bind(member.created_at.as_datetime())
        .bind(member.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("members_pkey") {
                    return DomainError::validation("id", "Member already exists");
                }
            }
            DomainError::database(format!("Failed to insert member: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Member>, DomainError> {
        let sql = format!("SELECT {} FROM members m WHERE m.id = $1", MEMBER_COLUMNS);
        let row: Option<MemberRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("find member"))?;

        row.map(Member::try_from).transpose()
    }

    async fn find_by_membership_status(
        &self,
        status: MembershipStatus,
    ) -> Result<Vec<Member>, DomainError> {
        let sql = format!(
            "SELECT {} FROM members m WHERE m.membership_status = $1 ORDER BY m.id",
            MEMBER_COLUMNS
        );
        let rows: Vec<MemberRow> = sqlx::query_as(&sql)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list members by status"))?;

        rows.into_iter().map(Member::try_from).collect()
    }

    async fn update_profile(
        &self,
        id: &UserId,
        profile: &MemberProfile,
        preferences: &NotificationPreferences,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE members SET
                first_name = $2,
                last_name = $3,
                email = $4,
                phone = $5,
                address = $6,
                city = $7,
                country = $8,
                email_enabled = $9,
                reminder_days = $10,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.country)
        .bind(preferences.email_enabled)
        .bind(reminder_days_column(preferences))
        .execute(&self.pool)
        .await
        .map_err(db_error("update member profile"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::MemberNotFound,
                format!("Member not found: {}", id),
            ));
        }
        Ok(())
    }
}
