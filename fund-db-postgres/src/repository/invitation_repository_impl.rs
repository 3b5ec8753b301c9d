use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fund_api::{FundError, FundResult};
use fund_db::models::{
    FundRoleAssignmentModel, InvitationModel, MemberContributionPlanModel, OutboxEntryModel,
};
use fund_db::repository::InvitationRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{hs, insert_outbox, invitation_status_str, parse_invitation_status};
use super::membership_repository_impl::{insert_member_plan, insert_role_assignment};

pub struct InvitationRepositoryImpl {
    pool: PgPool,
}

impl InvitationRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_invitation_from_row(row: &sqlx::postgres::PgRow) -> FundResult<InvitationModel> {
    Ok(InvitationModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        target_contact: hs::<100>(
            "target_contact",
            row.get::<String, _>("target_contact").as_str(),
        )?,
        invited_by: row.get("invited_by"),
        status: parse_invitation_status(&row.get::<String, _>("status"))?,
        expires_at: row.get("expires_at"),
        responded_at: row.get("responded_at"),
        created_at: row.get("created_at"),
    })
}

async fn update_invitation_row(
    conn: &mut sqlx::PgConnection,
    invitation: &InvitationModel,
) -> FundResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE invitations SET status = $2, responded_at = $3, expires_at = $4
        WHERE id = $1
        "#,
    )
    .bind(invitation.id)
    .bind(invitation_status_str(invitation.status))
    .bind(invitation.responded_at)
    .bind(invitation.expires_at)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(FundError::not_found("Invitation", invitation.id));
    }
    Ok(())
}

#[async_trait]
impl InvitationRepository for InvitationRepositoryImpl {
    async fn create(
        &self,
        invitation: InvitationModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<InvitationModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO invitations (
                id, fund_id, target_contact, invited_by, status, expires_at,
                responded_at, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(invitation.id)
        .bind(invitation.fund_id)
        .bind(invitation.target_contact.as_str())
        .bind(invitation.invited_by)
        .bind(invitation_status_str(invitation.status))
        .bind(invitation.expires_at)
        .bind(invitation.responded_at)
        .bind(invitation.created_at)
        .execute(&mut *tx)
        .await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(invitation)
    }

    async fn find_by_id(&self, invitation_id: Uuid) -> FundResult<Option<InvitationModel>> {
        let row = sqlx::query("SELECT * FROM invitations WHERE id = $1")
            .bind(invitation_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_invitation_from_row).transpose()
    }

    async fn find_pending(
        &self,
        fund_id: Uuid,
        target_contact: &str,
    ) -> FundResult<Option<InvitationModel>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM invitations
            WHERE fund_id = $1 AND target_contact = $2 AND status = 'Pending'
            "#,
        )
        .bind(fund_id)
        .bind(target_contact)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(extract_invitation_from_row).transpose()
    }

    async fn update(&self, invitation: InvitationModel) -> FundResult<InvitationModel> {
        let mut conn = self.pool.acquire().await?;
        update_invitation_row(&mut *conn, &invitation).await?;
        Ok(invitation)
    }

    async fn accept(
        &self,
        invitation: InvitationModel,
        plan: MemberContributionPlanModel,
        role: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel> {
        let mut tx = self.pool.begin().await?;
        update_invitation_row(&mut *tx, &invitation).await?;
        insert_member_plan(&mut *tx, &plan).await?;
        insert_role_assignment(&mut *tx, &role).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(plan)
    }

    async fn find_expired_pending(
        &self,
        fund_id: Uuid,
        now: DateTime<Utc>,
    ) -> FundResult<Vec<InvitationModel>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM invitations
            WHERE fund_id = $1 AND status = 'Pending' AND expires_at < $2
            "#,
        )
        .bind(fund_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_invitation_from_row).collect()
    }
}
