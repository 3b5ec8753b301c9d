use async_trait::async_trait;
use chrono::Utc;
use fund_api::{FundError, FundResult};
use fund_db::models::{
    FundRole, FundRoleAssignmentModel, MemberContributionPlanModel, OutboxEntryModel,
};
use fund_db::repository::MembershipRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{fund_role_str, insert_outbox, parse_fund_role};

pub struct MembershipRepositoryImpl {
    pool: PgPool,
}

impl MembershipRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_role_from_row(row: &sqlx::postgres::PgRow) -> FundResult<FundRoleAssignmentModel> {
    Ok(FundRoleAssignmentModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        user_id: row.get("user_id"),
        role: parse_fund_role(&row.get::<String, _>("role"))?,
        assigned_by: row.get("assigned_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn extract_plan_from_row(row: &sqlx::postgres::PgRow) -> MemberContributionPlanModel {
    MemberContributionPlanModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        user_id: row.get("user_id"),
        monthly_contribution_amount: row.get("monthly_contribution_amount"),
        join_date: row.get("join_date"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

pub(crate) async fn insert_role_assignment(
    conn: &mut sqlx::PgConnection,
    assignment: &FundRoleAssignmentModel,
) -> FundResult<()> {
    sqlx::query(
        r#"
        INSERT INTO fund_role_assignments (
            id, fund_id, user_id, role, assigned_by, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(assignment.id)
    .bind(assignment.fund_id)
    .bind(assignment.user_id)
    .bind(fund_role_str(assignment.role))
    .bind(assignment.assigned_by)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .execute(conn)
    .await
    .map_err(map_duplicate("role assignment"))?;
    Ok(())
}

pub(crate) async fn insert_member_plan(
    conn: &mut sqlx::PgConnection,
    plan: &MemberContributionPlanModel,
) -> FundResult<()> {
    sqlx::query(
        r#"
        INSERT INTO member_contribution_plans (
            id, fund_id, user_id, monthly_contribution_amount, join_date,
            is_active, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(plan.id)
    .bind(plan.fund_id)
    .bind(plan.user_id)
    .bind(plan.monthly_contribution_amount)
    .bind(plan.join_date)
    .bind(plan.is_active)
    .bind(plan.created_at)
    .bind(plan.updated_at)
    .execute(conn)
    .await
    .map_err(map_duplicate("member plan"))?;
    Ok(())
}

/// Unique-index violations on (fund_id, user_id) surface as `Conflict`.
fn map_duplicate(entity: &'static str) -> impl Fn(sqlx::Error) -> FundError {
    move |err| match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            FundError::Conflict(format!("duplicate {entity}"))
        }
        _ => err.into(),
    }
}

#[async_trait]
impl MembershipRepository for MembershipRepositoryImpl {
    async fn create_role_assignment(
        &self,
        assignment: FundRoleAssignmentModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel> {
        let mut tx = self.pool.begin().await?;
        insert_role_assignment(&mut *tx, &assignment).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(assignment)
    }

    async fn find_role_assignment(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<FundRoleAssignmentModel>> {
        let row = sqlx::query(
            "SELECT * FROM fund_role_assignments WHERE fund_id = $1 AND user_id = $2",
        )
        .bind(fund_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(extract_role_from_row).transpose()
    }

    async fn find_role_assignments_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<FundRoleAssignmentModel>> {
        let rows = sqlx::query(
            "SELECT * FROM fund_role_assignments WHERE fund_id = $1 ORDER BY created_at",
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(extract_role_from_row).collect()
    }

    async fn update_role(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        role: FundRole,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<FundRoleAssignmentModel> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(
            r#"
            UPDATE fund_role_assignments SET role = $3, updated_at = $4
            WHERE fund_id = $1 AND user_id = $2
            RETURNING *
            "#,
        )
        .bind(fund_id)
        .bind(user_id)
        .bind(fund_role_str(role))
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| FundError::not_found("FundRoleAssignment", user_id))?;
        let assignment = extract_role_from_row(&row)?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(assignment)
    }

    async fn count_admins(&self, fund_id: Uuid) -> FundResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS admin_count FROM fund_role_assignments WHERE fund_id = $1 AND role = 'Admin'",
        )
        .bind(fund_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("admin_count"))
    }

    async fn create_member_plan(
        &self,
        plan: MemberContributionPlanModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<MemberContributionPlanModel> {
        let mut tx = self.pool.begin().await?;
        insert_member_plan(&mut *tx, &plan).await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(plan)
    }

    async fn find_member_plan(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
    ) -> FundResult<Option<MemberContributionPlanModel>> {
        let row = sqlx::query(
            "SELECT * FROM member_contribution_plans WHERE fund_id = $1 AND user_id = $2",
        )
        .bind(fund_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(extract_plan_from_row))
    }

    async fn find_active_plans_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Vec<MemberContributionPlanModel>> {
        let rows = sqlx::query(
            "SELECT * FROM member_contribution_plans WHERE fund_id = $1 AND is_active ORDER BY join_date",
        )
        .bind(fund_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(extract_plan_from_row).collect())
    }

    async fn remove_member(
        &self,
        fund_id: Uuid,
        user_id: Uuid,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM fund_role_assignments WHERE fund_id = $1 AND user_id = $2")
            .bind(fund_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            UPDATE member_contribution_plans SET is_active = FALSE, updated_at = $3
            WHERE fund_id = $1 AND user_id = $2
            "#,
        )
        .bind(fund_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(())
    }
}
