use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{
    DissolutionLineItemModel, DissolutionSettlementModel, FundModel, OutboxEntryModel,
};
use fund_db::repository::SettlementRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{fund_status_str, insert_outbox, parse_settlement_status, settlement_status_str};

pub struct SettlementRepositoryImpl {
    pool: PgPool,
}

impl SettlementRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_settlement_from_row(
    row: &sqlx::postgres::PgRow,
) -> FundResult<DissolutionSettlementModel> {
    Ok(DissolutionSettlementModel {
        id: row.get("id"),
        fund_id: row.get("fund_id"),
        status: parse_settlement_status(&row.get::<String, _>("status"))?,
        total_contributions_collected: row.get("total_contributions_collected"),
        total_interest_pool: row.get("total_interest_pool"),
        settlement_date: row.get("settlement_date"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn extract_line_item_from_row(row: &sqlx::postgres::PgRow) -> DissolutionLineItemModel {
    DissolutionLineItemModel {
        id: row.get("id"),
        settlement_id: row.get("settlement_id"),
        user_id: row.get("user_id"),
        total_paid_contributions: row.get("total_paid_contributions"),
        interest_share: row.get("interest_share"),
        gross_payout: row.get("gross_payout"),
        outstanding_loan_principal: row.get("outstanding_loan_principal"),
        unpaid_interest: row.get("unpaid_interest"),
        unpaid_dues: row.get("unpaid_dues"),
        net_payout: row.get("net_payout"),
    }
}

#[async_trait]
impl SettlementRepository for SettlementRepositoryImpl {
    async fn save(
        &self,
        settlement: DissolutionSettlementModel,
        line_items: Vec<DissolutionLineItemModel>,
    ) -> FundResult<DissolutionSettlementModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO dissolution_settlements (
                id, fund_id, status, total_contributions_collected,
                total_interest_pool, settlement_date, version, created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (fund_id) DO UPDATE SET
                status = EXCLUDED.status,
                total_contributions_collected = EXCLUDED.total_contributions_collected,
                total_interest_pool = EXCLUDED.total_interest_pool,
                settlement_date = EXCLUDED.settlement_date,
                version = dissolution_settlements.version + 1,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(settlement.id)
        .bind(settlement.fund_id)
        .bind(settlement_status_str(settlement.status))
        .bind(settlement.total_contributions_collected)
        .bind(settlement.total_interest_pool)
        .bind(settlement.settlement_date)
        .bind(settlement.version)
        .bind(settlement.created_at)
        .bind(settlement.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM dissolution_line_items WHERE settlement_id = $1")
            .bind(settlement.id)
            .execute(&mut *tx)
            .await?;
        for item in &line_items {
            sqlx::query(
                r#"
                INSERT INTO dissolution_line_items (
                    id, settlement_id, user_id, total_paid_contributions,
                    interest_share, gross_payout, outstanding_loan_principal,
                    unpaid_interest, unpaid_dues, net_payout
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(item.id)
            .bind(item.settlement_id)
            .bind(item.user_id)
            .bind(item.total_paid_contributions)
            .bind(item.interest_share)
            .bind(item.gross_payout)
            .bind(item.outstanding_loan_principal)
            .bind(item.unpaid_interest)
            .bind(item.unpaid_dues)
            .bind(item.net_payout)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(settlement)
    }

    async fn find_by_fund(
        &self,
        fund_id: Uuid,
    ) -> FundResult<Option<(DissolutionSettlementModel, Vec<DissolutionLineItemModel>)>> {
        let row = sqlx::query("SELECT * FROM dissolution_settlements WHERE fund_id = $1")
            .bind(fund_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let settlement = extract_settlement_from_row(&row)?;
        let item_rows = sqlx::query(
            "SELECT * FROM dissolution_line_items WHERE settlement_id = $1 ORDER BY user_id",
        )
        .bind(settlement.id)
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows.iter().map(extract_line_item_from_row).collect();
        Ok(Some((settlement, items)))
    }

    async fn confirm(
        &self,
        settlement: DissolutionSettlementModel,
        fund: FundModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<DissolutionSettlementModel> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE dissolution_settlements SET
                status = $3, settlement_date = $4, version = version + 1,
                updated_at = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(settlement.id)
        .bind(settlement.version)
        .bind(settlement_status_str(settlement.status))
        .bind(settlement.settlement_date)
        .bind(settlement.updated_at)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FundError::version_conflict(
                "DissolutionSettlement",
                settlement.id,
                settlement.version,
            ));
        }

        let fund_result = sqlx::query(
            r#"
            UPDATE funds SET
                status = $3, dissolved_at = $4, version = version + 1,
                updated_at = $5
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(fund.id)
        .bind(fund.version)
        .bind(fund_status_str(fund.status))
        .bind(fund.dissolved_at)
        .bind(fund.updated_at)
        .execute(&mut *tx)
        .await?;
        if fund_result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FundError::version_conflict("Fund", fund.id, fund.version));
        }

        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(settlement)
    }
}
