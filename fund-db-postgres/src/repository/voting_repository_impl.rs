use async_trait::async_trait;
use fund_api::{FundError, FundResult};
use fund_db::models::{OutboxEntryModel, VoteModel, VotingSessionModel};
use fund_db::repository::VotingRepository;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::helpers::{
    insert_outbox, parse_threshold_type, parse_vote_decision, parse_voting_result,
    threshold_type_str, vote_decision_str, voting_result_str,
};

pub struct VotingRepositoryImpl {
    pool: PgPool,
}

impl VotingRepositoryImpl {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn extract_session_from_row(row: &sqlx::postgres::PgRow) -> FundResult<VotingSessionModel> {
    Ok(VotingSessionModel {
        id: row.get("id"),
        loan_id: row.get("loan_id"),
        fund_id: row.get("fund_id"),
        window_start: row.get("window_start"),
        window_end: row.get("window_end"),
        threshold_type: parse_threshold_type(&row.get::<String, _>("threshold_type"))?,
        threshold_value: row.get("threshold_value"),
        result: parse_voting_result(&row.get::<String, _>("result"))?,
        finalised_by: row.get("finalised_by"),
        finalised_date: row.get("finalised_date"),
        override_used: row.get("override_used"),
        created_at: row.get("created_at"),
    })
}

fn extract_vote_from_row(row: &sqlx::postgres::PgRow) -> FundResult<VoteModel> {
    Ok(VoteModel {
        id: row.get("id"),
        session_id: row.get("session_id"),
        voter_id: row.get("voter_id"),
        decision: parse_vote_decision(&row.get::<String, _>("decision"))?,
        cast_at: row.get("cast_at"),
    })
}

#[async_trait]
impl VotingRepository for VotingRepositoryImpl {
    async fn create_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO voting_sessions (
                id, loan_id, fund_id, window_start, window_end, threshold_type,
                threshold_value, result, finalised_by, finalised_date,
                override_used, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(session.id)
        .bind(session.loan_id)
        .bind(session.fund_id)
        .bind(session.window_start)
        .bind(session.window_end)
        .bind(threshold_type_str(session.threshold_type))
        .bind(session.threshold_value)
        .bind(voting_result_str(session.result))
        .bind(session.finalised_by)
        .bind(session.finalised_date)
        .bind(session.override_used)
        .bind(session.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FundError::Conflict(format!(
                    "voting session already exists for loan {}",
                    session.loan_id
                ))
            }
            _ => err.into(),
        })?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(session)
    }

    async fn update_session(
        &self,
        session: VotingSessionModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VotingSessionModel> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE voting_sessions SET
                result = $2, finalised_by = $3, finalised_date = $4,
                override_used = $5
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(voting_result_str(session.result))
        .bind(session.finalised_by)
        .bind(session.finalised_date)
        .bind(session.override_used)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(FundError::not_found("VotingSession", session.id));
        }
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(session)
    }

    async fn find_session_by_id(
        &self,
        session_id: Uuid,
    ) -> FundResult<Option<VotingSessionModel>> {
        let row = sqlx::query("SELECT * FROM voting_sessions WHERE id = $1")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_session_from_row).transpose()
    }

    async fn find_session_by_loan(
        &self,
        loan_id: Uuid,
    ) -> FundResult<Option<VotingSessionModel>> {
        let row = sqlx::query("SELECT * FROM voting_sessions WHERE loan_id = $1")
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_session_from_row).transpose()
    }

    async fn create_vote(
        &self,
        vote: VoteModel,
        outbox: Vec<OutboxEntryModel>,
    ) -> FundResult<VoteModel> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO votes (id, session_id, voter_id, decision, cast_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(vote.id)
        .bind(vote.session_id)
        .bind(vote.voter_id)
        .bind(vote_decision_str(vote.decision))
        .bind(vote.cast_at)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                FundError::AlreadyVoted {
                    session_id: vote.session_id,
                    voter_id: vote.voter_id,
                }
            }
            _ => err.into(),
        })?;
        insert_outbox(&mut *tx, &outbox).await?;
        tx.commit().await?;
        Ok(vote)
    }

    async fn find_vote(&self, session_id: Uuid, voter_id: Uuid) -> FundResult<Option<VoteModel>> {
        let row = sqlx::query("SELECT * FROM votes WHERE session_id = $1 AND voter_id = $2")
            .bind(session_id)
            .bind(voter_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(extract_vote_from_row).transpose()
    }

    async fn find_votes_by_session(&self, session_id: Uuid) -> FundResult<Vec<VoteModel>> {
        let rows = sqlx::query("SELECT * FROM votes WHERE session_id = $1 ORDER BY cast_at")
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(extract_vote_from_row).collect()
    }

    async fn count_votes(&self, session_id: Uuid) -> FundResult<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE decision = 'Approve') AS approve_count,
                COUNT(*) FILTER (WHERE decision = 'Reject') AS reject_count
            FROM votes WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;
        Ok((row.get("approve_count"), row.get("reject_count")))
    }
}
