use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::bonus::{AssignBonusRequest, BalanceResponse, BonusLedgerRepository};
use crate::business_rules::{BusinessRulesEngine, LedgerEntry};
use crate::error::ApiError;

/// Service for bonus ledger business logic
#[derive(Clone)]
pub struct BonusService {
    ledger: Arc<dyn BonusLedgerRepository>,
    engine: Arc<BusinessRulesEngine>,
}

impl BonusService {
    /// Create a new BonusService
    pub fn new(ledger: Arc<dyn BonusLedgerRepository>, engine: Arc<BusinessRulesEngine>) -> Self {
        Self { ledger, engine }
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), ApiError> {
        if self.ledger.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("User", user_id))
        }
    }

    /// Current non-expired balance of a user
    pub async fn balance(&self, user_id: Uuid) -> Result<BalanceResponse, ApiError> {
        self.ensure_user(user_id).await?;

        let entries = self.ledger.entries_for_user(user_id).await?;
        let balance = self.engine.balance(&entries, Utc::now());

        tracing::debug!("User {} has {} active points", user_id, balance.points);
        Ok(balance.into())
    }

    /// Full ledger history of a user
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<LedgerEntry>, ApiError> {
        self.ensure_user(user_id).await?;
        self.ledger.entries_for_user(user_id).await
    }

    /// Append a manual assignment
    pub async fn assign(
        &self,
        user_id: Uuid,
        request: AssignBonusRequest,
    ) -> Result<LedgerEntry, ApiError> {
        self.ensure_user(user_id).await?;

        let entry = self.engine.loyalty().assignment_entry(
            user_id,
            request.entry_type.into(),
            request.points,
            request.description,
            Utc::now(),
        )?;

        let stored = self
            .ledger
            .append_entries(vec![entry])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InternalError("ledger append returned no entry".to_string()))?;

        tracing::info!(
            "Assigned {} {} points to user {}",
            stored.points,
            stored.entry_type,
            user_id
        );
        Ok(stored)
    }
}
