// Editing session: one user's in-progress strategy plus its store round-trips.
// Async results are tied to a `SessionToken`. Once the session is discarded
// or its content replaced by a load, results from earlier calls are dropped
// instead of applied.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::catalog::BlockCatalog;
use crate::codegen::{self, EmitTarget};
use crate::composer::StrategyComposer;
use crate::models::{
    store_timestamp, BlockInstance, RiskSettings, StrategyDefinition, StrategyDraft, TargetMarket,
    TemplateRecord, Timeframe, TradingHours,
};
use crate::persistence::{StoreError, TemplateStore};
use crate::validation::{validate, Violation};

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("strategy has {} validation problem(s)", .0.len())]
    Invalid(Vec<Violation>),
    #[error("save failed: {0}")]
    Store(#[from] StoreError),
    #[error("session changed before the save completed")]
    Superseded,
}

/// Identity of a session's current content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken {
    pub session: Uuid,
    pub generation: u64,
}

/// Outcome of applying an async result to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Applied<T> {
    Current(T),
    /// The session moved on; the result was dropped
    Stale,
}

impl<T> Applied<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale)
    }

    pub fn current(self) -> Option<T> {
        match self {
            Applied::Current(value) => Some(value),
            Applied::Stale => None,
        }
    }
}

/// Top-level draft fields edited alongside the block list
#[derive(Debug, Clone, PartialEq)]
pub struct DraftDetails {
    pub name: String,
    pub description: String,
    pub target_market: TargetMarket,
    pub timeframe: Timeframe,
    pub risk: RiskSettings,
    pub paper_trading: bool,
    pub initial_balance: f64,
    pub trading_hours: TradingHours,
}

impl DraftDetails {
    fn from_draft(draft: StrategyDraft) -> Self {
        Self {
            name: draft.name,
            description: draft.description,
            target_market: draft.target_market,
            timeframe: draft.timeframe,
            risk: draft.risk,
            paper_trading: draft.paper_trading,
            initial_balance: draft.initial_balance,
            trading_hours: draft.trading_hours,
        }
    }

    fn with_blocks(&self, blocks: Vec<BlockInstance>) -> StrategyDraft {
        StrategyDraft {
            name: self.name.clone(),
            description: self.description.clone(),
            target_market: self.target_market,
            timeframe: self.timeframe,
            blocks,
            risk: self.risk,
            paper_trading: self.paper_trading,
            initial_balance: self.initial_balance,
            trading_hours: self.trading_hours,
        }
    }
}

impl Default for DraftDetails {
    fn default() -> Self {
        Self::from_draft(StrategyDraft::default())
    }
}

/// Persisted record the session content came from
#[derive(Debug, Clone, PartialEq)]
struct Origin {
    id: String,
    created_at: DateTime<Utc>,
}

/// A validated snapshot ready to be written; independent of later edits
#[derive(Debug, Clone)]
pub struct PendingSave {
    token: SessionToken,
    record: TemplateRecord,
}

impl PendingSave {
    pub fn record(&self) -> &TemplateRecord {
        &self.record
    }

    pub async fn submit<S: TemplateStore>(self, store: &S) -> SaveReceipt {
        let result = store.save(self.record).await;
        SaveReceipt {
            token: self.token,
            result,
        }
    }
}

#[derive(Debug)]
pub struct SaveReceipt {
    token: SessionToken,
    result: Result<TemplateRecord, StoreError>,
}

#[derive(Debug, Clone)]
pub struct LoadTicket {
    token: SessionToken,
    id: String,
}

impl LoadTicket {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn fetch<S: TemplateStore>(self, store: &S) -> LoadReceipt {
        let result = store.load(&self.id).await;
        LoadReceipt {
            token: self.token,
            result,
        }
    }
}

#[derive(Debug)]
pub struct LoadReceipt {
    token: SessionToken,
    result: Result<TemplateRecord, StoreError>,
}

/// Exclusive editing state for one strategy
#[derive(Debug)]
pub struct EditingSession<'c> {
    owner_id: String,
    pub is_public: bool,
    details: DraftDetails,
    composer: StrategyComposer<'c>,
    origin: Option<Origin>,
    token: SessionToken,
    target: EmitTarget,
}

impl<'c> EditingSession<'c> {
    pub fn new(catalog: &'c BlockCatalog, owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            is_public: false,
            details: DraftDetails::default(),
            composer: StrategyComposer::new(catalog),
            origin: None,
            token: SessionToken {
                session: Uuid::new_v4(),
                generation: 0,
            },
            target: EmitTarget::default(),
        }
    }

    /// Start from an existing draft (e.g. a JSON file); block ids are renumbered
    pub fn from_draft(catalog: &'c BlockCatalog, owner_id: impl Into<String>, draft: StrategyDraft) -> Self {
        let mut session = Self::new(catalog, owner_id);
        session.composer = StrategyComposer::from_blocks(catalog, draft.blocks.clone());
        session.details = DraftDetails::from_draft(draft);
        session
    }

    pub fn with_target(mut self, target: EmitTarget) -> Self {
        self.target = target;
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    /// Id of the persisted record this session writes to, if any
    pub fn record_id(&self) -> Option<&str> {
        self.origin.as_ref().map(|o| o.id.as_str())
    }

    pub fn details(&self) -> &DraftDetails {
        &self.details
    }

    pub fn details_mut(&mut self) -> &mut DraftDetails {
        &mut self.details
    }

    pub fn composer(&self) -> &StrategyComposer<'c> {
        &self.composer
    }

    pub fn composer_mut(&mut self) -> &mut StrategyComposer<'c> {
        &mut self.composer
    }

    pub fn draft(&self) -> StrategyDraft {
        self.details.with_blocks(self.composer.snapshot())
    }

    pub fn validate(&self) -> Result<StrategyDefinition, Vec<Violation>> {
        validate(self.composer.catalog(), &self.draft())
    }

    pub fn emit(&self) -> Result<String, Vec<Violation>> {
        let definition = self.validate()?;
        Ok(codegen::emit(&definition, self.target))
    }

    /// Validate, emit and snapshot the current content.
    ///
    /// Fails with every violation and makes no store call when invalid.
    pub fn prepare_save(&self) -> Result<PendingSave, SaveError> {
        let definition = self.validate().map_err(SaveError::Invalid)?;
        let code = codegen::emit(&definition, self.target);

        let created_at = match &self.origin {
            Some(origin) => origin.created_at,
            None => store_timestamp(),
        };
        let mut record = TemplateRecord::from_definition(
            &self.owner_id,
            &definition,
            code,
            self.is_public,
            created_at,
        );
        if let Some(origin) = &self.origin {
            record.id = origin.id.clone();
        }

        Ok(PendingSave {
            token: self.token,
            record,
        })
    }

    /// Apply a finished save. Results from an earlier generation are dropped.
    pub fn apply_save(&mut self, receipt: SaveReceipt) -> Result<Applied<TemplateRecord>, SaveError> {
        if receipt.token != self.token {
            tracing::warn!(
                "Dropping save result for generation {} (session is at {})",
                receipt.token.generation,
                self.token.generation
            );
            return Ok(Applied::Stale);
        }

        let record = receipt.result?;
        self.origin = Some(Origin {
            id: record.id.clone(),
            created_at: record.created_at,
        });

        tracing::info!("Saved strategy {} as template {}", record.name, record.id);

        Ok(Applied::Current(record))
    }

    /// prepare -> submit -> apply in one call
    pub async fn save<S: TemplateStore>(&mut self, store: &S) -> Result<TemplateRecord, SaveError> {
        let pending = self.prepare_save()?;
        let receipt = pending.submit(store).await;
        self.apply_save(receipt)?
            .current()
            .ok_or(SaveError::Superseded)
    }

    pub fn begin_load(&self, id: impl Into<String>) -> LoadTicket {
        LoadTicket {
            token: self.token,
            id: id.into(),
        }
    }

    /// Replace the session content with a fetched record.
    ///
    /// Another owner's public record becomes a private copy owned by this
    /// session; their private records are refused.
    pub fn apply_load(&mut self, receipt: LoadReceipt) -> Result<Applied<TemplateRecord>, StoreError> {
        if receipt.token != self.token {
            tracing::warn!(
                "Dropping load result for generation {} (session is at {})",
                receipt.token.generation,
                self.token.generation
            );
            return Ok(Applied::Stale);
        }

        let record = receipt.result?;
        if !record.is_visible_to(&self.owner_id) {
            return Err(StoreError::PermissionDenied(format!(
                "template {} is private to its owner",
                record.id
            )));
        }

        self.composer = StrategyComposer::from_blocks(self.composer.catalog(), record.blocks.clone());
        self.details = DraftDetails::from_draft(record.to_draft());
        if record.owner_id == self.owner_id {
            self.origin = Some(Origin {
                id: record.id.clone(),
                created_at: record.created_at,
            });
            self.is_public = record.is_public;
        } else {
            self.origin = None;
            self.is_public = false;
        }
        // Content replaced: in-flight results for the old content no longer apply
        self.token.generation += 1;

        tracing::info!(
            "Loaded template {} into session (generation {})",
            record.id,
            self.token.generation
        );

        Ok(Applied::Current(record))
    }

    /// Delete one of this owner's templates
    pub async fn delete<S: TemplateStore>(&mut self, store: &S, id: &str) -> Result<(), StoreError> {
        let record = store.load(id).await?;
        if record.owner_id != self.owner_id {
            return Err(StoreError::PermissionDenied(format!(
                "template {} belongs to another owner",
                id
            )));
        }

        store.delete(id).await?;
        if self.record_id() == Some(id) {
            self.origin = None;
        }
        Ok(())
    }

    /// Abandon the current content; every in-flight result becomes stale
    pub fn discard(&mut self) {
        self.token.generation += 1;
        self.composer.clear();
        self.details = DraftDetails::default();
        self.origin = None;
        self.is_public = false;

        tracing::debug!("Discarded session content (generation {})", self.token.generation);
    }
}
