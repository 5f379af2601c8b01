//! Paced, failure-isolating batch loop over the configured instruments.

use std::sync::Arc;

use quotesync_warehouse::SyncLogRecord;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::fetcher::QuoteFetcher;
use crate::gateway::PersistenceGateway;
use crate::negotiator::SessionNegotiator;
use crate::pacing::PacingGate;
use crate::session::Session;
use crate::{IngestError, InstrumentBatch, QuoteRecord, Symbol, UtcDateTime};

/// Terminal state of one instrument within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InstrumentOutcome {
    /// Fetched successfully. `persisted` is false when the store rejected the row.
    Saved { persisted: bool },
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstrumentReport {
    pub symbol: Symbol,
    #[serde(flatten)]
    pub outcome: InstrumentOutcome,
}

/// Summary of one [`IngestionOrchestrator::run`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: UtcDateTime,
    pub finished_at: UtcDateTime,
    pub outcomes: Vec<InstrumentReport>,
}

impl RunReport {
    pub fn saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|report| matches!(report.outcome, InstrumentOutcome::Saved { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.saved()
    }

    pub fn skipped_symbols(&self) -> Vec<&Symbol> {
        self.outcomes
            .iter()
            .filter(|report| matches!(report.outcome, InstrumentOutcome::Skipped { .. }))
            .map(|report| &report.symbol)
            .collect()
    }

    pub fn outcome_for(&self, symbol: &str) -> Option<&InstrumentOutcome> {
        self.outcomes
            .iter()
            .find(|report| report.symbol.as_str() == symbol)
            .map(|report| &report.outcome)
    }

    /// Audit rows for the warehouse `sync_log` table, in batch order.
    pub fn sync_log_records(&self) -> Vec<SyncLogRecord> {
        self.outcomes
            .iter()
            .map(|report| match &report.outcome {
                InstrumentOutcome::Saved { persisted } => SyncLogRecord {
                    ticker_symbol: report.symbol.to_string(),
                    status: String::from("saved"),
                    detail: (!persisted).then(|| String::from("fetched but not persisted")),
                },
                InstrumentOutcome::Skipped { reason } => SyncLogRecord {
                    ticker_symbol: report.symbol.to_string(),
                    status: String::from("skipped"),
                    detail: Some(reason.clone()),
                },
            })
            .collect()
    }
}

/// Drives one batch: `NO_SESSION -> SESSION_READY -> FETCHING -> SAVED | SKIPPED`.
///
/// Instruments are processed strictly one at a time. Each instrument waits on
/// the pacing gate before any provider request, re-negotiation included, so
/// skipped instruments are spaced like saved ones; the single retry after
/// re-negotiation waits once more. The session is owned here and lent to the
/// fetcher.
pub struct IngestionOrchestrator {
    negotiator: SessionNegotiator,
    fetcher: QuoteFetcher,
    gateway: Arc<dyn PersistenceGateway>,
    pacing: Box<dyn PacingGate>,
    session: Session,
}

impl IngestionOrchestrator {
    pub fn new(
        negotiator: SessionNegotiator,
        fetcher: QuoteFetcher,
        gateway: Arc<dyn PersistenceGateway>,
        pacing: Box<dyn PacingGate>,
    ) -> Self {
        Self {
            negotiator,
            fetcher,
            gateway,
            pacing,
            session: Session::empty(),
        }
    }

    /// Start from existing session material instead of negotiating.
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Process every instrument of `batch`.
    ///
    /// Only a failed negotiation before the first instrument is returned as
    /// an error. Every later failure is recorded as a skip, so a run in which
    /// every instrument was skipped still returns `Ok`.
    pub async fn run(&mut self, batch: &InstrumentBatch) -> Result<RunReport, IngestError> {
        let run_id = Uuid::new_v4();
        let started_at = UtcDateTime::now();
        info!(%run_id, instruments = batch.len(), "sync run started");

        if !self.session.is_ready() {
            self.session = self.negotiator.negotiate().await?;
        }

        let mut outcomes = Vec::with_capacity(batch.len());
        for symbol in batch.iter() {
            let outcome = self.process(symbol).await;
            match &outcome {
                InstrumentOutcome::Saved { persisted } => {
                    info!(ticker = %symbol, persisted, "instrument saved");
                }
                InstrumentOutcome::Skipped { reason } => {
                    warn!(ticker = %symbol, reason = %reason, "instrument skipped");
                }
            }
            outcomes.push(InstrumentReport {
                symbol: symbol.clone(),
                outcome,
            });
        }

        let report = RunReport {
            run_id,
            started_at,
            finished_at: UtcDateTime::now(),
            outcomes,
        };
        info!(
            %run_id,
            saved = report.saved(),
            skipped = report.skipped(),
            "sync run finished"
        );
        Ok(report)
    }

    async fn process(&mut self, symbol: &Symbol) -> InstrumentOutcome {
        self.pacing.wait_turn().await;
        if !self.session.is_ready() {
            if let Err(e) = self.renegotiate().await {
                return skipped(&e);
            }
        }

        match self.fetcher.fetch_quote(symbol, &self.session).await {
            Ok(record) => self.save(&record).await,
            Err(e) if e.is_auth_failure() => {
                warn!(ticker = %symbol, error = %e, "session rejected; renegotiating");
                self.session.invalidate();
                self.pacing.wait_turn().await;
                if let Err(e) = self.renegotiate().await {
                    return skipped(&e);
                }
                match self.fetcher.fetch_quote(symbol, &self.session).await {
                    Ok(record) => self.save(&record).await,
                    Err(e) => skipped(&e),
                }
            }
            Err(e) => skipped(&e),
        }
    }

    async fn save(&self, record: &QuoteRecord) -> InstrumentOutcome {
        let persisted = self.gateway.upsert(record).await;
        InstrumentOutcome::Saved { persisted }
    }

    async fn renegotiate(&mut self) -> Result<(), IngestError> {
        match self.negotiator.negotiate().await {
            Ok(session) => {
                self.session = session;
                Ok(())
            }
            Err(e) => {
                self.session.invalidate();
                Err(e)
            }
        }
    }
}

fn skipped(error: &IngestError) -> InstrumentOutcome {
    InstrumentOutcome::Skipped {
        reason: error.to_string(),
    }
}
