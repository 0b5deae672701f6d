//! Asynchronous spatial queries (AR hit-testing)
//!
//! A query is issued on the host thread and handed to the engine together
//! with a [`HitTestResponder`]. The engine may complete the responder from
//! any thread; completion travels back as a message over a channel, and the
//! [`QueryBridge`] delivers it to the caller's handler when the host drains
//! that channel. Each handler runs exactly once.


pub use hit_test::{HitResultKind, HitTestQuery, HitTestResult};

use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use slotmap::SlotMap;
use thiserror::Error;

use crate::foundation::collections::{InstanceId, QueryToken};

/// Why a query produced no result set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    /// The owning instance was destroyed while the query was outstanding
    #[error("query cancelled: engine instance destroyed")]
    Cancelled,

    /// The query itself was malformed
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The engine could not evaluate the query
    #[error("engine failure: {0}")]
    EngineFailure(String),
}

/// Result delivered to a hit-test handler; an empty set is a success
pub type HitTestOutcome = Result<Vec<HitTestResult>, QueryFailure>;

/// Caller-supplied completion handler
pub type HitTestHandler = Box<dyn FnOnce(HitTestOutcome) + Send + 'static>;

/// Message from the engine side back to the issuing side
#[derive(Debug)]
pub(crate) struct Completion {
    token: QueryToken,
    outcome: HitTestOutcome,
}

/// Engine-side half of one outstanding query
///
/// Completing consumes the responder, so an engine cannot answer a query
/// twice. Dropping it without completing reports an engine failure rather
/// than leaving the handler waiting.
#[derive(Debug)]
pub struct HitTestResponder {
    token: QueryToken,
    sender: Option<Sender<Completion>>,
}

impl HitTestResponder {
    /// Token identifying the query
    pub fn token(&self) -> QueryToken {
        self.token
    }

    /// Complete with `results`, ordered by ascending distance
    pub fn succeed(self, results: Vec<HitTestResult>) {
        self.complete(Ok(results));
    }

    /// Complete with an engine failure
    pub fn fail(self, reason: impl Into<String>) {
        self.complete(Err(QueryFailure::EngineFailure(reason.into())));
    }

    /// Complete with an explicit outcome
    ///
    /// Successful results are delivered nearest first.
    pub fn complete(mut self, mut outcome: HitTestOutcome) {
        if let Ok(results) = &mut outcome {
            results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        }
        self.send(outcome);
    }

    fn send(&mut self, outcome: HitTestOutcome) {
        if let Some(sender) = self.sender.take() {
            // The issuing side may already be gone; nothing is waiting then.
            let _ = sender.send(Completion {
                token: self.token,
                outcome,
            });
        }
    }
}

impl Drop for HitTestResponder {
    fn drop(&mut self) {
        if self.sender.is_some() {
            log::warn!("Hit-test responder dropped without completing; reporting failure");
            self.send(Err(QueryFailure::EngineFailure(
                "engine dropped the query without completing it".to_string(),
            )));
        }
    }
}

struct PendingQuery {
    instance: InstanceId,
    operation: &'static str,
    handler: HitTestHandler,
}

/// Issuing-side bookkeeping for outstanding queries
pub struct QueryBridge {
    pending: SlotMap<QueryToken, PendingQuery>,
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
}

impl QueryBridge {
    /// Create a bridge with no outstanding queries
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            pending: SlotMap::with_key(),
            sender,
            receiver,
        }
    }

    /// Record a new query and return the responder to hand to the engine
    pub fn issue(
        &mut self,
        instance: InstanceId,
        operation: &'static str,
        handler: HitTestHandler,
    ) -> HitTestResponder {
        let token = self.pending.insert(PendingQuery {
            instance,
            operation,
            handler,
        });
        log::debug!("Issued {operation} query {token:?}");
        HitTestResponder {
            token,
            sender: Some(self.sender.clone()),
        }
    }

    /// Number of queries awaiting completion
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Number of queries awaiting completion for `instance`
    pub fn pending_for(&self, instance: InstanceId) -> usize {
        self.pending
            .values()
            .filter(|query| query.instance == instance)
            .count()
    }

    /// Deliver completions that have already arrived
    ///
    /// At most `limit` handlers run; `0` means no limit. Returns the number
    /// of handlers run.
    pub fn drain(&mut self, limit: usize) -> usize {
        let mut delivered = 0;
        while limit == 0 || delivered < limit {
            let Ok(completion) = self.receiver.try_recv() else {
                break;
            };
            if self.deliver(completion) {
                delivered += 1;
            }
        }
        delivered
    }

    /// Block until at least one completion is delivered or `timeout` passes,
    /// then deliver whatever else has arrived
    pub fn wait(&mut self, timeout: Duration) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let deadline = Instant::now() + timeout;
        let mut delivered = 0;
        while delivered == 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    if self.deliver(completion) {
                        delivered += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }
        delivered + self.drain(0)
    }

    /// Complete every query of `instance` with [`QueryFailure::Cancelled`]
    ///
    /// Runs the handlers immediately. Completions the engine posts later for
    /// these queries are discarded.
    pub fn cancel_instance(&mut self, instance: InstanceId) -> usize {
        let tokens: Vec<QueryToken> = self
            .pending
            .iter()
            .filter(|(_, query)| query.instance == instance)
            .map(|(token, _)| token)
            .collect();

        for token in &tokens {
            if let Some(query) = self.pending.remove(*token) {
                log::debug!("Cancelling {} query {token:?}", query.operation);
                (query.handler)(Err(QueryFailure::Cancelled));
            }
        }
        tokens.len()
    }

    fn deliver(&mut self, completion: Completion) -> bool {
        let Completion { token, outcome } = completion;
        let Some(query) = self.pending.remove(token) else {
            log::debug!("Discarding completion for retired query {token:?}");
            return false;
        };

        match &outcome {
            Ok(results) => log::debug!(
                "{} query {token:?} completed with {} hit(s)",
                query.operation,
                results.len()
            ),
            Err(failure) => log::debug!("{} query {token:?} failed: {failure}", query.operation),
        }
        (query.handler)(outcome);
        true
    }
}

impl Default for QueryBridge {
    fn default() -> Self {
        Self::new()
    }
}
