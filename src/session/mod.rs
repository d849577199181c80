use std::collections::HashMap;

use log::{debug, warn};
use rust_decimal::Decimal;

use crate::models::{Budget, Expense, ExpenseDraft, MonthKey};
use crate::overview::{aggregate, reconcile, OverviewModel};
use crate::store::{ExpenseStore, MonthSnapshot, StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadState {
    Idle,
    Loading,
    Ready,
    /// A fetch failed and there is no previous model to keep showing.
    Failed,
}

/// A fetch the caller must issue against the store. The sequence number is
/// the tag compared at completion time; month is carried for the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FetchRequest {
    pub(crate) seq: u64,
    pub(crate) month: MonthKey,
}

/// What a state transition did, for the caller's status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEvent {
    /// A fresh OverviewModel is available.
    Published,
    /// A completion arrived for a superseded selection and was dropped.
    DiscardedStale,
    /// The fetch failed but the previous model is retained on screen.
    FailedKeptLastGood,
    /// The fetch failed with nothing to fall back to.
    Failed,
}

/// Owns the only mutable state that needs discipline: the current selection
/// and the last published model, always updated together. Fetch results are
/// delivered through `complete_fetch`, which discards anything whose tag no
/// longer matches the latest issued request: last-selected wins, never
/// last-completed.
pub(crate) struct Session {
    month: MonthKey,
    seq: u64,
    state: LoadState,
    budget: Budget,
    model: Option<OverviewModel>,
    error: Option<String>,
    cache: HashMap<MonthKey, MonthSnapshot>,
}

impl Session {
    pub(crate) fn new(month: MonthKey) -> Session {
        Session {
            month,
            seq: 0,
            state: LoadState::Idle,
            budget: Budget::disabled(),
            model: None,
            error: None,
            cache: HashMap::new(),
        }
    }

    pub(crate) fn month(&self) -> MonthKey {
        self.month
    }

    /// Last good model, retained across later transient failures.
    pub(crate) fn model(&self) -> Option<&OverviewModel> {
        self.model.as_ref()
    }

    /// Current error, exposed independently of the model so the UI never has
    /// to discard good data over a transient failure.
    pub(crate) fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub(crate) fn state(&self) -> LoadState {
        self.state
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    /// Raw expense rows of the currently selected month, if cached.
    pub(crate) fn expenses(&self) -> &[Expense] {
        self.cache
            .get(&self.month)
            .map(|snap| snap.expenses.as_slice())
            .unwrap_or(&[])
    }

    /// Switch the selection. Returns the fetch to issue, or None when the
    /// month was served from cache and already published.
    pub(crate) fn select_month(&mut self, month: MonthKey) -> Option<FetchRequest> {
        self.month = month;
        self.error = None;
        if self.cache.contains_key(&month) {
            // Retire any in-flight fetch: its tag must not match anymore,
            // or its late completion would overwrite this publication.
            self.seq += 1;
            self.publish(month);
            self.state = LoadState::Ready;
            return None;
        }
        Some(self.begin_fetch(month))
    }

    /// Drop the current month's snapshot and re-fetch it. Used after every
    /// CRUD mutation: the remote rows changed under us.
    pub(crate) fn invalidate_current(&mut self) -> FetchRequest {
        self.cache.remove(&self.month);
        self.begin_fetch(self.month)
    }

    /// Drop a cached month without touching the selection. Used when a
    /// mutation lands in a month other than the one on screen.
    pub(crate) fn invalidate(&mut self, month: MonthKey) {
        self.cache.remove(&month);
    }

    /// Deliver a completed fetch. Results tagged with anything but the
    /// latest issued sequence number are discarded.
    pub(crate) fn complete_fetch(
        &mut self,
        request: FetchRequest,
        result: StoreResult<MonthSnapshot>,
    ) -> SessionEvent {
        if request.seq != self.seq {
            debug!(
                "discarding stale result #{} for {} (latest is #{})",
                request.seq, request.month, self.seq
            );
            return SessionEvent::DiscardedStale;
        }
        match result {
            Ok(snapshot) => {
                if let Some(payload) = &snapshot.payload {
                    match Budget::new(payload.budget) {
                        Ok(budget) => self.budget = budget,
                        Err(e) => warn!("ignoring budget from store: {e}"),
                    }
                }
                self.cache.insert(request.month, snapshot);
                self.state = LoadState::Ready;
                self.error = None;
                self.publish(request.month);
                SessionEvent::Published
            }
            Err(e) => {
                self.error = Some(e.to_string());
                if self.model.is_some() {
                    // Stale-but-valid grace period: keep the previous model.
                    self.state = LoadState::Ready;
                    SessionEvent::FailedKeptLastGood
                } else {
                    self.state = LoadState::Failed;
                    SessionEvent::Failed
                }
            }
        }
    }

    /// Budget already persisted remotely; adopt it and re-aggregate the
    /// current month from cache. No re-fetch: the expense set did not change.
    pub(crate) fn apply_budget(&mut self, budget: Budget) {
        self.budget = budget;
        if self.cache.contains_key(&self.month) {
            self.publish(self.month);
        }
    }

    fn begin_fetch(&mut self, month: MonthKey) -> FetchRequest {
        self.seq += 1;
        self.state = LoadState::Loading;
        debug!("issuing fetch #{} for {month}", self.seq);
        FetchRequest {
            seq: self.seq,
            month,
        }
    }

    fn publish(&mut self, month: MonthKey) {
        let Some(snapshot) = self.cache.get(&month) else {
            return;
        };
        let mut model = aggregate(
            month,
            &snapshot.expenses,
            &snapshot.summary,
            self.budget.amount(),
        );
        if let Some(payload) = &snapshot.payload {
            model = reconcile(model, payload);
        }
        if let Some(gap) = model.integrity_gap {
            warn!("store total for {month} differs from derived rows by {gap}");
        }
        self.model = Some(model);
    }
}

// ── Budget configuration / mutations ─────────────────────────
//
// The write path: validate locally, persist through the store, then tell the
// session what changed. Callers issue any returned FetchRequest on a worker.

pub(crate) fn set_budget(
    store: &dyn ExpenseStore,
    session: &mut Session,
    amount: Decimal,
) -> StoreResult<()> {
    let budget = Budget::new(amount).map_err(StoreError::Validation)?;
    store.set_user_budget(budget.amount())?;
    session.apply_budget(budget);
    Ok(())
}

pub(crate) fn create_expense(
    store: &dyn ExpenseStore,
    session: &mut Session,
    draft: &ExpenseDraft,
) -> StoreResult<FetchRequest> {
    store.create_expense(draft)?;
    // The expense may have landed in a month other than the one on screen.
    session.invalidate(MonthKey::of(draft.occurred_on));
    Ok(session.invalidate_current())
}

pub(crate) fn update_expense(
    store: &dyn ExpenseStore,
    session: &mut Session,
    id: &str,
    draft: &ExpenseDraft,
) -> StoreResult<FetchRequest> {
    store.update_expense(id, draft)?;
    session.invalidate(MonthKey::of(draft.occurred_on));
    Ok(session.invalidate_current())
}

pub(crate) fn delete_expense(
    store: &dyn ExpenseStore,
    session: &mut Session,
    id: &str,
) -> StoreResult<FetchRequest> {
    store.delete_expense(id)?;
    Ok(session.invalidate_current())
}
