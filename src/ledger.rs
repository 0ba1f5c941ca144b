//! Reducer entry point and the persistent ledger
//!
//! [`dispatch`] is the single pure entry point: it takes the state by value,
//! applies one [`Command`] and returns the new state. [`Ledger`] wraps it for
//! an application: it loads and normalizes the document on open, persists the
//! whole document after every change, and applies newer documents from other
//! devices through the [`Replicator`].

use crate::model::{AppState, NewEvent, NewItem};
use crate::reconcile::{self, ScanCommand, ScanOutcome};
use crate::replication::Replicator;
use crate::slip::{self, SignOutcome, SignatureCommand};
use crate::stock;
use crate::store::StateStore;
use crate::GearError;
use chrono::Utc;
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// A user action that moves equipment or signs for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Scan(ScanCommand),
    Sign(SignatureCommand),
}

impl Command {
    #[must_use]
    pub fn event_id(&self) -> &str {
        match self {
            Command::Scan(cmd) => &cmd.event_id,
            Command::Sign(cmd) => &cmd.event_id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Scan(_) => "scan",
            Command::Sign(_) => "sign",
        }
    }
}

impl From<ScanCommand> for Command {
    fn from(cmd: ScanCommand) -> Self {
        Command::Scan(cmd)
    }
}

impl From<SignatureCommand> for Command {
    fn from(cmd: SignatureCommand) -> Self {
        Command::Sign(cmd)
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Scan(ScanOutcome),
    Sign(SignOutcome),
}

impl Outcome {
    /// Whether the state was modified.
    #[must_use]
    pub fn changed_state(&self) -> bool {
        !matches!(
            self,
            Outcome::Scan(ScanOutcome::UnknownEvent) | Outcome::Sign(SignOutcome::UnknownEvent)
        )
    }
}

/// Execute `command` against `state` in place.
pub fn execute(state: &mut AppState, command: &Command) -> Outcome {
    match command {
        Command::Scan(cmd) => Outcome::Scan(execute_scan(state, cmd)),
        Command::Sign(cmd) => Outcome::Sign(execute_sign(state, cmd)),
    }
}

fn execute_scan(state: &mut AppState, cmd: &ScanCommand) -> ScanOutcome {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("dispatch", command = "scan", event_id = %cmd.event_id).entered();

    let outcome = reconcile::apply_scan(state, cmd);
    #[cfg(feature = "metrics")]
    METRICS.record_scan(&outcome);
    outcome
}

fn execute_sign(state: &mut AppState, cmd: &SignatureCommand) -> SignOutcome {
    #[cfg(feature = "tracing")]
    let _span = tracing::debug_span!("dispatch", command = "sign", event_id = %cmd.event_id).entered();

    let outcome = slip::apply_signature(state, cmd);
    #[cfg(feature = "metrics")]
    METRICS.record_sign(&outcome);
    outcome
}

/// Apply `command` to `state` and return the new state.
#[must_use]
pub fn dispatch(mut state: AppState, command: &Command) -> AppState {
    execute(&mut state, command);
    state
}

/// Current state, its store and the replication guard.
#[derive(Debug)]
pub struct Ledger<S: StateStore> {
    store: S,
    state: AppState,
    replicator: Replicator,
}

impl<S: StateStore> Ledger<S> {
    /// Load and normalize the stored document; start empty when there is none.
    ///
    /// # Errors
    ///
    /// Returns `GearError` if the stored document cannot be loaded.
    pub fn open(store: S) -> Result<Self, GearError> {
        let state = store.load()?.map(AppState::normalized).unwrap_or_default();
        let mut replicator = Replicator::new();
        if let Some(at) = state.updated_at {
            replicator.record_local(at);
        }
        log::info!(
            "ledger opened with {} item(s) and {} event(s)",
            state.inventory.len(),
            state.events.len()
        );
        Ok(Self {
            store,
            state,
            replicator,
        })
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn into_state(self) -> AppState {
        self.state
    }

    /// Execute `command`, then persist if anything changed.
    ///
    /// # Errors
    ///
    /// Returns `GearError` if the document cannot be saved. The in-memory
    /// state keeps the change either way.
    pub fn apply(&mut self, command: &Command) -> Result<Outcome, GearError> {
        log::debug!("applying {} for event {}", command.kind(), command.event_id());
        let outcome = execute(&mut self.state, command);
        self.commit_if(outcome.changed_state())?;
        Ok(outcome)
    }

    /// Shorthand for applying a [`ScanCommand`].
    ///
    /// # Errors
    ///
    /// See [`Ledger::apply`].
    pub fn scan(&mut self, cmd: ScanCommand) -> Result<ScanOutcome, GearError> {
        let outcome = execute_scan(&mut self.state, &cmd);
        self.commit_if(outcome != ScanOutcome::UnknownEvent)?;
        Ok(outcome)
    }

    /// Shorthand for applying a [`SignatureCommand`].
    ///
    /// # Errors
    ///
    /// See [`Ledger::apply`].
    pub fn sign(&mut self, cmd: SignatureCommand) -> Result<SignOutcome, GearError> {
        let outcome = execute_sign(&mut self.state, &cmd);
        self.commit_if(outcome != SignOutcome::UnknownEvent)?;
        Ok(outcome)
    }

    /// Run a validated stock operation and persist on success.
    ///
    /// # Errors
    ///
    /// Returns the operation's error (state untouched), or a store error.
    pub fn update<T>(
        &mut self,
        op: impl FnOnce(&mut AppState) -> Result<T, GearError>,
    ) -> Result<T, GearError> {
        let value = op(&mut self.state)?;
        self.commit()?;
        Ok(value)
    }

    /// Create an inventory item. See [`stock::add_item`].
    ///
    /// # Errors
    ///
    /// `GearError::DuplicateBarcode`, or a store error.
    pub fn add_item(&mut self, new_item: NewItem) -> Result<String, GearError> {
        self.update(|state| stock::add_item(state, new_item))
    }

    /// Create an event. See [`stock::create_event`].
    ///
    /// # Errors
    ///
    /// Returns a store error.
    pub fn create_event(&mut self, new_event: NewEvent) -> Result<String, GearError> {
        self.update(|state| Ok(stock::create_event(state, new_event)))
    }

    /// Allocate equipment to an event. See [`stock::allocate`].
    ///
    /// # Errors
    ///
    /// `GearError::UnknownItem`, `GearError::UnknownEvent`, or a store error.
    pub fn allocate(&mut self, event_id: &str, item_id: &str, qty: u32) -> Result<u32, GearError> {
        self.update(|state| stock::allocate(state, event_id, item_id, qty))
    }

    /// Apply the newest remote document waiting on `feed`, if it is newer
    /// than the local one. Returns whether the state was replaced.
    pub fn sync_remote(&mut self, feed: &Receiver<AppState>) -> bool {
        match self.replicator.drain(feed) {
            Some(remote) => {
                log::info!("applied remote document stamped {:?}", remote.updated_at);
                self.state = remote.normalized();
                true
            }
            None => false,
        }
    }

    fn commit_if(&mut self, changed: bool) -> Result<(), GearError> {
        if changed {
            self.commit()
        } else {
            Ok(())
        }
    }

    fn commit(&mut self) -> Result<(), GearError> {
        let stamp = self.replicator.next_stamp(Utc::now());
        self.state.updated_at = Some(stamp);
        self.replicator.record_local(stamp);
        self.store.save(&self.state).map_err(|err| {
            log::warn!("failed to persist state: {}", err);
            err
        })
    }
}
