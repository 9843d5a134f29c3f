use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use shared::{
    domain::{AccountNumber, Money},
    error::ApiException,
    protocol::TransactionRecord,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    time::Instant,
};
use tracing::{info, warn};

use crate::{session::SessionStore, AccountService};

/// Leading-edge throttle window for recipient lookups: the first edit in a
/// window is evaluated immediately, later edits are coalesced and the latest
/// value is evaluated once when the window elapses.
pub const LOOKUP_THROTTLE_WINDOW: Duration = Duration::from_millis(500);

/// The in-progress, not-yet-submitted transfer form state. The transaction
/// PIN lives in the [`SessionStore`], shared with the per-digit entry boxes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferDraft {
    pub amount_input: String,
    pub recipient_input: String,
    pub description: String,
}

/// A validated draft, ready to hand to the account service.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOrder {
    pub amount: Money,
    pub recipient: AccountNumber,
    pub description: String,
    pub pin: String,
}

/// Confirmation of a settled transfer: the server-reported balance and
/// transaction record. Immutable once created; discarded when the receipt
/// is dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub new_balance: Money,
    pub transaction: TransactionRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientLookupState {
    Idle,
    Loading,
    Resolved(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("account number must be exactly 14 alphanumeric characters (got \"{0}\")")]
    Recipient(String),
    #[error("amount must be a number of at least 1")]
    Amount,
    #[error("description is required")]
    Description,
    #[error("transaction PIN must be a 4-digit number")]
    Pin,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("a transfer is already being submitted")]
    AlreadySubmitting,
    /// The backend rejected the transfer; the message is surfaced verbatim.
    #[error("{}", .0.message)]
    Rejected(ApiException),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no receipt is open")]
    NoReceipt,
    #[error("failed to write receipt document: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    RecipientLookup(RecipientLookupState),
    BalanceUpdated(Money),
    TransferCompleted(TransferOutcome),
    TransferFailed(String),
    Error(String),
}

/// Checks the draft against the submission rules, in order, stopping at the
/// first failure. Pure: no I/O, independently testable.
pub fn validate_draft(draft: &TransferDraft, pin: &str) -> Result<TransferOrder, ValidationError> {
    let recipient = AccountNumber::parse(&draft.recipient_input)
        .map_err(|err| ValidationError::Recipient(err.0))?;
    let amount = Money::parse_input(&draft.amount_input).map_err(|_| ValidationError::Amount)?;
    if !amount.is_at_least_one_unit() {
        return Err(ValidationError::Amount);
    }
    let description = draft.description.trim();
    if description.is_empty() {
        return Err(ValidationError::Description);
    }
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::Pin);
    }
    Ok(TransferOrder {
        amount,
        recipient,
        description: description.to_owned(),
        pin: pin.to_owned(),
    })
}

struct TransferState {
    draft: TransferDraft,
    lookup: RecipientLookupState,
    // Only the response matching the latest issued sequence number may be
    // applied; superseded responses are discarded silently.
    lookup_seq: u64,
    throttle_deadline: Option<Instant>,
    trailing_scheduled: bool,
    submitting: bool,
    outcome: Option<TransferOutcome>,
    balance: Option<Money>,
}

/// Coordinates the money-transfer screen: recipient resolution with
/// latest-request-wins cancellation, draft validation, single-flight
/// submission, and receipt state. All mutation funnels through one lock;
/// completions of outstanding lookups interleave but never race it.
pub struct TransferWorkflow {
    service: Arc<dyn AccountService>,
    session: Arc<SessionStore>,
    inner: Mutex<TransferState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl TransferWorkflow {
    pub fn new(service: Arc<dyn AccountService>, session: Arc<SessionStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            service,
            session,
            inner: Mutex::new(TransferState {
                draft: TransferDraft::default(),
                lookup: RecipientLookupState::Idle,
                lookup_seq: 0,
                throttle_deadline: None,
                trailing_scheduled: false,
                submitting: false,
                outcome: None,
                balance: None,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn draft(&self) -> TransferDraft {
        self.inner.lock().await.draft.clone()
    }

    pub async fn lookup_state(&self) -> RecipientLookupState {
        self.inner.lock().await.lookup.clone()
    }

    pub async fn balance(&self) -> Option<Money> {
        self.inner.lock().await.balance
    }

    pub async fn is_submitting(&self) -> bool {
        self.inner.lock().await.submitting
    }

    pub async fn update_amount(&self, value: &str) {
        self.inner.lock().await.draft.amount_input = value.to_owned();
    }

    pub async fn update_description(&self, value: &str) {
        self.inner.lock().await.draft.description = value.to_owned();
    }

    /// Empties the draft and lookup state, discarding any in-flight lookup
    /// and open receipt. Called when the transfer screen is left.
    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.draft = TransferDraft::default();
        state.lookup = RecipientLookupState::Idle;
        state.lookup_seq += 1;
        state.outcome = None;
    }

    /// Stores the raw account-number input immediately (the field stays
    /// responsive), then runs the edit through the lookup throttle gate.
    /// Input that is not a well-formed account number clears any resolved
    /// name or lookup error and invalidates in-flight lookups.
    pub async fn update_recipient(self: &Arc<Self>, value: &str) {
        let fire_now = {
            let mut state = self.inner.lock().await;
            state.draft.recipient_input = value.to_owned();

            if AccountNumber::parse(value).is_err() {
                state.lookup_seq += 1;
                if state.lookup != RecipientLookupState::Idle {
                    state.lookup = RecipientLookupState::Idle;
                    let _ = self
                        .events
                        .send(WorkflowEvent::RecipientLookup(RecipientLookupState::Idle));
                }
            }

            let now = Instant::now();
            match state.throttle_deadline {
                Some(deadline) if now < deadline => {
                    if !state.trailing_scheduled {
                        state.trailing_scheduled = true;
                        let workflow = Arc::clone(self);
                        tokio::spawn(async move {
                            tokio::time::sleep_until(deadline).await;
                            workflow.fire_trailing_lookup().await;
                        });
                    }
                    false
                }
                _ => {
                    state.throttle_deadline = Some(now + LOOKUP_THROTTLE_WINDOW);
                    true
                }
            }
        };

        if fire_now {
            self.evaluate_lookup().await;
        }
    }

    async fn fire_trailing_lookup(self: Arc<Self>) {
        {
            let mut state = self.inner.lock().await;
            state.trailing_scheduled = false;
            state.throttle_deadline = Some(Instant::now() + LOOKUP_THROTTLE_WINDOW);
        }
        self.evaluate_lookup().await;
    }

    /// Evaluates the current input at throttle-fire time; only a well-formed
    /// account number starts a lookup.
    async fn evaluate_lookup(self: &Arc<Self>) {
        let (seq, account) = {
            let mut state = self.inner.lock().await;
            let Ok(account) = AccountNumber::parse(&state.draft.recipient_input) else {
                return;
            };
            state.lookup_seq += 1;
            state.lookup = RecipientLookupState::Loading;
            (state.lookup_seq, account)
        };
        let _ = self
            .events
            .send(WorkflowEvent::RecipientLookup(RecipientLookupState::Loading));

        let workflow = Arc::clone(self);
        tokio::spawn(async move {
            let result = workflow.service.resolve_recipient_name(&account).await;
            workflow.apply_lookup_result(seq, &account, result).await;
        });
    }

    async fn apply_lookup_result(
        &self,
        seq: u64,
        account: &AccountNumber,
        result: Result<String, ApiException>,
    ) {
        let next = {
            let mut state = self.inner.lock().await;
            if state.lookup_seq != seq {
                info!(account = %account, "recipient lookup superseded; discarding response");
                return;
            }
            let next = match result {
                Ok(name) => RecipientLookupState::Resolved(name),
                Err(err) => {
                    warn!(account = %account, "recipient lookup failed: {}", err.message);
                    RecipientLookupState::Failed(err.message)
                }
            };
            state.lookup = next.clone();
            next
        };
        let _ = self.events.send(WorkflowEvent::RecipientLookup(next));
    }

    /// Submits the draft. Exactly one service call per accepted submission;
    /// re-entrant submits are rejected while one is in flight, and an
    /// in-flight submission is never cancelled. Success clears the draft,
    /// PIN and resolved-recipient display and opens the receipt; failure
    /// preserves the draft untouched for correction and resubmission.
    pub async fn submit(&self) -> Result<TransferOutcome, TransferError> {
        let order = {
            let mut state = self.inner.lock().await;
            if state.submitting {
                return Err(TransferError::AlreadySubmitting);
            }
            let pin = self.session.pin().await;
            let order = validate_draft(&state.draft, &pin)?;
            state.submitting = true;
            order
        };

        info!(recipient = %order.recipient, amount = %order.amount, "submitting transfer");
        let result = self.service.transfer(&order).await;

        let mut state = self.inner.lock().await;
        state.submitting = false;
        match result {
            Ok(outcome) => {
                state.draft = TransferDraft::default();
                state.lookup = RecipientLookupState::Idle;
                state.lookup_seq += 1;
                state.balance = Some(outcome.new_balance);
                state.outcome = Some(outcome.clone());
                drop(state);
                self.session.clear_pin().await;
                info!(
                    reference = %outcome.transaction.transaction_ref,
                    "transfer settled"
                );
                let _ = self
                    .events
                    .send(WorkflowEvent::TransferCompleted(outcome.clone()));
                Ok(outcome)
            }
            Err(err) => {
                drop(state);
                warn!(code = ?err.code, "transfer rejected: {}", err.message);
                let _ = self
                    .events
                    .send(WorkflowEvent::TransferFailed(err.message.clone()));
                Err(TransferError::Rejected(err))
            }
        }
    }

    /// Refreshes the available balance shown above the form. Failures leave
    /// the draft untouched.
    pub async fn refresh_balance(&self) -> Result<Money, ApiException> {
        match self.service.balance().await {
            Ok(balance) => {
                self.inner.lock().await.balance = Some(balance);
                let _ = self.events.send(WorkflowEvent::BalanceUpdated(balance));
                Ok(balance)
            }
            Err(err) => {
                let _ = self.events.send(WorkflowEvent::Error(format!(
                    "failed to refresh balance: {}",
                    err.message
                )));
                Err(err)
            }
        }
    }

    /// The receipt for the last settled transfer, if still open.
    pub async fn receipt(&self) -> Option<TransferOutcome> {
        self.inner.lock().await.outcome.clone()
    }

    pub async fn dismiss_receipt(&self) {
        self.inner.lock().await.outcome = None;
    }

    /// Best-effort export of the open receipt to a text document. Failure is
    /// cosmetic: the transfer already settled server-side and the receipt
    /// stays open.
    pub async fn export_receipt(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let outcome = self
            .inner
            .lock()
            .await
            .outcome
            .clone()
            .ok_or(ExportError::NoReceipt)?;
        let path = dir.join(format!(
            "Transaction_Receipt_{}.txt",
            outcome.transaction.transaction_ref
        ));
        std::fs::write(&path, render_receipt(&outcome))?;
        info!(path = %path.display(), "receipt exported");
        Ok(path)
    }
}

fn render_receipt(outcome: &TransferOutcome) -> String {
    let transaction = &outcome.transaction;
    format!(
        "AcuPay Transaction Receipt\n\
         ==========================\n\
         Status: Transaction Successful\n\
         Amount: {}\n\
         Recipient: {} ({})\n\
         Description: {}\n\
         Transaction Reference: {}\n\
         Date: {}\n\
         New Balance: {}\n",
        Money::from_major_f64(transaction.amount),
        transaction.recipient_display(),
        transaction.to_account_number,
        transaction.description,
        transaction.transaction_ref,
        transaction.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        outcome.new_balance,
    )
}

#[cfg(test)]
#[path = "tests/transfer_tests.rs"]
mod tests;
