use async_trait::async_trait;
use shared::{
    domain::{AccountNumber, Money},
    error::{ApiException, ErrorCode},
};

pub mod api;
pub mod session;
pub mod transfer;

pub use api::ApiClient;
pub use session::SessionStore;
pub use transfer::{
    validate_draft, ExportError, RecipientLookupState, TransferDraft, TransferError,
    TransferOrder, TransferOutcome, TransferWorkflow, ValidationError, WorkflowEvent,
};

/// The remote account operations the transfer workflow depends on. The real
/// implementation is [`ApiClient`]; tests substitute doubles.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Resolves the account holder's display name for a well-formed account
    /// number. Fails with `NotFound`/`InvalidRecipient` when the backend
    /// rejects it.
    async fn resolve_recipient_name(&self, account: &AccountNumber)
        -> Result<String, ApiException>;

    /// Executes a transfer. Distinct failures: `InsufficientFunds`,
    /// `InvalidPin`, `InvalidRecipient`, or a generic `Service` error.
    async fn transfer(&self, order: &TransferOrder) -> Result<TransferOutcome, ApiException>;

    /// Fetches the current available balance.
    async fn balance(&self) -> Result<Money, ApiException>;
}

/// Null object used before a backend is wired up.
pub struct MissingAccountService;

#[async_trait]
impl AccountService for MissingAccountService {
    async fn resolve_recipient_name(
        &self,
        account: &AccountNumber,
    ) -> Result<String, ApiException> {
        Err(ApiException::new(
            ErrorCode::Service,
            format!("account service unavailable; cannot resolve {account}"),
        ))
    }

    async fn transfer(&self, _order: &TransferOrder) -> Result<TransferOutcome, ApiException> {
        Err(ApiException::new(
            ErrorCode::Service,
            "account service unavailable; cannot transfer",
        ))
    }

    async fn balance(&self) -> Result<Money, ApiException> {
        Err(ApiException::new(
            ErrorCode::Service,
            "account service unavailable; cannot fetch balance",
        ))
    }
}
