use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{AccountNumber, HistoryFilter, Money},
    error::{ApiException, ErrorCode},
    protocol::{
        AuthResponse, DashboardResponse, DashboardUser, ErrorBody, HistoryPage, LoginRequest,
        RecipientRequest, RecipientResponse, RegisterRequest, SetPinRequest, TransferRequest,
        TransferResponse, UserProfile,
    },
};
use tracing::info;

use crate::{
    session::SessionStore,
    transfer::{TransferOrder, TransferOutcome},
    AccountService,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the AcuPay backend. Carries the bearer token from the
/// injected [`SessionStore`]; every request has a timeout, and a timeout is
/// reported as a normal failure, never as success.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

#[derive(Serialize)]
struct HistoryQuery<'a> {
    filter: &'a str,
    limit: u32,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Arc<SessionStore>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        let base_url: String = base_url.into();
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    async fn bearer(&self) -> Result<String, ApiException> {
        self.session.token().await.ok_or_else(|| {
            ApiException::new(ErrorCode::Unauthorized, "no session token, please login")
        })
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiException> {
        let response = self
            .http
            .post(format!("{}/user/register", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(request_error)?;
        let body: AuthResponse = decode(response).await?;
        info!(account = %body.user.account_number, "registered user");
        Ok(body.user)
    }

    /// Logs in and stores the issued token in the session store.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ApiException> {
        let response = self
            .http
            .post(format!("{}/user/login", self.base_url))
            .json(&LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .send()
            .await
            .map_err(request_error)?;
        let body: AuthResponse = decode(response).await?;
        self.session.begin(body.user.token.clone()).await;
        info!(account = %body.user.account_number, "logged in");
        Ok(body.user)
    }

    pub async fn logout(&self) {
        self.session.end().await;
    }

    pub async fn dashboard(&self) -> Result<DashboardUser, ApiException> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(format!("{}/user/dashboard", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(request_error)?;
        let body: DashboardResponse = decode(response).await?;
        Ok(body.user)
    }

    /// Updates the transaction PIN on the backend.
    pub async fn set_pin(&self, pin: &str) -> Result<(), ApiException> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(format!("{}/user/set/setpin", self.base_url))
            .bearer_auth(token)
            .json(&SetPinRequest {
                tran_pin: pin.to_owned(),
            })
            .send()
            .await
            .map_err(request_error)?;
        decode::<serde_json::Value>(response).await?;
        Ok(())
    }

    /// Fetches a page of transaction history. `limit` of zero means no limit,
    /// matching the backend.
    pub async fn transaction_history(
        &self,
        filter: HistoryFilter,
        limit: u32,
    ) -> Result<HistoryPage, ApiException> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(format!("{}/user/transaction/history", self.base_url))
            .bearer_auth(token)
            .query(&HistoryQuery {
                filter: filter.as_query_value(),
                limit,
            })
            .send()
            .await
            .map_err(request_error)?;
        decode(response).await
    }
}

#[async_trait]
impl AccountService for ApiClient {
    async fn resolve_recipient_name(
        &self,
        account: &AccountNumber,
    ) -> Result<String, ApiException> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(format!("{}/user/recipient", self.base_url))
            .bearer_auth(token)
            .json(&RecipientRequest {
                account_number: account.as_str().to_owned(),
            })
            .send()
            .await
            .map_err(request_error)?;
        let body: RecipientResponse = decode(response).await?;
        Ok(body.name)
    }

    async fn transfer(&self, order: &TransferOrder) -> Result<TransferOutcome, ApiException> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(format!("{}/user/transaction", self.base_url))
            .bearer_auth(token)
            .json(&TransferRequest {
                amount: order.amount.as_major_f64(),
                to_account_number: order.recipient.as_str().to_owned(),
                tran_description: order.description.clone(),
                tran_pin: order.pin.clone(),
            })
            .send()
            .await
            .map_err(request_error)?;
        let body: TransferResponse = decode(response).await?;
        Ok(TransferOutcome {
            new_balance: Money::from_major_f64(body.balance),
            transaction: body.transaction,
        })
    }

    async fn balance(&self) -> Result<Money, ApiException> {
        let user = self.dashboard().await?;
        Ok(Money::from_major_f64(user.balance))
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiException> {
    let status = response.status();
    if status.is_success() {
        response.json::<T>().await.map_err(|err| {
            ApiException::new(ErrorCode::Service, format!("invalid response body: {err}"))
        })
    } else {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => format!("request failed with status {status}"),
        };
        Err(ApiException::new(classify(status, &message), message))
    }
}

/// Maps a backend failure onto the error taxonomy. The backend only sends a
/// message envelope, so beyond the status code this goes by message content.
fn classify(status: StatusCode, message: &str) -> ErrorCode {
    if status == StatusCode::UNAUTHORIZED {
        return ErrorCode::Unauthorized;
    }
    if status == StatusCode::NOT_FOUND {
        return ErrorCode::NotFound;
    }
    let lowered = message.to_ascii_lowercase();
    if lowered.contains("insufficient") {
        ErrorCode::InsufficientFunds
    } else if lowered.contains("pin") {
        ErrorCode::InvalidPin
    } else if lowered.contains("recipient") || lowered.contains("account") {
        ErrorCode::InvalidRecipient
    } else if status == StatusCode::BAD_REQUEST {
        ErrorCode::Validation
    } else {
        ErrorCode::Service
    }
}

fn request_error(err: reqwest::Error) -> ApiException {
    if err.is_timeout() {
        ApiException::new(ErrorCode::Service, "request timed out")
    } else {
        ApiException::new(ErrorCode::Service, format!("request failed: {err}"))
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
