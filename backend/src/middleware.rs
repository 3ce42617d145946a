use std::future::{Future, Ready, ready};
use std::time::Duration;

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use store::LedgerError;

use crate::error::ApiError;

/// Per-request time budget registered as app data.
#[derive(Debug, Clone, Copy)]
pub struct RequestTimeout(pub Duration);

impl Default for RequestTimeout {
    fn default() -> Self {
        Self(Duration::from_secs(30))
    }
}

/// Deadline for the current request.
///
/// Running a ledger call through [`Deadline::run`] bounds it by the configured
/// [`RequestTimeout`]. On expiry the call's future is dropped, and with it any
/// open database transaction, which rolls back.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    budget: Duration,
}

impl Deadline {
    pub async fn run<F, T>(&self, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, LedgerError>>,
    {
        match tokio::time::timeout(self.budget, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::DeadlineExceeded),
        }
    }
}

impl FromRequest for Deadline {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let RequestTimeout(budget) = req
            .app_data::<RequestTimeout>()
            .copied()
            .unwrap_or_default();
        ready(Ok(Deadline { budget }))
    }
}
