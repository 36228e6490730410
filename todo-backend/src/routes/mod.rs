use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use todo_model::SIMULATE_ERROR_HEADER;

use crate::error::ApiError;

pub mod reference;
pub mod todos;

/// Whether the request carries `x-simulate-error: true`.
pub struct SimulatedError(pub bool);

impl SimulatedError {
    /// Fails with a 500 naming `operation` if the client asked for a failure.
    pub fn check(&self, operation: &'static str) -> Result<(), ApiError> {
        if self.0 {
            return Err(ApiError::Simulated(operation));
        }
        Ok(())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SimulatedError {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let requested = parts
            .headers
            .get(SIMULATE_ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));
        Ok(SimulatedError(requested))
    }
}

pub async fn health() -> &'static str {
    "ok"
}
