use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::server::error::Error;

/// `Query<T>` that also runs the dto's validator rules, either failure is a 400
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value): Query<T> = Query::from_request_parts(parts, state)
            .await
            .map_err(|e| Error::BadRequest(e.body_text()))?;

        value
            .validate()
            .map_err(|e| Error::BadRequest(format!("Validation error: {}", e)))?;

        Ok(ValidatedQuery(value))
    }
}
