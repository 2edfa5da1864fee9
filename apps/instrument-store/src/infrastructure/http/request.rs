//! HTTP request extractors and query parameters.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::Deserialize;

use crate::error::ServiceError;

/// JSON body extractor whose rejections use the API's error shape.
///
/// Malformed bodies, unknown content types and missing fields all become a
/// `400 {"error": "..."}` instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ServiceError::validation(rejection.body_text()))?;
        Ok(Self(value))
    }
}

/// Query parameters of the instrument listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstrumentFilter {
    /// Only instruments of this category.
    #[serde(rename = "idCategoria")]
    pub category_id: Option<String>,
}
