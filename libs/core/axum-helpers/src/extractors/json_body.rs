use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// `Json<T>` whose rejections are always `400` with the standard error body.
///
/// Axum answers a body that parses but does not match `T` with `422`; this
/// extractor folds every decode failure into `400 INVALID_JSON`.
///
/// ```ignore
/// async fn create(JsonBody(input): JsonBody<CreateTask>) -> Result<..., AppError> { ... }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}
