//! Request extractors that reject with the error envelope.

use access::{Actor, IdentityClaim, resolve_actor};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use tracing::trace;

use crate::error::ApiError;
use crate::schemas::AppState;

/// JSON body; malformed input becomes a 400 envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Path parameters; non-numeric ids become a 400 envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

/// Query string parameters.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);

/// The caller resolved from the identity headers, `None` when absent or stale.
/// Never rejects: authorization decisions belong to the lifecycle rules.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Option<Actor>);

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claim = IdentityClaim::from_headers(
            parts
                .headers
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
        );
        trace!(?claim, "Identity claim read from headers");

        let actor = resolve_actor(&state.db, claim).await?;
        Ok(CurrentActor(actor))
    }
}
