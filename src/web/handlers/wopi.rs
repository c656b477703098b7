//! Open-file endpoint

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::models::{Caller, OpenOutcome};
use crate::web::{AppState, extractors::OpenFileParams, extractors::RequestContext, responses::handle_error};

/// `GET <root>/api/v0/wopi/open?fileId=<b64>|filePath=<path>`
///
/// A denied open answers 200 with an empty body. The service logs the reason.
pub async fn open_file(
    State(state): State<AppState>,
    context: RequestContext,
    caller: Caller,
    Query(params): Query<OpenFileParams>,
) -> Response {
    let target = match params.into_target() {
        Ok(target) => target,
        Err(e) => return handle_error(e),
    };
    debug!(
        request_id = %context.request_id,
        user = %caller.principal.user_id,
        user_agent = context.user_agent.as_deref().unwrap_or("-"),
        client_ip = context.real_ip.as_deref().unwrap_or("-"),
        "Open request for {:?}",
        target
    );

    match state.wopi.open_file(target, &caller).await {
        Ok(OpenOutcome::Opened(result)) => (StatusCode::OK, Json(result)).into_response(),
        Ok(OpenOutcome::Denied(_)) => StatusCode::OK.into_response(),
        Err(e) => handle_error(e),
    }
}
