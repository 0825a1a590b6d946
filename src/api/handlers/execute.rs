use crate::api::handlers::ApiState;
use crate::api::types::{ErrorResponse, ExecuteRequest, ExecuteResponse};
use crate::session::{PromptSession, SessionFactory};
use crate::utils::error::WarmPoolError;
use axum::{extract::State, http::StatusCode, Json};
use std::time::Instant;
use tracing::{error, warn};

type ExecuteResult = Result<(StatusCode, Json<ExecuteResponse>), (StatusCode, Json<ErrorResponse>)>;

/// POST /api/execute - run a prompt on a pooled session
///
/// The session is always handed back to the pool, whether execution succeeded or not.
/// An exhausted or stopped pool answers 503 so callers can back off.
pub async fn execute_prompt<F>(
    State(state): State<ApiState<F>>,
    Json(request): Json<ExecuteRequest>,
) -> ExecuteResult
where
    F: SessionFactory,
    F::Session: PromptSession,
{
    if request.prompt.trim().is_empty() {
        let response = ErrorResponse::bad_request("prompt must not be empty");
        return Err((StatusCode::BAD_REQUEST, Json(response)));
    }

    // Checkout, execution and release run on their own task: axum drops this future
    // when the client disconnects, and the session must still go back to the pool.
    let pool = state.pool;
    let task = tokio::spawn(async move {
        let (session, entry_id) = pool.acquire_default().await?;

        let started = Instant::now();
        let outcome = session
            .execute(&request.prompt, request.agent.as_deref())
            .await;
        pool.release(&entry_id).await;

        Ok::<_, WarmPoolError>((outcome, entry_id, started.elapsed()))
    });

    let (outcome, entry_id, elapsed) = match task.await {
        Ok(Ok(checked_out)) => checked_out,
        Ok(Err(err)) => {
            warn!("Could not acquire a session: {}", err);
            let response = ErrorResponse::from(&err);
            return Err((response.status(), Json(response)));
        }
        Err(err) => {
            error!("Execute task failed: {}", err);
            let response = ErrorResponse::internal_error("Execute task failed");
            return Err((StatusCode::INTERNAL_SERVER_ERROR, Json(response)));
        }
    };

    match outcome {
        Ok(result) => Ok((
            StatusCode::OK,
            Json(ExecuteResponse {
                result,
                session_id: entry_id,
                duration_ms: elapsed.as_millis() as u64,
            }),
        )),
        Err(err) => {
            error!("Execution failed on session {}: {:#}", entry_id, err);
            let response = ErrorResponse::internal_error(format!("Execution failed: {}", err));
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(response)))
        }
    }
}
