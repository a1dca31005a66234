use std::sync::Arc;

use axum::{Json, Router};
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::routing::{get, post};

use idol_api::{ApiError, FaceMesh, RecordingStatus, SetFaceResponse, TriggerResponse};
use idol_bake::{BakeError, Trigger};

use crate::tracking::{log_trigger, trigger_response, Baker};

pub struct ApiState {
    baker: Baker,
}

impl ApiState {
    pub fn new(baker: Baker) -> Arc<Self> {
        Arc::new(Self {
            baker,
        })
    }
}

fn api_error(err: BakeError) -> ApiError {
    let message = err.to_string();
    match err {
        BakeError::NoTrackedMesh => ApiError::failed_precondition("noTrackedMesh", message),
        BakeError::InvalidGeometry(_) => ApiError::invalid_argument("invalidGeometry", message),
        BakeError::TopologyMismatch { .. } => ApiError::failed_precondition("topologyMismatch", message),
        BakeError::AlreadyRecording => ApiError::failed_precondition("alreadyRecording", message),
        BakeError::NotRecording => ApiError::failed_precondition("notRecording", message),
        BakeError::NothingToFinish => ApiError::failed_precondition("nothingToFinish", message),
        BakeError::Sink(_) => ApiError::unknown(message),
    }
}

async fn post_face(
    State(state): State<Arc<ApiState>>,
    Json(mesh): Json<FaceMesh>,
) -> Result<Json<SetFaceResponse>, ApiError> {
    state.baker.face_acquired(mesh).map_err(api_error)?;
    Ok(Json(SetFaceResponse { acquired: true }))
}

async fn put_face(
    State(state): State<Arc<ApiState>>,
    Json(mesh): Json<FaceMesh>,
) -> Result<Json<SetFaceResponse>, ApiError> {
    let acquired = state.baker.face_updated(mesh).map_err(api_error)?;
    Ok(Json(SetFaceResponse { acquired }))
}

async fn delete_face(State(state): State<Arc<ApiState>>) -> StatusCode {
    state.baker.face_lost();
    StatusCode::NO_CONTENT
}

async fn run_trigger(state: &ApiState, trigger: Trigger) -> Result<Json<TriggerResponse>, ApiError> {
    // Finishing writes the asset to disk.
    let baker = state.baker.clone();
    let result = tokio::task::spawn_blocking(move || baker.trigger(trigger))
        .await
        .map_err(|err| ApiError::unknown(err.to_string()))?;
    log_trigger(trigger, &result);
    Ok(Json(trigger_response(result.map_err(api_error)?)))
}

async fn post_primary(State(state): State<Arc<ApiState>>) -> Result<Json<TriggerResponse>, ApiError> {
    run_trigger(&state, Trigger::Primary).await
}

async fn post_finalize(State(state): State<Arc<ApiState>>) -> Result<Json<TriggerResponse>, ApiError> {
    run_trigger(&state, Trigger::Finalize).await
}

async fn get_recording(State(state): State<Arc<ApiState>>) -> Json<RecordingStatus> {
    Json(state.baker.status())
}

pub fn new_api() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/v1/face", post(post_face).put(put_face).delete(delete_face))
        .route("/v1/recording", get(get_recording))
        .route("/v1/recording/primary", post(post_primary))
        .route("/v1/recording/finalize", post(post_finalize))
        .layer(DefaultBodyLimit::disable())
}
