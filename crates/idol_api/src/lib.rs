use std::borrow::Cow;
use axum::http::StatusCode;
use axum::Json;
use axum::response::{IntoResponse, Response};

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCategory {
    Unknown,
    InvalidArgument,
    FailedPrecondition,
}

impl ErrorCategory {
    pub fn to_status_code(self) -> StatusCode {
        match self {
            ErrorCategory::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCategory::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCategory::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub category: ErrorCategory,
    pub error_code: Cow<'static, str>,
    pub instance_id: String,
    pub message: Cow<'static, str>,
}

impl ApiError {
    pub fn with_message(
        category: ErrorCategory,
        code: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            category,
            error_code: code.into(),
            instance_id: nanoid::nanoid!(),
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::Unknown, "unknown", message)
    }

    pub fn invalid_argument(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::InvalidArgument, code, message)
    }

    pub fn failed_precondition(code: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::with_message(ErrorCategory::FailedPrecondition, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.category.to_status_code();
        (status_code, Json(self)).into_response()
    }
}

/// One face mesh as delivered by a tracker.
///
/// `triangle_indices` is flat, three indices per triangle. `transform` places
/// the mesh's local frame; only its rigid part is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceMesh {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub triangle_indices: Vec<u32>,
    #[serde(default = "identity")]
    pub transform: Mat4,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetFaceResponse {
    /// True if this request started tracking a face.
    pub acquired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingState {
    Idle,
    Recording,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub state: RecordingState,
    pub tracking: bool,
    pub frame_count: usize,
    pub next_frame: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum TriggerResponse {
    #[serde(rename_all = "camelCase")]
    Began { vertex_count: usize },
    #[serde(rename_all = "camelCase")]
    Captured { name: String, frame_count: usize },
    #[serde(rename_all = "camelCase")]
    Finished { frame_count: usize, asset: String },
}
