//! Image upload endpoints.
//!
//! All endpoints require JWT authentication. Each one runs every file through
//! the upload gate and answers with the accepted file metadata; any refused
//! file fails the whole request.
//!
//! - POST `/avatar` - field `avatar`, one file, 3MB
//! - POST `/food` - field `foodImage`, one file, 5MB
//! - POST `/image` - field `image`, one file, 5MB
//! - POST `/workout` - field `images`, up to five files, 10MB each

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, multipart::MultipartError},
    middleware,
    routing::{MethodRouter, post},
};
use serde::Serialize;
use tracing::{debug, info};

use super::error::ApiError;
use crate::auth::{AuthBackend, require_auth};
use crate::error::GateError;
use crate::impl_has_auth_backend;
use crate::jwt::Principal;
use crate::upload::{self, FileDescriptor, UploadEndpoint, UploadRejection};

/// State for upload endpoints.
#[derive(Clone)]
pub struct UploadsState {
    pub auth: Arc<AuthBackend>,
}

impl_has_auth_backend!(UploadsState);

pub fn router(state: UploadsState) -> Router {
    Router::new()
        .route("/avatar", endpoint_route(UploadEndpoint::Avatar))
        .route("/food", endpoint_route(UploadEndpoint::FoodImage))
        .route("/image", endpoint_route(UploadEndpoint::Image))
        .route("/workout", endpoint_route(UploadEndpoint::WorkoutMedia))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<UploadsState>,
        ))
        .with_state(state)
}

fn endpoint_route(endpoint: UploadEndpoint) -> MethodRouter<UploadsState> {
    post(move |Extension(principal): Extension<Principal>, multipart: Multipart| async move {
        upload_files(&principal.subject_id, endpoint, multipart).await
    })
    // The request budget is enforced while streaming, after the header checks.
    .layer(DefaultBodyLimit::disable())
}

// --- Response types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AcceptedFile {
    field: String,
    file_name: Option<String>,
    content_type: String,
    size: u64,
}

#[derive(Serialize)]
struct UploadResponse {
    endpoint: UploadEndpoint,
    files: Vec<AcceptedFile>,
}

// --- Handlers ---

async fn upload_files(
    subject_id: &str,
    endpoint: UploadEndpoint,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let limits = endpoint.limits();
    let budget = limits.body_limit();
    let mut consumed: u64 = 0;
    let mut files = Vec::new();

    let rejected = |reason: UploadRejection| -> ApiError {
        debug!(endpoint = ?endpoint, reason = reason.code(), "Upload rejected");
        GateError::UploadRejected(reason).into()
    };
    let too_large = UploadRejection::FileTooLarge {
        max_bytes: limits.max_file_size,
    };

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {}", e.body_text())))?
    {
        // Plain form fields ride along with the files; only files are gated,
        // but their bytes still count against the request budget.
        let Some(file_name) = field.file_name().map(str::to_string) else {
            while let Some(chunk) = field.chunk().await.map_err(read_error)? {
                consumed += chunk.len() as u64;
                if consumed > budget {
                    return Err(rejected(too_large));
                }
            }
            continue;
        };
        let name = field.name().unwrap_or("").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        // Field and type are decided from the part headers, before the body
        // is streamed, so an oversized file of the wrong kind reports its kind.
        upload::screen(&name, &content_type, &limits).map_err(rejected)?;

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(read_error)? {
            size += chunk.len() as u64;
            consumed += chunk.len() as u64;
            if size > limits.max_file_size || consumed > budget {
                break;
            }
        }
        if consumed > budget {
            return Err(rejected(too_large));
        }

        let descriptor = FileDescriptor {
            field: name,
            content_type,
            size,
            ordinal: files.len() + 1,
        };
        upload::accept(&descriptor, &limits).map_err(rejected)?;

        files.push(AcceptedFile {
            field: descriptor.field,
            file_name: Some(file_name).filter(|n| !n.is_empty()),
            content_type: descriptor.content_type,
            size: descriptor.size,
        });
    }

    if files.is_empty() {
        return Err(ApiError::bad_request("No file uploaded"));
    }

    info!(subject = %subject_id, endpoint = ?endpoint, count = files.len(), "Upload accepted");
    Ok(Json(UploadResponse { endpoint, files }))
}

fn read_error(e: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Failed to read file data: {}", e.body_text()))
}
