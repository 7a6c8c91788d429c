// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CACHE_CONTROL;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;

use crate::cmd::serve::state::ServerState;

/// Serve the file from the last successful submission as an attachment.
pub async fn download_handler(State(state): State<ServerState>) -> Response {
    let mutable = state.mutable.lock().unwrap();
    match &mutable.download {
        Some(download) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                download.filename.replace(['"', '\\'], "_")
            );
            (
                StatusCode::OK,
                [
                    (CONTENT_TYPE, download.content_type.clone()),
                    (CONTENT_DISPOSITION, disposition),
                    (CACHE_CONTROL, "no-store".to_string()),
                ],
                download.bytes.clone(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Nothing to download.").into_response(),
    }
}
