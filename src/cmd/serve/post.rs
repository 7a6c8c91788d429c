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

use std::path::Path;
use std::path::PathBuf;

use axum::Form;
use axum::extract::State;
use axum::response::Redirect;
use serde::Deserialize;

use crate::board::Submission;
use crate::board::ToggleRejected;
use crate::client::Download;
use crate::client::MarkRequest;
use crate::cmd::serve::state::Notice;
use crate::cmd::serve::state::ServerState;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::types::student::RollNo;

const SUBMIT_SUCCEEDED: &str = "Attendance marked successfully!";
const SUBMIT_FAILED: &str = "Failed to mark attendance";

#[derive(Deserialize)]
pub struct ToggleForm {
    roll: String,
}

/// Where to send the browser after a POST: back to the mounted board, or to
/// the form if nothing is mounted.
fn board_location(state: &ServerState) -> String {
    let mutable = state.mutable.lock().unwrap();
    match &mutable.board {
        Some(board) => format!("/board?{}", board.session().to_query()),
        None => "/".to_string(),
    }
}

pub async fn toggle_handler(
    State(state): State<ServerState>,
    Form(form): Form<ToggleForm>,
) -> Redirect {
    {
        let mut mutable = state.mutable.lock().unwrap();
        let roll = RollNo::new(form.roll);
        let outcome = match mutable.board.as_mut() {
            Some(board) => board.toggle(&roll),
            None => {
                log::warn!("Toggle for {roll} with no board mounted.");
                return Redirect::to("/");
            }
        };
        match outcome {
            Ok(mark) => {
                log::debug!("Roll {roll} is now {mark:?}.");
            }
            Err(rejected @ ToggleRejected::Locked(_)) => {
                mutable.notice = Some(Notice::Error(rejected.to_string()));
            }
            Err(rejected @ ToggleRejected::NotOnRoster(_)) => {
                log::warn!("{rejected}");
            }
        }
    }
    Redirect::to(&board_location(&state))
}

pub async fn submit_handler(State(state): State<ServerState>) -> Redirect {
    let (ticket, request) = {
        let mut mutable = state.mutable.lock().unwrap();
        let ticket = mutable.mount.current();
        let prepared = match mutable.board.as_mut() {
            Some(board) => match board.prepare_submission(&state.config.catalog) {
                Ok(request) => {
                    log::debug!(
                        "Submitting with {} absent ({} from the first lecture).",
                        board.absentees().len(),
                        board.first_lecture_absentees().len()
                    );
                    board.set_submission(Submission::InFlight);
                    Ok(request)
                }
                Err(invalid) => Err(invalid),
            },
            None => {
                log::warn!("Submit with no board mounted.");
                return Redirect::to("/");
            }
        };
        match prepared {
            Ok(request) => (ticket, request),
            Err(invalid) => {
                log::warn!("{invalid}");
                mutable.notice = Some(Notice::Error(invalid.to_string()));
                drop(mutable);
                return Redirect::to(&board_location(&state));
            }
        }
    };

    let outcome = submit(&state, &request).await;

    {
        let mut mutable = state.mutable.lock().unwrap();
        if !mutable.mount.is_current(ticket) {
            log::debug!("Discarding submission outcome for an unmounted board.");
        } else {
            match outcome {
                Ok(download) => {
                    log::info!(
                        "Attendance marked for {} {} (subject {}); received {} ({} bytes).",
                        request.class_name,
                        request.date,
                        request.subject_id.get(),
                        download.filename,
                        download.bytes.len()
                    );
                    if let Some(board) = mutable.board.as_mut() {
                        board.set_submission(Submission::Succeeded {
                            filename: download.filename.clone(),
                        });
                    }
                    mutable.download = Some(download);
                    mutable.trigger_download = true;
                    mutable.notice = Some(Notice::Info(SUBMIT_SUCCEEDED.to_string()));
                }
                Err(e) => {
                    log::error!("Error marking attendance: {e}");
                    if let Some(board) = mutable.board.as_mut() {
                        board.set_submission(Submission::Failed);
                    }
                    mutable.notice = Some(Notice::Error(SUBMIT_FAILED.to_string()));
                }
            }
        }
    }
    Redirect::to(&board_location(&state))
}

/// Send the request and, if configured, keep a copy of the returned file. The
/// service has recorded the attendance once `mark` succeeds, so a failure to
/// save the copy is only logged.
async fn submit(state: &ServerState, request: &MarkRequest) -> Fallible<Download> {
    let download = state.client.mark(request).await?;
    if let Some(dir) = &state.config.download_dir {
        match save(dir, &download).await {
            Ok(path) => log::info!("Saved {}", path.display()),
            Err(e) => log::error!(
                "Failed to save {} to {}: {e}",
                download.filename,
                dir.display()
            ),
        }
    }
    Ok(download)
}

async fn save(dir: &Path, download: &Download) -> Fallible<PathBuf> {
    let path = save_path(dir, &download.filename)?;
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(&path, &download.bytes).await?;
    Ok(path)
}

/// Only the final path component of the suggested filename is used, so the
/// file always lands inside `dir`.
fn save_path(dir: &Path, filename: &str) -> Fallible<PathBuf> {
    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| ErrorReport::new(format!("unusable filename: {filename:?}")))?;
    Ok(dir.join(name))
}
