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

use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use maud::Markup;
use maud::html;

use crate::board::Board;
use crate::board::Resource;
use crate::board::Submission;
use crate::cmd::serve::state::LoadPlan;
use crate::cmd::serve::state::Loaded;
use crate::cmd::serve::state::MutableState;
use crate::cmd::serve::state::Notice;
use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;
use crate::error::Fallible;
use crate::types::session::Session;
use crate::types::student::RollNo;

pub async fn board_handler(
    State(state): State<ServerState>,
    Query(session): Query<Session>,
) -> (StatusCode, Html<String>) {
    let plan: Option<LoadPlan> = {
        let mut mutable = state.mutable.lock().unwrap();
        if mutable.is_mounted_for(&session) {
            None
        } else {
            Some(mutable.mount(session.clone()))
        }
    };
    if let Some(plan) = plan {
        load(&state, plan).await;
    }
    let body = {
        let mut mutable = state.mutable.lock().unwrap();
        render_mounted(&mut mutable, &session)
    };
    let html = page_template("Mark Attendance", body);
    (StatusCode::OK, Html(html.into_string()))
}

/// Run both fetches concurrently, then apply each response only if its ticket
/// is still current.
async fn load(state: &ServerState, plan: LoadPlan) {
    let session = plan.session;
    let roster = async {
        match plan.roster {
            Some(ticket) => Some((ticket, state.client.students(&session.class).await)),
            None => None,
        }
    };
    let first_lecture = async {
        match plan.first_lecture {
            Some(ticket) => {
                let result: Fallible<Vec<RollNo>> = state
                    .client
                    .first_lecture_absentees(&session.date, &session.class)
                    .await;
                Some((ticket, result))
            }
            None => None,
        }
    };
    let (roster, first_lecture) = tokio::join!(roster, first_lecture);

    let mut mutable = state.mutable.lock().unwrap();
    mutable.apply_loaded(
        &session,
        Loaded {
            roster,
            first_lecture,
        },
    );
}

/// Render the board for this session, consuming the pending notice and
/// download trigger. Another session's board is never shown.
fn render_mounted(mutable: &mut MutableState, session: &Session) -> Markup {
    if !mutable.is_mounted_for(session) {
        // Unmounted, or replaced by another session, while loading.
        return closed();
    }
    let notice = mutable.notice.take();
    let trigger_download = std::mem::take(&mut mutable.trigger_download);
    match &mutable.board {
        Some(board) => render_board(board, notice.as_ref(), trigger_download),
        None => closed(),
    }
}

fn closed() -> Markup {
    html! { p { "This board was closed. " a href="/" { "Start over" } "." } }
}

fn render_board(board: &Board, notice: Option<&Notice>, trigger_download: bool) -> Markup {
    let session = board.session();
    let (present, absent) = board.counts();
    let loading = board.roster_status() == Resource::Pending
        || board.first_lecture_status() == Resource::Pending;
    html! {
        div.panel {
            div.header {
                a.back href=(format!("/?{}", session.to_query())) title="Back" { "‹" }
                h1 { "Mark Attendance" }
            }
            @if let Some(notice) = notice {
                @match notice {
                    Notice::Info(message) => {
                        div.notice.info { (message) }
                    }
                    Notice::Error(message) => {
                        div.notice.error { (message) }
                    }
                }
            }
            div.info {
                div { p.label { "Date:" } p.value { (session.date) } }
                div { p.label { "Class:" } p.value { (session.class) } }
                div { p.label { "Subject:" } p.value { (session.subject) } }
                div { p.label { "Time:" } p.value { (session.timing) } }
            }
            @if loading {
                p.summary { "Loading…" }
            } @else {
                p.summary { (present) " present, " (absent) " absent" }
            }
            @if !loading && board.roster().is_empty() {
                p.summary { "No students to show." }
            }
            div.students {
                @for (student, mark) in board.tiles() {
                    form action="/board/toggle" method="post" {
                        input type="hidden" name="roll" value=(student.roll_no.as_str());
                        @if mark.is_locked() {
                            button class=(format!("student {}", mark.css_class())) type="submit" disabled title="Absent in the first lecture" {
                                (student.roll_no.as_str())
                            }
                        } @else {
                            button class=(format!("student {}", mark.css_class())) type="submit" {
                                (student.roll_no.as_str())
                            }
                        }
                    }
                }
            }
            form action="/board/submit" method="post" {
                input.primary id="submit" type="submit" value="Submit Attendance";
            }
            @if let Submission::Succeeded { filename } = board.submission() {
                p.summary { "Last file: " a href="/download" { (filename) } }
            }
            @if trigger_download {
                a #download href="/download" data-autoclick hidden { "Download" }
            }
        }
    }
}
