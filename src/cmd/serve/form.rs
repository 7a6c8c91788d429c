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
use chrono::Local;
use maud::Markup;
use maud::html;

use crate::cmd::serve::state::ServerState;
use crate::cmd::serve::template::page_template;
use crate::config::Config;
use crate::types::session::Session;

/// The session form. Opening it unmounts the board. Submitting it navigates to
/// `/board` with the four fields as query parameters.
pub async fn form_handler(
    State(state): State<ServerState>,
    Query(prefill): Query<Session>,
) -> (StatusCode, Html<String>) {
    {
        let mut mutable = state.mutable.lock().unwrap();
        mutable.unmount();
    }
    let initial = initial_values(&state.config, prefill);
    let html = page_template("Attendance Manager", render_form(&state.config, &initial));
    (StatusCode::OK, Html(html.into_string()))
}

/// Fill in whatever the query string left empty: today's date, and the first
/// option of each list.
fn initial_values(config: &Config, prefill: Session) -> Session {
    let pick = |value: String, options: &[String]| -> String {
        if value.is_empty() {
            options.first().cloned().unwrap_or_default()
        } else {
            value
        }
    };
    let date = if prefill.date.is_empty() {
        Local::now().date_naive().format("%Y-%m-%d").to_string()
    } else {
        prefill.date
    };
    Session {
        date,
        class: pick(prefill.class, &config.classes),
        subject: pick(prefill.subject, &config.subjects),
        timing: pick(prefill.timing, &config.timings),
    }
}

fn render_form(config: &Config, initial: &Session) -> Markup {
    html! {
        div.panel {
            h1 { "Attendance Manager" }
            form.session action="/board" method="get" {
                label for="date" { "Select Date" }
                input id="date" type="date" name="date" value=(initial.date) required;
                label for="class" { "Select Class" }
                (select("class", &config.classes, &initial.class))
                label for="subject" { "Select Subject" }
                (select("subject", &config.subjects, &initial.subject))
                label for="timing" { "Select Timing" }
                (select("timing", &config.timings, &initial.timing))
                input.primary id="next" type="submit" value="Next";
            }
        }
    }
}

fn select(name: &str, options: &[String], selected: &str) -> Markup {
    html! {
        select id=(name) name=(name) {
            @for choice in options {
                @if choice == selected {
                    option value=(choice) selected { (choice) }
                } @else {
                    option value=(choice) { (choice) }
                }
            }
        }
    }
}
