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

//! Test fixtures: a stand-in for the attendance service, and helpers for
//! starting servers on free ports.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::net::TcpStream;
use tokio::time::sleep;

use crate::error::ErrorReport;
use crate::error::Fallible;

pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// How the mock service answers. `None` means the endpoint fails with 500.
#[derive(Clone)]
pub struct MockBehavior {
    pub absentees: Option<Value>,
    pub students: Option<Value>,
    pub mark_status: StatusCode,
    pub disposition: Option<String>,
    pub file: Vec<u8>,
}

impl MockBehavior {
    /// Class TY with roll numbers 1 to 10 (ids 101 to 110), where 3 and 7
    /// were absent in the first lecture.
    pub fn scenario() -> Self {
        let students: Vec<Value> = (1..=10)
            .map(|roll| {
                json!({
                    "id": 100 + roll,
                    "rollNo": roll,
                    "name": format!("Student {roll}"),
                })
            })
            .collect();
        Self {
            absentees: Some(json!({ "absentees": [3, 7] })),
            students: Some(Value::Array(students)),
            mark_status: StatusCode::OK,
            disposition: Some("attachment; filename=\"TY_2024-03-01.xlsx\"".to_string()),
            file: b"PK\x03\x04 spreadsheet".to_vec(),
        }
    }
}

/// A running mock service, with a log of what it received.
#[derive(Clone)]
pub struct MockService {
    pub url: String,
    /// Paths of every request, in arrival order.
    pub requests: Arc<Mutex<Vec<String>>>,
    /// Bodies posted to the mark endpoint.
    pub marks: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct MockState {
    behavior: Arc<MockBehavior>,
    service: MockService,
}

pub async fn spawn_mock_service(behavior: MockBehavior) -> Fallible<MockService> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let service = MockService {
        url: format!("http://{addr}"),
        requests: Arc::new(Mutex::new(Vec::new())),
        marks: Arc::new(Mutex::new(Vec::new())),
    };
    let state = MockState {
        behavior: Arc::new(behavior),
        service: service.clone(),
    };
    let app = Router::new()
        .route(
            "/api/attendance/first-lecture-absentees",
            get(absentees_handler),
        )
        .route("/api/attendance/students/{class}", get(students_handler))
        .route("/api/attendance/mark", post(mark_handler))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(service)
}

async fn absentees_handler(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let date = params.get("date").cloned().unwrap_or_default();
    let class = params.get("className").cloned().unwrap_or_default();
    state.service.requests.lock().unwrap().push(format!(
        "/api/attendance/first-lecture-absentees?date={date}&className={class}"
    ));
    match &state.behavior.absentees {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn students_handler(State(state): State<MockState>, Path(class): Path<String>) -> Response {
    state
        .service
        .requests
        .lock()
        .unwrap()
        .push(format!("/api/attendance/students/{class}"));
    match &state.behavior.students {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn mark_handler(State(state): State<MockState>, Json(body): Json<Value>) -> Response {
    state
        .service
        .requests
        .lock()
        .unwrap()
        .push("/api/attendance/mark".to_string());
    state.service.marks.lock().unwrap().push(body);
    let behavior = &state.behavior;
    if !behavior.mark_status.is_success() {
        return behavior.mark_status.into_response();
    }
    let mut response = (
        behavior.mark_status,
        [(CONTENT_TYPE, XLSX)],
        behavior.file.clone(),
    )
        .into_response();
    if let Some(disposition) = &behavior.disposition {
        if let Ok(value) = disposition.parse() {
            response.headers_mut().insert(CONTENT_DISPOSITION, value);
        }
    }
    response
}

pub fn free_port() -> Fallible<u16> {
    portpicker::pick_unused_port().ok_or_else(|| ErrorReport::new("no free port"))
}

/// Block until something is listening on the port.
pub async fn wait_for_server(port: u16) {
    loop {
        if let Ok(stream) = TcpStream::connect(("127.0.0.1", port)).await {
            drop(stream);
            break;
        }
        sleep(Duration::from_millis(1)).await;
    }
}
