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

use percent_encoding::utf8_percent_encode;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::session::COMPONENT;
use crate::types::student::RollNo;
use crate::types::student::Student;
use crate::types::student::StudentId;
use crate::types::subject::SubjectId;

/// Body of `POST /api/attendance/mark`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    pub date: String,
    pub time: String,
    pub subject_id: SubjectId,
    pub class_name: String,
    pub attendance_data: Vec<AttendanceRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_id: StudentId,
    pub is_present: bool,
}

#[derive(Deserialize)]
struct AbsenteesResponse {
    absentees: Vec<RollNo>,
}

/// A file returned by the service.
#[derive(Clone, Debug)]
pub struct Download {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// HTTP client for the external attendance service.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: String,
    default_filename: String,
}

impl ServiceClient {
    pub fn new(base_url: &str, default_filename: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_filename: default_filename.to_string(),
        }
    }

    pub async fn first_lecture_absentees(&self, date: &str, class: &str) -> Fallible<Vec<RollNo>> {
        let url = format!("{}/api/attendance/first-lecture-absentees", self.base_url);
        log::debug!("GET {url} date={date} className={class}");
        let response = self
            .http
            .get(&url)
            .query(&[("date", date), ("className", class)])
            .send()
            .await?;
        let response = ensure_success(response)?;
        let body: AbsenteesResponse = response.json().await?;
        Ok(body.absentees)
    }

    pub async fn students(&self, class: &str) -> Fallible<Vec<Student>> {
        let url = format!(
            "{}/api/attendance/students/{}",
            self.base_url,
            utf8_percent_encode(class, COMPONENT)
        );
        log::debug!("GET {url}");
        let response = self.http.get(&url).send().await?;
        let response = ensure_success(response)?;
        let students: Vec<Student> = response.json().await?;
        Ok(students)
    }

    /// Submit attendance. On success the response body is the generated file.
    pub async fn mark(&self, request: &MarkRequest) -> Fallible<Download> {
        let url = format!("{}/api/attendance/mark", self.base_url);
        log::debug!("POST {url} ({} records)", request.attendance_data.len());
        let response = self.http.post(&url).json(request).send().await?;
        let response = ensure_success(response)?;
        let headers = response.headers();
        let filename = filename_from_disposition(
            headers
                .get(CONTENT_DISPOSITION)
                .and_then(|value| value.to_str().ok()),
            &self.default_filename,
        );
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = response.bytes().await?.to_vec();
        Ok(Download {
            filename,
            content_type,
            bytes,
        })
    }
}

fn ensure_success(response: Response) -> Fallible<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        fail(format!(
            "{} responded with status {status}.",
            response.url().path()
        ))
    }
}

/// Extract the suggested filename from a `Content-Disposition` header value,
/// falling back to `default` when the header or its `filename=` parameter is
/// missing.
pub fn filename_from_disposition(value: Option<&str>, default: &str) -> String {
    let Some(value) = value else {
        return default.to_string();
    };
    let Some((_, rest)) = value.split_once("filename=") else {
        return default.to_string();
    };
    let name = rest.split(';').next().unwrap_or("").replace('"', "");
    let name = name.trim();
    if name.is_empty() {
        default.to_string()
    } else {
        name.to_string()
    }
}
