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

mod download;
mod form;
mod get;
mod post;
pub mod server;
mod state;
mod template;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use reqwest::StatusCode;
    use reqwest::header::CONTENT_DISPOSITION;
    use serde_json::Value;
    use tempfile::tempdir;
    use tokio::spawn;

    use crate::cmd::serve::server::start_server;
    use crate::config::Config;
    use crate::error::Fallible;
    use crate::helper::MockBehavior;
    use crate::helper::free_port;
    use crate::helper::spawn_mock_service;
    use crate::helper::wait_for_server;
    use crate::types::session::Session;

    fn session(subject: &str) -> Session {
        Session {
            date: "2024-03-01".to_string(),
            class: "TY".to_string(),
            subject: subject.to_string(),
            timing: "10:00 AM - 11:00 AM".to_string(),
        }
    }

    /// Start the app against the given service and return its base URL.
    async fn start_app(service_url: &str, download_dir: Option<PathBuf>) -> Fallible<String> {
        let port = free_port()?;
        let config = Config {
            service_url: service_url.to_string(),
            port,
            open_browser: false,
            download_dir,
            ..Config::default()
        };
        spawn(async move { start_server(config).await });
        wait_for_server(port).await;
        Ok(format!("http://127.0.0.1:{port}"))
    }

    async fn get_html(url: &str) -> Fallible<String> {
        let response = reqwest::get(url).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/html; charset=utf-8"
        );
        Ok(response.text().await?)
    }

    async fn post_form(url: &str, form: &[(&str, &str)]) -> Fallible<String> {
        let response = reqwest::Client::new().post(url).form(form).send().await?;
        assert!(response.status().is_success());
        Ok(response.text().await?)
    }

    fn student_count(html: &str) -> usize {
        html.matches("class=\"student ").count()
    }

    #[tokio::test]
    async fn test_start_server_with_invalid_config() {
        let config = Config {
            service_url: "nope".to_string(),
            ..Config::default()
        };
        assert!(start_server(config).await.is_err());
    }

    #[tokio::test]
    async fn test_static_endpoints() -> Fallible<()> {
        let app = start_app("http://127.0.0.1:9", None).await?;

        let response = reqwest::get(format!("{app}/style.css")).await?;
        assert!(response.status().is_success());
        assert_eq!(response.headers().get("content-type").unwrap(), "text/css");

        let response = reqwest::get(format!("{app}/script.js")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/javascript"
        );

        let response = reqwest::get(format!("{app}/herp-derp")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = reqwest::get(format!("{app}/download")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_session_form() -> Fallible<()> {
        let app = start_app("http://127.0.0.1:9", None).await?;
        let html = get_html(&format!("{app}/")).await?;
        assert!(html.contains(r#"action="/board" method="get""#));
        assert!(html.contains(r#"name="date""#));
        assert!(html.contains("required"));
        assert!(html.contains(r#"<option value="TY" selected>TY</option>"#));
        assert!(html.contains(r#"<option value="Database" selected>Database</option>"#));

        let html = get_html(&format!("{app}/?{}", session("SE").to_query())).await?;
        assert!(html.contains(r#"value="2024-03-01""#));
        assert!(html.contains(r#"<option value="SE" selected>SE</option>"#));
        Ok(())
    }

    #[tokio::test]
    async fn test_scenario() -> Fallible<()> {
        let service = spawn_mock_service(MockBehavior::scenario()).await?;
        let app = start_app(&service.url, None).await?;

        // Load the board.
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert_eq!(student_count(&html), 10);
        assert_eq!(html.matches("student locked").count(), 2);
        assert!(html.contains("8 present, 2 absent"));
        {
            let requests = service.requests.lock().unwrap();
            assert!(requests.contains(&"/api/attendance/students/TY".to_string()));
            assert!(requests.contains(
                &"/api/attendance/first-lecture-absentees?date=2024-03-01&className=TY".to_string()
            ));
        }

        // Toggle 5.
        let html = post_form(&format!("{app}/board/toggle"), &[("roll", "5")]).await?;
        assert!(html.contains("7 present, 3 absent"));
        assert_eq!(html.matches("student absent").count(), 1);

        // Toggle 3: rejected.
        let html = post_form(&format!("{app}/board/toggle"), &[("roll", "3")]).await?;
        assert!(html.contains("cannot be marked present"));
        assert!(html.contains("7 present, 3 absent"));

        // Reloading does not refetch or reset.
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert!(html.contains("7 present, 3 absent"));
        assert!(!html.contains("cannot be marked present"));
        assert_eq!(service.requests.lock().unwrap().len(), 2);

        // Submit.
        let html = post_form(&format!("{app}/board/submit"), &[]).await?;
        assert!(html.contains("Attendance marked successfully!"));
        assert!(html.contains("data-autoclick"));
        {
            let marks = service.marks.lock().unwrap();
            assert_eq!(marks.len(), 1);
            let body = &marks[0];
            assert_eq!(body["date"], "2024-03-01");
            assert_eq!(body["time"], "10:00 AM - 11:00 AM");
            assert_eq!(body["subjectId"], 2);
            assert_eq!(body["className"], "TY");
            let records = body["attendanceData"].as_array().unwrap();
            assert_eq!(records.len(), 10);
            for (index, record) in records.iter().enumerate() {
                let roll = index as u64 + 1;
                assert_eq!(record["studentId"], Value::from(100 + roll));
                assert_eq!(record["isPresent"], ![3, 5, 7].contains(&roll));
            }
        }

        // The download trigger fires once.
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert!(!html.contains("data-autoclick"));

        // Download.
        let response = reqwest::get(format!("{app}/download")).await?;
        assert!(response.status().is_success());
        assert_eq!(
            response.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"TY_2024-03-01.xlsx\""
        );
        assert_eq!(&response.bytes().await?[..], b"PK\x03\x04 spreadsheet");

        // Going back to the form unmounts the board.
        get_html(&format!("{app}/")).await?;
        let response = reqwest::get(format!("{app}/download")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_subject_never_reaches_service() -> Fallible<()> {
        let service = spawn_mock_service(MockBehavior::scenario()).await?;
        let app = start_app(&service.url, None).await?;
        get_html(&format!("{app}/board?{}", session("Unknown").to_query())).await?;
        let html = post_form(&format!("{app}/board/submit"), &[]).await?;
        assert!(html.contains("Invalid subject: Unknown. Please contact administrator."));
        assert!(service.marks.lock().unwrap().is_empty());
        assert!(
            !service
                .requests
                .lock()
                .unwrap()
                .contains(&"/api/attendance/mark".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_roster_fetch_failure_renders_no_toggles() -> Fallible<()> {
        // Nothing listens on this port.
        let dead = format!("http://127.0.0.1:{}", free_port()?);
        let app = start_app(&dead, None).await?;
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert_eq!(student_count(&html), 0);
        assert!(html.contains("0 present, 0 absent"));
        assert!(!html.contains("notice"));
        Ok(())
    }

    #[tokio::test]
    async fn test_first_lecture_failure_is_fail_open() -> Fallible<()> {
        let behavior = MockBehavior {
            absentees: None,
            ..MockBehavior::scenario()
        };
        let service = spawn_mock_service(behavior).await?;
        let app = start_app(&service.url, None).await?;
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert_eq!(student_count(&html), 10);
        assert_eq!(html.matches("student locked").count(), 0);
        let html = post_form(&format!("{app}/board/toggle"), &[("roll", "3")]).await?;
        assert!(html.contains("9 present, 1 absent"));
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_failure() -> Fallible<()> {
        let behavior = MockBehavior {
            mark_status: StatusCode::INTERNAL_SERVER_ERROR,
            ..MockBehavior::scenario()
        };
        let service = spawn_mock_service(behavior).await?;
        let app = start_app(&service.url, None).await?;
        get_html(&format!("{app}/board?{}", session("TOC").to_query())).await?;
        let html = post_form(&format!("{app}/board/submit"), &[]).await?;
        assert!(html.contains("Failed to mark attendance"));
        assert!(html.contains("8 present, 2 absent"));
        let response = reqwest::get(format!("{app}/download")).await?;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // Retrying sends the request again.
        post_form(&format!("{app}/board/submit"), &[]).await?;
        assert_eq!(service.marks.lock().unwrap().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_default_filename_and_download_dir() -> Fallible<()> {
        let behavior = MockBehavior {
            disposition: None,
            ..MockBehavior::scenario()
        };
        let service = spawn_mock_service(behavior).await?;
        let dir = tempdir()?;
        let app = start_app(&service.url, Some(dir.path().to_path_buf())).await?;
        get_html(&format!("{app}/board?{}", session("CN").to_query())).await?;
        let html = post_form(&format!("{app}/board/submit"), &[]).await?;
        assert!(html.contains("Attendance marked successfully!"));
        let saved = std::fs::read(dir.path().join("attendance.xlsx"))?;
        assert_eq!(saved, b"PK\x03\x04 spreadsheet");
        let response = reqwest::get(format!("{app}/download")).await?;
        assert_eq!(
            response.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"attendance.xlsx\""
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_unwritable_download_dir_still_succeeds() -> Fallible<()> {
        let service = spawn_mock_service(MockBehavior::scenario()).await?;
        let dir = tempdir()?;
        // A regular file where the directory should be.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"")?;
        let app = start_app(&service.url, Some(blocked)).await?;
        get_html(&format!("{app}/board?{}", session("SE").to_query())).await?;
        let html = post_form(&format!("{app}/board/submit"), &[]).await?;
        assert!(html.contains("Attendance marked successfully!"));
        assert!(!html.contains("Failed to mark attendance"));
        assert_eq!(service.marks.lock().unwrap().len(), 1);
        let response = reqwest::get(format!("{app}/download")).await?;
        assert!(response.status().is_success());
        assert_eq!(&response.bytes().await?[..], b"PK\x03\x04 spreadsheet");
        Ok(())
    }

    #[tokio::test]
    async fn test_roster_error_status_renders_no_toggles() -> Fallible<()> {
        let behavior = MockBehavior {
            students: None,
            ..MockBehavior::scenario()
        };
        let service = spawn_mock_service(behavior).await?;
        let app = start_app(&service.url, None).await?;
        let html = get_html(&format!("{app}/board?{}", session("Database").to_query())).await?;
        assert_eq!(student_count(&html), 0);
        assert!(html.contains("No students to show."));
        assert!(!html.contains("notice"));
        assert!(
            service
                .requests
                .lock()
                .unwrap()
                .contains(&"/api/attendance/students/TY".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_without_board_goes_to_form() -> Fallible<()> {
        let app = start_app("http://127.0.0.1:9", None).await?;
        let html = post_form(&format!("{app}/board/toggle"), &[("roll", "1")]).await?;
        assert!(html.contains("Attendance Manager"));
        Ok(())
    }
}
