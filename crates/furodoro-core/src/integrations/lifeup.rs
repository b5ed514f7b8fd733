//! LifeUp integration -- category/task catalog and pomodoro reporting
//! through the LifeUp HTTP server.
//!
//! Catalog endpoints answer with a `{code, data}` envelope; anything but
//! `code == 200` with an array `data` is a failure. Reports go through the
//! server's content-provider relay, which forwards a custom-scheme URL to
//! the app.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogError, ReportError};
use crate::events::{Event, NoticeLevel};
use crate::settings::Settings;

/// A task category as listed by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// The server's `type` field.
    pub kind: Option<i64>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub id: String,
    pub name: String,
}

/// Tasks of one category. An empty category is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "tasks", rename_all = "snake_case")]
pub enum TaskListing {
    Tasks(Vec<TaskItem>),
    Empty,
}

/// Display state of the task selector after a load attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    SelectCategoryFirst,
    Loading,
    Ready,
    NoTasks,
    InvalidCategory,
    ErrorLoading,
    LoadFailed,
    CategoryError,
}

impl SelectorState {
    /// Placeholder text of the selector's first entry.
    pub fn placeholder(&self) -> &'static str {
        match self {
            SelectorState::SelectCategoryFirst => "--Select Category First--",
            SelectorState::Loading => "--Loading Tasks--",
            SelectorState::Ready => "--Select Task--",
            SelectorState::NoTasks => "--No Tasks Found--",
            SelectorState::InvalidCategory => "--Invalid Category--",
            SelectorState::ErrorLoading => "--Error Loading Tasks--",
            SelectorState::LoadFailed => "--Task Load Failed--",
            SelectorState::CategoryError => "--Category Error--",
        }
    }

    pub fn enabled(&self) -> bool {
        matches!(self, SelectorState::Ready)
    }

    /// Task selector state for the outcome of [`LifeUpClient::fetch_tasks`].
    pub fn for_tasks(result: &Result<TaskListing, CatalogError>) -> Self {
        match result {
            Ok(TaskListing::Tasks(_)) => SelectorState::Ready,
            Ok(TaskListing::Empty) => SelectorState::NoTasks,
            Err(CatalogError::InvalidCategory(_)) => SelectorState::InvalidCategory,
            Err(CatalogError::BadEnvelope { .. }) => SelectorState::ErrorLoading,
            Err(CatalogError::Status(_) | CatalogError::Http(_)) => SelectorState::LoadFailed,
        }
    }
}

/// Category selector placeholder after a failed category load.
pub fn category_error_placeholder(err: &CatalogError) -> &'static str {
    match err {
        CatalogError::BadEnvelope { .. } => "Error loading",
        _ => "Load failed",
    }
}

/// A finished work run to be logged against a LifeUp task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub task_id: String,
    pub duration_ms: u64,
}

impl SessionReport {
    pub fn new(task_id: impl Into<String>, work_secs: u64) -> Self {
        Self {
            task_id: task_id.into(),
            duration_ms: work_secs.saturating_mul(1000),
        }
    }

    /// The custom-scheme URL the app understands.
    pub fn app_url(&self, scheme: &str) -> String {
        format!(
            "{scheme}://api/add_pomodoro?task_id={}&duration={}&reward_tomatoes=true",
            self.task_id, self.duration_ms
        )
    }

    /// Relay URL on the LifeUp server that forwards [`Self::app_url`].
    pub fn relay_url(&self, base_url: &str, scheme: &str) -> String {
        format!(
            "{base_url}/api/contentprovider?url={}",
            urlencoding::encode(&self.app_url(scheme))
        )
    }
}

/// Notification for the outcome of a report.
pub fn report_notice(result: &Result<(), ReportError>) -> Event {
    match result {
        Ok(()) => Event::notice(NoticeLevel::Success, "Pomodoro logged to LifeUp!"),
        Err(ReportError::Status(code)) => Event::notice(
            NoticeLevel::Error,
            format!("Failed to log to LifeUp: {code}"),
        ),
        Err(ReportError::Http(_)) => {
            Event::notice(NoticeLevel::Error, "Network error logging to LifeUp.")
        }
    }
}

/// Client for one LifeUp server.
#[derive(Debug, Clone)]
pub struct LifeUpClient {
    base_url: String,
    scheme: String,
    http: Client,
}

impl LifeUpClient {
    pub fn new(settings: &Settings) -> Self {
        Self::with_base(&settings.server_url, &settings.report_scheme)
    }

    pub fn with_base(base_url: &str, scheme: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            scheme: scheme.to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET {base}/tasks_categories`.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let items = self
            .get_envelope(&format!("{}/tasks_categories", self.base_url))
            .await?;

        let categories: Vec<Category> = items
            .iter()
            .filter_map(|item| {
                Some(Category {
                    id: scalar_text(item.get("id")?)?,
                    name: scalar_text(item.get("name")?)?,
                    kind: item.get("type").and_then(Value::as_i64),
                    color: item
                        .get("color")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                })
            })
            .collect();

        tracing::info!(count = categories.len(), "categories loaded");
        Ok(categories)
    }

    /// `GET {base}/tasks/{id}` for a numeric category id.
    pub async fn fetch_tasks(&self, category_id: &str) -> Result<TaskListing, CatalogError> {
        let numeric = leading_integer(category_id).ok_or_else(|| {
            tracing::error!(category_id, "Invalid Category ID provided");
            CatalogError::InvalidCategory(category_id.to_string())
        })?;

        let items = self
            .get_envelope(&format!("{}/tasks/{numeric}", self.base_url))
            .await?;
        if items.is_empty() {
            return Ok(TaskListing::Empty);
        }

        let tasks = items
            .iter()
            .filter_map(|item| {
                Some(TaskItem {
                    id: scalar_text(item.get("id")?)?,
                    name: scalar_text(item.get("name")?)?,
                })
            })
            .collect();
        Ok(TaskListing::Tasks(tasks))
    }

    /// Send a report through the relay. Never retried.
    pub async fn report_session(&self, report: &SessionReport) -> Result<(), ReportError> {
        let url = report.relay_url(&self.base_url, &self.scheme);
        tracing::info!(%url, "reporting session");

        let resp = self.http.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "report rejected");
            return Err(ReportError::Status(status.as_u16()));
        }
        Ok(())
    }

    async fn get_envelope(&self, url: &str) -> Result<Vec<Value>, CatalogError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }

        let body: Value = resp.json().await?;
        let code = body.get("code").and_then(Value::as_i64).unwrap_or(-1);
        match body.get("data").and_then(Value::as_array) {
            Some(items) if code == 200 => Ok(items.clone()),
            _ => {
                tracing::error!(%url, code, "response format is not correct");
                Err(CatalogError::BadEnvelope { code })
            }
        }
    }
}

/// Ids and names may arrive as strings or numbers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Leading base-10 integer of `raw`, ignoring surrounding whitespace and
/// any trailing garbage (`"12abc"` is 12).
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let sign_len = usize::from(raw.starts_with(&['-', '+'][..]));
    let digits = raw[sign_len..]
        .chars()
        .take_while(char::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    raw[..sign_len + digits].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn relay_url_encodes_app_url() {
        let report = SessionReport::new("42", 45);
        assert_eq!(
            report.app_url("lifeup"),
            "lifeup://api/add_pomodoro?task_id=42&duration=45000&reward_tomatoes=true"
        );
        assert_eq!(
            report.relay_url("http://localhost:13276", "lifeup"),
            "http://localhost:13276/api/contentprovider?url=\
             lifeup%3A%2F%2Fapi%2Fadd_pomodoro%3Ftask_id%3D42%26duration%3D45000%26reward_tomatoes%3Dtrue"
        );
    }

    #[test]
    fn leading_integer_matches_lenient_parse() {
        assert_eq!(leading_integer("12"), Some(12));
        assert_eq!(leading_integer(" 7abc"), Some(7));
        assert_eq!(leading_integer("-3"), Some(-3));
        assert_eq!(leading_integer("abc"), None);
        assert_eq!(leading_integer(""), None);
        assert_eq!(leading_integer("-"), None);
    }

    #[test]
    fn selector_states_map_to_placeholders() {
        let empty: Result<TaskListing, CatalogError> = Ok(TaskListing::Empty);
        assert_eq!(SelectorState::for_tasks(&empty).placeholder(), "--No Tasks Found--");
        let invalid = Err(CatalogError::InvalidCategory("x".into()));
        assert_eq!(SelectorState::for_tasks(&invalid).placeholder(), "--Invalid Category--");
        let bad = Err(CatalogError::BadEnvelope { code: 500 });
        assert_eq!(SelectorState::for_tasks(&bad).placeholder(), "--Error Loading Tasks--");
        let status = Err(CatalogError::Status(404));
        assert_eq!(SelectorState::for_tasks(&status).placeholder(), "--Task Load Failed--");
        assert!(!SelectorState::for_tasks(&status).enabled());
        assert_eq!(
            category_error_placeholder(&CatalogError::BadEnvelope { code: 1 }),
            "Error loading"
        );
        assert_eq!(category_error_placeholder(&CatalogError::Status(500)), "Load failed");
    }

    #[tokio::test]
    async fn fetch_categories_skips_incomplete_items() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/tasks_categories")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r##"{"code":200,"data":[
                    {"id":1,"name":"Study","type":0,"color":"#ff8800"},
                    {"id":"2","name":"Chores"},
                    {"name":"no id"},
                    {"id":4}
                ]}"##,
            )
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let categories = client.fetch_categories().await.unwrap();
        mock.assert_async().await;

        assert_eq!(
            categories,
            vec![
                Category {
                    id: "1".into(),
                    name: "Study".into(),
                    kind: Some(0),
                    color: Some("#ff8800".into()),
                },
                Category {
                    id: "2".into(),
                    name: "Chores".into(),
                    kind: None,
                    color: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn fetch_categories_rejects_bad_envelope() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks_categories")
            .with_status(200)
            .with_body(r#"{"code":500,"data":[]}"#)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let err = client.fetch_categories().await.unwrap_err();
        assert!(matches!(err, CatalogError::BadEnvelope { code: 500 }));
    }

    #[tokio::test]
    async fn fetch_tasks_reports_http_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/tasks/3")
            .with_status(503)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let err = client.fetch_tasks("3").await.unwrap_err();
        assert!(matches!(err, CatalogError::Status(503)));
    }

    #[tokio::test]
    async fn fetch_tasks_empty_and_populated() {
        let mut server = Server::new_async().await;
        let _empty = server
            .mock("GET", "/tasks/1")
            .with_status(200)
            .with_body(r#"{"code":200,"data":[]}"#)
            .create_async()
            .await;
        let _full = server
            .mock("GET", "/tasks/2")
            .with_status(200)
            .with_body(r#"{"code":200,"data":[{"id":10,"name":"Read"},{"id":11}]}"#)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        assert_eq!(client.fetch_tasks("1").await.unwrap(), TaskListing::Empty);
        assert_eq!(
            client.fetch_tasks("2").await.unwrap(),
            TaskListing::Tasks(vec![TaskItem {
                id: "10".into(),
                name: "Read".into(),
            }])
        );
    }

    #[tokio::test]
    async fn invalid_category_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let err = client.fetch_tasks("abc").await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidCategory(id) if id == "abc"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn report_session_hits_relay_once() {
        let mut server = Server::new_async().await;
        let report = SessionReport::new("42", 45);
        let mock = server
            .mock("GET", "/api/contentprovider")
            .match_query(Matcher::UrlEncoded("url".into(), report.app_url("lifeup")))
            .with_status(200)
            .expect(1)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let result = client.report_session(&report).await;
        mock.assert_async().await;
        assert!(result.is_ok());
        assert!(matches!(
            report_notice(&result),
            Event::Notification { level: NoticeLevel::Success, .. }
        ));
    }

    #[tokio::test]
    async fn report_failure_status_becomes_notice() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/contentprovider")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = LifeUpClient::with_base(&server.url(), "lifeup");
        let result = client.report_session(&SessionReport::new("1", 60)).await;
        assert!(matches!(result, Err(ReportError::Status(500))));
        assert!(matches!(
            report_notice(&result),
            Event::Notification { level: NoticeLevel::Error, ref message, .. }
                if message == "Failed to log to LifeUp: 500"
        ));
    }
}
