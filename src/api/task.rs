//! Purpose: Submit scraping tasks to the Thordata Web Scraper API and wait for their results.
//! Exports: `TaskRunner`, `TaskRequest`, `TaskStatus`, `ThordataClient`, `extract_task_id`.
//! Role: Blocking HTTP client covering create -> poll -> download-url for one task.
//! Invariants: Polling never exceeds `max_wait` and never polls faster than `poll_interval`.
//! Invariants: Task failures carry the task id and read "Task <id> ..." in their message.
#![allow(clippy::result_large_err)]

use std::thread::sleep;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind};
use crate::core::params::Params;

type ApiResult<T> = Result<T, Error>;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const UNKNOWN_TASK_ID: &str = "N/A";

#[derive(Clone, Debug)]
pub struct TaskRequest {
    pub file_name: String,
    pub spider_id: String,
    pub spider_name: String,
    pub parameters: Params,
    pub max_wait: Duration,
    pub poll_interval: Duration,
}

/// Runs one remote task to completion and yields the URL of its result payload.
pub trait TaskRunner {
    fn run_task(&self, request: &TaskRequest) -> ApiResult<String>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TaskStatus {
    Pending(String),
    Ready,
    Failed(String),
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ready" | "success" | "finished" => TaskStatus::Ready,
            "failed" | "error" | "cancelled" => TaskStatus::Failed(raw.to_string()),
            _ => TaskStatus::Pending(raw.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct CreatedTask {
    task_id: String,
}

#[derive(Deserialize)]
struct TaskStatusEntry {
    task_id: String,
    status: String,
}

#[derive(Deserialize)]
struct TaskDownload {
    download: String,
}

pub struct ThordataClient {
    config: Config,
    agent: ureq::Agent,
}

impl ThordataClient {
    pub fn new(config: Config) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { config, agent }
    }

    pub fn create_task(&self, request: &TaskRequest) -> ApiResult<String> {
        let url = build_url(&self.config.scraper_api_base, &["builder"])?;
        let spider_parameters = serde_json::to_string(&[&request.parameters]).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode spider parameters")
                .with_source(err)
        })?;
        let form = [
            ("spider_name", request.spider_name.as_str()),
            ("spider_id", request.spider_id.as_str()),
            ("spider_parameters", spider_parameters.as_str()),
            ("spider_errors", "true"),
            ("file_name", request.file_name.as_str()),
        ];
        let response = self
            .agent
            .post(url.as_str())
            .set(
                "Authorization",
                &format!("Bearer {}", self.config.scraper_token),
            )
            .send_form(&form);
        let created: CreatedTask = read_envelope(response, "create task")?;
        Ok(created.task_id)
    }

    pub fn task_status(&self, task_id: &str) -> ApiResult<TaskStatus> {
        let url = build_url(&self.config.web_api_base, &["tasks-status"])?;
        let response = self
            .public_request(&url)
            .send_form(&[("tasks_ids", task_id)]);
        let entries: Vec<TaskStatusEntry> = read_envelope(response, "task status")
            .map_err(|err| err.with_task_id(task_id))?;
        entries
            .into_iter()
            .find(|entry| entry.task_id == task_id)
            .map(|entry| TaskStatus::parse(&entry.status))
            .ok_or_else(|| {
                Error::new(ErrorKind::Remote)
                    .with_message(format!("Task {task_id} missing from status response"))
                    .with_task_id(task_id)
            })
    }

    pub fn download_url(&self, task_id: &str) -> ApiResult<String> {
        let url = build_url(&self.config.web_api_base, &["tasks-download"])?;
        let response = self
            .public_request(&url)
            .send_form(&[("tasks_id", task_id), ("type", "json")]);
        let download: TaskDownload = read_envelope(response, "task download")
            .map_err(|err| err.with_task_id(task_id))?;
        Ok(download.download)
    }

    pub fn wait_for_task(
        &self,
        task_id: &str,
        max_wait: Duration,
        poll_interval: Duration,
    ) -> ApiResult<()> {
        let started = Instant::now();
        loop {
            match self.task_status(task_id)? {
                TaskStatus::Ready => return Ok(()),
                TaskStatus::Failed(status) => {
                    return Err(Error::new(ErrorKind::Remote)
                        .with_message(format!("Task {task_id} failed with status: {status}"))
                        .with_task_id(task_id));
                }
                TaskStatus::Pending(status) => {
                    tracing::debug!(task_id, status = %status, "task still running");
                    if started.elapsed() + poll_interval > max_wait {
                        return Err(Error::new(ErrorKind::Remote)
                            .with_message(format!(
                                "Task {task_id} did not finish within {}s (last status: {status})",
                                max_wait.as_secs()
                            ))
                            .with_task_id(task_id));
                    }
                    sleep(poll_interval);
                }
            }
        }
    }

    fn public_request(&self, url: &Url) -> ureq::Request {
        self.agent
            .post(url.as_str())
            .set("token", &self.config.public_token)
            .set("key", &self.config.public_key)
    }
}

impl TaskRunner for ThordataClient {
    fn run_task(&self, request: &TaskRequest) -> ApiResult<String> {
        let task_id = self.create_task(request)?;
        tracing::info!(task_id = %task_id, spider_id = %request.spider_id, "task created");
        self.wait_for_task(&task_id, request.max_wait, request.poll_interval)?;
        self.download_url(&task_id)
    }
}

/// Task id recorded for a failed operation, or `N/A` when none is known.
pub fn extract_task_id(err: &Error) -> String {
    if let Some(task_id) = err.task_id() {
        return task_id.to_string();
    }
    if err.kind() != ErrorKind::Remote {
        return UNKNOWN_TASK_ID.to_string();
    }
    err.message()
        .filter(|message| message.starts_with("Task "))
        .and_then(|message| message.split_whitespace().nth(1))
        .map(str::to_string)
        .unwrap_or_else(|| UNKNOWN_TASK_ID.to_string())
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Config).with_message("api base url cannot be a base")
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_envelope<T>(response: Result<ureq::Response, ureq::Error>, action: &str) -> ApiResult<T>
where
    T: DeserializeOwned,
{
    let response = match response {
        Ok(resp) => resp,
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            let detail = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.msg)
                .unwrap_or_else(|| format!("HTTP {code}"));
            return Err(Error::new(ErrorKind::Remote)
                .with_message(format!("{action} failed: {detail}"))
                .with_status(code));
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(Error::new(ErrorKind::Io)
                .with_message(format!("{action} request failed"))
                .with_source(err));
        }
    };
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Remote)
            .with_message(format!("{action} returned an unexpected response"))
            .with_source(err)
    })?;
    if envelope.code != 200 {
        let msg = envelope.msg.unwrap_or_else(|| "no message".to_string());
        return Err(Error::new(ErrorKind::Remote)
            .with_message(format!("{action} failed (code {}): {msg}", envelope.code)));
    }
    envelope.data.ok_or_else(|| {
        Error::new(ErrorKind::Remote).with_message(format!("{action} response has no data"))
    })
}

#[cfg(test)]
mod tests {
    use super::{TaskStatus, build_url, extract_task_id};
    use crate::core::error::{Error, ErrorKind};
    use url::Url;

    #[test]
    fn status_strings_map_case_insensitively() {
        assert_eq!(TaskStatus::parse("Ready"), TaskStatus::Ready);
        assert_eq!(TaskStatus::parse("SUCCESS"), TaskStatus::Ready);
        assert_eq!(
            TaskStatus::parse("Failed"),
            TaskStatus::Failed("Failed".to_string())
        );
        assert_eq!(
            TaskStatus::parse("Running"),
            TaskStatus::Pending("Running".to_string())
        );
    }

    #[test]
    fn task_id_prefers_explicit_field() {
        let err = Error::new(ErrorKind::Io)
            .with_message("status request failed")
            .with_task_id("abc123");
        assert_eq!(extract_task_id(&err), "abc123");
    }

    #[test]
    fn task_id_is_read_from_remote_message() {
        let err = Error::new(ErrorKind::Remote).with_message("Task 9f2e failed with status: Failed");
        assert_eq!(extract_task_id(&err), "9f2e");
    }

    #[test]
    fn task_id_defaults_when_absent() {
        let remote = Error::new(ErrorKind::Remote).with_message("create task failed: quota");
        assert_eq!(extract_task_id(&remote), "N/A");
        let lone = Error::new(ErrorKind::Remote).with_message("Task");
        assert_eq!(extract_task_id(&lone), "N/A");
        let decode = Error::new(ErrorKind::Decode).with_message("Task 1 looks like an id");
        assert_eq!(extract_task_id(&decode), "N/A");
    }

    #[test]
    fn build_url_appends_to_base_path() {
        let base = Url::parse("https://api.thordata.com/api/web-scraper-api").expect("url");
        let url = build_url(&base, &["tasks-status"]).expect("url");
        assert_eq!(
            url.as_str(),
            "https://api.thordata.com/api/web-scraper-api/tasks-status"
        );

        let root = Url::parse("https://scraperapi.thordata.com/").expect("url");
        let url = build_url(&root, &["builder"]).expect("url");
        assert_eq!(url.as_str(), "https://scraperapi.thordata.com/builder");
    }
}
