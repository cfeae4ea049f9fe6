//! Purpose: Execute one Instagram scraping operation end to end.
//! Exports: `Scraper`, `Outcome`, `ErrorRecord`.
//! Role: Operation boundary; remote, transport, and decode faults become data here.
//! Invariants: `run` never returns an `Err`; failures come back as `Outcome::Failed`.
//! Invariants: Callers validate inputs (see `core::params`) before reaching this boundary.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::task::{TaskRequest, TaskRunner, extract_task_id};
use super::transport::Fetch;
use crate::core::error::{Error, ErrorKind};
use crate::core::params::{OperationRequest, Params};
use crate::core::spider::{DEFAULT_TIMEOUT, POLL_INTERVAL};
use crate::json::decode::decode;

/// Structured description of a failed operation, persisted as the error file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
    pub error_type: String,
    pub task_id: String,
    pub spider_id: String,
    pub parameters: Params,
}

impl ErrorRecord {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::parse(&self.error_type).unwrap_or(ErrorKind::Internal)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Data(Value),
    Failed(ErrorRecord),
}

pub struct Scraper<R, F> {
    runner: R,
    fetcher: F,
    max_wait: Duration,
    poll_interval: Duration,
}

impl<R, F> Scraper<R, F>
where
    R: TaskRunner,
    F: Fetch,
{
    pub fn new(runner: R, fetcher: F) -> Self {
        Self {
            runner,
            fetcher,
            max_wait: DEFAULT_TIMEOUT,
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn with_timing(mut self, max_wait: Duration, poll_interval: Duration) -> Self {
        self.max_wait = max_wait;
        self.poll_interval = poll_interval;
        self
    }

    pub fn run(&self, request: &OperationRequest) -> Outcome {
        let spider = request.operation.spider();
        tracing::info!("Instagram {}: {}", request.operation, spider.description);

        match self.execute(request) {
            Ok(value) => Outcome::Data(value),
            Err(err) => {
                let record = ErrorRecord {
                    error: error_message(&err),
                    error_type: err.kind().as_str().to_string(),
                    task_id: extract_task_id(&err),
                    spider_id: spider.id.to_string(),
                    parameters: request.params.clone(),
                };
                tracing::error!(
                    error = %record.error,
                    error_type = %record.error_type,
                    task_id = %record.task_id,
                    spider_id = %record.spider_id,
                    "scraping task failed"
                );
                Outcome::Failed(record)
            }
        }
    }

    fn execute(&self, request: &OperationRequest) -> Result<Value, Error> {
        let spider = request.operation.spider();
        let task = TaskRequest {
            file_name: format!("ig_{}_{}", request.operation, std::process::id()),
            spider_id: spider.id.to_string(),
            spider_name: spider.name.to_string(),
            parameters: request.params.clone(),
            max_wait: self.max_wait,
            poll_interval: self.poll_interval,
        };
        let result_url = self.runner.run_task(&task)?;
        tracing::info!("Finished! Downloading...");
        let body = self.fetcher.get_text(&result_url)?;
        Ok(decode(&body)?.into_value())
    }
}

fn error_message(err: &Error) -> String {
    match err.causes().first() {
        Some(cause) if !err.summary().contains(cause.as_str()) => format!("{}: {cause}", err.summary()),
        _ => err.summary().to_string(),
    }
}
