//! Purpose: Define the public Rust API for running scraping operations.
//! Exports: Task runner, transport, scraper boundary, and the shared error types.
//! Role: Surface used by the CLI and integration tests; hides HTTP envelope details.
//! Invariants: Network access happens only through `TaskRunner` and `Fetch` implementations.

mod scraper;
mod task;
mod transport;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use scraper::{ErrorRecord, Outcome, Scraper};
pub use task::{TaskRequest, TaskRunner, TaskStatus, ThordataClient, extract_task_id};
pub use transport::{FETCH_TIMEOUT, Fetch, Fetcher, RetryPolicy};
