//! Purpose: Persist operation results and error records as pretty-printed JSON files.
//! Exports: `save_json`, `save_error`, `error_file_name`, `file_stem_for`, `timestamp_now`.
//! Role: File-system side of the CLI; one file per invocation.
//! Invariants: Results land at `<dir>/<name>.json`; errors at `<dir>/error_<name>_<ts>.json`.
//! Invariants: The output directory is created on demand.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::core::error::{Error, ErrorKind};

pub fn save_json<T: Serialize>(dir: &Path, name: &str, data: &T) -> Result<PathBuf, Error> {
    write_pretty(dir, &format!("{name}.json"), data)
}

pub fn save_error<T: Serialize>(
    dir: &Path,
    name: &str,
    timestamp: &str,
    data: &T,
) -> Result<PathBuf, Error> {
    write_pretty(dir, &error_file_name(name, timestamp), data)
}

pub fn error_file_name(name: &str, timestamp: &str) -> String {
    format!("error_{name}_{timestamp}.json")
}

/// Local wall-clock time as `YYYYmmdd-HHMMSS`, falling back to UTC when the offset is unknown.
pub fn timestamp_now() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format_timestamp(now)
}

fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    at.format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// File stem `<prefix>_<last path segment>` for URL-targeted commands.
pub fn file_stem_for(prefix: &str, url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let segment = without_query
        .split('/')
        .rev()
        .find(|segment| !segment.is_empty())
        .unwrap_or("");
    let safe: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}_{safe}")
}

fn write_pretty<T: Serialize>(dir: &Path, file_name: &str, data: &T) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to create output directory")
            .with_path(dir)
            .with_source(err)
    })?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(data).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })?;
    fs::write(&path, json).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output file")
            .with_path(&path)
            .with_source(err)
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::{error_file_name, file_stem_for, format_timestamp, save_error, save_json};
    use serde_json::{Value, json};
    use time::macros::datetime;

    #[test]
    fn stem_uses_last_non_empty_segment() {
        assert_eq!(
            file_stem_for("posts", "https://www.instagram.com/zoobarcelona"),
            "posts_zoobarcelona"
        );
        assert_eq!(
            file_stem_for("reels", "https://www.instagram.com/zoobarcelona/"),
            "reels_zoobarcelona"
        );
        assert_eq!(
            file_stem_for("reels_list", "https://www.instagram.com/zoo?hl=en"),
            "reels_list_zoo"
        );
    }

    #[test]
    fn timestamp_is_compact_local_format() {
        let at = datetime!(2025-03-07 09:05:01 UTC);
        assert_eq!(format_timestamp(at), "20250307-090501");
        assert_eq!(
            error_file_name("profile", "20250307-090501"),
            "error_profile_20250307-090501.json"
        );
    }

    #[test]
    fn save_json_writes_pretty_utf8() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("output");
        let data = json!({"caption": "café ☕", "likes": 3});
        let path = save_json(&dir, "post_details", &data).expect("save");
        assert_eq!(path, dir.join("post_details.json"));
        let text = std::fs::read_to_string(&path).expect("read");
        assert!(text.contains("café ☕"));
        assert!(text.contains("\n  \"likes\": 3"));
        let back: Value = serde_json::from_str(&text).expect("json");
        assert_eq!(back, data);
    }

    #[test]
    fn save_error_uses_prefixed_name() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = save_error(temp.path(), "comments", "20250101-000000", &json!({"error": "x"}))
            .expect("save");
        assert!(path.ends_with("error_comments_20250101-000000.json"));
    }
}
