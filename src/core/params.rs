//! Purpose: Build validated vendor parameter maps for each scraping operation.
//! Exports: `OperationRequest`, `Params`, `PostType`, `ProfileMode`, `PostsQuery`, `ReelsQuery`,
//! and one builder per operation.
//! Role: Translate CLI-level inputs into the parameter names each spider expects.
//! Invariants: Validation happens here, before any network call is attempted.
//! Invariants: Optional fields appear in the map only when supplied and non-empty.

use std::collections::BTreeMap;

use time::Date;
use time::macros::format_description;

use super::error::{Error, ErrorKind};
use super::spider::Operation;

pub type Params = BTreeMap<String, String>;

pub const DEFAULT_LIMIT: u32 = 10;

const URL_SCHEMES: [&str; 2] = ["http://", "https://"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OperationRequest {
    pub operation: Operation,
    pub params: Params,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum PostType {
    #[default]
    Post,
    Reel,
    Both,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Post => "Post",
            PostType::Reel => "Reel",
            PostType::Both => "Both",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProfileMode {
    Username,
    Url,
}

#[derive(Clone, Debug, Default)]
pub struct PostsQuery {
    pub profile_url: String,
    pub limit: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub post_type: PostType,
}

#[derive(Clone, Debug, Default)]
pub struct ReelsQuery {
    pub url: String,
    pub limit: Option<u32>,
    pub exclude: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

pub fn has_url_scheme(value: &str) -> bool {
    URL_SCHEMES.iter().any(|scheme| value.starts_with(scheme))
}

fn ensure_url(value: &str, label: &str) -> Result<(), Error> {
    if has_url_scheme(value) {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Usage)
        .with_message(format!("{label} URL must start with http:// or https://"))
        .with_hint(format!(
            "Pass a full URL, e.g. 'https://www.instagram.com/...' (got '{value}')."
        )))
}

fn ensure_date(value: &str, flag: &str) -> Result<(), Error> {
    let format = format_description!("[month padding:none]-[day padding:none]-[year]");
    Date::parse(value, &format).map(|_| ()).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid {flag} '{value}'"))
            .with_hint("Dates use MM-DD-YYYY, e.g. '01-31-2025' or '1-31-2025'.")
            .with_source(err)
    })
}

fn insert_optional(params: &mut Params, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|value| !value.is_empty()) {
        params.insert(key.to_string(), value.to_string());
    }
}

fn insert_date_range(
    params: &mut Params,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<(), Error> {
    for (key, flag, value) in [
        ("start_date", "--start-date", start_date),
        ("end_date", "--end-date", end_date),
    ] {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            ensure_date(value, flag)?;
            params.insert(key.to_string(), value.to_string());
        }
    }
    Ok(())
}

fn single(operation: Operation, key: &str, value: &str) -> OperationRequest {
    let mut params = Params::new();
    params.insert(key.to_string(), value.to_string());
    OperationRequest { operation, params }
}

pub fn posts_by_profile(query: &PostsQuery) -> Result<OperationRequest, Error> {
    ensure_url(&query.profile_url, "Profile")?;
    let mut params = Params::new();
    params.insert("profileurl".to_string(), query.profile_url.clone());
    params.insert(
        "resultsLimit".to_string(),
        query.limit.unwrap_or(DEFAULT_LIMIT).to_string(),
    );
    params.insert("post_type".to_string(), query.post_type.as_str().to_string());
    insert_date_range(
        &mut params,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )?;
    Ok(OperationRequest {
        operation: Operation::PostsByProfileUrl,
        params,
    })
}

pub fn post_by_url(post_url: &str) -> Result<OperationRequest, Error> {
    ensure_url(post_url, "Post")?;
    Ok(single(Operation::PostByPostUrl, "posturl", post_url))
}

pub fn profile_by_username(username: &str) -> Result<OperationRequest, Error> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("Username cannot be empty"));
    }
    Ok(single(Operation::ProfileByUsername, "username", username))
}

pub fn profile_by_url(profile_url: &str) -> Result<OperationRequest, Error> {
    ensure_url(profile_url, "Profile")?;
    Ok(single(Operation::ProfileByProfileUrl, "profileurl", profile_url))
}

/// Picks username or URL lookup; without an explicit mode a URL scheme selects URL mode.
pub fn profile(target: &str, mode: Option<ProfileMode>) -> Result<OperationRequest, Error> {
    let mode = mode.unwrap_or(if has_url_scheme(target) {
        ProfileMode::Url
    } else {
        ProfileMode::Username
    });
    match mode {
        ProfileMode::Username => profile_by_username(target),
        ProfileMode::Url => profile_by_url(target),
    }
}

pub fn reel_by_url(reel_url: &str) -> Result<OperationRequest, Error> {
    ensure_url(reel_url, "Reel")?;
    Ok(single(Operation::ReelByUrl, "url", reel_url))
}

fn reels_params(query: &ReelsQuery) -> Result<Params, Error> {
    ensure_url(&query.url, "Profile")?;
    let mut params = Params::new();
    params.insert("url".to_string(), query.url.clone());
    params.insert(
        "num_of_posts".to_string(),
        query.limit.unwrap_or(DEFAULT_LIMIT).to_string(),
    );
    insert_optional(&mut params, "posts_to_not_include", query.exclude.as_deref());
    insert_date_range(
        &mut params,
        query.start_date.as_deref(),
        query.end_date.as_deref(),
    )?;
    Ok(params)
}

pub fn all_reels_by_profile(query: &ReelsQuery) -> Result<OperationRequest, Error> {
    Ok(OperationRequest {
        operation: Operation::AllReelsByUrl,
        params: reels_params(query)?,
    })
}

pub fn reels_list_by_profile(query: &ReelsQuery) -> Result<OperationRequest, Error> {
    Ok(OperationRequest {
        operation: Operation::ReelsByListUrl,
        params: reels_params(query)?,
    })
}

pub fn comments_by_post(post_url: &str) -> Result<OperationRequest, Error> {
    ensure_url(post_url, "Post")?;
    Ok(single(Operation::CommentsByPostUrl, "posturl", post_url))
}
