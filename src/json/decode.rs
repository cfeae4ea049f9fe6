//! Purpose: Decode result bodies whose wire format is not known in advance.
//! Exports: `Decoded`, `decode`, `SNIPPET_CHARS`.
//! Role: Normalizes strict JSON, JSON lines, and back-to-back JSON values into one shape.
//! Invariants: Strategies run strict -> lines -> concatenated; first success wins.
//! Invariants: More than one decoded value yields `Decoded::Many` in source order.
//! Invariants: Empty or whitespace-only input is always an error, never an empty success.
//! Notes: The concatenated strategy keeps values decoded before the first failure and
//! drops the rest. Downstream callers rely on that partial success, so it stays.
//! Notes: Nesting deeper than serde_json's recursion limit (128) fails every strategy.

use serde::de::Error as _;
use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// Number of leading characters of an undecodable body included in logs.
pub const SNIPPET_CHARS: usize = 500;

/// Result of decoding one response body.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    One(Value),
    Many(Vec<Value>),
}

impl Decoded {
    fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            Decoded::One(values.remove(0))
        } else {
            Decoded::Many(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Decoded::One(_) => 1,
            Decoded::Many(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_value(self) -> Value {
        match self {
            Decoded::One(value) => value,
            Decoded::Many(values) => Value::Array(values),
        }
    }
}

type Strategy = fn(&str) -> Result<Decoded, serde_json::Error>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("strict", decode_strict),
    ("lines", decode_lines),
    ("concatenated", decode_concatenated),
];

pub fn decode(body: &str) -> Result<Decoded, Error> {
    let text = body.trim();
    if text.is_empty() {
        return Err(Error::new(ErrorKind::Decode).with_message("empty response from server"));
    }

    let mut primary: Option<serde_json::Error> = None;
    let mut last: Option<serde_json::Error> = None;
    for (name, strategy) in STRATEGIES {
        match strategy(text) {
            Ok(decoded) => {
                tracing::debug!(strategy = name, values = decoded.len(), "decoded response");
                return Ok(decoded);
            }
            Err(err) => {
                tracing::debug!(strategy = name, error = %err, "decode strategy failed");
                if primary.is_none() {
                    primary = Some(err);
                } else {
                    last = Some(err);
                }
            }
        }
    }

    let snippet: String = text.chars().take(SNIPPET_CHARS).collect();
    tracing::error!("failed to parse JSON response: {}", display_opt(&last));
    tracing::error!("response text (first {SNIPPET_CHARS} chars): {snippet}");

    let mut err = Error::new(ErrorKind::Decode).with_message(format!(
        "JSON parsing failed: {}. Additional error: {}",
        display_opt(&primary),
        display_opt(&last),
    ));
    if let Some(primary) = primary {
        err = err.with_source(primary);
    }
    Err(err)
}

fn display_opt(err: &Option<serde_json::Error>) -> String {
    err.as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

fn decode_strict(text: &str) -> Result<Decoded, serde_json::Error> {
    serde_json::from_str::<Value>(text).map(Decoded::One)
}

fn decode_lines(text: &str) -> Result<Decoded, serde_json::Error> {
    let values = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str::<Value>)
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(serde_json::Error::custom("no json lines found"));
    }
    Ok(Decoded::from_values(values))
}

fn decode_concatenated(text: &str) -> Result<Decoded, serde_json::Error> {
    let mut values = Vec::new();
    let mut pos = 0;
    loop {
        let rest = &text[pos..];
        pos += rest.len() - rest.trim_start_matches(JSON_WHITESPACE).len();
        if pos >= text.len() {
            break;
        }
        match next_value(&text[pos..]) {
            Ok((value, used)) => {
                values.push(value);
                pos += used;
            }
            Err(err) if values.is_empty() => return Err(err),
            Err(err) => {
                tracing::warn!(
                    offset = pos,
                    kept = values.len(),
                    error = %err,
                    "discarding undecodable trailing content"
                );
                break;
            }
        }
    }
    if values.is_empty() {
        return Err(serde_json::Error::custom("no json values found"));
    }
    Ok(Decoded::from_values(values))
}

const JSON_WHITESPACE: [char; 4] = [' ', '\t', '\n', '\r'];

/// Decodes the single value at the start of `rest`, returning it with the bytes it spans.
/// Whatever follows the value is left for the next call, even when it is not a delimiter.
fn next_value(rest: &str) -> Result<(Value, usize), serde_json::Error> {
    if let Some(len) = scalar_len(rest.as_bytes()) {
        return serde_json::from_str::<Value>(&rest[..len]).map(|value| (value, len));
    }
    let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => Ok((value, stream.byte_offset())),
        Some(Err(err)) => Err(err),
        None => Err(serde_json::Error::custom("no json values found")),
    }
}

/// Length of a literal or number token at the start of `bytes`.
/// Numbers follow the JSON grammar greedily, so `01` is `0` followed by `1`.
fn scalar_len(bytes: &[u8]) -> Option<usize> {
    for literal in [&b"true"[..], b"false", b"null"] {
        if bytes.starts_with(literal) {
            return Some(literal.len());
        }
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    match bytes.get(end) {
        Some(b'0') => end += 1,
        Some(b'1'..=b'9') => end += digits(end),
        _ => return None,
    }
    if bytes.get(end) == Some(&b'.') {
        let fraction = digits(end + 1);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits(end + 1 + sign);
        if exponent > 0 {
            end += 1 + sign + exponent;
        }
    }
    Some(end)
}
