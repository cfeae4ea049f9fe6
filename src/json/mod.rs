//! Purpose: JSON decoding boundary for result payloads downloaded from the scraper service.
//! Exports: `decode` module with the tolerant multi-format decoder.
//! Role: Single seam for payload decoding so callers never parse result bodies ad hoc.
//! Invariants: Decoding is pure; the only side effect is diagnostic logging.

pub mod decode;
