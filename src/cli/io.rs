//! JSON I/O handling for CLI
//!
//! - Input: one JSON document via stdin, possibly spanning lines
//! - Output: one JSON object per line via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde::Serialize;
use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Response envelope written to stdout.
///
/// `data` is serialized directly, so rows keep their own key order.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Response<T> {
    Ok { data: T },
    Error { code: String, message: String },
}

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

/// Parse a JSON request body
pub fn parse_request(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Success envelope
pub fn ok_response<T>(data: T) -> Response<T> {
    Response::Ok { data }
}

/// Error envelope
pub fn error_response<T>(code: &str, message: &str) -> Response<T> {
    Response::Error {
        code: code.to_string(),
        message: message.to_string(),
    }
}

/// Write a success response to stdout
pub fn write_response<T: Serialize>(data: T) -> CliResult<()> {
    write_json(&ok_response(data))
}

/// Write one JSON document as a line to stdout
pub fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
