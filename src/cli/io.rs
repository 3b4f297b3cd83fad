//! Output helpers for CLI commands
//!
//! Every result is printed as one JSON object per line on stdout.

use std::io::{self, Write};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use super::errors::CliResult;
use crate::wal::Record;

/// JSON form of a record.
///
/// UTF-8 payloads are printed as `payload`, anything else as
/// `payload_base64`.
pub fn record_json(record: &Record) -> Value {
    match std::str::from_utf8(&record.payload) {
        Ok(text) => json!({ "offset": record.offset, "payload": text }),
        Err(_) => json!({ "offset": record.offset, "payload_base64": STANDARD.encode(&record.payload) }),
    }
}

/// Write one JSON value followed by a newline to stdout.
pub fn write_json(value: &Value) -> CliResult<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json_to(&mut handle, value)
}

fn write_json_to<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
