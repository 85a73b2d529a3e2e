use serde_json::Value;
use std::io::{self, Read};

/// Read a JSON document piped into the process, if any.
///
/// Scoring universes, recommendation inputs and projection parameters can be
/// piped instead of loaded from files. Returns `None` when stdin is an
/// interactive terminal or the pipe is empty, so the caller falls back to its
/// flag and file arguments.
pub fn read_piped_json() -> Result<Option<Value>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut raw = String::new();
    io::stdin().read_to_string(&mut raw)?;

    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    Ok(Some(serde_json::from_str(raw)?))
}
