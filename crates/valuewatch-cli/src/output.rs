use serde::Serialize;
use serde_json::Value;
use valuewatch_core::UtcDateTime;

use crate::error::CliError;

/// Standard response envelope for all `valuewatch` outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub meta: EnvelopeMeta,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvelopeMeta {
    pub request_id: String,
    pub generated_at: UtcDateTime,
    pub command: String,
}

impl Envelope {
    pub fn new(request_id: impl Into<String>, command: impl Into<String>, data: Value) -> Self {
        Self {
            meta: EnvelopeMeta {
                request_id: request_id.into(),
                generated_at: UtcDateTime::now(),
                command: command.into(),
            },
            data,
        }
    }
}

pub fn render(envelope: &Envelope, pretty: bool) -> Result<(), CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(envelope)?
    } else {
        serde_json::to_string(envelope)?
    };
    println!("{payload}");
    Ok(())
}
