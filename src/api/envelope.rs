use serde::Serialize;

use crate::database::record::CatalogRecord;

/// Uniform response wrapper for every outcome, success or error. Clients
/// read the `status` field; the HTTP status code is always 200.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: &'static str,
    pub messages: Vec<String>,
    pub result: Vec<CatalogRecord>,
}

impl Envelope {
    /// Success envelope: no messages, possibly empty result.
    pub fn ok(result: Vec<CatalogRecord>) -> Self {
        Self {
            status: "ok",
            messages: Vec::new(),
            result,
        }
    }

    /// Error envelope: exactly one diagnostic message, empty result.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            messages: vec![message.into()],
            result: Vec::new(),
        }
    }
}
