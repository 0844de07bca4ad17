//! Helpers shared by the in-crate test modules.

use std::collections::BTreeMap;

use crate::transport::{Credentials, Environment, NvpTransport};

/// Transport pointed at a mock server, with fixed test credentials.
pub(crate) fn transport_to(endpoint: &str) -> NvpTransport {
    let mut transport = NvpTransport::from_parts(
        Credentials::new("merchant", "hunter2", "sig"),
        Environment::Sandbox,
        reqwest::blocking::Client::new(),
    );
    transport.set_endpoint(endpoint);
    transport
}

/// Decodes a captured form-encoded request body into a map.
pub(crate) fn decode_body(body: &[u8]) -> BTreeMap<String, String> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .expect("form-encoded body")
        .into_iter()
        .collect()
}
