/// Result alias carrying an `error_stack` report, following the
/// `CustomResult` convention used across the codebase.
pub type CustomResult<T, E> = Result<T, error_stack::Report<E>>;

/// Transport-level failures raised while talking to the NVP endpoint.
///
/// An API-level non-success acknowledgement is deliberately *not* a variant
/// here; it is a normal return value (`Outcome::Other`) so callers can
/// inspect the raw response for error codes.
#[derive(Debug, thiserror::Error)]
pub enum NvpError {
    #[error("Failed to construct the HTTP client")]
    ClientConstructionFailed,
    #[error("Failed to read or decode the CA certificate")]
    CertificateDecodeFailed,
    #[error("URL encoding of request payload failed")]
    UrlEncodingFailed,
    #[error("Failed to send request to {0}")]
    RequestNotSent(String),
    #[error("Failed to decode NVP response")]
    ResponseDecodingFailed,
    #[error("Missing required field {field_name}")]
    MissingRequiredField { field_name: &'static str },
}
