//! The NVP transport adapter: one synchronous form-encoded POST per call.

use std::path::Path;

use error_stack::ResultExt;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::FieldMap,
    response::NvpResponse,
};

/// Classic API credentials. The password and signature stay wrapped until
/// the wire body is assembled, so they never leak through `Debug` or logs.
#[derive(Debug, Clone)]
pub struct Credentials {
    user: String,
    password: SecretString,
    signature: SecretString,
}

impl Credentials {
    pub fn new(
        user: impl Into<String>,
        password: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            password: SecretString::new(password.into()),
            signature: SecretString::new(signature.into()),
        }
    }
}

/// Sandbox or live, chosen once at construction and never per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Sandbox,
    Live,
}

impl Environment {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Sandbox => consts::SANDBOX_ENDPOINT,
            Self::Live => consts::LIVE_ENDPOINT,
        }
    }

    pub(crate) fn redirect_base(&self) -> &'static str {
        match self {
            Self::Sandbox => consts::SANDBOX_REDIRECT,
            Self::Live => consts::LIVE_REDIRECT,
        }
    }
}

/// Diagnostics captured for the most recent call. Overwritten on every call;
/// never used to drive control flow.
#[derive(Debug, Clone)]
pub struct RequestTrace {
    /// Target endpoint of the call.
    pub url: String,
    /// Exact wire-encoded body that was sent, credentials included.
    pub body: String,
    /// HTTP status of the exchange.
    pub status: u16,
    /// Raw response body before decoding.
    pub response_body: String,
    /// Decoded response map.
    pub response: NvpResponse,
}

/// Owns the credentials, the endpoint and the HTTP client; issues exactly
/// one blocking POST per `send`. No retries, no caching.
#[derive(Debug, Clone)]
pub struct NvpTransport {
    credentials: Credentials,
    environment: Environment,
    endpoint: String,
    http: reqwest::blocking::Client,
    trace: Option<RequestTrace>,
}

/// Builds the HTTP client shared by every resource. `certificate` points at
/// a PEM bundle overriding the default rustls roots.
pub(crate) fn build_http_client(
    certificate: Option<&Path>,
) -> CustomResult<reqwest::blocking::Client, NvpError> {
    let mut builder = reqwest::blocking::Client::builder();
    if let Some(path) = certificate {
        let pem = std::fs::read(path)
            .change_context(NvpError::CertificateDecodeFailed)
            .attach_printable_lazy(|| format!("reading {}", path.display()))?;
        let certificate = reqwest::Certificate::from_pem(&pem)
            .change_context(NvpError::CertificateDecodeFailed)?;
        builder = builder.add_root_certificate(certificate);
    }
    builder
        .build()
        .change_context(NvpError::ClientConstructionFailed)
}

impl NvpTransport {
    /// Builds a standalone transport with its own HTTP client.
    pub fn new(
        credentials: Credentials,
        environment: Environment,
        certificate: Option<&Path>,
    ) -> CustomResult<Self, NvpError> {
        let http = build_http_client(certificate)?;
        Ok(Self::from_parts(credentials, environment, http))
    }

    /// Shares an already-built client, cloned cheaply per resource.
    pub(crate) fn from_parts(
        credentials: Credentials,
        environment: Environment,
        http: reqwest::blocking::Client,
    ) -> Self {
        Self {
            credentials,
            environment,
            endpoint: environment.endpoint().to_owned(),
            http,
            trace: None,
        }
    }

    pub(crate) fn environment(&self) -> Environment {
        self.environment
    }

    #[cfg(test)]
    pub(crate) fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Trace of the most recent call, if any call was made.
    pub fn trace(&self) -> Option<&RequestTrace> {
        self.trace.as_ref()
    }

    /// Prunes and encodes `fields`, merges the authentication fields (which
    /// caller-supplied fields can never override), POSTs once and decodes
    /// the flat response. Transport failures surface as errors; the
    /// acknowledgement value is left entirely to the caller.
    pub fn send(
        &mut self,
        method: &str,
        mut fields: FieldMap,
    ) -> CustomResult<NvpResponse, NvpError> {
        fields.prune();
        let mut pairs = fields.to_pairs()?;
        pairs.retain(|(name, _)| !consts::RESERVED_FIELDS.contains(&name.as_str()));
        pairs.push((consts::USER.to_owned(), self.credentials.user.clone()));
        pairs.push((
            consts::PWD.to_owned(),
            self.credentials.password.expose_secret().to_owned(),
        ));
        pairs.push((
            consts::SIGNATURE.to_owned(),
            self.credentials.signature.expose_secret().to_owned(),
        ));
        pairs.push((consts::VERSION_FIELD.to_owned(), consts::VERSION.to_owned()));
        pairs.push((consts::METHOD.to_owned(), method.to_owned()));

        let body = serde_urlencoded::to_string(&pairs)
            .change_context(NvpError::UrlEncodingFailed)?;

        let started = std::time::Instant::now();
        let http_response = self
            .http
            .post(&self.endpoint)
            .header("Content-Type", consts::CONTENT_TYPE_FORM)
            .body(body.clone())
            .send()
            .change_context(NvpError::RequestNotSent(self.endpoint.clone()))?;

        let status = http_response.status().as_u16();
        let response_body = http_response
            .text()
            .change_context(NvpError::ResponseDecodingFailed)?;
        let decoded: Vec<(String, String)> = serde_urlencoded::from_str(&response_body)
            .change_context(NvpError::ResponseDecodingFailed)
            .attach_printable_lazy(|| format!("HTTP status {status}"))?;
        let response = NvpResponse::from_pairs(decoded);

        tracing::debug!(
            method,
            url = %self.endpoint,
            status,
            latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            ack = response.ack().unwrap_or("<absent>"),
            "nvp call completed"
        );

        self.trace = Some(RequestTrace {
            url: self.endpoint.clone(),
            body,
            status,
            response_body,
            response: response.clone(),
        });
        Ok(response)
    }
}
