//! Entry point wiring shared credentials into per-family resources.

use std::path::Path;

use crate::{
    errors::{CustomResult, NvpError},
    resources::{
        Authorization, Billing, Button, Checkout, Direct, Recurring, Transaction,
    },
    transport::{self, Credentials, Environment, NvpTransport},
};

/// Factory over the classic API families. Built once with credentials, an
/// optional CA bundle and the environment; each resource gets its own
/// transport value (the HTTP client itself is shared by cheap clone).
#[derive(Debug, Clone)]
pub struct Paypal {
    credentials: Credentials,
    environment: Environment,
    http: reqwest::blocking::Client,
}

impl Paypal {
    /// Sandbox client with the default trust roots.
    pub fn new(credentials: Credentials) -> CustomResult<Self, NvpError> {
        Self::with_options(credentials, Environment::Sandbox, None)
    }

    pub fn with_options(
        credentials: Credentials,
        environment: Environment,
        certificate: Option<&Path>,
    ) -> CustomResult<Self, NvpError> {
        let http = transport::build_http_client(certificate)?;
        Ok(Self {
            credentials,
            environment,
            http,
        })
    }

    fn transport(&self) -> NvpTransport {
        NvpTransport::from_parts(
            self.credentials.clone(),
            self.environment,
            self.http.clone(),
        )
    }

    /// Website Payments Pro authorization and capture.
    pub fn authorization(&self) -> Authorization {
        Authorization::new(self.transport())
    }

    /// Billing agreements.
    pub fn billing(&self) -> Billing {
        Billing::new(self.transport())
    }

    /// Button Manager.
    pub fn button(&self) -> Button {
        Button::new(self.transport())
    }

    /// Express Checkout.
    pub fn checkout(&self) -> Checkout {
        Checkout::new(self.transport())
    }

    /// Direct card payment.
    pub fn direct(&self) -> Direct {
        Direct::new(self.transport())
    }

    /// Recurring payments profiles.
    pub fn recurring(&self) -> Recurring {
        Recurring::new(self.transport())
    }

    /// Transaction search, detail and refund.
    pub fn transaction(&self) -> Transaction {
        Transaction::new(self.transport())
    }
}
