//! Billing agreements.

use url::Url;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::{FieldMap, IndexedField},
    response::{NvpResponse, Outcome},
    transport::{NvpTransport, RequestTrace},
    types::{BillingType, PaymentType},
};

const SET_AGREEMENT: &str = "SetCustomerBillingAgreement";
const GET_AGREEMENT: &str = "GetBillingAgreementCustomerDetails";

const RETURN_URL: &str = "RETURNURL";
const CANCEL_URL: &str = "CANCELURL";

// Billing agreement list fields, one agreement per request.
const BILLING_TYPE: IndexedField = IndexedField::new("L_BILLINGTYPE", "");
const BILLING_DESC: IndexedField = IndexedField::new("L_BILLINGAGREEMENTDESCRIPTION", "");
const PAYMENT_TYPE: IndexedField = IndexedField::new("L_PAYMENTTYPE", "");
const AGREEMENT_CUSTOM: IndexedField = IndexedField::new("L_BILLINGAGREEMENTCUSTOM", "");

/// Initiate a customer billing agreement and fetch its details.
#[derive(Debug)]
pub struct Billing {
    transport: NvpTransport,
    token: Option<String>,
    billing_type: Option<BillingType>,
    billing_description: Option<String>,
    payment_type: Option<PaymentType>,
    agreement_custom: Option<String>,
}

impl Billing {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            token: None,
            billing_type: None,
            billing_description: None,
            payment_type: None,
            agreement_custom: None,
        }
    }

    pub fn billing_type(&mut self, billing_type: BillingType) -> &mut Self {
        self.billing_type = Some(billing_type);
        self
    }

    /// Description of the goods or services covered by the agreement.
    pub fn billing_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.billing_description = Some(description.into());
        self
    }

    /// Funding constraint. Ignored by PayPal for recurring payments.
    pub fn payment_type(&mut self, payment_type: PaymentType) -> &mut Self {
        self.payment_type = Some(payment_type);
        self
    }

    /// Custom annotation field for your own use.
    pub fn agreement_custom(&mut self, agreement_custom: impl Into<String>) -> &mut Self {
        self.agreement_custom = Some(agreement_custom.into());
        self
    }

    /// Agreement token from a previous call, for a later details fetch.
    pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    /// Initiate the agreement. When the set call succeeds *and* returns a
    /// non-empty `TOKEN`, one follow-up details call is made immediately and
    /// its full response is the success value; otherwise the set response
    /// comes back verbatim.
    pub fn create_agreement(
        &mut self,
        return_url: &Url,
        cancel_url: &Url,
    ) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        let mut query = FieldMap::new();
        query.insert(RETURN_URL, return_url.clone());
        query.insert(CANCEL_URL, cancel_url.clone());
        query.insert_opt(BILLING_TYPE.at(0), self.billing_type);
        query.insert_opt(BILLING_DESC.at(0), self.billing_description.clone());
        query.insert_opt(PAYMENT_TYPE.at(0), self.payment_type);
        query.insert_opt(AGREEMENT_CUSTOM.at(0), self.agreement_custom.clone());

        let response = self.transport.send(SET_AGREEMENT, query)?;
        if response.is_success() {
            if let Some(token) = response.token().filter(|token| !token.is_empty()) {
                self.token = Some(token.to_owned());
                return Ok(Outcome::Success(self.agreement_details()?));
            }
        }
        Ok(Outcome::Other(response))
    }

    /// Fetch the customer details behind the configured token.
    pub fn agreement_details(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TOKEN, self.token.clone());
        self.transport.send(GET_AGREEMENT, query)
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        matchers::{body_string_contains, method},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;
    use crate::test_utils::{decode_body, transport_to};

    fn url(raw: &str) -> Url {
        Url::parse(raw).expect("test url")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn create_agreement_chains_details_when_token_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=SetCustomerBillingAgreement"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&TOKEN=EC-99"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(
                "METHOD=GetBillingAgreementCustomerDetails",
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("ACK=Success&TOKEN=EC-99&EMAIL=buyer%40example.com"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut billing = Billing::new(transport_to(&uri));
            billing
                .billing_type(BillingType::MerchantInitiatedBilling)
                .billing_description("monthly service")
                .payment_type(PaymentType::InstantOnly);
            billing
                .create_agreement(
                    &url("https://merchant.example/return"),
                    &url("https://merchant.example/cancel"),
                )
                .expect("create")
        })
        .await
        .expect("join");

        match outcome {
            Outcome::Success(details) => {
                assert_eq!(details.get("EMAIL"), Some("buyer@example.com"))
            }
            Outcome::Other(_) => panic!("token response must chain into details"),
        }

        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 2);
        let set = decode_body(&requests[0].body);
        assert_eq!(
            set.get("L_BILLINGTYPE0").map(String::as_str),
            Some("MerchantInitiatedBilling")
        );
        assert_eq!(
            set.get("L_PAYMENTTYPE0").map(String::as_str),
            Some("InstantOnly")
        );
        let get = decode_body(&requests[1].body);
        assert_eq!(get.get("TOKEN").map(String::as_str), Some("EC-99"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn success_without_token_does_not_chain() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success"))
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut billing = Billing::new(transport_to(&uri));
            billing
                .create_agreement(
                    &url("https://merchant.example/return"),
                    &url("https://merchant.example/cancel"),
                )
                .expect("create")
        })
        .await
        .expect("join");

        assert!(matches!(outcome, Outcome::Other(_)));
        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 1);
    }
}
