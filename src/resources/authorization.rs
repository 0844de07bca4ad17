//! Website Payments Pro - authorization and capture.

use rust_decimal::Decimal;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::FieldMap,
    response::Outcome,
    transport::{NvpTransport, RequestTrace},
    types::{CompleteType, Currency},
};

const DO_AUTHORIZATION: &str = "DoAuthorization";
const DO_CAPTURE: &str = "DoCapture";
const DO_REAUTHORIZATION: &str = "DoReauthorization";
const DO_VOID: &str = "DoVoid";

const ENTITY: &str = "TRANSACTIONENTITY";
const ORDER: &str = "Order";
const COMPLETE_TYPE: &str = "COMPLETETYPE";

/// Authorize, capture, reauthorize or void a payment.
#[derive(Debug)]
pub struct Authorization {
    transport: NvpTransport,
    transaction_id: Option<String>,
    amount: Option<Decimal>,
    currency: Option<Currency>,
    complete_type: Option<CompleteType>,
    note: Option<String>,
}

impl Authorization {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            transaction_id: None,
            amount: None,
            currency: None,
            complete_type: None,
            note: None,
        }
    }

    /// Transaction id of the order being authorized, or the authorization
    /// id for capture/reauthorize/void.
    pub fn transaction_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    pub fn amount(&mut self, amount: Decimal) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn currency(&mut self, currency: Currency) -> &mut Self {
        self.currency = Some(currency);
        self
    }

    /// Whether this capture is the last one you intend to make.
    pub fn complete_type(&mut self, complete_type: CompleteType) -> &mut Self {
        self.complete_type = Some(complete_type);
        self
    }

    /// Informational note shown to the buyer in email and history.
    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.note = Some(note.into());
        self
    }

    /// Authorize a payment held as an order. Narrows to `TRANSACTIONID`.
    pub fn authorize(&mut self) -> CustomResult<Outcome<String>, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TRANSACTION_ID, self.transaction_id.clone());
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert(ENTITY, ORDER);
        query.insert_opt(consts::CURRENCY, self.currency);

        let response = self.transport.send(DO_AUTHORIZATION, query)?;
        Ok(response.narrow(consts::TRANSACTION_ID))
    }

    /// Capture an authorized payment. Narrows to `AUTHORIZATIONID`.
    pub fn capture(&mut self) -> CustomResult<Outcome<String>, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::AUTHORIZATION_ID, self.transaction_id.clone());
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::CURRENCY, self.currency);
        query.insert_opt(COMPLETE_TYPE, self.complete_type);
        query.insert_opt(consts::NOTE, self.note.clone());

        let response = self.transport.send(DO_CAPTURE, query)?;
        Ok(response.narrow(consts::AUTHORIZATION_ID))
    }

    /// Reauthorize a payment whose honor period expired. Narrows to
    /// `AUTHORIZATIONID`.
    pub fn reauthorize(&mut self) -> CustomResult<Outcome<String>, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::AUTHORIZATION_ID, self.transaction_id.clone());
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::CURRENCY, self.currency);

        let response = self.transport.send(DO_REAUTHORIZATION, query)?;
        Ok(response.narrow(consts::AUTHORIZATION_ID))
    }

    /// Void an order or authorization. Narrows to `AUTHORIZATIONID`.
    pub fn void(&mut self) -> CustomResult<Outcome<String>, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::AUTHORIZATION_ID, self.transaction_id.clone());
        query.insert_opt(consts::NOTE, self.note.clone());

        let response = self.transport.send(DO_VOID, query)?;
        Ok(response.narrow(consts::AUTHORIZATION_ID))
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::test_utils::{decode_body, transport_to};

    #[tokio::test(flavor = "multi_thread")]
    async fn authorize_narrows_to_transaction_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("ACK=Success&TRANSACTIONID=T1"),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut authorization = Authorization::new(transport_to(&uri));
            authorization
                .transaction_id("T1")
                .amount("100.00".parse().expect("amount"))
                .currency(Currency::Usd);
            authorization.authorize().expect("authorize")
        })
        .await
        .expect("join");

        assert_eq!(outcome.success().as_deref(), Some("T1"));

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert_eq!(sent.get("METHOD").map(String::as_str), Some("DoAuthorization"));
        assert_eq!(sent.get("TRANSACTIONID").map(String::as_str), Some("T1"));
        assert_eq!(sent.get("AMT").map(String::as_str), Some("100.00"));
        assert_eq!(sent.get("CURRENCYCODE").map(String::as_str), Some("USD"));
        assert_eq!(sent.get("TRANSACTIONENTITY").map(String::as_str), Some("Order"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn void_with_empty_note_omits_the_note_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("ACK=Success&AUTHORIZATIONID=A7"),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut authorization = Authorization::new(transport_to(&uri));
            authorization.transaction_id("A7").note("");
            authorization.void().expect("void")
        })
        .await
        .expect("join");

        assert_eq!(outcome.success().as_deref(), Some("A7"));

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert!(!sent.contains_key("NOTE"));
        assert_eq!(sent.get("AUTHORIZATIONID").map(String::as_str), Some("A7"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn capture_failure_returns_raw_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "ACK=Failure&L_ERRORCODE0=10602&L_LONGMESSAGE0=Authorization+expired",
            ))
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut authorization = Authorization::new(transport_to(&uri));
            authorization
                .transaction_id("A7")
                .amount("5.00".parse().expect("amount"))
                .complete_type(CompleteType::Complete);
            authorization.capture().expect("capture")
        })
        .await
        .expect("join");

        match outcome {
            Outcome::Other(response) => {
                assert_eq!(response.long_message(), Some("Authorization expired"));
                assert_eq!(response.get("L_ERRORCODE0"), Some("10602"));
            }
            Outcome::Success(_) => panic!("failure ack must not narrow"),
        }
    }
}
