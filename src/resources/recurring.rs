//! Website Payments Pro - recurring payments profiles.

use std::net::IpAddr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::FieldMap,
    response::{NvpResponse, Outcome},
    transport::{NvpTransport, RequestTrace},
    types::{self, BillingPeriod, CardType, Currency, ProfileAction},
};

const CREATE_PROFILE: &str = "CreateRecurringPaymentsProfile";
const GET_DETAIL: &str = "GetRecurringPaymentsProfileDetails";
const MANAGE_STATUS: &str = "ManageRecurringPaymentsProfileStatus";
const BILL_AMOUNT: &str = "BillOutstandingAmount";

const IP_ADDRESS: &str = "IPADDRESS";
const PAYMENT_ACTION: &str = "PAYMENTACTION";
const SALE: &str = "sale";
const ACTION: &str = "ACTION";

const CARD_TYPE: &str = "CREDITCARDTYPE";
const CARD_NUMBER: &str = "ACCT";
const EXPIRATION_DATE: &str = "EXPDATE";
const CVV: &str = "CVV2";
const FIRST_NAME: &str = "FIRSTNAME";
const LAST_NAME: &str = "LASTNAME";
const EMAIL: &str = "EMAIL";
const COUNTRY_CODE: &str = "COUNTRYCODE";
const STATE: &str = "STATE";
const CITY: &str = "CITY";
const STREET: &str = "STREET";
const ZIP: &str = "ZIP";
const DESCRIPTION: &str = "DESC";
const START_DATE: &str = "PROFILESTARTDATE";
const BILLING_PERIOD: &str = "BILLINGPERIOD";
const BILLING_FREQUENCY: &str = "BILLINGFREQUENCY";

/// Create and manage recurring payments profiles backed by a card.
#[derive(Debug)]
pub struct Recurring {
    transport: NvpTransport,
    profile_id: Option<String>,
    ip_address: Option<IpAddr>,
    card_type: Option<CardType>,
    card_number: Option<SecretString>,
    expiration_date: Option<String>,
    cvv2: Option<SecretString>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    country_code: Option<String>,
    state: Option<String>,
    city: Option<String>,
    street: Option<String>,
    zip: Option<String>,
    amount: Option<Decimal>,
    currency: Option<Currency>,
    description: Option<String>,
    start_date: Option<OffsetDateTime>,
    billing_period: Option<BillingPeriod>,
    billing_frequency: Option<u32>,
    action: Option<ProfileAction>,
    note: Option<String>,
}

impl Recurring {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            profile_id: None,
            ip_address: None,
            card_type: None,
            card_number: None,
            expiration_date: None,
            cvv2: None,
            first_name: None,
            last_name: None,
            email: None,
            country_code: None,
            state: None,
            city: None,
            street: None,
            zip: None,
            amount: None,
            currency: None,
            description: None,
            start_date: None,
            billing_period: None,
            billing_frequency: None,
            action: None,
            note: None,
        }
    }

    pub fn profile_id(&mut self, profile_id: impl Into<String>) -> &mut Self {
        self.profile_id = Some(profile_id.into());
        self
    }

    /// Buyer IP address forwarded for fraud screening.
    pub fn ip_address(&mut self, ip_address: IpAddr) -> &mut Self {
        self.ip_address = Some(ip_address);
        self
    }

    pub fn card_type(&mut self, card_type: CardType) -> &mut Self {
        self.card_type = Some(card_type);
        self
    }

    pub fn card_number(&mut self, card_number: impl Into<String>) -> &mut Self {
        self.card_number = Some(SecretString::new(card_number.into()));
        self
    }

    /// Card expiration in `MMYYYY` wire form.
    pub fn expiration_date(&mut self, expiration_date: impl Into<String>) -> &mut Self {
        self.expiration_date = Some(expiration_date.into());
        self
    }

    pub fn cvv2(&mut self, cvv2: impl Into<String>) -> &mut Self {
        self.cvv2 = Some(SecretString::new(cvv2.into()));
        self
    }

    pub fn first_name(&mut self, first_name: impl Into<String>) -> &mut Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn last_name(&mut self, last_name: impl Into<String>) -> &mut Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    pub fn country_code(&mut self, country_code: impl Into<String>) -> &mut Self {
        self.country_code = Some(country_code.into());
        self
    }

    pub fn state(&mut self, state: impl Into<String>) -> &mut Self {
        self.state = Some(state.into());
        self
    }

    pub fn city(&mut self, city: impl Into<String>) -> &mut Self {
        self.city = Some(city.into());
        self
    }

    pub fn street(&mut self, street: impl Into<String>) -> &mut Self {
        self.street = Some(street.into());
        self
    }

    pub fn zip(&mut self, zip: impl Into<String>) -> &mut Self {
        self.zip = Some(zip.into());
        self
    }

    /// Amount billed every cycle.
    pub fn amount(&mut self, amount: Decimal) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn currency(&mut self, currency: Currency) -> &mut Self {
        self.currency = Some(currency);
        self
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// First billing date. Defaults to the moment of the create call.
    pub fn start_date(&mut self, start_date: OffsetDateTime) -> &mut Self {
        self.start_date = Some(start_date);
        self
    }

    /// Unit used to calculate the billing cycle.
    pub fn billing_period(&mut self, billing_period: BillingPeriod) -> &mut Self {
        self.billing_period = Some(billing_period);
        self
    }

    /// Number of billing periods per cycle.
    pub fn billing_frequency(&mut self, billing_frequency: u32) -> &mut Self {
        self.billing_frequency = Some(billing_frequency);
        self
    }

    /// Action applied by `manage_status`.
    pub fn action(&mut self, action: ProfileAction) -> &mut Self {
        self.action = Some(action);
        self
    }

    /// Reason for a status change or an outstanding-balance bill.
    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.note = Some(note.into());
        self
    }

    /// Create a profile. On success the returned `PROFILEID` is recorded and
    /// one follow-up details call is made immediately; its full response is
    /// the success value. A failed first call suppresses the follow-up and
    /// comes back verbatim.
    pub fn create_profile(&mut self) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        let start = match self.start_date {
            Some(date) => date,
            None => OffsetDateTime::now_utc(),
        };

        let mut query = FieldMap::new();
        query.insert_opt(IP_ADDRESS, self.ip_address);
        query.insert(PAYMENT_ACTION, SALE);
        query.insert_opt(CARD_TYPE, self.card_type);
        query.insert_opt(
            CARD_NUMBER,
            self.card_number
                .as_ref()
                .map(|number| number.expose_secret().to_owned()),
        );
        query.insert_opt(EXPIRATION_DATE, self.expiration_date.clone());
        query.insert_opt(
            CVV,
            self.cvv2.as_ref().map(|cvv| cvv.expose_secret().to_owned()),
        );
        query.insert_opt(FIRST_NAME, self.first_name.clone());
        query.insert_opt(LAST_NAME, self.last_name.clone());
        query.insert_opt(EMAIL, self.email.clone());
        query.insert_opt(COUNTRY_CODE, self.country_code.clone());
        query.insert_opt(STATE, self.state.clone());
        query.insert_opt(CITY, self.city.clone());
        query.insert_opt(STREET, self.street.clone());
        query.insert_opt(ZIP, self.zip.clone());
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::CURRENCY, self.currency);
        query.insert_opt(DESCRIPTION, self.description.clone());
        query.insert(START_DATE, types::format_profile_start(start)?);
        query.insert_opt(BILLING_PERIOD, self.billing_period);
        query.insert_opt(BILLING_FREQUENCY, self.billing_frequency);

        let response = self.transport.send(CREATE_PROFILE, query)?;
        if response.is_success() {
            if let Some(profile_id) = response.get(consts::PROFILE_ID) {
                self.profile_id = Some(profile_id.to_owned());
                return Ok(Outcome::Success(self.profile_details()?));
            }
        }
        Ok(Outcome::Other(response))
    }

    /// Fetch the configured profile's details.
    pub fn profile_details(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::PROFILE_ID, self.profile_id.clone());
        self.transport.send(GET_DETAIL, query)
    }

    /// Cancel, suspend or reactivate the configured profile.
    pub fn manage_status(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::PROFILE_ID, self.profile_id.clone());
        query.insert_opt(ACTION, self.action);
        query.insert_opt(consts::NOTE, self.note.clone());
        self.transport.send(MANAGE_STATUS, query)
    }

    /// Bill the buyer for the outstanding balance of the profile.
    pub fn bill_outstanding_amount(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::PROFILE_ID, self.profile_id.clone());
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::NOTE, self.note.clone());
        self.transport.send(BILL_AMOUNT, query)
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

    #[tokio::test(flavor = "multi_thread")]
    async fn create_profile_chains_exactly_one_details_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=CreateRecurringPaymentsProfile"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&PROFILEID=P9"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains(
                "METHOD=GetRecurringPaymentsProfileDetails",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "ACK=Success&PROFILEID=P9&STATUS=ActiveProfile",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut recurring = Recurring::new(transport_to(&uri));
            recurring
                .card_number("4111111111111111")
                .amount("9.99".parse().expect("amount"))
                .currency(Currency::Usd)
                .billing_period(BillingPeriod::Month)
                .billing_frequency(1);
            recurring.create_profile().expect("create")
        })
        .await
        .expect("join");

        match outcome {
            Outcome::Success(details) => {
                assert_eq!(details.get("STATUS"), Some("ActiveProfile"));
                assert_eq!(details.get("PROFILEID"), Some("P9"));
            }
            Outcome::Other(_) => panic!("successful create must chain into details"),
        }

        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 2);
        let follow_up = decode_body(&requests[1].body);
        assert_eq!(follow_up.get("PROFILEID").map(String::as_str), Some("P9"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_create_suppresses_the_details_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("ACK=Failure&L_LONGMESSAGE0=Invalid+card"),
            )
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut recurring = Recurring::new(transport_to(&uri));
            recurring.card_number("4111111111111111");
            recurring.create_profile().expect("create")
        })
        .await
        .expect("join");

        match outcome {
            Outcome::Other(response) => {
                assert_eq!(response.long_message(), Some("Invalid card"))
            }
            Outcome::Success(_) => panic!("failed create must not chain"),
        }
        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn manage_status_sends_action_and_note() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&PROFILEID=P9"))
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut recurring = Recurring::new(transport_to(&uri));
            recurring
                .profile_id("P9")
                .action(ProfileAction::Suspend)
                .note("fraud review");
            recurring.manage_status().expect("manage")
        })
        .await
        .expect("join");

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert_eq!(
            sent.get("METHOD").map(String::as_str),
            Some("ManageRecurringPaymentsProfileStatus")
        );
        assert_eq!(sent.get("ACTION").map(String::as_str), Some("Suspend"));
        assert_eq!(sent.get("NOTE").map(String::as_str), Some("fraud review"));
    }
}
