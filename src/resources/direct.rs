//! Website Payments Pro - direct card payment.

use std::net::IpAddr;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::FieldMap,
    response::Outcome,
    transport::{NvpTransport, RequestTrace},
    types::{CardType, Currency},
};

const DIRECT_PAYMENT: &str = "DoDirectPayment";
const NON_REFERENCED_CREDIT: &str = "DoNonReferencedCredit";

const IP_ADDRESS: &str = "IPADDRESS";
const PAYMENT_ACTION: &str = "PAYMENTACTION";
// lowercase on the wire for this API family
const SALE: &str = "sale";

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

/// Charge a card directly, or issue a non-referenced credit to one.
#[derive(Debug)]
pub struct Direct {
    transport: NvpTransport,
    non_referenced_credit: bool,
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
}

impl Direct {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            non_referenced_credit: false,
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
        }
    }

    /// Route the charge through DoNonReferencedCredit instead of
    /// DoDirectPayment. Contact PayPal before using this: in most cases
    /// a RefundTransaction is the right call.
    pub fn non_referenced_credit(&mut self) -> &mut Self {
        self.non_referenced_credit = true;
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

    pub fn amount(&mut self, amount: Decimal) -> &mut Self {
        self.amount = Some(amount);
        self
    }

    pub fn currency(&mut self, currency: Currency) -> &mut Self {
        self.currency = Some(currency);
        self
    }

    /// Process the configured card payment (or credit, if enabled).
    /// Narrows to `TRANSACTIONID`.
    pub fn charge(&mut self) -> CustomResult<Outcome<String>, NvpError> {
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

        let method = if self.non_referenced_credit {
            NON_REFERENCED_CREDIT
        } else {
            DIRECT_PAYMENT
        };
        let response = self.transport.send(method, query)?;
        Ok(response.narrow(consts::TRANSACTION_ID))
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }
}
