//! Express Checkout, address verification, balance and mass payment.
//!
//! Checkout requests carry up to ten parallel payment requests, each
//! addressed by a 0-based index `n`, and each payment request carries its
//! own list of line items addressed by `m`. Every indexed setter takes the
//! payment request index explicitly; line items keep the order they were
//! added in.

use std::collections::BTreeMap;

use error_stack::{report, ResultExt};
use rust_decimal::Decimal;
use url::Url;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::{FieldMap, IndexedField, NestedField},
    response::{NvpResponse, Outcome},
    transport::{NvpTransport, RequestTrace},
    types::{Currency, PaymentAction, SolutionType},
};

const SET_CHECKOUT: &str = "SetExpressCheckout";
const GET_CHECKOUT: &str = "GetExpressCheckoutDetails";
const DO_CHECKOUT: &str = "DoExpressCheckoutPayment";
const ADDRESS_VERIFY: &str = "AddressVerify";
const CALLBACK: &str = "Callback";
const GET_BALANCE: &str = "GetBalance";
const MASS_PAY: &str = "MassPay";
const GET_PAL_DETAILS: &str = "GetPalDetails";

const RETURN_URL: &str = "RETURNURL";
const CANCEL_URL: &str = "CANCELURL";
const PAYER_ID: &str = "PAYERID";
const SOLUTION_TYPE: &str = "SOLUTIONTYPE";
const EMAIL: &str = "EMAIL";
const STREET: &str = "STREET";
const ZIP: &str = "ZIP";
const EMAIL_SUBJECT: &str = "EMAILSUBJECT";
const RETURN_ALL_CURRENCIES: &str = "RETURNALLCURRENCIES";
const INSURANCE_OPTION_SELECTED: &str = "INSURANCEOPTIONSELECTED";
const SHIPPING_OPTION_IS_DEFAULT: &str = "SHIPPINGOPTIONISDEFAULT";
const SHIPPING_OPTION_AMOUNT: &str = "SHIPPINGOPTIONAMOUNT";
const SHIPPING_OPTION_NAME: &str = "SHIPPINGOPTIONNAME";

// Per-payment-request fields, keyed by the request index `n`.
const TOTAL_AMOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_AMT");
const ITEM_TOTAL: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_ITEMAMT");
const SHIPPING_AMOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_SHIPPINGAMT");
const SHIPPING_DISCOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_SHIPDISCAMT");
const INSURANCE_AMOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_INSURANCEAMT");
const HANDLING_AMOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_HANDLINGAMT");
const CURRENCY: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_CURRENCYCODE");
const TAX_AMOUNT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_TAXAMT");
const DESCRIPTION: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_DESC");
const CUSTOM: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_CUSTOM");
const INVOICE_NUMBER: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_INVNUM");
const NOTIFY_URL: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_NOTIFYURL");
const MULTI_SHIPPING: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_MULTISHIPPING");
const NOTE_TEXT: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_NOTETEXT");
const SOFT_DESCRIPTOR: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_SOFTDESCRIPTOR");
const TRANSACTION_ID: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_TRANSACTIONID");
const ALLOWED_PAYMENT_METHOD: IndexedField =
    IndexedField::new("PAYMENTREQUEST_", "_ALLOWEDPAYMENTMETHOD");
const PAYMENT_ACTION: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_PAYMENTACTION");
const REQUEST_ID: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_PAYMENTREQUESTID");
const SELLER_ID: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_SELLERID");
const SELLER_USERNAME: IndexedField = IndexedField::new("PAYMENTREQUEST_", "_SELLERUSERNAME");
const SELLER_REGISTRATION_DATE: IndexedField =
    IndexedField::new("PAYMENTREQUEST_", "_SELLERREGISTRATIONDATE");

// Line item fields, keyed by `(n, m)`.
const ITEM_NAME: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_NAME", "");
const ITEM_DESCRIPTION: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_DESC", "");
const ITEM_AMOUNT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_AMT", "");
const ITEM_NUMBER: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_NUMBER", "");
const ITEM_QUANTITY: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_QTY", "");
const ITEM_TAX_AMOUNT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_TAXAMT", "");
const ITEM_WEIGHT_VALUE: NestedField =
    NestedField::new("L_PAYMENTREQUEST_", "_ITEMWEIGHTVALUE", "");
const ITEM_WEIGHT_UNIT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMWEIGHTUNIT", "");
const ITEM_LENGTH_VALUE: NestedField =
    NestedField::new("L_PAYMENTREQUEST_", "_ITEMLENGTHVALUE", "");
const ITEM_LENGTH_UNIT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMLENGTHUNIT", "");
const ITEM_WIDTH_VALUE: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMWIDTHVALUE", "");
const ITEM_WIDTH_UNIT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMWIDTHUNIT", "");
const ITEM_HEIGHT_VALUE: NestedField =
    NestedField::new("L_PAYMENTREQUEST_", "_ITEMHEIGHTVALUE", "");
const ITEM_HEIGHT_UNIT: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMHEIGHTUNIT", "");
const ITEM_URL: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMURL", "");
const ITEM_CATEGORY: NestedField = NestedField::new("L_PAYMENTREQUEST_", "_ITEMCATEGORY", "");

/// One line item inside a payment request. Unset fields never reach the
/// wire.
#[derive(Debug, Clone, Default)]
pub struct LineItem {
    name: Option<String>,
    description: Option<String>,
    amount: Option<Decimal>,
    number: Option<String>,
    quantity: Option<u32>,
    tax_amount: Option<Decimal>,
    weight: Option<(Decimal, String)>,
    length: Option<(Decimal, String)>,
    width: Option<(Decimal, String)>,
    height: Option<(Decimal, String)>,
    url: Option<Url>,
    category: Option<String>,
}

impl LineItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Cost of the item, exclusive of tax and shipping.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Your own item number or SKU.
    pub fn number(mut self, number: impl Into<String>) -> Self {
        self.number = Some(number.into());
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn tax_amount(mut self, tax_amount: Decimal) -> Self {
        self.tax_amount = Some(tax_amount);
        self
    }

    pub fn weight(mut self, value: Decimal, unit: impl Into<String>) -> Self {
        self.weight = Some((value, unit.into()));
        self
    }

    pub fn length(mut self, value: Decimal, unit: impl Into<String>) -> Self {
        self.length = Some((value, unit.into()));
        self
    }

    pub fn width(mut self, value: Decimal, unit: impl Into<String>) -> Self {
        self.width = Some((value, unit.into()));
        self
    }

    pub fn height(mut self, value: Decimal, unit: impl Into<String>) -> Self {
        self.height = Some((value, unit.into()));
        self
    }

    pub fn url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    /// `Digital` or `Physical`.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    fn flatten_into(&self, query: &mut FieldMap, n: usize, m: usize) {
        query.insert_opt(ITEM_NAME.at(n, m), self.name.clone());
        query.insert_opt(ITEM_DESCRIPTION.at(n, m), self.description.clone());
        query.insert_opt(ITEM_AMOUNT.at(n, m), self.amount);
        query.insert_opt(ITEM_NUMBER.at(n, m), self.number.clone());
        query.insert_opt(ITEM_QUANTITY.at(n, m), self.quantity);
        query.insert_opt(ITEM_TAX_AMOUNT.at(n, m), self.tax_amount);
        if let Some((value, unit)) = &self.weight {
            query.insert(ITEM_WEIGHT_VALUE.at(n, m), *value);
            query.insert(ITEM_WEIGHT_UNIT.at(n, m), unit.clone());
        }
        if let Some((value, unit)) = &self.length {
            query.insert(ITEM_LENGTH_VALUE.at(n, m), *value);
            query.insert(ITEM_LENGTH_UNIT.at(n, m), unit.clone());
        }
        if let Some((value, unit)) = &self.width {
            query.insert(ITEM_WIDTH_VALUE.at(n, m), *value);
            query.insert(ITEM_WIDTH_UNIT.at(n, m), unit.clone());
        }
        if let Some((value, unit)) = &self.height {
            query.insert(ITEM_HEIGHT_VALUE.at(n, m), *value);
            query.insert(ITEM_HEIGHT_UNIT.at(n, m), unit.clone());
        }
        query.insert_opt(ITEM_URL.at(n, m), self.url.clone());
        query.insert_opt(ITEM_CATEGORY.at(n, m), self.category.clone());
    }
}

/// Express Checkout flows plus the loose account operations PayPal groups
/// under the same API family.
#[derive(Debug)]
pub struct Checkout {
    transport: NvpTransport,
    total_amount: BTreeMap<usize, Decimal>,
    item_total: BTreeMap<usize, Decimal>,
    shipping_amount: BTreeMap<usize, Decimal>,
    shipping_discount: BTreeMap<usize, Decimal>,
    insurance_amount: BTreeMap<usize, Decimal>,
    handling_amount: BTreeMap<usize, Decimal>,
    currency: BTreeMap<usize, Currency>,
    tax_amount: BTreeMap<usize, Decimal>,
    description: BTreeMap<usize, String>,
    custom: BTreeMap<usize, String>,
    invoice_number: BTreeMap<usize, String>,
    notify_url: BTreeMap<usize, Url>,
    multi_shipping: BTreeMap<usize, bool>,
    note_text: BTreeMap<usize, String>,
    soft_descriptor: BTreeMap<usize, String>,
    transaction_id: BTreeMap<usize, String>,
    allowed_payment_method: BTreeMap<usize, String>,
    payment_action: BTreeMap<usize, PaymentAction>,
    request_id: BTreeMap<usize, String>,
    seller_id: BTreeMap<usize, String>,
    seller_username: BTreeMap<usize, String>,
    seller_registration_date: BTreeMap<usize, String>,
    items: BTreeMap<usize, Vec<LineItem>>,
    insurance_option_selected: Option<bool>,
    shipping_option_is_default: Option<bool>,
    shipping_option_amount: Option<Decimal>,
    shipping_option_name: Option<String>,
    email: Option<String>,
    street: Option<String>,
    zip: Option<String>,
    email_subject: Option<String>,
    solution_type: SolutionType,
    all_currencies: bool,
    callback: bool,
    token: Option<String>,
}

impl Checkout {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            total_amount: BTreeMap::new(),
            item_total: BTreeMap::new(),
            shipping_amount: BTreeMap::new(),
            shipping_discount: BTreeMap::new(),
            insurance_amount: BTreeMap::new(),
            handling_amount: BTreeMap::new(),
            currency: BTreeMap::new(),
            tax_amount: BTreeMap::new(),
            description: BTreeMap::new(),
            custom: BTreeMap::new(),
            invoice_number: BTreeMap::new(),
            notify_url: BTreeMap::new(),
            multi_shipping: BTreeMap::new(),
            note_text: BTreeMap::new(),
            soft_descriptor: BTreeMap::new(),
            transaction_id: BTreeMap::new(),
            allowed_payment_method: BTreeMap::new(),
            payment_action: BTreeMap::new(),
            request_id: BTreeMap::new(),
            seller_id: BTreeMap::new(),
            seller_username: BTreeMap::new(),
            seller_registration_date: BTreeMap::new(),
            items: BTreeMap::new(),
            insurance_option_selected: None,
            shipping_option_is_default: None,
            shipping_option_amount: None,
            shipping_option_name: None,
            email: None,
            street: None,
            zip: None,
            email_subject: None,
            solution_type: SolutionType::Sole,
            all_currencies: false,
            callback: false,
            token: None,
        }
    }

    /// Total of the payment request `n`, inclusive of tax, shipping and
    /// handling.
    pub fn total_amount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.total_amount.insert(n, amount);
        self
    }

    /// Sum of the line item amounts of payment request `n`.
    pub fn item_total(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.item_total.insert(n, amount);
        self
    }

    pub fn shipping_amount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.shipping_amount.insert(n, amount);
        self
    }

    pub fn shipping_discount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.shipping_discount.insert(n, amount);
        self
    }

    pub fn insurance_amount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.insurance_amount.insert(n, amount);
        self
    }

    pub fn handling_amount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.handling_amount.insert(n, amount);
        self
    }

    pub fn currency(&mut self, n: usize, currency: Currency) -> &mut Self {
        self.currency.insert(n, currency);
        self
    }

    pub fn tax_amount(&mut self, n: usize, amount: Decimal) -> &mut Self {
        self.tax_amount.insert(n, amount);
        self
    }

    pub fn description(&mut self, n: usize, description: impl Into<String>) -> &mut Self {
        self.description.insert(n, description.into());
        self
    }

    /// Free-form annotation field for your own use.
    pub fn custom(&mut self, n: usize, custom: impl Into<String>) -> &mut Self {
        self.custom.insert(n, custom.into());
        self
    }

    pub fn invoice_number(&mut self, n: usize, invoice_number: impl Into<String>) -> &mut Self {
        self.invoice_number.insert(n, invoice_number.into());
        self
    }

    /// Instant payment notification URL for payment request `n`.
    pub fn notify_url(&mut self, n: usize, notify_url: Url) -> &mut Self {
        self.notify_url.insert(n, notify_url);
        self
    }

    pub fn multi_shipping(&mut self, n: usize, multi_shipping: bool) -> &mut Self {
        self.multi_shipping.insert(n, multi_shipping);
        self
    }

    /// Note to the seller, entered by the buyer during checkout.
    pub fn note_text(&mut self, n: usize, note_text: impl Into<String>) -> &mut Self {
        self.note_text.insert(n, note_text.into());
        self
    }

    /// Text shown on the buyer's card statement.
    pub fn soft_descriptor(&mut self, n: usize, soft_descriptor: impl Into<String>) -> &mut Self {
        self.soft_descriptor.insert(n, soft_descriptor.into());
        self
    }

    pub fn transaction_id(&mut self, n: usize, transaction_id: impl Into<String>) -> &mut Self {
        self.transaction_id.insert(n, transaction_id.into());
        self
    }

    pub fn allowed_payment_method(&mut self, n: usize, method: impl Into<String>) -> &mut Self {
        self.allowed_payment_method.insert(n, method.into());
        self
    }

    /// How the payment is obtained. Finalizing the checkout defaults
    /// request 0 to an immediate sale when unset.
    pub fn payment_action(&mut self, n: usize, payment_action: PaymentAction) -> &mut Self {
        self.payment_action.insert(n, payment_action);
        self
    }

    pub fn request_id(&mut self, n: usize, request_id: impl Into<String>) -> &mut Self {
        self.request_id.insert(n, request_id.into());
        self
    }

    pub fn seller_id(&mut self, n: usize, seller_id: impl Into<String>) -> &mut Self {
        self.seller_id.insert(n, seller_id.into());
        self
    }

    pub fn seller_username(&mut self, n: usize, seller_username: impl Into<String>) -> &mut Self {
        self.seller_username.insert(n, seller_username.into());
        self
    }

    pub fn seller_registration_date(&mut self, n: usize, date: impl Into<String>) -> &mut Self {
        self.seller_registration_date.insert(n, date.into());
        self
    }

    /// Append a line item to payment request `n`; the item index is its
    /// position in the order of addition.
    pub fn add_item(&mut self, n: usize, item: LineItem) -> &mut Self {
        self.items.entry(n).or_default().push(item);
        self
    }

    pub fn insurance_option_selected(&mut self, selected: bool) -> &mut Self {
        self.insurance_option_selected = Some(selected);
        self
    }

    pub fn shipping_option_is_default(&mut self, is_default: bool) -> &mut Self {
        self.shipping_option_is_default = Some(is_default);
        self
    }

    pub fn shipping_option_amount(&mut self, amount: Decimal) -> &mut Self {
        self.shipping_option_amount = Some(amount);
        self
    }

    pub fn shipping_option_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.shipping_option_name = Some(name.into());
        self
    }

    /// Account holder email, for address verification.
    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// First street line of the address to verify.
    pub fn street(&mut self, street: impl Into<String>) -> &mut Self {
        self.street = Some(street.into());
        self
    }

    pub fn zip(&mut self, zip: impl Into<String>) -> &mut Self {
        self.zip = Some(zip.into());
        self
    }

    /// Subject line of the email PayPal sends to mass payment receivers.
    pub fn email_subject(&mut self, email_subject: impl Into<String>) -> &mut Self {
        self.email_subject = Some(email_subject.into());
        self
    }

    pub fn solution_type(&mut self, solution_type: SolutionType) -> &mut Self {
        self.solution_type = solution_type;
        self
    }

    /// Report the balance in every held currency, not just the primary one.
    pub fn all_currencies(&mut self) -> &mut Self {
        self.all_currencies = true;
        self
    }

    /// Enable the instant-update callback flow for this checkout.
    pub fn with_callback(&mut self) -> &mut Self {
        self.callback = true;
        self
    }

    /// Checkout token from a previous set call, for resuming a flow.
    pub fn token(&mut self, token: impl Into<String>) -> &mut Self {
        self.token = Some(token.into());
        self
    }

    /// Start an Express Checkout session. On success the returned token is
    /// recorded for the follow-up calls; in callback mode one immediate
    /// `Callback` request is made and its full response is the success
    /// value. Without callback mode the set response comes back verbatim.
    pub fn set_checkout(
        &mut self,
        return_url: &Url,
        cancel_url: &Url,
    ) -> CustomResult<Outcome<NvpResponse>, NvpError> {
        let mut query = FieldMap::new();
        query.insert(PAYMENT_ACTION.at(0), PaymentAction::Sale);
        query.insert(SOLUTION_TYPE, self.solution_type);
        query.insert(RETURN_URL, return_url.clone());
        query.insert(CANCEL_URL, cancel_url.clone());
        self.flatten_requests(&mut query);
        self.flatten_items(&mut query);

        let response = self.transport.send(SET_CHECKOUT, query)?;
        if response.is_success() {
            if let Some(token) = response.token().filter(|token| !token.is_empty()) {
                self.token = Some(token.to_owned());
                if self.callback {
                    return Ok(Outcome::Success(self.send_callback()?));
                }
            }
        }
        Ok(Outcome::Other(response))
    }

    /// Finalize an approved checkout for the buyer `payer_id`. Fetches the
    /// checkout details first, then executes the payment with the same
    /// token; the payment response comes back whole, transaction id
    /// included. Requires a token from a prior set call.
    pub fn do_checkout(&mut self, payer_id: &str) -> CustomResult<NvpResponse, NvpError> {
        let token = self
            .token
            .clone()
            .ok_or_else(|| report!(NvpError::MissingRequiredField { field_name: "TOKEN" }))?;

        let mut details = FieldMap::new();
        details.insert(consts::TOKEN, token.clone());
        self.transport.send(GET_CHECKOUT, details)?;

        self.payment_action.entry(0).or_insert(PaymentAction::Sale);

        let mut query = FieldMap::new();
        query.insert(consts::TOKEN, token);
        query.insert(PAYER_ID, payer_id);
        self.flatten_requests(&mut query);
        self.transport.send(DO_CHECKOUT, query)
    }

    /// Confirm that a postal address and postal code match the PayPal
    /// account behind the configured email.
    pub fn check_address(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(EMAIL, self.email.clone());
        query.insert_opt(STREET, self.street.clone());
        query.insert_opt(ZIP, self.zip.clone());
        self.transport.send(ADDRESS_VERIFY, query)
    }

    /// Available balance for the merchant account.
    pub fn balance(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert(RETURN_ALL_CURRENCIES, self.all_currencies);
        self.transport.send(GET_BALANCE, query)
    }

    /// PayPal-assigned merchant account number and related account
    /// information.
    pub fn pal_details(&mut self) -> CustomResult<NvpResponse, NvpError> {
        self.transport.send(GET_PAL_DETAILS, FieldMap::new())
    }

    /// Pay one or more PayPal account holders in a single call.
    pub fn mass_payment(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(EMAIL_SUBJECT, self.email_subject.clone());
        self.flatten_requests(&mut query);
        self.transport.send(MASS_PAY, query)
    }

    /// Browser redirect target for buyer approval of the given token.
    pub fn redirect_url(&self, token: &str) -> CustomResult<Url, NvpError> {
        Url::parse_with_params(
            self.transport.environment().redirect_base(),
            [("cmd", "_express-checkout"), ("token", token)],
        )
        .change_context(NvpError::UrlEncodingFailed)
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }

    fn send_callback(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TOKEN, self.token.clone());
        self.flatten_requests(&mut query);
        self.transport.send(CALLBACK, query)
    }

    fn flatten_requests(&self, query: &mut FieldMap) {
        query.insert_each(TOTAL_AMOUNT, &self.total_amount);
        query.insert_each(ITEM_TOTAL, &self.item_total);
        query.insert_each(SHIPPING_AMOUNT, &self.shipping_amount);
        query.insert_each(SHIPPING_DISCOUNT, &self.shipping_discount);
        query.insert_each(INSURANCE_AMOUNT, &self.insurance_amount);
        query.insert_each(HANDLING_AMOUNT, &self.handling_amount);
        query.insert_each(CURRENCY, &self.currency);
        query.insert_each(TAX_AMOUNT, &self.tax_amount);
        query.insert_each(DESCRIPTION, &self.description);
        query.insert_each(CUSTOM, &self.custom);
        query.insert_each(INVOICE_NUMBER, &self.invoice_number);
        query.insert_each(NOTIFY_URL, &self.notify_url);
        query.insert_each(MULTI_SHIPPING, &self.multi_shipping);
        query.insert_each(NOTE_TEXT, &self.note_text);
        query.insert_each(SOFT_DESCRIPTOR, &self.soft_descriptor);
        query.insert_each(TRANSACTION_ID, &self.transaction_id);
        query.insert_each(ALLOWED_PAYMENT_METHOD, &self.allowed_payment_method);
        query.insert_each(PAYMENT_ACTION, &self.payment_action);
        query.insert_each(REQUEST_ID, &self.request_id);
        query.insert_each(SELLER_ID, &self.seller_id);
        query.insert_each(SELLER_USERNAME, &self.seller_username);
        query.insert_each(SELLER_REGISTRATION_DATE, &self.seller_registration_date);
        query.insert_opt(INSURANCE_OPTION_SELECTED, self.insurance_option_selected);
        query.insert_opt(SHIPPING_OPTION_IS_DEFAULT, self.shipping_option_is_default);
        query.insert_opt(SHIPPING_OPTION_AMOUNT, self.shipping_option_amount);
        query.insert_opt(SHIPPING_OPTION_NAME, self.shipping_option_name.clone());
    }

    fn flatten_items(&self, query: &mut FieldMap) {
        for (n, items) in &self.items {
            for (m, item) in items.iter().enumerate() {
                item.flatten_into(query, *n, m);
            }
        }
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

    fn amount(raw: &str) -> Decimal {
        raw.parse().expect("test amount")
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn line_items_keep_independent_indices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&TOKEN=EC-1"))
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout
                .total_amount(0, amount("25.00"))
                .currency(0, Currency::Usd)
                .add_item(
                    0,
                    LineItem::new()
                        .name("Widget")
                        .amount(amount("10.00"))
                        .quantity(1),
                )
                .add_item(
                    0,
                    LineItem::new()
                        .name("Gadget")
                        .amount(amount("15.00"))
                        .quantity(3),
                );
            checkout
                .set_checkout(
                    &url("https://shop.example/return"),
                    &url("https://shop.example/cancel"),
                )
                .expect("set checkout")
        })
        .await
        .expect("join");

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_NAME0").map(String::as_str),
            Some("Widget")
        );
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_AMT0").map(String::as_str),
            Some("10.00")
        );
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_QTY0").map(String::as_str),
            Some("1")
        );
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_NAME1").map(String::as_str),
            Some("Gadget")
        );
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_AMT1").map(String::as_str),
            Some("15.00")
        );
        assert_eq!(
            sent.get("L_PAYMENTREQUEST_0_QTY1").map(String::as_str),
            Some("3")
        );
        // unset item fields are absent, not blank
        assert!(!sent.contains_key("L_PAYMENTREQUEST_0_DESC0"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sparse_payment_request_indices_survive_to_the_wire() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&TOKEN=EC-2"))
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout
                .total_amount(0, amount("5.00"))
                .total_amount(2, amount("7.00"));
            checkout
                .set_checkout(&url("https://a.example/r"), &url("https://a.example/c"))
                .expect("set checkout")
        })
        .await
        .expect("join");

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert_eq!(sent.get("PAYMENTREQUEST_0_AMT").map(String::as_str), Some("5.00"));
        assert_eq!(sent.get("PAYMENTREQUEST_2_AMT").map(String::as_str), Some("7.00"));
        assert!(!sent.contains_key("PAYMENTREQUEST_1_AMT"));
        assert_eq!(sent.get("SOLUTIONTYPE").map(String::as_str), Some("Sole"));
        assert_eq!(
            sent.get("PAYMENTREQUEST_0_PAYMENTACTION").map(String::as_str),
            Some("Sale")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn callback_mode_chains_one_callback_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=SetExpressCheckout"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&TOKEN=EC-3"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=Callback"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&OFFERINSURANCEOPTIONSELECTED=false"))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout.with_callback().total_amount(0, amount("9.99"));
            checkout
                .set_checkout(&url("https://b.example/r"), &url("https://b.example/c"))
                .expect("set checkout")
        })
        .await
        .expect("join");

        let response = outcome.success().expect("callback response");
        assert_eq!(response.get("OFFERINSURANCEOPTIONSELECTED"), Some("false"));

        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 2);
        let callback = decode_body(&requests[1].body);
        assert_eq!(callback.get("TOKEN").map(String::as_str), Some("EC-3"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn do_checkout_without_token_fails_before_any_request() {
        let server = MockServer::start().await;
        let uri = server.uri();
        let error = tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout.do_checkout("PAYER-1").expect_err("missing token")
        })
        .await
        .expect("join");

        assert!(matches!(
            error.current_context(),
            NvpError::MissingRequiredField { field_name: "TOKEN" }
        ));
        assert!(server.received_requests().await.expect("requests").is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn do_checkout_fetches_details_then_pays() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=GetExpressCheckoutDetails"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&EMAIL=b%40e.com"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_string_contains("METHOD=DoExpressCheckoutPayment"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "ACK=Success&PAYMENTINFO_0_TRANSACTIONID=TX-9",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let uri = server.uri();
        let response = tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout
                .token("EC-4")
                .total_amount(0, amount("12.00"))
                .currency(0, Currency::Usd);
            checkout.do_checkout("PAYER-2").expect("do checkout")
        })
        .await
        .expect("join");

        assert_eq!(response.get("PAYMENTINFO_0_TRANSACTIONID"), Some("TX-9"));

        let requests = server.received_requests().await.expect("requests");
        assert_eq!(requests.len(), 2);
        let pay = decode_body(&requests[1].body);
        assert_eq!(pay.get("PAYERID").map(String::as_str), Some("PAYER-2"));
        assert_eq!(
            pay.get("PAYMENTREQUEST_0_PAYMENTACTION").map(String::as_str),
            Some("Sale")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn balance_prunes_the_all_currencies_flag_when_unset() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ACK=Success&L_AMT0=42.00"))
            .mount(&server)
            .await;

        let uri = server.uri();
        tokio::task::spawn_blocking(move || {
            let mut checkout = Checkout::new(transport_to(&uri));
            checkout.balance().expect("balance")
        })
        .await
        .expect("join");

        let requests = server.received_requests().await.expect("requests");
        let sent = decode_body(&requests[0].body);
        assert!(!sent.contains_key("RETURNALLCURRENCIES"));
    }

    #[test]
    fn redirect_url_targets_the_sandbox_approval_page() {
        let checkout = Checkout::new(transport_to("http://localhost:1"));
        let url = checkout.redirect_url("EC-5").expect("redirect url");
        assert_eq!(
            url.as_str(),
            "https://www.sandbox.paypal.com/cgi-bin/webscr?cmd=_express-checkout&token=EC-5"
        );
    }
}
