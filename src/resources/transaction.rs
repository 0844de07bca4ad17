//! Transaction search, detail, refund and pending-status management.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use time::OffsetDateTime;

use crate::{
    consts,
    errors::{CustomResult, NvpError},
    fields::FieldMap,
    response::NvpResponse,
    transport::{NvpTransport, RequestTrace},
    types::{self, Currency, RefundType, TransactionAction, TransactionStatus},
};

const GET_DETAIL: &str = "GetTransactionDetails";
const MANAGE_STATUS: &str = "ManagePendingTransactionStatus";
const REFUND_TRANSACTION: &str = "RefundTransaction";
const SEARCH: &str = "TransactionSearch";

const ACTION: &str = "ACTION";
const REFUND_TYPE: &str = "REFUNDTYPE";
const STORE_ID: &str = "STOREID";
const START: &str = "STARTDATE";
const END: &str = "ENDDATE";
const EMAIL: &str = "EMAIL";
const RECEIVER: &str = "RECEIVER";
const RECEIPT_ID: &str = "RECEIPTID";
const CARD_NUMBER: &str = "ACCT";
const STATUS: &str = "STATUS";

/// Query and act on past transactions. All operations return the full
/// response map; none narrows to a single field.
#[derive(Debug)]
pub struct Transaction {
    transport: NvpTransport,
    action: Option<TransactionAction>,
    refund_type: Option<RefundType>,
    amount: Option<Decimal>,
    currency: Option<Currency>,
    note: Option<String>,
    store_id: Option<String>,
    start: Option<OffsetDateTime>,
    end: Option<OffsetDateTime>,
    email: Option<String>,
    receiver: Option<String>,
    receipt_id: Option<String>,
    transaction_id: Option<String>,
    card_number: Option<SecretString>,
    status: Option<TransactionStatus>,
}

impl Transaction {
    pub(crate) fn new(transport: NvpTransport) -> Self {
        Self {
            transport,
            action: None,
            refund_type: None,
            amount: None,
            currency: None,
            note: None,
            store_id: None,
            start: None,
            end: None,
            email: None,
            receiver: None,
            receipt_id: None,
            transaction_id: None,
            card_number: None,
            status: None,
        }
    }

    /// Accept or deny, for transactions held by fraud management filters.
    pub fn action(&mut self, action: TransactionAction) -> &mut Self {
        self.action = Some(action);
        self
    }

    /// Full refund is the API default when unset.
    pub fn refund_type(&mut self, refund_type: RefundType) -> &mut Self {
        self.refund_type = Some(refund_type);
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

    /// Custom memo about the refund.
    pub fn note(&mut self, note: impl Into<String>) -> &mut Self {
        self.note = Some(note.into());
        self
    }

    /// Merchant store id; required for point-of-sale transactions.
    pub fn store_id(&mut self, store_id: impl Into<String>) -> &mut Self {
        self.store_id = Some(store_id.into());
        self
    }

    /// Earliest transaction date included in a search.
    pub fn start_date(&mut self, start: OffsetDateTime) -> &mut Self {
        self.start = Some(start);
        self
    }

    /// Latest transaction date included in a search.
    pub fn end_date(&mut self, end: OffsetDateTime) -> &mut Self {
        self.end = Some(end);
        self
    }

    /// Search by the buyer's email address.
    pub fn email(&mut self, email: impl Into<String>) -> &mut Self {
        self.email = Some(email.into());
        self
    }

    /// Search by the receiver's email address.
    pub fn receiver(&mut self, receiver: impl Into<String>) -> &mut Self {
        self.receiver = Some(receiver.into());
        self
    }

    /// Search by the PayPal Account Optional receipt id.
    pub fn receipt_id(&mut self, receipt_id: impl Into<String>) -> &mut Self {
        self.receipt_id = Some(receipt_id.into());
        self
    }

    pub fn transaction_id(&mut self, transaction_id: impl Into<String>) -> &mut Self {
        self.transaction_id = Some(transaction_id.into());
        self
    }

    /// Search by card number.
    pub fn card_number(&mut self, card_number: impl Into<String>) -> &mut Self {
        self.card_number = Some(SecretString::new(card_number.into()));
        self
    }

    /// Search by transaction status.
    pub fn status(&mut self, status: TransactionStatus) -> &mut Self {
        self.status = Some(status);
        self
    }

    /// Information about one specific transaction.
    pub fn detail(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TRANSACTION_ID, self.transaction_id.clone());
        self.transport.send(GET_DETAIL, query)
    }

    /// Accept or deny a pending transaction held by fraud filters.
    pub fn manage_status(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TRANSACTION_ID, self.transaction_id.clone());
        query.insert_opt(ACTION, self.action);
        self.transport.send(MANAGE_STATUS, query)
    }

    /// Refund the account holder behind a transaction.
    pub fn refund(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        query.insert_opt(consts::TRANSACTION_ID, self.transaction_id.clone());
        query.insert_opt(REFUND_TYPE, self.refund_type);
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::CURRENCY, self.currency);
        query.insert_opt(consts::NOTE, self.note.clone());
        query.insert_opt(STORE_ID, self.store_id.clone());
        self.transport.send(REFUND_TRANSACTION, query)
    }

    /// Search the transaction history. The API caps the result at 100
    /// transactions.
    pub fn search(&mut self) -> CustomResult<NvpResponse, NvpError> {
        let mut query = FieldMap::new();
        if let Some(start) = self.start {
            query.insert(START, types::format_utc(start)?);
        }
        if let Some(end) = self.end {
            query.insert(END, types::format_utc(end)?);
        }
        query.insert_opt(EMAIL, self.email.clone());
        query.insert_opt(RECEIVER, self.receiver.clone());
        query.insert_opt(RECEIPT_ID, self.receipt_id.clone());
        query.insert_opt(consts::TRANSACTION_ID, self.transaction_id.clone());
        query.insert_opt(
            CARD_NUMBER,
            self.card_number
                .as_ref()
                .map(|number| number.expose_secret().to_owned()),
        );
        query.insert_opt(consts::AMOUNT, self.amount);
        query.insert_opt(consts::CURRENCY, self.currency);
        query.insert_opt(STATUS, self.status);
        self.transport.send(SEARCH, query)
    }

    pub fn trace(&self) -> Option<&RequestTrace> {
        self.transport.trace()
    }
}
