//! Typed values for logical fields.
//!
//! The wire takes these as free-form string tokens; here each enumerated
//! token is a real enum, so an invalid value cannot be configured in the
//! first place.

use error_stack::ResultExt;
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

use crate::{
    errors::{CustomResult, NvpError},
    fields::Value,
};

macro_rules! wire_token {
    ($($name:ident),+ $(,)?) => {
        $(
            impl From<$name> for Value {
                fn from(value: $name) -> Self {
                    Self::Text(value.to_string())
                }
            }
        )+
    };
}

/// Currencies accepted by the classic API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Currency {
    Aud,
    Brl,
    Cad,
    Chf,
    Czk,
    Dkk,
    Eur,
    Gbp,
    Hkd,
    Huf,
    Ils,
    Jpy,
    Mxn,
    Myr,
    Nok,
    Nzd,
    Php,
    Pln,
    Sek,
    Sgd,
    Thb,
    Try,
    Twd,
    Usd,
}

/// DoCapture settlement intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CompleteType {
    /// This is the last capture you intend to make.
    Complete,
    /// Additional captures will follow.
    NoComplete,
}

/// Billing cycle unit for recurring profiles and installment buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BillingPeriod {
    Day,
    Week,
    SemiMonth,
    Month,
    Year,
}

/// ManageRecurringPaymentsProfileStatus action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ProfileAction {
    Cancel,
    Suspend,
    Reactivate,
}

/// RefundTransaction refund kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RefundType {
    Full,
    Partial,
    ExternalDispute,
    Other,
}

/// Accept or deny a transaction held by fraud management filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TransactionAction {
    Accept,
    Deny,
}

/// TransactionSearch status filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum TransactionStatus {
    Pending,
    Processing,
    Success,
    Denied,
    Reversed,
}

/// Card networks accepted for direct payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CardType {
    Visa,
    MasterCard,
    Discover,
    Amex,
    Maestro,
}

/// Express Checkout payment disposition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PaymentAction {
    Sale,
    Authorization,
    Order,
}

/// Whether the buyer needs a PayPal account to check out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SolutionType {
    /// PayPal account optional.
    Sole,
    /// PayPal account required.
    Mark,
}

/// Billing agreement kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BillingType {
    RecurringPayments,
    MerchantInitiatedBilling,
    MerchantInitiatedBillingSingleAgreement,
}

/// Billing agreement funding constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum PaymentType {
    Any,
    InstantOnly,
}

/// Hosted button kind for the Button Manager API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ButtonType {
    BuyNow,
    Cart,
    GiftCertificate,
    Subscribe,
    Donate,
    Unsubscribe,
    ViewCart,
    PaymentPlan,
    AutoBilling,
    Payment,
}

/// Installment option kind for button menu items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum OptionType {
    Full,
    Variable,
    Emi,
}

wire_token!(
    Currency,
    CompleteType,
    BillingPeriod,
    ProfileAction,
    RefundType,
    TransactionAction,
    TransactionStatus,
    CardType,
    PaymentAction,
    SolutionType,
    BillingType,
    PaymentType,
    ButtonType,
    OptionType,
);

const UTC_DATE_TIME: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z");

const PROFILE_START: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// UTC timestamp in the `YYYY-MM-DDTHH:MM:SSZ` shape search filters expect.
pub(crate) fn format_utc(timestamp: OffsetDateTime) -> CustomResult<String, NvpError> {
    timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(&UTC_DATE_TIME)
        .change_context(NvpError::UrlEncodingFailed)
}

/// Profile start date in the `YYYY-MM-DD HH:MM:SS` shape the recurring
/// profile API expects.
pub(crate) fn format_profile_start(timestamp: OffsetDateTime) -> CustomResult<String, NvpError> {
    timestamp
        .to_offset(time::UtcOffset::UTC)
        .format(&PROFILE_START)
        .change_context(NvpError::UrlEncodingFailed)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn currency_and_button_tokens_serialize_uppercase() {
        assert_eq!(Currency::Usd.to_string(), "USD");
        assert_eq!(ButtonType::BuyNow.to_string(), "BUYNOW");
        assert_eq!(OptionType::Emi.to_string(), "EMI");
    }

    #[test]
    fn mixed_case_tokens_keep_their_documented_spelling() {
        assert_eq!(CompleteType::NoComplete.to_string(), "NoComplete");
        assert_eq!(BillingPeriod::SemiMonth.to_string(), "SemiMonth");
        assert_eq!(PaymentType::InstantOnly.to_string(), "InstantOnly");
    }

    #[test]
    fn search_dates_format_as_utc() {
        let formatted = format_utc(datetime!(2014-02-03 04:05:06 UTC)).expect("format");
        assert_eq!(formatted, "2014-02-03T04:05:06Z");
    }

    #[test]
    fn profile_start_uses_space_separator() {
        let formatted = format_profile_start(datetime!(2014-02-03 04:05:06 UTC)).expect("format");
        assert_eq!(formatted, "2014-02-03 04:05:06");
    }
}
