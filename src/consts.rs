//! Wire-level constants shared across every API family.

/// Protocol version pinned by the classic NVP API contract.
pub const VERSION: &str = "84.0";

pub const SANDBOX_ENDPOINT: &str = "https://api-3t.sandbox.paypal.com/nvp";
pub const LIVE_ENDPOINT: &str = "https://api-3t.paypal.com/nvp";

/// Buyer-facing redirect bases for Express Checkout.
pub const SANDBOX_REDIRECT: &str = "https://www.sandbox.paypal.com/cgi-bin/webscr";
pub const LIVE_REDIRECT: &str = "https://www.paypal.com/webscr";

// Authentication fields merged into every request. Caller-supplied fields
// sharing these names are dropped before the merge.
pub const USER: &str = "USER";
pub const PWD: &str = "PWD";
pub const SIGNATURE: &str = "SIGNATURE";
pub const VERSION_FIELD: &str = "VERSION";
pub const METHOD: &str = "METHOD";

pub const RESERVED_FIELDS: [&str; 5] = [USER, PWD, SIGNATURE, VERSION_FIELD, METHOD];

// Acknowledgement protocol.
pub const ACK: &str = "ACK";
pub const SUCCESS: &str = "Success";
pub const LONG_MESSAGE: &str = "L_LONGMESSAGE0";

// Correlation identifiers shared by more than one API family.
pub const TOKEN: &str = "TOKEN";
pub const TRANSACTION_ID: &str = "TRANSACTIONID";
pub const AUTHORIZATION_ID: &str = "AUTHORIZATIONID";
pub const PROFILE_ID: &str = "PROFILEID";
pub const HOSTED_BUTTON_ID: &str = "HOSTEDBUTTONID";

pub const AMOUNT: &str = "AMT";
pub const CURRENCY: &str = "CURRENCYCODE";
pub const NOTE: &str = "NOTE";

pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
