//! Client for PayPal's classic NVP merchant API.
//!
//! Every API family (direct payment, Express Checkout, recurring profiles,
//! billing agreements, hosted buttons, transaction management) is exposed as
//! a resource object created from one [`Paypal`] factory. Resources are
//! configured fluently, then each operation prunes the accumulated fields,
//! POSTs them form-encoded with the authentication fields merged in, and
//! classifies the `ACK` acknowledgement in the flat response.
//!
//! ```no_run
//! use paypal_nvp::{Credentials, Paypal};
//!
//! # fn main() -> paypal_nvp::CustomResult<(), paypal_nvp::NvpError> {
//! let client = Paypal::new(Credentials::new("merchant", "password", "signature"))?;
//! let mut authorization = client.authorization();
//! authorization
//!     .transaction_id("8XA12345BC678901D")
//!     .amount("24.99".parse().unwrap())
//!     .currency(paypal_nvp::types::Currency::Usd);
//! match authorization.authorize()? {
//!     paypal_nvp::Outcome::Success(transaction_id) => println!("held: {transaction_id}"),
//!     paypal_nvp::Outcome::Other(response) => {
//!         eprintln!("declined: {:?}", response.long_message())
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Transport failures (connection refused, undecodable body) are
//! [`error_stack::Report`] errors; an API-level `ACK` other than `Success`
//! is a normal [`Outcome::Other`] value carrying the full response map.

mod client;
mod consts;
mod errors;
mod fields;
pub mod resources;
mod response;
#[cfg(test)]
mod test_utils;
mod transport;
pub mod types;

pub use client::Paypal;
pub use consts::VERSION;
pub use errors::{CustomResult, NvpError};
pub use fields::{FieldMap, IndexedField, NestedField, Value};
pub use response::{NvpResponse, Outcome};
pub use transport::{Credentials, Environment, NvpTransport, RequestTrace};
