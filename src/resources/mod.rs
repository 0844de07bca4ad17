//! One module per classic API family. Each resource owns its transport by
//! composition, accumulates logical fields through fluent setters, and maps
//! every operation to one `send` plus one acknowledgement pass.

mod authorization;
mod billing;
mod button;
mod checkout;
mod direct;
mod recurring;
mod transaction;

pub use authorization::Authorization;
pub use billing::Billing;
pub use button::Button;
pub use checkout::{Checkout, LineItem};
pub use direct::Direct;
pub use recurring::Recurring;
pub use transaction::Transaction;
