//! SMS provider module
//!
//! Fetches inbound messages from the messaging provider that receives
//! the verification texts.

pub mod message;
pub mod source;
pub mod twilio;

// Public re-exports
pub use message::{latest_inbound, Direction, Message};
pub use source::{MessageQuery, MessageSource};
pub use twilio::TwilioMessageSource;
