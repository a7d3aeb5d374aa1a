//! Protocol objects.
//!
//! Only the elements the SP actually produces or consumes are modelled;
//! anything else in an inbound document is ignored by the parser.

mod assertion;
mod authn_request;
pub mod constants;
mod logout;
mod message;
mod name_id;
mod response;
mod status;

pub use assertion::*;
pub use authn_request::*;
pub use constants::*;
pub use logout::*;
pub use message::*;
pub use name_id::*;
pub use response::*;
pub use status::*;
