//! Generator Plugin API
//!
//! JSON request and response types exchanged with the ApplicationSet
//! plugin generator on `POST /api/v1/getparams.execute`.
//!
//! Every struct rejects unknown fields: a client speaking a newer or
//! different shape fails at decode time instead of silently losing input.
//! An explicit `null` reads the same as an absent field.

mod de;
pub mod request;
pub mod response;
pub mod selector;

pub use request::*;
pub use response::*;
pub use selector::*;
