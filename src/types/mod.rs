//! Type definitions for the TeamSkills matcher
//!
//! Role and member profiles, the match request with its tuning overrides,
//! and the response payload.

mod profile;
mod request;
mod response;

pub use profile::*;
pub use request::*;
pub use response::*;
