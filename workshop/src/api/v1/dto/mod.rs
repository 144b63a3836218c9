//! v1 API Data Transfer Objects.
//!
//! These types define the wire format for the v1 REST API. They are kept
//! separate from the domain models in `src/models/` and handle
//! serialization, validation and conversion.

pub mod admin;
pub mod common;
pub mod gifts;
pub mod sessions;
pub mod shares;

pub use admin::*;
pub use common::*;
pub use gifts::*;
pub use sessions::*;
pub use shares::*;
