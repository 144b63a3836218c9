pub mod admin;
pub mod gifts;
pub(crate) mod health;
pub mod pipeline;
pub mod sessions;
pub mod shares;

pub use health::health_check;
