mod event;
mod gift;
mod profile;
mod session;

pub use event::*;
pub use gift::*;
pub use profile::*;
pub use session::*;
