pub mod accounts;
pub mod auth;
pub mod error;
pub mod friends;
pub mod messages;
pub mod middleware;
pub mod router;
pub mod scope;

pub use auth::{AppState, AppStateInner};
pub use router::router;
