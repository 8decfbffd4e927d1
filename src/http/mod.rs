//! HTTP surface: routes, extractors, and shared state.

mod extract;
mod routes;

pub use extract::CurrentAccount;
pub use routes::{AppState, router};
