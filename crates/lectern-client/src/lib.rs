//! Lectern client
//!
//! `reqwest` implementation of the Lectern backend traits with a persistent
//! session and transparent token refresh.

pub mod api;
pub mod http;
pub mod session;

pub use http::{Auth, HttpClient};
pub use session::{Session, SessionStore};
