//! Authentication state and token handling.
//!
//! The login and token acquisition flows themselves live on the
//! [`Panoptes`](crate::Panoptes) client, which owns the HTTP session the
//! flows depend on (sign-in is cookie-based). This module holds the state
//! those flows mutate.

mod session;

pub use session::AuthState;
pub(crate) use session::TokenResponse;
