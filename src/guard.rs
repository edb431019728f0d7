//! Route guard: a synchronous, local presence check of the session token.
//! It never validates against the backend, so a revoked token only shows up
//! when a protected fetch comes back 401.

use crate::logging::{json_log, obj, v_str};
use crate::state::AuthSession;
use crate::views::View;

pub const LOGIN_PATH: &str = "/login";
pub const DEFAULT_PROTECTED_PATH: &str = View::Overview.path();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    RedirectToLogin,
}

impl Access {
    /// Where the client should navigate given this decision.
    pub fn target(&self) -> &'static str {
        match self {
            Access::Granted => DEFAULT_PROTECTED_PATH,
            Access::RedirectToLogin => LOGIN_PATH,
        }
    }
}

pub fn check(session: &AuthSession) -> Access {
    if session.is_authenticated() {
        Access::Granted
    } else {
        json_log(
            "guard",
            obj(&[("event", v_str("redirect")), ("target", v_str(LOGIN_PATH))]),
        );
        Access::RedirectToLogin
    }
}
