//! Route guard.
//!
//! [`decide`] is a pure function over the session as the guard sees it and
//! the access requirement of a destination. The manager feeds it after
//! sequencing readiness, the lazy expiry check and the role lookup; see
//! `SessionManager::authorize`.

use crate::state::SessionStatus;
use grievance_core::{AccessRequirement, Destination, Role};

/// Session as seen by the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardInput {
    /// Initialization has not completed.
    Loading,
    /// Nobody is signed in.
    Anonymous,
    /// A live session with this role.
    Authenticated {
        /// Role of the signed-in account
        role: Role,
    },
}

impl GuardInput {
    /// Build the input from a status and the role of the current session.
    ///
    /// A role without `Authenticated` status (or the reverse) is treated as
    /// anonymous.
    #[must_use]
    pub const fn from_status(status: SessionStatus, role: Option<Role>) -> Self {
        match (status, role) {
            (SessionStatus::Uninitialized | SessionStatus::Loading, _) => Self::Loading,
            (SessionStatus::Authenticated, Some(role)) => Self::Authenticated { role },
            _ => Self::Anonymous,
        }
    }
}

/// What the shell should do with a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Show a neutral loading view; no decision yet.
    RenderLoading,
    /// Show the destination.
    Render,
    /// Go somewhere else instead.
    Redirect(Destination),
}

/// Decide whether `requirement` is met. First match wins:
///
/// 1. initialization incomplete → [`GuardOutcome::RenderLoading`]
/// 2. authentication required, nobody signed in → redirect to `sign_in`
/// 3. admin required, account is not admin → redirect to the user landing
/// 4. user-only, account is admin → redirect to the admin landing
/// 5. otherwise → [`GuardOutcome::Render`]
///
/// # Example
///
/// ```
/// use grievance_core::{AccessRequirement, Destination, Role};
/// use grievance_session::guard::{GuardInput, GuardOutcome, decide};
///
/// let outcome = decide(
///     GuardInput::Authenticated { role: Role::User },
///     AccessRequirement::ADMIN_ONLY,
///     Destination::Login,
/// );
/// assert_eq!(outcome, GuardOutcome::Redirect(Destination::MyComplaints));
/// ```
#[must_use]
pub const fn decide(
    input: GuardInput,
    requirement: AccessRequirement,
    sign_in: Destination,
) -> GuardOutcome {
    let role = match input {
        GuardInput::Loading => return GuardOutcome::RenderLoading,
        GuardInput::Anonymous if requirement.requires_auth => {
            return GuardOutcome::Redirect(sign_in);
        }
        GuardInput::Anonymous => return GuardOutcome::Render,
        GuardInput::Authenticated { role } => role,
    };

    if requirement.admin_only && !role.is_admin() {
        return GuardOutcome::Redirect(Destination::landing_for(Role::User));
    }

    if requirement.user_only && role.is_admin() {
        return GuardOutcome::Redirect(Destination::landing_for(Role::Admin));
    }

    GuardOutcome::Render
}
