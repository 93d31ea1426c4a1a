//! Route table of the portal.
//!
//! Every page the client can show is a [`Destination`]. Each destination
//! carries a fixed [`AccessRequirement`] that the session route guard
//! evaluates before the page renders.

use crate::identity::Role;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access flags for a destination.
///
/// `admin_only` and `user_only` imply `requires_auth`; the constants below
/// are the only combinations the route table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// Destination needs a signed-in session.
    pub requires_auth: bool,
    /// Destination is restricted to administrators.
    pub admin_only: bool,
    /// Destination is restricted to non-administrators.
    pub user_only: bool,
}

impl AccessRequirement {
    /// Anyone may render the destination.
    pub const PUBLIC: Self = Self::new(false, false, false);

    /// Any signed-in account may render the destination.
    pub const AUTHENTICATED: Self = Self::new(true, false, false);

    /// Only administrators may render the destination.
    pub const ADMIN_ONLY: Self = Self::new(true, true, false);

    /// Only non-administrators may render the destination.
    pub const USER_ONLY: Self = Self::new(true, false, true);

    /// Build a requirement from raw flags.
    ///
    /// Role restrictions always imply authentication.
    #[must_use]
    pub const fn new(requires_auth: bool, admin_only: bool, user_only: bool) -> Self {
        Self {
            requires_auth: requires_auth || admin_only || user_only,
            admin_only,
            user_only,
        }
    }
}

/// A page of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    /// Public landing page (`/`).
    Welcome,
    /// Sign-in page (`/login`).
    Login,
    /// Account registration (`/register`).
    Register,
    /// Complaint submission form (`/new-complaint`).
    NewComplaint,
    /// The signed-in user's complaints (`/my-complaints`).
    MyComplaints,
    /// A single complaint as seen by its author (`/complaints/{id}`).
    ComplaintDetails(u64),
    /// Administrator dashboard (`/admin`).
    AdminDashboard,
    /// A single complaint as seen by an administrator (`/admin/complaints/{id}`).
    AdminComplaintDetails(u64),
    /// Every complaint in the system (`/all-complaints`).
    AllComplaints,
}

impl Destination {
    /// Path of the destination.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Welcome => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::NewComplaint => "/new-complaint".to_string(),
            Self::MyComplaints => "/my-complaints".to_string(),
            Self::ComplaintDetails(id) => format!("/complaints/{id}"),
            Self::AdminDashboard => "/admin".to_string(),
            Self::AdminComplaintDetails(id) => format!("/admin/complaints/{id}"),
            Self::AllComplaints => "/all-complaints".to_string(),
        }
    }

    /// Resolve a path to a destination.
    ///
    /// Query strings, fragments and a trailing slash are ignored. Returns
    /// `None` for paths outside the route table.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Self::Welcome),
            ["login"] => Some(Self::Login),
            ["register"] => Some(Self::Register),
            ["new-complaint"] => Some(Self::NewComplaint),
            ["my-complaints"] => Some(Self::MyComplaints),
            ["complaints", id] => id.parse().ok().map(Self::ComplaintDetails),
            ["admin"] => Some(Self::AdminDashboard),
            ["admin", "complaints", id] => id.parse().ok().map(Self::AdminComplaintDetails),
            ["all-complaints"] => Some(Self::AllComplaints),
            _ => None,
        }
    }

    /// Access requirement of the destination.
    #[must_use]
    pub const fn requirement(&self) -> AccessRequirement {
        match self {
            Self::Welcome | Self::Login | Self::Register => AccessRequirement::PUBLIC,
            Self::NewComplaint | Self::MyComplaints | Self::ComplaintDetails(_) => {
                AccessRequirement::AUTHENTICATED
            }
            Self::AdminDashboard | Self::AdminComplaintDetails(_) | Self::AllComplaints => {
                AccessRequirement::ADMIN_ONLY
            }
        }
    }

    /// Default landing page for a role.
    ///
    /// Used after sign-in and when the route guard bounces an account away
    /// from a page reserved for the other role.
    #[must_use]
    pub const fn landing_for(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminDashboard,
            Role::User => Self::MyComplaints,
        }
    }

    /// Entries of the navigation bar.
    ///
    /// `None` means no one is signed in.
    #[must_use]
    pub fn menu_for(role: Option<Role>) -> Vec<Self> {
        match role {
            None => vec![Self::Welcome, Self::Login, Self::Register],
            Some(Role::User) => vec![Self::Welcome, Self::MyComplaints, Self::NewComplaint],
            Some(Role::Admin) => vec![Self::Welcome, Self::AllComplaints],
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
