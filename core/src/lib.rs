//! # Grievance Core
//!
//! Shared domain types for the IT Grievance portal client.
//!
//! This crate holds the vocabulary every other crate in the workspace speaks:
//!
//! - **Identity**: [`Role`], [`UserId`], [`Credentials`]
//! - **Routes**: the application's [`Destination`]s and their
//!   [`AccessRequirement`]s
//! - **Reducer**: the seam the session state machine is written against
//! - **Environment**: the [`Clock`] abstraction
//!
//! ## Architecture Principles
//!
//! - Functional Core, Imperative Shell
//! - Explicit Effects (reducers describe I/O, shells perform it)
//! - Dependency Injection via Environment
//!
//! ## Example
//!
//! ```
//! use grievance_core::{AccessRequirement, Destination, Role};
//!
//! let destination = Destination::from_path("/admin/complaints/42");
//! assert_eq!(destination, Some(Destination::AdminComplaintDetails(42)));
//! assert_eq!(
//!     Destination::AllComplaints.requirement(),
//!     AccessRequirement::ADMIN_ONLY,
//! );
//! assert_eq!(Destination::landing_for(Role::Admin), Destination::AdminDashboard);
//! ```

pub mod identity;
pub mod routes;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use environment::{Clock, SystemClock};
pub use identity::{Credentials, Role, UnknownRole, UserId};
pub use reducer::Reducer;
pub use routes::{AccessRequirement, Destination};
pub use smallvec::{SmallVec, smallvec};

/// Reducer module - the core trait for state machines
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
///
/// Unlike a general-purpose effect system, effects here are plain data owned
/// by each reducer. The shell that owns the reducer interprets them, which
/// keeps every transition testable without any I/O.
pub mod reducer {
    use smallvec::SmallVec;

    /// The Reducer trait
    ///
    /// # Type Parameters
    ///
    /// - `State`: The state this reducer operates on
    /// - `Action`: The inputs this reducer processes
    /// - `Effect`: The side-effect descriptions this reducer emits
    /// - `Environment`: The injected dependencies this reducer reads
    ///
    /// # Example
    ///
    /// ```
    /// use grievance_core::{Reducer, SmallVec, smallvec};
    ///
    /// struct Toggle;
    ///
    /// impl Reducer for Toggle {
    ///     type State = bool;
    ///     type Action = ();
    ///     type Effect = &'static str;
    ///     type Environment = ();
    ///
    ///     fn reduce(&self, state: &mut bool, _action: (), _env: &()) -> SmallVec<[&'static str; 4]> {
    ///         *state = !*state;
    ///         smallvec!["toggled"]
    ///     }
    /// }
    ///
    /// let mut on = false;
    /// let effects = Toggle.reduce(&mut on, (), &());
    /// assert!(on);
    /// assert_eq!(effects.as_slice(), &["toggled"]);
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The effect descriptions this reducer returns
        type Effect;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action against the current state
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Self::Effect; 4]>;
    }
}

/// Environment module - Dependency injection traits
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Token expiry is always evaluated against an injected clock so tests can
    /// move time forward past a token's `exp` claim.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> DateTime<Utc> {
            (**self).now()
        }
    }
}
