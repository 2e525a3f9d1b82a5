//! lessongate - role-based access control for a learning platform
//!
//! A fixed role -> permission table, a pure check over it, and a session
//! context that refuses everything until the user's role is confirmed.
//!
//! ```
//! use lessongate::{is_allowed, Action, Resource, Role};
//!
//! assert!(is_allowed(Role::Admin, Resource::Content, Action::Publish));
//! assert!(!is_allowed(Role::User, Resource::Content, Action::Publish));
//! ```

pub mod check;
pub mod error;
pub mod model;
pub mod session;
pub mod store;
pub mod table;

pub use check::{check, is_allowed};
pub use error::{GateError, Result};
pub use model::{Action, Permission, Resource, Role};
pub use session::{ConfirmedRole, Profile, ProfileSource, SessionContext, SessionState};
pub use store::{is_valid_user_id, ProfileStore, ASSIGN_ROLE, MAX_USER_ID_LEN};
pub use table::{permissions_for, PermissionSet};
