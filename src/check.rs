//! Access check (pure, no I/O, no caching)

use crate::model::{Action, Permission, Resource, Role};
use crate::table::permissions_for;

/// True iff `role` is granted `action` on `resource`
#[inline]
pub fn is_allowed(role: Role, resource: Resource, action: Action) -> bool {
    check(role, Permission::new(resource, action))
}

/// Same as `is_allowed`, over a Permission value
#[inline]
pub fn check(role: Role, perm: Permission) -> bool {
    permissions_for(role).contains(perm)
}
