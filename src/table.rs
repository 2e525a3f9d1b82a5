//! The role -> permission table
//!
//! Each (resource, action) pair owns one bit of a u64, so a role's grants
//! are a single mask fixed at compile time.

use crate::model::{Action, Permission, Resource, Role};

use Action::*;
use Resource::*;

/// A set of permissions stored as a bitmask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PermissionSet(u64);

impl PermissionSet {
    pub const EMPTY: PermissionSet = PermissionSet(0);

    pub const fn from_slice(perms: &[Permission]) -> Self {
        let mut mask = 0u64;
        let mut i = 0;
        while i < perms.len() {
            mask |= perms[i].bit();
            i += 1;
        }
        PermissionSet(mask)
    }

    #[inline]
    pub const fn contains(self, perm: Permission) -> bool {
        self.0 & perm.bit() != 0
    }

    #[inline]
    pub const fn is_superset(self, other: PermissionSet) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn bits(self) -> u64 {
        self.0
    }

    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in resource-then-action order
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Resource::ALL
            .into_iter()
            .flat_map(|r| Action::ALL.into_iter().map(move |a| Permission::new(r, a)))
            .filter(move |p| self.contains(*p))
    }

    /// Text forms (`resource:action`) of every member
    pub fn names(self) -> Vec<String> {
        self.iter().map(|p| p.to_string()).collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        PermissionSet(iter.into_iter().fold(0, |m, p| m | p.bit()))
    }
}

const fn p(resource: Resource, action: Action) -> Permission {
    Permission::new(resource, action)
}

const ADMIN_GRANTS: PermissionSet = PermissionSet::from_slice(&[
    p(Users, Read), p(Users, Update), p(Users, Delete),
    p(Content, Read), p(Content, Create), p(Content, Update), p(Content, Delete), p(Content, Publish),
    p(Certificates, Issue), p(Certificates, Revoke),
    p(Analytics, Read),
    p(Profile, Read), p(Profile, Update),
    p(Progress, Read), p(Progress, Update),
]);

// No content:delete or content:publish here; both are admin-only.
const CONTENT_MANAGER_GRANTS: PermissionSet = PermissionSet::from_slice(&[
    p(Content, Read), p(Content, Create), p(Content, Update),
    p(Users, Read),
    p(Analytics, Read),
    p(Profile, Read), p(Profile, Update),
    p(Progress, Read),
]);

const USER_GRANTS: PermissionSet = PermissionSet::from_slice(&[
    p(Content, Read),
    p(Profile, Read), p(Profile, Update),
    p(Progress, Read), p(Progress, Update),
]);

/// The exact grant set for a role
#[inline]
pub const fn permissions_for(role: Role) -> PermissionSet {
    match role {
        Role::Admin => ADMIN_GRANTS,
        Role::ContentManager => CONTENT_MANAGER_GRANTS,
        Role::User => USER_GRANTS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_sizes() {
        assert_eq!(permissions_for(Role::Admin).len(), 15);
        assert_eq!(permissions_for(Role::ContentManager).len(), 8);
        assert_eq!(permissions_for(Role::User).len(), 5);
    }

    #[test]
    fn names_follow_enum_order() {
        assert_eq!(
            permissions_for(Role::User).names(),
            vec!["content:read", "profile:read", "profile:update", "progress:read", "progress:update"]
        );
    }

    #[test]
    fn collect_matches_from_slice() {
        let set: PermissionSet = permissions_for(Role::ContentManager).iter().collect();
        assert_eq!(set, CONTENT_MANAGER_GRANTS);
        assert!(PermissionSet::EMPTY.is_empty());
    }
}
