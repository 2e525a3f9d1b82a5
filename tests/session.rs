//! Session context tests: default-deny until the role is confirmed

use std::cell::RefCell;
use std::collections::HashMap;

use lessongate::*;

/// In-memory role source; profiles can change between loads
#[derive(Default)]
struct MemSource {
    profiles: RefCell<HashMap<String, Profile>>,
    fail: RefCell<bool>,
}

impl MemSource {
    fn with(profiles: &[Profile]) -> Self {
        let s = Self::default();
        for p in profiles {
            s.profiles.borrow_mut().insert(p.id.clone(), p.clone());
        }
        s
    }

    fn set_role(&self, id: &str, role: Role) {
        self.profiles.borrow_mut().get_mut(id).unwrap().role = role;
    }
}

impl ProfileSource for MemSource {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        if *self.fail.borrow() {
            return Err(GateError::Store("backend unavailable".into()));
        }
        Ok(self.profiles.borrow().get(user_id).cloned())
    }
}

fn denies_everything(s: &SessionContext) -> bool {
    Resource::ALL
        .into_iter()
        .all(|r| Action::ALL.into_iter().all(|a| !s.has_permission(r, a)))
}

#[test]
fn restoring_session_denies() {
    let s = SessionContext::new();
    assert_eq!(s.state(), &SessionState::Restoring);
    assert!(s.is_loading());
    assert!(s.confirmed_role().is_none());
    assert!(denies_everything(&s));
}

#[test]
fn signed_out_denies() {
    let mut s = SessionContext::new();
    s.finish_restore(None);
    assert_eq!(s.state(), &SessionState::SignedOut);
    assert!(!s.is_loading());
    assert!(denies_everything(&s));
}

#[test]
fn authenticated_but_not_hydrated_denies() {
    let mut s = SessionContext::new();
    s.finish_restore(Some("u1"));
    assert_eq!(s.user_id(), Some("u1"));
    assert!(s.profile().is_none());
    assert!(s.is_loading());
    assert!(denies_everything(&s));
}

#[test]
fn hydrated_session_uses_the_table() {
    let src = MemSource::with(&[Profile::new("u1", "Ada", Role::User)]);
    let mut s = SessionContext::new();
    s.finish_restore(Some("u1"));
    let role = s.hydrate(&src).unwrap().unwrap();

    assert_eq!(role.role(), Role::User);
    assert!(!s.is_loading());
    assert!(s.has_permission(Resource::Profile, Action::Update));
    assert!(!s.has_permission(Resource::Content, Action::Publish));
    assert_eq!(s.has_permission(Resource::Progress, Action::Update), role.has_permission(Resource::Progress, Action::Update));
}

#[test]
fn missing_profile_stays_unhydrated() {
    let src = MemSource::default();
    let mut s = SessionContext::new();
    s.sign_in("ghost");
    assert!(s.hydrate(&src).unwrap().is_none());
    assert!(denies_everything(&s));
}

#[test]
fn hydrate_without_user_is_a_no_op() {
    let src = MemSource::with(&[Profile::new("u1", "Ada", Role::Admin)]);
    let mut s = SessionContext::new();
    assert!(s.hydrate(&src).unwrap().is_none());
    assert_eq!(s.state(), &SessionState::Restoring);
}

#[test]
fn failed_reload_drops_the_old_role() {
    let src = MemSource::with(&[Profile::new("u1", "Ada", Role::Admin)]);
    let mut s = SessionContext::new();
    s.sign_in("u1");
    s.hydrate(&src).unwrap();
    assert!(s.has_permission(Resource::Users, Action::Delete));

    *src.fail.borrow_mut() = true;
    assert!(s.reload_profile(&src).is_err());
    assert!(s.is_loading());
    assert!(denies_everything(&s));
}

#[test]
fn role_change_is_seen_on_next_check() {
    let src = MemSource::with(&[Profile::new("u1", "Ada", Role::User)]);
    let mut s = SessionContext::new();
    s.sign_in("u1");
    s.hydrate(&src).unwrap();
    assert!(!s.has_permission(Resource::Content, Action::Create));

    src.set_role("u1", Role::ContentManager);
    s.reload_profile(&src).unwrap();
    assert!(s.has_permission(Resource::Content, Action::Create));
    // content_manager has no progress:update even though user did
    assert!(!s.has_permission(Resource::Progress, Action::Update));
}

#[test]
fn sign_out_forgets_profile() {
    let src = MemSource::with(&[Profile::new("u1", "Ada", Role::Admin)]);
    let mut s = SessionContext::new();
    s.sign_in("u1");
    s.hydrate(&src).unwrap();
    s.sign_out();
    assert!(s.profile().is_none());
    assert!(s.user_id().is_none());
    assert!(denies_everything(&s));
}

#[test]
fn sign_in_as_someone_else_resets_hydration() {
    let src = MemSource::with(&[
        Profile::new("a", "Admin", Role::Admin),
        Profile::new("b", "Bea", Role::User),
    ]);
    let mut s = SessionContext::new();
    s.sign_in("a");
    s.hydrate(&src).unwrap();
    s.sign_in("b");
    assert!(denies_everything(&s));
    s.hydrate(&src).unwrap();
    assert_eq!(s.confirmed_role().map(|r| r.role()), Some(Role::User));
}
