//! LMDB-backed profile store
//!
//! Layout: one `profiles` database, `user_id -> role|display_name`.
//! A stored role only changes through `assign_role`.

use std::path::Path;

use heed::types::Str;
use heed::{Database, Env, EnvOpenOptions, RoTxn, RwTxn};
use tracing::{info, warn};

use crate::check::is_allowed;
use crate::error::{err, GateError, Result};
use crate::model::{Action, Permission, Resource, Role};
use crate::session::{Profile, ProfileSource};

type Db = Database<Str, Str>;

/// Permission an actor needs to change someone's role
pub const ASSIGN_ROLE: Permission = Permission::new(Resource::Users, Action::Update);

/// LMDB's default maximum key size
pub const MAX_USER_ID_LEN: usize = 511;

pub struct ProfileStore {
    env: Env,
    profiles: Db,
}

/// Ids LMDB can hold as keys: non-empty, at most MAX_USER_ID_LEN bytes
pub fn is_valid_user_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_USER_ID_LEN
}

fn encode(profile: &Profile) -> String {
    format!("{}|{}", profile.role, profile.display_name)
}

fn decode(id: &str, value: &str) -> Result<Profile> {
    let (role, name) = value
        .split_once('|')
        .ok_or_else(|| GateError::Corrupted(format!("{}: {}", id, value)))?;
    let role = role
        .parse::<Role>()
        .map_err(|_| GateError::Corrupted(format!("{}: bad role {}", id, role)))?;
    Ok(Profile::new(id, name, role))
}

fn load(db: &Db, tx: &RoTxn, id: &str) -> Result<Option<Profile>> {
    if !is_valid_user_id(id) {
        return Ok(None);
    }
    match db.get(tx, id).map_err(err)? {
        Some(v) => decode(id, v).map(Some),
        None => Ok(None),
    }
}

impl ProfileStore {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path).map_err(err)?;
        // SAFETY: LMDB requires no other processes access this path concurrently during open.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 26)
                .max_dbs(1)
                .open(path)
                .map_err(err)?
        };
        let mut tx = env.write_txn().map_err(err)?;
        let profiles: Db = env.create_database(&mut tx, Some("profiles")).map_err(err)?;
        tx.commit().map_err(err)?;
        info!(path = %path.display(), "profile store opened");
        Ok(Self { env, profiles })
    }

    fn read<T, F: FnOnce(&Db, &RoTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        f(&self.profiles, &self.env.read_txn().map_err(err)?)
    }

    fn write<T, F: FnOnce(&Db, &mut RwTxn) -> Result<T>>(&self, f: F) -> Result<T> {
        let mut tx = self.env.write_txn().map_err(err)?;
        let r = f(&self.profiles, &mut tx)?;
        tx.commit().map_err(err)?;
        Ok(r)
    }

    /// Insert a new profile. Fails if the id is taken; existing roles are
    /// never overwritten here.
    pub fn create_profile(&self, profile: &Profile) -> Result<()> {
        if !is_valid_user_id(&profile.id) {
            return Err(GateError::InvalidUserId(profile.id.clone()));
        }
        self.write(|db, tx| {
            if db.get(tx, &profile.id).map_err(err)?.is_some() {
                return Err(GateError::UserExists(profile.id.clone()));
            }
            db.put(tx, &profile.id, &encode(profile)).map_err(err)
        })
    }

    /// Change a display name, keeping the stored role
    pub fn rename_profile(&self, user_id: &str, display_name: &str) -> Result<Profile> {
        self.write(|db, tx| {
            let mut profile = load(db, tx, user_id)?
                .ok_or_else(|| GateError::UnknownUser(user_id.to_string()))?;
            profile.display_name = display_name.to_string();
            db.put(tx, user_id, &encode(&profile)).map_err(err)?;
            Ok(profile)
        })
    }

    /// Unknown or invalid ids read as "no profile"
    pub fn get_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.read(|db, tx| load(db, tx, user_id))
    }

    pub fn delete_profile(&self, user_id: &str) -> Result<bool> {
        if !is_valid_user_id(user_id) {
            return Ok(false);
        }
        self.write(|db, tx| db.delete(tx, user_id).map_err(err))
    }

    /// All profiles, ordered by user id
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.read(|db, tx| {
            let mut r = Vec::new();
            for item in db.iter(tx).map_err(err)? {
                let (k, v) = item.map_err(err)?;
                r.push(decode(k, v)?);
            }
            Ok(r)
        })
    }

    /// Remove every profile (for testing)
    pub fn clear(&self) -> Result<()> {
        self.write(|db, tx| db.clear(tx).map_err(err))
    }

    /// Change a user's role on behalf of `actor_id`.
    ///
    /// The actor's role is read inside the same write transaction as the
    /// update, and must carry `users:update`. An actor without a profile
    /// is refused.
    pub fn assign_role(&self, actor_id: &str, user_id: &str, role: Role) -> Result<Profile> {
        let updated = self.write(|db, tx| {
            let actor_role = load(db, tx, actor_id)?.map(|p| p.role);
            let allowed = actor_role
                .map(|r| is_allowed(r, ASSIGN_ROLE.resource, ASSIGN_ROLE.action))
                .unwrap_or(false);
            if !allowed {
                let shown = actor_role.map(|r| r.to_string()).unwrap_or_else(|| "(no profile)".into());
                warn!(actor = actor_id, role = %shown, user = user_id, "role assignment refused");
                return Err(GateError::Forbidden { role: shown, permission: ASSIGN_ROLE.to_string() });
            }
            let mut profile = load(db, tx, user_id)?
                .ok_or_else(|| GateError::UnknownUser(user_id.to_string()))?;
            profile.role = role;
            db.put(tx, user_id, &encode(&profile)).map_err(err)?;
            Ok(profile)
        })?;
        info!(actor = actor_id, user = user_id, %role, "role assigned");
        Ok(updated)
    }
}

impl ProfileSource for ProfileStore {
    fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.get_profile(user_id)
    }
}
