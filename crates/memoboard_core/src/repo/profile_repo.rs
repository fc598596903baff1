//! Profile repository contract and SQLite implementation.
//!
//! # Invariants
//! - At most one profile row per owner (`profiles.user_id` is unique).

use crate::model::memo::OwnerId;
use crate::model::profile::{Profile, ProfilePatch};
use crate::repo::{ensure_table_ready, parse_uuid, server_now_ms, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PROFILE_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    username,
    display_name,
    avatar_url,
    created_at,
    updated_at
FROM profiles";

/// Repository interface for per-user profiles.
pub trait ProfileRepository {
    fn get_profile(&self, owner: OwnerId) -> RepoResult<Option<Profile>>;
    /// Creates an empty profile for `owner`.
    fn create_profile(&self, owner: OwnerId) -> RepoResult<Profile>;
    /// Applies a partial update. Missing profile yields `ProfileNotFound`.
    fn update_profile(&self, owner: OwnerId, patch: &ProfilePatch) -> RepoResult<Profile>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "profiles",
            &["id", "user_id", "username", "display_name", "avatar_url"],
        )?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get_profile(&self, owner: OwnerId) -> RepoResult<Option<Profile>> {
        self.conn
            .query_row(
                &format!("{PROFILE_SELECT_SQL} WHERE user_id = ?1;"),
                [owner.to_string()],
                read_profile_columns,
            )
            .optional()?
            .map(ProfileColumns::into_profile)
            .transpose()
    }

    fn create_profile(&self, owner: OwnerId) -> RepoResult<Profile> {
        let now = server_now_ms();
        self.conn.execute(
            "INSERT INTO profiles (id, user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3);",
            params![Uuid::new_v4().to_string(), owner.to_string(), now],
        )?;
        self.get_profile(owner)?
            .ok_or(RepoError::ProfileNotFound(owner))
    }

    fn update_profile(&self, owner: OwnerId, patch: &ProfilePatch) -> RepoResult<Profile> {
        let changed = self.conn.execute(
            "UPDATE profiles
             SET
                username = COALESCE(?2, username),
                display_name = COALESCE(?3, display_name),
                avatar_url = COALESCE(?4, avatar_url),
                updated_at = MAX(?5, updated_at + 1)
             WHERE user_id = ?1;",
            params![
                owner.to_string(),
                patch.username.as_deref(),
                patch.display_name.as_deref(),
                patch.avatar_url.as_deref(),
                server_now_ms(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ProfileNotFound(owner));
        }
        self.get_profile(owner)?
            .ok_or(RepoError::ProfileNotFound(owner))
    }
}

/// Raw column values; uuid decoding happens outside the rusqlite closure so
/// it can report `RepoError::InvalidData`.
struct ProfileColumns {
    id: String,
    owner: String,
    username: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
    created_at: i64,
    updated_at: i64,
}

impl ProfileColumns {
    fn into_profile(self) -> RepoResult<Profile> {
        Ok(Profile {
            id: parse_uuid(&self.id, "profiles.id")?,
            owner: parse_uuid(&self.owner, "profiles.user_id")?,
            username: self.username,
            display_name: self.display_name,
            avatar_url: self.avatar_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn read_profile_columns(row: &Row<'_>) -> rusqlite::Result<ProfileColumns> {
    Ok(ProfileColumns {
        id: row.get("id")?,
        owner: row.get("user_id")?,
        username: row.get("username")?,
        display_name: row.get("display_name")?,
        avatar_url: row.get("avatar_url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
