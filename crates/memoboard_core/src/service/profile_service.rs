//! Profile use-case service.
//!
//! # Responsibility
//! - Lazily create the owner's profile row on first use.
//! - Normalize profile edits before persisting them.
//!
//! # Invariants
//! - Patch fields are trimmed; a field set to blank text is rejected rather
//!   than stored.

use crate::model::memo::OwnerId;
use crate::model::profile::{Profile, ProfilePatch};
use crate::repo::profile_repo::ProfileRepository;
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for profile use-cases.
#[derive(Debug)]
pub enum ProfileServiceError {
    /// Named field was provided but is blank.
    BlankField(&'static str),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ProfileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "{field} cannot be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProfileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::BlankField(_) => None,
        }
    }
}

impl From<RepoError> for ProfileServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service for per-user profiles.
pub struct ProfileService<R: ProfileRepository> {
    repo: R,
}

impl<R: ProfileRepository> ProfileService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Returns the owner's profile, creating an empty one when missing.
    pub fn ensure_profile(&self, owner: OwnerId) -> Result<Profile, ProfileServiceError> {
        if let Some(profile) = self.repo.get_profile(owner)? {
            return Ok(profile);
        }
        let profile = self.repo.create_profile(owner)?;
        info!("event=profile_create module=service status=ok owner={owner}");
        Ok(profile)
    }

    /// Applies `patch` to the owner's profile, creating it first if needed.
    pub fn update_profile(
        &self,
        owner: OwnerId,
        patch: ProfilePatch,
    ) -> Result<Profile, ProfileServiceError> {
        let patch = normalize_patch(patch)?;
        let profile = self.ensure_profile(owner)?;
        if patch.is_empty() {
            return Ok(profile);
        }
        let updated = self.repo.update_profile(owner, &patch)?;
        info!("event=profile_update module=service status=ok owner={owner}");
        Ok(updated)
    }
}

fn normalize_patch(patch: ProfilePatch) -> Result<ProfilePatch, ProfileServiceError> {
    Ok(ProfilePatch {
        username: normalize_field(patch.username, "username")?,
        display_name: normalize_field(patch.display_name, "display_name")?,
        avatar_url: normalize_field(patch.avatar_url, "avatar_url")?,
    })
}

fn normalize_field(
    value: Option<String>,
    field: &'static str,
) -> Result<Option<String>, ProfileServiceError> {
    match value {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(ProfileServiceError::BlankField(field));
            }
            Ok(Some(trimmed.to_string()))
        }
        None => Ok(None),
    }
}
