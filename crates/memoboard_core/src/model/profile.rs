//! User profile model and display-name helpers.

use crate::model::memo::OwnerId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const FALLBACK_DISPLAY_NAME: &str = "User";
const MASK_VISIBLE_CHARS: usize = 2;
const MASK_MAX_STARS: usize = 3;

/// Per-user profile row. One per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner: OwnerId,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.display_name.is_none() && self.avatar_url.is_none()
    }
}

/// Resolves the name shown in the board header.
///
/// Order: profile display name, profile username, local part of `email`,
/// then a generic fallback. Blank values are skipped.
pub fn resolve_display_name(email: &str, profile: Option<&Profile>) -> String {
    let from_profile = profile.and_then(|profile| {
        non_blank(profile.display_name.as_deref()).or(non_blank(profile.username.as_deref()))
    });
    if let Some(name) = from_profile {
        return name.to_string();
    }

    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .to_string()
}

/// Masks the local part of an email address.
///
/// `example@gmail.com` becomes `ex***@gmail.com`. Input without exactly one
/// usable `@` split is returned unchanged.
pub fn mask_email(email: &str) -> String {
    let Some((local, domain)) = email.split_once('@') else {
        return email.to_string();
    };
    if local.is_empty() || domain.is_empty() {
        return email.to_string();
    }

    let local_len = local.chars().count();
    if local_len <= MASK_VISIBLE_CHARS {
        return email.to_string();
    }

    let visible = local.chars().take(MASK_VISIBLE_CHARS).collect::<String>();
    let stars = "*".repeat((local_len - MASK_VISIBLE_CHARS).min(MASK_MAX_STARS));
    format!("{visible}{stars}@{domain}")
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
