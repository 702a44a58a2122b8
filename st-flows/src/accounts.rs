//! Username accounts.
//!
//! The auth service only knows email/password accounts, so a username is
//! turned into a synthetic email, and uniqueness is kept by a claim
//! document at `usernames/{username}` written together with the profile.

use serde::{Deserialize, Serialize};
use tracing::info;

use st_core::error::{StError, StResult};
use st_models::models::user::{normalize_username, username_to_email};
use st_models::store::get_as;
use st_models::{path, UserProfile, UsernameClaim, WriteBatch};

use crate::context::FlowContext;
use crate::event_bus::AppEvent;

/// Sign-in email for a username under the configured domain.
pub fn email_for(ctx: &FlowContext, username: &str) -> StResult<String> {
    let username = normalize_username(username)?;
    Ok(username_to_email(&username, &ctx.settings.email_domain))
}

/// Claim a username and write the profile in one batch.
///
/// Fails with `UsernameTaken` if another uid holds the claim, including one
/// written between the check and the commit. Registering the same uid again
/// rewrites its profile.
pub async fn register_profile(
    ctx: &FlowContext,
    uid: &str,
    username: &str,
    display_name: Option<&str>,
) -> StResult<UserProfile> {
    if uid.trim().is_empty() {
        return Err(StError::InvalidInput("uid must not be empty".into()));
    }
    let username = normalize_username(username)?;

    let claim_path = path::username(&username)?;
    let existing: Option<UsernameClaim> =
        ctx.observe("register_profile", get_as(ctx.store.as_ref(), &claim_path).await)?;
    let owned = match existing {
        Some(claim) if claim.uid != uid => return Err(StError::UsernameTaken(username)),
        Some(_) => true,
        None => false,
    };

    let profile = UserProfile::new(uid, &username, display_name, &ctx.settings.email_domain);
    let claim = UsernameClaim { uid: uid.to_string() };
    let mut batch = WriteBatch::new();
    // A fresh claim is a create so a concurrent registration loses at commit.
    if owned {
        batch.set(claim_path, &claim)?;
    } else {
        batch.create(claim_path, &claim)?;
    }
    batch.set(path::user(uid)?, &profile)?;
    match ctx.store.commit(batch).await {
        Ok(()) => {}
        Err(StError::AlreadyExists(_)) => return Err(StError::UsernameTaken(username)),
        Err(e) => {
            ctx.report_error("register_profile", &e);
            return Err(e);
        }
    }

    info!("registered {username} for {uid}");
    ctx.events.emit(AppEvent::UserRegistered {
        uid: uid.to_string(),
        username,
    });
    Ok(profile)
}

pub async fn get_profile(ctx: &FlowContext, uid: &str) -> StResult<Option<UserProfile>> {
    ctx.observe("get_profile", get_as(ctx.store.as_ref(), &path::user(uid)?).await)
}

/// Resolve a username to its profile via the claim document.
pub async fn find_by_username(ctx: &FlowContext, username: &str) -> StResult<Option<UserProfile>> {
    let username = normalize_username(username)?;
    let claim: Option<UsernameClaim> = ctx.observe(
        "find_by_username",
        get_as(ctx.store.as_ref(), &path::username(&username)?).await,
    )?;
    match claim {
        Some(claim) => get_profile(ctx, &claim.uid).await,
        None => Ok(None),
    }
}

/// Editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallpaper_url: Option<String>,
}

/// Merge the given fields into an existing profile.
pub async fn update_profile(ctx: &FlowContext, uid: &str, update: &ProfileUpdate) -> StResult<UserProfile> {
    let user_path = path::user(uid)?;
    if get_profile(ctx, uid).await?.is_none() {
        return Err(StError::NotFound(user_path));
    }
    ctx.observe(
        "update_profile",
        ctx.store.merge(&user_path, serde_json::to_value(update)?).await,
    )?;
    get_profile(ctx, uid)
        .await?
        .ok_or(StError::NotFound(user_path))
}
