//! One-to-one contacts.
//!
//! Adding a contact writes an entry on both sides so the chat shows up in
//! both chat lists. The two writes are sequential: if the second fails the
//! first stays.

use tracing::{info, warn};

use st_core::error::{StError, StResult};
use st_models::models::contact::chat_id_for;
use st_models::store::{get_as, set_as};
use st_models::{path, Contact};

use crate::accounts::{find_by_username, get_profile};
use crate::context::FlowContext;
use crate::event_bus::AppEvent;

/// Add `other_uid` to `owner_uid`'s contacts and vice versa.
///
/// Returns the owner's new contact entry.
pub async fn add_contact(ctx: &FlowContext, owner_uid: &str, other_uid: &str) -> StResult<Contact> {
    if owner_uid == other_uid {
        return Err(StError::InvalidInput("cannot add yourself as a contact".into()));
    }

    let owner_path = path::user(owner_uid)?;
    let other_path = path::user(other_uid)?;
    let owner = get_profile(ctx, owner_uid)
        .await?
        .ok_or(StError::NotFound(owner_path))?;
    let other = get_profile(ctx, other_uid)
        .await?
        .ok_or(StError::NotFound(other_path))?;

    let chat_id = chat_id_for(owner_uid, other_uid);
    let mine = Contact::for_user(other_uid, &other.display_name, other.avatar_url.clone(), &chat_id);
    let theirs = Contact::for_user(owner_uid, &owner.display_name, owner.avatar_url.clone(), &chat_id);

    ctx.observe(
        "add_contact",
        set_as(ctx.store.as_ref(), &path::contact(owner_uid, other_uid)?, &mine).await,
    )?;
    let reverse_path = path::contact(other_uid, owner_uid)?;
    if let Err(e) = set_as(ctx.store.as_ref(), &reverse_path, &theirs).await {
        warn!("added {other_uid} to {owner_uid} but not the reverse: {e}");
        ctx.report_error("add_contact", &e);
        return Err(e);
    }

    info!("{owner_uid} added contact {other_uid} (chat {chat_id})");
    ctx.events.emit(AppEvent::ContactAdded {
        owner_id: owner_uid.to_string(),
        contact_id: other_uid.to_string(),
        chat_id,
    });
    Ok(mine)
}

/// Look a username up and add that user as a contact.
pub async fn add_contact_by_username(ctx: &FlowContext, owner_uid: &str, username: &str) -> StResult<Contact> {
    let other = find_by_username(ctx, username)
        .await?
        .ok_or_else(|| StError::NotFound(format!("username {username}")))?;
    add_contact(ctx, owner_uid, &other.uid).await
}

pub async fn get_contact(ctx: &FlowContext, owner_uid: &str, contact_id: &str) -> StResult<Option<Contact>> {
    ctx.observe(
        "get_contact",
        get_as(ctx.store.as_ref(), &path::contact(owner_uid, contact_id)?).await,
    )
}

/// A user's contacts, most recent conversation first, then by name.
pub async fn list_contacts(ctx: &FlowContext, uid: &str) -> StResult<Vec<Contact>> {
    let docs = ctx.observe("list_contacts", ctx.store.list(&path::contacts(uid)?).await)?;
    let mut contacts = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.decode::<Contact>() {
            Ok(contact) => contacts.push(contact),
            Err(e) => warn!("skipping malformed contact: {e}"),
        }
    }
    contacts.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
    });
    Ok(contacts)
}
