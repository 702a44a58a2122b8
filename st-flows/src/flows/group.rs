//! `createGroup`: create a group and put it in every member's chat list.
//!
//! The group document and all member contacts go out in one batch, so a
//! half-created group is never visible.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use st_core::constants::{flows, MAX_GROUP_NAME_CHARS};
use st_core::error::{StError, StResult};
use st_models::{path, Contact, Group, WriteBatch};

use super::{parse_input, require};
use crate::context::FlowContext;
use crate::event_bus::AppEvent;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    pub name: String,
    pub owner_id: String,
    #[serde(default)]
    pub member_ids: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl CreateGroupInput {
    pub fn validate(&self) -> StResult<()> {
        require("name", &self.name)?;
        require("ownerId", &self.owner_id)?;
        if self.name.trim().chars().count() > MAX_GROUP_NAME_CHARS {
            return Err(StError::InvalidInput(format!(
                "name must be at most {MAX_GROUP_NAME_CHARS} characters"
            )));
        }
        if self.member_ids.iter().any(|m| m.trim().is_empty()) {
            return Err(StError::InvalidInput("memberIds must not contain empty ids".into()));
        }
        Ok(())
    }

    /// Owner first, then the listed members in order, without duplicates.
    pub fn members(&self) -> Vec<String> {
        let mut members = vec![self.owner_id.trim().to_string()];
        for id in &self.member_ids {
            let id = id.trim();
            if !members.iter().any(|m| m == id) {
                members.push(id.to_string());
            }
        }
        members
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupOutput {
    pub group_id: String,
}

pub fn definition() -> Value {
    json!({
        "name": flows::CREATE_GROUP,
        "description": "Create a group owned by ownerId and add it to every member's contacts in one atomic write.",
        "inputSchema": {
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Group name (1-64 characters)"
                },
                "ownerId": { "type": "string", "description": "Creator uid; becomes the only admin" },
                "memberIds": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Member uids; the owner is always included"
                },
                "description": { "type": "string" },
                "avatarUrl": { "type": "string" }
            },
            "required": ["name", "ownerId"]
        }
    })
}

pub async fn create_group(ctx: &FlowContext, input: CreateGroupInput) -> StResult<CreateGroupOutput> {
    input.validate()?;

    let group_id = uuid::Uuid::new_v4().to_string();
    let owner_id = input.owner_id.trim().to_string();
    let name = input.name.trim().to_string();
    let members = input.members();

    let group = Group {
        id: group_id.clone(),
        name: name.clone(),
        description: input.description.clone().filter(|d| !d.trim().is_empty()),
        avatar_url: input.avatar_url.clone(),
        owner_id: owner_id.clone(),
        members: members.clone(),
        admins: vec![owner_id.clone()],
        created_at: Utc::now(),
    };
    let contact = Contact::for_group(&group_id, &name, input.avatar_url.clone());

    let mut batch = WriteBatch::new();
    batch.set(path::group(&group_id)?, &group)?;
    for member in &members {
        batch.set(path::contact(member, &group_id)?, &contact)?;
    }
    ctx.store.commit(batch).await?;

    info!("created group {group_id} with {} member(s)", members.len());
    ctx.events.emit(AppEvent::GroupCreated {
        group_id: group_id.clone(),
        owner_id,
        member_count: members.len(),
    });

    Ok(CreateGroupOutput { group_id })
}

pub async fn execute(ctx: &FlowContext, args: Value) -> StResult<Value> {
    let input: CreateGroupInput = parse_input(flows::CREATE_GROUP, args)?;
    let output = create_group(ctx, input).await?;
    Ok(serde_json::to_value(output)?)
}
