use diesel::{prelude::*, PgConnection};
use serde::{Deserialize, Serialize};

use crate::object_id::{ProjectId, UserId};

/// How a user relates to a project. Owners created it; clients joined by
/// redeeming an invite.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectRole {
    Owner,
    Client,
}

/// The checks a route can require before touching a project.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessLevel {
    Read,
    Manage,
    ToggleCompletion,
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let desc = match self {
            Self::Read => "project:read",
            Self::Manage => "project:manage",
            Self::ToggleCompletion => "completion:toggle",
        };

        f.write_str(desc)
    }
}

/// Anyone with a role may read the project and its sub-resources.
pub fn can_read(role: Option<ProjectRole>) -> bool {
    role.is_some()
}

/// Only the owner may create, update, or delete projects, invoices,
/// milestones, todos, and invites.
pub fn can_manage(role: Option<ProjectRole>) -> bool {
    matches!(role, Some(ProjectRole::Owner))
}

/// Completion toggling is the one mutation clients share with the owner.
pub fn can_toggle_completion(role: Option<ProjectRole>) -> bool {
    role.is_some()
}

pub fn allowed(role: Option<ProjectRole>, level: AccessLevel) -> bool {
    match level {
        AccessLevel::Read => can_read(role),
        AccessLevel::Manage => can_manage(role),
        AccessLevel::ToggleCompletion => can_toggle_completion(role),
    }
}

/// Looks up the caller's relationship to a project. Returns None both when
/// the project does not exist and when the user has no tie to it, so a
/// caller cannot probe for project existence.
pub fn role_for(
    conn: &mut PgConnection,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<Option<ProjectRole>, diesel::result::Error> {
    let owner_id = crate::projects::table
        .filter(crate::projects::project_id.eq(project_id))
        .select(crate::projects::owner_id)
        .first::<UserId>(conn)
        .optional()?;

    let owner_id = match owner_id {
        Some(owner_id) => owner_id,
        None => return Ok(None),
    };

    if owner_id == user_id {
        return Ok(Some(ProjectRole::Owner));
    }

    let is_client = crate::project_clients::table
        .filter(
            crate::project_clients::project_id
                .eq(project_id)
                .and(crate::project_clients::client_id.eq(user_id)),
        )
        .select(crate::project_clients::client_id)
        .first::<UserId>(conn)
        .optional()?
        .is_some();

    Ok(is_client.then_some(ProjectRole::Client))
}
