//! The single authorization table for every HTTP route and CLI command.
//!
//! Callers resolve the acting user's role from the database, describe what
//! they want to do as an [`Action`], and ask [`authorize`] for a decision.
//! Ownership-sensitive actions carry the owner id of the target row.

use std::fmt;

use serde::Serialize;

pub const ADMIN_ROLE: &str = "admin";
pub const STUDENT_ROLE: &str = "student";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    /// Role names other than `admin` get the student permission set.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(ADMIN_ROLE) {
            Role::Admin
        } else {
            Role::Student
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN_ROLE,
            Role::Student => STUDENT_ROLE,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateProject,
    /// Make someone other than the caller a project's owner.
    AssignProjectOwner,
    UpdateProject { owner_id: i64 },
    DeleteProject { owner_id: i64 },
    ManageProjectMembers { owner_id: i64 },
    ManageProjectCohorts { owner_id: i64 },

    ManageCohorts,
    ManageClasses,

    UpdateUser { user_id: i64 },
    ChangeUserRole,
    DeleteUser,
    ManageRoles,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Action::CreateProject => "create projects",
            Action::AssignProjectOwner => "assign projects to other users",
            Action::UpdateProject { .. } => "update this project",
            Action::DeleteProject { .. } => "delete this project",
            Action::ManageProjectMembers { .. } => "manage members of this project",
            Action::ManageProjectCohorts { .. } => "assign this project to cohorts",
            Action::ManageCohorts => "manage cohorts",
            Action::ManageClasses => "manage classes",
            Action::UpdateUser { .. } => "update this user",
            Action::ChangeUserRole => "change user roles",
            Action::DeleteUser => "delete users",
            Action::ManageRoles => "manage roles",
        }
    }
}

/// Identity of the caller as far as the policy is concerned.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Denial reason, suitable for a 403 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied(pub String);

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn is_allowed(actor: &Actor, action: Action) -> bool {
    if actor.role.is_admin() {
        return true;
    }

    match action {
        Action::CreateProject => true,

        Action::UpdateProject { owner_id }
        | Action::DeleteProject { owner_id }
        | Action::ManageProjectMembers { owner_id }
        | Action::ManageProjectCohorts { owner_id } => owner_id == actor.user_id,

        Action::UpdateUser { user_id } => user_id == actor.user_id,

        Action::AssignProjectOwner
        | Action::ManageCohorts
        | Action::ManageClasses
        | Action::ChangeUserRole
        | Action::DeleteUser
        | Action::ManageRoles => false,
    }
}

pub fn authorize(actor: &Actor, action: Action) -> Result<(), Denied> {
    if is_allowed(actor, action) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = actor.user_id,
            role = %actor.role,
            "Denied: not permitted to {}",
            action.describe()
        );
        Err(Denied(format!("You are not permitted to {}", action.describe())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Actor = Actor { user_id: 2, role: Role::Student };
    const ADMIN: Actor = Actor { user_id: 1, role: Role::Admin };

    #[test]
    fn admin_may_do_everything() {
        for action in [
            Action::ManageCohorts,
            Action::ManageClasses,
            Action::ManageRoles,
            Action::DeleteUser,
            Action::ChangeUserRole,
            Action::AssignProjectOwner,
            Action::DeleteProject { owner_id: 99 },
            Action::UpdateUser { user_id: 99 },
        ] {
            assert!(is_allowed(&ADMIN, action), "{:?}", action);
        }
    }

    #[test]
    fn student_owns_only_their_projects() {
        assert!(is_allowed(&STUDENT, Action::UpdateProject { owner_id: 2 }));
        assert!(is_allowed(&STUDENT, Action::ManageProjectMembers { owner_id: 2 }));
        assert!(!is_allowed(&STUDENT, Action::UpdateProject { owner_id: 3 }));
        assert!(!is_allowed(&STUDENT, Action::DeleteProject { owner_id: 3 }));
        assert!(!is_allowed(&STUDENT, Action::ManageProjectCohorts { owner_id: 3 }));
    }

    #[test]
    fn student_cannot_administer() {
        assert!(authorize(&STUDENT, Action::ManageCohorts).is_err());
        assert!(authorize(&STUDENT, Action::ManageClasses).is_err());
        assert!(authorize(&STUDENT, Action::ChangeUserRole).is_err());
        assert!(authorize(&STUDENT, Action::AssignProjectOwner).is_err());
        assert!(authorize(&STUDENT, Action::CreateProject).is_ok());
    }

    #[test]
    fn self_service_profile_updates() {
        assert!(is_allowed(&STUDENT, Action::UpdateUser { user_id: 2 }));
        assert!(!is_allowed(&STUDENT, Action::UpdateUser { user_id: 5 }));
    }

    #[test]
    fn unknown_role_names_are_students() {
        assert_eq!(Role::from_name("ADMIN"), Role::Admin);
        assert_eq!(Role::from_name("mentor"), Role::Student);
    }
}
