//! # Roles, Actions and the Authorization Table
//!
//! The closed set of vault roles and the catalogue of actions a member may
//! attempt. `evaluate` is the single authorization table for the whole
//! application; it performs no I/O.

use crate::error::AccessError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A member's role within a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Contributor,
    Viewer,
}

impl Role {
    /// The string stored in the `vault_members.role` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Contributor => "CONTRIBUTOR",
            Role::Viewer => "VIEWER",
        }
    }

    pub(crate) fn rank(self) -> u8 {
        match self {
            Role::Viewer => 0,
            Role::Contributor => 1,
            Role::Owner => 2,
        }
    }

    /// Returns `true` if this role is at least as privileged as `other`.
    pub fn at_least(self, other: Role) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of the three known roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid role '{}'. Must be OWNER, CONTRIBUTOR, or VIEWER",
            self.0
        )
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Parses an exact role name. Case variants and unknown names are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Role::Owner),
            "CONTRIBUTOR" => Ok(Role::Contributor),
            "VIEWER" => Ok(Role::Viewer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Everything a caller can ask to do inside a vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ViewVault,
    UpdateVault,
    DeleteVault,
    AddSource,
    DeleteSource,
    AddAnnotation,
    /// Deleting an annotation carries the annotation's author so that
    /// contributors can remove their own notes.
    DeleteAnnotation {
        author_id: String,
    },
    AddPdf,
    DeletePdf,
    ManageMembers,
    GenerateCitation,
}

impl Action {
    /// Short machine name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Action::ViewVault => "view_vault",
            Action::UpdateVault => "update_vault",
            Action::DeleteVault => "delete_vault",
            Action::AddSource => "add_source",
            Action::DeleteSource => "delete_source",
            Action::AddAnnotation => "add_annotation",
            Action::DeleteAnnotation { .. } => "delete_annotation",
            Action::AddPdf => "add_pdf",
            Action::DeletePdf => "delete_pdf",
            Action::ManageMembers => "manage_members",
            Action::GenerateCitation => "generate_citation",
        }
    }

    /// The minimum role for this action when performed by `requester`.
    ///
    /// Only `DeleteAnnotation` depends on the requester: its author needs
    /// CONTRIBUTOR, everyone else needs OWNER.
    pub fn required_role(&self, requester: &str) -> Role {
        match self {
            Action::ViewVault => Role::Viewer,
            Action::AddSource
            | Action::AddAnnotation
            | Action::AddPdf
            | Action::GenerateCitation => Role::Contributor,
            Action::DeleteAnnotation { author_id } => {
                if author_id == requester {
                    Role::Contributor
                } else {
                    Role::Owner
                }
            }
            Action::UpdateVault
            | Action::DeleteVault
            | Action::DeleteSource
            | Action::DeletePdf
            | Action::ManageMembers => Role::Owner,
        }
    }

    fn denial_reason(&self) -> &'static str {
        match self {
            Action::ViewVault => "You do not have access to this vault.",
            Action::UpdateVault => "Only vault owners can update vault details.",
            Action::DeleteVault => "Only vault owners can delete vaults.",
            Action::AddSource => {
                "Viewers cannot add sources. Only owners and contributors can add sources."
            }
            Action::DeleteSource => "Only vault owners can delete sources.",
            Action::AddAnnotation => {
                "Viewers cannot add annotations. Only owners and contributors can add annotations."
            }
            Action::DeleteAnnotation { .. } => {
                "You can only delete your own annotations. Vault owners can delete any annotation."
            }
            Action::AddPdf => "Viewers cannot upload files. Only owners and contributors can upload files.",
            Action::DeletePdf => "Only vault owners can delete PDFs.",
            Action::ManageMembers => "Only vault owners can manage members.",
            Action::GenerateCitation => {
                "Viewers cannot generate citations. Only owners and contributors can generate citations."
            }
        }
    }
}

/// Checks `action` against the authorization table for a member holding `role`.
///
/// Annotation deletion passes for an OWNER, or for a CONTRIBUTOR who wrote
/// the annotation. Every other action passes when `role` meets the action's
/// minimum role.
pub fn evaluate(role: Role, requester: &str, action: &Action) -> Result<(), AccessError> {
    let allowed = match action {
        Action::DeleteAnnotation { author_id } => match role {
            Role::Owner => true,
            Role::Contributor => author_id == requester,
            Role::Viewer => false,
        },
        other => role.at_least(other.required_role(requester)),
    };

    if allowed {
        Ok(())
    } else {
        Err(AccessError::Forbidden {
            required: action.required_role(requester),
            reason: action.denial_reason().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 3] = [Role::Owner, Role::Contributor, Role::Viewer];

    #[test]
    fn test_role_parsing_is_exact() {
        assert_eq!("OWNER".parse::<Role>().unwrap(), Role::Owner);
        assert_eq!("CONTRIBUTOR".parse::<Role>().unwrap(), Role::Contributor);
        assert_eq!("VIEWER".parse::<Role>().unwrap(), Role::Viewer);
        assert!("owner".parse::<Role>().is_err());
        assert!("ADMIN".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_add_actions_allow_owner_and_contributor_only() {
        for action in [
            Action::AddSource,
            Action::AddAnnotation,
            Action::AddPdf,
            Action::GenerateCitation,
        ] {
            for role in ALL_ROLES {
                let result = evaluate(role, "u1", &action);
                assert_eq!(
                    result.is_ok(),
                    role != Role::Viewer,
                    "{role} performing {}",
                    action.name()
                );
            }
        }
    }

    #[test]
    fn test_owner_only_actions() {
        for action in [
            Action::UpdateVault,
            Action::DeleteVault,
            Action::DeleteSource,
            Action::DeletePdf,
            Action::ManageMembers,
        ] {
            assert!(evaluate(Role::Owner, "u1", &action).is_ok());
            for role in [Role::Contributor, Role::Viewer] {
                match evaluate(role, "u1", &action) {
                    Err(AccessError::Forbidden { required, .. }) => {
                        assert_eq!(required, Role::Owner)
                    }
                    other => panic!("expected Forbidden for {role}, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn test_every_role_can_view() {
        for role in ALL_ROLES {
            assert!(evaluate(role, "u1", &Action::ViewVault).is_ok());
        }
    }

    #[test]
    fn test_annotation_delete_tie_break() {
        let by_bob = Action::DeleteAnnotation {
            author_id: "bob".to_string(),
        };

        assert!(evaluate(Role::Owner, "alice", &by_bob).is_ok());
        assert!(evaluate(Role::Owner, "bob", &by_bob).is_ok());
        assert!(evaluate(Role::Contributor, "bob", &by_bob).is_ok());

        match evaluate(Role::Contributor, "dave", &by_bob) {
            Err(AccessError::Forbidden { required, reason }) => {
                assert_eq!(required, Role::Owner);
                assert!(reason.contains("your own annotations"));
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }

        // A viewer is denied even for an annotation they wrote before a demotion.
        assert!(evaluate(Role::Viewer, "bob", &by_bob).is_err());
        assert!(evaluate(Role::Viewer, "carol", &by_bob).is_err());
    }

    #[test]
    fn test_forbidden_names_minimum_role() {
        let err = evaluate(Role::Viewer, "carol", &Action::AddAnnotation).unwrap_err();
        match err {
            AccessError::Forbidden { required, .. } => assert_eq!(required, Role::Contributor),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
