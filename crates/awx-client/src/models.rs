//! Wire models shared by the client and the resource engine.

use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by `/api/v2/me/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: i64,
    /// Login name.
    pub username: String,
    /// Whether the user is a superuser.
    #[serde(default)]
    pub is_superuser: bool,
    /// Whether the user is a system auditor.
    #[serde(default)]
    pub is_system_auditor: bool,
    /// Email address.
    #[serde(default)]
    pub email: String,
}

/// A role attached to an object, from `<object>/object_roles/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRole {
    /// Role id.
    pub id: i64,
    /// Role name, e.g. `Admin` or `Use`.
    pub name: String,
    /// Human readable description.
    #[serde(default)]
    pub description: String,
}

/// Body posted to association endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateRequest {
    /// Id of the object being (dis)associated.
    pub id: i64,
    /// True to remove the association.
    pub disassociate: bool,
}

impl AssociateRequest {
    /// Request that links `id` to the parent.
    #[must_use]
    pub const fn associate(id: i64) -> Self {
        Self {
            id,
            disassociate: false,
        }
    }

    /// Request that unlinks `id` from the parent.
    #[must_use]
    pub const fn disassociate(id: i64) -> Self {
        Self {
            id,
            disassociate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_ignores_unknown_fields() {
        let user: User = serde_json::from_value(json!({
            "id": 1,
            "type": "user",
            "username": "admin",
            "is_superuser": true,
            "email": "admin@example.com",
            "last_login": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(user.id, 1);
        assert!(user.is_superuser);
        assert!(!user.is_system_auditor);
    }

    #[test]
    fn associate_request_body() {
        assert_eq!(
            serde_json::to_value(AssociateRequest::associate(9)).unwrap(),
            json!({"id": 9, "disassociate": false})
        );
        assert_eq!(
            serde_json::to_value(AssociateRequest::disassociate(9)).unwrap(),
            json!({"id": 9, "disassociate": true})
        );
    }
}
