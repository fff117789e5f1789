//! Core data type definitions

use serde::{Deserialize, Deserializer, Serialize};

/// Account role. An identity may hold both at once, but only one is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Conducts interviews
    Interviewer,
    /// Takes interviews
    Interviewee,
}

impl Role {
    /// Both roles, in the order menus list their dashboards
    pub const ALL: [Role; 2] = [Role::Interviewee, Role::Interviewer];

    /// Tag used in storage, paths and display
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Interviewer => "interviewer",
            Role::Interviewee => "interviewee",
        }
    }

    /// The opposite role
    pub fn other(&self) -> Role {
        match self {
            Role::Interviewer => Role::Interviewee,
            Role::Interviewee => Role::Interviewer,
        }
    }

    /// Human readable label, e.g. for menu entries
    pub fn label(&self) -> &'static str {
        match self {
            Role::Interviewer => "Interviewer",
            Role::Interviewee => "Interviewee",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interviewer" => Ok(Role::Interviewer),
            "interviewee" => Ok(Role::Interviewee),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// Authenticated account record.
///
/// Field names on the wire follow the authentication service (`role`, `availableRoles`,
/// `profile_picture_url`) so a stored record and a login response share one shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Role assigned at signup
    #[serde(rename = "role")]
    pub primary_role: Role,
    /// Every role the account holds. Older records omit it.
    #[serde(
        rename = "availableRoles",
        default,
        deserialize_with = "nullable_roles"
    )]
    pub granted_roles: Vec<Role>,
    #[serde(
        rename = "profile_picture_url",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub avatar_url: Option<String>,
}

fn nullable_roles<'de, D>(deserializer: D) -> Result<Vec<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Role>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Identity {
    /// Identity holding only its primary role
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            primary_role: role,
            granted_roles: vec![role],
            avatar_url: None,
        }
    }

    pub fn with_granted_roles(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.granted_roles = roles.into_iter().collect();
        self
    }

    pub fn with_avatar_url(mut self, url: impl Into<String>) -> Self {
        self.avatar_url = Some(url.into());
        self
    }

    /// Granted roles de-duplicated, never empty, always containing the primary role.
    pub fn normalized(mut self) -> Self {
        let mut roles = Vec::with_capacity(Role::ALL.len());
        if !self.granted_roles.contains(&self.primary_role) {
            roles.push(self.primary_role);
        }
        for role in self.granted_roles {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
        self.granted_roles = roles;
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.granted_roles.contains(&role)
    }

    pub fn can_switch_role(&self) -> bool {
        self.granted_roles.len() > 1
    }

    /// Avatar fallback text: first letter of each name part, uppercased.
    pub fn initials(&self) -> String {
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .collect();

        if initials.is_empty() {
            "??".to_string()
        } else {
            initials
        }
    }
}

/// Successful credential exchange as returned by the authentication service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: Identity,
}

impl AuthResponse {
    /// Split into the `(credential, identity)` pair a login takes
    pub fn into_parts(self) -> (String, Identity) {
        (self.token, self.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_and_display() {
        assert_eq!("Interviewer".parse::<Role>(), Ok(Role::Interviewer));
        assert_eq!(" interviewee ".parse::<Role>(), Ok(Role::Interviewee));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Interviewer.to_string(), "interviewer");
        assert_eq!(Role::Interviewee.other(), Role::Interviewer);
    }

    #[test]
    fn test_identity_without_available_roles_defaults_to_primary() {
        let json = r#"{"id":"u1","name":"A","email":"a@x.com","role":"interviewee"}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert!(identity.granted_roles.is_empty());

        let identity = identity.normalized();
        assert_eq!(identity.granted_roles, vec![Role::Interviewee]);
        assert!(!identity.can_switch_role());
    }

    #[test]
    fn test_identity_with_null_available_roles() {
        let json = r#"{"id":"u1","name":"A","email":"a@x.com","role":"interviewer","availableRoles":null}"#;
        let identity: Identity = serde_json::from_str(json).unwrap();
        assert_eq!(identity.normalized().granted_roles, vec![Role::Interviewer]);
    }

    #[test]
    fn test_normalization_dedupes_and_adds_primary() {
        let identity = Identity::new("u1", "A", "a@x.com", Role::Interviewer)
            .with_granted_roles([Role::Interviewee, Role::Interviewee])
            .normalized();

        assert_eq!(identity.granted_roles, vec![Role::Interviewer, Role::Interviewee]);
        assert!(identity.can_switch_role());
    }

    #[test]
    fn test_unknown_role_tag_is_rejected() {
        let json = r#"{"id":"u1","name":"A","email":"a@x.com","role":"admin"}"#;
        assert!(serde_json::from_str::<Identity>(json).is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let identity = Identity::new("u1", "Ada Lovelace", "ada@x.com", Role::Interviewer)
            .with_avatar_url("https://img/ada.png");
        let value = serde_json::to_value(&identity).unwrap();

        assert_eq!(value["role"], "interviewer");
        assert_eq!(value["availableRoles"][0], "interviewer");
        assert_eq!(value["profile_picture_url"], "https://img/ada.png");
    }

    #[test]
    fn test_initials() {
        let identity = Identity::new("u1", "ada  lovelace", "a@x.com", Role::Interviewee);
        assert_eq!(identity.initials(), "AL");

        let blank = Identity::new("u2", "   ", "b@x.com", Role::Interviewee);
        assert_eq!(blank.initials(), "??");
    }

    #[test]
    fn test_auth_response_parts() {
        let json = r#"{"token":"tok-abc","user":{"id":"u1","name":"A","email":"a@x.com","role":"interviewee","availableRoles":["interviewee","interviewer"]}}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        let (token, user) = response.into_parts();

        assert_eq!(token, "tok-abc");
        assert_eq!(user.granted_roles.len(), 2);
    }
}
