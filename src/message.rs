use serde::{Deserialize, Serialize};
use std::fmt;

/// The sender of a [`Message`].
///
/// Roles are a closed set; collaborator output is always `Tool` and
/// analyst-facing narration is `Ai`. Serialized forms are lowercase
/// (`"human"`, `"ai"`, `"tool"`, `"system"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Input from the reporting party (the incident payload itself).
    Human,
    /// Narration produced by workflow nodes.
    Ai,
    /// Output attributed to a collaborator call.
    Tool,
    /// Operator instructions and run-level notices.
    System,
}

impl Role {
    /// The lowercase wire form of this role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Ai => "ai",
            Role::Tool => "tool",
            Role::System => "system",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message in the workflow transcript.
///
/// Messages are the narrative record of a run: the incident payload that
/// started it, what each node observed, and what each collaborator
/// returned. An optional `id` gives a message identity for the merge
/// step — an update carrying an already-seen id replaces that message
/// instead of appending a duplicate.
///
/// # Examples
///
/// ```
/// use cordon::message::{Message, Role};
///
/// let report = Message::human("suspicious login burst from 203.0.113.7");
/// let note = Message::ai("classified as High severity");
/// let tool = Message::tool("log_search", "17 matching events");
///
/// assert_eq!(report.role, Role::Human);
/// assert_eq!(tool.name.as_deref(), Some("log_search"));
/// ```
///
/// # Serialization
///
/// `id` and `name` are omitted from the wire form when absent:
/// ```
/// use cordon::message::Message;
///
/// let json = serde_json::to_string(&Message::ai("done")).unwrap();
/// assert_eq!(json, r#"{"role":"ai","content":"done"}"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional stable identity used for replace-on-merge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Who produced the message.
    pub role: Role,
    /// The text content.
    pub content: String,
    /// Originating collaborator or node name, when attribution matters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    /// Creates a message with the given role and content, no identity.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role,
            content: content.into(),
            name: None,
        }
    }

    /// Creates a human message (incident payloads, analyst input).
    #[must_use]
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Creates an ai message (node narration).
    #[must_use]
    pub fn ai(content: impl Into<String>) -> Self {
        Self::new(Role::Ai, content)
    }

    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Creates a tool message attributed to a collaborator.
    #[must_use]
    pub fn tool(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            role: Role::Tool,
            content: content.into(),
            name: Some(name.into()),
        }
    }

    /// Attaches a stable identity, enabling replace-on-merge.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns true if this message has the given role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        assert_eq!(Message::human("x").role, Role::Human);
        assert_eq!(Message::ai("x").role, Role::Ai);
        assert_eq!(Message::system("x").role, Role::System);

        let tool = Message::tool("firewall", "blocked");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.name.as_deref(), Some("firewall"));
        assert_eq!(tool.content, "blocked");
    }

    #[test]
    fn with_id_attaches_identity() {
        let msg = Message::ai("classification pending").with_id("classify-1");
        assert_eq!(msg.id.as_deref(), Some("classify-1"));
        assert!(Message::ai("no identity").id.is_none());
    }

    #[test]
    fn role_checking() {
        let msg = Message::human("hello");
        assert!(msg.has_role(Role::Human));
        assert!(!msg.has_role(Role::Ai));
    }

    #[test]
    fn serde_round_trip_and_optional_fields() {
        let original = Message::tool("log_search", "3 hits").with_id("ls-1");
        let json = serde_json::to_string(&original).expect("serialize");
        let parsed: Message = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(original, parsed);

        // Bare messages omit id/name entirely.
        let bare = serde_json::to_value(Message::human("hi")).expect("serialize");
        let obj = bare.as_object().expect("object");
        assert!(!obj.contains_key("id"));
        assert!(!obj.contains_key("name"));
        assert_eq!(obj["role"], "human");
    }

    #[test]
    fn role_wire_forms() {
        for (role, wire) in [
            (Role::Human, "\"human\""),
            (Role::Ai, "\"ai\""),
            (Role::Tool, "\"tool\""),
            (Role::System, "\"system\""),
        ] {
            assert_eq!(serde_json::to_string(&role).unwrap(), wire);
        }
    }
}
