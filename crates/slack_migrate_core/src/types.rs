use serde::{Deserialize, Serialize};

/// Profile sub-record as returned by `users.list`. All fields optional;
/// absent keys never fail deserialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub is_bot: bool,
}

/// `topic` / `purpose` wrapper object on channel records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelText {
    #[serde(default)]
    pub value: String,
}

/// Channel as returned on the wire by `conversations.list` and
/// `conversations.info`: the `creator` field is still a raw user id.
///
/// `created` is epoch seconds while `updated` is epoch milliseconds. The
/// mismatch comes from the platform; every consumer applies its own divisor
/// instead of normalizing here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChannel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub num_members: u64,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub topic: ChannelText,
    #[serde(default)]
    pub purpose: ChannelText,
}

/// Channel after creator enrichment. This is the shape the cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub num_members: u64,
    #[serde(default)]
    pub created: i64,
    #[serde(default)]
    pub updated: i64,
    pub creator: CreatorRef,
    #[serde(default)]
    pub topic: ChannelText,
    #[serde(default)]
    pub purpose: ChannelText,
}

impl RawChannel {
    /// Attach an enrichment result, consuming the wire record.
    pub fn with_creator(self, creator: CreatorRef) -> Channel {
        Channel {
            id: self.id,
            name: self.name,
            is_archived: self.is_archived,
            is_private: self.is_private,
            is_member: self.is_member,
            num_members: self.num_members,
            created: self.created,
            updated: self.updated,
            creator,
            topic: self.topic,
            purpose: self.purpose,
        }
    }
}

/// Result of the creator join: a fully-populated profile, or an explicit
/// unresolved record when the creator left the workspace or the lookup
/// failed. A union rather than an optional scalar so cached channels
/// round-trip in the enriched shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatorRef {
    Resolved(ResolvedCreator),
    Unresolved(UnresolvedCreator),
}

/// All fields are present strings; a profile field the platform omitted is
/// carried as an empty string, never null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCreator {
    pub id: String,
    pub real_name: String,
    pub email: String,
    pub display_name: String,
}

/// Null profile fields are serialized explicitly so the cached JSON keeps
/// the unresolved shape distinguishable from a resolved one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedCreator {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub real_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl CreatorRef {
    pub fn unresolved(id: Option<String>) -> Self {
        Self::Unresolved(UnresolvedCreator {
            id,
            ..UnresolvedCreator::default()
        })
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Resolved(creator) => Some(&creator.id),
            Self::Unresolved(creator) => creator.id.as_deref(),
        }
    }

    /// Only resolved creators expose an email; an email-based filter can
    /// therefore never match an unresolved creator.
    pub fn email(&self) -> Option<&str> {
        match self {
            Self::Resolved(creator) => Some(&creator.email),
            Self::Unresolved(_) => None,
        }
    }
}
