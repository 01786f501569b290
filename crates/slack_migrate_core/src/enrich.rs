use std::collections::HashMap;

use crate::types::{Channel, CreatorRef, RawChannel, ResolvedCreator, User};

/// Join channels against the user collection, replacing the raw creator id
/// with a structured record. The join is total: every channel comes out with
/// a `CreatorRef`, resolved when the id matched a user, unresolved (original
/// id kept, profile fields null) otherwise. Duplicate user ids are not
/// expected; if they occur the last one wins.
pub fn enrich_channels(raw: Vec<RawChannel>, users: &[User]) -> Vec<Channel> {
    let mut by_id: HashMap<&str, &User> = HashMap::with_capacity(users.len());
    for user in users {
        by_id.insert(user.id.as_str(), user);
    }

    raw.into_iter()
        .map(|channel| {
            let creator = match channel
                .creator
                .as_deref()
                .and_then(|id| by_id.get(id).copied())
            {
                Some(user) => CreatorRef::Resolved(ResolvedCreator {
                    id: user.id.clone(),
                    real_name: user.real_name.clone().unwrap_or_default(),
                    email: user.profile.email.clone().unwrap_or_default(),
                    display_name: user.profile.display_name.clone().unwrap_or_default(),
                }),
                None => CreatorRef::unresolved(channel.creator.clone()),
            };
            channel.with_creator(creator)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserProfile;

    fn user(id: &str, real_name: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_lowercase(),
            real_name: Some(real_name.to_string()),
            profile: UserProfile {
                email: Some(email.to_string()),
                display_name: Some(real_name.to_lowercase()),
                ..UserProfile::default()
            },
            ..User::default()
        }
    }

    fn raw(id: &str, creator: Option<&str>) -> RawChannel {
        RawChannel {
            id: id.to_string(),
            name: id.to_lowercase(),
            creator: creator.map(str::to_string),
            ..RawChannel::default()
        }
    }

    #[test]
    fn known_creator_resolves_with_profile_fields() {
        let users = vec![user("U1", "Ada Lovelace", "ada@example.com")];
        let channels = enrich_channels(vec![raw("C1", Some("U1"))], &users);

        match &channels[0].creator {
            CreatorRef::Resolved(creator) => {
                assert_eq!(creator.id, "U1");
                assert_eq!(creator.real_name, "Ada Lovelace");
                assert_eq!(creator.email, "ada@example.com");
                assert_eq!(creator.display_name, "ada lovelace");
            }
            CreatorRef::Unresolved(_) => panic!("creator must resolve"),
        }
    }

    #[test]
    fn unknown_creator_stays_unresolved_with_original_id() {
        let users = vec![user("U1", "Ada", "ada@example.com")];
        let channels = enrich_channels(vec![raw("C1", Some("UGONE"))], &users);

        assert!(!channels[0].creator.is_resolved());
        assert_eq!(channels[0].creator.id(), Some("UGONE"));
    }

    #[test]
    fn missing_creator_field_stays_unresolved_without_id() {
        let channels = enrich_channels(vec![raw("C1", None)], &[]);
        assert!(!channels[0].creator.is_resolved());
        assert_eq!(channels[0].creator.id(), None);
    }

    #[test]
    fn missing_profile_fields_resolve_to_empty_strings() {
        let users = vec![User {
            id: "U1".to_string(),
            ..User::default()
        }];
        let channels = enrich_channels(vec![raw("C1", Some("U1"))], &users);
        match &channels[0].creator {
            CreatorRef::Resolved(creator) => {
                assert_eq!(creator.real_name, "");
                assert_eq!(creator.email, "");
            }
            CreatorRef::Unresolved(_) => panic!("creator must resolve"),
        }
    }

    #[test]
    fn duplicate_user_ids_take_the_last_entry() {
        let users = vec![
            user("U1", "First", "first@example.com"),
            user("U1", "Second", "second@example.com"),
        ];
        let channels = enrich_channels(vec![raw("C1", Some("U1"))], &users);
        match &channels[0].creator {
            CreatorRef::Resolved(creator) => assert_eq!(creator.email, "second@example.com"),
            CreatorRef::Unresolved(_) => panic!("creator must resolve"),
        }
    }

    #[test]
    fn enrichment_is_total_over_the_input() {
        let users = vec![user("U1", "Ada", "ada@example.com")];
        let input = vec![raw("C1", Some("U1")), raw("C2", Some("UGONE")), raw("C3", None)];
        let channels = enrich_channels(input, &users);
        assert_eq!(channels.len(), 3);
    }
}
