use std::collections::BTreeMap;

use crate::api::{PAGE_LIMIT, Page, SlackReadApi};
use crate::cache::{CacheStore, ResourceClass};
use crate::enrich::enrich_channels;
use crate::error::{ApiError, FetchError};
use crate::types::{Channel, User};

/// Drive the cursor protocol to completion: page with no cursor first, then
/// follow `next_cursor` until the server stops returning one. Page order is
/// preserved. There is deliberately no page-count or time bound; a server
/// that never ends the cursor chain is an accepted external risk.
fn paginate<T, F>(mut fetch_page: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<&str>) -> Result<Page<T>, ApiError>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch_page(cursor.as_deref())?;
        items.extend(page.items);
        cursor = page.next_cursor.filter(|value| !value.is_empty());
        if cursor.is_none() {
            break;
        }
    }
    Ok(items)
}

/// Fetch all workspace users, read-through cached. On a refresh or a miss
/// the whole paginated collection is assembled, cached, then returned; a
/// failed page aborts the fetch and nothing is cached.
pub fn fetch_users_with_api<A: SlackReadApi>(
    cache: &CacheStore,
    api: &mut A,
    refresh: bool,
) -> Result<Vec<User>, FetchError> {
    if !refresh && let Some(users) = cache.get::<Vec<User>>(ResourceClass::Users)? {
        return Ok(users);
    }

    let users = paginate(|cursor| api.list_users(cursor, PAGE_LIMIT)).map_err(|source| {
        FetchError::Api {
            resource: ResourceClass::Users,
            source,
        }
    })?;
    cache.put(ResourceClass::Users, &users)?;
    tracing::info!(count = users.len(), "fetched users");
    Ok(users)
}

/// Fetch all public channels, read-through cached. Creator enrichment is
/// applied unconditionally before caching, so the cached entry already
/// stores the enriched shape. The user collection backing the join follows
/// its own default non-refresh policy.
pub fn fetch_channels_with_api<A: SlackReadApi>(
    cache: &CacheStore,
    api: &mut A,
    refresh: bool,
) -> Result<Vec<Channel>, FetchError> {
    if !refresh && let Some(channels) = cache.get::<Vec<Channel>>(ResourceClass::Channels)? {
        return Ok(channels);
    }

    let raw = paginate(|cursor| api.list_channels(cursor, PAGE_LIMIT)).map_err(|source| {
        FetchError::Api {
            resource: ResourceClass::Channels,
            source,
        }
    })?;

    let users = fetch_users_with_api(cache, api, false)?;
    let channels = enrich_channels(raw, &users);

    cache.put(ResourceClass::Channels, &channels)?;
    tracing::info!(count = channels.len(), "fetched channels");
    Ok(channels)
}

/// Fetch the custom emoji map (single unpaginated call), read-through
/// cached under the same contract as the list fetches.
pub fn fetch_emoji_with_api<A: SlackReadApi>(
    cache: &CacheStore,
    api: &mut A,
    refresh: bool,
) -> Result<BTreeMap<String, String>, FetchError> {
    if !refresh && let Some(emoji) = cache.get::<BTreeMap<String, String>>(ResourceClass::Emoji)? {
        return Ok(emoji);
    }

    let emoji = api.emoji_list().map_err(|source| FetchError::Api {
        resource: ResourceClass::Emoji,
        source,
    })?;
    cache.put(ResourceClass::Emoji, &emoji)?;
    tracing::info!(count = emoji.len(), "fetched emoji");
    Ok(emoji)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::error::ApiError;
    use crate::types::{RawChannel, UserProfile};

    #[derive(Default)]
    struct MockApi {
        channel_pages: Vec<Page<RawChannel>>,
        user_pages: Vec<Page<User>>,
        emoji: BTreeMap<String, String>,
        fail_channels_on_page: Option<usize>,
        channel_calls: usize,
        user_calls: usize,
        request_count: usize,
    }

    impl SlackReadApi for MockApi {
        fn list_channels(
            &mut self,
            cursor: Option<&str>,
            _limit: u32,
        ) -> Result<Page<RawChannel>, ApiError> {
            self.request_count += 1;
            let index = self.channel_calls;
            self.channel_calls += 1;
            if self.fail_channels_on_page == Some(index) {
                return Err(ApiError::Slack {
                    method: "conversations.list",
                    code: "ratelimited".to_string(),
                });
            }
            assert_eq!(cursor.is_some(), index > 0, "first page must have no cursor");
            Ok(self.channel_pages.get(index).cloned().unwrap_or_default())
        }

        fn list_users(&mut self, _cursor: Option<&str>, _limit: u32) -> Result<Page<User>, ApiError> {
            self.request_count += 1;
            let index = self.user_calls;
            self.user_calls += 1;
            Ok(self.user_pages.get(index).cloned().unwrap_or_default())
        }

        fn emoji_list(&mut self) -> Result<BTreeMap<String, String>, ApiError> {
            self.request_count += 1;
            Ok(self.emoji.clone())
        }

        fn channel_info(&mut self, channel_id: &str) -> Result<RawChannel, ApiError> {
            self.request_count += 1;
            Err(ApiError::Slack {
                method: "conversations.info",
                code: format!("channel_not_found:{channel_id}"),
            })
        }

        fn request_count(&self) -> usize {
            self.request_count
        }
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: id.to_lowercase(),
            real_name: Some(format!("Real {id}")),
            profile: UserProfile {
                email: Some(email.to_string()),
                display_name: Some(id.to_lowercase()),
                ..UserProfile::default()
            },
            ..User::default()
        }
    }

    fn raw_channel(id: &str, creator: Option<&str>) -> RawChannel {
        RawChannel {
            id: id.to_string(),
            name: id.to_lowercase(),
            creator: creator.map(str::to_string),
            ..RawChannel::default()
        }
    }

    fn page<T>(items: Vec<T>, next_cursor: Option<&str>) -> Page<T> {
        Page {
            items,
            next_cursor: next_cursor.map(str::to_string),
        }
    }

    #[test]
    fn users_fetch_assembles_pages_in_order_with_one_call_per_page() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            user_pages: vec![
                page(vec![user("U1", "a@example.com"), user("U2", "b@example.com")], Some("c1")),
                page(vec![user("U3", "c@example.com")], Some("c2")),
                page(vec![user("U4", "d@example.com")], None),
            ],
            ..MockApi::default()
        };

        let users = fetch_users_with_api(&cache, &mut api, false).expect("fetch");
        assert_eq!(
            users.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            vec!["U1", "U2", "U3", "U4"]
        );
        assert_eq!(api.user_calls, 3);
    }

    #[test]
    fn empty_string_cursor_terminates_pagination() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            user_pages: vec![page(vec![user("U1", "a@example.com")], Some(""))],
            ..MockApi::default()
        };

        let users = fetch_users_with_api(&cache, &mut api, true).expect("fetch");
        assert_eq!(users.len(), 1);
        assert_eq!(api.user_calls, 1);
    }

    #[test]
    fn cache_miss_fetches_once_and_writes_one_entry() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            user_pages: vec![page(vec![user("U1", "a@example.com")], None)],
            ..MockApi::default()
        };

        fetch_users_with_api(&cache, &mut api, false).expect("fetch");
        assert_eq!(api.user_calls, 1);
        assert!(cache.path_for(ResourceClass::Users).exists());
    }

    #[test]
    fn non_refresh_read_returns_the_cached_collection_without_network() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            user_pages: vec![page(vec![user("U1", "a@example.com")], None)],
            ..MockApi::default()
        };

        let written = fetch_users_with_api(&cache, &mut api, false).expect("first fetch");
        let read = fetch_users_with_api(&cache, &mut api, false).expect("second fetch");
        assert_eq!(read, written);
        assert_eq!(api.user_calls, 1, "second fetch must not hit the network");
    }

    #[test]
    fn refresh_bypasses_the_cache() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            user_pages: vec![page(vec![user("U1", "a@example.com")], None)],
            ..MockApi::default()
        };

        fetch_users_with_api(&cache, &mut api, false).expect("first fetch");
        api.user_pages = vec![page(vec![user("U9", "z@example.com")], None)];
        api.user_calls = 0;
        let refreshed = fetch_users_with_api(&cache, &mut api, true).expect("refresh");
        assert_eq!(refreshed[0].id, "U9");
    }

    #[test]
    fn failed_page_aborts_the_fetch_and_caches_nothing() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            channel_pages: vec![
                page(vec![raw_channel("C1", None)], Some("c1")),
                page(vec![raw_channel("C2", None)], None),
            ],
            fail_channels_on_page: Some(1),
            ..MockApi::default()
        };

        let error = fetch_channels_with_api(&cache, &mut api, false).expect_err("must fail");
        assert!(error.to_string().contains("channels"));
        assert!(!cache.path_for(ResourceClass::Channels).exists());
    }

    #[test]
    fn channel_fetch_caches_the_enriched_shape() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi {
            channel_pages: vec![page(
                vec![raw_channel("C1", Some("U1")), raw_channel("C2", Some("UGONE"))],
                None,
            )],
            user_pages: vec![page(vec![user("U1", "a@example.com")], None)],
            ..MockApi::default()
        };

        let channels = fetch_channels_with_api(&cache, &mut api, false).expect("fetch");
        assert!(channels[0].creator.is_resolved());
        assert!(!channels[1].creator.is_resolved());

        // A cached re-read must come back in the same enriched shape.
        let cached = fetch_channels_with_api(&cache, &mut api, false).expect("cached fetch");
        assert_eq!(cached, channels);
        assert_eq!(api.channel_calls, 1);
    }

    #[test]
    fn emoji_fetch_round_trips_through_the_cache() {
        let temp = tempdir().expect("tempdir");
        let cache = CacheStore::new(temp.path());
        let mut api = MockApi::default();
        api.emoji
            .insert("party".to_string(), "https://emoji.example.com/party.gif".to_string());
        api.emoji.insert("woo".to_string(), "alias:party".to_string());

        let fetched = fetch_emoji_with_api(&cache, &mut api, false).expect("fetch");
        let cached = fetch_emoji_with_api(&cache, &mut api, false).expect("cached");
        assert_eq!(cached, fetched);
        assert_eq!(api.request_count(), 1);
    }
}
