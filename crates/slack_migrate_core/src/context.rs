use std::collections::BTreeMap;

use anyhow::Result;

use crate::api::SlackHttpClient;
use crate::cache::CacheStore;
use crate::config::SlackConfig;
use crate::error::FetchError;
use crate::fetch::{fetch_channels_with_api, fetch_emoji_with_api, fetch_users_with_api};
use crate::mutate::{
    ArchiveReport, MutateOptions, PrefixReport, archive_channels_with_api, prefix_channels_with_api,
};
use crate::types::{Channel, User};

/// Bundles the cache store and the HTTP client so callers do not thread the
/// two through every call. All of the work happens in the `*_with_api`
/// functions, which remain independently testable against a mock API.
pub struct Context {
    config: SlackConfig,
    cache: CacheStore,
    api: SlackHttpClient,
}

impl Context {
    pub fn new(config: SlackConfig) -> Result<Self> {
        let cache = CacheStore::new(&config.cache_dir);
        let api = SlackHttpClient::new(config.clone())?;
        Ok(Self { config, cache, api })
    }

    pub fn config(&self) -> &SlackConfig {
        &self.config
    }

    pub fn fetch_channels(&mut self, refresh: bool) -> Result<Vec<Channel>, FetchError> {
        fetch_channels_with_api(&self.cache, &mut self.api, refresh)
    }

    pub fn fetch_users(&mut self, refresh: bool) -> Result<Vec<User>, FetchError> {
        fetch_users_with_api(&self.cache, &mut self.api, refresh)
    }

    pub fn fetch_emoji(&mut self, refresh: bool) -> Result<BTreeMap<String, String>, FetchError> {
        fetch_emoji_with_api(&self.cache, &mut self.api, refresh)
    }

    pub fn archive_channels(&mut self, ids: &[String], options: &MutateOptions) -> ArchiveReport {
        archive_channels_with_api(&mut self.api, ids, options)
    }

    pub fn prefix_channels(
        &mut self,
        prefix: &str,
        ids: &[String],
        options: &MutateOptions,
    ) -> PrefixReport {
        prefix_channels_with_api(&mut self.api, prefix, ids, options)
    }
}
