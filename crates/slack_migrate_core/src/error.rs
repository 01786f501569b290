use std::path::PathBuf;

use thiserror::Error;

use crate::cache::ResourceClass;

/// Cache persistence failures. A cache file that exists but cannot be parsed
/// is fatal rather than a miss: refetching over a corrupted snapshot would
/// hide the corruption from the operator.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("error reading cache file {path}: {detail}")]
    Corrupted { path: PathBuf, detail: String },

    #[error("error writing to cache file {path}: {detail}")]
    Write { path: PathBuf, detail: String },
}

/// A non-success Slack API response or transport failure for one call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Slack API call {method} failed: {code}")]
    Slack { method: &'static str, code: String },

    #[error("Slack API call {method} failed with HTTP {status}")]
    Http { method: &'static str, status: u16 },

    #[error("failed to call Slack API {method}: {detail}")]
    Transport { method: &'static str, detail: String },

    #[error("failed to decode Slack API {method} response: {detail}")]
    Decode { method: &'static str, detail: String },

    #[error("{method} requires an admin token (set SLACK_USER_TOKEN)")]
    MissingAdminToken { method: &'static str },
}

/// Failure of a whole-collection fetch. Aborts the invoking command; no
/// partial collection is cached or returned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("error retrieving {resource}: {source}")]
    Api {
        resource: ResourceClass,
        #[source]
        source: ApiError,
    },
}

/// Per-item mutation failure. Recorded in the report's failure bucket and
/// never aborts the rest of the batch.
#[derive(Debug, Error)]
pub enum MutateError {
    #[error("bot is not a member of private channel {channel_id}. Please invite the bot first")]
    PrivateChannel { channel_id: String },

    #[error("failed to join channel {channel_id}: {source}")]
    Join {
        channel_id: String,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("API call returned false")]
    CallReturnedFalse,
}
