use serde::Serialize;
use tracing::{info, warn};

use crate::api::SlackWriteApi;
use crate::error::MutateError;
use crate::types::RawChannel;

#[derive(Debug, Clone, Copy, Default)]
pub struct MutateOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ArchiveFailure {
    pub id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveReport {
    pub dry_run: bool,
    /// Ids that would be archived (dry run only).
    pub planned: Vec<String>,
    /// Ids archived in input order (wet run only).
    pub archived: Vec<String>,
    pub failures: Vec<ArchiveFailure>,
    pub request_count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrefixRename {
    pub id: String,
    pub old_name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrefixSkip {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PrefixFailure {
    pub id: String,
    /// Unknown when the inspection call itself failed.
    pub old_name: Option<String>,
    pub new_name: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrefixReport {
    pub dry_run: bool,
    /// Normalized prefix actually applied.
    pub prefix: String,
    pub planned: Vec<PrefixRename>,
    pub renamed: Vec<PrefixRename>,
    pub skipped: Vec<PrefixSkip>,
    pub failures: Vec<PrefixFailure>,
    pub request_count: usize,
}

/// Strip one leading `#` (channel names are often pasted with one) and one
/// trailing `-` so the joined name does not double the separator.
pub fn normalize_prefix(prefix: &str) -> String {
    let prefix = prefix.strip_prefix('#').unwrap_or(prefix);
    prefix.strip_suffix('-').unwrap_or(prefix).to_string()
}

/// Membership gate shared by archive and rename. The bot can join public
/// channels on its own; private channels need a human invite first.
fn ensure_member<A: SlackWriteApi>(api: &mut A, channel: &RawChannel) -> Result<(), MutateError> {
    if channel.is_member {
        return Ok(());
    }
    if channel.is_private {
        return Err(MutateError::PrivateChannel {
            channel_id: channel.id.clone(),
        });
    }
    api.join_channel(&channel.id)
        .map_err(|source| MutateError::Join {
            channel_id: channel.id.clone(),
            source,
        })
}

fn archive_one<A: SlackWriteApi>(api: &mut A, channel_id: &str) -> Result<(), MutateError> {
    let channel = api.channel_info(channel_id)?;
    ensure_member(api, &channel)?;
    if api.archive_channel(channel_id)? {
        Ok(())
    } else {
        Err(MutateError::CallReturnedFalse)
    }
}

/// Archive the given channels one at a time. A dry run performs no API
/// calls at all. Per-channel failures are recorded and the run continues;
/// every input id lands in exactly one report bucket.
pub fn archive_channels_with_api<A: SlackWriteApi>(
    api: &mut A,
    ids: &[String],
    options: &MutateOptions,
) -> ArchiveReport {
    let mut report = ArchiveReport {
        dry_run: options.dry_run,
        planned: Vec::new(),
        archived: Vec::new(),
        failures: Vec::new(),
        request_count: 0,
    };

    if options.dry_run {
        report.planned = ids.to_vec();
        report.request_count = api.request_count();
        return report;
    }

    for id in ids {
        match archive_one(api, id) {
            Ok(()) => {
                info!(channel = %id, "archived channel");
                report.archived.push(id.clone());
            }
            Err(error) => {
                warn!(channel = %id, %error, "failed to archive channel");
                report.failures.push(ArchiveFailure {
                    id: id.clone(),
                    error: error.to_string(),
                });
            }
        }
    }

    report.request_count = api.request_count();
    report
}

fn rename_one<A: SlackWriteApi>(
    api: &mut A,
    channel: &RawChannel,
    new_name: &str,
) -> Result<(), MutateError> {
    ensure_member(api, channel)?;
    if api.rename_channel(&channel.id, new_name)? {
        Ok(())
    } else {
        Err(MutateError::CallReturnedFalse)
    }
}

/// Rename the given channels to `{prefix}-{name}`. Each channel is
/// inspected once; already-prefixed names are skipped and an inspection
/// failure is a recorded failure, never a silent drop. A dry run still
/// inspects (to compute the partition) but performs no renames.
pub fn prefix_channels_with_api<A: SlackWriteApi>(
    api: &mut A,
    prefix: &str,
    ids: &[String],
    options: &MutateOptions,
) -> PrefixReport {
    let prefix = normalize_prefix(prefix);
    let wanted = format!("{prefix}-");
    let mut report = PrefixReport {
        dry_run: options.dry_run,
        prefix,
        planned: Vec::new(),
        renamed: Vec::new(),
        skipped: Vec::new(),
        failures: Vec::new(),
        request_count: 0,
    };

    for id in ids {
        let channel = match api.channel_info(id) {
            Ok(channel) => channel,
            Err(error) => {
                let error = MutateError::from(error);
                warn!(channel = %id, %error, "failed to inspect channel");
                report.failures.push(PrefixFailure {
                    id: id.clone(),
                    old_name: None,
                    new_name: None,
                    error: error.to_string(),
                });
                continue;
            }
        };

        if channel.name.starts_with(&wanted) {
            report.skipped.push(PrefixSkip {
                id: id.clone(),
                name: channel.name,
            });
            continue;
        }

        let new_name = format!("{wanted}{}", channel.name);
        let rename = PrefixRename {
            id: id.clone(),
            old_name: channel.name.clone(),
            new_name: new_name.clone(),
        };

        if options.dry_run {
            report.planned.push(rename);
            continue;
        }

        match rename_one(api, &channel, &new_name) {
            Ok(()) => {
                info!(channel = %id, new_name = %new_name, "renamed channel");
                report.renamed.push(rename);
            }
            Err(error) => {
                warn!(channel = %id, %error, "failed to rename channel");
                report.failures.push(PrefixFailure {
                    id: id.clone(),
                    old_name: Some(channel.name),
                    new_name: Some(new_name),
                    error: error.to_string(),
                });
            }
        }
    }

    report.request_count = api.request_count();
    report
}
