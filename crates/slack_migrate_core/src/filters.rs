use anyhow::{Result, bail};

use crate::types::{Channel, CreatorRef};

pub const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Archived,
}

impl StatusFilter {
    pub fn parse(value: &str) -> Result<Self> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        if value.eq_ignore_ascii_case("active") {
            return Ok(Self::Active);
        }
        if value.eq_ignore_ascii_case("archived") {
            return Ok(Self::Archived);
        }
        bail!("unsupported channel type: {value} (expected all|active|archived)")
    }
}

/// Filter options in CLI flag order. `archived_days_ago` / `created_days_ago`
/// apply whenever supplied, including an explicit 0 (which filters strictly
/// against `now`).
#[derive(Debug, Clone, Default)]
pub struct ChannelFilters {
    pub status: StatusFilter,
    pub creator: Option<String>,
    pub archived_days_ago: Option<i64>,
    pub created_days_ago: Option<i64>,
    pub zero_members: bool,
}

/// Run the fixed pipeline: status, creator, archived-age, created-age,
/// zero-members. Pure over the input; `now_secs` is injected for
/// deterministic cutoffs.
pub fn apply_filters(channels: &[Channel], filters: &ChannelFilters, now_secs: i64) -> Vec<Channel> {
    let mut current = filter_by_status(channels, filters.status);
    if let Some(creator) = filters.creator.as_deref() {
        current = filter_by_creator(&current, creator);
    }
    if let Some(days) = filters.archived_days_ago {
        current = filter_by_archived_days_ago(&current, days, now_secs);
    }
    if let Some(days) = filters.created_days_ago {
        current = filter_by_created_days_ago(&current, days, now_secs);
    }
    if filters.zero_members {
        current = filter_zero_members(&current);
    }
    current
}

pub fn filter_by_status(channels: &[Channel], status: StatusFilter) -> Vec<Channel> {
    channels
        .iter()
        .filter(|channel| match status {
            StatusFilter::All => true,
            StatusFilter::Active => !channel.is_archived,
            StatusFilter::Archived => channel.is_archived,
        })
        .cloned()
        .collect()
}

/// A needle containing `@` matches the resolved creator email; anything else
/// matches the creator id. Unresolved creators expose no email, so they can
/// never match an email needle.
pub fn filter_by_creator(channels: &[Channel], needle: &str) -> Vec<Channel> {
    let is_email = needle.contains('@');
    channels
        .iter()
        .filter(|channel| match (&channel.creator, is_email) {
            (creator, true) => creator.email() == Some(needle),
            (CreatorRef::Resolved(creator), false) => creator.id == needle,
            (CreatorRef::Unresolved(creator), false) => creator.id.as_deref() == Some(needle),
        })
        .cloned()
        .collect()
}

/// Keep archived channels whose `updated` stamp (milliseconds; divided by
/// 1000 here) falls at or after `now - days`. Non-archived channels never
/// pass regardless of the window.
pub fn filter_by_archived_days_ago(channels: &[Channel], days: i64, now_secs: i64) -> Vec<Channel> {
    let cutoff = (now_secs - days * SECONDS_PER_DAY) as f64;
    channels
        .iter()
        .filter(|channel| channel.is_archived && channel.updated as f64 / 1000.0 >= cutoff)
        .cloned()
        .collect()
}

/// Keep channels whose `created` stamp (already seconds, no conversion)
/// falls at or after `now - days`.
pub fn filter_by_created_days_ago(channels: &[Channel], days: i64, now_secs: i64) -> Vec<Channel> {
    let cutoff = now_secs - days * SECONDS_PER_DAY;
    channels
        .iter()
        .filter(|channel| channel.created >= cutoff)
        .cloned()
        .collect()
}

pub fn filter_zero_members(channels: &[Channel]) -> Vec<Channel> {
    channels
        .iter()
        .filter(|channel| channel.num_members == 0)
        .cloned()
        .collect()
}
