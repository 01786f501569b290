use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, TimeZone};
use tracing::info;

use crate::types::{Channel, User};

/// Render an epoch-seconds stamp as local `YYYY-MM-DD HH:MM:SS`. Zero means
/// the platform never set the field and renders empty.
pub fn format_epoch_seconds(secs: i64) -> String {
    if secs == 0 {
        return String::new();
    }
    match Local.timestamp_opt(secs, 0).single() {
        Some(stamp) => stamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// `updated` arrives in milliseconds; divide down before formatting.
pub fn format_epoch_millis(millis: i64) -> String {
    format_epoch_seconds(millis / 1000)
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

pub fn write_channels_csv(path: &Path, channels: &[Channel]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    writer.write_record([
        "id",
        "name",
        "num_members",
        "created",
        "updated",
        "is_archived",
        "creator_id",
        "creator_email",
        "topic",
        "purpose",
    ])?;
    for channel in channels {
        writer.write_record([
            channel.id.as_str(),
            channel.name.as_str(),
            &channel.num_members.to_string(),
            &format_epoch_seconds(channel.created),
            &format_epoch_millis(channel.updated),
            &channel.is_archived.to_string(),
            channel.creator.id().unwrap_or(""),
            channel.creator.email().unwrap_or(""),
            channel.topic.value.as_str(),
            channel.purpose.value.as_str(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = channels.len(), "wrote channel export");
    Ok(())
}

pub fn write_users_csv(path: &Path, users: &[User]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    writer.write_record(["id", "name", "real_name", "email", "display_name"])?;
    for user in users {
        writer.write_record([
            user.id.as_str(),
            user.name.as_str(),
            user.real_name.as_deref().unwrap_or(""),
            user.profile.email.as_deref().unwrap_or(""),
            user.profile.display_name.as_deref().unwrap_or(""),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), rows = users.len(), "wrote user export");
    Ok(())
}
