use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::SlackConfig;

/// Alias entries carry `alias:<other-name>` in place of a URL and have no
/// file of their own.
pub const ALIAS_PREFIX: &str = "alias:";

const DEFAULT_EXTENSION: &str = "png";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmojiFailure {
    pub name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmojiDownloadReport {
    pub total: usize,
    pub downloaded: usize,
    pub aliases: usize,
    pub failed: Vec<EmojiFailure>,
}

fn extension_from_url(url: &str) -> &str {
    let path = url.split('?').next().unwrap_or(url);
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() && !extension.is_empty() => extension,
        _ => DEFAULT_EXTENSION,
    }
}

/// Emoji names may contain `:` or `/`; neither belongs in a file name.
/// Colons are dropped, slashes become underscores.
pub fn file_name_for(name: &str, url: &str) -> String {
    let safe = name.replace(':', "").replace('/', "_");
    format!("{safe}.{}", extension_from_url(url))
}

/// Download every non-alias emoji into `dest`, one file per emoji, in map
/// order. A failed download is recorded and the run continues.
pub fn download_emoji_files<F>(
    dest: &Path,
    emoji: &BTreeMap<String, String>,
    mut fetch: F,
) -> Result<EmojiDownloadReport>
where
    F: FnMut(&str) -> Result<Vec<u8>>,
{
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory {}", dest.display()))?;

    let mut report = EmojiDownloadReport {
        total: emoji.len(),
        downloaded: 0,
        aliases: 0,
        failed: Vec::new(),
    };

    for (name, url) in emoji {
        if url.starts_with(ALIAS_PREFIX) {
            debug!(emoji = %name, target = %url, "skipping alias");
            report.aliases += 1;
            continue;
        }
        let path = dest.join(file_name_for(name, url));
        let outcome = fetch(url)
            .and_then(|bytes| {
                fs::write(&path, bytes)
                    .with_context(|| format!("failed to write {}", path.display()))
            });
        match outcome {
            Ok(()) => report.downloaded += 1,
            Err(error) => {
                let detail = format!("{error:#}");
                warn!(emoji = %name, error = %detail, "emoji download failed");
                report.failed.push(EmojiFailure {
                    name: name.clone(),
                    error: detail,
                });
            }
        }
    }

    info!(
        downloaded = report.downloaded,
        aliases = report.aliases,
        failed = report.failed.len(),
        "emoji download finished"
    );
    Ok(report)
}

/// Production fetcher: a plain blocking GET per emoji image.
pub fn http_fetcher(config: &SlackConfig) -> Result<impl FnMut(&str) -> Result<Vec<u8>>> {
    let client = Client::builder()
        .timeout(Duration::from_millis(config.timeout_ms))
        .user_agent(config.user_agent.clone())
        .build()
        .context("failed to build emoji download client")?;
    Ok(move |url: &str| -> Result<Vec<u8>> {
        let response = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("failed to download {url}"))?;
        let bytes = response
            .bytes()
            .with_context(|| format!("failed to read body of {url}"))?;
        Ok(bytes.to_vec())
    })
}
