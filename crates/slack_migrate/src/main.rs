use std::io::{self, BufRead};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use slack_migrate_core::config::SlackConfig;
use slack_migrate_core::context::Context;
use slack_migrate_core::emoji::{download_emoji_files, http_fetcher};
use slack_migrate_core::export::{
    format_epoch_millis, format_epoch_seconds, write_channels_csv, write_users_csv,
};
use slack_migrate_core::filters::{ChannelFilters, StatusFilter, apply_filters};
use slack_migrate_core::mutate::{ArchiveReport, MutateOptions, PrefixReport};
use slack_migrate_core::types::{Channel, User};
use tracing_subscriber::EnvFilter;

const CHANNELS_CSV_PATH: &str = "data/channels.csv";
const USERS_CSV_PATH: &str = "data/users.csv";
const EMOJI_DIR: &str = "data/custom-emojis-files";

const NO_IDS_MESSAGE: &str = "No channel IDs provided. Either specify a channel ID or pipe a list of channel IDs to this command.";

#[derive(Debug, Parser)]
#[command(
    name = "slack-migrate",
    version,
    about = "Extract Slack workspace metadata and run bulk channel maintenance"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(subcommand, about = "Channel listing, archiving, and renaming")]
    Channels(ChannelsCommand),
    #[command(subcommand, about = "User listing")]
    Users(UsersCommand),
    #[command(subcommand, about = "Custom emoji listing and download")]
    Emoji(EmojiCommand),
}

#[derive(Debug, Subcommand)]
enum ChannelsCommand {
    Fetch(ChannelsFetchArgs),
    Archive(ArchiveArgs),
    Prefix(PrefixArgs),
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    Fetch(UsersFetchArgs),
}

#[derive(Debug, Subcommand)]
enum EmojiCommand {
    Fetch(EmojiFetchArgs),
    Download(EmojiFetchArgs),
}

#[derive(Debug, Args)]
struct ChannelsFetchArgs {
    #[arg(
        long = "type",
        value_name = "TYPE",
        default_value = "all",
        help = "Filter by channel status (all, active, archived)"
    )]
    channel_type: String,
    #[arg(long, help = "Force refresh of cached channel data")]
    refresh: bool,
    #[arg(long, value_name = "CREATOR", help = "Filter by creator id or email")]
    creator: Option<String>,
    #[arg(
        long,
        value_name = "N",
        help = "Only archived channels updated within the last N days"
    )]
    archived_days_ago: Option<i64>,
    #[arg(long, value_name = "N", help = "Only channels created within the last N days")]
    created_days_ago: Option<i64>,
    #[arg(long, help = "Only channels with zero members")]
    zero_members: bool,
    #[arg(long, help = "Export to data/channels.csv instead of printing a table")]
    csv: bool,
}

#[derive(Debug, Args)]
struct ArchiveArgs {
    #[arg(value_name = "CHANNEL_ID", help = "Single channel id; omit to read ids from stdin")]
    channel_id: Option<String>,
    #[arg(long, help = "Preview actions without executing them")]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct PrefixArgs {
    #[arg(value_name = "PREFIX", help = "Prefix to prepend to channel names")]
    prefix: String,
    #[arg(value_name = "CHANNEL_ID", help = "Single channel id; omit to read ids from stdin")]
    channel_id: Option<String>,
    #[arg(long, help = "Preview actions without executing them")]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct UsersFetchArgs {
    #[arg(long, help = "Force refresh of cached user data")]
    refresh: bool,
    #[arg(long, help = "Export to data/users.csv instead of printing a table")]
    csv: bool,
}

#[derive(Debug, Args)]
struct EmojiFetchArgs {
    #[arg(long, help = "Force refresh of cached emoji data")]
    refresh: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = SlackConfig::from_env()?;
    let mut context = Context::new(config)?;

    match cli.command {
        Commands::Channels(ChannelsCommand::Fetch(args)) => run_channels_fetch(&mut context, args),
        Commands::Channels(ChannelsCommand::Archive(args)) => {
            run_channels_archive(&mut context, args)
        }
        Commands::Channels(ChannelsCommand::Prefix(args)) => {
            run_channels_prefix(&mut context, args)
        }
        Commands::Users(UsersCommand::Fetch(args)) => run_users_fetch(&mut context, args),
        Commands::Emoji(EmojiCommand::Fetch(args)) => run_emoji_fetch(&mut context, args),
        Commands::Emoji(EmojiCommand::Download(args)) => run_emoji_download(&mut context, args),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_channels_fetch(context: &mut Context, args: ChannelsFetchArgs) -> Result<()> {
    let status = StatusFilter::parse(&args.channel_type)?;
    let channels = context.fetch_channels(args.refresh)?;

    let filters = ChannelFilters {
        status,
        creator: args.creator,
        archived_days_ago: args.archived_days_ago,
        created_days_ago: args.created_days_ago,
        zero_members: args.zero_members,
    };
    let filtered = apply_filters(&channels, &filters, Utc::now().timestamp());

    println!("total {}", filtered.len());
    if args.csv {
        write_channels_csv(Path::new(CHANNELS_CSV_PATH), &filtered)?;
        println!("Channels exported to channels.csv");
    } else {
        print!("{}", render_plain_table(&channel_rows(&filtered)));
    }
    Ok(())
}

fn channel_rows(channels: &[Channel]) -> Vec<Vec<String>> {
    channels
        .iter()
        .map(|channel| {
            let created = match format_epoch_seconds(channel.created) {
                value if value.is_empty() => "<created unknown>".to_string(),
                value => value,
            };
            let updated = match format_epoch_millis(channel.updated) {
                value if value.is_empty() => "<updated unknown>".to_string(),
                value => value,
            };
            vec![
                channel.id.clone(),
                format!("#{}", channel.name),
                channel.num_members.to_string(),
                created,
                updated,
                channel.creator.email().unwrap_or_default().to_string(),
                if channel.is_archived { "archived" } else { "active" }.to_string(),
            ]
        })
        .collect()
}

fn run_channels_archive(context: &mut Context, args: ArchiveArgs) -> Result<()> {
    let stdin = io::stdin();
    let ids = collect_channel_ids(args.channel_id, stdin.lock())?;
    if ids.is_empty() {
        println!("{NO_IDS_MESSAGE}");
        return Ok(());
    }

    let options = MutateOptions {
        dry_run: args.dry_run,
    };
    let report = context.archive_channels(&ids, &options);
    print_archive_report(&report);
    Ok(())
}

fn print_archive_report(report: &ArchiveReport) {
    if report.dry_run {
        println!("DRY RUN: The following channels would be archived:");
        for id in &report.planned {
            println!("  - {id}");
        }
        return;
    }

    println!("Successfully archived {} channel(s).", report.archived.len());
    if !report.failures.is_empty() {
        println!("Failed to archive {} channel(s):", report.failures.len());
        for failure in &report.failures {
            println!("  - {}: {}", failure.id, failure.error);
        }
    }
}

fn run_channels_prefix(context: &mut Context, args: PrefixArgs) -> Result<()> {
    let stdin = io::stdin();
    let ids = collect_channel_ids(args.channel_id, stdin.lock())?;
    if ids.is_empty() {
        println!("{NO_IDS_MESSAGE}");
        return Ok(());
    }
    println!("Found {} channel(s) to process.", ids.len());

    let options = MutateOptions {
        dry_run: args.dry_run,
    };
    let report = context.prefix_channels(&args.prefix, &ids, &options);
    print_prefix_report(&report);
    Ok(())
}

fn print_prefix_report(report: &PrefixReport) {
    if report.dry_run {
        println!("DRY RUN: The following channels would be renamed:");
        for rename in &report.planned {
            println!("  - {} ({}) -> {}", rename.id, rename.old_name, rename.new_name);
        }
        if !report.skipped.is_empty() {
            println!("\nThe following channels would be skipped (already have prefix):");
            for skip in &report.skipped {
                println!("  - {} ({})", skip.id, skip.name);
            }
        }
        if !report.failures.is_empty() {
            println!("\nThe following channels could not be inspected:");
            for failure in &report.failures {
                println!("  - {}: {}", failure.id, failure.error);
            }
        }
        return;
    }

    println!("Successfully renamed {} channel(s).", report.renamed.len());
    if !report.skipped.is_empty() {
        println!("Skipped {} channel(s) (already have prefix):", report.skipped.len());
        for skip in &report.skipped {
            println!("  - {} ({})", skip.id, skip.name);
        }
    }
    if !report.failures.is_empty() {
        println!("Failed to rename {} channel(s):", report.failures.len());
        for failure in &report.failures {
            match (&failure.old_name, &failure.new_name) {
                (Some(old_name), Some(new_name)) => {
                    println!("  - {} ({} -> {}): {}", failure.id, old_name, new_name, failure.error);
                }
                _ => println!("  - {}: {}", failure.id, failure.error),
            }
        }
    }
}

fn run_users_fetch(context: &mut Context, args: UsersFetchArgs) -> Result<()> {
    let users = context.fetch_users(args.refresh)?;
    println!("total {}", users.len());
    if args.csv {
        write_users_csv(Path::new(USERS_CSV_PATH), &users)?;
        println!("Users exported to users.csv");
    } else {
        print!("{}", render_plain_table(&user_rows(&users)));
    }
    Ok(())
}

fn user_rows(users: &[User]) -> Vec<Vec<String>> {
    users
        .iter()
        .map(|user| {
            vec![
                user.id.clone(),
                format!("@{}", user.name),
                user.profile.real_name.clone().unwrap_or_default(),
                user.profile
                    .email
                    .clone()
                    .unwrap_or_else(|| "<no email>".to_string()),
            ]
        })
        .collect()
}

fn run_emoji_fetch(context: &mut Context, args: EmojiFetchArgs) -> Result<()> {
    let emoji = context.fetch_emoji(args.refresh)?;
    for name in emoji.keys() {
        println!(":{name}:");
    }
    Ok(())
}

fn run_emoji_download(context: &mut Context, args: EmojiFetchArgs) -> Result<()> {
    let emoji = context.fetch_emoji(args.refresh)?;
    println!("Found {} custom emoji.", emoji.len());

    let dest = Path::new(EMOJI_DIR);
    println!("Downloading emoji files to {}...", dest.display());

    let fetcher = http_fetcher(context.config())?;
    let report = download_emoji_files(dest, &emoji, fetcher)?;

    println!("\nEmoji download complete:");
    println!("  - Total: {}", report.total);
    println!("  - Downloaded: {}", report.downloaded);
    println!("  - Aliases (skipped): {}", report.aliases);
    println!("  - Failed: {}", report.failed.len());
    Ok(())
}

/// A positional id wins; otherwise ids come from the reader (stdin in
/// production), one per line, blanks dropped.
fn collect_channel_ids(positional: Option<String>, reader: impl BufRead) -> Result<Vec<String>> {
    if let Some(id) = positional {
        return Ok(vec![id]);
    }
    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            ids.push(trimmed.to_string());
        }
    }
    Ok(ids)
}

/// Space-padded columns, two spaces between them, no borders.
fn render_plain_table(rows: &[Vec<String>]) -> String {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; column_count];
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for row in rows {
        let mut line = String::new();
        for (index, cell) in row.iter().enumerate() {
            if index > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            if index + 1 < row.len() {
                let padding = widths[index].saturating_sub(cell.chars().count());
                line.extend(std::iter::repeat_n(' ', padding));
            }
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }
    output
}
