//! The `watch` command: stream transfer statistics until interrupted.

use std::time::Duration;

use bytesize::ByteSize;

use deluctl_core::monitor::{StatsFeed, StatsSnapshot};
use deluctl_core::{ToggleConfig, preset::rate_label};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    config: ToggleConfig,
    interval_override: Option<u64>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let secs = interval_override.unwrap_or(config.poll_interval_secs).max(1);

    // Fail fast on unreachable daemon or bad credentials; the feed
    // itself only logs refresh failures.
    let first = deluctl_core::monitor::fetch_snapshot(&config.profile).await?;
    print_snapshot(&first, global);

    let feed = StatsFeed::spawn(config.profile, Duration::from_secs(secs));
    let mut handle = feed.subscribe();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = handle.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = handle.borrow_and_update().clone();
                if let Some(snapshot) = snapshot {
                    print_snapshot(&snapshot, global);
                }
            }
        }
    }

    feed.stop().await;
    Ok(())
}

fn print_snapshot(snapshot: &StatsSnapshot, global: &GlobalOpts) {
    let line = match global.output {
        OutputFormat::Json => output::render_json_compact(snapshot),
        _ => summary_line(snapshot),
    };
    output::print_output(&line, global.quiet);
}

/// One human-readable line per refresh.
fn summary_line(snapshot: &StatsSnapshot) -> String {
    format!(
        "{}  down {}  up {}  torrents {} ({} active)  limits {} / {}",
        snapshot.fetched_at.format("%H:%M:%S"),
        rate(snapshot.session.download_rate),
        rate(snapshot.session.upload_rate),
        snapshot.counts.total,
        snapshot.counts.active,
        rate_label(snapshot.limits.download),
        rate_label(snapshot.limits.upload),
    )
}

fn rate(bytes_per_sec: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bytes = bytes_per_sec.max(0.0) as u64;
    format!("{}/s", ByteSize::b(bytes))
}
