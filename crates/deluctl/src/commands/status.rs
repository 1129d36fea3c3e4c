//! The `status` command: toggle position, live limits, and per-torrent
//! transfer statistics in one view.

use bytesize::ByteSize;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::Tabled;

use deluctl_core::monitor::{StatsSnapshot, fetch_snapshot};
use deluctl_core::preset::rate_label;
use deluctl_core::{ToggleConfig, TorrentStatus, classify};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Serializable status view: the snapshot plus the derived toggle
/// position.
#[derive(Debug, Serialize)]
struct StatusView {
    host: String,
    port: u16,
    is_on: bool,
    download_limit: i64,
    upload_limit: i64,
    #[serde(flatten)]
    snapshot: StatsSnapshot,
}

#[derive(Tabled)]
struct TorrentRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "PROGRESS")]
    progress: String,
    #[tabled(rename = "DOWN")]
    down: String,
    #[tabled(rename = "UP")]
    up: String,
    #[tabled(rename = "ETA")]
    eta: String,
    #[tabled(rename = "RATIO")]
    ratio: String,
}

pub async fn handle(config: ToggleConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let snapshot = fetch_snapshot(&config.profile).await?;
    let is_on = classify(snapshot.limits, &config.presets).is_on();

    let view = StatusView {
        host: config.profile.host.clone(),
        port: config.profile.port,
        is_on,
        download_limit: snapshot.limits.download,
        upload_limit: snapshot.limits.upload,
        snapshot,
    };

    let color = output::should_color(global.color);
    let rendered = output::render_single(
        global.output,
        &view,
        |v| detail(v, color),
        |v| if v.is_on { "on".into() } else { "off".into() },
    );
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn detail(view: &StatusView, color: bool) -> String {
    use std::fmt::Write;

    let position = if view.is_on { "ON (limited)" } else { "OFF (unlimited)" };
    let position = if color {
        if view.is_on {
            position.green().to_string()
        } else {
            position.cyan().to_string()
        }
    } else {
        position.to_string()
    };

    let mut out = String::new();
    let _ = writeln!(out, "Daemon:  {}:{}", view.host, view.port);
    let _ = writeln!(out, "Toggle:  {position}");
    let _ = writeln!(
        out,
        "Limits:  {} down / {} up",
        rate_label(view.download_limit),
        rate_label(view.upload_limit)
    );
    let _ = writeln!(
        out,
        "Rates:   {} down / {} up",
        rate(view.snapshot.session.download_rate),
        rate(view.snapshot.session.upload_rate)
    );
    let counts = view.snapshot.counts;
    let _ = writeln!(
        out,
        "Torrents: {} total, {} downloading, {} seeding, {} active",
        counts.total, counts.downloading, counts.seeding, counts.active
    );

    if !view.snapshot.torrents.is_empty() {
        let mut rows: Vec<TorrentRow> = view
            .snapshot
            .torrents
            .values()
            .map(|t| torrent_row(t, color))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        let _ = write!(out, "\n{}", output::render_table(&rows));
    }

    out.trim_end().to_string()
}

fn torrent_row(torrent: &TorrentStatus, color: bool) -> TorrentRow {
    TorrentRow {
        name: torrent.name.clone(),
        state: colored_state(&torrent.state, color),
        progress: format!("{:.1}%", torrent.progress),
        down: rate(torrent.download_payload_rate),
        up: rate(torrent.upload_payload_rate),
        eta: eta_label(torrent.eta),
        ratio: format!("{:.2}", torrent.ratio),
    }
}

fn colored_state(state: &str, color: bool) -> String {
    if !color {
        return state.to_string();
    }
    match state {
        "Downloading" => state.green().to_string(),
        "Seeding" => state.cyan().to_string(),
        "Paused" => state.yellow().to_string(),
        "Error" => state.red().to_string(),
        _ => state.to_string(),
    }
}

/// Bytes/s rate with binary units.
fn rate(bytes_per_sec: f64) -> String {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bytes = bytes_per_sec.max(0.0) as u64;
    format!("{}/s", ByteSize::b(bytes))
}

/// Humanized ETA; the daemon reports 0 for unknown or finished.
fn eta_label(eta: i64) -> String {
    match u64::try_from(eta) {
        Ok(0) | Err(_) => "-".into(),
        Ok(secs) => humantime::format_duration(std::time::Duration::from_secs(secs)).to_string(),
    }
}
