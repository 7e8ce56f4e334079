//! Plain-text rendering of tracks and command results

use crate::commands::{ImportSummary, SessionStatus};
use encore_core::Track;
use std::fmt::Write;

/// `m:ss`, or `--:--` when the duration is unknown
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "--:--".to_string();
    }
    let total = seconds.round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub fn format_track(track: &Track) -> String {
    let heart = if track.liked { "♥" } else { " " };
    let origin = if track.is_local { "local" } else { "remote" };
    format!(
        "{heart} {:<40} {} - {} [{}] ({origin})",
        track.id,
        track.artist,
        track.title,
        format_duration(track.duration_seconds)
    )
}

pub fn format_import(summary: &ImportSummary) -> String {
    let mut out = String::new();
    for track in &summary.imported {
        let _ = writeln!(out, "imported  {}", format_track(track));
    }
    for path in &summary.duplicates {
        let _ = writeln!(out, "duplicate {}", path.display());
    }
    for failure in &summary.failed {
        let _ = writeln!(out, "failed    {}: {}", failure.path.display(), failure.error);
    }
    let _ = write!(
        out,
        "{} imported, {} duplicates, {} failed",
        summary.imported.len(),
        summary.duplicates.len(),
        summary.failed.len()
    );
    out
}

pub fn format_status(status: Option<&SessionStatus>) -> String {
    match status {
        Some(status) => format!(
            "Last played: {} - {}\nPosition: {} / {}",
            status.track.artist,
            status.track.title,
            format_duration(status.position_seconds).replace("--:--", "0:00"),
            format_duration(status.track.duration_seconds)
        ),
        None => "Nothing played yet".to_string(),
    }
}
