//! Snapshot rendering for transitctl.

use colored::Colorize;
use serde_json::{Value, json};

use transitline_core::{ObserverSnapshot, ReporterSnapshot, TripState};

/// Print the driver-side snapshot in the selected format.
pub fn print_reporter(snapshot: &ReporterSnapshot, json_output: bool) {
    if json_output {
        print_json(&reporter_json(snapshot));
        return;
    }

    let state = match (snapshot.state, snapshot.degraded) {
        (TripState::Idle, _) => "idle".yellow(),
        (TripState::Active, false) => "active".green(),
        (TripState::Active, true) => "active (degraded)".red(),
    };
    let mut line = format!(
        "driver {} {} position={} updated={} failures={}",
        snapshot.identifier.as_deref().unwrap_or("-").bold(),
        state,
        format_position(snapshot.last_position),
        format_time(snapshot.last_updated_at),
        snapshot.publish_failures,
    );
    if let Some(err) = &snapshot.last_error {
        line.push_str(&format!(" error={}: {}", err.kind, err.message));
    }
    println!("{line}");
}

/// Print the rider-side snapshot in the selected format.
pub fn print_observer(snapshot: &ObserverSnapshot, json_output: bool) {
    if json_output {
        print_json(&observer_json(snapshot));
        return;
    }

    let mut line = format!(
        "rider  {} remote={} local={} updated={}",
        snapshot.identifier.as_deref().unwrap_or("-").bold(),
        format_position(snapshot.remote_position),
        format_position(snapshot.local_position),
        format_time(snapshot.last_updated_at),
    );
    if snapshot.is_waiting() {
        line.push_str(&format!(" {}", "waiting for updates".yellow()));
    }
    if let Some(err) = &snapshot.last_error {
        line.push_str(&format!(" error={}: {}", err.kind, err.message));
    }
    println!("{line}");
}

fn print_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("failed to render snapshot: {e}"),
    }
}

fn format_position(position: Option<transitline_geo::Position>) -> String {
    match position {
        Some(p) => format!("{:.5},{:.5}", p.latitude, p.longitude),
        None => "-".to_owned(),
    }
}

fn format_time(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    match time {
        Some(t) => t.format("%H:%M:%S").to_string(),
        None => "-".to_owned(),
    }
}

fn reporter_json(snapshot: &ReporterSnapshot) -> Value {
    json!({
        "role": "driver",
        "state": match snapshot.state {
            TripState::Idle => "idle",
            TripState::Active => "active",
        },
        "identifier": snapshot.identifier,
        "degraded": snapshot.degraded,
        "position": snapshot.last_position.map(|p| json!({"lat": p.latitude, "lng": p.longitude})),
        "last_updated_at": snapshot.last_updated_at.map(|t| t.to_rfc3339()),
        "publish_failures": snapshot.publish_failures,
        "last_error": snapshot.last_error.as_ref().map(|e| json!({
            "kind": e.kind.to_string(),
            "message": e.message,
        })),
    })
}

fn observer_json(snapshot: &ObserverSnapshot) -> Value {
    json!({
        "role": "rider",
        "identifier": snapshot.identifier,
        "remote_position": snapshot
            .remote_position
            .map(|p| json!({"lat": p.latitude, "lng": p.longitude})),
        "local_position": snapshot
            .local_position
            .map(|p| json!({"lat": p.latitude, "lng": p.longitude})),
        "last_updated_at": snapshot.last_updated_at.map(|t| t.to_rfc3339()),
        "waiting": snapshot.is_waiting(),
        "last_error": snapshot.last_error.as_ref().map(|e| json!({
            "kind": e.kind.to_string(),
            "message": e.message,
        })),
    })
}
