//! garrisond - Garrison Portal daemon.
//!
//! Loads the portal config, seeds the in-memory state, and logs a roster
//! report: promotion-due members and the avatar moderation queue.

use chrono::Utc;
use garrisond::config::Config;
use garrisond::state::Portal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(portal = %config.portal.name, "Starting garrisond");

    let portal = Portal::from_config(&config)?;
    let now = Utc::now();

    for record in portal.personnel.search("") {
        let due = portal.personnel.promotion_due(record.id, now)?;
        info!(
            nickname = %record.nickname,
            rank = %record.rank,
            position = %record.position,
            role = ?record.role,
            promotion_due = due,
            "Roster entry"
        );
    }

    let queue = portal.personnel.pending_avatar_requests();
    if queue.is_empty() {
        info!("Avatar moderation queue is empty");
    } else {
        for request in &queue {
            info!(
                nickname = %request.nickname,
                submitted_at = %request.submitted_at,
                "Pending avatar request"
            );
        }
    }

    info!(
        awards = portal.awards.len(),
        news = portal.news.len(),
        "Portal ready"
    );

    Ok(())
}
