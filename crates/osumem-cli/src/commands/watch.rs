//! Watch mode command.
//!
//! Attaches to the client, resolves its signatures, and polls the status and
//! gameplay records, logging screen changes and every new miss. Survives the
//! game being closed and reopened.

use std::sync::Arc;

use anyhow::Result;
use osumem_core::{
    AggregateError, Config, Error, GameStatus, GameplayData, MenuData, Process, Schemas,
    StatusData,
};
use tracing::{debug, error, info, warn};

use super::{ProcessSession, connect, resolve};
use crate::input;
use crate::shutdown::{ShutdownSignal, StopReason};

/// Something worth reporting between two polls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    StatusChanged { from: GameStatus, to: GameStatus },
    /// The miss counter went up; `count` is the new total
    Miss { count: i16 },
}

/// Compares each poll with the previous one
#[derive(Debug)]
pub struct Tracker {
    ignored_fields: Vec<String>,
    status: GameStatus,
    misses: Option<i16>,
}

impl Tracker {
    pub fn new(ignored_fields: &[String]) -> Self {
        Self {
            ignored_fields: ignored_fields.to_vec(),
            status: GameStatus::Unknown,
            misses: None,
        }
    }

    /// Whether a partial gameplay read is still usable
    pub fn tolerates(&self, err: &AggregateError) -> bool {
        err.only_within(&self.ignored_fields)
    }

    pub fn update_status(&mut self, status: GameStatus) -> Option<Event> {
        if status == self.status {
            return None;
        }
        let from = std::mem::replace(&mut self.status, status);
        // A new play starts counting from scratch
        self.misses = None;
        Some(Event::StatusChanged { from, to: status })
    }

    pub fn update_misses(&mut self, count: i16) -> Option<Event> {
        let previous = self.misses.replace(count);
        match previous {
            Some(previous) if count > previous => Some(Event::Miss { count }),
            _ => None,
        }
    }
}

fn is_alive<P: Process + ?Sized>(process: &P) -> bool {
    process.regions().map(|r| !r.is_empty()).unwrap_or(false)
}

/// Run the watch command
pub fn run(config: &Config, pid: Option<u32>) -> Result<()> {
    let shutdown = Arc::new(ShutdownSignal::new());
    let shutdown_ctrlc = Arc::clone(&shutdown);
    ctrlc::set_handler(move || {
        shutdown_ctrlc.trigger(StopReason::Interrupted);
    })?;
    let _keyboard = input::spawn_keyboard_monitor(Arc::clone(&shutdown));

    let schemas = Schemas::load()?;

    println!("Waiting for {}... (Press Esc or q to quit)", config.process.name);
    while !shutdown.is_shutdown() {
        match connect(config, pid, schemas.addresses.clone()) {
            Ok(mut session) => {
                if let Err(e) = track(&mut session, &schemas, config, &shutdown) {
                    error!("Tracker error: {}", e);
                }
                if !shutdown.is_shutdown() {
                    info!("Process disconnected, waiting for reconnect...");
                }
            }
            Err(e) => match e.downcast_ref::<Error>() {
                Some(Error::UnsupportedPlatform) => return Err(e),
                _ => debug!("{}", e),
            },
        }

        if shutdown.wait(config.poll.retry_delay()) {
            break;
        }
    }

    match shutdown.reason() {
        Some(reason) => info!("Stopped ({})", reason),
        None => info!("Stopped"),
    }
    Ok(())
}

/// Resolve signatures until all are found. Returns `false` on shutdown or
/// when the process went away.
fn wait_for_signatures(
    session: &mut ProcessSession,
    config: &Config,
    shutdown: &ShutdownSignal,
) -> bool {
    loop {
        match resolve(session, config) {
            Ok(()) => return true,
            Err(e) => {
                if !is_alive(session.process()) {
                    return false;
                }
                warn!(
                    "Signatures not ready ({}), retrying in {}ms",
                    e, config.poll.retry_delay_ms
                );
            }
        }
        if shutdown.wait(config.poll.retry_delay()) {
            return false;
        }
    }
}

fn track(
    session: &mut ProcessSession,
    schemas: &Schemas,
    config: &Config,
    shutdown: &ShutdownSignal,
) -> Result<()> {
    let mut tracker = Tracker::new(&config.read.ignored_fields);
    let mut status = StatusData::default();
    let mut gameplay = GameplayData::default();

    'resolve: while wait_for_signatures(session, config, shutdown) {
        info!("Tracking pid {}", session.process().pid());

        loop {
            if let Err(e) = session.read(&schemas.status, &mut status) {
                if !is_alive(session.process()) {
                    info!("Process terminated");
                    return Ok(());
                }
                warn!("{}; scanning for signatures again", e);
                // Cached addresses may be what broke the read
                if config.cache.enabled {
                    session.discard_cache(&config.cache.path);
                } else {
                    session.addresses_mut().clear();
                }
                if shutdown.wait(config.poll.retry_delay()) {
                    return Ok(());
                }
                continue 'resolve;
            }

            if let Some(event) = tracker.update_status(status.game_status()) {
                report(event);
                if status.game_status().is_playing() {
                    gameplay = GameplayData::default();
                }
                log_beatmap(session, schemas);
            }

            if status.game_status().is_playing() {
                let usable = match session.read(&schemas.gameplay, &mut gameplay) {
                    Ok(()) => true,
                    Err(e) if tracker.tolerates(&e) => true,
                    Err(e) => {
                        debug!("{}", e);
                        false
                    }
                };
                if usable && let Some(event) = tracker.update_misses(gameplay.hit_miss) {
                    report(event);
                }
            }

            if shutdown.wait(config.poll.interval()) {
                return Ok(());
            }
        }
    }
    Ok(())
}

fn report(event: Event) {
    match event {
        Event::StatusChanged { from, to } => info!("Status: {} -> {}", from, to),
        Event::Miss { count } => info!("Miss! (total {})", count),
    }
}

fn log_beatmap(session: &ProcessSession, schemas: &Schemas) {
    let mut menu = MenuData::default();
    match session.read(&schemas.menu, &mut menu) {
        Ok(()) => info!(
            "Beatmap: {} - {} [{}] by {}",
            menu.artist, menu.title, menu.difficulty, menu.creator
        ),
        Err(e) => debug!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use osumem_core::FieldError;

    fn tracker() -> Tracker {
        Tracker::new(&["leaderboard".to_string(), "key_overlay".to_string()])
    }

    #[test]
    fn test_status_changes() {
        let mut tracker = tracker();
        assert_eq!(
            tracker.update_status(GameStatus::SongSelect),
            Some(Event::StatusChanged {
                from: GameStatus::Unknown,
                to: GameStatus::SongSelect
            })
        );
        assert_eq!(tracker.update_status(GameStatus::SongSelect), None);
        assert!(tracker.update_status(GameStatus::Playing).is_some());
    }

    #[test]
    fn test_misses_only_report_increases() {
        let mut tracker = tracker();
        tracker.update_status(GameStatus::Playing);

        // The first reading is the baseline
        assert_eq!(tracker.update_misses(0), None);
        assert_eq!(tracker.update_misses(0), None);
        assert_eq!(tracker.update_misses(1), Some(Event::Miss { count: 1 }));
        assert_eq!(tracker.update_misses(3), Some(Event::Miss { count: 3 }));
        // Retry resets the counter
        assert_eq!(tracker.update_misses(0), None);
        assert_eq!(tracker.update_misses(1), Some(Event::Miss { count: 1 }));
    }

    #[test]
    fn test_new_play_resets_baseline() {
        let mut tracker = tracker();
        tracker.update_status(GameStatus::Playing);
        tracker.update_misses(4);

        tracker.update_status(GameStatus::ResultsScreen);
        tracker.update_status(GameStatus::Playing);
        assert_eq!(tracker.update_misses(2), None);
    }

    #[test]
    fn test_tolerates_transient_failures() {
        let tracker = tracker();
        let failure = |field| FieldError {
            field,
            source: Error::UnresolvedAddress("Ruleset".to_string()),
        };

        let transient = AggregateError::new("GameplayData", vec![failure("leaderboard")]);
        assert!(tracker.tolerates(&transient));

        let real = AggregateError::new(
            "GameplayData",
            vec![failure("key_overlay"), failure("hit_miss")],
        );
        assert!(!tracker.tolerates(&real));
    }
}
