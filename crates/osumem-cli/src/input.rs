//! Terminal keys that stop `watch`

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::debug;

use crate::shutdown::{ShutdownSignal, StopReason};

/// How often the monitor rechecks the stop flag between key presses
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Read keys on a background thread until a stop key arrives or the signal is
/// triggered elsewhere. Without a terminal the thread exits right away.
pub fn spawn_keyboard_monitor(shutdown: Arc<ShutdownSignal>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !shutdown.is_shutdown() {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    debug!("No keyboard input: {}", e);
                    return;
                }
            }
            if let Ok(Event::Key(key)) = event::read()
                && let Some(reason) = stop_reason(&key)
            {
                debug!("{:?} pressed", key.code);
                shutdown.trigger(reason);
            }
        }
    })
}

/// Map a key press to a stop request. Releases and repeats are ignored, since
/// Windows consoles report both edges of every key.
fn stop_reason(key: &KeyEvent) -> Option<StopReason> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c' | 'C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(StopReason::Interrupted)
        }
        KeyCode::Esc | KeyCode::Char('q' | 'Q') => Some(StopReason::QuitKey),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Option<StopReason> {
        stop_reason(&KeyEvent::new(code, modifiers))
    }

    #[test]
    fn test_stop_keys() {
        assert_eq!(press(KeyCode::Esc, KeyModifiers::NONE), Some(StopReason::QuitKey));
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), Some(StopReason::QuitKey));
        assert_eq!(press(KeyCode::Char('Q'), KeyModifiers::SHIFT), Some(StopReason::QuitKey));
        assert_eq!(
            press(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(StopReason::Interrupted)
        );
    }

    #[test]
    fn test_other_keys_ignored() {
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::NONE), None);
        assert_eq!(press(KeyCode::Enter, KeyModifiers::NONE), None);
        assert_eq!(press(KeyCode::Char('x'), KeyModifiers::NONE), None);
    }

    #[test]
    fn test_key_release_ignored() {
        let release =
            KeyEvent::new_with_kind(KeyCode::Esc, KeyModifiers::NONE, KeyEventKind::Release);
        assert_eq!(stop_reason(&release), None);
    }
}
