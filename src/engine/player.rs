//! Blocking playback loop.

use std::ops::ControlFlow;
use std::time::Duration;

use super::{PlaybackEngine, TickOutcome};

/// Why [`Player::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerExit {
    /// The last word was shown.
    Completed,
    /// The callback asked to stop, or the engine was paused.
    Stopped,
    /// Nothing to play.
    Empty,
}

/// Drives a [`PlaybackEngine`] on the current thread, sleeping for each
/// tick's delay.
pub struct Player<S = fn(Duration)> {
    sleep: S,
}

impl Player {
    pub fn new() -> Self {
        Self {
            sleep: std::thread::sleep,
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: FnMut(Duration)> Player<S> {
    /// Use `sleep` instead of [`std::thread::sleep`] between ticks.
    pub fn with_sleep(sleep: S) -> Self {
        Self { sleep }
    }

    /// Play from the current position. `on_word` sees the engine every time
    /// a word is shown and can stop playback by returning `Break`; the
    /// engine is paused (and checkpointed) in that case.
    pub fn run<F>(&mut self, engine: &mut PlaybackEngine, mut on_word: F) -> PlayerExit
    where
        F: FnMut(&PlaybackEngine) -> ControlFlow<()>,
    {
        let Some(mut tick) = engine.play() else {
            return PlayerExit::Empty;
        };
        if on_word(engine).is_break() {
            engine.pause();
            return PlayerExit::Stopped;
        }

        loop {
            (self.sleep)(tick.delay());
            match engine.fire_tick(tick) {
                TickOutcome::Advanced(next) => {
                    tick = next;
                    if on_word(engine).is_break() {
                        engine.pause();
                        return PlayerExit::Stopped;
                    }
                }
                TickOutcome::Completed => return PlayerExit::Completed,
                TickOutcome::Stale => return PlayerExit::Stopped,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runs_to_completion() {
        let mut engine = PlaybackEngine::default();
        engine.load_text("one two, three.", 0, "Menlo", 1.0);

        let mut slept = Duration::ZERO;
        let mut shown = Vec::new();
        let exit = Player::with_sleep(|d| slept += d).run(&mut engine, |e| {
            shown.push(e.current_word().unwrap_or_default().to_string());
            ControlFlow::Continue(())
        });

        assert_eq!(exit, PlayerExit::Completed);
        assert_eq!(shown, vec!["one", "two,", "three."]);
        // 200 + 300 + 330 ms at 300 wpm.
        assert_eq!(slept, Duration::from_millis(830));
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_break_pauses_engine() {
        let mut engine = PlaybackEngine::default();
        engine.load_text("a b c d e f", 0, "Menlo", 1.0);
        let exit = Player::with_sleep(|_| {}).run(&mut engine, |e| {
            if e.current_index() == 3 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(exit, PlayerExit::Stopped);
        assert_eq!(engine.current_index(), 3);
        assert!(!engine.is_playing());
    }

    #[test]
    fn test_empty_engine() {
        let mut engine = PlaybackEngine::default();
        assert_eq!(Player::with_sleep(|_| {}).run(&mut engine, |_| ControlFlow::Continue(())), PlayerExit::Empty);
    }
}
