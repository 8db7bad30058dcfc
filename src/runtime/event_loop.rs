use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::config;
use crate::ui;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State tracked by the runtime event loop across iterations.
pub struct EventLoopState {
    placeholder_interval: Duration,
    /// When the placeholder was last rotated.
    last_rotation: Instant,
}

impl EventLoopState {
    pub fn new(ui: &config::UiSettings, now: Instant) -> Self {
        Self {
            placeholder_interval: Duration::from_millis(ui.placeholder_interval_ms.max(1)),
            last_rotation: now,
        }
    }

    // The placeholder only rotates while the input is empty.
    fn maybe_rotate(&mut self, app: &mut App, now: Instant) {
        if !app.input.is_empty() {
            self.last_rotation = now;
            return;
        }
        if now.duration_since(self.last_rotation) >= self.placeholder_interval {
            app.rotate_placeholder();
            self.last_rotation = now;
        }
    }
}

/// What a key press asks the loop to do next.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// Main terminal event loop: pumps the update channel, redraws and handles
/// input. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let now = Instant::now();
        let fired = app.pump(now);
        if fired > 0 {
            debug!(fired, "channel callbacks delivered");
        }
        state.maybe_rotate(app, now);

        terminal.draw(|f| ui::draw(f, app, &settings.ui))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, app) == KeyOutcome::Quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one key press to `app`.
pub fn handle_key_event(key: KeyEvent, app: &mut App) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
        KeyCode::Char('x') if ctrl => {
            if !app.cancel_selected() {
                app.notice = Some("Nothing to cancel".to_string());
            }
        }
        KeyCode::Char(_) if ctrl => {}
        KeyCode::Char(c) => app.push_input_char(c),
        KeyCode::Backspace => app.pop_input_char(),
        KeyCode::Enter => {
            // Rejections are surfaced through `app.notice`.
            let _ = app.submit_input();
        }
        KeyCode::Up => app.prev(),
        KeyCode::Down => app.next(),
        KeyCode::Esc => {
            if app.input.is_empty() {
                return KeyOutcome::Quit;
            }
            app.clear_input();
        }
        _ => {}
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::SimulatedChannel;
    use crate::generation::{GenerationStatus, GenerationStore, lock_store};

    fn app() -> App {
        let settings = config::Settings::default();
        App::new(
            GenerationStore::new().into_handle(),
            Box::new(SimulatedChannel::new(&settings.simulation)),
            &settings.ui,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            assert_eq!(handle_key_event(press(KeyCode::Char(c)), app), KeyOutcome::Continue);
        }
    }

    #[test]
    fn typing_and_enter_submits_a_prompt() {
        let mut app = app();
        type_text(&mut app, "lofi beat");
        handle_key_event(press(KeyCode::Enter), &mut app);

        assert!(app.input.is_empty());
        let store = lock_store(app.store());
        assert_eq!(store.len(), 1);
        assert_eq!(store.nth(0).unwrap().prompt(), "lofi beat");
    }

    #[test]
    fn backspace_edits_and_esc_clears_then_quits() {
        let mut app = app();
        type_text(&mut app, "ab");
        handle_key_event(press(KeyCode::Backspace), &mut app);
        assert_eq!(app.input, "a");

        assert_eq!(handle_key_event(press(KeyCode::Esc), &mut app), KeyOutcome::Continue);
        assert!(app.input.is_empty());
        assert_eq!(handle_key_event(press(KeyCode::Esc), &mut app), KeyOutcome::Quit);
    }

    #[test]
    fn ctrl_c_quits_even_with_input() {
        let mut app = app();
        type_text(&mut app, "q");
        assert_eq!(handle_key_event(ctrl('c'), &mut app), KeyOutcome::Quit);
    }

    #[test]
    fn ctrl_x_cancels_the_selected_generation() {
        let mut app = app();
        type_text(&mut app, "drone");
        handle_key_event(press(KeyCode::Enter), &mut app);

        handle_key_event(ctrl('x'), &mut app);
        let store = lock_store(app.store());
        assert_eq!(store.nth(0).unwrap().status(), GenerationStatus::Failed);
    }

    #[test]
    fn ctrl_x_with_nothing_running_sets_notice() {
        let mut app = app();
        handle_key_event(ctrl('x'), &mut app);
        assert_eq!(app.notice.as_deref(), Some("Nothing to cancel"));
    }

    #[test]
    fn placeholder_rotates_only_while_input_is_empty() {
        let mut app = app();
        let start = Instant::now();
        let mut state = EventLoopState::new(&config::UiSettings::default(), start);
        let first = app.placeholder().to_string();

        app.input = "typing".into();
        state.maybe_rotate(&mut app, start + Duration::from_secs(10));
        assert_eq!(app.placeholder(), first);

        app.input.clear();
        state.maybe_rotate(&mut app, start + Duration::from_secs(20));
        assert_ne!(app.placeholder(), first);
    }
}
