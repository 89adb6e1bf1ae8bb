use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};

use volley::{InputEvent, InputSource, PaddleButtons, PlayerSlot};

/// Most terminals never report key releases, so a held key is expired
/// after this long without a repeat.
const HOLD_EXPIRY: Duration = Duration::from_millis(150);

/// Turns crossterm key events into discrete down/up paddle controls.
/// Arrow keys drive the primary slot, W/S the secondary.
pub struct CrosstermInput {
    held: HashMap<(PlayerSlot, PaddleButtons), Instant>,
    quit: bool,
}

fn binding(code: KeyCode) -> Option<(PlayerSlot, PaddleButtons)> {
    match code {
        KeyCode::Up => Some((PlayerSlot::Primary, PaddleButtons::UP)),
        KeyCode::Down => Some((PlayerSlot::Primary, PaddleButtons::DOWN)),
        KeyCode::Char('w') | KeyCode::Char('W') => Some((PlayerSlot::Secondary, PaddleButtons::UP)),
        KeyCode::Char('s') | KeyCode::Char('S') => {
            Some((PlayerSlot::Secondary, PaddleButtons::DOWN))
        }
        _ => None,
    }
}

impl CrosstermInput {
    pub fn new() -> Self {
        Self {
            held: HashMap::new(),
            quit: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    fn press(&mut self, code: KeyCode, events: &mut Vec<InputEvent>) {
        let Some((slot, button)) = binding(code) else {
            return;
        };
        if self.held.insert((slot, button), Instant::now()).is_none() {
            events.push(InputEvent {
                slot,
                button,
                pressed: true,
            });
        }
    }

    fn release(&mut self, code: KeyCode, events: &mut Vec<InputEvent>) {
        let Some((slot, button)) = binding(code) else {
            return;
        };
        if self.held.remove(&(slot, button)).is_some() {
            events.push(InputEvent {
                slot,
                button,
                pressed: false,
            });
        }
    }

    fn expire(&mut self, events: &mut Vec<InputEvent>) {
        let now = Instant::now();
        self.held.retain(|&(slot, button), pressed_at| {
            if now.duration_since(*pressed_at) > HOLD_EXPIRY {
                events.push(InputEvent {
                    slot,
                    button,
                    pressed: false,
                });
                false
            } else {
                true
            }
        });
    }
}

impl InputSource for CrosstermInput {
    fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    log::warn!("input poll failed: {e}");
                    break;
                }
            }
            let read = match event::read() {
                Ok(read) => read,
                Err(e) => {
                    log::warn!("input read failed: {e}");
                    break;
                }
            };
            if let Event::Key(key) = read {
                match key.kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => {
                        if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                            self.quit = true;
                        }
                        self.press(key.code, &mut events);
                    }
                    KeyEventKind::Release => self.release(key.code, &mut events),
                }
            }
        }

        self.expire(&mut events);
        events
    }
}
