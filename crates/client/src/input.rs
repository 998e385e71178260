use std::io;
use std::thread::{self, JoinHandle};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal;
use tokio::sync::mpsc::UnboundedSender;

use shootr::{CommandKind, ControlEvent};

const DIRECTIONS: [CommandKind; 2] = [CommandKind::MoveUp, CommandKind::MoveDown];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Control(ControlEvent),
    Quit,
}

#[derive(Debug)]
pub struct KeyMapper {
    release_events: bool,
    held: Vec<CommandKind>,
}

impl KeyMapper {
    pub fn new(release_events: bool) -> Self {
        Self {
            release_events,
            held: Vec::with_capacity(DIRECTIONS.len()),
        }
    }

    pub fn map(&mut self, key: KeyEvent) -> Vec<KeyAction> {
        if key.kind == KeyEventKind::Press && is_quit(&key) {
            return vec![KeyAction::Quit];
        }

        if key.code == KeyCode::Char(' ') && key.kind == KeyEventKind::Press {
            return DIRECTIONS
                .iter()
                .filter_map(|&kind| self.release(kind))
                .collect();
        }

        let Some(kind) = direction(key.code) else {
            return Vec::new();
        };

        match key.kind {
            KeyEventKind::Press => self.press(kind),
            KeyEventKind::Release => self.release(kind).into_iter().collect(),
            KeyEventKind::Repeat => Vec::new(),
        }
    }

    fn press(&mut self, kind: CommandKind) -> Vec<KeyAction> {
        let mut actions = Vec::new();

        if !self.release_events {
            for other in DIRECTIONS.into_iter().filter(|&other| other != kind) {
                actions.extend(self.release(other));
            }
        }

        if !self.held.contains(&kind) {
            self.held.push(kind);
            actions.push(KeyAction::Control(ControlEvent { kind, active: true }));
        }

        actions
    }

    fn release(&mut self, kind: CommandKind) -> Option<KeyAction> {
        let index = self.held.iter().position(|&held| held == kind)?;
        self.held.remove(index);
        Some(KeyAction::Control(ControlEvent {
            kind,
            active: false,
        }))
    }
}

fn direction(code: KeyCode) -> Option<CommandKind> {
    match code {
        KeyCode::Up | KeyCode::Char('w' | 'W') => Some(CommandKind::MoveUp),
        KeyCode::Down | KeyCode::Char('s' | 'S') => Some(CommandKind::MoveDown),
        _ => None,
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

struct RawTerminal {
    release_events: bool,
}

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;

        let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if release_events {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        } else {
            log::info!("Terminal does not report key releases; press space to stop");
        }

        Ok(Self { release_events })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.release_events {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
    }
}

pub fn spawn_keyboard(controls: UnboundedSender<ControlEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("keyboard".into())
        .spawn(move || {
            if let Err(e) = read_keys(&controls) {
                log::error!("Keyboard input failed: {}", e);
            }
        })
}

fn read_keys(controls: &UnboundedSender<ControlEvent>) -> io::Result<()> {
    let raw = RawTerminal::enter()?;
    let mut mapper = KeyMapper::new(raw.release_events);

    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };

        for action in mapper.map(key) {
            match action {
                KeyAction::Control(event) => {
                    if controls.send(event).is_err() {
                        return Ok(());
                    }
                }
                KeyAction::Quit => {
                    log::info!("Quitting");
                    return Ok(());
                }
            }
        }
    }
}
