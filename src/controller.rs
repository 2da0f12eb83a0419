use std::time::Duration;
use tracing::trace;

use crate::domain::{Message, TVConfig, TVError};
use crate::model::Model;
use ratatui::crossterm::event::{
    self, Event, KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TVError> {
        if !event::poll(Duration::from_millis(self.event_poll_time))? {
            return Ok(None);
        }
        let message = match event::read()? {
            Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                if model.raw_keyevents() {
                    Some(Message::RawKey(key))
                } else {
                    self.handle_key(key)
                }
            }
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            Event::Resize(width, height) => Some(Message::Resize(width as usize, height as usize)),
            _ => None,
        };
        Ok(message)
    }

    fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Left | KeyCode::Char('h'), _) => Some(Message::MoveLeft),
            (KeyCode::Right | KeyCode::Char('l'), _) => Some(Message::MoveRight),
            (KeyCode::Home | KeyCode::Char('g'), _) => Some(Message::MoveBeginning),
            (KeyCode::End | KeyCode::Char('G'), _) => Some(Message::MoveEnd),
            (KeyCode::Char('s'), _) => Some(Message::SortCurrentColumn),
            (KeyCode::Char(d @ '1'..='9'), _) => {
                d.to_digit(10).map(|n| Message::SortColumn(n as usize - 1))
            }
            (KeyCode::Char('r'), _) => Some(Message::ResetOrder),
            (KeyCode::Char(' '), _) => Some(Message::Select),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('J'), _) => Some(Message::MoveRowDown),
            (KeyCode::Char('K'), _) => Some(Message::MoveRowUp),
            (KeyCode::Char('e') | KeyCode::Enter, _) => Some(Message::Edit),
            (KeyCode::Char('d') | KeyCode::Delete, _) => Some(Message::Delete),
            (KeyCode::Char('a'), _) => Some(Message::Add),
            (KeyCode::Char('y'), _) => Some(Message::CopySelection),
            (KeyCode::Char('c'), _) => Some(Message::ToggleColorize),
            (KeyCode::Char('t'), _) => Some(Message::ToggleHeader),
            (KeyCode::Char('f'), _) => Some(Message::ToggleFooter),
            (KeyCode::Char('L'), _) => Some(Message::CycleLayout),
            (KeyCode::Char('m'), _) => Some(Message::CycleSelectionMode),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn handle_mouse(&self, mouse: MouseEvent) -> Option<Message> {
        match mouse.kind {
            MouseEventKind::Moved => Some(Message::Hover(mouse.column, mouse.row)),
            MouseEventKind::Down(MouseButton::Left) => {
                Some(Message::Click(mouse.column, mouse.row))
            }
            MouseEventKind::ScrollDown => Some(Message::MoveDown),
            MouseEventKind::ScrollUp => Some(Message::MoveUp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyEvent;

    fn controller() -> Controller {
        Controller::new(&TVConfig::default())
    }

    #[test]
    fn keys_map_to_messages() {
        let c = controller();
        let press = |code, modifiers| c.handle_key(KeyEvent::new(code, modifiers));
        assert_eq!(press(KeyCode::Char('q'), KeyModifiers::NONE), Some(Message::Quit));
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::CONTROL), Some(Message::Quit));
        assert_eq!(press(KeyCode::Char('c'), KeyModifiers::NONE), Some(Message::ToggleColorize));
        assert_eq!(press(KeyCode::Char('3'), KeyModifiers::NONE), Some(Message::SortColumn(2)));
        assert_eq!(press(KeyCode::Char('J'), KeyModifiers::SHIFT), Some(Message::MoveRowDown));
        assert_eq!(press(KeyCode::Char('z'), KeyModifiers::NONE), None);
    }

    #[test]
    fn mouse_moves_hover_and_clicks_select() {
        let c = controller();
        let mouse = |kind| MouseEvent {
            kind,
            column: 4,
            row: 7,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(c.handle_mouse(mouse(MouseEventKind::Moved)), Some(Message::Hover(4, 7)));
        assert_eq!(
            c.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left))),
            Some(Message::Click(4, 7))
        );
        assert_eq!(c.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Right))), None);
    }
}
