//! Main chat event loop.
//!
//! Runs the alternate-screen terminal session: draws the UI, polls for
//! keyboard/mouse events, and drains streaming notifications from the
//! worker channel between ticks. The streaming worker never touches the
//! terminal; everything it produces arrives here through the channel.

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io, time::Duration};
use tokio::sync::mpsc;

use crate::core::app::App;
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::ui::renderer::ui;

const SCROLL_STEP: u16 = 1;
const WHEEL_STEP: u16 = 3;

/// Handle one key press. Returns `true` when the application should quit.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    // Ctrl+C quits even while a picker is open or a turn is in flight.
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // An open picker captures navigation keys first.
    if app.picker.is_some() {
        match key.code {
            KeyCode::Esc => app.close_picker(),
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(picker) = &mut app.picker {
                    picker.move_up();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(picker) = &mut app.picker {
                    picker.move_down();
                }
            }
            KeyCode::Enter => app.apply_picker_selection(),
            _ => {}
        }
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('p') => app.open_model_picker(),
            KeyCode::Char('r') => app.open_role_picker(),
            KeyCode::Char('l') => app.purge(),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Enter => app.submit(),
        KeyCode::Tab => app.cycle_role(),
        KeyCode::Char(ch) => {
            if app.turn_state.input_enabled() {
                app.input.insert(ch);
            }
        }
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        KeyCode::Up => scroll_up(app, SCROLL_STEP),
        KeyCode::Down => scroll_down(app, SCROLL_STEP),
        KeyCode::PageUp => scroll_up(app, 10),
        KeyCode::PageDown => scroll_down(app, 10),
        _ => {}
    }
    false
}

fn scroll_up(app: &mut App, step: u16) {
    app.auto_scroll = false;
    app.scroll_offset = app.scroll_offset.saturating_sub(step);
}

fn scroll_down(app: &mut App, step: u16) {
    // The renderer clamps against the wrapped height and re-enables
    // auto-scroll once the view reaches the bottom again.
    app.scroll_offset = app.scroll_offset.saturating_add(step);
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key(app, key) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => scroll_up(app, WHEEL_STEP),
                    MouseEventKind::ScrollDown => scroll_down(app, WHEEL_STEP),
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain all pending worker notifications before the next draw so
        // chunks render as soon as they arrive.
        while let Ok((message, stream_id)) = rx.try_recv() {
            app.on_stream_event(message, stream_id);
        }
    }
}

/// Run the interactive chat session until the user quits.
pub async fn run_chat(host: String, model: String) -> Result<(), Box<dyn Error>> {
    let (service, mut rx) = ChatStreamService::new();
    let mut app = App::new(host, model, service);
    app.load_models().await;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, &mut app, &mut rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::session::TurnState;

    fn test_app() -> App {
        let (service, _rx) = ChatStreamService::new();
        App::new("http://localhost:11434".to_string(), "llama3.2".to_string(), service)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    #[test]
    fn ctrl_c_quits_everywhere() {
        let mut app = test_app();
        assert!(handle_key(&mut app, ctrl('c')));

        app.open_model_picker();
        assert!(handle_key(&mut app, ctrl('c')));
    }

    #[tokio::test]
    async fn typing_and_enter_submit_a_message() {
        let mut app = test_app();
        for ch in "hi".chars() {
            handle_key(&mut app, press(KeyCode::Char(ch)));
        }
        assert_eq!(app.input.text(), "hi");

        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.session.len(), 1);
        assert_eq!(app.turn_state, TurnState::Submitting);
    }

    #[tokio::test]
    async fn typing_is_ignored_while_submitting() {
        let mut app = test_app();
        for ch in "hi".chars() {
            handle_key(&mut app, press(KeyCode::Char(ch)));
        }
        handle_key(&mut app, press(KeyCode::Enter));

        handle_key(&mut app, press(KeyCode::Char('x')));
        assert!(app.input.is_empty());
    }

    #[test]
    fn ctrl_l_purges_memory() {
        let mut app = test_app();
        app.session.push(crate::core::message::Message::user("hi"));
        handle_key(&mut app, ctrl('l'));
        assert!(app.session.is_empty());
    }

    #[test]
    fn tab_cycles_role_and_ctrl_r_opens_picker() {
        let mut app = test_app();
        handle_key(&mut app, press(KeyCode::Tab));
        assert_eq!(app.role, Role::System);

        handle_key(&mut app, ctrl('r'));
        assert!(app.picker.is_some());

        // Down then Enter selects the second entry (system stays selected
        // as the picker opens on the current role).
        handle_key(&mut app, press(KeyCode::Down));
        handle_key(&mut app, press(KeyCode::Enter));
        assert_eq!(app.role, Role::Assistant);
        assert!(app.picker.is_none());
    }

    #[test]
    fn picker_captures_navigation_and_escape() {
        let mut app = test_app();
        app.models = vec!["a".to_string(), "b".to_string()];
        handle_key(&mut app, ctrl('p'));
        assert!(app.picker.is_some());

        handle_key(&mut app, press(KeyCode::Char('x')));
        assert!(app.input.is_empty(), "typing must not reach the input box");

        handle_key(&mut app, press(KeyCode::Esc));
        assert!(app.picker.is_none());
        assert_eq!(app.model, "llama3.2");
    }

    #[test]
    fn scrolling_up_disables_auto_scroll() {
        let mut app = test_app();
        app.scroll_offset = 5;
        scroll_up(&mut app, 2);
        assert!(!app.auto_scroll);
        assert_eq!(app.scroll_offset, 3);
    }
}
