/// Terminal side of the client: a blocking key reader and the draw call.
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::core::input;
use crate::core::renderer;
use crate::core::session::Session;

/// Reads keys on a dedicated OS thread and forwards them to the session loop.
///
/// The channel closes when the player presses a quit key, which is how the
/// loop learns to stop. Quit keys themselves are never forwarded.
pub fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if input::is_quit(&key) {
                    if key.kind == KeyEventKind::Press {
                        debug!("quit requested");
                        break;
                    }
                    continue;
                }
                if tx.send(key).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = %e, "failed to read terminal events");
                break;
            }
        }
    });
    rx
}

/// Repaints the board for `session`.
pub fn draw(terminal: &mut DefaultTerminal, session: &Session) -> anyhow::Result<()> {
    terminal.draw(|frame| renderer::render(frame, session))?;
    Ok(())
}
