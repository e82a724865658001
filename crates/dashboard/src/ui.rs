//! Render and input loop
//!
//! The second actor: snapshots shared state, renders, and accepts mode
//! commands. It never blocks on the network — only on the brief state
//! lock and on terminal events.

use std::io;
use std::sync::Arc;

use anyhow::Error;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use slog::{info, warn, Logger};
use time::{Duration, OffsetDateTime};
use tokio::sync::watch;
use tokio::time::interval;

use crate::mode::{parse_command, Command, ModeController};
use crate::render::GridRenderer;
use crate::screen::{present, TerminalGuard};
use crate::state::FusionState;

pub async fn run_ui(
    logger: Logger,
    state: Arc<FusionState>,
    mut changed: watch::Receiver<u64>,
    renderer: GridRenderer,
    mode_hold: Duration,
) -> Result<(), Error> {
    let _guard = TerminalGuard::enter()?;
    let mut stdout = io::stdout();
    let mut events = EventStream::new();
    let mut ticker = interval(std::time::Duration::from_secs(1));

    let mut controller = ModeController::new(mode_hold);
    let mut input = String::new();
    let mut message = String::new();

    loop {
        let now = OffsetDateTime::now_utc();
        if controller.refresh(now) {
            message = "Reverted to standard.".to_string();
        }
        let snapshot = state.snapshot().await;
        let frame = renderer.render(&snapshot, controller.mode(), controller.remaining(now), now);
        present(&mut stdout, &frame, &input, &message)?;

        tokio::select! {
            maybe_event = events.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) => {
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }
                        match key.code {
                            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                                break;
                            }
                            KeyCode::Char(c) => input.push(c),
                            KeyCode::Backspace => {
                                input.pop();
                            }
                            KeyCode::Enter => {
                                let line = std::mem::take(&mut input);
                                match parse_command(&line) {
                                    Some(Command::Exit) => break,
                                    Some(Command::SetMode(mode)) => {
                                        controller.set(mode, OffsetDateTime::now_utc());
                                        message = format!(
                                            "Showing {} for {}s",
                                            mode.token(),
                                            mode_hold.whole_seconds()
                                        );
                                    }
                                    None => {
                                        if !line.trim().is_empty() {
                                            message = "Unknown command".to_string();
                                        }
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                    // Resize and the like: fall through and redraw
                    Some(Ok(_)) => {}
                    Some(Err(e)) => warn!(logger, "input error: {}", e),
                    None => break,
                }
            }
            _ = changed.changed() => {}
            _ = ticker.tick() => {}
        }
    }

    info!(logger, "ui loop exited");
    Ok(())
}
