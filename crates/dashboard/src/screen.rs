//! Terminal presentation
//!
//! Consumes the renderer's styled cell matrix and emits it as a boxed,
//! colored map with the command help, result message and input prompt
//! below. Raw mode and the alternate screen are held by a guard that
//! restores the terminal on drop, panic included.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::mode::COMMAND_HELP;
use crate::render::{AgeBand, CellStyle, Frame};

pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<TerminalGuard> {
        terminal::enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(TerminalGuard { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn style_color(style: CellStyle) -> Option<Color> {
    match style {
        CellStyle::Plain => None,
        CellStyle::Band(AgeBand::Fresh) => Some(Color::Green),
        CellStyle::Band(AgeBand::Aging) => Some(Color::Yellow),
        CellStyle::Band(AgeBand::Stale) => Some(Color::Red),
        CellStyle::Band(AgeBand::Expired) => Some(Color::DarkGrey),
        CellStyle::Accent => Some(Color::Cyan),
        CellStyle::Marker => Some(Color::White),
    }
}

/// Draw one frame. Raw mode means no implicit carriage returns, so every
/// line is positioned explicitly.
pub fn present(
    out: &mut impl Write,
    frame: &Frame,
    input: &str,
    message: &str,
) -> io::Result<()> {
    let width = frame.width();
    queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;

    let mut line: u16 = 0;
    queue!(
        out,
        MoveTo(0, line),
        Print(format!("┌{}┐", "─".repeat(width)))
    )?;
    line += 1;
    queue!(
        out,
        MoveTo(0, line),
        Print(format!("│{:^width$}│", frame.title()))
    )?;
    line += 1;
    queue!(
        out,
        MoveTo(0, line),
        Print(format!("├{}┤", "─".repeat(width)))
    )?;
    line += 1;

    for row in &frame.cells {
        queue!(out, MoveTo(0, line), Print('│'))?;
        for cell in row {
            match style_color(cell.style) {
                Some(color) => {
                    if cell.style == CellStyle::Marker {
                        queue!(out, SetAttribute(Attribute::Bold))?;
                    }
                    queue!(out, SetForegroundColor(color), Print(cell.ch))?;
                    if cell.style == CellStyle::Marker {
                        queue!(out, SetAttribute(Attribute::Reset))?;
                    } else {
                        queue!(out, ResetColor)?;
                    }
                }
                None => queue!(out, Print(cell.ch))?,
            }
        }
        queue!(out, Print('│'))?;
        line += 1;
    }

    queue!(
        out,
        MoveTo(0, line),
        Print(format!("└{}┘", "─".repeat(width)))
    )?;
    line += 1;
    queue!(out, MoveTo(0, line), Print(format!(" Cmds: {}", COMMAND_HELP)))?;
    line += 1;
    if !message.is_empty() {
        queue!(out, MoveTo(0, line), Print(format!(" Result: {}", message)))?;
    }
    line += 2;
    queue!(out, MoveTo(0, line), Print(format!("cmd> {}", input)))?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::DisplayMode;
    use crate::render::Cell;

    #[test]
    fn frame_written_with_border_and_prompt() {
        let frame = Frame {
            cells: vec![vec![Cell::BLANK; 10]; 2],
            mode: DisplayMode::Temperature,
            revert_in: None,
        };
        let mut buffer: Vec<u8> = Vec::new();
        present(&mut buffer, &frame, "ws", "ok").unwrap();
        let text = String::from_utf8_lossy(&buffer);

        assert!(text.contains("[TEMP] MAP"));
        assert!(text.contains("┌──────────┐"));
        assert!(text.contains("cmd> ws"));
        assert!(text.contains(" Result: ok"));
        assert!(text.contains(" Cmds: WS, WD"));
    }
}
