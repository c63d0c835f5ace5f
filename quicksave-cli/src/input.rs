use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal,
};
use std::io::{self, BufRead};
use tracing::debug;

/// What the user wants after a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Restart,
    Exit,
}

/// Read one line from stdin, without the trailing newline.
///
/// Returns `None` at end of input.
pub fn read_line() -> io::Result<Option<String>> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Map a line of text to a choice, for terminals without raw mode.
pub fn choice_from_line(line: Option<&str>) -> Choice {
    match line {
        None => Choice::Exit,
        Some(text) if matches!(text.to_ascii_lowercase().as_str(), "q" | "quit" | "exit" | "esc") => {
            Choice::Exit
        }
        Some(_) => Choice::Restart,
    }
}

fn read_key() -> io::Result<Choice> {
    loop {
        if let Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) = event::read()?
        {
            match code {
                KeyCode::Enter => return Ok(Choice::Restart),
                KeyCode::Esc => return Ok(Choice::Exit),
                _ => {}
            }
        }
    }
}

/// Block until Enter (restart) or Esc (exit) is pressed.
///
/// Falls back to line input when the terminal cannot enter raw mode, e.g.
/// when stdin is not a TTY.
pub fn wait_for_choice() -> io::Result<Choice> {
    if terminal::enable_raw_mode().is_err() {
        debug!("Raw mode unavailable, reading a line instead");
        let line = read_line()?;
        return Ok(choice_from_line(line.as_deref()));
    }

    let choice = read_key();

    if terminal::disable_raw_mode().is_err() {
        debug!("Failed to disable raw mode.");
    }
    choice
}
