use crate::builtins;
use crate::config::ShellConfig;
use crate::get_all_executables;
use bytes::BytesMut;
use std::io::{self, BufRead, Write};
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;

const BLUE: &str = "\x1b[0;34m";
const GREEN: &str = "\x1b[0;32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Renders `user@host:cwd$ `.
pub fn prompt(config: &ShellConfig) -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| "user".to_string());
    let host = hostname().unwrap_or_else(|| "localhost".to_string());
    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "?".to_string());

    if config.prompt_color {
        format!("{BOLD}{GREEN}{user}@{host}{RESET}:{BOLD}{BLUE}{cwd}{RESET}$ ")
    } else {
        format!("{user}@{host}:{cwd}$ ")
    }
}

fn hostname() -> Option<String> {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    Some(String::from_utf8_lossy(&buf[..end]).into_owned())
}

pub fn banner() -> String {
    format!(
        "{BOLD}Welcome to myShell{RESET} {}\nType `help` for the list of commands.\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Reads one line of any length, without its newline.
///
/// Returns `None` at end of input. A trailing `\r` is dropped and invalid
/// UTF-8 is replaced rather than rejected.
pub fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = BytesMut::new();
    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        if available.is_empty() {
            return Ok((!line.is_empty()).then(|| decode(line)));
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(newline) => {
                line.extend_from_slice(&available[..newline]);
                reader.consume(newline + 1);
                return Ok(Some(decode(line)));
            }
            None => {
                let taken = available.len();
                line.extend_from_slice(available);
                reader.consume(taken);
            }
        }
    }
}

fn decode(line: BytesMut) -> String {
    let bytes = line.freeze();
    let text = String::from_utf8_lossy(&bytes);
    text.strip_suffix('\r').unwrap_or(&text[..]).to_string()
}

/// Candidates for completing `prefix`: builtins and PATH executables, sorted
/// and without duplicates.
pub fn completions(prefix: &str) -> Vec<String> {
    let mut all_commands: Vec<String> = builtins::NAMES
        .iter()
        .filter(|cmd| cmd.starts_with(prefix))
        .map(|s| s.to_string())
        .collect();

    all_commands.extend(
        get_all_executables()
            .into_iter()
            .filter(|cmd| cmd.starts_with(prefix)),
    );

    all_commands.sort();
    all_commands.dedup();
    all_commands
}

/// Reads a line from the terminal in raw mode.
///
/// Handles backspace, Tab completion, Ctrl-C (drops the line) and Ctrl-D on
/// an empty line (returns `None`).
pub fn read_line_interactive(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    // Enter raw mode to handle input character by character
    let mut stdout = io::stdout().into_raw_mode()?;
    let stdin = io::stdin();
    let mut buffer = String::new();

    for c in stdin.keys() {
        match c? {
            Key::Ctrl('c') => {
                buffer.clear();
                write!(stdout, "\r\n")?;
                return Ok(Some(buffer));
            }
            Key::Ctrl('d') => {
                if buffer.is_empty() {
                    write!(stdout, "\r\n")?;
                    return Ok(None);
                }
            }
            Key::Char('\n') | Key::Char('\r') => {
                write!(stdout, "\r\n")?;
                return Ok(Some(buffer));
            }
            Key::Char('\t') => {
                let candidates = completions(&buffer);
                if let [only] = candidates.as_slice() {
                    let remainder = &only[buffer.len()..];
                    write!(stdout, "{} ", remainder)?;
                    buffer.push_str(remainder);
                    buffer.push(' ');
                } else {
                    // Nothing or more than one: beep
                    write!(stdout, "\x07")?;
                }
                stdout.flush()?;
            }
            Key::Backspace => {
                if buffer.pop().is_some() {
                    // Move cursor back, erase char with space, move back again
                    write!(stdout, "\x08 \x08")?;
                    stdout.flush()?;
                }
            }
            Key::Char(c) => {
                buffer.push(c);
                write!(stdout, "{}", c)?;
                stdout.flush()?;
            }
            _ => {}
        }
    }

    // stdin closed while in raw mode
    Ok((!buffer.is_empty()).then_some(buffer))
}
