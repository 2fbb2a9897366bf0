use crate::ShellStatus;
use crate::echo::echo_cmd;
use crate::path::{NormalizedPath, normalize_opt};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::PathBuf;
use std::str::FromStr;

/// Enumeration of all supported builtin commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Exit,
    Echo,
    Cd,
    Cp,
    Delete,
    Move,
    Read,
    Wc,
    Pwd,
    Help,
}

impl FromStr for Builtin {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exit" | "logout" => Ok(Builtin::Exit),
            "echo" => Ok(Builtin::Echo),
            "cd" => Ok(Builtin::Cd),
            "cp" => Ok(Builtin::Cp),
            "delete" => Ok(Builtin::Delete),
            "move" => Ok(Builtin::Move),
            "read" => Ok(Builtin::Read),
            "wc" => Ok(Builtin::Wc),
            "pwd" => Ok(Builtin::Pwd),
            "help" => Ok(Builtin::Help),
            _ => Err(()),
        }
    }
}

/// Builtin names with their one-line usage, in `help` order.
pub const HELP: &[(&str, &str)] = &[
    ("cd <directory>", "Change the current directory"),
    ("cp <source> <destination>", "Copy a file"),
    ("delete <file>", "Delete a file"),
    ("move <source> <destination>", "Move or rename a file"),
    ("echo <text> [> | >> <file>]", "Print text, or write/append it to a file"),
    ("read <file>", "Print the contents of a file"),
    ("wc -l | -w <file>", "Count the lines or words in a file"),
    ("pwd", "Print the current directory"),
    ("help", "Show this list"),
    ("exit [code]", "Leave the shell"),
];

/// Names completed on Tab.
pub const NAMES: &[&str] = &[
    "cd", "cp", "delete", "echo", "exit", "help", "logout", "move", "pwd", "read", "wc",
];

impl Builtin {
    /// Executes the builtin command.
    ///
    /// `args` excludes the command name. Returns a `ShellStatus` indicating
    /// whether the shell should continue or exit with a specific code.
    pub fn execute<W: Write, E: Write>(
        &self,
        args: &[&str],
        mut stdout: W,
        mut stderr: E,
    ) -> ShellStatus {
        match self {
            Builtin::Exit => {
                let code = args
                    .first()
                    .and_then(|s| s.parse::<i32>().ok())
                    .unwrap_or(0);
                let _ = writeln!(stdout, "log out");
                let _ = stdout.flush();
                return ShellStatus::Exit(code);
            }
            Builtin::Echo => echo_cmd(args, &mut stdout, &mut stderr),
            Builtin::Cd => cd_cmd(args, &mut stderr),
            Builtin::Cp => {
                if let Some((src, dst)) = two_paths("cp", args, &mut stderr) {
                    if same_file(&src, &dst) {
                        let _ = writeln!(stderr, "cp: {} and {} are the same file", src, dst);
                    } else {
                        match copy_file(&src, &dst) {
                            Ok(bytes) => {
                                let _ = writeln!(stdout, "copied {} to {} ({} bytes)", src, dst, bytes);
                            }
                            Err(e) => {
                                let _ = writeln!(stderr, "cp: {} -> {}: {}", src, dst, e);
                            }
                        }
                    }
                }
            }
            Builtin::Delete => {
                if let Some(file) = one_path("delete", args, &mut stderr) {
                    if let Err(e) = fs::remove_file(&file) {
                        let _ = writeln!(stderr, "delete: {}: {}", file, e);
                    }
                }
            }
            Builtin::Move => {
                if let Some((src, dst)) = two_paths("move", args, &mut stderr) {
                    if let Err(e) = move_file(&src, &dst) {
                        let _ = writeln!(stderr, "move: {} -> {}: {}", src, dst, e);
                    }
                }
            }
            Builtin::Read => {
                if let Some(file) = one_path("read", args, &mut stderr) {
                    let result = File::open(&file).and_then(|mut f| io::copy(&mut f, &mut stdout));
                    if let Err(e) = result {
                        let _ = writeln!(stderr, "read: {}: {}", file, e);
                    }
                }
            }
            Builtin::Wc => wc_cmd(args, &mut stdout, &mut stderr),
            Builtin::Pwd => match std::env::current_dir() {
                Ok(path) => {
                    let _ = writeln!(stdout, "{}", path.display());
                }
                Err(e) => {
                    let _ = writeln!(stderr, "pwd: error retrieving current directory: {}", e);
                }
            },
            Builtin::Help => {
                let _ = writeln!(stdout, "Available commands:");
                for (usage, description) in HELP {
                    let _ = writeln!(stdout, "  {:<30} {}", usage, description);
                }
            }
        }
        ShellStatus::Continue
    }
}

fn cd_cmd<E: Write>(args: &[&str], stderr: &mut E) {
    let Some(target) = path_arg("cd", args.first().copied(), stderr) else {
        return;
    };
    let new_dir = if target.as_str() == "~" {
        match std::env::var("HOME") {
            Ok(home) => PathBuf::from(home),
            Err(_) => {
                let _ = writeln!(stderr, "cd: HOME not set");
                return;
            }
        }
    } else {
        PathBuf::from(target.as_str())
    };

    if let Err(e) = std::env::set_current_dir(&new_dir) {
        let _ = writeln!(stderr, "cd: {}: {}", new_dir.display(), e);
    }
}

fn wc_cmd<W: Write, E: Write>(args: &[&str], stdout: &mut W, stderr: &mut E) {
    let count_lines = match args.first().copied() {
        Some("-l") => true,
        Some("-w") => false,
        _ => {
            let _ = writeln!(stderr, "wc: usage: wc -l|-w <file>");
            return;
        }
    };
    let Some(file) = path_arg("wc", args.get(1).copied(), stderr) else {
        return;
    };

    match fs::read(&file) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes);
            let count = if count_lines {
                text.lines().count()
            } else {
                text.split_whitespace().count()
            };
            let _ = writeln!(stdout, "{} {}", count, file);
        }
        Err(e) => {
            let _ = writeln!(stderr, "wc: {}: {}", file, e);
        }
    }
}

/// Both operands resolve to one existing file; copying would truncate it.
fn same_file(src: &NormalizedPath, dst: &NormalizedPath) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dst)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn copy_file(src: &NormalizedPath, dst: &NormalizedPath) -> io::Result<u64> {
    let mut input = File::open(src)?;
    let mut output = File::create(dst)?;
    io::copy(&mut input, &mut output)
}

/// Renames `src` to `dst`, or into `dst` when it is an existing directory.
fn move_file(src: &NormalizedPath, dst: &NormalizedPath) -> io::Result<()> {
    let src_path = PathBuf::from(src.as_str());
    if !src_path.exists() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "source does not exist"));
    }

    let mut dst_path = PathBuf::from(dst.as_str());
    if dst_path.is_dir() {
        if let Some(name) = src_path.file_name() {
            dst_path.push(name);
        }
    }
    fs::rename(&src_path, &dst_path)
}

/// Normalizes one path operand, printing usage when it is missing or blank.
fn path_arg<E: Write>(cmd: &str, arg: Option<&str>, stderr: &mut E) -> Option<NormalizedPath> {
    match normalize_opt(arg) {
        Ok(Some(path)) if !path.is_empty() => Some(path),
        Ok(_) => {
            let _ = writeln!(stderr, "{}: missing operand", cmd);
            None
        }
        Err(e) => {
            let _ = writeln!(stderr, "{}: {}", cmd, e);
            None
        }
    }
}

fn one_path<E: Write>(cmd: &str, args: &[&str], stderr: &mut E) -> Option<NormalizedPath> {
    path_arg(cmd, args.first().copied(), stderr)
}

fn two_paths<E: Write>(
    cmd: &str,
    args: &[&str],
    stderr: &mut E,
) -> Option<(NormalizedPath, NormalizedPath)> {
    let src = path_arg(cmd, args.first().copied(), stderr)?;
    let dst = path_arg(cmd, args.get(1).copied(), stderr)?;
    Some((src, dst))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(builtin: Builtin, args: &[&str]) -> (ShellStatus, String, String) {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        let status = builtin.execute(args, &mut out, &mut err);
        (
            status,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_parse_builtin_names() {
        assert_eq!("cd".parse::<Builtin>(), Ok(Builtin::Cd));
        assert_eq!("logout".parse::<Builtin>(), Ok(Builtin::Exit));
        assert_eq!("wc".parse::<Builtin>(), Ok(Builtin::Wc));
        assert!("ls".parse::<Builtin>().is_err());
        for name in NAMES {
            assert!(name.parse::<Builtin>().is_ok(), "{} should be a builtin", name);
        }
    }

    #[test]
    fn test_exit_with_code() {
        let (status, out, _) = run(Builtin::Exit, &["3"]);
        assert_eq!(status, ShellStatus::Exit(3));
        assert_eq!(out, "log out\n");
        let (status, _, _) = run(Builtin::Exit, &[]);
        assert_eq!(status, ShellStatus::Exit(0));
    }

    #[test]
    fn test_copy_read_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        fs::write(&src, "line one\nline two\n").unwrap();
        let (src_arg, dst_arg) = (src.to_str().unwrap(), dst.to_str().unwrap());

        let (_, out, err) = run(Builtin::Cp, &[src_arg, dst_arg]);
        assert!(err.is_empty(), "{}", err);
        assert_eq!(out, format!("copied {} to {} (18 bytes)\n", src_arg, dst_arg));

        let (_, out, _) = run(Builtin::Read, &[dst_arg]);
        assert_eq!(out, "line one\nline two\n");

        let (_, _, err) = run(Builtin::Delete, &[dst_arg]);
        assert!(err.is_empty(), "{}", err);
        assert!(!dst.exists());
    }

    #[test]
    fn test_copy_onto_itself_keeps_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.txt");
        fs::write(&file, "precious").unwrap();
        let plain = file.to_str().unwrap().to_string();
        let messy = format!("\"{}//a.txt\"", dir.path().display());

        let (_, out, err) = run(Builtin::Cp, &[plain.as_str(), messy.as_str()]);
        assert!(out.is_empty(), "{}", out);
        assert!(err.contains("are the same file"), "{}", err);
        assert_eq!(fs::read_to_string(&file).unwrap(), "precious");
    }

    #[test]
    fn test_paths_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        fs::write(&file, "x").unwrap();
        let messy = format!("\"{}//notes.txt\"", dir.path().display());

        let (_, out, err) = run(Builtin::Read, &[messy.as_str()]);
        assert_eq!(out, "x");
        assert!(err.is_empty(), "{}", err);
    }

    #[test]
    fn test_move_into_directory_keeps_name() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("report.txt");
        let sub = dir.path().join("archive");
        fs::write(&src, "data").unwrap();
        fs::create_dir(&sub).unwrap();

        let (_, _, err) = run(Builtin::Move, &[src.to_str().unwrap(), sub.to_str().unwrap()]);
        assert!(err.is_empty(), "{}", err);
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(sub.join("report.txt")).unwrap(), "data");
    }

    #[test]
    fn test_move_missing_source_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("ghost.txt");
        let dst = dir.path().join("other.txt");

        let (_, _, err) = run(Builtin::Move, &[src.to_str().unwrap(), dst.to_str().unwrap()]);
        assert!(err.contains("source does not exist"), "{}", err);
        assert!(!dst.exists());
    }

    #[test]
    fn test_word_and_line_count() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("text.txt");
        fs::write(&file, "one two\nthree\n\nfour five six\n").unwrap();
        let arg = file.to_str().unwrap();

        let (_, out, _) = run(Builtin::Wc, &["-w", arg]);
        assert_eq!(out, format!("6 {}\n", arg));
        let (_, out, _) = run(Builtin::Wc, &["-l", arg]);
        assert_eq!(out, format!("4 {}\n", arg));
    }

    #[test]
    fn test_wc_rejects_unknown_option() {
        let (_, out, err) = run(Builtin::Wc, &["-c", "file"]);
        assert!(out.is_empty());
        assert!(err.contains("usage"));
    }

    #[test]
    fn test_missing_operands_print_usage() {
        for builtin in [Builtin::Cd, Builtin::Cp, Builtin::Delete, Builtin::Move, Builtin::Read] {
            let (status, _, err) = run(builtin, &[]);
            assert_eq!(status, ShellStatus::Continue);
            assert!(err.contains("missing operand"), "{:?}: {}", builtin, err);
        }
        let (_, _, err) = run(Builtin::Cd, &["\"  \""]);
        assert!(err.contains("missing operand"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let (_, out, _) = run(Builtin::Help, &[]);
        for (usage, _) in HELP {
            assert!(out.contains(usage));
        }
    }
}
