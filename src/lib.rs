use std::env;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, error, warn};

pub mod builtins;
pub mod config;
pub mod echo;
pub mod error;
pub mod input;
pub mod parser;
pub mod path;
pub mod pipeline;

pub use builtins::Builtin;
pub use config::ShellConfig;
pub use error::{Result, ShellError, Stage};
pub use parser::{ArgVector, DEFAULT_DELIMITERS, Token, Tokenizer};
pub use path::{NormalizedPath, normalize};
pub use pipeline::{Pipeline, PipelineStatus, run_pipeline, run_pipeline_to, split_pipeline};

/// Result of a command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellStatus {
    /// The shell should continue running.
    Continue,
    /// The shell should exit with the provided code.
    Exit(i32),
}

/// Runs one input line.
///
/// A line containing `|` becomes a two-stage pipeline of external programs.
/// Anything else is tokenized once and run as a builtin, or else as an
/// external program found on `PATH`. Builtins write to `stdout`/`stderr`;
/// external programs inherit the process's own streams.
///
/// Errors are reported on `stderr` and the shell continues, except for a
/// failure to spawn a pipeline when `abort_on_spawn_failure` is set.
pub fn handle_line<W: Write, E: Write>(
    line: &str,
    config: &ShellConfig,
    stdout: &mut W,
    stderr: &mut E,
) -> ShellStatus {
    let line = line.trim();
    if line.is_empty() {
        return ShellStatus::Continue;
    }

    let result = match split_pipeline(line) {
        Some(pipeline) => {
            let _ = stdout.flush();
            run_piped(pipeline, config)
        }
        None => run_single(line, config, stdout, stderr),
    };

    match result {
        Ok(status) => status,
        Err(err) if err.is_spawn_failure() && config.abort_on_spawn_failure => {
            error!(error = %err, "aborting after spawn failure");
            let _ = writeln!(stderr, "myshell: {}", err);
            ShellStatus::Exit(1)
        }
        Err(err) => {
            warn!(error = %err, "command failed");
            let _ = writeln!(stderr, "myshell: {}", err);
            ShellStatus::Continue
        }
    }
}

fn tokenizer(config: &ShellConfig) -> Tokenizer<'static> {
    Tokenizer::new(DEFAULT_DELIMITERS).strict(config.strict_quotes)
}

fn run_piped(pipeline: Pipeline<'_>, config: &ShellConfig) -> Result<ShellStatus> {
    let left = ArgVector::build_with(tokenizer(config), pipeline.left)?;
    let right = ArgVector::build_with(tokenizer(config), pipeline.right)?;

    let status = run_pipeline(&left, &right)?;
    debug!(left = status.left, right = status.right, "pipeline status");
    Ok(ShellStatus::Continue)
}

fn run_single<W: Write, E: Write>(
    line: &str,
    config: &ShellConfig,
    stdout: &mut W,
    stderr: &mut E,
) -> Result<ShellStatus> {
    let argv = ArgVector::build_with(tokenizer(config), line)?;
    let Some(command) = argv.program() else {
        return Ok(ShellStatus::Continue);
    };

    if let Ok(builtin) = command.parse::<Builtin>() {
        let args: Vec<&str> = argv.iter().skip(1).collect();
        return Ok(builtin.execute(&args, stdout, stderr));
    }

    let Some(program) = resolve_program(command) else {
        let _ = writeln!(stderr, "{}: command not found", command);
        return Ok(ShellStatus::Continue);
    };

    let _ = stdout.flush();
    match Command::new(&program).args(argv.arguments()).spawn() {
        Ok(mut child) => {
            let status = child.wait()?;
            debug!(command, ?status, "command finished");
        }
        Err(e) => pipeline::report_exec_failure(command, e),
    }
    Ok(ShellStatus::Continue)
}

/// A name containing `/` is used as a path; anything else is looked up on `PATH`.
fn resolve_program(command: &str) -> Option<PathBuf> {
    if command.contains('/') {
        let path = Path::new(command);
        return is_executable(path).then(|| path.to_path_buf());
    }
    get_executable_path(command)
}

fn is_executable(path: &Path) -> bool {
    path.is_file()
        && path
            .metadata()
            .is_ok_and(|metadata| metadata.permissions().mode() & 0o111 != 0)
}

/// Searches the system `PATH` for an executable with the given name.
///
/// Returns `Some(PathBuf)` if found and executable, otherwise `None`.
pub fn get_executable_path(command: &str) -> Option<PathBuf> {
    let path_var = env::var("PATH").ok()?;

    env::split_paths(&path_var)
        .map(|dir| dir.join(command))
        .find(|full_path| is_executable(full_path))
}

/// Gets all executable names from directories in the system `PATH`.
///
/// Returns a vector of executable names (not full paths).
/// Handles non-existent directories gracefully.
pub fn get_all_executables() -> Vec<String> {
    let mut executables = Vec::new();

    if let Ok(path_var) = env::var("PATH") {
        for path in env::split_paths(&path_var) {
            if let Ok(entries) = std::fs::read_dir(&path) {
                for entry in entries.flatten() {
                    if let Ok(metadata) = entry.metadata()
                        && metadata.is_file()
                        && metadata.permissions().mode() & 0o111 != 0
                        && let Some(name) = entry.file_name().to_str()
                    {
                        executables.push(name.to_string());
                    }
                }
            }
        }
    }

    executables
}
