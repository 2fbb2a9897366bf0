use crate::error::{Result, ShellError, Stage};
use crate::parser::ArgVector;
use std::io::{self, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use tracing::{debug, warn};

/// Status recorded for a stage whose program could not be found.
pub const NOT_FOUND_STATUS: i32 = 127;
/// Status recorded for a stage whose program exists but could not be executed.
pub const NOT_EXECUTABLE_STATUS: i32 = 126;

/// The two command texts on either side of the first `|`, each trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline<'a> {
    pub left: &'a str,
    pub right: &'a str,
}

/// Splits `line` at its first `|`.
///
/// Returns `None` when there is no `|`. Only whitespace is trimmed from the
/// halves; any further `|` stays in `right` untouched.
///
/// # Example
/// ```
/// use myshell::pipeline::split_pipeline;
///
/// let pipeline = split_pipeline("ls -l |  wc -l ").unwrap();
/// assert_eq!(pipeline.left, "ls -l");
/// assert_eq!(pipeline.right, "wc -l");
/// assert!(split_pipeline("ls -l").is_none());
/// ```
pub fn split_pipeline(line: &str) -> Option<Pipeline<'_>> {
    let (left, right) = line.split_once('|')?;
    let pipeline = Pipeline {
        left: left.trim(),
        right: right.trim(),
    };
    debug!(left = pipeline.left, right = pipeline.right, "split pipeline");
    Some(pipeline)
}

/// Exit codes of both stages once they have been reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStatus {
    pub left: i32,
    pub right: i32,
}

enum StageProcess {
    Running(Child),
    /// The program never started; holds the status recorded for it.
    Failed(i32),
}

/// Runs `left | right` with the second stage writing to the interpreter's stdout.
pub fn run_pipeline(left: &ArgVector<'_>, right: &ArgVector<'_>) -> Result<PipelineStatus> {
    run_pipeline_to(left, right, Stdio::inherit())
}

/// Runs `left | right`, sending the second stage's stdout to `sink`.
///
/// Each pipe end is handed to exactly one child and the parent's copy is
/// closed as soon as that child has been spawned, so the second stage sees
/// end of input once the first exits. Blocks until both stages have exited.
///
/// A stage whose program cannot be started is reported on stderr and counted
/// as exited; the other stage still runs and is still reaped. Failing to
/// create the pipe or a process is returned as an error.
pub fn run_pipeline_to(
    left: &ArgVector<'_>,
    right: &ArgVector<'_>,
    sink: Stdio,
) -> Result<PipelineStatus> {
    if left.is_empty() {
        return Err(ShellError::EmptyCommand { stage: Stage::Left });
    }
    if right.is_empty() {
        return Err(ShellError::EmptyCommand {
            stage: Stage::Right,
        });
    }

    let (read_end, write_end) = create_pipe().map_err(ShellError::Pipe)?;

    let first = spawn_stage(
        Stage::Left,
        left,
        Stdio::inherit(),
        Stdio::from(write_end),
    )?;

    let second = match spawn_stage(Stage::Right, right, Stdio::from(read_end), sink) {
        Ok(second) => second,
        Err(err) => {
            if let StageProcess::Running(mut child) = first {
                let _ = child.kill();
                let _ = child.wait();
            }
            return Err(err);
        }
    };

    let left_status = reap(Stage::Left, first);
    let right_status = reap(Stage::Right, second);
    let status = PipelineStatus {
        left: left_status?,
        right: right_status?,
    };
    debug!(left = status.left, right = status.right, "pipeline finished");
    Ok(status)
}

/// Creates a pipe whose ends are closed on exec.
///
/// The child's stdio setup duplicates its end onto fd 0 or 1, which clears
/// the flag there; every other copy disappears when the program image is
/// replaced.
#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn create_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: `fds` has room for the two descriptors pipe2(2) writes.
    if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe2(2) succeeded, so both descriptors are open and owned by nobody else.
    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn create_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];
    // SAFETY: `fds` has room for the two descriptors pipe(2) writes.
    if unsafe { libc::pipe(fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: pipe(2) succeeded, so both descriptors are open and owned by nobody else.
    let ends = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };

    for fd in fds {
        // SAFETY: `fd` is open and owned by one of the OwnedFds in `ends`.
        if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(ends)
}

fn spawn_stage(
    stage: Stage,
    argv: &ArgVector<'_>,
    stdin: Stdio,
    stdout: Stdio,
) -> Result<StageProcess> {
    let program = argv
        .program()
        .ok_or(ShellError::EmptyCommand { stage })?;

    // The Command owns this stage's pipe end; dropping it on return closes
    // the parent's copy.
    let mut command = Command::new(program);
    command.args(argv.arguments()).stdin(stdin).stdout(stdout);

    match command.spawn() {
        Ok(child) => {
            debug!(%stage, program, pid = child.id(), "spawned stage");
            Ok(StageProcess::Running(child))
        }
        Err(source) => match exec_failure_status(&source) {
            Some(status) => {
                warn!(%stage, program, error = %source, "stage failed to start");
                report_exec_failure(program, source);
                Ok(StageProcess::Failed(status))
            }
            None => Err(ShellError::Spawn { stage, source }),
        },
    }
}

/// Status for errors that mean "this program cannot run", as opposed to
/// "no process could be created".
fn exec_failure_status(err: &io::Error) -> Option<i32> {
    match err.kind() {
        io::ErrorKind::NotFound => Some(NOT_FOUND_STATUS),
        io::ErrorKind::PermissionDenied => Some(NOT_EXECUTABLE_STATUS),
        _ if err.raw_os_error() == Some(libc::ENOEXEC) => Some(NOT_EXECUTABLE_STATUS),
        _ => None,
    }
}

pub(crate) fn report_exec_failure(program: &str, source: io::Error) {
    let mut stderr = io::stderr();
    if source.kind() == io::ErrorKind::NotFound {
        let _ = writeln!(stderr, "{}: command not found", program);
    } else {
        let err = ShellError::Exec {
            program: program.to_string(),
            source,
        };
        let _ = writeln!(stderr, "{}", err);
    }
}

fn reap(stage: Stage, process: StageProcess) -> Result<i32> {
    match process {
        StageProcess::Failed(status) => Ok(status),
        StageProcess::Running(mut child) => {
            let status = child.wait()?;
            debug!(%stage, ?status, "reaped stage");
            Ok(exit_code(status))
        }
    }
}

/// Exit code, or 128 + signal number for a stage killed by a signal.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DEFAULT_DELIMITERS;
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;

    fn argv(line: &str) -> ArgVector<'_> {
        ArgVector::build(line, DEFAULT_DELIMITERS).unwrap()
    }

    fn run_captured(left: &str, right: &str) -> (PipelineStatus, String) {
        let dir = tempfile::tempdir().unwrap();
        let out_path = dir.path().join("out.txt");
        let sink = File::create(&out_path).unwrap();

        let status = run_pipeline_to(&argv(left), &argv(right), Stdio::from(sink)).unwrap();
        let output = fs::read_to_string(&out_path).unwrap();
        (status, output)
    }

    #[test]
    fn test_split_without_pipe_is_none() {
        assert!(split_pipeline("ls -l /tmp").is_none());
        assert!(split_pipeline("").is_none());
    }

    #[test]
    fn test_split_trims_both_halves() {
        let pipeline = split_pipeline("  cat notes.txt   |   wc -l  ").unwrap();
        assert_eq!(pipeline.left, "cat notes.txt");
        assert_eq!(pipeline.right, "wc -l");
    }

    #[test]
    fn test_split_keeps_quotes() {
        let pipeline = split_pipeline("echo \"a b\" | grep \"a\"").unwrap();
        assert_eq!(pipeline.left, "echo \"a b\"");
        assert_eq!(pipeline.right, "grep \"a\"");
    }

    #[test]
    fn test_split_only_at_first_pipe() {
        let pipeline = split_pipeline("a | b | c").unwrap();
        assert_eq!(pipeline.left, "a");
        assert_eq!(pipeline.right, "b | c");
    }

    #[test]
    fn test_split_halves_reconstruct_line() {
        for line in ["ls|wc", " x  | y ", "|", "a|b|c", "  | tail"] {
            let pipeline = split_pipeline(line).unwrap();
            let cut = line.find('|').unwrap();
            let (raw_left, raw_right) = (&line[..cut], &line[cut + 1..]);
            assert_eq!(raw_left.trim(), pipeline.left);
            assert_eq!(raw_right.trim(), pipeline.right);
            assert_eq!(format!("{}|{}", raw_left, raw_right), line);
            assert_eq!(pipeline.left, pipeline.left.trim());
            assert_eq!(pipeline.right, pipeline.right.trim());
        }
    }

    #[test]
    fn test_echo_into_word_count() {
        let (status, output) = run_captured("echo hello", "wc -w");
        assert_eq!(output.trim(), "1");
        assert_eq!(status, PipelineStatus { left: 0, right: 0 });
    }

    #[test]
    fn test_large_output_flows_through_pipe() {
        let (status, output) = run_captured("seq 1 100000", "wc -l");
        assert_eq!(output.trim(), "100000");
        assert_eq!(status.right, 0);
    }

    #[test]
    fn test_missing_left_program_still_runs_right() {
        let (status, output) = run_captured("no-such-program-for-myshell-tests", "wc -c");
        assert_eq!(status.left, NOT_FOUND_STATUS);
        assert_eq!(status.right, 0);
        assert_eq!(output.trim(), "0");
    }

    #[test]
    fn test_missing_right_program_reaps_left() {
        let (status, output) = run_captured("echo hi", "no-such-program-for-myshell-tests");
        assert_eq!(status.right, NOT_FOUND_STATUS);
        assert!(output.is_empty());
    }

    #[test]
    fn test_non_executable_stage_reports_126() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("script.sh");
        fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o644)).unwrap();
        let left = script.to_str().unwrap().to_string();

        let (status, output) = run_captured(&left, "wc -c");
        assert_eq!(status.left, NOT_EXECUTABLE_STATUS);
        assert_eq!(status.right, 0);
        assert_eq!(output.trim(), "0");
    }

    #[test]
    fn test_stage_exit_codes_are_reported() {
        let (status, _) = run_captured("false", "true");
        assert_eq!(status, PipelineStatus { left: 1, right: 0 });
    }

    #[test]
    fn test_empty_stage_is_rejected() {
        let err = run_pipeline(&argv("ls"), &argv("   ")).unwrap_err();
        assert!(matches!(err, ShellError::EmptyCommand { stage: Stage::Right }));
        let err = run_pipeline(&argv(""), &argv("wc")).unwrap_err();
        assert!(matches!(err, ShellError::EmptyCommand { stage: Stage::Left }));
    }
}
