//! Subprocess helpers shared across the workspace.
//!
//! Commands created here never open a console window on Windows. On unix they
//! start in a process group of their own, and [`run_with_deadline`] kills that
//! whole group, the child and anything it spawned, when the deadline passes,
//! when the call is dropped, and once the child has exited.

use std::ffi::OsStr;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
///
/// On unix the child leads a new process group. The child is killed if the
/// handle is dropped before it exits.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    #[cfg(unix)]
    cmd.process_group(0);
    cmd.kill_on_drop(true);
    cmd
}

/// Failure modes of [`run_with_deadline`].
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} did not finish within {timeout:?}")]
    TimedOut {
        program: String,
        timeout: std::time::Duration,
    },
}

#[cfg(feature = "tokio")]
mod group {
    use std::time::Duration;
    use tokio::process::Child;
    use tokio::time::{Instant, sleep};

    /// Poll interval while waiting for a killed group to empty.
    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Upper bound on that wait. Orphaned members are reaped by init, which
    /// may be slow or absent in minimal containers.
    const EXIT_TIMEOUT: Duration = Duration::from_secs(5);

    /// The process group led by a child spawned with `process_group(0)`.
    ///
    /// Dropping the value kills every member still running.
    #[derive(Debug)]
    pub(crate) struct ProcessGroup {
        leader: Option<u32>,
    }

    impl ProcessGroup {
        pub(crate) fn of(child: &Child) -> Self {
            Self { leader: child.id() }
        }

        /// Send SIGKILL to every member. No-op off unix.
        fn kill(&self) {
            #[cfg(unix)]
            if let Some(pgid) = self.leader {
                // SAFETY: killpg takes plain integers and touches no memory.
                unsafe {
                    libc::killpg(pgid as libc::pid_t, libc::SIGKILL);
                }
            }
        }

        /// Whether any member, zombies included, still exists.
        fn has_members(&self) -> bool {
            #[cfg(unix)]
            if let Some(pgid) = self.leader {
                // SAFETY: signal 0 only probes for existence.
                return unsafe { libc::killpg(pgid as libc::pid_t, 0) } == 0;
            }
            false
        }

        /// Kill the group, reap `child` and wait until no member remains.
        ///
        /// Once this returns no member can touch the filesystem again.
        pub(crate) async fn terminate(mut self, child: &mut Child) {
            self.kill();
            // Already-exited children report an error here; nothing to do.
            let _ = child.start_kill();
            let _ = child.wait().await;

            let deadline = Instant::now() + EXIT_TIMEOUT;
            while self.has_members() && Instant::now() < deadline {
                sleep(POLL_INTERVAL).await;
            }
            self.leader = None;
        }
    }

    impl Drop for ProcessGroup {
        fn drop(&mut self) {
            self.kill();
        }
    }
}

#[cfg(feature = "tokio")]
async fn read_pipe<R>(pipe: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

#[cfg(feature = "tokio")]
async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> std::io::Result<Vec<u8>> {
    task.await.map_err(std::io::Error::other)?
}

/// Run `cmd` to completion and collect its output, killing it after `timeout`.
///
/// The child runs in its own process group on unix. When the deadline passes
/// the whole group is killed and this returns only after every member has
/// exited, so nothing the child spawned can keep writing files afterwards.
/// Group members still running when the child exits normally are killed too.
#[cfg(feature = "tokio")]
pub async fn run_with_deadline(
    cmd: &mut tokio::process::Command,
    timeout: Option<std::time::Duration>,
) -> Result<std::process::Output, ProcessError> {
    use std::process::Stdio;

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;
    let group = group::ProcessGroup::of(&child);

    // Drained on their own tasks so a full pipe never stalls the child.
    let stdout = tokio::spawn(read_pipe(child.stdout.take()));
    let stderr = tokio::spawn(read_pipe(child.stderr.take()));

    let waited = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(waited) => waited,
            Err(_) => {
                group.terminate(&mut child).await;
                stdout.abort();
                stderr.abort();
                return Err(ProcessError::TimedOut {
                    program,
                    timeout: limit,
                });
            }
        },
        None => child.wait().await,
    };

    // Background members would otherwise hold the pipes open.
    group.terminate(&mut child).await;

    let wait_err = |source| ProcessError::Wait {
        program: program.clone(),
        source,
    };
    let status = waited.map_err(wait_err)?;
    let stdout = join_pipe(stdout).await.map_err(wait_err)?;
    let stderr = join_pipe(stderr).await.map_err(wait_err)?;

    Ok(std::process::Output {
        status,
        stdout,
        stderr,
    })
}

#[cfg(all(test, unix, feature = "tokio"))]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn shell(script: &str) -> tokio::process::Command {
        let mut cmd = tokio_command("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn test_captures_stdout() {
        let output = run_with_deadline(&mut shell("echo hello"), None)
            .await
            .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[tokio::test]
    async fn test_reports_non_zero_exit() {
        let output = run_with_deadline(&mut shell("echo oops >&2; exit 3"), None)
            .await
            .unwrap();
        assert_eq!(output.status.code(), Some(3));
        assert_eq!(String::from_utf8_lossy(&output.stderr).trim(), "oops");
    }

    #[tokio::test]
    async fn test_deadline_kills_child() {
        let err = run_with_deadline(&mut shell("sleep 30"), Some(Duration::from_millis(100)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(err.to_string().contains("100ms"));
    }

    #[tokio::test]
    async fn test_deadline_kills_background_children() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("late");

        let mut cmd = shell(r#"(sleep 1; touch "$MARKER") & sleep 30"#);
        cmd.env("MARKER", &marker);

        let err = run_with_deadline(&mut cmd, Some(Duration::from_millis(200)))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::TimedOut { .. }));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_dropped_run_kills_group() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("late");

        let mut cmd = shell(r#"(sleep 1; touch "$MARKER") & sleep 30"#);
        cmd.env("MARKER", &marker);

        let abandoned =
            tokio::time::timeout(Duration::from_millis(200), run_with_deadline(&mut cmd, None))
                .await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_exit_does_not_wait_for_background_children() {
        let mut cmd = shell("sleep 30 & echo done");

        let output = tokio::time::timeout(
            Duration::from_secs(10),
            run_with_deadline(&mut cmd, None),
        )
        .await
        .expect("lingering group member held the pipes open")
        .unwrap();
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "done");
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let mut cmd = tokio_command("/nonexistent/songvault-no-such-binary");
        let err = run_with_deadline(&mut cmd, None).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }
}
