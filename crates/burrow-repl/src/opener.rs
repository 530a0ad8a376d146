//! Open files with the platform's default application.

use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use burrow_kernel::Opener;

/// Hands files to `xdg-open`, `open` or `start`, depending on the platform.
///
/// The launcher is spawned and reaped in the background.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl SystemOpener {
    fn command(path: &Path) -> Command {
        #[cfg(target_os = "macos")]
        {
            let mut cmd = Command::new("open");
            cmd.arg(path);
            cmd
        }
        #[cfg(windows)]
        {
            let mut cmd = Command::new("cmd");
            // Empty title argument, otherwise a quoted path is taken as the title
            cmd.args(["/C", "start", ""]).arg(path);
            cmd
        }
        #[cfg(not(any(target_os = "macos", windows)))]
        {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(path);
            cmd
        }
    }
}

impl Opener for SystemOpener {
    fn open(&self, path: &Path) -> io::Result<()> {
        spawn_reaped(Self::command(path)).map(|_reaper| ())
    }
}

/// Spawn `cmd` detached from the terminal and wait for it on a background
/// thread so the exited launcher does not linger as a zombie.
fn spawn_reaped(mut cmd: Command) -> io::Result<thread::JoinHandle<()>> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    thread::Builder::new()
        .name("burrow-opener".into())
        .spawn(move || match child.wait() {
            Ok(status) if !status.success() => {
                tracing::debug!(%status, "launcher exited with failure");
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "could not wait for launcher"),
        })
}
