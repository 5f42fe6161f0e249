use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Pid, Signal, System};
use tracing::info;

use super::daemon_path::to_daemon_path;

pub fn daemon_executable() -> Result<PathBuf> {
    Ok(to_daemon_path(env::current_exe()?))
}

/// Processes started from `daemon_path`, excluding the current one.
pub fn running_daemons(system: &System, daemon_path: &Path) -> Result<Vec<Pid>> {
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't determine own pid {e}"))?;
    Ok(system
        .processes()
        .iter()
        .filter(|(pid, _)| **pid != current_id)
        .filter(|(_, process)| {
            process
                .exe()
                .filter(|v| v.exists())
                .filter(|v| daemon_path == *v)
                .is_some()
        })
        .map(|(pid, _)| *pid)
        .collect())
}

/// Terminates every running reminder daemon started from `daemon_path`. Returns how many were
/// stopped.
pub fn kill_previous_daemons(daemon_path: &Path) -> Result<usize> {
    let system = System::new_all();
    let daemons = running_daemons(&system, daemon_path)?;
    for pid in &daemons {
        let Some(process) = system.process(*pid) else {
            continue;
        };
        // This will forcefully terminate the process on Windows. Anything better will require a
        // lot more work.
        if process.kill_with(Signal::Term).is_none() {
            process.kill();
        }
        process.wait();
        info!("Stopped daemon {pid}");
    }
    Ok(daemons.len())
}

pub fn is_daemon_running(daemon_path: &Path) -> Result<bool> {
    Ok(!running_daemons(&System::new_all(), daemon_path)?.is_empty())
}

/// Shuts down previous daemons and starts a new one working on `app_dir`.
pub fn restart_daemon(app_dir: &Path) -> Result<()> {
    let daemon = daemon_executable()?;
    kill_previous_daemons(&daemon)?;

    let mut command = daemon_command(&daemon, app_dir)?;
    let mut child = command
        .spawn()
        .map_err(|e| anyhow!("Failed to start {daemon:?}: {e}"))?;
    // Without --force the daemon forks and its first process exits right away.
    let status = child.wait()?;
    if !status.success() {
        return Err(anyhow!("{daemon:?} exited with {status}"));
    }
    info!("Spawned {daemon:?} for {app_dir:?}");
    Ok(())
}

/// The detached daemon changes its working directory, so relative paths are resolved here.
fn daemon_command(daemon: &Path, app_dir: &Path) -> Result<Command> {
    let mut command = Command::new(daemon);
    command.arg("--dir").arg(std::path::absolute(app_dir)?);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_gets_absolute_dir() -> Result<()> {
        let command = daemon_command(Path::new("worklogger-daemon"), Path::new("state"))?;
        let args = command.get_args().collect::<Vec<_>>();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0], "--dir");
        let dir = Path::new(args[1]);
        assert!(dir.is_absolute());
        assert_eq!(dir, env::current_dir()?.join("state"));
        Ok(())
    }
}
