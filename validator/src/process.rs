use std::process::Stdio;

use log::*;
use tokio::process::{Child, Command};

use crate::errors::{ValidatorError, ValidatorResult};

/// Child process running the validator binary
#[derive(Debug)]
pub struct ValidatorProcess {
    child: Child,
    pid: Option<u32>,
}

impl ValidatorProcess {
    /// Spawns the binary and returns once the OS confirmed the spawn.
    /// A detached process is put into its own process group and keeps
    /// running when the supervisor exits.
    pub fn spawn(
        binary: &str,
        args: &[String],
        detached: bool,
    ) -> ValidatorResult<Self> {
        debug!("Spawning {} {}", binary, args.join(" "));
        let mut command = Command::new(binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(!detached);
        if detached {
            detach(&mut command);
        }

        let child =
            command.spawn().map_err(|err| ValidatorError::FailedToSpawn {
                binary: binary.to_string(),
                err,
            })?;
        let pid = child.id();
        info!("Spawned {} with pid {:?}", binary, pid);
        Ok(Self { child, pid })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Kills the process and waits for it to exit.
    /// Killing a process that already exited is a no-op.
    pub async fn kill(&mut self) -> ValidatorResult<()> {
        if let Some(status) = self.child.try_wait()? {
            debug!("Validator already exited with {}", status);
            return Ok(());
        }
        self.child.start_kill()?;
        let status = self.child.wait().await?;
        debug!("Validator exited with {}", status);
        Ok(())
    }
}

#[cfg(unix)]
fn detach(command: &mut Command) {
    command.process_group(0);
}

#[cfg(not(unix))]
fn detach(_command: &mut Command) {}

/// Kills all processes whose command line matches `binary`
pub async fn kill_running_validators(binary: &str) -> ValidatorResult<()> {
    let status = Command::new("pkill")
        .arg("-f")
        .arg(binary)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if status.success() {
        info!("Killed currently running {}", binary);
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
    Ok(())
}

/// Sends `SIGTERM` to every other process listening on the tcp `port`.
/// Used to replace a relay that is still running from a previous session.
pub async fn kill_processes_on_port(port: u16) -> ValidatorResult<()> {
    let output = Command::new("lsof")
        .arg("-t")
        .arg(format!("-iTCP:{}", port))
        .arg("-sTCP:LISTEN")
        .stderr(Stdio::null())
        .output()
        .await?;
    let own_pid = std::process::id();
    let pids = parse_pids(&String::from_utf8_lossy(&output.stdout))
        .into_iter()
        .filter(|pid| *pid != own_pid)
        .collect::<Vec<_>>();
    if pids.is_empty() {
        return Ok(());
    }
    for pid in &pids {
        info!("Killing app ({}) currently running at port {}", pid, port);
        let status = Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .status()
            .await?;
        if !status.success() {
            warn!("Failed to send 'SIGTERM' to {}", pid);
        }
    }
    tokio::time::sleep(std::time::Duration::from_secs(2)).await;
    Ok(())
}

fn parse_pids(lsof_output: &str) -> Vec<u32> {
    lsof_output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}
