use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

use crate::models::{StatEntry, Target};

/// Capability to establish a session with a target using its credentials.
#[async_trait]
pub trait Connect: Send + Sync {
    type Session: FileProbe;

    async fn connect(&self, target: &Target) -> Result<Self::Session>;
}

/// Per-target capability to stat a path and classify it.
#[async_trait]
pub trait FileProbe: Send + Sync {
    /// Stat `path`. One call may return several entries: the remote side
    /// resolves globs and lists directory children in a single request.
    /// Returned entries have `is_dir` unset; classification is a separate
    /// probe so a walker can decide recursion per entry.
    async fn stat(&self, path: &str) -> Result<Vec<StatEntry>>;

    /// Whether `path` names a directory on the target.
    async fn is_dir(&self, path: &str) -> Result<bool>;
}

/// Connects to targets by shelling out to the system `ssh` client.
///
/// Password credentials ride along in [`Target`] for transports that take
/// them directly; the ssh client itself authenticates through the ambient
/// agent or ssh config.
pub struct SshConnector {
    connect_timeout: u64,
}

impl SshConnector {
    pub fn new(connect_timeout: u64) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connect for SshConnector {
    type Session = SshSession;

    async fn connect(&self, target: &Target) -> Result<SshSession> {
        let session = SshSession {
            user: target.username.clone(),
            host: target.address.clone(),
            port: target.port.unwrap_or(22),
            connect_timeout: self.connect_timeout,
        };

        tracing::info!(
            "Connecting: ssh {}@{} -p {}",
            session.user,
            session.host,
            session.port
        );

        // Cheapest possible remote command, just to prove the session works
        session
            .run("true")
            .await
            .with_context(|| format!("failed to reach {}", target.address))?;

        Ok(session)
    }
}

/// A verified ssh session to one host. Every probe call is a short remote
/// command; no long-lived channel is held.
pub struct SshSession {
    user: String,
    host: String,
    port: u16,
    connect_timeout: u64,
}

impl SshSession {
    fn command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg(format!("{}@{}", self.user, self.host))
            .arg("-p")
            .arg(self.port.to_string())
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout))
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("StrictHostKeyChecking=no")
            .arg("-o")
            .arg("LogLevel=ERROR");
        cmd
    }

    async fn run(&self, remote_cmd: &str) -> Result<String> {
        let output = self
            .command()
            .arg(remote_cmd)
            .output()
            .await
            .context("Failed to execute remote command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!(
                "remote command failed: {}",
                stderr.trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl FileProbe for SshSession {
    async fn stat(&self, path: &str) -> Result<Vec<StatEntry>> {
        let stdout = self.run(&stat_script(path)).await?;
        parse_stat_output(&stdout)
    }

    async fn is_dir(&self, path: &str) -> Result<bool> {
        let output = self
            .command()
            .arg(format!("test -d {}", shell_quote(path)))
            .output()
            .await
            .context("Failed to execute remote test command")?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(anyhow::anyhow!(
                "remote test failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )),
        }
    }
}

/// The remote stat command for one path. A directory lists its children
/// (hidden entries included), matching the one-call, many-entries contract;
/// an empty directory prints nothing, which is a valid zero-entry result.
/// `%f` is the raw st_mode in hex; the umask is sampled once per call since
/// the remote end reports it per file.
fn stat_script(path: &str) -> String {
    let q = shell_quote(path);
    format!(
        "u=$(umask); if [ -d {q} ]; then \
         find {q} -mindepth 1 -maxdepth 1 -exec stat -c \"%n|%s|%Y|%f|$u\" {{}} +; \
         else stat -c \"%n|%s|%Y|%f|$u\" {q}; fi"
    )
}

/// Single-quotes `path` for the remote shell so quote characters stay
/// literal data rather than syntax.
fn shell_quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

/// Parses the full stdout of one remote stat call. Empty output means an
/// empty directory: zero entries, not an error.
fn parse_stat_output(stdout: &str) -> Result<Vec<StatEntry>> {
    let mut entries = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        entries.push(parse_stat_line(line)?);
    }
    Ok(entries)
}

/// Parses one `path|size|mtime_secs|mode_hex|umask_octal` line of remote
/// stat output.
fn parse_stat_line(line: &str) -> Result<StatEntry> {
    let parts: Vec<&str> = line.split('|').collect();
    if parts.len() != 5 {
        return Err(anyhow::anyhow!("malformed stat line: {:?}", line));
    }

    let size = parts[1]
        .parse::<u64>()
        .with_context(|| format!("bad size in stat line: {:?}", line))?;
    let mtime_secs = parts[2]
        .parse::<i64>()
        .with_context(|| format!("bad mtime in stat line: {:?}", line))?;
    let mode = u32::from_str_radix(parts[3], 16)
        .with_context(|| format!("bad mode in stat line: {:?}", line))?;
    let umask = u32::from_str_radix(parts[4], 8)
        .with_context(|| format!("bad umask in stat line: {:?}", line))?;

    Ok(StatEntry {
        path: parts[0].to_string(),
        size,
        last_modified: mtime_secs * 1_000_000_000,
        permissions: mode & 0o7777,
        umask,
        // classification is the walker's job, via the is_dir probe
        is_dir: false,
    })
}
