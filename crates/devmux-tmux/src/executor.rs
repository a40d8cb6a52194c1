//! TmuxCommandRunner trait and TmuxExecutor (sync subprocess wrapper).

use std::process::{Command, Stdio};

use crate::error::TmuxError;

/// Trait for executing tmux commands. Enables mock injection for testing.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;

    /// Run a command that takes over the terminal (attach/switch-client).
    /// Mocks can keep the default, which captures output like [`run`](Self::run).
    fn run_interactive(&self, args: &[&str]) -> Result<(), TmuxError> {
        self.run(args).map(|_| ())
    }
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }

    fn run_interactive(&self, args: &[&str]) -> Result<(), TmuxError> {
        (**self).run_interactive(args)
    }
}

/// Real tmux executor using `std::process::Command`.
pub struct TmuxExecutor {
    tmux_bin: String,
    socket_path: Option<String>,
    socket_name: Option<String>,
}

impl TmuxExecutor {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
            socket_path: None,
            socket_name: None,
        }
    }

    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_socket_name(mut self, name: impl Into<String>) -> Self {
        self.socket_name = Some(name.into());
        self
    }

    /// Check that the tmux binary can be spawned at all.
    pub fn ensure_installed(&self) -> Result<(), TmuxError> {
        match Command::new(&self.tmux_bin)
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TmuxError::NotInstalled(self.tmux_bin.clone()))
            }
            Err(e) => Err(TmuxError::Io(e)),
        }
    }

    /// Server selection flags. Socket path takes precedence over socket name.
    fn server_args(&self) -> Option<[&str; 2]> {
        if let Some(ref path) = self.socket_path {
            Some(["-S", path.as_str()])
        } else {
            self.socket_name.as_deref().map(|name| ["-L", name])
        }
    }

    /// Binary plus server flags, for commands run from another shell
    /// (`tmux -S /tmp/dev.sock`). Anything started with this prefix talks to
    /// the same server as this executor.
    pub fn command_prefix(&self) -> Vec<String> {
        let mut argv = vec![self.tmux_bin.clone()];
        if let Some(flags) = self.server_args() {
            argv.extend(flags.iter().map(|s| s.to_string()));
        }
        argv
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.tmux_bin);
        if let Some(flags) = self.server_args() {
            cmd.args(flags);
        }
        cmd.args(args);
        cmd
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        tracing::trace!("tmux {}", args.join(" "));
        let output = self.command(args).output().map_err(TmuxError::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TmuxError::CommandFailed(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_interactive(&self, args: &[&str]) -> Result<(), TmuxError> {
        let status = self.command(args).status().map_err(TmuxError::Io)?;
        if status.success() {
            Ok(())
        } else {
            Err(TmuxError::CommandFailed(format!(
                "tmux {} exited with {}",
                args.first().copied().unwrap_or_default(),
                status.code().unwrap_or(-1)
            )))
        }
    }
}
