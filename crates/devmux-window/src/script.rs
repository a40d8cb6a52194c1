//! Scripting bridge: `osascript` and plain process launches.

use std::process::{Command, Stdio};

use crate::error::WindowError;

const OSASCRIPT: &str = "/usr/bin/osascript";

/// Runs AppleScript / JXA and spawns helper processes. Mockable for tests.
pub trait ScriptBridge: Send + Sync {
    /// Run an AppleScript program and return its trimmed stdout.
    fn run_script(&self, script: &str) -> Result<String, WindowError>;

    /// Run a JavaScript for Automation program and return its trimmed stdout.
    fn run_jxa(&self, script: &str) -> Result<String, WindowError>;

    /// Start `program` detached, with extra environment variables.
    fn spawn(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<(), WindowError>;
}

impl<T: ScriptBridge + ?Sized> ScriptBridge for &T {
    fn run_script(&self, script: &str) -> Result<String, WindowError> {
        (**self).run_script(script)
    }

    fn run_jxa(&self, script: &str) -> Result<String, WindowError> {
        (**self).run_jxa(script)
    }

    fn spawn(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<(), WindowError> {
        (**self).spawn(program, args, env)
    }
}

impl<T: ScriptBridge + ?Sized> ScriptBridge for std::sync::Arc<T> {
    fn run_script(&self, script: &str) -> Result<String, WindowError> {
        (**self).run_script(script)
    }

    fn run_jxa(&self, script: &str) -> Result<String, WindowError> {
        (**self).run_jxa(script)
    }

    fn spawn(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<(), WindowError> {
        (**self).spawn(program, args, env)
    }
}

/// The real bridge, backed by `/usr/bin/osascript`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBridge;

impl SystemBridge {
    fn osascript(&self, lang: Option<&str>, script: &str) -> Result<String, WindowError> {
        let mut cmd = Command::new(OSASCRIPT);
        if let Some(lang) = lang {
            cmd.args(["-l", lang]);
        }
        let output = cmd
            .args(["-e", script])
            .stdin(Stdio::null())
            .output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!("osascript failed: {stderr}");
            Err(WindowError::ScriptFailed(stderr))
        }
    }
}

impl ScriptBridge for SystemBridge {
    fn run_script(&self, script: &str) -> Result<String, WindowError> {
        self.osascript(None, script)
    }

    fn run_jxa(&self, script: &str) -> Result<String, WindowError> {
        self.osascript(Some("JavaScript"), script)
    }

    fn spawn(&self, program: &str, args: &[&str], env: &[(&str, &str)]) -> Result<(), WindowError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        for (k, v) in env {
            cmd.env(k, v);
        }
        let child = cmd.spawn()?;
        tracing::debug!("spawned {program} (pid {})", child.id());
        Ok(())
    }
}

/// Quote `s` as an AppleScript string literal.
pub fn applescript_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Quote `s` for a POSIX shell using single quotes.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Join `words` into one shell command line, quoting only words that need it.
pub fn shell_join<S: AsRef<str>>(words: &[S]) -> String {
    words
        .iter()
        .map(|w| {
            let w = w.as_ref();
            let plain = !w.is_empty()
                && w.chars()
                    .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
            if plain { w.to_string() } else { shell_quote(w) }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse the `true`/`false` an AppleScript `return` produces.
pub fn script_bool(out: &str) -> bool {
    out.trim().eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applescript_escapes_quotes_and_backslashes() {
        assert_eq!(applescript_string(r#"say "hi""#), r#""say \"hi\"""#);
        assert_eq!(applescript_string(r"a\b"), r#""a\\b""#);
        assert_eq!(applescript_string("[devmux:app-1]"), r#""[devmux:app-1]""#);
    }

    #[test]
    fn shell_quote_handles_single_quotes() {
        assert_eq!(shell_quote("/tmp/it's"), r"'/tmp/it'\''s'");
        assert_eq!(shell_quote("plain"), "'plain'");
    }

    #[test]
    fn shell_join_quotes_only_when_needed() {
        assert_eq!(shell_join(&["tmux", "-S", "/tmp/dev.sock"]), "tmux -S /tmp/dev.sock");
        assert_eq!(
            shell_join(&["/Users/x/My Tools/devmux", "--tmux-socket", ""]),
            "'/Users/x/My Tools/devmux' --tmux-socket ''"
        );
    }

    #[test]
    fn script_bool_parses() {
        assert!(script_bool("true\n"));
        assert!(!script_bool("false"));
        assert!(!script_bool(""));
    }
}
