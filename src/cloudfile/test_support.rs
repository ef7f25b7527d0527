#![allow(dead_code)]

use crate::cloudfile::mount::{CommandOutput, FilesystemUsage, Mounter};
use crate::cloudfile::util::error::{new_error, DynError};

use std::collections::VecDeque;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex, OnceLock,
};

/// Restores an environment variable to its previous state on drop.
pub struct EnvGuard {
    key: String,
    previous: Option<String>,
}

impl EnvGuard {
    pub fn set(key: &str, value: &str) -> Self {
        let previous = env::var(key).ok();
        env::set_var(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }

    pub fn unset(key: &str) -> Self {
        let previous = env::var(key).ok();
        env::remove_var(key);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => env::set_var(&self.key, value),
            None => env::remove_var(&self.key),
        }
    }
}

fn target_dir() -> PathBuf {
    if let Ok(dir) = env::var("CARGO_TARGET_DIR") {
        PathBuf::from(dir)
    } else if let Ok(dir) = env::var("CLOUDFILE_TEST_TARGET_DIR") {
        PathBuf::from(dir)
    } else {
        env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join("target")
    }
}

/// Returns a unique directory under `target/test-output/<component>/`.
/// The directory is created eagerly and returned to the caller.
pub fn test_output_dir(component: &str) -> PathBuf {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(0));
    let mut path = target_dir();
    path.push("test-output");
    path.push(component);
    path.push(format!(
        "pid{}-{}",
        std::process::id(),
        counter.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&path).expect("create test output directory");
    path
}

/// One expected external command invocation and its scripted result.
#[derive(Debug, Clone)]
pub struct ExecScript {
    pub command: String,
    pub args: Vec<String>,
    pub output: CommandOutput,
}

impl ExecScript {
    pub fn new(command: &str, args: &[&str], output: CommandOutput) -> Self {
        Self {
            command: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            output,
        }
    }
}

/// Test double for [`Mounter`].
///
/// Mount-state probes and mount calls are driven by marker substrings in the
/// involved paths, in the same spirit as the scripted failures the real
/// driver meets in conformance runs:
///
/// - `error_is_likely` in the probed path fails the probe.
/// - `false_is_likely_exist` in the probed path reports "already mounted".
/// - `error_mount_source` / `error_mount_target` fail the mount call.
///
/// Everything else touches the real filesystem (directory creation, removal,
/// statvfs), and every performed action is appended to an in-memory log that
/// tests assert against. Credential option values are never recorded, only
/// their count. External commands are scripted and consumed strictly in
/// order.
pub struct FakeMounter {
    actions: Mutex<Vec<String>>,
    scripts: Mutex<VecDeque<ExecScript>>,
}

impl FakeMounter {
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(Vec::new()),
            scripts: Mutex::new(VecDeque::new()),
        }
    }

    pub fn with_scripts(scripts: Vec<ExecScript>) -> Self {
        let mounter = Self::new();
        for script in scripts {
            mounter.expect_command(script);
        }
        mounter
    }

    /// Appends one expected external command invocation to the script queue.
    pub fn expect_command(&self, script: ExecScript) {
        self.scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(script);
    }

    pub fn actions(&self) -> Vec<String> {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// True when any recorded action contains `needle`.
    pub fn recorded(&self, needle: &str) -> bool {
        self.actions().iter().any(|line| line.contains(needle))
    }

    pub fn remaining_scripts(&self) -> usize {
        self.scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn record(&self, action: String) {
        self.actions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(action);
    }
}

impl Default for FakeMounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Mounter for FakeMounter {
    fn is_mount_point(&self, path: &Path) -> Result<bool, DynError> {
        let name = path.to_string_lossy();
        if name.contains("error_is_likely") {
            return Err(new_error("fake is_mount_point: fake error"));
        }
        if name.contains("false_is_likely_exist") {
            return Ok(true);
        }
        if !path.exists() {
            return Err(Box::new(io::Error::new(
                io::ErrorKind::NotFound,
                format!("stat {}: no such file or directory", name),
            )));
        }
        Ok(false)
    }

    fn mount(
        &self,
        source: &str,
        target: &Path,
        fs_type: &str,
        options: &[String],
        sensitive_options: &[String],
    ) -> Result<(), DynError> {
        if source.contains("error_mount_source") {
            return Err(new_error("fake mount: source error"));
        }
        if target.to_string_lossy().contains("error_mount_target") {
            return Err(new_error("fake mount: target error"));
        }
        self.record(format!(
            "mount source={} target={} fstype={} options=[{}] sensitive={}",
            source,
            target.display(),
            fs_type,
            options.join(","),
            sensitive_options.len()
        ));
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<(), DynError> {
        self.record(format!("unmount target={}", target.display()));
        Ok(())
    }

    fn make_dir_all(&self, path: &Path) -> Result<(), DynError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<(), DynError> {
        fs::remove_dir(path)?;
        self.record(format!("rmdir path={}", path.display()));
        Ok(())
    }

    fn run_command(&self, command: &str, args: &[String]) -> Result<CommandOutput, DynError> {
        let mut scripts = self
            .scripts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let Some(script) = scripts.pop_front() else {
            return Err(new_error(format!(
                "unexpected command: {} {}",
                command,
                args.join(" ")
            )));
        };
        if script.command != command || script.args != args {
            return Err(new_error(format!(
                "command out of order: got `{} {}`, want `{} {}`",
                command,
                args.join(" "),
                script.command,
                script.args.join(" ")
            )));
        }
        self.record(format!("exec {} {}", command, args.join(" ")));
        Ok(script.output)
    }

    fn stat_fs(&self, path: &Path) -> Result<FilesystemUsage, DynError> {
        // Stats go against the real filesystem so totals are plausible.
        crate::cloudfile::mount::linux::LinuxMounter::new().stat_fs(path)
    }
}
