// ─── Platform Adapter ───
// Everything that differs between Windows and the POSIX targets lives
// behind the `Platform` trait so call sites never branch on the OS.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetOs {
    Windows,
    Linux,
    MacOs,
}

impl TargetOs {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            TargetOs::Windows
        } else if cfg!(target_os = "macos") {
            TargetOs::MacOs
        } else {
            TargetOs::Linux
        }
    }

    pub fn is_windows(self) -> bool {
        self == TargetOs::Windows
    }
}

/// A program to start without waiting for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachedCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl DetachedCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

/// OS adapter. Asset filters and file names default from [`Platform::target`];
/// implementors only have to provide process spawning and path opening.
pub trait Platform: Send + Sync {
    fn target(&self) -> TargetOs;

    /// Case-insensitive substring selecting the game archive asset.
    fn game_asset_filter(&self) -> &'static str {
        if self.target().is_windows() {
            "game-win.zip"
        } else {
            "game-linux.zip"
        }
    }

    /// Case-insensitive substring selecting the launcher's own binary asset.
    fn launcher_asset_filter(&self) -> &'static str {
        if self.target().is_windows() {
            ".exe"
        } else {
            "-linux"
        }
    }

    /// File the launcher starts inside the game directory.
    fn executable_file_name(&self) -> &'static str {
        if self.target().is_windows() {
            "tc2_win64.exe"
        } else {
            "tc2.sh"
        }
    }

    /// Name the running game reports in the process table. On POSIX the
    /// launch script execs a differently named binary.
    fn process_file_name(&self) -> &'static str {
        if self.target().is_windows() {
            "tc2_win64.exe"
        } else {
            "tc2_linux64"
        }
    }

    /// Start `command` detached from this process. Returns the child pid.
    fn spawn_detached(&self, command: &DetachedCommand) -> LauncherResult<u32>;

    /// Reveal `path` in the desktop file manager.
    fn open_path(&self, path: &Path) -> LauncherResult<()>;
}

/// The platform this binary was compiled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostPlatform;

impl Platform for HostPlatform {
    fn target(&self) -> TargetOs {
        TargetOs::current()
    }

    fn spawn_detached(&self, command: &DetachedCommand) -> LauncherResult<u32> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);
        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        configure_child_env(&mut cmd);
        configure_platform_spawn(&mut cmd);

        debug!("Spawning detached: {:?}", cmd);
        let mut child = cmd.spawn().map_err(|source| LauncherError::Spawn {
            program: command.program.clone(),
            source,
        })?;
        let pid = child.id();

        // Reap the child so it never lingers as a zombie that still shows up
        // in the process table.
        std::thread::spawn(move || {
            let _ = child.wait();
        });

        Ok(pid)
    }

    fn open_path(&self, path: &Path) -> LauncherResult<()> {
        let opener = match self.target() {
            TargetOs::Windows => "explorer",
            TargetOs::MacOs => "open",
            TargetOs::Linux => linux_opener(),
        };
        let command = DetachedCommand::new(opener).args([path.to_string_lossy()]);
        self.spawn_detached(&command).map(|_| ())
    }
}

fn linux_opener() -> &'static str {
    let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();
    if desktop.split(':').any(|d| d == "KDE") || std::env::var_os("KDE_FULL_SESSION").is_some()
    {
        "kde-open5"
    } else {
        "xdg-open"
    }
}

/// Bundled builds may prepend private library directories to
/// `LD_LIBRARY_PATH`; children get the value the user started us with.
fn configure_child_env(cmd: &mut Command) {
    if !cfg!(unix) {
        return;
    }
    match child_library_path(std::env::var_os("LD_LIBRARY_PATH_ORIG")) {
        Some(value) => {
            cmd.env("LD_LIBRARY_PATH", value);
        }
        None => {
            cmd.env_remove("LD_LIBRARY_PATH");
        }
    }
}

fn child_library_path(original: Option<OsString>) -> Option<OsString> {
    original.filter(|value| !value.is_empty())
}

fn configure_platform_spawn(cmd: &mut Command) {
    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP | CREATE_NO_WINDOW);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // New process group: the child survives the launcher's terminal closing.
        cmd.process_group(0);
    }

    #[cfg(not(any(unix, target_os = "windows")))]
    {
        let _ = cmd;
        tracing::warn!("Detached spawn is not supported on this platform; starting attached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(TargetOs);

    impl Platform for Fixed {
        fn target(&self) -> TargetOs {
            self.0
        }

        fn spawn_detached(&self, _command: &DetachedCommand) -> LauncherResult<u32> {
            Ok(0)
        }

        fn open_path(&self, _path: &Path) -> LauncherResult<()> {
            Ok(())
        }
    }

    #[test]
    fn windows_defaults() {
        let platform = Fixed(TargetOs::Windows);
        assert_eq!(platform.game_asset_filter(), "game-win.zip");
        assert_eq!(platform.launcher_asset_filter(), ".exe");
        assert_eq!(platform.executable_file_name(), "tc2_win64.exe");
        assert_eq!(platform.process_file_name(), "tc2_win64.exe");
    }

    #[test]
    fn posix_launch_script_differs_from_process_name() {
        let platform = Fixed(TargetOs::Linux);
        assert_eq!(platform.game_asset_filter(), "game-linux.zip");
        assert_eq!(platform.launcher_asset_filter(), "-linux");
        assert_eq!(platform.executable_file_name(), "tc2.sh");
        assert_eq!(platform.process_file_name(), "tc2_linux64");
    }

    #[test]
    fn empty_original_library_path_is_dropped() {
        assert_eq!(child_library_path(None), None);
        assert_eq!(child_library_path(Some(OsString::new())), None);
        assert_eq!(
            child_library_path(Some(OsString::from("/usr/lib"))),
            Some(OsString::from("/usr/lib"))
        );
    }

    #[test]
    fn detached_command_builder_collects_args() {
        let cmd = DetachedCommand::new("/bin/game")
            .args(["-a", "-b"])
            .current_dir("/games");
        assert_eq!(cmd.args, vec!["-a", "-b"]);
        assert_eq!(cmd.cwd, Some(PathBuf::from("/games")));
    }
}
