// ─── Launch Task ───
// Starts the game detached from the launcher with the composed arguments.

use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{DetachedCommand, Platform};

use super::composer::compose_launch;

/// Spawn the game executable at `exe` with `options`.
///
/// The working directory is the executable's own directory. Returns the pid
/// of the spawned process (on POSIX this is the launch script, not the game
/// binary; use the process monitor to find the real game process).
pub fn launch_game(platform: &dyn Platform, exe: &Path, options: &[String]) -> LauncherResult<u32> {
    if !exe.is_file() {
        return Err(LauncherError::Other(format!(
            "Game executable not found: {}",
            exe.display()
        )));
    }

    let mut argv = compose_launch(exe, options, platform.target()).into_iter();
    // First entry is the program itself.
    argv.next();

    let mut command = DetachedCommand::new(exe).args(argv);
    if let Some(cwd) = exe.parent() {
        command = command.current_dir(cwd);
    }

    info!("Launching game: {:?}", exe);
    debug!("Command (copy/paste): {}", format_command_for_logs(&command));

    let pid = platform.spawn_detached(&command)?;
    info!("Game started with pid {}", pid);
    Ok(pid)
}

fn format_command_for_logs(command: &DetachedCommand) -> String {
    let program = shell_escape(&command.program.to_string_lossy());
    let args = command
        .args
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=' | '+')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}
