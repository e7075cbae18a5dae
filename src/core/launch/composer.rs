use std::path::Path;

use crate::core::platform::TargetOs;

const DEFAULT_ARGS: &[&str] = &[
    "-steam",
    "-particles",
    "1",
    "-condebug",
    "-nobreakpad",
    "-nominidumps",
];

/// Any of these in the user's options means they chose a window mode.
const WINDOW_MODE_FLAGS: &[&str] = &["-sw", "-windowed", "-noborder", "-full", "-fullscreen"];

/// Full argument vector for the game: `[exe] + defaults + [borderless] +
/// options + trailing`. Options are passed through untouched.
pub fn compose_launch(exe: &Path, options: &[String], target: TargetOs) -> Vec<String> {
    let mut args = Vec::with_capacity(DEFAULT_ARGS.len() + options.len() + 6);
    args.push(exe.to_string_lossy().into_owned());
    args.extend(DEFAULT_ARGS.iter().map(|arg| arg.to_string()));

    if !target.is_windows() {
        args.push("-gathermod".into());
    }

    // Borderless window unless the user picked a mode themselves.
    if target.is_windows() && !has_window_mode(options) {
        args.push("-sw".into());
        args.push("-noborder".into());
    }

    args.extend(options.iter().cloned());

    if target.is_windows() {
        args.push("+ip".into());
        args.push("127.0.0.1".into());
    }

    args
}

fn has_window_mode(options: &[String]) -> bool {
    options
        .iter()
        .any(|opt| WINDOW_MODE_FLAGS.contains(&opt.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn windows_defaults_add_borderless_and_loopback() {
        let args = compose_launch(Path::new("tc2_win64.exe"), &[], TargetOs::Windows);
        assert_eq!(
            args,
            opts(&[
                "tc2_win64.exe",
                "-steam",
                "-particles",
                "1",
                "-condebug",
                "-nobreakpad",
                "-nominidumps",
                "-sw",
                "-noborder",
                "+ip",
                "127.0.0.1",
            ])
        );
    }

    #[test]
    fn explicit_window_mode_suppresses_borderless() {
        for flag in WINDOW_MODE_FLAGS {
            let args = compose_launch(
                Path::new("tc2_win64.exe"),
                &opts(&[flag, "-w", "1920"]),
                TargetOs::Windows,
            );
            assert_eq!(
                args.iter().filter(|a| a.as_str() == "-noborder").count(),
                usize::from(*flag == "-noborder"),
                "flag {flag}"
            );
            assert_eq!(args.iter().filter(|a| a.as_str() == "-sw").count(), usize::from(*flag == "-sw"));
        }
    }

    #[test]
    fn linux_gathers_mods_without_windows_extras() {
        let args = compose_launch(Path::new("/games/tc2/tc2.sh"), &opts(&["+map", "ctf_2fort"]), TargetOs::Linux);
        assert_eq!(args[0], "/games/tc2/tc2.sh");
        assert!(args.contains(&"-gathermod".to_string()));
        assert!(!args.contains(&"-noborder".to_string()));
        assert!(!args.contains(&"+ip".to_string()));
        assert_eq!(&args[args.len() - 2..], &opts(&["+map", "ctf_2fort"])[..]);
    }

    #[test]
    fn options_come_after_defaults_and_before_trailing() {
        let args = compose_launch(Path::new("tc2_win64.exe"), &opts(&["-novid"]), TargetOs::Windows);
        let novid = args.iter().position(|a| a == "-novid").unwrap();
        let steam = args.iter().position(|a| a == "-steam").unwrap();
        let ip = args.iter().position(|a| a == "+ip").unwrap();
        assert!(steam < novid && novid < ip);
    }
}
