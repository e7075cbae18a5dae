// ─── TC2 Launcher Core ───
// Update / versioning / process-lifecycle engine behind the launcher.
//
// Architecture:
//   core/
//     store/      — settings.json + state.json
//     release/    — Release queries, channel resolution, asset selection
//     downloader/ — Streamed downloads + content digest verification
//     install/    — Game archive install state machine + zip extraction
//     selfupdate/ — Download-and-relaunch, replace mode
//     process/    — Detect-running + exit watcher
//     launch/     — Argument composition + detached spawn
//     platform    — OS adapter
//     events      — Installed-version observers
//     state/      — AppState facade for the front-ends

pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod install;
pub mod launch;
pub mod paths;
pub mod platform;
pub mod process;
pub mod release;
pub mod selfupdate;
pub mod state;
pub mod store;

#[cfg(test)]
pub mod testing;
