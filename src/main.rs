use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use tc2_launcher_lib::core::config::LauncherConfig;
use tc2_launcher_lib::core::process::RunningProbe;
use tc2_launcher_lib::core::selfupdate::{
    apply_replace, clean_self_update, AfterReplace, ReplaceBudget, ReplaceRequest,
    SelfUpdateOutcome,
};
use tc2_launcher_lib::core::state::{AppState, LaunchState};
use tc2_launcher_lib::logging;

#[derive(Parser, Debug)]
#[command(name = "tc2-launcher")]
#[command(version, about = "TC2 Launcher", long_about = None)]
struct Cli {
    /// Destination folder to write data to. Defaults to the platform data location
    #[arg(long, value_name = "DIR")]
    dest: Option<PathBuf>,

    /// Command-line mode only. Implied by any other argument
    #[arg(long = "no-gui")]
    no_gui: bool,

    /// Re-download the game archive even if the latest is installed
    #[arg(long)]
    force: bool,

    /// Launch the game after ensuring the latest archive
    #[arg(long)]
    launch: bool,

    /// Persist the given --opts as defaults in settings.json
    #[arg(long = "save-opts")]
    save_opts: bool,

    /// Game launch options; everything after --opts is passed through
    #[arg(long, num_args = 0.., allow_hyphen_values = true, value_name = "OPTS")]
    opts: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args().collect();
    let replace = ReplaceRequest::from_args(&argv);

    let cli_args = match &replace {
        Some(request) => argv
            .iter()
            .take(1)
            .chain(request.forwarded.iter())
            .cloned()
            .collect(),
        None => argv.clone(),
    };
    let arg_count = cli_args.len();
    let cli = Cli::parse_from(cli_args);
    let front_end_mode = arg_count <= 1 && !cli.no_gui;

    let state = match AppState::new(LauncherConfig::from_env(), cli.dest.as_deref()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match logging::init(&state.data_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {e}");
            None
        }
    };
    info!("TC2 Launcher v{} starting", state.config.version);

    if let Some(request) = replace {
        match finish_replace(&state, &request).await {
            Some(AfterReplace::Continue(_)) => {}
            Some(AfterReplace::RelaunchedFrontEnd) => return ExitCode::SUCCESS,
            None => return ExitCode::FAILURE,
        }
    } else if self_update(&state, &argv).await == SelfUpdateOutcome::Relaunched {
        return ExitCode::SUCCESS;
    }
    clean_self_update(&state.data_dir);

    if front_end_mode {
        run_front_end(&state).await;
        ExitCode::SUCCESS
    } else {
        run_cli(&state, &cli).await
    }
}

async fn finish_replace(state: &AppState, request: &ReplaceRequest) -> Option<AfterReplace> {
    let self_path = match std::env::current_exe() {
        Ok(path) => path,
        Err(e) => {
            error!("Cannot locate running binary: {}", e);
            return None;
        }
    };

    match apply_replace(state.platform(), request, &self_path, ReplaceBudget::default()).await {
        Ok(next) => Some(next),
        Err(e) => {
            error!("Self-update replace failed: {}", e);
            None
        }
    }
}

async fn self_update(state: &AppState, argv: &[String]) -> SelfUpdateOutcome {
    let current_exe = match std::env::current_exe().and_then(std::fs::canonicalize) {
        Ok(path) => path,
        Err(e) => {
            warn!("Cannot locate running binary, skipping self-update: {}", e);
            return SelfUpdateOutcome::Disabled;
        }
    };
    let args = argv.get(1..).unwrap_or_default();
    state.self_updater().run(&current_exe, args).await
}

async fn run_cli(state: &AppState, cli: &Cli) -> ExitCode {
    let status = state.update_archive(cli.force).await;
    info!("Archive status: {}", status.code());

    if cli.save_opts {
        if let Err(e) = state.set_launch_options(cli.opts.clone()) {
            error!("Failed to save launch options: {}", e);
        }
    }

    if cli.launch {
        if let Err(e) = state.launch_game(&cli.opts) {
            error!("Failed to launch game: {}", e);
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}

/// Headless stand-in for the interactive front-end: update, report whether
/// the game is running, and refresh the install once it exits.
async fn run_front_end(state: &AppState) {
    let status = state.update_archive(false).await;
    info!("Archive status: {}", status.code());

    let (exited_tx, exited_rx) = tokio::sync::oneshot::channel();
    let launch_state = state
        .check_launch_state(RunningProbe::default(), move || {
            let _ = exited_tx.send(());
        })
        .await;
    info!("Launch state: {}", launch_state.code());

    if let LaunchState::Running(pid) = launch_state {
        info!("Waiting for game process {} to exit", pid);
        if exited_rx.await.is_ok() {
            let status = state.update_archive(false).await;
            info!("Archive status: {}", status.code());
        }
    }
}
