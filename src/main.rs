use std::sync::Arc;
use std::time::Duration;

use color_eyre::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pairsync::adapters::TungsteniteChannel;
use pairsync::cli::{parse_args, version_line, CliCommand, USAGE, VERSION};
use pairsync::config::SyncConfig;
use pairsync::countdown::CountdownDriver;
use pairsync::display::{SecretDisplayAdapter, SlotBoard};
use pairsync::error::{ErrorContext, ResultExt};
use pairsync::localization::{Language, LocalizationGateway};
use pairsync::models::SecretFamily;
use pairsync::sync::{
    supervise, CountdownPolicy, SyncController, ADVISOR_COUNTDOWN_KEY, CLIENT_COUNTDOWN_KEY,
};
use pairsync::traits::DuplexChannel;

/// How often the terminal view checks the boards for changes.
const REFRESH_INTERVAL: Duration = Duration::from_millis(250);

fn init_tracing() {
    // stdout is the view; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "pairsync=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let overrides = match parse_args(std::env::args())? {
        CliCommand::Version => {
            println!("{}", version_line());
            return Ok(());
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            return Ok(());
        }
        CliCommand::Run(overrides) => overrides,
    };

    color_eyre::install()?;
    init_tracing();

    let config = SyncConfig::from_env()?.with_overrides(&overrides)?;
    config.validate()?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config))
}

async fn run(config: SyncConfig) -> Result<()> {
    info!("Starting pairsync v{}", VERSION);

    let preference = config.effective_language_preference();
    let gateway = match LocalizationGateway::initialize(&config.locales, preference.as_deref())
        .await
        .context(ErrorContext::new("initialize_localization").with_component("main"))
    {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!(error_code = e.error_code(), "{}", e.user_message());
            warn!("Continuing without translations");
            Arc::new(LocalizationGateway::from_catalogs(
                Vec::new(),
                Language::from_preference(preference.as_deref()),
            ))
        }
    };

    let channel: Arc<dyn DuplexChannel> = Arc::new(
        TungsteniteChannel::connect(config.channel_config())
            .await
            .context(ErrorContext::new("connect").with_component("main"))?,
    );

    let user_id = config.user_id.clone().unwrap_or_default();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut boards: Vec<(SecretFamily, Arc<SlotBoard>)> = Vec::new();
    let mut supervisors = Vec::new();

    for &family in &config.families {
        let board = SlotBoard::new();
        board.mount_label("auth");
        board.mount_countdown(CLIENT_COUNTDOWN_KEY);
        if config.countdown_policy == CountdownPolicy::PerSide {
            board.mount_countdown(ADVISOR_COUNTDOWN_KEY);
        }
        let slots = board.mount_family(family);
        gateway.apply_to_document(&*board);

        let countdown = Arc::new(
            CountdownDriver::new(board.clone()).with_total_duration(config.countdown_total_secs),
        );
        let controller = Arc::new(
            SyncController::new(
                user_id.clone(),
                family,
                SecretDisplayAdapter::new(gateway.clone()),
                slots,
                countdown,
            )
            .with_countdown_policy(config.countdown_policy)
            .with_poll_interval(config.poll_interval),
        );

        info!(family = %family, session_id = %controller.session_id(), "Controller ready");
        supervisors.push(tokio::spawn(supervise(
            controller,
            Arc::clone(&channel),
            shutdown_rx.clone(),
        )));
        boards.push((family, board));
    }

    let mut channel_state = channel.state();
    let mut refresh = tokio::time::interval(REFRESH_INTERVAL);
    let mut last_revision = None;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                if let Err(e) = result {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                info!("Interrupted, shutting down");
                break;
            }
            changed = channel_state.changed() => {
                if changed.is_err() {
                    warn!("Connection to the rotation server is gone for good");
                    break;
                }
            }
            _ = refresh.tick() => {
                let revision: u64 = boards.iter().map(|(_, board)| board.revision()).sum();
                if last_revision != Some(revision) {
                    last_revision = Some(revision);
                    render(&boards);
                }
            }
        }
    }

    let _ = shutdown_tx.send(true);
    for supervisor in supervisors {
        if let Err(e) = supervisor.await {
            error!("Supervisor task failed: {}", e);
        }
    }
    channel.shutdown();
    Ok(())
}

fn render(boards: &[(SecretFamily, Arc<SlotBoard>)]) {
    // Clear the screen and move home.
    print!("\x1b[2J\x1b[H");
    for (family, board) in boards {
        println!("== {} ==", family);
        print!("{}", board.render());
        println!();
    }
}
