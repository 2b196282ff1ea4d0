use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use vitals_core::DashboardConfig;
use vitals_dashboard::{
    config, logging, run, Command, Dashboard, DirectorySurface, HttpSource, LiveChannel, Topic,
    View,
};

#[derive(Parser, Debug)]
#[command(
    name = "vitals-dashboard",
    about = "Keep medication and vital-sign charts current from the clinical REST API and its push channels."
)]
struct Args {
    /// TOML file layered over the built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    api_base: Option<String>,

    #[arg(long)]
    ws_base: Option<String>,

    /// Directory receiving one file per surface.
    #[arg(short, long, default_value = "dashboard-out")]
    out_dir: PathBuf,

    /// View shown first: dashboard, medications, vitals or timeline.
    #[arg(long, default_value_t = View::Dashboard)]
    view: View,

    /// Render once and exit.
    #[arg(long)]
    once: bool,

    /// Do not open the push channels.
    #[arg(long)]
    no_live: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = config::load(args.config.as_deref()).context("Could not load configuration")?;
    if let Some(api_base) = &args.api_base {
        settings.api_base = api_base.clone();
    }
    if let Some(ws_base) = &args.ws_base {
        settings.ws_base = ws_base.clone();
    }
    logging::init(&settings.log_level);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Could not start the async runtime")?;
    runtime.block_on(serve(args, settings))
}

async fn serve(args: Args, settings: DashboardConfig) -> anyhow::Result<()> {
    let surface = DirectorySurface::create(&args.out_dir)
        .with_context(|| format!("Could not prepare output directory {:?}", args.out_dir))?;
    let source = HttpSource::new(&settings.api_base);

    let mut dashboard = Dashboard::new(source, surface, settings.clone()).with_view(args.view);
    dashboard.load_initial().await;
    if args.once {
        tracing::info!(out_dir = %args.out_dir.display(), "surfaces written");
        return Ok(());
    }

    let (update_tx, update_rx) = mpsc::channel(32);
    if args.no_live {
        tracing::info!("push channels disabled");
    } else {
        for topic in Topic::ALL {
            let (channel, _state) =
                LiveChannel::new(topic, &settings.ws_base, settings.reconnect, update_tx.clone());
            tokio::spawn(channel.run());
        }
    }
    drop(update_tx);

    let (command_tx, command_rx) = mpsc::channel(8);
    tokio::spawn(read_commands(command_tx.clone()));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = command_tx.send(Command::Shutdown).await;
        }
    });

    run(dashboard, update_rx, command_rx, settings.refresh_interval()).await;
    Ok(())
}

/// One command per stdin line: a view name, `refresh` or `quit`.
async fn read_commands(commands: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(err) => {
                tracing::warn!(error = %err, "stopped reading commands");
                return;
            }
        };
        let command = match line.trim() {
            "" => continue,
            "quit" | "exit" => Command::Shutdown,
            "refresh" => Command::Refresh,
            other => match other.parse::<View>() {
                Ok(view) => Command::Activate(view),
                Err(err) => {
                    tracing::warn!(error = %err, "ignoring command");
                    continue;
                }
            },
        };
        if commands.send(command).await.is_err() {
            return;
        }
    }
}
