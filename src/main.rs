use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use chanscribe::config::{Config, Overrides};
use chanscribe::irc::bot::{Bot, SessionEnd};
use chanscribe::irc::connection::Connection;
use chanscribe::logfile::ChannelLog;

/// IRC channel-logging bot.
///
/// Logs one channel to a file and answers a few dot-commands.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// IRC channel to join (leading '#' optional).
    #[arg(short, long)]
    channel: Option<String>,

    /// TOML configuration file; CLI flags override it.
    #[arg(short, long)]
    init: Option<PathBuf>,

    /// Kill password to stop the bot from IRC.
    #[arg(short, long)]
    kill: Option<String>,

    /// IRC nick name.
    #[arg(short, long)]
    nick: Option<String>,

    /// Output log filename.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// IRC port to use.
    #[arg(short, long)]
    port: Option<u16>,

    /// IRC real name.
    #[arg(short, long)]
    real: Option<String>,

    /// IRC server to connect to.
    #[arg(short, long)]
    server: Option<String>,

    /// IRC user name.
    #[arg(short, long)]
    user: Option<String>,

    /// Password to give to the server in a PASS command.
    #[arg(long)]
    password: Option<String>,

    /// Nick to greet as admin once joined.
    #[arg(long)]
    admin: Option<String>,

    /// Print debug information.
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            port: self.port,
            channel: self.channel.clone(),
            nick: self.nick.clone(),
            user: self.user.clone(),
            realname: self.real.clone(),
            output: self.output.clone(),
            kill_password: self.kill.clone(),
            server_password: self.password.clone(),
            admin: self.admin.clone(),
            timeformat: None,
            timeformat_extended: None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let file = match &args.init {
        Some(path) => Some(
            Overrides::load(path)
                .with_context(|| format!("loading config file {}", path.display()))?,
        ),
        None => None,
    };
    let config = Config::from_layers(args.overrides(), file);

    info!("chanscribe v{}", env!("CARGO_PKG_VERSION"));
    info!("started at {}", Utc::now().format(&config.timeformat));
    if let Some(path) = &args.init {
        info!("using configuration file: {}", path.display());
    }
    info!("using output logfile {}", config.output.display());
    info!("using server {} on port {}", config.server, config.port);
    info!("using timestamp format {}", config.timeformat);

    let log = ChannelLog::create(&config.output)
        .with_context(|| format!("opening logfile {}", config.output.display()))?;

    info!("connecting to {} {}", config.server, config.port);
    let mut conn = Connection::connect(&config.server, config.port)
        .await
        .with_context(|| format!("connecting to {}:{}", config.server, config.port))?;

    let mut bot = Bot::new(config, log);
    bot.handshake(&mut conn).await.context("handshake failed")?;

    let end = bot.run(&mut conn).await.context("session failed")?;
    match end {
        SessionEnd::Killed => info!("session ended: killed from IRC"),
        SessionEnd::PeerClosed => info!("session ended: server closed the connection"),
        SessionEnd::Interrupted => info!("session ended: interrupted"),
    }

    bot.shutdown().context("writing shutdown line")?;
    let _ = conn.close().await;
    Ok(())
}
