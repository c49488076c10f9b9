//! The bot — command dispatch and the session event loop.
//!
//! One [`Bot`] drives one connection: it performs the registration
//! handshake, then loops pulling raw chunks, framing them, parsing each
//! line, and branching on the verb — PING gets an immediate PONG, PRIVMSG
//! goes through logging, user tracking, and command dispatch. Everything
//! runs on a single task; handlers mutate session state inline.

use std::io;

use chrono::Utc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::logfile::ChannelLog;

use super::connection::Connection;
use super::framer::LineFramer;
use super::message::{Message, Privmsg};
use super::state::SessionState;

/// CTCP VERSION query — a machine-to-machine probe wrapped in \x01.
const CTCP_VERSION: &str = "\x01VERSION\x01";

/// Reply for `.version`.
const VERSION_LINE: &str = concat!(
    "chanscribe v",
    env!("CARGO_PKG_VERSION"),
    " by ",
    env!("CARGO_PKG_AUTHORS")
);

/// CTCP VERSION reply, sent via NOTICE per the CTCP convention.
const CTCP_VERSION_REPLY: &str =
    concat!("\x01VERSION chanscribe v", env!("CARGO_PKG_VERSION"), "\x01");

const HELP_INDEX: &str =
    "Available commands (use .help <command> for more help): flush, help, kill, last, user, version";

/// One-line help per command name (without the dot).
fn help_line(topic: &str) -> Option<&'static str> {
    Some(match topic {
        "flush" => ".flush: flush and rotate logfiles",
        "help" => ".help <command>: lists help for a specific command",
        "kill" => ".kill: attempts to kill this bot (good luck)",
        "last" => {
            ".last [user]: displays last message received. \
             if [user] is specified, displays last message sent by user"
        }
        "user" => {
            ".user [user]: displays information about user. \
             if unspecified, defaults to command requester"
        }
        "version" => ".version: displays version information",
        _ => return None,
    })
}

/// The closed set of commands the bot answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Flush,
    Help,
    Version,
    Kill,
    Last,
    User,
    CtcpVersion,
}

impl Command {
    /// Exact, case-sensitive token lookup.
    fn from_token(token: &str) -> Option<Self> {
        match token {
            ".flush" => Some(Self::Flush),
            ".help" => Some(Self::Help),
            ".version" => Some(Self::Version),
            ".kill" => Some(Self::Kill),
            ".last" => Some(Self::Last),
            ".user" => Some(Self::User),
            CTCP_VERSION => Some(Self::CtcpVersion),
            _ => None,
        }
    }
}

/// Why a session ended. All three are graceful outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The kill command fired; QUIT was sent.
    Killed,
    /// The server closed the stream.
    PeerClosed,
    /// Ctrl-C during receive; QUIT was sent best-effort.
    Interrupted,
}

/// Leading command token and whitespace-split remaining arguments.
fn split_text(text: &str) -> (&str, Vec<&str>) {
    match text.split_once(' ') {
        Some((token, rest)) => (token, rest.split_whitespace().collect()),
        None => (text, Vec::new()),
    }
}

/// The logging bot: session state plus the config and log it works with.
#[derive(Debug)]
pub struct Bot {
    config: Config,
    state: SessionState,
    log: ChannelLog,
}

impl Bot {
    pub fn new(config: Config, log: ChannelLog) -> Self {
        Self {
            config,
            state: SessionState::new(),
            log,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Register with the server and join the configured channel.
    pub async fn handshake<S>(&self, conn: &mut Connection<S>) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // PASS must precede NICK and USER (RFC 2812 3.1.1).
        if let Some(password) = self.config.server_password.as_deref() {
            conn.password(password).await?;
        }
        conn.nick(&self.config.nick).await?;
        conn.user(&self.config.user, &self.config.realname).await?;
        conn.join(&self.config.channel).await?;
        if let Some(admin) = self.config.admin.as_deref() {
            conn.privmsg(admin, "Greetings, overlord. I am for you.")
                .await?;
        }
        conn.privmsg(
            &self.config.channel,
            "I am a logbot and I am ready! Use \".help\" for help.",
        )
        .await
    }

    /// Drive the session until the peer closes, the kill command fires,
    /// or an interrupt arrives.
    ///
    /// Lines are processed in wire order; a line that fails to parse is
    /// logged and skipped without disturbing the rest of its batch.
    pub async fn run<S>(&mut self, conn: &mut Connection<S>) -> io::Result<SessionEnd>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framer = LineFramer::new();
        let mut chunk = [0u8; 1024];

        loop {
            let n = tokio::select! {
                read = conn.recv(&mut chunk) => read?,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupt caught, leaving");
                    let _ = conn.quit("interrupted").await;
                    return Ok(SessionEnd::Interrupted);
                }
            };
            if n == 0 {
                info!("server closed the connection");
                return Ok(SessionEnd::PeerClosed);
            }

            for frame in framer.ingest(&chunk[..n]) {
                // IRC encoding is unknowable in general; decode lossily
                // and take whatever we get.
                let line = String::from_utf8_lossy(&frame);
                let msg = match Message::parse(&line) {
                    Ok(msg) => msg,
                    Err(err) => {
                        warn!(%err, %line, "skipping unparsable line");
                        continue;
                    }
                };
                self.handle(conn, &msg).await?;
                if self.state.should_quit {
                    return Ok(SessionEnd::Killed);
                }
            }
        }
    }

    /// Write the final log line. Called once, after the loop ends.
    pub fn shutdown(&mut self) -> io::Result<()> {
        let line = format!("shutdown at {}", Utc::now().format(&self.config.timeformat));
        self.log.write(&line)?;
        info!("{line}");
        Ok(())
    }

    async fn handle<S>(&mut self, conn: &mut Connection<S>, msg: &Message) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match msg.verb.as_str() {
            "PING" => conn.pong(&msg.params).await,
            "PRIVMSG" => self.handle_privmsg(conn, msg).await,
            _ => {
                debug!(verb = %msg.verb, "ignoring");
                Ok(())
            }
        }
    }

    async fn handle_privmsg<S>(&mut self, conn: &mut Connection<S>, msg: &Message) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let payload = match Privmsg::parse(&msg.params) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(%err, params = %msg.params, "skipping malformed chat message");
                return Ok(());
            }
        };
        let Some(requester) = msg.origin_nick().map(str::to_owned) else {
            debug!(params = %msg.params, "chat message without origin, not tracking");
            return Ok(());
        };

        // Resolve the reply destination and the named command before
        // touching state: the update rules differ for dispatched text.
        let destination = self.resolve_destination(&payload, &requester);
        let (token, args) = split_text(&payload.text);
        let command = Command::from_token(token);
        let dispatched = destination.is_some() && command.is_some();

        let now = Utc::now();
        let formatted = format!(
            "<{}> {} ({}): {}",
            now.format(&self.config.timeformat),
            requester,
            payload.targets.join(","),
            payload.text
        );
        self.log.write(&formatted)?;

        let record = self.state.user_mut(&requester);
        if dispatched {
            // Command text is not conversation.
            record.touch(now);
        } else {
            record.observe(payload.channels(), &payload.text, now);
            self.state.last_message = Some(formatted);
        }

        if let (Some(destination), Some(command)) = (destination, command) {
            info!(%requester, ?command, %destination, "dispatching");
            self.dispatch(conn, command, &requester, &destination, &args)
                .await?;
        }
        Ok(())
    }

    /// Where a reply must go: the joined channel when it is targeted,
    /// else the requester directly when the bot's nick is, else nowhere —
    /// the message is not addressed to the bot.
    fn resolve_destination(&self, payload: &Privmsg, requester: &str) -> Option<String> {
        if payload.targets.iter().any(|t| *t == self.config.channel) {
            Some(self.config.channel.clone())
        } else if payload.targets.iter().any(|t| *t == self.config.nick) {
            Some(requester.to_owned())
        } else {
            None
        }
    }

    async fn dispatch<S>(
        &mut self,
        conn: &mut Connection<S>,
        command: Command,
        requester: &str,
        destination: &str,
        args: &[&str],
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match command {
            Command::Flush => self.cmd_flush(conn, destination).await,
            Command::Help => self.cmd_help(conn, destination, args).await,
            Command::Version => self.cmd_version(conn, destination).await,
            Command::Kill => self.cmd_kill(conn, requester, args).await,
            Command::Last => self.cmd_last(conn, destination, args).await,
            Command::User => self.cmd_user(conn, requester, destination, args).await,
            Command::CtcpVersion => self.cmd_ctcp_version(conn, requester).await,
        }
    }

    // ── Command handlers ─────────────────────────────────────────

    /// Rotation itself belongs to the logfile collaborator; the command
    /// contract is the acknowledgement.
    async fn cmd_flush<S>(&mut self, conn: &mut Connection<S>, destination: &str) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        conn.privmsg(destination, "Flushing and rotating logfiles...")
            .await
    }

    async fn cmd_help<S>(
        &mut self,
        conn: &mut Connection<S>,
        destination: &str,
        args: &[&str],
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        // Unknown topics fall back to the index.
        let line = args
            .first()
            .and_then(|topic| help_line(topic))
            .unwrap_or(HELP_INDEX);
        conn.privmsg(destination, line).await
    }

    async fn cmd_version<S>(
        &mut self,
        conn: &mut Connection<S>,
        destination: &str,
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        conn.privmsg(destination, VERSION_LINE).await
    }

    /// Succeeds only with the configured password: direct ack, channel
    /// goodbye, QUIT — exactly three sends. Anything else is a silent
    /// no-op.
    async fn cmd_kill<S>(
        &mut self,
        conn: &mut Connection<S>,
        requester: &str,
        args: &[&str],
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(configured) = self.config.kill_password.as_deref() else {
            debug!(%requester, "kill requested but no kill password is configured");
            return Ok(());
        };
        if args.first().copied() != Some(configured) {
            debug!(%requester, "kill with wrong password");
            return Ok(());
        }

        self.state.should_quit = true;
        info!(%requester, "kill accepted, shutting down");
        conn.privmsg(requester, "With urgency, my lord. Dying at your request.")
            .await?;
        conn.privmsg(&self.config.channel, "Goodbye!").await?;
        conn.quit(&format!("killed by {requester}")).await
    }

    async fn cmd_last<S>(
        &mut self,
        conn: &mut Connection<S>,
        destination: &str,
        args: &[&str],
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let line = match args.first() {
            Some(nick) => match self.state.user(nick) {
                None => "unknown user".to_owned(),
                Some(user) => user
                    .last_message
                    .clone()
                    .unwrap_or_else(|| "no last message".to_owned()),
            },
            None => self
                .state
                .last_message
                .clone()
                .unwrap_or_else(|| "no last message".to_owned()),
        };
        conn.privmsg(destination, &line).await
    }

    async fn cmd_user<S>(
        &mut self,
        conn: &mut Connection<S>,
        requester: &str,
        destination: &str,
        args: &[&str],
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let nick = args.first().copied().unwrap_or(requester);
        let fmt = self.config.timeformat_extended.as_str();
        // A record that has never chatted (command activity only) has no
        // seen time and nothing worth reporting.
        let known = self.state.user(nick).and_then(|user| {
            match (user.seen, user.active, user.last_message.as_deref()) {
                (Some(seen), Some(active), Some(message)) => Some(format!(
                    "User {nick} (last seen {}), (last message {} -- {message})",
                    seen.format(fmt),
                    active.format(fmt),
                )),
                _ => None,
            }
        });
        let line = known.unwrap_or_else(|| format!("Information unavailable for user {nick}"));
        conn.privmsg(destination, &line).await
    }

    /// CTCP is machine-to-machine: the reply is a NOTICE to the
    /// requester, never a channel line.
    async fn cmd_ctcp_version<S>(
        &mut self,
        conn: &mut Connection<S>,
        requester: &str,
    ) -> io::Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        conn.notice(requester, CTCP_VERSION_REPLY).await
    }
}
