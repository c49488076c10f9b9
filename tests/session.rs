//! End-to-end session tests — a full bot driven over an in-memory stream.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use chanscribe::config::{Config, Overrides};
use chanscribe::irc::bot::{Bot, SessionEnd};
use chanscribe::irc::connection::Connection;
use chanscribe::logfile::ChannelLog;

fn test_config() -> Config {
    Config::from_layers(
        Overrides {
            channel: Some("chan".into()),
            nick: Some("bot".into()),
            user: Some("bot".into()),
            realname: Some("bot".into()),
            kill_password: Some("secret".into()),
            ..Overrides::default()
        },
        None,
    )
}

#[tokio::test]
async fn full_session_logs_chatter_and_dies_on_kill() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chan.log");
    let log = ChannelLog::create(&path).unwrap();
    let mut bot = Bot::new(test_config(), log);

    let (local, mut server) = tokio::io::duplex(1 << 16);
    let mut conn = Connection::new(local);

    bot.handshake(&mut conn).await.unwrap();

    // Deliberately fragmented delivery, terminator split across writes.
    server
        .write_all(b":nick!~u@host PRIVMSG #chan :hel")
        .await
        .unwrap();
    server.write_all(b"lo there\r").await.unwrap();
    server
        .write_all(b"\nPING :irc.example.net\r\n")
        .await
        .unwrap();
    server
        .write_all(b":nick!~u@host PRIVMSG #chan :.kill secret\r\n")
        .await
        .unwrap();

    let end = bot.run(&mut conn).await.unwrap();
    assert_eq!(end, SessionEnd::Killed);
    bot.shutdown().unwrap();
    drop(conn);

    // Everything the bot sent, in wire order.
    let mut out = Vec::new();
    server.read_to_end(&mut out).await.unwrap();
    let sent: Vec<String> = String::from_utf8(out)
        .unwrap()
        .split("\r\n")
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect();
    assert_eq!(
        sent,
        vec![
            "NICK bot",
            "USER bot 0 * :bot",
            "JOIN #chan",
            "PRIVMSG #chan :I am a logbot and I am ready! Use \".help\" for help.",
            "PONG :irc.example.net",
            "PRIVMSG nick :With urgency, my lord. Dying at your request.",
            "PRIVMSG #chan :Goodbye!",
            "QUIT :killed by nick",
        ]
    );

    // The chatter was tracked: record for nick with message and channel.
    let user = bot.state().user("nick").unwrap();
    assert_eq!(user.last_message.as_deref(), Some("hello there"));
    assert!(user.channels.contains("#chan"));

    // The log holds the chatter, the kill command, and the shutdown line.
    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("nick (#chan): hello there"), "{}", lines[0]);
    assert!(lines[1].contains("nick (#chan): .kill secret"), "{}", lines[1]);
    assert!(lines[2].starts_with("shutdown at "), "{}", lines[2]);
}

#[tokio::test]
async fn session_ends_gracefully_when_server_closes() {
    let dir = tempfile::tempdir().unwrap();
    let log = ChannelLog::create(dir.path().join("chan.log")).unwrap();
    let mut bot = Bot::new(test_config(), log);

    let (local, mut server) = tokio::io::duplex(1 << 16);
    let mut conn = Connection::new(local);

    server
        .write_all(b":nick!~u@host PRIVMSG #chan :bye now\r\n")
        .await
        .unwrap();
    server.shutdown().await.unwrap();

    let end = bot.run(&mut conn).await.unwrap();
    assert_eq!(end, SessionEnd::PeerClosed);
    assert_eq!(
        bot.state().user("nick").unwrap().last_message.as_deref(),
        Some("bye now")
    );
}
