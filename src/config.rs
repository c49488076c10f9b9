//! Runtime configuration.
//!
//! The bot receives one immutable [`Config`], resolved from up to three
//! layers: CLI flags over an optional TOML init file over built-in
//! defaults. CLI parsing itself lives in `main.rs`; this module only
//! merges [`Overrides`] layers.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Fully resolved configuration, immutable for the life of the session.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: String,
    pub port: u16,
    /// Channel to join and log, `#` sigil included.
    pub channel: String,
    pub nick: String,
    pub user: String,
    pub realname: String,
    pub output: PathBuf,
    /// `.kill` succeeds only when this is configured and matched.
    pub kill_password: Option<String>,
    /// Sent in PASS before identification, when the server wants one.
    pub server_password: Option<String>,
    /// Nick greeted once after joining.
    pub admin: Option<String>,
    /// strftime format for log-line timestamps.
    pub timeformat: String,
    /// strftime format for the `.user` reply timestamps.
    pub timeformat_extended: String,
}

/// One partial configuration layer. Every field optional; later layers
/// win field by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Overrides {
    pub server: Option<String>,
    pub port: Option<u16>,
    pub channel: Option<String>,
    pub nick: Option<String>,
    pub user: Option<String>,
    pub realname: Option<String>,
    pub output: Option<PathBuf>,
    pub kill_password: Option<String>,
    pub server_password: Option<String>,
    pub admin: Option<String>,
    pub timeformat: Option<String>,
    pub timeformat_extended: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Overrides {
    /// Load one layer from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    /// Layer `self` over `base`; fields present in `self` win.
    fn over(self, base: Self) -> Self {
        Self {
            server: self.server.or(base.server),
            port: self.port.or(base.port),
            channel: self.channel.or(base.channel),
            nick: self.nick.or(base.nick),
            user: self.user.or(base.user),
            realname: self.realname.or(base.realname),
            output: self.output.or(base.output),
            kill_password: self.kill_password.or(base.kill_password),
            server_password: self.server_password.or(base.server_password),
            admin: self.admin.or(base.admin),
            timeformat: self.timeformat.or(base.timeformat),
            timeformat_extended: self.timeformat_extended.or(base.timeformat_extended),
        }
    }
}

impl Config {
    /// Resolve CLI flags over an optional init file over defaults.
    ///
    /// The channel may be given with or without its `#`; it is stored
    /// normalized with the sigil.
    pub fn from_layers(cli: Overrides, file: Option<Overrides>) -> Self {
        let merged = cli.over(file.unwrap_or_default());
        let channel = merged.channel.unwrap_or_else(|| "chanscribe".into());
        Self {
            server: merged.server.unwrap_or_else(|| "localhost".into()),
            port: merged.port.unwrap_or(6667),
            channel: format!("#{}", channel.trim_start_matches('#')),
            nick: merged.nick.unwrap_or_else(|| "chanscribe".into()),
            user: merged.user.unwrap_or_else(|| "chanscribe".into()),
            realname: merged.realname.unwrap_or_else(|| "chanscribe".into()),
            output: merged.output.unwrap_or_else(|| "chanscribe.log".into()),
            kill_password: merged.kill_password,
            server_password: merged.server_password,
            admin: merged.admin,
            timeformat: merged.timeformat.unwrap_or_else(|| "%H:%M:%S".into()),
            timeformat_extended: merged
                .timeformat_extended
                .unwrap_or_else(|| "%Y-%m-%d %H:%M:%S".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_when_nothing_is_given() {
        let config = Config::from_layers(Overrides::default(), None);
        assert_eq!(config.server, "localhost");
        assert_eq!(config.port, 6667);
        assert_eq!(config.channel, "#chanscribe");
        assert_eq!(config.nick, "chanscribe");
        assert_eq!(config.output, PathBuf::from("chanscribe.log"));
        assert_eq!(config.kill_password, None);
        assert_eq!(config.timeformat, "%H:%M:%S");
    }

    #[test]
    fn channel_sigil_is_normalized() {
        let with = Overrides {
            channel: Some("#lobby".into()),
            ..Overrides::default()
        };
        let without = Overrides {
            channel: Some("lobby".into()),
            ..Overrides::default()
        };
        assert_eq!(Config::from_layers(with, None).channel, "#lobby");
        assert_eq!(Config::from_layers(without, None).channel, "#lobby");
    }

    #[test]
    fn cli_layer_wins_over_file_layer() {
        let cli = Overrides {
            nick: Some("fromcli".into()),
            ..Overrides::default()
        };
        let file = Overrides {
            nick: Some("fromfile".into()),
            port: Some(6697),
            ..Overrides::default()
        };
        let config = Config::from_layers(cli, Some(file));
        assert_eq!(config.nick, "fromcli");
        assert_eq!(config.port, 6697);
    }

    #[test]
    fn load_parses_toml_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.toml");
        std::fs::write(
            &path,
            "server = \"irc.example.net\"\nchannel = \"lobby\"\nkill_password = \"sekrit\"\n",
        )
        .unwrap();

        let layer = Overrides::load(&path).unwrap();
        let config = Config::from_layers(layer, None);
        assert_eq!(config.server, "irc.example.net");
        assert_eq!(config.channel, "#lobby");
        assert_eq!(config.kill_password.as_deref(), Some("sekrit"));
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("init.toml");
        std::fs::write(&path, "serverr = \"typo\"\n").unwrap();
        assert!(matches!(
            Overrides::load(&path),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        assert!(matches!(
            Overrides::load(Path::new("/nonexistent/init.toml")),
            Err(ConfigError::Read(_))
        ));
    }
}
