//! Durable channel log — the output side of the bot.
//!
//! One line per logged chat message, flushed immediately so a crash never
//! loses traffic that was already acknowledged on the wire. Write failures
//! propagate; the bot treats them as fatal.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

/// Line-oriented log file, truncated on open.
#[derive(Debug)]
pub struct ChannelLog {
    file: File,
}

impl ChannelLog {
    pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self { file })
    }

    /// Append one line and flush.
    pub fn write(&mut self, line: &str) -> io::Result<()> {
        debug!(%line, "logging");
        writeln!(self.file, "{line}")?;
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lines_are_written_and_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.log");
        let mut log = ChannelLog::create(&path).unwrap();
        log.write("<12:00:00> nick (#chan): hello").unwrap();
        log.write("shutdown at 12:00:01").unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "<12:00:00> nick (#chan): hello\nshutdown at 12:00:01\n"
        );
    }

    #[test]
    fn create_truncates_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chan.log");
        std::fs::write(&path, "stale\n").unwrap();
        let _log = ChannelLog::create(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
