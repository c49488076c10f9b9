//! Per-session state — user records and the global last chat line.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

/// Everything remembered about one observed nickname.
///
/// Created lazily on first sight, mutated in place, lives as long as the
/// session — there is no eviction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    /// Nicknames this origin has been seen under.
    pub nicks: BTreeSet<String>,
    /// Channels the user was last associated with.
    pub channels: BTreeSet<String>,
    /// Last conversational message (commands are not recorded).
    pub last_message: Option<String>,
    /// When the user last chatted.
    pub seen: Option<DateTime<Utc>>,
    /// When the user was last active at all, commands included.
    pub active: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn new(nick: &str) -> Self {
        Self {
            nicks: BTreeSet::from([nick.to_owned()]),
            ..Self::default()
        }
    }

    /// Record a conversational message: text, timestamps, channel targets.
    pub fn observe<'a>(
        &mut self,
        channels: impl IntoIterator<Item = &'a str>,
        text: &str,
        now: DateTime<Utc>,
    ) {
        self.channels.extend(channels.into_iter().map(str::to_owned));
        self.last_message = Some(text.to_owned());
        self.seen = Some(now);
        self.active = Some(now);
    }

    /// Record command activity only — dispatched text is not conversation,
    /// so last message, seen time and channels stay untouched.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.active = Some(now);
    }
}

/// State for one live connection. Mutated only by the event loop and the
/// handlers it invokes synchronously.
#[derive(Debug, Default)]
pub struct SessionState {
    users: HashMap<String, UserRecord>,
    /// Most recent conversational line, session-global.
    pub last_message: Option<String>,
    /// Set by the kill command; the event loop checks it per message.
    pub should_quit: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, nick: &str) -> Option<&UserRecord> {
        self.users.get(nick)
    }

    /// Look up or lazily create the record for a nickname.
    pub fn user_mut(&mut self, nick: &str) -> &mut UserRecord {
        self.users
            .entry(nick.to_owned())
            .or_insert_with(|| UserRecord::new(nick))
    }
}
