//! IRC message parsing.
//!
//! Implements the RFC 2812 line shape:
//!   [`:`origin SPACE] verb [SPACE params]
//!
//! Lines arrive with the `\r\n` terminator already stripped by the framer.
//! The params portion is kept verbatim — a PRIVMSG's params are decomposed
//! separately by [`Privmsg::parse`].

/// A parsed inbound IRC line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Optional origin (server name or `nick!user@host`).
    pub origin: Option<String>,
    /// The verb (e.g. `PRIVMSG`, `PING`, `001`). May be empty for a
    /// degenerate-but-accepted blank line; nothing dispatches on it.
    pub verb: String,
    /// Everything after the verb's separating space, spaces included.
    pub params: String,
}

/// Errors from [`Message::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// `:` immediately followed by whitespace — RFC 2812 2.3 requires no
    /// gap between the colon and the origin.
    #[error("origin marker followed by whitespace")]
    EmptyOrigin,
    /// `:` with no space anywhere after it, so the origin never ends.
    #[error("origin marker with no terminating space")]
    UnterminatedOrigin,
}

impl Message {
    /// Parse one complete line (terminator already stripped).
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let (origin, rest) = match line.strip_prefix(':') {
            Some(after) => match after.find(' ') {
                Some(0) => return Err(ParseError::EmptyOrigin),
                None => return Err(ParseError::UnterminatedOrigin),
                Some(idx) => (Some(after[..idx].to_owned()), &after[idx + 1..]),
            },
            None => (None, line),
        };

        let (verb, params) = match rest.find(' ') {
            Some(idx) => (&rest[..idx], &rest[idx + 1..]),
            None => (rest, ""),
        };

        Ok(Message {
            origin,
            verb: verb.to_owned(),
            params: params.to_owned(),
        })
    }

    /// The nickname part of the origin (`nick!user@host` → `nick`).
    pub fn origin_nick(&self) -> Option<&str> {
        self.origin
            .as_deref()
            .map(|o| o.split('!').next().unwrap_or(o))
            .filter(|n| !n.is_empty())
    }
}

/// The decomposed params of a PRIVMSG: addressees and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Privmsg {
    /// Destination identifiers — channels (`#`-prefixed) or nicknames.
    pub targets: Vec<String>,
    pub text: String,
}

/// Errors from [`Privmsg::parse`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// No space in the params, so there is no text segment at all.
    #[error("chat params carry no text segment")]
    MissingText,
}

impl Privmsg {
    /// Decompose a PRIVMSG params string into targets and text.
    ///
    /// Targets are the token before the first space, split on `,`. A
    /// leading `:` on the remainder marks a trailing parameter — the rest
    /// of the line, spaces included. Without it only the single next
    /// token is the text (RFC 2812 middle-parameter rule).
    pub fn parse(params: &str) -> Result<Self, PayloadError> {
        let (target_spec, rest) = params.split_once(' ').ok_or(PayloadError::MissingText)?;
        let targets = target_spec.split(',').map(str::to_owned).collect();
        let text = match rest.strip_prefix(':') {
            Some(trailing) => trailing.to_owned(),
            None => rest.split(' ').next().unwrap_or_default().to_owned(),
        };
        Ok(Privmsg { targets, text })
    }

    /// Whether any target is a channel (leading `#`).
    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .map(String::as_str)
            .filter(|t| t.starts_with('#'))
    }
}
