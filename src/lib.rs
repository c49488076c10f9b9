//! chanscribe — an IRC channel-logging bot.
//!
//! Connects to one server, joins one channel, logs every chat message to
//! a file, and answers a small set of dot-commands (`.help`, `.last`,
//! `.user`, `.version`, `.flush`, `.kill`) plus CTCP VERSION. The
//! protocol layer lives in [`irc`]; [`config`] and [`logfile`] are the
//! configuration and durable-output seams around it.

pub mod config;
pub mod irc;
pub mod logfile;
