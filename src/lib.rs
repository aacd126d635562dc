//! Continuous random queueing client for MPD.
//!
//! `shuffled` keeps an MPD queue topped up with randomly picked songs. It
//! never repeats a song too soon (a bounded-window shuffle), supports
//! exclusion rules matched against song metadata, can group songs so that a
//! whole album is queued at once, and keeps a configurable buffer of
//! upcoming songs so queue-lookahead features like crossfade keep working.
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod connect;
pub mod error;
pub mod getpass;
pub mod load;
pub mod mpd;
pub mod queue;
pub mod rule;
pub mod shuffle;
