//! Resolved run configuration, as consumed by the core.
//!
//! The CLI layer in `main` builds one of these from the parsed arguments;
//! the tests build them literally.

use std::path::PathBuf;

use crate::mpd::Tag;
use crate::rule::Rule;

/// Default shuffle window: how many other songs must play before a song can
/// come up again.
pub const DEFAULT_WINDOW_SIZE: usize = 7;

/// Where the song pool comes from when not using the live library.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileSource {
    /// Newline-delimited URIs read from a file.
    Path(PathBuf),
    /// Newline-delimited URIs read from standard input (`--file -`).
    Stdin,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Exclusion rules applied while loading the pool.
    pub ruleset: Vec<Rule>,
    /// Tags whose values group songs into a single queueing unit.
    pub group_by: Vec<Tag>,
    /// Shuffle window size, at least 1 in normal operation.
    pub window_size: usize,
    /// When non-zero, enqueue exactly this many items and exit instead of
    /// running the event loop.
    pub queue_only: u32,
    /// Number of songs to keep queued after the current one. 0 disables
    /// lookahead buffering.
    pub queue_buffer: usize,
    /// `None` means the live server library is the track source.
    pub file: Option<FileSource>,
    /// When false, file URIs are taken at face value, skipping both the
    /// library check and the ruleset.
    pub check_uris: bool,
    /// Host to connect to; may carry an inline `password@host`. `None`
    /// falls back to localhost.
    pub host: Option<String>,
    /// Port to connect to; `None` falls back to 6600.
    pub port: Option<u16>,
    /// Start playback at startup when the player is idle.
    pub play_on_startup: bool,
    /// Exit successfully on the first database update event.
    pub exit_on_db_update: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ruleset: Vec::new(),
            group_by: Vec::new(),
            window_size: DEFAULT_WINDOW_SIZE,
            queue_only: 0,
            queue_buffer: 0,
            file: None,
            check_uris: true,
            host: None,
            port: None,
            play_on_startup: true,
            exit_on_db_update: false,
        }
    }
}
