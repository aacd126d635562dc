//! Types and traits for talking to an MPD server.
//!
//! The rest of the crate is written against the [`Mpd`] trait rather than a
//! concrete connection. Song and status data are copied out of the protocol
//! layer into plain owned values, so nothing here borrows from a live
//! connection. The real TCP implementation lives in [`crate::client`]; the
//! integration tests substitute an in-memory fake.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::shuffle::Item;

/// Metadata fields MPD can attach to a song.
///
/// This mirrors the tag names MPD itself understands. Tag names parse
/// case-insensitively, like libmpdclient's `mpd_tag_name_iparse`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Artist,
    ArtistSort,
    Album,
    AlbumSort,
    AlbumArtist,
    AlbumArtistSort,
    Title,
    Track,
    Name,
    Genre,
    Date,
    Composer,
    Performer,
    Comment,
    Disc,
    Label,
}

impl Tag {
    /// All known tags, in MPD's canonical order.
    pub const ALL: [Tag; 16] = [
        Tag::Artist,
        Tag::ArtistSort,
        Tag::Album,
        Tag::AlbumSort,
        Tag::AlbumArtist,
        Tag::AlbumArtistSort,
        Tag::Title,
        Tag::Track,
        Tag::Name,
        Tag::Genre,
        Tag::Date,
        Tag::Composer,
        Tag::Performer,
        Tag::Comment,
        Tag::Disc,
        Tag::Label,
    ];

    /// The tag name as it appears on the wire.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Tag::Artist => "Artist",
            Tag::ArtistSort => "ArtistSort",
            Tag::Album => "Album",
            Tag::AlbumSort => "AlbumSort",
            Tag::AlbumArtist => "AlbumArtist",
            Tag::AlbumArtistSort => "AlbumArtistSort",
            Tag::Title => "Title",
            Tag::Track => "Track",
            Tag::Name => "Name",
            Tag::Genre => "Genre",
            Tag::Date => "Date",
            Tag::Composer => "Composer",
            Tag::Performer => "Performer",
            Tag::Comment => "Comment",
            Tag::Disc => "Disc",
            Tag::Label => "Label",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Tag::ALL
            .iter()
            .find(|tag| tag.name().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| Error::UnknownTag(s.to_string()))
    }
}

/// A song copied out of a server response: its URI plus whatever tags the
/// server sent along.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    uri: String,
    tags: HashMap<Tag, String>,
}

impl Song {
    #[must_use]
    pub fn new<U, T>(uri: U, tags: T) -> Self
    where
        U: Into<String>,
        T: IntoIterator<Item = (Tag, String)>,
    {
        Self {
            uri: uri.into(),
            tags: tags.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The song's value for `tag`, or `None` when the tag is absent.
    #[must_use]
    pub fn tag(&self, tag: Tag) -> Option<&str> {
        self.tags.get(&tag).map(String::as_str)
    }

    pub(crate) fn set_tag(&mut self, tag: Tag, value: String) {
        self.tags.insert(tag, value);
    }
}

/// Player state snapshot, as reported by the `status` command.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    /// Number of songs in the queue.
    pub queue_length: usize,
    /// Queue position of the current song. `None` means the player has run
    /// past the end of the queue, or the queue is empty.
    pub song_position: Option<usize>,
    /// True when MPD's single mode is on.
    pub single: bool,
    /// True when the player is playing (not paused or stopped).
    pub playing: bool,
}

/// Subsystems the `idle` command can wait on.
///
/// MPD reports queue changes on the `playlist` subsystem; the `Queue` name
/// here matches what the event means for us.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdleEvent {
    Database,
    Queue,
    Player,
}

impl IdleEvent {
    fn bit(self) -> u8 {
        match self {
            IdleEvent::Database => 1,
            IdleEvent::Queue => 1 << 1,
            IdleEvent::Player => 1 << 2,
        }
    }

    /// The subsystem name used on the wire.
    #[must_use]
    pub fn subsystem(self) -> &'static str {
        match self {
            IdleEvent::Database => "database",
            IdleEvent::Queue => "playlist",
            IdleEvent::Player => "player",
        }
    }

    /// Maps a wire subsystem name back to an event, if it is one we track.
    #[must_use]
    pub fn from_subsystem(name: &str) -> Option<Self> {
        match name {
            "database" => Some(IdleEvent::Database),
            "playlist" => Some(IdleEvent::Queue),
            "player" => Some(IdleEvent::Player),
            _ => None,
        }
    }
}

/// A small set of [`IdleEvent`]s, used both as an idle mask and as the
/// set of events an idle call reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IdleEventSet(u8);

impl IdleEventSet {
    #[must_use]
    pub fn new(events: &[IdleEvent]) -> Self {
        let mut set = Self::default();
        for event in events {
            set.add(*event);
        }
        set
    }

    pub fn add(&mut self, event: IdleEvent) {
        self.0 |= event.bit();
    }

    #[must_use]
    pub fn contains(self, event: IdleEvent) -> bool {
        self.0 & event.bit() != 0
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates over the events in this set.
    pub fn iter(self) -> impl Iterator<Item = IdleEvent> {
        [IdleEvent::Database, IdleEvent::Queue, IdleEvent::Player]
            .into_iter()
            .filter(move |event| self.contains(*event))
    }
}

/// Whether a `list_all` query should carry song metadata.
///
/// Omitting metadata is an optimization for rule-free, group-free runs
/// where only URIs are needed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MetadataOption {
    Include,
    Omit,
}

/// Outcome of applying a password to the connection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PasswordStatus {
    Accepted,
    Rejected,
}

/// Result of a required-command check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Authorization {
    /// True when the session may run every requested command.
    pub authorized: bool,
    /// The requested commands the session may not run.
    pub missing: Vec<String>,
}

/// Where an MPD server lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    pub host: String,
    pub port: u16,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Default timeout for the initial connection attempt. The idle call itself
/// is never bounded.
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(25);

/// A connection to an MPD server.
///
/// Every call except [`Mpd::idle`] is a short request/response round trip.
/// [`Mpd::idle`] blocks until one of the masked subsystems changes.
pub trait Mpd {
    /// Fetches a fresh player status snapshot.
    fn current_status(&mut self) -> Result<Status>;

    /// Streams every song in the server's database.
    ///
    /// The returned iterator is lazy and forward-only; no other command may
    /// be issued on this connection until it is dropped.
    fn list_all(
        &mut self,
        metadata: MetadataOption,
    ) -> Result<Box<dyn Iterator<Item = Result<Song>> + '_>>;

    /// Appends the song with the given URI to the queue.
    fn add(&mut self, uri: &str) -> Result<()>;

    /// Starts playback at the given queue position.
    fn play_at(&mut self, position: usize) -> Result<()>;

    /// Resumes playback.
    fn play(&mut self) -> Result<()>;

    /// Pauses playback.
    fn pause(&mut self) -> Result<()>;

    /// Blocks until one of the masked subsystems changes, returning the
    /// set of events that fired.
    fn idle(&mut self, mask: IdleEventSet) -> Result<IdleEventSet>;

    /// Applies a password to this connection.
    fn apply_password(&mut self, password: &str) -> Result<PasswordStatus>;

    /// Checks which of the given commands this session may run.
    fn check_commands(&mut self, commands: &[&str]) -> Result<Authorization>;

    /// Adds every URI in an item, in order.
    fn add_item(&mut self, item: &Item) -> Result<()> {
        for uri in item.uris() {
            self.add(uri)?;
        }
        Ok(())
    }
}
