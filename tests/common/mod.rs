//! In-memory stand-in for an MPD connection.
//!
//! State lives behind an `Rc` so a test can keep a handle for inspection
//! while the code under test owns the connection.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use shuffled::error::{Error, Result};
use shuffled::mpd::{
    Authorization, IdleEventSet, MetadataOption, Mpd, PasswordStatus, Song, Status,
};

#[derive(Default)]
pub struct State {
    /// Songs the fake server's database holds.
    pub library: Vec<Song>,
    /// URIs added to the queue, in order.
    pub queue: Vec<String>,
    /// Queue position of the current song.
    pub position: Option<usize>,
    pub playing: bool,
    pub single: bool,
    /// Scripted idle results, consumed front to back.
    pub idle_script: VecDeque<IdleEventSet>,
    /// The password the server accepts, if any.
    pub accepted_password: Option<String>,
    /// Every password applied to the connection, accepted or not.
    pub applied_passwords: Vec<String>,
    /// Commands the session may not run until the accepted password is
    /// applied.
    pub disallowed: Vec<String>,
    pub pause_calls: usize,
    pub play_at_calls: Vec<usize>,
    /// Metadata option of the most recent `list_all`.
    pub last_metadata: Option<MetadataOption>,
}

#[derive(Clone, Default)]
pub struct FakeMpd {
    state: Rc<RefCell<State>>,
}

impl FakeMpd {
    pub fn new(state: State) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&State) -> R) -> R {
        f(&self.state.borrow())
    }

    pub fn with_mut<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }
}

impl Mpd for FakeMpd {
    fn current_status(&mut self) -> Result<Status> {
        let state = self.state.borrow();
        Ok(Status {
            queue_length: state.queue.len(),
            song_position: state.position,
            single: state.single,
            playing: state.playing,
        })
    }

    fn list_all(
        &mut self,
        metadata: MetadataOption,
    ) -> Result<Box<dyn Iterator<Item = Result<Song>> + '_>> {
        let mut state = self.state.borrow_mut();
        state.last_metadata = Some(metadata);

        let songs: Vec<Song> = state
            .library
            .iter()
            .map(|song| match metadata {
                MetadataOption::Include => song.clone(),
                MetadataOption::Omit => Song::new(song.uri(), []),
            })
            .collect();
        Ok(Box::new(songs.into_iter().map(Ok)))
    }

    fn add(&mut self, uri: &str) -> Result<()> {
        self.state.borrow_mut().queue.push(uri.to_string());
        Ok(())
    }

    fn play_at(&mut self, position: usize) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.play_at_calls.push(position);
        state.position = Some(position);
        state.playing = true;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.state.borrow_mut().playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.pause_calls += 1;
        state.playing = false;
        Ok(())
    }

    fn idle(&mut self, _mask: IdleEventSet) -> Result<IdleEventSet> {
        self.state
            .borrow_mut()
            .idle_script
            .pop_front()
            .ok_or_else(|| Error::Protocol("idle script exhausted".to_string()))
    }

    fn apply_password(&mut self, password: &str) -> Result<PasswordStatus> {
        let mut state = self.state.borrow_mut();
        state.applied_passwords.push(password.to_string());

        if state.accepted_password.as_deref() == Some(password) {
            state.disallowed.clear();
            Ok(PasswordStatus::Accepted)
        } else {
            Ok(PasswordStatus::Rejected)
        }
    }

    fn check_commands(&mut self, commands: &[&str]) -> Result<Authorization> {
        let state = self.state.borrow();
        let missing: Vec<String> = commands
            .iter()
            .filter(|command| state.disallowed.iter().any(|d| d == *command))
            .map(ToString::to_string)
            .collect();
        Ok(Authorization {
            authorized: missing.is_empty(),
            missing,
        })
    }
}
