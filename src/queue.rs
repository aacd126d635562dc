//! The enqueue controller and the main event loop.
//!
//! All decisions derive from a fresh [`Status`](crate::mpd::Status)
//! snapshot fetched on demand; nothing about the player is cached between
//! events, so external queue edits cannot drift our bookkeeping. The only
//! blocking point is the server's `idle` long poll.

use crate::config::Config;
use crate::error::Result;
use crate::load::LibraryLoader;
use crate::mpd::{IdleEvent, IdleEventSet, Mpd};
use crate::shuffle::ShuffleChain;

/// Hook checked between idle waits. The loop keeps running while it returns
/// `true`; tests use it to bound the loop.
pub type UntilFn<'a> = &'a mut dyn FnMut() -> bool;

/// Kicks playback off at startup: when the player is already going this
/// does nothing, otherwise it queues one pick and plays it.
pub fn try_first<C>(mpd: &mut C, chain: &mut ShuffleChain) -> Result<()>
where
    C: Mpd,
{
    let status = mpd.current_status()?;
    if status.playing {
        return Ok(());
    }

    let item = chain.pick().clone();
    mpd.add_item(&item)?;
    // The pre-add queue length is the zero-based position of the item we
    // just added.
    mpd.play_at(status.queue_length)?;
    Ok(())
}

/// Tops the queue back up after a queue or player event.
///
/// With a queue buffer configured, enough items are added to keep
/// `queue_buffer` songs after the current one; without one, a single item
/// is added once the queue runs out. When the player had run past the end
/// of the queue (or the queue was empty), playback is restarted at the
/// first newly added item, and immediately paused again if single mode is
/// on, which would otherwise stop playback right after this song anyway.
pub fn try_enqueue<C>(mpd: &mut C, chain: &mut ShuffleChain, config: &Config) -> Result<()>
where
    C: Mpd,
{
    let status = mpd.current_status()?;

    // We are "past" the last song when there is no current position.
    let past_last = status.song_position.is_none();
    let queue_empty = status.queue_length == 0;

    // +1 because the position is zero-based. Saturating so a malformed
    // status with a position past the queue length cannot wrap.
    let remaining = status
        .song_position
        .map_or(0, |position| status.queue_length.saturating_sub(position + 1));

    let should_add = past_last || queue_empty || remaining < config.queue_buffer;
    if !should_add {
        return Ok(());
    }

    if config.queue_buffer > 0 {
        let mut wanted = config.queue_buffer;
        // Not currently "on" a song, so the pick that is about to play
        // also counts.
        if past_last || queue_empty {
            wanted += 1;
        }
        for _ in remaining..wanted {
            let item = chain.pick().clone();
            mpd.add_item(&item)?;
        }
    } else {
        let item = chain.pick().clone();
        mpd.add_item(&item)?;
    }

    if past_last || queue_empty {
        // The status snapshot predates our additions, so its queue length
        // is the position of the first item added this round.
        mpd.play_at(status.queue_length)?;
        if status.single {
            mpd.pause()?;
        }
    }
    Ok(())
}

/// Runs the steady-state loop: block on `idle`, reload the pool on library
/// changes, top up the queue on queue and player changes. Never returns in
/// normal operation unless `--exit-on-db-update` is set or `until` says to
/// stop.
pub fn run<C>(
    mpd: &mut C,
    chain: &mut ShuffleChain,
    config: &Config,
    mut until: Option<UntilFn<'_>>,
) -> Result<()>
where
    C: Mpd,
{
    let mask = IdleEventSet::new(&[IdleEvent::Database, IdleEvent::Queue, IdleEvent::Player]);

    if config.play_on_startup {
        try_first(mpd, chain)?;
        try_enqueue(mpd, chain, config)?;
    }

    loop {
        if let Some(until) = until.as_mut() {
            if !until() {
                return Ok(());
            }
        }

        let events = mpd.idle(mask)?;
        trace!("idle woke with {events:?}");

        if events.contains(IdleEvent::Database) && config.exit_on_db_update {
            println!("Database updated, exiting.");
            return Ok(());
        }

        if events.contains(IdleEvent::Database) && config.file.is_none() {
            // Our pool came from the library, so rebuild it. A static file
            // list is left alone; the user is stuck with the URIs we
            // parsed the first time.
            chain.clear();
            LibraryLoader::new(&config.ruleset, &config.group_by).load(mpd, chain)?;
            println!("{}", pool_size_message(chain));
        } else if events.contains(IdleEvent::Queue) || events.contains(IdleEvent::Player) {
            try_enqueue(mpd, chain, config)?;
        }
    }
}

/// The user-facing pool size report, accounting for grouping.
#[must_use]
pub fn pool_size_message(chain: &ShuffleChain) -> String {
    if chain.is_empty() {
        return "Song pool is empty.".to_string();
    }
    if chain.len() == chain.len_uris() {
        format!("Picking random songs out of a pool of {}.", chain.len())
    } else {
        format!(
            "Picking from {} groups ({} songs).",
            chain.len(),
            chain.len_uris()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shuffle::ShuffleChain;

    #[test]
    fn pool_size_messages() {
        let mut chain = ShuffleChain::new(1);
        assert_eq!(pool_size_message(&chain), "Song pool is empty.");

        chain.add("a");
        chain.add("b");
        assert_eq!(
            pool_size_message(&chain),
            "Picking random songs out of a pool of 2."
        );

        chain.add(vec!["c".to_string(), "d".to_string()]);
        assert_eq!(pool_size_message(&chain), "Picking from 3 groups (4 songs).");
    }
}
