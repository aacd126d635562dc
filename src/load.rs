//! Populating the shuffle chain with songs.
//!
//! Three ways in: the whole server library, the library restricted to a
//! whitelist of URIs read from a file, or a file of URIs taken at face
//! value with no server round trip. The first two share the rule engine and
//! optional grouping; the third is used when rule checking is explicitly
//! disabled.

use std::collections::HashMap;
use std::io::{self, BufRead};

use crate::error::Result;
use crate::mpd::{MetadataOption, Mpd, Song, Tag};
use crate::rule::{self, Rule};
use crate::shuffle::ShuffleChain;

/// Loads songs out of the server's database, filtered by exclusion rules,
/// optionally restricted to a whitelist, optionally grouped by tags.
pub struct LibraryLoader<'a> {
    rules: &'a [Rule],
    group_by: &'a [Tag],
    /// Sorted URI whitelist; `None` means the whole library is eligible.
    whitelist: Option<Vec<String>>,
}

impl<'a> LibraryLoader<'a> {
    #[must_use]
    pub fn new(rules: &'a [Rule], group_by: &'a [Tag]) -> Self {
        Self {
            rules,
            group_by,
            whitelist: None,
        }
    }

    /// Restricts the loader to the newline-delimited URIs read from
    /// `reader`. The list is sorted once so each library song costs one
    /// binary search.
    pub fn with_whitelist<R>(rules: &'a [Rule], group_by: &'a [Tag], reader: R) -> io::Result<Self>
    where
        R: BufRead,
    {
        let mut uris = read_uri_lines(reader)?;
        uris.sort_unstable();
        Ok(Self {
            rules,
            group_by,
            whitelist: Some(uris),
        })
    }

    fn verify(&self, song: &Song) -> bool {
        if let Some(whitelist) = &self.whitelist {
            if whitelist
                .binary_search_by(|uri| uri.as_str().cmp(song.uri()))
                .is_err()
            {
                return false;
            }
        }
        rule::eligible(self.rules, song)
    }

    /// Streams the library into `chain`.
    pub fn load<C>(&self, mpd: &mut C, chain: &mut ShuffleChain) -> Result<()>
    where
        C: Mpd,
    {
        // With no rules and no grouping only URIs are needed, so spare the
        // server (and us) the metadata.
        let metadata = if self.rules.is_empty() && self.group_by.is_empty() {
            MetadataOption::Omit
        } else {
            MetadataOption::Include
        };

        let mut groups: HashMap<Vec<Option<String>>, Vec<String>> = HashMap::new();

        for song in mpd.list_all(metadata)? {
            let song = song?;
            if !self.verify(&song) {
                continue;
            }

            if self.group_by.is_empty() {
                chain.add(song.uri().to_string());
                continue;
            }

            let key: Vec<Option<String>> = self
                .group_by
                .iter()
                .map(|tag| song.tag(*tag).map(str::to_string))
                .collect();
            groups.entry(key).or_default().push(song.uri().to_string());
        }

        for uris in groups.into_values() {
            chain.add(uris);
        }
        Ok(())
    }
}

/// Loads newline-delimited URIs straight into `chain`, one singleton item
/// per line. No rules, no server round trip.
pub fn load_file<R>(reader: R, chain: &mut ShuffleChain) -> io::Result<()>
where
    R: BufRead,
{
    for uri in read_uri_lines(reader)? {
        chain.add(uri);
    }
    Ok(())
}

fn read_uri_lines<R>(reader: R) -> io::Result<Vec<String>>
where
    R: BufRead,
{
    let mut uris = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.is_empty() {
            uris.push(line);
        }
    }
    Ok(uris)
}
