//! Exclusion rules matched against song metadata.
//!
//! A [`Rule`] is a list of `(tag, substring)` patterns. A song is rejected
//! by a rule as soon as any pattern's tag is present on the song and the
//! lowercased tag value contains the pattern value. Matching is ASCII
//! case-insensitive substring containment; a tag absent from the song never
//! contributes a match.

use crate::mpd::{Song, Tag};

/// One `(tag, value)` matcher. The value is stored lowercased.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    pub tag: Tag,
    pub value: String,
}

/// An exclusion rule: a set of patterns that keep matching songs out of the
/// shuffle pool.
///
/// Only exclusion semantics exist. A rule with no patterns matches nothing
/// and accepts everything; callers reject such rules up front.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
    patterns: Vec<Pattern>,
}

impl Rule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True when this rule has no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns in this rule.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Adds a pattern to this rule. The value is lowercased so matching is
    /// case-insensitive.
    pub fn add_pattern(&mut self, tag: Tag, value: &str) {
        self.patterns.push(Pattern {
            tag,
            value: value.to_ascii_lowercase(),
        });
    }

    /// True when the song is not excluded by this rule.
    ///
    /// Any single matching pattern is an exclusion hit.
    #[must_use]
    pub fn accepts(&self, song: &Song) -> bool {
        for pattern in &self.patterns {
            // A song without the tag cannot match on it.
            let Some(value) = song.tag(pattern.tag) else {
                continue;
            };
            if value.to_ascii_lowercase().contains(&pattern.value) {
                return false;
            }
        }
        true
    }
}

/// True when every rule in the set accepts the song. An empty ruleset
/// accepts everything.
#[must_use]
pub fn eligible(ruleset: &[Rule], song: &Song) -> bool {
    ruleset.iter().all(|rule| rule.accepts(song))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(tags: &[(Tag, &str)]) -> Song {
        Song::new(
            "uri",
            tags.iter().map(|(tag, value)| (*tag, (*value).to_string())),
        )
    }

    #[test]
    fn empty() {
        let mut rule = Rule::new();
        assert!(rule.is_empty(), "rule with no matchers should be empty");

        rule.add_pattern(Tag::Artist, "foo fighters");
        assert!(!rule.is_empty(), "rule with matcher should not be empty");
    }

    #[test]
    fn accepts() {
        let mut rule = Rule::new();
        rule.add_pattern(Tag::Artist, "foo fighters");

        // These are exclusion rules, so a matching song is *not* accepted.
        assert!(!rule.accepts(&song(&[(Tag::Artist, "foo fighters")])));
        assert!(rule.accepts(&song(&[(Tag::Artist, "some randy")])));
    }

    #[test]
    fn pattern_is_substring() {
        let mut rule = Rule::new();
        rule.add_pattern(Tag::Artist, "foo");

        assert!(!rule.accepts(&song(&[(Tag::Artist, "foo fighters")])));
        assert!(!rule.accepts(&song(&[(Tag::Artist, "floofoofaf")])));
        assert!(rule.accepts(&song(&[(Tag::Artist, "bar")])));
    }

    #[test]
    fn pattern_case_insensitive() {
        let mut rule = Rule::new();
        rule.add_pattern(Tag::Artist, "foo");

        assert!(
            !rule.accepts(&song(&[(Tag::Artist, "fLOoFoOfaF")])),
            "failed to match substring with different case"
        );
    }

    #[test]
    fn multiple_patterns_exclude_on_any_match() {
        let mut rule = Rule::new();
        rule.add_pattern(Tag::Album, "__album__");
        rule.add_pattern(Tag::Artist, "__artist__");

        let full_match = song(&[(Tag::Artist, "__artist__"), (Tag::Album, "__album__")]);
        let artist_only = song(&[(Tag::Artist, "__artist__"), (Tag::Album, "no match")]);
        let album_only = song(&[(Tag::Artist, "no match"), (Tag::Album, "__album__")]);
        let no_match = song(&[(Tag::Artist, "no match"), (Tag::Album, "no match")]);

        // Either matching field is enough to exclude the song.
        assert!(!rule.accepts(&full_match));
        assert!(!rule.accepts(&artist_only));
        assert!(!rule.accepts(&album_only));
        assert!(rule.accepts(&no_match));
    }

    #[test]
    fn song_missing_pattern_tag() {
        let mut rule = Rule::new();
        rule.add_pattern(Tag::Album, "__album__");

        // This song does not even have an album tag.
        assert!(
            rule.accepts(&song(&[(Tag::Artist, "__artist__")])),
            "songs with missing tags should be accepted"
        );
    }

    #[test]
    fn ruleset_eligibility() {
        let mut by_artist = Rule::new();
        by_artist.add_pattern(Tag::Artist, "foo");
        let mut by_genre = Rule::new();
        by_genre.add_pattern(Tag::Genre, "podcast");

        let ruleset = vec![by_artist, by_genre];

        assert!(!eligible(&ruleset, &song(&[(Tag::Artist, "foo fighters")])));
        assert!(!eligible(&ruleset, &song(&[(Tag::Genre, "Podcast")])));
        assert!(eligible(&ruleset, &song(&[(Tag::Artist, "bar")])));
        assert!(eligible(&[], &song(&[(Tag::Artist, "foo fighters")])));
    }
}
