//! The "now playing" context of a listener.
//!
//! Encore does not run an audio engine. A [`PlayContext`] only records what
//! was loaded, from which kind of source, and when it started, so that the
//! playback position can be derived from the simulation clock.

use crate::catalog::{Episode, Song};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Where the current track comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceType {
    Library,
    Playlist,
    Podcast,
    Album,
}

impl SourceType {
    /// Whether this source plays songs (everything except podcasts).
    #[must_use]
    pub const fn plays_songs(self) -> bool {
        !matches!(self, SourceType::Podcast)
    }
}

impl FromStr for SourceType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "library" | "song" => Ok(SourceType::Library),
            "playlist" => Ok(SourceType::Playlist),
            "podcast" => Ok(SourceType::Podcast),
            "album" => Ok(SourceType::Album),
            other => Err(anyhow!("Unexpected source type: {other}")),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceType::Library => "LIBRARY",
            SourceType::Playlist => "PLAYLIST",
            SourceType::Podcast => "PODCAST",
            SourceType::Album => "ALBUM",
        };
        f.write_str(name)
    }
}

/// The audio file currently loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioItem {
    Song(Song),
    Episode(Episode),
}

impl AudioItem {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            AudioItem::Song(song) => &song.name,
            AudioItem::Episode(episode) => &episode.name,
        }
    }

    #[must_use]
    pub fn duration(&self) -> u32 {
        match self {
            AudioItem::Song(song) => song.duration,
            AudioItem::Episode(episode) => episode.duration,
        }
    }
}

/// Elapsed/remaining seconds of the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub duration: u32,
    pub remaining: u32,
}

impl Position {
    #[must_use]
    pub const fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }
}

/// What a listener is playing right now.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayContext {
    pub source_type: SourceType,
    pub item: AudioItem,
    /// Album, playlist or podcast name; `None` for a single library song.
    pub collection: Option<String>,
    /// Owner of the collection (artist, playlist owner or host).
    pub owner: Option<String>,
    /// Tracks of the collection that come after `item`.
    pub upcoming: VecDeque<AudioItem>,
    /// Clock value at which `item` started.
    pub started_at: u64,
    /// Set while an inserted ad plays in place of the collection. Anything
    /// recorded before the collection resumes is bookkeeping, not a play.
    pub returning_from_ad: bool,
    /// Clock value at which the inserted ad ends.
    pub ad_until: Option<u64>,
}

impl PlayContext {
    #[must_use]
    pub fn new(source_type: SourceType, item: AudioItem, started_at: u64) -> Self {
        Self {
            source_type,
            item,
            collection: None,
            owner: None,
            upcoming: VecDeque::new(),
            started_at,
            returning_from_ad: false,
            ad_until: None,
        }
    }

    #[must_use]
    pub fn with_collection(mut self, name: &str, owner: &str) -> Self {
        self.collection = Some(name.to_string());
        self.owner = Some(owner.to_string());
        self
    }

    /// Queues the rest of the collection behind the current item.
    #[must_use]
    pub fn with_upcoming(mut self, tracks: impl IntoIterator<Item = AudioItem>) -> Self {
        self.upcoming = tracks.into_iter().collect();
        self
    }

    /// Clock value at which the current item, or the ad playing after it,
    /// finishes.
    #[must_use]
    pub fn ends_at(&self) -> u64 {
        self.ad_until
            .unwrap_or_else(|| self.started_at + u64::from(self.item.duration()))
    }

    #[must_use]
    pub fn in_ad_break(&self) -> bool {
        self.ad_until.is_some()
    }

    /// Plays an ad of `duration` seconds from `at`. The collection resumes
    /// with its next track once the ad ends.
    pub fn insert_ad(&mut self, at: u64, duration: u32) {
        self.ad_until = Some(at + u64::from(duration));
        self.returning_from_ad = true;
    }

    /// Moves to the next track, started at `at`, cutting any ad short.
    /// Returns `false` when the collection is exhausted, leaving the context
    /// unchanged.
    pub fn advance(&mut self, at: u64) -> bool {
        let Some(next) = self.upcoming.pop_front() else {
            return false;
        };
        self.item = next;
        self.started_at = at;
        self.returning_from_ad = false;
        self.ad_until = None;
        true
    }

    /// Position at clock value `now`, clamped to the track length.
    #[must_use]
    pub fn position(&self, now: u64) -> Position {
        let duration = self.item.duration();
        let played = now.saturating_sub(self.started_at);
        let elapsed = u32::try_from(played).unwrap_or(u32::MAX).min(duration);
        Position {
            duration,
            remaining: duration - elapsed,
        }
    }

    #[must_use]
    pub fn song(&self) -> Option<&Song> {
        match &self.item {
            AudioItem::Song(song) => Some(song),
            AudioItem::Episode(_) => None,
        }
    }
}
