//! Per-entity state: listeners, artists and hosts, plus the [`Roster`] that
//! owns all of them.
//!
//! Every profile exclusively owns its counters. Operations that cross entity
//! boundaries (crediting an artist from a listener's history) borrow the
//! target explicitly through the roster.

use crate::catalog::{Announcement, Event, Merchandise, Playlist, Song};
use crate::counter::RankedCounter;
use crate::history::{NavigationHistory, Page};
use crate::notify::{EventKind, Mailbox, Subscribers};
use crate::playback::PlayContext;
use crate::recommend::Recommendations;
use serde::{Deserialize, Serialize};

/// The three kinds of accounts on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    User,
    Artist,
    Host,
}

/// Plays a non-premium listener made, kept for ad revenue settlement.
#[derive(Debug, Clone, Default)]
pub struct AdHistory {
    pub songs: RankedCounter,
    pub artists: RankedCounter,
}

impl AdHistory {
    pub fn clear(&mut self) {
        self.songs.clear();
        self.artists.clear();
    }
}

/// Reference to a playlist owned by another listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ListenerProfile {
    pub username: String,
    pub premium: bool,
    pub has_statistics: bool,

    pub top_songs: RankedCounter,
    pub top_albums: RankedCounter,
    pub top_artists: RankedCounter,
    pub top_genres: RankedCounter,
    pub top_episodes: RankedCounter,

    /// Plays made while premium, keyed by song name.
    pub premium_history_song: RankedCounter,
    /// Plays made while premium, keyed by artist name.
    pub premium_history_artist: RankedCounter,
    pub ad_history: AdHistory,
    /// Price of the ad break waiting to be played, zero when none.
    pub ad_price: u32,

    pub liked_songs: Vec<Song>,
    pub playlists: Vec<Playlist>,
    pub followed: Vec<PlaylistRef>,
    pub merch: Vec<String>,

    pub playback: Option<PlayContext>,
    pub page: Page,
    pub history: NavigationHistory<Page>,
    pub mailbox: Mailbox,
    pub recommendations: Recommendations,
}

impl ListenerProfile {
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            premium: false,
            has_statistics: false,
            top_songs: RankedCounter::new(),
            top_albums: RankedCounter::new(),
            top_artists: RankedCounter::new(),
            top_genres: RankedCounter::new(),
            top_episodes: RankedCounter::new(),
            premium_history_song: RankedCounter::new(),
            premium_history_artist: RankedCounter::new(),
            ad_history: AdHistory::default(),
            ad_price: 0,
            liked_songs: Vec::new(),
            playlists: Vec::new(),
            followed: Vec::new(),
            merch: Vec::new(),
            playback: None,
            page: Page::Home,
            history: NavigationHistory::new(),
            mailbox: Mailbox::default(),
            recommendations: Recommendations::default(),
        }
    }

    #[must_use]
    pub fn playlist(&self, name: &str) -> Option<&Playlist> {
        self.playlists.iter().find(|p| p.name == name)
    }

    /// Likes the song, or unlikes it if already liked. Returns `true` when liked.
    pub fn toggle_like(&mut self, song: &Song) -> bool {
        match self.liked_songs.iter().position(|s| s == song) {
            Some(index) => {
                self.liked_songs.remove(index);
                false
            }
            None => {
                self.liked_songs.push(song.clone());
                true
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArtistProfile {
    pub username: String,
    pub has_statistics: bool,
    /// One-way flag: set by the first play or merch sale, never reset.
    pub listened: bool,

    pub top_songs: RankedCounter,
    pub top_albums: RankedCounter,
    pub top_fans: RankedCounter,
    /// Incremented once per play event, not per distinct listener. Internal
    /// tally only: wrapped reports the number of distinct fans instead.
    pub listeners: u64,

    pub song_revenue: f64,
    pub merch_revenue: f64,
    /// `song_revenue + merch_revenue` as of the last ranking pass.
    pub total_revenue: f64,
    pub ranking: Option<usize>,
    pub most_profitable_song: String,
    pub profit_for_each_song: RankedCounter<f64>,

    pub merch: Vec<Merchandise>,
    pub events: Vec<Event>,
    pub subscribers: Subscribers,
}

impl ArtistProfile {
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            has_statistics: false,
            listened: false,
            top_songs: RankedCounter::new(),
            top_albums: RankedCounter::new(),
            top_fans: RankedCounter::new(),
            listeners: 0,
            song_revenue: 0.0,
            merch_revenue: 0.0,
            total_revenue: 0.0,
            ranking: None,
            most_profitable_song: "N/A".to_string(),
            profit_for_each_song: RankedCounter::new(),
            merch: Vec::new(),
            events: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }

    #[must_use]
    pub fn merch_item(&self, name: &str) -> Option<&Merchandise> {
        self.merch.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct HostProfile {
    pub username: String,
    pub top_episodes: RankedCounter,
    /// Plays per listener username.
    pub listeners: RankedCounter,
    pub announcements: Vec<Announcement>,
    pub subscribers: Subscribers,
}

impl HostProfile {
    #[must_use]
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            top_episodes: RankedCounter::new(),
            listeners: RankedCounter::new(),
            announcements: Vec::new(),
            subscribers: Subscribers::default(),
        }
    }
}

/// Registry of every account, in registration order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    pub listeners: Vec<ListenerProfile>,
    pub artists: Vec<ArtistProfile>,
    pub hosts: Vec<HostProfile>,
}

impl Roster {
    #[must_use]
    pub fn kind_of(&self, username: &str) -> Option<UserKind> {
        if self.listener(username).is_some() {
            Some(UserKind::User)
        } else if self.artist(username).is_some() {
            Some(UserKind::Artist)
        } else if self.host(username).is_some() {
            Some(UserKind::Host)
        } else {
            None
        }
    }

    #[must_use]
    pub fn listener(&self, username: &str) -> Option<&ListenerProfile> {
        self.listeners.iter().find(|l| l.username == username)
    }

    pub fn listener_mut(&mut self, username: &str) -> Option<&mut ListenerProfile> {
        self.listeners.iter_mut().find(|l| l.username == username)
    }

    #[must_use]
    pub fn artist(&self, username: &str) -> Option<&ArtistProfile> {
        self.artists.iter().find(|a| a.username == username)
    }

    pub fn artist_mut(&mut self, username: &str) -> Option<&mut ArtistProfile> {
        self.artists.iter_mut().find(|a| a.username == username)
    }

    #[must_use]
    pub fn host(&self, username: &str) -> Option<&HostProfile> {
        self.hosts.iter().find(|h| h.username == username)
    }

    pub fn host_mut(&mut self, username: &str) -> Option<&mut HostProfile> {
        self.hosts.iter_mut().find(|h| h.username == username)
    }

    /// Splits the roster into one listener and every creator, so a play can
    /// update both sides at once.
    pub fn split_for(
        &mut self,
        listener: &str,
    ) -> Option<(&mut ListenerProfile, &mut [ArtistProfile], &mut [HostProfile])> {
        let Roster {
            listeners,
            artists,
            hosts,
        } = self;
        let listener = listeners.iter_mut().find(|l| l.username == listener)?;
        Some((listener, artists.as_mut_slice(), hosts.as_mut_slice()))
    }

    /// Resolves a followed playlist.
    #[must_use]
    pub fn playlist(&self, reference: &PlaylistRef) -> Option<&Playlist> {
        self.listener(&reference.owner)?.playlist(&reference.name)
    }

    /// Appends a notification to the mailbox of every subscriber of `creator`.
    pub fn notify_subscribers(&mut self, creator: &str, kind: EventKind, message: &str) {
        let subscribers: Vec<String> = match (self.artist(creator), self.host(creator)) {
            (Some(artist), _) => artist.subscribers.iter().map(str::to_string).collect(),
            (None, Some(host)) => host.subscribers.iter().map(str::to_string).collect(),
            (None, None) => return,
        };
        for name in subscribers {
            if let Some(listener) = self.listener_mut(&name) {
                listener.mailbox.push(kind, message.to_string());
            }
        }
    }
}
