//! # Platform Module
//!
//! The application context of one simulation run. A [`Platform`] owns the
//! catalog, every account and the simulation clock, and exposes one method per
//! user-facing command.
//!
//! ## Lifecycle
//!
//! ```text
//! Platform::new(config) → advance_to(t) + command, repeated → end_program()
//! ```
//!
//! ## Result conventions
//!
//! - Commands that only report a status return the message as a `String`.
//!   Soft failures (unknown user, nothing playing, wrong page) are messages.
//! - Commands that return data use `Result<T, Rejection>`, where the rejection
//!   carries the message to show instead.
//! - `anyhow::Result` is reserved for broken invariants: the clock moving
//!   backwards or an inconsistent play context.

use crate::catalog::{Album, Announcement, Catalog, Episode, Event, Merchandise, Playlist, Podcast, Song};
use crate::config::SimulationConfig;
use crate::counter::Ranked;
use crate::history::{NavigationOutcome, Page};
use crate::notify::{EventKind, Notification};
use crate::playback::{AudioItem, PlayContext, SourceType};
use crate::profile::{
    ArtistProfile, HostProfile, ListenerProfile, PlaylistRef, Roster, UserKind,
};
use crate::ranking::{self, ArtistReport};
use crate::recommend::{self, Recommendation, RecommendationCheck, RecommendationType};
use crate::revenue::{self, Payout};
use crate::stats::{self, PlayRecord};
use anyhow::{bail, Result};
use log::{debug, info};
use serde::Serialize;
use std::fmt;

/// A command refused with a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection(pub String);

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Statistics snapshot of one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Wrapped {
    #[serde(rename_all = "camelCase")]
    Listener {
        top_artists: Ranked<u64>,
        top_genres: Ranked<u64>,
        top_songs: Ranked<u64>,
        top_albums: Ranked<u64>,
        top_episodes: Ranked<u64>,
    },
    #[serde(rename_all = "camelCase")]
    Artist {
        top_albums: Ranked<u64>,
        top_songs: Ranked<u64>,
        top_fans: Vec<String>,
        listeners: usize,
    },
    #[serde(rename_all = "camelCase")]
    Host {
        top_episodes: Ranked<u64>,
        listeners: usize,
    },
}

pub struct Platform {
    config: SimulationConfig,
    clock: u64,
    catalog: Catalog,
    roster: Roster,
}

impl Platform {
    #[must_use]
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            clock: 0,
            catalog: Catalog::new(),
            roster: Roster::default(),
        }
    }

    #[must_use]
    pub fn clock(&self) -> u64 {
        self.clock
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Moves the clock forward, playing through every listener's queue.
    ///
    /// Tracks that finish before `timestamp` hand over to the next one in
    /// their collection, and every such transition is recorded as a play. A
    /// pending ad is paid when its track ends and plays before the next one.
    ///
    /// # Errors
    ///
    /// Fails if `timestamp` is earlier than the current clock, or if a play
    /// context turns out to be inconsistent.
    pub fn advance_to(&mut self, timestamp: u64) -> Result<()> {
        if timestamp < self.clock {
            bail!(
                "Timestamp {timestamp} is earlier than the current time {}",
                self.clock
            );
        }
        self.clock = timestamp;
        for index in 0..self.roster.listeners.len() {
            self.play_through(index)?;
        }
        Ok(())
    }

    fn play_through(&mut self, index: usize) -> Result<()> {
        let ad_duration = self.config.ad_duration;
        let Roster {
            listeners,
            artists,
            hosts,
        } = &mut self.roster;
        let Some(listener) = listeners.get_mut(index) else {
            return Ok(());
        };

        loop {
            let Some(ends_at) = listener.playback.as_ref().map(PlayContext::ends_at) else {
                return Ok(());
            };
            if ends_at > self.clock {
                return Ok(());
            }

            let in_ad_break = listener
                .playback
                .as_ref()
                .is_some_and(PlayContext::in_ad_break);
            if !in_ad_break && listener.ad_price > 0 {
                settle_ad(listener, artists, &self.catalog);
                if let Some(ctx) = listener.playback.as_mut() {
                    ctx.insert_ad(ends_at, ad_duration);
                }
                continue;
            }
            let advanced = listener
                .playback
                .as_mut()
                .is_some_and(|ctx| ctx.advance(ends_at));
            if !advanced {
                debug!("{} finished playback", listener.username);
                listener.playback = None;
                return Ok(());
            }
            stats::record_play(listener, artists, hosts)?;
        }
    }

    /// Registers an account.
    pub fn add_user(&mut self, username: &str, kind: UserKind) -> String {
        if self.roster.kind_of(username).is_some() {
            return format!("The username {username} is already taken.");
        }
        match kind {
            UserKind::User => self.roster.listeners.push(ListenerProfile::new(username)),
            UserKind::Artist => self.roster.artists.push(ArtistProfile::new(username)),
            UserKind::Host => self.roster.hosts.push(HostProfile::new(username)),
        }
        info!("Added {kind:?} {username}");
        format!("The username {username} has been added successfully.")
    }

    fn require(&self, username: &str, kind: UserKind) -> Result<(), Rejection> {
        match self.roster.kind_of(username) {
            None => Err(Rejection(format!("The username {username} doesn't exist."))),
            Some(found) if found == kind => Ok(()),
            Some(_) => Err(Rejection(match kind {
                UserKind::User => format!("{username} is not a normal user."),
                UserKind::Artist => format!("{username} is not an artist."),
                UserKind::Host => format!("{username} is not a host."),
            })),
        }
    }

    fn listener_mut(&mut self, username: &str) -> Result<&mut ListenerProfile, Rejection> {
        self.require(username, UserKind::User)?;
        self.roster
            .listener_mut(username)
            .ok_or_else(|| Rejection(format!("The username {username} doesn't exist.")))
    }

    fn listener(&self, username: &str) -> Result<&ListenerProfile, Rejection> {
        self.require(username, UserKind::User)?;
        self.roster
            .listener(username)
            .ok_or_else(|| Rejection(format!("The username {username} doesn't exist.")))
    }

    // ---- creators ----

    /// Publishes an album. Songs take the album and artist from it.
    pub fn add_album(&mut self, artist: &str, name: &str, songs: Vec<Song>) -> String {
        if let Err(rejection) = self.require(artist, UserKind::Artist) {
            return rejection.0;
        }
        let songs = songs
            .into_iter()
            .map(|song| Song {
                album: name.to_string(),
                artist: artist.to_string(),
                ..song
            })
            .collect();
        let album = Album {
            name: name.to_string(),
            owner: artist.to_string(),
            songs,
        };
        if let Err(err) = self.catalog.add_album(album) {
            return err.to_string();
        }
        self.roster
            .notify_subscribers(artist, EventKind::NewAlbum, &format!("New Album from {artist}."));
        format!("{artist} has added new album successfully.")
    }

    pub fn add_podcast(&mut self, host: &str, name: &str, episodes: Vec<Episode>) -> String {
        if let Err(rejection) = self.require(host, UserKind::Host) {
            return rejection.0;
        }
        let podcast = Podcast {
            name: name.to_string(),
            owner: host.to_string(),
            episodes,
        };
        if let Err(err) = self.catalog.add_podcast(podcast) {
            return err.to_string();
        }
        self.roster.notify_subscribers(
            host,
            EventKind::NewPodcast,
            &format!("New Podcast from {host}."),
        );
        format!("{host} has added new podcast successfully.")
    }

    pub fn add_event(&mut self, artist: &str, event: Event) -> String {
        if let Err(rejection) = self.require(artist, UserKind::Artist) {
            return rejection.0;
        }
        let Some(profile) = self.roster.artist_mut(artist) else {
            return format!("The username {artist} doesn't exist.");
        };
        if profile.events.iter().any(|e| e.name == event.name) {
            return format!("{artist} has another event with the same name.");
        }
        profile.events.push(event);
        self.roster
            .notify_subscribers(artist, EventKind::NewEvent, &format!("New Event from {artist}."));
        format!("{artist} has added new event successfully.")
    }

    /// Adds merchandise to an artist's page. `price` comes straight from the
    /// command and may be negative.
    pub fn add_merch(&mut self, artist: &str, name: &str, description: &str, price: i64) -> String {
        if let Err(rejection) = self.require(artist, UserKind::Artist) {
            return rejection.0;
        }
        let Some(profile) = self.roster.artist_mut(artist) else {
            return format!("The username {artist} doesn't exist.");
        };
        if profile.merch_item(name).is_some() {
            return format!("{artist} has merchandise with the same name.");
        }
        let Ok(price) = u32::try_from(price) else {
            return "Price for merchandise can not be negative.".to_string();
        };
        profile.merch.push(Merchandise {
            name: name.to_string(),
            description: description.to_string(),
            price,
        });
        self.roster.notify_subscribers(
            artist,
            EventKind::NewMerchandise,
            &format!("New Merchandise from {artist}."),
        );
        format!("{artist} has added new merchandise successfully.")
    }

    pub fn add_announcement(&mut self, host: &str, announcement: Announcement) -> String {
        if let Err(rejection) = self.require(host, UserKind::Host) {
            return rejection.0;
        }
        let Some(profile) = self.roster.host_mut(host) else {
            return format!("The username {host} doesn't exist.");
        };
        if profile
            .announcements
            .iter()
            .any(|a| a.name == announcement.name)
        {
            return format!("{host} has already added an announcement with this name.");
        }
        profile.announcements.push(announcement);
        self.roster.notify_subscribers(
            host,
            EventKind::NewAnnouncement,
            &format!("New Announcement from {host}."),
        );
        format!("{host} has successfully added new announcement.")
    }

    // ---- library ----

    pub fn create_playlist(&mut self, username: &str, name: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        if listener.playlist(name).is_some() {
            return "A playlist with the same name already exists.".to_string();
        }
        listener.playlists.push(Playlist::new(name, username));
        "Playlist created successfully.".to_string()
    }

    /// Adds the current song to one of the listener's playlists, or removes it.
    pub fn add_remove_in_playlist(&mut self, username: &str, playlist: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        let Some(ctx) = listener.playback.as_ref() else {
            return "Please load a source before adding to or removing from the playlist."
                .to_string();
        };
        let Some(song) = ctx.song().cloned() else {
            return "The loaded source is not a song.".to_string();
        };
        let Some(target) = listener.playlists.iter_mut().find(|p| p.name == playlist) else {
            return "The specified playlist does not exist.".to_string();
        };
        if target.toggle(&song) {
            "Successfully added to playlist.".to_string()
        } else {
            "Successfully removed from playlist.".to_string()
        }
    }

    /// Likes or unlikes the current song.
    pub fn like(&mut self, username: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        let Some(ctx) = listener.playback.as_ref() else {
            return "Please load a source before liking or unliking.".to_string();
        };
        let Some(song) = ctx.song().cloned() else {
            return "Loaded source is not a song.".to_string();
        };
        if listener.toggle_like(&song) {
            "Like registered successfully.".to_string()
        } else {
            "Unlike registered successfully.".to_string()
        }
    }

    /// Follows another listener's playlist, or unfollows it.
    pub fn follow(&mut self, username: &str, owner: &str, playlist: &str) -> String {
        if let Err(rejection) = self.require(username, UserKind::User) {
            return rejection.0;
        }
        let reference = PlaylistRef {
            owner: owner.to_string(),
            name: playlist.to_string(),
        };
        if self.roster.playlist(&reference).is_none() {
            return "The specified playlist does not exist.".to_string();
        }
        if owner == username {
            return "You cannot follow or unfollow your own playlist.".to_string();
        }
        let Some(listener) = self.roster.listener_mut(username) else {
            return format!("The username {username} doesn't exist.");
        };
        match listener.followed.iter().position(|r| *r == reference) {
            Some(index) => {
                listener.followed.remove(index);
                "Playlist unfollowed successfully.".to_string()
            }
            None => {
                listener.followed.push(reference);
                "Playlist followed successfully.".to_string()
            }
        }
    }

    // ---- playback ----

    fn resolve_source(
        &self,
        listener: &ListenerProfile,
        source: SourceType,
        name: &str,
    ) -> Option<PlayContext> {
        let (tracks, owner): (Vec<AudioItem>, &str) = match source {
            SourceType::Library => {
                let song = self.catalog.song(name)?;
                return Some(PlayContext::new(
                    source,
                    AudioItem::Song(song.clone()),
                    self.clock,
                ));
            }
            SourceType::Album => {
                let album = self.catalog.album_named(name)?;
                (
                    album.songs.iter().cloned().map(AudioItem::Song).collect(),
                    &album.owner,
                )
            }
            SourceType::Podcast => {
                let podcast = self.catalog.podcast(name)?;
                (
                    podcast.episodes.iter().cloned().map(AudioItem::Episode).collect(),
                    &podcast.owner,
                )
            }
            SourceType::Playlist => {
                let playlist = listener.playlist(name).or_else(|| {
                    listener
                        .followed
                        .iter()
                        .filter(|r| r.name == name)
                        .find_map(|r| self.roster.playlist(r))
                })?;
                (
                    playlist.songs.iter().cloned().map(AudioItem::Song).collect(),
                    &playlist.owner,
                )
            }
        };
        let mut tracks = tracks.into_iter();
        let first = tracks.next()?;
        Some(
            PlayContext::new(source, first, self.clock)
                .with_collection(name, owner)
                .with_upcoming(tracks),
        )
    }

    /// Loads a song, album, playlist or podcast and records the first play.
    ///
    /// A load discards any pending ad.
    ///
    /// # Errors
    ///
    /// Fails if the resulting play context is inconsistent.
    pub fn load(&mut self, username: &str, source: SourceType, name: &str) -> Result<String> {
        let ctx = match self.listener(username) {
            Ok(listener) => self.resolve_source(listener, source, name),
            Err(rejection) => return Ok(rejection.0),
        };
        let Some(ctx) = ctx else {
            return Ok("You can't load an empty audio collection!".to_string());
        };
        self.start_playback(username, ctx)?;
        Ok("Playback loaded successfully.".to_string())
    }

    fn start_playback(&mut self, username: &str, ctx: PlayContext) -> Result<PlayRecord> {
        let Some((listener, artists, hosts)) = self.roster.split_for(username) else {
            bail!("Listener {username} vanished during load");
        };
        debug!(
            "{username} loaded {} {}",
            ctx.source_type,
            ctx.collection.as_deref().unwrap_or(ctx.item.name())
        );
        listener.ad_price = 0;
        listener.playback = Some(ctx);
        stats::record_play(listener, artists, hosts)
    }

    /// Skips to the next track of the loaded collection. A pending ad is paid
    /// out and skipped along with the track; an ad already playing is cut
    /// short.
    ///
    /// # Errors
    ///
    /// Fails if the new play context is inconsistent.
    pub fn next_track(&mut self, username: &str) -> Result<String> {
        let now = self.clock;
        let Some((listener, artists, hosts)) = self.roster.split_for(username) else {
            return Ok(format!("The username {username} doesn't exist."));
        };
        if listener.playback.is_none() {
            return Ok("Please load a source before skipping to the next track.".to_string());
        }
        if listener.ad_price > 0 {
            settle_ad(listener, artists, &self.catalog);
        }
        let advanced = listener
            .playback
            .as_mut()
            .is_some_and(|ctx| ctx.advance(now));
        if !advanced {
            listener.playback = None;
            return Ok("Please load a source before skipping to the next track.".to_string());
        }
        let current = listener
            .playback
            .as_ref()
            .map(|ctx| ctx.item.name().to_string())
            .unwrap_or_default();
        stats::record_play(listener, artists, hosts)?;
        Ok(format!(
            "Skipped to next track successfully. The current track is {current}."
        ))
    }

    // ---- monetization ----

    pub fn buy_premium(&mut self, username: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        if listener.premium {
            return format!("{username} is already a premium user.");
        }
        listener.premium = true;
        format!("{username} bought the subscription successfully.")
    }

    /// Ends a subscription: pays the artists, then forgets the premium history.
    pub fn cancel_premium(&mut self, username: &str) -> String {
        if let Err(rejection) = self.require(username, UserKind::User) {
            return rejection.0;
        }
        let price = self.config.subscription_price;
        let Some((listener, artists, _)) = self.roster.split_for(username) else {
            return format!("The username {username} doesn't exist.");
        };
        if !listener.premium {
            return format!("{username} is not a premium user.");
        }
        listener.premium = false;
        revenue::distribute_for_cancel(listener, price, artists, &self.catalog);
        listener.premium_history_song.clear();
        listener.premium_history_artist.clear();
        format!("{username} cancelled the subscription successfully.")
    }

    /// Schedules an ad worth `price` after the current track.
    pub fn ad_break(&mut self, username: &str, price: u32) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        if listener.playback.is_none() {
            return format!("{username} is not playing any music.");
        }
        listener.ad_price = price;
        "Ad inserted successfully.".to_string()
    }

    /// Settles a pending ad right away. `None` if no ad is pending.
    pub fn ad_played(&mut self, username: &str) -> Option<Payout> {
        let (listener, artists, _) = self.roster.split_for(username)?;
        if listener.ad_price == 0 {
            return None;
        }
        Some(settle_ad(listener, artists, &self.catalog))
    }

    /// Buys merchandise from the artist whose page the listener is on.
    pub fn buy_merch(&mut self, username: &str, merch: &str) -> String {
        let page = match self.listener(username) {
            Ok(listener) => listener.page.clone(),
            Err(rejection) => return rejection.0,
        };
        let Page::Artist(artist) = page else {
            return "Cannot buy merch from this page.".to_string();
        };
        if self
            .roster
            .artist(&artist)
            .and_then(|a| a.merch_item(merch))
            .is_none()
        {
            return format!("The merch {merch} doesn't exist.");
        }
        revenue::credit_merch(&mut self.roster.artists, merch);
        if let Some(listener) = self.roster.listener_mut(username) {
            listener.merch.push(merch.to_string());
        }
        format!("{username} has added new merch successfully.")
    }

    /// Names of the merchandise the listener bought, in purchase order.
    ///
    /// # Errors
    ///
    /// Rejected if `username` is not a listener.
    pub fn see_merch(&self, username: &str) -> Result<Vec<String>, Rejection> {
        Ok(self.listener(username)?.merch.clone())
    }

    // ---- pages ----

    /// Visits a page. Creator pages resolve to the owner of what is playing.
    pub fn change_page(&mut self, username: &str, next: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        let ctx = listener.playback.as_ref();
        let page = match next {
            "Home" => Some(Page::Home),
            "LikedContent" => Some(Page::LikedContent),
            "Artist" => ctx
                .and_then(PlayContext::song)
                .map(|song| Page::Artist(song.artist.clone())),
            "Host" => ctx
                .filter(|c| c.source_type == SourceType::Podcast)
                .and_then(|c| c.owner.clone())
                .map(Page::Host),
            _ => None,
        };
        let Some(page) = page else {
            return format!("{username} is trying to access a non-existent page.");
        };
        listener.history.delete_pages_after_current();
        listener.history.add_page(page.clone());
        listener.page = page;
        format!("{username} accessed {next} successfully.")
    }

    pub fn previous_page(&mut self, username: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        match listener.history.go_back() {
            NavigationOutcome::AtBoundary => "There are no pages left to go back.".to_string(),
            NavigationOutcome::Moved => {
                if let Some(page) = listener.history.current() {
                    listener.page = page.clone();
                }
                format!("The user {username} has navigated successfully to the previous page.")
            }
        }
    }

    pub fn next_page(&mut self, username: &str) -> String {
        let listener = match self.listener_mut(username) {
            Ok(listener) => listener,
            Err(rejection) => return rejection.0,
        };
        match listener.history.go_forward() {
            NavigationOutcome::AtBoundary => "There are no pages left to go forward.".to_string(),
            NavigationOutcome::Moved => {
                if let Some(page) = listener.history.current() {
                    listener.page = page.clone();
                }
                format!("The user {username} has navigated successfully to the next page.")
            }
        }
    }

    // ---- notifications ----

    /// Toggles the subscription to the creator whose page the listener is on.
    pub fn subscribe(&mut self, username: &str) -> String {
        let page = match self.listener(username) {
            Ok(listener) => listener.page.clone(),
            Err(rejection) => return rejection.0,
        };
        let subscribers = match &page {
            Page::Artist(name) => self.roster.artist_mut(name).map(|a| &mut a.subscribers),
            Page::Host(name) => self.roster.host_mut(name).map(|h| &mut h.subscribers),
            Page::Home | Page::LikedContent => None,
        };
        let (Some(subscribers), Some(creator)) = (subscribers, page.creator()) else {
            return "To subscribe you need to be on the page of an artist or host.".to_string();
        };
        if subscribers.toggle(username) {
            format!("{username} subscribed to {creator} successfully.")
        } else {
            format!("{username} unsubscribed from {creator} successfully.")
        }
    }

    /// Drains the listener's pending notifications.
    ///
    /// # Errors
    ///
    /// Rejected if `username` is not a listener.
    pub fn notifications(&mut self, username: &str) -> Result<Vec<Notification>, Rejection> {
        Ok(self.listener_mut(username)?.mailbox.drain())
    }

    // ---- recommendations ----

    /// Generates a recommendation of `kind` and stores it if it is new.
    pub fn update_recommendations(&mut self, username: &str, kind: RecommendationType) -> String {
        let check = match self.listener(username) {
            Ok(listener) => {
                let candidate = recommend::generate(
                    kind,
                    listener,
                    &self.roster,
                    &self.catalog,
                    self.clock,
                    &self.config,
                );
                listener.recommendations.check(candidate)
            }
            Err(rejection) => return rejection.0,
        };
        let RecommendationCheck::New(recommendation) = check else {
            return "No new recommendations were found".to_string();
        };
        debug!("{username} gets {kind} {}", recommendation.name());
        if let Some(listener) = self.roster.listener_mut(username) {
            listener.recommendations.commit(recommendation);
        }
        format!("The recommendations for user {username} have been updated successfully.")
    }

    /// Plays the last committed recommendation.
    ///
    /// # Errors
    ///
    /// Fails if the resulting play context is inconsistent.
    pub fn load_recommendations(&mut self, username: &str) -> Result<String> {
        let last = match self.listener(username) {
            Ok(listener) => listener.recommendations.last.clone(),
            Err(rejection) => return Ok(rejection.0),
        };
        let ctx = match last {
            None => return Ok("No recommendations available.".to_string()),
            Some(Recommendation::Song(song)) => {
                PlayContext::new(SourceType::Library, AudioItem::Song(song), self.clock)
            }
            Some(Recommendation::Playlist(playlist)) => {
                let mut tracks = playlist.songs.into_iter().map(AudioItem::Song);
                let Some(first) = tracks.next() else {
                    return Ok("No recommendations available.".to_string());
                };
                PlayContext::new(SourceType::Playlist, first, self.clock)
                    .with_collection(&playlist.name, &playlist.owner)
                    .with_upcoming(tracks)
            }
        };
        self.start_playback(username, ctx)?;
        Ok("Playback loaded successfully.".to_string())
    }

    // ---- statistics ----

    /// Top projections of any account.
    ///
    /// # Errors
    ///
    /// Rejected for unknown users and for listeners or artists that have no
    /// statistics yet.
    pub fn wrapped(&self, username: &str) -> Result<Wrapped, Rejection> {
        let limit = self.config.top_limit;
        if let Some(artist) = self.roster.artist(username) {
            if !artist.has_statistics {
                return Err(Rejection(format!("No data to show for artist {username}.")));
            }
            return Ok(Wrapped::Artist {
                top_albums: artist.top_albums.top_n(limit),
                top_songs: artist.top_songs.top_n(limit),
                top_fans: artist
                    .top_fans
                    .top_n(limit)
                    .keys()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
                listeners: artist.top_fans.len(),
            });
        }
        if let Some(host) = self.roster.host(username) {
            return Ok(Wrapped::Host {
                top_episodes: host.top_episodes.top_n(limit),
                listeners: host.listeners.len(),
            });
        }
        let listener = self.listener(username)?;
        if !listener.has_statistics {
            return Err(Rejection(format!("No data to show for user {username}.")));
        }
        Ok(Wrapped::Listener {
            top_artists: listener.top_artists.top_n(limit),
            top_genres: listener.top_genres.top_n(limit),
            top_songs: listener.top_songs.top_n(limit),
            top_albums: listener.top_albums.top_n(limit),
            top_episodes: listener.top_episodes.top_n(limit),
        })
    }

    /// Settles every remaining subscription and produces the ranked report.
    ///
    /// Premium histories are not cleared; the run is over.
    pub fn end_program(&mut self) -> Vec<ArtistReport> {
        let price = self.config.subscription_price;
        let Roster {
            listeners, artists, ..
        } = &mut self.roster;
        for listener in listeners.iter().filter(|l| l.premium) {
            revenue::distribute_for_cancel(listener, price, artists, &self.catalog);
        }
        let report = ranking::final_report(artists);
        info!("Run finished with {} ranked artists", report.len());
        report
    }
}

/// Pays out a pending ad and forgets the ad history it was paid from.
fn settle_ad(
    listener: &mut ListenerProfile,
    artists: &mut [ArtistProfile],
    catalog: &Catalog,
) -> Payout {
    let price = f64::from(listener.ad_price);
    let payout = revenue::distribute_free(price, listener, artists, catalog);
    listener.ad_history.clear();
    payout
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(name: &str, genre: &str, duration: u32) -> Song {
        Song {
            name: name.into(),
            album: String::new(),
            artist: String::new(),
            genre: genre.into(),
            duration,
        }
    }

    fn platform() -> Platform {
        let mut platform = Platform::new(SimulationConfig::default());
        platform.add_user("ana", UserKind::User);
        platform.add_user("bob", UserKind::User);
        platform.add_user("band", UserKind::Artist);
        platform.add_user("radio", UserKind::Host);
        platform.add_album(
            "band",
            "LP",
            vec![song("x", "rock", 100), song("y", "rock", 50)],
        );
        platform
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let mut platform = platform();
        assert_eq!(
            platform.add_user("band", UserKind::User),
            "The username band is already taken."
        );
    }

    #[test]
    fn test_album_songs_take_owner() {
        let platform = platform();
        let song = platform.catalog().song("x").unwrap();
        assert_eq!(song.artist, "band");
        assert_eq!(song.album, "LP");
    }

    #[test]
    fn test_clock_cannot_go_back() -> Result<()> {
        let mut platform = platform();
        platform.advance_to(10)?;
        assert!(platform.advance_to(5).is_err());
        Ok(())
    }

    #[test]
    fn test_album_plays_through_on_clock() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Album, "LP")?;
        platform.advance_to(120)?;

        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.top_songs.get("x"), Some(1));
        assert_eq!(ana.top_songs.get("y"), Some(1));
        assert_eq!(ana.playback.as_ref().map(|c| c.item.name()), Some("y"));

        platform.advance_to(200)?;
        assert!(platform.roster().listener("ana").unwrap().playback.is_none());
        Ok(())
    }

    #[test]
    fn test_cancel_pays_and_clears_history() -> Result<()> {
        let mut platform = platform();
        platform.buy_premium("ana");
        platform.load("ana", SourceType::Library, "x")?;

        assert_eq!(
            platform.cancel_premium("ana"),
            "ana cancelled the subscription successfully."
        );
        assert_eq!(platform.cancel_premium("ana"), "ana is not a premium user.");

        let band = platform.roster().artist("band").unwrap();
        assert!((band.song_revenue - 1_000_000.0).abs() < 1e-6);
        let ana = platform.roster().listener("ana").unwrap();
        assert!(ana.premium_history_song.is_empty());
        Ok(())
    }

    #[test]
    fn test_ad_paid_at_track_end_then_next_track_counts() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Album, "LP")?;
        assert_eq!(platform.ad_break("ana", 100), "Ad inserted successfully.");

        platform.advance_to(100)?;

        let band = platform.roster().artist("band").unwrap();
        assert!((band.song_revenue - 100.0).abs() < 1e-9);
        assert_eq!(band.profit_for_each_song.get("x"), Some(100.0));
        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.ad_price, 0);
        assert!(ana.ad_history.songs.is_empty());
        assert!(ana.playback.as_ref().is_some_and(PlayContext::in_ad_break));
        assert_eq!(ana.top_songs.get("y"), None);

        // the default ad lasts 10 seconds
        platform.advance_to(110)?;

        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.top_songs.get("y"), Some(1));
        assert_eq!(ana.ad_history.songs.get("y"), Some(1));
        assert_eq!(ana.playback.as_ref().map(PlayContext::ends_at), Some(160));
        Ok(())
    }

    #[test]
    fn test_every_album_track_counted_once_around_ad() -> Result<()> {
        let mut platform = platform();
        platform.add_album(
            "band",
            "Trio",
            vec![song("s1", "rock", 100), song("s2", "rock", 100), song("s3", "rock", 100)],
        );
        platform.load("ana", SourceType::Album, "Trio")?;
        platform.ad_break("ana", 100);

        platform.advance_to(1_000)?;

        let Ok(Wrapped::Listener {
            top_songs, top_albums, ..
        }) = platform.wrapped("ana")
        else {
            panic!("expected listener wrapped");
        };
        assert_eq!(
            top_songs.iter().collect::<Vec<_>>(),
            vec![("s1", 1), ("s2", 1), ("s3", 1)]
        );
        assert_eq!(top_albums.iter().collect::<Vec<_>>(), vec![("Trio", 3)]);

        let band = platform.roster().artist("band").unwrap();
        assert_eq!(band.listeners, 3);
        assert_eq!(band.profit_for_each_song.get("s1"), Some(100.0));
        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.ad_history.songs.get("s2"), Some(1));
        assert_eq!(ana.ad_history.songs.get("s3"), Some(1));
        assert!(ana.playback.is_none());
        Ok(())
    }

    #[test]
    fn test_next_track_settles_pending_ad() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Album, "LP")?;
        platform.ad_break("ana", 100);

        assert_eq!(
            platform.next_track("ana")?,
            "Skipped to next track successfully. The current track is y."
        );

        let band = platform.roster().artist("band").unwrap();
        assert!((band.song_revenue - 100.0).abs() < 1e-9);
        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.ad_price, 0);
        assert_eq!(ana.top_songs.get("y"), Some(1));
        assert_eq!(ana.ad_history.songs.get("y"), Some(1));
        assert_eq!(ana.ad_history.songs.get("x"), None);
        Ok(())
    }

    #[test]
    fn test_ad_played_settles_now() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Library, "x")?;
        platform.load("ana", SourceType::Library, "y")?;
        platform.ad_break("ana", 300);

        let payout = platform.ad_played("ana");

        let payout = payout.unwrap();
        assert_eq!(payout.total_listens, 2);
        assert_eq!(payout.artist_credits, vec![("band".to_string(), 300.0)]);
        let ana = platform.roster().listener("ana").unwrap();
        assert_eq!(ana.ad_price, 0);
        assert!(ana.ad_history.songs.is_empty());
        assert!(ana.ad_history.artists.is_empty());
        let band = platform.roster().artist("band").unwrap();
        assert_eq!(band.profit_for_each_song.get("x"), Some(150.0));
        assert_eq!(band.profit_for_each_song.get("y"), Some(150.0));

        // nothing left to pay when the track ends
        assert_eq!(platform.ad_played("ana"), None);
        platform.advance_to(100)?;
        let band = platform.roster().artist("band").unwrap();
        assert!((band.song_revenue - 300.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_ad_break_needs_playback() {
        let mut platform = platform();
        assert_eq!(platform.ad_break("ana", 10), "ana is not playing any music.");
        assert_eq!(platform.ad_played("ana"), None);
    }

    #[test]
    fn test_merch_bought_from_artist_page() -> Result<()> {
        let mut platform = platform();
        platform.add_merch("band", "shirt", "cotton", 25);
        assert_eq!(platform.buy_merch("ana", "shirt"), "Cannot buy merch from this page.");

        platform.load("ana", SourceType::Library, "x")?;
        platform.change_page("ana", "Artist");
        assert_eq!(platform.buy_merch("ana", "mug"), "The merch mug doesn't exist.");
        assert_eq!(
            platform.buy_merch("ana", "shirt"),
            "ana has added new merch successfully."
        );

        assert_eq!(platform.see_merch("ana"), Ok(vec!["shirt".to_string()]));
        assert_eq!(platform.roster().artist("band").unwrap().merch_revenue, 25.0);
        Ok(())
    }

    #[test]
    fn test_negative_merch_price() {
        let mut platform = platform();
        assert_eq!(
            platform.add_merch("band", "shirt", "", -1),
            "Price for merchandise can not be negative."
        );
        assert_eq!(platform.add_merch("ana", "shirt", "", 1), "ana is not an artist.");
    }

    #[test]
    fn test_subscribers_receive_new_album() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Library, "x")?;
        assert_eq!(
            platform.subscribe("ana"),
            "To subscribe you need to be on the page of an artist or host."
        );
        platform.change_page("ana", "Artist");
        assert_eq!(platform.subscribe("ana"), "ana subscribed to band successfully.");

        platform.add_album("band", "EP", vec![song("z", "pop", 10)]);

        let notifications = platform.notifications("ana").map_err(|r| anyhow::anyhow!(r.0))?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].description, "New Album from band.");
        assert_eq!(platform.notifications("ana"), Ok(Vec::new()));
        Ok(())
    }

    #[test]
    fn test_page_navigation() {
        let mut platform = platform();
        assert_eq!(
            platform.previous_page("ana"),
            "There are no pages left to go back."
        );
        platform.change_page("ana", "LikedContent");
        platform.change_page("ana", "Home");
        assert_eq!(
            platform.previous_page("ana"),
            "The user ana has navigated successfully to the previous page."
        );
        assert_eq!(platform.roster().listener("ana").unwrap().page, Page::LikedContent);
        assert_eq!(
            platform.change_page("ana", "Artist"),
            "ana is trying to access a non-existent page."
        );
    }

    #[test]
    fn test_wrapped_without_statistics() {
        let platform = platform();
        assert_eq!(
            platform.wrapped("ana"),
            Err(Rejection("No data to show for user ana.".into()))
        );
        assert_eq!(
            platform.wrapped("band"),
            Err(Rejection("No data to show for artist band.".into()))
        );
    }

    #[test]
    fn test_artist_wrapped_counts_distinct_fans() -> Result<()> {
        let mut platform = platform();
        platform.load("ana", SourceType::Library, "x")?;
        platform.load("ana", SourceType::Library, "y")?;
        platform.load("bob", SourceType::Library, "x")?;

        let Ok(Wrapped::Artist {
            top_fans, listeners, top_songs, ..
        }) = platform.wrapped("band")
        else {
            panic!("expected artist wrapped");
        };
        assert_eq!(top_fans, vec!["ana", "bob"]);
        assert_eq!(listeners, 2);
        assert_eq!(top_songs.keys(), vec!["x", "y"]);
        Ok(())
    }

    #[test]
    fn test_random_song_recommendation_lifecycle() -> Result<()> {
        let mut platform = platform();
        assert_eq!(
            platform.load_recommendations("ana")?,
            "No recommendations available."
        );
        platform.load("ana", SourceType::Library, "x")?;
        platform.advance_to(10)?;
        assert_eq!(
            platform.update_recommendations("ana", RecommendationType::RandomSong),
            "No new recommendations were found"
        );

        platform.advance_to(40)?;
        assert_eq!(
            platform.update_recommendations("ana", RecommendationType::RandomSong),
            "The recommendations for user ana have been updated successfully."
        );
        assert_eq!(
            platform.update_recommendations("ana", RecommendationType::RandomSong),
            "No new recommendations were found"
        );
        assert_eq!(
            platform.load_recommendations("ana")?,
            "Playback loaded successfully."
        );
        Ok(())
    }

    #[test]
    fn test_end_program_settles_premium_and_ranks() -> Result<()> {
        let mut platform = platform();
        platform.add_user("solo", UserKind::Artist);
        platform.buy_premium("ana");
        platform.load("ana", SourceType::Library, "x")?;

        let report = platform.end_program();

        assert_eq!(report.len(), 1);
        assert_eq!(report[0].name, "band");
        assert_eq!(report[0].song_revenue, 1_000_000.0);
        assert_eq!(report[0].most_profitable_song, "x");
        assert_eq!(report[0].ranking, 1);
        Ok(())
    }
}
