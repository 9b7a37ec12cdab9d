//! Recommendation generator.
//!
//! ## Strategies
//!
//! - **random_song**: once enough of the current song has played, pick a song
//!   of the same genre with a generator seeded by the elapsed seconds.
//! - **random_playlist**: the listener's favourite genres (liked songs,
//!   followed and own playlists), a few catalog songs from each.
//! - **fans_playlist**: liked songs of the current artist's top fans.
//!
//! Generation is a pure function of the current state, so the same state
//! always yields the same recommendation. Storing it is a separate step:
//! [`Recommendations::check`] compares without touching anything, and only
//! [`Recommendations::commit`] replaces what the listener has.

use crate::catalog::{Catalog, Playlist, Song};
use crate::config::SimulationConfig;
use crate::counter::RankedCounter;
use crate::playback::PlayContext;
use crate::profile::{ListenerProfile, Roster};
use anyhow::{anyhow, Result};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationType {
    RandomSong,
    RandomPlaylist,
    FansPlaylist,
}

impl FromStr for RecommendationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random_song" => Ok(RecommendationType::RandomSong),
            "random_playlist" => Ok(RecommendationType::RandomPlaylist),
            "fans_playlist" => Ok(RecommendationType::FansPlaylist),
            other => Err(anyhow!("Unknown recommendation type: {other}")),
        }
    }
}

impl fmt::Display for RecommendationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecommendationType::RandomSong => "random_song",
            RecommendationType::RandomPlaylist => "random_playlist",
            RecommendationType::FansPlaylist => "fans_playlist",
        };
        f.write_str(name)
    }
}

/// A generated recommendation payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    Song(Song),
    Playlist(Playlist),
}

impl Recommendation {
    /// Type tag shown to the listener: `"song"` or `"playlist"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Recommendation::Song(_) => "song",
            Recommendation::Playlist(_) => "playlist",
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Recommendation::Song(song) => &song.name,
            Recommendation::Playlist(playlist) => &playlist.name,
        }
    }
}

/// Outcome of comparing a fresh recommendation with the stored ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationCheck {
    New(Recommendation),
    NothingNew,
}

/// Recommendations committed for one listener.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recommendations {
    pub song: Option<Song>,
    pub playlist: Option<Playlist>,
    /// The most recently committed recommendation of either kind.
    pub last: Option<Recommendation>,
}

impl Recommendations {
    /// Whether `candidate` differs from what is already stored. Never mutates.
    #[must_use]
    pub fn check(&self, candidate: Option<Recommendation>) -> RecommendationCheck {
        match candidate {
            None => RecommendationCheck::NothingNew,
            Some(Recommendation::Song(song)) if self.song.as_ref() == Some(&song) => {
                RecommendationCheck::NothingNew
            }
            Some(Recommendation::Playlist(playlist))
                if self.playlist.as_ref() == Some(&playlist) =>
            {
                RecommendationCheck::NothingNew
            }
            Some(recommendation) => RecommendationCheck::New(recommendation),
        }
    }

    /// Stores `recommendation` and makes it the last one.
    pub fn commit(&mut self, recommendation: Recommendation) {
        match &recommendation {
            Recommendation::Song(song) => self.song = Some(song.clone()),
            Recommendation::Playlist(playlist) => self.playlist = Some(playlist.clone()),
        }
        self.last = Some(recommendation);
    }
}

/// Picks a same-genre song, seeded by how far the current song has played.
///
/// Returns `None` when nothing is playing, the current item is not a song,
/// or fewer than `config.min_listen_seconds` have elapsed.
#[must_use]
pub fn random_song(
    playback: Option<&PlayContext>,
    now: u64,
    catalog: &Catalog,
    config: &SimulationConfig,
) -> Option<Song> {
    let ctx = playback?;
    let current = ctx.song()?;
    let elapsed = ctx.position(now).elapsed();
    if elapsed < config.min_listen_seconds {
        debug!("Only {elapsed}s of {} played, no song recommended", current.name);
        return None;
    }

    let pool: Vec<&Song> = catalog.songs_by_genre(&current.genre).collect();
    if pool.is_empty() {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(u64::from(elapsed));
    let index = rng.gen_range(0..pool.len());
    Some(pool[index].clone())
}

/// Builds `"<user>'s recommendations"` from the listener's top genres.
///
/// Returns `None` when the resulting playlist would be empty.
#[must_use]
pub fn random_playlist(
    listener: &ListenerProfile,
    roster: &Roster,
    catalog: &Catalog,
    config: &SimulationConfig,
) -> Option<Playlist> {
    let followed = listener
        .followed
        .iter()
        .filter_map(|reference| roster.playlist(reference));
    let genres: RankedCounter = listener
        .liked_songs
        .iter()
        .chain(followed.flat_map(|p| p.songs.iter()))
        .chain(listener.playlists.iter().flat_map(|p| p.songs.iter()))
        .map(|song| song.genre.as_str())
        .collect();

    let mut playlist = Playlist::new(
        format!("{}'s recommendations", listener.username),
        listener.username.as_str(),
    );
    for (genre, _) in genres.top_n(config.playlist_genres).iter() {
        playlist.songs.extend(
            catalog
                .songs_by_genre(genre)
                .take(config.songs_per_bucket)
                .cloned(),
        );
    }
    (!playlist.songs.is_empty()).then_some(playlist)
}

/// Builds `"<artist>'s Fan Club recommendations"` from the liked songs of the
/// current artist's top fans. The playlist is owned by the artist.
#[must_use]
pub fn fans_playlist(
    playback: Option<&PlayContext>,
    roster: &Roster,
    config: &SimulationConfig,
) -> Option<Playlist> {
    let current = playback?.song()?;
    let artist = roster.artist(&current.artist)?;

    let mut playlist = Playlist::new(
        format!("{}'s Fan Club recommendations", artist.username),
        artist.username.as_str(),
    );
    for (fan, _) in artist.top_fans.top_n(config.fans_per_playlist).iter() {
        let Some(fan) = roster.listener(fan) else {
            continue;
        };
        playlist.songs.extend(
            fan.liked_songs
                .iter()
                .take(config.songs_per_bucket)
                .cloned(),
        );
    }
    (!playlist.songs.is_empty()).then_some(playlist)
}

/// Runs the strategy `kind` for `listener`.
#[must_use]
pub fn generate(
    kind: RecommendationType,
    listener: &ListenerProfile,
    roster: &Roster,
    catalog: &Catalog,
    now: u64,
    config: &SimulationConfig,
) -> Option<Recommendation> {
    let playback = listener.playback.as_ref();
    match kind {
        RecommendationType::RandomSong => {
            random_song(playback, now, catalog, config).map(Recommendation::Song)
        }
        RecommendationType::RandomPlaylist => {
            random_playlist(listener, roster, catalog, config).map(Recommendation::Playlist)
        }
        RecommendationType::FansPlaylist => {
            fans_playlist(playback, roster, config).map(Recommendation::Playlist)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Album;
    use crate::playback::{AudioItem, SourceType};
    use crate::profile::{ArtistProfile, PlaylistRef};

    fn song(name: &str, genre: &str, duration: u32) -> Song {
        Song {
            name: name.into(),
            album: "LP".into(),
            artist: "band".into(),
            genre: genre.into(),
            duration,
        }
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        let songs = vec![
            song("r1", "rock", 40),
            song("p1", "pop", 40),
            song("r2", "rock", 40),
            song("j1", "jazz", 40),
            song("r3", "rock", 40),
        ];
        catalog
            .add_album(Album {
                name: "LP".into(),
                owner: "band".into(),
                songs,
            })
            .unwrap();
        catalog
    }

    fn playing(song: Song, started_at: u64) -> PlayContext {
        PlayContext::new(SourceType::Library, AudioItem::Song(song), started_at)
    }

    #[test]
    fn test_random_song_needs_thirty_seconds() {
        let config = SimulationConfig::default();
        let ctx = playing(song("r1", "rock", 40), 0);
        // 25s elapsed, 15s remaining
        assert_eq!(random_song(Some(&ctx), 25, &catalog(), &config), None);
        assert_eq!(random_song(None, 25, &catalog(), &config), None);
    }

    #[test]
    fn test_random_song_is_deterministic_and_same_genre() {
        let config = SimulationConfig::default();
        let catalog = catalog();
        let ctx = playing(song("r1", "rock", 40), 0);

        let first = random_song(Some(&ctx), 35, &catalog, &config);
        let second = random_song(Some(&ctx), 35, &catalog, &config);

        assert_eq!(first, second);
        assert_eq!(first.map(|s| s.genre), Some("rock".to_string()));
    }

    #[test]
    fn test_random_playlist_uses_top_genres_in_catalog_order() {
        let config = SimulationConfig {
            playlist_genres: 2,
            songs_per_bucket: 2,
            ..SimulationConfig::default()
        };
        let mut roster = Roster::default();
        let mut other = ListenerProfile::new("bob");
        let mut mix = Playlist::new("mix", "bob");
        mix.songs.push(song("p1", "pop", 40));
        mix.songs.push(song("p1", "pop", 40));
        other.playlists.push(mix);
        roster.listeners.push(other);

        let mut ana = ListenerProfile::new("ana");
        ana.liked_songs.push(song("r1", "rock", 40));
        ana.liked_songs.push(song("j1", "jazz", 40));
        ana.followed.push(PlaylistRef {
            owner: "bob".into(),
            name: "mix".into(),
        });

        let playlist = random_playlist(&ana, &roster, &catalog(), &config).unwrap();

        assert_eq!(playlist.name, "ana's recommendations");
        let names: Vec<&str> = playlist.songs.iter().map(|s| s.name.as_str()).collect();
        // pop (2) first, then jazz beats rock on the name tie-break
        assert_eq!(names, vec!["p1", "j1"]);
    }

    #[test]
    fn test_random_playlist_empty_is_none() {
        let listener = ListenerProfile::new("ana");
        let config = SimulationConfig::default();
        assert!(random_playlist(&listener, &Roster::default(), &catalog(), &config).is_none());
    }

    #[test]
    fn test_fans_playlist_collects_liked_songs_of_top_fans() {
        let config = SimulationConfig::default();
        let mut roster = Roster::default();
        let mut artist = ArtistProfile::new("band");
        artist.top_fans.add("ana", 3);
        artist.top_fans.add("bob", 5);
        roster.artists.push(artist);

        let mut ana = ListenerProfile::new("ana");
        ana.liked_songs.push(song("r1", "rock", 40));
        let mut bob = ListenerProfile::new("bob");
        bob.liked_songs.push(song("p1", "pop", 40));
        roster.listeners.push(ana);
        roster.listeners.push(bob);

        let ctx = playing(song("r2", "rock", 40), 0);
        let playlist = fans_playlist(Some(&ctx), &roster, &config).unwrap();

        assert_eq!(playlist.name, "band's Fan Club recommendations");
        assert_eq!(playlist.owner, "band");
        let names: Vec<&str> = playlist.songs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["p1", "r1"]);
    }

    #[test]
    fn test_check_is_pure_and_commit_stores() {
        let mut stored = Recommendations::default();
        let candidate = Recommendation::Song(song("r1", "rock", 40));

        assert_eq!(
            stored.check(Some(candidate.clone())),
            RecommendationCheck::New(candidate.clone())
        );
        assert_eq!(stored, Recommendations::default());

        stored.commit(candidate.clone());
        assert_eq!(stored.check(Some(candidate.clone())), RecommendationCheck::NothingNew);
        assert_eq!(stored.last.as_ref().map(Recommendation::kind), Some("song"));
        assert_eq!(stored.check(None), RecommendationCheck::NothingNew);
    }

    #[test]
    fn test_type_parsing() -> Result<()> {
        assert_eq!(
            "fans_playlist".parse::<RecommendationType>()?,
            RecommendationType::FansPlaylist
        );
        assert!("best_of".parse::<RecommendationType>().is_err());
        Ok(())
    }
}
