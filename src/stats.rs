//! Statistics updater: turns one "now playing" transition into counter updates.
//!
//! ## Branches
//!
//! - **PODCAST**: the listener's top episodes; the host's top episodes and
//!   per-listener counter when the host can be resolved.
//! - **LIBRARY / PLAYLIST / ALBUM**: the owning artist's songs, albums, fans
//!   and play count; the listener's artists, genres, songs and albums; then
//!   either the premium history or the ad history, depending on whether the
//!   listener is premium at the moment of the play.
//!
//! Anything recorded while an inserted ad plays is bookkeeping and leaves
//! every counter untouched. The track that follows the ad is a play like any
//! other.

use crate::playback::{AudioItem, PlayContext, SourceType};
use crate::profile::{ArtistProfile, HostProfile, ListenerProfile};
use anyhow::{bail, Result};
use log::{debug, trace, warn};

/// What [`record_play`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayRecord {
    /// A song play was counted.
    Song,
    /// An episode play was counted.
    Episode,
    /// Nothing loaded, or an ad playing; nothing was counted.
    Ignored,
}

/// Records the listener's current play context into every affected counter.
///
/// # Errors
///
/// Fails when the play context is inconsistent (a podcast source carrying a
/// song or a song source carrying an episode). That is a contract violation
/// of the playback layer, not a user error.
pub fn record_play(
    listener: &mut ListenerProfile,
    artists: &mut [ArtistProfile],
    hosts: &mut [HostProfile],
) -> Result<PlayRecord> {
    let Some(ctx) = listener.playback.clone() else {
        return Ok(PlayRecord::Ignored);
    };
    if ctx.returning_from_ad {
        trace!("{}: ad playing, not counted", listener.username);
        return Ok(PlayRecord::Ignored);
    }

    let record = match (ctx.source_type, &ctx.item) {
        (SourceType::Podcast, AudioItem::Episode(_)) => {
            record_episode(listener, hosts, &ctx);
            PlayRecord::Episode
        }
        (SourceType::Library, AudioItem::Episode(_)) => {
            // A library entry may be a single episode; it only counts for the listener.
            listener.top_episodes.increment(ctx.item.name());
            PlayRecord::Episode
        }
        (source, AudioItem::Song(_)) if source.plays_songs() => {
            record_song(listener, artists, &ctx);
            PlayRecord::Song
        }
        (source, item) => bail!(
            "Unexpected value: {source} source cannot play {}",
            item.name()
        ),
    };
    listener.has_statistics = true;
    Ok(record)
}

fn record_episode(listener: &mut ListenerProfile, hosts: &mut [HostProfile], ctx: &PlayContext) {
    let name = ctx.item.name();
    listener.top_episodes.increment(name);
    trace!("{} played episode {name}", listener.username);

    let host = ctx
        .owner
        .as_deref()
        .and_then(|owner| hosts.iter_mut().find(|h| h.username == owner));
    match host {
        Some(host) => {
            host.top_episodes.increment(name);
            host.listeners.increment(&listener.username);
        }
        None => debug!("Host of episode {name} not found, host statistics skipped"),
    }
}

fn record_song(listener: &mut ListenerProfile, artists: &mut [ArtistProfile], ctx: &PlayContext) {
    let Some(song) = ctx.song() else {
        return;
    };
    trace!(
        "{} played {} by {} from {}",
        listener.username,
        song.name,
        song.artist,
        ctx.source_type
    );

    match artists.iter_mut().find(|a| a.username == song.artist) {
        Some(artist) => {
            artist.has_statistics = true;
            artist.listened = true;
            artist.top_songs.increment(&song.name);
            artist.top_albums.increment(&song.album);
            artist.top_fans.increment(&listener.username);
            artist.listeners += 1;
        }
        None => warn!("Artist {} not found, artist statistics skipped", song.artist),
    }

    listener.top_artists.increment(&song.artist);
    listener.top_genres.increment(&song.genre);
    listener.top_songs.increment(&song.name);
    listener.top_albums.increment(&song.album);

    if listener.premium {
        listener.premium_history_song.increment(&song.name);
        listener.premium_history_artist.increment(&song.artist);
    } else {
        listener.ad_history.songs.increment(&song.name);
        listener.ad_history.artists.increment(&song.artist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Episode, Song};

    fn song(name: &str, artist: &str) -> Song {
        Song {
            name: name.into(),
            album: "LP".into(),
            artist: artist.into(),
            genre: "rock".into(),
            duration: 200,
        }
    }

    fn play(listener: &mut ListenerProfile, source: SourceType, item: AudioItem, owner: &str) {
        listener.playback = Some(PlayContext::new(source, item, 0).with_collection("c", owner));
    }

    #[test]
    fn test_song_play_updates_artist_and_listener() -> Result<()> {
        let mut listener = ListenerProfile::new("ana");
        let mut artists = vec![ArtistProfile::new("band")];
        play(&mut listener, SourceType::Album, AudioItem::Song(song("x", "band")), "band");

        let record = record_play(&mut listener, &mut artists, &mut [])?;

        assert_eq!(record, PlayRecord::Song);
        assert!(listener.has_statistics);
        assert_eq!(listener.top_songs.get("x"), Some(1));
        assert_eq!(listener.top_genres.get("rock"), Some(1));
        assert_eq!(listener.ad_history.songs.get("x"), Some(1));
        assert!(listener.premium_history_song.is_empty());

        let artist = &artists[0];
        assert!(artist.listened && artist.has_statistics);
        assert_eq!(artist.listeners, 1);
        assert_eq!(artist.top_fans.get("ana"), Some(1));
        assert_eq!(artist.top_albums.get("LP"), Some(1));
        Ok(())
    }

    #[test]
    fn test_premium_flag_gates_history() -> Result<()> {
        let mut listener = ListenerProfile::new("ana");
        let mut artists = vec![ArtistProfile::new("band")];
        play(&mut listener, SourceType::Library, AudioItem::Song(song("x", "band")), "band");
        record_play(&mut listener, &mut artists, &mut [])?;

        listener.premium = true;
        record_play(&mut listener, &mut artists, &mut [])?;

        assert_eq!(listener.ad_history.songs.get("x"), Some(1));
        assert_eq!(listener.premium_history_song.get("x"), Some(1));
        assert_eq!(listener.premium_history_artist.get("band"), Some(1));
        assert_eq!(artists[0].listeners, 2);
        Ok(())
    }

    #[test]
    fn test_podcast_updates_host() -> Result<()> {
        let mut listener = ListenerProfile::new("ana");
        let mut hosts = vec![HostProfile::new("radio")];
        let episode = AudioItem::Episode(Episode {
            name: "ep1".into(),
            duration: 60,
            description: String::new(),
        });
        play(&mut listener, SourceType::Podcast, episode, "radio");

        assert_eq!(record_play(&mut listener, &mut [], &mut hosts)?, PlayRecord::Episode);
        assert_eq!(listener.top_episodes.get("ep1"), Some(1));
        assert_eq!(hosts[0].top_episodes.get("ep1"), Some(1));
        assert_eq!(hosts[0].listeners.get("ana"), Some(1));
        assert!(listener.top_songs.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_host_is_skipped() -> Result<()> {
        let mut listener = ListenerProfile::new("ana");
        let episode = AudioItem::Episode(Episode {
            name: "ep1".into(),
            duration: 60,
            description: String::new(),
        });
        play(&mut listener, SourceType::Podcast, episode, "nobody");

        assert_eq!(record_play(&mut listener, &mut [], &mut [])?, PlayRecord::Episode);
        assert_eq!(listener.top_episodes.get("ep1"), Some(1));
        Ok(())
    }

    #[test]
    fn test_ad_break_and_empty_source_ignored() -> Result<()> {
        let mut listener = ListenerProfile::new("ana");
        let mut artists = vec![ArtistProfile::new("band")];
        assert_eq!(record_play(&mut listener, &mut artists, &mut [])?, PlayRecord::Ignored);

        play(&mut listener, SourceType::Playlist, AudioItem::Song(song("x", "band")), "ana");
        if let Some(ctx) = listener.playback.as_mut() {
            ctx.insert_ad(200, 10);
        }
        assert_eq!(record_play(&mut listener, &mut artists, &mut [])?, PlayRecord::Ignored);
        assert!(!listener.has_statistics);
        assert_eq!(artists[0].listeners, 0);
        Ok(())
    }

    #[test]
    fn test_inconsistent_context_is_fatal() {
        let mut listener = ListenerProfile::new("ana");
        play(&mut listener, SourceType::Podcast, AudioItem::Song(song("x", "band")), "band");
        assert!(record_play(&mut listener, &mut [], &mut []).is_err());
    }
}
