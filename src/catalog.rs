//! Audio catalog: songs, albums, podcasts, playlists and creator extras.
//!
//! The catalog is the part of the platform that only stores things. It keeps
//! songs in insertion order, which is the "collection order" recommendation
//! strategies draw from, and answers the ownership questions the revenue
//! allocator needs ("does this artist own a song with this name?").

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// A song as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    /// Filled in from the owning album when the album is added.
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub artist: String,
    pub genre: String,
    /// Length in seconds.
    pub duration: u32,
}

/// A podcast episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    pub duration: u32,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Album {
    pub name: String,
    pub owner: String,
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Podcast {
    pub name: String,
    pub owner: String,
    pub episodes: Vec<Episode>,
}

/// An ordered list of songs owned by a listener (or generated for one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    pub name: String,
    pub owner: String,
    pub songs: Vec<Song>,
}

impl Playlist {
    #[must_use]
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            songs: Vec::new(),
        }
    }

    /// Adds the song if absent, removes it if present. Returns `true` when added.
    pub fn toggle(&mut self, song: &Song) -> bool {
        match self.songs.iter().position(|s| s == song) {
            Some(index) => {
                self.songs.remove(index);
                false
            }
            None => {
                self.songs.push(song.clone());
                true
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merchandise {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Every piece of audio content known to the platform.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    songs: Vec<Song>,
    albums: Vec<Album>,
    podcasts: Vec<Podcast>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an album and its songs. Album names are unique per artist.
    pub fn add_album(&mut self, album: Album) -> Result<()> {
        if self
            .albums
            .iter()
            .any(|a| a.owner == album.owner && a.name == album.name)
        {
            bail!("{} has another album with the same name.", album.owner);
        }
        self.songs.extend(album.songs.iter().cloned());
        self.albums.push(album);
        Ok(())
    }

    /// Registers a podcast. Podcast names are unique per host.
    pub fn add_podcast(&mut self, podcast: Podcast) -> Result<()> {
        if self
            .podcasts
            .iter()
            .any(|p| p.owner == podcast.owner && p.name == podcast.name)
        {
            bail!("{} has another podcast with the same name.", podcast.owner);
        }
        self.podcasts.push(podcast);
        Ok(())
    }

    /// First song with this name, in catalog order.
    #[must_use]
    pub fn song(&self, name: &str) -> Option<&Song> {
        self.songs.iter().find(|s| s.name == name)
    }

    /// Album lookup by name only, first match in catalog order.
    #[must_use]
    pub fn album_named(&self, name: &str) -> Option<&Album> {
        self.albums.iter().find(|a| a.name == name)
    }

    #[must_use]
    pub fn podcast(&self, name: &str) -> Option<&Podcast> {
        self.podcasts.iter().find(|p| p.name == name)
    }

    /// Songs of one genre, in catalog order.
    pub fn songs_by_genre<'a>(&'a self, genre: &'a str) -> impl Iterator<Item = &'a Song> + 'a {
        self.songs.iter().filter(move |s| s.genre == genre)
    }

    /// Whether any album owned by `artist` contains a song called `song_name`.
    #[must_use]
    pub fn artist_has_song(&self, artist: &str, song_name: &str) -> bool {
        self.albums
            .iter()
            .filter(|a| a.owner == artist)
            .flat_map(|a| a.songs.iter())
            .any(|s| s.name == song_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(name: &str, artist: &str, genre: &str) -> Song {
        Song {
            name: name.to_string(),
            album: format!("{artist} LP"),
            artist: artist.to_string(),
            genre: genre.to_string(),
            duration: 180,
        }
    }

    fn album(owner: &str, songs: Vec<Song>) -> Album {
        Album {
            name: format!("{owner} LP"),
            owner: owner.to_string(),
            songs,
        }
    }

    #[test]
    fn test_songs_keep_insertion_order() -> Result<()> {
        let mut catalog = Catalog::new();
        catalog.add_album(album("b", vec![song("z", "b", "pop"), song("a", "b", "pop")]))?;

        let names: Vec<_> = catalog.songs_by_genre("pop").map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["z", "a"]);
        Ok(())
    }

    #[test]
    fn test_duplicate_album_rejected() -> Result<()> {
        let mut catalog = Catalog::new();
        catalog.add_album(album("a", vec![song("x", "a", "rock")]))?;
        assert!(catalog.add_album(album("a", vec![])).is_err());
        Ok(())
    }

    #[test]
    fn test_artist_has_song_checks_ownership() -> Result<()> {
        let mut catalog = Catalog::new();
        catalog.add_album(album("a", vec![song("x", "a", "rock")]))?;
        catalog.add_album(album("b", vec![song("y", "b", "rock")]))?;

        assert!(catalog.artist_has_song("a", "x"));
        assert!(!catalog.artist_has_song("a", "y"));
        Ok(())
    }

    #[test]
    fn test_playlist_toggle() {
        let mut playlist = Playlist::new("mix", "me");
        let s = song("x", "a", "rock");
        assert!(playlist.toggle(&s));
        assert!(!playlist.toggle(&s));
        assert!(playlist.songs.is_empty());
    }
}
