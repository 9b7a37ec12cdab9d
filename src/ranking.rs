//! Ranking resolver and end-of-run report.
//!
//! Only artists that were listened to at least once (a play or a merch sale)
//! take part. They are ordered by total revenue, highest first, with the
//! artist name breaking ties, so ranks are dense and never shared.

use crate::counter::canonical_order;
use crate::profile::ArtistProfile;
use crate::revenue::round_cents;
use log::debug;
use serde::Serialize;

/// Recomputes totals, ranks and most profitable songs for every listened artist.
///
/// Artists that were never listened to keep `ranking == None`.
pub fn update_ranking(artists: &mut [ArtistProfile]) {
    let mut ranked: Vec<&mut ArtistProfile> = artists.iter_mut().filter(|a| a.listened).collect();

    for artist in &mut ranked {
        artist.total_revenue = artist.song_revenue + artist.merch_revenue;
        artist.most_profitable_song = artist
            .profit_for_each_song
            .leader()
            .map_or_else(|| "N/A".to_string(), |(song, _)| song.to_string());
    }

    ranked.sort_by(|a, b| {
        canonical_order(
            (a.username.as_str(), a.total_revenue),
            (b.username.as_str(), b.total_revenue),
        )
    });
    for (index, artist) in ranked.iter_mut().enumerate() {
        artist.ranking = Some(index + 1);
    }
    debug!("Ranked {} artists", ranked.len());
}

/// One line of the end-of-run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistReport {
    #[serde(skip)]
    pub name: String,
    pub merch_revenue: f64,
    pub song_revenue: f64,
    pub ranking: usize,
    pub most_profitable_song: String,
}

/// Ranks the artists and lists every ranked one in ranking order.
pub fn final_report(artists: &mut [ArtistProfile]) -> Vec<ArtistReport> {
    update_ranking(artists);
    let mut report: Vec<ArtistReport> = artists
        .iter()
        .filter_map(|artist| {
            Some(ArtistReport {
                name: artist.username.clone(),
                merch_revenue: artist.merch_revenue,
                song_revenue: round_cents(artist.song_revenue),
                ranking: artist.ranking?,
                most_profitable_song: artist.most_profitable_song.clone(),
            })
        })
        .collect();
    report.sort_by_key(|line| line.ranking);
    report
}
