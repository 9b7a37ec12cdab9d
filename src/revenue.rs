//! Revenue allocator: splits subscription and ad money among artists.
//!
//! Both flows share one proportional rule. With `total` the sum of a
//! listener's song plays in the relevant history:
//!
//! ```text
//! artist.song_revenue       += artist_plays / total * price
//! artist.profit[song]       += round2(song_plays / total * price)   (songs the artist owns)
//! ```
//!
//! Per-song amounts are rounded to cents before they enter the ledger;
//! artist totals are only rounded when reported. A history with zero plays
//! distributes nothing.

use crate::catalog::Catalog;
use crate::counter::RankedCounter;
use crate::profile::{ArtistProfile, ListenerProfile};
use log::{debug, warn};

/// Rounds half up to two decimals.
#[must_use]
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summary of one distribution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Payout {
    pub total_listens: u64,
    /// Amount credited to each artist's song revenue, in history order.
    pub artist_credits: Vec<(String, f64)>,
}

impl Payout {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artist_credits.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.artist_credits.iter().map(|(_, amount)| amount).sum()
    }
}

/// Splits one premium listener's subscription among the artists they played.
///
/// Used both when a subscription is cancelled and for listeners still premium
/// at the end of the run. The caller decides whether the history is cleared.
pub fn distribute_for_cancel(
    listener: &ListenerProfile,
    price: f64,
    artists: &mut [ArtistProfile],
    catalog: &Catalog,
) -> Payout {
    debug!("Settling subscription of {}", listener.username);
    distribute(
        &listener.premium_history_song,
        &listener.premium_history_artist,
        price,
        artists,
        catalog,
    )
}

/// Splits an ad's price among the artists in the listener's ad history and
/// resets the pending ad price. The ad history itself is left to the caller.
pub fn distribute_free(
    price: f64,
    listener: &mut ListenerProfile,
    artists: &mut [ArtistProfile],
    catalog: &Catalog,
) -> Payout {
    debug!("Settling ad revenue of {price} for {}", listener.username);
    let payout = distribute(
        &listener.ad_history.songs,
        &listener.ad_history.artists,
        price,
        artists,
        catalog,
    );
    listener.ad_price = 0;
    payout
}

fn distribute(
    song_history: &RankedCounter,
    artist_history: &RankedCounter,
    price: f64,
    artists: &mut [ArtistProfile],
    catalog: &Catalog,
) -> Payout {
    let total_listens = song_history.total();
    if total_listens == 0 {
        debug!("Empty history, nothing to distribute");
        return Payout::default();
    }
    #[allow(clippy::cast_precision_loss)]
    let total = total_listens as f64;

    let mut payout = Payout {
        total_listens,
        artist_credits: Vec::with_capacity(artist_history.len()),
    };
    for (artist_name, plays) in artist_history.ranked().iter() {
        let Some(artist) = artists.iter_mut().find(|a| a.username == artist_name) else {
            warn!("Artist {artist_name} not found, share not distributed");
            continue;
        };

        #[allow(clippy::cast_precision_loss)]
        let money = plays as f64 / total * price;
        artist.song_revenue += money;
        payout.artist_credits.push((artist_name.to_string(), money));

        for (song_name, song_plays) in song_history.iter() {
            if !catalog.artist_has_song(artist_name, song_name) {
                continue;
            }
            #[allow(clippy::cast_precision_loss)]
            let song_money = round_cents(song_plays as f64 / total * price);
            artist.profit_for_each_song.add(song_name, song_money);
        }
    }
    debug!(
        "Distributed {:.2} over {} artists",
        payout.total(),
        payout.artist_credits.len()
    );
    payout
}

/// Credits a merchandise sale to the artist selling `merch_name`.
///
/// The artist counts as listened to from then on. Returns the artist's name,
/// or `None` if nobody sells this item.
pub fn credit_merch(artists: &mut [ArtistProfile], merch_name: &str) -> Option<String> {
    let artist = artists
        .iter_mut()
        .find(|a| a.merch_item(merch_name).is_some())?;
    let price = artist.merch_item(merch_name).map_or(0, |m| m.price);
    artist.listened = true;
    artist.merch_revenue += f64::from(price);
    debug!("{} sold {merch_name} for {price}", artist.username);
    Some(artist.username.clone())
}
