//! Creator → listener notifications.
//!
//! A creator keeps an ordered subscriber list; notifying appends a message to
//! each subscriber's mailbox. Delivery is plain data, no callbacks.

use serde::Serialize;
use std::collections::VecDeque;

/// Kinds of creator announcements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    NewAlbum,
    NewEvent,
    NewMerchandise,
    NewPodcast,
    NewAnnouncement,
}

impl EventKind {
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            EventKind::NewAlbum => "New Album",
            EventKind::NewEvent => "New Event",
            EventKind::NewMerchandise => "New Merchandise",
            EventKind::NewPodcast => "New Podcast",
            EventKind::NewAnnouncement => "New Announcement",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub name: String,
    pub description: String,
}

/// Ordered set of subscribed listener names.
#[derive(Debug, Clone, Default)]
pub struct Subscribers {
    names: Vec<String>,
}

impl Subscribers {
    /// Subscribes `listener`, or unsubscribes if already present.
    /// Returns `true` when the listener is subscribed afterwards.
    pub fn toggle(&mut self, listener: &str) -> bool {
        match self.names.iter().position(|n| n == listener) {
            Some(index) => {
                self.names.remove(index);
                false
            }
            None => {
                self.names.push(listener.to_string());
                true
            }
        }
    }

    /// Subscribers in subscription order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Pending notifications of one listener.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    pending: VecDeque<Notification>,
}

impl Mailbox {
    pub fn push(&mut self, kind: EventKind, message: String) {
        self.pending.push_back(Notification {
            name: kind.title().to_string(),
            description: message,
        });
    }

    /// Returns every pending notification and leaves the mailbox empty.
    pub fn drain(&mut self) -> Vec<Notification> {
        self.pending.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
