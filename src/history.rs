//! Per-listener page model and back/forward navigation history.
//!
//! The history behaves like a browser's: going back and then visiting a new
//! page discards everything that was ahead of the cursor.

use serde::Serialize;
use std::fmt;

/// A page a listener can be on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Page {
    Home,
    LikedContent,
    /// Page of the named artist.
    Artist(String),
    /// Page of the named host.
    Host(String),
}

impl Page {
    /// Owner of a creator page, if this is one.
    #[must_use]
    pub fn creator(&self) -> Option<&str> {
        match self {
            Page::Artist(name) | Page::Host(name) => Some(name),
            Page::Home | Page::LikedContent => None,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Page::Home => write!(f, "Home"),
            Page::LikedContent => write!(f, "LikedContent"),
            Page::Artist(_) => write!(f, "Artist"),
            Page::Host(_) => write!(f, "Host"),
        }
    }
}

/// Result of a back/forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    Moved,
    /// Already at the boundary; the cursor did not move.
    AtBoundary,
}

/// Ordered visited pages with a movable cursor.
///
/// The cursor is `None` while the history is empty and otherwise always a
/// valid index.
#[derive(Debug, Clone)]
pub struct NavigationHistory<P = Page> {
    pages: Vec<P>,
    cursor: Option<usize>,
}

impl<P> Default for NavigationHistory<P> {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            cursor: None,
        }
    }
}

impl<P> NavigationHistory<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Truncates forward entries, appends `page` and moves the cursor onto it.
    pub fn add_page(&mut self, page: P) {
        self.delete_pages_after_current();
        self.pages.push(page);
        self.cursor = Some(self.pages.len() - 1);
    }

    /// Drops every entry after the cursor. No-op when the cursor is last.
    pub fn delete_pages_after_current(&mut self) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.pages.truncate(keep);
    }

    pub fn go_back(&mut self) -> NavigationOutcome {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                NavigationOutcome::Moved
            }
            _ => NavigationOutcome::AtBoundary,
        }
    }

    pub fn go_forward(&mut self) -> NavigationOutcome {
        match self.cursor {
            Some(c) if c + 1 < self.pages.len() => {
                self.cursor = Some(c + 1);
                NavigationOutcome::Moved
            }
            _ => NavigationOutcome::AtBoundary,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&P> {
        self.cursor.and_then(|c| self.pages.get(c))
    }

    /// Cursor as a signed index, `-1` when empty.
    #[must_use]
    pub fn index(&self) -> isize {
        self.cursor.map_or(-1, |c| c as isize)
    }

    #[must_use]
    pub fn pages(&self) -> &[P] {
        &self.pages
    }
}
