//! Page cursor for ranked lists.
//!
//! A [`Paginator`] is `Active` until it is expired, after which every navigation
//! call fails with [`Error::SessionExpired`]. The bot layer drives expiry: it
//! calls [`Paginator::expire`] once no navigation event arrived within the idle
//! timeout.

use crate::errors::{Error, Result};
use std::ops::Range;

/// Lifecycle of a paginated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    /// Accepting navigation
    Active,
    /// Timed out; controls are gone
    Expired,
}

/// Direction of a page button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// One page back
    Prev,
    /// One page forward
    Next,
}

/// Cursor over `entries` items shown `page_size` at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    total_pages: usize,
    page_size: usize,
    entries: usize,
    state: PageState,
}

impl Paginator {
    /// Starts at page 0. A zero `page_size` is treated as 1.
    #[must_use]
    pub fn new(entries: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            page: 0,
            total_pages: Self::pages_for(entries, page_size),
            page_size,
            entries,
            state: PageState::Active,
        }
    }

    /// `ceil(entries / page_size)`, with an empty list still having one page.
    const fn pages_for(entries: usize, page_size: usize) -> usize {
        let pages = entries.div_ceil(page_size);
        if pages == 0 { 1 } else { pages }
    }

    /// Current zero-based page.
    #[must_use]
    pub const fn page(&self) -> usize {
        self.page
    }

    /// Number of pages, at least 1.
    #[must_use]
    pub const fn total_pages(&self) -> usize {
        self.total_pages
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> PageState {
        self.state
    }

    /// Whether `prev` would move.
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 0
    }

    /// Whether `next` would move.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page + 1 < self.total_pages
    }

    const fn ensure_active(&self) -> Result<()> {
        match self.state {
            PageState::Active => Ok(()),
            PageState::Expired => Err(Error::SessionExpired),
        }
    }

    /// Moves one page forward. Returns whether the page changed.
    pub fn next(&mut self) -> Result<bool> {
        self.ensure_active()?;
        if self.has_next() {
            self.page += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Moves one page back. Returns whether the page changed.
    pub fn prev(&mut self) -> Result<bool> {
        self.ensure_active()?;
        if self.has_prev() {
            self.page -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Applies a button press.
    pub fn navigate(&mut self, direction: Direction) -> Result<bool> {
        match direction {
            Direction::Prev => self.prev(),
            Direction::Next => self.next(),
        }
    }

    /// Switches to a new list (different metric): back to page 0.
    pub fn reset(&mut self, entries: usize) -> Result<()> {
        self.ensure_active()?;
        self.entries = entries;
        self.total_pages = Self::pages_for(entries, self.page_size);
        self.page = 0;
        Ok(())
    }

    /// Enters the terminal state.
    pub const fn expire(&mut self) {
        self.state = PageState::Expired;
    }

    /// Index range of the current page within the full list.
    #[must_use]
    pub fn page_range(&self) -> Range<usize> {
        let start = (self.page * self.page_size).min(self.entries);
        let end = (start + self.page_size).min(self.entries);
        start..end
    }

    /// `"Page 2/3"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("Page {}/{}", self.page + 1, self.total_pages)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_total_pages() {
        assert_eq!(Paginator::new(10, 5).total_pages(), 2);
        assert_eq!(Paginator::new(11, 5).total_pages(), 3);
        assert_eq!(Paginator::new(1, 5).total_pages(), 1);
        assert_eq!(Paginator::new(0, 5).total_pages(), 1);
    }

    #[test]
    fn test_next_stops_at_last_page() {
        let mut p = Paginator::new(7, 5);
        assert!(p.next().unwrap());
        assert_eq!(p.page(), 1);
        assert!(!p.next().unwrap());
        assert_eq!(p.page(), 1);
    }

    #[test]
    fn test_prev_stops_at_first_page() {
        let mut p = Paginator::new(7, 5);
        assert!(!p.prev().unwrap());
        assert_eq!(p.page(), 0);
        p.next().unwrap();
        assert!(p.prev().unwrap());
        assert_eq!(p.page(), 0);
    }

    #[test]
    fn test_page_stays_in_range() {
        let mut p = Paginator::new(23, 5);
        for _ in 0..10 {
            p.navigate(Direction::Next).unwrap();
            assert!(p.page() < p.total_pages());
        }
        assert_eq!(p.page(), 4);
        for _ in 0..10 {
            p.navigate(Direction::Prev).unwrap();
        }
        assert_eq!(p.page(), 0);
    }

    #[test]
    fn test_page_range() {
        let mut p = Paginator::new(7, 5);
        assert_eq!(p.page_range(), 0..5);
        p.next().unwrap();
        assert_eq!(p.page_range(), 5..7);
        assert_eq!(Paginator::new(0, 5).page_range(), 0..0);
    }

    #[test]
    fn test_reset_returns_to_first_page() {
        let mut p = Paginator::new(10, 5);
        p.next().unwrap();
        p.reset(3).unwrap();
        assert_eq!(p.page(), 0);
        assert_eq!(p.total_pages(), 1);
        assert!(!p.has_next());
    }

    #[test]
    fn test_expired_rejects_navigation() {
        let mut p = Paginator::new(10, 5);
        p.expire();
        assert_eq!(p.state(), PageState::Expired);
        assert!(matches!(p.next(), Err(Error::SessionExpired)));
        assert!(matches!(p.prev(), Err(Error::SessionExpired)));
        assert!(matches!(p.reset(4), Err(Error::SessionExpired)));
        assert_eq!(p.page(), 0);
    }

    #[test]
    fn test_label() {
        let mut p = Paginator::new(10, 5);
        assert_eq!(p.label(), "Page 1/2");
        p.next().unwrap();
        assert_eq!(p.label(), "Page 2/2");
    }
}
