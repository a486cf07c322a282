//! Schedule filter view: pure client-side filtering and fixed-size
//! pagination over a catalog snapshot.

use crate::catalog::Snapshot;
use crate::types::{Level, Session};
use chrono::{Local, NaiveDate};

/// Filter criteria over the schedule; unset fields pass everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleFilter {
    /// Same calendar day, in the viewer's local timezone
    pub day: Option<NaiveDate>,
    /// Exact level match
    pub level: Option<Level>,
    /// Exact trainer match
    pub trainer_id: Option<u64>,
    /// Case-insensitive substring of the title or the trainer name
    pub search: Option<String>,
}

impl ScheduleFilter {
    pub fn is_empty(&self) -> bool {
        self.day.is_none()
            && self.level.is_none()
            && self.trainer_id.is_none()
            && self.search.is_none()
    }

    /// Does a session pass the filter? `trainer_name` is the resolved
    /// display name used for search matching.
    pub fn matches(&self, session: &Session, trainer_name: &str) -> bool {
        let same_day = self.day.map_or(true, |day| {
            session.starts_at.with_timezone(&Local).date_naive() == day
        });
        let level_ok = self.level.map_or(true, |level| session.level == level);
        let trainer_ok = self
            .trainer_id
            .map_or(true, |id| session.trainer_id == id);
        let search_ok = self.search.as_deref().map_or(true, |query| {
            let query = query.to_lowercase();
            session.title.to_lowercase().contains(&query)
                || trainer_name.to_lowercase().contains(&query)
        });

        same_day && level_ok && trainer_ok && search_ok
    }
}

/// Paginated, filtered projection of a schedule snapshot.
///
/// Pages are 1-based. Changing the filter resets to page 1; refreshing
/// the snapshot re-clamps the page so it never points past the end.
#[derive(Clone, Debug)]
pub struct ScheduleView {
    snapshot: Snapshot,
    filter: ScheduleFilter,
    page: usize,
    page_size: usize,
}

impl ScheduleView {
    pub fn new(snapshot: Snapshot, page_size: usize) -> Self {
        Self {
            snapshot,
            filter: ScheduleFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn filter(&self) -> &ScheduleFilter {
        &self.filter
    }

    /// Replace the filter; the page always resets to 1.
    pub fn set_filter(&mut self, filter: ScheduleFilter) {
        self.filter = filter;
        self.page = 1;
    }

    /// Swap in freshly fetched data, keeping the filter.
    pub fn refresh(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.page = self.page.min(self.total_pages());
    }

    /// Sessions passing the filter, in snapshot (start-time) order.
    pub fn filtered(&self) -> Vec<&Session> {
        self.snapshot
            .sessions
            .iter()
            .filter(|s| self.filter.matches(s, self.snapshot.trainer_name(s.trainer_id)))
            .collect()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn total_pages(&self) -> usize {
        let filtered = self.filtered().len();
        (filtered.max(1) + self.page_size - 1) / self.page_size
    }

    /// Jump to a page, clamped into the valid range.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.total_pages());
    }

    pub fn next_page(&mut self) -> bool {
        if self.page < self.total_pages() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev_page(&mut self) -> bool {
        if self.page > 1 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// The current page's slice of the filtered, ordered sessions.
    pub fn page_items(&self) -> Vec<&Session> {
        let filtered = self.filtered();
        let start = (self.page - 1) * self.page_size;
        filtered
            .into_iter()
            .skip(start)
            .take(self.page_size)
            .collect()
    }
}
