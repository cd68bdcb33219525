//! Caller-side helpers for driving a search from filter controls.
//!
//! None of these talk to the coordinator directly; they produce the values
//! or [`SearchPatch`]es a UI hands over when the user commits an edit.

use std::{collections::BTreeSet, ops::RangeInclusive};

use ong_radar_api::HelpType;

use crate::state::SearchPatch;

/// Drag-to-preview radius control.
///
/// While dragging, only the preview moves. The committed value, the one the
/// search runs with, changes on release and only when it actually differs.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusSlider {
    preview: f64,
    committed: f64,
    bounds: RangeInclusive<f64>,
}

impl RadiusSlider {
    pub fn new(committed: f64, bounds: RangeInclusive<f64>) -> Self {
        let committed = committed.clamp(*bounds.start(), *bounds.end());
        Self {
            preview: committed,
            committed,
            bounds,
        }
    }

    pub const fn preview(&self) -> f64 {
        self.preview
    }

    pub const fn committed(&self) -> f64 {
        self.committed
    }

    pub fn input(&mut self, value: f64) {
        self.preview = self.clamp(value);
    }

    /// Returns the new radius when it differs from the committed one.
    pub fn commit(&mut self, value: f64) -> Option<f64> {
        let value = self.clamp(value);
        self.preview = value;
        if value == self.committed {
            return None;
        }
        self.committed = value;
        Some(value)
    }

    /// Commit whatever the preview currently shows, e.g. on blur.
    pub fn commit_preview(&mut self) -> Option<f64> {
        self.commit(self.preview)
    }

    /// Follow a radius set from elsewhere.
    pub fn sync(&mut self, committed: f64) {
        self.committed = self.clamp(committed);
        self.preview = self.committed;
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.committed;
        }
        value.clamp(*self.bounds.start(), *self.bounds.end())
    }
}

/// Patch that flips `help` in or out of the current selection.
pub fn toggle_help_type(current: &BTreeSet<HelpType>, help: HelpType) -> SearchPatch {
    let mut next = current.clone();
    if !next.remove(&help) {
        next.insert(help);
    }
    SearchPatch::new().help_types(next)
}

/// Previous/next controls for a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub has_next: bool,
}

impl Pagination {
    pub const fn can_prev(&self) -> bool {
        self.page > 1
    }

    pub const fn can_next(&self) -> bool {
        self.has_next
    }

    pub fn prev(&self) -> Option<SearchPatch> {
        self.can_prev()
            .then(|| SearchPatch::new().page(self.page - 1))
    }

    pub fn next(&self) -> Option<SearchPatch> {
        self.can_next()
            .then(|| SearchPatch::new().page(self.page.saturating_add(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{MAX_RADIUS_KM, MIN_RADIUS_KM};

    fn slider() -> RadiusSlider {
        RadiusSlider::new(25.0, MIN_RADIUS_KM..=MAX_RADIUS_KM)
    }

    #[test]
    fn test_dragging_only_moves_preview() {
        let mut s = slider();
        s.input(40.0);
        s.input(60.0);
        assert_eq!(s.preview(), 60.0);
        assert_eq!(s.committed(), 25.0);

        assert_eq!(s.commit_preview(), Some(60.0));
        assert_eq!(s.committed(), 60.0);
    }

    #[test]
    fn test_commit_of_same_value_is_ignored() {
        let mut s = slider();
        s.input(80.0);
        assert_eq!(s.commit(25.0), None);
        assert_eq!(s.preview(), 25.0);
    }

    #[test]
    fn test_slider_clamps() {
        let mut s = slider();
        assert_eq!(s.commit(1_000.0), Some(200.0));
        s.input(0.0);
        assert_eq!(s.preview(), 3.0);
        s.input(f64::NAN);
        assert_eq!(s.preview(), 200.0);

        s.sync(10.0);
        assert_eq!((s.preview(), s.committed()), (10.0, 10.0));
    }

    #[test]
    fn test_toggle_help_type() {
        let empty = BTreeSet::new();
        let on = toggle_help_type(&empty, HelpType::Donation);
        let selected = on.help_types.clone().unwrap();
        assert!(selected.contains(&HelpType::Donation));

        let off = toggle_help_type(&selected, HelpType::Donation);
        assert!(off.help_types.unwrap().is_empty());
    }

    #[test]
    fn test_pagination_bounds() {
        let first = Pagination {
            page: 1,
            has_next: true,
        };
        assert!(first.prev().is_none());
        assert_eq!(first.next(), Some(SearchPatch::new().page(2)));

        let last = Pagination {
            page: 4,
            has_next: false,
        };
        assert!(last.next().is_none());
        assert_eq!(last.prev(), Some(SearchPatch::new().page(3)));
    }
}
