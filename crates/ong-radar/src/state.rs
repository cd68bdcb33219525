//! User-controlled search inputs and the rules for changing them.

use std::{collections::BTreeSet, ops::RangeInclusive};

use ong_radar_api::HelpType;

pub const DEFAULT_PAGE_SIZE: u32 = 9;
pub const DEFAULT_RADIUS_KM: f64 = 25.0;
pub const MIN_RADIUS_KM: f64 = 3.0;
pub const MAX_RADIUS_KM: f64 = 200.0;
/// Largest page the backend will serve.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters and position in the result space.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchState {
    /// Free text, kept as typed. Trimmed only when a query is built.
    pub name: String,
    pub radius_km: f64,
    pub help_types: BTreeSet<HelpType>,
    /// 1-based.
    pub page: u32,
    pub limit: u32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            name: String::new(),
            radius_km: DEFAULT_RADIUS_KM,
            help_types: BTreeSet::new(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchState {
    pub fn trimmed_name(&self) -> Option<&str> {
        Some(self.name.trim()).filter(|n| !n.is_empty())
    }

    pub const fn skip(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Apply `patch` in place and report what actually changed.
    ///
    /// Any change to `name`, `radius_km` or `help_types` moves back to page 1,
    /// even when the same patch also asks for a page.
    pub fn apply(&mut self, patch: SearchPatch, radius_bounds: &RangeInclusive<f64>) -> StateChange {
        let mut change = StateChange::default();

        if let Some(name) = patch.name
            && name != self.name
        {
            self.name = name;
            change.name = true;
        }

        if let Some(radius) = patch.radius_km
            && !radius.is_nan()
        {
            let radius = radius.clamp(*radius_bounds.start(), *radius_bounds.end());
            if radius != self.radius_km {
                self.radius_km = radius;
                change.radius = true;
            }
        }

        if let Some(help_types) = patch.help_types
            && help_types != self.help_types
        {
            self.help_types = help_types;
            change.help_types = true;
        }

        if let Some(limit) = patch.limit {
            let limit = limit.clamp(1, MAX_PAGE_SIZE);
            if limit != self.limit {
                self.limit = limit;
                change.limit = true;
            }
        }

        let page = if change.filters() {
            Some(1)
        } else {
            patch.page.map(|p| p.max(1))
        };
        if let Some(page) = page
            && page != self.page
        {
            self.page = page;
            change.page = true;
        }

        change
    }
}

/// A partial update to [`SearchState`]. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPatch {
    pub name: Option<String>,
    pub radius_km: Option<f64>,
    pub help_types: Option<BTreeSet<HelpType>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchPatch {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub const fn radius_km(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    #[must_use]
    pub fn help_types(mut self, help_types: impl IntoIterator<Item = HelpType>) -> Self {
        self.help_types = Some(help_types.into_iter().collect());
        self
    }

    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.radius_km.is_none()
            && self.help_types.is_none()
            && self.page.is_none()
            && self.limit.is_none()
    }
}

/// Which fields a [`SearchState::apply`] call modified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChange {
    pub name: bool,
    pub radius: bool,
    pub help_types: bool,
    pub page: bool,
    pub limit: bool,
}

impl StateChange {
    /// A filter changed, so the old page position is meaningless.
    pub const fn filters(&self) -> bool {
        self.name || self.radius || self.help_types
    }

    pub const fn any(&self) -> bool {
        self.filters() || self.page || self.limit
    }
}
