use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::HelpType;

/// A fully resolved search request.
///
/// Two descriptors compare equal exactly when they would produce the same
/// query string, so equality is a valid "same request" check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescriptor {
    pub skip: u32,
    pub limit: u32,
    /// Already trimmed and never empty when present.
    pub name: Option<String>,
    /// Sorted and free of duplicates. Empty means "any".
    pub help_types: Vec<HelpType>,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

impl QueryDescriptor {
    /// Query parameters in the order the backend documents them.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(name) = &self.name {
            pairs.push(("name", name.clone()));
        }
        pairs.extend(
            self.help_types
                .iter()
                .map(|h| ("help_type", h.as_str().to_string())),
        );
        pairs.push(("latitude", self.latitude.to_string()));
        pairs.push(("longitude", self.longitude.to_string()));
        pairs.push(("radius_km", self.radius_km.to_string()));
        pairs
    }

    /// Human readable form of [`Self::query_pairs`], used for logging.
    pub fn to_query_string(&self) -> String {
        self.query_pairs()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .join("&")
    }

    pub const fn page(&self) -> u32 {
        if self.limit == 0 {
            1
        } else {
            self.skip / self.limit + 1
        }
    }
}
