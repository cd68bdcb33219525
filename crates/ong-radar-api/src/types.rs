use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ApiError;

/// The ways a visitor can help an organization.
///
/// The backend treats an absent filter as "any help type", so an empty
/// selection is never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HelpType {
    Donation,
    Volunteering,
    TemporaryHome,
}

impl HelpType {
    pub const ALL: [Self; 3] = [Self::Donation, Self::Volunteering, Self::TemporaryHome];

    /// Value used on the wire, both in query strings and JSON bodies.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donation => "donation",
            Self::Volunteering => "volunteering",
            Self::TemporaryHome => "temporary_home",
        }
    }

    /// Short label for filter chips.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Donation => "Donation",
            Self::Volunteering => "Volunteering",
            Self::TemporaryHome => "Temporary home",
        }
    }
}

impl fmt::Display for HelpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HelpType {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|h| h.as_str() == s.trim())
            .ok_or_else(|| ApiError::UnknownHelpType(s.to_string()))
    }
}

/// One organization as returned by the search endpoint.
///
/// Only the fields the result grid needs are mandatory; the rest of the
/// backend record is carried along when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub distance_km: Option<f64>,
    pub dogs_count: u32,
    pub cats_count: u32,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub help_types: Vec<HelpType>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl OrganizationSummary {
    /// `"City, ST"`, with a dash standing in for whichever part is missing.
    pub fn location_label(&self) -> String {
        format!(
            "{}, {}",
            self.city.as_deref().unwrap_or("—"),
            self.state.as_deref().unwrap_or("—")
        )
    }

    pub fn distance_label(&self) -> Option<String> {
        self.distance_km.map(|d| format!("{d:.1} km"))
    }

    pub fn offers(&self, help: HelpType) -> bool {
        self.help_types.contains(&help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "id": "2f1c",
        "created_at": "2025-03-01T12:00:00Z",
        "updated_at": "2025-03-02T12:00:00Z",
        "name": "Patas Amigas",
        "cnpj": "12345678000199",
        "city": "São Paulo",
        "state": "SP",
        "email": "contato@patas.org",
        "help_types": ["donation", "temporary_home"],
        "logo_url": null,
        "latitude": -23.56,
        "longitude": -46.64,
        "distance_km": 1.234,
        "dogs_count": 12,
        "cats_count": 4
    }"#;

    #[test]
    fn test_deserialize_backend_record() {
        let org: OrganizationSummary = serde_json::from_str(RECORD).unwrap();

        assert_eq!(org.id, "2f1c");
        assert_eq!(org.dogs_count, 12);
        assert_eq!(
            org.help_types,
            vec![HelpType::Donation, HelpType::TemporaryHome]
        );
        assert!(org.logo_url.is_none());
        assert!(org.created_at.is_some());
        assert_eq!(org.location_label(), "São Paulo, SP");
        assert_eq!(org.distance_label().as_deref(), Some("1.2 km"));
        assert!(org.offers(HelpType::TemporaryHome));
        assert!(!org.offers(HelpType::Volunteering));
    }

    #[test]
    fn test_minimal_record_defaults_optional_fields() {
        let org: OrganizationSummary = serde_json::from_str(
            r#"{"id": "a", "name": "Gatil", "dogs_count": 0, "cats_count": 9}"#,
        )
        .unwrap();

        assert!(org.help_types.is_empty());
        assert!(org.distance_label().is_none());
        assert_eq!(org.location_label(), "—, —");
    }

    #[test]
    fn test_help_type_wire_names() {
        for help in HelpType::ALL {
            let json = serde_json::to_string(&help).unwrap();
            assert_eq!(json, format!("\"{}\"", help.as_str()));
            assert_eq!(help.as_str().parse::<HelpType>().unwrap(), help);
        }
        assert!("adoption".parse::<HelpType>().is_err());
    }
}
