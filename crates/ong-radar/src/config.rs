use std::{ops::RangeInclusive, time::Duration};

use crate::{
    error::OngRadarError,
    geolocation::{Coordinates, DEFAULT_FALLBACK, Geolocator, PositionOptions, PositionSource},
    state::{
        DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_KM, MAX_PAGE_SIZE, MAX_RADIUS_KM, MIN_RADIUS_KM,
        SearchState,
    },
};

/// Tunables for a [`crate::SearchCoordinator`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    pub page_size: u32,
    pub default_radius_km: f64,
    pub radius_bounds: RangeInclusive<f64>,
    /// Quiet period after a name edit before the request goes out.
    pub name_debounce: Duration,
    pub position_options: PositionOptions,
    pub fallback: Coordinates,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            default_radius_km: DEFAULT_RADIUS_KM,
            radius_bounds: MIN_RADIUS_KM..=MAX_RADIUS_KM,
            name_debounce: Duration::from_millis(300),
            position_options: PositionOptions::default(),
            fallback: DEFAULT_FALLBACK,
        }
    }
}

impl CoordinatorConfig {
    pub fn builder() -> CoordinatorConfigBuilder {
        CoordinatorConfigBuilder::new()
    }

    pub fn initial_state(&self) -> SearchState {
        SearchState {
            radius_km: self.default_radius_km,
            limit: self.page_size,
            ..SearchState::default()
        }
    }

    /// A [`Geolocator`] over `source` using this config's timeout, maximum
    /// age and fallback.
    pub fn geolocator<S: PositionSource>(&self, source: S) -> Geolocator<S> {
        Geolocator::new(source)
            .with_options(self.position_options)
            .with_fallback(self.fallback)
    }
}

/// Builder for [`CoordinatorConfig`] with validation at [`Self::build`].
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfigBuilder {
    config: CoordinatorConfig,
}

impl CoordinatorConfigBuilder {
    /// Create a new builder with the default page size, radius and debounce
    pub fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
        }
    }

    /// No debounce on name edits. Every change is searched immediately.
    pub fn instant() -> Self {
        Self::new().name_debounce(Duration::ZERO)
    }

    /// Set how many organizations are requested per page
    pub const fn page_size(mut self, page_size: u32) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Set the radius a fresh search starts with
    pub const fn default_radius_km(mut self, radius_km: f64) -> Self {
        self.config.default_radius_km = radius_km;
        self
    }

    /// Set the range committed radii are clamped to
    pub const fn radius_bounds(mut self, min_km: f64, max_km: f64) -> Self {
        self.config.radius_bounds = min_km..=max_km;
        self
    }

    /// Set the quiet period after a name edit (zero disables debouncing)
    pub const fn name_debounce(mut self, delay: Duration) -> Self {
        self.config.name_debounce = delay;
        self
    }

    /// Set how long a single location fix may take
    pub const fn geolocation_timeout(mut self, timeout: Duration) -> Self {
        self.config.position_options.timeout = timeout;
        self
    }

    /// Set how old a location fix may be and still be used
    pub const fn maximum_position_age(mut self, age: Duration) -> Self {
        self.config.position_options.maximum_age = age;
        self
    }

    /// Set the coordinate used when no location can be obtained
    pub const fn fallback(mut self, lat: f64, lng: f64) -> Self {
        self.config.fallback = Coordinates::new(lat, lng);
        self
    }

    /// Validate and build the final configuration
    pub fn build(self) -> Result<CoordinatorConfig, OngRadarError> {
        let config = self.config;

        if !(1..=MAX_PAGE_SIZE).contains(&config.page_size) {
            return Err(OngRadarError::ConfigError(format!(
                "Page size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                config.page_size
            )));
        }

        let (min, max) = (*config.radius_bounds.start(), *config.radius_bounds.end());
        if !(min > 0.0 && min <= max && max.is_finite()) {
            return Err(OngRadarError::ConfigError(format!(
                "Radius bounds must satisfy 0 < min <= max, got {min}..={max}"
            )));
        }
        if !config.radius_bounds.contains(&config.default_radius_km) {
            return Err(OngRadarError::ConfigError(format!(
                "Default radius {} km lies outside {min}..={max}",
                config.default_radius_km
            )));
        }

        let Coordinates { lat, lng } = config.fallback;
        if !((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)) {
            return Err(OngRadarError::ConfigError(format!(
                "Fallback coordinate ({lat}, {lng}) is not a valid WGS84 position"
            )));
        }

        Ok(config)
    }
}
