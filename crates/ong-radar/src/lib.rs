//! ong-radar - find animal-protection NGOs near you
//!
//! ong-radar drives a paginated organization search around the user's
//! position. It acquires a location once (falling back to a fixed reference
//! point when none is available), turns every committed filter change into a
//! single backend request, and makes sure only the newest request ever
//! reaches the view, no matter in which order responses come back.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use ong_radar::{
//!     CoordinatorConfigBuilder, HelpType, HttpSearchClient, NoPositionSource,
//!     SearchCoordinator, api::ApiConfig,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> ong_radar::error::Result<()> {
//! let config = CoordinatorConfigBuilder::new().build()?;
//! let geolocation = config.geolocator(NoPositionSource);
//! let client = HttpSearchClient::new(ApiConfig::from_env()?)?;
//!
//! let coordinator = SearchCoordinator::new(geolocation, client, config)?;
//! coordinator.activate();
//!
//! let view = coordinator.settled().await;
//! for org in &view.items {
//!     println!("{} ({})", org.name, org.location_label());
//! }
//!
//! // Filter changes go back to page 1 and supersede the running request.
//! coordinator.toggle_help_type(HelpType::TemporaryHome);
//! let view = coordinator.settled().await;
//! println!("page {} has_next={}", view.state.page, view.has_next);
//! # Ok(())
//! # }
//! ```
//!
//! # Pieces
//!
//! - [`SearchState`] / [`SearchPatch`]: the user's inputs and how they change
//! - [`build_query`]: inputs plus coordinates to a [`QueryDescriptor`]
//! - [`Geolocator`]: bounded, cached, never-failing location acquisition
//! - [`SearchCoordinator`]: the orchestration, publishing [`SearchView`]s
//! - [`RadiusSlider`], [`Pagination`]: helpers for the controls around a search
use once_cell::sync::OnceCell;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod config;
mod coordinator;
pub mod error;
mod filters;
mod geolocation;
mod query;
mod state;

pub use config::{CoordinatorConfig, CoordinatorConfigBuilder};
pub use coordinator::{SearchCoordinator, SearchFailure, SearchView, Stage, ViewPhase};
pub use filters::{Pagination, RadiusSlider, toggle_help_type};
pub use geolocation::{
    Coordinates, DEFAULT_FALLBACK, FixedLocation, GeolocationError, GeolocationProvider,
    Geolocator, NoPositionSource, Position, PositionOptions, PositionSource,
};
pub use ong_radar_api as api;
pub use ong_radar_api::{
    CancellationToken, HelpType, HttpSearchClient, OrganizationSearch, OrganizationSummary,
    QueryDescriptor,
};
pub use query::build_query;
pub use state::{
    DEFAULT_PAGE_SIZE, DEFAULT_RADIUS_KM, MAX_PAGE_SIZE, MAX_RADIUS_KM, MIN_RADIUS_KM,
    SearchPatch, SearchState, StateChange,
};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for ong-radar.
///
/// Installs a `tracing` subscriber filtered by `RUST_LOG` when set, otherwise
/// by `level`. Safe to call more than once; only the first call installs
/// anything.
///
/// # Examples
///
/// ```rust
/// use ong_radar::init_logging;
/// use tracing::Level;
///
/// init_logging(Level::INFO)?;
/// # Ok::<(), ong_radar::error::OngRadarError>(())
/// ```
pub fn init_logging(level: impl Into<LevelFilter>) -> Result<&'static (), error::OngRadarError> {
    LOGGER_INIT.get_or_try_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(level.into().to_string()))?
            .add_directive("hyper_util=warn".parse()?)
            .add_directive("reqwest=warn".parse()?);

        tracing_subscriber::fmt::fmt()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(())
    })
}
