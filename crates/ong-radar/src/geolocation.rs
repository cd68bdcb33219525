//! Best-effort location acquisition.
//!
//! Two layers are involved. A [`PositionSource`] is the raw device: it may be
//! slow, deny permission or fail outright. A [`GeolocationProvider`] is what
//! the coordinator consumes and it never fails; [`Geolocator`] turns the
//! former into the latter by bounding the wait, reusing recent fixes and
//! falling back to a fixed reference point.

use std::{future::Future, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, instrument, warn};

/// A WGS84 latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// São Paulo city centre.
pub const DEFAULT_FALLBACK: Coordinates = Coordinates::new(-23.55052, -46.633308);

/// A fix reported by a [`PositionSource`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub coords: Coordinates,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    pub fn now(coords: Coordinates) -> Self {
        Self {
            coords,
            timestamp: Utc::now(),
        }
    }

    /// Wall-clock time since the fix was taken. Zero for timestamps in the
    /// future.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp).to_std().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Upper bound on how long a single fix may take.
    pub timeout: Duration,
    /// How old a previously obtained fix may be and still be reused.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            maximum_age: Duration::from_secs(60),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("Timed out waiting for a position fix")]
    Timeout,
}

/// A device-like origin of position fixes.
pub trait PositionSource: Send + Sync + 'static {
    fn current_position(&self) -> impl Future<Output = Result<Position, GeolocationError>> + Send;
}

impl<T: PositionSource> PositionSource for Arc<T> {
    fn current_position(&self) -> impl Future<Output = Result<Position, GeolocationError>> + Send {
        (**self).current_position()
    }
}

/// A source for hosts without any positioning hardware.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositionSource;

impl PositionSource for NoPositionSource {
    async fn current_position(&self) -> Result<Position, GeolocationError> {
        Err(GeolocationError::PositionUnavailable(
            "no position source configured".into(),
        ))
    }
}

/// Infallible location capability.
///
/// `acquire` always resolves, either with a real fix or with a fallback.
pub trait GeolocationProvider: Send + Sync + 'static {
    fn acquire(&self) -> impl Future<Output = Coordinates> + Send;
}

impl<T: GeolocationProvider> GeolocationProvider for Arc<T> {
    fn acquire(&self) -> impl Future<Output = Coordinates> + Send {
        (**self).acquire()
    }
}

/// Always answers with the same coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedLocation(pub Coordinates);

impl GeolocationProvider for FixedLocation {
    async fn acquire(&self) -> Coordinates {
        self.0
    }
}

/// Wraps a [`PositionSource`] with a timeout, a maximum-age cache and a
/// fallback coordinate.
#[derive(Debug)]
pub struct Geolocator<S> {
    source: S,
    options: PositionOptions,
    fallback: Coordinates,
    last_fix: Mutex<Option<(Instant, Position)>>,
}

impl<S: PositionSource> Geolocator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: PositionOptions::default(),
            fallback: DEFAULT_FALLBACK,
            last_fix: Mutex::new(None),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn with_fallback(mut self, fallback: Coordinates) -> Self {
        self.fallback = fallback;
        self
    }

    pub const fn fallback(&self) -> Coordinates {
        self.fallback
    }

    /// Ask the source for a fix, bounded by the configured timeout. Unlike
    /// [`GeolocationProvider::acquire`] this reports failures.
    ///
    /// A fix whose own timestamp is older than the maximum age is rejected as
    /// [`GeolocationError::PositionUnavailable`].
    pub async fn locate(&self) -> Result<Position, GeolocationError> {
        if let Some(position) = self.recent_fix().await {
            debug!(?position, "Reusing recent position fix");
            return Ok(position);
        }

        let position = tokio::time::timeout(self.options.timeout, self.source.current_position())
            .await
            .map_err(|_| GeolocationError::Timeout)??;

        let age = position.age();
        if age > self.options.maximum_age {
            return Err(GeolocationError::PositionUnavailable(format!(
                "fix is {}s old, at most {}s allowed",
                age.as_secs(),
                self.options.maximum_age.as_secs()
            )));
        }

        *self.last_fix.lock().await = Some((Instant::now(), position));
        Ok(position)
    }

    /// The cached fix, if neither the time since it was stored nor its own
    /// timestamp exceeds the maximum age.
    async fn recent_fix(&self) -> Option<Position> {
        let last_fix = *self.last_fix.lock().await;
        last_fix
            .filter(|(stored, position)| {
                stored.elapsed().max(position.age()) <= self.options.maximum_age
            })
            .map(|(_, position)| position)
    }
}

impl<S: PositionSource> GeolocationProvider for Geolocator<S> {
    #[instrument(name = "Acquire location", skip_all, level = "debug")]
    async fn acquire(&self) -> Coordinates {
        match self.locate().await {
            Ok(position) => position.coords,
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = ?self.fallback,
                    "Geolocation unavailable, using fallback coordinate"
                );
                self.fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    enum Behaviour {
        Fix(Coordinates),
        /// A fix the device took this many seconds ago.
        OldFix(Coordinates, i64),
        Deny,
        Hang,
    }

    struct ScriptedSource {
        behaviour: Behaviour,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(behaviour: Behaviour) -> Self {
            Self {
                behaviour,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PositionSource for ScriptedSource {
        async fn current_position(&self) -> Result<Position, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Fix(coords) => Ok(Position::now(coords)),
                Behaviour::OldFix(coords, secs) => Ok(Position {
                    coords,
                    timestamp: Utc::now() - chrono::TimeDelta::seconds(secs),
                }),
                Behaviour::Deny => Err(GeolocationError::PermissionDenied),
                Behaviour::Hang => std::future::pending().await,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_fix_is_used() {
        let here = Coordinates::new(-23.5, -46.6);
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::Fix(here)));

        assert_eq!(geo.acquire().await, here);
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_permission_falls_back() {
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::Deny));

        assert_eq!(geo.acquire().await, DEFAULT_FALLBACK);
        assert_eq!(
            geo.locate().await.unwrap_err(),
            GeolocationError::PermissionDenied
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_source_times_out_to_fallback() {
        let custom = Coordinates::new(-22.9, -43.2);
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::Hang)).with_fallback(custom);

        let started = Instant::now();
        assert_eq!(geo.acquire().await, custom);
        assert_eq!(started.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recent_fix_is_reused_until_it_expires() {
        let here = Coordinates::new(1.0, 2.0);
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::Fix(here)));

        geo.acquire().await;
        tokio::time::advance(Duration::from_secs(30)).await;
        geo.acquire().await;
        assert_eq!(geo.source.calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        geo.acquire().await;
        assert_eq!(geo.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_device_fix_falls_back() {
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::OldFix(
            Coordinates::new(1.0, 2.0),
            600,
        )));

        assert_eq!(geo.acquire().await, DEFAULT_FALLBACK);
        assert!(matches!(
            geo.locate().await,
            Err(GeolocationError::PositionUnavailable(_))
        ));
        // Rejected fixes are not cached.
        assert_eq!(geo.source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_fix_within_maximum_age_is_used() {
        let here = Coordinates::new(1.0, 2.0);
        let geo = Geolocator::new(ScriptedSource::new(Behaviour::OldFix(here, 30)));

        assert_eq!(geo.acquire().await, here);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_geolocator_reuses_fix() {
        let here = Coordinates::new(1.0, 2.0);
        let geo = Arc::new(Geolocator::new(ScriptedSource::new(Behaviour::Fix(here))));
        let other = Arc::clone(&geo);

        assert_eq!(geo.acquire().await, here);
        assert_eq!(other.acquire().await, here);
        assert_eq!(geo.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_device_falls_back() {
        let geo = Geolocator::new(NoPositionSource);
        assert_eq!(geo.acquire().await, DEFAULT_FALLBACK);
    }

    #[tokio::test]
    async fn test_fixed_location() {
        let here = Coordinates::new(10.0, 20.0);
        assert_eq!(FixedLocation(here).acquire().await, here);
    }
}
