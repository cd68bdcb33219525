use ong_radar_api::QueryDescriptor;

use crate::{geolocation::Coordinates, state::SearchState};

/// Turn the current inputs into the request that should be sent.
///
/// Pure: equal inputs always give equal descriptors.
pub fn build_query(state: &SearchState, coords: Coordinates) -> QueryDescriptor {
    QueryDescriptor {
        skip: state.skip(),
        limit: state.limit,
        name: state.trimmed_name().map(str::to_string),
        help_types: state.help_types.iter().copied().collect(),
        latitude: coords.lat,
        longitude: coords.lng,
        radius_km: state.radius_km,
    }
}
