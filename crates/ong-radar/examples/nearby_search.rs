//! Nearby NGO search
//!
//! This example demonstrates a full search session against a running backend:
//! - Resolving a location (or falling back to the default reference point)
//! - Paging through results
//! - Changing filters, which supersedes the running request
//!
//! Point it at a backend with `ONG_RADAR_API_URL` and optionally pass a
//! position: `cargo run --example nearby_search -- -23.5 -46.6`

use ong_radar::{
    Coordinates, CoordinatorConfigBuilder, FixedLocation, GeolocationProvider, HelpType,
    HttpSearchClient, NoPositionSource, OrganizationSearch, SearchCoordinator, SearchView,
    ViewPhase, api::ApiConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ong_radar::init_logging(tracing::Level::INFO)?;

    let config = CoordinatorConfigBuilder::new().build()?;
    let client = HttpSearchClient::new(ApiConfig::from_env()?)?;

    let args: Vec<f64> = std::env::args()
        .skip(1)
        .filter_map(|a| a.parse().ok())
        .collect();

    if let [lat, lng] = args[..] {
        let here = FixedLocation(Coordinates::new(lat, lng));
        run(SearchCoordinator::new(here, client, config)?).await;
    } else {
        // No device here, so this always lands on the fallback coordinate.
        let geolocation = config.geolocator(NoPositionSource);
        run(SearchCoordinator::new(geolocation, client, config)?).await;
    }

    Ok(())
}

async fn run<G: GeolocationProvider, C: OrganizationSearch>(coordinator: SearchCoordinator<G, C>) {
    coordinator.activate();
    print_view("Initial search", &coordinator.settled().await);

    if coordinator.next_page() {
        print_view("Next page", &coordinator.settled().await);
    }

    // Quick successive edits: only the last one is searched.
    coordinator.set_radius_km(10.0);
    coordinator.set_radius_km(80.0);
    coordinator.toggle_help_type(HelpType::TemporaryHome);
    print_view(
        "Within 80 km offering a temporary home",
        &coordinator.settled().await,
    );

    coordinator.shutdown();
}

fn print_view(title: &str, view: &SearchView) {
    let state = &view.state;
    println!(
        "\n{title} (page {}, radius {} km, request #{})",
        state.page, state.radius_km, view.request_seq
    );

    match view.phase() {
        ViewPhase::Locating => println!("  Still locating..."),
        ViewPhase::Loading => println!("  Loading..."),
        ViewPhase::Failed => println!("  Search failed, try changing a filter"),
        ViewPhase::Empty => println!("  No organizations found in this area"),
        ViewPhase::Results => {
            for org in &view.items {
                println!(
                    "  {:<30} {:<22} {:>8}  dogs: {:<3} cats: {}",
                    org.name,
                    org.location_label(),
                    org.distance_label().unwrap_or_default(),
                    org.dogs_count,
                    org.cats_count
                );
            }
            if view.has_next {
                println!("  (more results on the next page)");
            }
        }
    }
}
