use async_trait::async_trait;
use fieldmap::prelude::*;

const BOUNDARIES: &str = r#"{
    "type": "FeatureCollection",
    "features": [
        {
            "type": "Feature",
            "properties": { "N03_001": "長野県" },
            "geometry": { "type": "Polygon", "coordinates": [[[137.5, 35.2], [138.7, 35.2], [138.7, 37.0], [137.5, 37.0], [137.5, 35.2]]] }
        },
        {
            "type": "Feature",
            "properties": { "N03_001": "東京都" },
            "geometry": { "type": "Polygon", "coordinates": [[[138.9, 35.5], [139.9, 35.5], [139.9, 35.9], [138.9, 35.9], [138.9, 35.5]]] }
        }
    ]
}"#;

/// Boundary dataset compiled into the binary
struct BundledBoundaries;

#[async_trait]
impl BoundarySource for BundledBoundaries {
    async fn fetch(&self) -> fieldmap::Result<String> {
        Ok(BOUNDARIES.to_string())
    }

    fn describe(&self) -> String {
        "bundled boundaries".to_string()
    }
}

/// Serves a blank tile for every request so the demo runs offline
struct BlankTiles;

#[async_trait]
impl TileFetcher for BlankTiles {
    async fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, CacheFailure> {
        Ok(vec![0u8; 4096])
    }
}

fn view(lat: f64, lng: f64, zoom: f64, half_span: f64) -> SettledViewport {
    SettledViewport::new(
        ViewportState::new(lat, lng, zoom),
        LatLngBounds::from_coords(lat - half_span, lng - half_span, lat + half_span, lng + half_span),
    )
}

/// Drives one offline map session without any UI
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    fieldmap::init_logging();

    println!("🗺️ fieldmap headless session");
    println!("============================");

    let tiles = TileStore::new();
    let mut map = OfflineMapBuilder::new()
        .with_dynamic_layers(vec![
            LayerConfig::new("cs-nagano", "CS立体図（長野県）", "https://example.org/cs/{z}/{x}/{y}.png"),
            LayerConfig::new("forest-nagano", "林相図（長野県）", "https://example.org/ft/{z}/{x}/{y}.png"),
        ])
        .with_backend(Arc::new(OfflineTileCache::with_store(BlankTiles, tiles.clone())))
        .with_confirmer(Arc::new(AutoConfirm::accept()))
        .with_estimator(Arc::new(TileStoreEstimator::new(tiles.clone(), 2 << 30)))
        .build()?;

    let notices = map.notifications().subscribe();
    let initial = map.initial_view();
    println!("📍 Opening at {:.5}, {:.5} zoom {}", initial.lat, initial.lng, initial.zoom);

    let report = map
        .start(Some(&BundledBoundaries as &dyn BoundarySource), view(initial.lat, initial.lng, initial.zoom, 0.002))
        .await;
    println!("💾 {} / {}", report.usage_label(), report.quota_label());

    // Pan into Nagano: its region layers become selectable
    let changes = map.on_viewport_settled(view(36.0, 138.0, 17.0, 0.0008));
    println!("🧭 Visible regions: {:?}", map.visible_regions());
    println!("➕ Offered layers: {:?}", changes.added);

    map.on_base_layer_change("cs-nagano")?;
    let op = map.save_active_layer().await?;
    println!(
        "⬇️ {} {}: {} ({}/{} tiles)",
        op.kind,
        op.layer_name,
        op.status.name(),
        op.completed_units,
        op.total_units
    );

    // Pan back to Tokyo: the Nagano layers disappear and so does the target
    let changes = map.on_viewport_settled(view(35.68, 139.76, 16.0, 0.002));
    println!("➖ Withdrawn layers: {:?}", changes.removed);
    let op = map.save_active_layer().await?;
    println!("🚫 Save without a layer: {:?}", op.status);

    map.on_base_layer_change("gsi-std")?;
    let op = map.remove_active_layer().await;
    println!("🗑️ {} {}: {}", op.kind, op.layer_name, op.status.name());

    let report = map.refresh_storage().await;
    println!("💾 {} / {}", report.usage_label(), report.quota_label());

    println!("\n📢 Status line history:");
    for notice in notices.try_iter() {
        println!("   [{:?}] {}", notice.kind, notice.message);
    }

    Ok(())
}
