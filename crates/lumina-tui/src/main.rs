use anyhow::Result;
use lumina_bus::EventBus;
use lumina_core::Studio;
use lumina_gateway::{create_gateway, GatewayConfig};

/// Offline studio against the stub gateway.
#[tokio::main]
async fn main() -> Result<()> {
    let bus = EventBus::new(256);
    let gateway = create_gateway(&GatewayConfig::stub())?;
    let studio = Studio::new(gateway, lumina_tui::system_clipboard()).with_publisher(bus.publisher());
    lumina_tui::run_tui(studio, &bus, lumina_tui::TuiOptions::default()).await
}
