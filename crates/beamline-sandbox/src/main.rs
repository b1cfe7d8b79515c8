use tracing_subscriber::EnvFilter;

use beamline_sandbox::scenario::Scenario;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/scenarios/proving_ground.toml".to_string());

    let ticks = std::env::args()
        .nth(2)
        .and_then(|a| a.strip_prefix("--ticks=").map(String::from))
        .and_then(|t| t.parse::<u32>().ok());

    let mut scenario = match Scenario::load(&path) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario {path}");
            std::process::exit(1);
        },
    };

    let ticks = ticks.unwrap_or_else(|| scenario.default_ticks());
    tracing::info!("Running {} for {ticks} ticks", scenario.name);

    let summary = scenario.run(ticks);
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to encode run summary"),
    }
}
