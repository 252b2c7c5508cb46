//! ==============================================================================
//! sim-node.rs - simulated ESP sensor node
//! ==============================================================================
//!
//! purpose:
//!     pushes synthetic pir/vibration events to a running hub, exactly like
//!     the device firmware does. handy for exercising the dashboard without
//!     any hardware on the desk.
//!
//! usage:
//!     HUB_URL=http://127.0.0.1:5000 API_KEY=change-me NODE=Room-1 \
//!         cargo run --bin sim-node
//!
//! ==============================================================================

use anyhow::Result;
use serde_json::json;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let hub_url = std::env::var("HUB_URL").unwrap_or_else(|_| "http://127.0.0.1:5000".to_string());
    let api_key = std::env::var("API_KEY").unwrap_or_else(|_| "change-me".to_string());
    let node = std::env::var("NODE").unwrap_or_else(|_| "Room-1".to_string());

    println!("[SIM] Pushing events for node '{}' to {}", node, hub_url);

    let client = reqwest::Client::new();
    let endpoint = format!("{}/pir_event", hub_url);
    let mut tick: u64 = 0;

    loop {
        // mostly motion, the odd vibration, like a real room
        let state = if tick % 5 == 4 { "Vibration" } else { "Motion detected" };
        let payload = json!({
            "node": node,
            "state": state,
            "time": format!("{:02}:{:02}:{:02}", (tick / 3600) % 24, (tick / 60) % 60, tick % 60),
        });

        let response = client
            .post(&endpoint)
            .header("X-API-Key", &api_key)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => {
                println!("[SIM] {} -> {}", state, r.status());
            }
            Ok(r) => {
                println!("[SIM] ⚠ Hub rejected event: {}", r.status());
            }
            Err(e) => {
                println!("[SIM] ⚠ Push failed: {}", e);
            }
        }

        tick += 1;
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
}
