//! Remote door open example

use doorctl::Controller;

#[tokio::main]
async fn main() -> doorctl::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let ip = std::env::var("CONTROLLER_IP").unwrap_or_else(|_| "192.168.1.100".to_string());
    let serial: u32 = std::env::var("CONTROLLER_SN")
        .unwrap_or_else(|_| "423187757".to_string())
        .parse()
        .expect("invalid serial number");

    let controller = Controller::new(serial, ip.parse().expect("invalid IP address"));

    println!("Opening door 1 on SN {} at {}...", serial, ip);
    controller.open_door(1).await?;
    println!("✓ Door released");

    let status = controller.status().await?;
    println!("✓ Controller clock: {}", status.clock);
    if let Some(timestamp) = status.last_record.timestamp {
        println!(
            "✓ Last record: card {} at {} ({})",
            status.last_record.card_number, timestamp, status.last_record.direction
        );
    }

    Ok(())
}
