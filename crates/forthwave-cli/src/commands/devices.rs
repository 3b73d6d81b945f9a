//! Audio device listing command.

use clap::Args;
use forthwave_io::{default_output_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let devices = list_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    match default_output_device()? {
        Some(device) => println!("Default output: {}", device.name),
        None => println!("Default output: none"),
    }
    println!();
    println!("Output Devices:");
    for (idx, device) in devices.iter().enumerate() {
        let marker = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} ch, {} Hz){}",
            idx, device.name, device.channels, device.default_sample_rate, marker
        );
    }
    println!();
    println!("Tip: pass an index or part of a name with --output-device:");
    println!("  forthwave play patch.fw --output-device 0");
    Ok(())
}
