//! Audio output device listing command.

use polyfm_io::list_output_devices;

pub fn run() -> anyhow::Result<()> {
    let devices = list_output_devices()?;

    if devices.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    println!("Output Devices");
    println!("==============\n");
    for device in &devices {
        let default = if device.is_default { " (default)" } else { "" };
        println!(
            "  [{}] {} ({} Hz){}",
            device.index, device.name, device.default_sample_rate, default
        );
    }

    println!();
    println!("Tip: Use device index or partial name with --device:");
    println!("  polyfm play score.toml --device 0");
    println!("  polyfm play score.toml --device \"USB\"");
    Ok(())
}
