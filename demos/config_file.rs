//! Example: Detector Configuration Files
//!
//! Demonstrates how to:
//! 1. Build a configuration in code and serialize it to JSON
//! 2. Reload the configuration from disk (missing fields get defaults)
//! 3. Catch invalid parameter combinations at load time
//! 4. Run a detector constructed from the loaded configuration

use anyhow::{Context, Result};
use contexture::{AnomalyDetector, DetectorConfig};

fn main() -> Result<()> {
    println!("=== Configuration File Example ===\n");

    // ========================================
    // PART 1: Build and save a configuration
    // ========================================
    println!("Part 1: Saving a configuration...");

    let config = DetectorConfig::new(-40.0, 60.0)
        .with_base_threshold(0.6)
        .with_rest_period(15)
        .with_num_norm_bits(4);

    let json = config.to_json()?;
    let path = "detector_config.json";
    std::fs::write(path, &json).context("writing configuration file")?;

    println!("✓ Configuration saved to {}", path);
    println!("  File size: {} bytes", json.len());
    println!("{}", json);

    // ========================================
    // PART 2: Load it back
    // ========================================
    println!("\nPart 2: Loading the configuration...");

    let loaded = DetectorConfig::from_file(path).context("loading configuration file")?;
    println!("✓ Configuration loaded");
    println!("  Value range:    [{}, {}]", loaded.min_value, loaded.max_value);
    println!("  Round-trip match: {}", loaded == config);

    // Partial files work too: anything omitted falls back to the default.
    let partial = DetectorConfig::from_json(r#"{ "min_value": 0.0, "max_value": 1.0 }"#)?;
    println!("✓ Partial configuration accepted");
    println!("  Defaulted rest_period: {}", partial.rest_period);

    // ========================================
    // PART 3: Invalid parameters are rejected
    // ========================================
    println!("\nPart 3: Rejecting an invalid configuration...");

    let bad = r#"{ "min_value": 0.0, "max_value": 1.0, "base_threshold": 2.0 }"#;
    match DetectorConfig::from_json(bad) {
        Ok(_) => println!("  (unexpected: configuration accepted)"),
        Err(err) => println!("✓ Rejected as expected: {}", err),
    }

    // ========================================
    // PART 4: Run a detector from the file
    // ========================================
    println!("\nPart 4: Scoring with the loaded configuration...");

    let mut detector = AnomalyDetector::new(loaded)?;
    for step in 0..60usize {
        // Sawtooth over the configured range.
        let value = -40.0 + f64::from((step % 25) as u32) * 4.0;
        detector.score(value);
    }
    println!("✓ 60 readings scored");
    println!("  Contexts learned: {}", detector.engine().num_contexts());

    // Cleanup
    std::fs::remove_file(path).context("removing configuration file")?;
    println!("\n✓ Cleanup complete");

    println!("\n=== Summary ===");
    println!("✓ Configurations round-trip through pretty-printed JSON");
    println!("✓ Omitted fields fall back to documented defaults");
    println!("✓ Invalid files fail at load time, not at first use");

    Ok(())
}
