//! Example: Spike Detection on a Periodic Signal
//!
//! Demonstrates how to:
//! 1. Configure an anomaly detector for a known value range
//! 2. Let it learn a repeating signal online (no training phase)
//! 3. Catch a one-off spike the moment it arrives
//! 4. Observe the rest period suppressing echo alarms
//!
//! The detector learns and scores in the same pass; the early readings
//! simply score higher until the signal's structure has been absorbed.

use anyhow::Result;
use contexture::{AnomalyDetector, DetectorConfig};

fn signal(step: usize) -> f64 {
    // Three-phase cycle: 10 -> 30 -> 50.
    f64::from((step % 3) as u32) * 20.0 + 10.0
}

fn main() -> Result<()> {
    println!("=== Spike Detection Example ===\n");

    // ========================================
    // PART 1: Configure the detector
    // ========================================
    println!("Part 1: Configuring the detector...");

    let config = DetectorConfig::new(0.0, 100.0)
        .with_base_threshold(0.5)
        .with_rest_period(20);
    let mut detector = AnomalyDetector::new(config)?;

    println!("✓ Detector ready for readings in [0, 100]");
    println!("  base_threshold: {}", detector.config().base_threshold);
    println!("  rest_period:    {}", detector.config().rest_period);

    // ========================================
    // PART 2: Learn the periodic signal
    // ========================================
    println!("\nPart 2: Learning the periodic signal...");

    let learning_steps = 300;
    let mut alarms = 0;
    for step in 0..learning_steps {
        let score = detector.score(signal(step));
        if score >= detector.config().base_threshold {
            alarms += 1;
        }
    }

    println!("✓ {} readings scored", learning_steps);
    println!("  Alarms while learning:  {}", alarms);
    println!("  Contexts learned:       {}", detector.engine().num_contexts());
    println!("  Estimated memory:       {} KB", detector.memory_usage() / 1024);

    // ========================================
    // PART 3: Inject a spike
    // ========================================
    println!("\nPart 3: Injecting a spike...");

    let spike_step = learning_steps;
    let spike_score = detector.score(90.0);
    println!("  step {:>4}  value  90.0  score {:.3}  <-- spike", spike_step, spike_score);

    // ========================================
    // PART 4: Return to the periodic signal
    // ========================================
    println!("\nPart 4: Returning to the periodic signal...");

    let mut echo_alarms = 0;
    for step in (spike_step + 1)..(spike_step + 11) {
        let value = signal(step);
        let score = detector.score(value);
        if score > 0.0 {
            echo_alarms += 1;
        }
        println!("  step {:>4}  value  {:>4.1}  score {:.3}", step, value, score);
    }

    println!("✓ Echo alarms during rest period: {}", echo_alarms);

    println!("\n=== Summary ===");
    println!("✓ Periodic signal learned online, no separate training pass");
    println!("✓ Spike scored {:.3} on arrival", spike_score);
    println!("✓ Rest period held follow-up scores at zero");

    Ok(())
}
