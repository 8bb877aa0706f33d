//! Vertical card display for a single counted batch.

use std::fmt::{self, Write};

use tally_core::{Batch, CountMap, Threshold};

/// Render batch statistics and per-label counts as a human-readable card.
pub fn write_batch_card<W: Write>(
    out: &mut W,
    batch: &Batch,
    counts: &CountMap,
    threshold: Threshold,
) -> fmt::Result {
    writeln!(out, "=== Batch ===")?;
    writeln!(out, "  {:<26} {}", "detections", batch.detections.len())?;
    writeln!(out, "  {:<26} {}", "skipped", batch.skipped)?;
    writeln!(out, "  {:<26} {}", "threshold", threshold)?;
    writeln!(out)?;

    writeln!(out, "Counts")?;
    if counts.is_empty() {
        writeln!(out, "  (none above threshold)")?;
    }
    for (label, count) in counts {
        writeln!(out, "  {:<26} {}", label, count)?;
    }
    Ok(())
}

pub fn print_batch_card(batch: &Batch, counts: &CountMap, threshold: Threshold) -> fmt::Result {
    let mut card = String::new();
    write_batch_card(&mut card, batch, counts, threshold)?;
    print!("{card}");
    Ok(())
}
