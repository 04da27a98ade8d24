use std::time::Instant;

use number_prefix::NumberPrefix;

#[must_use]
pub fn format_stats(start_time: Instant, bytes: usize) -> String {
    let elapsed = start_time.elapsed();

    let rate = bytes as f32 / elapsed.as_secs_f32();
    let rate_human = match NumberPrefix::decimal(rate) {
        NumberPrefix::Standalone(bytes) => {
            format!("{} B/s", bytes)
        }
        NumberPrefix::Prefixed(prefix, n) => {
            format!("{:.3} {}B/s", n, prefix)
        }
    };

    format!(
        "{} in {:.2}s ({})",
        format_bytes(bytes),
        elapsed.as_secs_f32(),
        rate_human,
    )
}

/// Formats a byte count with a decimal unit prefix.
///
/// # Examples
/// ```
/// use gabac::symbol_file::format_bytes;
///
/// assert_eq!(format_bytes(999), "999 bytes");
/// assert_eq!(format_bytes(1_500_000), "1.50 MB");
/// ```
#[must_use]
pub fn format_bytes(bytes: usize) -> String {
    match NumberPrefix::decimal(bytes as f32) {
        NumberPrefix::Standalone(bytes) => {
            format!("{} bytes", bytes)
        }
        NumberPrefix::Prefixed(prefix, n) => {
            format!("{:.2} {}B", n, prefix)
        }
    }
}
