//! Display helpers for session clocks.

/// Format seconds as zero-padded `MM:SS`.
///
/// Minutes are not wrapped into hours, so 3600 seconds prints as `60:00`.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
