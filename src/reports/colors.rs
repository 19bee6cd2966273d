//! The one severity/status color table backing both export encoders and
//! the status-distribution chart hints. Keeping a single source here is
//! what guarantees the workbook and the PDF cannot drift apart.

/// Header fill used by every table header in both encoders.
pub const HEADER_FILL: u32 = 0x2563EB;

/// Fallback chart hint for status values outside the known vocabulary.
pub const FALLBACK_CHART_COLOR: &str = "#6b7280";

/// Cell fill for a known severity; `None` for anything else (encoders fall
/// back to a neutral fill).
pub fn severity_fill(severity: &str) -> Option<u32> {
    match severity {
        "Low" => Some(0x3B82F6),
        "Medium" => Some(0xEAB308),
        "High" => Some(0xF97316),
        "Critical" => Some(0xEF4444),
        _ => None,
    }
}

/// Cell fill for a known crash-report status.
pub fn status_fill(status: &str) -> Option<u32> {
    match status {
        "Open" => Some(0x9CA3AF),
        "On Progress" => Some(0x3B82F6),
        "Finished" => Some(0x22C55E),
        _ => None,
    }
}

/// CSS-style hint for the status-distribution chart.
pub fn status_chart_color(status: &str) -> &'static str {
    match status {
        "Open" => "#9ca3af",
        "On Progress" => "#3b82f6",
        "Finished" => "#22c55e",
        _ => FALLBACK_CHART_COLOR,
    }
}

/// Split a packed RGB value into 0..1 components (PDF color space).
pub fn rgb_components(hex: u32) -> (f32, f32, f32) {
    (
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}
