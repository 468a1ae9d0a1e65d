use chrono::{DateTime, SecondsFormat, Utc};

pub const OUTPUT_PREFIX: &str = "Custom_muOS_";
pub const OUTPUT_EXTENSION: &str = "muxupd";

/// File name for an archive finished at `instant`, e.g.
/// `Custom_muOS_2024-03-15T10-30-45.muxupd`.
pub fn output_file_name(instant: DateTime<Utc>) -> String {
    format!("{OUTPUT_PREFIX}{}.{OUTPUT_EXTENSION}", timestamp(instant))
}

/// ISO-8601 instant with `:` and `.` made file-name safe and the
/// milliseconds/zone suffix dropped.
fn timestamp(instant: DateTime<Utc>) -> String {
    let iso = instant.to_rfc3339_opts(SecondsFormat::Millis, true);
    let safe = iso.replace([':', '.'], "-");
    safe[..safe.len() - ".123Z".len()].to_string()
}
