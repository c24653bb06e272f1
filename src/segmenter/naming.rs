//! Segment file naming: `<base><marker><index><extension>`.
//!
//! The index is zero padded to at least [`INDEX_WIDTH`] digits, so a directory of
//! segments sorts by name until the index outgrows the padding. [`sort_segments`]
//! orders by the parsed index and stays correct past that point.

use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::{Path, PathBuf};

pub const SEGMENT_MARKER: &str = "_part";
pub const INDEX_WIDTH: usize = 3;
pub const DEFAULT_EXTENSION: &str = ".mp4";
pub const FALLBACK_BASE_IDENTITY: &str = "recording";
const INITIAL_NAME_PREFIX: &str = "rec";

/// Byte span of a marker-plus-digits occurrence inside a file stem.
struct MarkerMatch {
    start: usize,
    end: usize,
    index: u32,
}

/// Splits `name` into stem and extension (with its dot). Leading dots do not
/// start an extension, matching `Path::file_stem`.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => name.split_at(pos),
        _ => (name, ""),
    }
}

/// Last occurrence of the marker followed by at least `INDEX_WIDTH` digits.
fn find_marker(stem: &str) -> Option<MarkerMatch> {
    let mut search_end = stem.len();
    while let Some(start) = stem[..search_end].rfind(SEGMENT_MARKER) {
        let digits_start = start + SEGMENT_MARKER.len();
        let digit_len = stem[digits_start..]
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();

        if digit_len >= INDEX_WIDTH {
            let end = digits_start + digit_len;
            if let Ok(index) = stem[digits_start..end].parse::<u32>() {
                return Some(MarkerMatch { start, end, index });
            }
        }
        search_end = start;
    }
    None
}

/// Ordinal embedded in `file_name`, or 0 when it carries no segment marker.
pub fn extract_segment_index(file_name: &str) -> u32 {
    let (stem, _) = split_extension(file_name);
    find_marker(stem).map(|found| found.index).unwrap_or(0)
}

/// Session-stable part of `file_name`: extension dropped, marker and index removed.
pub fn extract_base_identity(file_name: &str) -> String {
    let (stem, _) = split_extension(file_name);
    let base = match find_marker(stem) {
        Some(found) => format!("{}{}", &stem[..found.start], &stem[found.end..]),
        None => stem.to_string(),
    };

    if base.is_empty() {
        FALLBACK_BASE_IDENTITY.to_string()
    } else {
        base
    }
}

/// `(base, index)` for names that follow the convention, `None` otherwise.
pub fn parse_segment_name(file_name: &str) -> Option<(String, u32)> {
    let (stem, _) = split_extension(file_name);
    find_marker(stem).map(|found| (extract_base_identity(file_name), found.index))
}

pub fn segment_file_name(base: &str, index: u32, extension: &str) -> String {
    format!("{base}{SEGMENT_MARKER}{index:0width$}{extension}", width = INDEX_WIDTH)
}

/// Name of the segment that follows `file_name`, derived from its own base and index.
pub fn generate_next(file_name: &str, extension: &str) -> String {
    segment_file_name(
        &extract_base_identity(file_name),
        extract_segment_index(file_name).saturating_add(1),
        extension,
    )
}

/// Path of the next segment, next to `current_file`, for a session whose base
/// identity and index at trigger time are known.
pub fn next_segment_path(
    current_file: &Path,
    base_identity: &str,
    index_at_trigger: u32,
    extension: &str,
) -> PathBuf {
    let name = segment_file_name(base_identity, index_at_trigger.saturating_add(1), extension);
    match current_file.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Final path component as text. Non-UTF-8 bytes become U+FFFD, so callers that
/// derive names from the result must reject such paths first.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// First segment name of a session started at `started_at`,
/// e.g. `rec_20240101_000000_part000.mp4`.
pub fn initial_segment_name<Tz>(started_at: &DateTime<Tz>, extension: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let base = format!(
        "{INITIAL_NAME_PREFIX}_{}",
        started_at.format("%Y%m%d_%H%M%S")
    );
    segment_file_name(&base, 0, extension)
}

/// Orders segment paths by their embedded index; unmarked names sort as index 0.
pub fn sort_segments(paths: &mut [PathBuf]) {
    paths.sort_by_key(|path| extract_segment_index(&file_name_of(path)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_marked_name() {
        let name = "rec_20240101_000000_part000.mp4";
        assert_eq!(extract_segment_index(name), 0);
        assert_eq!(extract_base_identity(name), "rec_20240101_000000");

        assert_eq!(extract_segment_index("clip_part042.mkv"), 42);
        assert_eq!(extract_base_identity("clip_part042.mkv"), "clip");
    }

    #[test]
    fn unmarked_name_defaults_to_index_zero() {
        assert_eq!(extract_segment_index("capture.mp4"), 0);
        assert_eq!(extract_base_identity("capture.mp4"), "capture");
        assert_eq!(parse_segment_name("capture.mp4"), None);
    }

    #[test]
    fn marker_needs_three_digits() {
        assert_eq!(extract_segment_index("take_part12.mp4"), 0);
        assert_eq!(extract_base_identity("take_part12.mp4"), "take_part12");
        assert_eq!(extract_segment_index("take_partial.mp4"), 0);
    }

    #[test]
    fn marker_may_sit_mid_stem() {
        assert_eq!(extract_segment_index("cam_part007_front.mp4"), 7);
        assert_eq!(extract_base_identity("cam_part007_front.mp4"), "cam_front");
    }

    #[test]
    fn only_last_marker_is_stripped() {
        let name = "a_part001_b_part002.mp4";
        assert_eq!(extract_segment_index(name), 2);
        assert_eq!(extract_base_identity(name), "a_part001_b");
    }

    #[test]
    fn empty_base_falls_back() {
        assert_eq!(extract_base_identity("_part003.mp4"), FALLBACK_BASE_IDENTITY);
        assert_eq!(extract_segment_index("_part003.mp4"), 3);
    }

    #[test]
    fn next_name_uses_configured_extension() {
        assert_eq!(
            generate_next("rec_20240101_000000_part000.mp4", ".mp4"),
            "rec_20240101_000000_part001.mp4"
        );
        assert_eq!(generate_next("clip_part009.mkv", ".mp4"), "clip_part010.mp4");
        assert_eq!(generate_next("plain.mov", ".mov"), "plain_part001.mov");
    }

    #[test]
    fn index_grows_past_padding() {
        let next = generate_next("long_part999.mp4", ".mp4");
        assert_eq!(next, "long_part1000.mp4");
        assert_eq!(extract_segment_index(&next), 1000);
        assert_eq!(extract_base_identity(&next), "long");
    }

    #[test]
    fn next_name_keeps_base_identity() {
        let names = [
            "rec_20240101_000000_part000.mp4",
            "capture.mp4",
            "_part003.mp4",
            "a_part001_b_part002.mp4",
            "cam_part007_front.mkv",
            "take_part12.mp4",
            "no_extension",
            ".hidden",
            "dots.in.name_part005.mp4",
            "long_part999.mp4",
        ];

        for name in names {
            let next = generate_next(name, DEFAULT_EXTENSION);
            assert_eq!(
                extract_base_identity(&next),
                extract_base_identity(name),
                "base identity drifted for {name} -> {next}"
            );
        }
    }

    #[test]
    fn next_path_stays_in_current_directory() {
        let current = Path::new("/data/rec/rec_20240101_000000_part000.mp4");
        let next = next_segment_path(current, "rec_20240101_000000", 0, ".mp4");
        assert_eq!(
            next,
            PathBuf::from("/data/rec/rec_20240101_000000_part001.mp4")
        );
    }

    #[test]
    fn initial_name_round_trips_through_parser() {
        let started_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let name = initial_segment_name(&started_at, DEFAULT_EXTENSION);
        assert_eq!(name, "rec_20240101_000000_part000.mp4");
        assert_eq!(
            parse_segment_name(&name),
            Some(("rec_20240101_000000".to_string(), 0))
        );
    }

    #[test]
    fn sorts_by_index_not_by_text() {
        let mut paths = vec![
            PathBuf::from("/r/s_part1000.mp4"),
            PathBuf::from("/r/s_part002.mp4"),
            PathBuf::from("/r/s_part999.mp4"),
            PathBuf::from("/r/s_part000.mp4"),
        ];
        sort_segments(&mut paths);
        let indices: Vec<u32> = paths
            .iter()
            .map(|p| extract_segment_index(&file_name_of(p)))
            .collect();
        assert_eq!(indices, vec![0, 2, 999, 1000]);
    }
}
