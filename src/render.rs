use chrono::{DateTime, SecondsFormat, Utc};
use comfy_table::{presets, Table};

use crate::aggregate::Report;
use crate::models::StatEntry;

/// How the size and last-modified columns are displayed. The underlying
/// entry values are never touched, only their presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Raw,
    Humanized,
}

/// Renders the report as one table: targets in lexicographic order, entries
/// within a target re-sorted by path regardless of traversal order.
pub fn render(report: &Report, mode: DisplayMode) -> String {
    let now = Utc::now();

    let mut table = Table::new();
    table.load_preset(presets::ASCII_FULL_CONDENSED);
    table.set_header(vec![
        "Target Name",
        "Path",
        "LastModified",
        "Perm",
        "Umask",
        "Size",
    ]);

    // BTreeMap iteration already walks targets in ascending order
    for (target, entries) in &report.results {
        let mut rows: Vec<&StatEntry> = entries.iter().collect();
        rows.sort_by(|a, b| a.path.cmp(&b.path));
        for entry in rows {
            table.add_row(vec![
                target.clone(),
                entry.path.clone(),
                format_mtime(entry.last_modified, mode, now),
                perm_string(entry),
                mode_string(entry.umask),
                format_size(entry.size, mode),
            ]);
        }
    }

    format!("{table}\n")
}

/// "-rwxr-xr-x" style rendering of permission bits.
fn mode_string(mode: u32) -> String {
    const FLAGS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];

    let mut s = String::with_capacity(10);
    s.push('-');
    for (bit, ch) in FLAGS {
        s.push(if mode & bit != 0 { ch } else { '-' });
    }
    s
}

/// Display permissions are the raw bits masked by the umask bits. The
/// leading character always marks directories, whatever the masked bits say.
fn perm_string(entry: &StatEntry) -> String {
    let mut perms = mode_string(entry.permissions & entry.umask);
    if entry.is_dir {
        perms.replace_range(0..1, "d");
    }
    perms
}

fn format_size(size: u64, mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Raw => size.to_string(),
        DisplayMode::Humanized => human_bytes(size),
    }
}

fn format_mtime(nanos: i64, mode: DisplayMode, now: DateTime<Utc>) -> String {
    let mtime = DateTime::<Utc>::from_timestamp_nanos(nanos);
    match mode {
        DisplayMode::Raw => mtime.to_rfc3339_opts(SecondsFormat::Secs, true),
        DisplayMode::Humanized => human_time(mtime, now),
    }
}

fn human_bytes(size: u64) -> String {
    if size < 1024 {
        return format!("{size} B");
    }
    let mut value = size as f64 / 1024.0;
    for unit in ["KiB", "MiB", "GiB", "TiB", "PiB"] {
        if value < 1024.0 {
            return format!("{value:.1} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.1} EiB")
}

/// Relative "time ago" phrasing, time-of-render dependent.
fn human_time(mtime: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(mtime);
    let (secs, suffix) = if delta.num_seconds() < 0 {
        (-delta.num_seconds(), "from now")
    } else {
        (delta.num_seconds(), "ago")
    };

    let (count, unit) = match secs {
        0..=1 => return "now".to_string(),
        2..=59 => (secs, "second"),
        60..=3_599 => (secs / 60, "minute"),
        3_600..=86_399 => (secs / 3_600, "hour"),
        86_400..=604_799 => (secs / 86_400, "day"),
        604_800..=2_591_999 => (secs / 604_800, "week"),
        2_592_000..=31_103_999 => (secs / 2_592_000, "month"),
        _ => (secs / 31_104_000, "year"),
    };

    if count == 1 {
        format!("1 {unit} {suffix}")
    } else {
        format!("{count} {unit}s {suffix}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::TargetOutcome;

    fn entry(path: &str, size: u64, permissions: u32, umask: u32, is_dir: bool) -> StatEntry {
        StatEntry {
            path: path.to_string(),
            size,
            last_modified: 1_700_000_000_000_000_000,
            permissions,
            umask,
            is_dir,
        }
    }

    #[test]
    fn mode_string_renders_rwx_triplets() {
        assert_eq!(mode_string(0o755), "-rwxr-xr-x");
        assert_eq!(mode_string(0o640), "-rw-r-----");
        assert_eq!(mode_string(0), "----------");
    }

    #[test]
    fn perm_string_masks_with_umask() {
        let e = entry("/etc/a", 1, 0o777, 0o750, false);
        assert_eq!(perm_string(&e), "-rwxr-x---");
    }

    #[test]
    fn directory_marker_overrides_masked_bits() {
        // even all-zero masked bits still show the directory marker
        let dir = entry("/var", 0, 0o755, 0, true);
        assert_eq!(perm_string(&dir), "d---------");

        let file = entry("/var/log", 5, 0o755, 0, false);
        assert_eq!(perm_string(&file).chars().next(), Some('-'));
    }

    #[test]
    fn human_bytes_boundaries() {
        assert_eq!(human_bytes(1023), "1023 B");
        assert_eq!(human_bytes(1024), "1.0 KiB");
        assert_eq!(human_bytes(1536), "1.5 KiB");
        assert_eq!(human_bytes(1024 * 1024), "1.0 MiB");
    }

    #[test]
    fn human_time_phrasing() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let at = |secs: i64| now - chrono::Duration::seconds(secs);

        assert_eq!(human_time(at(0), now), "now");
        assert_eq!(human_time(at(30), now), "30 seconds ago");
        assert_eq!(human_time(at(60), now), "1 minute ago");
        assert_eq!(human_time(at(7_200), now), "2 hours ago");
        assert_eq!(human_time(at(172_800), now), "2 days ago");
        assert_eq!(human_time(at(1_209_600), now), "2 weeks ago");
        // 100 days reads in months, not a pile of weeks
        assert_eq!(human_time(at(8_640_000), now), "3 months ago");
        assert_eq!(human_time(at(63_000_000), now), "2 years ago");
        assert_eq!(human_time(at(-90), now), "1 minute from now");
    }

    #[test]
    fn raw_mtime_is_rfc3339() {
        let rendered = format_mtime(1_700_000_000_000_000_000, DisplayMode::Raw, Utc::now());
        assert_eq!(rendered, "2023-11-14T22:13:20Z");
    }

    fn two_target_report() -> Report {
        Report::from_outcomes(vec![
            TargetOutcome::Success {
                target: "A".to_string(),
                // walker produced them out of path order on purpose
                entries: vec![
                    entry("/etc/b", 20, 0o644, 0o644, false),
                    entry("/etc/a", 10, 0o644, 0o644, false),
                ],
            },
            TargetOutcome::Success {
                target: "B".to_string(),
                entries: vec![entry("/srv/x", 1, 0o644, 0o644, false)],
            },
        ])
    }

    #[test]
    fn rows_are_sorted_by_target_then_path() {
        let rendered = render(&two_target_report(), DisplayMode::Raw);

        let a1 = rendered.find("/etc/a").unwrap();
        let a2 = rendered.find("/etc/b").unwrap();
        let b1 = rendered.find("/srv/x").unwrap();
        assert!(a1 < a2, "entries within a target sort by path");
        assert!(a2 < b1, "targets sort lexicographically");
    }

    #[test]
    fn render_is_deterministic_for_identical_input() {
        let report = two_target_report();
        assert_eq!(
            render(&report, DisplayMode::Raw),
            render(&report, DisplayMode::Raw)
        );
    }

    #[test]
    fn raw_and_humanized_render_the_same_entries() {
        let report = two_target_report();
        let raw = render(&report, DisplayMode::Raw);
        let human = render(&report, DisplayMode::Humanized);

        for path in ["/etc/a", "/etc/b", "/srv/x"] {
            assert!(raw.contains(path));
            assert!(human.contains(path));
        }
        assert!(raw.contains("10"));
        assert!(human.contains("10 B"));
    }
}
