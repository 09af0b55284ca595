use serde::{Deserialize, Serialize};

use super::{SECONDS_PER_DAY, Timestamp};

/// A closed interval `[end_timestamp - duration_secs, end_timestamp)`
/// during which the committed state was `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "timestamp", deserialize_with = "super::seconds::deserialize")]
    pub end_timestamp: Timestamp,
    pub state: bool,
    #[serde(rename = "duration", deserialize_with = "super::seconds::deserialize")]
    pub duration_secs: i64,
}

impl LogEntry {
    /// The entry for `[start, end)`, or `None` if the interval is empty.
    pub fn closing(state: bool, start: Timestamp, end: Timestamp) -> Option<Self> {
        let duration_secs = end - start;
        (duration_secs > 0).then_some(Self {
            end_timestamp: end,
            state,
            duration_secs,
        })
    }

    pub fn start_timestamp(&self) -> Timestamp {
        self.end_timestamp - self.duration_secs
    }
}

/// Seconds spent in each state over some range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateTotals {
    pub present_secs: i64,
    pub absent_secs: i64,
}

impl StateTotals {
    pub fn total_secs(&self) -> i64 {
        self.present_secs + self.absent_secs
    }

    fn add(&mut self, state: bool, secs: i64) {
        if state {
            self.present_secs += secs;
        } else {
            self.absent_secs += secs;
        }
    }
}

/// Closed intervals of the power timeline, bounded by a retention window.
///
/// Entries are kept in insertion order. Nothing here relies on that order
/// matching `end_timestamp` order.
#[derive(Debug, Clone)]
pub struct SegmentLog {
    entries: Vec<LogEntry>,
    retention_days: u32,
}

impl SegmentLog {
    pub fn new(retention_days: u32) -> Self {
        Self::from_entries(Vec::new(), retention_days)
    }

    pub fn from_entries(entries: Vec<LogEntry>, retention_days: u32) -> Self {
        Self {
            entries,
            retention_days,
        }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Append a closed interval. Returns `false` for an empty interval,
    /// which is not recorded.
    pub fn append(&mut self, state: bool, duration_secs: i64, end_timestamp: Timestamp) -> bool {
        if duration_secs <= 0 {
            return false;
        }
        self.entries.push(LogEntry {
            end_timestamp,
            state,
            duration_secs,
        });
        true
    }

    /// Append `entry` and prune against `now`.
    pub fn record(&mut self, entry: LogEntry, now: Timestamp) -> bool {
        let appended = self.append(entry.state, entry.duration_secs, entry.end_timestamp);
        self.prune(now);
        appended
    }

    /// Drop entries that ended before `now - retention_days`. Returns the
    /// number removed.
    pub fn prune(&mut self, now: Timestamp) -> usize {
        let cutoff = now - i64::from(self.retention_days) * SECONDS_PER_DAY;
        let before = self.entries.len();
        self.entries.retain(|entry| entry.end_timestamp >= cutoff);
        before - self.entries.len()
    }

    /// Sum durations of entries whose end falls in `[start, end)`.
    ///
    /// An interval is attributed entirely to the range in which it ended;
    /// intervals straddling `start` are not clipped. Calendar summaries are
    /// only exact because the daily rollover closes the open segment right
    /// after each local midnight. Dropping the rollover would let one
    /// interval carry time from previous days into the day it ended.
    pub fn summarize_range(&self, start: Timestamp, end: Timestamp) -> StateTotals {
        self.entries
            .iter()
            .filter(|entry| (start..end).contains(&entry.end_timestamp))
            .fold(StateTotals::default(), |mut totals, entry| {
                totals.add(entry.state, entry.duration_secs);
                totals
            })
    }

    /// The most recently ended entry.
    pub fn last_entry(&self) -> Option<&LogEntry> {
        self.entries.iter().max_by_key(|entry| entry.end_timestamp)
    }

    /// The most recently ended entry in `state`.
    pub fn last_in_state(&self, state: bool) -> Option<&LogEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.state == state)
            .max_by_key(|entry| entry.end_timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = SECONDS_PER_DAY;

    fn entry(end_timestamp: Timestamp, state: bool, duration_secs: i64) -> LogEntry {
        LogEntry {
            end_timestamp,
            state,
            duration_secs,
        }
    }

    #[test]
    fn append_rejects_empty_intervals() {
        let mut log = SegmentLog::new(60);

        assert!(!log.append(true, 0, 100));
        assert!(!log.append(true, -5, 100));
        assert!(log.entries().is_empty());

        assert!(log.append(true, 1, 100));
        assert_eq!(log.entries(), &[entry(100, true, 1)]);
    }

    #[test]
    fn closing_empty_interval_is_none() {
        assert_eq!(LogEntry::closing(true, 50, 50), None);
        assert_eq!(LogEntry::closing(true, 60, 50), None);
        assert_eq!(LogEntry::closing(false, 40, 50), Some(entry(50, false, 10)));
    }

    #[test]
    fn summarize_buckets_by_end_timestamp() {
        let day1_start = 10 * DAY;
        let day2_start = day1_start + DAY;
        let day3_start = day2_start + DAY;

        let mut log = SegmentLog::new(60);
        log.append(true, 3_600, day2_start - 1);
        log.append(false, 7_200, day2_start + DAY / 2);

        assert_eq!(
            log.summarize_range(day1_start, day2_start),
            StateTotals {
                present_secs: 3_600,
                absent_secs: 0,
            }
        );
        assert_eq!(
            log.summarize_range(day2_start, day3_start),
            StateTotals {
                present_secs: 0,
                absent_secs: 7_200,
            }
        );
    }

    #[test]
    fn summarize_range_is_half_open() {
        let mut log = SegmentLog::new(60);
        log.append(true, 10, 100);
        log.append(false, 10, 200);

        assert_eq!(log.summarize_range(100, 200).present_secs, 10);
        assert_eq!(log.summarize_range(100, 200).absent_secs, 0);
        assert_eq!(log.summarize_range(101, 201).absent_secs, 10);
    }

    #[test]
    fn summarize_does_not_assume_sorted_input() {
        let log = SegmentLog::from_entries(
            vec![entry(500, true, 5), entry(100, false, 7), entry(300, true, 11)],
            60,
        );

        assert_eq!(
            log.summarize_range(0, 400),
            StateTotals {
                present_secs: 11,
                absent_secs: 7,
            }
        );
    }

    #[test]
    fn summarize_is_additive() {
        let log = SegmentLog::from_entries(
            vec![
                entry(100, true, 50),
                entry(250, false, 150),
                entry(400, true, 150),
                entry(420, false, 20),
            ],
            60,
        );

        let whole = log.summarize_range(0, 1_000);
        for split in [101, 200, 251, 401, 999] {
            let left = log.summarize_range(0, split);
            let right = log.summarize_range(split, 1_000);
            assert_eq!(left.present_secs + right.present_secs, whole.present_secs);
            assert_eq!(left.absent_secs + right.absent_secs, whole.absent_secs);
        }
        assert_eq!(whole.total_secs(), 370);
    }

    #[test]
    fn prune_keeps_entries_at_cutoff() {
        let now = 100 * DAY;
        let cutoff = now - 60 * DAY;
        let mut log = SegmentLog::from_entries(
            vec![
                entry(cutoff - 1, true, 10),
                entry(cutoff, false, 10),
                entry(now, true, 10),
            ],
            60,
        );

        assert_eq!(log.prune(now), 1);
        assert_eq!(log.entries(), &[entry(cutoff, false, 10), entry(now, true, 10)]);
        assert!(log.entries().iter().all(|e| e.end_timestamp >= cutoff));
    }

    #[test]
    fn record_prunes_after_append() {
        let mut log = SegmentLog::from_entries(vec![entry(0, true, 10)], 1);

        assert!(log.record(entry(2 * DAY, false, 10), 2 * DAY));
        assert_eq!(log.entries(), &[entry(2 * DAY, false, 10)]);
    }

    #[test]
    fn last_entries_use_end_timestamp() {
        let log = SegmentLog::from_entries(
            vec![entry(300, true, 5), entry(500, true, 5), entry(400, false, 5)],
            60,
        );

        assert_eq!(log.last_entry(), Some(&entry(500, true, 5)));
        assert_eq!(log.last_in_state(false), Some(&entry(400, false, 5)));
        assert_eq!(entry(500, true, 5).start_timestamp(), 495);
    }

    #[test]
    fn entries_use_persisted_field_names() {
        let json = r#"[{"timestamp": 1700000000.75, "state": true, "duration": 3600}]"#;

        let entries: Vec<LogEntry> = serde_json::from_str(json).unwrap();

        assert_eq!(entries, vec![entry(1_700_000_000, true, 3_600)]);
        assert_eq!(
            serde_json::to_value(entries[0]).unwrap(),
            serde_json::json!({"timestamp": 1_700_000_000, "state": true, "duration": 3_600})
        );
    }
}
