use chrono::NaiveDate;
use std::collections::BTreeMap;

/// One dated reading of cumulative points per member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub date: NaiveDate,
    pub points: BTreeMap<String, u64>,
    /// Raw join-date text; only present when the source carried that column.
    pub joined: BTreeMap<String, String>,
}

impl Snapshot {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            points: BTreeMap::new(),
            joined: BTreeMap::new(),
        }
    }

    pub fn with_member(mut self, name: &str, points: u64) -> Self {
        self.insert(name, points, None);
        self
    }

    pub fn with_joined_member(mut self, name: &str, points: u64, joined: &str) -> Self {
        self.insert(name, points, Some(joined.to_string()));
        self
    }

    pub fn insert(&mut self, name: &str, points: u64, joined: Option<String>) {
        self.points.insert(name.to_string(), points);
        if let Some(joined) = joined {
            self.joined.insert(name.to_string(), joined);
        }
    }

    pub fn points_for(&self, name: &str) -> Option<u64> {
        self.points.get(name).copied()
    }

    pub fn joined_for(&self, name: &str) -> Option<&str> {
        self.joined.get(name).map(String::as_str)
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, u64)> {
        self.points.iter().map(|(name, points)| (name.as_str(), *points))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Date-indexed snapshot history, built once per run and shared read-only
/// across every member evaluation.
#[derive(Debug, Clone, Default)]
pub struct SnapshotSeries {
    by_date: BTreeMap<NaiveDate, Snapshot>,
}

impl SnapshotSeries {
    pub fn new<I>(snapshots: I) -> Self
    where
        I: IntoIterator<Item = Snapshot>,
    {
        let mut series = Self::default();
        for snapshot in snapshots {
            series.insert(snapshot);
        }
        series
    }

    /// Adds a snapshot, replacing (and returning) any existing one for the same date.
    pub fn insert(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        self.by_date.insert(snapshot.date, snapshot)
    }

    pub fn exact(&self, date: NaiveDate) -> Option<&Snapshot> {
        self.by_date.get(&date)
    }

    /// Points recorded for `member` in the snapshot dated exactly `date`.
    pub fn points_on(&self, date: NaiveDate, member: &str) -> Option<u64> {
        self.exact(date).and_then(|snapshot| snapshot.points_for(member))
    }

    /// Earliest snapshot dated on or after `date` that lists `member`.
    pub fn first_on_or_after(&self, date: NaiveDate, member: &str) -> Option<(NaiveDate, u64)> {
        self.by_date.range(date..).find_map(|(day, snapshot)| {
            snapshot.points_for(member).map(|points| (*day, points))
        })
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.by_date.values().next_back()
    }

    pub fn dates(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.by_date.keys().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Snapshot> {
        self.by_date.values()
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}
