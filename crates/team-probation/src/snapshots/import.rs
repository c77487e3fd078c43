use super::series::Snapshot;
use super::SnapshotError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

const NAME_COLUMNS: [&str; 2] = ["name", "member"];
const POINTS_COLUMNS: [&str; 1] = ["points"];
/// Cells above this are scraper noise, not real totals.
const MAX_POINT_CELL: u64 = 1_000_000_000_000_000;

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    #[serde(alias = "member")]
    name: String,
    #[serde(deserialize_with = "lenient_points")]
    points: u64,
    #[serde(
        default,
        alias = "joined",
        alias = "join_date",
        deserialize_with = "empty_string_as_none"
    )]
    joined_date: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn lenient_points<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_points(&raw))
}

/// Scraped point cells may carry thousands separators; anything unreadable counts as zero.
fn parse_points(raw: &str) -> u64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();

    let points = match cleaned.parse::<u64>() {
        Ok(points) => points,
        Err(_) => match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 && value <= MAX_POINT_CELL as f64 => {
                value.trunc() as u64
            }
            _ => 0,
        },
    };

    if points > MAX_POINT_CELL {
        0
    } else {
        points
    }
}

fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    collapsed.to_ascii_lowercase()
}

fn require_column(
    headers: &csv::StringRecord,
    accepted: &[&str],
    column: &'static str,
) -> Result<(), SnapshotError> {
    if headers.iter().any(|header| accepted.contains(&header)) {
        Ok(())
    } else {
        Err(SnapshotError::MissingColumn { column })
    }
}

/// Removes `st`/`nd`/`rd`/`th` directly following a digit ("December 19th, 2023").
fn strip_ordinal_suffixes(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < chars.len() {
        out.push(chars[i]);
        if chars[i].is_ascii_digit() {
            if let Some(suffix) = chars.get(i + 1..i + 3) {
                let pair = suffix.iter().collect::<String>().to_ascii_lowercase();
                let at_boundary = chars.get(i + 3).map_or(true, |next| !next.is_alphabetic());
                if matches!(pair.as_str(), "st" | "nd" | "rd" | "th") && at_boundary {
                    i += 3;
                    continue;
                }
            }
        }
        i += 1;
    }

    out
}

/// Parses the human join-date text the team page shows, e.g. "December 19th, 2023".
pub fn parse_joined_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let cleaned = strip_ordinal_suffixes(trimmed);
    ["%B %d, %Y", "%B %d %Y", "%d %B %Y", "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
}

/// Finds the first `YYYY-MM-DD` run inside a snapshot file name.
pub fn snapshot_date_from_path(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    stem.char_indices().find_map(|(start, _)| {
        stem.get(start..start + 10)
            .and_then(|window| NaiveDate::parse_from_str(window, "%Y-%m-%d").ok())
    })
}

pub struct SnapshotImporter;

impl SnapshotImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
        let path = path.as_ref();
        let date =
            snapshot_date_from_path(path).ok_or_else(|| SnapshotError::Undated(path.into()))?;
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, date)
    }

    pub fn from_reader<R: Read>(reader: R, date: NaiveDate) -> Result<Snapshot, SnapshotError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: csv::StringRecord = csv_reader
            .headers()?
            .iter()
            .map(normalize_header)
            .collect();
        require_column(&headers, &NAME_COLUMNS, "name")?;
        require_column(&headers, &POINTS_COLUMNS, "points")?;
        csv_reader.set_headers(headers);

        let mut snapshot = Snapshot::new(date);
        for record in csv_reader.deserialize::<SnapshotRow>() {
            let row = record?;
            let name = row.name.trim();
            if name.is_empty() || snapshot.points.contains_key(name) {
                continue;
            }
            snapshot.insert(name, row.points, row.joined_date);
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn joined_dates_drop_ordinal_suffixes() {
        assert_eq!(parse_joined_date("December 19th, 2023"), Some(day(2023, 12, 19)));
        assert_eq!(parse_joined_date("August 1st, 2024"), Some(day(2024, 8, 1)));
        assert_eq!(parse_joined_date("March 22nd, 2024"), Some(day(2024, 3, 22)));
        assert_eq!(parse_joined_date("May 3rd, 2024"), Some(day(2024, 5, 3)));
        assert_eq!(parse_joined_date("2024-02-29"), Some(day(2024, 2, 29)));
    }

    #[test]
    fn month_names_are_not_mangled_by_suffix_stripping() {
        assert_eq!(strip_ordinal_suffixes("August 1st, 2024"), "August 1, 2024");
        assert_eq!(strip_ordinal_suffixes("1st"), "1");
        assert_eq!(strip_ordinal_suffixes("4three"), "4three");
    }

    #[test]
    fn unparseable_joined_dates_are_rejected() {
        assert!(parse_joined_date("").is_none());
        assert!(parse_joined_date("sometime last year").is_none());
        assert!(parse_joined_date("Smarch 3rd, 2024").is_none());
    }

    #[test]
    fn points_tolerate_separators_and_garbage() {
        assert_eq!(parse_points("1,234,567"), 1_234_567);
        assert_eq!(parse_points(" 42 "), 42);
        assert_eq!(parse_points("1500.0"), 1500);
        assert_eq!(parse_points("n/a"), 0);
        assert_eq!(parse_points("-3"), 0);
    }

    #[test]
    fn out_of_range_points_count_as_unreadable() {
        assert_eq!(parse_points("1e20"), 0);
        assert_eq!(parse_points("18446744073709551615"), 0);
        assert_eq!(parse_points("2.5e6"), 2_500_000);

        let csv = "name,points\nada,1e20\nbob,5\n";
        let snapshot = SnapshotImporter::from_reader(Cursor::new(csv), day(2024, 1, 2))
            .expect("import succeeds");
        assert_eq!(snapshot.points_for("ada"), Some(0));
        assert_eq!(snapshot.points_for("bob"), Some(5));
    }

    #[test]
    fn snapshot_date_comes_from_file_name() {
        let path = Path::new("Scraped_Team_Info/sheepit_team_points_2024-07-06.csv");
        assert_eq!(snapshot_date_from_path(path), Some(day(2024, 7, 6)));
        assert!(snapshot_date_from_path(Path::new("notes.csv")).is_none());
    }

    #[test]
    fn importer_reads_joined_column_and_aliases() {
        let csv = "rank,Member,Points,Joined Date\n\
1,ada,\"1,250,000\",\"December 19th, 2023\"\n\
2,grace,300,\n";
        let snapshot = SnapshotImporter::from_reader(Cursor::new(csv), day(2024, 1, 2))
            .expect("import succeeds");

        assert_eq!(snapshot.date, day(2024, 1, 2));
        assert_eq!(snapshot.points_for("ada"), Some(1_250_000));
        assert_eq!(snapshot.joined_for("ada"), Some("December 19th, 2023"));
        assert_eq!(snapshot.points_for("grace"), Some(300));
        assert_eq!(snapshot.joined_for("grace"), None);
    }

    #[test]
    fn importer_keeps_first_row_for_duplicate_members() {
        let csv = "name,points\nada,10\nada,99\n";
        let snapshot = SnapshotImporter::from_reader(Cursor::new(csv), day(2024, 1, 2))
            .expect("import succeeds");
        assert_eq!(snapshot.points_for("ada"), Some(10));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn importer_rejects_missing_points_column() {
        let csv = "name,score\nada,10\n";
        let error = SnapshotImporter::from_reader(Cursor::new(csv), day(2024, 1, 2))
            .expect_err("points column required");
        match error {
            SnapshotError::MissingColumn { column } => assert_eq!(column, "points"),
            other => panic!("expected missing column, got {other:?}"),
        }
    }

    #[test]
    fn importer_from_path_requires_dated_file_name() {
        let error = SnapshotImporter::from_path("./team_points.csv").expect_err("undated");
        assert!(matches!(error, SnapshotError::Undated(_)));
    }

    #[test]
    fn importer_from_path_propagates_io_errors() {
        let error = SnapshotImporter::from_path("./sheepit_team_points_2024-01-01.csv")
            .expect_err("expected io error");
        match error {
            SnapshotError::Io(_) => {}
            other => panic!("expected io error, got {other:?}"),
        }
    }
}
