//! Partitioning rows by job and ordering each job chronologically.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::row::{FieldMap, Row};

const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
// Two-digit years go first: `%Y` would read "24" as the year 24.
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%y", "%m/%d/%Y", "%m-%d-%y", "%m-%d-%Y"];
const TIME_SUFFIXES: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

/// All rows of one job, in canonical processing order.
#[derive(Debug, Clone)]
pub struct JobGroup<'a> {
    pub job: &'a str,
    pub rows: Vec<&'a Row>,
}

/// Parses the date formats seen in DWR exports. Dates without a time sort
/// at midnight.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }

    let year_first = value.len() >= 4 && value.as_bytes()[..4].iter().all(u8::is_ascii_digit);
    let formats = if year_first {
        YEAR_FIRST_FORMATS
    } else {
        MONTH_FIRST_FORMATS
    };

    if let Some(date) = parse_day(value, formats) {
        return date.and_hms_opt(0, 0, 0);
    }

    let (day, time) = value.split_once(char::is_whitespace)?;
    let date = parse_day(day, formats)?;
    let time = time.trim();
    let time = TIME_SUFFIXES
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())?;
    Some(date.and_time(time))
}

fn parse_day(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Ordering key of one row, computed once per sort.
#[derive(Debug, Clone, Copy)]
struct SortKey<'a> {
    date: Option<NaiveDateTime>,
    sequence: &'a str,
    position: usize,
}

impl<'a> SortKey<'a> {
    fn of(row: &'a Row, fields: &FieldMap) -> Self {
        Self {
            date: parse_date(row.get(&fields.date)),
            sequence: row.get(&fields.sequence),
            position: row.position(),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        let by_date = match (self.date, other.date) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => Ordering::Equal,
        };
        by_date
            .then_with(|| self.sequence.cmp(other.sequence))
            .then_with(|| self.position.cmp(&other.position))
    }

    /// Sequence and position only, for pairs where a date is missing.
    fn compare_undated(&self, other: &Self) -> Ordering {
        self.sequence
            .cmp(other.sequence)
            .then_with(|| self.position.cmp(&other.position))
    }
}

/// Canonical comparison of two rows of the same job.
///
/// The date only decides when both sides parse and differ. Otherwise the
/// sequence field decides, then the input position.
pub fn compare_rows(a: &Row, b: &Row, fields: &FieldMap) -> Ordering {
    SortKey::of(a, fields).compare(&SortKey::of(b, fields))
}

/// Groups `rows` by job number, keeping groups in order of first
/// appearance. Rows without a job number share the `""` group.
pub fn group_by_job<'a>(rows: &'a [Row], fields: &FieldMap) -> Vec<JobGroup<'a>> {
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    let mut groups: Vec<JobGroup<'a>> = Vec::new();

    for row in rows {
        let job = row.get(&fields.job).trim();
        let slot = *index.entry(job).or_insert_with(|| {
            groups.push(JobGroup {
                job,
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(row);
    }

    for group in &mut groups {
        sort_rows(&mut group.rows, fields);
    }
    groups
}

/// Sorts one job's rows by [`compare_rows`] in `O(n log n)`.
///
/// Among dated rows the comparison is a total order, and the same holds among
/// undated ones, so each side is sorted on its own. The two runs are then
/// merged on sequence and position, which is how a dated row compares with
/// an undated one. The result depends only on the rows, never on input order.
fn sort_rows<'a>(rows: &mut [&'a Row], fields: &FieldMap) {
    let (mut dated, mut undated): (Vec<_>, Vec<_>) = rows
        .iter()
        .map(|&row| (SortKey::of(row, fields), row))
        .partition(|(key, _)| key.date.is_some());
    dated.sort_by(|a, b| a.0.compare(&b.0));
    undated.sort_by(|a, b| a.0.compare_undated(&b.0));

    let mut dated = dated.into_iter().peekable();
    let mut undated = undated.into_iter().peekable();
    for slot in rows.iter_mut() {
        let take_undated = match (dated.peek(), undated.peek()) {
            (Some(d), Some(u)) => u.0.compare_undated(&d.0) == Ordering::Less,
            (None, _) => true,
            (Some(_), None) => false,
        };
        let next = if take_undated {
            undated.next()
        } else {
            dated.next()
        };
        if let Some((_, row)) = next {
            *slot = row;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(position: usize, pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(position, pairs.iter().copied())
    }

    fn positions(group: &JobGroup<'_>) -> Vec<usize> {
        group.rows.iter().map(|r| r.position()).collect()
    }

    #[test]
    fn parses_common_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        for value in ["2024-03-07", "2024/03/07", "03/07/2024", "3/7/2024", "03-07-2024", "3/7/24"] {
            assert_eq!(parse_date(value), Some(expected), "{value}");
        }
        assert_eq!(
            parse_date("2024-03-07 14:30"),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap().and_hms_opt(14, 30, 0)
        );
        assert_eq!(
            parse_date("2024-03-07T08:15:00"),
            NaiveDate::from_ymd_opt(2024, 3, 7).unwrap().and_hms_opt(8, 15, 0)
        );
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let rows = vec![
            row(0, &[("job_number", "B")]),
            row(1, &[("job_number", "A")]),
            row(2, &[("job_number", " B ")]),
            row(3, &[("notes", "no job")]),
        ];
        let groups = group_by_job(&rows, &FieldMap::default());
        let jobs: Vec<_> = groups.iter().map(|g| g.job).collect();
        assert_eq!(jobs, vec!["B", "A", ""]);
        assert_eq!(positions(&groups[0]), vec![0, 2]);
        assert_eq!(positions(&groups[2]), vec![3]);
    }

    #[test]
    fn sorts_by_date_then_sequence_then_position() {
        let rows = vec![
            row(0, &[("job_number", "J"), ("date", "2024-02-01"), ("dwr_number", "9")]),
            row(1, &[("job_number", "J"), ("date", "2024-01-15"), ("dwr_number", "7")]),
            row(2, &[("job_number", "J"), ("date", "2024-01-15"), ("dwr_number", "3")]),
            row(3, &[("job_number", "J"), ("date", "2024-01-15"), ("dwr_number", "3")]),
        ];
        let groups = group_by_job(&rows, &FieldMap::default());
        assert_eq!(positions(&groups[0]), vec![2, 3, 1, 0]);
    }

    #[test]
    fn unparseable_date_falls_through_to_sequence() {
        let a = row(0, &[("date", "2024-05-01"), ("dwr_number", "B")]);
        let b = row(1, &[("date", "unknown"), ("dwr_number", "A")]);
        let fields = FieldMap::default();
        assert_eq!(compare_rows(&a, &b, &fields), Ordering::Greater);
        assert_eq!(compare_rows(&b, &a, &fields), Ordering::Less);
    }

    #[test]
    fn undated_rows_merge_by_sequence() {
        let rows = vec![
            row(0, &[("date", "2024-03-01"), ("dwr_number", "2")]),
            row(1, &[("date", "n/a"), ("dwr_number", "3")]),
            row(2, &[("date", "2024-01-01"), ("dwr_number", "4")]),
            row(3, &[("dwr_number", "1")]),
        ];
        let fields = FieldMap::default();
        let groups = group_by_job(&rows, &fields);
        // Dated rows keep date order (2 before 0); undated ones slot in by
        // sequence against their dated neighbours.
        assert_eq!(positions(&groups[0]), vec![3, 1, 2, 0]);

        let reversed: Vec<Row> = rows.iter().rev().cloned().collect();
        assert_eq!(positions(&group_by_job(&reversed, &fields)[0]), vec![3, 1, 2, 0]);
    }

    #[test]
    fn newest_first_export_sorts_quickly() {
        let start = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        let rows: Vec<Row> = (0..8000)
            .map(|i| {
                let date = start + chrono::Duration::days(8000 - i as i64);
                Row::from_pairs(
                    i,
                    [
                        ("job_number", "J".to_string()),
                        ("date", date.format("%m/%d/%Y").to_string()),
                        ("dwr_number", i.to_string()),
                    ],
                )
            })
            .collect();

        let timer = std::time::Instant::now();
        let groups = group_by_job(&rows, &FieldMap::default());
        assert!(timer.elapsed() < std::time::Duration::from_secs(10));

        let sorted = positions(&groups[0]);
        assert_eq!(sorted.len(), 8000);
        assert_eq!(sorted[0], 7999);
        assert_eq!(sorted[7999], 0);
    }

    #[test]
    fn shuffled_input_sorts_identically() {
        let make = |order: &[usize]| {
            let dates = ["2024-01-03", "2024-01-01", "2024-01-02", "2024-01-01"];
            let seqs = ["1", "2", "1", "1"];
            order
                .iter()
                .map(|&i| {
                    Row::from_pairs(
                        i,
                        [
                            ("job_number", "J".to_string()),
                            ("date", dates[i].to_string()),
                            ("dwr_number", seqs[i].to_string()),
                        ],
                    )
                })
                .collect::<Vec<_>>()
        };
        let fields = FieldMap::default();
        let forward = make(&[0, 1, 2, 3]);
        let shuffled = make(&[2, 3, 0, 1]);
        let a = group_by_job(&forward, &fields);
        let b = group_by_job(&shuffled, &fields);
        assert_eq!(positions(&a[0]), vec![3, 1, 2, 0]);
        assert_eq!(positions(&a[0]), positions(&b[0]));
    }
}
