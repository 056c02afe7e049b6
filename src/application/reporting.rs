//! Read-only statistics over every city table
//!
//! Rows whose "Date Added" cell is missing or unparseable are skipped
//! silently. "Today" and "last 7 days" windows include their boundary days.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::errors::StorageError;
use crate::domain::lead::{CLINIC_NAME_COLUMN, DATE_ADDED_COLUMN, DATE_FORMAT, NOT_AVAILABLE, WEBSITE_COLUMN};
use crate::domain::repositories::{Row, TableBackend};

/// Accepted spellings of the "Date Added" cell
const DATE_FORMATS: [&str; 3] = [DATE_FORMAT, "%Y/%m/%d", "%m/%d/%Y"];

const RECENT_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub date_added: NaiveDate,
    pub city: String,
    pub clinic_name: String,
    pub website: String,
}

/// Leads added yesterday vs. today for one city
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyComparison {
    pub city: String,
    pub yesterday: usize,
    pub today: usize,
    pub change: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedCount {
    pub date_added: NaiveDate,
    pub city: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadReport {
    pub generated_on: NaiveDate,
    pub total: usize,
    pub added_today: usize,
    pub added_last_7_days: usize,
    pub per_city: BTreeMap<String, usize>,
    /// Valid rows, newest first
    pub log: Vec<LogEntry>,
    pub daily_comparison: Vec<DailyComparison>,
    /// Counts per (date, city), oldest first
    pub grouped: Vec<GroupedCount>,
    pub skipped_rows: usize,
}

pub struct ReportingView {
    backend: Arc<dyn TableBackend>,
}

impl ReportingView {
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate(&self, today: NaiveDate) -> Result<LeadReport, StorageError> {
        let mut tables = Vec::new();
        for name in self.backend.list_tables().await? {
            let rows = self.backend.read_all_rows(&name).await?;
            tables.push((name, rows));
        }

        let report = build_report(&tables, today);
        info!(
            "📊 Report over {} table(s): total={}, today={}, last 7 days={}",
            tables.len(),
            report.total,
            report.added_today,
            report.added_last_7_days
        );
        Ok(report)
    }
}

/// Parse a "Date Added" cell, tolerating timestamps that start with a date
pub fn parse_date_added(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(cell, format).ok())
        .or_else(|| {
            cell.get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, DATE_FORMAT).ok())
        })
}

fn signed(count: usize) -> i64 {
    i64::try_from(count).unwrap_or(i64::MAX)
}

/// Aggregate `(table name, rows with header)` pairs
pub fn build_report(tables: &[(String, Vec<Row>)], today: NaiveDate) -> LeadReport {
    let yesterday = today - Duration::days(1);
    let window_start = today - Duration::days(RECENT_WINDOW_DAYS);

    let mut report = LeadReport {
        generated_on: today,
        total: 0,
        added_today: 0,
        added_last_7_days: 0,
        per_city: BTreeMap::new(),
        log: Vec::new(),
        daily_comparison: Vec::new(),
        grouped: Vec::new(),
        skipped_rows: 0,
    };
    let mut grouped: BTreeMap<(NaiveDate, String), usize> = BTreeMap::new();

    for (city, rows) in tables {
        let mut valid = 0;
        let mut comparison = DailyComparison {
            city: city.clone(),
            yesterday: 0,
            today: 0,
            change: 0,
        };

        let Some((header, data)) = rows.split_first() else {
            report.per_city.insert(city.clone(), 0);
            report.daily_comparison.push(comparison);
            continue;
        };
        let column = |name: &str| header.iter().position(|h| h.trim() == name);
        let Some(date_idx) = column(DATE_ADDED_COLUMN) else {
            debug!("Table '{}' has no date column; {} row(s) skipped", city, data.len());
            report.skipped_rows += data.len();
            report.per_city.insert(city.clone(), 0);
            report.daily_comparison.push(comparison);
            continue;
        };
        let name_idx = column(CLINIC_NAME_COLUMN);
        let website_idx = column(WEBSITE_COLUMN);
        let cell = |row: &Row, idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .cloned()
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        };

        for row in data {
            let Some(date) = row.get(date_idx).and_then(|c| parse_date_added(c)) else {
                report.skipped_rows += 1;
                continue;
            };

            valid += 1;
            if date == today {
                report.added_today += 1;
                comparison.today += 1;
            } else if date == yesterday {
                comparison.yesterday += 1;
            }
            if date >= window_start && date <= today {
                report.added_last_7_days += 1;
            }
            *grouped.entry((date, city.clone())).or_default() += 1;

            report.log.push(LogEntry {
                date_added: date,
                city: city.clone(),
                clinic_name: cell(row, name_idx),
                website: cell(row, website_idx),
            });
        }

        comparison.change = signed(comparison.today) - signed(comparison.yesterday);
        report.total += valid;
        report.per_city.insert(city.clone(), valid);
        report.daily_comparison.push(comparison);
    }

    report.log.sort_by(|a, b| b.date_added.cmp(&a.date_added));
    report.grouped = grouped
        .into_iter()
        .map(|((date_added, city), count)| GroupedCount { date_added, city, count })
        .collect();
    report
}

impl fmt::Display for LeadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lead report ({})", self.generated_on)?;
        writeln!(f, "  Total leads:      {}", self.total)?;
        writeln!(f, "  Added today:      {}", self.added_today)?;
        writeln!(f, "  Added last 7 days: {}", self.added_last_7_days)?;

        writeln!(f, "\nLeads per city")?;
        for (city, count) in &self.per_city {
            writeln!(f, "  {city:<20} {count:>6}")?;
        }

        writeln!(f, "\nYesterday vs. today")?;
        writeln!(f, "  {:<20} {:>9} {:>6} {:>7}", "City", "Yesterday", "Today", "Change")?;
        for row in &self.daily_comparison {
            writeln!(f, "  {:<20} {:>9} {:>6} {:>+7}", row.city, row.yesterday, row.today, row.change)?;
        }

        writeln!(f, "\nLeads by date and city")?;
        for group in &self.grouped {
            writeln!(f, "  {}  {:<20} {:>6}", group.date_added, group.city, group.count)?;
        }

        writeln!(f, "\nLead log (newest first)")?;
        writeln!(f, "  {:<10}  {:<15} {:<30} {}", "Date", "City", "Clinic", "Website")?;
        for entry in &self.log {
            writeln!(
                f,
                "  {}  {:<15} {:<30} {}",
                entry.date_added, entry.city, entry.clinic_name, entry.website
            )?;
        }
        if self.skipped_rows > 0 {
            writeln!(f, "\n({} row(s) without a valid date were skipped)", self.skipped_rows)?;
        }
        Ok(())
    }
}
