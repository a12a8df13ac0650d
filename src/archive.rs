//! Date-partitioned sensor archive
//!
//! Raw hourly readings live in `{root}/{yyyy}/{mm}/{dd}/{hh}.csv.gz` with the
//! cached aggregation files next to them.

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};

pub const SENSOR_ARCHIVE: &str = "SENSOR_ARCHIVE";

#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    #[error("hour {0} is out of the 0-23 range")]
    HourOutOfRange(u32),
    #[error("hour range start {0} is past its end {1}")]
    HourOrder(u32, u32),
    #[error("date range start {0} is past its end {1}")]
    DateOrder(NaiveDate, NaiveDate),
    #[error("the {SENSOR_ARCHIVE} environment variable is not set")]
    Env(#[from] env::VarError),
    #[error("failed to scan the day directory")]
    Pattern(#[from] glob::PatternError),
}
type Result<T> = std::result::Result<T, ArchiveError>;

/// An inclusive range of hours of the day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourRange {
    start: u32,
    end: u32,
}
impl Default for HourRange {
    fn default() -> Self {
        Self { start: 0, end: 23 }
    }
}
impl HourRange {
    pub fn new(start: u32, end: u32) -> Result<Self> {
        if start > 23 {
            return Err(ArchiveError::HourOutOfRange(start));
        }
        if end > 23 {
            return Err(ArchiveError::HourOutOfRange(end));
        }
        if start > end {
            return Err(ArchiveError::HourOrder(start, end));
        }
        Ok(Self { start, end })
    }
    /// A single-hour range
    pub fn single(hour: u32) -> Result<Self> {
        Self::new(hour, hour)
    }
    pub fn hours(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
    pub fn contains(&self, hour: u32) -> bool {
        (self.start..=self.end).contains(&hour)
    }
}

/// Root of the sensor data tree
#[derive(Debug, Clone)]
pub struct Archive {
    root: PathBuf,
}
impl Archive {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
    /// Archive rooted at the `SENSOR_ARCHIVE` environment variable
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(env::var(SENSOR_ARCHIVE)?))
    }
    pub fn root(&self) -> &Path {
        &self.root
    }
    /// Directory holding one day of hourly files: `{root}/{yyyy}/{mm}/{dd}`
    pub fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.root
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(format!("{:02}", date.day()))
    }
    /// Raw hourly file: `{day_dir}/{hh}.csv.gz`
    pub fn hour_path(&self, date: NaiveDate, hour: u32) -> PathBuf {
        self.day_dir(date).join(format!("{:02}.csv.gz", hour))
    }
    pub fn daily_agg_path(&self, date: NaiveDate) -> PathBuf {
        self.day_dir(date)
            .join(format!("{}_daily_agg.csv.gz", date.format("%Y%m%d")))
    }
    pub fn hourly_agg_path(&self, date: NaiveDate) -> PathBuf {
        self.day_dir(date)
            .join(format!("{}_hourly_agg.csv.gz", date.format("%Y%m%d")))
    }
    pub fn monthly_agg_path(&self, year: i32, month: u32) -> PathBuf {
        self.root
            .join(format!("{:04}", year))
            .join(format!("{:02}", month))
            .join(format!("{:04}{:02}_monthly_agg.csv.gz", year, month))
    }
    pub fn yearly_agg_path(&self, year: i32) -> PathBuf {
        self.root
            .join(format!("{:04}", year))
            .join(format!("{:04}_yearly_agg.csv.gz", year))
    }
    /// Is there a day directory for this date?
    pub fn data_exists(&self, date: NaiveDate) -> bool {
        self.day_dir(date).exists()
    }
    /// Sorted hours of the day that have a raw file
    pub fn hours_with_data(&self, date: NaiveDate) -> Result<Vec<u32>> {
        if !self.data_exists(date) {
            return Ok(vec![]);
        }
        let pattern = self.day_dir(date).join("*.csv.gz");
        let re = Regex::new(r"^(\d{2})\.csv\.gz$").expect("hour file regex");
        let mut hours: Vec<u32> = glob::glob(&pattern.to_string_lossy())?
            .filter_map(|entry| entry.ok())
            .filter_map(|path| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                re.captures(&name)
                    .and_then(|capts| capts.get(1)?.as_str().parse::<u32>().ok())
            })
            .filter(|&h| h < 24)
            .collect();
        hours.sort_unstable();
        Ok(hours)
    }
    /// Hours that are both requested and present on disk
    ///
    /// Requested hours with no file are reported through the log.
    pub fn relevant_hours(&self, date: NaiveDate, range: HourRange) -> Result<Vec<u32>> {
        let available = self.hours_with_data(date)?;
        let (relevant, missing): (Vec<u32>, Vec<u32>) =
            range.hours().partition(|h| available.contains(h));
        if !missing.is_empty() {
            log::warn!("on {}, no data for hours {:?}", date, missing);
        }
        Ok(relevant)
    }
}

/// Inclusive list of dates between `start` and `end`
pub fn dates(start: NaiveDate, end: NaiveDate) -> Result<Vec<NaiveDate>> {
    if start > end {
        return Err(ArchiveError::DateOrder(start, end));
    }
    let n = (end - start).num_days() as usize + 1;
    Ok((0..n)
        .map(|k| start + Duration::days(k as i64))
        .collect())
}
