//! Raw hourly data loading
//!
//! [SampleLoader] discovers the relevant hourly files of a day, decompresses
//! and deserializes them and applies the column/row filters, concatenating
//! everything into a single [Samples] table.

use chrono::NaiveDate;
use flate2::read::GzDecoder;
use itertools::Itertools;
use std::io::Read;
use std::ops::Deref;
use std::{fs::File, path::Path};
use strum::IntoEnumIterator;

use crate::archive::{Archive, ArchiveError, HourRange};
use crate::record::{Field, Record};

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("failed to open the hourly data file")]
    Io(#[from] std::io::Error),
    #[error("failed to deserialize the CSV file")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
}
type Result<T> = std::result::Result<T, LoadError>;

/// Row-dropping policy for missing values
#[derive(Debug, Clone)]
pub enum DropNa {
    /// Drop a row when any considered channel is missing
    Any,
    /// Drop a row when every considered channel is missing
    All,
    /// Drop a row when any of the listed channels is missing
    Fields(Vec<Field>),
}

/// A loaded table of sensor readings
#[derive(Default, Debug)]
pub struct Samples(Vec<Record>);
impl Deref for Samples {
    type Target = Vec<Record>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl FromIterator<Record> for Samples {
    fn from_iter<T: IntoIterator<Item = Record>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
impl Samples {
    /// One channel as a column, missing values included
    pub fn column(&self, field: Field) -> Vec<Option<f64>> {
        self.iter().map(|r| r.value(field)).collect()
    }
    /// The non-missing values of one channel
    pub fn values(&self, field: Field) -> Vec<f64> {
        self.iter().filter_map(|r| r.value(field)).collect()
    }
    /// Per-channel count of values, count of missing values and missing rate
    pub fn na_summary(&self) -> Vec<(Field, usize, usize, f64)> {
        let n = self.len();
        Field::iter()
            .map(|field| {
                let values = self.values(field).len();
                let missing = n - values;
                let rate = if n == 0 { 0. } else { missing as f64 / n as f64 };
                (field, values, missing, rate)
            })
            .collect()
    }
    pub fn summary(&self) {
        let stats = |x: &[f64]| {
            let n = x.len() as f64;
            let mean = x.iter().sum::<f64>() / n;
            let std = (x.iter().map(|x| x - mean).fold(0f64, |s, x| s + x * x) / n).sqrt();
            (mean, std)
        };
        let minmax = |x: &[f64]| {
            (
                x.iter().cloned().fold(f64::INFINITY, f64::min),
                x.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            )
        };

        println!("SUMMARY:");
        println!(" - # of records: {}", self.len());
        if let Some((first, last)) = self
            .iter()
            .filter_map(|r| r.utc())
            .minmax()
            .into_option()
        {
            println!(" - time range: [{} - {}]", first, last);
        }
        println!(
            "    {:^16}: ({:^12}, {:^12})  ({:^12}, {:^12})  {:>8}",
            "CHANNEL", "MEAN", "STD", "MIN", "MAX", "NA"
        );
        for (field, values, missing, _) in self.na_summary() {
            if values == 0 {
                continue;
            }
            let x = self.values(field);
            println!(
                "  - {:16}: {:>12.3?}  {:>12.3?}  {:>8}",
                field.to_string(),
                stats(&x),
                minmax(&x),
                missing
            );
        }
    }
}

/// Builder for loading raw readings of one or more days
pub struct SampleLoader<'a> {
    archive: &'a Archive,
    hours: HourRange,
    fields: Option<Vec<Field>>,
    bounds: Vec<(Field, (f64, f64))>,
    drop_na: Option<DropNa>,
}
impl<'a> SampleLoader<'a> {
    pub fn new(archive: &'a Archive) -> Self {
        Self {
            archive,
            hours: HourRange::default(),
            fields: None,
            bounds: vec![],
            drop_na: None,
        }
    }
    pub fn hours(self, hours: HourRange) -> Self {
        Self { hours, ..self }
    }
    /// Column filter; lat/lng are always kept
    pub fn fields(self, fields: &[Field]) -> Self {
        let mut fields = fields.to_vec();
        for latlng in [Field::Lat, Field::Lng] {
            if !fields.contains(&latlng) {
                fields.push(latlng);
            }
        }
        Self {
            fields: Some(fields),
            ..self
        }
    }
    /// Row filter: keep rows with `lo <= field <= hi`, conjunctive across calls
    pub fn between(mut self, field: Field, lo: f64, hi: f64) -> Self {
        self.bounds.push((field, (lo, hi)));
        self
    }
    pub fn drop_na(self, drop_na: DropNa) -> Self {
        Self {
            drop_na: Some(drop_na),
            ..self
        }
    }

    fn read_hour(&self, path: &Path) -> Result<Vec<Record>> {
        let csv_file = File::open(path)?;
        let mut gz = GzDecoder::new(csv_file);
        let mut contents = String::new();
        gz.read_to_string(&mut contents)?;
        let mut rdr = csv::Reader::from_reader(contents.as_bytes());
        let mut records = vec![];
        for result in rdr.deserialize() {
            records.push(result?);
        }
        Ok(records)
    }
    fn considered_fields(&self) -> Vec<Field> {
        self.fields
            .clone()
            .unwrap_or_else(|| Field::iter().collect())
    }
    fn keep(&self, record: &Record) -> bool {
        if let Some(drop_na) = &self.drop_na {
            let na = |fields: &[Field]| -> Vec<bool> {
                fields.iter().map(|&f| record.value(f).is_none()).collect()
            };
            let dropped = match drop_na {
                DropNa::Any => na(&self.considered_fields()).into_iter().any(|x| x),
                DropNa::All => na(&self.considered_fields()).into_iter().all(|x| x),
                DropNa::Fields(fields) => na(fields).into_iter().any(|x| x),
            };
            if dropped {
                return false;
            }
        }
        self.bounds.iter().all(|&(field, (lo, hi))| {
            record
                .value(field)
                .map_or(false, |x| (lo..=hi).contains(&x))
        })
    }

    /// Loads one day of readings, `None` when the day or the requested hours
    /// have no data at all
    pub fn load_day(&self, date: NaiveDate) -> Result<Option<Samples>> {
        if !self.archive.data_exists(date) {
            log::warn!("no data at all for {}", date);
            return Ok(None);
        }
        let relevant_hours = self.archive.relevant_hours(date, self.hours)?;
        if relevant_hours.is_empty() {
            log::warn!("on {}, no data for the desired hours", date);
            return Ok(None);
        }
        let mut records = vec![];
        for hour in relevant_hours {
            records.extend(self.read_hour(&self.archive.hour_path(date, hour))?);
        }
        if let Some(fields) = &self.fields {
            records.iter_mut().for_each(|r| r.retain(fields));
        }
        let samples: Samples = records.into_iter().filter(|r| self.keep(r)).collect();
        if samples.is_empty() {
            log::warn!("on {}, no data matched the where/na filters", date);
        }
        Ok(Some(samples))
    }
    /// Loads and concatenates an inclusive date range, skipping missing days
    pub fn load_days(&self, start: NaiveDate, end: NaiveDate) -> Result<Option<Samples>> {
        let mut records = vec![];
        let mut found = false;
        for date in crate::archive::dates(start, end)? {
            if let Some(samples) = self.load_day(date)? {
                found = true;
                records.extend(samples.0);
            }
        }
        if !found {
            log::warn!("no data found between {} and {}", start, end);
            return Ok(None);
        }
        Ok(Some(Samples(records)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit;

    #[test]
    fn load_one_day() {
        let (dir, archive) = testkit::scratch_archive();
        let date = testkit::date("2019/07/04");
        testkit::write_hour(
            &archive,
            date,
            9,
            &[
                testkit::record(Some(21.5), Some(1013.), Some(32.1), Some(34.8)),
                testkit::record(None, Some(1009.), Some(32.1), Some(34.8)),
            ],
        );
        testkit::write_hour(
            &archive,
            date,
            17,
            &[testkit::record(Some(24.), None, Some(48.9), Some(2.3))],
        );

        let samples = SampleLoader::new(&archive).load_day(date).unwrap().unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples.values(Field::Temperature), vec![21.5, 24.]);
        drop(dir);
    }

    #[test]
    fn hour_filtering() {
        let (dir, archive) = testkit::scratch_archive();
        let date = testkit::date("2019/07/04");
        testkit::write_hour(
            &archive,
            date,
            9,
            &[testkit::record(Some(21.5), None, Some(32.1), Some(34.8))],
        );
        testkit::write_hour(
            &archive,
            date,
            17,
            &[testkit::record(Some(24.), None, Some(48.9), Some(2.3))],
        );

        let samples = SampleLoader::new(&archive)
            .hours(HourRange::new(0, 12).unwrap())
            .load_day(date)
            .unwrap()
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].temperature, Some(21.5));
        drop(dir);
    }

    #[test]
    fn missing_day_is_none() {
        let (dir, archive) = testkit::scratch_archive();
        assert!(SampleLoader::new(&archive)
            .load_day(testkit::date("2019/07/04"))
            .unwrap()
            .is_none());
        drop(dir);
    }

    #[test]
    fn row_and_column_filters() {
        let (dir, archive) = testkit::scratch_archive();
        let date = testkit::date("2019/07/04");
        testkit::write_hour(
            &archive,
            date,
            0,
            &[
                testkit::record(Some(21.5), Some(1013.), Some(32.1), Some(34.8)),
                testkit::record(Some(35.), Some(1013.), Some(32.1), Some(34.8)),
                testkit::record(None, None, Some(32.1), Some(34.8)),
            ],
        );

        let samples = SampleLoader::new(&archive)
            .fields(&[Field::Temperature, Field::Pressure])
            .drop_na(DropNa::Fields(vec![Field::Temperature]))
            .between(Field::Temperature, 0., 30.)
            .load_day(date)
            .unwrap()
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].temperature, Some(21.5));
        // the column filter kept lat/lng
        assert_eq!(samples[0].lat, Some(32.1));
        assert_eq!(samples[0].humidity, None);
        drop(dir);
    }

    #[test]
    fn concatenate_days() {
        let (dir, archive) = testkit::scratch_archive();
        let d1 = testkit::date("2019/07/04");
        let d3 = testkit::date("2019/07/06");
        testkit::write_hour(
            &archive,
            d1,
            0,
            &[testkit::record(Some(20.), None, Some(32.1), Some(34.8))],
        );
        testkit::write_hour(
            &archive,
            d3,
            0,
            &[testkit::record(Some(22.), None, Some(32.1), Some(34.8))],
        );

        let samples = SampleLoader::new(&archive)
            .load_days(d1, d3)
            .unwrap()
            .unwrap();
        assert_eq!(samples.len(), 2);
        assert!(SampleLoader::new(&archive)
            .load_days(
                testkit::date("2020/01/01"),
                testkit::date("2020/01/02")
            )
            .unwrap()
            .is_none());
        drop(dir);
    }
}
