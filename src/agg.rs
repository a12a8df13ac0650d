//! Cached aggregation files and time-scale roll-ups
//!
//! Daily aggregations are persisted next to the raw hourly files and rolled up
//! into monthly and yearly files so the slow raw scans only ever run once.
//! The on-disk schema is one gzip CSV row per (cell, variable).

use chrono::NaiveDate;
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;

use crate::archive::{Archive, ArchiveError, HourRange};
use crate::grid::{Grid, GridCell, GridError};
use crate::load::{LoadError, SampleLoader};
use crate::record::{AtmosProperty, Field};
use crate::stats::{hourly_spatial_agg, spatial_agg, CellStats, SpatialAgg, Summary};

#[derive(thiserror::Error, Debug)]
pub enum AggError {
    #[error("failed to access the aggregate file")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize the aggregate CSV")]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("no cached aggregate file at {0}")]
    Missing(PathBuf),
}
type Result<T> = std::result::Result<T, AggError>;

/// One (cell, variable) row of a cached aggregate file
///
/// Every aggregate kind shares this header; `hour` is set in hourly files,
/// `days`/`months` in roll-ups, and each serializes empty elsewhere.
#[derive(Debug, Serialize, Deserialize)]
struct AggRow {
    lat: f64,
    lng: f64,
    hour: Option<u32>,
    prop: AtmosProperty,
    samples: usize,
    count: usize,
    mean: f64,
    median: f64,
    std: f64,
    min: f64,
    max: f64,
    na_rate: f64,
    days: Option<usize>,
    months: Option<usize>,
}
impl AggRow {
    fn new(grid: &Grid, cell: GridCell, stats: &CellStats, prop: AtmosProperty) -> Option<Self> {
        let summary = stats.props.get(&prop)?;
        Some(Self {
            lat: grid.lat(cell),
            lng: grid.lng(cell),
            hour: None,
            prop,
            samples: stats.samples,
            count: summary.count,
            mean: summary.mean,
            median: summary.median,
            std: summary.std,
            min: summary.min,
            max: summary.max,
            na_rate: summary.na_rate,
            days: None,
            months: None,
        })
    }
    fn summary(&self) -> Summary {
        Summary {
            count: self.count,
            mean: self.mean,
            median: self.median,
            std: self.std,
            min: self.min,
            max: self.max,
            na_rate: self.na_rate,
        }
    }
}

fn write_rows(path: &Path, rows: Vec<AggRow>) -> Result<()> {
    let file = File::create(path)?;
    let gz = GzEncoder::new(file, Compression::default());
    let mut wtr = csv::Writer::from_writer(gz);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| e.into_error())?.finish()?;
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<AggRow>> {
    if !path.exists() {
        return Err(AggError::Missing(path.to_path_buf()));
    }
    let file = File::open(path)?;
    let mut gz = GzDecoder::new(file);
    let mut contents = String::new();
    gz.read_to_string(&mut contents)?;
    let mut rdr = csv::Reader::from_reader(contents.as_bytes());
    let mut rows = vec![];
    for result in rdr.deserialize() {
        rows.push(result?);
    }
    Ok(rows)
}

fn agg_from_rows(rows: &[AggRow], grid: Grid) -> SpatialAgg {
    let mut agg = SpatialAgg::new(grid);
    let mut cells: BTreeMap<GridCell, CellStats> = BTreeMap::new();
    for row in rows {
        if let Some(cell) = grid.cell_at(row.lat, row.lng) {
            let stats = cells.entry(cell).or_default();
            stats.samples = row.samples;
            stats.props.insert(row.prop, row.summary());
        }
    }
    for (cell, stats) in cells {
        agg.insert(cell, stats);
    }
    agg
}

fn agg_to_rows(agg: &SpatialAgg) -> Vec<AggRow> {
    agg.cells()
        .flat_map(|(&cell, stats)| {
            AtmosProperty::iter().filter_map(move |prop| AggRow::new(agg.grid(), cell, stats, prop))
        })
        .collect()
}

/// A full day of readings aggregated over the spatial grid
#[derive(Debug)]
pub struct DailyAgg {
    pub date: NaiveDate,
    pub agg: SpatialAgg,
}
impl DailyAgg {
    /// Aggregates the raw hourly files of a day, `None` when the day has no data
    pub fn compute(archive: &Archive, date: NaiveDate, grid: Grid) -> Result<Option<Self>> {
        let fields: Vec<Field> = AtmosProperty::iter().map(Field::from).collect();
        let samples = SampleLoader::new(archive).fields(&fields).load_day(date)?;
        Ok(samples.map(|samples| Self {
            date,
            agg: spatial_agg(&samples, grid),
        }))
    }
    /// Writes the `{yyyymmdd}_daily_agg.csv.gz` file next to the hourly data
    pub fn write(&self, archive: &Archive) -> Result<()> {
        write_rows(&archive.daily_agg_path(self.date), agg_to_rows(&self.agg))
    }
    /// Loads a cached daily aggregation
    pub fn load(archive: &Archive, date: NaiveDate, grid: Grid) -> Result<Self> {
        Self::load_where(archive, date, grid, None, None)
    }
    /// Loads a cached daily aggregation restricted to one variable and/or one
    /// cell
    pub fn load_where(
        archive: &Archive,
        date: NaiveDate,
        grid: Grid,
        prop: Option<AtmosProperty>,
        cell: Option<GridCell>,
    ) -> Result<Self> {
        let mut rows = read_rows(&archive.daily_agg_path(date))?;
        if let Some(prop) = prop {
            rows.retain(|row| row.prop == prop);
        }
        if let Some(cell) = cell {
            rows.retain(|row| grid.cell_at(row.lat, row.lng) == Some(cell));
        }
        Ok(Self {
            date,
            agg: agg_from_rows(&rows, grid),
        })
    }
}

/// Writes the hour-keyed aggregation of one day to `{yyyymmdd}_hourly_agg.csv.gz`
pub fn write_hourly_agg(
    archive: &Archive,
    date: NaiveDate,
    hourly: &BTreeMap<u32, SpatialAgg>,
) -> Result<()> {
    let rows = hourly
        .iter()
        .flat_map(|(&hour, agg)| {
            agg_to_rows(agg).into_iter().map(move |row| AggRow {
                hour: Some(hour),
                ..row
            })
        })
        .collect();
    write_rows(&archive.hourly_agg_path(date), rows)
}

/// Loads a cached hour-keyed aggregation
pub fn load_hourly_agg(
    archive: &Archive,
    date: NaiveDate,
    grid: Grid,
) -> Result<BTreeMap<u32, SpatialAgg>> {
    let rows = read_rows(&archive.hourly_agg_path(date))?;
    let mut by_hour: BTreeMap<u32, Vec<AggRow>> = BTreeMap::new();
    for row in rows {
        by_hour.entry(row.hour.unwrap_or(0)).or_default().push(row);
    }
    Ok(by_hour
        .into_iter()
        .map(|(hour, rows)| (hour, agg_from_rows(&rows, grid)))
        .collect())
}

/// Computes the hourly aggregation of a day and caches it
pub fn cache_hourly_agg(
    archive: &Archive,
    date: NaiveDate,
    grid: Grid,
) -> Result<BTreeMap<u32, SpatialAgg>> {
    let hourly = hourly_spatial_agg(archive, date, HourRange::default(), grid)?;
    if !hourly.is_empty() {
        write_hourly_agg(archive, date, &hourly)?;
    }
    Ok(hourly)
}

/// Combines per-period summaries of one variable into a coarser one
///
/// Counts sum, means are count-weighted, min/max are taken over the parts and
/// the standard deviation pools the second moments. The combined median is the
/// count-weighted mean of the part medians, an approximation since the raw
/// values are gone by now.
fn combine_summaries(parts: &[Summary], total_samples: usize) -> Summary {
    let count: usize = parts.iter().map(|s| s.count).sum();
    if count == 0 {
        return Summary::from_values(&[], total_samples);
    }
    let n = count as f64;
    let with_data = || parts.iter().filter(|s| s.count > 0);
    let mean = with_data().map(|s| s.count as f64 * s.mean).sum::<f64>() / n;
    let median = with_data().map(|s| s.count as f64 * s.median).sum::<f64>() / n;
    let min = with_data().map(|s| s.min).fold(f64::INFINITY, f64::min);
    let max = with_data().map(|s| s.max).fold(f64::NEG_INFINITY, f64::max);
    // a part whose std is unknown still contributes its mean to the pooled moment
    let sumsq: f64 = with_data()
        .map(|s| {
            let ni = s.count as f64;
            let var = if s.std.is_nan() { 0. } else { s.std * s.std };
            (ni - 1.) * var + ni * s.mean * s.mean
        })
        .sum();
    let std = if count < 2 {
        f64::NAN
    } else {
        (((sumsq - n * mean * mean).max(0.)) / (n - 1.)).sqrt()
    };
    Summary {
        count,
        mean,
        median,
        std,
        min,
        max,
        na_rate: (total_samples - count) as f64 / total_samples as f64,
    }
}

fn combine_cells(parts: &[&CellStats]) -> CellStats {
    let samples: usize = parts.iter().map(|c| c.samples).sum();
    let props = AtmosProperty::iter()
        .map(|prop| {
            let summaries: Vec<Summary> = parts
                .iter()
                .filter_map(|c| c.props.get(&prop).copied())
                .collect();
            (prop, combine_summaries(&summaries, samples))
        })
        .collect();
    CellStats { samples, props }
}

/// Per-cell period coverage of a roll-up
#[derive(Debug, Clone, Copy, Default)]
pub struct Coverage {
    /// Days with data in the cell
    pub days: usize,
    /// Months with data in the cell (yearly roll-ups only)
    pub months: usize,
}

/// A monthly or yearly roll-up of cached aggregations
#[derive(Debug)]
pub struct Rollup {
    pub agg: SpatialAgg,
    pub coverage: BTreeMap<GridCell, Coverage>,
}
impl Rollup {
    fn write(&self, path: &Path, with_months: bool) -> Result<()> {
        let rows = agg_to_rows(&self.agg)
            .into_iter()
            .map(|row| {
                let coverage = self
                    .agg
                    .grid()
                    .cell_at(row.lat, row.lng)
                    .and_then(|cell| self.coverage.get(&cell).copied())
                    .unwrap_or_default();
                AggRow {
                    days: Some(coverage.days),
                    months: with_months.then_some(coverage.months),
                    ..row
                }
            })
            .collect();
        write_rows(path, rows)
    }
    fn load(path: &Path, grid: Grid) -> Result<Self> {
        let rows = read_rows(path)?;
        let agg = agg_from_rows(&rows, grid);
        let mut coverage = BTreeMap::new();
        for row in &rows {
            if let Some(cell) = grid.cell_at(row.lat, row.lng) {
                coverage.insert(
                    cell,
                    Coverage {
                        days: row.days.unwrap_or(0),
                        months: row.months.unwrap_or(0),
                    },
                );
            }
        }
        Ok(Self { agg, coverage })
    }
}

fn combine_rollup(parts: Vec<(SpatialAgg, BTreeMap<GridCell, Coverage>)>, grid: Grid) -> Rollup {
    let mut by_cell: BTreeMap<GridCell, Vec<&CellStats>> = BTreeMap::new();
    let mut coverage: BTreeMap<GridCell, Coverage> = BTreeMap::new();
    for (agg, part_coverage) in &parts {
        for (&cell, stats) in agg.cells() {
            by_cell.entry(cell).or_default().push(stats);
            let entry = coverage.entry(cell).or_default();
            let part = part_coverage.get(&cell).copied().unwrap_or_default();
            entry.days += part.days;
            entry.months += part.months;
        }
    }
    let mut agg = SpatialAgg::new(grid);
    for (cell, stats) in by_cell {
        agg.insert(cell, combine_cells(&stats));
    }
    Rollup { agg, coverage }
}

/// Rolls the cached daily aggregations of one month up, `None` when no daily
/// file exists for the month
pub fn monthly(archive: &Archive, year: i32, month: u32, grid: Grid) -> Result<Option<Rollup>> {
    let mut parts = vec![];
    for date in month_dates(year, month) {
        match DailyAgg::load(archive, date, grid) {
            Ok(daily) => {
                // every cell of a daily file counts as one covered day
                let coverage = daily
                    .agg
                    .cells()
                    .map(|(&cell, _)| (cell, Coverage { days: 1, months: 0 }))
                    .collect();
                parts.push((daily.agg, coverage));
            }
            Err(AggError::Missing(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    if parts.is_empty() {
        log::warn!("no daily aggregate files for {:04}/{:02}", year, month);
        return Ok(None);
    }
    Ok(Some(combine_rollup(parts, grid)))
}

/// Writes the `{yyyymm}_monthly_agg.csv.gz` file
pub fn write_monthly(archive: &Archive, year: i32, month: u32, rollup: &Rollup) -> Result<()> {
    rollup.write(&archive.monthly_agg_path(year, month), false)
}

pub fn load_monthly(archive: &Archive, year: i32, month: u32, grid: Grid) -> Result<Rollup> {
    Rollup::load(&archive.monthly_agg_path(year, month), grid)
}

/// Rolls the cached monthly aggregations of one year up, `None` when no
/// monthly file exists for the year
pub fn yearly(archive: &Archive, year: i32, grid: Grid) -> Result<Option<Rollup>> {
    let mut parts = vec![];
    for month in 1..=12 {
        match load_monthly(archive, year, month, grid) {
            Ok(rollup) => {
                let coverage = rollup
                    .coverage
                    .into_iter()
                    .map(|(cell, c)| (cell, Coverage { days: c.days, months: 1 }))
                    .collect();
                parts.push((rollup.agg, coverage));
            }
            Err(AggError::Missing(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    if parts.is_empty() {
        log::warn!("no monthly aggregate files for {:04}", year);
        return Ok(None);
    }
    Ok(Some(combine_rollup(parts, grid)))
}

/// Writes the `{yyyy}_yearly_agg.csv.gz` file
pub fn write_yearly(archive: &Archive, year: i32, rollup: &Rollup) -> Result<()> {
    rollup.write(&archive.yearly_agg_path(year), true)
}

pub fn load_yearly(archive: &Archive, year: i32, grid: Grid) -> Result<Rollup> {
    Rollup::load(&archive.yearly_agg_path(year), grid)
}

/// Loads the cached yearly roll-ups of an inclusive year range, skipping
/// missing years
pub fn yearly_series(
    archive: &Archive,
    start_year: i32,
    end_year: i32,
    grid: Grid,
) -> Result<Vec<(i32, Rollup)>> {
    let mut series = vec![];
    for year in start_year..=end_year {
        match load_yearly(archive, year, grid) {
            Ok(rollup) => series.push((year, rollup)),
            Err(AggError::Missing(_)) => log::warn!("no yearly aggregate file for {}", year),
            Err(e) => return Err(e),
        }
    }
    Ok(series)
}

fn month_dates(year: i32, month: u32) -> Vec<NaiveDate> {
    (1..=31)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .collect()
}

/// A date-keyed sequence of daily aggregations
#[derive(Debug, Default)]
pub struct AggSeries {
    days: BTreeMap<NaiveDate, SpatialAgg>,
}
impl AggSeries {
    /// Loads the cached daily aggregations of an inclusive date range,
    /// skipping days without a cached file
    pub fn load(archive: &Archive, start: NaiveDate, end: NaiveDate, grid: Grid) -> Result<Self> {
        let mut days = BTreeMap::new();
        for date in crate::archive::dates(start, end)? {
            match DailyAgg::load(archive, date, grid) {
                Ok(daily) => {
                    days.insert(date, daily.agg);
                }
                Err(AggError::Missing(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(Self { days })
    }
    pub fn len(&self) -> usize {
        self.days.len()
    }
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &SpatialAgg)> {
        self.days.iter()
    }
    /// Per-cell (total count, days with data), sorted by coverage
    pub fn cell_totals(&self) -> Vec<(GridCell, usize, usize)> {
        let mut totals: BTreeMap<GridCell, (usize, usize)> = BTreeMap::new();
        for agg in self.days.values() {
            for (&cell, stats) in agg.cells() {
                let entry = totals.entry(cell).or_default();
                entry.0 += stats.samples;
                entry.1 += 1;
            }
        }
        let mut totals: Vec<(GridCell, usize, usize)> = totals
            .into_iter()
            .map(|(cell, (count, days))| (cell, count, days))
            .collect();
        totals.sort_by(|a, b| b.2.cmp(&a.2).then(b.1.cmp(&a.1)));
        totals
    }
    /// Keeps only cells whose across-date total count reaches `min`
    pub fn filter_total_count(mut self, min: usize) -> Self {
        let keep: BTreeSet<GridCell> = self
            .cell_totals()
            .into_iter()
            .filter(|&(_, count, _)| count >= min)
            .map(|(cell, _, _)| cell)
            .collect();
        self.days.values_mut().for_each(|agg| agg.retain_cells(&keep));
        self
    }
    /// Keeps only cells covered by at least `min` days
    pub fn filter_total_days(mut self, min: usize) -> Self {
        let keep: BTreeSet<GridCell> = self
            .cell_totals()
            .into_iter()
            .filter(|&(_, _, days)| days >= min)
            .map(|(cell, _, _)| cell)
            .collect();
        self.days.values_mut().for_each(|agg| agg.retain_cells(&keep));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Stat;
    use crate::testkit;

    fn seed_days(archive: &Archive, grid: Grid) -> Vec<NaiveDate> {
        let dates = [
            testkit::date("2019/07/04"),
            testkit::date("2019/07/05"),
            testkit::date("2019/07/06"),
        ];
        let temperatures: [&[f64]; 3] = [&[1., 2., 3.], &[5., 7.], &[4.]];
        for (date, temps) in dates.iter().zip(temperatures) {
            let records: Vec<_> = temps
                .iter()
                .map(|&t| testkit::record(Some(t), Some(1000. + t), Some(32.1), Some(34.8)))
                .collect();
            testkit::write_hour(archive, *date, 12, &records);
            let daily = DailyAgg::compute(archive, *date, grid).unwrap().unwrap();
            daily.write(archive).unwrap();
        }
        dates.to_vec()
    }

    #[test]
    fn daily_round_trip() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        let dates = seed_days(&archive, grid);
        let daily = DailyAgg::load(&archive, dates[0], grid).unwrap();
        let cell = grid.cell_at(32.1, 34.8).unwrap();
        let summary = daily.agg.summary(cell, AtmosProperty::Temperature).unwrap();
        assert_eq!(summary.count, 3);
        assert_eq!(summary.mean, 2.);
        assert_eq!(summary.median, 2.);
        assert!(daily
            .agg
            .summary(cell, AtmosProperty::Humidity)
            .unwrap()
            .mean
            .is_nan());
        drop(dir);
    }

    #[test]
    fn daily_selection() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        let dates = seed_days(&archive, grid);
        let cell = grid.cell_at(32.1, 34.8).unwrap();

        let daily = DailyAgg::load_where(
            &archive,
            dates[0],
            grid,
            Some(AtmosProperty::Temperature),
            None,
        )
        .unwrap();
        assert!(daily.agg.summary(cell, AtmosProperty::Temperature).is_some());
        assert!(daily.agg.summary(cell, AtmosProperty::Pressure).is_none());

        let elsewhere = grid.cell_at(48.9, 2.3).unwrap();
        let daily =
            DailyAgg::load_where(&archive, dates[0], grid, None, Some(elsewhere)).unwrap();
        assert!(daily.agg.is_empty());
        let daily = DailyAgg::load_where(&archive, dates[0], grid, None, Some(cell)).unwrap();
        assert_eq!(daily.agg.len(), 1);
        drop(dir);
    }

    #[test]
    fn missing_daily_file() {
        let (dir, archive) = testkit::scratch_archive();
        assert!(matches!(
            DailyAgg::load(&archive, testkit::date("2019/07/04"), Grid::default()),
            Err(AggError::Missing(_))
        ));
        drop(dir);
    }

    #[test]
    fn monthly_rollup() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        seed_days(&archive, grid);

        let rollup = monthly(&archive, 2019, 7, grid).unwrap().unwrap();
        let cell = grid.cell_at(32.1, 34.8).unwrap();
        let summary = rollup.agg.summary(cell, AtmosProperty::Temperature).unwrap();
        assert_eq!(summary.count, 6);
        // mean and pooled std match the flat [1,2,3,5,7,4] sample
        assert!((summary.mean - 22. / 6.).abs() < 1e-12);
        let flat = Summary::from_values(&[1., 2., 3., 5., 7., 4.], 6);
        assert!((summary.std - flat.std).abs() < 1e-12);
        assert_eq!((summary.min, summary.max), (1., 7.));
        assert_eq!(rollup.coverage[&cell].days, 3);

        write_monthly(&archive, 2019, 7, &rollup).unwrap();
        let reloaded = load_monthly(&archive, 2019, 7, grid).unwrap();
        assert_eq!(reloaded.coverage[&cell].days, 3);
        assert_eq!(
            reloaded.agg.value(cell, AtmosProperty::Temperature, Stat::Count),
            Some(6.)
        );
        drop(dir);
    }

    #[test]
    fn rollup_na_rate_and_median() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        let days = [
            (testkit::date("2019/07/04"), vec![Some(1000.), None]),
            (
                testkit::date("2019/07/05"),
                vec![Some(1010.), Some(1020.), Some(1030.)],
            ),
        ];
        for (date, pressures) in days {
            let records: Vec<_> = pressures
                .into_iter()
                .map(|p| testkit::record(Some(20.), p, Some(32.1), Some(34.8)))
                .collect();
            testkit::write_hour(&archive, date, 12, &records);
            DailyAgg::compute(&archive, date, grid)
                .unwrap()
                .unwrap()
                .write(&archive)
                .unwrap();
        }

        let rollup = monthly(&archive, 2019, 7, grid).unwrap().unwrap();
        let cell = grid.cell_at(32.1, 34.8).unwrap();
        let summary = rollup.agg.summary(cell, AtmosProperty::Pressure).unwrap();
        assert_eq!(summary.count, 4);
        // one missing reading out of five samples
        assert!((summary.na_rate - 0.2).abs() < 1e-12);
        // count-weighted part medians: (1 * 1000 + 3 * 1020) / 4
        assert!((summary.median - 1015.).abs() < 1e-12);

        write_monthly(&archive, 2019, 7, &rollup).unwrap();
        let reloaded = load_monthly(&archive, 2019, 7, grid).unwrap();
        let summary = reloaded.agg.summary(cell, AtmosProperty::Pressure).unwrap();
        assert!((summary.na_rate - 0.2).abs() < 1e-12);
        drop(dir);
    }

    #[test]
    fn yearly_rollup() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        seed_days(&archive, grid);
        let rollup = monthly(&archive, 2019, 7, grid).unwrap().unwrap();
        write_monthly(&archive, 2019, 7, &rollup).unwrap();

        assert!(yearly(&archive, 2018, grid).unwrap().is_none());
        let rollup = yearly(&archive, 2019, grid).unwrap().unwrap();
        let cell = grid.cell_at(32.1, 34.8).unwrap();
        assert_eq!(rollup.coverage[&cell].days, 3);
        assert_eq!(rollup.coverage[&cell].months, 1);

        write_yearly(&archive, 2019, &rollup).unwrap();
        let series = yearly_series(&archive, 2018, 2019, grid).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].0, 2019);
        drop(dir);
    }

    #[test]
    fn hourly_cache_round_trip() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        let date = testkit::date("2019/07/04");
        testkit::write_hour(
            &archive,
            date,
            6,
            &[testkit::record(Some(18.), None, Some(32.1), Some(34.8))],
        );
        testkit::write_hour(
            &archive,
            date,
            12,
            &[testkit::record(Some(27.), None, Some(32.1), Some(34.8))],
        );

        let hourly = cache_hourly_agg(&archive, date, grid).unwrap();
        assert_eq!(hourly.len(), 2);
        let reloaded = load_hourly_agg(&archive, date, grid).unwrap();
        let cell = grid.cell_at(32.1, 34.8).unwrap();
        assert_eq!(
            reloaded[&12].value(cell, AtmosProperty::Temperature, Stat::Mean),
            Some(27.)
        );
        drop(dir);
    }

    #[test]
    fn series_filtering() {
        let (dir, archive) = testkit::scratch_archive();
        let grid = Grid::default();
        let dates = seed_days(&archive, grid);
        // one extra day in another cell
        let lone = testkit::date("2019/07/07");
        testkit::write_hour(
            &archive,
            lone,
            0,
            &[testkit::record(Some(9.), None, Some(48.9), Some(2.3))],
        );
        DailyAgg::compute(&archive, lone, grid)
            .unwrap()
            .unwrap()
            .write(&archive)
            .unwrap();

        let series = AggSeries::load(&archive, dates[0], lone, grid).unwrap();
        assert_eq!(series.len(), 4);
        let totals = series.cell_totals();
        assert_eq!(totals.len(), 2);
        // best-covered cell first
        assert_eq!(totals[0].2, 3);

        let filtered = series.filter_total_days(2);
        let remaining: BTreeSet<usize> =
            filtered.iter().map(|(_, agg)| agg.len()).collect();
        // the lone cell dropped from every day
        assert!(remaining.iter().all(|&n| n <= 1));
        assert_eq!(
            filtered
                .iter()
                .filter(|(_, agg)| !agg.is_empty())
                .count(),
            3
        );
        drop(dir);
    }
}
