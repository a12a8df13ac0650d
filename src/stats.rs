//! Grouped statistics over the spatial grid
//!
//! Readings are bucketed into [GridCell]s and each atmospheric variable is
//! summarized per cell with count, mean, median, std, min, max and NA-rate.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::archive::{Archive, HourRange};
use crate::grid::{Grid, GridCell};
use crate::load::{LoadError, SampleLoader, Samples};
use crate::record::{AtmosProperty, Field};

/// The statistics computed for every (cell, variable) group
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stat {
    Count,
    Mean,
    Median,
    Std,
    Min,
    Max,
    NaRate,
}

/// Summary statistics of one variable within one group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Non-missing values in the group
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation (ddof = 1)
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Missing fraction of the group size
    pub na_rate: f64,
}
impl Summary {
    /// Summarizes the non-missing values of a group of `group_size` rows
    pub fn from_values(values: &[f64], group_size: usize) -> Self {
        let count = values.len();
        let na_rate = if group_size == 0 {
            f64::NAN
        } else {
            (group_size - count) as f64 / group_size as f64
        };
        if count == 0 {
            return Self {
                count,
                mean: f64::NAN,
                median: f64::NAN,
                std: f64::NAN,
                min: f64::NAN,
                max: f64::NAN,
                na_rate,
            };
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if count < 2 {
            f64::NAN
        } else {
            (values.iter().map(|x| x - mean).fold(0f64, |s, x| s + x * x) / (n - 1.)).sqrt()
        };
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.
        };
        Self {
            count,
            mean,
            median,
            std,
            min: sorted[0],
            max: sorted[count - 1],
            na_rate,
        }
    }
    pub fn stat(&self, stat: Stat) -> f64 {
        match stat {
            Stat::Count => self.count as f64,
            Stat::Mean => self.mean,
            Stat::Median => self.median,
            Stat::Std => self.std,
            Stat::Min => self.min,
            Stat::Max => self.max,
            Stat::NaRate => self.na_rate,
        }
    }
}

/// Statistics of one grid cell
#[derive(Debug, Clone, Default)]
pub struct CellStats {
    /// Rows bucketed into the cell
    pub samples: usize,
    pub props: BTreeMap<AtmosProperty, Summary>,
}

/// Per-cell aggregation of the atmospheric variables
#[derive(Debug, Clone)]
pub struct SpatialAgg {
    grid: Grid,
    cells: BTreeMap<GridCell, CellStats>,
}
impl SpatialAgg {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            cells: BTreeMap::new(),
        }
    }
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
    pub fn cells(&self) -> impl Iterator<Item = (&GridCell, &CellStats)> {
        self.cells.iter()
    }
    pub fn cell(&self, cell: GridCell) -> Option<&CellStats> {
        self.cells.get(&cell)
    }
    pub fn summary(&self, cell: GridCell, prop: AtmosProperty) -> Option<&Summary> {
        self.cells.get(&cell)?.props.get(&prop)
    }
    pub fn value(&self, cell: GridCell, prop: AtmosProperty, stat: Stat) -> Option<f64> {
        self.summary(cell, prop).map(|s| s.stat(stat))
    }
    /// Total number of bucketed rows
    pub fn total_count(&self) -> usize {
        self.cells.values().map(|c| c.samples).sum()
    }
    pub(crate) fn insert(&mut self, cell: GridCell, stats: CellStats) {
        self.cells.insert(cell, stats);
    }
    pub(crate) fn retain_cells(&mut self, keep: &std::collections::BTreeSet<GridCell>) {
        self.cells.retain(|cell, _| keep.contains(cell));
    }
    /// Prints an aligned per-cell table of one statistic
    pub fn print(&self, stat: Stat) {
        println!("SPATIAL AGGREGATION ({} cells):", self.len());
        print!("    {:^16}: {:>8}", "CELL", "SIZE");
        for prop in AtmosProperty::iter() {
            print!("  {:>12}", format!("{} {}", prop, stat));
        }
        println!();
        for (&cell, stats) in self.cells() {
            print!("  - {:16}: {:>8}", self.grid.label(cell), stats.samples);
            for prop in AtmosProperty::iter() {
                let value = stats.props.get(&prop).map_or(f64::NAN, |s| s.stat(stat));
                print!("  {:>12.3}", value);
            }
            println!();
        }
    }
}

/// Buckets the readings by grid cell and summarizes every atmospheric variable
///
/// Rows where all four variables are missing, or with missing/out-of-domain
/// coordinates, are left out.
pub fn spatial_agg(samples: &Samples, grid: Grid) -> SpatialAgg {
    let mut groups: BTreeMap<GridCell, Vec<&crate::record::Record>> = BTreeMap::new();
    for record in samples.iter() {
        if AtmosProperty::iter().all(|prop| record.value(prop.into()).is_none()) {
            continue;
        }
        if let Some(cell) = grid.cell(record.lat, record.lng) {
            groups.entry(cell).or_default().push(record);
        }
    }
    let mut agg = SpatialAgg::new(grid);
    for (cell, records) in groups {
        let samples = records.len();
        let props = AtmosProperty::iter()
            .map(|prop| {
                let values: Vec<f64> = records
                    .iter()
                    .filter_map(|r| r.value(Field::from(prop)))
                    .collect();
                (prop, Summary::from_values(&values, samples))
            })
            .collect();
        agg.insert(cell, CellStats { samples, props });
    }
    agg
}

/// Spatial aggregation of a single hour, `None` when the hour has no data
pub fn spatial_hour_agg(
    archive: &Archive,
    date: NaiveDate,
    hour: u32,
    grid: Grid,
) -> Result<Option<SpatialAgg>, LoadError> {
    let fields: Vec<Field> = AtmosProperty::iter().map(Field::from).collect();
    let samples = SampleLoader::new(archive)
        .hours(HourRange::single(hour)?)
        .fields(&fields)
        .load_day(date)?;
    Ok(samples.map(|samples| spatial_agg(&samples, grid)))
}

/// Hour-by-hour spatial aggregations for one day, keyed by hour
pub fn hourly_spatial_agg(
    archive: &Archive,
    date: NaiveDate,
    range: HourRange,
    grid: Grid,
) -> Result<BTreeMap<u32, SpatialAgg>, LoadError> {
    let mut hourly = BTreeMap::new();
    for hour in archive.relevant_hours(date, range)? {
        if let Some(agg) = spatial_hour_agg(archive, date, hour, grid)? {
            hourly.insert(hour, agg);
        }
    }
    Ok(hourly)
}
