//! Batch aggregation sweep
//!
//! Computes and caches the daily aggregation file of every day in a date
//! range, then rolls the covered months and years up into their monthly and
//! yearly files.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;
use structopt::StructOpt;

use parse_sensors::agg::{
    cache_hourly_agg, monthly, write_monthly, write_yearly, yearly, DailyAgg,
};
use parse_sensors::{archive, Archive, Grid};

#[derive(Debug, StructOpt)]
#[structopt(name = "daily-agg", about = "Caching sensor archive aggregations")]
struct Opt {
    /// Path to the archive root, defaults to $SENSOR_ARCHIVE
    #[structopt(long)]
    path: Option<String>,
    /// First date of the sweep, yyyy/mm/dd
    start: String,
    /// Last date of the sweep, yyyy/mm/dd
    end: String,
    /// Grid spacing [deg]
    #[structopt(short, long, default_value = "2.5")]
    deg: f64,
    /// Also cache the hour-keyed aggregations
    #[structopt(long)]
    hourly: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let archive = match &opt.path {
        Some(path) => Archive::new(path),
        None => Archive::from_env()?,
    };
    let grid = Grid::new(opt.deg)?;
    let start = NaiveDate::parse_from_str(&opt.start, "%Y/%m/%d")?;
    let end = NaiveDate::parse_from_str(&opt.end, "%Y/%m/%d")?;

    let mut months: BTreeSet<(i32, u32)> = BTreeSet::new();
    for date in archive::dates(start, end)? {
        let Some(daily) = DailyAgg::compute(&archive, date, grid)? else {
            continue;
        };
        daily.write(&archive)?;
        log::info!("cached daily aggregation for {} ({} cells)", date, daily.agg.len());
        if opt.hourly {
            cache_hourly_agg(&archive, date, grid)?;
        }
        months.insert((date.year(), date.month()));
    }

    let years: BTreeSet<i32> = months.iter().map(|&(year, _)| year).collect();
    for (year, month) in months {
        if let Some(rollup) = monthly(&archive, year, month, grid)? {
            write_monthly(&archive, year, month, &rollup)?;
            log::info!("cached monthly aggregation for {:04}/{:02}", year, month);
        }
    }
    for year in years {
        if let Some(rollup) = yearly(&archive, year, grid)? {
            write_yearly(&archive, year, &rollup)?;
            log::info!("cached yearly aggregation for {:04}", year);
        }
    }

    Ok(())
}
