use chrono::NaiveDate;
use std::path::PathBuf;
use structopt::StructOpt;

use parse_sensors::{
    spatial_agg, Archive, AtmosProperty, DropNa, Field, Grid, HourRange, SampleLoader, Stat,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "parse-sensors",
    about = "Parsing a geo-tagged environmental sensor archive"
)]
struct Opt {
    /// Path to the archive root, defaults to $SENSOR_ARCHIVE
    #[structopt(long)]
    path: Option<String>,
    /// Date to load, yyyy/mm/dd
    date: String,
    /// First hour of the day
    #[structopt(short, long)]
    start: Option<u32>,
    /// Last hour of the day
    #[structopt(short, long)]
    end: Option<u32>,
    /// Channels to load (all when omitted)
    #[structopt(short, long)]
    fields: Vec<Field>,
    /// Row filters, `channel:lo:hi`
    #[structopt(short, long)]
    between: Vec<String>,
    /// Drop rows with missing values: any | all
    #[structopt(long)]
    drop_na: Option<String>,
    /// Grid spacing [deg]
    #[structopt(short, long, default_value = "2.5")]
    deg: f64,
    /// Statistic shown in the aggregation table
    #[structopt(long, default_value = "mean")]
    stat: Stat,
    /// Variable for the scatter map
    #[structopt(long, default_value = "pressure")]
    prop: AtmosProperty,
    /// Render the scatter map to this file (requires the `plot` feature)
    #[structopt(short, long)]
    plot: Option<PathBuf>,
}

fn parse_between(arg: &str) -> anyhow::Result<(Field, f64, f64)> {
    let parts: Vec<&str> = arg.split(':').collect();
    match parts[..] {
        [field, lo, hi] => Ok((field.parse()?, lo.parse()?, hi.parse()?)),
        _ => anyhow::bail!("expected `channel:lo:hi`, got `{}`", arg),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Opt::from_args();

    let archive = match &opt.path {
        Some(path) => Archive::new(path),
        None => Archive::from_env()?,
    };
    let date = NaiveDate::parse_from_str(&opt.date, "%Y/%m/%d")?;

    let mut loader = SampleLoader::new(&archive)
        .hours(HourRange::new(opt.start.unwrap_or(0), opt.end.unwrap_or(23))?);
    if !opt.fields.is_empty() {
        loader = loader.fields(&opt.fields);
    }
    for arg in &opt.between {
        let (field, lo, hi) = parse_between(arg)?;
        loader = loader.between(field, lo, hi);
    }
    if let Some(mode) = &opt.drop_na {
        loader = loader.drop_na(match mode.as_str() {
            "any" => DropNa::Any,
            "all" => DropNa::All,
            _ => anyhow::bail!("expected `any` or `all`, got `{}`", mode),
        });
    }

    let samples = match loader.load_day(date)? {
        Some(samples) => samples,
        None => return Ok(()),
    };
    samples.summary();

    let agg = spatial_agg(&samples, Grid::new(opt.deg)?);
    agg.print(opt.stat);

    if let Some(_path) = &opt.plot {
        #[cfg(feature = "plot")]
        parse_sensors::plot::scatter_map(&agg, opt.prop, opt.stat, _path);
        #[cfg(not(feature = "plot"))]
        log::error!("rebuild with `--features plot` to render charts");
    }

    Ok(())
}
