//! Tools for a geo-tagged environmental sensor archive
//!
//! Raw readings (temperature, pressure, humidity, light, magnetic field,
//! acceleration) are stored as per-hour gzip CSV files under a
//! date-partitioned tree: `{root}/{yyyy}/{mm}/{dd}/{hh}.csv.gz`.
//!
//! The crate loads and filters the raw files ([load]), buckets the readings
//! onto a fixed-degree lat/lng grid and summarizes them ([grid], [stats]),
//! caches and rolls the summaries up across hourly/daily/monthly/yearly time
//! scales ([agg]), transforms sampled signals to the frequency domain
//! ([spectrum]) and, behind the `plot` feature, renders map and trend charts
//! ([plot]).

pub mod agg;
pub mod archive;
pub mod error;
pub mod grid;
pub mod load;
#[cfg(feature = "plot")]
pub mod plot;
pub mod record;
pub mod spectrum;
pub mod stats;
#[cfg(test)]
pub(crate) mod testkit;

pub use archive::{Archive, HourRange};
pub use error::Error;
pub use grid::{Grid, GridCell};
pub use load::{DropNa, SampleLoader, Samples};
pub use record::{AtmosProperty, Field, Record};
pub use spectrum::Spectrum;
pub use stats::{spatial_agg, SpatialAgg, Stat, Summary};
