//! Shared helpers for building scratch archives in tests

use chrono::NaiveDate;
use flate2::{write::GzEncoder, Compression};
use std::fs;
use tempfile::TempDir;

use crate::archive::Archive;
use crate::record::Record;

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y/%m/%d").unwrap()
}

pub(crate) fn scratch_archive() -> (TempDir, Archive) {
    let dir = tempfile::tempdir().unwrap();
    let archive = Archive::new(dir.path());
    (dir, archive)
}

pub(crate) fn record(
    temperature: Option<f64>,
    pressure: Option<f64>,
    lat: Option<f64>,
    lng: Option<f64>,
) -> Record {
    Record {
        id: String::from("5d1df9"),
        raw_time: 1_562_234_400_000,
        temperature,
        pressure,
        lat,
        lng,
        model: Some(String::from("SM-G960F")),
        ..Default::default()
    }
}

pub(crate) fn write_hour(archive: &Archive, date: NaiveDate, hour: u32, records: &[Record]) {
    fs::create_dir_all(archive.day_dir(date)).unwrap();
    let file = fs::File::create(archive.hour_path(date, hour)).unwrap();
    let gz = GzEncoder::new(file, Compression::default());
    let mut wtr = csv::Writer::from_writer(gz);
    for record in records {
        wtr.serialize(record).unwrap();
    }
    wtr.into_inner().unwrap().finish().unwrap();
}
