use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{EnumIter, EnumString};

/// A single reading from the raw hourly CSV files
///
/// The raw header carries 18 fixed columns; every sensor channel may be empty
/// and deserializes to `None`.
#[derive(Debug, Default, Clone, Deserialize, Serialize, PartialEq)]
pub struct Record {
    pub id: String,
    /// Sampling time as epoch milliseconds
    pub raw_time: i64,
    pub temperature: Option<f64>,
    pub pressure: Option<f64>,
    pub humidity: Option<f64>,
    pub light: Option<f64>,
    pub magnetic_tot: Option<f64>,
    pub magnetic_x: Option<f64>,
    pub magnetic_y: Option<f64>,
    pub magnetic_z: Option<f64>,
    pub acc_tot: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
    pub acc_z: Option<f64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub model: Option<String>,
    /// Device timezone offset [min]
    pub tz_offset: Option<i32>,
}

/// Numeric sensor channels of a [Record]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Field {
    Temperature,
    Pressure,
    Humidity,
    Light,
    MagneticTot,
    MagneticX,
    MagneticY,
    MagneticZ,
    AccTot,
    AccX,
    AccY,
    AccZ,
    Lat,
    Lng,
}
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Field::*;
        match self {
            Temperature => write!(f, "temperature"),
            Pressure => write!(f, "pressure"),
            Humidity => write!(f, "humidity"),
            Light => write!(f, "light"),
            MagneticTot => write!(f, "magnetic_tot"),
            MagneticX => write!(f, "magnetic_x"),
            MagneticY => write!(f, "magnetic_y"),
            MagneticZ => write!(f, "magnetic_z"),
            AccTot => write!(f, "acc_tot"),
            AccX => write!(f, "acc_x"),
            AccY => write!(f, "acc_y"),
            AccZ => write!(f, "acc_z"),
            Lat => write!(f, "lat"),
            Lng => write!(f, "lng"),
        }
    }
}

/// The atmospheric variables that get aggregated
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AtmosProperty {
    Temperature,
    Pressure,
    Humidity,
    MagneticTot,
}
impl fmt::Display for AtmosProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Field::from(*self).fmt(f)
    }
}
impl From<AtmosProperty> for Field {
    fn from(prop: AtmosProperty) -> Self {
        match prop {
            AtmosProperty::Temperature => Field::Temperature,
            AtmosProperty::Pressure => Field::Pressure,
            AtmosProperty::Humidity => Field::Humidity,
            AtmosProperty::MagneticTot => Field::MagneticTot,
        }
    }
}

impl Record {
    /// Value of a numeric channel
    pub fn value(&self, field: Field) -> Option<f64> {
        use Field::*;
        match field {
            Temperature => self.temperature,
            Pressure => self.pressure,
            Humidity => self.humidity,
            Light => self.light,
            MagneticTot => self.magnetic_tot,
            MagneticX => self.magnetic_x,
            MagneticY => self.magnetic_y,
            MagneticZ => self.magnetic_z,
            AccTot => self.acc_tot,
            AccX => self.acc_x,
            AccY => self.acc_y,
            AccZ => self.acc_z,
            Lat => self.lat,
            Lng => self.lng,
        }
    }
    fn value_mut(&mut self, field: Field) -> &mut Option<f64> {
        use Field::*;
        match field {
            Temperature => &mut self.temperature,
            Pressure => &mut self.pressure,
            Humidity => &mut self.humidity,
            Light => &mut self.light,
            MagneticTot => &mut self.magnetic_tot,
            MagneticX => &mut self.magnetic_x,
            MagneticY => &mut self.magnetic_y,
            MagneticZ => &mut self.magnetic_z,
            AccTot => &mut self.acc_tot,
            AccX => &mut self.acc_x,
            AccY => &mut self.acc_y,
            AccZ => &mut self.acc_z,
            Lat => &mut self.lat,
            Lng => &mut self.lng,
        }
    }
    /// Clears every numeric channel not listed in `fields`
    pub fn retain(&mut self, fields: &[Field]) {
        use strum::IntoEnumIterator;
        for field in Field::iter() {
            if !fields.contains(&field) {
                *self.value_mut(field) = None;
            }
        }
    }
    /// Sampling time in UTC
    pub fn utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.raw_time)
    }
}
