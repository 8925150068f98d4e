//! Historical household metering data.
//!
//! Reads the per-minute household power CSV, drops unusable rows and turns
//! what is left into either a monthly consumption series (for forecasting) or
//! a regression training set (for the power model).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::FEATURE_NAMES;
use crate::ml::{training::TrainingDataset, FeatureVector};

const DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%Y-%m-%d", "%d-%m-%Y"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("cannot open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("dataset has no usable rows")]
    Empty,
}

/// One raw CSV row. Everything stays text until cleaning decides what to keep.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Date")]
    date: Option<String>,
    #[serde(rename = "Time", default)]
    time: Option<String>,
    #[serde(rename = "Global_active_power")]
    global_active_power: Option<String>,
    #[serde(rename = "Global_reactive_power", default)]
    global_reactive_power: Option<String>,
    #[serde(rename = "Voltage", default)]
    voltage: Option<String>,
    #[serde(rename = "Global_intensity", default)]
    global_intensity: Option<String>,
    #[serde(rename = "Sub_metering_1", default)]
    sub_metering_1: Option<String>,
    #[serde(rename = "Sub_metering_2", default)]
    sub_metering_2: Option<String>,
    #[serde(rename = "Sub_metering_3", default)]
    sub_metering_3: Option<String>,
}

impl RawRecord {
    fn date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    fn active_power(&self) -> Option<f64> {
        number(self.global_active_power.as_deref())
    }

    /// Model features and target, when every field is usable.
    fn training_row(&self) -> Option<([f64; 10], f64)> {
        let date = self.date()?;
        let time = self.time.as_deref().and_then(parse_time)?;
        Some((
            [
                number(self.global_reactive_power.as_deref())?,
                number(self.voltage.as_deref())?,
                number(self.global_intensity.as_deref())?,
                number(self.sub_metering_1.as_deref())?,
                number(self.sub_metering_2.as_deref())?,
                number(self.sub_metering_3.as_deref())?,
                time.hour() as f64,
                date.day() as f64,
                date.month() as f64,
                date.weekday().num_days_from_monday() as f64,
            ],
            self.active_power()?,
        ))
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
}

fn number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn open(path: &Path) -> Result<BufReader<File>, DatasetError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn csv_reader<R: Read>(reader: R, delimiter: u8) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Summed active power per calendar month, oldest first, with no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySeries {
    /// First day of the first month
    start: NaiveDate,
    values: Vec<f64>,
}

impl MonthlySeries {
    pub fn from_csv(path: impl AsRef<Path>, delimiter: u8) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let series = Self::from_reader(open(path)?, delimiter)?;
        info!(
            path = %path.display(),
            months = series.len(),
            first = %series.start,
            "monthly consumption series built"
        );
        Ok(series)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, DatasetError> {
        let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
        let mut dropped = 0usize;

        for record in csv_reader(reader, delimiter).deserialize::<RawRecord>() {
            let record = record?;
            match (record.date(), record.active_power()) {
                (Some(date), Some(power)) => {
                    *totals.entry((date.year(), date.month())).or_default() += power;
                }
                _ => dropped += 1,
            }
        }

        debug!(dropped, "rows without numeric power or a valid date dropped");
        Self::from_totals(totals)
    }

    fn from_totals(totals: BTreeMap<(i32, u32), f64>) -> Result<Self, DatasetError> {
        let (&(first_year, first_month), _) = totals.iter().next().ok_or(DatasetError::Empty)?;
        let (&last, _) = totals.iter().next_back().ok_or(DatasetError::Empty)?;

        let mut values = Vec::new();
        let (mut year, mut month) = (first_year, first_month);
        loop {
            values.push(totals.get(&(year, month)).copied().unwrap_or(0.0));
            if (year, month) == last {
                break;
            }
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
        }

        let start = NaiveDate::from_ymd_opt(first_year, first_month, 1).ok_or(DatasetError::Empty)?;
        Ok(Self { start, values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }
}

/// Regression training rows drawn from the same CSV.
pub struct TrainingRows;

impl TrainingRows {
    /// Load at most `max_samples` complete rows, evenly spaced through the file.
    pub fn from_csv(
        path: impl AsRef<Path>,
        delimiter: u8,
        max_samples: usize,
    ) -> Result<TrainingDataset, DatasetError> {
        let path = path.as_ref();
        let total = csv_reader(open(path)?, delimiter).records().count();
        let stride = total.div_ceil(max_samples.max(1)).max(1);
        debug!(total, stride, "sampling training rows");

        let dataset = Self::from_reader(open(path)?, delimiter, stride)?;
        info!(path = %path.display(), rows = dataset.len(), "training rows loaded");
        Ok(dataset)
    }

    /// Keep every `stride`-th record that has all features and a target.
    pub fn from_reader<R: Read>(
        reader: R,
        delimiter: u8,
        stride: usize,
    ) -> Result<TrainingDataset, DatasetError> {
        let names: Vec<String> = FEATURE_NAMES.iter().map(|n| n.to_string()).collect();
        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (index, record) in csv_reader(reader, delimiter)
            .deserialize::<RawRecord>()
            .enumerate()
        {
            let record = record?;
            if index % stride.max(1) != 0 {
                continue;
            }
            if let Some((row, target)) = record.training_row() {
                features.push(FeatureVector {
                    features: row.to_vec(),
                    feature_names: names.clone(),
                });
                targets.push(target);
            }
        }

        if features.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(TrainingDataset { features, targets })
    }
}
