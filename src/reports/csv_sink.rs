/// Append-only CSV report: one row per valued holding per tick
///
/// Header `mint,price,value,changeRate,timestamp` is written only when the
/// file is new or empty. Floats use shortest round-trip formatting and
/// timestamps are RFC 3339.
use crate::constants::CSV_HEADER;
use crate::errors::MonitorResult;
use crate::logger::{self, LogTag};
use crate::portfolio::Holding;
use chrono::{DateTime, SecondsFormat, Utc};
use csv::WriterBuilder;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

pub struct CsvSink {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows_written: u64,
}

impl CsvSink {
    pub fn open(path: &Path) -> MonitorResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let need_header = file.metadata().map(|m| m.len() == 0).unwrap_or(true);

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if need_header {
            writer.write_record(CSV_HEADER)?;
            writer.flush()?;
        }

        logger::debug(LogTag::Reports, &format!("CSV report at {}", path.display()));
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            rows_written: 0,
        })
    }

    pub fn write_holdings(&mut self, holdings: &[Holding], timestamp: DateTime<Utc>) -> MonitorResult<()> {
        let stamp = timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        for holding in holdings {
            let price = holding.price.to_string();
            let value = holding.value.to_string();
            let change_rate = holding.change_rate.to_string();
            self.writer.write_record([
                holding.mint.as_str(),
                price.as_str(),
                value.as_str(),
                change_rate.as_str(),
                stamp.as_str(),
            ])?;
            self.rows_written += 1;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> MonitorResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valued(mint: &str, price: f64, amount: f64) -> Holding {
        let mut h = Holding::unpriced(mint, amount, 6, "T", "T");
        h.price = price;
        h.value = price * amount;
        h.change_rate = -0.0125;
        h
    }

    #[test]
    fn test_round_trip_and_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("monitor.csv");
        let now = Utc::now();

        let holdings = vec![valued("MintA", 0.000012345678901234, 123456.789), valued("MintB", 187.42, 3.5)];
        {
            let mut sink = CsvSink::open(&path).unwrap();
            sink.write_holdings(&holdings, now).unwrap();
            assert_eq!(sink.rows_written(), 2);
        }
        {
            // Reopen appends without a second header
            let mut sink = CsvSink::open(&path).unwrap();
            sink.write_holdings(&holdings[..1], now).unwrap();
        }

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader.headers().unwrap().iter().map(|s| s.to_string()).collect();
        assert_eq!(headers, CSV_HEADER.iter().map(|s| s.to_string()).collect::<Vec<_>>());

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[0][0], "MintA");
        assert_eq!(rows[0][1].parse::<f64>().unwrap(), holdings[0].price);
        assert_eq!(rows[0][2].parse::<f64>().unwrap(), holdings[0].value);
        assert_eq!(rows[1][3].parse::<f64>().unwrap(), -0.0125);
        let parsed = DateTime::parse_from_rfc3339(&rows[1][4]).unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
