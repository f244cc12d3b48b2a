/// Plain-text alert log: `[YYYY-MM-DD HH:MM:SS] message`, one line per event
use crate::errors::MonitorResult;
use crate::portfolio::AlertEvent;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

pub struct AlertLogSink {
    writer: BufWriter<File>,
}

impl AlertLogSink {
    pub fn open(path: &Path) -> MonitorResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write_event(&mut self, event: &AlertEvent) -> MonitorResult<()> {
        let stamp = event.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        writeln!(self.writer, "[{}] {}", stamp, event.message())?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn flush(&mut self) -> MonitorResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
