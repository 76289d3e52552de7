use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::policy::domain::alert_sink::{Alert, AlertSink};

/// Appends one line per alert to a plain-text log:
/// `YYYY-mm-dd HH:MM:SS | ID:<id> | <name> | Dist:<d>`.
pub struct FileAlertSink {
    path: PathBuf,
}

impl FileAlertSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AlertSink for FileAlertSink {
    fn raise(&mut self, alert: &Alert) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", format_line(alert, chrono::Local::now()))?;
        Ok(())
    }
}

fn format_line<Tz: chrono::TimeZone>(alert: &Alert, at: chrono::DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{} | ID:{} | {} | Dist:{:.2}",
        at.format("%Y-%m-%d %H:%M:%S"),
        alert.person.id,
        alert.person.name,
        alert.distance
    )
}
