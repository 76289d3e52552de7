use crate::policy::domain::alert_sink::{Alert, AlertSink};

/// Reports alerts through the `log` facade at warn level.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAlertSink;

impl LogAlertSink {
    pub fn new() -> Self {
        Self
    }
}

impl AlertSink for LogAlertSink {
    fn raise(&mut self, alert: &Alert) -> Result<(), Box<dyn std::error::Error>> {
        log::warn!("{}", banner(alert));
        Ok(())
    }
}

fn banner(alert: &Alert) -> String {
    format!(
        "ALERT: flagged person {} (ID {}) seen in frame {} at distance {:.1}",
        alert.person.name, alert.person.id, alert.frame_index, alert.distance
    )
}
