use crate::policy::domain::person::PersonRecord;

/// A flagged person was recognized outside their alert cooldown.
#[derive(Clone, Debug, PartialEq)]
pub struct Alert {
    pub person: PersonRecord,
    pub distance: f64,
    /// Index of the frame the face was seen in.
    pub frame_index: usize,
}

/// Destination for alerts raised by the recognition policy.
pub trait AlertSink: Send {
    fn raise(&mut self, alert: &Alert) -> Result<(), Box<dyn std::error::Error>>;
}
