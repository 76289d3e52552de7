pub mod alert_sink;
pub mod person;
pub mod recognition_policy;
