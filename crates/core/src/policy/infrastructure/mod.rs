pub mod file_alert_sink;
pub mod json_directory_store;
pub mod log_alert_sink;
