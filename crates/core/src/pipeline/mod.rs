pub mod analyze_frame_use_case;
pub mod enroll_faces_use_case;
pub mod infrastructure;
pub mod monitor_executor;
pub mod pipeline_logger;
