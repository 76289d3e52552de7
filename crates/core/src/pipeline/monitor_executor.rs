use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::pipeline::analyze_frame_use_case::{AnalyzeFrameUseCase, FaceObservation};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::policy::domain::alert_sink::AlertSink;
use crate::policy::domain::person::PersonDirectory;
use crate::policy::domain::recognition_policy::{RecognitionPolicy, RecognitionStats, Verdict};
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

/// Called on the main thread for every face the monitor classifies.
pub type ObservationCallback = Box<dyn FnMut(usize, &FaceObservation, &Verdict) + Send>;

pub struct MonitorConfig {
    /// Frames buffered between capture and analysis.
    pub channel_capacity: usize,
    /// Drop captured frames while analysis is behind instead of blocking
    /// capture. Right for live sources, wrong for files you want complete.
    pub drop_when_busy: bool,
    /// Release frames at the source frame rate, as a camera would.
    pub pace: bool,
    /// Stop after this many captured frames.
    pub max_frames: Option<usize>,
    pub cancelled: Arc<AtomicBool>,
    pub on_observation: Option<ObservationCallback>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 4,
            drop_when_busy: false,
            pace: false,
            max_frames: None,
            cancelled: Arc::new(AtomicBool::new(false)),
            on_observation: None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub frames_captured: usize,
    pub frames_dropped: usize,
    /// Frames the source could not decode.
    pub frames_skipped: usize,
    pub frames_analyzed: usize,
    pub faces: usize,
    pub stats: RecognitionStats,
}

/// Everything the watch loop needs besides its configuration.
pub struct MonitorJob<'a> {
    /// Already opened.
    pub source: Box<dyn FrameSource>,
    pub analyzer: AnalyzeFrameUseCase,
    pub policy: RecognitionPolicy,
    pub directory: &'a PersonDirectory,
    pub sinks: Vec<Box<dyn AlertSink>>,
}

/// Runs the capture → analyze → policy loop.
///
/// Port; infrastructure decides how the stages are scheduled.
pub trait MonitorExecutor: Send {
    fn execute(
        &self,
        job: MonitorJob<'_>,
        metadata: &VideoMetadata,
        config: MonitorConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<MonitorSummary, Box<dyn std::error::Error>>;
}
