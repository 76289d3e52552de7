use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::pipeline::analyze_frame_use_case::{AnalyzeFrameUseCase, FrameAnalysis};
use crate::pipeline::monitor_executor::{
    MonitorConfig, MonitorExecutor, MonitorJob, MonitorSummary, ObservationCallback,
};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::policy::domain::alert_sink::{Alert, AlertSink};
use crate::policy::domain::person::PersonDirectory;
use crate::policy::domain::recognition_policy::{RecognitionPolicy, Verdict};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_source::FrameSource;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Runs the watch loop on dedicated threads.
///
/// Layout: `capture → analyze → main [policy, alerts, callbacks]`
///
/// Capture never waits on matching when `drop_when_busy` is set, so a slow
/// gallery costs frames rather than latency.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadedMonitorExecutor;

impl ThreadedMonitorExecutor {
    pub fn new() -> Self {
        Self
    }
}

struct CaptureOptions {
    drop_when_busy: bool,
    pacing: Option<Duration>,
    max_frames: Option<usize>,
}

#[derive(Default)]
struct CaptureCounts {
    captured: usize,
    dropped: usize,
    skipped: usize,
}

impl MonitorExecutor for ThreadedMonitorExecutor {
    fn execute(
        &self,
        job: MonitorJob<'_>,
        metadata: &VideoMetadata,
        mut config: MonitorConfig,
        logger: &mut dyn PipelineLogger,
    ) -> Result<MonitorSummary, Box<dyn std::error::Error>> {
        let MonitorJob {
            source,
            analyzer,
            mut policy,
            directory,
            mut sinks,
        } = job;
        let cap = config.channel_capacity.max(1);

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Frame>(cap);
        let (analysis_tx, analysis_rx) =
            crossbeam_channel::bounded::<Result<FrameAnalysis, SendError>>(cap);

        let options = CaptureOptions {
            drop_when_busy: config.drop_when_busy,
            pacing: metadata.frame_interval().filter(|_| config.pace),
            max_frames: config.max_frames,
        };
        let capture_handle = spawn_capture(source, frame_tx, options, config.cancelled.clone());
        let analysis_handle =
            spawn_analysis(analyzer, frame_rx, analysis_tx, config.cancelled.clone());

        let mut summary = MonitorSummary::default();
        let mut ctx = MainLoop {
            policy: &mut policy,
            directory,
            sinks: &mut sinks,
            on_observation: config.on_observation.as_mut(),
            cancelled: &config.cancelled,
            total_frames: metadata.total_frames,
            logger: &mut *logger,
            summary: &mut summary,
        };
        let main_error = ctx.run(analysis_rx);

        let counts = join_threads(capture_handle, analysis_handle, main_error)?;
        summary.frames_captured = counts.captured;
        summary.frames_dropped = counts.dropped;
        summary.frames_skipped = counts.skipped;
        summary.stats = policy.stats();
        logger.summary();
        log::info!(
            "Monitor finished: {} frames captured, {} dropped, {} unreadable, {} analyzed, {} faces",
            summary.frames_captured,
            summary.frames_dropped,
            summary.frames_skipped,
            summary.frames_analyzed,
            summary.faces
        );
        Ok(summary)
    }
}

fn spawn_capture(
    mut source: Box<dyn FrameSource>,
    frame_tx: Sender<Frame>,
    options: CaptureOptions,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<CaptureCounts> {
    std::thread::spawn(move || {
        let mut counts = CaptureCounts::default();
        let started = Instant::now();
        for frame_result in source.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let frame = match frame_result {
                Ok(frame) => frame,
                Err(e) => {
                    log::warn!("Skipping unreadable frame: {e}");
                    counts.skipped += 1;
                    continue;
                }
            };
            if options.max_frames.is_some_and(|max| counts.captured >= max) {
                break;
            }
            if let Some(interval) = options.pacing {
                let due = started + interval.mul_f64(counts.captured as f64);
                if let Some(wait) = due.checked_duration_since(Instant::now()) {
                    std::thread::sleep(wait);
                }
            }
            counts.captured += 1;

            if options.drop_when_busy {
                match frame_tx.try_send(frame) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => counts.dropped += 1,
                    Err(TrySendError::Disconnected(_)) => break,
                }
            } else if frame_tx.send(frame).is_err() {
                break;
            }
        }
        source.close();
        counts
    })
}

fn spawn_analysis(
    mut analyzer: AnalyzeFrameUseCase,
    frame_rx: Receiver<Frame>,
    analysis_tx: Sender<Result<FrameAnalysis, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for frame in frame_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let result = analyzer
                .execute(&frame)
                .map_err(|e| -> SendError { Box::new(e) });
            if analysis_tx.send(result).is_err() {
                break;
            }
        }
    })
}

/// Main-thread state: policy, alerting and reporting.
struct MainLoop<'a> {
    policy: &'a mut RecognitionPolicy,
    directory: &'a PersonDirectory,
    sinks: &'a mut Vec<Box<dyn AlertSink>>,
    on_observation: Option<&'a mut ObservationCallback>,
    cancelled: &'a AtomicBool,
    total_frames: usize,
    logger: &'a mut dyn PipelineLogger,
    summary: &'a mut MonitorSummary,
}

impl MainLoop<'_> {
    /// Returns the first error seen; the loop stops there and dropping the
    /// receiver winds the worker threads down.
    fn run(
        &mut self,
        analysis_rx: Receiver<Result<FrameAnalysis, SendError>>,
    ) -> Option<Box<dyn std::error::Error>> {
        for received in analysis_rx {
            if self.cancelled.load(Ordering::Relaxed) {
                break;
            }
            match received {
                Ok(analysis) => self.handle(analysis),
                Err(e) => return Some(e.to_string().into()),
            }
        }
        None
    }

    fn handle(&mut self, analysis: FrameAnalysis) {
        self.summary.frames_analyzed += 1;
        self.summary.faces += analysis.observations.len();
        self.logger.timing("locate", analysis.timings.locate_ms);
        self.logger.timing("match", analysis.timings.match_ms);
        self.logger
            .metric("faces_per_frame", analysis.observations.len() as f64);

        let now = Instant::now();
        for observation in &analysis.observations {
            let verdict = self.policy.evaluate(&observation.result, self.directory, now);
            if let Verdict::Alert { person, distance } = &verdict {
                let alert = Alert {
                    person: person.clone(),
                    distance: *distance,
                    frame_index: analysis.frame_index,
                };
                for sink in self.sinks.iter_mut() {
                    if let Err(e) = sink.raise(&alert) {
                        log::error!("Alert sink failed: {e}");
                    }
                }
            }
            if let Some(callback) = self.on_observation.as_deref_mut() {
                callback(analysis.frame_index, observation, &verdict);
            }
        }
        self.logger
            .progress(self.summary.frames_analyzed, self.total_frames);
    }
}

/// Joins the worker threads and coalesces the first error encountered.
fn join_threads(
    capture_handle: JoinHandle<CaptureCounts>,
    analysis_handle: JoinHandle<()>,
    main_error: Option<Box<dyn std::error::Error>>,
) -> Result<CaptureCounts, Box<dyn std::error::Error>> {
    let capture = capture_handle.join();
    let analysis = analysis_handle.join();

    if let Some(e) = main_error {
        return Err(e);
    }
    if analysis.is_err() {
        return Err("Analysis thread panicked".into());
    }
    capture.map_err(|_| "Capture thread panicked".into())
}
