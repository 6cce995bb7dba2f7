//! Replay loop: one record per tick

use alerting::{AlertManager, AudioSink, PlaybackChange};
use dms::{AlertState, CalibrationResult, DmsError, DmsModule, MonitorPhase, Timestamp};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::record::parse_record;
use crate::MonitorError;

/// Replay options
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    /// Sleep between records so ticks follow their recorded timestamps
    pub realtime: bool,
}

/// Counters gathered over one replay
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplaySummary {
    /// Records processed by the DMS module
    pub ticks: usize,
    /// Lines skipped as unparsable or malformed
    pub skipped: usize,
    pub calibration_ticks: usize,
    pub monitoring_ticks: usize,
    /// Transitions into `Alerting`
    pub alerts_raised: usize,
    pub absent_ticks: usize,
    /// Times the alert sound was started
    pub sound_starts: usize,
    /// Audio device failures, logged and otherwise ignored
    pub audio_errors: usize,
    pub calibration: Option<CalibrationResult>,
}

impl ReplaySummary {
    /// Log the summary at info level
    pub fn log(&self) {
        info!(
            "Replay finished: {} ticks ({} calibrating, {} monitoring), {} skipped",
            self.ticks, self.calibration_ticks, self.monitoring_ticks, self.skipped
        );
        info!(
            "Drowsiness alerts: {}, subject absent ticks: {}, sound starts: {}, audio errors: {}",
            self.alerts_raised, self.absent_ticks, self.sound_starts, self.audio_errors
        );
        match &self.calibration {
            Some(CalibrationResult {
                baseline_ratio: Some(baseline),
                threshold,
                ..
            }) => info!("Baseline ratio {:.3}, threshold {:.3}", baseline, threshold),
            Some(result) => info!("Fallback threshold {:.3}", result.threshold),
            None => info!("Calibration never ran"),
        }
    }
}

/// Drive `module` with every record from `reader`.
///
/// Bad lines and malformed landmark sets are logged and skipped, and audio
/// device failures never stop the replay. If the input ends during
/// calibration, calibration is finished with whatever was collected.
pub async fn replay<R, S>(
    reader: R,
    module: &mut DmsModule,
    alerts: &mut AlertManager<S>,
    options: &ReplayOptions,
) -> Result<ReplaySummary, MonitorError>
where
    R: AsyncBufRead + Unpin,
    S: AudioSink,
{
    let mut lines = reader.split(b'\n');
    let mut summary = ReplaySummary::default();
    let mut line_no = 0;
    let mut previous: Option<AlertState> = None;
    let mut clock: Option<(Instant, Timestamp)> = None;

    while let Some(bytes) = lines.next_segment().await? {
        line_no += 1;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("Line {}: not valid UTF-8: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let record = match parse_record(line, line_no) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}", e);
                summary.skipped += 1;
                continue;
            }
        };
        let now = record.timestamp();

        if options.realtime {
            let (wall_start, first) = *clock.get_or_insert((Instant::now(), now));
            tokio::time::sleep_until(wall_start + now.saturating_sub(first)).await;
        }

        let analysis = match module.process(&record.into_frame(), now) {
            Ok(analysis) => analysis,
            Err(e @ DmsError::MalformedLandmarks(_)) => {
                warn!("Line {}: {}", line_no, e);
                summary.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        summary.ticks += 1;

        let Some(state) = analysis.alert_state else {
            summary.calibration_ticks += 1;
            continue;
        };

        summary.monitoring_ticks += 1;
        if previous.is_none() {
            info!("Monitoring started at {:?}", now);
        }
        match state {
            AlertState::Alerting if previous != Some(AlertState::Alerting) => {
                summary.alerts_raised += 1;
            }
            AlertState::SubjectAbsent => summary.absent_ticks += 1,
            _ => {}
        }
        if previous != Some(state) {
            debug!(
                "Line {}: {:?} (banner: {:?}, closed frames: {})",
                line_no,
                state,
                state.banner(),
                analysis.consecutive_closed_frames
            );
        }

        match alerts.update(state) {
            Ok(PlaybackChange::Unchanged) => {}
            Ok(_) => debug!("Audio playing: {}", alerts.is_playing()),
            Err(e) => {
                warn!("Line {}: {}", line_no, e);
                summary.audio_errors += 1;
            }
        }
        previous = Some(state);
    }

    if module.phase() == MonitorPhase::Calibrating {
        warn!("Input ended during calibration after {} ticks", summary.ticks);
        module.finish_calibration();
    }
    if let Err(e) = alerts.silence() {
        warn!("Failed to stop alert sound: {}", e);
        summary.audio_errors += 1;
    }

    summary.calibration = module.calibration().copied();
    summary.sound_starts = alerts.start_count();
    Ok(summary)
}
