//! Analysis Engine - Main Entry Point
//!
//! The AnalysisEngine owns the analyzed data and a dedicated worker thread
//! that runs analysis passes.
//!
//! # Architecture
//!
//! ```text
//! Acquisition ──submit_capture──▶ busy? ──yes──▶ dropped (no queueing)
//!                                   │ no
//!                                   ▼  lock raw buffers, crossbeam job
//!                           ┌───────────────────┐
//!                           │   Worker Thread   │  write lock on AnalysisSet
//!                           │ copy → release raw│  for the whole pass
//!                           │ measure → spectra │
//!                           └───────────────────┘
//!                                   │ events
//!                                   ▼
//! Renderer ──current_snapshot()/channel(i)──▶ read lock on AnalysisSet
//! ```
//!
//! Only one pass is ever in flight. A capture submitted while a pass runs is
//! dropped and its buffer stays with the acquisition layer.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::capture::{CaptureBuffer, PendingCapture};
use crate::config::AnalysisConfig;
use crate::error::{AnalyzerError, AnalyzerResult};
use crate::message::{Event, Job};
use crate::pass::Analyzer;
use crate::store::{AnalysisSet, ChannelAnalysis};

/// Events kept for the application before new ones are discarded
pub const EVENT_QUEUE_CAPACITY: usize = 256;

/// Result of handing a capture to the engine
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// A pass was started for the capture
    Accepted,
    /// A pass was already running; the capture was not touched
    Dropped,
}

/// Counters since the engine was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub passes_completed: u64,
    pub captures_dropped: u64,
}

/// State shared between the engine handle and its worker
struct Shared {
    /// Analyzed data, written only by a running pass
    data: RwLock<AnalysisSet>,
    /// Settings snapshot source
    config: RwLock<AnalysisConfig>,
    /// Set from submission until the pass has finished
    busy: AtomicBool,
    passes_completed: AtomicU64,
    captures_dropped: AtomicU64,
}

/// The analysis orchestrator
///
/// Lives with the acquisition/UI side and hands captures to its worker
/// thread through a channel.
pub struct AnalysisEngine {
    /// Channel for sending jobs to the worker
    job_sender: Sender<Job>,

    /// Channel for receiving events from the worker
    event_receiver: Receiver<Event>,

    /// Used to report dropped captures from the submitting thread
    event_sender: Sender<Event>,

    /// Handle to the worker thread
    worker: Option<JoinHandle<()>>,

    shared: Arc<Shared>,
}

impl AnalysisEngine {
    /// Create a new engine with default configuration
    pub fn new() -> AnalyzerResult<Self> {
        Self::with_config(AnalysisConfig::default())
    }

    /// Create a new engine with custom configuration
    pub fn with_config(config: AnalysisConfig) -> AnalyzerResult<Self> {
        config.validate()?;

        // One pending pass plus a shutdown request
        let (job_sender, job_receiver) = bounded::<Job>(2);
        // Readers that never poll must not grow the queue
        let (event_sender, event_receiver) = bounded::<Event>(EVENT_QUEUE_CAPACITY);

        let shared = Arc::new(Shared {
            data: RwLock::new(AnalysisSet::new()),
            config: RwLock::new(config),
            busy: AtomicBool::new(false),
            passes_completed: AtomicU64::new(0),
            captures_dropped: AtomicU64::new(0),
        });

        let shared_clone = Arc::clone(&shared);
        let events_clone = event_sender.clone();

        let worker = thread::Builder::new()
            .name("scope-analysis".into())
            .spawn(move || {
                Self::worker_main(job_receiver, events_clone, shared_clone);
            })
            .map_err(|e| AnalyzerError::WorkerSpawnError(e.to_string()))?;

        Ok(Self {
            job_sender,
            event_receiver,
            event_sender,
            worker: Some(worker),
            shared,
        })
    }

    /// Submit a capture for analysis
    ///
    /// Returns immediately. If a pass is already running the capture is
    /// dropped and `buffer` is left unlocked for the acquisition layer to
    /// reuse. Otherwise `buffer` stays locked until the worker has copied
    /// the samples.
    pub fn submit_capture(&self, buffer: &CaptureBuffer) -> AnalyzerResult<Submission> {
        if self
            .shared
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.shared.captures_dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Previous analysis still running, dropping capture");
            let _ = self.event_sender.try_send(Event::CaptureDropped);
            return Ok(Submission::Dropped);
        }

        let pending = PendingCapture::lock(buffer);
        match self.job_sender.try_send(Job::Analyze(pending)) {
            Ok(()) => Ok(Submission::Accepted),
            Err(TrySendError::Full(_)) => {
                // Only reachable while a shutdown is queued
                self.shared.busy.store(false, Ordering::Release);
                warn!("Analysis worker queue full, dropping capture");
                Ok(Submission::Dropped)
            }
            Err(TrySendError::Disconnected(_)) => {
                self.shared.busy.store(false, Ordering::Release);
                Err(AnalyzerError::ChannelSendError)
            }
        }
    }

    /// Whether a pass is currently in flight
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::Acquire)
    }

    /// Read access to the analyzed data of all channels
    ///
    /// Blocks while a pass is running; a running pass waits for all
    /// snapshots to be dropped.
    pub fn current_snapshot(&self) -> RwLockReadGuard<'_, AnalysisSet> {
        self.shared.data.read()
    }

    /// Read access to one channel, `None` if `index` is out of range
    pub fn channel(&self, index: usize) -> Option<MappedRwLockReadGuard<'_, ChannelAnalysis>> {
        RwLockReadGuard::try_map(self.shared.data.read(), |set| set.channel(index)).ok()
    }

    /// Replace the configuration used by subsequent passes
    pub fn set_config(&self, config: AnalysisConfig) -> AnalyzerResult<()> {
        config.validate()?;
        *self.shared.config.write() = config;
        Ok(())
    }

    /// Get current configuration
    pub fn config(&self) -> AnalysisConfig {
        self.shared.config.read().clone()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            passes_completed: self.shared.passes_completed.load(Ordering::Relaxed),
            captures_dropped: self.shared.captures_dropped.load(Ordering::Relaxed),
        }
    }

    /// Events waiting to be polled
    pub fn queued_events(&self) -> usize {
        self.event_receiver.len()
    }

    /// Get next event (non-blocking)
    pub fn poll_event(&self) -> Option<Event> {
        self.event_receiver.try_recv().ok()
    }

    /// Get next event (blocking)
    pub fn wait_event(&self) -> Option<Event> {
        self.event_receiver.recv().ok()
    }

    /// Get next event, giving up after `timeout`
    pub fn wait_event_timeout(&self, timeout: Duration) -> Option<Event> {
        self.event_receiver.recv_timeout(timeout).ok()
    }

    /// Worker thread main loop
    fn worker_main(job_receiver: Receiver<Job>, event_sender: Sender<Event>, shared: Arc<Shared>) {
        info!("Analysis worker started");

        let mut analyzer = Analyzer::new();

        while let Ok(job) = job_receiver.recv() {
            let capture = match job {
                Job::Analyze(capture) => capture,
                Job::Shutdown => break,
            };

            let config = shared.config.read().clone();
            let started = Instant::now();

            let report = {
                let mut data = shared.data.write();
                analyzer.run(&mut data, capture, &config)
            };

            let duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
            if report.updated {
                shared.passes_completed.fetch_add(1, Ordering::Relaxed);
            }
            shared.busy.store(false, Ordering::Release);

            for err in &report.errors {
                error!("Analysis pass: {}", err);
                let _ = event_sender.try_send(Event::error(err));
            }
            debug!(
                "Pass complete: {} channels in {}us",
                report.channels, duration_us
            );
            let _ = event_sender.try_send(Event::PassComplete {
                channels: report.channels,
                duration_us,
            });
        }

        info!("Analysis worker shutting down");
    }
}

impl Drop for AnalysisEngine {
    fn drop(&mut self) {
        // Send shutdown command
        let _ = self.job_sender.send(Job::Shutdown);

        // Wait for worker thread to finish
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::RawCapture;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn wait_for_pass(engine: &AnalysisEngine) -> usize {
        loop {
            match engine.wait_event_timeout(TIMEOUT) {
                Some(Event::PassComplete { channels, .. }) => return channels,
                Some(_) => continue,
                None => panic!("No PassComplete event within {:?}", TIMEOUT),
            }
        }
    }

    fn ramp_capture(count: usize) -> CaptureBuffer {
        let mut raw = RawCapture::new(1000.0);
        raw.set_channel(0, (0..count).map(|i| i as f64).collect());
        raw.set_channel(1, vec![0.0; count]);
        raw.into_buffer()
    }

    #[test]
    fn test_engine_creation() {
        let engine = AnalysisEngine::new();
        assert!(engine.is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = AnalysisEngine::with_config(AnalysisConfig::with_channels(0));
        assert!(matches!(result, Err(AnalyzerError::ConfigError(_))));
    }

    #[test]
    fn test_engine_not_busy_initially() {
        let engine = AnalysisEngine::new().unwrap();
        assert!(!engine.is_busy());
        assert!(engine.current_snapshot().is_empty());
        assert!(engine.channel(0).is_none());
        assert_eq!(engine.stats(), EngineStats::default());
    }

    #[test]
    fn test_engine_shutdown() {
        let engine = AnalysisEngine::new().unwrap();
        drop(engine); // Should shutdown cleanly
    }

    #[test]
    fn test_submit_runs_pass() {
        let engine = AnalysisEngine::new().unwrap();
        let buffer = ramp_capture(64);

        assert_eq!(engine.submit_capture(&buffer).unwrap(), Submission::Accepted);
        assert_eq!(wait_for_pass(&engine), 3);

        let channel = engine.channel(0).unwrap();
        assert_eq!(channel.time_domain.count(), 64);
        assert_eq!(channel.time_domain.samples()[10], 10.0);
        drop(channel);

        assert!(engine.channel(3).is_none());
        assert!(!engine.is_busy());
        assert_eq!(engine.stats().passes_completed, 1);
        // Raw buffer handed back
        assert!(buffer.try_lock().is_some());
    }

    #[test]
    fn test_busy_submission_is_dropped() {
        let engine = AnalysisEngine::new().unwrap();
        let first = ramp_capture(32);
        let second = ramp_capture(128);

        // Holding a snapshot keeps the accepted pass from finishing
        let snapshot = engine.current_snapshot();
        assert_eq!(engine.submit_capture(&first).unwrap(), Submission::Accepted);
        assert!(engine.is_busy());
        assert_eq!(engine.submit_capture(&second).unwrap(), Submission::Dropped);
        assert!(second.try_lock().is_some());
        assert!(snapshot.is_empty());
        drop(snapshot);

        wait_for_pass(&engine);
        assert_eq!(engine.channel(0).unwrap().time_domain.count(), 32);

        let stats = engine.stats();
        assert_eq!(stats.passes_completed, 1);
        assert_eq!(stats.captures_dropped, 1);
    }

    #[test]
    fn test_set_config_between_passes() {
        let engine = AnalysisEngine::new().unwrap();
        let buffer = ramp_capture(16);

        let mut config = engine.config();
        config.math = None;
        engine.set_config(config.clone()).unwrap();
        assert_eq!(engine.config(), config);

        assert_eq!(engine.submit_capture(&buffer).unwrap(), Submission::Accepted);
        assert_eq!(wait_for_pass(&engine), 2);

        assert!(engine.set_config(AnalysisConfig::with_channels(0)).is_err());
        assert_eq!(engine.config(), config);
    }

    fn wait_until_idle(engine: &AnalysisEngine) {
        let deadline = Instant::now() + TIMEOUT;
        while engine.is_busy() {
            assert!(Instant::now() < deadline, "Pass did not finish");
            thread::yield_now();
        }
    }

    #[test]
    fn test_event_queue_is_capped() {
        let engine = AnalysisEngine::new().unwrap();
        let buffer = ramp_capture(8);
        let passes = EVENT_QUEUE_CAPACITY * 2 + 10;

        // Nobody polls events here
        for _ in 0..passes {
            wait_until_idle(&engine);
            assert_eq!(engine.submit_capture(&buffer).unwrap(), Submission::Accepted);
        }
        wait_until_idle(&engine);

        // The last PassComplete may still be on its way
        let deadline = Instant::now() + TIMEOUT;
        while engine.queued_events() < EVENT_QUEUE_CAPACITY {
            assert!(Instant::now() < deadline, "Events were not queued");
            thread::yield_now();
        }
        assert_eq!(engine.queued_events(), EVENT_QUEUE_CAPACITY);
        assert_eq!(engine.stats().passes_completed, passes as u64);

        // Still accepting and reporting once the queue drains
        while engine.poll_event().is_some() {}
        assert_eq!(engine.submit_capture(&buffer).unwrap(), Submission::Accepted);
        wait_for_pass(&engine);
    }

    #[test]
    fn test_invalid_sample_rate_is_not_counted() {
        let engine = AnalysisEngine::new().unwrap();
        let buffer = RawCapture::new(-1.0).into_buffer();

        assert_eq!(engine.submit_capture(&buffer).unwrap(), Submission::Accepted);
        let mut saw_error = false;
        loop {
            match engine.wait_event_timeout(TIMEOUT) {
                Some(Event::Error { message }) => {
                    assert!(message.contains("sample rate"));
                    saw_error = true;
                }
                Some(Event::PassComplete { channels, .. }) => {
                    assert_eq!(channels, 0);
                    break;
                }
                Some(_) => {}
                None => panic!("Pass did not complete"),
            }
        }
        assert!(saw_error);
        assert!(engine.current_snapshot().is_empty());
        assert_eq!(engine.stats().passes_completed, 0);
    }

    #[test]
    fn test_stats_serialization() {
        let stats = EngineStats {
            passes_completed: 12,
            captures_dropped: 3,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"captures_dropped\":3"));

        let deserialized: EngineStats = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, stats);
    }

    #[test]
    fn test_configuration_error_event() {
        let mut config = AnalysisConfig::default();
        if let Some(math) = config.math.as_mut() {
            math.mode = None;
            math.channel.voltage_used = true;
        }
        let engine = AnalysisEngine::with_config(config).unwrap();

        let submission = engine.submit_capture(&ramp_capture(8)).unwrap();
        assert_eq!(submission, Submission::Accepted);

        let mut saw_error = false;
        loop {
            match engine.wait_event_timeout(TIMEOUT) {
                Some(Event::Error { message }) => {
                    assert!(message.contains("combination mode"));
                    saw_error = true;
                }
                Some(Event::PassComplete { .. }) => break,
                Some(_) => {}
                None => panic!("Pass did not complete"),
            }
        }
        assert!(saw_error);
        assert_eq!(engine.channel(0).unwrap().time_domain.count(), 8);
    }
}
