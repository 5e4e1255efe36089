//! Signal producers and the latest-value bus that feeds the frame loop.
//!
//! Producers never block the renderer: they publish into an unbounded
//! channel, and once per frame the consumer drains it and keeps only the
//! newest signal. A frame with nothing new reuses the previous signal.
//!
//! Two producers ship with the crate:
//!
//! - [`PointerTracker`] turns cursor motion into pointer signals.
//! - [`LandmarkReplay`] streams recorded hand landmarks from a JSON-lines
//!   file on a background thread.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use glam::Vec2;
use tracing::{debug, info, warn};

use crate::error::SourceError;
use crate::signal::{GestureReducer, HandFrame, InteractionSignal, ScalePolicy};

/// Create a connected publisher/receiver pair.
pub fn signal_bus() -> (SignalPublisher, SignalReceiver) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        SignalPublisher { tx },
        SignalReceiver {
            rx,
            latest: InteractionSignal::default(),
        },
    )
}

/// Sending half of the signal bus. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SignalPublisher {
    tx: Sender<InteractionSignal>,
}

impl SignalPublisher {
    /// Publish a signal. Returns `false` once the receiver is gone.
    pub fn publish(&self, signal: InteractionSignal) -> bool {
        self.tx.send(signal).is_ok()
    }
}

/// Receiving half of the signal bus.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: Receiver<InteractionSignal>,
    latest: InteractionSignal,
}

impl SignalReceiver {
    /// Drain pending signals and return the newest one seen so far.
    ///
    /// Never waits. Stale values queued behind a newer one are dropped.
    pub fn latest(&mut self) -> InteractionSignal {
        if let Some(signal) = self.rx.try_iter().last() {
            self.latest = signal;
        }
        self.latest
    }

    /// The newest signal as of the last drain.
    #[inline]
    pub fn peek(&self) -> InteractionSignal {
        self.latest
    }
}

/// Where interaction signals currently come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Hand tracking is producing signals.
    Gesture,
    /// The cursor drives the signal.
    Pointer,
}

/// Publishes pointer signals from cursor positions.
///
/// Only publishes in [`InputMode::Pointer`], so a live gesture source is
/// never overridden by stray mouse motion. The last cursor signal is
/// remembered either way and takes over through [`observe`](Self::observe)
/// whenever no hand is tracked.
#[derive(Debug)]
pub struct PointerTracker {
    publisher: SignalPublisher,
    mode: InputMode,
    last: Option<InteractionSignal>,
}

impl PointerTracker {
    pub fn new(publisher: SignalPublisher, mode: InputMode) -> Self {
        Self {
            publisher,
            mode,
            last: None,
        }
    }

    #[inline]
    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InputMode) {
        if self.mode != mode {
            info!(?mode, "input mode changed");
            self.mode = mode;
        }
    }

    /// Handle a cursor position in normalized window coordinates.
    pub fn cursor_moved(&mut self, normalized: Vec2) {
        let signal = InteractionSignal::pointer(normalized.x, normalized.y);
        self.last = Some(signal);
        if self.mode == InputMode::Pointer {
            self.publisher.publish(signal);
        }
    }

    /// Pick the signal that drives this frame.
    ///
    /// A tracked hand wins and switches to [`InputMode::Gesture`]. Without
    /// one the cursor takes over, falling back to `latest` until the cursor
    /// has moved at least once.
    pub fn observe(&mut self, latest: InteractionSignal) -> InteractionSignal {
        if latest.is_active() {
            self.set_mode(InputMode::Gesture);
            latest
        } else {
            self.set_mode(InputMode::Pointer);
            self.last.unwrap_or(latest)
        }
    }
}

/// Parse one recorded frame.
pub fn parse_frame(line: &str) -> Result<HandFrame, serde_json::Error> {
    serde_json::from_str(line)
}

/// Streams a landmark recording into the signal bus.
///
/// The recording is a JSON-lines file with one [`HandFrame`] per line:
///
/// ```text
/// {"hands": [[[0.51, 0.72], [0.49, 0.65], ...21 points], ...]}
/// ```
///
/// Blank and malformed lines are skipped.
#[derive(Debug, Clone)]
pub struct LandmarkReplay {
    path: PathBuf,
    rate_hz: f32,
    looped: bool,
    policy: ScalePolicy,
}

impl LandmarkReplay {
    /// Replay `path` at 30 frames per second, once.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rate_hz: 30.0,
            looped: false,
            policy: ScalePolicy::default(),
        }
    }

    pub fn with_rate(mut self, rate_hz: f32) -> Self {
        self.rate_hz = rate_hz;
        self
    }

    /// Restart from the first line at end of file.
    pub fn with_loop(mut self, looped: bool) -> Self {
        self.looped = looped;
        self
    }

    pub fn with_scale_policy(mut self, policy: ScalePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the recording and start streaming it on a background thread.
    ///
    /// Fails without spawning anything if the file cannot be opened.
    pub fn spawn(self, publisher: SignalPublisher) -> Result<ReplayHandle, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;

        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let join = thread::Builder::new()
            .name("landmark-replay".into())
            .spawn(move || self.run(BufReader::new(file), &publisher, &thread_stop))
            .map_err(SourceError::Spawn)?;

        Ok(ReplayHandle {
            join: Some(join),
            stop,
        })
    }

    fn run(&self, mut reader: BufReader<File>, publisher: &SignalPublisher, stop: &AtomicBool) {
        let interval = Duration::from_secs_f32(1.0 / self.rate_hz.max(1.0));
        let mut reducer = GestureReducer::new(self.policy);
        let mut line = String::new();
        let mut line_no = 0usize;
        let mut published_this_pass = 0usize;

        info!(path = %self.path.display(), rate_hz = self.rate_hz, "landmark replay started");

        while !stop.load(Ordering::Relaxed) {
            line.clear();
            let read = match reader.read_line(&mut line) {
                Ok(read) => read,
                Err(err) => {
                    warn!(error = %err, "landmark replay read failed");
                    break;
                }
            };

            if read == 0 {
                if !self.looped {
                    break;
                }
                if published_this_pass == 0 {
                    warn!(path = %self.path.display(), "recording has no valid frames, not looping");
                    break;
                }
                if let Err(err) = reader.seek(SeekFrom::Start(0)) {
                    warn!(error = %err, "landmark replay rewind failed");
                    break;
                }
                debug!("landmark replay rewound");
                line_no = 0;
                published_this_pass = 0;
                continue;
            }

            line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match parse_frame(trimmed) {
                Ok(frame) => {
                    if !publisher.publish(reducer.reduce(&frame.hands)) {
                        break;
                    }
                    published_this_pass += 1;
                    thread::sleep(interval);
                }
                Err(err) => warn!(line = line_no, error = %err, "skipping malformed landmark frame"),
            }
        }

        info!(path = %self.path.display(), "landmark replay finished");
    }
}

/// Handle to a running replay. Dropping it asks the thread to stop.
#[derive(Debug)]
pub struct ReplayHandle {
    join: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl ReplayHandle {
    /// Whether the replay thread has exited.
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Stop the replay and wait for the thread to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!("landmark replay thread panicked");
            }
        }
    }
}

impl Drop for ReplayHandle {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
