//! Mock hardware for integration tests.
//!
//! Every mock is a cheap handle onto shared, lock-protected state: the test
//! keeps one clone to inspect while the controller owns (or moves into a
//! thread) the other.  Each write is timestamped so tests can assert on
//! timing as well as on the final level.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use costume::app::events::AppEvent;
use costume::app::ports::{AudioPlayer, EventSink};
use costume::error::PlaybackFault;
use embedded_hal::digital::{self, ErrorKind as DigitalErrorKind};
use embedded_hal::pwm::{self, ErrorKind as PwmErrorKind, SetDutyCycle};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// ── Output line ───────────────────────────────────────────────

#[derive(Default)]
struct LineState {
    level: bool,
    writes: Vec<(Instant, bool)>,
}

/// Recording digital output.
#[derive(Clone, Default)]
pub struct MockLine {
    state: Arc<Mutex<LineState>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        lock(&self.state).level
    }

    pub fn writes(&self) -> Vec<(Instant, bool)> {
        lock(&self.state).writes.clone()
    }

    /// Number of level changes (repeated writes of the same level excluded).
    pub fn toggles(&self) -> usize {
        let writes = lock(&self.state).writes.clone();
        let mut prev = false;
        let mut count = 0;
        for (_, level) in writes {
            if level != prev {
                count += 1;
                prev = level;
            }
        }
        count
    }

    pub fn toggles_between(&self, from: Instant, to: Instant) -> usize {
        let writes = lock(&self.state).writes.clone();
        let mut prev = writes
            .iter()
            .take_while(|(t, _)| *t < from)
            .last()
            .is_some_and(|(_, l)| *l);
        let mut count = 0;
        for (_, level) in writes.into_iter().filter(|(t, _)| *t >= from && *t < to) {
            if level != prev {
                count += 1;
                prev = level;
            }
        }
        count
    }

    pub fn clear(&self) {
        lock(&self.state).writes.clear();
    }

    /// Make every following write fail.
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn write(&self, level: bool) -> Result<(), DigitalErrorKind> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DigitalErrorKind::Other);
        }
        let mut s = lock(&self.state);
        s.level = level;
        s.writes.push((Instant::now(), level));
        Ok(())
    }
}

impl digital::ErrorType for MockLine {
    type Error = DigitalErrorKind;
}

impl digital::OutputPin for MockLine {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true)
    }
}

// ── Button ────────────────────────────────────────────────────

/// Active-low push button: pressed reads low.
#[derive(Clone, Default)]
pub struct MockButton {
    pressed: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::SeqCst);
    }

    /// Hold for `hold`, then release.
    pub fn tap(&self, hold: Duration) {
        self.set_pressed(true);
        std::thread::sleep(hold);
        self.set_pressed(false);
    }
}

impl digital::ErrorType for MockButton {
    type Error = DigitalErrorKind;
}

impl digital::InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.pressed.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.pressed.load(Ordering::SeqCst))
    }
}

// ── Servo PWM ─────────────────────────────────────────────────

pub const MOCK_PWM_MAX: u16 = 1000;

/// Recording PWM channel; duties are stored as percent.
#[derive(Clone, Default)]
pub struct MockPwm {
    duties: Arc<Mutex<Vec<(Instant, f64)>>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duties(&self) -> Vec<f64> {
        lock(&self.duties).iter().map(|(_, d)| *d).collect()
    }

    pub fn timed_duties(&self) -> Vec<(Instant, f64)> {
        lock(&self.duties).clone()
    }

    pub fn clear(&self) {
        lock(&self.duties).clear();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl pwm::ErrorType for MockPwm {
    type Error = PwmErrorKind;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        MOCK_PWM_MAX
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PwmErrorKind::Other);
        }
        let percent = f64::from(duty) * 100.0 / f64::from(MOCK_PWM_MAX);
        lock(&self.duties).push((Instant::now(), percent));
        Ok(())
    }
}

// ── Audio player ──────────────────────────────────────────────

/// Records every path it is asked to play.
#[derive(Clone, Default)]
pub struct MockPlayer {
    played: Arc<Mutex<Vec<PathBuf>>>,
    fail: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// File names played, in order.
    pub fn played(&self) -> Vec<String> {
        lock(&self.played)
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect()
    }

    pub fn count(&self, clip: &str) -> usize {
        self.played().iter().filter(|c| *c == clip).count()
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl AudioPlayer for MockPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlaybackFault> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlaybackFault::DecodeFailed);
        }
        lock(&self.played).push(path.to_path_buf());
        Ok(())
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn last(&self) -> Option<&AppEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Asset directory ───────────────────────────────────────────

/// Temp directory containing an empty file for every clip name given.
#[allow(dead_code)]
pub fn asset_dir<'a>(clips: impl IntoIterator<Item = &'a str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    for clip in clips {
        std::fs::write(dir.path().join(clip), b"RIFF").expect("write clip");
    }
    dir
}
