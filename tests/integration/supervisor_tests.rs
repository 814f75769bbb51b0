//! End-to-end: mock buttons → input poller → queue → machine → mock outputs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use costume::app::events::AppEvent;
use costume::app::state::{Mode, Position};
use costume::config::CostumeConfig;
use costume::supervisor::{Hardware, Supervisor};

use crate::mock_hw::{MockButton, MockLine, MockPlayer, MockPwm, RecordingSink, asset_dir};

type Sup = Supervisor<MockPwm, MockLine, MockLine, MockPlayer, RecordingSink>;

const TAP: Duration = Duration::from_millis(30);
/// Longer than the debounce window, so consecutive taps are distinct presses.
const GAP: Duration = Duration::from_millis(260);

struct Rig {
    sup: Sup,
    pwm: MockPwm,
    strobe: MockLine,
    laser: MockLine,
    wing: MockButton,
    laser_button: MockButton,
    phrase: MockButton,
    player: MockPlayer,
    _assets: tempfile::TempDir,
}

fn config(settle_ms: u32, assets: &tempfile::TempDir) -> CostumeConfig {
    let mut config = CostumeConfig::default();
    config.servo.primary_duty = 10.0;
    config.servo.secondary_duty = 5.0;
    config.servo.settle_ms = settle_ms;
    config.strobe_frequency_hz = 10.0;
    config.debounce_ms = 200;
    config.audio_dir = assets.path().to_path_buf();
    config.validate().expect("valid config");
    config
}

fn rig(settle_ms: u32) -> Rig {
    let defaults = CostumeConfig::default();
    let assets = asset_dir(defaults.clips.all());
    let config = config(settle_ms, &assets);

    let pwm = MockPwm::new();
    let strobe = MockLine::new();
    let laser = MockLine::new();
    let wing = MockButton::new();
    let laser_button = MockButton::new();
    let phrase = MockButton::new();
    let player = MockPlayer::new();

    let hardware = Hardware {
        servo: pwm.clone(),
        strobe: strobe.clone(),
        laser: laser.clone(),
        wing_button: wing.clone(),
        laser_button: laser_button.clone(),
        phrase_button: phrase.clone(),
    };
    let sup = Supervisor::start(&config, hardware, player.clone(), RecordingSink::new())
        .expect("supervisor start");
    // Let the poller take its first (edge-less) sample of the idle buttons.
    std::thread::sleep(Duration::from_millis(20));

    Rig {
        sup,
        pwm,
        strobe,
        laser,
        wing,
        laser_button,
        phrase,
        player,
        _assets: assets,
    }
}

impl Rig {
    /// Handle queued presses until the queue stays empty for `quiet`.
    fn drain(&mut self, quiet: Duration) -> usize {
        let mut handled = 0;
        while self.sup.step(quiet) {
            handled += 1;
        }
        handled
    }
}

#[test]
fn wing_press_deploys_end_to_end() {
    let mut r = rig(500);
    assert_eq!(r.pwm.duties(), vec![5.0, 0.0]);

    r.wing.tap(TAP);
    assert!(r.sup.step(Duration::from_secs(1)), "press should arrive");

    let timed = r.pwm.timed_duties();
    let duties: Vec<f64> = timed.iter().map(|(_, d)| *d).collect();
    assert_eq!(duties, vec![5.0, 0.0, 10.0, 0.0]);
    let held = timed[3].0.duration_since(timed[2].0);
    assert!(held >= Duration::from_millis(500), "held only {held:?}");

    assert!(r.sup.machine().is_strobe_running());
    assert_eq!(r.sup.machine().state().position, Position::Primary);
    assert_eq!(r.player.count("wings_open.wav"), 1);

    std::thread::sleep(Duration::from_millis(200));
    assert!(r.strobe.toggles() >= 3, "strobe should be running");
}

#[test]
fn press_during_settle_is_handled_after_the_move() {
    let mut r = rig(500);

    let presser = {
        let wing = r.wing.clone();
        std::thread::spawn(move || {
            wing.tap(TAP);
            // Second press lands while the first handler is still settling.
            std::thread::sleep(Duration::from_millis(270));
            wing.tap(TAP);
        })
    };

    let handled = r.drain(Duration::from_millis(400));
    presser.join().expect("presser thread");

    assert_eq!(handled, 2);
    assert_eq!(r.sup.machine().state().position, Position::Secondary);
    assert!(!r.sup.machine().is_strobe_running());
    assert!(!r.strobe.is_high());
    assert_eq!(r.pwm.duties(), vec![5.0, 0.0, 10.0, 0.0, 5.0, 0.0]);
    assert_eq!(r.player.played(), vec!["wings_open.wav", "wings_close.wav"]);
}

#[test]
fn quick_repress_after_long_hold_is_a_new_press() {
    let mut r = rig(20);

    r.laser_button.set_pressed(true);
    std::thread::sleep(Duration::from_millis(400));
    r.laser_button.set_pressed(false);
    std::thread::sleep(Duration::from_millis(100));
    r.laser_button.tap(TAP);

    assert_eq!(r.drain(Duration::from_millis(300)), 2);
    assert!(!r.laser.is_high());
}

#[test]
fn held_or_bouncing_button_yields_one_press() {
    let mut r = rig(20);

    // Contact chatter followed by a long hold.
    for _ in 0..5 {
        r.wing.set_pressed(true);
        std::thread::sleep(Duration::from_millis(7));
        r.wing.set_pressed(false);
        std::thread::sleep(Duration::from_millis(7));
    }
    r.wing.set_pressed(true);
    std::thread::sleep(Duration::from_millis(300));
    r.wing.set_pressed(false);

    assert_eq!(r.drain(Duration::from_millis(300)), 1);
    assert_eq!(r.sup.machine().mode(), Mode::Deployed);
}

#[test]
fn taps_outside_debounce_window_all_count() {
    let mut r = rig(20);

    for _ in 0..3 {
        r.laser_button.tap(TAP);
        std::thread::sleep(GAP);
    }

    assert_eq!(r.drain(Duration::from_millis(300)), 3);
    assert!(r.laser.is_high(), "three toggles leave the laser on");
    assert_eq!(
        r.player.played(),
        vec!["laser_on.wav", "laser_off.wav", "laser_on.wav"]
    );
}

#[test]
fn buttons_are_independent() {
    let mut r = rig(20);

    r.wing.tap(TAP);
    r.laser_button.tap(TAP);
    r.phrase.tap(TAP);

    assert_eq!(r.drain(Duration::from_millis(300)), 3);
    let state = r.sup.machine().state();
    assert_eq!(state.position, Position::Primary);
    assert!(state.indicator_on);
    assert_eq!(
        r.sup
            .sink()
            .count(|e| matches!(e, AppEvent::PhraseSelected { .. })),
        1
    );
}

#[test]
fn shutdown_is_idempotent_and_releases_outputs() {
    let mut r = rig(20);
    r.wing.tap(TAP);
    r.laser_button.tap(TAP);
    r.drain(Duration::from_millis(200));
    assert!(r.sup.machine().is_strobe_running());

    r.sup.shutdown();
    r.sup.shutdown();

    assert!(r.sup.machine().is_stopped());
    assert!(!r.strobe.is_high());
    assert!(!r.laser.is_high());
    assert_eq!(r.pwm.duties().last(), Some(&0.0));
    assert_eq!(r.sup.sink().count(|e| *e == AppEvent::Stopped), 1);

    // Poller is gone: presses no longer arrive.
    r.wing.tap(TAP);
    assert!(!r.sup.step(Duration::from_millis(100)));
}

#[test]
fn run_returns_after_shutdown_flag() {
    let mut r = rig(20);
    let flag = Arc::new(AtomicBool::new(false));

    let setter = {
        let flag = Arc::clone(&flag);
        let wing = r.wing.clone();
        std::thread::spawn(move || {
            wing.tap(TAP);
            std::thread::sleep(Duration::from_millis(150));
            flag.store(true, Ordering::Release);
        })
    };

    let t0 = Instant::now();
    r.sup.run(&flag);
    setter.join().expect("setter thread");

    assert!(t0.elapsed() < Duration::from_secs(2));
    assert!(r.sup.machine().is_stopped());
    assert!(!r.strobe.is_high(), "strobe stopped low on exit");
    assert_eq!(r.player.count("wings_open.wav"), 1);
}

#[test]
fn dropping_supervisor_releases_outputs() {
    let r = rig(20);
    let laser = r.laser.clone();
    let strobe = r.strobe.clone();
    let Rig { mut sup, laser_button, wing, .. } = r;

    wing.tap(TAP);
    laser_button.tap(TAP);
    while sup.step(Duration::from_millis(200)) {}
    assert!(laser.is_high());

    drop(sup);
    assert!(!laser.is_high());
    assert!(!strobe.is_high());
}

#[test]
fn missing_clips_do_not_block_startup() {
    let assets = tempfile::tempdir().expect("tempdir");
    let config = config(20, &assets);
    let pwm = MockPwm::new();
    let hardware = Hardware {
        servo: pwm.clone(),
        strobe: MockLine::new(),
        laser: MockLine::new(),
        wing_button: MockButton::new(),
        laser_button: MockButton::new(),
        phrase_button: MockButton::new(),
    };

    let sup: Sup = Supervisor::start(&config, hardware, MockPlayer::new(), RecordingSink::new())
        .expect("starts without clips");
    assert_eq!(sup.machine().mode(), Mode::Stowed);
    assert_eq!(pwm.duties(), vec![5.0, 0.0]);
}

#[test]
fn servo_failure_at_startup_is_fatal() {
    let assets = tempfile::tempdir().expect("tempdir");
    let config = config(20, &assets);
    let pwm = MockPwm::new();
    pwm.set_failing(true);
    let laser = MockLine::new();
    let hardware = Hardware {
        servo: pwm,
        strobe: MockLine::new(),
        laser: laser.clone(),
        wing_button: MockButton::new(),
        laser_button: MockButton::new(),
        phrase_button: MockButton::new(),
    };

    let result: Result<Sup, _> =
        Supervisor::start(&config, hardware, MockPlayer::new(), RecordingSink::new());
    assert!(result.is_err());
    assert!(!laser.is_high());
}
