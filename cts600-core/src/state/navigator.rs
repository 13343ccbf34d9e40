//! Button planning
//!
//! The navigator sees the display once per cycle through [`Navigator::observe`]
//! and picks the buttons for the next exchange through [`Navigator::plan`].
//!
//! Press policy: at most one button per exchange. A press is followed by an
//! idle poll, and no further press is planned until the display (text or
//! LED) changes, so presses are never chorded or repeated blindly.
//!
//! While idle on the top screen with nothing to change, the navigator
//! periodically walks the SHOW DATA menu and keeps the values it reads.

use heapless::Vec;

use cts600_protocol::display::{DisplayFrame, LedState};
use cts600_protocol::keys::{ButtonVector, Key};

use super::events::NavEvent;
use super::machine::{Goal, InitPhase, NavState, ScanPhase, LANGUAGE_MENU_DEPTH};
use crate::climate::{Mode, TargetConfiguration};
use crate::screen::{Readings, Screen};

/// Unchanged cycles after which a press counts as having had no effect
pub const SETTLE_CYCLES: u8 = 2;

/// Smallest usable stall threshold
///
/// A press that has no effect leaves the display unchanged for its own
/// cycle, the release poll and the settle window.
pub const MIN_STUCK_THRESHOLD: u8 = SETTLE_CYCLES + 1;

/// Handler passes allowed per plan; a state change can cascade this far
const MAX_PASSES: usize = 4;

/// What the navigator last saw
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MenuState {
    /// Last classification
    pub screen: Screen,
    /// Last display, text and LED
    pub last_frame: Option<DisplayFrame>,
    /// Cycles since the display last changed
    pub stalled: u8,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            screen: Screen::Unrecognized,
            last_frame: None,
            stalled: 0,
        }
    }
}

impl MenuState {
    pub fn led(&self) -> LedState {
        self.last_frame.as_ref().map(|f| f.led).unwrap_or_default()
    }
}

/// A press waiting to show on the display
#[derive(Debug, Clone, Copy)]
struct Press {
    key: Key,
    unchanged: u8,
}

/// Result of a press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Changed,
    NoEffect,
}

/// Result of one handler pass
enum Step {
    Press(Key),
    Wait,
    Replan,
}

/// Menu navigator
#[derive(Debug)]
pub struct Navigator {
    state: NavState,
    menu: MenuState,
    stuck_threshold: u8,
    /// Language option to commit during startup
    language: &'static str,
    pending: Option<Press>,
    release: bool,
    link_lost: bool,
    events: Vec<NavEvent, 8>,
    /// Idle cycles between SHOW DATA scans, zero when disabled
    scan_every: u16,
    since_scan: u16,
    readings: Readings,
}

impl Navigator {
    /// `stuck_threshold` is raised to [`MIN_STUCK_THRESHOLD`]
    pub fn new(stuck_threshold: u8, language: &'static str) -> Self {
        Self {
            state: NavState::default(),
            menu: MenuState::default(),
            stuck_threshold: stuck_threshold.max(MIN_STUCK_THRESHOLD),
            language,
            pending: None,
            release: false,
            link_lost: false,
            events: Vec::new(),
            scan_every: 0,
            since_scan: 0,
            readings: Readings::default(),
        }
    }

    /// Scan SHOW DATA every `every` idle cycles, starting with the first
    pub fn with_data_scan(mut self, every: u16) -> Self {
        self.scan_every = every;
        self.since_scan = every;
        self
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    /// Values from the last SHOW DATA scans
    pub fn readings(&self) -> &Readings {
        &self.readings
    }

    /// Key whose effect has not shown on the display yet
    pub fn awaiting(&self) -> Option<Key> {
        self.pending.map(|press| press.key)
    }

    pub fn stuck_threshold(&self) -> u8 {
        self.stuck_threshold
    }

    pub fn is_initialized(&self) -> bool {
        !self.state.is_initializing()
    }

    /// Whether a manual key would be sent by the next plan
    pub fn accepts_manual(&self) -> bool {
        self.state == NavState::Idle
            && !self.release
            && self.pending.is_none()
            && self.menu.last_frame.is_some()
    }

    /// Record that an exchange ran out of attempts
    ///
    /// The next observed display restarts from a known position.
    pub fn link_lost(&mut self) {
        self.link_lost = true;
    }

    /// Events since the last call
    pub fn take_events(&mut self) -> Vec<NavEvent, 8> {
        core::mem::take(&mut self.events)
    }

    /// Buttons for the next exchange
    ///
    /// `manual` is a caller key press; it is only honoured while idle.
    pub fn plan(&mut self, target: &TargetConfiguration, manual: Option<Key>) -> ButtonVector {
        if self.release {
            self.release = false;
            return ButtonVector::IDLE;
        }
        if self.pending.is_some() || self.menu.last_frame.is_none() {
            return ButtonVector::IDLE;
        }

        let mut manual = manual;
        for _ in 0..MAX_PASSES {
            let step = match self.state {
                NavState::Initializing(phase) => self.plan_init(phase),
                NavState::Idle => self.plan_idle(target, manual.take()),
                NavState::Navigating(goal) => self.plan_goal(goal, target),
                NavState::Resynchronizing => Step::Press(Key::Esc),
                NavState::Scanning(phase) => self.plan_scan(phase),
            };
            match step {
                Step::Press(key) => {
                    self.pending = Some(Press { key, unchanged: 0 });
                    self.release = true;
                    return ButtonVector::single(key);
                }
                Step::Wait => break,
                Step::Replan => {}
            }
        }
        ButtonVector::IDLE
    }

    /// Take in the display read back in this cycle
    pub fn observe(&mut self, frame: DisplayFrame, screen: Screen) {
        let changed = self.menu.last_frame.as_ref() != Some(&frame);
        self.menu.screen = screen;
        self.menu.last_frame = Some(frame);

        if self.link_lost {
            self.link_lost = false;
            self.pending = None;
            self.release = false;
            self.menu.stalled = 0;
            self.apply(NavEvent::LinkRestored);
            return;
        }

        let outcome = self.settle(changed);

        match self.state {
            NavState::Idle => self.since_scan = self.since_scan.saturating_add(1),
            NavState::Scanning(_) => self.readings.record(&screen),
            _ => {}
        }

        if changed || self.state == NavState::Idle {
            self.menu.stalled = 0;
        } else {
            self.menu.stalled = self.menu.stalled.saturating_add(1);
        }

        match self.state {
            NavState::Resynchronizing if screen.is_top() => {
                self.pending = None;
                self.apply(NavEvent::BaselineConfirmed);
            }
            NavState::Initializing(phase) => {
                if let Some(outcome) = outcome {
                    self.advance_init(phase, outcome, screen);
                }
            }
            // A press that changes nothing means the list ended
            NavState::Scanning(ScanPhase::Enter | ScanPhase::Read) => {
                if outcome == Some(Outcome::NoEffect) {
                    self.set_scan(ScanPhase::Leave);
                }
            }
            _ => {}
        }

        if self.menu.stalled > self.stuck_threshold {
            self.menu.stalled = 0;
            self.pending = None;
            if self.state.is_initializing() {
                self.apply(NavEvent::InitAbandoned);
            } else {
                self.apply(NavEvent::NavigationStuck);
            }
        }
    }

    /// Resolve the pending press, if the display has answered it
    ///
    /// While navigating or resynchronizing an unanswered press stays
    /// pending until the stall threshold clears it.
    fn settle(&mut self, changed: bool) -> Option<Outcome> {
        let press = self.pending.as_mut()?;
        if changed {
            self.pending = None;
            return Some(Outcome::Changed);
        }

        press.unchanged += 1;
        let expires = matches!(
            self.state,
            NavState::Initializing(_) | NavState::Idle | NavState::Scanning(_)
        );
        if expires && press.unchanged >= SETTLE_CYCLES {
            #[cfg(feature = "defmt")]
            defmt::debug!("{} had no effect", press.key);
            self.pending = None;
            return Some(Outcome::NoEffect);
        }
        None
    }

    fn apply(&mut self, event: NavEvent) {
        let next = self.state.transition(event);

        #[cfg(feature = "defmt")]
        {
            if event.is_warning() {
                defmt::warn!("navigator: {} in {}", event, self.state);
            } else {
                defmt::info!("navigator: {} -> {}", event, next);
            }
        }

        if next == NavState::Resynchronizing {
            self.menu.screen = Screen::Unrecognized;
            self.menu.stalled = 0;
            self.pending = None;
        }
        self.state = next;
        let _ = self.events.push(event);
    }

    fn set_phase(&mut self, phase: InitPhase) {
        #[cfg(feature = "defmt")]
        defmt::debug!("init phase {}", phase);
        self.state = NavState::Initializing(phase);
    }

    fn set_scan(&mut self, phase: ScanPhase) {
        #[cfg(feature = "defmt")]
        defmt::debug!("scan phase {}", phase);
        self.state = NavState::Scanning(phase);
    }

    fn scan_due(&self) -> bool {
        self.scan_every > 0 && self.since_scan >= self.scan_every
    }

    fn plan_init(&mut self, phase: InitPhase) -> Step {
        match phase {
            InitPhase::ReturnToTop => Step::Press(Key::Esc),
            InitPhase::Descend(_) => Step::Press(Key::Down),
            InitPhase::OpenPrompt | InitPhase::Commit => Step::Press(Key::Enter),
            InitPhase::SearchUp | InitPhase::SearchDown => {
                if self.menu.screen == Screen::LanguagePrompt(self.language) {
                    self.set_phase(InitPhase::Commit);
                    Step::Press(Key::Enter)
                } else if phase == InitPhase::SearchUp {
                    Step::Press(Key::Up)
                } else {
                    Step::Press(Key::Down)
                }
            }
        }
    }

    fn advance_init(&mut self, phase: InitPhase, outcome: Outcome, screen: Screen) {
        let on_prompt = matches!(screen, Screen::LanguagePrompt(_));
        match (phase, outcome) {
            (InitPhase::ReturnToTop, Outcome::Changed) => {}
            (InitPhase::ReturnToTop, Outcome::NoEffect) => {
                self.set_phase(InitPhase::Descend(LANGUAGE_MENU_DEPTH))
            }
            (InitPhase::Descend(n), _) if n > 1 => self.set_phase(InitPhase::Descend(n - 1)),
            (InitPhase::Descend(_), _) => self.set_phase(InitPhase::OpenPrompt),
            (InitPhase::OpenPrompt, _) if on_prompt => self.set_phase(InitPhase::SearchUp),
            (InitPhase::SearchUp | InitPhase::SearchDown, _) if !on_prompt => {
                self.apply(NavEvent::InitAbandoned)
            }
            (InitPhase::SearchUp, Outcome::Changed) | (InitPhase::SearchDown, Outcome::Changed) => {}
            (InitPhase::SearchUp, Outcome::NoEffect) => self.set_phase(InitPhase::SearchDown),
            (InitPhase::Commit, _) => self.apply(NavEvent::InitComplete),
            // Prompt never opened, or English not offered
            _ => self.apply(NavEvent::InitAbandoned),
        }
    }

    fn plan_idle(&mut self, target: &TargetConfiguration, manual: Option<Key>) -> Step {
        if let Some(key) = manual {
            return Step::Press(key);
        }
        match self.menu.screen {
            Screen::TopStatus { .. } => match self.first_difference(target) {
                Some(goal) => {
                    self.apply(NavEvent::TargetDiverged(goal));
                    Step::Replan
                }
                None if self.scan_due() => {
                    self.since_scan = 0;
                    self.apply(NavEvent::ScanDue);
                    Step::Replan
                }
                None => Step::Wait,
            },
            // Targets and scans both start from the top screen
            _ if !target.is_empty() || self.scan_due() => {
                self.apply(NavEvent::LostPosition);
                Step::Replan
            }
            _ => Step::Wait,
        }
    }

    fn plan_goal(&mut self, goal: Goal, target: &TargetConfiguration) -> Step {
        match self.menu.screen {
            Screen::TopStatus { .. } => {
                if self.satisfied(goal, target) {
                    self.apply(NavEvent::GoalReached(goal));
                    return Step::Replan;
                }
                match goal {
                    Goal::Power if target.mode.map_or(true, Mode::is_on) => Step::Press(Key::On),
                    Goal::Power => Step::Press(Key::Off),
                    _ => Step::Press(Key::Enter),
                }
            }
            Screen::SetpointMenu(value) => match (goal, target.setpoint) {
                (Goal::Setpoint, Some(want)) => Step::Press(adjust(value, want)),
                (Goal::Mode | Goal::Fan, _) => Step::Press(Key::Enter),
                _ => Step::Press(Key::Esc),
            },
            Screen::ModeMenu(mode) => {
                let want = target.mode.and_then(Mode::menu_index);
                match (goal, want, mode.menu_index()) {
                    // UP moves toward the top of the list
                    (Goal::Mode, Some(want), Some(have)) => Step::Press(adjust(want, have)),
                    (Goal::Fan, _, _) => Step::Press(Key::Enter),
                    _ => Step::Press(Key::Esc),
                }
            }
            Screen::FanMenu(level) => match (goal, target.fan) {
                (Goal::Fan, Some(want)) => Step::Press(adjust(level, want)),
                _ => Step::Press(Key::Esc),
            },
            Screen::LanguagePrompt(_) | Screen::ShowDataEntry => Step::Press(Key::Esc),
            Screen::DataStatus(_) | Screen::DataTemperature(_) | Screen::DataFlow(_) => {
                Step::Press(Key::Esc)
            }
            Screen::Unrecognized => Step::Wait,
        }
    }

    fn plan_scan(&mut self, phase: ScanPhase) -> Step {
        let screen = self.menu.screen;
        match phase {
            ScanPhase::Enter => match screen {
                Screen::TopStatus { .. } => Step::Press(Key::Up),
                Screen::ShowDataEntry => Step::Press(Key::Enter),
                _ if screen.is_data() => {
                    self.set_scan(ScanPhase::Read);
                    Step::Replan
                }
                // Not the menu we expected above the top screen
                _ => {
                    self.set_scan(ScanPhase::Leave);
                    Step::Replan
                }
            },
            ScanPhase::Read => match screen {
                Screen::TopStatus { .. } => self.finish_scan(),
                _ => Step::Press(Key::Down),
            },
            ScanPhase::Leave => match screen {
                Screen::TopStatus { .. } => self.finish_scan(),
                _ => Step::Press(Key::Esc),
            },
        }
    }

    fn finish_scan(&mut self) -> Step {
        self.readings.scans = self.readings.scans.saturating_add(1);
        self.apply(NavEvent::ScanFinished);
        Step::Replan
    }

    fn first_difference(&self, target: &TargetConfiguration) -> Option<Goal> {
        Goal::ORDER
            .into_iter()
            .find(|goal| !self.satisfied(*goal, target))
    }

    /// Whether the top screen shows `goal` at its target
    fn satisfied(&self, goal: Goal, target: &TargetConfiguration) -> bool {
        let Screen::TopStatus { mode, setpoint, fan } = self.menu.screen else {
            return false;
        };
        match goal {
            Goal::Power => match (target.mode, self.menu.led().is_powered()) {
                (Some(want), Some(on)) => want.is_on() == on,
                _ => true,
            },
            Goal::Setpoint => target.setpoint.map_or(true, |want| want == setpoint),
            Goal::Mode => match target.mode {
                Some(want) if want.menu_index().is_some() => want == mode,
                _ => true,
            },
            Goal::Fan => target.fan.map_or(true, |want| want == fan),
        }
    }
}

/// UP to raise, DOWN to lower, ENTER once equal
fn adjust(have: u8, want: u8) -> Key {
    if have < want {
        Key::Up
    } else if have > want {
        Key::Down
    } else {
        Key::Enter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{classify, ENGLISH};
    use cts600_protocol::display::{DisplayCell, DisplayLine};

    fn frame(rows: &[&str], led: LedState) -> DisplayFrame {
        DisplayFrame::from_text(rows, led)
    }

    fn top(setpoint: u8) -> (DisplayFrame, Screen) {
        let mut row: heapless::String<16> = heapless::String::new();
        core::fmt::write(&mut row, format_args!(">2< {}°C", setpoint)).unwrap();
        let frame = frame(&["COOL", row.as_str()], LedState::On);
        let screen = classify(&frame, &ENGLISH);
        (frame, screen)
    }

    /// Navigator already past startup, sitting on the top screen
    fn idle(setpoint: u8) -> Navigator {
        let mut nav = Navigator::new(6, "ENGLISH");
        nav.state = NavState::Idle;
        let (f, s) = top(setpoint);
        nav.observe(f, s);
        nav
    }

    fn target_setpoint(setpoint: u8) -> TargetConfiguration {
        TargetConfiguration {
            setpoint: Some(setpoint),
            ..Default::default()
        }
    }

    #[test]
    fn test_nothing_before_first_frame() {
        let mut nav = Navigator::new(6, "ENGLISH");
        assert_eq!(nav.plan(&TargetConfiguration::default(), None), ButtonVector::IDLE);
        assert!(!nav.is_initialized());
    }

    #[test]
    fn test_idle_when_target_matches() {
        let mut nav = idle(21);
        let target = TargetConfiguration {
            mode: Some(Mode::Cool),
            setpoint: Some(21),
            fan: Some(2),
        };
        for _ in 0..4 {
            assert_eq!(nav.plan(&target, None), ButtonVector::IDLE);
            let (f, s) = top(21);
            nav.observe(f, s);
        }
        assert_eq!(nav.state(), NavState::Idle);
        assert!(nav.take_events().is_empty());
    }

    #[test]
    fn test_divergence_enters_setpoint_menu() {
        let mut nav = idle(21);
        let buttons = nav.plan(&target_setpoint(23), None);
        assert_eq!(buttons, ButtonVector::single(Key::Enter));
        assert_eq!(nav.state(), NavState::Navigating(Goal::Setpoint));
        assert_eq!(
            nav.take_events().as_slice(),
            &[NavEvent::TargetDiverged(Goal::Setpoint)]
        );
    }

    #[test]
    fn test_press_is_released_and_waits_for_change() {
        let mut nav = idle(21);
        let target = target_setpoint(23);
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Enter));

        // Release poll, then nothing until the display moves
        assert_eq!(nav.plan(&target, None), ButtonVector::IDLE);
        let (f, s) = top(21);
        nav.observe(f, s);
        assert_eq!(nav.plan(&target, None), ButtonVector::IDLE);
    }

    #[test]
    fn test_setpoint_menu_adjusts() {
        let mut nav = idle(21);
        let target = target_setpoint(23);
        nav.plan(&target, None);
        nav.plan(&target, None);

        let menu = DisplayFrame::new(
            [
                DisplayLine::from_cells(
                    "THERMOST"
                        .chars()
                        .map(|ch| DisplayCell { ch, blink: false }),
                ),
                DisplayLine::from_cells("21°C".chars().map(|ch| DisplayCell {
                    ch,
                    blink: ch.is_ascii_digit(),
                })),
            ],
            LedState::On,
        );
        let screen = classify(&menu, &ENGLISH);
        assert_eq!(screen, Screen::SetpointMenu(21));
        nav.observe(menu, screen);
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Up));
    }

    #[test]
    fn test_mode_menu_direction() {
        assert_eq!(adjust(1, 0), Key::Down);
        // Auto is above Heat, so Heat -> Auto presses UP
        let want = Mode::Auto.menu_index().unwrap();
        let have = Mode::Heat.menu_index().unwrap();
        assert_eq!(adjust(want, have), Key::Up);
    }

    #[test]
    fn test_power_goal_uses_dedicated_keys() {
        let mut nav = Navigator::new(6, "ENGLISH");
        nav.state = NavState::Idle;
        let f = frame(&["COOL", ">2< 21°C"], LedState::Off);
        let s = classify(&f, &ENGLISH);
        nav.observe(f, s);

        let target = TargetConfiguration {
            mode: Some(Mode::Cool),
            ..Default::default()
        };
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::On));
        assert_eq!(nav.state(), NavState::Navigating(Goal::Power));
    }

    #[test]
    fn test_manual_key_only_when_idle() {
        let mut nav = idle(21);
        assert!(nav.accepts_manual());
        assert_eq!(
            nav.plan(&TargetConfiguration::default(), Some(Key::Off)),
            ButtonVector::single(Key::Off)
        );
        assert!(!nav.accepts_manual());
    }

    #[test]
    fn test_stall_triggers_resync() {
        let mut nav = idle(21);
        let target = target_setpoint(23);
        nav.plan(&target, None);

        // ENTER never changes the display
        for _ in 0..=6 {
            nav.plan(&target, None);
            let (f, s) = top(21);
            nav.observe(f, s);
        }
        assert_eq!(nav.state(), NavState::Resynchronizing);
        assert!(nav.take_events().contains(&NavEvent::NavigationStuck));
        assert_eq!(nav.menu().screen, Screen::Unrecognized);
    }

    #[test]
    fn test_link_restored_resyncs() {
        let mut nav = idle(21);
        nav.link_lost();
        let (f, s) = top(21);
        nav.observe(f, s);
        assert_eq!(nav.state(), NavState::Resynchronizing);

        assert_eq!(
            nav.plan(&TargetConfiguration::default(), None),
            ButtonVector::single(Key::Esc)
        );
        let (f, s) = top(22);
        nav.observe(f, s);
        assert_eq!(nav.state(), NavState::Idle);
    }

    #[test]
    fn test_off_menu_with_target_loses_position() {
        let mut nav = Navigator::new(6, "ENGLISH");
        nav.state = NavState::Idle;
        let f = frame(&["ALARMS", ""], LedState::On);
        nav.observe(f, Screen::Unrecognized);

        assert_eq!(nav.plan(&target_setpoint(21), None), ButtonVector::single(Key::Esc));
        assert_eq!(nav.state(), NavState::Resynchronizing);
    }

    #[test]
    fn test_due_scan_off_top_resyncs() {
        let mut nav = Navigator::new(6, "ENGLISH").with_data_scan(10);
        nav.state = NavState::Idle;
        let f = frame(&["ALARMS", ""], LedState::On);
        nav.observe(f, Screen::Unrecognized);

        assert_eq!(
            nav.plan(&TargetConfiguration::default(), None),
            ButtonVector::single(Key::Esc)
        );
        assert_eq!(nav.state(), NavState::Resynchronizing);
    }

    #[test]
    fn test_stuck_threshold_floor() {
        assert_eq!(Navigator::new(0, "ENGLISH").stuck_threshold(), MIN_STUCK_THRESHOLD);
        assert_eq!(Navigator::new(1, "ENGLISH").stuck_threshold(), MIN_STUCK_THRESHOLD);
        assert_eq!(Navigator::new(9, "ENGLISH").stuck_threshold(), 9);
    }

    #[test]
    fn test_low_threshold_survives_no_effect_press() {
        let mut nav = Navigator::new(1, "ENGLISH");
        let target = TargetConfiguration::default();
        let (f, s) = top(21);
        nav.observe(f, s);

        // ESC on the top screen changes nothing
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Esc));
        assert_eq!(nav.awaiting(), Some(Key::Esc));
        for _ in 0..SETTLE_CYCLES {
            nav.plan(&target, None);
            let (f, s) = top(21);
            nav.observe(f, s);
        }
        assert_eq!(nav.awaiting(), None);
        assert_eq!(
            nav.state(),
            NavState::Initializing(InitPhase::Descend(LANGUAGE_MENU_DEPTH))
        );
        assert!(nav.take_events().is_empty());
    }

    #[test]
    fn test_scan_walks_show_data() {
        let mut nav = idle(21).with_data_scan(10);
        let target = TargetConfiguration::default();

        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Up));
        assert_eq!(nav.state(), NavState::Scanning(ScanPhase::Enter));
        assert_eq!(nav.take_events().as_slice(), &[NavEvent::ScanDue]);

        let entry = frame(&["SHOW", "DATA"], LedState::On);
        nav.observe(entry, Screen::ShowDataEntry);
        nav.plan(&target, None);
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Enter));

        let room = frame(&["ROOM", "T15 23°C"], LedState::On);
        let screen = classify(&room, &ENGLISH);
        nav.observe(room.clone(), screen);
        nav.plan(&target, None);
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Down));
        assert_eq!(nav.state(), NavState::Scanning(ScanPhase::Read));
        assert_eq!(nav.readings().temperature(15), Some(23));

        // Last entry: DOWN changes nothing, so leave
        nav.observe(room.clone(), screen);
        assert_eq!(nav.plan(&target, None), ButtonVector::IDLE);
        nav.observe(room.clone(), screen);
        assert_eq!(nav.state(), NavState::Scanning(ScanPhase::Leave));
        assert_eq!(nav.plan(&target, None), ButtonVector::single(Key::Esc));

        let (f, s) = top(21);
        nav.observe(f, s);
        nav.plan(&target, None);
        assert_eq!(nav.plan(&target, None), ButtonVector::IDLE);
        assert_eq!(nav.state(), NavState::Idle);
        assert!(nav.take_events().contains(&NavEvent::ScanFinished));
        assert_eq!(nav.readings().scans, 1);
    }

    #[test]
    fn test_scan_waits_for_targets() {
        let mut nav = idle(21).with_data_scan(10);
        assert_eq!(
            nav.plan(&target_setpoint(22), None),
            ButtonVector::single(Key::Enter)
        );
        assert_eq!(nav.state(), NavState::Navigating(Goal::Setpoint));
    }
}
