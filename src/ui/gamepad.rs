/// Gamepad input tracker using gilrs.
///
/// Button mapping is loaded from config.toml via `load_button_config()`.
/// Default mapping:
///   A / B / D-pad up / stick up  →  Jump (also starts the run)
///   Start                        →  Confirm / Play again
///   Select                       →  Quit
///
/// Only edge-triggered presses matter here: a held button jumps once.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" | "LEFTTRIGGER"  => Some(Btn::L1),
            "R1" | "RB" | "RIGHTTRIGGER" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East  => Some(Btn::B),
            Button::West  => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Action-to-button mapping (loaded from config).
#[derive(Debug, PartialEq)]
struct ActionMap {
    jump: Vec<Btn>,
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            jump:    vec![Btn::A, Btn::B],
            confirm: vec![Btn::Start],
            cancel:  vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons pressed since the last `update`, indexed by `Btn`.
    just_pressed: [bool; BTN_COUNT],
    dpad_up: bool,

    stick_up_held: bool,
    stick_up: bool,
    stick_y: f32,

    action_map: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                log::warn!("gamepad support unavailable: {e}");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            just_pressed: [false; BTN_COUNT],
            dpad_up: false,
            stick_up_held: false,
            stick_up: false,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Empty or unknown lists keep the defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let map = &mut self.action_map;
        let j = parse_list(&cfg.jump);
        if !j.is_empty() { map.jump = j; }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { map.cancel = ca; }
    }

    pub fn update(&mut self) {
        self.just_pressed = [false; BTN_COUNT];
        self.dpad_up = false;
        self.stick_up = false;

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(Button::DPadUp, _) => {
                    self.connected = true;
                    self.dpad_up = true;
                }
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(b) = Btn::from_gilrs(btn) {
                        self.just_pressed[b as usize] = true;
                    }
                }
                EventType::AxisChanged(Axis::LeftStickY, value, _) => {
                    self.connected = true;
                    self.stick_y = value;
                }
                EventType::Connected => {
                    log::info!("gamepad connected");
                    self.connected = true;
                }
                EventType::Disconnected => {
                    log::info!("gamepad disconnected");
                    self.connected = false;
                    self.stick_y = 0.0;
                }
                _ => {}
            }
        }

        // Stick flick up counts once per crossing of the deadzone
        let held = self.stick_y > STICK_DEADZONE;
        self.stick_up = held && !self.stick_up_held;
        self.stick_up_held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.just_pressed[b as usize])
    }

    pub fn jump_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.jump) || self.dpad_up || self.stick_up
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }
}
