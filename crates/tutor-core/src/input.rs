//! Gamepad input: button bitmask, joystick axes and release waits
//!
//! The controller is a Seesaw-based joystick board. Buttons are wired as
//! pull-up inputs (a cleared bit means pressed) and both axes are read from
//! 10-bit ADC channels and inverted so that up/right read high.

use log::{debug, warn};

/// Full-scale reading of a joystick axis
pub const AXIS_MAX: u16 = 1023;

/// Nominal resting position of both axes after inversion
pub const AXIS_CENTER: i32 = 500;

/// Any deflection beyond this counts as stick movement
pub const MOVE_THRESHOLD: i32 = 100;

/// Horizontal deflection needed to step the keyboard cursor a column
pub const HORIZONTAL_STEP_THRESHOLD: i32 = 300;

/// Vertical deflection needed to step a cursor a row
pub const VERTICAL_STEP_THRESHOLD: i32 = 200;

/// The stick counts as released once both axes are back inside this band
pub const CENTER_TOLERANCE: i32 = 200;

/// Polls before a release wait gives up and logs a warning
pub const DEFAULT_POLL_LIMIT: u32 = 20_000;

/// Seesaw ADC pin carrying the horizontal axis
pub const JOYSTICK_X_PIN: u8 = 14;

/// Seesaw ADC pin carrying the vertical axis
pub const JOYSTICK_Y_PIN: u8 = 15;

/// Physical buttons on the gamepad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Select,
    B,
    Y,
    A,
    X,
    Start,
}

impl Button {
    pub const ALL: [Button; 6] = [
        Button::X,
        Button::Y,
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
    ];

    /// Seesaw GPIO pin the button is wired to
    pub const fn pin(self) -> u8 {
        match self {
            Button::Select => 0,
            Button::B => 1,
            Button::Y => 2,
            Button::A => 5,
            Button::X => 6,
            Button::Start => 16,
        }
    }

    pub const fn mask(self) -> u32 {
        1 << self.pin()
    }
}

/// GPIO mask covering every button pin
pub const BUTTON_MASK: u32 = Button::X.mask()
    | Button::Y.mask()
    | Button::A.mask()
    | Button::B.mask()
    | Button::Select.mask()
    | Button::Start.mask();

/// One snapshot of the gamepad, re-read every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pressed: u32,
    pub x: u16,
    pub y: u16,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::IDLE
    }
}

impl ControllerState {
    /// No buttons held and the stick at rest
    pub const IDLE: Self = Self {
        pressed: 0,
        x: AXIS_CENTER as u16,
        y: AXIS_CENTER as u16,
    };

    /// Build a snapshot from raw hardware readings.
    ///
    /// `levels` is the GPIO bulk read (pull-ups, so a low bit is a pressed
    /// button). `raw_x`/`raw_y` are the ADC readings before inversion.
    pub fn from_raw(levels: u32, raw_x: u16, raw_y: u16) -> Self {
        Self {
            pressed: !levels & BUTTON_MASK,
            x: AXIS_MAX - raw_x.min(AXIS_MAX),
            y: AXIS_MAX - raw_y.min(AXIS_MAX),
        }
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.pressed |= button.mask();
        self
    }

    pub fn with_stick(mut self, x: u16, y: u16) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn is_pressed(&self, button: Button) -> bool {
        self.pressed & button.mask() != 0
    }

    /// Bitmask of pressed buttons, one bit per GPIO pin
    pub fn pressed_mask(&self) -> u32 {
        self.pressed
    }

    /// Horizontal deflection from center, positive to the right
    pub fn dx(&self) -> i32 {
        self.x as i32 - AXIS_CENTER
    }

    /// Vertical deflection from center, positive upwards
    pub fn dy(&self) -> i32 {
        self.y as i32 - AXIS_CENTER
    }

    /// Either axis is deflected past the movement threshold
    pub fn stick_moved(&self) -> bool {
        self.dx().abs() > MOVE_THRESHOLD || self.dy().abs() > MOVE_THRESHOLD
    }

    /// Only the vertical axis is considered
    pub fn stick_moved_vertically(&self) -> bool {
        self.dy().abs() > MOVE_THRESHOLD
    }

    pub fn stick_centered(&self) -> bool {
        self.dx().abs() <= CENTER_TOLERANCE && self.dy().abs() <= CENTER_TOLERANCE
    }

    /// Cursor step for a grid where row 0 is the top: `(columns, rows)`.
    pub fn grid_step(&self) -> (i32, i32) {
        let column = if self.dx() > HORIZONTAL_STEP_THRESHOLD {
            1
        } else if self.dx() < -HORIZONTAL_STEP_THRESHOLD {
            -1
        } else {
            0
        };

        (column, self.row_step())
    }

    /// Row step for a top-to-bottom list: pushing up moves to the previous row.
    pub fn row_step(&self) -> i32 {
        if self.dy() > VERTICAL_STEP_THRESHOLD {
            -1
        } else if self.dy() < -VERTICAL_STEP_THRESHOLD {
            1
        } else {
            0
        }
    }
}

/// Source of controller snapshots
#[allow(async_fn_in_trait)]
pub trait Gamepad {
    type Error: core::fmt::Debug;

    async fn read(&mut self) -> Result<ControllerState, Self::Error>;
}

/// How a release wait finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Released,
    /// The poll limit ran out with the control still held
    GaveUp,
}

/// Wait until both axes are back inside the center band.
///
/// `last` is the snapshot that triggered the move; it is checked before
/// polling again.
pub async fn wait_stick_centered<G: Gamepad>(
    gamepad: &mut G,
    last: ControllerState,
    poll_limit: u32,
) -> Result<WaitOutcome, G::Error> {
    if last.stick_centered() {
        return Ok(WaitOutcome::Released);
    }

    for _ in 0..poll_limit {
        if gamepad.read().await?.stick_centered() {
            return Ok(WaitOutcome::Released);
        }
    }

    warn!("Joystick still deflected after {} polls", poll_limit);
    Ok(WaitOutcome::GaveUp)
}

/// Wait until `button` reads as released.
pub async fn wait_button_release<G: Gamepad>(
    gamepad: &mut G,
    button: Button,
    poll_limit: u32,
) -> Result<WaitOutcome, G::Error> {
    for polls in 0..poll_limit {
        if !gamepad.read().await?.is_pressed(button) {
            debug!("{:?} released after {} polls", button, polls + 1);
            return Ok(WaitOutcome::Released);
        }
    }

    warn!("{:?} still held after {} polls", button, poll_limit);
    Ok(WaitOutcome::GaveUp)
}
