//! Desktop simulator for the Personal Tutor UI.
//!
//! Runs the real `tutor_core` controller against an SDL2 window via
//! `embedded-graphics-simulator`, with a canned card API so search, result
//! browsing and drawing can be exercised without hardware or network.
//!
//! # Key bindings
//!
//! | Key        | Gamepad          |
//! |------------|------------------|
//! | Arrows     | Joystick         |
//! | A B X Y    | A B X Y buttons  |
//! | Space      | SELECT           |
//! | Enter      | START            |
//! | Q / Esc    | Quit             |
//!
//! Holding the left mouse button touches the panel. A query containing
//! "offline" simulates a network failure.
//!
//! Set `TUTOR_CONFIG` to a device configuration JSON file to override the
//! timing settings.

mod api;

use std::cell::RefCell;
use std::collections::HashSet;
use std::convert::Infallible;
use std::rc::Rc;
use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window, sdl2::Keycode,
};
use log::{error, info, warn};

use tutor_core::app::App;
use tutor_core::config::{DeviceConfig, TimingConfig};
use tutor_core::framebuffer::DisplaySurface;
use tutor_core::image;
use tutor_core::input::{AXIS_CENTER, AXIS_MAX, Button, ControllerState, Gamepad};
use tutor_core::timer::Timer;
use tutor_core::touch::{Calibration, RawTouch, TouchPanel};
use tutor_core::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};

// ---------------------------------------------------------------------------
// Display constants
// ---------------------------------------------------------------------------

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Pause between gamepad polls so wait loops do not spin a core.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

static START_IMAGE: &[u8] = include_bytes!("../../tutor-firmware/assets/start_image.bmp");

// ---------------------------------------------------------------------------
// Shared window state
// ---------------------------------------------------------------------------

/// Window, pixels and the input state collected from SDL events.
struct Sim {
    display: SimulatorDisplay<Rgb565>,
    window: Window,
    keys: HashSet<Keycode>,
    mouse: Option<Point>,
    quit: bool,
    last_frame: Instant,
}

impl Sim {
    fn new() -> Self {
        let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
        Self {
            display: SimulatorDisplay::new(Size::new(
                DISPLAY_WIDTH_PX as u32,
                DISPLAY_HEIGHT_PX as u32,
            )),
            window: Window::new("Personal Tutor Simulator", &output_settings),
            keys: HashSet::new(),
            mouse: None,
            quit: false,
            last_frame: Instant::now() - FRAME_DURATION,
        }
    }

    /// Push pixels to the window and drain SDL events, at most once a frame.
    fn pump(&mut self) {
        if self.last_frame.elapsed() < FRAME_DURATION {
            return;
        }
        self.last_frame = Instant::now();

        // The SDL window is lazily initialized on the first `update()` call.
        // We must call `update()` once before `events()` or it will panic.
        self.window.update(&self.display);
        for event in self.window.events() {
            match event {
                SimulatorEvent::Quit => self.quit = true,
                SimulatorEvent::KeyDown { keycode, .. } => {
                    if keycode == Keycode::Q || keycode == Keycode::Escape {
                        self.quit = true;
                    }
                    self.keys.insert(keycode);
                }
                SimulatorEvent::KeyUp { keycode, .. } => {
                    self.keys.remove(&keycode);
                }
                SimulatorEvent::MouseButtonDown { point, .. } => self.mouse = Some(point),
                SimulatorEvent::MouseMove { point } if self.mouse.is_some() => {
                    self.mouse = Some(point)
                }
                SimulatorEvent::MouseButtonUp { .. } => self.mouse = None,
                _ => {}
            }
        }
    }

    fn controller_state(&self) -> ControllerState {
        const KEYMAP: [(Keycode, Button); 6] = [
            (Keycode::A, Button::A),
            (Keycode::B, Button::B),
            (Keycode::X, Button::X),
            (Keycode::Y, Button::Y),
            (Keycode::Space, Button::Select),
            (Keycode::Return, Button::Start),
        ];

        let mut state = ControllerState::IDLE;
        for (key, button) in KEYMAP {
            if self.keys.contains(&key) {
                state = state.with_button(button);
            }
        }

        let center = AXIS_CENTER as u16;
        let axis = |low: Keycode, high: Keycode| match (self.keys.contains(&low), self.keys.contains(&high)) {
            (true, false) => 0,
            (false, true) => AXIS_MAX,
            _ => center,
        };
        state.with_stick(axis(Keycode::Left, Keycode::Right), axis(Keycode::Down, Keycode::Up))
    }
}

type SharedSim = Rc<RefCell<Sim>>;

#[derive(Debug)]
struct WindowClosed;

// ---------------------------------------------------------------------------
// Device seams
// ---------------------------------------------------------------------------

struct SimGamepad(SharedSim);

impl Gamepad for SimGamepad {
    type Error = WindowClosed;

    async fn read(&mut self) -> Result<ControllerState, Self::Error> {
        std::thread::sleep(POLL_INTERVAL);
        let mut sim = self.0.borrow_mut();
        sim.pump();
        if sim.quit {
            return Err(WindowClosed);
        }
        Ok(sim.controller_state())
    }
}

/// Mouse presses reported in screen pixels; paired with [`identity_calibration`].
struct SimTouch(SharedSim);

impl TouchPanel for SimTouch {
    type Error = Infallible;

    async fn read(&mut self) -> Result<Option<RawTouch>, Self::Error> {
        Ok(self
            .0
            .borrow()
            .mouse
            .map(|p| RawTouch::new(p.x.max(0) as u16, p.y.max(0) as u16, 400)))
    }
}

fn identity_calibration() -> Calibration {
    Calibration {
        x_min: 0,
        x_span: DISPLAY_WIDTH_PX as i32,
        x_output: DISPLAY_WIDTH_PX as i32,
        y_min: 0,
        y_span: DISPLAY_HEIGHT_PX as i32,
        y_output: DISPLAY_HEIGHT_PX as i32,
    }
}

struct SimSurface(SharedSim);

impl OriginDimensions for SimSurface {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH_PX as u32, DISPLAY_HEIGHT_PX as u32)
    }
}

impl DrawTarget for SimSurface {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.0.borrow_mut().display.draw_iter(pixels)
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.0.borrow_mut().display.fill_contiguous(area, colors)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.0.borrow_mut().display.fill_solid(area, color)
    }
}

impl DisplaySurface for SimSurface {
    fn present(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().pump();
        Ok(())
    }
}

struct SimClock {
    start: Instant,
}

impl Timer for SimClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Timing from the JSON file named by `TUTOR_CONFIG`, or the defaults.
fn load_timing() -> TimingConfig {
    let Ok(path) = std::env::var("TUTOR_CONFIG") else {
        return TimingConfig::default();
    };
    let json = match std::fs::read_to_string(&path) {
        Ok(json) => json,
        Err(err) => {
            warn!("Could not read {}: {}", path, err);
            return TimingConfig::default();
        }
    };
    match DeviceConfig::from_json(&json) {
        Ok(config) => {
            if let Err(err) = config.api.validate() {
                warn!("{}: {}", path, err);
            }
            info!("Loaded configuration from {}", path);
            config.timing
        }
        Err(err) => {
            warn!("{}: {}", path, err);
            TimingConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    env_logger::init();
    info!("Starting Personal Tutor simulator");
    info!(
        "Display: {}×{} (scale {}×)",
        DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX, WINDOW_SCALE
    );
    info!("Keys: arrows=stick  A/B/X/Y  Space=SELECT  Enter=START  Q=Quit  mouse=touch");

    let sim = Rc::new(RefCell::new(Sim::new()));

    let mut app = App::new(
        SimGamepad(sim.clone()),
        SimTouch(sim.clone()),
        api::CannedApi,
        SimSurface(sim),
        SimClock {
            start: Instant::now(),
        },
    )
    .with_calibration(identity_calibration())
    .with_timing(load_timing())
    .with_search_url(api::SEARCH_URL);

    match image::decode(START_IMAGE) {
        Ok(splash) => app = app.with_splash(splash),
        Err(err) => warn!("Start image unusable: {}", err),
    }

    let err = embassy_futures::block_on(app.run());
    match err {
        tutor_core::app_state::AppError::Input(_) => info!("Simulator exiting"),
        other => error!("Simulator stopped: {}", other),
    }
}
