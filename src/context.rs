//! The process-wide context behind the emulated API's implicit globals.
//!
//! Every `al_*` entry point resolves its implicit state (current display,
//! target bitmap, creation defaults, blender, transform, installed
//! subsystems) through `with_context`. The context is created on first use
//! and lives until the owning thread exits. The emulated API is
//! single-threaded-caller-only, so each thread sees its own context; timer
//! callbacks only ever touch their shared tick counters.

use crate::audio::AudioContext;
use crate::backend::{Backend, DrawCommand, WindowId};
use crate::bitmap::BitmapContext;
use crate::blender::Blender;
use crate::display::DisplayContext;
use crate::joystick::JoystickContext;
use crate::keyboard::KeyboardContext;
use crate::mouse::MouseContext;
use crate::timer::TimerContext;
use crate::transform::Transform;
use log::warn;
use std::cell::RefCell;

#[derive(Default)]
pub struct Context {
    pub backend: Option<Box<dyn Backend>>,
    pub display: DisplayContext,
    pub bitmap: BitmapContext,
    pub blender: Blender,
    /// Lazily set to identity by the first transform query.
    pub transform: Option<Transform>,
    pub keyboard: KeyboardContext,
    pub mouse: MouseContext,
    pub joystick: JoystickContext,
    pub audio: AudioContext,
    pub timer: TimerContext,
    pub primitives_installed: bool,
}

thread_local! {
    static CONTEXT: RefCell<Context> = RefCell::new(Context::default());
}

pub fn with_context<R>(f: impl FnOnce(&mut Context) -> R) -> R {
    CONTEXT.with(|ctx| f(&mut ctx.borrow_mut()))
}

impl Context {
    pub fn current_window(&self) -> Option<WindowId> {
        let display = self.display.current?;
        self.display.displays.get(display.0).map(|data| data.window)
    }

    /// Issues a draw command against the current display's active target.
    /// Without a current display this is a no-op.
    pub fn submit(&mut self, command: DrawCommand) {
        let window = match self.current_window() {
            Some(window) => window,
            None => return,
        };
        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.draw(window, command) {
                warn!("Draw call failed: {}", err);
            }
        }
    }
}
