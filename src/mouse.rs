//! Mouse snapshots. Position and buttons come from the backend; the wheel
//! axes are whatever was last stored with `al_set_mouse_z`/`al_set_mouse_w`.

use crate::backend::NativeMouseState;
use crate::context::with_context;
use crate::display::Display;
use crate::events::EventSource;
use bitfield::bitfield;
use log::debug;

pub const ALLEGRO_MOUSE_MAX_EXTRA_AXES: i32 = 10;

pub const ALLEGRO_MOUSE_BUTTON_1: i32 = 1;
pub const ALLEGRO_MOUSE_BUTTON_2: i32 = 2;
pub const ALLEGRO_MOUSE_BUTTON_3: i32 = 3;
pub const ALLEGRO_MOUSE_BUTTON_4: i32 = 4;
pub const ALLEGRO_MOUSE_BUTTON_5: i32 = 5;
pub const ALLEGRO_MOUSE_BUTTON_6: i32 = 6;
pub const ALLEGRO_MOUSE_BUTTON_7: i32 = 7;
pub const ALLEGRO_MOUSE_BUTTON_8: i32 = 8;

const NUM_BUTTONS: i32 = 3;
const NUM_AXES: i32 = 2;

bitfield! {
    /// Button `n` lives at bit `n - 1`.
    #[derive(Clone, Copy, Default)]
    struct MouseButtons(u32);
    impl Debug;

    left, set_left: 0;
    right, set_right: 1;
    middle, set_middle: 2;
    x1, set_x1: 3;
    x2, set_x2: 4;
}

impl From<NativeMouseState> for MouseButtons {
    fn from(native: NativeMouseState) -> MouseButtons {
        let mut buttons = MouseButtons(0);
        buttons.set_left(native.left);
        buttons.set_right(native.right);
        buttons.set_middle(native.middle);
        buttons.set_x1(native.x1);
        buttons.set_x2(native.x2);
        buttons
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MouseState {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
    pub pressure: i32,
    pub button: i32,
    pub buttons: i32,
    pub display: Option<Display>,
}

#[derive(Debug, Default)]
pub struct MouseContext {
    pub installed: bool,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub w: i32,
}

pub fn al_install_mouse() -> bool {
    with_context(|ctx| {
        if !ctx.mouse.installed {
            debug!("Mouse installed");
            ctx.mouse = MouseContext {
                installed: true,
                ..MouseContext::default()
            };
        }
        true
    })
}

pub fn al_uninstall_mouse() {
    with_context(|ctx| ctx.mouse = MouseContext::default())
}

pub fn al_is_mouse_installed() -> bool {
    with_context(|ctx| ctx.mouse.installed)
}

pub fn al_get_mouse_event_source() -> Option<EventSource> {
    None
}

pub fn al_get_mouse_state(ret_state: &mut MouseState) {
    with_context(|ctx| {
        let native = match ctx.backend.as_mut() {
            Some(backend) => backend.mouse_state(),
            None => NativeMouseState::default(),
        };
        *ret_state = MouseState {
            x: native.x,
            y: native.y,
            z: ctx.mouse.z,
            w: ctx.mouse.w,
            pressure: 0,
            button: 0,
            buttons: MouseButtons::from(native).0 as i32,
            display: ctx.display.current,
        };
    })
}

pub fn al_mouse_button_down(state: &MouseState, button: i32) -> bool {
    if !(1..=32).contains(&button) {
        return false;
    }
    (state.buttons as u32) & (1 << (button - 1)) != 0
}

/// Axis 0 is x, 1 is y, 2 is z and 3 is w. Anything else reads 0.
pub fn al_get_mouse_state_axis(state: &MouseState, axis: i32) -> i32 {
    match axis {
        0 => state.x,
        1 => state.y,
        2 => state.z,
        3 => state.w,
        _ => 0,
    }
}

pub fn al_get_mouse_num_axes() -> i32 {
    NUM_AXES
}

pub fn al_get_mouse_num_buttons() -> i32 {
    NUM_BUTTONS
}

/// Warps the pointer inside `display`, or the current display when `None`.
pub fn al_set_mouse_xy(display: Option<Display>, x: f32, y: f32) -> bool {
    with_context(|ctx| {
        let (x, y) = (x as i32, y as i32);
        let window = display
            .or(ctx.display.current)
            .and_then(|d| ctx.display.displays.get(d.0))
            .map(|data| data.window);
        if let (Some(window), Some(backend)) = (window, ctx.backend.as_mut()) {
            backend.warp_mouse(window, x, y);
        }
        ctx.mouse.x = x;
        ctx.mouse.y = y;
        true
    })
}

pub fn al_set_mouse_z(z: f32) -> bool {
    with_context(|ctx| ctx.mouse.z = z as i32);
    true
}

pub fn al_set_mouse_w(w: f32) -> bool {
    with_context(|ctx| ctx.mouse.w = w as i32);
    true
}

/// Pointer position relative to the focused window.
pub fn al_get_mouse_cursor_position() -> Option<(i32, i32)> {
    with_context(|ctx| {
        let backend = ctx.backend.as_mut()?;
        let native = backend.mouse_state();
        Some((native.x, native.y))
    })
}
