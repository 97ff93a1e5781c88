//! Joystick enumeration and snapshots.
//!
//! Devices the backend recognises as game controllers get a fixed layout:
//! stick 0 is the left stick, stick 1 the right stick and stick 2 holds both
//! triggers. Any other device reports all of its axes on stick 0.

use crate::backend::{ControllerAxis, ControllerButton, JoystickId};
use crate::context::with_context;
use crate::events::EventSource;
use crate::handle::Arena;
use log::{debug, info, warn};
use num_traits::FromPrimitive;

pub const ALLEGRO_JOYFLAG_DIGITAL: i32 = 1;
pub const ALLEGRO_JOYFLAG_ANALOGUE: i32 = 2;
pub const ALLEGRO_JOYFLAG_POLEV: i32 = 4;
pub const ALLEGRO_JOYFLAG_XINPUT: i32 = 8;

pub const ALLEGRO_JOYSTICK_MAX_STICKS: usize = 8;
pub const ALLEGRO_JOYSTICK_MAX_AXES: usize = 8;

const MAX_BUTTONS: usize = 32;
const CONTROLLER_STICKS: i32 = 3;
const CONTROLLER_BUTTONS: i32 = 15;
const BUTTON_PRESSED: u32 = 32767;

const CONTROLLER_BUTTON_NAMES: [&str; 15] = [
    "A",
    "B",
    "X",
    "Y",
    "BACK",
    "GUIDE",
    "START",
    "LS",
    "RS",
    "LB",
    "RB",
    "DPAD_UP",
    "DPAD_DOWN",
    "DPAD_LEFT",
    "DPAD_RIGHT",
];

handle!(Joystick);

pub struct JoystickData {
    native: JoystickId,
    name: String,
    is_controller: bool,
}

#[derive(Default)]
pub struct JoystickContext {
    pub installed: bool,
    pub joysticks: Arena<JoystickData>,
    /// Device order as enumerated at install time.
    pub order: Vec<Joystick>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoystickState {
    pub stick: [[f32; ALLEGRO_JOYSTICK_MAX_AXES]; ALLEGRO_JOYSTICK_MAX_STICKS],
    pub button: [u32; MAX_BUTTONS],
}

pub fn al_install_joystick() -> bool {
    with_context(|ctx| {
        if ctx.joystick.installed {
            return true;
        }
        let backend = match ctx.backend.as_mut() {
            Some(backend) => backend,
            None => return false,
        };
        if let Err(err) = backend.init_joysticks() {
            warn!("Could not initialise joysticks: {}", err);
            return false;
        }

        ctx.joystick.installed = true;
        let count = backend.joystick_count();
        for index in 0..count {
            match backend.open_joystick(index) {
                Ok(native) => {
                    let fallback = if native.is_controller { "Controller" } else { "Joystick" };
                    let name = native
                        .name
                        .unwrap_or_else(|| format!("{} {}", fallback, index));
                    info!("Opened joystick {}: {}", index, name);
                    let key = ctx.joystick.joysticks.insert(JoystickData {
                        native: native.id,
                        name,
                        is_controller: native.is_controller,
                    });
                    ctx.joystick.order.push(Joystick(key));
                }
                Err(err) => warn!("Skipping joystick {}: {}", index, err),
            }
        }
        true
    })
}

pub fn al_uninstall_joystick() {
    with_context(|ctx| {
        let joystick = &mut ctx.joystick;
        for handle in joystick.order.drain(..) {
            if let Some(data) = joystick.joysticks.remove(handle.0) {
                if let Some(backend) = ctx.backend.as_mut() {
                    backend.close_joystick(data.native);
                }
            }
        }
        if joystick.installed {
            if let Some(backend) = ctx.backend.as_mut() {
                backend.quit_joysticks();
            }
            debug!("Joysticks uninstalled");
        }
        joystick.installed = false;
    })
}

pub fn al_is_joystick_installed() -> bool {
    with_context(|ctx| ctx.joystick.installed)
}

/// Closes and re-enumerates every device. Old handles become stale.
pub fn al_reconfigure_joysticks() -> bool {
    al_uninstall_joystick();
    al_install_joystick()
}

pub fn install_joystick() -> i32 {
    if al_install_joystick() {
        0
    } else {
        -1
    }
}

pub fn remove_joystick() -> i32 {
    al_uninstall_joystick();
    0
}

pub fn al_get_num_joysticks() -> i32 {
    with_context(|ctx| ctx.joystick.order.len() as i32)
}

pub fn al_get_joystick(joyn: i32) -> Option<Joystick> {
    let index = usize::try_from(joyn).ok()?;
    with_context(|ctx| ctx.joystick.order.get(index).copied())
}

pub fn al_release_joystick(_joystick: Option<Joystick>) {}

fn with_joystick<R>(
    joystick: Option<Joystick>,
    default: R,
    f: impl FnOnce(&JoystickData, &dyn crate::backend::Backend) -> R,
) -> R {
    with_context(|ctx| {
        let data = match joystick.and_then(|j| ctx.joystick.joysticks.get(j.0)) {
            Some(data) => data,
            None => return default,
        };
        match ctx.backend.as_deref() {
            Some(backend) => f(data, backend),
            None => default,
        }
    })
}

pub fn al_get_joystick_active(joystick: Option<Joystick>) -> bool {
    with_joystick(joystick, false, |data, backend| backend.joystick_attached(data.native))
}

pub fn al_get_joystick_name(joystick: Option<Joystick>) -> Option<String> {
    with_context(|ctx| {
        joystick
            .and_then(|j| ctx.joystick.joysticks.get(j.0))
            .map(|data| data.name.clone())
    })
}

pub fn al_get_joystick_num_sticks(joystick: Option<Joystick>) -> i32 {
    with_joystick(joystick, 0, |data, backend| {
        if data.is_controller {
            CONTROLLER_STICKS
        } else {
            (backend.joystick_num_axes(data.native) + 1) / 2
        }
    })
}

/// Every stick reports as analogue.
pub fn al_get_joystick_stick_flags(_joystick: Option<Joystick>, _stick: i32) -> i32 {
    ALLEGRO_JOYFLAG_ANALOGUE
}

pub fn al_get_joystick_stick_name(_joystick: Option<Joystick>, stick: i32) -> &'static str {
    match stick {
        0 => "Left Stick",
        1 => "Right Stick",
        2 => "D-Pad",
        _ => "Unknown",
    }
}

pub fn al_get_joystick_num_axes(joystick: Option<Joystick>, stick: i32) -> i32 {
    with_joystick(joystick, 0, |data, backend| {
        if data.is_controller {
            return 2;
        }
        let axes = backend.joystick_num_axes(data.native);
        if stick * 2 + 1 < axes {
            2
        } else {
            (axes - stick * 2).max(0)
        }
    })
}

pub fn al_get_joystick_axis_name(_joystick: Option<Joystick>, _stick: i32, axis: i32) -> &'static str {
    if axis == 0 {
        "X"
    } else {
        "Y"
    }
}

pub fn al_get_joystick_num_buttons(joystick: Option<Joystick>) -> i32 {
    with_joystick(joystick, 0, |data, backend| {
        if data.is_controller {
            CONTROLLER_BUTTONS
        } else {
            backend.joystick_num_buttons(data.native)
        }
    })
}

/// Uses the controller layout's names where one exists.
pub fn al_get_joystick_button_name(_joystick: Option<Joystick>, button: i32) -> String {
    usize::try_from(button)
        .ok()
        .and_then(|index| CONTROLLER_BUTTON_NAMES.get(index))
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("Button {}", button))
}

fn normalise(value: i16) -> f32 {
    value as f32 / 32767.0
}

fn trigger(value: i16) -> f32 {
    (value as i32 + 32768) as f32 / 65535.0
}

fn pressed(down: bool) -> u32 {
    if down {
        BUTTON_PRESSED
    } else {
        0
    }
}

pub fn al_get_joystick_state(joystick: Option<Joystick>, ret_state: &mut JoystickState) {
    let state = with_joystick(joystick, None, |data, backend| {
        let id = data.native;
        let mut state = JoystickState::default();
        if data.is_controller {
            state.stick[0][0] = normalise(backend.controller_axis(id, ControllerAxis::LeftX));
            state.stick[0][1] = normalise(backend.controller_axis(id, ControllerAxis::LeftY));
            state.stick[1][0] = normalise(backend.controller_axis(id, ControllerAxis::RightX));
            state.stick[1][1] = normalise(backend.controller_axis(id, ControllerAxis::RightY));
            state.stick[2][0] = trigger(backend.controller_axis(id, ControllerAxis::TriggerLeft));
            state.stick[2][1] = trigger(backend.controller_axis(id, ControllerAxis::TriggerRight));

            for (index, slot) in state.button.iter_mut().enumerate() {
                if let Some(button) = ControllerButton::from_usize(index) {
                    *slot = pressed(backend.controller_button(id, button));
                }
            }
        } else {
            let axes = backend.joystick_num_axes(id).max(0) as usize;
            for axis in 0..axes.min(ALLEGRO_JOYSTICK_MAX_AXES) {
                state.stick[0][axis] = normalise(backend.joystick_axis(id, axis as i32));
            }
            let buttons = backend.joystick_num_buttons(id).max(0) as usize;
            for button in 0..buttons.min(MAX_BUTTONS) {
                state.button[button] = pressed(backend.joystick_button(id, button as i32));
            }
        }
        Some(state)
    });

    if let Some(state) = state {
        *ret_state = state;
    }
}

pub fn al_get_joystick_event_source() -> Option<EventSource> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{self, FakeJoystick};

    fn install_pads() {
        let fake = fake::install();
        fake.borrow_mut().joysticks = vec![
            FakeJoystick {
                name: Some("Pad".to_string()),
                is_controller: true,
                axes: vec![32767, -32767, 0, 0, -32768, 32767],
                buttons: vec![true, false, false, false, false, false, false, false, false, false, false, false, false, false, true],
                attached: true,
            },
            FakeJoystick {
                name: None,
                is_controller: false,
                axes: vec![0, 32767, -32767],
                buttons: vec![false, true],
                attached: false,
            },
        ];
    }

    #[test]
    fn enumerates_devices_with_fallback_names() {
        install_pads();
        assert!(al_install_joystick());
        assert!(al_is_joystick_installed());
        assert_eq!(al_get_num_joysticks(), 2);

        let pad = al_get_joystick(0);
        let stick = al_get_joystick(1);
        assert_eq!(al_get_joystick(2), None);
        assert_eq!(al_get_joystick(-1), None);
        assert_eq!(al_get_joystick_name(pad).as_deref(), Some("Pad"));
        assert_eq!(al_get_joystick_name(stick).as_deref(), Some("Joystick 1"));
        assert!(al_get_joystick_active(pad));
        assert!(!al_get_joystick_active(stick));
    }

    #[test]
    fn controller_layout() {
        install_pads();
        al_install_joystick();
        let pad = al_get_joystick(0);

        assert_eq!(al_get_joystick_num_sticks(pad), 3);
        assert_eq!(al_get_joystick_num_axes(pad, 2), 2);
        assert_eq!(al_get_joystick_num_buttons(pad), 15);
        assert_eq!(al_get_joystick_stick_flags(pad, 0), ALLEGRO_JOYFLAG_ANALOGUE);

        let mut state = JoystickState::default();
        al_get_joystick_state(pad, &mut state);
        assert_eq!(state.stick[0][0], 1.0);
        assert_eq!(state.stick[0][1], -1.0);
        assert_eq!(state.stick[2][0], 0.0);
        assert_eq!(state.stick[2][1], 1.0);
        assert_eq!(state.button[0], 32767);
        assert_eq!(state.button[1], 0);
        assert_eq!(state.button[14], 32767);
    }

    #[test]
    fn plain_joystick_axes_share_stick_zero() {
        install_pads();
        al_install_joystick();
        let stick = al_get_joystick(1);

        assert_eq!(al_get_joystick_num_sticks(stick), 2);
        assert_eq!(al_get_joystick_num_axes(stick, 0), 2);
        assert_eq!(al_get_joystick_num_axes(stick, 1), 1);
        assert_eq!(al_get_joystick_num_axes(stick, 5), 0);
        assert_eq!(al_get_joystick_num_buttons(stick), 2);

        let mut state = JoystickState::default();
        al_get_joystick_state(stick, &mut state);
        assert_eq!(state.stick[0][..3], [0.0, 1.0, -1.0]);
        assert_eq!(state.button[..2], [0, 32767]);
    }

    #[test]
    fn reconfigure_invalidates_handles() {
        install_pads();
        al_install_joystick();
        let old = al_get_joystick(0);
        assert!(al_reconfigure_joysticks());
        assert_eq!(al_get_joystick_name(old), None);
        assert_eq!(al_get_num_joysticks(), 2);

        al_uninstall_joystick();
        assert!(!al_is_joystick_installed());
        assert_eq!(al_get_num_joysticks(), 0);
    }

    #[test]
    fn names() {
        assert_eq!(al_get_joystick_stick_name(None, 1), "Right Stick");
        assert_eq!(al_get_joystick_stick_name(None, 9), "Unknown");
        assert_eq!(al_get_joystick_axis_name(None, 0, 1), "Y");
        assert_eq!(al_get_joystick_button_name(None, 4), "BACK");
        assert_eq!(al_get_joystick_button_name(None, 20), "Button 20");
    }

    #[test]
    fn install_needs_a_backend() {
        assert!(!al_install_joystick());
        assert_eq!(install_joystick(), -1);
        assert_eq!(remove_joystick(), 0);
    }
}
