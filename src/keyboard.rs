//! Keyboard snapshots and key-code naming.
//!
//! Native scancodes are translated into emulated key codes on the way in,
//! so snapshots and key events use the same numbering.

use crate::backend::NativeMods;
use crate::context::with_context;
use crate::events::EventSource;
use lazy_static::lazy_static;
use log::debug;
use std::collections::HashMap;

pub const ALLEGRO_KEY_MAX: i32 = 238;

pub const ALLEGRO_KEY_ESCAPE: i32 = 1;
pub const ALLEGRO_KEY_1: i32 = 2;
pub const ALLEGRO_KEY_2: i32 = 3;
pub const ALLEGRO_KEY_3: i32 = 4;
pub const ALLEGRO_KEY_4: i32 = 5;
pub const ALLEGRO_KEY_5: i32 = 6;
pub const ALLEGRO_KEY_6: i32 = 7;
pub const ALLEGRO_KEY_7: i32 = 8;
pub const ALLEGRO_KEY_8: i32 = 9;
pub const ALLEGRO_KEY_9: i32 = 10;
pub const ALLEGRO_KEY_0: i32 = 11;
pub const ALLEGRO_KEY_MINUS: i32 = 12;
pub const ALLEGRO_KEY_EQUALS: i32 = 13;
pub const ALLEGRO_KEY_BACKSPACE: i32 = 14;
pub const ALLEGRO_KEY_TAB: i32 = 15;
pub const ALLEGRO_KEY_Q: i32 = 16;
pub const ALLEGRO_KEY_W: i32 = 17;
pub const ALLEGRO_KEY_E: i32 = 18;
pub const ALLEGRO_KEY_R: i32 = 19;
pub const ALLEGRO_KEY_T: i32 = 20;
pub const ALLEGRO_KEY_Y: i32 = 21;
pub const ALLEGRO_KEY_U: i32 = 22;
pub const ALLEGRO_KEY_I: i32 = 23;
pub const ALLEGRO_KEY_O: i32 = 24;
pub const ALLEGRO_KEY_P: i32 = 25;
pub const ALLEGRO_KEY_OPENBRACE: i32 = 26;
pub const ALLEGRO_KEY_CLOSEBRACE: i32 = 27;
pub const ALLEGRO_KEY_ENTER: i32 = 28;
pub const ALLEGRO_KEY_LCTRL: i32 = 29;
pub const ALLEGRO_KEY_A: i32 = 30;
pub const ALLEGRO_KEY_S: i32 = 31;
pub const ALLEGRO_KEY_D: i32 = 32;
pub const ALLEGRO_KEY_F: i32 = 33;
pub const ALLEGRO_KEY_G: i32 = 34;
pub const ALLEGRO_KEY_H: i32 = 35;
pub const ALLEGRO_KEY_J: i32 = 36;
pub const ALLEGRO_KEY_K: i32 = 37;
pub const ALLEGRO_KEY_L: i32 = 38;
pub const ALLEGRO_KEY_SEMICOLON: i32 = 39;
pub const ALLEGRO_KEY_QUOTE: i32 = 40;
pub const ALLEGRO_KEY_TILDE: i32 = 41;
pub const ALLEGRO_KEY_LSHIFT: i32 = 42;
pub const ALLEGRO_KEY_BACKSLASH: i32 = 43;
pub const ALLEGRO_KEY_Z: i32 = 44;
pub const ALLEGRO_KEY_X: i32 = 45;
pub const ALLEGRO_KEY_C: i32 = 46;
pub const ALLEGRO_KEY_V: i32 = 47;
pub const ALLEGRO_KEY_B: i32 = 48;
pub const ALLEGRO_KEY_N: i32 = 49;
pub const ALLEGRO_KEY_M: i32 = 50;
pub const ALLEGRO_KEY_COMMA: i32 = 51;
pub const ALLEGRO_KEY_FULLSTOP: i32 = 52;
pub const ALLEGRO_KEY_SLASH: i32 = 53;
pub const ALLEGRO_KEY_RSHIFT: i32 = 54;
pub const ALLEGRO_KEY_PAD_ASTERISK: i32 = 55;
pub const ALLEGRO_KEY_LALT: i32 = 56;
pub const ALLEGRO_KEY_SPACE: i32 = 57;
pub const ALLEGRO_KEY_CAPSLOCK: i32 = 58;
pub const ALLEGRO_KEY_F1: i32 = 59;
pub const ALLEGRO_KEY_F2: i32 = 60;
pub const ALLEGRO_KEY_F3: i32 = 61;
pub const ALLEGRO_KEY_F4: i32 = 62;
pub const ALLEGRO_KEY_F5: i32 = 63;
pub const ALLEGRO_KEY_F6: i32 = 64;
pub const ALLEGRO_KEY_F7: i32 = 65;
pub const ALLEGRO_KEY_F8: i32 = 66;
pub const ALLEGRO_KEY_F9: i32 = 67;
pub const ALLEGRO_KEY_F10: i32 = 68;
pub const ALLEGRO_KEY_NUMLOCK: i32 = 69;
pub const ALLEGRO_KEY_SCROLLLOCK: i32 = 70;
pub const ALLEGRO_KEY_PAD_7: i32 = 71;
pub const ALLEGRO_KEY_PAD_8: i32 = 72;
pub const ALLEGRO_KEY_PAD_9: i32 = 73;
pub const ALLEGRO_KEY_PAD_MINUS: i32 = 74;
pub const ALLEGRO_KEY_PAD_4: i32 = 75;
pub const ALLEGRO_KEY_PAD_5: i32 = 76;
pub const ALLEGRO_KEY_PAD_6: i32 = 77;
pub const ALLEGRO_KEY_PAD_PLUS: i32 = 78;
pub const ALLEGRO_KEY_PAD_1: i32 = 79;
pub const ALLEGRO_KEY_PAD_2: i32 = 80;
pub const ALLEGRO_KEY_PAD_3: i32 = 81;
pub const ALLEGRO_KEY_PAD_0: i32 = 82;
pub const ALLEGRO_KEY_PAD_DELETE: i32 = 83;
pub const ALLEGRO_KEY_F11: i32 = 84;
pub const ALLEGRO_KEY_F12: i32 = 85;
pub const ALLEGRO_KEY_PAD_ENTER: i32 = 86;
pub const ALLEGRO_KEY_RCTRL: i32 = 87;
pub const ALLEGRO_KEY_PAD_SLASH: i32 = 88;
pub const ALLEGRO_KEY_ALTGR: i32 = 89;
pub const ALLEGRO_KEY_PAUSE: i32 = 90;
pub const ALLEGRO_KEY_HOME: i32 = 91;
pub const ALLEGRO_KEY_UP: i32 = 92;
pub const ALLEGRO_KEY_PGUP: i32 = 93;
pub const ALLEGRO_KEY_LEFT: i32 = 94;
pub const ALLEGRO_KEY_RIGHT: i32 = 95;
pub const ALLEGRO_KEY_END: i32 = 96;
pub const ALLEGRO_KEY_DOWN: i32 = 97;
pub const ALLEGRO_KEY_PGDN: i32 = 98;
pub const ALLEGRO_KEY_INSERT: i32 = 99;
pub const ALLEGRO_KEY_DELETE: i32 = 100;
pub const ALLEGRO_KEY_LWIN: i32 = 101;
pub const ALLEGRO_KEY_RWIN: i32 = 102;
pub const ALLEGRO_KEY_MENU: i32 = 103;

pub const ALLEGRO_KEYMOD_SHIFT: i32 = 1;
pub const ALLEGRO_KEYMOD_CTRL: i32 = 2;
pub const ALLEGRO_KEYMOD_ALT: i32 = 4;
pub const ALLEGRO_KEYMOD_LWIN: i32 = 8;
pub const ALLEGRO_KEYMOD_RWIN: i32 = 16;
pub const ALLEGRO_KEYMOD_MENU: i32 = 32;
pub const ALLEGRO_KEYMOD_ALTGR: i32 = 64;
pub const ALLEGRO_KEYMOD_COMMAND: i32 = 128;

const KEY_WORDS: usize = ((ALLEGRO_KEY_MAX + 31) / 32) as usize;

lazy_static! {
    /// Native (USB HID) scancode to emulated key code.
    static ref SCANCODE_TO_KEY: HashMap<i32, i32> = {
        let mut map: HashMap<i32, i32> = vec![
            (40, ALLEGRO_KEY_ENTER),
            (41, ALLEGRO_KEY_ESCAPE),
            (42, ALLEGRO_KEY_BACKSPACE),
            (43, ALLEGRO_KEY_TAB),
            (44, ALLEGRO_KEY_SPACE),
            (45, ALLEGRO_KEY_MINUS),
            (46, ALLEGRO_KEY_EQUALS),
            (47, ALLEGRO_KEY_OPENBRACE),
            (48, ALLEGRO_KEY_CLOSEBRACE),
            (49, ALLEGRO_KEY_BACKSLASH),
            (51, ALLEGRO_KEY_SEMICOLON),
            (52, ALLEGRO_KEY_QUOTE),
            (53, ALLEGRO_KEY_TILDE),
            (54, ALLEGRO_KEY_COMMA),
            (55, ALLEGRO_KEY_FULLSTOP),
            (56, ALLEGRO_KEY_SLASH),
            (57, ALLEGRO_KEY_CAPSLOCK),
            (68, ALLEGRO_KEY_F11),
            (69, ALLEGRO_KEY_F12),
            (71, ALLEGRO_KEY_SCROLLLOCK),
            (72, ALLEGRO_KEY_PAUSE),
            (73, ALLEGRO_KEY_INSERT),
            (74, ALLEGRO_KEY_HOME),
            (75, ALLEGRO_KEY_PGUP),
            (76, ALLEGRO_KEY_DELETE),
            (77, ALLEGRO_KEY_END),
            (78, ALLEGRO_KEY_PGDN),
            (79, ALLEGRO_KEY_RIGHT),
            (80, ALLEGRO_KEY_LEFT),
            (81, ALLEGRO_KEY_DOWN),
            (82, ALLEGRO_KEY_UP),
            (83, ALLEGRO_KEY_NUMLOCK),
            (84, ALLEGRO_KEY_PAD_SLASH),
            (85, ALLEGRO_KEY_PAD_ASTERISK),
            (86, ALLEGRO_KEY_PAD_MINUS),
            (87, ALLEGRO_KEY_PAD_PLUS),
            (88, ALLEGRO_KEY_PAD_ENTER),
            (89, ALLEGRO_KEY_PAD_1),
            (90, ALLEGRO_KEY_PAD_2),
            (91, ALLEGRO_KEY_PAD_3),
            (92, ALLEGRO_KEY_PAD_4),
            (93, ALLEGRO_KEY_PAD_5),
            (94, ALLEGRO_KEY_PAD_6),
            (95, ALLEGRO_KEY_PAD_7),
            (96, ALLEGRO_KEY_PAD_8),
            (97, ALLEGRO_KEY_PAD_9),
            (98, ALLEGRO_KEY_PAD_0),
            (99, ALLEGRO_KEY_PAD_DELETE),
            (101, ALLEGRO_KEY_MENU),
            (224, ALLEGRO_KEY_LCTRL),
            (225, ALLEGRO_KEY_LSHIFT),
            (226, ALLEGRO_KEY_LALT),
            (227, ALLEGRO_KEY_LWIN),
            (228, ALLEGRO_KEY_RCTRL),
            (229, ALLEGRO_KEY_RSHIFT),
            (230, ALLEGRO_KEY_ALTGR),
            (231, ALLEGRO_KEY_RWIN),
        ]
        .into_iter()
        .collect();

        // Letters are contiguous natively but follow the keyboard rows here.
        let letters = [
            ALLEGRO_KEY_A, ALLEGRO_KEY_B, ALLEGRO_KEY_C, ALLEGRO_KEY_D, ALLEGRO_KEY_E,
            ALLEGRO_KEY_F, ALLEGRO_KEY_G, ALLEGRO_KEY_H, ALLEGRO_KEY_I, ALLEGRO_KEY_J,
            ALLEGRO_KEY_K, ALLEGRO_KEY_L, ALLEGRO_KEY_M, ALLEGRO_KEY_N, ALLEGRO_KEY_O,
            ALLEGRO_KEY_P, ALLEGRO_KEY_Q, ALLEGRO_KEY_R, ALLEGRO_KEY_S, ALLEGRO_KEY_T,
            ALLEGRO_KEY_U, ALLEGRO_KEY_V, ALLEGRO_KEY_W, ALLEGRO_KEY_X, ALLEGRO_KEY_Y,
            ALLEGRO_KEY_Z,
        ];
        map.extend(letters.iter().enumerate().map(|(i, &key)| (4 + i as i32, key)));

        // 1..9 then 0 on both sides.
        map.extend((0..10).map(|i| (30 + i, ALLEGRO_KEY_1 + i)));
        map.extend((0..10).map(|i| (58 + i, ALLEGRO_KEY_F1 + i)));
        map
    };
}

static KEY_NAMES: [&str; 104] = [
    "UNKNOWN", "ESCAPE", "1", "2", "3", "4", "5", "6", "7", "8",
    "9", "0", "MINUS", "EQUALS", "BACKSPACE", "TAB", "Q", "W", "E", "R",
    "T", "Y", "U", "I", "O", "P", "OPENBRACE", "CLOSEBRACE", "ENTER", "LCTRL",
    "A", "S", "D", "F", "G", "H", "J", "K", "L", "SEMICOLON",
    "QUOTE", "TILDE", "LSHIFT", "BACKSLASH", "Z", "X", "C", "V", "B", "N",
    "M", "COMMA", "FULLSTOP", "SLASH", "RSHIFT", "PAD_ASTERISK", "LALT", "SPACE", "CAPSLOCK", "F1",
    "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "NUMLOCK",
    "SCROLLLOCK", "PAD_7", "PAD_8", "PAD_9", "PAD_MINUS", "PAD_4", "PAD_5", "PAD_6", "PAD_PLUS", "PAD_1",
    "PAD_2", "PAD_3", "PAD_0", "PAD_DELETE", "F11", "F12", "PAD_ENTER", "RCTRL", "PAD_SLASH", "ALTGR",
    "PAUSE", "HOME", "UP", "PGUP", "LEFT", "RIGHT", "END", "DOWN", "PGDN", "INSERT",
    "DELETE", "LWIN", "RWIN", "MENU",
];

/// Unmapped scancodes become key code 0.
pub(crate) fn keycode_from_scancode(scancode: i32) -> i32 {
    SCANCODE_TO_KEY.get(&scancode).copied().unwrap_or(0)
}

pub(crate) fn modifiers_from_native(mods: NativeMods) -> i32 {
    let mut out = 0;
    if mods.lshift() || mods.rshift() {
        out |= ALLEGRO_KEYMOD_SHIFT;
    }
    if mods.lctrl() || mods.rctrl() {
        out |= ALLEGRO_KEYMOD_CTRL;
    }
    if mods.lalt() {
        out |= ALLEGRO_KEYMOD_ALT;
    }
    if mods.ralt() || mods.mode() {
        out |= ALLEGRO_KEYMOD_ALTGR;
    }
    if mods.lgui() {
        out |= ALLEGRO_KEYMOD_LWIN;
    }
    if mods.rgui() {
        out |= ALLEGRO_KEYMOD_RWIN;
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardState {
    key_down: [u32; KEY_WORDS],
}

impl KeyboardState {
    fn set(&mut self, keycode: i32) {
        if keycode > 0 && keycode <= ALLEGRO_KEY_MAX {
            self.key_down[(keycode / 32) as usize] |= 1 << (keycode % 32);
        }
    }
}

#[derive(Default)]
pub struct KeyboardContext {
    pub installed: bool,
    /// The most recent snapshot.
    pub last: KeyboardState,
}

pub fn al_install_keyboard() -> bool {
    with_context(|ctx| {
        if !ctx.keyboard.installed {
            debug!("Keyboard installed");
            ctx.keyboard = KeyboardContext {
                installed: true,
                ..KeyboardContext::default()
            };
        }
        true
    })
}

pub fn al_uninstall_keyboard() {
    with_context(|ctx| ctx.keyboard = KeyboardContext::default())
}

pub fn al_is_keyboard_installed() -> bool {
    with_context(|ctx| ctx.keyboard.installed)
}

/// Reads every currently pressed key from the backend.
pub fn al_get_keyboard_state(ret_state: &mut KeyboardState) {
    let pressed = with_context(|ctx| match ctx.backend.as_mut() {
        Some(backend) => backend.pressed_scancodes(),
        None => Vec::new(),
    });

    let mut state = KeyboardState::default();
    for scancode in pressed {
        state.set(keycode_from_scancode(scancode));
    }

    with_context(|ctx| ctx.keyboard.last = state);
    *ret_state = state;
}

pub fn al_key_down(state: &KeyboardState, keycode: i32) -> bool {
    if keycode < 0 || keycode > ALLEGRO_KEY_MAX {
        return false;
    }
    state.key_down[(keycode / 32) as usize] & (1 << (keycode % 32)) != 0
}

pub fn al_keycode_to_name(keycode: i32) -> &'static str {
    usize::try_from(keycode)
        .ok()
        .and_then(|index| KEY_NAMES.get(index))
        .copied()
        .unwrap_or("UNKNOWN")
}

pub fn al_can_set_keyboard_leds() -> bool {
    false
}

pub fn al_set_keyboard_leds(_leds: i32) -> bool {
    false
}

pub fn al_get_keyboard_event_source() -> Option<EventSource> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake;

    #[test]
    fn letter_and_digit_rows() {
        assert_eq!(keycode_from_scancode(4), ALLEGRO_KEY_A);
        assert_eq!(keycode_from_scancode(29), ALLEGRO_KEY_Z);
        assert_eq!(keycode_from_scancode(20), ALLEGRO_KEY_Q);
        assert_eq!(keycode_from_scancode(30), ALLEGRO_KEY_1);
        assert_eq!(keycode_from_scancode(39), ALLEGRO_KEY_0);
        assert_eq!(keycode_from_scancode(67), ALLEGRO_KEY_F10);
        assert_eq!(keycode_from_scancode(69), ALLEGRO_KEY_F12);
        assert_eq!(keycode_from_scancode(500), 0);
    }

    #[test]
    fn modifiers_fold_left_and_right() {
        let mut mods = NativeMods::default();
        mods.set_rshift(true);
        mods.set_lctrl(true);
        assert_eq!(modifiers_from_native(mods), ALLEGRO_KEYMOD_SHIFT | ALLEGRO_KEYMOD_CTRL);

        let mut mods = NativeMods::default();
        mods.set_ralt(true);
        mods.set_rgui(true);
        assert_eq!(modifiers_from_native(mods), ALLEGRO_KEYMOD_ALTGR | ALLEGRO_KEYMOD_RWIN);
    }

    #[test]
    fn names_cover_the_table() {
        assert_eq!(al_keycode_to_name(ALLEGRO_KEY_ESCAPE), "ESCAPE");
        assert_eq!(al_keycode_to_name(ALLEGRO_KEY_PAD_ENTER), "PAD_ENTER");
        assert_eq!(al_keycode_to_name(ALLEGRO_KEY_MENU), "MENU");
        assert_eq!(al_keycode_to_name(-1), "UNKNOWN");
        assert_eq!(al_keycode_to_name(ALLEGRO_KEY_MAX), "UNKNOWN");
    }

    #[test]
    fn snapshot_reports_pressed_keys() {
        let fake = fake::install();
        assert!(al_install_keyboard());
        assert!(al_is_keyboard_installed());

        fake.borrow_mut().pressed = vec![4, 41, 225];
        let mut state = KeyboardState::default();
        al_get_keyboard_state(&mut state);

        assert!(al_key_down(&state, ALLEGRO_KEY_A));
        assert!(al_key_down(&state, ALLEGRO_KEY_ESCAPE));
        assert!(al_key_down(&state, ALLEGRO_KEY_LSHIFT));
        assert!(!al_key_down(&state, ALLEGRO_KEY_B));
        assert!(!al_key_down(&state, ALLEGRO_KEY_MAX + 1));

        al_uninstall_keyboard();
        assert!(!al_is_keyboard_installed());
    }

    #[test]
    fn leds_are_unsupported() {
        assert!(!al_can_set_keyboard_leds());
        assert!(!al_set_keyboard_leds(7));
        assert_eq!(al_get_keyboard_event_source(), None);
    }
}
