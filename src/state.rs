//! Snapshot and restore of the implicit global context.
//!
//! A snapshot field that holds zero (or `None`) reads as "not captured" on
//! restore, so a legitimately zero value cannot be restored. Capturing the
//! transform records identity, and restore never touches the current
//! transform.

use crate::bitmap::Bitmap;
use crate::blender::Blender;
use crate::context::with_context;
use crate::display::Display;
use crate::transform::Transform;
use bitfield::bitfield;

pub const ALLEGRO_STATE_NEW_DISPLAY_FLAGS: i32 = 1;
pub const ALLEGRO_STATE_NEW_BITMAP_FLAGS: i32 = 2;
pub const ALLEGRO_STATE_NEW_BITMAP_FORMAT: i32 = 4;
pub const ALLEGRO_STATE_DISPLAY: i32 = 8;
pub const ALLEGRO_STATE_TARGET_BITMAP: i32 = 16;
pub const ALLEGRO_STATE_TRANSFORM: i32 = 32;
pub const ALLEGRO_STATE_PROJECTION: i32 = 64;
pub const ALLEGRO_STATE_BLENDER: i32 = 128;
pub const ALLEGRO_STATE_ALL: i32 = 255;

bitfield! {
    struct StateFlags(u32);
    impl Debug;

    new_display_flags, _: 0;
    new_bitmap_flags, _: 1;
    new_bitmap_format, _: 2;
    display, _: 3;
    target_bitmap, _: 4;
    transform, _: 5;
    blender, _: 7;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct State {
    pub new_display_flags: i32,
    pub new_bitmap_flags: i32,
    pub new_bitmap_format: i32,
    pub current_display: Option<Display>,
    pub target_bitmap: Option<Bitmap>,
    pub transform: [f32; 16],
    pub blender_op: i32,
    pub blender_src: i32,
    pub blender_dst: i32,
    pub blender_alpha_op: i32,
    pub blender_alpha_src: i32,
    pub blender_alpha_dst: i32,
}

pub fn al_init_state(state: &mut State, flags: i32) {
    let flags = StateFlags(flags as u32);
    *state = State::default();

    with_context(|ctx| {
        if flags.new_display_flags() {
            state.new_display_flags = ctx.display.new_flags;
        }
        if flags.new_bitmap_flags() {
            state.new_bitmap_flags = ctx.bitmap.new_flags;
        }
        if flags.new_bitmap_format() {
            state.new_bitmap_format = ctx.bitmap.new_format;
        }
        if flags.display() {
            state.current_display = ctx.display.current;
        }
        if flags.target_bitmap() {
            state.target_bitmap = ctx.bitmap.target;
        }
        if flags.blender() {
            let b = ctx.blender;
            state.blender_op = b.op;
            state.blender_src = b.src;
            state.blender_dst = b.dst;
            state.blender_alpha_op = b.alpha_op;
            state.blender_alpha_src = b.alpha_src;
            state.blender_alpha_dst = b.alpha_dst;
        }
    });

    if flags.transform() {
        state.transform = Transform::identity().m;
    }
}

pub fn al_store_state(state: &mut State, flags: i32) {
    al_init_state(state, flags)
}

/// Writes every captured (non-zero, non-null) field back.
pub fn al_restore_state(state: &State) {
    with_context(|ctx| {
        if state.new_display_flags != 0 {
            ctx.display.new_flags = state.new_display_flags;
        }
        if state.new_bitmap_flags != 0 {
            ctx.bitmap.new_flags = state.new_bitmap_flags;
        }
        if state.new_bitmap_format != 0 {
            ctx.bitmap.new_format = state.new_bitmap_format;
        }
        if let Some(display) = state.current_display {
            if ctx.display.displays.contains(display.0) {
                ctx.display.current = Some(display);
            }
        }
        if state.target_bitmap.is_some() {
            ctx.retarget(state.target_bitmap);
        }
        if state.blender_op != 0 {
            ctx.blender = Blender {
                op: state.blender_op,
                src: state.blender_src,
                dst: state.blender_dst,
                alpha_op: state.blender_alpha_op,
                alpha_src: state.blender_alpha_src,
                alpha_dst: state.blender_alpha_dst,
            };
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake;
    use crate::bitmap::*;
    use crate::blender::*;
    use crate::display::*;
    use crate::transform::*;

    #[test]
    fn init_captures_only_selected_fields() {
        al_set_new_display_flags(ALLEGRO_RESIZABLE);
        al_set_new_bitmap_flags(ALLEGRO_MEMORY_BITMAP);

        let mut state = State::default();
        al_init_state(&mut state, ALLEGRO_STATE_NEW_DISPLAY_FLAGS | ALLEGRO_STATE_TRANSFORM);
        assert_eq!(state.new_display_flags, ALLEGRO_RESIZABLE);
        assert_eq!(state.new_bitmap_flags, 0);
        assert_eq!(state.blender_op, 0);
        assert_eq!(state.transform, Transform::identity().m);
    }

    #[test]
    fn restore_brings_back_captured_state() {
        let _fake = fake::install();
        let first = al_create_display(64, 64);
        let bitmap = al_create_bitmap(8, 8);
        al_set_target_bitmap(bitmap);
        al_set_new_bitmap_format(ALLEGRO_PIXEL_FORMAT_RGB_565);

        let mut state = State::default();
        al_store_state(&mut state, ALLEGRO_STATE_ALL);

        al_set_blender(ALLEGRO_SUB, ALLEGRO_ONE, ALLEGRO_ONE);
        al_set_new_bitmap_format(ALLEGRO_PIXEL_FORMAT_ABGR_F32);
        al_set_target_bitmap(None);
        let second = al_create_display(32, 32);
        assert_eq!(al_get_current_display(), second);

        al_restore_state(&state);
        assert_eq!(al_get_current_display(), first);
        assert_eq!(al_get_target_bitmap(), bitmap);
        assert_eq!(al_get_new_bitmap_format(), ALLEGRO_PIXEL_FORMAT_RGB_565);
        assert_eq!(al_get_blender(), (ALLEGRO_ADD, ALLEGRO_ALPHA, ALLEGRO_INVERSE_ALPHA));
    }

    #[test]
    fn zero_fields_are_not_restored() {
        al_set_new_display_flags(ALLEGRO_WINDOWED);
        let mut state = State::default();
        al_store_state(&mut state, ALLEGRO_STATE_NEW_DISPLAY_FLAGS);

        al_set_new_display_flags(ALLEGRO_FULLSCREEN);
        al_restore_state(&state);
        // WINDOWED is zero, which restore cannot tell apart from "not captured".
        assert_eq!(al_get_new_display_flags(), ALLEGRO_FULLSCREEN);
    }

    #[test]
    fn restore_keeps_current_transform() {
        let mut moved = Transform::identity();
        al_translate_transform(&mut moved, 3.0, 4.0, 0.0);
        al_use_transform(&moved);

        let mut state = State::default();
        al_store_state(&mut state, ALLEGRO_STATE_ALL);
        assert_eq!(state.transform, Transform::identity().m);

        al_restore_state(&state);
        let current = al_get_current_transform();
        assert_eq!(current.m[12], 3.0);
        assert_eq!(current.m[13], 4.0);
        assert_eq!(current, moved);
    }
}
