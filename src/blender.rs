//! Global blend state. It is recorded and handed back, but draw calls do
//! not apply it.

use crate::context::with_context;

pub const ALLEGRO_ADD: i32 = 1;
pub const ALLEGRO_SUB: i32 = 2;
pub const ALLEGRO_DEST_MINUS_SRC: i32 = 3;
pub const ALLEGRO_SRC_MINUS_DEST: i32 = 4;

pub const ALLEGRO_ZERO: i32 = 0;
pub const ALLEGRO_ONE: i32 = 1;
pub const ALLEGRO_ALPHA: i32 = 2;
pub const ALLEGRO_INVERSE_ALPHA: i32 = 3;
pub const ALLEGRO_SRC_COLOR: i32 = 4;
pub const ALLEGRO_DEST_COLOR: i32 = 5;
pub const ALLEGRO_INVERSE_SRC_COLOR: i32 = 6;
pub const ALLEGRO_INVERSE_DEST_COLOR: i32 = 7;
pub const ALLEGRO_CONST_COLOR: i32 = 8;
pub const ALLEGRO_INVERSE_CONST_COLOR: i32 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blender {
    pub op: i32,
    pub src: i32,
    pub dst: i32,
    pub alpha_op: i32,
    pub alpha_src: i32,
    pub alpha_dst: i32,
}

impl Default for Blender {
    fn default() -> Self {
        Blender {
            op: ALLEGRO_ADD,
            src: ALLEGRO_ALPHA,
            dst: ALLEGRO_INVERSE_ALPHA,
            alpha_op: ALLEGRO_ADD,
            alpha_src: ALLEGRO_ALPHA,
            alpha_dst: ALLEGRO_INVERSE_ALPHA,
        }
    }
}

/// Sets the colour and alpha blend functions to the same values.
pub fn al_set_blender(op: i32, src: i32, dst: i32) {
    al_set_separate_blender(op, src, dst, op, src, dst)
}

pub fn al_get_blender() -> (i32, i32, i32) {
    with_context(|ctx| (ctx.blender.op, ctx.blender.src, ctx.blender.dst))
}

pub fn al_set_separate_blender(op: i32, src: i32, dst: i32, alpha_op: i32, alpha_src: i32, alpha_dst: i32) {
    with_context(|ctx| {
        ctx.blender = Blender {
            op,
            src,
            dst,
            alpha_op,
            alpha_src,
            alpha_dst,
        }
    })
}

pub fn al_get_separate_blender() -> (i32, i32, i32, i32, i32, i32) {
    with_context(|ctx| {
        let b = ctx.blender;
        (b.op, b.src, b.dst, b.alpha_op, b.alpha_src, b.alpha_dst)
    })
}
