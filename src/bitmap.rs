//! Bitmap/surface manager: owns the target bitmap and the new-bitmap
//! creation defaults.
//!
//! A bitmap is backed by a render-target texture when a display exists and
//! by a CPU raster surface otherwise. The backbuffer bitmap of a display has
//! no storage of its own: targeting it points rendering back at the window.

use crate::backend::{DrawCommand, IRect, SurfaceId, TextureId, WindowId};
use crate::color::{al_map_rgba_f, Color};
use crate::context::{with_context, Context};
use crate::display::Display;
use crate::handle::Arena;
use either::Either;
use log::{debug, warn};

pub const ALLEGRO_MEMORY_BITMAP: i32 = 1;
pub const ALLEGRO_VIDEO_BITMAP: i32 = 2;
pub const ALLEGRO_FORCE_LOCKING: i32 = 4;
pub const ALLEGRO_NO_PRESERVE_TEXTURE: i32 = 8;
pub const ALLEGRO_ALPHA_TEST: i32 = 16;
pub const ALLEGRO_INTERNAL_OPENGL: i32 = 32;
pub const ALLEGRO_MIN_LINEAR: i32 = 64;
pub const ALLEGRO_MAG_LINEAR: i32 = 128;
pub const ALLEGRO_MIPMAP: i32 = 256;
pub const ALLEGRO_NO_PRELOADING: i32 = 512;
pub const ALLEGRO_HAMT: i32 = 1024;
pub const ALLEGRO_FORCE_INTEGER_SCALE: i32 = 2048;

pub const ALLEGRO_FLIP_HORIZONTAL: i32 = 1;
pub const ALLEGRO_FLIP_VERTICAL: i32 = 2;

pub const ALLEGRO_PIXEL_FORMAT_ANY: i32 = 0;
pub const ALLEGRO_PIXEL_FORMAT_ANY_NO_ALPHA: i32 = 1;
pub const ALLEGRO_PIXEL_FORMAT_ANY_WITH_ALPHA: i32 = 2;
pub const ALLEGRO_PIXEL_FORMAT_ANY_15_NO_ALPHA: i32 = 3;
pub const ALLEGRO_PIXEL_FORMAT_ANY_15_WITH_ALPHA: i32 = 4;
pub const ALLEGRO_PIXEL_FORMAT_ANY_16_NO_ALPHA: i32 = 5;
pub const ALLEGRO_PIXEL_FORMAT_ANY_16_WITH_ALPHA: i32 = 6;
pub const ALLEGRO_PIXEL_FORMAT_ANY_24_NO_ALPHA: i32 = 7;
pub const ALLEGRO_PIXEL_FORMAT_ANY_24_WITH_ALPHA: i32 = 8;
pub const ALLEGRO_PIXEL_FORMAT_ANY_32_NO_ALPHA: i32 = 9;
pub const ALLEGRO_PIXEL_FORMAT_ANY_32_WITH_ALPHA: i32 = 10;
pub const ALLEGRO_PIXEL_FORMAT_ARGB_8888: i32 = 11;
pub const ALLEGRO_PIXEL_FORMAT_RGBA_8888: i32 = 12;
pub const ALLEGRO_PIXEL_FORMAT_ABGR_8888: i32 = 13;
pub const ALLEGRO_PIXEL_FORMAT_BGRA_8888: i32 = 14;
pub const ALLEGRO_PIXEL_FORMAT_RGB_888: i32 = 15;
pub const ALLEGRO_PIXEL_FORMAT_BGR_888: i32 = 16;
pub const ALLEGRO_PIXEL_FORMAT_RGB_565: i32 = 17;
pub const ALLEGRO_PIXEL_FORMAT_RGBA_5551: i32 = 18;
pub const ALLEGRO_PIXEL_FORMAT_ARGB_1555: i32 = 19;
pub const ALLEGRO_PIXEL_FORMAT_ABGR_F32: i32 = 20;
pub const ALLEGRO_PIXEL_FORMAT_ABGR_8888_LE: i32 = 21;

handle!(
    /// A drawable surface.
    Bitmap
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub window: WindowId,
    pub texture: TextureId,
}

pub struct BitmapData {
    pub width: i32,
    pub height: i32,
    pub format: i32,
    pub flags: i32,
    /// `None` for backbuffers and for bitmaps whose display went away.
    pub storage: Option<Either<TextureRef, SurfaceId>>,
    pub is_backbuffer: bool,
}

impl BitmapData {
    fn texture(&self) -> Option<TextureRef> {
        self.storage.and_then(|storage| storage.left())
    }

    fn surface(&self) -> Option<SurfaceId> {
        self.storage.and_then(|storage| storage.right())
    }
}

pub struct BitmapContext {
    pub bitmaps: Arena<BitmapData>,
    pub target: Option<Bitmap>,
    pub new_flags: i32,
    pub new_format: i32,
    pub clip: Option<IRect>,
    pub held: bool,
}

impl Default for BitmapContext {
    fn default() -> Self {
        BitmapContext {
            bitmaps: Arena::default(),
            target: None,
            new_flags: ALLEGRO_VIDEO_BITMAP,
            new_format: ALLEGRO_PIXEL_FORMAT_ARGB_8888,
            clip: None,
            held: false,
        }
    }
}

impl Context {
    pub fn create_bitmap(&mut self, w: i32, h: i32) -> Option<Bitmap> {
        if w <= 0 || h <= 0 {
            warn!("Refusing to create a {}x{} bitmap", w, h);
            return None;
        }
        let window = self.current_window();
        let backend = self.backend.as_mut()?;

        let texture = window.and_then(|window| {
            backend
                .create_texture(window, w as u32, h as u32)
                .map(|texture| TextureRef { window, texture })
                .map_err(|err| warn!("Texture creation failed, using a surface: {}", err))
                .ok()
        });
        let storage = match texture {
            Some(texture) => Either::Left(texture),
            None => match backend.create_surface(w as u32, h as u32) {
                Ok(surface) => Either::Right(surface),
                Err(err) => {
                    warn!("Failed to create bitmap: {}", err);
                    return None;
                }
            },
        };

        let bitmap = Bitmap(self.bitmap.bitmaps.insert(BitmapData {
            width: w,
            height: h,
            format: self.bitmap.new_format,
            flags: self.bitmap.new_flags,
            storage: Some(storage),
            is_backbuffer: false,
        }));
        debug!("Created {}x{} bitmap {:?}", w, h, bitmap);
        Some(bitmap)
    }

    /// Points the current display's renderer at `bitmap`, or back at the
    /// window when the bitmap has no texture on that renderer.
    pub fn retarget(&mut self, bitmap: Option<Bitmap>) {
        let bitmap = bitmap.filter(|b| self.bitmap.bitmaps.contains(b.0));
        self.bitmap.target = bitmap;

        let window = match self.current_window() {
            Some(window) => window,
            None => return,
        };
        let texture = bitmap
            .and_then(|b| self.bitmap.bitmaps.get(b.0))
            .and_then(BitmapData::texture)
            .filter(|texture| texture.window == window)
            .map(|texture| texture.texture);

        if let Some(backend) = self.backend.as_mut() {
            if let Err(err) = backend.set_render_target(window, texture) {
                warn!("Failed to set render target: {}", err);
            }
        }
    }

    /// Drops the bitmaps tied to a display that is being destroyed. The
    /// textures themselves go away with the window's renderer.
    pub fn release_display_bitmaps(&mut self, window: WindowId, backbuffer: Option<Bitmap>) {
        if let Some(backbuffer) = backbuffer {
            self.bitmap.bitmaps.remove(backbuffer.0);
        }
        for (_, data) in self.bitmap.bitmaps.iter_mut() {
            if data.texture().map_or(false, |texture| texture.window == window) {
                data.storage = None;
            }
        }
        let target_gone = match self.bitmap.target {
            Some(target) => self
                .bitmap
                .bitmaps
                .get(target.0)
                .map_or(true, |data| data.storage.is_none() && !data.is_backbuffer),
            None => false,
        };
        if target_gone {
            self.bitmap.target = None;
        }
    }

    fn destroy_bitmap(&mut self, bitmap: Bitmap) {
        let data = match self.bitmap.bitmaps.remove(bitmap.0) {
            Some(data) => data,
            None => return,
        };
        if self.bitmap.target == Some(bitmap) {
            self.retarget(None);
        }
        if let Some(backbuffer_of) = self
            .display
            .displays
            .iter_mut()
            .find(|(_, display)| display.backbuffer == Some(bitmap))
        {
            backbuffer_of.1.backbuffer = None;
        }

        if let Some(backend) = self.backend.as_mut() {
            match data.storage {
                Some(Either::Left(texture)) => backend.destroy_texture(texture.window, texture.texture),
                Some(Either::Right(surface)) => backend.destroy_surface(surface),
                None => {}
            }
        }
        debug!("Destroyed bitmap {:?}", bitmap);
    }

    fn backbuffer(&mut self, display: Display) -> Option<Bitmap> {
        let data = self.display.displays.get(display.0)?;
        if let Some(existing) = data.backbuffer {
            return Some(existing);
        }
        let (width, height) = (data.width, data.height);
        let bitmap = Bitmap(self.bitmap.bitmaps.insert(BitmapData {
            width,
            height,
            format: ALLEGRO_PIXEL_FORMAT_ARGB_8888,
            flags: ALLEGRO_VIDEO_BITMAP,
            storage: None,
            is_backbuffer: true,
        }));
        if let Some(data) = self.display.displays.get_mut(display.0) {
            data.backbuffer = Some(bitmap);
        }
        Some(bitmap)
    }
}

pub fn al_set_new_bitmap_flags(flags: i32) {
    with_context(|ctx| ctx.bitmap.new_flags = flags)
}

pub fn al_get_new_bitmap_flags() -> i32 {
    with_context(|ctx| ctx.bitmap.new_flags)
}

pub fn al_set_new_bitmap_format(format: i32) {
    with_context(|ctx| ctx.bitmap.new_format = format)
}

pub fn al_get_new_bitmap_format() -> i32 {
    with_context(|ctx| ctx.bitmap.new_format)
}

pub fn al_create_bitmap(w: i32, h: i32) -> Option<Bitmap> {
    with_context(|ctx| ctx.create_bitmap(w, h))
}

pub fn al_destroy_bitmap(bitmap: Option<Bitmap>) {
    if let Some(bitmap) = bitmap {
        with_context(|ctx| ctx.destroy_bitmap(bitmap))
    }
}

fn with_bitmap<R>(bitmap: Option<Bitmap>, default: R, f: impl FnOnce(&BitmapData) -> R) -> R {
    with_context(|ctx| match bitmap.and_then(|b| ctx.bitmap.bitmaps.get(b.0)) {
        Some(data) => f(data),
        None => default,
    })
}

pub fn al_get_bitmap_width(bitmap: Option<Bitmap>) -> i32 {
    with_bitmap(bitmap, 0, |data| data.width)
}

pub fn al_get_bitmap_height(bitmap: Option<Bitmap>) -> i32 {
    with_bitmap(bitmap, 0, |data| data.height)
}

pub fn al_get_bitmap_format(bitmap: Option<Bitmap>) -> i32 {
    with_bitmap(bitmap, 0, |data| data.format)
}

pub fn al_get_bitmap_flags(bitmap: Option<Bitmap>) -> i32 {
    with_bitmap(bitmap, 0, |data| data.flags)
}

pub fn al_set_target_bitmap(bitmap: Option<Bitmap>) {
    with_context(|ctx| ctx.retarget(bitmap))
}

pub fn al_get_target_bitmap() -> Option<Bitmap> {
    with_context(|ctx| ctx.bitmap.target)
}

/// Returns the display's backbuffer bitmap, creating it on first request.
pub fn al_get_backbuffer(display: Option<Display>) -> Option<Bitmap> {
    with_context(|ctx| ctx.backbuffer(display?))
}

/// Makes `display` current and draws straight onto its window.
pub fn al_set_target_backbuffer(display: Option<Display>) {
    with_context(|ctx| {
        if let Some(display) = display.filter(|d| ctx.display.displays.contains(d.0)) {
            ctx.display.current = Some(display);
        }
        ctx.retarget(None);
    })
}

pub fn al_is_compatible_bitmap(bitmap: Option<Bitmap>) -> bool {
    with_context(|ctx| {
        if ctx.current_window().is_none() {
            return false;
        }
        match bitmap.and_then(|b| ctx.bitmap.bitmaps.get(b.0)) {
            Some(data) => {
                (data.flags & ctx.bitmap.new_flags) != 0 && data.format == ctx.bitmap.new_format
            }
            None => false,
        }
    })
}

/// Creates a bitmap of the same size and copies the source texture into it.
pub fn al_clone_bitmap(bitmap: Option<Bitmap>) -> Option<Bitmap> {
    with_context(|ctx| {
        let source = ctx.bitmap.bitmaps.get(bitmap?.0)?;
        let (width, height, format, flags) = (source.width, source.height, source.format, source.flags);
        let source_texture = source.texture();

        let clone = ctx.create_bitmap(width, height)?;
        if let Some(data) = ctx.bitmap.bitmaps.get_mut(clone.0) {
            data.format = format;
            data.flags = flags;
        }

        let dest_texture = ctx.bitmap.bitmaps.get(clone.0).and_then(BitmapData::texture);
        if let (Some(src), Some(dst)) = (source_texture, dest_texture) {
            if src.window == dst.window {
                let restore = ctx
                    .bitmap
                    .target
                    .and_then(|t| ctx.bitmap.bitmaps.get(t.0))
                    .and_then(BitmapData::texture)
                    .filter(|t| t.window == dst.window)
                    .map(|t| t.texture);
                if let Some(backend) = ctx.backend.as_mut() {
                    let copied = backend
                        .set_render_target(dst.window, Some(dst.texture))
                        .and_then(|_| {
                            backend.draw(
                                dst.window,
                                DrawCommand::Copy {
                                    texture: src.texture,
                                    src: None,
                                    dst: IRect {
                                        x: 0,
                                        y: 0,
                                        w: width,
                                        h: height,
                                    },
                                    flip_h: false,
                                    flip_v: false,
                                    tint: None,
                                },
                            )
                        });
                    if let Err(err) = copied {
                        warn!("Failed to copy bitmap contents: {}", err);
                    }
                    if let Err(err) = backend.set_render_target(dst.window, restore) {
                        warn!("Failed to restore render target: {}", err);
                    }
                }
            }
        }
        Some(clone)
    })
}

/// Bitmaps already live in the only format the renderer uses.
pub fn al_convert_bitmap(_bitmap: Option<Bitmap>) {}

fn blit(
    bitmap: Option<Bitmap>,
    tint: Option<Color>,
    src: Option<[f32; 4]>,
    dx: f32,
    dy: f32,
    size: Option<(f32, f32)>,
    flags: i32,
) {
    with_context(|ctx| {
        let window = match ctx.current_window() {
            Some(window) => window,
            None => return,
        };
        let data = match bitmap.and_then(|b| ctx.bitmap.bitmaps.get(b.0)) {
            Some(data) => data,
            None => return,
        };
        let texture = match data.texture().filter(|t| t.window == window) {
            Some(texture) => texture.texture,
            None => return,
        };

        let (dw, dh) = size
            .or_else(|| src.map(|s| (s[2], s[3])))
            .unwrap_or((data.width as f32, data.height as f32));
        let command = DrawCommand::Copy {
            texture,
            src: src.map(|s| IRect {
                x: s[0] as i32,
                y: s[1] as i32,
                w: s[2] as i32,
                h: s[3] as i32,
            }),
            dst: IRect {
                x: dx as i32,
                y: dy as i32,
                w: dw as i32,
                h: dh as i32,
            },
            flip_h: flags & ALLEGRO_FLIP_HORIZONTAL != 0,
            flip_v: flags & ALLEGRO_FLIP_VERTICAL != 0,
            tint: tint.map(Color::to_rgba8),
        };
        ctx.submit(command);
    })
}

pub fn al_draw_bitmap(bitmap: Option<Bitmap>, dx: f32, dy: f32, flags: i32) {
    blit(bitmap, None, None, dx, dy, None, flags)
}

#[allow(clippy::too_many_arguments)]
pub fn al_draw_bitmap_region(
    bitmap: Option<Bitmap>,
    sx: f32,
    sy: f32,
    sw: f32,
    sh: f32,
    dx: f32,
    dy: f32,
    flags: i32,
) {
    blit(bitmap, None, Some([sx, sy, sw, sh]), dx, dy, None, flags)
}

#[allow(clippy::too_many_arguments)]
pub fn al_draw_scaled_bitmap(
    bitmap: Option<Bitmap>,
    sx: f32,
    sy: f32,
    sw: f32,
    sh: f32,
    dx: f32,
    dy: f32,
    dw: f32,
    dh: f32,
    flags: i32,
) {
    blit(bitmap, None, Some([sx, sy, sw, sh]), dx, dy, Some((dw, dh)), flags)
}

pub fn al_draw_tinted_bitmap(bitmap: Option<Bitmap>, tint: Color, dx: f32, dy: f32, flags: i32) {
    blit(bitmap, Some(tint), None, dx, dy, None, flags)
}

#[allow(clippy::too_many_arguments)]
pub fn al_draw_tinted_bitmap_region(
    bitmap: Option<Bitmap>,
    tint: Color,
    sx: f32,
    sy: f32,
    sw: f32,
    sh: f32,
    dx: f32,
    dy: f32,
    flags: i32,
) {
    blit(bitmap, Some(tint), Some([sx, sy, sw, sh]), dx, dy, None, flags)
}

#[allow(clippy::too_many_arguments)]
pub fn al_draw_tinted_scaled_bitmap(
    bitmap: Option<Bitmap>,
    tint: Color,
    sx: f32,
    sy: f32,
    sw: f32,
    sh: f32,
    dx: f32,
    dy: f32,
    dw: f32,
    dh: f32,
    flags: i32,
) {
    blit(bitmap, Some(tint), Some([sx, sy, sw, sh]), dx, dy, Some((dw, dh)), flags)
}

pub fn al_put_pixel(x: f32, y: f32, color: Color) {
    with_context(|ctx| {
        ctx.submit(DrawCommand::Point {
            x,
            y,
            color: color.to_rgba8(),
        })
    })
}

// Blending is tracked, not applied.
pub fn al_put_blended_pixel(x: f32, y: f32, color: Color) {
    al_put_pixel(x, y, color)
}

/// Reads a pixel from a surface-backed bitmap. Texture-backed bitmaps and
/// out of range coordinates read as opaque black.
pub fn al_get_pixel(bitmap: Option<Bitmap>, x: f32, y: f32) -> Color {
    let black = al_map_rgba_f(0.0, 0.0, 0.0, 1.0);
    let (x, y) = (x.floor() as i32, y.floor() as i32);
    with_context(|ctx| {
        let data = match bitmap.and_then(|b| ctx.bitmap.bitmaps.get(b.0)) {
            Some(data) => data,
            None => return black,
        };
        if x < 0 || y < 0 || x >= data.width || y >= data.height {
            return black;
        }
        match (data.surface(), ctx.backend.as_ref()) {
            (Some(surface), Some(backend)) => backend
                .surface_pixel(surface, x, y)
                .map(Color::from_rgba8)
                .unwrap_or(black),
            _ => black,
        }
    })
}

pub fn al_set_clipping_rectangle(x: f32, y: f32, width: f32, height: f32) {
    with_context(|ctx| {
        let rect = IRect {
            x: x as i32,
            y: y as i32,
            w: width as i32,
            h: height as i32,
        };
        ctx.bitmap.clip = Some(rect);
        if let (Some(window), Some(backend)) = (ctx.current_window(), ctx.backend.as_mut()) {
            backend.set_clip_rect(window, Some(rect));
        }
    })
}

/// While no clip is set this reports the whole current display.
pub fn al_get_clipping_rectangle() -> (f32, f32, f32, f32) {
    let (x, y, w, h) = with_context(|ctx| match ctx.bitmap.clip {
        Some(rect) => (rect.x, rect.y, rect.w, rect.h),
        None => {
            let display = ctx.display.current.and_then(|d| ctx.display.displays.get(d.0));
            display.map_or((0, 0, 0, 0), |d| (0, 0, d.width, d.height))
        }
    });
    (x as f32, y as f32, w as f32, h as f32)
}

pub fn al_reset_clipping_rectangle() {
    with_context(|ctx| {
        ctx.bitmap.clip = None;
        if let (Some(window), Some(backend)) = (ctx.current_window(), ctx.backend.as_mut()) {
            backend.set_clip_rect(window, None);
        }
    })
}

pub fn al_hold_bitmap_drawing(hold: bool) {
    with_context(|ctx| ctx.bitmap.held = hold)
}

pub fn al_is_bitmap_drawing_held() -> bool {
    with_context(|ctx| ctx.bitmap.held)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{fake, Rgba8};
    use crate::color::{al_map_rgb, al_unmap_rgba};
    use crate::display::{al_create_display, al_destroy_display};

    #[test]
    fn creation_defaults() {
        assert_eq!(al_get_new_bitmap_flags(), ALLEGRO_VIDEO_BITMAP);
        assert_eq!(al_get_new_bitmap_format(), ALLEGRO_PIXEL_FORMAT_ARGB_8888);
    }

    #[test]
    fn surface_without_display_texture_with_one() {
        let fake = fake::install();
        let surface_backed = al_create_bitmap(8, 4);
        assert_eq!(al_get_bitmap_width(surface_backed), 8);
        assert_eq!(al_get_bitmap_height(surface_backed), 4);
        assert_eq!(fake.borrow().surfaces.len(), 1);

        al_create_display(64, 64);
        let texture_backed = al_create_bitmap(16, 16);
        assert!(texture_backed.is_some());
        assert_eq!(fake.borrow().texture_count(), 1);

        assert_eq!(al_create_bitmap(0, 16), None);
        assert_eq!(al_get_bitmap_width(None), 0);
    }

    #[test]
    fn target_redirects_rendering() {
        let fake = fake::install();
        let display = al_create_display(64, 64);
        let bitmap = al_create_bitmap(16, 16);

        al_set_target_bitmap(bitmap);
        assert_eq!(al_get_target_bitmap(), bitmap);
        assert!(fake.borrow().first_window().target.is_some());

        al_set_target_backbuffer(display);
        assert_eq!(al_get_target_bitmap(), None);
        assert_eq!(fake.borrow().first_window().target, None);

        al_set_target_bitmap(bitmap);
        al_destroy_bitmap(bitmap);
        assert_eq!(al_get_target_bitmap(), None);
        assert_eq!(fake.borrow().first_window().target, None);
    }

    #[test]
    fn backbuffer_is_cached_per_display() {
        let _fake = fake::install();
        let display = al_create_display(320, 200);
        let first = al_get_backbuffer(display);
        let second = al_get_backbuffer(display);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(al_get_bitmap_width(first), 320);
        assert_eq!(al_get_bitmap_height(first), 200);
        with_context(|ctx| {
            assert!(ctx.bitmap.bitmaps.get(first.unwrap().0).unwrap().is_backbuffer);
        });
        assert_eq!(al_get_backbuffer(None), None);
    }

    #[test]
    fn destroying_display_releases_its_bitmaps() {
        let _fake = fake::install();
        let display = al_create_display(64, 64);
        let backbuffer = al_get_backbuffer(display);
        let bitmap = al_create_bitmap(8, 8);
        al_set_target_bitmap(bitmap);

        al_destroy_display(display);
        assert_eq!(al_get_bitmap_width(backbuffer), 0);
        assert_eq!(al_get_target_bitmap(), None);
        // The record survives until the caller destroys it.
        assert_eq!(al_get_bitmap_width(bitmap), 8);
        al_destroy_bitmap(bitmap);
    }

    #[test]
    fn compatibility_needs_a_display() {
        let _fake = fake::install();
        let bitmap = al_create_bitmap(8, 8);
        assert!(!al_is_compatible_bitmap(bitmap));
        al_create_display(64, 64);
        assert!(al_is_compatible_bitmap(bitmap));
        al_set_new_bitmap_format(ALLEGRO_PIXEL_FORMAT_RGB_565);
        assert!(!al_is_compatible_bitmap(bitmap));
    }

    #[test]
    fn tinted_draw_carries_tint_and_flips() {
        let fake = fake::install();
        al_create_display(64, 64);
        let bitmap = al_create_bitmap(16, 8);
        al_draw_tinted_bitmap(bitmap, al_map_rgb(255, 0, 0), 4.0, 5.0, ALLEGRO_FLIP_VERTICAL);
        al_draw_scaled_bitmap(bitmap, 0.0, 0.0, 16.0, 8.0, 0.0, 0.0, 32.0, 16.0, 0);

        let state = fake.borrow();
        let commands = &state.first_window().commands;
        match &commands[0] {
            DrawCommand::Copy {
                dst,
                flip_h,
                flip_v,
                tint,
                ..
            } => {
                assert_eq!(*dst, IRect { x: 4, y: 5, w: 16, h: 8 });
                assert!(!flip_h);
                assert!(flip_v);
                assert_eq!(*tint, Some(Rgba8 { r: 255, g: 0, b: 0, a: 255 }));
            }
            other => panic!("unexpected command {:?}", other),
        }
        match &commands[1] {
            DrawCommand::Copy { src, dst, tint, .. } => {
                assert_eq!(*src, Some(IRect { x: 0, y: 0, w: 16, h: 8 }));
                assert_eq!(*dst, IRect { x: 0, y: 0, w: 32, h: 16 });
                assert_eq!(*tint, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn clone_copies_texture() {
        let fake = fake::install();
        al_create_display(64, 64);
        let bitmap = al_create_bitmap(16, 8);
        let clone = al_clone_bitmap(bitmap);
        assert!(clone.is_some());
        assert_ne!(clone, bitmap);
        assert_eq!(al_get_bitmap_width(clone), 16);
        assert_eq!(fake.borrow().texture_count(), 2);
        assert!(matches!(
            fake.borrow().first_window().commands.last(),
            Some(DrawCommand::Copy { .. })
        ));
        assert_eq!(fake.borrow().first_window().target, None);
    }

    #[test]
    fn clone_puts_back_bitmap_target() {
        let fake = fake::install();
        al_create_display(64, 64);
        let target = al_create_bitmap(8, 8);
        al_set_target_bitmap(target);
        let before = fake.borrow().first_window().target;
        assert!(before.is_some());

        let source = al_create_bitmap(16, 8);
        assert!(al_clone_bitmap(source).is_some());
        assert_eq!(fake.borrow().first_window().target, before);
        assert_eq!(al_get_target_bitmap(), target);
    }

    #[test]
    fn pixels_read_from_surfaces_only() {
        let fake = fake::install();
        let bitmap = al_create_bitmap(4, 4);
        fake.borrow_mut().paint_surfaces(Rgba8 { r: 10, g: 20, b: 30, a: 40 });

        assert_eq!(al_unmap_rgba(al_get_pixel(bitmap, 1.0, 1.0)), (10, 20, 30, 40));
        assert_eq!(al_unmap_rgba(al_get_pixel(bitmap, 3.9, 0.5)), (10, 20, 30, 40));
        assert_eq!(al_unmap_rgba(al_get_pixel(bitmap, 4.0, 0.0)), (0, 0, 0, 255));
        assert_eq!(al_unmap_rgba(al_get_pixel(bitmap, -0.5, 0.0)), (0, 0, 0, 255));
        assert_eq!(al_unmap_rgba(al_get_pixel(None, 0.0, 0.0)), (0, 0, 0, 255));
    }

    #[test]
    fn clipping_defaults_to_display() {
        let fake = fake::install();
        assert_eq!(al_get_clipping_rectangle(), (0.0, 0.0, 0.0, 0.0));
        al_create_display(100, 50);
        assert_eq!(al_get_clipping_rectangle(), (0.0, 0.0, 100.0, 50.0));

        al_set_clipping_rectangle(5.0, 6.0, 7.0, 8.0);
        assert_eq!(al_get_clipping_rectangle(), (5.0, 6.0, 7.0, 8.0));
        assert_eq!(
            fake.borrow().first_window().clip,
            Some(IRect { x: 5, y: 6, w: 7, h: 8 })
        );

        al_reset_clipping_rectangle();
        assert_eq!(al_get_clipping_rectangle(), (0.0, 0.0, 100.0, 50.0));
        assert_eq!(fake.borrow().first_window().clip, None);
    }

    #[test]
    fn held_drawing_flag() {
        assert!(!al_is_bitmap_drawing_held());
        al_hold_bitmap_drawing(true);
        assert!(al_is_bitmap_drawing_held());
    }
}
