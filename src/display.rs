//! Display/window manager: owns the current display and the new-display
//! creation defaults.

use crate::backend::{DrawCommand, FullscreenMode, WindowId, WindowSpec, WindowState};
use crate::bitmap::{Bitmap, ALLEGRO_PIXEL_FORMAT_ARGB_8888};
use crate::color::Color;
use crate::context::with_context;
use crate::handle::Arena;
use bitfield::bitfield;
use log::{debug, info, warn};

pub const ALLEGRO_WINDOWED: i32 = 0;
pub const ALLEGRO_FULLSCREEN: i32 = 1;
pub const ALLEGRO_FULLSCREEN_WINDOW: i32 = 2;
pub const ALLEGRO_RESIZABLE: i32 = 4;
pub const ALLEGRO_OPENGL: i32 = 8;
pub const ALLEGRO_FRAMEBUFFER: i32 = 16;
pub const ALLEGRO_FRAMELESS: i32 = 32;
pub const ALLEGRO_MINIMIZED: i32 = 64;
pub const ALLEGRO_MAXIMIZED: i32 = 128;

const DEFAULT_TITLE: &str = "Allegro SDL2 Shim";

handle!(
    /// A native window together with its render surface.
    Display
);

bitfield! {
    struct DisplayFlags(u32);
    impl Debug;

    fullscreen, set_fullscreen: 0;
    fullscreen_window, set_fullscreen_window: 1;
    resizable, set_resizable: 2;
    frameless, set_frameless: 5;
    minimized, set_minimized: 6;
    maximized, set_maximized: 7;
}

impl From<WindowState> for DisplayFlags {
    fn from(state: WindowState) -> DisplayFlags {
        let mut flags = DisplayFlags(0);
        flags.set_fullscreen(state.fullscreen);
        flags.set_fullscreen_window(state.fullscreen_desktop);
        flags.set_resizable(state.resizable);
        flags.set_frameless(state.borderless);
        flags.set_minimized(state.minimized);
        flags.set_maximized(state.maximized);
        flags
    }
}

pub struct DisplayData {
    pub window: WindowId,
    pub width: i32,
    pub height: i32,
    pub flags: i32,
    pub refresh_rate: i32,
    pub adapter: i32,
    pub backbuffer: Option<Bitmap>,
}

pub struct DisplayContext {
    pub displays: Arena<DisplayData>,
    pub current: Option<Display>,
    pub new_flags: i32,
    pub new_refresh_rate: i32,
    pub new_title: String,
    /// Negative coordinates mean "let the window manager center it".
    pub new_position: (i32, i32),
    pub new_adapter: i32,
}

impl Default for DisplayContext {
    fn default() -> Self {
        DisplayContext {
            displays: Arena::default(),
            current: None,
            new_flags: ALLEGRO_WINDOWED,
            new_refresh_rate: 60,
            new_title: DEFAULT_TITLE.to_string(),
            new_position: (-1, -1),
            new_adapter: 0,
        }
    }
}

pub fn al_set_new_display_flags(flags: i32) {
    with_context(|ctx| ctx.display.new_flags = flags)
}

pub fn al_get_new_display_flags() -> i32 {
    with_context(|ctx| ctx.display.new_flags)
}

pub fn al_set_new_display_refresh_rate(refresh_rate: i32) {
    with_context(|ctx| ctx.display.new_refresh_rate = refresh_rate)
}

pub fn al_get_new_display_refresh_rate() -> i32 {
    with_context(|ctx| ctx.display.new_refresh_rate)
}

pub fn al_set_new_window_title(title: &str) {
    with_context(|ctx| ctx.display.new_title = title.to_string())
}

pub fn al_get_new_window_title() -> String {
    with_context(|ctx| ctx.display.new_title.clone())
}

pub fn al_set_new_window_position(x: i32, y: i32) {
    with_context(|ctx| ctx.display.new_position = (x, y))
}

pub fn al_get_new_window_position() -> (i32, i32) {
    with_context(|ctx| ctx.display.new_position)
}

pub fn al_set_new_display_adapter(adapter: i32) {
    with_context(|ctx| ctx.display.new_adapter = adapter)
}

pub fn al_get_new_display_adapter() -> i32 {
    with_context(|ctx| ctx.display.new_adapter)
}

/// Creates a window and renderer from the new-display defaults and makes it
/// the current display.
pub fn al_create_display(w: i32, h: i32) -> Option<Display> {
    if w <= 0 || h <= 0 {
        warn!("Refusing to create a {}x{} display", w, h);
        return None;
    }

    with_context(|ctx| {
        let flags = DisplayFlags(ctx.display.new_flags as u32);
        let fullscreen = if flags.fullscreen() {
            FullscreenMode::Exclusive
        } else if flags.fullscreen_window() {
            FullscreenMode::Desktop
        } else {
            FullscreenMode::Off
        };
        let (x, y) = ctx.display.new_position;
        let spec = WindowSpec {
            title: ctx.display.new_title.clone(),
            width: w as u32,
            height: h as u32,
            position: if x < 0 || y < 0 { None } else { Some((x, y)) },
            fullscreen,
            resizable: flags.resizable(),
            borderless: flags.frameless(),
        };

        let backend = ctx.backend.as_mut()?;
        let window = match backend.create_window(&spec) {
            Ok(window) => window,
            Err(err) => {
                warn!("Failed to create display: {}", err);
                return None;
            }
        };

        let display = Display(ctx.display.displays.insert(DisplayData {
            window,
            width: w,
            height: h,
            flags: ctx.display.new_flags,
            refresh_rate: ctx.display.new_refresh_rate,
            adapter: ctx.display.new_adapter,
            backbuffer: None,
        }));
        ctx.display.current = Some(display);
        info!("Created {}x{} display {:?}", w, h, display);
        Some(display)
    })
}

pub fn al_destroy_display(display: Option<Display>) {
    let display = match display {
        Some(display) => display,
        None => return,
    };

    with_context(|ctx| {
        let data = match ctx.display.displays.remove(display.0) {
            Some(data) => data,
            None => return,
        };
        ctx.release_display_bitmaps(data.window, data.backbuffer);
        if let Some(backend) = ctx.backend.as_mut() {
            backend.destroy_window(data.window);
        }
        if ctx.display.current == Some(display) {
            ctx.display.current = None;
        }
        debug!("Destroyed display {:?}", display);
    })
}

pub fn al_get_current_display() -> Option<Display> {
    with_context(|ctx| ctx.display.current)
}

/// Stale handles clear the current display.
pub fn al_set_current_display(display: Option<Display>) {
    with_context(|ctx| {
        ctx.display.current = display.filter(|d| ctx.display.displays.contains(d.0));
    })
}

pub fn al_get_display_width(display: Option<Display>) -> i32 {
    with_display(display, 0, |data, _| data.width)
}

pub fn al_get_display_height(display: Option<Display>) -> i32 {
    with_display(display, 0, |data, _| data.height)
}

pub fn al_get_display_refresh_rate(display: Option<Display>) -> i32 {
    with_display(display, 0, |data, _| data.refresh_rate)
}

pub fn al_get_display_format(display: Option<Display>) -> i32 {
    with_display(display, 0, |_, _| ALLEGRO_PIXEL_FORMAT_ARGB_8888)
}

pub fn al_get_display_adapter(display: Option<Display>) -> i32 {
    with_display(display, 0, |data, _| data.adapter)
}

/// The creation flags combined with whatever the window currently reports.
pub fn al_get_display_flags(display: Option<Display>) -> i32 {
    with_display(display, 0, |data, backend| match backend {
        Some(backend) => {
            let live = DisplayFlags::from(backend.window_state(data.window));
            data.flags | live.0 as i32
        }
        None => data.flags,
    })
}

pub fn al_set_display_flag(display: Option<Display>, flag: i32, onoff: bool) -> bool {
    with_context(|ctx| {
        let data = match display.and_then(|d| ctx.display.displays.get_mut(d.0)) {
            Some(data) => data,
            None => return false,
        };
        let backend = match ctx.backend.as_mut() {
            Some(backend) => backend,
            None => return false,
        };
        let window = data.window;

        let applied = match flag {
            ALLEGRO_FULLSCREEN | ALLEGRO_FULLSCREEN_WINDOW => {
                let mode = match (onoff, flag) {
                    (false, _) => FullscreenMode::Off,
                    (true, ALLEGRO_FULLSCREEN) => FullscreenMode::Exclusive,
                    (true, _) => FullscreenMode::Desktop,
                };
                backend
                    .set_fullscreen(window, mode)
                    .map_err(|err| warn!("Failed to change fullscreen mode: {}", err))
                    .is_ok()
            }
            ALLEGRO_RESIZABLE => {
                backend.set_resizable(window, onoff);
                true
            }
            ALLEGRO_MINIMIZED => {
                if onoff {
                    backend.minimize_window(window);
                } else {
                    backend.restore_window(window);
                }
                true
            }
            ALLEGRO_MAXIMIZED => {
                if onoff {
                    backend.maximize_window(window);
                } else {
                    backend.restore_window(window);
                }
                true
            }
            _ => false,
        };

        if applied {
            if onoff {
                data.flags |= flag;
            } else {
                data.flags &= !flag;
            }
        }
        applied
    })
}

pub fn al_resize_display(display: Option<Display>, width: i32, height: i32) -> bool {
    if width <= 0 || height <= 0 {
        return false;
    }
    let resized = with_display(display, false, |data, backend| match backend {
        Some(backend) => backend
            .set_window_size(data.window, width as u32, height as u32)
            .map_err(|err| warn!("Failed to resize display: {}", err))
            .is_ok(),
        None => false,
    });
    resized && al_acknowledge_resize(display)
}

/// Re-reads the window size after the window manager changed it.
pub fn al_acknowledge_resize(display: Option<Display>) -> bool {
    with_context(|ctx| {
        let data = match display.and_then(|d| ctx.display.displays.get_mut(d.0)) {
            Some(data) => data,
            None => return false,
        };
        if let Some(backend) = ctx.backend.as_ref() {
            let (w, h) = backend.window_size(data.window);
            data.width = w as i32;
            data.height = h as i32;
        }
        let (width, height, backbuffer) = (data.width, data.height, data.backbuffer);
        if let Some(bitmap) = backbuffer.and_then(|b| ctx.bitmap.bitmaps.get_mut(b.0)) {
            bitmap.width = width;
            bitmap.height = height;
        }
        true
    })
}

pub fn al_set_window_position(display: Option<Display>, x: i32, y: i32) {
    with_display(display, (), |data, backend| {
        if let Some(backend) = backend {
            backend.set_window_position(data.window, x, y);
        }
    })
}

pub fn al_get_window_position(display: Option<Display>) -> (i32, i32) {
    with_display(display, (0, 0), |data, backend| {
        backend.map_or((0, 0), |backend| backend.window_position(data.window))
    })
}

pub fn al_set_window_title(display: Option<Display>, title: &str) {
    with_display(display, (), |data, backend| {
        if let Some(backend) = backend {
            backend.set_window_title(data.window, title);
        }
    })
}

pub fn al_flip_display() {
    with_context(|ctx| {
        if let (Some(window), Some(backend)) = (ctx.current_window(), ctx.backend.as_mut()) {
            backend.present(window);
        }
    })
}

pub fn al_clear_to_color(color: Color) {
    with_context(|ctx| ctx.submit(DrawCommand::Clear(color.to_rgba8())))
}

fn with_display<R>(
    display: Option<Display>,
    default: R,
    f: impl FnOnce(&mut DisplayData, Option<&mut Box<dyn crate::backend::Backend>>) -> R,
) -> R {
    with_context(|ctx| match display.and_then(|d| ctx.display.displays.get_mut(d.0)) {
        Some(data) => f(data, ctx.backend.as_mut()),
        None => default,
    })
}
