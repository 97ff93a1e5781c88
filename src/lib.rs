//! Allegro 5 API emulated on top of SDL2.
//!
//! Every `al_*` function keeps its Allegro name and argument order. Pointer
//! handles become `Copy` newtypes resolved through generational arenas, and
//! the implicit Allegro globals live in a per-thread context.

#[macro_use]
mod handle;

pub mod audio;
pub mod backend;
pub mod bitmap;
pub mod blender;
pub mod color;
pub mod config;
mod context;
pub mod display;
pub mod draw;
pub mod events;
pub mod joystick;
pub mod keyboard;
pub mod logging;
pub mod mouse;
pub mod state;
pub mod timer;
pub mod transform;

pub use audio::*;
pub use bitmap::*;
pub use blender::*;
pub use color::*;
pub use config::*;
pub use display::*;
pub use draw::*;
pub use events::*;
pub use joystick::*;
pub use keyboard::*;
pub use mouse::*;
pub use state::*;
pub use timer::*;
pub use transform::*;

use backend::Backend;
use context::{with_context, Context};
use log::{info, warn};

pub const ALLEGRO_VERSION_INT: u32 = (5 << 24) | (2 << 16) | (8 << 8) | 1;

/// Brings up the native SDL2 backend. Calling it again while a backend is
/// installed is a no-op that succeeds.
#[cfg(feature = "sdl")]
pub fn al_init() -> bool {
    if with_context(|ctx| ctx.backend.is_some()) {
        return true;
    }
    match backend::sdl::SdlSystem::new() {
        Ok(system) => al_init_with_backend(Box::new(system)),
        Err(err) => {
            warn!("Could not initialize SDL: {}", err);
            false
        }
    }
}

#[cfg(not(feature = "sdl"))]
pub fn al_init() -> bool {
    warn!("Built without a native backend; use al_init_with_backend");
    false
}

/// Installs `backend` as this thread's backend, replacing any previous one.
pub fn al_init_with_backend(backend: Box<dyn Backend>) -> bool {
    with_context(|ctx| ctx.backend = Some(backend));
    info!("Allegro {}.{}.{} emulation ready", 5, 2, 8);
    true
}

/// Tears down every subsystem and resource, then drops the backend.
pub fn al_uninstall_system() {
    al_uninstall_audio();
    al_uninstall_timer();
    al_uninstall_joystick();
    al_uninstall_keyboard();
    al_uninstall_mouse();
    al_shutdown_primitives_addon();

    let displays = with_context(|ctx| ctx.display.displays.keys());
    for key in displays {
        al_destroy_display(Some(Display(key)));
    }

    with_context(|ctx| *ctx = Context::default());
    info!("Allegro emulation shut down");
}

pub fn al_get_allegro_version() -> u32 {
    ALLEGRO_VERSION_INT
}
