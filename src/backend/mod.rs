//! Narrow capability interfaces between the emulated API and the native
//! multimedia library.
//!
//! The translation layer only ever talks to a `Backend`. A backend works in
//! terms of its own resource ids and never sees an emulated handle.

#[cfg(test)]
pub mod fake;
#[cfg(feature = "sdl")]
pub mod sdl;

use crate::timer::TimerTicks;
use bitfield::bitfield;
use num_derive::FromPrimitive;
use std::path::Path;
use std::sync::Arc;

macro_rules! native_id {
    ($($name:ident),* $(,)?) => {
        $(
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

native_id!(WindowId, TextureId, SurfaceId, ChunkId, MusicId, TimerId, JoystickId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Rgba8 = Rgba8 {
        r: 255,
        g: 255,
        b: 255,
        a: 255,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub color: Rgba8,
}

/// One immediate-mode drawing request against a window's active target.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Rgba8),
    Point {
        x: f32,
        y: f32,
        color: Rgba8,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgba8,
    },
    Rect {
        rect: IRect,
        color: Rgba8,
        filled: bool,
    },
    /// Untextured triangles, either consecutive triples or indexed.
    Geometry {
        vertices: Vec<Vertex>,
        indices: Option<Vec<i32>>,
    },
    /// Copies a texture onto the target. A tint is applied as colour and
    /// alpha modulation for this copy only.
    Copy {
        texture: TextureId,
        src: Option<IRect>,
        dst: IRect,
        flip_h: bool,
        flip_v: bool,
        tint: Option<Rgba8>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenMode {
    Off,
    Exclusive,
    Desktop,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// `None` centers the window.
    pub position: Option<(i32, i32)>,
    pub fullscreen: FullscreenMode,
    pub resizable: bool,
    pub borderless: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    pub fullscreen: bool,
    pub fullscreen_desktop: bool,
    pub resizable: bool,
    pub borderless: bool,
    pub minimized: bool,
    pub maximized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub frequency: i32,
    pub channels: i32,
    pub chunk_size: i32,
}

bitfield! {
    /// Modifier bits in the same layout the native keyboard reports them.
    #[derive(Clone, Copy, Default, PartialEq, Eq)]
    pub struct NativeMods(u16);
    impl Debug;

    pub lshift, set_lshift: 0;
    pub rshift, set_rshift: 1;
    pub lctrl, set_lctrl: 6;
    pub rctrl, set_rctrl: 7;
    pub lalt, set_lalt: 8;
    pub ralt, set_ralt: 9;
    pub lgui, set_lgui: 10;
    pub rgui, set_rgui: 11;
    pub num, _: 12;
    pub caps, _: 13;
    pub mode, set_mode: 14;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeMouseButton {
    Left,
    Middle,
    Right,
    X1,
    X2,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    KeyDown {
        scancode: i32,
        mods: NativeMods,
    },
    KeyUp {
        scancode: i32,
        mods: NativeMods,
    },
    MouseButtonDown {
        button: NativeMouseButton,
        x: i32,
        y: i32,
    },
    MouseButtonUp {
        button: NativeMouseButton,
        x: i32,
        y: i32,
    },
    MouseMotion {
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
    },
    WindowResized {
        width: i32,
        height: i32,
    },
    WindowClose,
    Other,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NativeMouseState {
    pub x: i32,
    pub y: i32,
    pub left: bool,
    pub middle: bool,
    pub right: bool,
    pub x1: bool,
    pub x2: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeJoystick {
    pub id: JoystickId,
    pub name: Option<String>,
    pub is_controller: bool,
}

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum ControllerAxis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    TriggerLeft = 4,
    TriggerRight = 5,
}

#[derive(Debug, Clone, Copy, FromPrimitive, PartialEq, Eq)]
pub enum ControllerButton {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    Back = 4,
    Guide = 5,
    Start = 6,
    LeftStick = 7,
    RightStick = 8,
    LeftShoulder = 9,
    RightShoulder = 10,
    DPadUp = 11,
    DPadDown = 12,
    DPadLeft = 13,
    DPadRight = 14,
}

/// Window, render surface and texture provider.
pub trait VideoBackend {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, String>;
    /// Also releases every texture created on the window's renderer.
    fn destroy_window(&mut self, window: WindowId);
    fn window_state(&self, window: WindowId) -> WindowState;
    fn set_fullscreen(&mut self, window: WindowId, mode: FullscreenMode) -> Result<(), String>;
    fn set_resizable(&mut self, window: WindowId, resizable: bool);
    fn minimize_window(&mut self, window: WindowId);
    fn maximize_window(&mut self, window: WindowId);
    fn restore_window(&mut self, window: WindowId);
    fn set_window_title(&mut self, window: WindowId, title: &str);
    fn set_window_size(&mut self, window: WindowId, width: u32, height: u32) -> Result<(), String>;
    fn window_size(&self, window: WindowId) -> (u32, u32);
    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32);
    fn window_position(&self, window: WindowId) -> (i32, i32);
    fn present(&mut self, window: WindowId);

    fn create_texture(&mut self, window: WindowId, width: u32, height: u32) -> Result<TextureId, String>;
    fn destroy_texture(&mut self, window: WindowId, texture: TextureId);
    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId, String>;
    fn destroy_surface(&mut self, surface: SurfaceId);
    fn surface_pixel(&self, surface: SurfaceId, x: i32, y: i32) -> Option<Rgba8>;

    /// `None` points rendering back at the window itself.
    fn set_render_target(&mut self, window: WindowId, target: Option<TextureId>) -> Result<(), String>;
    fn set_clip_rect(&mut self, window: WindowId, rect: Option<IRect>);
    fn draw(&mut self, window: WindowId, command: DrawCommand) -> Result<(), String>;
}

/// Decoder and channel mixer provider. Channel `-1` means "any free
/// channel" when playing and "every channel" when halting.
pub trait AudioBackend {
    fn init_codecs(&mut self) -> Result<(), String>;
    fn open_audio(&mut self, spec: AudioSpec) -> Result<(), String>;
    fn close_audio(&mut self);
    fn allocate_channels(&mut self, count: i32) -> i32;

    fn load_chunk(&mut self, path: &Path) -> Result<ChunkId, String>;
    fn load_chunk_from_bytes(&mut self, bytes: &[u8]) -> Result<ChunkId, String>;
    fn create_chunk(&mut self, pcm: &[i16]) -> Result<ChunkId, String>;
    fn chunk_byte_len(&self, chunk: ChunkId) -> u32;
    fn free_chunk(&mut self, chunk: ChunkId);

    fn play_chunk(&mut self, chunk: ChunkId, loops: i32) -> Result<i32, String>;
    fn halt_channel(&mut self, channel: i32);
    fn is_channel_playing(&self, channel: i32) -> bool;
    fn set_channel_volume(&mut self, channel: i32, volume: i32);

    fn load_music(&mut self, path: &Path) -> Result<MusicId, String>;
    fn free_music(&mut self, music: MusicId);
    fn play_music(&mut self, music: MusicId, loops: i32) -> Result<(), String>;
    fn halt_music(&mut self);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn rewind_music(&mut self);
    fn seek_music(&mut self, secs: f64) -> Result<(), String>;
    fn is_music_playing(&self) -> bool;
    fn set_music_volume(&mut self, volume: i32);
    fn music_position(&self) -> f64;
    fn music_duration(&self, music: MusicId) -> Option<f64>;
}

/// Native event stream, input snapshots and joystick devices.
pub trait InputBackend {
    fn wait_event(&mut self) -> Option<NativeEvent>;
    fn wait_event_timeout(&mut self, timeout_ms: u32) -> Option<NativeEvent>;
    fn pressed_scancodes(&mut self) -> Vec<i32>;
    fn mouse_state(&mut self) -> NativeMouseState;
    fn warp_mouse(&mut self, window: WindowId, x: i32, y: i32);

    fn init_joysticks(&mut self) -> Result<(), String>;
    fn quit_joysticks(&mut self);
    fn joystick_count(&mut self) -> i32;
    fn open_joystick(&mut self, device_index: i32) -> Result<NativeJoystick, String>;
    fn close_joystick(&mut self, joystick: JoystickId);
    fn joystick_attached(&self, joystick: JoystickId) -> bool;
    fn joystick_num_axes(&self, joystick: JoystickId) -> i32;
    fn joystick_num_buttons(&self, joystick: JoystickId) -> i32;
    fn joystick_axis(&self, joystick: JoystickId, axis: i32) -> i16;
    fn joystick_button(&self, joystick: JoystickId, button: i32) -> bool;
    fn controller_axis(&self, joystick: JoystickId, axis: ControllerAxis) -> i16;
    fn controller_button(&self, joystick: JoystickId, button: ControllerButton) -> bool;
}

/// Periodic callbacks. Ticks are counted on the backend's own execution
/// context, never the caller's.
pub trait TimerBackend {
    fn init_timers(&mut self) -> Result<(), String>;
    fn add_timer(&mut self, ticks: Arc<TimerTicks>) -> Result<TimerId, String>;
    fn remove_timer(&mut self, timer: TimerId);
    fn ticks_ms(&self) -> u32;
}

pub trait Backend: VideoBackend + AudioBackend + InputBackend + TimerBackend {}

impl<T: VideoBackend + AudioBackend + InputBackend + TimerBackend> Backend for T {}
