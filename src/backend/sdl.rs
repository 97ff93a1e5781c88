//! SDL2 and SDL2_mixer backend.

use super::*;
use crate::timer::{TimerRegistration, TimerTicks};
use log::{debug, info, warn};
use sdl2::controller::{Axis, Button, GameController};
use sdl2::event::{Event, WindowEvent};
use sdl2::joystick::Joystick;
use sdl2::mixer::{Channel, Chunk, InitFlag, LoaderRWops, Music, Sdl2MixerContext};
use sdl2::mouse::MouseButton;
use sdl2::pixels::{Color, PixelFormatEnum};
use sdl2::rect::{Point, Rect};
use sdl2::render::{BlendMode, Texture, WindowCanvas};
use sdl2::rwops::RWops;
use sdl2::surface::Surface;
use sdl2::video::{FullscreenType, WindowPos};
use sdl2::{
    AudioSubsystem, EventPump, GameControllerSubsystem, JoystickSubsystem, Sdl, TimerSubsystem,
    VideoSubsystem,
};
use std::collections::BTreeMap;
use std::os::raw::c_void;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

struct SdlWindow {
    canvas: WindowCanvas,
    textures: BTreeMap<TextureId, Texture>,
}

enum OpenJoystick {
    Controller(GameController),
    Joystick(Joystick),
}

/// Position bookkeeping for the single music track, which the mixer does
/// not report itself.
#[derive(Default)]
struct MusicClock {
    offset: f64,
    resumed: Option<Instant>,
}

impl MusicClock {
    fn position(&self) -> f64 {
        self.offset + self.resumed.map_or(0.0, |at| at.elapsed().as_secs_f64())
    }

    fn start_at(&mut self, secs: f64) {
        self.offset = secs;
        self.resumed = Some(Instant::now());
    }

    fn pause(&mut self) {
        self.offset = self.position();
        self.resumed = None;
    }

    fn resume(&mut self) {
        if self.resumed.is_none() {
            self.resumed = Some(Instant::now());
        }
    }

    fn stop(&mut self) {
        *self = MusicClock::default();
    }
}

pub struct SdlSystem {
    ctx: Sdl,
    video_subsystem: VideoSubsystem,
    timer_subsystem: Option<TimerSubsystem>,
    audio_subsystem: Option<AudioSubsystem>,
    joystick_subsystem: Option<JoystickSubsystem>,
    controller_subsystem: Option<GameControllerSubsystem>,
    event_pump: EventPump,
    mixer: Option<Sdl2MixerContext>,

    next_id: u32,
    windows: BTreeMap<WindowId, SdlWindow>,
    surfaces: BTreeMap<SurfaceId, Surface<'static>>,
    chunks: BTreeMap<ChunkId, Chunk>,
    music: BTreeMap<MusicId, Music<'static>>,
    current_music: Option<MusicId>,
    music_clock: MusicClock,
    joysticks: BTreeMap<JoystickId, OpenJoystick>,
    timers: BTreeMap<TimerId, Arc<TimerRegistration>>,
}

impl SdlSystem {
    pub fn new() -> Result<SdlSystem, String> {
        let ctx = sdl2::init()?;
        let video_subsystem = ctx.video()?;
        let event_pump = ctx.event_pump()?;
        info!("SDL {} initialized", sdl2::version::version());
        Ok(SdlSystem {
            ctx,
            video_subsystem,
            timer_subsystem: None,
            audio_subsystem: None,
            joystick_subsystem: None,
            controller_subsystem: None,
            event_pump,
            mixer: None,
            next_id: 1,
            windows: BTreeMap::new(),
            surfaces: BTreeMap::new(),
            chunks: BTreeMap::new(),
            music: BTreeMap::new(),
            current_music: None,
            music_clock: MusicClock::default(),
            joysticks: BTreeMap::new(),
            timers: BTreeMap::new(),
        })
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn window(&self, window: WindowId) -> Option<&SdlWindow> {
        self.windows.get(&window)
    }

    fn window_mut(&mut self, window: WindowId) -> Result<&mut SdlWindow, String> {
        self.windows
            .get_mut(&window)
            .ok_or_else(|| format!("no window {:?}", window))
    }

    fn canvas_mut(&mut self, window: WindowId) -> Option<&mut WindowCanvas> {
        self.windows.get_mut(&window).map(|w| &mut w.canvas)
    }
}

impl Drop for SdlSystem {
    fn drop(&mut self) {
        for (_, registration) in std::mem::take(&mut self.timers) {
            registration.cancel();
        }
        for (_, window) in std::mem::take(&mut self.windows) {
            destroy_textures(window.textures);
        }
    }
}

fn destroy_textures(textures: BTreeMap<TextureId, Texture>) {
    for (_, texture) in textures {
        // The owning renderer is still alive at every call site.
        unsafe { texture.destroy() };
    }
}

fn sdl_color(color: Rgba8) -> Color {
    Color::RGBA(color.r, color.g, color.b, color.a)
}

fn sdl_rect(rect: IRect) -> Rect {
    Rect::new(rect.x, rect.y, rect.w.max(0) as u32, rect.h.max(0) as u32)
}

fn sdl_error(code: i32) -> Result<(), String> {
    if code == 0 {
        Ok(())
    } else {
        Err(sdl2::get_error())
    }
}

fn native_button(button: MouseButton) -> NativeMouseButton {
    match button {
        MouseButton::Left => NativeMouseButton::Left,
        MouseButton::Middle => NativeMouseButton::Middle,
        MouseButton::Right => NativeMouseButton::Right,
        MouseButton::X1 => NativeMouseButton::X1,
        MouseButton::X2 => NativeMouseButton::X2,
        MouseButton::Unknown => NativeMouseButton::Unknown,
    }
}

fn native_event(event: Event) -> NativeEvent {
    match event {
        Event::KeyDown {
            scancode: Some(scancode),
            keymod,
            ..
        } => NativeEvent::KeyDown {
            scancode: scancode as i32,
            mods: NativeMods(keymod.bits()),
        },
        Event::KeyUp {
            scancode: Some(scancode),
            keymod,
            ..
        } => NativeEvent::KeyUp {
            scancode: scancode as i32,
            mods: NativeMods(keymod.bits()),
        },
        Event::MouseButtonDown {
            mouse_btn, x, y, ..
        } => NativeEvent::MouseButtonDown {
            button: native_button(mouse_btn),
            x,
            y,
        },
        Event::MouseButtonUp {
            mouse_btn, x, y, ..
        } => NativeEvent::MouseButtonUp {
            button: native_button(mouse_btn),
            x,
            y,
        },
        Event::MouseMotion {
            x, y, xrel, yrel, ..
        } => NativeEvent::MouseMotion { x, y, xrel, yrel },
        Event::Window {
            win_event: WindowEvent::Resized(width, height),
            ..
        } => NativeEvent::WindowResized { width, height },
        Event::Window {
            win_event: WindowEvent::Close,
            ..
        }
        | Event::Quit { .. } => NativeEvent::WindowClose,
        _ => NativeEvent::Other,
    }
}

fn sdl_axis(axis: ControllerAxis) -> Axis {
    match axis {
        ControllerAxis::LeftX => Axis::LeftX,
        ControllerAxis::LeftY => Axis::LeftY,
        ControllerAxis::RightX => Axis::RightX,
        ControllerAxis::RightY => Axis::RightY,
        ControllerAxis::TriggerLeft => Axis::TriggerLeft,
        ControllerAxis::TriggerRight => Axis::TriggerRight,
    }
}

fn sdl_button(button: ControllerButton) -> Button {
    match button {
        ControllerButton::A => Button::A,
        ControllerButton::B => Button::B,
        ControllerButton::X => Button::X,
        ControllerButton::Y => Button::Y,
        ControllerButton::Back => Button::Back,
        ControllerButton::Guide => Button::Guide,
        ControllerButton::Start => Button::Start,
        ControllerButton::LeftStick => Button::LeftStick,
        ControllerButton::RightStick => Button::RightStick,
        ControllerButton::LeftShoulder => Button::LeftShoulder,
        ControllerButton::RightShoulder => Button::RightShoulder,
        ControllerButton::DPadUp => Button::DPadUp,
        ControllerButton::DPadDown => Button::DPadDown,
        ControllerButton::DPadLeft => Button::DPadLeft,
        ControllerButton::DPadRight => Button::DPadRight,
    }
}

impl VideoBackend for SdlSystem {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, String> {
        let mut builder = self
            .video_subsystem
            .window(&spec.title, spec.width, spec.height);
        match spec.position {
            Some((x, y)) => builder.position(x, y),
            None => builder.position_centered(),
        };
        match spec.fullscreen {
            FullscreenMode::Off => &mut builder,
            FullscreenMode::Exclusive => builder.fullscreen(),
            FullscreenMode::Desktop => builder.fullscreen_desktop(),
        };
        if spec.resizable {
            builder.resizable();
        }
        if spec.borderless {
            builder.borderless();
        }
        let window = builder.build().map_err(|e| e.to_string())?;
        let mut canvas = window
            .into_canvas()
            .accelerated()
            .target_texture()
            .build()
            .map_err(|e| e.to_string())?;
        canvas.set_blend_mode(BlendMode::Blend);

        let id = WindowId(self.next_id());
        debug!("Created window {:?} ({}x{})", id, spec.width, spec.height);
        self.windows.insert(
            id,
            SdlWindow {
                canvas,
                textures: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        if let Some(w) = self.windows.remove(&window) {
            destroy_textures(w.textures);
        }
    }

    fn window_state(&self, window: WindowId) -> WindowState {
        use sdl2::sys::SDL_WindowFlags::*;

        let w = match self.window(window) {
            Some(w) => w.canvas.window(),
            None => return WindowState::default(),
        };
        let flags = w.window_flags();
        let has = |flag: sdl2::sys::SDL_WindowFlags| flags & flag as u32 != 0;
        WindowState {
            fullscreen: w.fullscreen_state() == FullscreenType::True,
            fullscreen_desktop: w.fullscreen_state() == FullscreenType::Desktop,
            resizable: has(SDL_WINDOW_RESIZABLE),
            borderless: has(SDL_WINDOW_BORDERLESS),
            minimized: has(SDL_WINDOW_MINIMIZED),
            maximized: has(SDL_WINDOW_MAXIMIZED),
        }
    }

    fn set_fullscreen(&mut self, window: WindowId, mode: FullscreenMode) -> Result<(), String> {
        let kind = match mode {
            FullscreenMode::Off => FullscreenType::Off,
            FullscreenMode::Exclusive => FullscreenType::True,
            FullscreenMode::Desktop => FullscreenType::Desktop,
        };
        self.window_mut(window)?.canvas.window_mut().set_fullscreen(kind)
    }

    fn set_resizable(&mut self, window: WindowId, resizable: bool) {
        use sdl2::sys::SDL_bool;

        if let Some(canvas) = self.canvas_mut(window) {
            let value = if resizable {
                SDL_bool::SDL_TRUE
            } else {
                SDL_bool::SDL_FALSE
            };
            unsafe { sdl2::sys::SDL_SetWindowResizable(canvas.window().raw(), value) };
        }
    }

    fn minimize_window(&mut self, window: WindowId) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas.window_mut().minimize();
        }
    }

    fn maximize_window(&mut self, window: WindowId) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas.window_mut().maximize();
        }
    }

    fn restore_window(&mut self, window: WindowId) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas.window_mut().restore();
        }
    }

    fn set_window_title(&mut self, window: WindowId, title: &str) {
        if let Some(canvas) = self.canvas_mut(window) {
            if let Err(err) = canvas.window_mut().set_title(title) {
                warn!("Could not set window title: {}", err);
            }
        }
    }

    fn set_window_size(&mut self, window: WindowId, width: u32, height: u32) -> Result<(), String> {
        self.window_mut(window)?
            .canvas
            .window_mut()
            .set_size(width, height)
            .map_err(|e| e.to_string())
    }

    fn window_size(&self, window: WindowId) -> (u32, u32) {
        self.window(window)
            .map_or((0, 0), |w| w.canvas.window().size())
    }

    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas
                .window_mut()
                .set_position(WindowPos::Positioned(x), WindowPos::Positioned(y));
        }
    }

    fn window_position(&self, window: WindowId) -> (i32, i32) {
        self.window(window)
            .map_or((0, 0), |w| w.canvas.window().position())
    }

    fn present(&mut self, window: WindowId) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas.present();
        }
    }

    fn create_texture(&mut self, window: WindowId, width: u32, height: u32) -> Result<TextureId, String> {
        let id = TextureId(self.next_id());
        let w = self.window_mut(window)?;
        let mut texture = w
            .canvas
            .texture_creator()
            .create_texture_target(PixelFormatEnum::RGBA8888, width, height)
            .map_err(|e| e.to_string())?;
        texture.set_blend_mode(BlendMode::Blend);
        w.textures.insert(id, texture);
        Ok(id)
    }

    fn destroy_texture(&mut self, window: WindowId, texture: TextureId) {
        if let Some(w) = self.windows.get_mut(&window) {
            if let Some(texture) = w.textures.remove(&texture) {
                unsafe { texture.destroy() };
            }
        }
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId, String> {
        let surface = Surface::new(width, height, PixelFormatEnum::RGBA32)?;
        let id = SurfaceId(self.next_id());
        self.surfaces.insert(id, surface);
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.surfaces.remove(&surface);
    }

    fn surface_pixel(&self, surface: SurfaceId, x: i32, y: i32) -> Option<Rgba8> {
        let surface = self.surfaces.get(&surface)?;
        if x < 0 || y < 0 || x as u32 >= surface.width() || y as u32 >= surface.height() {
            return None;
        }
        let offset = y as usize * surface.pitch() as usize + x as usize * 4;
        surface.with_lock(|pixels| {
            pixels.get(offset..offset + 4).map(|p| Rgba8 {
                r: p[0],
                g: p[1],
                b: p[2],
                a: p[3],
            })
        })
    }

    fn set_render_target(&mut self, window: WindowId, target: Option<TextureId>) -> Result<(), String> {
        let w = self.window_mut(window)?;
        let raw = match target {
            Some(texture) => w
                .textures
                .get(&texture)
                .ok_or_else(|| format!("no texture {:?}", texture))?
                .raw(),
            None => std::ptr::null_mut(),
        };
        sdl_error(unsafe { sdl2::sys::SDL_SetRenderTarget(w.canvas.raw(), raw) })
    }

    fn set_clip_rect(&mut self, window: WindowId, rect: Option<IRect>) {
        if let Some(canvas) = self.canvas_mut(window) {
            canvas.set_clip_rect(rect.map(sdl_rect));
        }
    }

    fn draw(&mut self, window: WindowId, command: DrawCommand) -> Result<(), String> {
        let SdlWindow { canvas, textures } = self.window_mut(window)?;
        match command {
            DrawCommand::Clear(color) => {
                canvas.set_draw_color(sdl_color(color));
                canvas.clear();
                Ok(())
            }
            DrawCommand::Point { x, y, color } => {
                canvas.set_draw_color(sdl_color(color));
                canvas.draw_point(Point::new(x as i32, y as i32))
            }
            DrawCommand::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                canvas.set_draw_color(sdl_color(color));
                canvas.draw_line(
                    Point::new(x1 as i32, y1 as i32),
                    Point::new(x2 as i32, y2 as i32),
                )
            }
            DrawCommand::Rect {
                rect,
                color,
                filled,
            } => {
                canvas.set_draw_color(sdl_color(color));
                if filled {
                    canvas.fill_rect(sdl_rect(rect))
                } else {
                    canvas.draw_rect(sdl_rect(rect))
                }
            }
            DrawCommand::Geometry { vertices, indices } => {
                let vertices: Vec<sdl2::sys::SDL_Vertex> = vertices
                    .iter()
                    .map(|v| sdl2::sys::SDL_Vertex {
                        position: sdl2::sys::SDL_FPoint { x: v.x, y: v.y },
                        color: sdl2::sys::SDL_Color {
                            r: v.color.r,
                            g: v.color.g,
                            b: v.color.b,
                            a: v.color.a,
                        },
                        tex_coord: sdl2::sys::SDL_FPoint { x: 0.0, y: 0.0 },
                    })
                    .collect();
                let (index_ptr, index_count) = match &indices {
                    Some(indices) => (indices.as_ptr(), indices.len() as i32),
                    None => (std::ptr::null(), 0),
                };
                sdl_error(unsafe {
                    sdl2::sys::SDL_RenderGeometry(
                        canvas.raw(),
                        std::ptr::null_mut(),
                        vertices.as_ptr(),
                        vertices.len() as i32,
                        index_ptr,
                        index_count,
                    )
                })
            }
            DrawCommand::Copy {
                texture,
                src,
                dst,
                flip_h,
                flip_v,
                tint,
            } => {
                let texture = textures
                    .get_mut(&texture)
                    .ok_or_else(|| format!("no texture {:?}", texture))?;
                let tint = tint.unwrap_or(Rgba8::WHITE);
                texture.set_color_mod(tint.r, tint.g, tint.b);
                texture.set_alpha_mod(tint.a);
                let result = canvas.copy_ex(
                    texture,
                    src.map(sdl_rect),
                    Some(sdl_rect(dst)),
                    0.0,
                    None::<Point>,
                    flip_h,
                    flip_v,
                );
                texture.set_color_mod(255, 255, 255);
                texture.set_alpha_mod(255);
                result
            }
        }
    }
}

impl AudioBackend for SdlSystem {
    fn init_codecs(&mut self) -> Result<(), String> {
        if self.audio_subsystem.is_none() {
            self.audio_subsystem = Some(self.ctx.audio()?);
        }
        if self.mixer.is_none() {
            self.mixer = Some(sdl2::mixer::init(
                InitFlag::MP3 | InitFlag::OGG | InitFlag::FLAC | InitFlag::MOD,
            )?);
        }
        Ok(())
    }

    fn open_audio(&mut self, spec: AudioSpec) -> Result<(), String> {
        sdl2::mixer::open_audio(
            spec.frequency,
            sdl2::mixer::DEFAULT_FORMAT,
            spec.channels,
            spec.chunk_size,
        )?;
        info!(
            "Opened audio device at {} Hz, {} channels",
            spec.frequency, spec.channels
        );
        Ok(())
    }

    fn close_audio(&mut self) {
        Channel::all().halt();
        Music::halt();
        self.current_music = None;
        self.music_clock.stop();
        self.chunks.clear();
        self.music.clear();
        sdl2::mixer::close_audio();
        self.mixer = None;
        self.audio_subsystem = None;
    }

    fn allocate_channels(&mut self, count: i32) -> i32 {
        sdl2::mixer::allocate_channels(count)
    }

    fn load_chunk(&mut self, path: &Path) -> Result<ChunkId, String> {
        let chunk = Chunk::from_file(path)?;
        let id = ChunkId(self.next_id());
        self.chunks.insert(id, chunk);
        Ok(id)
    }

    fn load_chunk_from_bytes(&mut self, bytes: &[u8]) -> Result<ChunkId, String> {
        let chunk = RWops::from_bytes(bytes)?.load_wav()?;
        let id = ChunkId(self.next_id());
        self.chunks.insert(id, chunk);
        Ok(id)
    }

    fn create_chunk(&mut self, pcm: &[i16]) -> Result<ChunkId, String> {
        let chunk = Chunk::from_raw_buffer(pcm.to_vec().into_boxed_slice())?;
        let id = ChunkId(self.next_id());
        self.chunks.insert(id, chunk);
        Ok(id)
    }

    fn chunk_byte_len(&self, chunk: ChunkId) -> u32 {
        self.chunks
            .get(&chunk)
            .map_or(0, |c| unsafe { (*c.raw).alen })
    }

    fn free_chunk(&mut self, chunk: ChunkId) {
        // Freeing a chunk halts every channel still playing it.
        self.chunks.remove(&chunk);
    }

    fn play_chunk(&mut self, chunk: ChunkId, loops: i32) -> Result<i32, String> {
        let chunk = self
            .chunks
            .get(&chunk)
            .ok_or_else(|| format!("no chunk {:?}", chunk))?;
        Channel::all().play(chunk, loops).map(|Channel(c)| c)
    }

    fn halt_channel(&mut self, channel: i32) {
        Channel(channel).halt();
    }

    fn is_channel_playing(&self, channel: i32) -> bool {
        Channel(channel).is_playing()
    }

    fn set_channel_volume(&mut self, channel: i32, volume: i32) {
        Channel(channel).set_volume(volume);
    }

    fn load_music(&mut self, path: &Path) -> Result<MusicId, String> {
        let music = Music::from_file(path)?;
        let id = MusicId(self.next_id());
        self.music.insert(id, music);
        Ok(id)
    }

    fn free_music(&mut self, music: MusicId) {
        if self.current_music == Some(music) {
            self.halt_music();
        }
        self.music.remove(&music);
    }

    fn play_music(&mut self, music: MusicId, loops: i32) -> Result<(), String> {
        self.music
            .get(&music)
            .ok_or_else(|| format!("no music {:?}", music))?
            .play(loops)?;
        self.current_music = Some(music);
        self.music_clock.start_at(0.0);
        Ok(())
    }

    fn halt_music(&mut self) {
        Music::halt();
        self.current_music = None;
        self.music_clock.stop();
    }

    fn pause_music(&mut self) {
        Music::pause();
        self.music_clock.pause();
    }

    fn resume_music(&mut self) {
        Music::resume();
        self.music_clock.resume();
    }

    fn rewind_music(&mut self) {
        Music::rewind();
        if Music::is_paused() {
            self.music_clock.offset = 0.0;
        } else {
            self.music_clock.start_at(0.0);
        }
    }

    fn seek_music(&mut self, secs: f64) -> Result<(), String> {
        if self.current_music.is_none() {
            return Err("no music playing".to_string());
        }
        Music::set_pos(secs)?;
        if Music::is_paused() {
            self.music_clock.offset = secs;
        } else {
            self.music_clock.start_at(secs);
        }
        Ok(())
    }

    fn is_music_playing(&self) -> bool {
        Music::is_playing() && !Music::is_paused()
    }

    fn set_music_volume(&mut self, volume: i32) {
        Music::set_volume(volume);
    }

    fn music_position(&self) -> f64 {
        if self.current_music.is_some() {
            self.music_clock.position()
        } else {
            0.0
        }
    }

    // The bundled mixer bindings do not expose track durations.
    fn music_duration(&self, _music: MusicId) -> Option<f64> {
        None
    }
}

impl InputBackend for SdlSystem {
    fn wait_event(&mut self) -> Option<NativeEvent> {
        Some(native_event(self.event_pump.wait_event()))
    }

    fn wait_event_timeout(&mut self, timeout_ms: u32) -> Option<NativeEvent> {
        self.event_pump.wait_event_timeout(timeout_ms).map(native_event)
    }

    fn pressed_scancodes(&mut self) -> Vec<i32> {
        self.event_pump.pump_events();
        self.event_pump
            .keyboard_state()
            .pressed_scancodes()
            .map(|s| s as i32)
            .collect()
    }

    fn mouse_state(&mut self) -> NativeMouseState {
        self.event_pump.pump_events();
        let state = self.event_pump.mouse_state();
        NativeMouseState {
            x: state.x(),
            y: state.y(),
            left: state.left(),
            middle: state.middle(),
            right: state.right(),
            x1: state.x1(),
            x2: state.x2(),
        }
    }

    fn warp_mouse(&mut self, window: WindowId, x: i32, y: i32) {
        if let Some(w) = self.windows.get(&window) {
            self.ctx.mouse().warp_mouse_in_window(w.canvas.window(), x, y);
        }
    }

    fn init_joysticks(&mut self) -> Result<(), String> {
        if self.joystick_subsystem.is_none() {
            self.joystick_subsystem = Some(self.ctx.joystick()?);
        }
        if self.controller_subsystem.is_none() {
            self.controller_subsystem = Some(self.ctx.game_controller()?);
        }
        Ok(())
    }

    fn quit_joysticks(&mut self) {
        self.joysticks.clear();
        self.controller_subsystem = None;
        self.joystick_subsystem = None;
    }

    fn joystick_count(&mut self) -> i32 {
        match &self.joystick_subsystem {
            Some(subsystem) => subsystem.num_joysticks().map_or(0, |n| n as i32),
            None => 0,
        }
    }

    fn open_joystick(&mut self, device_index: i32) -> Result<NativeJoystick, String> {
        let index = device_index as u32;
        let controllers = self
            .controller_subsystem
            .as_ref()
            .ok_or_else(|| "joysticks not initialized".to_string())?;
        let (device, name, is_controller) = if controllers.is_game_controller(index) {
            let controller = controllers.open(index).map_err(|e| e.to_string())?;
            let name = controller.name();
            (OpenJoystick::Controller(controller), name, true)
        } else {
            let joystick = self
                .joystick_subsystem
                .as_ref()
                .ok_or_else(|| "joysticks not initialized".to_string())?
                .open(index)
                .map_err(|e| e.to_string())?;
            let name = joystick.name();
            (OpenJoystick::Joystick(joystick), name, false)
        };
        debug!("Opened joystick {} ({})", device_index, name);

        let id = JoystickId(self.next_id());
        self.joysticks.insert(id, device);
        Ok(NativeJoystick {
            id,
            name: Some(name).filter(|n| !n.is_empty()),
            is_controller,
        })
    }

    fn close_joystick(&mut self, joystick: JoystickId) {
        self.joysticks.remove(&joystick);
    }

    fn joystick_attached(&self, joystick: JoystickId) -> bool {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Controller(c)) => c.attached(),
            Some(OpenJoystick::Joystick(j)) => j.attached(),
            None => false,
        }
    }

    fn joystick_num_axes(&self, joystick: JoystickId) -> i32 {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Controller(_)) => 6,
            Some(OpenJoystick::Joystick(j)) => j.num_axes() as i32,
            None => 0,
        }
    }

    fn joystick_num_buttons(&self, joystick: JoystickId) -> i32 {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Controller(_)) => 15,
            Some(OpenJoystick::Joystick(j)) => j.num_buttons() as i32,
            None => 0,
        }
    }

    fn joystick_axis(&self, joystick: JoystickId, axis: i32) -> i16 {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Joystick(j)) => j.axis(axis as u32).unwrap_or(0),
            Some(OpenJoystick::Controller(_)) => match num_traits::FromPrimitive::from_i32(axis) {
                Some(axis) => self.controller_axis(joystick, axis),
                None => 0,
            },
            None => 0,
        }
    }

    fn joystick_button(&self, joystick: JoystickId, button: i32) -> bool {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Joystick(j)) => j.button(button as u32).unwrap_or(false),
            Some(OpenJoystick::Controller(_)) => {
                match num_traits::FromPrimitive::from_i32(button) {
                    Some(button) => self.controller_button(joystick, button),
                    None => false,
                }
            }
            None => false,
        }
    }

    fn controller_axis(&self, joystick: JoystickId, axis: ControllerAxis) -> i16 {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Controller(c)) => c.axis(sdl_axis(axis)),
            _ => 0,
        }
    }

    fn controller_button(&self, joystick: JoystickId, button: ControllerButton) -> bool {
        match self.joysticks.get(&joystick) {
            Some(OpenJoystick::Controller(c)) => c.button(sdl_button(button)),
            _ => false,
        }
    }
}

/// Runs on SDL's timer thread. The callback owns one reference to its
/// registration and releases it, ending the SDL timer, once it is cancelled.
unsafe extern "C" fn timer_callback(_interval: u32, param: *mut c_void) -> u32 {
    let registration = param as *const TimerRegistration;
    match (*registration).tick() {
        Some(next) => next,
        None => {
            drop(Arc::from_raw(registration));
            0
        }
    }
}

impl TimerBackend for SdlSystem {
    fn init_timers(&mut self) -> Result<(), String> {
        if self.timer_subsystem.is_none() {
            self.timer_subsystem = Some(self.ctx.timer()?);
        }
        Ok(())
    }

    fn add_timer(&mut self, ticks: Arc<TimerTicks>) -> Result<TimerId, String> {
        let registration = Arc::new(TimerRegistration::new(ticks));
        let interval = registration.interval_ms();
        let raw = Arc::into_raw(Arc::clone(&registration));
        let id = unsafe {
            sdl2::sys::SDL_AddTimer(interval, Some(timer_callback), raw as *mut c_void)
        };
        if id == 0 {
            unsafe { drop(Arc::from_raw(raw)) };
            return Err(sdl2::get_error());
        }
        let timer = TimerId(self.next_id());
        self.timers.insert(timer, registration);
        Ok(timer)
    }

    // The SDL timer is not removed here: its callback may be running, so it
    // sees the cancellation on its next firing and drops its own reference.
    fn remove_timer(&mut self, timer: TimerId) {
        if let Some(registration) = self.timers.remove(&timer) {
            registration.cancel();
        }
    }

    fn ticks_ms(&self) -> u32 {
        match &self.timer_subsystem {
            Some(timer) => timer.ticks(),
            None => unsafe { sdl2::sys::SDL_GetTicks() },
        }
    }
}
