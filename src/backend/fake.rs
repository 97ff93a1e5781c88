//! In-memory backend for tests. Records draw commands, channel and music
//! state, replays scripted native events and drives timers from plain
//! threads.

use super::*;
use crate::context::with_context;
use crate::timer::{TimerRegistration, TimerTicks};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Channels available before any are reserved.
const DEFAULT_CHANNELS: i32 = 8;

#[derive(Debug)]
pub struct FakeWindow {
    pub spec: WindowSpec,
    pub state: WindowState,
    pub size: (u32, u32),
    pub position: (i32, i32),
    pub textures: BTreeMap<TextureId, (u32, u32)>,
    pub target: Option<TextureId>,
    pub clip: Option<IRect>,
    pub commands: Vec<DrawCommand>,
    pub presents: u32,
}

#[derive(Debug)]
pub struct FakeSurface {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Rgba8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeChannel {
    pub chunk: ChunkId,
    pub loops: i32,
    pub volume: i32,
    pub playing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeJoystick {
    pub name: Option<String>,
    pub is_controller: bool,
    pub axes: Vec<i16>,
    pub buttons: Vec<bool>,
    pub attached: bool,
}

pub struct FakeState {
    next_id: u32,
    started: Instant,

    pub windows: BTreeMap<WindowId, FakeWindow>,
    pub surfaces: BTreeMap<SurfaceId, FakeSurface>,

    pub events: VecDeque<NativeEvent>,
    pub pressed: Vec<i32>,
    pub mouse: NativeMouseState,
    pub joysticks: Vec<FakeJoystick>,

    pub audio_spec: Option<AudioSpec>,
    pub allocated_channels: i32,
    /// Byte length given to the next chunk loaded from a path.
    pub next_chunk_len: u32,
    pub chunks: BTreeMap<ChunkId, u32>,
    pub channels: BTreeMap<i32, FakeChannel>,

    /// Loaded music tracks and their durations.
    pub music: BTreeMap<MusicId, Option<f64>>,
    pub next_music_duration: Option<f64>,
    pub current_music: Option<MusicId>,
    pub music_loops: i32,
    pub music_paused: bool,
    pub music_volume: i32,
    pub music_position: f64,

    timers: BTreeMap<TimerId, Arc<TimerRegistration>>,
}

impl Default for FakeState {
    fn default() -> FakeState {
        FakeState {
            next_id: 1,
            started: Instant::now(),
            windows: BTreeMap::new(),
            surfaces: BTreeMap::new(),
            events: VecDeque::new(),
            pressed: Vec::new(),
            mouse: NativeMouseState::default(),
            joysticks: Vec::new(),
            audio_spec: None,
            allocated_channels: DEFAULT_CHANNELS,
            next_chunk_len: 0,
            chunks: BTreeMap::new(),
            channels: BTreeMap::new(),
            music: BTreeMap::new(),
            next_music_duration: None,
            current_music: None,
            music_loops: 0,
            music_paused: false,
            music_volume: 128,
            music_position: 0.0,
            timers: BTreeMap::new(),
        }
    }
}

impl Drop for FakeState {
    fn drop(&mut self) {
        for registration in self.timers.values() {
            registration.cancel();
        }
    }
}

impl FakeState {
    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn script(&mut self, events: Vec<NativeEvent>) {
        self.events.extend(events);
    }

    pub fn first_window(&self) -> &FakeWindow {
        self.windows.values().next().expect("no window was created")
    }

    pub fn texture_count(&self) -> usize {
        self.windows.values().map(|w| w.textures.len()).sum()
    }

    pub fn paint_surfaces(&mut self, color: Rgba8) {
        for surface in self.surfaces.values_mut() {
            for pixel in surface.pixels.iter_mut() {
                *pixel = color;
            }
        }
    }

    pub fn is_playing(&self, channel: i32) -> bool {
        self.channels.get(&channel).map_or(false, |c| c.playing)
    }

    pub fn playing_channels(&self) -> usize {
        self.channels.values().filter(|c| c.playing).count()
    }

    /// Ends playback on `channel` as if the chunk had finished.
    pub fn halt(&mut self, channel: i32) {
        if channel < 0 {
            for c in self.channels.values_mut() {
                c.playing = false;
            }
        } else if let Some(c) = self.channels.get_mut(&channel) {
            c.playing = false;
        }
    }

    pub fn running_timers(&self) -> usize {
        self.timers.len()
    }

    fn window(&self, window: WindowId) -> Result<&FakeWindow, String> {
        self.windows.get(&window).ok_or_else(|| format!("no window {:?}", window))
    }

    fn window_mut(&mut self, window: WindowId) -> Result<&mut FakeWindow, String> {
        self.windows.get_mut(&window).ok_or_else(|| format!("no window {:?}", window))
    }

    fn joystick(&self, joystick: JoystickId) -> Option<&FakeJoystick> {
        self.joysticks.get(joystick.0 as usize)
    }
}

pub struct FakeBackend(Rc<RefCell<FakeState>>);

thread_local! {
    static INSTALLED: RefCell<Option<Rc<RefCell<FakeState>>>> = RefCell::new(None);
}

/// Installs a fresh fake as this thread's backend and returns its state.
pub fn install() -> Rc<RefCell<FakeState>> {
    let state = Rc::new(RefCell::new(FakeState::default()));
    with_context(|ctx| ctx.backend = Some(Box::new(FakeBackend(Rc::clone(&state)))));
    INSTALLED.with(|installed| *installed.borrow_mut() = Some(Rc::clone(&state)));
    state
}

/// Drains the commands recorded against the first window.
pub fn take_commands() -> Vec<DrawCommand> {
    INSTALLED.with(|installed| match installed.borrow().as_ref() {
        Some(state) => state
            .borrow_mut()
            .windows
            .values_mut()
            .next()
            .map(|w| std::mem::take(&mut w.commands))
            .unwrap_or_default(),
        None => Vec::new(),
    })
}

impl VideoBackend for FakeBackend {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, String> {
        let mut state = self.0.borrow_mut();
        let id = WindowId(state.next_id());
        state.windows.insert(
            id,
            FakeWindow {
                spec: spec.clone(),
                state: WindowState {
                    fullscreen: spec.fullscreen == FullscreenMode::Exclusive,
                    fullscreen_desktop: spec.fullscreen == FullscreenMode::Desktop,
                    resizable: spec.resizable,
                    borderless: spec.borderless,
                    minimized: false,
                    maximized: false,
                },
                size: (spec.width, spec.height),
                position: spec.position.unwrap_or((0, 0)),
                textures: BTreeMap::new(),
                target: None,
                clip: None,
                commands: Vec::new(),
                presents: 0,
            },
        );
        Ok(id)
    }

    fn destroy_window(&mut self, window: WindowId) {
        self.0.borrow_mut().windows.remove(&window);
    }

    fn window_state(&self, window: WindowId) -> WindowState {
        self.0.borrow().window(window).map(|w| w.state).unwrap_or_default()
    }

    fn set_fullscreen(&mut self, window: WindowId, mode: FullscreenMode) -> Result<(), String> {
        let mut state = self.0.borrow_mut();
        let w = state.window_mut(window)?;
        w.state.fullscreen = mode == FullscreenMode::Exclusive;
        w.state.fullscreen_desktop = mode == FullscreenMode::Desktop;
        Ok(())
    }

    fn set_resizable(&mut self, window: WindowId, resizable: bool) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.state.resizable = resizable;
        }
    }

    fn minimize_window(&mut self, window: WindowId) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.state.minimized = true;
            w.state.maximized = false;
        }
    }

    fn maximize_window(&mut self, window: WindowId) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.state.maximized = true;
            w.state.minimized = false;
        }
    }

    fn restore_window(&mut self, window: WindowId) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.state.maximized = false;
            w.state.minimized = false;
        }
    }

    fn set_window_title(&mut self, window: WindowId, title: &str) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.spec.title = title.to_string();
        }
    }

    fn set_window_size(&mut self, window: WindowId, width: u32, height: u32) -> Result<(), String> {
        self.0.borrow_mut().window_mut(window)?.size = (width, height);
        Ok(())
    }

    fn window_size(&self, window: WindowId) -> (u32, u32) {
        self.0.borrow().window(window).map_or((0, 0), |w| w.size)
    }

    fn set_window_position(&mut self, window: WindowId, x: i32, y: i32) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.position = (x, y);
        }
    }

    fn window_position(&self, window: WindowId) -> (i32, i32) {
        self.0.borrow().window(window).map_or((0, 0), |w| w.position)
    }

    fn present(&mut self, window: WindowId) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.presents += 1;
        }
    }

    fn create_texture(&mut self, window: WindowId, width: u32, height: u32) -> Result<TextureId, String> {
        let mut state = self.0.borrow_mut();
        let id = TextureId(state.next_id());
        state.window_mut(window)?.textures.insert(id, (width, height));
        Ok(id)
    }

    fn destroy_texture(&mut self, window: WindowId, texture: TextureId) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.textures.remove(&texture);
            if w.target == Some(texture) {
                w.target = None;
            }
        }
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<SurfaceId, String> {
        let mut state = self.0.borrow_mut();
        let id = SurfaceId(state.next_id());
        let transparent = Rgba8 { r: 0, g: 0, b: 0, a: 0 };
        state.surfaces.insert(
            id,
            FakeSurface {
                width,
                height,
                pixels: vec![transparent; (width * height) as usize],
            },
        );
        Ok(id)
    }

    fn destroy_surface(&mut self, surface: SurfaceId) {
        self.0.borrow_mut().surfaces.remove(&surface);
    }

    fn surface_pixel(&self, surface: SurfaceId, x: i32, y: i32) -> Option<Rgba8> {
        let state = self.0.borrow();
        let surface = state.surfaces.get(&surface)?;
        if x < 0 || y < 0 || x as u32 >= surface.width || y as u32 >= surface.height {
            return None;
        }
        surface.pixels.get((y as u32 * surface.width + x as u32) as usize).copied()
    }

    fn set_render_target(&mut self, window: WindowId, target: Option<TextureId>) -> Result<(), String> {
        let mut state = self.0.borrow_mut();
        let w = state.window_mut(window)?;
        if let Some(texture) = target {
            if !w.textures.contains_key(&texture) {
                return Err(format!("no texture {:?}", texture));
            }
        }
        w.target = target;
        Ok(())
    }

    fn set_clip_rect(&mut self, window: WindowId, rect: Option<IRect>) {
        if let Ok(w) = self.0.borrow_mut().window_mut(window) {
            w.clip = rect;
        }
    }

    fn draw(&mut self, window: WindowId, command: DrawCommand) -> Result<(), String> {
        self.0.borrow_mut().window_mut(window)?.commands.push(command);
        Ok(())
    }
}

impl AudioBackend for FakeBackend {
    fn init_codecs(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn open_audio(&mut self, spec: AudioSpec) -> Result<(), String> {
        self.0.borrow_mut().audio_spec = Some(spec);
        Ok(())
    }

    fn close_audio(&mut self) {
        let mut state = self.0.borrow_mut();
        state.audio_spec = None;
        state.halt(-1);
    }

    fn allocate_channels(&mut self, count: i32) -> i32 {
        self.0.borrow_mut().allocated_channels = count;
        count
    }

    fn load_chunk(&mut self, _path: &Path) -> Result<ChunkId, String> {
        let mut state = self.0.borrow_mut();
        let id = ChunkId(state.next_id());
        let len = state.next_chunk_len;
        state.chunks.insert(id, len);
        Ok(id)
    }

    fn load_chunk_from_bytes(&mut self, bytes: &[u8]) -> Result<ChunkId, String> {
        let mut state = self.0.borrow_mut();
        let id = ChunkId(state.next_id());
        state.chunks.insert(id, bytes.len() as u32);
        Ok(id)
    }

    fn create_chunk(&mut self, pcm: &[i16]) -> Result<ChunkId, String> {
        let mut state = self.0.borrow_mut();
        let id = ChunkId(state.next_id());
        state.chunks.insert(id, (pcm.len() * 2) as u32);
        Ok(id)
    }

    fn chunk_byte_len(&self, chunk: ChunkId) -> u32 {
        self.0.borrow().chunks.get(&chunk).copied().unwrap_or(0)
    }

    fn free_chunk(&mut self, chunk: ChunkId) {
        self.0.borrow_mut().chunks.remove(&chunk);
    }

    fn play_chunk(&mut self, chunk: ChunkId, loops: i32) -> Result<i32, String> {
        let mut state = self.0.borrow_mut();
        if !state.chunks.contains_key(&chunk) {
            return Err(format!("no chunk {:?}", chunk));
        }
        let free = (0..state.allocated_channels).find(|c| !state.is_playing(*c));
        let channel = free.ok_or_else(|| "no free channels".to_string())?;
        state.channels.insert(
            channel,
            FakeChannel {
                chunk,
                loops,
                volume: 128,
                playing: true,
            },
        );
        Ok(channel)
    }

    fn halt_channel(&mut self, channel: i32) {
        self.0.borrow_mut().halt(channel)
    }

    fn is_channel_playing(&self, channel: i32) -> bool {
        self.0.borrow().is_playing(channel)
    }

    fn set_channel_volume(&mut self, channel: i32, volume: i32) {
        if let Some(c) = self.0.borrow_mut().channels.get_mut(&channel) {
            c.volume = volume;
        }
    }

    fn load_music(&mut self, _path: &Path) -> Result<MusicId, String> {
        let mut state = self.0.borrow_mut();
        let id = MusicId(state.next_id());
        let duration = state.next_music_duration;
        state.music.insert(id, duration);
        Ok(id)
    }

    fn free_music(&mut self, music: MusicId) {
        let mut state = self.0.borrow_mut();
        state.music.remove(&music);
        if state.current_music == Some(music) {
            state.current_music = None;
        }
    }

    fn play_music(&mut self, music: MusicId, loops: i32) -> Result<(), String> {
        let mut state = self.0.borrow_mut();
        if !state.music.contains_key(&music) {
            return Err(format!("no music {:?}", music));
        }
        state.current_music = Some(music);
        state.music_loops = loops;
        state.music_paused = false;
        state.music_position = 0.0;
        Ok(())
    }

    fn halt_music(&mut self) {
        let mut state = self.0.borrow_mut();
        state.current_music = None;
        state.music_paused = false;
    }

    fn pause_music(&mut self) {
        self.0.borrow_mut().music_paused = true;
    }

    fn resume_music(&mut self) {
        self.0.borrow_mut().music_paused = false;
    }

    fn rewind_music(&mut self) {
        self.0.borrow_mut().music_position = 0.0;
    }

    fn seek_music(&mut self, secs: f64) -> Result<(), String> {
        let mut state = self.0.borrow_mut();
        if state.current_music.is_none() {
            return Err("no music playing".to_string());
        }
        state.music_position = secs;
        Ok(())
    }

    fn is_music_playing(&self) -> bool {
        let state = self.0.borrow();
        state.current_music.is_some() && !state.music_paused
    }

    fn set_music_volume(&mut self, volume: i32) {
        self.0.borrow_mut().music_volume = volume;
    }

    fn music_position(&self) -> f64 {
        self.0.borrow().music_position
    }

    fn music_duration(&self, music: MusicId) -> Option<f64> {
        self.0.borrow().music.get(&music).copied().flatten()
    }
}

impl InputBackend for FakeBackend {
    fn wait_event(&mut self) -> Option<NativeEvent> {
        self.0.borrow_mut().events.pop_front()
    }

    fn wait_event_timeout(&mut self, _timeout_ms: u32) -> Option<NativeEvent> {
        self.0.borrow_mut().events.pop_front()
    }

    fn pressed_scancodes(&mut self) -> Vec<i32> {
        self.0.borrow().pressed.clone()
    }

    fn mouse_state(&mut self) -> NativeMouseState {
        self.0.borrow().mouse
    }

    fn warp_mouse(&mut self, _window: WindowId, x: i32, y: i32) {
        let mut state = self.0.borrow_mut();
        state.mouse.x = x;
        state.mouse.y = y;
    }

    fn init_joysticks(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn quit_joysticks(&mut self) {}

    fn joystick_count(&mut self) -> i32 {
        self.0.borrow().joysticks.len() as i32
    }

    fn open_joystick(&mut self, device_index: i32) -> Result<NativeJoystick, String> {
        let state = self.0.borrow();
        let joystick = state
            .joysticks
            .get(device_index as usize)
            .ok_or_else(|| format!("no joystick {}", device_index))?;
        Ok(NativeJoystick {
            id: JoystickId(device_index as u32),
            name: joystick.name.clone(),
            is_controller: joystick.is_controller,
        })
    }

    fn close_joystick(&mut self, _joystick: JoystickId) {}

    fn joystick_attached(&self, joystick: JoystickId) -> bool {
        self.0.borrow().joystick(joystick).map_or(false, |j| j.attached)
    }

    fn joystick_num_axes(&self, joystick: JoystickId) -> i32 {
        self.0.borrow().joystick(joystick).map_or(0, |j| j.axes.len() as i32)
    }

    fn joystick_num_buttons(&self, joystick: JoystickId) -> i32 {
        self.0.borrow().joystick(joystick).map_or(0, |j| j.buttons.len() as i32)
    }

    fn joystick_axis(&self, joystick: JoystickId, axis: i32) -> i16 {
        let state = self.0.borrow();
        state
            .joystick(joystick)
            .and_then(|j| j.axes.get(axis as usize).copied())
            .unwrap_or(0)
    }

    fn joystick_button(&self, joystick: JoystickId, button: i32) -> bool {
        let state = self.0.borrow();
        state
            .joystick(joystick)
            .and_then(|j| j.buttons.get(button as usize).copied())
            .unwrap_or(false)
    }

    fn controller_axis(&self, joystick: JoystickId, axis: ControllerAxis) -> i16 {
        self.joystick_axis(joystick, axis as i32)
    }

    fn controller_button(&self, joystick: JoystickId, button: ControllerButton) -> bool {
        self.joystick_button(joystick, button as i32)
    }
}

impl TimerBackend for FakeBackend {
    fn init_timers(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn add_timer(&mut self, ticks: Arc<TimerTicks>) -> Result<TimerId, String> {
        let registration = Arc::new(TimerRegistration::new(ticks));
        let thread_registration = Arc::clone(&registration);
        thread::spawn(move || {
            let mut delay = thread_registration.interval_ms();
            loop {
                thread::sleep(Duration::from_millis(delay as u64));
                match thread_registration.tick() {
                    Some(next) => delay = next,
                    None => break,
                }
            }
        });

        let mut state = self.0.borrow_mut();
        let id = TimerId(state.next_id());
        state.timers.insert(id, registration);
        Ok(id)
    }

    fn remove_timer(&mut self, timer: TimerId) {
        if let Some(registration) = self.0.borrow_mut().timers.remove(&timer) {
            registration.cancel();
        }
    }

    fn ticks_ms(&self) -> u32 {
        self.0.borrow().started.elapsed().as_millis() as u32
    }
}
