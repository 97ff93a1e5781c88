//! Event records and the FIFO queues that buffer them.
//!
//! Sub-type tags overlap numerically across categories (a key-down and a
//! mouse-axes event are both `1`), so the payload variant is what tells them
//! apart.

use crate::backend::{NativeEvent, NativeMouseButton};
use crate::context::{with_context, Context};
use crate::display::Display;
use crate::keyboard::{keycode_from_scancode, modifiers_from_native};
use log::trace;

pub const ALLEGRO_EVENT_ANY: i32 = 0;
pub const ALLEGRO_EVENT_JOYSTICK: i32 = 1;
pub const ALLEGRO_EVENT_KEYBOARD: i32 = 2;
pub const ALLEGRO_EVENT_MOUSE: i32 = 3;
pub const ALLEGRO_EVENT_TIMER_CATEGORY: i32 = 4;
pub const ALLEGRO_EVENT_DISPLAY: i32 = 5;

pub const ALLEGRO_EVENT_JOYSTICK_AXIS: i32 = 1;
pub const ALLEGRO_EVENT_JOYSTICK_BUTTON_UP: i32 = 2;
pub const ALLEGRO_EVENT_JOYSTICK_BUTTON_DOWN: i32 = 3;
pub const ALLEGRO_EVENT_JOYSTICK_CONFIGURATION: i32 = 4;

pub const ALLEGRO_EVENT_KEY_DOWN: i32 = 1;
pub const ALLEGRO_EVENT_KEY_UP: i32 = 2;
pub const ALLEGRO_EVENT_KEY_CHAR: i32 = 3;

pub const ALLEGRO_EVENT_MOUSE_AXES: i32 = 1;
pub const ALLEGRO_EVENT_MOUSE_BUTTON_DOWN: i32 = 2;
pub const ALLEGRO_EVENT_MOUSE_BUTTON_UP: i32 = 3;
pub const ALLEGRO_EVENT_MOUSE_ENTER_DISPLAY: i32 = 4;
pub const ALLEGRO_EVENT_MOUSE_LEAVE_DISPLAY: i32 = 5;
pub const ALLEGRO_EVENT_MOUSE_WARPED: i32 = 6;

pub const ALLEGRO_EVENT_TIMER: i32 = 1;

pub const ALLEGRO_EVENT_DISPLAY_EXPOSE: i32 = 1;
pub const ALLEGRO_EVENT_DISPLAY_RESIZE: i32 = 2;
pub const ALLEGRO_EVENT_DISPLAY_CLOSE: i32 = 3;
pub const ALLEGRO_EVENT_DISPLAY_FOCUS_LOST: i32 = 4;
pub const ALLEGRO_EVENT_DISPLAY_FOCUS_GAINED: i32 = 5;
pub const ALLEGRO_EVENT_DISPLAY_SWITCH_OUT: i32 = 6;
pub const ALLEGRO_EVENT_DISPLAY_SWITCH_IN: i32 = 7;

/// Placeholder source. Registering one with a queue has no effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventSource {
    pub dummy: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MouseEvent {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub dw: i32,
    pub x: i32,
    pub y: i32,
    pub button: i32,
    pub pressure: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub keycode: i32,
    pub unichar: i32,
    pub modifiers: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoystickEvent {
    pub id: i32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub button: [i32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerEvent {
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayEvent {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EventPayload {
    None,
    Mouse(MouseEvent),
    Keyboard(KeyboardEvent),
    Joystick(JoystickEvent),
    Timer(TimerEvent),
    Display(DisplayEvent),
}

impl Default for EventPayload {
    fn default() -> Self {
        EventPayload::None
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Event {
    pub event_type: i32,
    pub display: Option<Display>,
    pub timestamp: f64,
    pub payload: EventPayload,
}

impl Event {
    pub fn keyboard(&self) -> Option<&KeyboardEvent> {
        match &self.payload {
            EventPayload::Keyboard(keyboard) => Some(keyboard),
            _ => None,
        }
    }

    pub fn mouse(&self) -> Option<&MouseEvent> {
        match &self.payload {
            EventPayload::Mouse(mouse) => Some(mouse),
            _ => None,
        }
    }

    pub fn display_event(&self) -> Option<&DisplayEvent> {
        match &self.payload {
            EventPayload::Display(display) => Some(display),
            _ => None,
        }
    }
}

/// FIFO of translated events with a read cursor. The consumed prefix is
/// discarded once the cursor reaches the middle of the buffer.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<Event>,
    read_index: usize,
}

impl EventQueue {
    pub(crate) fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    fn is_empty(&self) -> bool {
        self.read_index >= self.events.len()
    }

    fn peek(&self) -> Option<Event> {
        self.events.get(self.read_index).copied()
    }

    fn advance(&mut self) {
        if self.is_empty() {
            return;
        }
        self.read_index += 1;
        if self.read_index >= self.events.len() / 2 {
            self.events.drain(..self.read_index);
            self.read_index = 0;
        }
    }

    fn pop(&mut self) -> Option<Event> {
        let event = self.peek()?;
        self.advance();
        Some(event)
    }

    fn flush(&mut self) {
        self.events.clear();
        self.read_index = 0;
    }
}

pub fn al_create_event_queue() -> EventQueue {
    EventQueue::default()
}

pub fn al_destroy_event_queue(queue: EventQueue) {
    drop(queue)
}

pub fn al_is_event_queue_empty(queue: &EventQueue) -> bool {
    queue.is_empty()
}

pub fn al_get_next_event(queue: &mut EventQueue, event: &mut Event) -> bool {
    match queue.pop() {
        Some(next) => {
            *event = next;
            true
        }
        None => false,
    }
}

pub fn al_peek_next_event(queue: &EventQueue, event: &mut Event) -> bool {
    match queue.peek() {
        Some(next) => {
            *event = next;
            true
        }
        None => false,
    }
}

pub fn al_drop_next_event(queue: &mut EventQueue) -> bool {
    let had_event = !queue.is_empty();
    queue.advance();
    had_event
}

pub fn al_flush_event_queue(queue: &mut EventQueue) {
    queue.flush()
}

fn mouse_button_number(button: NativeMouseButton) -> i32 {
    match button {
        NativeMouseButton::Left => 1,
        NativeMouseButton::Right => 2,
        NativeMouseButton::Middle => 3,
        NativeMouseButton::X1 => 4,
        NativeMouseButton::X2 => 5,
        NativeMouseButton::Unknown => 0,
    }
}

fn keyboard(event_type: i32, keycode: i32, modifiers: i32) -> (i32, EventPayload) {
    (
        event_type,
        EventPayload::Keyboard(KeyboardEvent {
            keycode,
            unichar: 0,
            modifiers,
        }),
    )
}

fn mouse_button(event_type: i32, button: NativeMouseButton, x: i32, y: i32) -> (i32, EventPayload) {
    (
        event_type,
        EventPayload::Mouse(MouseEvent {
            x,
            y,
            button: mouse_button_number(button),
            ..MouseEvent::default()
        }),
    )
}

/// Everything the blocking wait understands.
fn translate_full(native: NativeEvent) -> Option<(i32, EventPayload)> {
    let translated = match native {
        NativeEvent::KeyDown { scancode, mods } => keyboard(
            ALLEGRO_EVENT_KEY_DOWN,
            keycode_from_scancode(scancode),
            modifiers_from_native(mods),
        ),
        NativeEvent::KeyUp { scancode, mods } => keyboard(
            ALLEGRO_EVENT_KEY_UP,
            keycode_from_scancode(scancode),
            modifiers_from_native(mods),
        ),
        NativeEvent::MouseButtonDown { button, x, y } => {
            mouse_button(ALLEGRO_EVENT_MOUSE_BUTTON_DOWN, button, x, y)
        }
        NativeEvent::MouseButtonUp { button, x, y } => {
            mouse_button(ALLEGRO_EVENT_MOUSE_BUTTON_UP, button, x, y)
        }
        NativeEvent::MouseMotion { x, y, xrel, yrel } => (
            ALLEGRO_EVENT_MOUSE_AXES,
            EventPayload::Mouse(MouseEvent {
                x,
                y,
                dx: xrel,
                dy: yrel,
                ..MouseEvent::default()
            }),
        ),
        NativeEvent::WindowResized { width, height } => (
            ALLEGRO_EVENT_DISPLAY_RESIZE,
            EventPayload::Display(DisplayEvent {
                width,
                height,
                ..DisplayEvent::default()
            }),
        ),
        NativeEvent::WindowClose => (
            ALLEGRO_EVENT_DISPLAY_CLOSE,
            EventPayload::Display(DisplayEvent::default()),
        ),
        NativeEvent::Other => return None,
    };
    Some(translated)
}

/// The timed wait only recognises key presses and releases, without
/// modifiers.
fn translate_keys(native: NativeEvent) -> Option<(i32, EventPayload)> {
    match native {
        NativeEvent::KeyDown { scancode, .. } => {
            Some(keyboard(ALLEGRO_EVENT_KEY_DOWN, keycode_from_scancode(scancode), 0))
        }
        NativeEvent::KeyUp { scancode, .. } => {
            Some(keyboard(ALLEGRO_EVENT_KEY_UP, keycode_from_scancode(scancode), 0))
        }
        _ => None,
    }
}

enum Pumped {
    Translated(Event),
    Discarded,
    Exhausted,
}

/// Pulls one native event and translates it.
fn pump(
    ctx: &mut Context,
    timeout_ms: Option<u32>,
    translate: fn(NativeEvent) -> Option<(i32, EventPayload)>,
) -> Pumped {
    let display = ctx.display.current;
    let backend = match ctx.backend.as_mut() {
        Some(backend) => backend,
        None => return Pumped::Exhausted,
    };
    let native = match timeout_ms {
        Some(ms) => backend.wait_event_timeout(ms),
        None => backend.wait_event(),
    };
    let native = match native {
        Some(native) => native,
        None => return Pumped::Exhausted,
    };
    trace!("Native event {:?}", native);

    match translate(native) {
        Some((event_type, payload)) => Pumped::Translated(Event {
            event_type,
            display,
            timestamp: backend.ticks_ms() as f64 / 1000.0,
            payload,
        }),
        None => Pumped::Discarded,
    }
}

/// Blocks, translating native events into the queue until at least one is
/// buffered, then pops it.
pub fn al_wait_for_event(queue: &mut EventQueue, event: &mut Event) {
    while queue.is_empty() {
        match with_context(|ctx| pump(ctx, None, translate_full)) {
            Pumped::Translated(translated) => queue.push(translated),
            Pumped::Discarded => {}
            Pumped::Exhausted => return,
        }
    }
    al_get_next_event(queue, event);
}

/// Pops a buffered event, or performs a single bounded native wait.
pub fn al_wait_for_event_timed(queue: &mut EventQueue, event: &mut Event, secs: f32) -> bool {
    if !queue.is_empty() {
        return al_get_next_event(queue, event);
    }
    let timeout_ms = (secs * 1000.0).max(0.0) as u32;
    match with_context(|ctx| pump(ctx, Some(timeout_ms), translate_keys)) {
        Pumped::Translated(translated) => {
            *event = translated;
            true
        }
        Pumped::Discarded | Pumped::Exhausted => false,
    }
}

/// Absolute timeouts are not tracked; this waits for up to a second.
pub fn al_wait_for_event_until(queue: &mut EventQueue, event: &mut Event, _timeout: Option<f64>) -> bool {
    al_wait_for_event_timed(queue, event, 1.0)
}

pub fn al_register_event_source(_queue: &mut EventQueue, _source: &EventSource) {}

pub fn al_unregister_event_source(_queue: &mut EventQueue, _source: &EventSource) {}

pub fn al_init_event_source(source: &mut EventSource) {
    *source = EventSource::default();
}

pub fn al_destroy_event_source(_source: &mut EventSource) {}
