//! Immediate-mode primitives issued against the current target.
//!
//! Curves are flattened into straight segments whose count scales with the
//! radius. Outline thickness is accepted but everything is drawn 1px wide.

// Segment counts depend on these exact truncated constants.
#![allow(clippy::approx_constant)]

use crate::backend::{DrawCommand, IRect, Rgba8, Vertex};
use crate::bitmap::al_put_pixel;
use crate::color::Color;
use crate::context::with_context;

const TAU_APPROX: f32 = 6.28318;

pub fn al_init_primitives_addon() -> bool {
    with_context(|ctx| ctx.primitives_installed = true);
    true
}

pub fn al_shutdown_primitives_addon() {
    with_context(|ctx| ctx.primitives_installed = false)
}

pub fn al_get_allegro_primitives_version() -> u32 {
    crate::al_get_allegro_version()
}

fn submit_all(commands: Vec<DrawCommand>) {
    with_context(|ctx| {
        if ctx.current_window().is_none() {
            return;
        }
        for command in commands {
            ctx.submit(command);
        }
    })
}

fn line(x1: f32, y1: f32, x2: f32, y2: f32, color: Rgba8) -> DrawCommand {
    DrawCommand::Line {
        x1: x1 as i32 as f32,
        y1: y1 as i32 as f32,
        x2: x2 as i32 as f32,
        y2: y2 as i32 as f32,
        color,
    }
}

fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> IRect {
    let (ix1, iy1, ix2, iy2) = (x1 as i32, y1 as i32, x2 as i32, y2 as i32);
    IRect {
        x: ix1,
        y: iy1,
        w: ix2 - ix1,
        h: iy2 - iy1,
    }
}

/// Segment count for full circles and ellipses.
fn closed_steps(scaled: f32) -> i32 {
    let segments = scaled as i32;
    if segments > 0 {
        segments
    } else {
        20
    }
}

fn arc_steps(r: f32, delta: f32) -> i32 {
    let segments = (r * delta.abs()) as i32;
    if segments > 2 {
        segments
    } else {
        10
    }
}

fn ellipse_point(cx: f32, cy: f32, rx: f32, ry: f32, angle: f32) -> (f32, f32) {
    (cx + angle.cos() * rx, cy + angle.sin() * ry)
}

fn ellipse_outline(cx: f32, cy: f32, rx: f32, ry: f32, steps: i32, color: Rgba8) -> Vec<DrawCommand> {
    (0..steps)
        .map(|i| {
            let a1 = (i as f32 / steps as f32) * TAU_APPROX;
            let a2 = ((i + 1) as f32 / steps as f32) * TAU_APPROX;
            let (x1, y1) = ellipse_point(cx, cy, rx, ry, a1);
            let (x2, y2) = ellipse_point(cx, cy, rx, ry, a2);
            line(x1, y1, x2, y2, color)
        })
        .collect()
}

fn ellipse_fan(cx: f32, cy: f32, rx: f32, ry: f32, steps: i32, color: Rgba8) -> DrawCommand {
    let mut vertices = Vec::with_capacity(steps as usize * 3);
    for i in 0..steps {
        let a1 = (i as f32 / steps as f32) * TAU_APPROX;
        let a2 = ((i + 1) as f32 / steps as f32) * TAU_APPROX;
        let (x1, y1) = ellipse_point(cx, cy, rx, ry, a1);
        let (x2, y2) = ellipse_point(cx, cy, rx, ry, a2);
        vertices.push(Vertex { x: cx, y: cy, color });
        vertices.push(Vertex { x: x1, y: y1, color });
        vertices.push(Vertex { x: x2, y: y2, color });
    }
    DrawCommand::Geometry {
        vertices,
        indices: None,
    }
}

/// Reads vertex `index` from a float buffer laid out with a byte stride.
fn strided_vertex(vertices: &[f32], stride: i32, index: i32) -> Option<(f32, f32)> {
    if stride <= 0 {
        return None;
    }
    let offset = (index as usize * stride as usize) / std::mem::size_of::<f32>();
    match (vertices.get(offset), vertices.get(offset + 1)) {
        (Some(&x), Some(&y)) => Some((x, y)),
        _ => None,
    }
}

fn collect_vertices(vertices: &[f32], vertex_count: i32, stride: i32) -> Vec<(f32, f32)> {
    (0..vertex_count.max(0))
        .map_while(|i| strided_vertex(vertices, stride, i))
        .collect()
}

pub fn al_draw_line(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, _thickness: f32) {
    submit_all(vec![line(x1, y1, x2, y2, color.to_rgba8())])
}

pub fn al_draw_rectangle(x1: f32, y1: f32, x2: f32, y2: f32, color: Color, _thickness: f32) {
    submit_all(vec![DrawCommand::Rect {
        rect: rect(x1, y1, x2, y2),
        color: color.to_rgba8(),
        filled: false,
    }])
}

pub fn al_draw_filled_rectangle(x1: f32, y1: f32, x2: f32, y2: f32, color: Color) {
    submit_all(vec![DrawCommand::Rect {
        rect: rect(x1, y1, x2, y2),
        color: color.to_rgba8(),
        filled: true,
    }])
}

pub fn al_draw_circle(cx: f32, cy: f32, r: f32, color: Color, _thickness: f32) {
    if r <= 0.0 {
        return;
    }
    let steps = closed_steps(r * 6.28);
    submit_all(ellipse_outline(cx, cy, r, r, steps, color.to_rgba8()))
}

pub fn al_draw_filled_circle(cx: f32, cy: f32, r: f32, color: Color) {
    if r <= 0.0 {
        return;
    }
    let steps = closed_steps(r * 6.28);
    submit_all(vec![ellipse_fan(cx, cy, r, r, steps, color.to_rgba8())])
}

pub fn al_draw_ellipse(cx: f32, cy: f32, rx: f32, ry: f32, color: Color, _thickness: f32) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let steps = closed_steps((rx + ry) * 3.14);
    submit_all(ellipse_outline(cx, cy, rx, ry, steps, color.to_rgba8()))
}

pub fn al_draw_filled_ellipse(cx: f32, cy: f32, rx: f32, ry: f32, color: Color) {
    if rx <= 0.0 || ry <= 0.0 {
        return;
    }
    let steps = closed_steps((rx + ry) * 3.14);
    submit_all(vec![ellipse_fan(cx, cy, rx, ry, steps, color.to_rgba8())])
}

pub fn al_draw_arc(
    cx: f32,
    cy: f32,
    r: f32,
    start_theta: f32,
    delta_theta: f32,
    color: Color,
    _thickness: f32,
) {
    if r <= 0.0 {
        return;
    }
    let color = color.to_rgba8();
    let steps = arc_steps(r, delta_theta);
    let commands = (0..steps)
        .map(|i| {
            let a1 = start_theta + (i as f32 / steps as f32) * delta_theta;
            let a2 = start_theta + ((i + 1) as f32 / steps as f32) * delta_theta;
            let (x1, y1) = ellipse_point(cx, cy, r, r, a1);
            let (x2, y2) = ellipse_point(cx, cy, r, r, a2);
            line(x1, y1, x2, y2, color)
        })
        .collect();
    submit_all(commands)
}

#[allow(clippy::too_many_arguments)]
pub fn al_draw_triangle(
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    x3: f32,
    y3: f32,
    color: Color,
    _thickness: f32,
) {
    let color = color.to_rgba8();
    submit_all(vec![
        line(x1, y1, x2, y2, color),
        line(x2, y2, x3, y3, color),
        line(x3, y3, x1, y1, color),
    ])
}

pub fn al_draw_filled_triangle(x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32, color: Color) {
    let color = color.to_rgba8();
    submit_all(vec![DrawCommand::Geometry {
        vertices: vec![
            Vertex { x: x1, y: y1, color },
            Vertex { x: x2, y: y2, color },
            Vertex { x: x3, y: y3, color },
        ],
        indices: None,
    }])
}

/// Closed outline through `vertex_count` points, `stride` bytes apart.
pub fn al_draw_polygon(vertices: &[f32], vertex_count: i32, stride: i32, color: Color, _thickness: f32) {
    if vertex_count < 3 {
        return;
    }
    let points = collect_vertices(vertices, vertex_count, stride);
    if points.len() < 3 {
        return;
    }
    let color = color.to_rgba8();
    let commands = (0..points.len())
        .map(|i| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % points.len()];
            line(x1, y1, x2, y2, color)
        })
        .collect();
    submit_all(commands)
}

pub fn al_draw_filled_polygon(vertices: &[f32], vertex_count: i32, stride: i32, color: Color) {
    if vertex_count < 3 {
        return;
    }
    let points = collect_vertices(vertices, vertex_count, stride);
    if points.len() < 3 {
        return;
    }
    let color = color.to_rgba8();
    let indices = (1..points.len() as i32 - 1)
        .flat_map(|i| vec![0, i, i + 1])
        .collect();
    submit_all(vec![DrawCommand::Geometry {
        vertices: points
            .into_iter()
            .map(|(x, y)| Vertex { x, y, color })
            .collect(),
        indices: Some(indices),
    }])
}

pub fn al_draw_polyline(
    vertices: &[f32],
    vertex_count: i32,
    stride: i32,
    color: Color,
    _thickness: f32,
    closed: bool,
) {
    if vertex_count < 2 {
        return;
    }
    let points = collect_vertices(vertices, vertex_count, stride);
    if points.len() < 2 {
        return;
    }
    let color = color.to_rgba8();
    let mut commands: Vec<_> = points
        .windows(2)
        .map(|pair| line(pair[0].0, pair[0].1, pair[1].0, pair[1].1, color))
        .collect();
    if closed && points.len() > 2 {
        let (x1, y1) = points[points.len() - 1];
        let (x2, y2) = points[0];
        commands.push(line(x1, y1, x2, y2, color));
    }
    submit_all(commands)
}

pub fn al_draw_pixel(x: f32, y: f32, color: Color) {
    al_put_pixel(x, y, color)
}
