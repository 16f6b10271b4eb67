//! Shape generation for 2D primitives

use glam::Vec2;
use std::f32::consts::PI;

use super::frame::DrawCmd;
use super::vertex::Vertex;

/// Segments for a circle of the given radius (logical units)
fn segments_for(radius: f32) -> u32 {
    ((radius * 1.5) as u32).clamp(8, 48)
}

/// Generate vertices for an axis-aligned rectangle
pub fn rect(pos: Vec2, size: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    let (x0, y0) = (pos.x, pos.y);
    let (x1, y1) = (pos.x + size.x, pos.y + size.y);
    vec![
        Vertex::new(x0, y0, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x0, y1, color),
        Vertex::new(x1, y0, color),
        Vertex::new(x1, y1, color),
    ]
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a ring (hollow circle)
pub fn ring(
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 6) as usize);
    let at = |r: f32, theta: f32| center + Vec2::new(r * theta.cos(), r * theta.sin());

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        let inner1 = at(inner_radius, theta1);
        let outer1 = at(outer_radius, theta1);
        let inner2 = at(inner_radius, theta2);
        let outer2 = at(outer_radius, theta2);

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Triangles for every geometric command, in draw order. Glyphs and text are
/// skipped; the host overlay draws those.
pub fn tessellate(commands: &[DrawCmd]) -> Vec<Vertex> {
    let mut vertices = Vec::new();
    for cmd in commands {
        match cmd {
            DrawCmd::Rect { pos, size, color } => vertices.extend(rect(*pos, *size, *color)),
            DrawCmd::Circle {
                center,
                radius,
                color,
            } => vertices.extend(circle(*center, *radius, *color, segments_for(*radius))),
            DrawCmd::Ring {
                center,
                inner,
                outer,
                color,
            } => vertices.extend(ring(*center, *inner, *outer, *color, segments_for(*outer))),
            DrawCmd::Glyph { .. } | DrawCmd::Text { .. } => {}
        }
    }
    vertices
}
