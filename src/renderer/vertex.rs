//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// Simple 2D vertex with position and color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Logical screen position to normalized device coordinates (y flips)
pub fn to_ndc(v: Vertex, width: f32, height: f32) -> Vertex {
    Vertex::new(
        v.position[0] / width * 2.0 - 1.0,
        1.0 - v.position[1] / height * 2.0,
        v.color,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners() {
        let c = [1.0; 4];
        assert_eq!(to_ndc(Vertex::new(0.0, 0.0, c), 360.0, 640.0).position, [-1.0, 1.0]);
        assert_eq!(to_ndc(Vertex::new(360.0, 640.0, c), 360.0, 640.0).position, [1.0, -1.0]);
        assert_eq!(to_ndc(Vertex::new(180.0, 320.0, c), 360.0, 640.0).position, [0.0, 0.0]);
    }
}
