use bytemuck::{Pod, Zeroable};
use viewstate::ViewTransform;

/// CPU mirror of the `FractalParams` block in `fragmentshader.glsl`.
///
/// All plane math happens in `f64`; values are narrowed to `f32` only when the
/// block is filled.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct FractalUniforms {
    pub gaussian_position: [f32; 2],
    pub gaussian_half_frame: [f32; 2],
    pub iterations: u32,
    pub _padding: [u32; 3],
}

unsafe impl Zeroable for FractalUniforms {}
unsafe impl Pod for FractalUniforms {}

impl FractalUniforms {
    /// `logical_size` is the visible frame in logical pixels.
    pub fn new(view: &ViewTransform, logical_size: (f64, f64), iterations: u32) -> Self {
        let (half_width, half_height) = view.half_frame(logical_size.0, logical_size.1);
        Self {
            gaussian_position: [view.position_x() as f32, view.position_y() as f32],
            gaussian_half_frame: [half_width as f32, half_height as f32],
            iterations,
            _padding: [0; 3],
        }
    }
}

/// Vertex of the full-view quad, in normalised device coordinates.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub(crate) struct QuadVertex {
    pub position: [f32; 2],
}

unsafe impl Zeroable for QuadVertex {}
unsafe impl Pod for QuadVertex {}

/// Triangle-strip order: bottom-left, bottom-right, top-left, top-right.
pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0],
    },
    QuadVertex {
        position: [1.0, -1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0],
    },
];

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn fractal_uniforms_follow_std140_layout() {
        let uniforms = FractalUniforms::new(&ViewTransform::default(), (300.0, 150.0), 50);
        let base = &uniforms as *const _ as usize;

        assert_eq!(align_of::<FractalUniforms>(), 16);
        assert_eq!(size_of::<FractalUniforms>(), 32);
        assert_eq!((&uniforms.gaussian_position as *const _ as usize) - base, 0);
        assert_eq!((&uniforms.gaussian_half_frame as *const _ as usize) - base, 8);
        assert_eq!((&uniforms.iterations as *const _ as usize) - base, 16);
    }

    #[test]
    fn half_frame_is_half_the_view_over_scale() {
        let view = ViewTransform::new(-0.5, 0.25, 100.0);
        let uniforms = FractalUniforms::new(&view, (300.0, 150.0), 120);
        assert_eq!(uniforms.gaussian_position, [-0.5, 0.25]);
        assert_eq!(uniforms.gaussian_half_frame, [1.5, 0.75]);
        assert_eq!(uniforms.iterations, 120);
    }

    #[test]
    fn deep_zoom_narrows_after_double_math() {
        let view = ViewTransform::new(0.0, 0.0, 1e8);
        let uniforms = FractalUniforms::new(&view, (1080.0, 1920.0), 50);
        assert_eq!(uniforms.gaussian_half_frame[0], (540.0f64 / 1e8) as f32);
        assert_eq!(uniforms.gaussian_half_frame[1], (960.0f64 / 1e8) as f32);
    }

    #[test]
    fn quad_covers_clip_space_as_a_strip() {
        let corners: Vec<_> = QUAD_VERTICES.iter().map(|v| v.position).collect();
        assert_eq!(
            corners,
            vec![[-1.0, -1.0], [1.0, -1.0], [-1.0, 1.0], [1.0, 1.0]]
        );
        assert_eq!(bytemuck::cast_slice::<_, f32>(&QUAD_VERTICES).len(), 8);
    }
}
