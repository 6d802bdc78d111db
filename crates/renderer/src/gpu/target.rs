/// Texel format of the off-screen render target. Readbacks arrive as BGRA.
pub(crate) const RENDER_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8Unorm;

/// Off-screen texture the fractal is drawn into at render-buffer resolution.
///
/// Rows are stored bottom-up: row 0 holds the lowest imaginary values. The
/// present pass and the capture path both account for this.
pub(crate) struct RenderTarget {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub present_bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        bind: impl FnOnce(&wgpu::TextureView) -> wgpu::BindGroup,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("fractal render target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: RENDER_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let present_bind_group = bind(&view);
        Self {
            texture,
            view,
            present_bind_group,
            width,
            height,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Clamps a requested render-buffer size to what the device can allocate.
pub(crate) fn fit_to_limit(size: (u32, u32), max_dimension: u32) -> (u32, u32) {
    let (width, height) = (size.0.max(1), size.1.max(1));
    let largest = width.max(height);
    if largest <= max_dimension {
        return (width, height);
    }
    let ratio = f64::from(max_dimension) / f64::from(largest);
    (
        ((f64::from(width) * ratio).floor() as u32).clamp(1, max_dimension),
        ((f64::from(height) * ratio).floor() as u32).clamp(1, max_dimension),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_within_limit_are_kept() {
        assert_eq!(fit_to_limit((1920, 1080), 8192), (1920, 1080));
        assert_eq!(fit_to_limit((0, 0), 8192), (1, 1));
    }

    #[test]
    fn oversized_targets_shrink_proportionally() {
        assert_eq!(fit_to_limit((16384, 8192), 8192), (8192, 4096));
        assert_eq!(fit_to_limit((100, 20000), 2000), (10, 2000));
    }
}
