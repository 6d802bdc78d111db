use viewstate::Hue;
use wgpu::util::{DeviceExt, TextureDataOrder};

use crate::assets::AssetLoader;
use crate::error::RendererError;

const BYTES_PER_TEXEL: usize = 4;

/// A validated one-row RGBA8 colour ramp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PaletteRamp {
    width: u32,
    texels: Vec<u8>,
}

impl PaletteRamp {
    /// Interprets `bytes` as `width = len / 4` RGBA texels.
    pub fn parse(asset: &str, bytes: Vec<u8>, max_width: u32) -> Result<Self, RendererError> {
        let invalid = |reason: String| RendererError::Palette {
            asset: asset.to_string(),
            reason,
        };
        if bytes.is_empty() {
            return Err(invalid("file is empty".to_string()));
        }
        if bytes.len() % BYTES_PER_TEXEL != 0 {
            return Err(invalid(format!(
                "length {} is not a multiple of {BYTES_PER_TEXEL}",
                bytes.len()
            )));
        }
        let texels = bytes.len() / BYTES_PER_TEXEL;
        let width = u32::try_from(texels)
            .ok()
            .filter(|width| *width <= max_width)
            .ok_or_else(|| {
                invalid(format!(
                    "{texels} texels exceed the GPU limit of {max_width}"
                ))
            })?;
        Ok(Self {
            width,
            texels: bytes,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn texels(&self) -> &[u8] {
        &self.texels
    }
}

pub(crate) fn bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("palette layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

struct PaletteTexture {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// All four palette textures, uploaded once; switching hues only rebinds.
pub(crate) struct PaletteTextureBank {
    textures: Vec<PaletteTexture>,
    active: Hue,
}

impl PaletteTextureBank {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
        assets: &dyn AssetLoader,
        max_width: u32,
        initial: Hue,
    ) -> Result<Self, RendererError> {
        // Exact lookups at texel centres: no filtering, no wrap-around.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("palette sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let mut textures = Vec::with_capacity(Hue::ALL.len());
        for hue in Hue::ALL {
            let asset = hue.asset_name();
            let ramp = PaletteRamp::parse(asset, assets.load_bytes(asset)?, max_width)?;
            let texture = device.create_texture_with_data(
                queue,
                &wgpu::TextureDescriptor {
                    label: Some(asset),
                    size: wgpu::Extent3d {
                        width: ramp.width(),
                        height: 1,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                    view_formats: &[],
                },
                TextureDataOrder::LayerMajor,
                ramp.texels(),
            );
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(asset),
                layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });
            tracing::debug!(hue = %hue, width = ramp.width(), "uploaded palette");
            textures.push(PaletteTexture {
                _texture: texture,
                bind_group,
            });
        }

        Ok(Self {
            textures,
            active: initial,
        })
    }

    /// Makes `hue` the palette used by subsequent draws.
    pub fn bind(&mut self, hue: Hue) {
        if self.active != hue {
            tracing::debug!(from = %self.active, to = %hue, "switching palette");
        }
        self.active = hue;
    }

    pub fn active(&self) -> Hue {
        self.active
    }

    pub fn active_bind_group(&self) -> &wgpu::BindGroup {
        &self.textures[self.active.index()].bind_group
    }
}
