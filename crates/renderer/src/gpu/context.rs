use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;

use crate::error::RendererError;
use crate::gpu::diagnostics;
use crate::types::GpuPowerPreference;

/// Summary of the adapter picked at start-up, kept for logging.
#[derive(Debug, Clone)]
pub(crate) struct AdapterProfile {
    pub name: String,
    pub backend: wgpu::Backend,
    pub device_type: wgpu::DeviceType,
}

impl AdapterProfile {
    fn from_info(info: &wgpu::AdapterInfo) -> Self {
        Self {
            name: info.name.clone(),
            backend: info.backend,
            device_type: info.device_type,
        }
    }

    pub(crate) fn is_software(&self) -> bool {
        matches!(self.device_type, wgpu::DeviceType::Cpu)
    }
}

/// Instance, device and window surface for one renderer.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub surface_format: wgpu::TextureFormat,
    pub max_texture_dimension: u32,
    pub adapter_profile: AdapterProfile,
}

impl GpuContext {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self, RendererError>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::from_build_config(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| {
                RendererError::Device(format!("failed to acquire window handle: {err}"))
            })?;
        let display_handle = target
            .display_handle()
            .map_err(|err| {
                RendererError::Device(format!("failed to acquire display handle: {err}"))
            })?;

        // The window outlives the renderer: the window loop drops `GpuState`
        // before the window itself.
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .map_err(|err| {
            RendererError::Device(format!("failed to create rendering surface: {err}"))
        })?;

        let power_preference = match gpu_power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .map_err(|err| {
            RendererError::Device(format!("failed to find a suitable GPU adapter: {err}"))
        })?;

        let adapter_profile = AdapterProfile::from_info(&adapter.get_info());
        tracing::info!(
            name = %adapter_profile.name,
            backend = ?adapter_profile.backend,
            device_type = ?adapter_profile.device_type,
            software = adapter_profile.is_software(),
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_texture_dimension = limits.max_texture_dimension_2d;
        let (width, height) = initial_surface_size(initial_size, max_texture_dimension)?;

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("mandelgl device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .map_err(|err| {
            RendererError::Device(format!("failed to create GPU device: {err}"))
        })?;
        diagnostics::install_error_logger(&device);

        let surface_caps = surface.get_capabilities(&adapter);
        // Palette texels are already display-encoded, so present them untouched.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| {
                RendererError::Device("surface reports no supported formats".to_string())
            })?;
        if surface_format.is_srgb() {
            tracing::warn!(
                ?surface_format,
                "no non-sRGB surface format available; palette colours will be re-encoded"
            );
        }

        let present_mode = if surface_caps.present_modes.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::AutoVsync)
        };
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        tracing::debug!(?surface_format, ?present_mode, "configuring surface");

        let size = PhysicalSize::new(width, height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            max_texture_dimension,
            adapter_profile,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 || new_size == self.size {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width.min(self.max_texture_dimension);
        self.config.height = new_size.height.min(self.max_texture_dimension);
        self.surface.configure(&self.device, &self.config);
    }

    /// Reconfigures the surface after it was lost or became outdated.
    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Initial surface extent: at least 1×1 and within the adapter's texture limit.
fn initial_surface_size(
    size: PhysicalSize<u32>,
    max_texture_dimension: u32,
) -> Result<(u32, u32), RendererError> {
    let width = size.width.max(1);
    let height = size.height.max(1);
    if width > max_texture_dimension || height > max_texture_dimension {
        return Err(RendererError::Device(format!(
            "GPU max texture dimension is {max_texture_dimension}, requested surface is {width}x{height}"
        )));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_is_at_least_one_pixel() {
        assert_eq!(
            initial_surface_size(PhysicalSize::new(0, 0), 8192).unwrap(),
            (1, 1)
        );
        assert_eq!(
            initial_surface_size(PhysicalSize::new(1280, 800), 8192).unwrap(),
            (1280, 800)
        );
    }

    #[test]
    fn oversized_surface_is_a_device_error() {
        let err = initial_surface_size(PhysicalSize::new(9000, 600), 8192).unwrap_err();
        assert!(matches!(err, RendererError::Device(ref message) if message.contains("9000x600")));
    }
}
