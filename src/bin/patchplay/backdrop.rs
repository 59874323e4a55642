//! Solid-colour window background.
//!
//! Some compositors (Wayland) never map a window until it presents a frame,
//! so the window is cleared to the configured colour as soon as it exists
//! and again on every resize or redraw request.

use std::sync::Arc;

use patchplay::Error;
use tracing::{debug, warn};
use winit::window::Window;

pub struct Backdrop {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: Option<wgpu::SurfaceConfiguration>,
    rgb: [u8; 3],
}

impl Backdrop {
    pub fn new(window: Arc<Window>, rgb: [u8; 3]) -> Result<Self, Error> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .map_err(|e| Error::Window(e.to_string()))?;

        let adapter = pollster::block_on(async {
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::LowPower,
                    force_fallback_adapter: false,
                    compatible_surface: Some(&surface),
                })
                .await
        })
        .map_err(|e| Error::Window(format!("no graphics adapter: {e}")))?;
        debug!("window adapter: {:?}", adapter.get_info());

        let (device, queue) = pollster::block_on(async {
            adapter
                .request_device(&wgpu::DeviceDescriptor {
                    label: Some("patchplay window"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                    memory_hints: Default::default(),
                    trace: Default::default(),
                })
                .await
        })
        .map_err(|e| Error::Window(e.to_string()))?;

        let mut backdrop = Self {
            window,
            surface,
            adapter,
            device,
            queue,
            config: None,
            rgb,
        };
        backdrop.resize();
        Ok(backdrop)
    }

    /// Match the surface to the window's current inner size.
    pub fn resize(&mut self) {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            // Minimised; nothing to present until it comes back.
            self.config = None;
            return;
        }
        self.config = self
            .surface
            .get_default_config(&self.adapter, size.width, size.height);
        match &self.config {
            Some(config) => self.surface.configure(&self.device, config),
            None => warn!("window surface is not supported by the adapter"),
        }
    }

    /// Clear the window to the background colour and present it.
    pub fn paint(&mut self) -> Result<(), Error> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        let color = clear_color(self.rgb, config.format.is_srgb());

        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize();
                return Ok(());
            }
            Err(e) => return Err(Error::Window(e.to_string())),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("backdrop"),
            });
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("backdrop clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        self.queue.submit(Some(encoder.finish()));
        self.window.pre_present_notify();
        frame.present();
        Ok(())
    }
}

/// Clear colour for an sRGB byte triple.
///
/// sRGB surfaces expect linear values and encode on write; other formats
/// take the bytes as they are.
fn clear_color(rgb: [u8; 3], srgb_target: bool) -> wgpu::Color {
    let channel = |byte: u8| {
        let c = f64::from(byte) / 255.0;
        if !srgb_target {
            c
        } else if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    wgpu::Color {
        r: channel(rgb[0]),
        g: channel(rgb[1]),
        b: channel(rgb[2]),
        a: 1.0,
    }
}
