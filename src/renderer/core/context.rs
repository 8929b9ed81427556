//! wgpu Context
//!
//! [`WgpuPlatform`] creates a headless [`WgpuContext`] per backend attempt: instance,
//! adapter, device and queue, plus the small offscreen pipeline used for the smoke
//! test. Presentation surfaces belong to the host and are configured from the public
//! `device` / `queue` handles.

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::{AtriumError, Result};
use crate::quality::TierConfig;
use crate::renderer::backend::BackendKind;
use crate::renderer::events::{ContextId, ContextLostEvent, PlatformEvent};
use crate::renderer::gpu::{GpuContext, GpuPlatform, SmokeTestStatus};

const SMOKE_TEST_SHADER: &str = r"
@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
    );
    return vec4<f32>(positions[index], 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.5, 0.0, 1.0);
}
";

const SMOKE_TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const SMOKE_TARGET_SIZE: u32 = 4;

/// wgpu-backed context factory.
#[derive(Debug, Clone)]
pub struct WgpuPlatform {
    preferred_advertised: bool,
}

impl Default for WgpuPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl WgpuPlatform {
    /// Detects whether the preferred backend is advertised by the host.
    ///
    /// On the web that is the presence of `navigator.gpu`; native hosts always
    /// advertise it and rely on the smoke test.
    #[must_use]
    pub fn new() -> Self {
        Self::with_preferred_advertised(Self::detect_preferred())
    }

    #[must_use]
    pub fn with_preferred_advertised(preferred_advertised: bool) -> Self {
        Self {
            preferred_advertised,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn detect_preferred() -> bool {
        true
    }

    #[cfg(target_arch = "wasm32")]
    fn detect_preferred() -> bool {
        web_sys::window().is_some_and(|window| {
            js_sys::Reflect::has(&window.navigator(), &wasm_bindgen::JsValue::from_str("gpu"))
                .unwrap_or(false)
        })
    }
}

impl GpuPlatform for WgpuPlatform {
    type Context = WgpuContext;

    fn advertises(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::Preferred => self.preferred_advertised,
            BackendKind::Fallback => true,
        }
    }

    async fn create_context(
        &mut self,
        kind: BackendKind,
        id: ContextId,
        config: &TierConfig,
        events: flume::Sender<PlatformEvent>,
    ) -> Result<WgpuContext> {
        WgpuContext::new(kind, id, config, events).await
    }
}

/// Core wgpu handles for one context.
pub struct WgpuContext {
    /// The wgpu device for GPU operations
    pub device: wgpu::Device,
    /// The command queue for submitting work
    pub queue: wgpu::Queue,
    /// Adapter description, for diagnostics
    pub adapter_info: wgpu::AdapterInfo,

    smoke_pipeline: wgpu::RenderPipeline,
    smoke_target: wgpu::Texture,
    smoke_done: Arc<AtomicBool>,
    smoke_submitted: bool,

    lost: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
}

impl WgpuContext {
    pub async fn new(
        kind: BackendKind,
        id: ContextId,
        config: &TierConfig,
        events: flume::Sender<PlatformEvent>,
    ) -> Result<Self> {
        let mut instance_desc = wgpu::InstanceDescriptor::new_without_display_handle();
        instance_desc.backends = kind.backends();
        let instance = wgpu::Instance::new(instance_desc);

        let power_preference = if config.prefer_high_throughput_backend {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| AtriumError::AdapterRequestFailed(e.to_string()))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Adapter for the {kind} backend: {} ({:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let required_limits = match kind {
            BackendKind::Preferred => adapter.limits(),
            BackendKind::Fallback => wgpu::Limits::downlevel_webgl2_defaults(),
        };
        let memory_hints = if config.material_downgrade {
            wgpu::MemoryHints::MemoryUsage
        } else {
            wgpu::MemoryHints::Performance
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Atrium Device"),
                required_features: wgpu::Features::empty(),
                required_limits,
                memory_hints,
                ..Default::default()
            })
            .await?;

        let lost = Arc::new(AtomicBool::new(false));
        let disposed = Arc::new(AtomicBool::new(false));
        {
            let lost = Arc::clone(&lost);
            let disposed = Arc::clone(&disposed);
            device.set_device_lost_callback(move |reason, message| {
                lost.store(true, Ordering::Release);
                if disposed.load(Ordering::Acquire) {
                    return;
                }
                let event = ContextLostEvent::new(id, format!("{reason:?}: {message}"));
                if events.send(PlatformEvent::ContextLost(event)).is_err() {
                    log::warn!("Device {id} lost after its manager was dropped");
                }
            });
        }

        let (smoke_pipeline, smoke_target) = Self::create_smoke_resources(&device);

        Ok(Self {
            device,
            queue,
            adapter_info,
            smoke_pipeline,
            smoke_target,
            smoke_done: Arc::new(AtomicBool::new(false)),
            smoke_submitted: false,
            lost,
            disposed,
        })
    }

    fn create_smoke_resources(device: &wgpu::Device) -> (wgpu::RenderPipeline, wgpu::Texture) {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Smoke Test Shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SMOKE_TEST_SHADER)),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Smoke Test Pipeline Layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Smoke Test Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: SMOKE_TARGET_FORMAT,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let target = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Smoke Test Target"),
            size: wgpu::Extent3d {
                width: SMOKE_TARGET_SIZE,
                height: SMOKE_TARGET_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SMOKE_TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        (pipeline, target)
    }

    #[inline]
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }
}

impl GpuContext for WgpuContext {
    fn submit_smoke_test(&mut self) -> Result<()> {
        if self.is_lost() {
            return Err(AtriumError::ContextLost("device lost before smoke test".to_string()));
        }

        let view = self
            .smoke_target
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Smoke Test Encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Smoke Test Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.smoke_pipeline);
            pass.draw(0..3, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));

        let done = Arc::clone(&self.smoke_done);
        self.queue.on_submitted_work_done(move || {
            done.store(true, Ordering::Release);
        });
        self.smoke_submitted = true;
        Ok(())
    }

    fn poll_smoke_test(&mut self) -> SmokeTestStatus {
        if !self.smoke_submitted {
            return SmokeTestStatus::Failed("smoke test was never submitted".to_string());
        }
        if self.is_lost() {
            return SmokeTestStatus::Failed("device lost during smoke test".to_string());
        }
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            return SmokeTestStatus::Failed(e.to_string());
        }
        if self.smoke_done.load(Ordering::Acquire) {
            SmokeTestStatus::Passed
        } else {
            SmokeTestStatus::Pending
        }
    }

    fn present_frame(&mut self) -> Result<()> {
        if self.is_lost() {
            return Err(AtriumError::ContextLost("device lost".to_string()));
        }
        self.device
            .poll(wgpu::PollType::Poll)
            .map(|_| ())
            .map_err(|e| AtriumError::ContextLost(e.to_string()))
    }

    fn dispose(&mut self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.smoke_target.destroy();
        self.device.destroy();
    }
}
