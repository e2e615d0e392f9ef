#[macro_use]
extern crate tracing;

pub mod bridge;
pub mod display;
pub mod host;
pub mod ipc;
pub mod startup;

use anyhow::Context;
use display::{LoadedModel, ViewerEvent};
use host::Host;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;
use wgpu::{Device, Instance, Queue, Surface};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

const WINDOW_WIDTH: u32 = 1200;
const WINDOW_HEIGHT: u32 = 800;
const WINDOW_TITLE: &str = "DRC Viewer";
const DEFAULT_LOG_DIRECTIVE: &str = "drc_viewer=info";

const EMPTY_COLOR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.08,
    b: 0.1,
    a: 1.0,
};
const LOADED_COLOR: wgpu::Color = wgpu::Color {
    r: 0.15,
    g: 0.17,
    b: 0.22,
    a: 1.0,
};

pub struct StartupArgs {
    pub file: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl Default for StartupArgs {
    fn default() -> Self {
        StartupArgs {
            file: None,
            width: WINDOW_WIDTH,
            height: WINDOW_HEIGHT,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(level.unwrap_or(DEFAULT_LOG_DIRECTIVE))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
    });

    if let Err(err) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Logging already initialized: {err}");
    }
}

pub fn run(args: StartupArgs) {
    match run_impl(args) {
        Ok(_) => {}
        Err(err) => {
            error!("Error running viewer {:?}", err);
        }
    }
}

pub fn run_impl(args: StartupArgs) -> anyhow::Result<()> {
    info!("Initializing...");

    let event_loop = EventLoop::<ViewerEvent>::with_user_event()
        .build()
        .context("Initializing event loop")?;

    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(args, event_loop.create_proxy()).context("Creating app")?;

    info!("Opening window...");

    event_loop.run_app(&mut app).context("Running event loop")?;

    Ok(())
}

struct App {
    initial_size: PhysicalSize<u32>,
    runtime: Runtime,
    instance: Instance,
    host: Host,
    model: Option<LoadedModel>,
    surface: Option<AppSurface>,
}

struct AppSurface {
    window: Arc<Window>,
    surface: Surface<'static>,
    device: Device,
    queue: Queue,
    config: wgpu::SurfaceConfiguration,
}

impl App {
    fn new(args: StartupArgs, proxy: EventLoopProxy<ViewerEvent>) -> anyhow::Result<Self> {
        let runtime = Runtime::new().context("Creating tokio runtime")?;

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let (host_end, bridge) = bridge::channel(bridge::DEFAULT_REQUEST_CAPACITY);
        runtime.spawn(host::serve(host_end.requests));
        runtime.spawn(display::run(bridge, proxy));

        Ok(App {
            initial_size: PhysicalSize::new(args.width, args.height),
            runtime,
            instance,
            host: Host::new(args.file, host_end.load_file),
            model: None,
            surface: None,
        })
    }

    fn create_surface(&self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppSurface> {
        let window = Arc::new(
            event_loop
                .create_window(
                    Window::default_attributes()
                        .with_title(WINDOW_TITLE)
                        .with_visible(true)
                        .with_inner_size(self.initial_size),
                )
                .context("Creating window")?,
        );

        let surface = self
            .instance
            .create_surface(window.clone())
            .context("Creating surface")?;

        let adapter = self
            .runtime
            .block_on(self.instance.request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                force_fallback_adapter: false,
                compatible_surface: Some(&surface),
            }))
            .context("Creating adapter")?;

        let (device, queue) = self
            .runtime
            .block_on(adapter.request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            }))
            .context("Requesting device")?;

        let surface_caps = surface.get_capabilities(&adapter);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("Surface has no supported formats")?;

        let size = window.inner_size();

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: surface_caps
                .present_modes
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo),
            desired_maximum_frame_latency: 2,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };

        if size.width > 0 && size.height > 0 {
            surface.configure(&device, &config);
        }

        Ok(AppSurface {
            window,
            surface,
            device,
            queue,
            config,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(surface) = &mut self.surface {
            if new_size.width > 0 && new_size.height > 0 {
                surface.config.width = new_size.width;
                surface.config.height = new_size.height;
                surface.surface.configure(&surface.device, &surface.config);
            }
        }
    }

    fn update_title(&self, title: &str) {
        if let Some(surface) = &self.surface {
            surface.window.set_title(title);
            surface.window.request_redraw();
        }
    }

    fn render(&self, surface: &AppSurface, texture: wgpu::SurfaceTexture) {
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = surface
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        let color = if self.model.is_some() {
            LOADED_COLOR
        } else {
            EMPTY_COLOR
        };

        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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
        }

        surface.queue.submit(std::iter::once(encoder.finish()));
        texture.present();
    }
}

impl ApplicationHandler<ViewerEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.surface.is_none() {
            match self.create_surface(event_loop) {
                Ok(surface) => self.surface = Some(surface),
                Err(err) => {
                    error!("Error creating display surface {:?}", err);
                    event_loop.exit();
                    return;
                }
            }
        }

        // a second readiness signal never redelivers the startup file
        self.host.display_ready();
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: ViewerEvent) {
        match event {
            ViewerEvent::ModelLoaded(model) => {
                let name = model
                    .path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| model.path.display().to_string());
                self.update_title(&format!("{} - {}", name, WINDOW_TITLE));
                self.model = Some(model);
            }
            ViewerEvent::LoadFailed { path, error } => {
                warn!("Could not load {:?}: {}", &path, error);
                self.update_title(&format!("Error: {} - {}", error, WINDOW_TITLE));
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Exiting...");
                event_loop.exit();
            }
            WindowEvent::DroppedFile(path) => {
                info!("File dropped on window: {:?}", &path);
                self.host.open_file(path);
            }
            WindowEvent::RedrawRequested => {
                let Some(surface) = self.surface.as_ref() else {
                    return;
                };

                match surface.surface.get_current_texture() {
                    Ok(texture) => self.render(surface, texture),
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = surface.window.inner_size();
                        self.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory | wgpu::SurfaceError::Other) => {
                        error!("Out of memory!");
                        event_loop.exit();
                    }
                    Err(wgpu::SurfaceError::Timeout) => {
                        warn!("Surface timeout");
                    }
                }
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size);
                if let Some(surface) = &self.surface {
                    surface.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        // drop surface
        self.surface = None;
    }
}
