use crate::camera::{Camera, CameraController, CameraUniform};
use crate::compute::WgpuCompute;
use crate::driver::{DeviceIndices, ParticleSimulationDriver};
use crate::error::{GpuError, RunError};
use crate::initialize::seeded_rng;
use crate::input::{DesktopControllers, OrbitingControllers};
use crate::render::WgpuRenderer;
use crate::SimParams;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use winit::keyboard::*;
use winit::{
  event::{ElementState, Event, KeyEvent, StartCause, WindowEvent},
  event_loop::{EventLoop, EventLoopWindowTarget},
  window::Window,
};

/// Fixed headless time step, one 90 Hz frame.
const HEADLESS_DT: f32 = 1.0 / 90.0;
const HEADLESS_SIZE: (u32, u32) = (1280, 720);

#[derive(Clone, Debug)]
pub struct RunOptions {
  pub params: SimParams,
  pub devices: DeviceIndices,
  pub seed: u64,
  pub headless: bool,
  /// Frames to simulate in headless mode.
  pub frames: u32,
  /// Failed device lookups the headless controllers report before resolving.
  pub warmup: u32,
}

struct EventLoopWrapper {
  event_loop: EventLoop<()>,
  window: Arc<Window>,
}

impl EventLoopWrapper {
  fn new(title: &str) -> Result<Self, RunError> {
    let event_loop = EventLoop::new()?;
    let builder = winit::window::WindowBuilder::new().with_title(title);
    let window = Arc::new(builder.build(&event_loop)?);
    Ok(Self { event_loop, window })
  }
}

struct GpuContext {
  adapter: wgpu::Adapter,
  device: Arc<wgpu::Device>,
  queue: Arc<wgpu::Queue>,
}

impl GpuContext {
  fn instance() -> wgpu::Instance {
    wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    })
  }

  async fn init(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'static>>,
  ) -> Result<Self, GpuError> {
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: surface,
        force_fallback_adapter: false,
      })
      .await
      .ok_or(GpuError::NoAdapter)?;
    info!("Using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;

    Ok(Self {
      adapter,
      device: Arc::new(device),
      queue: Arc::new(queue),
    })
  }
}

struct SurfaceWrapper {
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
}

impl SurfaceWrapper {
  fn configure(
    surface: wgpu::Surface<'static>,
    context: &GpuContext,
    window: &Window,
  ) -> Result<Self, GpuError> {
    let size = window.inner_size();
    let mut config = surface
      .get_default_config(&context.adapter, size.width.max(1), size.height.max(1))
      .ok_or(GpuError::NoSurfaceConfig)?;
    let view_format = config.format.add_srgb_suffix();
    config.view_formats.push(view_format);
    surface.configure(&context.device, &config);
    Ok(Self { surface, config })
  }

  fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
    self.config.width = width.max(1);
    self.config.height = height.max(1);
    self.surface.configure(device, &self.config);
  }

  fn acquire(&mut self, device: &wgpu::Device) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => None,
      Err(e) => {
        warn!("Surface lost ({e}); reconfiguring");
        self.surface.configure(device, &self.config);
        self.surface.get_current_texture().ok()
      }
    }
  }

  fn view_format(&self) -> wgpu::TextureFormat {
    self.config.view_formats[0]
  }
}

pub fn run(options: RunOptions) -> Result<(), RunError> {
  info!("Starting with {:?}", options.params);
  if options.headless {
    pollster::block_on(run_headless(options))
  } else {
    pollster::block_on(run_windowed(options))
  }
}

async fn run_headless(options: RunOptions) -> Result<(), RunError> {
  let context = GpuContext::init(&GpuContext::instance(), None).await?;
  let (width, height) = HEADLESS_SIZE;
  let format = wgpu::TextureFormat::Rgba8UnormSrgb;
  let texture = context.device.create_texture(&wgpu::TextureDescriptor {
    label: Some("Offscreen Target"),
    size: wgpu::Extent3d {
      width,
      height,
      depth_or_array_layers: 1,
    },
    mip_level_count: 1,
    sample_count: 1,
    dimension: wgpu::TextureDimension::D2,
    format,
    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
    view_formats: &[],
  });

  let compute = WgpuCompute::new(context.device.clone(), context.queue.clone());
  let renderer = WgpuRenderer::init(context.device.clone(), context.queue.clone(), format);
  let camera = Camera::looking_at_cloud(width as f32 / height as f32);
  renderer.update_camera(&CameraUniform::from_camera(&camera));

  let mut driver = ParticleSimulationDriver::new(
    options.params,
    options.devices,
    compute,
    renderer,
    OrbitingControllers::new(options.warmup),
  )?;
  driver.start_with_rng(&mut seeded_rng(options.seed))?;

  let running = Arc::new(AtomicBool::new(true));
  let handler_flag = running.clone();
  if let Err(e) = ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst)) {
    warn!("Could not install Ctrl-C handler: {e}");
  }

  let mut frames = 0;
  while frames < options.frames && running.load(Ordering::SeqCst) {
    driver.input_mut().advance(HEADLESS_DT);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    driver.render_mut().begin_frame(view);
    driver.tick();
    driver.render_mut().end_frame();
    frames += 1;
  }
  let status = context.device.poll(wgpu::Maintain::Wait);
  debug!("GPU queue drained: {}", status.is_queue_empty());
  driver.teardown();
  info!("Simulated {frames} frames headless");
  Ok(())
}

async fn run_windowed(options: RunOptions) -> Result<(), RunError> {
  let window_loop = EventLoopWrapper::new("Charge Field")?;
  let instance = GpuContext::instance();
  let surface = instance
    .create_surface(window_loop.window.clone())
    .map_err(GpuError::from)?;
  let context = GpuContext::init(&instance, Some(&surface)).await?;
  let mut surface = SurfaceWrapper::configure(surface, &context, &window_loop.window)?;

  let size = window_loop.window.inner_size();
  let mut camera = Camera::looking_at_cloud(size.width.max(1) as f32 / size.height.max(1) as f32);
  let mut camera_controller = CameraController::init(0.05, 0.03);

  let compute = WgpuCompute::new(context.device.clone(), context.queue.clone());
  let renderer = WgpuRenderer::init(
    context.device.clone(),
    context.queue.clone(),
    surface.view_format(),
  );
  let mut driver = ParticleSimulationDriver::new(
    options.params,
    options.devices,
    compute,
    renderer,
    DesktopControllers::new(size.width, size.height),
  )?;
  driver.start_with_rng(&mut seeded_rng(options.seed))?;

  let window = window_loop.window.clone();
  window_loop.event_loop.run(
    move |event, target: &EventLoopWindowTarget<()>| match event {
      Event::WindowEvent { event, window_id } if window_id == window.id() => {
        if driver.input_mut().process_events(&event) || camera_controller.process_events(&event) {
          return;
        }
        match event {
          WindowEvent::CloseRequested
          | WindowEvent::KeyboardInput {
            event:
              KeyEvent {
                state: ElementState::Pressed,
                physical_key: PhysicalKey::Code(KeyCode::Escape),
                ..
              },
            ..
          } => target.exit(),
          WindowEvent::Resized(new_size) => {
            surface.resize(&context.device, new_size.width, new_size.height);
            camera.aspect = new_size.width.max(1) as f32 / new_size.height.max(1) as f32;
          }
          WindowEvent::RedrawRequested => {
            camera_controller.update_camera(&mut camera);
            driver
              .render()
              .update_camera(&CameraUniform::from_camera(&camera));
            driver.input_mut().update(&camera);

            let Some(frame) = surface.acquire(&context.device) else {
              window.request_redraw();
              return;
            };
            let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
              format: Some(surface.view_format()),
              ..wgpu::TextureViewDescriptor::default()
            });
            driver.render_mut().begin_frame(view);
            driver.tick();
            driver.render_mut().end_frame();
            frame.present();
            window.request_redraw();
          }
          _ => {}
        }
      }
      Event::NewEvents(StartCause::Init) => window.request_redraw(),
      Event::LoopExiting => driver.teardown(),
      _ => {}
    },
  )?;
  Ok(())
}

/// Logs a fatal error the way the binary reports it.
pub fn report(e: &RunError) {
  error!("{e}");
  let mut source = std::error::Error::source(e);
  while let Some(cause) = source {
    error!("  caused by: {cause}");
    source = cause.source();
  }
}
