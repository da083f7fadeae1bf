use std::sync::Arc;
use std::time::Instant;

use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::scene::{FrameStatus, FrameTime, Scene};

type SetupFn = Box<dyn FnOnce(&mut GpuContext, &AppConfig) -> Result<Scene, AppError>>;

/// Open a window and run `setup`'s scene until it quits or the window closes.
///
/// `setup` runs once, after the window and GPU context exist, and builds the
/// scene: meshes, materials, entities, lights and sky. Each redraw then takes an
/// input snapshot through `config.key_bindings` and calls [`Scene::frame`].
///
/// # Example
/// ```no_run
/// use vantage::{AppConfig, Camera, Scene};
///
/// vantage::run(AppConfig::new().title("Empty"), |gpu, config| {
///     let camera = Camera::new([0.0, 0.0, -2.0], [0.0, 0.0, 0.0], gpu.aspect(), config.camera);
///     Ok(Scene::new(camera).with_clear_color(config.clear_color))
/// })
/// .unwrap();
/// ```
pub fn run<S>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut GpuContext, &AppConfig) -> Result<Scene, AppError> + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = VantageApp::Pending {
        config,
        setup: Some(Box::new(setup)),
    };
    event_loop.run_app(&mut app)?;

    match app {
        VantageApp::Failed(Some(error)) => Err(error),
        _ => Ok(()),
    }
}

enum VantageApp {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running(Box<Running>),
    Failed(Option<AppError>),
}

struct Running {
    config: AppConfig,
    window: Arc<Window>,
    gpu: GpuContext,
    scene: Scene,
    input: Input,
    start_time: Instant,
    last_frame: Instant,
}

impl Running {
    fn start(
        event_loop: &ActiveEventLoop,
        config: AppConfig,
        setup: SetupFn,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let mut gpu = GpuContext::new(window.clone())?;
        let mut scene = setup(&mut gpu, &config)?;
        scene.resize(gpu.width(), gpu.height());
        log::info!(
            "Scene ready: {} entities, {}x{}",
            scene.entities().len(),
            gpu.width(),
            gpu.height()
        );

        window.request_redraw();
        Ok(Self {
            config,
            window,
            gpu,
            scene,
            input: Input::new(),
            start_time: Instant::now(),
            last_frame: Instant::now(),
        })
    }

    fn redraw(&mut self) -> FrameStatus {
        let now = Instant::now();
        let time = FrameTime::new(
            now.duration_since(self.last_frame).as_secs_f32(),
            self.start_time.elapsed().as_secs_f32(),
        );
        self.last_frame = now;

        let input = self.input.snapshot(&self.config.key_bindings);
        let status = self.scene.frame(&mut self.gpu, time, &input);
        self.input.begin_frame();
        status
    }
}

impl ApplicationHandler for VantageApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let VantageApp::Pending { config, setup } = self else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match Running::start(event_loop, std::mem::take(config), setup) {
            Ok(running) => *self = VantageApp::Running(Box::new(running)),
            Err(e) => {
                log::error!("Setup failed: {e}");
                *self = VantageApp::Failed(Some(e));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let VantageApp::Running(app) = self else {
            return;
        };

        app.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                app.gpu.resize(size.width, size.height);
                app.scene.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => match app.redraw() {
                FrameStatus::Quit => event_loop.exit(),
                FrameStatus::Continue => app.window.request_redraw(),
            },
            _ => {}
        }
    }
}
