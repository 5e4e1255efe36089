//! Windowed frame loop.
//!
//! The [`Viewer`] owns the event loop. Each redraw it applies pending
//! controls, drains the signal bus and generation outcomes, steps the
//! session and renders.

use std::sync::Arc;

use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::archetype::ShapeArchetype;
use crate::config::Config;
use crate::error::ViewerError;
use crate::generation::{GenerationRequest, GenerationWorker};
use crate::gpu::{FrameView, GpuState};
use crate::input::{ControlAction, Input, MouseButton};
use crate::session::Session;
use crate::source::{signal_bus, InputMode, LandmarkReplay, PointerTracker, ReplayHandle, SignalReceiver};
use crate::time::FrameClock;

#[cfg(feature = "egui")]
use crate::gpu::egui_integration::EguiIntegration;
#[cfg(feature = "egui")]
use crate::panel::{PanelEvent, PanelView};

/// Interactive window around a [`Session`].
pub struct Viewer {
    config: Config,
}

impl Viewer {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Open the window and run until it is closed.
    ///
    /// Start-up failures (no window, no GPU) end the loop and are returned.
    pub fn run(self) -> Result<(), ViewerError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self.config);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    session: Session,
    signals: SignalReceiver,
    pointer: PointerTracker,
    replay: Option<ReplayHandle>,
    worker: GenerationWorker,
    clock: FrameClock,
    input: Input,
    /// Last notice raised by the session, kept on screen until the next
    /// request.
    notice: Option<String>,
    error: Option<ViewerError>,
}

impl App {
    fn new(config: Config) -> Self {
        let (publisher, signals) = signal_bus();

        let replay = config.gesture.landmarks.as_ref().and_then(|path| {
            let replay = LandmarkReplay::new(path)
                .with_rate(config.gesture.replay_rate_hz)
                .with_loop(config.gesture.loop_replay)
                .with_scale_policy(config.gesture.scale_policy);
            match replay.spawn(publisher.clone()) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    warn!(error = %err, "hand tracking unavailable, using pointer input");
                    None
                }
            }
        });
        let mode = if replay.is_some() {
            InputMode::Gesture
        } else {
            InputMode::Pointer
        };

        let worker = GenerationWorker::new(config.generation.service());
        info!(service = worker.service_name(), "shape service ready");

        Self {
            session: Session::new(&config),
            config,
            window: None,
            gpu: None,
            #[cfg(feature = "egui")]
            egui: None,
            signals,
            pointer: PointerTracker::new(publisher, mode),
            replay,
            worker,
            clock: FrameClock::new(),
            input: Input::new(),
            notice: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let size = window.inner_size();
        self.input.set_window_size(size.width, size.height);

        let particles = u32::try_from(self.config.particles).unwrap_or(u32::MAX);
        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            particles,
            self.config.visuals.clone(),
            self.config.window.vsync,
        ))?;

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(gpu.device(), gpu.format(), &window));
        }

        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    fn apply(&mut self, action: ControlAction, event_loop: &ActiveEventLoop) {
        match action {
            ControlAction::Select(shape) => self.session.select(shape),
            ControlAction::LoadPreset(shape) => {
                if let Some(prompt) = shape.preset_prompt() {
                    self.generate(shape, prompt.to_owned());
                }
            }
            ControlAction::NextColor => self.session.next_color(),
            ControlAction::ResetCache => self.session.reset(),
            ControlAction::TogglePause => self.clock.toggle_pause(),
            ControlAction::Quit => event_loop.exit(),
        }
    }

    /// Submit a prompt for `shape` and switch to it. Ignored while another
    /// request is in flight.
    fn generate(&mut self, shape: ShapeArchetype, prompt: String) {
        if self.worker.is_generating() {
            return;
        }
        self.notice = None;
        let request = GenerationRequest::new(prompt).with_point_count(self.config.generation.point_count);
        self.worker.submit(shape, request);
        self.session.select(shape);
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        let actions: Vec<ControlAction> = self
            .input
            .keys_pressed()
            .iter()
            .filter_map(|&key| ControlAction::for_key(key))
            .collect();
        for action in actions {
            self.apply(action, event_loop);
        }

        if self.input.mouse_held(MouseButton::Left) && !self.pointer_over_ui() {
            if let Some(gpu) = &mut self.gpu {
                gpu.camera.orbit(self.input.mouse_delta());
            }
        }
        if self.input.cursor_moved() {
            self.pointer.cursor_moved(self.input.cursor_normalized());
        }

        if self.replay.as_ref().is_some_and(ReplayHandle::is_finished) {
            info!("landmark replay ended");
            self.replay = None;
            self.pointer.set_mode(InputMode::Pointer);
        }

        for outcome in self.worker.poll() {
            self.session.apply(outcome);
        }
        if let Some(notice) = self.session.take_notice() {
            warn!(%notice);
            self.notice = Some(notice);
        }

        let frame = self.clock.tick();
        let signal = self.pointer.observe(self.signals.latest());
        if !self.clock.is_paused() {
            self.session.step(frame, &signal);
        }

        self.render(event_loop);
        self.input.end_frame();
    }

    #[cfg(feature = "egui")]
    fn apply_panel(&mut self, events: Vec<PanelEvent>, event_loop: &ActiveEventLoop) {
        for event in events {
            match event {
                PanelEvent::Action(action) => self.apply(action, event_loop),
                PanelEvent::SetColor(color) => self.session.set_color(color),
                PanelEvent::Generate(prompt) => self.generate(ShapeArchetype::AiCustom, prompt),
            }
        }
    }

    #[cfg(feature = "egui")]
    fn pointer_over_ui(&self) -> bool {
        self.egui.as_ref().is_some_and(EguiIntegration::wants_pointer)
    }

    #[cfg(not(feature = "egui"))]
    fn pointer_over_ui(&self) -> bool {
        false
    }

    fn render(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) else {
            return;
        };
        let view = FrameView {
            field: self.session.field(),
            color: self.session.color(),
        };

        #[cfg(feature = "egui")]
        let (result, panel_events) = match self.egui.as_mut() {
            Some(egui) => {
                let panel = PanelView {
                    shape: self.session.shape(),
                    color: self.session.color(),
                    generating: self.worker.is_generating(),
                    input_mode: self.pointer.mode(),
                    paused: self.clock.is_paused(),
                    fps: self.clock.fps(),
                    notice: self.notice.as_deref(),
                };
                let (events, ui) = egui.run(window, panel);
                (gpu.render_with_ui(view, egui, ui), events)
            }
            None => (gpu.render(view), Vec::new()),
        };
        #[cfg(not(feature = "egui"))]
        let result = gpu.render(view);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                event_loop.exit();
            }
            Err(err) => warn!(error = ?err, "render error"),
        }
        window.request_redraw();

        #[cfg(feature = "egui")]
        self.apply_panel(panel_events, event_loop);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            error!(error = %err, "viewer start-up failed");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let consumed = match (self.egui.as_mut(), self.window.as_ref()) {
            (Some(egui), Some(window)) => egui.on_window_event(window, &event),
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let consumed = false;

        if !consumed {
            self.input.handle_event(&event);
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(physical_size) => {
                self.input.set_window_size(physical_size.width, physical_size.height);
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(replay) = self.replay.take() {
            replay.stop();
        }
    }
}
