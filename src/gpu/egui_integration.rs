//! Control panel overlay.
//!
//! Only compiled with the `egui` feature. [`EguiIntegration`] owns the
//! [`ControlPanel`] together with everything egui needs to run it inside
//! the viewer window: one call to [`run`](EguiIntegration::run) per frame
//! builds the panel and returns what the user asked for plus the
//! tessellated overlay, which [`paint`](EguiIntegration::paint) later
//! draws on top of the particles.

use winit::event::WindowEvent;
use winit::window::Window;

use crate::panel::{ControlPanel, PanelEvent, PanelView};

/// Tessellated overlay for one frame.
pub struct EguiFrameOutput {
    pub paint_jobs: Vec<egui::ClippedPrimitive>,
    pub textures_delta: egui::TexturesDelta,
    pub pixels_per_point: f32,
}

pub struct EguiIntegration {
    ctx: egui::Context,
    panel: ControlPanel,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl EguiIntegration {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, window: &Window) -> Self {
        let ctx = overlay_context();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        // Drawn straight onto the swapchain image: no depth, no MSAA.
        let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);

        Self {
            ctx,
            panel: ControlPanel::new(),
            state,
            renderer,
        }
    }

    /// Route a window event to the panel. `true` means the panel took it
    /// and the camera and pointer should ignore it.
    pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Whether the cursor is over the panel.
    pub fn wants_pointer(&self) -> bool {
        self.ctx.wants_pointer_input()
    }

    /// Build this frame's panel from `view`.
    pub fn run(&mut self, window: &Window, view: PanelView<'_>) -> (Vec<PanelEvent>, EguiFrameOutput) {
        let input = self.state.take_egui_input(window);
        let (events, output) = run_panel(&self.ctx, &mut self.panel, input, view);
        self.state.handle_platform_output(window, output.platform_output);
        let frame = EguiFrameOutput {
            paint_jobs: self.ctx.tessellate(output.shapes, output.pixels_per_point),
            textures_delta: output.textures_delta,
            pixels_per_point: output.pixels_per_point,
        };
        (events, frame)
    }

    /// Upload `frame` and draw it over `target`, keeping what is already
    /// there.
    pub fn paint(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        size_in_pixels: [u32; 2],
        frame: EguiFrameOutput,
    ) {
        let screen = egui_wgpu::ScreenDescriptor {
            size_in_pixels,
            pixels_per_point: frame.pixels_per_point,
        };
        for (id, delta) in &frame.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, delta);
        }
        self.renderer
            .update_buffers(device, queue, encoder, &frame.paint_jobs, &screen);

        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Panel Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                })
                .forget_lifetime();
            self.renderer.render(&mut pass, &frame.paint_jobs, &screen);
        }

        for id in &frame.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Dark, translucent panels over the near-black background.
fn overlay_context() -> egui::Context {
    let ctx = egui::Context::default();
    let mut style = egui::Style::default();
    style.visuals = egui::Visuals::dark();
    style.visuals.window_shadow = egui::Shadow::NONE;
    style.visuals.popup_shadow = egui::Shadow::NONE;
    style.visuals.window_fill = egui::Color32::from_black_alpha(160);
    ctx.set_style(style);
    ctx
}

/// One egui pass over the panel, independent of any window.
fn run_panel(
    ctx: &egui::Context,
    panel: &mut ControlPanel,
    input: egui::RawInput,
    view: PanelView<'_>,
) -> (Vec<PanelEvent>, egui::FullOutput) {
    let mut events = Vec::new();
    let output = ctx.run(input, |ctx| events = panel.show(ctx, view));
    (events, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::ShapeArchetype;
    use crate::source::InputMode;
    use crate::visuals::PALETTE;

    fn view(notice: Option<&str>) -> PanelView<'_> {
        PanelView {
            shape: ShapeArchetype::Heart,
            color: PALETTE[0],
            generating: false,
            input_mode: InputMode::Pointer,
            paused: false,
            fps: 60.0,
            notice,
        }
    }

    fn screen() -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(
                egui::Pos2::ZERO,
                egui::vec2(1280.0, 720.0),
            )),
            ..Default::default()
        }
    }

    #[test]
    fn test_idle_panel_raises_no_events() {
        let ctx = overlay_context();
        let mut panel = ControlPanel::new();

        for _ in 0..2 {
            let (events, output) = run_panel(&ctx, &mut panel, screen(), view(None));
            assert!(events.is_empty());
            assert!(!output.shapes.is_empty());
        }
    }

    #[test]
    fn test_panel_tessellates_with_notice() {
        let ctx = overlay_context();
        let mut panel = ControlPanel::new();

        let (_, output) = run_panel(&ctx, &mut panel, screen(), view(Some("shape service timed out")));
        let jobs = ctx.tessellate(output.shapes, output.pixels_per_point);
        assert!(!jobs.is_empty());
        assert!(!ctx.wants_pointer_input());
    }
}
