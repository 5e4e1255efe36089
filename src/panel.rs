//! On-screen control panel.
//!
//! Only compiled with the `egui` feature. The panel never touches the
//! session directly; it reports what the user asked for as
//! [`PanelEvent`]s and the viewer applies them like keyboard actions.

use crate::archetype::ShapeArchetype;
use crate::input::ControlAction;
use crate::source::InputMode;
use crate::visuals::{Color, PALETTE};

/// A request raised by the panel this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    Action(ControlAction),
    SetColor(Color),
    /// Generate the given prompt into the custom slot.
    Generate(String),
}

/// What the panel displays. Borrowed from the viewer each frame.
#[derive(Debug, Clone, Copy)]
pub struct PanelView<'a> {
    pub shape: ShapeArchetype,
    pub color: Color,
    pub generating: bool,
    pub input_mode: InputMode,
    pub paused: bool,
    pub fps: f32,
    pub notice: Option<&'a str>,
}

/// Panel state that persists across frames.
#[derive(Debug, Default)]
pub struct ControlPanel {
    prompt: String,
    hex: String,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, ctx: &egui::Context, view: PanelView<'_>) -> Vec<PanelEvent> {
        let mut events = Vec::new();

        egui::Window::new("ZenParticles")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} | {:.0} fps{}",
                    match view.input_mode {
                        InputMode::Gesture => "hand tracking",
                        InputMode::Pointer => "pointer",
                    },
                    view.fps,
                    if view.paused { " | paused" } else { "" },
                ));
                ui.separator();

                ui.label("Shape");
                ui.horizontal_wrapped(|ui| {
                    for shape in ShapeArchetype::ALL {
                        let selected = shape == view.shape;
                        let enabled = !(view.generating && shape.preset_prompt().is_some());
                        let button = ui.add_enabled(
                            enabled,
                            egui::Button::new(shape.label()).selected(selected),
                        );
                        if button.clicked() {
                            let action = match shape.preset_prompt() {
                                Some(_) => ControlAction::LoadPreset(shape),
                                None => ControlAction::Select(shape),
                            };
                            events.push(PanelEvent::Action(action));
                        }
                    }
                });

                ui.separator();
                ui.label("Colour");
                ui.horizontal(|ui| {
                    for color in PALETTE {
                        let swatch = egui::Button::new("  ")
                            .fill(egui::Color32::from_rgb(color.r, color.g, color.b))
                            .selected(color == view.color);
                        if ui.add(swatch).clicked() {
                            events.push(PanelEvent::SetColor(color));
                        }
                    }
                });
                ui.horizontal(|ui| {
                    let field = ui.add(
                        egui::TextEdit::singleline(&mut self.hex)
                            .hint_text(view.color.to_hex())
                            .desired_width(80.0),
                    );
                    if field.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        if let Ok(color) = self.hex.parse::<Color>() {
                            events.push(PanelEvent::SetColor(color));
                            self.hex.clear();
                        }
                    }
                });

                ui.separator();
                ui.label("Describe a shape");
                ui.add_enabled_ui(!view.generating, |ui| {
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.prompt)
                                .hint_text("a lotus flower")
                                .desired_width(160.0),
                        );
                        let ready = !self.prompt.trim().is_empty();
                        if ui.add_enabled(ready, egui::Button::new("Generate")).clicked() {
                            events.push(PanelEvent::Generate(self.prompt.trim().to_owned()));
                        }
                    });
                });
                if view.generating {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Generating...");
                    });
                }

                if let Some(notice) = view.notice {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(255, 120, 120), notice);
                }

                ui.separator();
                ui.horizontal(|ui| {
                    if ui.button("Reset shapes").clicked() {
                        events.push(PanelEvent::Action(ControlAction::ResetCache));
                    }
                    let pause = if view.paused { "Resume" } else { "Pause" };
                    if ui.button(pause).clicked() {
                        events.push(PanelEvent::Action(ControlAction::TogglePause));
                    }
                });
            });

        events
    }
}
