//! On-screen overlay: the lit-candle counter and the celebration message.
//!
//! Rendered with egui on top of the 3D frame. The overlay is immediate-mode,
//! so the counter always reflects the candle set's derived lit count - there
//! is no separate counter state to fall out of sync.

use winit::window::Window;

use crate::candles::CandleSet;

/// Snapshot of the values the overlay displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HudState {
    /// Number of lit candles.
    pub lit: usize,
    /// Total number of candles.
    pub total: usize,
    /// Whether the celebration message is shown.
    pub celebration_visible: bool,
}

impl HudState {
    /// Builds the snapshot for this frame from the candle set.
    pub fn from_candles(candles: &CandleSet, celebration_visible: bool) -> Self {
        Self {
            lit: candles.lit_count(),
            total: candles.len(),
            celebration_visible,
        }
    }
}

/// egui integration: platform state, renderer, and the overlay UI.
pub struct Hud {
    ctx: egui::Context,
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
}

impl Hud {
    pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let ctx = egui::Context::default();
        let state = egui_winit::State::new(
            ctx.clone(),
            egui::ViewportId::ROOT,
            window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let renderer = egui_wgpu::Renderer::new(
            device,
            format,
            egui_wgpu::RendererOptions::default(),
        );

        Self {
            ctx,
            state,
            renderer,
        }
    }

    /// Feeds a window event to egui. Returns true if egui consumed it.
    pub fn on_window_event(&mut self, window: &Window, event: &winit::event::WindowEvent) -> bool {
        self.state.on_window_event(window, event).consumed
    }

    /// Records the overlay pass on top of the rendered 3D frame.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &mut self,
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        size: (u32, u32),
        hud_state: &HudState,
    ) {
        let raw_input = self.state.take_egui_input(window);
        let full_output = self.ctx.run(raw_input, |ctx| build_ui(ctx, hud_state));

        self.state
            .handle_platform_output(window, full_output.platform_output);

        let clipped_primitives = self
            .ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        for (id, image_delta) in &full_output.textures_delta.set {
            self.renderer.update_texture(device, queue, *id, image_delta);
        }

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [size.0, size.1],
            pixels_per_point: window.scale_factor() as f32,
        };

        self.renderer.update_buffers(
            device,
            queue,
            encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("HUD Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load, // Keep the 3D content
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            self.renderer.render(
                &mut render_pass.forget_lifetime(),
                &clipped_primitives,
                &screen_descriptor,
            );
        }

        for id in &full_output.textures_delta.free {
            self.renderer.free_texture(id);
        }
    }
}

/// Builds the overlay widgets for one frame.
fn build_ui(ctx: &egui::Context, hud_state: &HudState) {
    egui::Area::new(egui::Id::new("candle-counter"))
        .anchor(egui::Align2::LEFT_TOP, [16.0, 16.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!(
                    "Candles lit: {} / {}",
                    hud_state.lit, hud_state.total
                ))
                .size(22.0)
                .color(egui::Color32::WHITE),
            );
            ui.label(
                egui::RichText::new("Click a candle to light it")
                    .size(14.0)
                    .color(egui::Color32::from_rgb(180, 180, 200)),
            );
        });

    if hud_state.celebration_visible {
        egui::Area::new(egui::Id::new("celebration"))
            .anchor(egui::Align2::CENTER_CENTER, [0.0, -40.0])
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(
                        egui::RichText::new("Merry Christmas!")
                            .size(48.0)
                            .color(egui::Color32::GOLD),
                    );
                    ui.label(
                        egui::RichText::new("All the candles are lit")
                            .size(20.0)
                            .color(egui::Color32::WHITE),
                    );
                });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_scene, SceneConfig};
    use crate::scene::Scene;

    #[test]
    fn test_hud_state_tracks_candles() {
        let mut scene = Scene::new();
        let built = build_scene(&mut scene, &SceneConfig::default()).unwrap();
        let mut candles = built.candles;

        let hud = HudState::from_candles(&candles, false);
        assert_eq!(hud.lit, 0);
        assert_eq!(hud.total, 4);
        assert!(!hud.celebration_visible);

        candles.ignite(0, &mut scene);
        candles.ignite(3, &mut scene);

        let hud = HudState::from_candles(&candles, false);
        assert_eq!(hud.lit, 2);
        assert_eq!(hud.total, 4);
    }

    #[test]
    fn test_hud_state_celebration_flag() {
        let mut scene = Scene::new();
        let built = build_scene(&mut scene, &SceneConfig::default()).unwrap();

        let hud = HudState::from_candles(&built.candles, true);
        assert!(hud.celebration_visible);
    }
}
