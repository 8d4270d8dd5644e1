use super::*;

impl DemoControllerApp {
    /// 체크포인트 코멘트 창을 그리고 운영자 결정을 게이트로 전달한다.
    pub(super) fn render_comment_window(&mut self, ctx: &egui::Context) {
        let view = self.presentation.view();
        if !view.visible {
            return;
        }
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let mut clicked = None;

        let frame = egui::Frame::window(&ctx.style())
            .fill(if view.raised {
                palette.bg_panel
            } else {
                crate::theme::blend_color(palette.bg_panel, palette.bg_main, 0.5)
            })
            .stroke(egui::Stroke::new(
                if view.raised { 2.0 } else { 1.0 },
                if view.raised {
                    palette.accent_primary
                } else {
                    palette.border_soft
                },
            ));
        let shown = egui::Window::new("Step 설명")
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -80.0))
            .collapsible(false)
            .resizable(false)
            .title_bar(false)
            .frame(frame)
            .show(ctx, |ui| {
                ui.set_width(460.0);
                ui.label(
                    RichText::new("💬 Step 설명")
                        .size(16.0)
                        .color(palette.fg_text_secondary),
                );
                ui.add_space(8.0);
                ui.label(
                    RichText::new(&view.comment)
                        .size(20.0)
                        .color(palette.fg_text_primary)
                        .strong(),
                );
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = decorations.button_gap;
                    for control in ConfirmControl::ALL {
                        let index = control.index();
                        let fill = match control {
                            ConfirmControl::Interrupt => palette.accent_error,
                            _ => palette.accent_primary,
                        };
                        let response = ui.add_enabled(
                            view.enabled[index],
                            PrimaryButton::new(&self.theme, &view.labels[index]).fill(fill),
                        );
                        if view.pointer_on == Some(control) {
                            ui.painter().rect_stroke(
                                response.rect.expand(3.0),
                                egui::Rounding::same(decorations.button_rounding + 2.0),
                                egui::Stroke::new(2.0, palette.accent_warning),
                            );
                        }
                        if view.flashing == Some(control) {
                            ui.painter().rect_filled(
                                response.rect,
                                egui::Rounding::same(decorations.button_rounding),
                                egui::Color32::from_white_alpha(60),
                            );
                        }
                        if response.clicked() {
                            clicked = Some(control);
                        }
                    }
                });
            });

        if let Some(shown) = shown {
            if view.raised {
                ctx.move_to_top(shown.response.layer_id);
            }
        }
        if view.flashing.is_some() {
            ctx.request_repaint_after(std::time::Duration::from_millis(50));
        }
        if let (Some(control), Some(gate)) = (clicked, &self.gate) {
            gate.decide(control.decision());
        }
    }
}
