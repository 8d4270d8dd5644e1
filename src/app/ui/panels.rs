use super::*;
use crate::scenario::StepKind;

impl DemoControllerApp {
    /// 좌측 Step 리스트 패널을 그린다.
    pub(super) fn render_step_panel(&mut self, ui: &mut egui::Ui) {
        let palette = *self.theme.palette();
        solid_section_header(ui, &self.theme, "🧭", "데모 단계");
        ui.add_space(12.0);
        ui.spacing_mut().item_spacing.y = 12.0;

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                let Some(scenario) = &self.scenario else {
                    ui.label(
                        RichText::new("시나리오를 먼저 불러오세요.")
                            .color(palette.fg_text_secondary)
                            .italics(),
                    );
                    return;
                };
                for step in &scenario.steps {
                    let state = self.step_states.get(&step.id).cloned().unwrap_or_default();
                    let status_color = self.theme.status_color(&state.status);
                    let (status_icon, status_text) = status::status_indicator(&state.status);
                    let is_selected = self.selected_step.as_deref() == Some(step.id.as_str());

                    let response = ui.add(
                        StepCard::new(&self.theme, step.name.as_str(), step.id.as_str())
                            .status(status_icon, status_text, status_color)
                            .selected(is_selected),
                    );
                    if response.clicked() {
                        self.selected_step = Some(step.id.clone());
                    }
                }
            });
    }

    /// Step 상세 정보를 표시한다.
    pub(super) fn render_step_detail(&self, ui: &mut egui::Ui) {
        solid_section_header(ui, &self.theme, "🧩", "Step 정보");
        ui.add_space(10.0);
        let palette = *self.theme.palette();
        let step = self.selected_step.as_ref().and_then(|id| {
            self.scenario
                .as_ref()
                .and_then(|scenario| scenario.steps.iter().find(|s| &s.id == id))
        });
        let Some(step) = step else {
            ui.label(RichText::new("선택된 Step이 없습니다.").color(palette.fg_text_secondary));
            return;
        };

        let state = self.step_states.get(&step.id).cloned().unwrap_or_default();
        let status_color = self.theme.status_color(&state.status);
        let (_, status_text) = status::status_indicator(&state.status);
        ui.label(
            RichText::new(step.name.clone())
                .size(20.0)
                .color(palette.fg_text_primary)
                .strong(),
        );
        ui.add_space(6.0);
        ui.label(
            RichText::new(format!("상태 · {status_text}"))
                .color(status_color)
                .strong(),
        );
        if let crate::engine::StepStatus::Failed(reason) = &state.status {
            ui.label(RichText::new(reason).color(palette.accent_error));
        }
        ui.add_space(10.0);
        egui::Grid::new("step_detail_grid")
            .num_columns(2)
            .spacing([12.0, 8.0])
            .striped(true)
            .show(ui, |ui| {
                ui.label("ID");
                ui.label(format!(": {}", step.id));
                ui.end_row();
                ui.label("동작");
                ui.label(format!(": {}", describe_kind(&step.kind)));
                ui.end_row();
                ui.label("타임아웃");
                ui.label(format!(": {}초", step.timeout_sec));
                ui.end_row();
                ui.label("코멘트");
                ui.label(format!(": {}", step.comment));
                ui.end_row();
                if let (Some(started), Some(finished)) = (state.started_at, state.finished_at) {
                    ui.label("소요 시간");
                    ui.label(format!(": {:.1}초", (finished - started).as_secs_f32()));
                    ui.end_row();
                }
            });
    }

    /// 로그 영역을 렌더링한다.
    pub(super) fn render_log_panel(&self, ui: &mut egui::Ui) {
        solid_section_header(ui, &self.theme, "📝", "로그");
        ui.add_space(8.0);
        egui::ScrollArea::vertical()
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.spacing_mut().item_spacing.y = 6.0;
                let text_color = self.theme.palette().fg_text_secondary;
                for line in self.selected_logs() {
                    ui.label(RichText::new(line).color(text_color).monospace());
                }
            });
    }
}

fn describe_kind(kind: &StepKind) -> String {
    match kind {
        StepKind::Note => "설명".into(),
        StepKind::Wait { millis } => format!("{millis}ms 대기"),
        StepKind::Shell { config } => format!("셸 · {}", config.script),
    }
}
