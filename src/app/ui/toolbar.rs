use super::*;

impl DemoControllerApp {
    /// 상단 툴바를 그린다.
    pub(super) fn render_run_toolbar(&mut self, ui: &mut egui::Ui) {
        let decorations = *self.theme.decorations();
        let palette = *self.theme.palette();
        ui.vertical(|ui| {
            ui.label(
                RichText::new("✨ Step Gate 데모 컨트롤러")
                    .size(20.0)
                    .color(palette.fg_text_primary)
                    .strong(),
            );
            match (&self.scenario, &self.scenario_path) {
                (Some(scenario), Some(path)) => {
                    ui.label(
                        RichText::new(format!("{} · {}", scenario.name, path.display()))
                            .color(palette.fg_text_secondary),
                    );
                }
                _ => {
                    ui.label(
                        RichText::new("시나리오 파일을 선택하거나 끌어다 놓으세요.")
                            .color(palette.fg_text_secondary),
                    );
                }
            }
            if let Some(err) = &self.last_error {
                ui.label(RichText::new(err).color(palette.accent_error).strong());
            }
            if let Some(outcome) = &self.last_outcome {
                ui.label(RichText::new(outcome).color(palette.accent_warning).strong());
            }
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = decorations.button_gap;

                let can_open = !self.scenario_running;
                if ui
                    .add_enabled(can_open, PrimaryButton::new(&self.theme, "열기").icon("📂"))
                    .clicked()
                {
                    self.load_scenario_from_dialog();
                }

                let can_run = self.scenario.is_some() && !self.scenario_running;
                if ui
                    .add_enabled(can_run, PrimaryButton::new(&self.theme, "실행").icon("▶"))
                    .clicked()
                {
                    self.start_scenario();
                }

                let can_stop = self.scenario_running;
                if ui
                    .add_enabled(
                        can_stop,
                        PrimaryButton::new(&self.theme, "정지")
                            .icon("⏹")
                            .fill(palette.accent_error),
                    )
                    .clicked()
                {
                    self.stop_scenario();
                }

                if let Some(gate) = &self.gate {
                    let mode = if gate.is_interrupted() {
                        "중단됨"
                    } else if gate.is_continual() {
                        "자동 진행"
                    } else {
                        "단계 진행"
                    };
                    let waiting = if gate.is_stopped() { " · 결정 대기" } else { "" };
                    ui.label(
                        RichText::new(format!(
                            "{mode} · 체크포인트 {}{waiting}",
                            gate.snapshot().checkpoint
                        ))
                        .color(palette.fg_text_secondary),
                    );
                }
            });
        });
    }
}
