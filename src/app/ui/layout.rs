use super::*;

impl DemoControllerApp {
    /// 메인 화면 전체 레이아웃을 렌더링한다.
    fn render_run_view(&mut self, ctx: &egui::Context) {
        let palette = *self.theme.palette();
        let decorations = *self.theme.decorations();
        let toolbar_frame = egui::Frame {
            fill: palette.bg_toolbar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.toolbar_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        egui::TopBottomPanel::top("run_toolbar")
            .frame(toolbar_frame)
            .resizable(false)
            .show(ctx, |ui| {
                self.render_run_toolbar(ui);
            });
        let sidebar_frame = egui::Frame {
            fill: palette.bg_sidebar,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        egui::SidePanel::left("steps")
            .resizable(false)
            .default_width(320.0)
            .frame(sidebar_frame)
            .show(ctx, |ui| {
                self.render_step_panel(ui);
            });
        let progress_frame = egui::Frame {
            fill: palette.bg_panel,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.card_rounding),
            inner_margin: egui::Margin::symmetric(20.0, 12.0),
            ..Default::default()
        };
        egui::TopBottomPanel::bottom("progress")
            .frame(progress_frame)
            .show(ctx, |ui| {
                let ratio = self.progress_ratio();
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new("📈 전체 진행률")
                            .color(palette.fg_text_primary)
                            .strong(),
                    );
                    ui.add_space(6.0);
                    ui.add(
                        egui::ProgressBar::new(ratio)
                            .fill(palette.accent_primary)
                            .text(format!("진행률: {:.0}%", ratio * 100.0)),
                    );
                });
            });
        let central_frame = egui::Frame {
            fill: palette.bg_main,
            stroke: egui::Stroke::new(1.0, palette.border_soft),
            rounding: egui::Rounding::same(decorations.container_rounding),
            inner_margin: decorations.card_inner_margin,
            ..Default::default()
        };
        egui::CentralPanel::default()
            .frame(central_frame)
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    ui.spacing_mut().item_spacing.y = 18.0;
                    egui::Frame::none()
                        .fill(palette.bg_panel)
                        .stroke(egui::Stroke::new(1.0, palette.border_soft))
                        .rounding(egui::Rounding::same(decorations.card_rounding))
                        .inner_margin(decorations.card_inner_margin)
                        .show(ui, |ui| {
                            self.render_step_detail(ui);
                        });
                    egui::Frame::none()
                        .fill(palette.bg_log)
                        .stroke(egui::Stroke::new(1.0, palette.border_soft))
                        .rounding(egui::Rounding::same(decorations.card_rounding))
                        .inner_margin(decorations.card_inner_margin)
                        .show(ui, |ui| {
                            ui.set_min_height(240.0);
                            self.render_log_panel(ui);
                        });
                });
            });
    }

    /// 창에 끌어다 놓은 YAML 파일을 시나리오로 불러온다.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .find_map(|file| file.path.clone())
        });
        if let Some(path) = dropped {
            self.apply_scenario_path(path);
        }
    }
}

impl eframe::App for DemoControllerApp {
    /// egui 메인 루프에서 호출되어 UI를 갱신한다.
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        self.drain_events();
        self.handle_dropped_files(ctx);
        self.render_run_view(ctx);
        self.render_comment_window(ctx);
        self.presentation.frame_painted();
        if self.scenario_running {
            // 이벤트 채널과 자동 진행 상태를 계속 반영한다
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
