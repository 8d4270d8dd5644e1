use crate::engine::StepStatus;
use eframe::egui::{self, Color32};

include!(concat!(env!("OUT_DIR"), "/custom_font.rs"));

/// 화면 영역별 색상표.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg_main: Color32,
    pub bg_panel: Color32,
    pub bg_sidebar: Color32,
    pub bg_toolbar: Color32,
    pub bg_log: Color32,
    pub border_soft: Color32,
    pub fg_text_primary: Color32,
    pub fg_text_secondary: Color32,
    pub accent_primary: Color32,
    pub accent_warning: Color32,
    pub accent_error: Color32,
    pub accent_success: Color32,
}

/// 모서리, 여백 등 장식 값.
#[derive(Debug, Clone, Copy)]
pub struct Decorations {
    pub container_rounding: f32,
    pub toolbar_rounding: f32,
    pub card_rounding: f32,
    pub card_inner_margin: egui::Margin,
    pub button_rounding: f32,
    pub button_height: f32,
    pub button_min_width: f32,
    pub button_gap: f32,
    pub header_height: f32,
    pub header_rounding: f32,
    pub header_fill: Color32,
    pub header_text: Color32,
    pub header_icon_size: f32,
}

/// UI 전체에서 참조할 공통 테마 정보.
pub struct Theme {
    palette: Palette,
    decorations: Decorations,
}

impl Default for Theme {
    /// 기본 테마 색상을 정의한다.
    fn default() -> Self {
        let palette = Palette {
            bg_main: Color32::from_rgb(24, 26, 31),
            bg_panel: Color32::from_rgb(32, 35, 42),
            bg_sidebar: Color32::from_rgb(28, 30, 36),
            bg_toolbar: Color32::from_rgb(36, 40, 48),
            bg_log: Color32::from_rgb(20, 22, 26),
            border_soft: Color32::from_rgb(58, 62, 72),
            fg_text_primary: Color32::from_rgb(235, 238, 245),
            fg_text_secondary: Color32::from_rgb(160, 166, 180),
            accent_primary: Color32::from_rgb(80, 140, 255),
            accent_warning: Color32::from_rgb(240, 180, 60),
            accent_error: Color32::from_rgb(220, 80, 80),
            accent_success: Color32::from_rgb(60, 180, 120),
        };
        let decorations = Decorations {
            container_rounding: 6.0,
            toolbar_rounding: 8.0,
            card_rounding: 8.0,
            card_inner_margin: egui::Margin::same(14.0),
            button_rounding: 6.0,
            button_height: 34.0,
            button_min_width: 110.0,
            button_gap: 10.0,
            header_height: 36.0,
            header_rounding: 6.0,
            header_fill: Color32::from_rgb(44, 50, 62),
            header_text: Color32::from_rgb(225, 230, 240),
            header_icon_size: 18.0,
        };
        Self {
            palette,
            decorations,
        }
    }
}

impl Theme {
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn decorations(&self) -> &Decorations {
        &self.decorations
    }

    /// egui Context에 테마 기반 스타일을 적용한다.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = egui::Visuals::dark();
        visuals.window_rounding = egui::Rounding::same(self.decorations.card_rounding);
        visuals.widgets.inactive.bg_fill = self.palette.bg_panel;
        visuals.panel_fill = self.palette.bg_main;
        visuals.window_fill = self.palette.bg_panel;
        ctx.set_visuals(visuals);
    }

    /// StepStatus에 대응하는 색상을 반환한다.
    pub fn status_color(&self, status: &StepStatus) -> Color32 {
        match status {
            StepStatus::Pending => self.palette.fg_text_secondary,
            StepStatus::AwaitingDecision => self.palette.accent_warning,
            StepStatus::Running => self.palette.accent_primary,
            StepStatus::Success => self.palette.accent_success,
            StepStatus::Failed(_) | StepStatus::Interrupted => self.palette.accent_error,
        }
    }
}

/// 두 색을 `t` 비율(0.0 = a, 1.0 = b)로 섞는다.
pub fn blend_color(a: Color32, b: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color32::from_rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}

/// build.rs에서 추출한 폰트를 egui에 등록한다. 시작할 때 한 번만 호출한다.
pub fn install_custom_font(ctx: &egui::Context) {
    if let Some(bytes) = embedded_font_bytes() {
        let mut fonts = egui::FontDefinitions::default();
        fonts
            .font_data
            .insert("custom".into(), egui::FontData::from_static(bytes));
        fonts
            .families
            .entry(egui::FontFamily::Proportional)
            .or_default()
            .insert(0, "custom".into());
        fonts
            .families
            .entry(egui::FontFamily::Monospace)
            .or_default()
            .insert(0, "custom".into());
        ctx.set_fonts(fonts);
    }
}
