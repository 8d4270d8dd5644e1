use crate::theme::{Theme, blend_color};
use eframe::egui::{self, RichText, Widget};

/// 단색 배경과 일정한 간격을 제공하는 기본 버튼 위젯.
pub(super) struct PrimaryButton<'a> {
    theme: &'a Theme,
    label: &'a str,
    icon: &'a str,
    fill: Option<egui::Color32>,
}

impl<'a> PrimaryButton<'a> {
    pub(super) fn new(theme: &'a Theme, label: &'a str) -> Self {
        Self {
            theme,
            label,
            icon: "",
            fill: None,
        }
    }

    pub(super) fn icon(mut self, icon: &'a str) -> Self {
        self.icon = icon;
        self
    }

    /// 기본 강조색 대신 사용할 배경색.
    pub(super) fn fill(mut self, fill: egui::Color32) -> Self {
        self.fill = Some(fill);
        self
    }
}

impl Widget for PrimaryButton<'_> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let decorations = self.theme.decorations();
        let palette = self.theme.palette();
        let enabled = ui.is_enabled();

        let text = if self.icon.is_empty() {
            self.label.to_string()
        } else {
            format!("{}  {}", self.icon, self.label)
        };
        let font_size = 16.0;
        let rich = RichText::new(text).size(font_size).strong().color(if enabled {
            egui::Color32::WHITE
        } else {
            blend_color(palette.fg_text_secondary, palette.bg_panel, 0.4)
        });

        // 버튼 높이는 글자 높이를 따라간다
        let text_height = ui.ctx().fonts(|f| {
            f.row_height(&egui::FontId::new(font_size, egui::FontFamily::Proportional))
        });
        let button_height = decorations.button_height.max(text_height + 6.0);

        let accent = self.fill.unwrap_or(palette.accent_primary);
        let base_fill = if enabled {
            accent
        } else {
            blend_color(accent, palette.border_soft, 0.5)
        };
        let button = egui::Button::new(rich)
            .min_size(egui::vec2(decorations.button_min_width, button_height))
            .rounding(egui::Rounding::same(decorations.button_rounding))
            .fill(base_fill);

        let response = ui.add(button);
        if enabled && response.hovered() {
            ui.output_mut(|o| {
                o.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }
        response
    }
}

/// Step 목록의 한 줄을 카드 형태로 그린다.
pub(super) struct StepCard<'a> {
    theme: &'a Theme,
    title: &'a str,
    subtitle: &'a str,
    status: Option<(&'a str, &'a str, egui::Color32)>,
    selected: bool,
}

impl<'a> StepCard<'a> {
    pub(super) fn new(theme: &'a Theme, title: &'a str, subtitle: &'a str) -> Self {
        Self {
            theme,
            title,
            subtitle,
            status: None,
            selected: false,
        }
    }

    pub(super) fn status(mut self, icon: &'a str, text: &'a str, color: egui::Color32) -> Self {
        self.status = Some((icon, text, color));
        self
    }

    pub(super) fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }
}

impl Widget for StepCard<'_> {
    fn ui(self, ui: &mut egui::Ui) -> egui::Response {
        let palette = self.theme.palette();
        let decorations = self.theme.decorations();
        let accent = self
            .status
            .map(|(_, _, color)| color)
            .unwrap_or(palette.border_soft);
        let fill = if self.selected {
            blend_color(palette.bg_panel, palette.accent_primary, 0.18)
        } else {
            palette.bg_panel
        };
        let stroke_color = if self.selected {
            palette.accent_primary
        } else {
            palette.border_soft
        };

        let inner = egui::Frame::none()
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, stroke_color))
            .rounding(egui::Rounding::same(decorations.card_rounding))
            .inner_margin(egui::Margin::symmetric(12.0, 10.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    let (bar, _) =
                        ui.allocate_exact_size(egui::vec2(4.0, 36.0), egui::Sense::hover());
                    ui.painter()
                        .rect_filled(bar, egui::Rounding::same(2.0), accent);
                    ui.vertical(|ui| {
                        ui.label(
                            RichText::new(self.title)
                                .color(palette.fg_text_primary)
                                .strong(),
                        );
                        ui.label(
                            RichText::new(self.subtitle)
                                .color(palette.fg_text_secondary)
                                .small(),
                        );
                    });
                    if let Some((icon, text, color)) = self.status {
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            ui.label(RichText::new(format!("{icon} {text}")).color(color));
                        });
                    }
                });
            });
        let response = inner.response.interact(egui::Sense::click());
        if response.hovered() {
            ui.output_mut(|o| o.cursor_icon = egui::CursorIcon::PointingHand);
        }
        response
    }
}

/// 단색 헤더를 그려 정보 영역의 시각적 위계를 만든다.
pub(super) fn solid_section_header(ui: &mut egui::Ui, theme: &Theme, icon: &str, title: &str) {
    let decorations = theme.decorations();
    let palette = theme.palette();
    let size = egui::vec2(ui.available_width(), decorations.header_height);
    let (rect, _) = ui.allocate_exact_size(size, egui::Sense::hover());
    ui.painter().rect_filled(
        rect,
        egui::Rounding::same(decorations.header_rounding),
        decorations.header_fill,
    );
    ui.painter().rect_stroke(
        rect,
        egui::Rounding::same(decorations.header_rounding),
        egui::Stroke::new(
            1.0,
            blend_color(decorations.header_fill, palette.bg_panel, 0.4),
        ),
    );
    let content_rect = rect.shrink2(egui::vec2(16.0, 0.0));
    ui.allocate_ui_at_rect(content_rect, |ui| {
        ui.with_layout(egui::Layout::left_to_right(egui::Align::Center), |ui| {
            if !icon.is_empty() {
                ui.label(
                    RichText::new(icon)
                        .size(decorations.header_icon_size)
                        .color(decorations.header_text),
                );
            }
            ui.add_space(8.0);
            ui.label(
                RichText::new(title)
                    .size(18.0)
                    .color(decorations.header_text)
                    .strong(),
            );
        });
    });
}
