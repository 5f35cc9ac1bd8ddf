use eframe::egui;
use egui_plot::{Corner, Legend, Line, Plot, PlotPoints, Points};
use tokio::sync::mpsc;

use crate::app::App;
use crate::pipeline::{self, PredictionResult};

// ── Color Palette ───────────────────────────────────────────────────────────

const ACCENT_BLUE: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
const ACCENT_GREEN: egui::Color32 = egui::Color32::from_rgb(34, 197, 94);
const ACCENT_RED: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

const BG_DARK: egui::Color32 = egui::Color32::from_rgb(15, 15, 20);
const BG_CARD: egui::Color32 = egui::Color32::from_rgb(24, 24, 32);
const BG_ELEVATED: egui::Color32 = egui::Color32::from_rgb(32, 32, 44);
const TEXT_PRIMARY: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
const TEXT_SECONDARY: egui::Color32 = egui::Color32::from_rgb(148, 163, 184);
const BORDER_SUBTLE: egui::Color32 = egui::Color32::from_rgb(51, 51, 68);

// ── Result-list layout ──────────────────────────────────────────────────────

/// Vertical band occupied by one charted entry (plot + MSE caption + gap).
const CHART_ROW_HEIGHT: f32 = 360.0;
const CHART_PLOT_HEIGHT: f32 = 300.0;
/// Shorter band for entries whose chart series cannot be drawn.
const ERROR_ROW_HEIGHT: f32 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RowKind {
    Chart,
    Error,
}

impl RowKind {
    fn height(self) -> f32 {
        match self {
            RowKind::Chart => CHART_ROW_HEIGHT,
            RowKind::Error => ERROR_ROW_HEIGHT,
        }
    }

    fn of(result: &PredictionResult) -> Self {
        if result.chart.is_renderable() {
            RowKind::Chart
        } else {
            RowKind::Error
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct RowSlot {
    index: usize,
    top: f32,
    height: f32,
}

/// Lays out result rows for one frame. Rows stack from the band origin,
/// shifted up by `scroll`; traversal stops at the first row whose top
/// falls past `viewport_height`, since every later row sits lower still.
fn layout_rows(kinds: &[RowKind], scroll: f32, viewport_height: f32) -> Vec<RowSlot> {
    let mut slots = Vec::new();
    let mut y = 0.0_f32;

    for (index, kind) in kinds.iter().enumerate() {
        let top = y - scroll;
        if top > viewport_height {
            break;
        }
        slots.push(RowSlot {
            index,
            top,
            height: kind.height(),
        });
        y += kind.height();
    }

    slots
}

// ── GUI App ─────────────────────────────────────────────────────────────────

pub struct GuiApp {
    app: App,
    pipeline_rx: Option<mpsc::Receiver<Vec<PredictionResult>>>,
}

impl GuiApp {
    pub fn new(app: App) -> Self {
        Self {
            app,
            pipeline_rx: None,
        }
    }

    fn apply_theme(ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();

        style.visuals.window_rounding = egui::Rounding::same(8.0);
        style.visuals.widgets.noninteractive.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.inactive.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.active.rounding = egui::Rounding::same(6.0);
        style.visuals.widgets.hovered.rounding = egui::Rounding::same(6.0);

        style.visuals.dark_mode = true;
        style.visuals.panel_fill = BG_DARK;
        style.visuals.window_fill = BG_CARD;
        style.visuals.faint_bg_color = BG_ELEVATED;

        style.visuals.widgets.noninteractive.bg_fill = BG_CARD;
        style.visuals.widgets.noninteractive.fg_stroke = egui::Stroke::new(1.0, TEXT_SECONDARY);
        style.visuals.widgets.inactive.bg_fill = BG_ELEVATED;
        style.visuals.widgets.inactive.fg_stroke = egui::Stroke::new(1.0, TEXT_PRIMARY);
        style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(45, 45, 60);
        style.visuals.widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);
        style.visuals.widgets.active.bg_fill = ACCENT_BLUE;
        style.visuals.widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::WHITE);

        style.visuals.selection.bg_fill = ACCENT_BLUE.linear_multiply(0.4);
        style.visuals.selection.stroke = egui::Stroke::new(1.0, ACCENT_BLUE);

        style.spacing.item_spacing = egui::vec2(8.0, 6.0);

        ctx.set_style(style);
    }

    /// Validates the input and hands the symbols to a worker task. The
    /// run gate in `App::submit` keeps at most one run in flight.
    fn dispatch_run(&mut self) {
        let Some(symbols) = self.app.submit() else {
            return;
        };

        let (tx, rx) = mpsc::channel(1);
        self.pipeline_rx = Some(rx);

        tokio::spawn(async move {
            let results = pipeline::run_predictions(&symbols).await;
            let _ = tx.send(results).await;
        });
    }

    /// One complete result vector per run; the store is never updated
    /// piecemeal. A dropped sender counts as a run with no results.
    fn poll_pipeline(&mut self) {
        let Some(rx) = &mut self.pipeline_rx else {
            return;
        };

        match rx.try_recv() {
            Ok(results) => {
                self.app.complete_run(results);
                self.pipeline_rx = None;
            }
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.app.complete_run(Vec::new());
                self.pipeline_rx = None;
            }
            Err(mpsc::error::TryRecvError::Empty) => {}
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(BG_CARD)
            .rounding(egui::Rounding::same(8.0))
            .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
            .inner_margin(egui::Margin::same(16.0))
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("Enter Stock Symbols:")
                            .size(14.0)
                            .strong()
                            .color(TEXT_PRIMARY),
                    );
                    ui.add_space(8.0);

                    let input_response = ui.add(
                        egui::TextEdit::singleline(&mut self.app.input)
                            .desired_width(300.0)
                            .hint_text("e.g. AAPL, MSFT, TSLA"),
                    );
                    if input_response.changed() {
                        self.app.input.make_ascii_uppercase();
                    }
                    if input_response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                    {
                        self.dispatch_run();
                    }

                    ui.add_space(8.0);

                    let btn = ui.add_sized(
                        [120.0, 30.0],
                        egui::Button::new(
                            egui::RichText::new("Predict")
                                .size(14.0)
                                .strong()
                                .color(egui::Color32::WHITE),
                        )
                        .fill(ACCENT_BLUE)
                        .rounding(egui::Rounding::same(6.0)),
                    );
                    if btn.clicked() {
                        self.dispatch_run();
                    }
                });

                if !self.app.status.is_empty() {
                    ui.add_space(6.0);
                    ui.horizontal(|ui| {
                        ui.label(
                            egui::RichText::new(&self.app.status)
                                .size(13.0)
                                .color(TEXT_SECONDARY),
                        );
                        if self.app.running {
                            ui.spinner();
                        }
                    });
                }
            });
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        if self.app.results.is_empty() {
            return;
        }

        let viewport = ui.available_rect_before_wrap();
        let kinds: Vec<RowKind> = self.app.results.iter().map(RowKind::of).collect();

        for slot in layout_rows(&kinds, self.app.scroll, viewport.height()) {
            let rect = egui::Rect::from_min_size(
                egui::pos2(viewport.left(), viewport.top() + slot.top),
                egui::vec2(viewport.width(), slot.height),
            );

            let mut row_ui = ui.new_child(
                egui::UiBuilder::new()
                    .max_rect(rect)
                    .layout(egui::Layout::top_down(egui::Align::Min)),
            );
            // Rows scrolled past the controls must not paint over them.
            row_ui.set_clip_rect(viewport.intersect(ui.clip_rect()));

            let result = &self.app.results[slot.index];
            match kinds[slot.index] {
                RowKind::Chart => render_chart_entry(&mut row_ui, slot.index, result),
                RowKind::Error => render_error_entry(&mut row_ui, result),
            }
        }
    }
}

impl eframe::App for GuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        Self::apply_theme(ctx);
        self.poll_pipeline();

        let wheel = ctx.input(|i| i.raw_scroll_delta.y);
        if wheel != 0.0 {
            self.app.scroll_by(-wheel);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.add_space(8.0);
                ui.label(
                    egui::RichText::new("TrendStock")
                        .size(18.0)
                        .strong()
                        .color(ACCENT_BLUE),
                );
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new("Stock Price Prediction Model")
                        .size(11.0)
                        .color(TEXT_SECONDARY),
                );
            });
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_controls(ui);
            ui.add_space(8.0);
            self.render_results(ui);
        });

        if self.app.running {
            ctx.request_repaint();
        }
    }
}

fn render_chart_entry(ui: &mut egui::Ui, index: usize, result: &PredictionResult) {
    egui::Frame::none()
        .fill(BG_CARD)
        .rounding(egui::Rounding::same(8.0))
        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
        .inner_margin(egui::Margin::same(8.0))
        .show(ui, |ui| {
            let plot = Plot::new(("prediction_chart", index))
                .legend(Legend::default().position(Corner::LeftTop))
                .height(CHART_PLOT_HEIGHT)
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .allow_boxed_zoom(false);

            plot.show(ui, |plot_ui| {
                let actual: PlotPoints = result.chart.actual.iter().copied().collect();
                plot_ui.points(
                    Points::new(actual)
                        .name("Actual Price")
                        .color(ACCENT_RED)
                        .radius(2.5),
                );

                let fitted: PlotPoints = result.chart.fitted.iter().copied().collect();
                plot_ui.line(
                    Line::new(fitted)
                        .name("Predicted Price")
                        .color(ACCENT_BLUE)
                        .width(2.0),
                );
            });

            ui.label(
                egui::RichText::new(format!("{}: MSE = {:.2}", result.symbol, result.mse))
                    .size(14.0)
                    .strong()
                    .color(ACCENT_GREEN),
            );
        });
}

fn render_error_entry(ui: &mut egui::Ui, result: &PredictionResult) {
    ui.add_space(12.0);
    ui.label(
        egui::RichText::new(format!("Error loading chart for {}", result.symbol))
            .size(14.0)
            .color(ACCENT_RED),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stacks_chart_rows() {
        let kinds = [RowKind::Chart, RowKind::Chart, RowKind::Chart];
        let slots = layout_rows(&kinds, 0.0, 2_000.0);

        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].top, 0.0);
        assert_eq!(slots[1].top, CHART_ROW_HEIGHT);
        assert_eq!(slots[2].top, 2.0 * CHART_ROW_HEIGHT);
    }

    #[test]
    fn test_layout_is_idempotent() {
        let kinds = [RowKind::Chart, RowKind::Error, RowKind::Chart];

        let first = layout_rows(&kinds, 123.0, 700.0);
        let second = layout_rows(&kinds, 123.0, 700.0);

        assert_eq!(first, second);
    }

    #[test]
    fn test_layout_stops_at_first_offscreen_row() {
        let kinds = [RowKind::Chart; 10];
        let slots = layout_rows(&kinds, 0.0, 800.0);

        // Tops 0, 360, 720 fit; 1080 falls past the viewport.
        assert_eq!(slots.len(), 3);
        assert!(slots.iter().all(|s| s.top <= 800.0));
    }

    #[test]
    fn test_layout_shifts_rows_by_scroll() {
        let kinds = [RowKind::Chart; 10];
        let slots = layout_rows(&kinds, 400.0, 800.0);

        assert_eq!(slots[0].top, -400.0);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[3].top, 3.0 * CHART_ROW_HEIGHT - 400.0);
    }

    #[test]
    fn test_layout_error_rows_advance_less() {
        let kinds = [RowKind::Chart, RowKind::Error, RowKind::Chart];
        let slots = layout_rows(&kinds, 0.0, 2_000.0);

        assert_eq!(slots[1].top, CHART_ROW_HEIGHT);
        assert_eq!(slots[1].height, ERROR_ROW_HEIGHT);
        assert_eq!(slots[2].top, CHART_ROW_HEIGHT + ERROR_ROW_HEIGHT);
    }

    #[test]
    fn test_layout_empty_list() {
        assert!(layout_rows(&[], 0.0, 800.0).is_empty());
    }
}
