// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use glance::{
    AnalyticsConfig, ChartData, ChartKind, ChartOutcome, ChartRequest, ColumnSummary,
    DatasetLoader, ErrorReporter, Explorer,
};
use indexmap::IndexMap;
use std::path::PathBuf;

const DEFAULT_DATASET: &str = "healthcare_dataset.csv";

fn main() -> std::result::Result<(), eframe::Error> {
    env_logger::init();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Healthcare Data Dashboard"),
        ..Default::default()
    };
    eframe::run_native(
        "Healthcare Data Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new()))),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Overview,
    Dataset,
    Charts,
    Conclusion,
}

struct DashboardApp {
    loader: DatasetLoader,
    explorer: Option<Explorer>,
    selected_file: Option<PathBuf>,
    page: Page,
    chart_kind: ChartKind,
    primary: Option<String>,
    secondary: Option<String>,
    outcome: Option<ChartOutcome>,
    summaries: Option<IndexMap<String, ColumnSummary>>,
    preview: Option<(Vec<String>, Vec<Vec<String>>)>,
    error_message: Option<String>,
    reporter: ErrorReporter,
}

impl DashboardApp {
    fn new() -> Self {
        let mut app = Self {
            loader: DatasetLoader::new(),
            explorer: None,
            selected_file: None,
            page: Page::Overview,
            chart_kind: ChartKind::Histogram,
            primary: None,
            secondary: None,
            outcome: None,
            summaries: None,
            preview: None,
            error_message: None,
            reporter: ErrorReporter::new(),
        };
        let default = PathBuf::from(DEFAULT_DATASET);
        if default.exists() {
            app.open_dataset(default);
        }
        app
    }

    fn open_dataset(&mut self, path: PathBuf) {
        self.error_message = None;
        self.summaries = None;
        self.preview = None;
        self.outcome = None;
        self.primary = None;
        self.secondary = None;
        match self.loader.load(&path) {
            Ok(table) => {
                let explorer =
                    Explorer::from_table(table).with_config(AnalyticsConfig::default());
                match explorer.summary_statistics() {
                    Ok(summaries) => self.summaries = Some(summaries),
                    Err(e) if e.is_recoverable() => {
                        log::warn!("no summary statistics: {e}");
                    }
                    Err(e) => {
                        self.error_message = Some(self.reporter.report(&e));
                        return;
                    }
                }
                let preview_rows = explorer.config().max_preview_rows;
                match explorer.table().preview(preview_rows) {
                    Ok(preview) => self.preview = Some(preview),
                    Err(e) => log::warn!("preview unavailable: {e}"),
                }
                self.selected_file = Some(path);
                self.explorer = Some(explorer);
                self.render_chart();
            }
            Err(e) => {
                log::error!("failed to open dataset '{}': {e}", path.display());
                self.error_message = Some(self.reporter.report(&e));
            }
        }
    }

    fn render_chart(&mut self) {
        let Some(explorer) = &self.explorer else {
            return;
        };
        let mut request = ChartRequest::new(self.chart_kind);
        request.primary = self.primary.clone();
        request.secondary = self.secondary.clone();
        match explorer.render(&request) {
            Ok(outcome) => self.outcome = Some(outcome),
            Err(e) => self.error_message = Some(self.reporter.report(&e)),
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Healthcare Data Dashboard");
                ui.separator();
                if ui.button("Open CSV").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("CSV files", &["csv"])
                        .pick_file()
                    {
                        self.open_dataset(path);
                    }
                }
                if let Some(ref path) = self.selected_file {
                    ui.label(format!("File: {}", path.display()));
                }
            });
        });

        egui::SidePanel::left("navigation").show(ctx, |ui| {
            ui.heading("Navigation");
            ui.separator();
            ui.selectable_value(&mut self.page, Page::Overview, "Overview");
            ui.selectable_value(&mut self.page, Page::Dataset, "Data");
            ui.selectable_value(&mut self.page, Page::Charts, "EDA Charts");
            ui.selectable_value(&mut self.page, Page::Conclusion, "Conclusion");
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(ref error) = self.error_message {
                ui.colored_label(egui::Color32::RED, "Error:");
                ui.separator();
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.monospace(error);
                });
                return;
            }
            if self.explorer.is_none() {
                ui.centered_and_justified(|ui| {
                    ui.heading("Open a CSV file to explore a dataset");
                });
                return;
            }
            match self.page {
                Page::Overview => self.render_overview_page(ui),
                Page::Dataset => self.render_dataset_page(ui),
                Page::Charts => self.render_charts_page(ui),
                Page::Conclusion => render_conclusion_page(ui),
            }
        });
    }
}

impl DashboardApp {
    fn render_overview_page(&self, ui: &mut egui::Ui) {
        let Some(explorer) = &self.explorer else {
            return;
        };
        let overview = explorer.overview();
        ui.heading("Dataset Overview");
        ui.separator();
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.strong("Shape");
                ui.label(format!("Rows: {}", overview.rows));
                ui.label(format!("Columns: {}", overview.columns));
            });
            ui.separator();
            ui.vertical(|ui| {
                ui.strong("Column Kinds");
                ui.label(format!("Numeric: {}", overview.numeric_count));
                ui.label(format!("Categorical: {}", overview.categorical_count));
            });
            ui.separator();
            ui.vertical(|ui| {
                ui.strong("Completeness");
                ui.label(format!("Missing values: {}", overview.missing_cells));
            });
        });
        ui.separator();
        ui.strong("Available charts for this dataset");
        for spec in explorer.available_charts() {
            ui.label(format!("{} - {}", spec.label, spec.description));
        }
    }

    fn render_dataset_page(&self, ui: &mut egui::Ui) {
        let Some(explorer) = &self.explorer else {
            return;
        };
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.heading("Data Preview");
            if let Some((headers, rows)) = &self.preview {
                egui::Grid::new("preview_grid").striped(true).show(ui, |ui| {
                    for header in headers {
                        ui.strong(header);
                    }
                    ui.end_row();
                    for row in rows {
                        for cell in row {
                            ui.label(cell);
                        }
                        ui.end_row();
                    }
                });
            }
            ui.separator();

            ui.heading("Missing Values per Column");
            egui::Grid::new("null_grid").striped(true).show(ui, |ui| {
                ui.strong("Column");
                ui.strong("Missing");
                ui.end_row();
                for (name, count) in explorer.null_counts() {
                    ui.label(name);
                    ui.label(count.to_string());
                    ui.end_row();
                }
            });
            ui.separator();

            ui.heading("Summary Statistics");
            if let Some(summaries) = &self.summaries {
                egui::Grid::new("summary_grid").striped(true).show(ui, |ui| {
                    for header in
                        ["Column", "Count", "Mean", "Std", "Min", "25%", "Median", "75%", "Max"]
                    {
                        ui.strong(header);
                    }
                    ui.end_row();
                    for (name, summary) in summaries {
                        ui.label(name);
                        ui.label(summary.count.to_string());
                        for stat in [
                            summary.mean,
                            summary.std,
                            summary.min,
                            summary.q25,
                            summary.median,
                            summary.q75,
                            summary.max,
                        ] {
                            ui.label(
                                stat.map_or_else(|| "-".to_string(), |v| format!("{v:.2}")),
                            );
                        }
                        ui.end_row();
                    }
                });
            } else {
                ui.label("No numeric columns to summarise.");
            }
        });
    }

    fn render_charts_page(&mut self, ui: &mut egui::Ui) {
        ui.heading("Exploratory Charts");
        ui.separator();
        let mut changed = false;

        egui::ComboBox::from_label("Chart")
            .selected_text(self.chart_kind.label())
            .show_ui(ui, |ui| {
                for kind in ChartKind::all() {
                    if ui
                        .selectable_value(&mut self.chart_kind, kind, kind.label())
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
        if changed {
            self.primary = None;
            self.secondary = None;
        }
        changed |= self.column_pickers(ui);
        if changed {
            self.render_chart();
        }
        ui.separator();

        match &self.outcome {
            Some(ChartOutcome::Rendered(chart)) => {
                ui.strong(&chart.title);
                draw_chart(ui, chart);
            }
            Some(ChartOutcome::Unavailable(warning)) => {
                ui.colored_label(egui::Color32::from_rgb(200, 150, 0), warning);
            }
            None => {
                ui.label("Pick a chart to render.");
            }
        }
    }

    // Dropdowns for the roles the selected chart declares, each filtered to
    // columns of the required kind.
    fn column_pickers(&mut self, ui: &mut egui::Ui) -> bool {
        let Some(explorer) = &self.explorer else {
            return false;
        };
        let Some(spec) = explorer.catalog().get(self.chart_kind) else {
            return false;
        };
        let requires: Vec<(String, glance::ColumnKind)> = spec
            .requires
            .iter()
            .map(|r| (r.role.clone(), r.kind))
            .collect();
        let schema = explorer.table().schema();
        let mut changed = false;
        for (slot, (role, kind)) in requires.iter().take(2).enumerate() {
            let options: Vec<String> = schema
                .columns_of_kind(*kind)
                .into_iter()
                .map(String::from)
                .collect();
            if options.is_empty() {
                continue;
            }
            let selection = if slot == 0 {
                &mut self.primary
            } else {
                &mut self.secondary
            };
            let current = selection.clone().unwrap_or_else(|| options[0].clone());
            egui::ComboBox::from_label(format!("{role} ({kind})"))
                .selected_text(current.clone())
                .show_ui(ui, |ui| {
                    for option in &options {
                        let mut candidate = current.clone();
                        if ui
                            .selectable_value(&mut candidate, option.clone(), option)
                            .changed()
                        {
                            *selection = Some(candidate);
                            changed = true;
                        }
                    }
                });
        }
        changed
    }
}

fn render_conclusion_page(ui: &mut egui::Ui) {
    ui.heading("Conclusion");
    ui.separator();
    ui.label(
        "The charts above summarise the dataset's shape: how each numeric \
         measurement is distributed, which categories dominate, and how the \
         numeric columns move together.",
    );
    ui.label(
        "Columns with many missing values or near-constant distributions are \
         weak inputs for downstream models; the missing-value table and the \
         correlation heatmap point them out.",
    );
}

const BAR_COLOR: egui::Color32 = egui::Color32::from_rgb(70, 130, 180);
const ACCENT_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 120, 60);
const PLOT_SIZE: egui::Vec2 = egui::Vec2::new(760.0, 420.0);

fn draw_chart(ui: &mut egui::Ui, chart: &glance::RenderedChart) {
    match &chart.data {
        ChartData::Histogram { bins } => {
            let categories: Vec<(String, f64)> = bins
                .iter()
                .map(|b| (format!("{:.0}", b.lower), b.count as f64))
                .collect();
            draw_bars(ui, &categories, false);
        }
        ChartData::Bar { categories } => draw_bars(ui, categories, true),
        ChartData::HorizontalBar { categories } => draw_horizontal_bars(ui, categories),
        ChartData::Box { summary } => draw_box(ui, summary),
        ChartData::Scatter { points } => draw_scatter(ui, points, &chart.axes),
        ChartData::Heatmap { matrix } => draw_heatmap(ui, matrix),
    }
}

fn draw_bars(ui: &mut egui::Ui, categories: &[(String, f64)], label_each: bool) {
    let (response, painter) = ui.allocate_painter(PLOT_SIZE, egui::Sense::hover());
    let rect = response.rect;
    let max = categories.iter().map(|c| c.1).fold(f64::EPSILON, f64::max);
    let n = categories.len().max(1);
    let slot = rect.width() / n as f32;
    let bar_width = (slot * 0.8).max(1.0);
    let label_band = 18.0;
    for (i, (name, value)) in categories.iter().enumerate() {
        let height = ((value / max) as f32) * (rect.height() - label_band - 4.0);
        let x = rect.left() + i as f32 * slot + (slot - bar_width) / 2.0;
        let bar = egui::Rect::from_min_max(
            egui::pos2(x, rect.bottom() - label_band - height),
            egui::pos2(x + bar_width, rect.bottom() - label_band),
        );
        painter.rect_filled(bar, egui::CornerRadius::ZERO, BAR_COLOR);
        if label_each || i % (n / 10 + 1) == 0 {
            painter.text(
                egui::pos2(x + bar_width / 2.0, rect.bottom() - label_band + 2.0),
                egui::Align2::CENTER_TOP,
                name,
                egui::FontId::proportional(10.0),
                ui.visuals().text_color(),
            );
        }
    }
}

fn draw_horizontal_bars(ui: &mut egui::Ui, categories: &[(String, f64)]) {
    let (response, painter) = ui.allocate_painter(PLOT_SIZE, egui::Sense::hover());
    let rect = response.rect;
    let max = categories.iter().map(|c| c.1).fold(f64::EPSILON, f64::max);
    let n = categories.len().max(1);
    let slot = rect.height() / n as f32;
    let bar_height = (slot * 0.7).max(1.0);
    let label_band = 140.0_f32.min(rect.width() * 0.3);
    for (i, (name, value)) in categories.iter().enumerate() {
        let width = ((value / max) as f32) * (rect.width() - label_band - 4.0);
        let y = rect.top() + i as f32 * slot + (slot - bar_height) / 2.0;
        painter.text(
            egui::pos2(rect.left() + label_band - 6.0, y + bar_height / 2.0),
            egui::Align2::RIGHT_CENTER,
            name,
            egui::FontId::proportional(11.0),
            ui.visuals().text_color(),
        );
        let bar = egui::Rect::from_min_max(
            egui::pos2(rect.left() + label_band, y),
            egui::pos2(rect.left() + label_band + width, y + bar_height),
        );
        painter.rect_filled(bar, egui::CornerRadius::ZERO, BAR_COLOR);
    }
}

fn draw_box(ui: &mut egui::Ui, summary: &glance::BoxSummary) {
    let (response, painter) = ui.allocate_painter(PLOT_SIZE, egui::Sense::hover());
    let rect = response.rect.shrink(20.0);
    let span = (summary.max - summary.min).max(f64::EPSILON);
    let to_y = |v: f64| {
        rect.bottom() - (((v - summary.min) / span) as f32) * rect.height()
    };
    let center_x = rect.center().x;
    let half = rect.width() * 0.15;
    let stroke = egui::Stroke::new(1.5, ui.visuals().text_color());

    // whiskers
    painter.line_segment(
        [
            egui::pos2(center_x, to_y(summary.whisker_low)),
            egui::pos2(center_x, to_y(summary.q25)),
        ],
        stroke,
    );
    painter.line_segment(
        [
            egui::pos2(center_x, to_y(summary.q75)),
            egui::pos2(center_x, to_y(summary.whisker_high)),
        ],
        stroke,
    );
    // interquartile box
    let box_rect = egui::Rect::from_min_max(
        egui::pos2(center_x - half, to_y(summary.q75)),
        egui::pos2(center_x + half, to_y(summary.q25)),
    );
    painter.rect_filled(box_rect, egui::CornerRadius::ZERO, BAR_COLOR);
    painter.line_segment(
        [
            egui::pos2(center_x - half, to_y(summary.median)),
            egui::pos2(center_x + half, to_y(summary.median)),
        ],
        egui::Stroke::new(2.0, egui::Color32::WHITE),
    );
    for outlier in &summary.outliers {
        painter.circle_filled(egui::pos2(center_x, to_y(*outlier)), 3.0, ACCENT_COLOR);
    }
}

fn draw_scatter(ui: &mut egui::Ui, points: &[(f64, f64)], axes: &glance::AxisLabels) {
    let (response, painter) = ui.allocate_painter(PLOT_SIZE, egui::Sense::hover());
    let rect = response.rect.shrink(24.0);
    if points.is_empty() {
        return;
    }
    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for (x, y) in points {
        min_x = min_x.min(*x);
        max_x = max_x.max(*x);
        min_y = min_y.min(*y);
        max_y = max_y.max(*y);
    }
    let span_x = (max_x - min_x).max(f64::EPSILON);
    let span_y = (max_y - min_y).max(f64::EPSILON);
    for (x, y) in points {
        let px = rect.left() + (((x - min_x) / span_x) as f32) * rect.width();
        let py = rect.bottom() - (((y - min_y) / span_y) as f32) * rect.height();
        painter.circle_filled(egui::pos2(px, py), 2.5, BAR_COLOR);
    }
    painter.text(
        egui::pos2(rect.center().x, rect.bottom() + 6.0),
        egui::Align2::CENTER_TOP,
        &axes.x,
        egui::FontId::proportional(11.0),
        ui.visuals().text_color(),
    );
    painter.text(
        egui::pos2(rect.left() - 4.0, rect.top()),
        egui::Align2::RIGHT_TOP,
        &axes.y,
        egui::FontId::proportional(11.0),
        ui.visuals().text_color(),
    );
}

// Blue for -1, white for 0, red for +1; grey marks undefined cells.
fn correlation_color(r: f64) -> egui::Color32 {
    if r.is_nan() {
        return egui::Color32::from_gray(120);
    }
    let t = r.clamp(-1.0, 1.0);
    if t < 0.0 {
        let f = (-t) as f32;
        egui::Color32::from_rgb(
            (255.0 - 185.0 * f) as u8,
            (255.0 - 125.0 * f) as u8,
            255,
        )
    } else {
        let f = t as f32;
        egui::Color32::from_rgb(
            255,
            (255.0 - 155.0 * f) as u8,
            (255.0 - 195.0 * f) as u8,
        )
    }
}

fn draw_heatmap(ui: &mut egui::Ui, matrix: &glance::CorrelationMatrix) {
    let n = matrix.len();
    if n == 0 {
        return;
    }
    let label_band = 120.0_f32;
    let side = (PLOT_SIZE.y - label_band).max(80.0);
    let (response, painter) = ui.allocate_painter(
        egui::Vec2::new(side + label_band, side + label_band),
        egui::Sense::hover(),
    );
    let rect = response.rect;
    let cell = side / n as f32;
    let origin = egui::pos2(rect.left() + label_band, rect.top());
    for i in 0..n {
        for j in 0..n {
            let r = matrix.get(i, j);
            let cell_rect = egui::Rect::from_min_size(
                egui::pos2(origin.x + j as f32 * cell, origin.y + i as f32 * cell),
                egui::Vec2::splat(cell),
            );
            painter.rect_filled(cell_rect, egui::CornerRadius::ZERO, correlation_color(r));
            let text = if r.is_nan() {
                "-".to_string()
            } else {
                format!("{r:.2}")
            };
            painter.text(
                cell_rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(10.0),
                egui::Color32::BLACK,
            );
        }
        painter.text(
            egui::pos2(origin.x - 6.0, origin.y + i as f32 * cell + cell / 2.0),
            egui::Align2::RIGHT_CENTER,
            &matrix.columns[i],
            egui::FontId::proportional(10.0),
            ui.visuals().text_color(),
        );
        painter.text(
            egui::pos2(origin.x + i as f32 * cell + cell / 2.0, origin.y + side + 4.0),
            egui::Align2::CENTER_TOP,
            &matrix.columns[i],
            egui::FontId::proportional(10.0),
            ui.visuals().text_color(),
        );
    }
}
