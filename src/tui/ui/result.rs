//! Submission result view: record summary and, in diagnose mode, the verdict.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::domain::record::display_value;
use crate::domain::{
    ClinicalRecord, Prediction, Submission, Verdict, FIELDS, MALIGNANCY_THRESHOLD_PERCENT,
};
use crate::tui::styles::MedicalTheme;

/// Render a submitted record
pub fn render_result(f: &mut Frame, area: Rect, submission: &Submission) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0], submission);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_record(f, columns[0], &submission.record);
    match &submission.prediction {
        Some(prediction) => render_prediction(f, columns[1], prediction),
        None => render_collected(f, columns[1]),
    }

    render_result_footer(f, chunks[2]);
}

fn render_result_header(f: &mut Frame, area: Rect, submission: &Submission) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Submission", MedicalTheme::title()),
        Span::styled(
            format!(
                " │ {}",
                submission.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Record summary lines, `label  value` per field.
fn summary_lines(record: &ClinicalRecord) -> Vec<Line<'static>> {
    FIELDS
        .iter()
        .zip(record.iter())
        .map(|(spec, entry)| {
            Line::from(vec![
                Span::styled(format!(" {:<28}", spec.label), MedicalTheme::text_secondary()),
                Span::styled(display_value(spec, entry.value), MedicalTheme::text()),
            ])
        })
        .collect()
}

fn render_record(f: &mut Frame, area: Rect, record: &ClinicalRecord) {
    let block = Block::default()
        .title(Span::styled(" Clinical Record ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(summary_lines(record)).block(block), area);
}

/// Gauge label, truncated to two decimals so it never rounds up across the
/// malignancy threshold.
fn percentage_label(prediction: &Prediction) -> String {
    let mut shown = (prediction.percentage * 100.0 + 1e-9).floor() / 100.0;
    if prediction.verdict == Verdict::Benign {
        shown = shown.min(MALIGNANCY_THRESHOLD_PERCENT - 0.01);
    }
    format!("{shown:.2}%")
}

fn render_prediction(f: &mut Frame, area: Rect, prediction: &Prediction) {
    let block = Block::default()
        .title(Span::styled(" Malignancy Prediction ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Verdict
            Constraint::Length(3), // Probability
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let style = MedicalTheme::verdict(prediction.verdict);
    let icon = match prediction.verdict {
        Verdict::Benign => "OK",
        Verdict::Malignant => "!",
    };

    let verdict = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("{icon} {}", prediction.verdict),
            style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            prediction.verdict.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(verdict, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Malignancy Probability ",
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::gauge(prediction.percentage))
        .ratio(prediction.probability.clamp(0.0, 1.0))
        .label(percentage_label(prediction));
    f.render_widget(gauge, chunks[1]);
}

fn render_collected(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Data submitted successfully",
            MedicalTheme::success().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Collection mode: no prediction is made.",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect) {
    let content = Line::from(vec![
        Span::styled("[Enter] ", MedicalTheme::key_hint()),
        Span::styled("New Patient ", MedicalTheme::key_desc()),
        Span::styled("[Esc] ", MedicalTheme::key_hint()),
        Span::styled("Quit", MedicalTheme::key_desc()),
    ]);

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
