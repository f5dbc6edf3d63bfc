//! Clinical data entry form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{ClinicalInput, FieldKind, FieldSpec, FieldValue, RawValue, Section, FIELDS};
use crate::tui::styles::MedicalTheme;

/// Editable value of one form field.
#[derive(Debug, Clone)]
pub enum FormInput {
    /// Typed numeric entry.
    Number { buffer: String, integer: bool },
    /// Integer scale picked from `min..=max`.
    Scale { min: i64, max: i64, value: i64 },
    /// One of a fixed option list.
    Choice {
        options: &'static [(&'static str, u8)],
        index: usize,
    },
}

impl FormInput {
    fn default_for(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Integer { min, .. } => Self::Number {
                buffer: min.to_string(),
                integer: true,
            },
            FieldKind::Real { min } => Self::Number {
                buffer: format!("{min:?}"),
                integer: false,
            },
            FieldKind::Scale { min, max } => Self::Scale {
                min,
                max,
                value: min,
            },
            FieldKind::Coded(options) | FieldKind::Labelled(options) => {
                Self::Choice { options, index: 0 }
            }
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Number { buffer, .. } => buffer.clone(),
            Self::Scale { value, .. } => value.to_string(),
            Self::Choice { options, index } => options[*index].0.to_string(),
        }
    }
}

/// One field of the form: its catalogue entry and current value.
#[derive(Debug, Clone)]
pub struct FormField {
    pub spec: &'static FieldSpec,
    pub input: FormInput,
}

/// Form state
pub struct FormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            fields: FIELDS
                .iter()
                .map(|spec| FormField {
                    spec,
                    input: FormInput::default_for(spec.kind),
                })
                .collect(),
            selected_field: 0,
            error_message: None,
        }
    }
}

impl FormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Cycle the current choice or scale field. Wraps at both ends.
    pub fn cycle(&mut self, forward: bool) {
        match &mut self.fields[self.selected_field].input {
            FormInput::Choice { options, index } => {
                let n = options.len();
                *index = if forward { (*index + 1) % n } else { (*index + n - 1) % n };
            }
            FormInput::Scale { min, max, value } => {
                *value = match (forward, *value) {
                    (true, v) if v >= *max => *min,
                    (true, v) => v + 1,
                    (false, v) if v <= *min => *max,
                    (false, v) => v - 1,
                };
            }
            FormInput::Number { .. } => return,
        }
        self.error_message = None;
    }

    /// Add a character to the current numeric field
    pub fn input_char(&mut self, c: char) {
        if let FormInput::Number { buffer, integer } = &mut self.fields[self.selected_field].input
        {
            let accepted = c.is_ascii_digit() || (c == '.' && !*integer && !buffer.contains('.'));
            if accepted {
                buffer.push(c);
                self.error_message = None;
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        if let FormInput::Number { buffer, .. } = &mut self.fields[self.selected_field].input {
            buffer.pop();
        }
    }

    /// Reset the current field to its default
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        if let FormInput::Number { buffer, .. } = &mut field.input {
            buffer.zeroize();
        }
        field.input = FormInput::default_for(field.spec.kind);
    }

    /// Wipe all field buffers from memory and restore the defaults.
    ///
    /// Called right after a submission so plaintext inputs do not persist
    /// in the UI state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            if let FormInput::Number { buffer, .. } = &mut field.input {
                buffer.zeroize();
            }
            field.input = FormInput::default_for(field.spec.kind);
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse the form into typed clinical input.
    ///
    /// Range checks happen on submission; this only rejects text that is
    /// not a number.
    pub fn to_clinical_input(&self) -> Result<ClinicalInput, String> {
        let mut input = ClinicalInput::default();

        for field in &self.fields {
            let raw = match &field.input {
                FormInput::Number { buffer, .. } => {
                    let value: f64 = buffer
                        .parse()
                        .map_err(|_| format!("{}: Invalid number", field.spec.label))?;
                    RawValue::Number(value)
                }
                FormInput::Scale { value, .. } => RawValue::Number(*value as f64),
                FormInput::Choice { options, index } => RawValue::Choice(options[*index].0),
            };
            input.apply(field.spec.name, raw)?;
        }

        Ok(input)
    }

    /// Fill every field from typed input.
    pub fn load(&mut self, input: &ClinicalInput) {
        let record = input.assemble();
        for (field, entry) in self.fields.iter_mut().zip(record.iter()) {
            match (&mut field.input, entry.value) {
                (FormInput::Number { buffer, .. }, value) => {
                    buffer.zeroize();
                    buffer.push_str(&value.to_string());
                }
                (FormInput::Scale { value, .. }, FieldValue::Integer(v)) => *value = v,
                (FormInput::Choice { options, index }, FieldValue::Code(code)) => {
                    if let Some(i) = options.iter().position(|(_, c)| *c == code) {
                        *index = i;
                    }
                }
                (FormInput::Choice { options, index }, FieldValue::Label(label)) => {
                    if let Some(i) = options.iter().position(|(l, _)| *l == label) {
                        *index = i;
                    }
                }
                _ => {}
            }
        }
        self.error_message = None;
    }

    /// Load sample data for testing (low-risk reference patient)
    pub fn load_sample_data(&mut self) {
        self.load(&ClinicalInput::sample());
    }
}

/// Render the clinical data entry form
pub fn render_form(f: &mut Frame, area: Rect, state: &FormState, status: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0], status);
    render_form_sections(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect, status: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Thyroid Nodule Work-up", MedicalTheme::title()),
        Span::styled(format!(" │ {status}"), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_sections(f: &mut Frame, area: Rect, state: &FormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    // Demographics and cytology on the left, imaging and blood markers on the right.
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(columns[0]);
    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(0)])
        .split(columns[1]);

    render_section(f, left[0], state, Section::Demographics);
    render_section(f, left[1], state, Section::Cytology);
    render_section(f, right[0], state, Section::Imaging);
    render_section(f, right[1], state, Section::Hematology);
}

fn render_section(f: &mut Frame, area: Rect, state: &FormState, section: Section) {
    let focused = state.fields[state.selected_field].spec.section == section;
    let block = Block::default()
        .title(Span::styled(
            format!(" {} ", section.title()),
            if focused {
                MedicalTheme::subtitle()
            } else {
                MedicalTheme::text_secondary()
            },
        ))
        .borders(Borders::ALL)
        .border_style(if focused {
            MedicalTheme::border_focused()
        } else {
            MedicalTheme::border()
        });

    let lines: Vec<Line> = state
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.spec.section == section)
        .map(|(i, field)| field_line(field, i == state.selected_field))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(field: &FormField, is_selected: bool) -> Line<'static> {
    let label_style = if is_selected {
        MedicalTheme::focused()
    } else {
        MedicalTheme::text_secondary()
    };
    let value = field.input.display();

    let mut spans = vec![Span::styled(format!(" {:<24}", field.spec.label), label_style)];
    match (&field.input, is_selected) {
        (FormInput::Number { .. }, true) => {
            spans.push(Span::styled(value, MedicalTheme::text()));
            spans.push(Span::styled("▌", MedicalTheme::cursor()));
        }
        (_, true) => {
            spans.push(Span::styled("◀ ", MedicalTheme::key_hint()));
            spans.push(Span::styled(value, MedicalTheme::text()));
            spans.push(Span::styled(" ▶", MedicalTheme::key_hint()));
        }
        (_, false) => spans.push(Span::styled(value, MedicalTheme::text())),
    }
    Line::from(spans)
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &FormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.clone(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Change ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Submit ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[R] ", MedicalTheme::key_hint()),
            Span::styled("Reset ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
