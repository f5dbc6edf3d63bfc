//! Clinical record: field catalogue, raw form input, and the assembled record.
//!
//! The 23 fields, their order, domains and encodings are declared once in
//! [`FIELDS`]. Everything downstream (form layout, record assembly, feature
//! vectors, model artifact validation) follows that order.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::encoding::{
    Antibody, Categorical, Cellularity, Colloid, Composition, Echogenicity, Gender,
    LabelCodes, Margins, NoduleShape, Presence, Vascularity, YesNo,
};

/// Form section a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Demographics,
    Imaging,
    Cytology,
    Hematology,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Demographics,
        Section::Imaging,
        Section::Cytology,
        Section::Hematology,
    ];

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Demographics => "Demographics",
            Self::Imaging => "Imaging (USG)",
            Self::Cytology => "FNAC (Cytology)",
            Self::Hematology => "Hematology / Biochemical",
        }
    }
}

/// Input domain and record encoding of a field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Free integer entry, passthrough.
    Integer { min: i64, max: i64 },
    /// Small integer scale picked from a list, passthrough.
    Scale { min: i64, max: i64 },
    /// Non-negative real, passthrough.
    Real { min: f64 },
    /// Categorical; the record holds the integer code.
    Coded(&'static [(&'static str, u8)]),
    /// Categorical; the record holds the label.
    Labelled(&'static [(&'static str, u8)]),
}

/// Static description of one clinical field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    /// Record key, also the classifier feature name.
    pub name: &'static str,
    /// Form label.
    pub label: &'static str,
    pub section: Section,
    pub kind: FieldKind,
}

const fn field(
    name: &'static str,
    label: &'static str,
    section: Section,
    kind: FieldKind,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        section,
        kind,
    }
}

/// Number of fields in a clinical record.
pub const FIELD_COUNT: usize = 23;

/// The field catalogue, in record order.
pub const FIELDS: [FieldSpec; FIELD_COUNT] = [
    field("age", "Age (years)", Section::Demographics, FieldKind::Integer { min: 0, max: 120 }),
    field("gender", "Gender", Section::Demographics, FieldKind::Coded(Gender::TABLE)),
    field("usg_tirads", "TI-RADS Score", Section::Imaging, FieldKind::Scale { min: 1, max: 5 }),
    field(
        "usg_max_size_mm",
        "Largest nodule size (mm)",
        Section::Imaging,
        FieldKind::Real { min: 0.0 },
    ),
    field(
        "usg_composition",
        "Composition",
        Section::Imaging,
        FieldKind::Labelled(Composition::TABLE),
    ),
    field(
        "usg_echogenicity",
        "Echogenicity",
        Section::Imaging,
        FieldKind::Labelled(Echogenicity::TABLE),
    ),
    field("usg_shape", "Shape", Section::Imaging, FieldKind::Coded(NoduleShape::TABLE)),
    field("usg_margins", "Margins", Section::Imaging, FieldKind::Coded(Margins::TABLE)),
    field(
        "usg_calcifications",
        "Microcalcifications",
        Section::Imaging,
        FieldKind::Coded(Presence::TABLE),
    ),
    field(
        "usg_vascularity",
        "Vascularity",
        Section::Imaging,
        FieldKind::Labelled(Vascularity::TABLE),
    ),
    field(
        "usg_extrathyroidal_extension",
        "Signs of invasion",
        Section::Imaging,
        FieldKind::Coded(YesNo::TABLE),
    ),
    field(
        "usg_suspicious_lymph_nodes",
        "Suspicious lymph nodes",
        Section::Imaging,
        FieldKind::Coded(YesNo::TABLE),
    ),
    field(
        "fnac_bethesda",
        "Bethesda category",
        Section::Cytology,
        FieldKind::Scale { min: 1, max: 6 },
    ),
    field(
        "fnac_nuclear_atypia",
        "Nuclear atypia",
        Section::Cytology,
        FieldKind::Coded(Presence::TABLE),
    ),
    field("fnac_colloid", "Colloid", Section::Cytology, FieldKind::Coded(Colloid::TABLE)),
    field(
        "fnac_cellularity",
        "Cellularity",
        Section::Cytology,
        FieldKind::Coded(Cellularity::TABLE),
    ),
    field("tsh", "TSH (mIU/L)", Section::Hematology, FieldKind::Real { min: 0.0 }),
    field("calcitonin", "Calcitonin (pg/mL)", Section::Hematology, FieldKind::Real { min: 0.0 }),
    field("cea", "CEA (ng/mL)", Section::Hematology, FieldKind::Real { min: 0.0 }),
    field("tg", "Thyroglobulin (ng/mL)", Section::Hematology, FieldKind::Real { min: 0.0 }),
    field("tgab", "Anti-Tg antibodies", Section::Hematology, FieldKind::Coded(Antibody::TABLE)),
    field("nlr", "NLR (ratio)", Section::Hematology, FieldKind::Real { min: 0.0 }),
    field("plr", "PLR (ratio)", Section::Hematology, FieldKind::Real { min: 0.0 }),
];

/// Field names in record order.
#[must_use]
pub fn field_names() -> [&'static str; FIELD_COUNT] {
    FIELDS.map(|f| f.name)
}

/// Look up a field by record key.
#[must_use]
pub fn field_spec(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Code table of a field whose record value is a label.
pub(crate) fn labelled_table(name: &str) -> Option<&'static [(&'static str, u8)]> {
    match field_spec(name)?.kind {
        FieldKind::Labelled(table) => Some(table),
        _ => None,
    }
}

/// Raw form selections, one typed value per field.
///
/// `Default` mirrors the form defaults: numeric inputs start at their
/// minimum and every choice at its first option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicalInput {
    pub age: i64,
    pub gender: Gender,

    pub usg_tirads: i64,
    pub usg_max_size_mm: f64,
    pub usg_composition: Composition,
    pub usg_echogenicity: Echogenicity,
    pub usg_shape: NoduleShape,
    pub usg_margins: Margins,
    pub usg_calcifications: Presence,
    pub usg_vascularity: Vascularity,
    pub usg_extrathyroidal_extension: YesNo,
    pub usg_suspicious_lymph_nodes: YesNo,

    pub fnac_bethesda: i64,
    pub fnac_nuclear_atypia: Presence,
    pub fnac_colloid: Colloid,
    pub fnac_cellularity: Cellularity,

    pub tsh: f64,
    pub calcitonin: f64,
    pub cea: f64,
    pub tg: f64,
    pub tgab: Antibody,
    pub nlr: f64,
    pub plr: f64,
}

impl Default for ClinicalInput {
    fn default() -> Self {
        Self {
            age: 0,
            gender: Gender::default(),
            usg_tirads: 1,
            usg_max_size_mm: 0.0,
            usg_composition: Composition::default(),
            usg_echogenicity: Echogenicity::default(),
            usg_shape: NoduleShape::default(),
            usg_margins: Margins::default(),
            usg_calcifications: Presence::default(),
            usg_vascularity: Vascularity::default(),
            usg_extrathyroidal_extension: YesNo::default(),
            usg_suspicious_lymph_nodes: YesNo::default(),
            fnac_bethesda: 1,
            fnac_nuclear_atypia: Presence::default(),
            fnac_colloid: Colloid::default(),
            fnac_cellularity: Cellularity::default(),
            tsh: 0.0,
            calcitonin: 0.0,
            cea: 0.0,
            tg: 0.0,
            tgab: Antibody::default(),
            nlr: 0.0,
            plr: 0.0,
        }
    }
}

/// A value as entered in the form, before it is typed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    Number(f64),
    Choice(&'a str),
}

fn choice<C: Categorical>(field: &str, value: RawValue<'_>) -> Result<C, String> {
    match value {
        RawValue::Choice(label) => {
            C::from_label(label).ok_or_else(|| format!("{field}: unknown option {label:?}"))
        }
        RawValue::Number(_) => Err(format!("{field}: expected an option, got a number")),
    }
}

fn number(field: &str, value: RawValue<'_>) -> Result<f64, String> {
    match value {
        RawValue::Number(n) => Ok(n),
        RawValue::Choice(label) => label
            .parse()
            .map_err(|_| format!("{field}: expected a number, got {label:?}")),
    }
}

fn integer(field: &str, value: RawValue<'_>) -> Result<i64, String> {
    let n = number(field, value)?;
    if n.fract() != 0.0 || !n.is_finite() {
        return Err(format!("{field}: {n} is not a whole number"));
    }
    Ok(n as i64)
}

impl ClinicalInput {
    /// A low-risk reference patient, used as form sample data.
    #[must_use]
    pub fn sample() -> Self {
        Self {
            age: 45,
            gender: Gender::Female,
            usg_tirads: 3,
            usg_max_size_mm: 12.5,
            usg_composition: Composition::Solid,
            usg_echogenicity: Echogenicity::Iso,
            usg_shape: NoduleShape::WiderThanTall,
            usg_margins: Margins::Regular,
            usg_calcifications: Presence::Absent,
            usg_vascularity: Vascularity::Avascular,
            usg_extrathyroidal_extension: YesNo::No,
            usg_suspicious_lymph_nodes: YesNo::No,
            fnac_bethesda: 2,
            fnac_nuclear_atypia: Presence::Absent,
            fnac_colloid: Colloid::Present,
            fnac_cellularity: Cellularity::Low,
            tsh: 1.5,
            calcitonin: 0.0,
            cea: 1.0,
            tg: 10.0,
            tgab: Antibody::Negative,
            nlr: 2.0,
            plr: 100.0,
        }
    }

    /// Set one field from a raw form value.
    ///
    /// # Errors
    /// Returns an error for an unknown field or a value of the wrong shape.
    /// Range checks are left to [`ClinicalInput::validate`].
    pub fn apply(&mut self, field: &str, value: RawValue<'_>) -> Result<(), String> {
        match field {
            "age" => self.age = integer(field, value)?,
            "gender" => self.gender = choice(field, value)?,
            "usg_tirads" => self.usg_tirads = integer(field, value)?,
            "usg_max_size_mm" => self.usg_max_size_mm = number(field, value)?,
            "usg_composition" => self.usg_composition = choice(field, value)?,
            "usg_echogenicity" => self.usg_echogenicity = choice(field, value)?,
            "usg_shape" => self.usg_shape = choice(field, value)?,
            "usg_margins" => self.usg_margins = choice(field, value)?,
            "usg_calcifications" => self.usg_calcifications = choice(field, value)?,
            "usg_vascularity" => self.usg_vascularity = choice(field, value)?,
            "usg_extrathyroidal_extension" => {
                self.usg_extrathyroidal_extension = choice(field, value)?;
            }
            "usg_suspicious_lymph_nodes" => self.usg_suspicious_lymph_nodes = choice(field, value)?,
            "fnac_bethesda" => self.fnac_bethesda = integer(field, value)?,
            "fnac_nuclear_atypia" => self.fnac_nuclear_atypia = choice(field, value)?,
            "fnac_colloid" => self.fnac_colloid = choice(field, value)?,
            "fnac_cellularity" => self.fnac_cellularity = choice(field, value)?,
            "tsh" => self.tsh = number(field, value)?,
            "calcitonin" => self.calcitonin = number(field, value)?,
            "cea" => self.cea = number(field, value)?,
            "tg" => self.tg = number(field, value)?,
            "tgab" => self.tgab = choice(field, value)?,
            "nlr" => self.nlr = number(field, value)?,
            "plr" => self.plr = number(field, value)?,
            other => return Err(format!("unknown field {other:?}")),
        }
        Ok(())
    }

    /// Check every numeric field against its domain.
    ///
    /// # Errors
    /// Returns one message per violated field.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let record = self.assemble();
        let mut errors = Vec::new();

        for (spec, entry) in FIELDS.iter().zip(record.iter()) {
            match (spec.kind, entry.value) {
                (FieldKind::Integer { min, max }, FieldValue::Integer(v))
                | (FieldKind::Scale { min, max }, FieldValue::Integer(v)) => {
                    if !(min..=max).contains(&v) {
                        errors.push(format!("{}: {v} out of range [{min}, {max}]", spec.label));
                    }
                }
                (FieldKind::Real { min }, FieldValue::Real(v)) => {
                    if !v.is_finite() {
                        errors.push(format!("{}: value must be a finite number", spec.label));
                    } else if v < min {
                        errors.push(format!("{}: {v} must be at least {min}", spec.label));
                    }
                }
                _ => {}
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Assemble the flat record. Total: every field is always present.
    #[must_use]
    pub fn assemble(&self) -> ClinicalRecord {
        use FieldValue::{Code, Integer, Label, Real};

        let values = [
            Integer(self.age),
            Code(self.gender.code()),
            Integer(self.usg_tirads),
            Real(self.usg_max_size_mm),
            Label(self.usg_composition.label()),
            Label(self.usg_echogenicity.label()),
            Code(self.usg_shape.code()),
            Code(self.usg_margins.code()),
            Code(self.usg_calcifications.code()),
            Label(self.usg_vascularity.label()),
            Code(self.usg_extrathyroidal_extension.code()),
            Code(self.usg_suspicious_lymph_nodes.code()),
            Integer(self.fnac_bethesda),
            Code(self.fnac_nuclear_atypia.code()),
            Code(self.fnac_colloid.code()),
            Code(self.fnac_cellularity.code()),
            Real(self.tsh),
            Real(self.calcitonin),
            Real(self.cea),
            Real(self.tg),
            Code(self.tgab.code()),
            Real(self.nlr),
            Real(self.plr),
        ];

        let entries = FIELDS
            .iter()
            .zip(values)
            .map(|(spec, value)| RecordEntry {
                name: spec.name,
                value,
            })
            .collect();

        ClinicalRecord { entries }
    }
}

/// One encoded value in a clinical record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Integer(i64),
    Real(f64),
    Code(u8),
    Label(&'static str),
}

impl FieldValue {
    /// Numeric value, or `None` for a label.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Integer(v) => Some(v as f64),
            Self::Real(v) => Some(v),
            Self::Code(v) => Some(f64::from(v)),
            Self::Label(_) => None,
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{v}"),
            Self::Real(v) => write!(f, "{v:?}"),
            Self::Code(v) => write!(f, "{v}"),
            Self::Label(v) => f.write_str(v),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            Self::Integer(v) => serializer.serialize_i64(v),
            Self::Real(v) => serializer.serialize_f64(v),
            Self::Code(v) => serializer.serialize_u8(v),
            Self::Label(v) => serializer.serialize_str(v),
        }
    }
}

/// A `(field name, value)` pair of a record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordEntry {
    pub name: &'static str,
    pub value: FieldValue,
}

/// The assembled clinical record. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicalRecord {
    entries: Vec<RecordEntry>,
}

impl ClinicalRecord {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<FieldValue> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.value)
    }

    /// Feature vector in record order, labels turned into codes.
    ///
    /// # Errors
    /// Returns the name of a labelled field whose value has no code.
    pub fn to_features(&self, codes: &LabelCodes) -> Result<Vec<f64>, String> {
        self.entries
            .iter()
            .map(|entry| match entry.value {
                FieldValue::Label(label) => codes
                    .code(entry.name, label)
                    .map(f64::from)
                    .ok_or_else(|| format!("no code for {}={label:?}", entry.name)),
                other => other
                    .as_f64()
                    .ok_or_else(|| format!("{} is not numeric", entry.name)),
            })
            .collect()
    }

    /// Pretty JSON object, keys in record order.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ClinicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.name, &entry.value)?;
        }
        map.end()
    }
}

/// Display label for a coded field value, used when showing a record.
#[must_use]
pub fn display_value(spec: &FieldSpec, value: FieldValue) -> String {
    match (spec.kind, value) {
        (FieldKind::Coded(table), FieldValue::Code(code)) => {
            match super::encoding::label_for(table, code) {
                Some(label) => format!("{label} ({code})"),
                None => code.to_string(),
            }
        }
        _ => value.to_string(),
    }
}
