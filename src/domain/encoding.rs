//! Label-to-code tables for every categorical clinical field.
//!
//! Each categorical field owns exactly one static table. The form, the
//! record assembler and the feature encoder all read from here, so the
//! codes a submission is encoded with are the same codes a training
//! pipeline sees.

use std::collections::BTreeMap;

/// A categorical field with an enumerated label set and fixed integer codes.
pub trait Categorical: Copy + Sized + 'static {
    /// Every variant, in display order. The first one is the form default.
    const ALL: &'static [Self];

    /// `(label, code)` pairs, in display order.
    const TABLE: &'static [(&'static str, u8)];

    /// Display label shown in the form.
    fn label(self) -> &'static str;

    /// Fixed integer code.
    fn code(self) -> u8;

    /// Reverse lookup. Unknown labels yield `None`.
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.label() == label)
    }
}

macro_rules! categorical {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($label:literal, $code:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl Categorical for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];
            const TABLE: &'static [(&'static str, u8)] = &[$(($label, $code)),+];

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ALL[0]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

categorical! {
    /// Patient gender.
    Gender {
        Female => ("Female", 0),
        Male => ("Male", 1),
    }
}

categorical! {
    /// Nodule composition on ultrasound. Kept as a label in the record;
    /// codes are lexicographic and used only for the classifier.
    Composition {
        Solid => ("Solid", 2),
        Mixed => ("Mixed", 1),
        Cystic => ("Cystic", 0),
    }
}

categorical! {
    /// Nodule echogenicity. Kept as a label in the record.
    Echogenicity {
        Hypo => ("Hypo", 1),
        Iso => ("Iso", 2),
        Hyper => ("Hyper", 0),
    }
}

categorical! {
    NoduleShape {
        WiderThanTall => ("Wider-than-tall", 0),
        TallerThanWide => ("Taller-than-wide", 1),
    }
}

categorical! {
    Margins {
        Regular => ("Regular", 0),
        Irregular => ("Irregular/Spiculated", 1),
    }
}

categorical! {
    /// Absent/Present finding (microcalcifications, nuclear atypia).
    Presence {
        Absent => ("Absent", 0),
        Present => ("Present", 1),
    }
}

categorical! {
    /// Doppler vascularity. Kept as a label in the record.
    Vascularity {
        /// No detectable flow.
        Avascular => ("None", 1),
        Peripheral => ("Peripheral", 2),
        Intranodular => ("Intranodular", 0),
    }
}

categorical! {
    YesNo {
        No => ("No", 0),
        Yes => ("Yes", 1),
    }
}

categorical! {
    /// Colloid on cytology. Listed Present-first, so Present encodes as 0.
    Colloid {
        Present => ("Present", 0),
        Absent => ("Absent", 1),
    }
}

categorical! {
    Cellularity {
        Low => ("Low", 1),
        Moderate => ("Moderate", 2),
        High => ("High", 3),
    }
}

categorical! {
    /// Anti-thyroglobulin antibodies.
    Antibody {
        Negative => ("Negative", 0),
        Positive => ("Positive", 1),
    }
}

/// Look up the code for `label` in a static table.
#[must_use]
pub fn code_for(table: &[(&'static str, u8)], label: &str) -> Option<u8> {
    table.iter().find(|(l, _)| *l == label).map(|(_, c)| *c)
}

/// Look up the label for `code` in a static table.
#[must_use]
pub fn label_for(table: &[(&'static str, u8)], code: u8) -> Option<&'static str> {
    table.iter().find(|(_, c)| *c == code).map(|(l, _)| *l)
}

/// Codes used when a labelled field is turned into a classifier feature.
///
/// Defaults to the static tables above. A model artifact may carry the
/// codes its training pipeline used; those replace the defaults per field
/// once they are shown to cover the label set exactly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelCodes {
    overrides: BTreeMap<String, BTreeMap<String, u32>>,
}

impl LabelCodes {
    /// Build from a persisted `field -> label -> code` table.
    ///
    /// # Errors
    /// Returns a description of the first problem found: an unknown or
    /// non-labelled field, a missing or unknown label, or a repeated code.
    pub fn from_table(table: BTreeMap<String, BTreeMap<String, u32>>) -> Result<Self, String> {
        for (field, codes) in &table {
            let Some(static_table) = super::record::labelled_table(field) else {
                return Err(format!("category_codes: {field} is not a labelled field"));
            };

            for (label, _) in static_table {
                if !codes.contains_key(*label) {
                    return Err(format!("category_codes: {field} is missing label {label:?}"));
                }
            }
            if let Some(unknown) = codes.keys().find(|l| code_for(static_table, l).is_none()) {
                return Err(format!("category_codes: {field} has unknown label {unknown:?}"));
            }

            let mut seen: Vec<u32> = codes.values().copied().collect();
            seen.sort_unstable();
            seen.dedup();
            if seen.len() != codes.len() {
                return Err(format!("category_codes: {field} assigns the same code twice"));
            }
        }

        Ok(Self { overrides: table })
    }

    /// Code for a label of a labelled field, if the field and label are known.
    #[must_use]
    pub fn code(&self, field: &str, label: &str) -> Option<u32> {
        if let Some(codes) = self.overrides.get(field) {
            return codes.get(label).copied();
        }
        super::record::labelled_table(field)
            .and_then(|table| code_for(table, label))
            .map(u32::from)
    }

    /// Whether any field uses artifact-provided codes.
    #[must_use]
    pub fn has_overrides(&self) -> bool {
        !self.overrides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_total<C: Categorical + PartialEq + std::fmt::Debug>() {
        assert_eq!(C::ALL.len(), C::TABLE.len());
        for (variant, (label, code)) in C::ALL.iter().zip(C::TABLE) {
            assert_eq!(variant.label(), *label);
            assert_eq!(variant.code(), *code);
            assert_eq!(C::from_label(label), Some(*variant));
        }
    }

    #[test]
    fn test_every_table_is_total_and_consistent() {
        assert_total::<Gender>();
        assert_total::<Composition>();
        assert_total::<Echogenicity>();
        assert_total::<NoduleShape>();
        assert_total::<Margins>();
        assert_total::<Presence>();
        assert_total::<Vascularity>();
        assert_total::<YesNo>();
        assert_total::<Colloid>();
        assert_total::<Cellularity>();
        assert_total::<Antibody>();
    }

    #[test]
    fn test_binary_codes() {
        assert_eq!(Gender::from_label("Female").map(Categorical::code), Some(0));
        assert_eq!(Gender::from_label("Male").map(Categorical::code), Some(1));
        assert_eq!(NoduleShape::TallerThanWide.code(), 1);
        assert_eq!(Margins::Irregular.label(), "Irregular/Spiculated");
        assert_eq!(Colloid::Present.code(), 0);
        assert_eq!(Colloid::Absent.code(), 1);
        assert_eq!(Antibody::Positive.code(), 1);
    }

    #[test]
    fn test_cellularity_is_one_based() {
        assert_eq!(Cellularity::Low.code(), 1);
        assert_eq!(Cellularity::Moderate.code(), 2);
        assert_eq!(Cellularity::High.code(), 3);
    }

    #[test]
    fn test_defaults_are_first_option() {
        assert_eq!(Gender::default(), Gender::Female);
        assert_eq!(Colloid::default(), Colloid::Present);
        assert_eq!(Vascularity::default().label(), "None");
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(Gender::from_label("female"), None);
        assert_eq!(Cellularity::from_label(""), None);
    }

    #[test]
    fn test_label_codes_default_to_static_tables() {
        let codes = LabelCodes::default();
        assert_eq!(codes.code("usg_composition", "Cystic"), Some(0));
        assert_eq!(codes.code("usg_echogenicity", "Iso"), Some(2));
        assert_eq!(codes.code("usg_vascularity", "None"), Some(1));
        assert_eq!(codes.code("usg_vascularity", "Weird"), None);
        assert_eq!(codes.code("gender", "Male"), None);
    }

    #[test]
    fn test_label_codes_override() {
        let mut table = BTreeMap::new();
        table.insert(
            "usg_composition".to_string(),
            BTreeMap::from([
                ("Solid".to_string(), 0),
                ("Mixed".to_string(), 1),
                ("Cystic".to_string(), 2),
            ]),
        );
        let codes = LabelCodes::from_table(table).expect("valid override");
        assert!(codes.has_overrides());
        assert_eq!(codes.code("usg_composition", "Solid"), Some(0));
        // Untouched fields keep the static codes.
        assert_eq!(codes.code("usg_echogenicity", "Hyper"), Some(0));
    }

    #[test]
    fn test_label_codes_reject_incomplete_or_duplicate() {
        let missing = BTreeMap::from([(
            "usg_vascularity".to_string(),
            BTreeMap::from([("None".to_string(), 0), ("Peripheral".to_string(), 1)]),
        )]);
        assert!(LabelCodes::from_table(missing).is_err());

        let duplicate = BTreeMap::from([(
            "usg_echogenicity".to_string(),
            BTreeMap::from([
                ("Hypo".to_string(), 0),
                ("Iso".to_string(), 0),
                ("Hyper".to_string(), 1),
            ]),
        )]);
        assert!(LabelCodes::from_table(duplicate).is_err());

        let not_labelled = BTreeMap::from([(
            "gender".to_string(),
            BTreeMap::from([("Female".to_string(), 0), ("Male".to_string(), 1)]),
        )]);
        assert!(LabelCodes::from_table(not_labelled).is_err());
    }
}
