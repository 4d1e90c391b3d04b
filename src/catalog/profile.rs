use std::collections::BTreeSet;

/// declarative per-category field rules (spec §3, §4.1). Static and
/// immutable; two profiles ship with this core.
#[derive(Debug, Clone)]
pub struct CategoryProfile {
    pub id: &'static str,
    pub display_name: &'static str,
    pub categorical_fields: Vec<&'static str>,
    pub multi_fields: Vec<&'static str>,
    pub numeric_fields: Vec<&'static str>,
    /// feature keys whose humanized label is redundant with another
    /// already-surfaced label (`humanize_feature` returns `None` for these).
    pub redundant_tokens: BTreeSet<String>,
}

pub const FOUNTAIN_PENS: &str = "fountain_pens";
pub const MOVIES: &str = "movies";

impl CategoryProfile {
    pub fn fountain_pens() -> Self {
        Self {
            id: FOUNTAIN_PENS,
            display_name: "Fountain Pens",
            categorical_fields: vec!["vendor", "product_type", "nib_size"],
            multi_fields: vec!["tags", "options"],
            numeric_fields: vec!["price_min", "price_max"],
            redundant_tokens: ["cat::fountain_pens::cat::product_type::fountain pen"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }

    pub fn movies() -> Self {
        Self {
            id: MOVIES,
            display_name: "Movies",
            categorical_fields: vec!["studio", "rating"],
            multi_fields: vec!["directors", "genres", "cast"],
            numeric_fields: vec!["release_year", "runtime_minutes"],
            redundant_tokens: BTreeSet::new(),
        }
    }
}
