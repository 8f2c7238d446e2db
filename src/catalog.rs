//! Fixed category catalog for filter options.
//!
//! Field and institution options come from curated constants rather than from the
//! loaded data, so option order is stable across refreshes and free-text labels typed
//! by curators never become options. An article whose label is outside the catalog
//! still renders, it just cannot be selected by that label.

use itertools::Itertools;

/// Research fields, in display order
pub const PREDEFINED_FIELDS: &[&str] = &[
    "LLM",
    "Diffusion Model",
    "Multimodal LLM",
    "Embodied AI",
    "Agent",
    "AGI",
    "Other",
];

/// Institutions, in display order
pub const PREDEFINED_INSTITUTIONS: &[&str] = &[
    "DeepMind",
    "Meta",
    "Google",
    "Microsoft",
    "OpenAI",
    "Shanghai AI Lab",
    "ByteDance",
    "THU",
    "PKU",
    "Tencent",
    "Alibaba",
    "Amazon",
    "Other",
];

/// The selectable field and institution labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    fields: Vec<&'static str>,
    institutions: Vec<&'static str>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// Creates a catalog populated from the predefined lists
    #[must_use]
    pub fn new() -> Self {
        let mut catalog = Self {
            fields: Vec::new(),
            institutions: Vec::new(),
        };
        catalog.reinitialize();
        catalog
    }

    /// Clears both lists and repopulates them from the predefined constants.
    pub fn reinitialize(&mut self) {
        self.fields.clear();
        self.institutions.clear();
        self.fields.extend(PREDEFINED_FIELDS.iter().copied().unique());
        self.institutions
            .extend(PREDEFINED_INSTITUTIONS.iter().copied().unique());
    }

    pub fn fields(&self) -> &[&'static str] {
        &self.fields
    }

    pub fn institutions(&self) -> &[&'static str] {
        &self.institutions
    }

    pub fn contains_field(&self, label: &str) -> bool {
        self.fields.iter().any(|f| *f == label)
    }

    pub fn contains_institution(&self, label: &str) -> bool {
        self.institutions.iter().any(|i| *i == label)
    }
}
