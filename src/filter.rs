//! Field and institution filtering of WeChat articles.
//!
//! # Example
//!
//! ```
//! use digestboard::{FilterEngine, Selection, WechatArticle};
//!
//! let articles = vec![WechatArticle {
//!     field: "Agent".into(),
//!     institution: "DeepMind, Meta".into(),
//!     ..Default::default()
//! }];
//!
//! let mut filter = FilterEngine::new();
//! filter.select_institution(Selection::from("Meta"));
//! assert_eq!(filter.apply(&articles).len(), 1);
//! ```

use crate::model::WechatArticle;
use std::fmt;

/// The wire value that selects every label
pub const ALL: &str = "all";

/// A single filter dimension: everything, or one label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }
}

impl From<&str> for Selection {
    /// `"all"` selects everything; any other value selects that label.
    fn from(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => f.write_str(ALL),
            Selection::Only(label) => f.write_str(label),
        }
    }
}

/// The current field and institution selection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterSelection {
    pub field: Selection,
    pub institution: Selection,
}

impl FilterSelection {
    pub fn is_unfiltered(&self) -> bool {
        self.field.is_all() && self.institution.is_all()
    }

    /// Whether `article` passes both dimensions.
    pub fn matches(&self, article: &WechatArticle) -> bool {
        let field_match = match &self.field {
            Selection::All => true,
            Selection::Only(field) => article.field == *field,
        };
        let institution_match = match &self.institution {
            Selection::All => true,
            Selection::Only(institution) => {
                article.institutions().any(|i| i == institution.as_str())
            }
        };
        field_match && institution_match
    }
}

/// Holds the filter selection and computes filtered article lists.
///
/// Selection changes take effect on the next [`FilterEngine::apply`]; there is no
/// debouncing.
#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    selection: FilterSelection,
}

impl FilterEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn select_field(&mut self, field: Selection) -> &mut Self {
        self.selection.field = field;
        self
    }

    pub fn select_institution(&mut self, institution: Selection) -> &mut Self {
        self.selection.institution = institution;
        self
    }

    /// Returns both dimensions to [`Selection::All`].
    pub fn reset(&mut self) -> &mut Self {
        self.selection = FilterSelection::default();
        self
    }

    /// Returns the matching articles, in input order.
    pub fn apply<'a>(&self, articles: &'a [WechatArticle]) -> Vec<&'a WechatArticle> {
        articles
            .iter()
            .filter(|article| self.selection.matches(article))
            .collect()
    }

    /// The filter status line shown above the article list.
    pub fn describe(&self, shown: usize, total: usize) -> String {
        if self.selection.is_unfiltered() {
            return format!("显示全部 {total} 篇文章");
        }

        let mut parts = Vec::new();
        if let Selection::Only(field) = &self.selection.field {
            parts.push(format!("领域: {field}"));
        }
        if let Selection::Only(institution) = &self.selection.institution {
            parts.push(format!("机构: {institution}"));
        }
        format!("筛选条件: {} ({shown}/{total})", parts.join(", "))
    }
}
