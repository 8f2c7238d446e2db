//! Record types produced by the source loaders.
//!
//! Every type here is immutable once loaded; a refresh replaces whole collections.

use crate::markdown::clean_markdown;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Shown when a record has no usable title
pub const NO_TITLE: &str = "无标题";
/// Shown when a record has no summary
pub const NO_SUMMARY: &str = "无摘要";
/// Shown when a paper has no one-sentence summary
pub const NO_BRIEF_SUMMARY: &str = "无一句话总结";
/// Shown when a paper has no submission date
pub const UNKNOWN_DATE: &str = "未知日期";
/// Source shown for papers that do not name one
pub const DEFAULT_PAPER_SOURCE: &str = "AlphaXiv";
/// Shown when a paper carries no notes
pub const NO_NOTES: &str = "无阅读笔记";

/// A flat, ordered mapping from field name to string value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Get a field value by name. The last entry wins if a name repeats.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// Get a field value, or an empty string if absent.
    pub fn get_or_empty(&self, field: &str) -> &str {
        self.get(field).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Splits a comma-joined institution list into trimmed, non-empty names.
pub fn split_institutions(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

/// A curated WeChat article.
///
/// All nine fields are always present; a column missing from the export yields an
/// empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WechatArticle {
    /// Publishing account
    pub source: String,
    pub date: String,
    /// Original article title
    pub title: String,
    /// Title of the research report the article covers
    pub report_title: String,
    pub brief_summary: String,
    pub summary: String,
    pub url: String,
    /// Research field label
    pub field: String,
    /// Comma-joined institution names, see [`WechatArticle::institutions`]
    pub institution: String,
}

impl WechatArticle {
    /// Semantic field names, in export column order
    pub const FIELDS: [&'static str; 9] = [
        "source",
        "date",
        "title",
        "report_title",
        "brief_summary",
        "summary",
        "url",
        "field",
        "institution",
    ];

    /// Builds an article from a mapped record.
    pub fn from_record(record: &Record) -> Self {
        let get = |field: &str| record.get_or_empty(field).to_string();
        Self {
            source: get("source"),
            date: get("date"),
            title: get("title"),
            report_title: get("report_title"),
            brief_summary: get("brief_summary"),
            summary: get("summary"),
            url: get("url"),
            field: get("field"),
            institution: get("institution"),
        }
    }

    /// Institution names, split lazily from the raw field
    pub fn institutions(&self) -> impl Iterator<Item = &str> {
        split_institutions(&self.institution)
    }

    /// The report title, falling back to the original title
    pub fn display_title(&self) -> &str {
        [&self.report_title, &self.title]
            .into_iter()
            .find(|t| !t.is_empty())
            .map_or(NO_TITLE, String::as_str)
    }

    /// The original title, only when it differs from the displayed report title
    pub fn original_title(&self) -> Option<&str> {
        (!self.title.is_empty() && !self.report_title.is_empty() && self.title != self.report_title)
            .then_some(self.title.as_str())
    }

    pub fn summary_or_placeholder(&self) -> &str {
        non_empty_or(&self.summary, NO_SUMMARY)
    }
}

/// A processed paper from the JSON export.
///
/// Keys beyond the documented set are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub brief_summary: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub submission_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    /// Markdown reading notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Paper {
    /// Title with markdown headings and links removed
    pub fn display_title(&self) -> String {
        cleaned_or(&self.title, NO_TITLE)
    }

    pub fn display_brief_summary(&self) -> String {
        cleaned_or(&self.brief_summary, NO_BRIEF_SUMMARY)
    }

    pub fn display_date(&self) -> &str {
        non_empty_or(&self.submission_date, UNKNOWN_DATE)
    }

    pub fn display_source(&self) -> &str {
        non_empty_or(&self.source, DEFAULT_PAPER_SOURCE)
    }

    /// Cleaned notes, or a placeholder when the paper has none
    pub fn display_notes(&self) -> String {
        cleaned_or(self.notes.as_deref().unwrap_or_default(), NO_NOTES)
    }
}

/// Reads a JSON scalar as text. `null` becomes empty and numbers keep their digits.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Literal headers of the HuggingFace export.
pub mod headers {
    pub const TITLE: &str = "标题";
    pub const CHINESE_TITLE: &str = "中文标题";
    pub const PDF_LINK: &str = "PDF链接";
    pub const FIELD: &str = "领域分类";
    pub const INSTITUTION: &str = "研究机构";
    pub const BRIEF_SUMMARY: &str = "简明摘要";
    pub const UPVOTES: &str = "Upvote数";
}

/// A trending paper from the HuggingFace export.
///
/// Keys are the export's literal headers; every header is present in every paper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HuggingFacePaper {
    record: Record,
}

impl HuggingFacePaper {
    pub fn from_record(record: Record) -> Self {
        Self { record }
    }

    /// The underlying record, keyed by literal header text
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.record.get(header)
    }

    pub fn title(&self) -> &str {
        non_empty_or(self.record.get_or_empty(headers::TITLE), NO_TITLE)
    }

    /// Chinese title, if any
    pub fn chinese_title(&self) -> Option<&str> {
        self.non_empty(headers::CHINESE_TITLE)
    }

    pub fn pdf_link(&self) -> Option<&str> {
        self.non_empty(headers::PDF_LINK)
    }

    pub fn field(&self) -> Option<&str> {
        self.non_empty(headers::FIELD)
    }

    pub fn institutions(&self) -> impl Iterator<Item = &str> {
        split_institutions(self.record.get_or_empty(headers::INSTITUTION))
    }

    pub fn brief_summary(&self) -> &str {
        non_empty_or(self.record.get_or_empty(headers::BRIEF_SUMMARY), NO_SUMMARY)
    }

    /// Upvote count from the field's optionally signed leading digits.
    ///
    /// A field without digits counts as 0; counts beyond `i64` saturate.
    pub fn upvotes(&self) -> i64 {
        let raw = self.record.get_or_empty(headers::UPVOTES).trim();
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.strip_prefix('+').unwrap_or(raw)),
        };
        let magnitude = digits
            .chars()
            .map_while(|c| c.to_digit(10))
            .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d)));
        if negative { -magnitude } else { magnitude }
    }

    fn non_empty(&self, header: &str) -> Option<&str> {
        self.record.get(header).filter(|v| !v.is_empty())
    }
}

fn non_empty_or<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.is_empty() { placeholder } else { value }
}

fn cleaned_or(value: &str, placeholder: &str) -> String {
    let cleaned = clean_markdown(value);
    if cleaned.is_empty() {
        placeholder.to_string()
    } else {
        cleaned
    }
}
