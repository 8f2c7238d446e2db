//! Parsing, caching, and filtering for a curated AI-research digest.
//!
//! `digestboard` turns three pre-generated exports into typed records and keeps the
//! state a digest page needs between renders.
//!
//! # Key Features
//!
//! - **Quoted CSV tokenizing**: one tokenizer, two modes:
//!   - per-line, for exports that never embed newlines in a field
//!   - streaming, for exports with multi-line quoted fields
//!
//! - **Header mapping**: source headers are mapped to semantic field names through
//!   a declared table, with padding/truncation of malformed rows.
//!
//! - **Sources**:
//!   - WeChat article CSV
//!   - processed papers JSON
//!   - HuggingFace trending papers CSV, ranked by upvotes
//!
//! - **State**: an expiring snapshot cache and a field/institution filter.
//!
//! # Basic Usage
//!
//! ```rust
//! use digestboard::{SourceLoader, WechatLoader};
//!
//! let input = "公众号,发布时间,原标题,科技报告标题,一句话总结,摘要,URL,领域分类,研究机构
//! 机器之心,2024-05-01,原文,报告,一句话,摘要,https://example.com,LLM,\"DeepMind, Meta\"";
//!
//! let articles = WechatLoader::new().parse(input).unwrap();
//! assert_eq!(articles[0].field, "LLM");
//! assert_eq!(articles[0].institutions().collect::<Vec<_>>(), ["DeepMind", "Meta"]);
//! ```
//!
//! # Filtering
//!
//! ```rust
//! use digestboard::{FilterEngine, Selection, WechatArticle};
//!
//! let articles = vec![
//!     WechatArticle { field: "LLM".into(), institution: "DeepMind".into(), ..Default::default() },
//!     WechatArticle { field: "Agent".into(), institution: "DeepMind".into(), ..Default::default() },
//! ];
//!
//! let mut filter = FilterEngine::new();
//! filter.select_field(Selection::from("LLM"));
//! assert_eq!(filter.apply(&articles).len(), 1);
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`Result`], which wraps [`DigestError`]. Cache storage
//! failures never surface here: the cache degrades to a miss instead.

use std::path::PathBuf;
use thiserror::Error;

pub mod cache;
pub mod catalog;
pub mod csv;
pub mod dashboard;
pub mod filter;
pub mod markdown;
pub mod model;
pub mod preview;
pub mod schedule;
pub mod source;

// Reexports
pub use cache::{CacheSnapshot, CacheStore, Clock, ManualClock, MemoryStorage, Storage, SystemClock};
pub use catalog::Catalog;
pub use csv::{CsvTokenizer, TokenizeMode};
pub use dashboard::{Dashboard, DashboardConfig, Presenter, Section};
pub use filter::{FilterEngine, FilterSelection, Selection};
pub use model::{HuggingFacePaper, Paper, Record, WechatArticle};
pub use preview::preview;
pub use source::{DirFetcher, Fetcher, HuggingFaceLoader, PaperLoader, SourceLoader, WechatLoader};

/// A specialized Result type for digest operations.
pub type Result<T> = std::result::Result<T, DigestError>;

/// Errors that can occur while loading a source.
#[derive(Error, Debug)]
pub enum DigestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to fetch {resource}: {source}")]
    Fetch {
        resource: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    InvalidFormat(String),

    #[error("Storage error: {0}")]
    Storage(#[from] cache::StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_error_display() {
        let error = DigestError::InvalidFormat("CSV file is empty".to_string());
        assert_eq!(error.to_string(), "Parse error: CSV file is empty");
    }

    #[test]
    fn test_fetch_error_names_resource() {
        let error = DigestError::Fetch {
            resource: PathBuf::from("wechat_articles.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(error.to_string(), "Failed to fetch wechat_articles.csv: missing");
    }
}
