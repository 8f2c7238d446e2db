//! Source loaders for the three digest exports.
//!
//! Each loader turns the text of one export into typed records:
//!
//! - [`WechatLoader`]: `wechat_articles.csv`, one record per line
//! - [`PaperLoader`]: `processed_papers.json`
//! - [`HuggingFaceLoader`]: `huggingface_papers.csv`, with multi-line fields
//!
//! # Example
//!
//! ```
//! use digestboard::{HuggingFaceLoader, SourceLoader};
//! use digestboard::source::rank_by_upvotes;
//!
//! let input = "标题,简明摘要,Upvote数\nA,\"two\nlines\",3\nB,short,12\n";
//!
//! let mut papers = HuggingFaceLoader::new().parse(input).unwrap();
//! rank_by_upvotes(&mut papers);
//! assert_eq!(papers[0].title(), "B");
//! assert_eq!(papers[1].brief_summary(), "two\nlines");
//! ```

use crate::csv::{CsvTokenizer, HeaderMap, RecordMapper, TokenizeMode};
use crate::model::{HuggingFacePaper, Paper, Record, WechatArticle};
use crate::{DigestError, Result};
use nanoid::nanoid;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Header dictionary of the WeChat export
pub const WECHAT_HEADERS: &[(&str, &str)] = &[
    ("公众号", "source"),
    ("发布时间", "date"),
    ("原标题", "title"),
    ("科技报告标题", "report_title"),
    ("一句话总结", "brief_summary"),
    ("摘要", "summary"),
    ("URL", "url"),
    ("领域分类", "field"),
    ("研究机构", "institution"),
];

/// Retrieves the text of a static resource.
pub trait Fetcher {
    fn fetch(&self, resource: &str) -> Result<String>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn fetch(&self, resource: &str) -> Result<String> {
        (**self).fetch(resource)
    }
}

/// Reads resources from files under a root directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetcher for DirFetcher {
    fn fetch(&self, resource: &str) -> Result<String> {
        let path = self.root.join(resource);
        fs::read_to_string(&path).map_err(|source| DigestError::Fetch {
            resource: path,
            source,
        })
    }
}

/// Trait for loaders that turn one export into records.
pub trait SourceLoader {
    type Item;

    /// Parse the full text of the export.
    ///
    /// # Errors
    ///
    /// Returns `DigestError` if the export has no header row or is not valid JSON.
    /// Malformed CSV rows are repaired, never rejected.
    fn parse(&self, input: &str) -> Result<Vec<Self::Item>>;

    /// Fetch `resource` and parse it.
    fn load<F: Fetcher + ?Sized>(&self, fetcher: &F, resource: &str) -> Result<Vec<Self::Item>> {
        let text = fetcher.fetch(resource)?;
        debug!(resource, bytes = text.len(), "fetched source");
        self.parse(&text)
    }
}

/// Tokenizes `input` and maps every data row onto the header row.
fn map_csv(tokenizer: CsvTokenizer, header_map: &HeaderMap, input: &str) -> Result<Vec<Record>> {
    let mut rows = tokenizer.tokenize(input).into_iter();
    let headers = rows
        .next()
        .ok_or_else(|| DigestError::InvalidFormat("CSV file is empty or invalid".into()))?;
    debug!(?headers, "parsed CSV headers");

    let mapper = RecordMapper::new(&headers, header_map);
    let records: Vec<Record> = rows
        .enumerate()
        .map(|(i, values)| mapper.map(values, i + 2).record)
        .collect();
    debug!(rows = records.len(), "mapped CSV rows");
    Ok(records)
}

/// Loader for the WeChat article export.
///
/// Rows are split on newlines before tokenizing, so a field containing a newline
/// shifts the rest of its record onto a new row.
#[derive(Debug, Clone)]
pub struct WechatLoader {
    header_map: HeaderMap,
}

impl Default for WechatLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl WechatLoader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            header_map: HeaderMap::from_table(WECHAT_HEADERS),
        }
    }

    /// Replaces the header dictionary
    #[must_use]
    pub fn with_header_map(mut self, header_map: HeaderMap) -> Self {
        self.header_map = header_map;
        self
    }
}

impl SourceLoader for WechatLoader {
    type Item = WechatArticle;

    fn parse(&self, input: &str) -> Result<Vec<WechatArticle>> {
        let tokenizer = CsvTokenizer::new(TokenizeMode::Lines);
        let articles: Vec<WechatArticle> = map_csv(tokenizer, &self.header_map, input)?
            .iter()
            .map(WechatArticle::from_record)
            .collect();
        debug!(articles = articles.len(), "processed WeChat articles");
        Ok(articles)
    }
}

/// Loader for the HuggingFace trending papers export.
///
/// Records keep the export's literal headers as keys.
#[derive(Debug, Clone, Default)]
pub struct HuggingFaceLoader {
    header_map: HeaderMap,
}

impl HuggingFaceLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceLoader for HuggingFaceLoader {
    type Item = HuggingFacePaper;

    fn parse(&self, input: &str) -> Result<Vec<HuggingFacePaper>> {
        let tokenizer = CsvTokenizer::new(TokenizeMode::Streaming);
        let papers: Vec<HuggingFacePaper> = map_csv(tokenizer, &self.header_map, input)?
            .into_iter()
            .map(HuggingFacePaper::from_record)
            .collect();
        debug!(papers = papers.len(), "parsed HuggingFace papers");
        Ok(papers)
    }
}

/// Orders papers by upvote count, highest first; ties keep file order.
pub fn rank_by_upvotes(papers: &mut [HuggingFacePaper]) {
    papers.sort_by_key(|paper| std::cmp::Reverse(paper.upvotes()));
}

/// Loader for the processed papers JSON export.
///
/// Papers without an `id` are given a generated one.
#[derive(Debug, Clone, Default)]
pub struct PaperLoader {}

impl PaperLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceLoader for PaperLoader {
    type Item = Paper;

    fn parse(&self, input: &str) -> Result<Vec<Paper>> {
        let mut papers: Vec<Paper> = serde_json::from_str(input)?;
        for paper in papers.iter_mut().filter(|p| p.id.is_empty()) {
            paper.id = nanoid!();
        }
        debug!(papers = papers.len(), "parsed processed papers");
        Ok(papers)
    }
}
