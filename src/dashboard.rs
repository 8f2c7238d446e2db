//! Ties loaders, cache, filter, and catalog together for a presentation layer.
//!
//! The [`Dashboard`] owns all state; rendering is delegated to a [`Presenter`]. Each
//! source loads independently: a failing source shows an error in its own section and
//! never stops the others.

use crate::cache::{CacheStore, Clock, Storage, SystemClock};
use crate::catalog::Catalog;
use crate::filter::{FilterEngine, Selection};
use crate::model::{HuggingFacePaper, Paper, WechatArticle};
use crate::preview::{NARROW_VIEWPORT_WIDTH, preview};
use crate::source::{
    Fetcher, HuggingFaceLoader, PaperLoader, SourceLoader, WechatLoader, rank_by_upvotes,
};
use chrono::Duration;
use tracing::{error, info};

/// Shown when notes are requested for an unknown paper
pub const NOTES_UNAVAILABLE: &str = "无法加载笔记内容";

/// Default resource names
pub const WECHAT_RESOURCE: &str = "wechat_articles.csv";
pub const PAPERS_RESOURCE: &str = "processed_papers.json";
pub const HUGGINGFACE_RESOURCE: &str = "huggingface_papers.csv";

/// Display regions, one per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Wechat,
    Papers,
    HuggingFace,
}

/// Rendering side of the dashboard.
///
/// Implementations draw whatever they are given; they call back into [`Dashboard`]
/// for filter changes.
pub trait Presenter {
    fn show_filter_options(&mut self, catalog: &Catalog);

    /// Show the filtered WeChat articles with the filter status line
    fn show_wechat_articles(&mut self, articles: &[&WechatArticle], status: &str);

    fn show_papers(&mut self, papers: &[Paper]);

    /// Show HuggingFace papers, already ranked by upvotes
    fn show_huggingface_papers(&mut self, papers: &[HuggingFacePaper]);

    /// Show a load error in one section only
    fn show_error(&mut self, section: Section, message: &str);
}

/// Configuration for a [`Dashboard`].
///
/// # Examples
///
/// ```
/// use digestboard::DashboardConfig;
/// use chrono::Duration;
///
/// let mut config = DashboardConfig::new();
/// config
///     .set_wechat_resource("data/wechat.csv")
///     .set_cache_ttl(Duration::minutes(10));
/// ```
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    wechat_resource: String,
    papers_resource: String,
    huggingface_resource: String,
    cache_ttl: Duration,
    narrow_width: u32,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            wechat_resource: WECHAT_RESOURCE.to_string(),
            papers_resource: PAPERS_RESOURCE.to_string(),
            huggingface_resource: HUGGINGFACE_RESOURCE.to_string(),
            cache_ttl: Duration::minutes(crate::cache::CACHE_EXPIRATION_MINUTES),
            narrow_width: NARROW_VIEWPORT_WIDTH,
        }
    }

    pub fn set_wechat_resource(&mut self, resource: &str) -> &mut Self {
        self.wechat_resource = resource.to_string();
        self
    }

    pub fn set_papers_resource(&mut self, resource: &str) -> &mut Self {
        self.papers_resource = resource.to_string();
        self
    }

    pub fn set_huggingface_resource(&mut self, resource: &str) -> &mut Self {
        self.huggingface_resource = resource.to_string();
        self
    }

    /// Sets how long a cached snapshot stays fresh
    pub fn set_cache_ttl(&mut self, ttl: Duration) -> &mut Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the viewport width below which previews are shortened
    pub fn set_narrow_width(&mut self, width: u32) -> &mut Self {
        self.narrow_width = width;
        self
    }
}

/// Dashboard state: loaded collections, cache, filter, and category catalog.
pub struct Dashboard<F, S, C = SystemClock> {
    config: DashboardConfig,
    fetcher: F,
    cache: CacheStore<S, C>,
    filter: FilterEngine,
    catalog: Catalog,
    wechat_articles: Option<Vec<WechatArticle>>,
    papers: Option<Vec<Paper>>,
    huggingface_papers: Option<Vec<HuggingFacePaper>>,
}

impl<F: Fetcher, S: Storage> Dashboard<F, S> {
    pub fn new(config: DashboardConfig, fetcher: F, storage: S) -> Self {
        Self::with_clock(config, fetcher, storage, SystemClock)
    }
}

impl<F: Fetcher, S: Storage, C: Clock> Dashboard<F, S, C> {
    pub fn with_clock(config: DashboardConfig, fetcher: F, storage: S, clock: C) -> Self {
        let cache = CacheStore::with_clock(storage, clock).with_ttl(config.cache_ttl);
        Self {
            config,
            fetcher,
            cache,
            filter: FilterEngine::new(),
            catalog: Catalog::new(),
            wechat_articles: None,
            papers: None,
            huggingface_papers: None,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore<S, C> {
        &self.cache
    }

    pub fn filter(&self) -> &FilterEngine {
        &self.filter
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn wechat_articles(&self) -> Option<&[WechatArticle]> {
        self.wechat_articles.as_deref()
    }

    pub fn papers(&self) -> Option<&[Paper]> {
        self.papers.as_deref()
    }

    pub fn huggingface_papers(&self) -> Option<&[HuggingFacePaper]> {
        self.huggingface_papers.as_deref()
    }

    /// Runs the page-load sequence.
    ///
    /// Sweeps the cache, shows the filter options, shows a fresh cached snapshot if
    /// there is one, then reloads every source regardless.
    pub fn start(&mut self, presenter: &mut dyn Presenter) {
        self.cache.clear_if_expired();
        self.show_catalog(presenter);

        if let Some(snapshot) = self.cache.get() {
            info!(stored_at = %snapshot.timestamp, "showing cached snapshot");
            self.wechat_articles = snapshot.wechat_articles;
            self.papers = snapshot.papers;
            self.render_wechat(presenter);
            if let Some(papers) = &self.papers {
                presenter.show_papers(papers);
            }
        }

        self.refresh_wechat(presenter);
        self.refresh_papers(presenter);
        self.refresh_huggingface(presenter);
    }

    /// Reloads the WeChat export and replaces the article collection.
    pub fn refresh_wechat(&mut self, presenter: &mut dyn Presenter) {
        match WechatLoader::new().load(&self.fetcher, &self.config.wechat_resource) {
            Ok(articles) => {
                self.wechat_articles = Some(articles);
                self.show_catalog(presenter);
                self.persist();
                self.render_wechat(presenter);
            }
            Err(e) => {
                error!("error fetching WeChat articles: {e}");
                presenter.show_error(Section::Wechat, &format!("加载微信文章失败: {e}"));
                self.show_catalog(presenter);
            }
        }
    }

    /// Reloads the processed papers and replaces the paper collection.
    pub fn refresh_papers(&mut self, presenter: &mut dyn Presenter) {
        match PaperLoader::new().load(&self.fetcher, &self.config.papers_resource) {
            Ok(papers) => {
                presenter.show_papers(&papers);
                self.papers = Some(papers);
                self.persist();
            }
            Err(e) => {
                error!("error fetching papers: {e}");
                presenter.show_error(Section::Papers, "加载论文失败");
            }
        }
    }

    /// Reloads the HuggingFace export, ranked by upvotes. This source is not cached.
    pub fn refresh_huggingface(&mut self, presenter: &mut dyn Presenter) {
        let loaded = HuggingFaceLoader::new().load(&self.fetcher, &self.config.huggingface_resource);
        match loaded {
            Ok(mut papers) => {
                rank_by_upvotes(&mut papers);
                presenter.show_huggingface_papers(&papers);
                self.huggingface_papers = Some(papers);
            }
            Err(e) => {
                error!("error loading HuggingFace papers: {e}");
                presenter.show_error(
                    Section::HuggingFace,
                    &format!("加载HuggingFace论文失败: {e}"),
                );
            }
        }
    }

    /// Selects a field (`"all"` for every field) and re-renders the articles.
    pub fn select_field(&mut self, field: &str, presenter: &mut dyn Presenter) {
        self.filter.select_field(Selection::from(field));
        self.render_wechat(presenter);
    }

    /// Selects an institution (`"all"` for every institution) and re-renders.
    pub fn select_institution(&mut self, institution: &str, presenter: &mut dyn Presenter) {
        self.filter.select_institution(Selection::from(institution));
        self.render_wechat(presenter);
    }

    /// Clears both filters and re-renders.
    pub fn reset_filters(&mut self, presenter: &mut dyn Presenter) {
        self.filter.reset();
        self.render_wechat(presenter);
    }

    /// Cleaned reading notes for the paper with `id`.
    pub fn paper_notes(&self, id: &str) -> String {
        self.papers
            .iter()
            .flatten()
            .find(|paper| paper.id == id)
            .map_or_else(|| NOTES_UNAVAILABLE.to_string(), Paper::display_notes)
    }

    /// Preview of `text` for a viewport `width` pixels wide.
    pub fn preview_for_width(&self, text: &str, width: u32) -> String {
        preview(text, width < self.config.narrow_width)
    }

    fn show_catalog(&mut self, presenter: &mut dyn Presenter) {
        self.catalog.reinitialize();
        presenter.show_filter_options(&self.catalog);
    }

    fn render_wechat(&self, presenter: &mut dyn Presenter) {
        let Some(articles) = &self.wechat_articles else {
            return;
        };
        let filtered = self.filter.apply(articles);
        let status = self.filter.describe(filtered.len(), articles.len());
        presenter.show_wechat_articles(&filtered, &status);
    }

    fn persist(&mut self) {
        self.cache
            .put(self.wechat_articles.as_deref(), self.papers.as_deref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, MemoryStorage, keys};
    use crate::{DigestError, Result};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    const WECHAT_CSV: &str = "公众号,发布时间,原标题,科技报告标题,一句话总结,摘要,URL,领域分类,研究机构\n\
        机器之心,2024-05-01,t1,Report One,b1,s1,https://1.example,LLM,DeepMind\n\
        量子位,2024-05-02,t2,Report Two,b2,s2,https://2.example,Agent,\"DeepMind, Meta\"\n\
        新智元,2024-05-03,t3,Report Three,b3,s3,https://3.example,LLM,OpenAI\n";

    const PAPERS_JSON: &str = r#####"[
        {"id": "p1", "title": "Paper One", "notes": "#### Key idea\n* [link](https://x.example)"},
        {"id": "p2", "title": "Paper Two"}
    ]"#####;

    const HUGGINGFACE_CSV: &str = "标题,中文标题,Upvote数\n\
        Low,低,3\n\
        High,高,\"120\"\n";

    #[derive(Default, Clone)]
    struct MapFetcher {
        resources: HashMap<String, String>,
    }

    impl MapFetcher {
        fn full() -> Self {
            Self::default()
                .with(WECHAT_RESOURCE, WECHAT_CSV)
                .with(PAPERS_RESOURCE, PAPERS_JSON)
                .with(HUGGINGFACE_RESOURCE, HUGGINGFACE_CSV)
        }

        fn with(mut self, resource: &str, text: &str) -> Self {
            self.resources.insert(resource.to_string(), text.to_string());
            self
        }

        fn without(mut self, resource: &str) -> Self {
            self.resources.remove(resource);
            self
        }
    }

    impl Fetcher for MapFetcher {
        fn fetch(&self, resource: &str) -> Result<String> {
            self.resources
                .get(resource)
                .cloned()
                .ok_or_else(|| DigestError::Fetch {
                    resource: PathBuf::from(resource),
                    source: io::Error::new(io::ErrorKind::NotFound, "404"),
                })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        FilterOptions(usize, usize),
        Articles(Vec<String>, String),
        Papers(Vec<String>),
        HuggingFace(Vec<String>),
        Error(Section, String),
    }

    #[derive(Default)]
    struct RecordingPresenter {
        events: Vec<Event>,
    }

    impl RecordingPresenter {
        fn last_articles(&self) -> Option<&Event> {
            self.events
                .iter()
                .rev()
                .find(|e| matches!(e, Event::Articles(..)))
        }

        fn errors(&self) -> Vec<&Event> {
            self.events
                .iter()
                .filter(|e| matches!(e, Event::Error(..)))
                .collect()
        }
    }

    impl Presenter for RecordingPresenter {
        fn show_filter_options(&mut self, catalog: &Catalog) {
            self.events.push(Event::FilterOptions(
                catalog.fields().len(),
                catalog.institutions().len(),
            ));
        }

        fn show_wechat_articles(&mut self, articles: &[&WechatArticle], status: &str) {
            let titles = articles.iter().map(|a| a.display_title().to_string()).collect();
            self.events.push(Event::Articles(titles, status.to_string()));
        }

        fn show_papers(&mut self, papers: &[Paper]) {
            self.events
                .push(Event::Papers(papers.iter().map(|p| p.id.clone()).collect()));
        }

        fn show_huggingface_papers(&mut self, papers: &[HuggingFacePaper]) {
            let titles = papers.iter().map(|p| p.title().to_string()).collect();
            self.events.push(Event::HuggingFace(titles));
        }

        fn show_error(&mut self, section: Section, message: &str) {
            self.events.push(Event::Error(section, message.to_string()));
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
    }

    fn dashboard(
        fetcher: MapFetcher,
        storage: MemoryStorage,
    ) -> Dashboard<MapFetcher, MemoryStorage, ManualClock> {
        Dashboard::with_clock(DashboardConfig::new(), fetcher, storage, ManualClock::new(t0()))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_start_loads_every_source() {
        let mut board = dashboard(MapFetcher::full(), MemoryStorage::new());
        let mut presenter = RecordingPresenter::default();

        board.start(&mut presenter);

        assert!(presenter.errors().is_empty());
        assert_eq!(presenter.events[0], Event::FilterOptions(7, 13));
        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One", "Report Two", "Report Three"]),
                "显示全部 3 篇文章".to_string()
            ))
        );
        assert!(presenter.events.contains(&Event::Papers(strings(&["p1", "p2"]))));
        assert!(presenter.events.contains(&Event::HuggingFace(strings(&["High", "Low"]))));

        let storage = board.cache().storage();
        assert!(storage.contains_key(keys::WECHAT_ARTICLES));
        assert!(storage.contains_key(keys::PAPERS));
        assert!(storage.contains_key(keys::LAST_UPDATED));
    }

    #[test]
    fn test_failing_source_only_affects_its_section() {
        let fetcher = MapFetcher::full().without(WECHAT_RESOURCE);
        let mut board = dashboard(fetcher, MemoryStorage::new());
        let mut presenter = RecordingPresenter::default();

        board.start(&mut presenter);

        let errors = presenter.errors();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            Event::Error(Section::Wechat, message) if message.starts_with("加载微信文章失败: ")
        ));
        assert!(presenter.last_articles().is_none());
        assert_eq!(board.papers().map(<[Paper]>::len), Some(2));
        assert_eq!(board.huggingface_papers().map(<[HuggingFacePaper]>::len), Some(2));
    }

    #[test]
    fn test_paper_and_huggingface_errors() {
        let fetcher = MapFetcher::full()
            .with(PAPERS_RESOURCE, "not json")
            .without(HUGGINGFACE_RESOURCE);
        let mut board = dashboard(fetcher, MemoryStorage::new());
        let mut presenter = RecordingPresenter::default();

        board.start(&mut presenter);

        assert!(presenter
            .events
            .contains(&Event::Error(Section::Papers, "加载论文失败".to_string())));
        assert!(presenter.events.iter().any(|e| matches!(
            e,
            Event::Error(Section::HuggingFace, message) if message.starts_with("加载HuggingFace论文失败: ")
        )));
        assert_eq!(board.wechat_articles().map(<[WechatArticle]>::len), Some(3));
    }

    #[test]
    fn test_cached_snapshot_is_shown_before_refresh() {
        let mut first = dashboard(MapFetcher::full(), MemoryStorage::new());
        first.start(&mut RecordingPresenter::default());
        let storage = first.cache().storage().clone();

        let offline = MapFetcher::default();
        let mut second = dashboard(offline, storage);
        second.cache().clock().advance(Duration::minutes(10));
        let mut presenter = RecordingPresenter::default();

        second.start(&mut presenter);

        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One", "Report Two", "Report Three"]),
                "显示全部 3 篇文章".to_string()
            ))
        );
        assert!(presenter.events.contains(&Event::Papers(strings(&["p1", "p2"]))));
        assert_eq!(presenter.errors().len(), 3);
    }

    #[test]
    fn test_expired_snapshot_is_not_shown() {
        let mut first = dashboard(MapFetcher::full(), MemoryStorage::new());
        first.start(&mut RecordingPresenter::default());
        let storage = first.cache().storage().clone();

        let mut second = dashboard(MapFetcher::default(), storage);
        second.cache().clock().advance(Duration::minutes(31));
        let mut presenter = RecordingPresenter::default();

        second.start(&mut presenter);

        assert!(presenter.last_articles().is_none());
        assert!(second.cache().storage().is_empty());
    }

    #[test]
    fn test_filter_changes_rerender() {
        let mut board = dashboard(MapFetcher::full(), MemoryStorage::new());
        let mut presenter = RecordingPresenter::default();
        board.start(&mut presenter);

        board.select_field("LLM", &mut presenter);
        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One", "Report Three"]),
                "筛选条件: 领域: LLM (2/3)".to_string()
            ))
        );

        board.select_institution("DeepMind", &mut presenter);
        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One"]),
                "筛选条件: 领域: LLM, 机构: DeepMind (1/3)".to_string()
            ))
        );

        board.select_field("all", &mut presenter);
        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One", "Report Two"]),
                "筛选条件: 机构: DeepMind (2/3)".to_string()
            ))
        );

        board.reset_filters(&mut presenter);
        assert!(board.filter().selection().is_unfiltered());
        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report One", "Report Two", "Report Three"]),
                "显示全部 3 篇文章".to_string()
            ))
        );
    }

    #[test]
    fn test_refresh_keeps_current_filter() {
        let mut board = dashboard(MapFetcher::full(), MemoryStorage::new());
        let mut presenter = RecordingPresenter::default();
        board.start(&mut presenter);
        board.select_field("Agent", &mut presenter);

        board.refresh_wechat(&mut presenter);

        assert_eq!(
            presenter.last_articles(),
            Some(&Event::Articles(
                strings(&["Report Two"]),
                "筛选条件: 领域: Agent (1/3)".to_string()
            ))
        );
    }

    #[test]
    fn test_paper_notes() {
        let mut board = dashboard(MapFetcher::full(), MemoryStorage::new());
        board.start(&mut RecordingPresenter::default());

        assert_eq!(board.paper_notes("p1"), "Key idea\n* link");
        assert_eq!(board.paper_notes("p2"), crate::model::NO_NOTES);
        assert_eq!(board.paper_notes("missing"), NOTES_UNAVAILABLE);
    }

    #[test]
    fn test_preview_for_width() {
        let board = dashboard(MapFetcher::default(), MemoryStorage::new());
        let text = "x".repeat(50);
        assert_eq!(board.preview_for_width(&text, 375).chars().count(), 43);
        assert_eq!(board.preview_for_width(&text, 1280), text);
    }
}
