//! Crawler coordinator - main harvest orchestration logic
//!
//! This module contains the main loop that coordinates one run:
//! - Resolving pagination from each target's seed page
//! - Walking listing pages and extracting document links
//! - Fetching, extracting and persisting each document exactly once
//! - Counting outcomes and reporting them on every exit path
//!
//! Per-item failures (a page that will not load, a document without
//! content, a write that fails) are logged and counted; only unexpected
//! errors end the run.

use crate::config::{Config, CrawlTarget};
use crate::crawler::{HttpFetcher, PageSource, RenderedSource};
use crate::extract::{
    find_attachments, find_embedded, resolve_pagination, ContentExtractor, EmbeddedDocument,
    ExtractedDocument, LinkCandidate, LinkExtraction, LinkExtractor,
};
use crate::output::{
    attachment_filename, document_stem, render_text, sanitize_filename, ArtifactKind,
    DocumentMeta, PersistOutcome, PersistedArtifact, Persister, RunStats,
};
use crate::state::{CrawlPhase, Deduplicator, PhaseTracker};
use crate::{ConfigError, HarvestError};
use scraper::Html;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Main coordinator structure, generic over how pages are retrieved
pub struct Coordinator<S: PageSource> {
    config: Arc<Config>,
    source: S,
    persister: Persister,
    dedup: Deduplicator,
    content: ContentExtractor,
    stats: RunStats,
}

/// What a listing page offers
enum Listing {
    /// Articles carried inline; nothing more to fetch
    Embedded(Vec<EmbeddedDocument>),
    Links(LinkExtraction),
}

/// Outcome of a run; stats are kept even when the run ended early
#[derive(Debug)]
pub struct RunReport {
    pub stats: RunStats,
    pub result: crate::Result<()>,
}

impl<S: PageSource> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated harvest configuration
    /// * `source` - Where pages come from (plain HTTP or a browser)
    pub fn new(config: Config, source: S) -> Self {
        let persister = Persister::new(&config.output.root);
        let content = ContentExtractor::from_config(&config.extraction);

        Self {
            config: Arc::new(config),
            source,
            persister,
            dedup: Deduplicator::new(),
            content,
            stats: RunStats::new(),
        }
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Splits the coordinator into its page source and final stats
    pub fn into_parts(self) -> (S, RunStats) {
        (self.source, self.stats)
    }

    /// Runs every target in configuration order
    ///
    /// The summary is logged whether the run completes or stops on an
    /// unexpected error.
    pub async fn run(&mut self) -> crate::Result<()> {
        tracing::info!(
            "Starting harvest of {} target(s) via {} source into {}",
            self.config.targets.len(),
            self.source.name(),
            self.persister.root().display()
        );

        let result = self.run_targets().await;
        if let Err(e) = &result {
            tracing::error!("Harvest stopped: {}", e);
        }
        self.stats.log_summary();
        result
    }

    async fn run_targets(&mut self) -> crate::Result<()> {
        let config = Arc::clone(&self.config);

        for target in &config.targets {
            self.run_target(target).await?;
            self.stats.record_target_completed();
        }

        Ok(())
    }

    /// Walks one target: seed page, remaining listing pages, their documents
    async fn run_target(&mut self, target: &CrawlTarget) -> crate::Result<()> {
        let mut phase = PhaseTracker::new(target.group.as_str());
        let links = LinkExtractor::for_target(&self.config.extraction, target);
        let seed = Url::parse(&target.seed)?;

        tracing::info!("[{}] Resolving pagination from {}", target.group, seed);
        phase.advance(CrawlPhase::ResolvingPagination)?;

        let seed_html = match self.source.fetch_text(&seed, None).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("[{}] Seed page unavailable: {}", target.group, e);
                self.stats.record_page_failure();
                phase.advance(CrawlPhase::Done)?;
                return Ok(());
            }
        };
        self.stats.record_page_fetched();
        self.save_snapshot(&target.group, 1, &seed_html);

        let (pages, first_page) = {
            let document = Html::parse_document(&seed_html);
            let summary = resolve_pagination(&document, &seed, target.default_total_pages);
            tracing::info!(
                "[{}] {} page(s) (text signal {}, url signal {}{}{})",
                target.group,
                summary.total_pages,
                summary.text_signal,
                summary.url_signal,
                if summary.used_default { ", configured default" } else { "" },
                if summary.capped { ", capped" } else { "" }
            );

            phase.advance(CrawlPhase::ExtractingLinks)?;
            (summary.pages, self.read_listing(&links, &document, &seed, 1))
        };

        let total_pages = pages.len() + 1;
        self.handle_listing(target, &mut phase, 1, total_pages, first_page)
            .await?;

        for page in pages {
            phase.advance(CrawlPhase::FetchingPage)?;

            let html = match self.source.fetch_text(&page.url, None).await {
                Ok(html) => html,
                Err(e) => {
                    tracing::error!("[{}] Page {} failed: {}", target.group, page.sequence_number, e);
                    self.stats.record_page_failure();
                    continue;
                }
            };
            self.stats.record_page_fetched();
            self.save_snapshot(&target.group, page.sequence_number, &html);

            phase.advance(CrawlPhase::ExtractingLinks)?;
            let listing = {
                let document = Html::parse_document(&html);
                self.read_listing(&links, &document, &page.url, page.sequence_number)
            };

            self.handle_listing(target, &mut phase, page.sequence_number, total_pages, listing)
                .await?;
        }

        phase.advance(CrawlPhase::Done)?;
        tracing::info!(
            "[{}] Done: {} succeeded, {} failed, {} skipped so far",
            target.group,
            self.stats.succeeded,
            self.stats.failed,
            self.stats.skipped
        );
        Ok(())
    }

    /// Embedded articles win over links: their pill navigation only
    /// points back at the same page
    fn read_listing(
        &self,
        links: &LinkExtractor,
        document: &Html,
        page_url: &Url,
        sequence: u32,
    ) -> Listing {
        let embedded = find_embedded(document, page_url, &self.content);
        if embedded.is_empty() {
            Listing::Links(links.extract(document, page_url, sequence))
        } else {
            Listing::Embedded(embedded)
        }
    }

    async fn handle_listing(
        &mut self,
        target: &CrawlTarget,
        phase: &mut PhaseTracker,
        page: u32,
        total_pages: usize,
        listing: Listing,
    ) -> crate::Result<()> {
        match listing {
            Listing::Embedded(documents) => {
                tracing::info!(
                    "[{}] Page {}/{}: {} embedded article(s)",
                    target.group,
                    page,
                    total_pages,
                    documents.len()
                );
                self.process_embedded(target, phase, page, documents)
            }
            Listing::Links(extraction) => {
                self.log_links(
                    target,
                    page,
                    total_pages,
                    &extraction.candidates,
                    extraction.strategy,
                );
                self.process_links(target, phase, page, &extraction.candidates)
                    .await
            }
        }
    }

    fn log_links(
        &self,
        target: &CrawlTarget,
        page: u32,
        total_pages: usize,
        candidates: &[LinkCandidate],
        strategy: Option<&'static str>,
    ) {
        match strategy {
            Some(strategy) => tracing::info!(
                "[{}] Page {}/{}: {} link(s) via {}",
                target.group,
                page,
                total_pages,
                candidates.len(),
                strategy
            ),
            None => tracing::warn!(
                "[{}] Page {}/{}: no document links found",
                target.group,
                page,
                total_pages
            ),
        }
    }

    async fn process_links(
        &mut self,
        target: &CrawlTarget,
        phase: &mut PhaseTracker,
        page: u32,
        candidates: &[LinkCandidate],
    ) -> crate::Result<()> {
        for (i, candidate) in candidates.iter().enumerate() {
            if !self.dedup.first_visit(&candidate.url) {
                tracing::debug!("Duplicate link skipped: {}", candidate.url);
                self.stats.record_duplicate();
                continue;
            }

            phase.advance(CrawlPhase::FetchingDocument)?;
            self.process_document(target, phase, page, i + 1, candidate)
                .await?;
        }
        Ok(())
    }

    /// Fetches, extracts and persists one document
    ///
    /// Returns an error only for broken phase transitions; everything else
    /// is counted and logged.
    async fn process_document(
        &mut self,
        target: &CrawlTarget,
        phase: &mut PhaseTracker,
        page: u32,
        index: usize,
        candidate: &LinkCandidate,
    ) -> crate::Result<()> {
        let slug = sanitize_filename(
            &candidate.url,
            Some(&candidate.title),
            self.config.output.max_filename_length,
            "",
        );
        let stem = document_stem(page, index, &slug);
        let (kinds, paths) = self.artifact_paths(&target.group, &stem);

        if Deduplicator::all_exist(&paths) {
            tracing::debug!("Already saved, not fetching: {} ({})", stem, candidate.url);
            self.stats.record_skip();
            return Ok(());
        }

        let html = match self.source.fetch_text(&candidate.url, None).await {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Document fetch failed: {}", e);
                self.stats.record_failure();
                return Ok(());
            }
        };

        phase.advance(CrawlPhase::ExtractingContent)?;
        let (extracted, attachments) = {
            let document = Html::parse_document(&html);
            let extracted = self
                .content
                .extract(&document, &candidate.url, Some(&candidate.title));
            let attachments = if self.config.output.download_attachments {
                find_attachments(&document, &candidate.url)
            } else {
                Vec::new()
            };
            (extracted, attachments)
        };

        let document = match extracted {
            Ok(document) => document,
            Err(miss) => {
                tracing::warn!("No content extracted from {}: {}", candidate.url, miss);
                self.stats.record_skip();
                return Ok(());
            }
        };

        phase.advance(CrawlPhase::Persisting)?;
        let meta = DocumentMeta {
            date: candidate.date.as_deref(),
            category: candidate.category.as_deref(),
        };

        let written = self.persist_document(&kinds, paths, &html, &document, meta);

        for attachment in &attachments {
            self.download_attachment(&target.group, &stem, attachment, &candidate.url)
                .await;
        }

        self.record_document(&stem, &document, written);
        Ok(())
    }

    /// Saves the articles of an embedded listing; nothing is fetched
    fn process_embedded(
        &mut self,
        target: &CrawlTarget,
        phase: &mut PhaseTracker,
        page: u32,
        documents: Vec<EmbeddedDocument>,
    ) -> crate::Result<()> {
        for embedded in documents {
            let document = &embedded.document;
            if !self.dedup.first_visit(&document.source_url) {
                tracing::debug!("Duplicate embedded article skipped: {}", document.source_url);
                self.stats.record_duplicate();
                continue;
            }

            let slug = sanitize_filename(
                &document.source_url,
                Some(&document.title),
                self.config.output.max_filename_length,
                "",
            );
            let stem = document_stem(page, embedded.index, &slug);
            let (kinds, paths) = self.artifact_paths(&target.group, &stem);

            if Deduplicator::all_exist(&paths) {
                tracing::debug!("Already saved: {} ({})", stem, document.source_url);
                self.stats.record_skip();
                continue;
            }

            phase.advance(CrawlPhase::ExtractingContent)?;
            phase.advance(CrawlPhase::Persisting)?;
            let written =
                self.persist_document(&kinds, paths, &embedded.html, document, DocumentMeta::default());
            self.record_document(&stem, document, written);
        }
        Ok(())
    }

    /// Enabled artifact kinds and their paths for one document stem
    fn artifact_paths(&self, group: &str, stem: &str) -> (Vec<ArtifactKind>, Vec<PathBuf>) {
        let output = &self.config.output;
        let kinds: Vec<ArtifactKind> = [
            (output.save_html, ArtifactKind::Html),
            (output.save_text, ArtifactKind::Text),
        ]
        .into_iter()
        .filter_map(|(enabled, kind)| enabled.then_some(kind))
        .collect();
        let paths = kinds
            .iter()
            .map(|kind| self.persister.document_path(group, stem, *kind))
            .collect();

        (kinds, paths)
    }

    /// Writes every enabled artifact; false if any write failed
    fn persist_document(
        &self,
        kinds: &[ArtifactKind],
        paths: Vec<PathBuf>,
        html: &str,
        document: &ExtractedDocument,
        meta: DocumentMeta<'_>,
    ) -> bool {
        let mut written = true;
        for (kind, path) in kinds.iter().zip(paths) {
            let bytes = match kind {
                ArtifactKind::Text => render_text(document, meta).into_bytes(),
                ArtifactKind::Html | ArtifactKind::Pdf => html.as_bytes().to_vec(),
            };

            if let Err(e) = self.persister.persist(&PersistedArtifact::new(path, bytes, *kind)) {
                tracing::error!("{}", e);
                written = false;
            }
        }
        written
    }

    fn record_document(&mut self, stem: &str, document: &ExtractedDocument, written: bool) {
        if written {
            tracing::info!(
                "Saved {} ({} blocks): {}",
                stem,
                document.blocks.len(),
                document.title
            );
            self.stats.record_success();
        } else {
            self.stats.record_failure();
        }
    }

    async fn download_attachment(&mut self, group: &str, stem: &str, url: &Url, owner: &Url) {
        let filename = attachment_filename(url, self.config.output.max_filename_length);
        let path = self.persister.attachment_path(group, stem, &filename);

        if path.exists() {
            tracing::debug!("Attachment already saved: {}", path.display());
            return;
        }

        let bytes = match self.source.fetch_bytes(url, Some(owner.as_str())).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Attachment download failed: {}", e);
                return;
            }
        };

        match self
            .persister
            .persist(&PersistedArtifact::new(path, bytes, ArtifactKind::Pdf))
        {
            Ok(PersistOutcome::Written) => {
                tracing::info!("Saved attachment {}", filename);
                self.stats.record_attachment();
            }
            Ok(PersistOutcome::AlreadyExists) => {}
            Err(e) => tracing::error!("{}", e),
        }
    }

    fn save_snapshot(&mut self, group: &str, sequence: u32, html: &str) {
        if !self.config.output.save_page_snapshots {
            return;
        }

        let path = self.persister.page_snapshot_path(group, sequence);
        let artifact = PersistedArtifact::new(path, html, ArtifactKind::Html);
        if let Err(e) = self.persister.persist(&artifact) {
            tracing::error!("Snapshot of page {} not saved: {}", sequence, e);
            self.stats.record_write_failure();
        }
    }
}

/// Runs a complete harvest with the configured page source
///
/// # Arguments
///
/// * `config` - The validated harvest configuration
/// * `rendered` - Load pages in headless Chrome instead of plain HTTP
pub async fn run_crawl(config: Config, rendered: bool) -> RunReport {
    if !rendered {
        let fetcher = match HttpFetcher::new(&config.fetcher) {
            Ok(fetcher) => fetcher,
            Err(e) => return setup_failure(e),
        };
        let mut coordinator = Coordinator::new(config, fetcher);
        let result = coordinator.run().await;
        let (_, stats) = coordinator.into_parts();
        return RunReport { stats, result };
    }

    let Some(browser) = config.browser.clone() else {
        return setup_failure(
            ConfigError::Validation("--rendered requires a [browser] section".to_string()).into(),
        );
    };

    let source = match RenderedSource::connect(&config.fetcher, &browser).await {
        Ok(source) => source,
        Err(e) => return setup_failure(e),
    };
    let mut coordinator = Coordinator::new(config, source);
    let result = coordinator.run().await;
    let (source, stats) = coordinator.into_parts();

    if let Err(e) = source.shutdown().await {
        tracing::warn!("Failed to close browser session: {}", e);
    }
    RunReport { stats, result }
}

fn setup_failure(error: HarvestError) -> RunReport {
    tracing::error!("Harvest could not start: {}", error);
    RunReport {
        stats: RunStats::new(),
        result: Err(error),
    }
}
