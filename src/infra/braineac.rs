use crate::config::{BraineacConfig, DownloadConfig};
use crate::constants::{BRAINEAC_DOWNLOAD_LINK_ID, BRAINEAC_SNP_FIELD};
use crate::error::{QueryError, QueryResult};
use crate::infra::downloads::ArtifactWatcher;
use crate::infra::http_client::ensure_success;
use crate::pipeline::filter::contains_gene_token;
use once_cell::sync::Lazy;
use reqwest::Url;
use scraper::{Html, Selector};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument, warn};

static DOWNLOAD_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(&format!("#{BRAINEAC_DOWNLOAD_LINK_ID}")).expect("static selector")
});

/// Submits SNPs to Braineac and reads back the cis-eQTL table.
///
/// The table is saved into the download directory and handed off through
/// an [`ArtifactWatcher`]: wait for it, read it, retire it.
pub struct BraineacClient {
    http: reqwest::Client,
    config: BraineacConfig,
    watcher: ArtifactWatcher,
    artifact_wait: Duration,
}

impl BraineacClient {
    pub fn new(http: reqwest::Client, config: BraineacConfig, downloads: &DownloadConfig) -> Self {
        Self {
            http,
            config,
            watcher: ArtifactWatcher::from_config(downloads),
            artifact_wait: downloads.wait_timeout(),
        }
    }

    #[instrument(skip(self))]
    pub async fn gene_membership(&self, rsid: &str, gene: &str) -> QueryResult<bool> {
        let name = self.config.artifact_name.as_str();
        self.watcher.ensure_dir()?;
        self.watcher.clear_stale(name)?;

        let (page, page_url) = self.submit(rsid).await?;
        let link = find_download_link(&page, &page_url)?
            .ok_or_else(|| QueryError::NoResult(format!("{rsid} is not in the Braineac database")))?;
        self.download(&link, name).await?;

        let path = self
            .watcher
            .wait_for(name, self.artifact_wait)
            .await
            .ok_or_else(|| QueryError::NoResult(format!("no {name} for {rsid}")))?;

        let document = tokio::fs::read_to_string(&path).await;
        self.retire(&path, rsid);
        Ok(contains_gene_token(&document?, gene))
    }

    fn submit_url(&self) -> QueryResult<Url> {
        Url::parse(&self.config.base_url)
            .and_then(|base| base.join(&self.config.submit_path))
            .map_err(|e| QueryError::Response(format!("bad Braineac URL: {e}")))
    }

    /// Returns the result page with the URL it was finally served from,
    /// which differs from the submit URL when the portal redirects.
    async fn submit(&self, rsid: &str) -> QueryResult<(String, Url)> {
        let resp = self
            .http
            .post(self.submit_url()?)
            .form(&[(BRAINEAC_SNP_FIELD, rsid)])
            .send()
            .await?;
        let resp = ensure_success(resp)?;
        let page_url = resp.url().clone();
        Ok((resp.text().await?, page_url))
    }

    /// Streams the table to `<name>.part` and renames it, so the watcher
    /// never sees a half-written file.
    async fn download(&self, url: &Url, name: &str) -> QueryResult<()> {
        let resp = ensure_success(self.http.get(url.clone()).send().await?)?;
        let bytes = resp.bytes().await?;
        let partial = self.watcher.path_of(&format!("{name}.part"));
        tokio::fs::write(&partial, &bytes).await?;
        tokio::fs::rename(&partial, self.watcher.path_of(name)).await?;
        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(())
    }

    fn retire(&self, path: &Path, rsid: &str) {
        if let Err(e) = self.watcher.retire(path, rsid) {
            warn!("Could not retire {}: {}", path.display(), e);
        }
    }
}

/// Resolves the `#downloadEQTL` link of a Braineac result page against the
/// page URL. `None` means the page offered no table for the SNP.
pub fn find_download_link(page: &str, page_url: &Url) -> QueryResult<Option<Url>> {
    let document = Html::parse_document(page);
    let Some(element) = document.select(&DOWNLOAD_LINK).next() else {
        return Ok(None);
    };
    let href = element
        .value()
        .attr("href")
        .or_else(|| element.value().attr("data-href"))
        .filter(|h| !h.trim().is_empty() && !h.trim().starts_with('#'))
        .ok_or_else(|| QueryError::Response("download link has no target".into()))?;
    page_url
        .join(href.trim())
        .map(Some)
        .map_err(|e| QueryError::Response(format!("bad download link '{href}': {e}")))
}
