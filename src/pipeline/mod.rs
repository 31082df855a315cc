//! Load → Query → Filter → Write, once per pipeline.

pub mod filter;
pub mod input;
pub mod output;

use crate::app::braineac_use_case::BraineacUseCase;
use crate::app::gtex_use_case::GtexUseCase;
use crate::app::ld_pair_use_case::LdPairUseCase;
use crate::app::ports::RemoteQueryService;
use crate::app::Screened;
use crate::config::Config;
use crate::constants::{BRAINEAC_PIPELINE, GTEX_PIPELINE, LD_PAIR_PIPELINE};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Result of a complete pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub pipeline: &'static str,
    pub total_identifiers: usize,
    pub queries: usize,
    pub failed_queries: usize,
    pub retained: usize,
    pub output_file: String,
    pub finished_at: DateTime<Utc>,
}

pub struct Pipeline;

impl Pipeline {
    /// Keeps SNPs whose Braineac cis-eQTL table names `gene`.
    #[instrument(skip(service, config))]
    pub async fn braineac(
        service: Arc<dyn RemoteQueryService>,
        config: &Config,
        gene: &str,
        input: &Path,
        output: &Path,
    ) -> Result<PipelineResult> {
        let rsids = input::load_identifiers(input)?;
        let wait = Duration::from_secs(config.braineac.wait_timeout_secs + config.downloads.wait_timeout_secs);
        let screened = BraineacUseCase::new(service, wait).screen(&rsids, gene).await;
        Self::finish(BRAINEAC_PIPELINE, rsids.len(), screened, output)
    }

    /// Drops SNPs in linkage disequilibrium with an earlier SNP.
    #[instrument(skip(service, config))]
    pub async fn ld_pair(
        service: Arc<dyn RemoteQueryService>,
        config: &Config,
        input: &Path,
        output: &Path,
    ) -> Result<PipelineResult> {
        let rsids = input::load_identifiers(input)?;
        let use_case = LdPairUseCase::new(
            service,
            config.ldlink.r2_threshold,
            config.ldlink.pair_bounds,
            Duration::from_millis(config.ldlink.startup_pause_ms),
            Duration::from_secs(config.ldlink.wait_timeout_secs),
        );
        let screened = use_case.prune(&rsids).await;
        Self::finish(LD_PAIR_PIPELINE, rsids.len(), screened, output)
    }

    /// Keeps SNPs with a significant brain eQTL for `gene`, best p-value each.
    #[instrument(skip(service, config))]
    pub async fn gtex(
        service: Arc<dyn RemoteQueryService>,
        config: &Config,
        input: &Path,
        gene: &str,
        output: &Path,
    ) -> Result<PipelineResult> {
        let rsids = input::load_identifiers(input)?;
        let use_case = GtexUseCase::new(
            service,
            config.gtex.tissues.clone(),
            config.gtex.p_value_threshold,
            Duration::from_secs(config.gtex.wait_timeout_secs),
        );
        let screened = use_case.screen(&rsids, gene).await;
        Self::finish(GTEX_PIPELINE, rsids.len(), screened, output)
    }

    fn finish<T: Display>(
        pipeline: &'static str,
        total: usize,
        screened: Screened<T>,
        output: &Path,
    ) -> Result<PipelineResult> {
        let retained = output::write_output_file(output, &screened.retained)?;
        info!(
            "{} finished: {} of {} identifiers retained ({} queries, {} failed)",
            pipeline, retained, total, screened.queried, screened.failed
        );
        Ok(PipelineResult {
            pipeline,
            total_identifiers: total,
            queries: screened.queried,
            failed_queries: screened.failed,
            retained,
            output_file: output.display().to_string(),
            finished_at: Utc::now(),
        })
    }
}
