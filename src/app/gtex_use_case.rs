use crate::app::ports::RemoteQueryService;
use crate::app::{bounded, Screened};
use crate::constants::GTEX_PIPELINE;
use crate::pipeline::filter::{best_per_rsid, significant_hits};
use crate::types::{BrainTissue, GtexRecord, Rsid};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Finds SNPs with a significant brain eQTL for the target gene.
pub struct GtexUseCase {
    service: Arc<dyn RemoteQueryService>,
    tissues: Vec<BrainTissue>,
    threshold: f64,
    wait: Duration,
}

impl GtexUseCase {
    pub fn new(
        service: Arc<dyn RemoteQueryService>,
        tissues: Vec<BrainTissue>,
        threshold: f64,
        wait: Duration,
    ) -> Self {
        Self {
            service,
            tissues,
            threshold,
            wait,
        }
    }

    /// Collects hits below the threshold across all tissues, then keeps the
    /// best p-value per RSID.
    #[instrument(skip(self, rsids), fields(total = rsids.len()))]
    pub async fn screen(&self, rsids: &[Rsid], gene: &str) -> Screened<GtexRecord> {
        let mut out = Screened::default();
        let mut significant = Vec::new();

        for rsid in rsids {
            out.queried += 1;
            counter!("snp_queries_total", "pipeline" => GTEX_PIPELINE).increment(1);

            let call = self.service.query_expression_pvalues(rsid, gene, &self.tissues);
            match bounded(self.wait, call).await {
                Ok(hits) => {
                    let total = hits.len();
                    let kept = significant_hits(hits, self.threshold);
                    debug!("{}: {} of {} associations below {}", rsid, kept.len(), total, self.threshold);
                    significant.extend(kept);
                }
                Err(e) => {
                    out.failed += 1;
                    counter!("snp_query_failures_total", "pipeline" => GTEX_PIPELINE, "kind" => e.kind())
                        .increment(1);
                    warn!("Skipping {}: {}", rsid, e);
                }
            }
        }

        out.retained = best_per_rsid(significant)
            .iter()
            .map(|hit| GtexRecord::from_hit(hit, gene))
            .collect();
        info!("{} SNPs significant for {}", out.retained.len(), gene);
        counter!("snp_retained_total", "pipeline" => GTEX_PIPELINE).increment(out.retained.len() as u64);
        out
    }
}
