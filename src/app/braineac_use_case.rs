use crate::app::ports::RemoteQueryService;
use crate::app::{bounded, Screened};
use crate::constants::BRAINEAC_PIPELINE;
use crate::types::Rsid;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Keeps the SNPs whose Braineac cis-eQTL table mentions the target gene.
pub struct BraineacUseCase {
    service: Arc<dyn RemoteQueryService>,
    wait: Duration,
}

impl BraineacUseCase {
    pub fn new(service: Arc<dyn RemoteQueryService>, wait: Duration) -> Self {
        Self { service, wait }
    }

    #[instrument(skip(self, rsids), fields(total = rsids.len()))]
    pub async fn screen(&self, rsids: &[Rsid], gene: &str) -> Screened<Rsid> {
        let mut out = Screened::default();

        for (i, rsid) in rsids.iter().enumerate() {
            debug!("Querying {}/{}: {}", i + 1, rsids.len(), rsid);
            out.queried += 1;
            counter!("snp_queries_total", "pipeline" => BRAINEAC_PIPELINE).increment(1);

            match bounded(self.wait, self.service.query_gene_membership(rsid, gene)).await {
                Ok(true) => {
                    info!("{} affects {}", rsid, gene);
                    out.retained.push(rsid.clone());
                }
                Ok(false) => debug!("{} has no eQTL with {}", rsid, gene),
                Err(e) => {
                    out.failed += 1;
                    counter!("snp_query_failures_total", "pipeline" => BRAINEAC_PIPELINE, "kind" => e.kind())
                        .increment(1);
                    warn!("Skipping {}: {}", rsid, e);
                }
            }
        }

        counter!("snp_retained_total", "pipeline" => BRAINEAC_PIPELINE).increment(out.retained.len() as u64);
        out
    }
}
