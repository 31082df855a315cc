use crate::app::ports::RemoteQueryService;
use crate::config::Config;
use crate::error::{QueryResult, Result};
use crate::infra::braineac::BraineacClient;
use crate::infra::gtex::GtexClient;
use crate::infra::http_client::build_client;
use crate::infra::ldlink::LdLinkClient;
use crate::types::{BrainTissue, ExpressionHit};
use async_trait::async_trait;

/// HTTP-backed [`RemoteQueryService`]: one adapter per portal sharing one
/// client.
pub struct PortalQueryService {
    braineac: BraineacClient,
    ldlink: LdLinkClient,
    gtex: GtexClient,
}

impl PortalQueryService {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = build_client(&config.http)?;
        Ok(Self {
            braineac: BraineacClient::new(http.clone(), config.braineac.clone(), &config.downloads),
            ldlink: LdLinkClient::new(http.clone(), config.ldlink.clone()),
            gtex: GtexClient::new(http, config.gtex.clone()),
        })
    }
}

#[async_trait]
impl RemoteQueryService for PortalQueryService {
    async fn query_gene_membership(&self, rsid: &str, gene: &str) -> QueryResult<bool> {
        self.braineac.gene_membership(rsid, gene).await
    }

    async fn query_expression_pvalues(
        &self,
        rsid: &str,
        gene: &str,
        tissues: &[BrainTissue],
    ) -> QueryResult<Vec<ExpressionHit>> {
        self.gtex.expression(rsid, gene, tissues).await
    }

    async fn query_ld_statistic(&self, first: &str, second: &str) -> QueryResult<f64> {
        self.ldlink.r2(first, second).await
    }
}
