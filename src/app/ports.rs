use crate::error::QueryResult;
use crate::types::{BrainTissue, ExpressionHit};
use async_trait::async_trait;

/// Remote lookups the pipelines depend on. The HTTP-backed implementation
/// lives in `infra::portal_service`; tests script their own.
#[async_trait]
pub trait RemoteQueryService: Send + Sync {
    /// Braineac: does the cis-eQTL table for `rsid` mention `gene`?
    async fn query_gene_membership(&self, rsid: &str, gene: &str) -> QueryResult<bool>;

    /// GTEx: eQTL associations of `rsid` with `gene`, one query per tissue.
    async fn query_expression_pvalues(
        &self,
        rsid: &str,
        gene: &str,
        tissues: &[BrainTissue],
    ) -> QueryResult<Vec<ExpressionHit>>;

    /// LDLink: r² between two variants.
    async fn query_ld_statistic(&self, first: &str, second: &str) -> QueryResult<f64>;
}
