use crate::app::ports::RemoteQueryService;
use crate::app::{bounded, Screened};
use crate::constants::LD_PAIR_PIPELINE;
use crate::pipeline::filter::in_linkage;
use crate::types::{PairBounds, Rsid};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Prunes a SNP list so that no two retained SNPs are in linkage
/// disequilibrium.
///
/// Pairs are visited in input order: the first SNP of a pair is kept and the
/// second is dropped when r² reaches the threshold or when the lookup fails
/// (variant missing from the reference panel, other chromosome, timeout).
/// Dropped SNPs take no further part in comparisons.
pub struct LdPairUseCase {
    service: Arc<dyn RemoteQueryService>,
    threshold: f64,
    bounds: PairBounds,
    startup_pause: Duration,
    wait: Duration,
}

impl LdPairUseCase {
    pub fn new(
        service: Arc<dyn RemoteQueryService>,
        threshold: f64,
        bounds: PairBounds,
        startup_pause: Duration,
        wait: Duration,
    ) -> Self {
        Self {
            service,
            threshold,
            bounds,
            startup_pause,
            wait,
        }
    }

    #[instrument(skip(self, rsids), fields(total = rsids.len(), bounds = ?self.bounds))]
    pub async fn prune(&self, rsids: &[Rsid]) -> Screened<Rsid> {
        let mut out = Screened::default();
        let mut dropped = vec![false; rsids.len()];

        if rsids.len() > 1 && !self.startup_pause.is_zero() {
            debug!("Pausing {:?} before the first comparison", self.startup_pause);
            tokio::time::sleep(self.startup_pause).await;
        }

        // Only the final identifier can be excluded, and it never gets dropped.
        let excluded = match self.bounds {
            PairBounds::All => None,
            PairBounds::ExcludeLast => rsids.len().checked_sub(1),
        };

        for i in 0..rsids.len() {
            if dropped[i] {
                continue;
            }
            for j in (i + 1)..rsids.len() {
                if dropped[j] || Some(j) == excluded {
                    continue;
                }
                out.queried += 1;
                counter!("snp_queries_total", "pipeline" => LD_PAIR_PIPELINE).increment(1);

                let call = self.service.query_ld_statistic(&rsids[i], &rsids[j]);
                match bounded(self.wait, call).await {
                    Ok(r2) if in_linkage(r2, self.threshold) => {
                        info!("Dropping {}: r2 {} with {}", rsids[j], r2, rsids[i]);
                        dropped[j] = true;
                    }
                    Ok(r2) => debug!("{} / {}: r2 {}", rsids[i], rsids[j], r2),
                    Err(e) => {
                        out.failed += 1;
                        counter!("snp_query_failures_total", "pipeline" => LD_PAIR_PIPELINE, "kind" => e.kind())
                            .increment(1);
                        warn!("Dropping {}: no LD result against {}: {}", rsids[j], rsids[i], e);
                        dropped[j] = true;
                    }
                }
            }
        }

        out.retained = rsids
            .iter()
            .zip(&dropped)
            .filter(|(_, gone)| !**gone)
            .map(|(rsid, _)| rsid.clone())
            .collect();
        counter!("snp_retained_total", "pipeline" => LD_PAIR_PIPELINE).increment(out.retained.len() as u64);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueryError, QueryResult};
    use crate::types::{BrainTissue, ExpressionHit};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// r² per unordered pair; unknown pairs are unlinked.
    struct PairTable {
        r2: HashMap<(String, String), f64>,
        missing: Vec<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl PairTable {
        fn new(pairs: &[(&str, &str, f64)]) -> Self {
            let mut r2 = HashMap::new();
            for (a, b, v) in pairs {
                r2.insert((a.to_string(), b.to_string()), *v);
                r2.insert((b.to_string(), a.to_string()), *v);
            }
            Self {
                r2,
                missing: Vec::new(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RemoteQueryService for PairTable {
        async fn query_gene_membership(&self, _: &str, _: &str) -> QueryResult<bool> {
            unreachable!()
        }

        async fn query_expression_pvalues(
            &self,
            _: &str,
            _: &str,
            _: &[BrainTissue],
        ) -> QueryResult<Vec<ExpressionHit>> {
            unreachable!()
        }

        async fn query_ld_statistic(&self, first: &str, second: &str) -> QueryResult<f64> {
            self.calls.lock().unwrap().push((first.to_string(), second.to_string()));
            if self.missing.iter().any(|m| m == first || m == second) {
                return Err(QueryError::Rejected(format!("{second} is not in 1000G reference panel")));
            }
            Ok(*self.r2.get(&(first.to_string(), second.to_string())).unwrap_or(&0.0))
        }
    }

    fn use_case(table: PairTable, bounds: PairBounds) -> (LdPairUseCase, Arc<PairTable>) {
        let table = Arc::new(table);
        let uc = LdPairUseCase::new(table.clone(), 0.8, bounds, Duration::ZERO, Duration::from_secs(1));
        (uc, table)
    }

    fn ids(list: &[&str]) -> Vec<Rsid> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn linked_pair_drops_second() {
        let (uc, _) = use_case(PairTable::new(&[("rs1", "rs2", 0.9)]), PairBounds::All);
        let out = uc.prune(&ids(&["rs1", "rs2"])).await;
        assert_eq!(out.retained, ids(&["rs1"]));
        assert_eq!(out.queried, 1);
    }

    #[tokio::test]
    async fn unlinked_pair_keeps_both() {
        let (uc, _) = use_case(PairTable::new(&[("rs1", "rs2", 0.5)]), PairBounds::All);
        let out = uc.prune(&ids(&["rs1", "rs2"])).await;
        assert_eq!(out.retained, ids(&["rs1", "rs2"]));
    }

    #[tokio::test]
    async fn dropped_snps_are_not_compared_again() {
        // rs2 is dropped by rs1, so rs2 never gets to drop rs3.
        let table = PairTable::new(&[("rs1", "rs2", 0.95), ("rs2", "rs3", 0.99)]);
        let (uc, table) = use_case(table, PairBounds::All);
        let out = uc.prune(&ids(&["rs1", "rs2", "rs3"])).await;
        assert_eq!(out.retained, ids(&["rs1", "rs3"]));
        let calls = table.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![("rs1".to_string(), "rs2".to_string()), ("rs1".to_string(), "rs3".to_string())]
        );
    }

    #[tokio::test]
    async fn failed_lookup_drops_second() {
        let mut table = PairTable::new(&[]);
        table.missing.push("rs9".into());
        let (uc, _) = use_case(table, PairBounds::All);
        let out = uc.prune(&ids(&["rs1", "rs9", "rs3"])).await;
        assert_eq!(out.retained, ids(&["rs1", "rs3"]));
        assert_eq!(out.failed, 1);
    }

    #[tokio::test]
    async fn exclude_last_never_compares_final_snp() {
        let (uc, table) = use_case(PairTable::new(&[("rs1", "rs3", 0.99)]), PairBounds::ExcludeLast);
        let out = uc.prune(&ids(&["rs1", "rs2", "rs3"])).await;
        assert_eq!(out.retained, ids(&["rs1", "rs2", "rs3"]));
        let calls = table.calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("rs1".to_string(), "rs2".to_string())]);
    }

    #[tokio::test]
    async fn comparisons_bounded_by_pair_count() {
        let list = ids(&["rs1", "rs2", "rs3", "rs4", "rs5"]);
        let (uc, _) = use_case(PairTable::new(&[]), PairBounds::All);
        let out = uc.prune(&list).await;
        assert_eq!(out.queried, list.len() * (list.len() - 1) / 2);
        assert_eq!(out.retained, list);
    }

    #[tokio::test]
    async fn pruning_retained_list_again_changes_nothing() {
        let pairs = [("rs1", "rs2", 0.9), ("rs2", "rs4", 0.99), ("rs3", "rs5", 0.95)];
        let list = ids(&["rs1", "rs2", "rs3", "rs4", "rs5"]);

        for (bounds, expected) in [
            (PairBounds::All, ids(&["rs1", "rs3", "rs4"])),
            (PairBounds::ExcludeLast, ids(&["rs1", "rs3", "rs4", "rs5"])),
        ] {
            let (uc, _) = use_case(PairTable::new(&pairs), bounds);
            let first = uc.prune(&list).await;
            assert_eq!(first.retained, expected, "{bounds:?}");

            let second = uc.prune(&first.retained).await;
            assert_eq!(second.retained, first.retained, "{bounds:?}");
            assert_eq!(second.failed, 0);
        }
    }
}
