//! Pure predicates applied to portal results.

use crate::error::{QueryError, QueryResult};
use crate::types::ExpressionHit;
use std::collections::HashMap;

/// True when `gene` appears as a whole whitespace-separated token.
pub fn contains_gene_token(document: &str, gene: &str) -> bool {
    document.split_whitespace().any(|token| token == gene)
}

pub fn passes_p_value(p_value: f64, threshold: f64) -> bool {
    p_value < threshold
}

/// Two variants are in linkage when r² reaches the threshold.
pub fn in_linkage(r2: f64, threshold: f64) -> bool {
    r2 >= threshold
}

/// Keeps hits below the p-value threshold, in input order.
pub fn significant_hits(hits: Vec<ExpressionHit>, threshold: f64) -> Vec<ExpressionHit> {
    hits.into_iter()
        .filter(|hit| passes_p_value(hit.p_value, threshold))
        .collect()
}

/// One hit per RSID: the lowest p-value wins, ties keep the earlier hit.
/// Output order follows each RSID's first appearance.
pub fn best_per_rsid(hits: Vec<ExpressionHit>) -> Vec<ExpressionHit> {
    let mut slot_of: HashMap<String, usize> = HashMap::new();
    let mut best: Vec<ExpressionHit> = Vec::new();

    for hit in hits {
        let key = hit.rsid.trim().to_string();
        match slot_of.get(&key) {
            Some(&slot) => {
                if hit.p_value < best[slot].p_value {
                    best[slot] = hit;
                }
            }
            None => {
                slot_of.insert(key, best.len());
                best.push(hit);
            }
        }
    }
    best
}

/// Parses a numeric cell from a portal response.
pub fn parse_statistic(field: &'static str, raw: &str) -> QueryResult<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(QueryError::MalformedNumber {
            field,
            value: trimmed.to_string(),
        }),
    }
}
