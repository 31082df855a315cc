use crate::config::GtexConfig;
use crate::error::{QueryError, QueryResult};
use crate::infra::http_client::ensure_success;
use crate::pipeline::filter::parse_statistic;
use crate::types::{normalize_tissue_label, BrainTissue, ExpressionHit};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Single-tissue eQTL lookups against the GTEx API.
///
/// The association endpoint only accepts GTEx variant ids and versioned
/// GENCODE ids, so both are resolved first. Gene ids are cached for the run.
pub struct GtexClient {
    http: reqwest::Client,
    config: GtexConfig,
    gencode_ids: Mutex<HashMap<String, String>>,
}

impl GtexClient {
    pub fn new(http: reqwest::Client, config: GtexConfig) -> Self {
        Self {
            http,
            config,
            gencode_ids: Mutex::new(HashMap::new()),
        }
    }

    /// One request per tissue. A 404 for a tissue adds nothing; any other
    /// failure, including a rejected query, fails the whole SNP.
    #[instrument(skip(self, tissues), fields(tissues = tissues.len()))]
    pub async fn expression(
        &self,
        rsid: &str,
        gene: &str,
        tissues: &[BrainTissue],
    ) -> QueryResult<Vec<ExpressionHit>> {
        let variant_id = self.variant_id(rsid).await?;
        let gencode_id = self.gencode_id(gene).await?;

        let mut hits = Vec::new();
        for tissue in tissues {
            let resp = self
                .http
                .get(&self.config.api_url)
                .query(&[
                    ("variantId", variant_id.as_str()),
                    ("gencodeId", gencode_id.as_str()),
                    ("tissueSiteDetailId", tissue.site_detail_id()),
                    ("datasetId", self.config.dataset_id.as_str()),
                ])
                .send()
                .await?;

            if resp.status() == StatusCode::NOT_FOUND {
                debug!("No {} data for {} / {}", tissue, variant_id, gencode_id);
                continue;
            }

            let body = response_body(resp).await?;
            hits.extend(parse_expression_response(&body, rsid, tissue.site_detail_id())?);
        }
        Ok(hits)
    }

    async fn variant_id(&self, rsid: &str) -> QueryResult<String> {
        let resp = self
            .http
            .get(&self.config.variant_url)
            .query(&[("snpId", rsid), ("datasetId", self.config.dataset_id.as_str())])
            .send()
            .await?;
        let variant_id = parse_variant_lookup(&response_body(resp).await?, rsid)?;
        debug!("{} resolved to {}", rsid, variant_id);
        Ok(variant_id)
    }

    async fn gencode_id(&self, gene: &str) -> QueryResult<String> {
        if let Some(id) = self.gencode_ids.lock().ok().and_then(|ids| ids.get(gene).cloned()) {
            return Ok(id);
        }

        let resp = self
            .http
            .get(&self.config.gene_url)
            .query(&[("geneId", gene), ("gencodeVersion", self.config.gencode_version.as_str())])
            .send()
            .await?;
        let gencode_id = parse_gene_lookup(&response_body(resp).await?, gene)?;
        debug!("{} resolved to {}", gene, gencode_id);

        if let Ok(mut ids) = self.gencode_ids.lock() {
            ids.insert(gene.to_string(), gencode_id.clone());
        }
        Ok(gencode_id)
    }
}

/// Body of a successful response. 400 and 422 mean the portal refused the
/// query and become [`QueryError::Rejected`] carrying its `detail` message.
async fn response_body(resp: reqwest::Response) -> QueryResult<String> {
    let status = resp.status();
    if matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY) {
        let body = resp.text().await.unwrap_or_default();
        return Err(QueryError::Rejected(format!("{}: {}", status.as_u16(), rejection_message(&body))));
    }
    Ok(ensure_success(resp)?.text().await?)
}

fn rejection_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").or_else(|| v.get("error")).cloned())
        .map(|detail| match detail {
            Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Rows of a GTEx lookup response: a bare array or one wrapped in `data`.
fn lookup_rows(body: &str) -> QueryResult<Vec<Value>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| QueryError::Response(format!("GTEx JSON: {e}")))?;
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(QueryError::Response("GTEx lookup has no data array".into())),
        },
        _ => Err(QueryError::Response("GTEx lookup is not an object".into())),
    }
}

/// Picks the GTEx variant id (e.g. `chr19_44908822_C_T_b38`) for `rsid`.
pub fn parse_variant_lookup(body: &str, rsid: &str) -> QueryResult<String> {
    let rows = lookup_rows(body)?;
    rows.iter()
        .find(|row| row.get("snpId").and_then(Value::as_str) == Some(rsid))
        .or_else(|| rows.first())
        .and_then(|row| row.get("variantId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| QueryError::NoResult(format!("{rsid} is not a GTEx variant")))
}

/// Picks the versioned GENCODE id (e.g. `ENSG00000130203.9`) for a gene
/// symbol or unversioned Ensembl id.
pub fn parse_gene_lookup(body: &str, gene: &str) -> QueryResult<String> {
    let rows = lookup_rows(body)?;
    let unversioned = |id: &str| id.split('.').next().unwrap_or(id).to_string();
    let wanted = unversioned(gene);
    let names_gene = |row: &&Value| {
        let symbol = row.get("geneSymbol").and_then(Value::as_str).unwrap_or_default();
        let gencode = row.get("gencodeId").and_then(Value::as_str).unwrap_or_default();
        symbol.eq_ignore_ascii_case(gene) || unversioned(gencode) == wanted
    };
    rows.iter()
        .find(names_gene)
        .or_else(|| rows.first())
        .and_then(|row| row.get("gencodeId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| QueryError::NoResult(format!("{gene} is not a GENCODE gene")))
}

/// Reads eQTL rows from a GTEx response body. Accepts a single object, an
/// array of objects, or an object wrapping them in `data`.
pub fn parse_expression_response(
    body: &str,
    rsid: &str,
    tissue: &str,
) -> QueryResult<Vec<ExpressionHit>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| QueryError::Response(format!("GTEx JSON: {e}")))?;

    if let Some(error) = value.get("error").or_else(|| value.get("detail")) {
        let message = error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string());
        return Err(QueryError::Rejected(message));
    }

    let rows: Vec<&Value> = match &value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("data") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![&value],
        },
        _ => return Err(QueryError::Response("GTEx response is not an object".into())),
    };

    rows.into_iter().map(|row| hit_from_row(row, rsid, tissue)).collect()
}

fn hit_from_row(row: &Value, rsid: &str, tissue: &str) -> QueryResult<ExpressionHit> {
    let p_value = match row.get("pValue") {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| QueryError::MalformedNumber {
            field: "p-value",
            value: n.to_string(),
        })?,
        Some(Value::String(s)) => parse_statistic("p-value", s)?,
        Some(other) => {
            return Err(QueryError::MalformedNumber {
                field: "p-value",
                value: other.to_string(),
            })
        }
        None => return Err(QueryError::Response("GTEx row has no pValue".into())),
    };

    let rsid = row
        .get("snpId")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(rsid);
    let tissue = row
        .get("tissueSiteDetailId")
        .or_else(|| row.get("tissueSiteDetail"))
        .and_then(Value::as_str)
        .unwrap_or(tissue);

    Ok(ExpressionHit {
        rsid: rsid.trim().to_string(),
        p_value,
        tissue: normalize_tissue_label(tissue),
    })
}
