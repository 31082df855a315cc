use snp_screen::config::{BraineacConfig, DownloadConfig, GtexConfig, HttpConfig, RetirePolicy};
use snp_screen::error::QueryError;
use snp_screen::infra::braineac::BraineacClient;
use snp_screen::infra::gtex::GtexClient;
use snp_screen::infra::http_client::build_client;
use snp_screen::types::BrainTissue;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Canned reply for one request.
struct Reply {
    status: u16,
    headers: Vec<(&'static str, String)>,
    body: String,
}

impl Reply {
    fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type", "application/json".into())],
            body: body.to_string(),
        }
    }

    fn html(body: &str) -> Self {
        Self {
            status: 200,
            headers: vec![("Content-Type", "text/html".into())],
            body: body.to_string(),
        }
    }

    fn redirect(location: &str) -> Self {
        Self {
            status: 303,
            headers: vec![("Location", location.to_string())],
            body: String::new(),
        }
    }
}

type Route = Arc<dyn Fn(&str, &str) -> Reply + Send + Sync>;

/// HTTP/1.1 server on a random local port. Every request line is recorded
/// as `METHOD target`.
struct LocalPortal {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
    server: tokio::task::JoinHandle<()>,
}

impl LocalPortal {
    async fn start(route: impl Fn(&str, &str) -> Reply + Send + Sync + 'static) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let route: Route = Arc::new(route);

        let log = requests.clone();
        let server = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(answer(stream, route.clone(), log.clone()));
            }
        });

        Self { base, requests, server }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn requests_to(&self, path: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.split(' ').nth(1).map_or(false, |t| t.starts_with(path)))
            .cloned()
            .collect()
    }
}

impl Drop for LocalPortal {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn answer(mut stream: TcpStream, route: Route, log: Arc<Mutex<Vec<String>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();
    log.lock().unwrap().push(format!("{method} {target}"));

    let reply = route(&method, &target);
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reason(reply.status),
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(&reply.body);

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        303 => "See Other",
        400 => "Bad Request",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        _ => "Unknown",
    }
}

const VARIANT_PATH: &str = "/api/v2/dataset/variant";
const GENE_PATH: &str = "/api/v2/reference/gene";
const DYNEQTL_PATH: &str = "/api/v2/association/dyneqtl";

const APOE_VARIANT: &str = r#"{"data": [{"snpId": "rs7412", "variantId": "chr19_44908822_C_T_b38"}]}"#;
const APOE_GENE: &str = r#"{"data": [{"geneSymbol": "APOE", "gencodeId": "ENSG00000130203.9"}]}"#;

fn gtex_client(portal: &LocalPortal) -> GtexClient {
    let config = GtexConfig {
        api_url: portal.url(DYNEQTL_PATH),
        variant_url: portal.url(VARIANT_PATH),
        gene_url: portal.url(GENE_PATH),
        ..GtexConfig::default()
    };
    GtexClient::new(build_client(&HttpConfig::default()).unwrap(), config)
}

/// Resolves ids, then answers the association endpoint with `dyneqtl`.
fn gtex_route(dyneqtl: fn(&str) -> Reply) -> impl Fn(&str, &str) -> Reply + Send + Sync + 'static {
    move |_method: &str, target: &str| {
        if target.starts_with(VARIANT_PATH) {
            Reply::json(200, APOE_VARIANT)
        } else if target.starts_with(GENE_PATH) {
            Reply::json(200, APOE_GENE)
        } else if target.starts_with(DYNEQTL_PATH) {
            dyneqtl(target)
        } else {
            Reply::json(404, r#"{"detail": "Not Found"}"#)
        }
    }
}

#[tokio::test]
async fn gtex_queries_with_resolved_ids() {
    let portal = LocalPortal::start(gtex_route(|_| {
        Reply::json(200, r#"{"data": [{"pValue": 0.0004, "snpId": "rs7412"}]}"#)
    }))
    .await;

    let hits = gtex_client(&portal)
        .expression("rs7412", "APOE", &[BrainTissue::Hippocampus])
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].tissue, "Brain_Hippocampus");

    let queries = portal.requests_to(DYNEQTL_PATH);
    assert_eq!(queries.len(), 1);
    assert!(queries[0].contains("variantId=chr19_44908822_C_T_b38"), "{}", queries[0]);
    assert!(queries[0].contains("gencodeId=ENSG00000130203.9"), "{}", queries[0]);
    assert!(!queries[0].contains("rs7412"));
}

#[tokio::test]
async fn gtex_unprocessable_query_is_rejected() {
    let portal = LocalPortal::start(gtex_route(|_| {
        Reply::json(422, r#"{"detail": "gencodeId 'APOE' is not a valid GENCODE id"}"#)
    }))
    .await;

    let err = gtex_client(&portal)
        .expression("rs7412", "APOE", &BrainTissue::ALL)
        .await
        .unwrap_err();
    match err {
        QueryError::Rejected(message) => assert!(message.contains("not a valid GENCODE id"), "{message}"),
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(portal.requests_to(DYNEQTL_PATH).len(), 1);
}

#[tokio::test]
async fn gtex_bad_request_is_rejected() {
    let portal = LocalPortal::start(gtex_route(|_| Reply::json(400, r#"{"detail": "datasetId is required"}"#))).await;

    let err = gtex_client(&portal)
        .expression("rs7412", "APOE", &[BrainTissue::Cortex])
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Rejected(_)), "{err:?}");
}

#[tokio::test]
async fn gtex_rejection_during_lookup_fails_before_any_association_query() {
    let portal = LocalPortal::start(|_: &str, _: &str| {
        Reply::json(422, r#"{"detail": "gencodeId 'APOE' is not a valid GENCODE id"}"#)
    })
    .await;

    let err = gtex_client(&portal)
        .expression("rs7412", "APOE", &BrainTissue::ALL)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Rejected(_)), "{err:?}");
    assert!(portal.requests_to(DYNEQTL_PATH).is_empty());
}

#[tokio::test]
async fn gtex_not_found_tissue_adds_nothing() {
    let portal = LocalPortal::start(gtex_route(|target| {
        if target.contains("tissueSiteDetailId=Brain_Cortex&") {
            Reply::json(404, r#"{"detail": "No data"}"#)
        } else {
            Reply::json(200, r#"[{"pValue": 0.01}]"#)
        }
    }))
    .await;
    let client = gtex_client(&portal);

    let hits = client.expression("rs7412", "APOE", &BrainTissue::ALL).await.unwrap();
    assert_eq!(hits.len(), BrainTissue::ALL.len() - 1);
    assert!(hits.iter().all(|h| h.tissue != "Brain_Cortex"));

    client.expression("rs429358", "APOE", &[BrainTissue::Cortex]).await.unwrap();
    assert_eq!(portal.requests_to(GENE_PATH).len(), 1);
}

#[tokio::test]
async fn braineac_download_link_follows_redirect() {
    let portal = LocalPortal::start(|method: &str, target: &str| match (method, target) {
        ("POST", "/UKBECv12/snpQuery") => Reply::redirect("/UKBECv12/results/rs356182/"),
        ("GET", "/UKBECv12/results/rs356182/") => {
            Reply::html(r#"<html><body><a id="downloadEQTL" href="cisEQTL.tsv">Download</a></body></html>"#)
        }
        ("GET", "/UKBECv12/results/rs356182/cisEQTL.tsv") => Reply {
            status: 200,
            headers: vec![("Content-Type", "text/tab-separated-values".into())],
            body: "snp\tgene\tp\nrs356182\tSNCA\t0.0003\n".into(),
        },
        _ => Reply::json(404, r#"{"detail": "Not Found"}"#),
    })
    .await;

    let downloads_dir = tempfile::tempdir().unwrap();
    let downloads = DownloadConfig {
        dir: downloads_dir.path().to_path_buf(),
        poll_interval_ms: 10,
        wait_timeout_secs: 1,
        retire: RetirePolicy::Delete,
    };
    let config = BraineacConfig {
        base_url: portal.url("/UKBECv12/"),
        ..BraineacConfig::default()
    };
    let client = BraineacClient::new(build_client(&HttpConfig::default()).unwrap(), config, &downloads);

    assert!(client.gene_membership("rs356182", "SNCA").await.unwrap());
    assert_eq!(
        portal.requests_to("/UKBECv12/results/rs356182/cisEQTL.tsv"),
        vec!["GET /UKBECv12/results/rs356182/cisEQTL.tsv".to_string()]
    );
    assert!(!downloads_dir.path().join("cisEQTL.tsv").exists());
}
