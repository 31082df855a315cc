/// Portal endpoints, file names and thresholds shared across the pipelines.
/// Everything here has a matching key in `config.toml`.

// Subcommand names
pub const BRAINEAC_PIPELINE: &str = "braineac";
pub const LD_PAIR_PIPELINE: &str = "ld-pair";
pub const GTEX_PIPELINE: &str = "gtex";

// Braineac (UKBEC) portal
pub const BRAINEAC_BASE_URL: &str = "http://peana-od.inf.um.es:8080/UKBECv12/";
pub const BRAINEAC_SUBMIT_PATH: &str = "snpQuery";
pub const BRAINEAC_SNP_FIELD: &str = "snpList";
pub const BRAINEAC_DOWNLOAD_LINK_ID: &str = "downloadEQTL";
pub const BRAINEAC_ARTIFACT_NAME: &str = "cisEQTL.tsv";
pub const BRAINEAC_WAIT_SECS: u64 = 20;

// LDLink LDpair
pub const LDLINK_API_URL: &str = "https://ldlink.nih.gov/LDlinkRest/ldpair";
pub const LDLINK_POPULATION: &str = "CEU";
pub const LDLINK_GENOME_BUILD: &str = "grch37";
pub const LDLINK_TOKEN_ENV: &str = "LDLINK_TOKEN";
pub const LDLINK_STARTUP_PAUSE_MS: u64 = 6000;
pub const LDLINK_WAIT_SECS: u64 = 3;
pub const LD_R2_THRESHOLD: f64 = 0.8;

// GTEx
pub const GTEX_API_URL: &str = "https://gtexportal.org/api/v2/association/dyneqtl";
pub const GTEX_VARIANT_URL: &str = "https://gtexportal.org/api/v2/dataset/variant";
pub const GTEX_GENE_URL: &str = "https://gtexportal.org/api/v2/reference/gene";
pub const GTEX_GENCODE_VERSION: &str = "v26";
pub const GTEX_DATASET_ID: &str = "gtex_v8";
pub const GTEX_WAIT_SECS: u64 = 20;
pub const GTEX_P_VALUE_THRESHOLD: f64 = 0.05;

// Output naming
pub const BRAINEAC_OUTPUT_SUFFIX: &str = "-SNPsOfficial.txt";
pub const GTEX_OUTPUT_SUFFIX: &str = "-GTEx.txt";
pub const LD_OUTPUT_FILE: &str = "list2";

// Local defaults
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DOWNLOAD_POLL_INTERVAL_MS: u64 = 250;
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("snp_screen/", env!("CARGO_PKG_VERSION"));

/// Output file for the Braineac pipeline
pub fn braineac_output_name(gene: &str) -> String {
    format!("{gene}{BRAINEAC_OUTPUT_SUFFIX}")
}

/// Output file for the GTEx pipeline
pub fn gtex_output_name(gene: &str) -> String {
    format!("{gene}{GTEX_OUTPUT_SUFFIX}")
}
