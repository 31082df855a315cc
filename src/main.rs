use anyhow::Context;
use clap::{Parser, Subcommand};
use snp_screen::app::ports::RemoteQueryService;
use snp_screen::config::Config;
use snp_screen::constants;
use snp_screen::infra::portal_service::PortalQueryService;
use snp_screen::logging;
use snp_screen::pipeline::{Pipeline, PipelineResult};
use snp_screen::types::PairBounds;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "snp_screen")]
#[command(about = "Screen SNP lists against Braineac, LDLink and GTEx")]
#[command(version)]
struct Cli {
    /// Configuration file; defaults apply when it does not exist
    #[arg(long, global = true, default_value = constants::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output file instead of the pipeline's default name
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep SNPs whose Braineac cis-eQTL table names the gene
    Braineac {
        gene: String,
        input: PathBuf,
        /// Directory the eQTL tables are downloaded into
        #[arg(long)]
        download_dir: Option<PathBuf>,
    },
    /// Drop SNPs in linkage disequilibrium with an earlier SNP
    LdPair {
        input: PathBuf,
        /// r² at or above which the second SNP of a pair is dropped
        #[arg(long)]
        threshold: Option<f64>,
        /// Which pairs are compared
        #[arg(long, value_enum)]
        bounds: Option<PairBounds>,
        /// LDLink reference population, e.g. CEU
        #[arg(long)]
        population: Option<String>,
    },
    /// Keep SNPs with a significant brain eQTL in GTEx
    Gtex {
        input: PathBuf,
        gene: String,
        /// p-value below which an association counts
        #[arg(long)]
        threshold: Option<f64>,
    },
}

fn print_summary(result: &PipelineResult) {
    println!("\n📊 {} results:", result.pipeline);
    println!("   Identifiers: {}", result.total_identifiers);
    println!("   Queries: {} ({} failed)", result.queries, result.failed_queries);
    println!("   Retained: {}", result.retained);
    println!("   Output file: {}", result.output_file);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config).context("loading configuration")?;
    let _log_guard = logging::init_logging(&config.logging.dir);

    let result = match cli.command {
        Commands::Braineac { gene, input, download_dir } => {
            if let Some(dir) = download_dir {
                config.downloads.dir = dir;
            }
            let output = cli.output.unwrap_or_else(|| constants::braineac_output_name(&gene).into());
            let service: Arc<dyn RemoteQueryService> = Arc::new(PortalQueryService::from_config(&config)?);
            Pipeline::braineac(service, &config, &gene, &input, &output).await
        }
        Commands::LdPair { input, threshold, bounds, population } => {
            if let Some(t) = threshold {
                config.ldlink.r2_threshold = t;
            }
            if let Some(b) = bounds {
                config.ldlink.pair_bounds = b;
            }
            if let Some(p) = population {
                config.ldlink.population = p;
            }
            config.validate().context("checking --threshold")?;
            let output = cli.output.unwrap_or_else(|| constants::LD_OUTPUT_FILE.into());
            let service: Arc<dyn RemoteQueryService> = Arc::new(PortalQueryService::from_config(&config)?);
            Pipeline::ld_pair(service, &config, &input, &output).await
        }
        Commands::Gtex { input, gene, threshold } => {
            if let Some(t) = threshold {
                config.gtex.p_value_threshold = t;
            }
            config.validate().context("checking --threshold")?;
            let output = cli.output.unwrap_or_else(|| constants::gtex_output_name(&gene).into());
            let service: Arc<dyn RemoteQueryService> = Arc::new(PortalQueryService::from_config(&config)?);
            Pipeline::gtex(service, &config, &input, &gene, &output).await
        }
    };

    match result {
        Ok(result) => {
            info!("Analysis complete");
            print_summary(&result);
            Ok(())
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            Err(e.into())
        }
    }
}
