use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use esg_report_client::app::directory_use_case::ListingSource;
use esg_report_client::config::Config;
use esg_report_client::constants::CONFIG_PATH_ENV;
use esg_report_client::observability::init_logging;
use esg_report_client::types::{FormPart, ReportRecord};
use esg_report_client::EsgClient;

#[derive(Parser)]
#[command(name = "esg-reports")]
#[command(about = "List, download and generate ESG reports")]
#[command(version = "0.1.0")]
struct Cli {
    /// Config file (defaults to $ESG_CONFIG, then ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List your reports (cached list first, then the live one)
    List,
    /// Download a report by id
    Download {
        #[arg(long)]
        id: i64,
        /// Save-as file name (defaults to the report title)
        #[arg(long)]
        filename: Option<String>,
    },
    /// Open a report in the browser via its signed link
    View {
        #[arg(long)]
        id: i64,
    },
    /// Upload a spreadsheet and print the extracted ESG metrics
    Upload {
        #[arg(long)]
        file: PathBuf,
    },
    /// Generate a PDF report from a spreadsheet and save it
    Generate {
        #[arg(long)]
        file: PathBuf,
    },
}

fn print_listing(source: ListingSource, records: &[ReportRecord]) {
    match source {
        ListingSource::Mirror => println!("📁 Cached reports ({}):", records.len()),
        ListingSource::Authoritative => println!("📄 Your reports ({}):", records.len()),
    }
    if records.is_empty() {
        println!("   (none yet - generate one with `esg-reports generate --file <xlsx>`)");
    }
    for record in records {
        println!("   #{:<6} {:<50} {}", record.id, record.title(), record.display_date());
    }
}

async fn default_filename(client: &EsgClient, id: i64) -> String {
    client
        .directory()
        .load_mirror()
        .await
        .into_iter()
        .find(|r| r.id == id)
        .map(|r| r.download_filename())
        .unwrap_or_else(|| format!("Report_{}.pdf", id))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_path(path)?;
            config.apply_env_overrides();
            config.validate()?;
            config
        }
        None => Config::load()?,
    };

    init_logging(&config.storage.log_dir);
    info!(
        "Using API {} (config from {})",
        config.api.base_url,
        cli.config
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| "defaults/config.toml".to_string())
    );

    let client = EsgClient::from_config(&config)?;

    match cli.command {
        Commands::List => {
            client.directory().activate(print_listing).await?;
        }
        Commands::Download { id, filename } => {
            let filename = match filename {
                Some(name) => name,
                None => default_filename(&client, id).await,
            };
            println!("⬇️  Preparing report #{} as {}", id, filename);
            let receipt = client.acquisition().download(id, &filename).await?;

            let first_download = match client.history().record(id).await {
                Ok(first) => first,
                Err(e) => {
                    warn!("Failed to update download history: {}", e);
                    false
                }
            };
            if receipt.is_degraded() {
                println!("⚠️  Report unavailable; saved the example report to {}", receipt.saved_to.display());
            } else {
                println!(
                    "✅ Saved {} ({} bytes, via {})",
                    receipt.saved_to.display(),
                    receipt.outcome.size_bytes.unwrap_or_default(),
                    receipt.outcome.stage
                );
            }
            if first_download {
                println!("   First download of this report on this machine.");
            }
        }
        Commands::View { id } => match client.acquisition().view(id).await {
            Ok(url) => println!("🌐 Opened report #{}: {}", id, url),
            Err(e) => {
                println!("❌ Failed to open the report. Try `esg-reports download --id {}` instead.", id);
                return Err(e.into());
            }
        },
        Commands::Upload { file } => {
            let part = FormPart::from_path("file", &file).await?;
            let metrics = client.generation().upload_esg_file(part).await?;
            println!("📊 ESG metrics for {}:", file.display());
            if let Some(score) = metrics.labor_rights_compliance_score {
                println!("   Labor rights compliance score: {:.1}", score);
            }
            if let Some(value) = metrics.anti_corruption_training {
                println!("   Anti-corruption training: {:.1}", value);
            }
            if let Some(value) = metrics.disability_representation {
                println!("   Disability representation: {:.1}", value);
            }
            println!("   Series: {}", metrics.series_names().join(", "));
        }
        Commands::Generate { file } => {
            let part = FormPart::from_path("excel_file", &file).await?;
            println!("🔄 Generating report from {} (this may take up to a minute)...", file.display());
            let path = client.generation().generate_and_save(part).await?;
            println!("✅ Report saved to {}", path.display());
        }
    }

    Ok(())
}
