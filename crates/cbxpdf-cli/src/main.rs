//! cbxpdf CLI: convert comic archives to PDF locally.

use std::path::PathBuf;

use anyhow::Context;
use cbxpdf_cli::{
    convert_files, describe_file, init_tracing, parse_page_range, resolve_output_path,
    ConvertOptions,
};
use cbxpdf_core::{BackgroundColor, Config, ConversionMode, RenderSettings};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cbxpdf", about = "Convert comic book archives (.cbz/.cbr) to PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one or more archives
    Convert {
        /// single, batch or combine
        #[arg(long, default_value = "single")]
        mode: String,
        /// JPEG quality 1-100 (100 keeps PNG pages lossless)
        #[arg(long)]
        quality: Option<u8>,
        /// Page background: white or black
        #[arg(long, default_value = "white")]
        background: String,
        /// 1-based page range applied to every archive, e.g. 1-5
        #[arg(long)]
        pages: Option<String>,
        /// Output file, or directory for the default name
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Archives to convert, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print an archive's type and page order as JSON
    Info {
        /// Archive to inspect
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::Convert {
            mode,
            quality,
            background,
            pages,
            output,
            files,
        } => {
            let mode: ConversionMode = mode.parse()?;
            let background: BackgroundColor = background.parse()?;
            let (start, end) = match pages.as_deref() {
                Some(range) => parse_page_range(range)?,
                None => (None, None),
            };
            let settings = RenderSettings::new(quality.unwrap_or(config.default_quality), background)?
                .with_page_range(start, end);

            let result = convert_files(
                &config,
                ConvertOptions {
                    mode,
                    settings,
                    files,
                },
            )
            .await?;

            let path = resolve_output_path(output.as_deref(), &result);
            tokio::fs::write(&path, &result.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            tracing::info!(path = %path.display(), bytes = result.bytes.len(), "Written");
            println!("{}", path.display());
        }
        Commands::Info { file } => {
            let summary = describe_file(&config, &file).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Serialize summary")?
            );
        }
    }

    Ok(())
}
