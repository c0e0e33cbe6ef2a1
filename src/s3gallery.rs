mod album;
mod archive;
mod config;
mod credentials;
mod error;
mod gallery;
mod pipeline;
mod resize;
mod s3;
mod select;

use anyhow::Result;
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use album::Album;
use config::{validate_bucket_name, Config};
use credentials::AccessKeys;
use error::GalleryError;
use pipeline::{RunMode, RunOptions};
use resize::SizeMode;
use s3::{AccessPolicy, S3Client, StorageTier, UploadState};

#[derive(Parser, Debug)]
#[command(
    name = "s3gallery",
    version = env!("CARGO_PKG_VERSION"),
    about = "Publish a folder of JPEGs to S3 as a zip download and a photo gallery page",
    long_about = "Zips every .jpg in a directory, creates display-size images and thumbnails, \
                  renders an index.html gallery, and uploads all of it to \
                  s3://<bucket>/pictures/<album>/. Refuses to overwrite an existing album \
                  unless --force-upload is given.",
    after_help = "Examples:\n  \
                  s3gallery -b my-photos -a vacation -d ./vacation     # Gallery + zip\n  \
                  s3gallery -b my-photos -a vacation -f                # Overwrite existing album\n  \
                  s3gallery -b my-photos -k backups/trip.zip --flat    # Zip only, exact key\n  \
                  s3gallery -b my-photos -a vacation --dry-run         # Show the keys only\n\n\
                  Credentials (~/AwsCredentials.properties):\n  \
                  accessKey=AKIA...\n  \
                  secretKey=...\n\n\
                  Configuration (.env):\n  \
                  AWS_REGION=us-east-1\n  \
                  S3_PUBLIC_HOST=s3.amazonaws.com\n  \
                  AWS_CREDENTIALS_FILE=/path/to/AwsCredentials.properties"
)]
struct Cli {
    /// Destination bucket
    #[arg(long, short = 'b', env = "S3_BUCKET")]
    bucket_name: String,

    /// Album name (letters, numbers, hyphens, underscores)
    #[arg(long, short = 'a')]
    album_name: Option<String>,

    /// Directory holding the .jpg files
    #[arg(
        long,
        short = 'd',
        visible_alias = "folder-path",
        visible_short_alias = 'p',
        default_value = "."
    )]
    directory: PathBuf,

    /// Destination key for the archive (only with --flat)
    #[arg(long, short = 'k')]
    key_name: Option<String>,

    /// Upload even if the album already exists, overwriting it
    #[arg(long, short = 'f')]
    force_upload: bool,

    /// Upload only the zip archive, no gallery
    #[arg(long)]
    flat: bool,

    /// Bound for display images, as <height|any>:<pixels>
    #[arg(long, default_value = "any:2048")]
    display_mode: String,

    /// Bound for thumbnails, as <height|any>:<pixels>
    #[arg(long, default_value = "height:66")]
    thumbnail_mode: String,

    /// Store objects in the STANDARD tier instead of REDUCED_REDUNDANCY
    #[arg(long)]
    standard_storage: bool,

    /// Keep uploads private (the printed link then needs signed access)
    #[arg(long)]
    private: bool,

    /// Show what would be uploaded without touching S3
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file early to get LOG_LEVEL
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<GalleryError>() {
                Some(gallery_error) => {
                    eprintln!("{} {}", style("✗").red(), gallery_error.user_message())
                }
                None => eprintln!("{} Unhandled error: {:?}", style("✗").red(), e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    info!("S3 Gallery v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let options = build_options(&cli, &config)?;

    if cli.dry_run {
        return print_plan(&options);
    }

    // No network activity before the credentials are known to be usable
    let keys = AccessKeys::load(&config.credentials_path)?;
    let store = Arc::new(S3Client::new(config, keys).await?);

    println!(
        "{}",
        style(format!("📦 Target: s3://{}", options.bucket))
            .cyan()
            .bold()
    );

    let report = pipeline::run(store, &options).await?;

    let Some(link) = report.link else {
        return Ok(());
    };

    let completed = report
        .uploads
        .iter()
        .filter(|u| u.state == UploadState::Completed)
        .count();
    println!();
    println!(
        "{}",
        style(format!(
            "Summary: {} files, {} uploads in {:.2}s",
            report.files,
            completed,
            report.elapsed.as_secs_f64()
        ))
        .bold()
    );
    println!(
        "You can view and download the pictures at {}",
        style(link).green().bold()
    );

    Ok(())
}

fn build_options(cli: &Cli, config: &Config) -> Result<RunOptions> {
    validate_bucket_name(&cli.bucket_name)?;

    let album = cli.album_name.as_deref().map(Album::new).transpose()?;

    let options = RunOptions {
        bucket: cli.bucket_name.clone(),
        album,
        directory: cli.directory.clone(),
        key_name: cli.key_name.clone(),
        force: cli.force_upload,
        mode: if cli.flat {
            RunMode::Flat
        } else {
            RunMode::Gallery
        },
        display: cli.display_mode.parse::<SizeMode>()?,
        thumbnail: cli.thumbnail_mode.parse::<SizeMode>()?,
        storage_class: if cli.standard_storage {
            StorageTier::Standard
        } else {
            StorageTier::ReducedRedundancy
        },
        access: if cli.private {
            AccessPolicy::Private
        } else {
            AccessPolicy::PublicRead
        },
        public_host: config.public_host.clone(),
    };
    options.validate()?;
    Ok(options)
}

fn print_plan(options: &RunOptions) -> Result<()> {
    println!(
        "{}",
        style("🔍 DRY RUN MODE - No files will be uploaded")
            .yellow()
            .bold()
    );
    println!();

    let (files, keys) = pipeline::plan(options)?;
    if files.is_empty() {
        println!(
            "{}",
            style(format!("No jpg files found in {}", options.directory.display())).yellow()
        );
        return Ok(());
    }

    for key in &keys {
        println!(
            "  {} s3://{}/{}",
            style("WOULD UPLOAD").green().bold(),
            options.bucket,
            key
        );
    }
    println!();
    println!(
        "{}",
        style(format!("{} files, {} uploads", files.len(), keys.len())).bold()
    );

    Ok(())
}
