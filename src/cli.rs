use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dialoguer::{Confirm, theme::ColorfulTheme};

use crate::{
    asc::{AppStoreConnectClient, Config},
    commands::{
        Pacing, Selection,
        add_to_review::{self, AddToReviewOptions, ReleaseCleanup},
        generate_images,
        setup::{self, SetupOptions},
        submit_for_review::{self, DEFAULT_PLATFORM, SubmitOptions},
        upload_images::{self, UploadOptions},
    },
    gamecenter::{Catalog, DEFAULT_LEVELS},
    logging,
};

const DEFAULT_IMAGES_DIR: &str = "gc_images";

#[derive(Parser, Debug)]
#[command(
    name = "gckit",
    version,
    about = "Game Center setup for App Store Connect",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// App Store Connect API Key ID
    #[arg(long, env = "GCKIT_KEY_ID", global = true)]
    key_id: Option<String>,

    /// App Store Connect Issuer ID
    #[arg(long, env = "GCKIT_ISSUER_ID", global = true)]
    issuer_id: Option<String>,

    /// Path to the .p8 private key file
    #[arg(long, env = "GCKIT_KEY_FILE", global = true)]
    key_file: Option<PathBuf>,

    /// App Store Connect App ID (numeric Apple ID)
    #[arg(long, env = "GCKIT_APP_ID", global = true)]
    app_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the Game Center detail, leaderboards and achievements
    Setup {
        /// Print what would be created without calling the API
        #[arg(long)]
        dry_run: bool,
        /// Only create achievements, skip leaderboards
        #[arg(long, conflicts_with = "leaderboards_only")]
        achievements_only: bool,
        /// Only create leaderboards, skip achievements
        #[arg(long)]
        leaderboards_only: bool,
        /// Number of game levels
        #[arg(long, default_value_t = DEFAULT_LEVELS)]
        levels: u32,
    },
    /// Render placeholder PNGs for every achievement and leaderboard
    GenerateImages {
        /// Output directory
        #[arg(short, long, default_value = DEFAULT_IMAGES_DIR)]
        output: PathBuf,
        /// Number of game levels
        #[arg(long, default_value_t = DEFAULT_LEVELS)]
        levels: u32,
    },
    /// Upload achievement and leaderboard images
    UploadImages {
        /// Directory holding achievements/ and leaderboards/ sub-directories
        #[arg(long, default_value = DEFAULT_IMAGES_DIR)]
        images_dir: PathBuf,
        /// List what would be uploaded without calling the API
        #[arg(long)]
        dry_run: bool,
        /// Only upload achievement images
        #[arg(long, conflicts_with = "leaderboards_only")]
        achievements_only: bool,
        /// Only upload leaderboard images
        #[arg(long)]
        leaderboards_only: bool,
    },
    /// Attach achievement and leaderboard versions to the review submission draft
    AddToReview {
        /// Delete stale v1 releases without asking
        #[arg(short, long)]
        yes: bool,
        /// Leave v1 releases in place
        #[arg(long, conflicts_with = "yes")]
        keep_releases: bool,
    },
    /// Enable Game Center on an app store version and request a release
    SubmitForReview {
        /// App store version string, e.g. 1.0.1
        #[arg(long = "version")]
        app_version: String,
        /// App store platform
        #[arg(long, default_value = DEFAULT_PLATFORM)]
        platform: String,
    },
    /// Print a short-lived App Store Connect bearer token
    Token,
}

impl Cli {
    fn client(&self) -> Result<AppStoreConnectClient> {
        let cfg = Config::from_parts(
            self.key_id.clone(),
            self.issuer_id.clone(),
            self.key_file.clone(),
        )?;
        println!("Generating JWT token...");
        let issuer = cfg
            .issuer()
            .with_context(|| format!("Failed to load key file {}", cfg.key_file.display()))?;
        let client = AppStoreConnectClient::new(issuer)?;
        println!("  Token generated.\n");
        Ok(client)
    }

    fn app_id(&self) -> Result<String> {
        self.app_id
            .clone()
            .context("Missing --app-id or GCKIT_APP_ID (App Store Connect App ID)")
    }
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let pacing = Pacing::default();

    match &cli.command {
        Commands::Setup {
            dry_run,
            achievements_only,
            leaderboards_only,
            levels,
        } => {
            let catalog = Catalog::for_levels(*levels);
            if *dry_run {
                setup::print_plan(&catalog);
                return Ok(());
            }
            let opts = SetupOptions {
                app_id: cli.app_id()?,
                selection: Selection::from_flags(*achievements_only, *leaderboards_only),
                pacing,
            };
            let client = cli.client()?;
            setup::run(&client, &catalog, &opts).await?;
            println!("\nDone!");
        }
        Commands::GenerateImages { output, levels } => {
            generate_images::run(&Catalog::for_levels(*levels), output)?;
        }
        Commands::UploadImages {
            images_dir,
            dry_run,
            achievements_only,
            leaderboards_only,
        } => {
            let selection = Selection::from_flags(*achievements_only, *leaderboards_only);
            if *dry_run {
                upload_images::print_dry_run(images_dir, selection);
                return Ok(());
            }
            let opts = UploadOptions {
                app_id: cli.app_id()?,
                images_dir: images_dir.clone(),
                selection,
                pacing,
            };
            let client = cli.client()?;
            upload_images::run(&client, &opts).await;
            println!("\nDone!");
        }
        Commands::AddToReview { yes, keep_releases } => {
            let app_id = cli.app_id()?;
            let release_cleanup = release_cleanup(*yes, *keep_releases)?;
            let client = cli.client()?;
            let opts = AddToReviewOptions {
                app_id,
                release_cleanup,
                pacing,
            };
            add_to_review::run(&client, &opts).await?;
        }
        Commands::SubmitForReview {
            app_version,
            platform,
        } => {
            let opts = SubmitOptions {
                app_id: cli.app_id()?,
                version: app_version.clone(),
                platform: platform.clone(),
                pacing,
            };
            let client = cli.client()?;
            submit_for_review::run(&client, &opts).await?;
        }
        Commands::Token => {
            let cfg = Config::from_parts(
                cli.key_id.clone(),
                cli.issuer_id.clone(),
                cli.key_file.clone(),
            )?;
            let issued = cfg.issuer()?.issue()?;
            println!("{}", issued.token);
        }
    }

    Ok(())
}

/// Without `--yes` or `--keep-releases`, deletion needs an operator at a
/// terminal to confirm it.
fn release_cleanup(yes: bool, keep: bool) -> Result<ReleaseCleanup> {
    if keep {
        return Ok(ReleaseCleanup::Keep);
    }
    if yes {
        return Ok(ReleaseCleanup::Delete);
    }
    if !std::io::stdin().is_terminal() {
        bail!(
            "Cannot confirm v1 release deletion without a terminal: pass --yes to delete them or --keep-releases to leave them"
        );
    }
    let confirmed = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Delete non-live v1 Game Center releases before adding versions?")
        .default(true)
        .interact()?;
    Ok(if confirmed {
        ReleaseCleanup::Delete
    } else {
        ReleaseCleanup::Keep
    })
}
