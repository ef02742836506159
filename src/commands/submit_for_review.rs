use anyhow::{Result, bail};

use super::{Pacing, Tally, pause, require_detail, spinner};
use crate::asc::AppStoreConnectClient;
use crate::gamecenter::ItemKind;
use crate::util::{attribute_str, resource_id, vendor_identifier};

pub const DEFAULT_PLATFORM: &str = "IOS";

#[derive(Debug, Clone)]
pub struct SubmitOptions {
    pub app_id: String,
    pub version: String,
    pub platform: String,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// One release request covering the whole Game Center detail.
    Requested(String),
    /// Fallback: one v1 release per item.
    PerItem {
        achievements: Tally,
        leaderboards: Tally,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReport {
    pub detail_id: String,
    pub app_store_version_id: String,
    pub version_state: String,
    pub game_center_app_version: Option<String>,
    pub release: ReleaseOutcome,
}

pub async fn run(client: &AppStoreConnectClient, opts: &SubmitOptions) -> Result<SubmitReport> {
    println!("[1/5] Getting Game Center Detail...");
    let detail_id = require_detail(client, &opts.app_id).await?;
    println!("  ID: {detail_id}\n");

    println!("[2/5] Fetching achievements and leaderboards...");
    let pb = spinner("Loading Game Center items...");
    let achievements = client.list_items(ItemKind::Achievement, &detail_id).await;
    let leaderboards = client.list_items(ItemKind::Leaderboard, &detail_id).await;
    pb.finish_and_clear();
    for listing in [&achievements, &leaderboards] {
        if let Some(e) = &listing.error {
            println!("  GET ERROR {}", e.summary());
        }
    }
    println!("  Achievements: {}", achievements.items.len());
    println!("  Leaderboards: {}", leaderboards.items.len());
    println!(
        "  Total: {}\n",
        achievements.items.len() + leaderboards.items.len()
    );

    println!("[3/5] Finding app store version {}...", opts.version);
    let versions = match client
        .app_store_versions(&opts.app_id, &opts.version, &opts.platform)
        .await
    {
        Ok(versions) => versions,
        Err(e) => bail!("Version {} not found: {}", opts.version, e.summary()),
    };
    let Some(version) = versions.first() else {
        bail!("Version {} not found for platform {}", opts.version, opts.platform);
    };
    let app_store_version_id = resource_id(version);
    let version_state = attribute_str(version, "appStoreState")
        .unwrap_or("UNKNOWN")
        .to_string();
    println!("  ID: {app_store_version_id}");
    println!("  State: {version_state}\n");

    println!("[4/5] Enabling Game Center for this app version...");
    let game_center_app_version = match client
        .create_game_center_app_version(&app_store_version_id)
        .await
    {
        Ok(id) => {
            println!("  Created gameCenterAppVersion: {id}\n");
            Some(id)
        }
        Err(create_err) => match client
            .game_center_app_version_id(&app_store_version_id)
            .await
        {
            Ok(Some(id)) => {
                println!("  Already exists: {id}\n");
                Some(id)
            }
            _ => {
                println!(
                    "  WARNING: Could not create or find gameCenterAppVersion ({})\n",
                    create_err.summary()
                );
                None
            }
        },
    };

    println!("[5/5] Creating Game Center Release...");
    let release = match client.create_detail_release_request(&detail_id).await {
        Ok(id) => {
            println!("  Created release request: {id}");
            ReleaseOutcome::Requested(id)
        }
        Err(e) => {
            println!("  Release request failed ({}), trying per-item releases...", e.summary());
            let achievements = release_each(
                client,
                ItemKind::Achievement,
                &detail_id,
                &achievements.items,
                opts.pacing,
            )
            .await;
            let leaderboards = release_each(
                client,
                ItemKind::Leaderboard,
                &detail_id,
                &leaderboards.items,
                opts.pacing,
            )
            .await;
            ReleaseOutcome::PerItem {
                achievements,
                leaderboards,
            }
        }
    };

    println!(
        "\nDone! Game Center items are now attached to version {}",
        opts.version
    );
    println!("Submit the version for review in App Store Connect to include them.");

    Ok(SubmitReport {
        detail_id,
        app_store_version_id,
        version_state,
        game_center_app_version,
        release,
    })
}

async fn release_each(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    detail_id: &str,
    items: &[serde_json::Value],
    pacing: Pacing,
) -> Tally {
    let mut tally = Tally::default();
    let label = match kind {
        ItemKind::Achievement => "Achievement",
        ItemKind::Leaderboard => "Leaderboard",
    };
    for item in items {
        let vendor = vendor_identifier(item);
        match client
            .create_item_release(kind, detail_id, &resource_id(item))
            .await
        {
            Ok(_) => {
                println!("  {label} [{vendor}]: OK");
                tally.ok += 1;
            }
            Err(e) => {
                println!("  {label} [{vendor}]: FAILED ({})", e.summary());
                tally.failed += 1;
            }
        }
        pause(pacing.create).await;
    }
    tally
}
