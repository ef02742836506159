use anyhow::{Result, bail};

use super::{Pacing, Selection, Tally, pause, progress};
use crate::asc::AppStoreConnectClient;
use crate::gamecenter::Catalog;

#[derive(Debug, Clone)]
pub struct SetupOptions {
    pub app_id: String,
    pub selection: Selection,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    pub detail_id: String,
    pub leaderboards: Tally,
    pub achievements: Tally,
    /// Items created whose `en-US` localization could not be added.
    pub localization_failures: usize,
}

/// Prints what `run` would create. Makes no network calls.
pub fn print_plan(catalog: &Catalog) {
    println!("DRY RUN - No API calls will be made\n");
    println!("Leaderboards to create:");
    for lb in &catalog.leaderboards {
        println!("  {:30}  {}", lb.vendor_identifier, lb.reference_name);
    }
    println!("\nAchievements to create:");
    for ach in &catalog.achievements {
        println!(
            "  {:30}  {}  ({} pts)",
            ach.vendor_identifier, ach.reference_name, ach.points
        );
    }
    print_summary(catalog);
}

pub fn print_summary(catalog: &Catalog) {
    println!("\n[4/4] Summary");
    println!("{}", "=".repeat(60));
    println!("  Score leaderboards: {}", catalog.leaderboards.len());
    println!("  Achievements:       {}", catalog.achievements.len());
    println!("  Total:              {}", catalog.total_items());
    println!("  Achievement points: {}", catalog.total_points());
    println!("{}", "=".repeat(60));
    println!();
    println!("Next steps:");
    println!("  1. Verify in App Store Connect > Game Center");
    println!("  2. Generate and upload images (gckit generate-images, gckit upload-images)");
    println!("  3. Attach the items to a review (gckit add-to-review)");
    println!("  4. Test with TestFlight sandbox before going live");
}

pub async fn run(
    client: &AppStoreConnectClient,
    catalog: &Catalog,
    opts: &SetupOptions,
) -> Result<SetupReport> {
    let detail_id = get_or_create_detail(client, &opts.app_id).await?;
    let mut report = SetupReport {
        detail_id,
        ..Default::default()
    };

    if opts.selection.leaderboards {
        println!(
            "\n[2/4] Creating {} leaderboards...",
            catalog.leaderboards.len()
        );
        for lb in &catalog.leaderboards {
            progress(&format!("  Creating: {}... ", lb.reference_name));
            match client.create_leaderboard(&report.detail_id, lb).await {
                Ok(id) => {
                    println!("OK (id: {id})");
                    report.leaderboards.ok += 1;
                    if let Err(e) = client.create_leaderboard_localization(&id, lb).await {
                        println!("    localization FAILED: {}", e.summary());
                        report.localization_failures += 1;
                    }
                }
                Err(e) => {
                    println!("FAILED");
                    println!("  ERROR {}", e.summary());
                    report.leaderboards.failed += 1;
                }
            }
            pause(opts.pacing.create).await;
        }
    }

    if opts.selection.achievements {
        println!(
            "\n[3/4] Creating {} achievements...",
            catalog.achievements.len()
        );
        for ach in &catalog.achievements {
            progress(&format!("  Creating: {}... ", ach.reference_name));
            match client.create_achievement(&report.detail_id, ach).await {
                Ok(id) => {
                    println!("OK (id: {id})");
                    report.achievements.ok += 1;
                    if let Err(e) = client
                        .create_achievement_localization(&id, &ach.localization)
                        .await
                    {
                        println!("    localization FAILED: {}", e.summary());
                        report.localization_failures += 1;
                    }
                }
                Err(e) => {
                    println!("FAILED");
                    println!("  ERROR {}", e.summary());
                    report.achievements.failed += 1;
                }
            }
            pause(opts.pacing.create).await;
        }
    }

    print_summary(catalog);
    Ok(report)
}

async fn get_or_create_detail(client: &AppStoreConnectClient, app_id: &str) -> Result<String> {
    println!("\n[1/4] Getting Game Center Detail...");
    match client.game_center_detail_id(app_id).await {
        Ok(Some(id)) => {
            println!("  Found existing Game Center Detail: {id}");
            return Ok(id);
        }
        Ok(None) => {}
        Err(e) => println!("  ERROR {}", e.summary()),
    }

    println!("  Creating new Game Center Detail...");
    match client.create_game_center_detail(app_id).await {
        Ok(id) => {
            println!("  Created Game Center Detail: {id}");
            Ok(id)
        }
        Err(e) => {
            println!("  ERROR {}", e.summary());
            bail!("Failed to get or create a Game Center Detail for app {app_id}")
        }
    }
}
