use anyhow::{Result, bail};
use serde_json::Value;

use super::{Pacing, Tally, pause, require_detail, should_echo, spinner};
use crate::asc::AppStoreConnectClient;
use crate::gamecenter::ItemKind;
use crate::util::{is_live, resource_id, vendor_identifier};

/// Submission states that still accept new items.
pub const OPEN_SUBMISSION_STATES: [&str; 2] = ["READY_FOR_REVIEW", "WAITING_FOR_REVIEW"];

/// What to do with v1 releases, which block the v2 version flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseCleanup {
    Delete,
    Keep,
}

#[derive(Debug, Clone)]
pub struct AddToReviewOptions {
    pub app_id: String,
    pub release_cleanup: ReleaseCleanup,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddToReviewReport {
    pub submission_id: String,
    pub achievement_releases: Tally,
    pub leaderboard_releases: Tally,
    pub achievements: Tally,
    pub leaderboards: Tally,
}

pub async fn run(
    client: &AppStoreConnectClient,
    opts: &AddToReviewOptions,
) -> Result<AddToReviewReport> {
    println!("[1/7] Getting Game Center Detail...");
    let detail_id = require_detail(client, &opts.app_id).await?;
    println!("  ID: {detail_id}\n");

    println!("[2/7] Finding review submission draft...");
    let submission_id = find_submission(client, &opts.app_id).await?;
    println!("  ID: {submission_id}\n");

    println!("[3/7] Fetching achievements and leaderboards...");
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
    println!("  Leaderboards: {}\n", leaderboards.items.len());

    let mut report = AddToReviewReport {
        submission_id,
        ..Default::default()
    };

    for (step, kind, items) in [
        (4, ItemKind::Achievement, &achievements.items),
        (5, ItemKind::Leaderboard, &leaderboards.items),
    ] {
        println!("[{step}/7] Deleting old-style {} releases...", kind.label());
        let tally = match opts.release_cleanup {
            ReleaseCleanup::Delete => delete_stale_releases(client, kind, items, opts.pacing).await,
            ReleaseCleanup::Keep => {
                println!("  Skipped (releases kept)");
                Tally::default()
            }
        };
        println!("  Deleted {} {} releases\n", tally.ok, kind.label());
        match kind {
            ItemKind::Achievement => report.achievement_releases = tally,
            ItemKind::Leaderboard => report.leaderboard_releases = tally,
        }
    }

    for (step, kind, items) in [
        (6, ItemKind::Achievement, &achievements.items),
        (7, ItemKind::Leaderboard, &leaderboards.items),
    ] {
        println!("[{step}/7] Adding {} versions to review draft...", kind.label());
        let tally =
            attach_versions(client, kind, items, &report.submission_id, opts.pacing).await;
        println!("  Added: {}, Errors: {}\n", tally.ok, tally.failed);
        match kind {
            ItemKind::Achievement => report.achievements = tally,
            ItemKind::Leaderboard => report.leaderboards = tally,
        }
    }

    println!("=== Summary ===");
    println!("Achievement releases deleted: {}", report.achievement_releases.ok);
    println!("Leaderboard releases deleted: {}", report.leaderboard_releases.ok);
    println!("Achievement versions added to draft: {}", report.achievements.ok);
    println!("Leaderboard versions added to draft: {}", report.leaderboards.ok);
    println!(
        "\nDone! Check App Store Connect to verify Game Center items appear in the review submission."
    );
    Ok(report)
}

/// Prefers an open submission that already has items (the real draft),
/// falling back to the first open one.
async fn find_submission(client: &AppStoreConnectClient, app_id: &str) -> Result<String> {
    let submissions = match client
        .review_submissions(app_id, &OPEN_SUBMISSION_STATES)
        .await
    {
        Ok(subs) => subs,
        Err(e) => bail!("No active review submission found: {}", e.summary()),
    };
    let Some(first) = submissions.first() else {
        bail!("No active review submission found for app {app_id}");
    };
    for sub in &submissions {
        let id = resource_id(sub);
        if let Ok(items) = client.review_submission_items(&id).await
            && !items.is_empty()
        {
            return Ok(id);
        }
    }
    Ok(resource_id(first))
}

async fn delete_stale_releases(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    items: &[Value],
    pacing: Pacing,
) -> Tally {
    let mut tally = Tally::default();
    for item in items {
        let vendor = vendor_identifier(item);
        let releases = match client.item_releases(kind, &resource_id(item)).await {
            Ok(releases) => releases,
            Err(e) => {
                println!("  [{vendor}]: GET ERROR {}", e.summary());
                tally.failed += 1;
                continue;
            }
        };
        for release in releases.iter().filter(|r| !is_live(r)) {
            match client.delete_release(kind, &resource_id(release)).await {
                Ok(()) => {
                    tally.ok += 1;
                    if should_echo(tally.ok, 20) {
                        println!("  [{vendor}]: OK");
                    }
                }
                Err(e) => {
                    tally.failed += 1;
                    if tally.failed <= 3 {
                        println!("  [{vendor}]: ERR {}", e.summary());
                    }
                }
            }
        }
        pause(pacing.release_scan).await;
    }
    tally
}

async fn attach_versions(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    items: &[Value],
    submission_id: &str,
    pacing: Pacing,
) -> Tally {
    let mut tally = Tally::default();
    for item in items {
        let vendor = vendor_identifier(item);
        let item_id = resource_id(item);

        let existing = client
            .item_versions(kind, &item_id)
            .await
            .ok()
            .and_then(|versions| versions.first().map(resource_id));
        let version_id = match existing {
            Some(id) => id,
            None => match client.create_item_version(kind, &item_id).await {
                Ok(id) => id,
                Err(e) => {
                    tally.failed += 1;
                    if tally.failed <= 3 {
                        println!("  [{vendor}]: ERR creating version - {}", e.summary());
                    }
                    continue;
                }
            },
        };

        match client
            .add_review_submission_item(submission_id, kind, &version_id)
            .await
        {
            Ok(_) => {
                tally.ok += 1;
                if should_echo(tally.ok, 10) {
                    println!("  [{vendor}]: OK");
                }
            }
            Err(e) => {
                tally.failed += 1;
                if tally.failed <= 3 {
                    println!("  [{vendor}]: ERR {}", e.summary());
                }
            }
        }
        pause(pacing.review_item).await;
    }
    tally
}
