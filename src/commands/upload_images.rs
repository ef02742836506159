use std::fs;
use std::path::{Path, PathBuf};

use super::{Pacing, Selection, Tally, pause};
use crate::artwork::image_path;
use crate::asc::AppStoreConnectClient;
use crate::gamecenter::ItemKind;
use crate::upload::{self, UploadedImage};
use crate::util::{attribute_str, resource_id, resource_name, vendor_identifier};

#[derive(Debug, Clone)]
pub struct UploadOptions {
    pub app_id: String,
    pub images_dir: PathBuf,
    pub selection: Selection,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub achievements: Option<Tally>,
    pub leaderboards: Option<Tally>,
}

/// Lists the PNG files an upload would use, without touching the network.
pub fn print_dry_run(images_dir: &Path, selection: Selection) {
    println!("DRY RUN - listing image files");
    for kind in ItemKind::ALL.into_iter().filter(|k| selection.includes(*k)) {
        let dir = images_dir.join(kind.image_dir());
        println!("\n{} images ({}):", capitalize(kind.label()), dir.display());
        let files = png_files(&dir);
        if files.is_empty() {
            println!("  (no PNG files found)");
        }
        for (name, size) in files {
            println!("  {name:40}  {size:>8} bytes");
        }
    }
}

fn png_files(dir: &Path) -> Vec<(String, u64)> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<(String, u64)> = entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            if !name.ends_with(".png") {
                return None;
            }
            let size = e.metadata().ok()?.len();
            Some((name, size))
        })
        .collect();
    files.sort();
    files
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub async fn run(client: &AppStoreConnectClient, opts: &UploadOptions) -> UploadReport {
    let kinds: Vec<ItemKind> = ItemKind::ALL
        .into_iter()
        .filter(|k| opts.selection.includes(*k))
        .collect();
    let mut report = UploadReport::default();
    for (step, kind) in kinds.iter().enumerate() {
        println!(
            "\n[{}/{}] Uploading {} images...",
            step + 1,
            kinds.len(),
            kind.label()
        );
        let Some(tally) = upload_kind(client, *kind, opts).await else {
            continue;
        };
        println!(
            "\n  {} images: {} uploaded, {} skipped, {} failed",
            capitalize(kind.label()),
            tally.ok,
            tally.skipped,
            tally.failed
        );
        match kind {
            ItemKind::Achievement => report.achievements = Some(tally),
            ItemKind::Leaderboard => report.leaderboards = Some(tally),
        }
    }
    report
}

/// `None` when the Game Center detail could not be resolved.
async fn upload_kind(
    client: &AppStoreConnectClient,
    kind: ItemKind,
    opts: &UploadOptions,
) -> Option<Tally> {
    let detail_id = match client.game_center_detail_id(&opts.app_id).await {
        Ok(Some(id)) => id,
        Ok(None) => {
            println!("  ERROR: Could not find Game Center Detail");
            return None;
        }
        Err(e) => {
            println!("  ERROR: Could not find Game Center Detail ({})", e.summary());
            return None;
        }
    };
    println!("  Game Center Detail: {detail_id}");

    let listing = client.list_items(kind, &detail_id).await;
    if let Some(e) = &listing.error {
        println!("    GET ERROR {}", e.summary());
    }
    println!("  Found {} {}", listing.items.len(), kind.plural());

    let mut tally = Tally::default();
    for item in &listing.items {
        let vendor = vendor_identifier(item);
        let path = image_path(&opts.images_dir, kind, &vendor);
        if !path.exists() {
            println!(
                "  [{vendor}] No image file found at {}, skipping",
                path.display()
            );
            tally.skipped += 1;
            continue;
        }

        let locs = client.list_localizations(kind, &resource_id(item)).await;
        if let Some(e) = &locs.error {
            println!("    GET ERROR {}", e.summary());
        }
        let Some(loc) = locs.items.first() else {
            println!("  [{vendor}] No localizations found, skipping");
            tally.skipped += 1;
            continue;
        };
        let loc_id = resource_id(loc);
        println!(
            "  [{vendor}] {} (loc: {}, id: {loc_id})",
            resource_name(item),
            attribute_str(loc, "locale").unwrap_or("?")
        );

        match upload::remove_existing_image(client, kind, &loc_id).await {
            Ok(Some(old)) => println!("    Deleted existing image {old}"),
            Ok(None) => {}
            Err(e) => println!("    Deleting existing image FAILED: {}", e.summary()),
        }
        pause(opts.pacing.create).await;

        match upload::upload_image(client, kind, &loc_id, &path).await {
            Ok(UploadedImage {
                file_name,
                bytes,
                operations,
                state,
                ..
            }) => {
                println!("    Uploaded {file_name} ({bytes} bytes, {operations} ops) OK (state: {state})");
                tally.ok += 1;
            }
            Err(e) => {
                println!("    {}: {e}", e.stage());
                tally.failed += 1;
            }
        }
        pause(opts.pacing.upload).await;
    }
    Some(tally)
}
