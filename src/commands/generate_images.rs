use std::path::Path;

use crate::artwork::{self, ArtworkError};
use crate::gamecenter::{Catalog, ItemKind};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateReport {
    pub achievements: usize,
    pub leaderboards: usize,
}

impl GenerateReport {
    pub fn total(&self) -> usize {
        self.achievements + self.leaderboards
    }
}

/// Renders a PNG for every catalog item under `output`.
pub fn run(catalog: &Catalog, output: &Path) -> Result<GenerateReport, ArtworkError> {
    println!("Generating Game Center images...");
    println!("  Output: {}", output.display());

    let mut report = GenerateReport::default();
    let mut current: Option<ItemKind> = None;
    for art in artwork::catalog_artwork(catalog) {
        if current != Some(art.kind) {
            let count = match art.kind {
                ItemKind::Achievement => catalog.achievements.len(),
                ItemKind::Leaderboard => catalog.leaderboards.len(),
            };
            println!("\nGenerating {} {} images...", count, art.kind.label());
            current = Some(art.kind);
        }
        let path = art.path_in(output);
        artwork::write_png(&art.design.render(), &path)?;
        println!("  {}.png", art.vendor_identifier);
        match art.kind {
            ItemKind::Achievement => report.achievements += 1,
            ItemKind::Leaderboard => report.leaderboards += 1,
        }
    }

    println!("\nDone! Generated {} images.", report.total());
    for kind in ItemKind::ALL {
        let count = match kind {
            ItemKind::Achievement => report.achievements,
            ItemKind::Leaderboard => report.leaderboards,
        };
        println!(
            "  {}: {} ({} files)",
            kind.plural(),
            output.join(kind.image_dir()).display(),
            count
        );
    }
    Ok(report)
}
