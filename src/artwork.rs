//! Placeholder artwork for achievements and leaderboards.
//!
//! Images are 1024×1024 notebook-paper cards. Level numbers are drawn with
//! block digits so no font file is needed.

use std::f32::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::gamecenter::{Catalog, ItemKind};

pub const SIZE: u32 = 1024;

const PAPER: Rgb<u8> = Rgb([253, 248, 232]);
// Grid and margin colors are the translucent notebook inks pre-blended onto paper.
const GRID: Rgb<u8> = Rgb([220, 229, 232]);
const MARGIN: Rgb<u8> = Rgb([246, 213, 202]);
const PENCIL: Rgb<u8> = Rgb([68, 68, 68]);
const PENCIL_LIGHT: Rgb<u8> = Rgb([119, 119, 119]);
const STAR: Rgb<u8> = Rgb([204, 180, 50]);
const STAR_OUTLINE: Rgb<u8> = Rgb([160, 140, 30]);
const GREEN: Rgb<u8> = Rgb([88, 160, 88]);
const BLUE: Rgb<u8> = Rgb([85, 119, 170]);

const GRID_SPACING: usize = 38;
const MARGIN_X: f32 = 80.0;

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("failed to create {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Design {
    LevelComplete(u32),
    AllLevels(u32),
    BestScore(u32),
}

impl Design {
    pub fn render(self) -> RgbImage {
        match self {
            Design::LevelComplete(level) => level_complete_image(level),
            Design::AllLevels(levels) => all_levels_image(levels),
            Design::BestScore(level) => best_score_image(level),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub kind: ItemKind,
    pub vendor_identifier: String,
    pub design: Design,
}

impl Artwork {
    pub fn path_in(&self, root: &Path) -> PathBuf {
        image_path(root, self.kind, &self.vendor_identifier)
    }
}

/// `<root>/<achievements|leaderboards>/<vendor>.png`
pub fn image_path(root: &Path, kind: ItemKind, vendor_identifier: &str) -> PathBuf {
    root.join(kind.image_dir())
        .join(format!("{vendor_identifier}.png"))
}

/// Achievements first, then leaderboards, each in catalog order.
pub fn catalog_artwork(catalog: &Catalog) -> Vec<Artwork> {
    let achievements = catalog.achievements.iter().map(|a| Artwork {
        kind: ItemKind::Achievement,
        vendor_identifier: a.vendor_identifier.clone(),
        design: match a.level {
            Some(level) => Design::LevelComplete(level),
            None => Design::AllLevels(catalog.levels),
        },
    });
    let leaderboards = catalog.leaderboards.iter().map(|l| Artwork {
        kind: ItemKind::Leaderboard,
        vendor_identifier: l.vendor_identifier.clone(),
        design: Design::BestScore(l.level),
    });
    achievements.chain(leaderboards).collect()
}

pub fn write_png(image: &RgbImage, path: &Path) -> Result<(), ArtworkError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ArtworkError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    image.save(path).map_err(|source| ArtworkError::Encode {
        path: path.to_path_buf(),
        source,
    })
}

pub fn level_complete_image(level: u32) -> RgbImage {
    let mut img = paper();
    star(&mut img, (160.0, 180.0), 80.0, 35.0, 5.0);
    number(&mut img, level, 512.0, 330.0, 180.0, PENCIL);
    wobbly_circle(&mut img, (512.0, 420.0), 170.0, PENCIL_LIGHT, 3, u64::from(level));
    // Check mark in place of a "Clear!" caption.
    polyline(
        &mut img,
        &[(440.0, 650.0), (495.0, 705.0), (600.0, 610.0)],
        false,
        12,
        GREEN,
    );
    for (i, x) in [300.0, 512.0, 724.0].into_iter().enumerate() {
        let (outer, inner) = if i == 1 { (35.0, 15.0) } else { (25.0, 10.0) };
        star(&mut img, (x, 800.0), outer, inner, i as f32 * 15.0);
    }
    rounded_border(&mut img, 50.0, PENCIL_LIGHT, 3);
    img
}

pub fn all_levels_image(levels: u32) -> RgbImage {
    let mut img = paper();
    for (i, (x, y)) in [(200.0, 170.0), (512.0, 140.0), (824.0, 170.0)]
        .into_iter()
        .enumerate()
    {
        star(&mut img, (x, y), 70.0, 30.0, i as f32 * 12.0 - 10.0);
    }
    trophy(&mut img, (512.0, 400.0), 2.2);
    wobbly_circle(&mut img, (512.0, 420.0), 200.0, STAR, 3, 999);
    number(&mut img, levels, 512.0, 650.0, 100.0, GREEN);
    for i in 0..5 {
        let x = 200.0 + i as f32 * 156.0;
        star(&mut img, (x, 820.0), 30.0, 13.0, i as f32 * 20.0);
    }
    rounded_border(&mut img, 50.0, STAR, 4);
    img
}

pub fn best_score_image(level: u32) -> RgbImage {
    let mut img = paper();
    number(&mut img, level, 512.0, 330.0, 180.0, PENCIL);
    wobbly_circle(
        &mut img,
        (512.0, 420.0),
        170.0,
        BLUE,
        3,
        u64::from(level) + 100,
    );
    // Podium bars in place of a "Best Score" caption.
    for (x, height) in [(412, 70u32), (482, 110), (552, 50)] {
        draw_filled_rect_mut(
            &mut img,
            Rect::at(x, 730 - height as i32).of_size(60, height),
            BLUE,
        );
    }
    rounded_border(&mut img, 50.0, BLUE, 3);
    img
}

fn paper() -> RgbImage {
    let mut img = RgbImage::from_pixel(SIZE, SIZE, PAPER);
    let edge = SIZE as f32;
    for offset in (0..SIZE as usize).step_by(GRID_SPACING) {
        let p = offset as f32;
        draw_line_segment_mut(&mut img, (0.0, p), (edge, p), GRID);
        draw_line_segment_mut(&mut img, (p, 0.0), (p, edge), GRID);
    }
    thick_line(&mut img, (MARGIN_X, 0.0), (MARGIN_X, edge), 2, MARGIN);
    img
}

fn thick_line(img: &mut RgbImage, from: (f32, f32), to: (f32, f32), width: u32, color: Rgb<u8>) {
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return;
    }
    let (nx, ny) = (-dy / len, dx / len);
    let half = (width.max(1) as f32 - 1.0) / 2.0;
    let steps = width.max(1) * 2;
    for i in 0..steps {
        let t = if steps > 1 {
            -half + i as f32 * (2.0 * half) / (steps - 1) as f32
        } else {
            0.0
        };
        draw_line_segment_mut(
            img,
            (from.0 + nx * t, from.1 + ny * t),
            (to.0 + nx * t, to.1 + ny * t),
            color,
        );
    }
}

fn polyline(img: &mut RgbImage, points: &[(f32, f32)], closed: bool, width: u32, color: Rgb<u8>) {
    for pair in points.windows(2) {
        thick_line(img, pair[0], pair[1], width, color);
    }
    if closed && points.len() > 2 {
        thick_line(img, points[points.len() - 1], points[0], width, color);
    }
}

fn arc(center: (f32, f32), radius: f32, from_deg: f32, to_deg: f32, segments: usize) -> Vec<(f32, f32)> {
    (0..=segments)
        .map(|i| {
            let deg = from_deg + (to_deg - from_deg) * i as f32 / segments as f32;
            let rad = deg * PI / 180.0;
            (center.0 + radius * rad.cos(), center.1 + radius * rad.sin())
        })
        .collect()
}

fn rounded_border(img: &mut RgbImage, radius: f32, color: Rgb<u8>, width: u32) {
    let inset = width as f32 / 2.0;
    let far = SIZE as f32 - 1.0 - inset;
    let (lo, hi) = (inset + radius, far - radius);
    let mut outline = Vec::new();
    outline.extend(arc((lo, lo), radius, 180.0, 270.0, 12));
    outline.extend(arc((hi, lo), radius, 270.0, 360.0, 12));
    outline.extend(arc((hi, hi), radius, 0.0, 90.0, 12));
    outline.extend(arc((lo, hi), radius, 90.0, 180.0, 12));
    polyline(img, &outline, true, width, color);
}

fn star(img: &mut RgbImage, center: (f32, f32), outer: f32, inner: f32, rotation_deg: f32) {
    let points: Vec<(f32, f32)> = (0..10)
        .map(|i| {
            let rad = (rotation_deg + i as f32 * 36.0 - 90.0) * PI / 180.0;
            let r = if i % 2 == 0 { outer } else { inner };
            (center.0 + r * rad.cos(), center.1 + r * rad.sin())
        })
        .collect();
    fill_polygon(img, &points, STAR);
    polyline(img, &points, true, 2, STAR_OUTLINE);
}

fn fill_polygon(img: &mut RgbImage, points: &[(f32, f32)], color: Rgb<u8>) {
    let mut poly: Vec<Point<i32>> = points
        .iter()
        .map(|(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    poly.dedup();
    // imageproc rejects polygons whose first and last points coincide.
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    if poly.len() >= 3 {
        draw_polygon_mut(img, &poly, color);
    }
}

fn wobbly_circle(
    img: &mut RgbImage,
    center: (f32, f32),
    radius: f32,
    color: Rgb<u8>,
    width: u32,
    seed: u64,
) {
    let mut rng = StdRng::seed_from_u64(seed);
    let wobble = radius * 0.04;
    let segments = 36;
    let points: Vec<(f32, f32)> = (0..segments)
        .map(|i| {
            let angle = i as f32 / segments as f32 * 2.0 * PI;
            let r = radius + rng.gen_range(-wobble..wobble);
            (center.0 + r * angle.cos(), center.1 + r * angle.sin())
        })
        .collect();
    polyline(img, &points, true, width, color);
}

fn trophy(img: &mut RgbImage, center: (f32, f32), scale: f32) {
    let (cx, cy, s) = (center.0, center.1, scale);
    fill_polygon(
        img,
        &[
            (cx - 50.0 * s, cy - 40.0 * s),
            (cx + 50.0 * s, cy - 40.0 * s),
            (cx + 35.0 * s, cy + 30.0 * s),
            (cx - 35.0 * s, cy + 30.0 * s),
        ],
        STAR,
    );
    let rect = |x: f32, y: f32, w: f32, h: f32| {
        Rect::at(x.round() as i32, y.round() as i32).of_size(w.round() as u32, h.round() as u32)
    };
    draw_filled_rect_mut(img, rect(cx - 10.0 * s, cy + 30.0 * s, 20.0 * s, 30.0 * s), STAR);
    draw_filled_rect_mut(img, rect(cx - 30.0 * s, cy + 55.0 * s, 60.0 * s, 15.0 * s), STAR);
    let handle_width = (4.0 * s).round() as u32;
    let left = arc((cx - 50.0 * s, cy - 5.0 * s), 22.0 * s, 90.0, 270.0, 16);
    let right = arc((cx + 50.0 * s, cy - 5.0 * s), 22.0 * s, -90.0, 90.0, 16);
    polyline(img, &left, false, handle_width, STAR_OUTLINE);
    polyline(img, &right, false, handle_width, STAR_OUTLINE);
}

// Seven-segment masks, bit 0 = top segment, then clockwise, bit 6 = middle.
const SEGMENTS: [u8; 10] = [63, 6, 91, 79, 102, 109, 125, 7, 127, 111];

fn number(img: &mut RgbImage, value: u32, center_x: f32, top: f32, height: f32, color: Rgb<u8>) {
    let digits: Vec<u32> = value
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    let width = height / 2.0;
    let stroke = (height / 7.0).max(1.0);
    let gap = stroke;
    let total = digits.len() as f32 * width + (digits.len().saturating_sub(1)) as f32 * gap;
    let mut x = center_x - total / 2.0;
    for d in digits {
        digit(img, d as usize, (x, top), (width, height), stroke, color);
        x += width + gap;
    }
}

fn digit(img: &mut RgbImage, d: usize, origin: (f32, f32), size: (f32, f32), t: f32, color: Rgb<u8>) {
    let (x, y) = origin;
    let (w, h) = size;
    let half = h / 2.0;
    let bars = [
        (x, y, w, t),
        (x + w - t, y, t, half),
        (x + w - t, y + half, t, half),
        (x, y + h - t, w, t),
        (x, y + half, t, half),
        (x, y, t, half),
        (x, y + half - t / 2.0, w, t),
    ];
    let mask = SEGMENTS[d % 10];
    for (bit, (bx, by, bw, bh)) in bars.into_iter().enumerate() {
        if mask & (1 << bit) != 0 {
            draw_filled_rect_mut(
                img,
                Rect::at(bx.round() as i32, by.round() as i32)
                    .of_size(bw.round().max(1.0) as u32, bh.round().max(1.0) as u32),
                color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_artwork_covers_every_item() {
        let catalog = Catalog::for_levels(4);
        let art = catalog_artwork(&catalog);
        assert_eq!(art.len(), 9);
        assert_eq!(art[4].design, Design::AllLevels(4));
        assert_eq!(art[5].kind, ItemKind::Leaderboard);
        assert_eq!(art[5].design, Design::BestScore(1));
    }

    #[test]
    fn image_path_uses_kind_directory() {
        let p = image_path(Path::new("out"), ItemKind::Leaderboard, "level_3_score");
        assert_eq!(p, Path::new("out/leaderboards/level_3_score.png"));
    }

    #[test]
    fn digits_land_on_the_card() {
        let img = level_complete_image(7);
        assert_eq!(img.dimensions(), (SIZE, SIZE));
        // Top bar of the 7 sits just below y=330 at the card's center.
        assert_eq!(*img.get_pixel(512, 335), PENCIL);
        assert_eq!(*img.get_pixel(1000, 500), PAPER);
    }

    #[test]
    fn wobble_is_deterministic_per_seed() {
        assert_eq!(best_score_image(12), best_score_image(12));
        assert_ne!(best_score_image(12), best_score_image(13));
    }
}
