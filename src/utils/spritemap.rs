//! Icon spritemap
//!
//! Packs the coin icons of `icons/*.png` into one PNG grid and writes the
//! per-icon coordinates plus a report of icons and coins left unmatched.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::models::errors::{AppError, AppResult, ErrorCode};
use crate::providers::output::write_json;
use crate::utils::constants::{
    ICON_NAME_SUFFIXES, ICON_SIZE, SPRITEMAP_ASPECT_RATIO, SPRITEMAP_IMAGE_FILE,
    SPRITEMAP_JSON_FILE, SPRITEMAP_UNMATCHED_FILE,
};

/// Lowercase a coin name and strip its protocol suffix. When the name has a
/// `-` or `_` separator and the part before it is no longer than the
/// stripped name, that first part is used instead.
pub fn normalize_coin_name(name: &str) -> String {
    let lower = name.to_lowercase();

    let stripped = ICON_NAME_SUFFIXES
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(&lower);

    for separator in ['-', '_'] {
        if let Some((first, _)) = lower.split_once(separator) {
            if first.len() <= stripped.len() {
                return first.to_string();
            }
        }
    }
    stripped.to_string()
}

// ============================================
// ICON MATCHING
// ============================================

/// Names an icon file may be matched by
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IconIndex {
    pub tickers: BTreeSet<String>,
    pub names: BTreeSet<String>,
    pub fnames: BTreeSet<String>,
    /// Lowercase icon name -> coin ticker
    pub owners: BTreeMap<String, String>,
}

impl IconIndex {
    /// Index the raw entries of the `coins` file
    pub fn from_coins(coins: &[Value]) -> Self {
        let mut index = Self::default();
        for entry in coins {
            let Some(ticker) = entry.get("coin").and_then(Value::as_str) else {
                continue;
            };
            Self::add(&mut index.tickers, &mut index.owners, ticker, ticker);
            if let Some(name) = entry.get("name").and_then(Value::as_str) {
                Self::add(&mut index.names, &mut index.owners, name, ticker);
            }
            if let Some(fname) = entry.get("fname").and_then(Value::as_str) {
                Self::add(&mut index.fnames, &mut index.owners, fname, ticker);
            }
        }
        index
    }

    fn add(set: &mut BTreeSet<String>, owners: &mut BTreeMap<String, String>, value: &str, ticker: &str) {
        let lower = value.to_lowercase();
        let normalized = normalize_coin_name(value);
        if normalized != lower {
            set.insert(normalized.clone());
            owners.insert(normalized, ticker.to_string());
        }
        set.insert(lower.clone());
        owners.insert(lower, ticker.to_string());
    }

    pub fn matches(&self, icon_name: &str) -> bool {
        self.tickers.contains(icon_name) || self.names.contains(icon_name) || self.fnames.contains(icon_name)
    }
}

/// Icons and coin names that found no counterpart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnmatchedReport {
    pub icons_not_included: Vec<String>,
    pub coin_values_without_direct_icons_match: Vec<String>,
    pub names_without_direct_icons_match: Vec<String>,
    pub fnames_without_direct_icons_match: Vec<String>,
}

fn icon_stem(file: &str) -> &str {
    file.strip_suffix(".png").unwrap_or(file)
}

/// Split the available icon files into matched ones (sorted) and a report
pub fn match_icons(index: &IconIndex, available: &BTreeSet<String>) -> (Vec<String>, UnmatchedReport) {
    let matched: Vec<String> = available
        .iter()
        .filter(|file| index.matches(&icon_stem(file).to_lowercase()))
        .cloned()
        .collect();
    let included: BTreeSet<String> = matched.iter().map(|f| icon_stem(f).to_lowercase()).collect();

    let missing = |set: &BTreeSet<String>| -> Vec<String> {
        set.iter().filter(|v| !included.contains(*v)).cloned().collect()
    };
    let report = UnmatchedReport {
        icons_not_included: available
            .iter()
            .filter(|file| !included.contains(&icon_stem(file).to_lowercase()))
            .cloned()
            .collect(),
        coin_values_without_direct_icons_match: missing(&index.tickers),
        names_without_direct_icons_match: missing(&index.names),
        fnames_without_direct_icons_match: missing(&index.fnames),
    };
    (matched, report)
}

// ============================================
// LAYOUT
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub cols: u32,
    pub rows: u32,
    pub width: u32,
    pub height: u32,
}

/// Grid for `count` square cells with roughly `aspect_ratio` width/height
pub fn grid_layout(count: usize, icon_size: u32, aspect_ratio: f64) -> GridLayout {
    let cell = icon_size as f64;
    let total_area = count as f64 * cell * cell;
    let ideal_width = (total_area * aspect_ratio).sqrt();
    let cols = ((ideal_width / cell).ceil() as u32).max(1);
    let rows = (count as u32).div_ceil(cols);
    GridLayout {
        cols,
        rows,
        width: cols * icon_size,
        height: rows * icon_size,
    }
}

/// Scale an icon down to fit the cell without stretching and center it on
/// a transparent square
pub fn fit_icon(icon: RgbaImage, size: u32) -> RgbaImage {
    let (width, height) = icon.dimensions();
    if width == size && height == size {
        return icon;
    }

    let ratio = width as f64 / height.max(1) as f64;
    let (new_width, new_height) = if ratio > 1.0 {
        let w = width.min(size);
        (w, ((w as f64 / ratio) as u32).max(1))
    } else {
        let h = height.min(size);
        (((h as f64 * ratio) as u32).max(1), h)
    };

    let icon = if (new_width, new_height) != (width, height) {
        imageops::resize(&icon, new_width, new_height, FilterType::Lanczos3)
    } else {
        icon
    };

    let mut canvas = RgbaImage::from_pixel(size, size, Rgba([0, 0, 0, 0]));
    let x = (size - new_width) / 2;
    let y = (size - new_height) / 2;
    imageops::overlay(&mut canvas, &icon, x as i64, y as i64);
    canvas
}

// ============================================
// SPRITEMAP
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpriteCoords {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpritemapMetadata {
    pub icon_size: u32,
    pub grid_cols: u32,
    pub grid_rows: u32,
    pub total_icons: usize,
    pub spritemap_width: u32,
    pub spritemap_height: u32,
    pub generated_at: i64,
}

/// Content of `spritemap.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpritemapIndex {
    pub metadata: SpritemapMetadata,
    pub coordinates: BTreeMap<String, SpriteCoords>,
}

fn image_error(path: &Path, e: image::ImageError) -> AppError {
    AppError::with_source(
        ErrorCode::OutputImageFailed,
        format!("Image error on {}", path.display()),
        e,
    )
}

fn list_icons(icons_dir: &Path) -> AppResult<BTreeSet<String>> {
    let entries = match fs::read_dir(icons_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("⚠️ Icons directory {} not found", icons_dir.display());
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut icons = BTreeSet::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        if name.ends_with(".png") && name != SPRITEMAP_IMAGE_FILE {
            icons.insert(name);
        }
    }
    Ok(icons)
}

/// Build the spritemap for the coins of the registry.
/// Returns `None` when no icon matches a coin.
pub fn generate_spritemap(
    icons_dir: &Path,
    output_dir: &Path,
    coins: &[Value],
    now: i64,
) -> AppResult<Option<SpritemapIndex>> {
    let index = IconIndex::from_coins(coins);
    let available = list_icons(icons_dir)?;
    let (icons, report) = match_icons(&index, &available);

    info!(
        "🖼️ Icons: {} available, {} matched, {} not included",
        available.len(),
        icons.len(),
        report.icons_not_included.len()
    );
    info!(
        "   Without icon: {} tickers, {} names, {} fnames",
        report.coin_values_without_direct_icons_match.len(),
        report.names_without_direct_icons_match.len(),
        report.fnames_without_direct_icons_match.len()
    );
    write_json(&output_dir.join(SPRITEMAP_UNMATCHED_FILE), &report)?;

    if icons.is_empty() {
        info!("No icons found for valid coins to generate a spritemap");
        return Ok(None);
    }

    let layout = grid_layout(icons.len(), ICON_SIZE, SPRITEMAP_ASPECT_RATIO);
    info!(
        "Spritemap dimensions: {}x{} ({}x{} grid)",
        layout.width, layout.height, layout.cols, layout.rows
    );

    let mut sheet = RgbaImage::from_pixel(layout.width, layout.height, Rgba([0, 0, 0, 0]));
    let mut coordinates = BTreeMap::new();
    let mut failed = Vec::new();

    for (i, file) in icons.iter().enumerate() {
        let path = icons_dir.join(file);
        let icon = match image::open(&path) {
            Ok(icon) => fit_icon(icon.to_rgba8(), ICON_SIZE),
            Err(e) => {
                warn!("⚠️ Failed to process icon {}: {}", file, e);
                failed.push(file.as_str());
                continue;
            }
        };

        let i = i as u32;
        let x = (i % layout.cols) * ICON_SIZE;
        let y = (i / layout.cols) * ICON_SIZE;
        imageops::overlay(&mut sheet, &icon, x as i64, y as i64);
        coordinates.insert(
            icon_stem(file).to_string(),
            SpriteCoords {
                x,
                y,
                width: ICON_SIZE,
                height: ICON_SIZE,
            },
        );
    }
    if !failed.is_empty() {
        warn!("⚠️ Failed to process {} icons: {:?}", failed.len(), failed);
    }

    let image_path = output_dir.join(SPRITEMAP_IMAGE_FILE);
    if let Some(parent) = image_path.parent() {
        fs::create_dir_all(parent)?;
    }
    sheet.save(&image_path).map_err(|e| image_error(&image_path, e))?;
    info!("💾 Generated spritemap at {}", image_path.display());

    let spritemap = SpritemapIndex {
        metadata: SpritemapMetadata {
            icon_size: ICON_SIZE,
            grid_cols: layout.cols,
            grid_rows: layout.rows,
            total_icons: coordinates.len(),
            spritemap_width: layout.width,
            spritemap_height: layout.height,
            generated_at: now,
        },
        coordinates,
    };
    write_json(&output_dir.join(SPRITEMAP_JSON_FILE), &spritemap)?;
    Ok(Some(spritemap))
}
