//! Team graphic data.
//!
//! The banner shown by the monitor is uploaded as 8x8 XPM tiles, one
//! `(team_graphic (x y ...))` command per tile. This module slices a full
//! XPM image into tiles and tracks which tiles the server has acknowledged.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{CoachError, Result};

/// Tile edge length in pixels.
pub const TILE_SIZE: usize = 8;

/// Maximum banner size accepted by the server, in pixels.
pub const MAX_WIDTH: usize = 256;
pub const MAX_HEIGHT: usize = 64;

/// An XPM banner split into 8x8 tiles, keyed by `(x, y)` tile coordinates.
#[derive(Debug, Clone, Default)]
pub struct TeamGraphic {
    tiles: BTreeMap<(i32, i32), Vec<String>>,
    acked: BTreeSet<(i32, i32)>,
}

impl TeamGraphic {
    /// Build from XPM source text.
    ///
    /// Only single-character color keys are supported and the image size
    /// must be a multiple of the tile size within the server limits.
    pub fn from_xpm(source: &str) -> Result<Self> {
        let strings: Vec<&str> = extract_quoted(source);
        let mut it = strings.iter();

        let header = it.next().ok_or_else(|| bad_xpm("missing header"))?;
        let mut fields = header.split_whitespace();
        let width: usize = next_field(&mut fields, "width")?;
        let height: usize = next_field(&mut fields, "height")?;
        let n_colors: usize = next_field(&mut fields, "color count")?;
        let cpp: usize = next_field(&mut fields, "chars per pixel")?;

        if cpp != 1 {
            return Err(bad_xpm("chars-per-pixel must be 1"));
        }
        if width == 0 || height == 0 || width > MAX_WIDTH || height > MAX_HEIGHT {
            return Err(bad_xpm("image size out of range"));
        }
        if width % TILE_SIZE != 0 || height % TILE_SIZE != 0 {
            return Err(bad_xpm("image size is not a multiple of the tile size"));
        }

        let colors: Vec<String> = it.by_ref().take(n_colors).map(|s| s.to_string()).collect();
        if colors.len() != n_colors {
            return Err(bad_xpm("truncated color table"));
        }

        let rows: Vec<&str> = it.copied().collect();
        if rows.len() != height || rows.iter().any(|r| r.len() != width) {
            return Err(bad_xpm("pixel rows do not match the declared size"));
        }
        // tile slicing indexes by byte, so every pixel must be one byte wide
        if rows.iter().any(|r| !r.is_ascii()) {
            return Err(bad_xpm("pixel rows must be plain ascii"));
        }

        let mut tiles = BTreeMap::new();
        for ty in 0..height / TILE_SIZE {
            for tx in 0..width / TILE_SIZE {
                let mut tile = Vec::with_capacity(1 + n_colors + TILE_SIZE);
                tile.push(format!("{} {} {} 1", TILE_SIZE, TILE_SIZE, n_colors));
                tile.extend(colors.iter().cloned());
                for row in rows.iter().skip(ty * TILE_SIZE).take(TILE_SIZE) {
                    tile.push(row[tx * TILE_SIZE..(tx + 1) * TILE_SIZE].to_string());
                }
                tiles.insert((tx as i32, ty as i32), tile);
            }
        }

        Ok(Self { tiles, acked: BTreeSet::new() })
    }

    pub fn tile(&self, x: i32, y: i32) -> Option<&Vec<String>> {
        self.tiles.get(&(x, y))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Tiles not yet acknowledged by the server, in deterministic order.
    pub fn unacked(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.tiles.keys().copied().filter(move |idx| !self.acked.contains(idx))
    }

    pub fn mark_acked(&mut self, x: i32, y: i32) {
        self.acked.insert((x, y));
    }

    pub fn is_complete(&self) -> bool {
        !self.tiles.is_empty() && self.acked.len() == self.tiles.len()
    }
}

fn bad_xpm(why: &str) -> CoachError {
    CoachError::Resource(format!("team graphic xpm: {}", why))
}

fn next_field(fields: &mut std::str::SplitWhitespace<'_>, what: &str) -> Result<usize> {
    fields
        .next()
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| bad_xpm(&format!("unreadable {}", what)))
}

/// All double-quoted strings in the XPM source, in order.
fn extract_quoted(source: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = source;
    while let Some(start) = rest.find('"') {
        let seg = &rest[start + 1..];
        let Some(end) = seg.find('"') else { break };
        out.push(&seg[..end]);
        rest = &seg[end + 1..];
    }
    out
}
