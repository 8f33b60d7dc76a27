//! Sprite atlas: sprite id to pixel rectangle within one sheet image.
//!
//! Sheets are uniform grids laid out column by column: each column lists its
//! sprites top to bottom, and columns run left to right. The layout can be
//! written inline (see `woody.rs`) or loaded from a JSON layout file.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Pixel rectangle within the sheet image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone)]
pub struct SpriteAtlas {
    /// Resource identifier of the backing image.
    pub image: String,
    pub cell_width: u32,
    pub cell_height: u32,
    rects: HashMap<String, SpriteRect>,
}

impl SpriteAtlas {
    /// Build from a column-major grid. Duplicate sprite ids are rejected.
    pub fn from_columns<S: AsRef<str>>(
        image: &str,
        cell_width: u32,
        cell_height: u32,
        columns: &[&[S]],
    ) -> Result<Self, String> {
        if cell_width == 0 || cell_height == 0 {
            return Err("Atlas validation failed: cell width/height must be > 0".to_string());
        }

        let mut rects = HashMap::new();
        for (col, column) in columns.iter().enumerate() {
            for (row, sprite) in column.iter().enumerate() {
                let sprite = sprite.as_ref();
                if sprite.is_empty() {
                    return Err(format!(
                        "Atlas validation failed: empty sprite id at column {}, row {}",
                        col, row
                    ));
                }
                let rect = SpriteRect {
                    x: col as u32 * cell_width,
                    y: row as u32 * cell_height,
                    w: cell_width,
                    h: cell_height,
                };
                if rects.insert(sprite.to_string(), rect).is_some() {
                    return Err(format!(
                        "Atlas validation failed: duplicate sprite_id '{}'",
                        sprite
                    ));
                }
            }
        }

        Ok(Self {
            image: image.to_string(),
            cell_width,
            cell_height,
            rects,
        })
    }

    pub fn resolve(&self, sprite_id: &str) -> Option<&SpriteRect> {
        self.rects.get(sprite_id)
    }

    pub fn contains(&self, sprite_id: &str) -> bool {
        self.rects.contains_key(sprite_id)
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Pixel size of the smallest image that holds every cell.
    pub fn sheet_size(&self) -> (u32, u32) {
        self.rects.values().fold((0, 0), |(w, h), r| {
            (w.max(r.x + r.w), h.max(r.y + r.h))
        })
    }
}

#[derive(Debug, Deserialize)]
struct AtlasLayoutFile {
    version: String,
    image: String,
    cell_width: u32,
    cell_height: u32,
    columns: Vec<Vec<String>>,
}

pub fn load_atlas_from_path(path: &Path) -> Result<SpriteAtlas, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read atlas layout {}: {e}", path.display()))?;
    let layout: AtlasLayoutFile = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse atlas layout {}: {e}", path.display()))?;
    if layout.version != "0.1" {
        return Err(format!(
            "Atlas validation failed: unsupported version '{}'",
            layout.version
        ));
    }
    if layout.image.is_empty() {
        return Err("Atlas validation failed: image is empty".to_string());
    }

    let columns: Vec<&[String]> = layout.columns.iter().map(Vec::as_slice).collect();
    SpriteAtlas::from_columns(
        &layout.image,
        layout.cell_width,
        layout.cell_height,
        &columns,
    )
}
