//! Stage rendering
//!
//! Rasterises the bead stage with tiny-skia: the base grid on the left, a
//! dividing wall, and the binary columns on the right. Layout calculation
//! is kept apart from drawing so geometry can be tested without pixels.

use std::path::{Path, PathBuf};

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Rect as SkiaRect, Stroke, Transform};

use crate::app::session::AbacusSession;
use crate::config::StageConfig;
use crate::domain::columns::BinaryColumnStore;
use crate::domain::core::BaseRow;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create pixmap for rendering")]
    PixmapCreationFailed,

    #[error("Invalid stage dimensions: {width}x{height}")]
    InvalidStageDimensions { width: u32, height: u32 },

    #[error("Failed to write {}: {message}", .path.display())]
    SaveFailed { path: PathBuf, message: String },
}

/// One square cell of the stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub filled: bool,
}

impl Cell {
    fn rect(&self) -> Option<SkiaRect> {
        SkiaRect::from_xywh(self.x, self.y, self.size, self.size)
    }

    /// Pixel at the middle of the cell
    pub fn center(&self) -> (u32, u32) {
        ((self.x + self.size / 2.0) as u32, (self.y + self.size / 2.0) as u32)
    }
}

/// Vertical line between the base grid and the binary columns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
}

/// Pre-calculated stage geometry
#[derive(Debug, Clone, PartialEq)]
pub struct StageLayout {
    /// Base grid cells, top row first, left to right within a row
    pub base_cells: Vec<Cell>,
    pub wall: Wall,
    /// One vector per binary column, top row first
    pub column_cells: Vec<Vec<Cell>>,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl StageLayout {
    pub const WALL_WIDTH: f32 = 2.0;

    /// Lays out a stage from its parts
    ///
    /// # Arguments
    /// * `width` - Cells per base row
    /// * `rows` - Visible base rows, most-significant first
    /// * `columns` - Binary columns drawn right of the wall
    /// * `stage` - Cell size and gaps
    pub fn from_parts(
        width: u32,
        rows: &[BaseRow],
        columns: &BinaryColumnStore,
        stage: &StageConfig,
    ) -> Self {
        let cell = stage.cell as f32;
        let col_gap = stage.col_gap as f32;
        let row_gap = stage.row_gap as f32;
        let padding = cell;
        let window = rows.len() as u32;

        let row_top = |visual: usize| padding + visual as f32 * (cell + row_gap);
        let stage_height = if window == 0 {
            0.0
        } else {
            window as f32 * cell + (window - 1) as f32 * row_gap
        };
        let grid_width = if width == 0 {
            0.0
        } else {
            width as f32 * cell + (width - 1) as f32 * col_gap
        };

        let mut base_cells = Vec::with_capacity(rows.len() * width as usize);
        for (visual, row) in rows.iter().enumerate() {
            for x in 0..width {
                base_cells.push(Cell {
                    x: padding + x as f32 * (cell + col_gap),
                    y: row_top(visual),
                    size: cell,
                    filled: x < row.count,
                });
            }
        }

        let wall = Wall {
            x: padding + grid_width + cell / 2.0,
            top: padding,
            bottom: padding + stage_height,
            width: Self::WALL_WIDTH,
        };

        let columns_left = wall.x + cell / 2.0;
        let column_cells: Vec<Vec<Cell>> = columns
            .columns()
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let x = columns_left + index as f32 * (cell + col_gap);
                rows.iter()
                    .enumerate()
                    .map(|(visual, row)| Cell {
                        x,
                        y: row_top(visual),
                        size: cell,
                        filled: column.has_bead(row.position),
                    })
                    .collect()
            })
            .collect();

        let columns_width = match columns.len() {
            0 => 0.0,
            n => n as f32 * cell + (n - 1) as f32 * col_gap,
        };

        Self {
            base_cells,
            wall,
            column_cells,
            canvas_width: (columns_left + columns_width + padding).ceil() as u32,
            canvas_height: (stage_height + 2.0 * padding).ceil() as u32,
        }
    }

    /// Lays out the current state of a session
    pub fn from_session(session: &AbacusSession, stage: &StageConfig) -> Self {
        Self::from_parts(
            session.snapshot().width,
            session.rows(),
            session.columns(),
            stage,
        )
    }
}

/// Stage renderer using tiny-skia
#[derive(Debug)]
pub struct StageRenderer {
    background: Color,
    bead: Color,
    border: Color,
    wall: Color,
}

impl StageRenderer {
    pub fn new() -> Self {
        Self {
            background: Color::WHITE,
            bead: Color::BLACK,
            border: Color::from_rgba8(0x55, 0x55, 0x55, 255),
            wall: Color::from_rgba8(0x99, 0x99, 0x99, 153),
        }
    }

    /// Render a stage layout to a pixmap
    pub fn render_layout(&self, layout: &StageLayout) -> Result<Pixmap, RendererError> {
        if layout.canvas_width == 0 || layout.canvas_height == 0 {
            return Err(RendererError::InvalidStageDimensions {
                width: layout.canvas_width,
                height: layout.canvas_height,
            });
        }
        let mut pixmap = Pixmap::new(layout.canvas_width, layout.canvas_height)
            .ok_or(RendererError::PixmapCreationFailed)?;
        pixmap.fill(self.background);

        let cells = layout
            .base_cells
            .iter()
            .chain(layout.column_cells.iter().flatten());
        for cell in cells {
            self.render_cell(&mut pixmap, cell);
        }
        self.render_wall(&mut pixmap, &layout.wall);

        Ok(pixmap)
    }

    fn render_cell(&self, pixmap: &mut Pixmap, cell: &Cell) {
        let Some(rect) = cell.rect() else {
            return;
        };

        let mut paint = Paint::default();
        if cell.filled {
            paint.set_color(self.bead);
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }

        let path = PathBuilder::from_rect(rect);
        paint.set_color(self.border);
        let stroke = Stroke {
            width: 1.0,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    fn render_wall(&self, pixmap: &mut Pixmap, wall: &Wall) {
        let mut path_builder = PathBuilder::new();
        path_builder.move_to(wall.x, wall.top);
        path_builder.line_to(wall.x, wall.bottom);

        if let Some(path) = path_builder.finish() {
            let mut paint = Paint::default();
            paint.set_color(self.wall);
            let stroke = Stroke {
                width: wall.width,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Renders a layout and writes it as PNG
    pub fn save_png(&self, layout: &StageLayout, path: &Path) -> Result<(), RendererError> {
        let pixmap = self.render_layout(layout)?;
        pixmap.save_png(path).map_err(|err| RendererError::SaveFailed {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }
}

impl Default for StageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::core::{GridSnapshot, VISIBLE_ROWS};

    fn layout_for(snapshot: &GridSnapshot, columns: &BinaryColumnStore) -> StageLayout {
        let rows = snapshot.visible_rows(VISIBLE_ROWS);
        StageLayout::from_parts(snapshot.width, &rows, columns, &StageConfig::default())
    }

    #[test]
    fn default_stage_geometry() {
        let layout = layout_for(&GridSnapshot::default(), &BinaryColumnStore::new());

        // 4 cells x 16 rows, one binary column
        assert_eq!(layout.base_cells.len(), 64);
        assert_eq!(layout.column_cells.len(), 1);
        assert_eq!(layout.column_cells[0].len(), 16);

        // grid 4*20 + 3*4 = 92 wide, stage 16*20 + 15*6 = 410 high, 20 padding
        assert_eq!(layout.wall.x, 20.0 + 92.0 + 10.0);
        assert_eq!(layout.wall.bottom - layout.wall.top, 410.0);
        assert_eq!(layout.canvas_width, 172);
        assert_eq!(layout.canvas_height, 450);
    }

    #[test]
    fn filled_cells_follow_counts_and_beads() {
        let snapshot = GridSnapshot {
            width: 4,
            divider: Some(4),
            rows: vec![(15, 3), (0, 1)],
        };
        let mut columns = BinaryColumnStore::new();
        columns.increment(1).unwrap();

        let layout = layout_for(&snapshot, &columns);

        let top_row: Vec<bool> = layout.base_cells[..4].iter().map(|c| c.filled).collect();
        assert_eq!(top_row, vec![true, true, true, false]);
        let bottom_row: Vec<bool> = layout.base_cells[60..].iter().map(|c| c.filled).collect();
        assert_eq!(bottom_row, vec![true, false, false, false]);

        let column = &layout.column_cells[0];
        assert!(column[15].filled);
        assert_eq!(column.iter().filter(|c| c.filled).count(), 1);
    }

    #[test]
    fn render_paints_beads_black_and_empty_cells_white() {
        let snapshot = GridSnapshot {
            width: 2,
            divider: Some(2),
            rows: vec![(15, 1)],
        };
        let layout = layout_for(&snapshot, &BinaryColumnStore::new());
        let pixmap = StageRenderer::new().render_layout(&layout).unwrap();

        assert_eq!(pixmap.width(), layout.canvas_width);
        assert_eq!(pixmap.height(), layout.canvas_height);

        let (x, y) = layout.base_cells[0].center();
        let bead = pixmap.pixel(x, y).unwrap();
        assert_eq!((bead.red(), bead.alpha()), (0, 255));

        let (x, y) = layout.base_cells[1].center();
        let empty = pixmap.pixel(x, y).unwrap();
        assert_eq!((empty.red(), empty.alpha()), (255, 255));
    }

    #[test]
    fn save_png_writes_file() {
        let path = std::env::temp_dir().join(format!("bead-stage-{}.png", std::process::id()));
        let layout = layout_for(&GridSnapshot::default(), &BinaryColumnStore::new());

        StageRenderer::new().save_png(&layout, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let layout = StageLayout {
            base_cells: vec![],
            wall: Wall {
                x: 0.0,
                top: 0.0,
                bottom: 0.0,
                width: 2.0,
            },
            column_cells: vec![],
            canvas_width: 0,
            canvas_height: 10,
        };
        assert!(matches!(
            StageRenderer::new().render_layout(&layout),
            Err(RendererError::InvalidStageDimensions { .. })
        ));
    }
}
