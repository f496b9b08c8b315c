//! Table grid types.
//!
//! A [`TableGrid`] is the canonical, always-rectangular cell matrix that
//! remains after horizontal and vertical merges have been resolved.

use super::span::{spans_text, StyleSpan};
use serde::{Deserialize, Serialize};

/// A rectangular table after merge resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableGrid {
    /// Number of logical columns
    pub columns: usize,

    /// Number of leading header rows
    pub header_rows: usize,

    /// Cell matrix, `rows × columns`
    pub cells: Vec<Vec<GridCell>>,
}

impl TableGrid {
    /// Create an empty grid with the given column count.
    pub fn new(columns: usize) -> Self {
        Self {
            columns,
            header_rows: 0,
            cells: Vec::new(),
        }
    }

    /// Build a grid of single-span text cells.
    ///
    /// Rows shorter than the widest row are padded with empty cells.
    pub fn from_text_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(columns);
        for row in rows {
            let mut cells: Vec<GridCell> = row
                .iter()
                .map(|text| GridCell::Owner(OwnerCell::text(text.as_ref())))
                .collect();
            cells.resize_with(columns, || GridCell::Owner(OwnerCell::empty()));
            grid.cells.push(cells);
        }
        grid
    }

    /// Mark the leading rows as header rows.
    pub fn with_header_rows(mut self, rows: usize) -> Self {
        self.header_rows = rows.min(self.cells.len());
        self
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Check if the grid has no rows.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a cell by position.
    pub fn cell(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Number of header rows that leave at least one body row.
    ///
    /// A grid made only of header rows has no header: its rows form the body.
    pub fn effective_header_rows(&self) -> usize {
        if self.header_rows >= self.cells.len() {
            0
        } else {
            self.header_rows
        }
    }

    /// Header rows.
    pub fn header(&self) -> &[Vec<GridCell>] {
        &self.cells[..self.effective_header_rows()]
    }

    /// Body rows (non-header).
    pub fn body(&self) -> &[Vec<GridCell>] {
        &self.cells[self.effective_header_rows()..]
    }

    /// Whether some row consists only of placeholders.
    pub fn has_covered_rows(&self) -> bool {
        self.cells
            .iter()
            .any(|row| !row.is_empty() && row.iter().all(GridCell::is_placeholder))
    }

    /// Remove rows that consist only of placeholders.
    ///
    /// Every owner covering a removed row spans one row less, and
    /// placeholders below it are re-pointed, so the grid stays rectangular
    /// and every remaining row has at least one owner. Returns the number
    /// of removed rows.
    pub fn collapse_covered_rows(&mut self) -> usize {
        let mut removed = 0;
        let mut r = 0;
        while r < self.cells.len() {
            let row = &self.cells[r];
            if row.is_empty() || !row.iter().all(GridCell::is_placeholder) {
                r += 1;
                continue;
            }

            let mut owners: Vec<(usize, usize)> = row
                .iter()
                .filter_map(|c| match c {
                    GridCell::Placeholder {
                        owner_row,
                        owner_col,
                    } => Some((*owner_row, *owner_col)),
                    GridCell::Owner(_) => None,
                })
                .collect();
            owners.sort_unstable();
            owners.dedup();
            for (owner_row, owner_col) in owners {
                if let Some(GridCell::Owner(owner)) = self
                    .cells
                    .get_mut(owner_row)
                    .and_then(|row| row.get_mut(owner_col))
                {
                    owner.row_span = owner.row_span.saturating_sub(1).max(1);
                }
            }

            self.cells.remove(r);
            for cell in self.cells[r..].iter_mut().flatten() {
                if let GridCell::Placeholder { owner_row, .. } = cell {
                    if *owner_row > r {
                        *owner_row -= 1;
                    }
                }
            }
            if r < self.header_rows {
                self.header_rows -= 1;
            }
            removed += 1;
        }
        removed
    }

    /// Every row has exactly `columns` positions.
    pub fn is_rectangular(&self) -> bool {
        self.cells.iter().all(|row| row.len() == self.columns)
    }

    /// Number of owner (content-bearing) cells.
    pub fn owner_count(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|c| matches!(c, GridCell::Owner(_)))
            .count()
    }

    /// Check if the grid has merged cells.
    pub fn has_merged_cells(&self) -> bool {
        self.cells.iter().flatten().any(|c| match c {
            GridCell::Owner(owner) => owner.is_merged(),
            GridCell::Placeholder { .. } => true,
        })
    }

    /// Get plain text representation of the grid.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .filter_map(|c| match c {
                        GridCell::Owner(owner) => Some(owner.plain_text()),
                        GridCell::Placeholder { .. } => None,
                    })
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One logical position of a [`TableGrid`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GridCell {
    /// A cell that carries content and spans one or more positions.
    Owner(OwnerCell),

    /// A position covered by a preceding owner's span.
    Placeholder {
        /// Row of the covering owner
        owner_row: usize,
        /// Column of the covering owner
        owner_col: usize,
    },
}

impl GridCell {
    /// Get the owner cell, if this position holds one.
    pub fn as_owner(&self) -> Option<&OwnerCell> {
        match self {
            GridCell::Owner(owner) => Some(owner),
            GridCell::Placeholder { .. } => None,
        }
    }

    /// Check if this position is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, GridCell::Placeholder { .. })
    }
}

/// Content-bearing table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerCell {
    /// Paragraphs of the cell
    pub paragraphs: Vec<Vec<StyleSpan>>,

    /// Number of rows this cell spans
    pub row_span: usize,

    /// Number of columns this cell spans
    pub col_span: usize,
}

impl OwnerCell {
    /// Create an empty single-position cell.
    pub fn empty() -> Self {
        Self {
            paragraphs: Vec::new(),
            row_span: 1,
            col_span: 1,
        }
    }

    /// Create a cell with plain text content.
    pub fn text(text: &str) -> Self {
        let mut cell = Self::empty();
        if !text.is_empty() {
            cell.paragraphs.push(vec![StyleSpan::plain(text)]);
        }
        cell
    }

    /// Set colspan and return self.
    pub fn col_span(mut self, span: usize) -> Self {
        self.col_span = span.max(1);
        self
    }

    /// Set rowspan and return self.
    pub fn row_span(mut self, span: usize) -> Self {
        self.row_span = span.max(1);
        self
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(|p| spans_text(p))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if this cell spans multiple rows or columns.
    pub fn is_merged(&self) -> bool {
        self.row_span > 1 || self.col_span > 1
    }
}
