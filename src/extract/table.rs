//! Table merge resolution.
//!
//! WordprocessingML describes merges per cell: `w:gridSpan` for horizontal
//! width and `w:vMerge` for vertical continuation. [`build_grid`] expands
//! them into a rectangular [`TableGrid`] of owner cells and placeholders.

use super::xml::Element;
use crate::model::{GridCell, OwnerCell, StyleSpan, TableGrid};

/// Vertical merge marker of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VMerge {
    #[default]
    None,
    Restart,
    Continue,
}

/// A cell as declared in the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawCell {
    pub paragraphs: Vec<Vec<StyleSpan>>,
    pub grid_span: usize,
    pub v_merge: VMerge,
}

impl RawCell {
    /// Create a cell with the merge properties of a `w:tc` element.
    pub(crate) fn from_tc(tc: &Element) -> Self {
        let tc_pr = tc.child("w:tcPr");
        let grid_span = tc_pr
            .and_then(|p| p.child_val("w:gridSpan"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);
        let v_merge = match tc_pr.and_then(|p| p.child("w:vMerge")) {
            Some(vm) if vm.attr("w:val") == Some("restart") => VMerge::Restart,
            Some(_) => VMerge::Continue,
            None => VMerge::None,
        };
        Self {
            paragraphs: Vec::new(),
            grid_span,
            v_merge,
        }
    }
}

/// A row as declared in the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
    pub grid_before: usize,
    pub is_header: bool,
}

impl RawRow {
    pub(crate) fn from_tr(tr: &Element) -> Self {
        let tr_pr = tr.child("w:trPr");
        let grid_before = tr_pr
            .and_then(|p| p.child_val("w:gridBefore"))
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let is_header = tr_pr
            .and_then(|p| p.child("w:tblHeader"))
            .is_some_and(|h| !matches!(h.attr("w:val"), Some("0") | Some("false") | Some("off")));
        Self {
            cells: Vec::new(),
            grid_before,
            is_header,
        }
    }

    fn width(&self) -> usize {
        self.grid_before + self.cells.len()
    }
}

/// Number of `w:gridCol` entries of a table.
pub(crate) fn declared_columns(tbl: &Element) -> usize {
    tbl.child("w:tblGrid")
        .map(|g| g.children_named("w:gridCol").count())
        .unwrap_or(0)
}

/// Resolve merges into a rectangular grid.
///
/// The column count is the larger of the declared grid and the widest row,
/// so every source cell keeps a position; spans are clamped to fit.
/// Leading `w:gridBefore` skips never reach past the declared grid.
pub fn build_grid(declared_columns: usize, mut rows: Vec<RawRow>) -> TableGrid {
    for (r, row) in rows.iter_mut().enumerate() {
        let limit = declared_columns.saturating_sub(1);
        if row.grid_before > limit {
            log::warn!(
                "table row {}: clamped gridBefore {} to {}",
                r,
                row.grid_before,
                limit
            );
            row.grid_before = limit;
        }
    }
    let columns = rows
        .iter()
        .map(RawRow::width)
        .max()
        .unwrap_or(0)
        .max(declared_columns);
    let mut grid = TableGrid::new(columns);
    let leading_headers = rows.iter().take_while(|r| r.is_header).count();

    for (r, row) in rows.into_iter().enumerate() {
        let mut cells: Vec<GridCell> = Vec::with_capacity(columns);
        cells.extend((0..row.grid_before).map(|_| GridCell::Owner(OwnerCell::empty())));

        let count = row.cells.len();
        for (i, cell) in row.cells.into_iter().enumerate() {
            let pos = cells.len();
            let remaining = count - i - 1;
            let available = columns.saturating_sub(pos + remaining).max(1);
            let span = cell.grid_span.clamp(1, available);
            if span != cell.grid_span {
                log::warn!(
                    "table row {}: clamped gridSpan {} to {}",
                    r,
                    cell.grid_span,
                    span
                );
            }

            if cell.v_merge == VMerge::Continue {
                if let Some((owner_row, owner_col)) = continuation_owner(&grid, r, pos, span) {
                    if let Some(GridCell::Owner(owner)) = grid
                        .cells
                        .get_mut(owner_row)
                        .and_then(|row| row.get_mut(owner_col))
                    {
                        owner.row_span += 1;
                        // Continuation cells rarely carry text; keep any they do.
                        owner.paragraphs.extend(cell.paragraphs);
                    }
                    cells.extend((0..span).map(|_| GridCell::Placeholder {
                        owner_row,
                        owner_col,
                    }));
                    continue;
                }
                log::warn!(
                    "table row {}, column {}: vertical merge without matching owner above",
                    r,
                    pos
                );
            }

            let mut owner = OwnerCell::empty().col_span(span);
            owner.paragraphs = cell.paragraphs;
            cells.push(GridCell::Owner(owner));
            cells.extend((1..span).map(|_| GridCell::Placeholder {
                owner_row: r,
                owner_col: pos,
            }));
        }

        cells.resize_with(columns, || GridCell::Owner(OwnerCell::empty()));
        grid.cells.push(cells);
    }

    grid.header_rows = leading_headers;
    let collapsed = grid.collapse_covered_rows();
    if collapsed > 0 {
        log::debug!("collapsed {} rows covered by vertical merges", collapsed);
    }
    grid.header_rows = checked_header_rows(&grid, grid.header_rows);
    grid
}

/// Owner directly above `(row, col)` whose span matches, if any.
fn continuation_owner(grid: &TableGrid, row: usize, col: usize, span: usize) -> Option<(usize, usize)> {
    let above = grid.cell(row.checked_sub(1)?, col)?;
    let (owner_row, owner_col) = match above {
        GridCell::Owner(_) => (row - 1, col),
        GridCell::Placeholder {
            owner_row,
            owner_col,
        } => (*owner_row, *owner_col),
    };
    let owner = grid.cell(owner_row, owner_col)?.as_owner()?;
    let ends_above = owner_row + owner.row_span == row;
    (owner_col == col && owner.col_span == span && ends_above).then_some((owner_row, owner_col))
}

/// Header rows are dropped when a header cell spans into the body or
/// when no body row would remain.
fn checked_header_rows(grid: &TableGrid, header_rows: usize) -> usize {
    if header_rows == 0 {
        return 0;
    }
    if header_rows >= grid.row_count() {
        log::debug!("every table row is a header row; emitting them as the body");
        return 0;
    }
    let crosses = grid.cells[..header_rows]
        .iter()
        .enumerate()
        .flat_map(|(r, row)| row.iter().map(move |c| (r, c)))
        .any(|(r, cell)| matches!(cell, GridCell::Owner(o) if r + o.row_span > header_rows));
    if crosses {
        log::warn!("header cell spans into table body; emitting table without header");
        0
    } else {
        header_rows
    }
}
