use crate::models::cell::EMPTY_CELL;
use crate::models::{Cell, CellGrid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Half-open row range `[lo, up)` of a [`CellGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub lo: usize,
    pub up: usize,
}

impl Block {
    pub fn new(lo: usize, up: usize) -> Self {
        debug_assert!(lo <= up, "block bounds out of order: {lo}..{up}");
        Self { lo, up }
    }

    pub fn len(&self) -> usize {
        self.up - self.lo
    }

    pub fn is_empty(&self) -> bool {
        self.lo == self.up
    }

    /// Borrow the block's rows out of the grid it was split from.
    pub fn view<'g>(&self, grid: &'g CellGrid) -> BlockView<'g> {
        BlockView { grid, block: *self }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rows {}..{}", self.lo, self.up)
    }
}

/// Read access to the cells of one block, with block-relative indices.
#[derive(Debug, Clone, Copy)]
pub struct BlockView<'g> {
    grid: &'g CellGrid,
    block: Block,
}

impl<'g> BlockView<'g> {
    pub fn row_count(&self) -> usize {
        self.block.len()
    }

    /// Grid row index of a block-relative row.
    pub fn grid_row(&self, index: usize) -> usize {
        self.block.lo + index
    }

    pub fn width(&self) -> usize {
        (self.block.lo..self.block.up)
            .map(|r| self.grid.row(r).len())
            .max()
            .unwrap_or(0)
    }

    pub fn row(&self, index: usize) -> &'g [Cell] {
        if index >= self.block.len() {
            return &[];
        }
        self.grid.row(self.block.lo + index)
    }

    pub fn get(&self, row: usize, col: usize) -> &'g Cell {
        if row >= self.block.len() {
            return &EMPTY_CELL;
        }
        self.grid.get(self.block.lo + row, col)
    }

    /// Column indices holding at least one non-blank cell, in order.
    pub fn non_empty_columns(&self) -> Vec<usize> {
        (0..self.width())
            .filter(|&c| (0..self.row_count()).any(|r| !self.get(r, c).is_blank()))
            .collect()
    }

    /// Row indices holding at least one non-blank cell, in order.
    pub fn non_empty_rows(&self) -> Vec<usize> {
        (0..self.row_count())
            .filter(|&r| self.row(r).iter().any(|c| !c.is_blank()))
            .collect()
    }
}

/// Role a block plays in a multi-block station sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockRole {
    Identity,
    Location,
    Coordinates,
    Data,
    Unrecognized,
}

impl BlockRole {
    pub fn display_name(&self) -> &'static str {
        match self {
            BlockRole::Identity => "identity",
            BlockRole::Location => "location",
            BlockRole::Coordinates => "coordinates",
            BlockRole::Data => "data",
            BlockRole::Unrecognized => "unrecognized",
        }
    }

    /// Whether the block contributes to the metadata record.
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            BlockRole::Identity | BlockRole::Location | BlockRole::Coordinates
        )
    }
}

impl fmt::Display for BlockRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedBlock {
    pub role: BlockRole,
    pub block: Block,
}
