use crate::models::{Block, CellGrid};

/// Split a grid into the maximal runs of non-empty rows.
///
/// Separator rows belong to no block. Total over any grid; a grid with no
/// rows (or only empty rows) yields no blocks.
pub fn split(grid: &CellGrid) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;

    for row in 0..grid.row_count() {
        match (grid.is_row_empty(row), start) {
            (true, Some(lo)) => {
                blocks.push(Block::new(lo, row));
                start = None;
            }
            (false, None) => start = Some(row),
            _ => {}
        }
    }

    if let Some(lo) = start {
        blocks.push(Block::new(lo, grid.row_count()));
    }

    blocks
}

/// Number of separator rows, i.e. rows not covered by any block.
pub fn separator_rows(grid: &CellGrid, blocks: &[Block]) -> usize {
    grid.row_count() - blocks.iter().map(Block::len).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;

    fn grid(rows: Vec<Vec<&str>>) -> CellGrid {
        CellGrid::from_text_rows(rows)
    }

    #[test]
    fn test_empty_grid_has_no_blocks() {
        assert!(split(&CellGrid::default()).is_empty());
    }

    #[test]
    fn test_grid_without_blank_rows_is_one_block() {
        let g = grid(vec![vec!["a", "b"], vec!["c"], vec!["", "d"]]);
        assert_eq!(split(&g), vec![Block::new(0, 3)]);
    }

    #[test]
    fn test_blocks_between_separators() {
        let g = grid(vec![
            vec![""],
            vec!["ID", "1"],
            vec!["Name", "Kaub"],
            vec!["", ""],
            vec![" "],
            vec!["Gewässer", "Rhein"],
            vec![],
            vec!["Datum", "Wert"],
        ]);

        let blocks = split(&g);

        assert_eq!(
            blocks,
            vec![Block::new(1, 3), Block::new(5, 6), Block::new(7, 8)]
        );
        assert_eq!(separator_rows(&g, &blocks), 4);
    }

    #[test]
    fn test_only_blank_rows() {
        let g = grid(vec![vec![""], vec!["  "]]);
        let blocks = split(&g);
        assert!(blocks.is_empty());
        assert_eq!(separator_rows(&g, &blocks), 2);
    }

    #[test]
    fn test_non_text_cells_are_not_blank() {
        let g = CellGrid::new(vec![
            vec![Cell::Number(0.0)],
            vec![Cell::Empty],
            vec![Cell::Bool(false)],
        ]);
        assert_eq!(split(&g), vec![Block::new(0, 1), Block::new(2, 3)]);
    }

    #[test]
    fn test_blocks_and_separators_cover_every_row() {
        let patterns: [&[bool]; 5] = [
            &[true, false, true],
            &[false, false, false],
            &[true, true, false, true, false, false],
            &[false],
            &[true, false, false, true, true, false, true],
        ];

        for pattern in patterns {
            let rows: Vec<Vec<&str>> = pattern
                .iter()
                .map(|filled| if *filled { vec!["x"] } else { vec![""] })
                .collect();
            let g = grid(rows);
            let blocks = split(&g);

            let empty_rows = pattern.iter().filter(|f| !**f).count();
            assert_eq!(separator_rows(&g, &blocks), empty_rows);
            for pair in blocks.windows(2) {
                assert!(pair[0].up < pair[1].lo);
            }
        }
    }
}
