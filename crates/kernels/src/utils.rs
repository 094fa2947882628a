//! Shared helpers for strategy executors and cost estimators.

use crate::config::GemmArgs;
use crate::element::{Accumulator, Operand};
use anyhow::{bail, Result};
use ndarray::{s, ArrayView2, ArrayView3, ArrayView4, ArrayViewMut2, Axis};
use rayon::prelude::*;

#[inline]
pub fn iceildiv(a: usize, b: usize) -> usize {
    a.div_ceil(b.max(1))
}

#[inline]
pub fn roundup(a: usize, b: usize) -> usize {
    iceildiv(a, b) * b.max(1)
}

/// Check `a` is `[multi][batch][m][k]` and `b` is `[multi][k][n]` for `args`.
pub fn validate_gemm_inputs<To>(
    args: &GemmArgs,
    a: &ArrayView4<'_, To>,
    b: &ArrayView3<'_, To>,
) -> Result<()> {
    let expected_a = (args.nmulti, args.nbatches, args.m, args.k);
    let expected_b = (args.nmulti, args.k, args.n);
    if a.dim() != expected_a {
        bail!(
            "gemm lhs shape {:?} does not match problem {:?}",
            a.dim(),
            expected_a
        );
    }
    if b.dim() != expected_b {
        bail!(
            "gemm rhs shape {:?} does not match problem {:?}",
            b.dim(),
            expected_b
        );
    }
    Ok(())
}

/// How a blocked product spreads its output tiles across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    /// Row panels in parallel, columns walked in order.
    Rows,
    /// Column panels in parallel (single-row products).
    Cols,
    /// Row panels and the column tiles inside them in parallel.
    RowsAndCols,
}

#[derive(Debug, Clone, Copy)]
pub struct Tile {
    pub height: usize,
    pub width: usize,
    pub k_block: usize,
}

/// `c += a * b` for one tile.
pub fn multiply_tile<To, Tr>(a: ArrayView2<'_, To>, b: ArrayView2<'_, To>, mut c: ArrayViewMut2<'_, Tr>)
where
    To: Operand,
    Tr: Accumulator<To>,
{
    for (row_idx, a_row) in a.outer_iter().enumerate() {
        for (col_idx, b_col) in b.axis_iter(Axis(1)).enumerate() {
            let entry = &mut c[(row_idx, col_idx)];
            *entry = a_row
                .iter()
                .zip(b_col.iter())
                .fold(*entry, |acc, (&lhs, &rhs)| acc.mul_add(lhs, rhs));
        }
    }
}

/// Walk `c += a * b` tile by tile, blocking K by `tile.k_block`.
pub fn blocked_product<To, Tr>(
    a: ArrayView2<'_, To>,
    b: ArrayView2<'_, To>,
    mut c: ArrayViewMut2<'_, Tr>,
    tile: Tile,
    split: Split,
) where
    To: Operand,
    Tr: Accumulator<To>,
{
    let height = tile.height.max(1);
    let width = tile.width.max(1);
    let k = a.ncols();
    let k_block = tile.k_block.clamp(1, k.max(1));

    let row_panel = |row0: usize, mut rows: ArrayViewMut2<'_, Tr>, parallel_cols: bool| {
        let a_rows = a.slice(s![row0..row0 + rows.nrows(), ..]);
        let walk = |col0: usize, mut cols: ArrayViewMut2<'_, Tr>| {
            let b_cols = b.slice(s![.., col0..col0 + cols.ncols()]);
            for p0 in (0..k).step_by(k_block) {
                let p1 = (p0 + k_block).min(k);
                multiply_tile(
                    a_rows.slice(s![.., p0..p1]),
                    b_cols.slice(s![p0..p1, ..]),
                    cols.view_mut(),
                );
            }
        };
        if parallel_cols {
            rows.axis_chunks_iter_mut(Axis(1), width)
                .into_par_iter()
                .enumerate()
                .for_each(|(block, cols)| walk(block * width, cols));
        } else {
            for (block, cols) in rows.axis_chunks_iter_mut(Axis(1), width).enumerate() {
                walk(block * width, cols);
            }
        }
    };

    match split {
        Split::Rows | Split::RowsAndCols => {
            let parallel_cols = split == Split::RowsAndCols;
            c.axis_chunks_iter_mut(Axis(0), height)
                .into_par_iter()
                .enumerate()
                .for_each(|(block, rows)| row_panel(block * height, rows, parallel_cols));
        }
        Split::Cols => {
            for (block, rows) in c.axis_chunks_iter_mut(Axis(0), height).enumerate() {
                row_panel(block * height, rows, true);
            }
        }
    }
}
