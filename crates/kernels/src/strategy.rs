//! Executable GEMM strategies handed out by the selection engine.

use crate::config::{GemmArgs, GemmMethod};
use crate::cost::k_block_size;
use crate::element::{Accumulator, Operand};
use crate::perf::KernelDescriptor;
use crate::utils::{blocked_product, iceildiv, roundup, validate_gemm_inputs, Split, Tile};
use anyhow::Result;
use ndarray::{s, Array4, ArrayView3, ArrayView4};
use std::marker::PhantomData;

/// An instantiated strategy, bound to one problem shape.
pub trait GemmCommon<To: Operand, Tr: Accumulator<To>>: Send + Sync {
    fn name(&self) -> &'static str;
    fn method(&self) -> GemmMethod;
    fn args(&self) -> &GemmArgs;

    /// Number of independent work units the strategy can spread over threads.
    fn window_size(&self) -> usize;

    /// Scratch bytes needed across all threads.
    fn working_size(&self) -> usize {
        0
    }

    /// Bytes needed to hold B in the kernel's packed layout.
    fn pretransposed_b_size(&self) -> usize {
        0
    }

    /// `a` is `[multi][batch][m][k]` and `b` is `[multi][k][n]`; returns
    /// `[multi][batch][m][n]`.
    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>>;
}

pub type UniqueGemmCommon<To, Tr> = Box<dyn GemmCommon<To, Tr>>;

/// Problem shape paired with the micro-kernel a strategy drives.
#[derive(Debug, Clone)]
struct Blocking {
    args: GemmArgs,
    kernel: &'static KernelDescriptor,
    out_width: usize,
}

impl Blocking {
    fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            args: args.clone(),
            kernel,
            out_width: kernel.out_width(&args.ci),
        }
    }

    fn tile(&self, k_block: usize) -> Tile {
        Tile {
            height: self.kernel.out_height,
            width: self.out_width,
            k_block,
        }
    }

    fn row_blocks(&self) -> usize {
        iceildiv(self.args.m, self.kernel.out_height)
    }

    fn col_blocks(&self) -> usize {
        iceildiv(self.args.n, self.out_width)
    }

    fn packed_b_bytes(&self) -> usize {
        self.args.nmulti
            * roundup(self.args.n, self.out_width)
            * roundup(self.args.k, self.kernel.k_unroll)
            * self.kernel.operand_bytes
    }

    fn per_batch<To, Tr>(
        &self,
        a: ArrayView4<'_, To>,
        b: ArrayView3<'_, To>,
        tile: Tile,
        split: Split,
    ) -> Result<Array4<Tr>>
    where
        To: Operand,
        Tr: Accumulator<To>,
    {
        let args = &self.args;
        validate_gemm_inputs(args, &a, &b)?;
        let mut c = Array4::<Tr>::default((args.nmulti, args.nbatches, args.m, args.n));
        for multi in 0..args.nmulti {
            let b_multi = b.slice(s![multi, .., ..]);
            for batch in 0..args.nbatches {
                blocked_product(
                    a.slice(s![multi, batch, .., ..]),
                    b_multi,
                    c.slice_mut(s![multi, batch, .., ..]),
                    tile,
                    split,
                );
            }
        }
        Ok(c)
    }
}

/// Single-row products batched together: the batch axis is treated as M.
pub struct GemvBatched<To, Tr> {
    blocking: Blocking,
    _types: PhantomData<fn() -> (To, Tr)>,
}

impl<To: Operand, Tr: Accumulator<To>> GemvBatched<To, Tr> {
    pub fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            blocking: Blocking::new(args, kernel),
            _types: PhantomData,
        }
    }
}

impl<To: Operand, Tr: Accumulator<To>> GemmCommon<To, Tr> for GemvBatched<To, Tr> {
    fn name(&self) -> &'static str {
        self.blocking.kernel.name
    }

    fn method(&self) -> GemmMethod {
        GemmMethod::GemvBatched
    }

    fn args(&self) -> &GemmArgs {
        &self.blocking.args
    }

    fn window_size(&self) -> usize {
        let args = &self.blocking.args;
        iceildiv(args.nbatches, self.blocking.kernel.out_height) * args.nmulti
    }

    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>> {
        let args = &self.blocking.args;
        validate_gemm_inputs(args, &a, &b)?;
        let mut c = Array4::<Tr>::default((args.nmulti, args.nbatches, args.m, args.n));
        let tile = self.blocking.tile(args.k);
        for multi in 0..args.nmulti {
            for row in 0..args.m {
                blocked_product(
                    a.slice(s![multi, .., row, ..]),
                    b.slice(s![multi, .., ..]),
                    c.slice_mut(s![multi, .., row, ..]),
                    tile,
                    Split::Rows,
                );
            }
        }
        Ok(c)
    }
}

/// Single-row product against a B the caller keeps in packed form.
pub struct GemvPretransposed<To, Tr> {
    blocking: Blocking,
    _types: PhantomData<fn() -> (To, Tr)>,
}

impl<To: Operand, Tr: Accumulator<To>> GemvPretransposed<To, Tr> {
    pub fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            blocking: Blocking::new(args, kernel),
            _types: PhantomData,
        }
    }
}

impl<To: Operand, Tr: Accumulator<To>> GemmCommon<To, Tr> for GemvPretransposed<To, Tr> {
    fn name(&self) -> &'static str {
        self.blocking.kernel.name
    }

    fn method(&self) -> GemmMethod {
        GemmMethod::GemvPretransposed
    }

    fn args(&self) -> &GemmArgs {
        &self.blocking.args
    }

    fn window_size(&self) -> usize {
        self.blocking.col_blocks() * self.blocking.args.nmulti
    }

    fn pretransposed_b_size(&self) -> usize {
        self.blocking.packed_b_bytes()
    }

    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>> {
        let tile = self.blocking.tile(self.blocking.args.k);
        self.blocking.per_batch(a, b, tile, Split::Cols)
    }
}

/// Streams A rows straight into the kernel and walks B panels per row block.
pub struct GemmHybrid<To, Tr> {
    blocking: Blocking,
    _types: PhantomData<fn() -> (To, Tr)>,
}

impl<To: Operand, Tr: Accumulator<To>> GemmHybrid<To, Tr> {
    pub fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            blocking: Blocking::new(args, kernel),
            _types: PhantomData,
        }
    }
}

impl<To: Operand, Tr: Accumulator<To>> GemmCommon<To, Tr> for GemmHybrid<To, Tr> {
    fn name(&self) -> &'static str {
        self.blocking.kernel.name
    }

    fn method(&self) -> GemmMethod {
        GemmMethod::GemmHybrid
    }

    fn args(&self) -> &GemmArgs {
        &self.blocking.args
    }

    fn window_size(&self) -> usize {
        let args = &self.blocking.args;
        self.blocking.row_blocks() * args.nbatches * args.nmulti
    }

    fn pretransposed_b_size(&self) -> usize {
        self.blocking.packed_b_bytes()
    }

    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>> {
        let tile = self.blocking.tile(self.blocking.args.k);
        self.blocking.per_batch(a, b, tile, Split::Rows)
    }
}

/// Packs A and B into K blocks, threading over row blocks.
pub struct GemmInterleaved<To, Tr> {
    blocking: Blocking,
    k_block: usize,
    _types: PhantomData<fn() -> (To, Tr)>,
}

impl<To: Operand, Tr: Accumulator<To>> GemmInterleaved<To, Tr> {
    pub fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            blocking: Blocking::new(args, kernel),
            k_block: k_block_size(args, kernel),
            _types: PhantomData,
        }
    }

    pub fn k_block(&self) -> usize {
        self.k_block
    }
}

fn interleaved_working_size(blocking: &Blocking, k_block: usize) -> usize {
    let kernel = blocking.kernel;
    let panels = k_block * (kernel.out_height + blocking.out_width) * kernel.operand_bytes;
    let accumulators = kernel.out_height * blocking.out_width * kernel.result_bytes;
    blocking.args.max_threads * (panels + accumulators)
}

impl<To: Operand, Tr: Accumulator<To>> GemmCommon<To, Tr> for GemmInterleaved<To, Tr> {
    fn name(&self) -> &'static str {
        self.blocking.kernel.name
    }

    fn method(&self) -> GemmMethod {
        GemmMethod::GemmInterleaved
    }

    fn args(&self) -> &GemmArgs {
        &self.blocking.args
    }

    fn window_size(&self) -> usize {
        let args = &self.blocking.args;
        self.blocking.row_blocks() * args.nbatches * args.nmulti
    }

    fn working_size(&self) -> usize {
        interleaved_working_size(&self.blocking, self.k_block)
    }

    fn pretransposed_b_size(&self) -> usize {
        self.blocking.packed_b_bytes()
    }

    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>> {
        let tile = self.blocking.tile(self.k_block);
        self.blocking.per_batch(a, b, tile, Split::Rows)
    }
}

/// Interleaved packing with threads spread over row and column blocks.
pub struct GemmInterleaved2d<To, Tr> {
    blocking: Blocking,
    k_block: usize,
    _types: PhantomData<fn() -> (To, Tr)>,
}

impl<To: Operand, Tr: Accumulator<To>> GemmInterleaved2d<To, Tr> {
    pub fn new(args: &GemmArgs, kernel: &'static KernelDescriptor) -> Self {
        Self {
            blocking: Blocking::new(args, kernel),
            k_block: k_block_size(args, kernel),
            _types: PhantomData,
        }
    }
}

impl<To: Operand, Tr: Accumulator<To>> GemmCommon<To, Tr> for GemmInterleaved2d<To, Tr> {
    fn name(&self) -> &'static str {
        self.blocking.kernel.name
    }

    fn method(&self) -> GemmMethod {
        GemmMethod::GemmInterleaved2d
    }

    fn args(&self) -> &GemmArgs {
        &self.blocking.args
    }

    fn window_size(&self) -> usize {
        let args = &self.blocking.args;
        self.blocking.row_blocks() * self.blocking.col_blocks() * args.nbatches * args.nmulti
    }

    fn working_size(&self) -> usize {
        interleaved_working_size(&self.blocking, self.k_block)
    }

    fn pretransposed_b_size(&self) -> usize {
        self.blocking.packed_b_bytes()
    }

    fn execute(&self, a: ArrayView4<'_, To>, b: ArrayView3<'_, To>) -> Result<Array4<Tr>> {
        let tile = self.blocking.tile(self.k_block);
        self.blocking.per_batch(a, b, tile, Split::RowsAndCols)
    }
}
