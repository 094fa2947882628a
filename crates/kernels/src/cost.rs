//! Cycle estimators used to rank interchangeable GEMM strategies.
//!
//! Estimates are relative: they only need to order strategies for the same
//! problem on the same CPU. All of them are non-decreasing in M, N and K for
//! a fixed thread count.

use crate::config::GemmArgs;
use crate::perf::KernelDescriptor;
use crate::utils::{iceildiv, roundup};

/// Fraction of blocks assumed to keep a thread busy.
const PARALLEL_EFFICIENCY: f64 = 0.9;

/// K block for interleaved strategies: the packed A and B panels of one
/// block should fit in half the L1 cache.
pub fn k_block_size(args: &GemmArgs, kernel: &KernelDescriptor) -> usize {
    let ku = kernel.k_unroll.max(1);
    let out_width = kernel.out_width(&args.ci);
    let panel = kernel.operand_bytes.max(1) * kernel.out_height.max(out_width).max(1);

    let mut k_block = (args.ci.l1_cache_bytes / 2) / panel;
    k_block = (k_block / ku).max(1) * ku;

    let k_total = roundup(args.k, ku);
    let num_k_blocks = iceildiv(k_total, k_block);
    roundup(iceildiv(k_total, num_k_blocks), ku)
}

fn total_macs(args: &GemmArgs, kernel: &KernelDescriptor, rows: usize) -> f64 {
    let out_width = kernel.out_width(&args.ci);
    args.nbatches as f64
        * args.nmulti as f64
        * rows as f64
        * roundup(args.n, out_width) as f64
        * roundup(args.k, kernel.k_unroll) as f64
}

fn parallel_penalty(threads: usize, blocks: f64) -> f64 {
    let available = blocks * PARALLEL_EFFICIENCY;
    if threads > 1 && available < threads as f64 {
        threads as f64 / available
    } else {
        1.0
    }
}

/// Hybrid strategies stream A unpacked and only pay for MACs.
pub fn hybrid_cycles(args: &GemmArgs, kernel: &KernelDescriptor) -> u64 {
    let params = kernel.performance_parameters(&args.ci);
    let cycles = total_macs(args, kernel, args.m) / f64::from(params.kernel_macs_cycle);
    cycles.round() as u64
}

struct InterleavedTerms {
    mac_cycles: f64,
    prepare_cycles: f64,
    merge_cycles: f64,
}

fn interleaved_terms(args: &GemmArgs, kernel: &KernelDescriptor) -> InterleavedTerms {
    let params = kernel.performance_parameters(&args.ci);
    let out_width = kernel.out_width(&args.ci);
    let rows = roundup(args.m, kernel.out_height);
    let k_blocks = iceildiv(args.k, k_block_size(args, kernel));
    let outer = args.nbatches as f64 * args.nmulti as f64;

    let prepare_bytes = outer
        * rows as f64
        * roundup(args.k, kernel.k_unroll) as f64
        * kernel.operand_bytes as f64;
    let merge_bytes = outer
        * k_blocks as f64
        * args.m as f64
        * roundup(args.n, out_width) as f64
        * kernel.result_bytes as f64;

    InterleavedTerms {
        mac_cycles: total_macs(args, kernel, rows) / f64::from(params.kernel_macs_cycle),
        prepare_cycles: prepare_bytes / f64::from(params.prepare_bytes_cycle),
        merge_cycles: merge_bytes / f64::from(params.merge_bytes_cycle),
    }
}

/// Interleaved strategies threaded over row blocks of M (and batches).
pub fn interleaved_cycles(args: &GemmArgs, kernel: &KernelDescriptor) -> u64 {
    let terms = interleaved_terms(args, kernel);
    let blocks = iceildiv(args.m, kernel.out_height) as f64 * args.nbatches as f64;
    let total = terms.mac_cycles + terms.prepare_cycles + terms.merge_cycles;
    (total * parallel_penalty(args.max_threads, blocks)).round() as u64
}

/// Interleaved strategies threaded over a 2D grid of row and column blocks.
/// Packing and merging are shared, so only the MACs pay for idle threads.
pub fn interleaved_2d_cycles(args: &GemmArgs, kernel: &KernelDescriptor) -> u64 {
    let terms = interleaved_terms(args, kernel);
    let out_width = kernel.out_width(&args.ci);
    let blocks = iceildiv(args.m, kernel.out_height) as f64 * iceildiv(args.n, out_width) as f64;
    let total = terms.mac_cycles * parallel_penalty(args.max_threads, blocks)
        + terms.prepare_cycles
        + terms.merge_cycles;
    total.round() as u64
}
