use anyhow::Result;
use approx::assert_abs_diff_eq;
use gemmsel::dispatch::{GEMM_FP32_METHODS, GEMM_S8_METHODS};
use gemmsel::{
    BuildCapabilities, CpuInfo, CpuModel, Extension, ExtensionSet, GemmArgs, GemmConfig,
    GemmMethod, GemmTypes, Registry, Scoring, TargetArch,
};
use half::f16;
use ndarray::{s, Array3, Array4};
use std::sync::Arc;

const MODELS: [CpuModel; 8] = [
    CpuModel::Generic,
    CpuModel::A53,
    CpuModel::A55r0,
    CpuModel::A55r1,
    CpuModel::A73,
    CpuModel::A510,
    CpuModel::X1,
    CpuModel::V1,
];

fn builds() -> [BuildCapabilities; 5] {
    [
        BuildCapabilities::portable(),
        BuildCapabilities::new(TargetArch::Aarch32),
        BuildCapabilities::new(TargetArch::Aarch64),
        BuildCapabilities::all_aarch64().without_extension(Extension::Sve),
        BuildCapabilities::all_aarch64(),
    ]
}

fn random_cpu(rng: &mut fastrand::Rng) -> CpuInfo {
    let extensions: ExtensionSet = Extension::ALL
        .into_iter()
        .filter(|_| rng.bool())
        .collect();
    CpuInfo::generic()
        .with_model(MODELS[rng.usize(..MODELS.len())])
        .with_extensions(extensions)
        .with_l1_cache_bytes([16, 32, 64][rng.usize(..3)] * 1024)
        .with_sve_vector_bits([128, 256, 512][rng.usize(..3)])
}

fn random_args(rng: &mut fastrand::Rng) -> GemmArgs {
    let m = if rng.u8(..4) == 0 { 1 } else { rng.usize(1..512) };
    GemmArgs::new(
        Arc::new(random_cpu(rng)),
        m,
        rng.usize(1..2048),
        rng.usize(1..1024),
    )
    .with_batches(rng.usize(1..10))
    .with_multis(rng.usize(1..4))
    .with_max_threads(rng.usize(1..33))
    .with_pretransposed_hint(rng.bool())
}

fn sve_cpu(model: CpuModel, bits: usize) -> Arc<CpuInfo> {
    Arc::new(
        CpuInfo::generic()
            .with_model(model)
            .with_extension(Extension::Sve)
            .with_sve_vector_bits(bits),
    )
}

#[test]
fn well_formed_problems_always_get_a_strategy() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(17);
    for build in builds() {
        let fp32 = <f32 as GemmTypes<f32>>::registry(build);
        let fp16 = <f16 as GemmTypes<f16>>::registry(build);
        let s8 = <i8 as GemmTypes<i32>>::registry(build);
        let u8s = <u8 as GemmTypes<u32>>::registry(build);

        for _ in 0..150 {
            let args = random_args(&mut rng);
            assert!(!fp32.select(&args)?.is_terminal());
            assert!(!fp16.select(&args)?.is_terminal());
            assert!(!s8.select(&args)?.is_terminal());
            assert!(!u8s.select(&args)?.is_terminal());

            let chosen = fp32.select(&args)?;
            let executor = fp32.instantiate_best(&args)?;
            assert_eq!(executor.method(), chosen.method);
            assert!(executor.window_size() >= 1);
        }
    }
    Ok(())
}

#[test]
fn selection_is_deterministic() -> Result<()> {
    let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    let mut rng = fastrand::Rng::with_seed(23);
    for _ in 0..200 {
        let args = random_args(&mut rng);
        let first = registry.describe(&args)?;
        let second = registry.describe(&args.clone())?;
        assert_eq!(first, second);
    }
    Ok(())
}

fn check_selection_rules<To, Tr>(registry: &Registry<To, Tr>, args: &GemmArgs) -> Result<()>
where
    To: GemmTypes<Tr>,
    Tr: gemmsel::kernels::Accumulator<To>,
{
    let chosen = registry.select(args)?;
    let usable: Vec<_> = registry
        .candidates()
        .filter(|record| record.is_usable(args))
        .collect();

    if let Some(preferred) = usable
        .iter()
        .find(|record| record.is_preferred(args) == Some(true))
    {
        assert_eq!(chosen.name, preferred.name);
        return Ok(());
    }

    let estimates: Vec<_> = usable
        .iter()
        .filter_map(|record| record.estimate_cost(args).map(|cost| (record.name, cost)))
        .collect();
    if let Some(&(_, best)) = estimates.iter().min_by_key(|(_, cost)| *cost) {
        let expected = estimates
            .iter()
            .find(|(_, cost)| *cost == best)
            .map(|(name, _)| *name);
        assert_eq!(Some(chosen.name), expected);
        assert_eq!(chosen.estimate_cost(args), Some(best));
        return Ok(());
    }

    let fallback = usable
        .iter()
        .find(|record| matches!(record.scoring, Scoring::None))
        .or_else(|| usable.iter().find(|record| record.is_preferred(args) == Some(false)))
        .map(|record| record.name);
    match fallback {
        Some(name) => assert_eq!(chosen.name, name),
        None => assert!(usable.is_empty() && chosen.is_terminal()),
    }
    Ok(())
}

#[test]
fn preference_then_cost_then_fallback() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(29);
    for build in builds() {
        let fp32 = <f32 as GemmTypes<f32>>::registry(build);
        let s8 = <i8 as GemmTypes<i32>>::registry(build);
        for _ in 0..200 {
            let args = random_args(&mut rng);
            check_selection_rules(&fp32, &args)?;
            check_selection_rules(&s8, &args)?;
        }
    }
    Ok(())
}

#[test]
fn method_filter_keeps_preference_gated_hybrids_runnable() -> Result<()> {
    let registry = <f16 as GemmTypes<f16>>::registry(BuildCapabilities::all_aarch64());
    let cpu = Arc::new(CpuInfo::generic().with_extension(Extension::Fp16));
    let args = GemmArgs::new(cpu, 64, 1000, 1000)
        .with_config(GemmConfig::default().with_method(GemmMethod::GemmHybrid));

    let usable: Vec<_> = registry
        .compatible_kernels(&args)?
        .into_iter()
        .map(|kernel| kernel.name)
        .collect();
    assert_eq!(usable, vec!["hybrid_fp16_mla_16x4".to_string()]);

    let chosen = registry.describe(&args)?;
    assert_eq!(chosen.name, "hybrid_fp16_mla_16x4");
    assert!(!chosen.is_default);
    let executor = registry.instantiate_best(&args)?;
    assert_eq!(executor.method(), GemmMethod::GemmHybrid);
    Ok(())
}

#[test]
fn filters_never_strand_a_listed_kernel() -> Result<()> {
    let mut rng = fastrand::Rng::with_seed(41);
    let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    let methods = [
        GemmMethod::GemvBatched,
        GemmMethod::GemvPretransposed,
        GemmMethod::GemmHybrid,
        GemmMethod::GemmInterleaved,
        GemmMethod::GemmInterleaved2d,
    ];
    for _ in 0..200 {
        let method = methods[rng.usize(..methods.len())];
        let args = random_args(&mut rng).with_config(GemmConfig::default().with_method(method));
        let listed = registry.compatible_kernels(&args)?;
        let chosen = registry.describe(&args)?;
        assert_eq!(chosen.is_default, listed.is_empty());
        if !listed.is_empty() {
            assert!(registry.instantiate_best(&args).is_ok());
        }
    }
    Ok(())
}

#[test]
fn single_row_prefers_pretransposed_gemv_on_aarch64() -> Result<()> {
    let args = GemmArgs::new(Arc::new(CpuInfo::generic()), 1, 1024, 512).with_max_threads(4);

    let aarch64 = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    let chosen = aarch64.select(&args)?;
    assert_eq!(chosen.method, GemmMethod::GemvPretransposed);
    assert_eq!(chosen.name, "sgemv_pretransposed");

    let portable = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::portable());
    assert_ne!(portable.select(&args)?.method, GemmMethod::GemvPretransposed);
    Ok(())
}

#[test]
fn batched_single_rows_pick_batched_gemv() -> Result<()> {
    let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    let mut rng = fastrand::Rng::with_seed(31);
    for _ in 0..100 {
        let args = GemmArgs::new(
            Arc::new(random_cpu(&mut rng)),
            1,
            rng.usize(1..5000),
            rng.usize(1..5000),
        )
        .with_batches(8);
        assert_eq!(registry.select(&args)?.method, GemmMethod::GemvBatched);
    }
    Ok(())
}

#[test]
fn sve_hybrid_wins_tiny_k_only_when_cheapest() -> Result<()> {
    let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());

    for (model, bits) in [
        (CpuModel::Generic, 128),
        (CpuModel::V1, 128),
        (CpuModel::V1, 256),
        (CpuModel::Generic, 512),
        (CpuModel::A510, 128),
    ] {
        let args = GemmArgs::new(sve_cpu(model, bits), 64, 4000, 4);
        let listed = registry.compatible_kernels(&args)?;
        let sve_hybrid = listed
            .iter()
            .find(|kernel| kernel.name == "hybrid_fp32_mla_4VLx4")
            .and_then(|kernel| kernel.cycle_estimate)
            .expect("sve hybrid is usable for K=4");
        let others_best = listed
            .iter()
            .filter(|kernel| kernel.name != "hybrid_fp32_mla_4VLx4")
            .filter_map(|kernel| kernel.cycle_estimate)
            .min()
            .expect("interleaved kernels are always usable on aarch64");

        let chosen = registry.describe(&args)?;
        if sve_hybrid <= others_best {
            assert_eq!(chosen.name, "hybrid_fp32_mla_4VLx4");
        } else {
            assert_ne!(chosen.name, "hybrid_fp32_mla_4VLx4");
            assert_eq!(chosen.cycle_estimate, Some(others_best));
        }
    }

    // A wider vector makes the scalable hybrid decisively cheaper.
    let wide = GemmArgs::new(sve_cpu(CpuModel::V1, 256), 64, 4000, 4);
    assert_eq!(registry.describe(&wide)?.name, "hybrid_fp32_mla_4VLx4");
    Ok(())
}

#[test]
fn excluded_extensions_never_become_candidates() -> Result<()> {
    let no_sve = BuildCapabilities::all_aarch64().without_extension(Extension::Sve);
    let registry = <f32 as GemmTypes<f32>>::registry(no_sve);
    assert!(registry
        .candidates()
        .all(|record| !record.requires.extensions.contains(Extension::Sve)));
    assert!(registry.find("hybrid_fp32_mla_4VLx4").is_none());

    let every_extension = Extension::ALL.into_iter().collect::<ExtensionSet>();
    let args = GemmArgs::new(
        Arc::new(CpuInfo::generic().with_extensions(every_extension)),
        64,
        4000,
        4,
    );
    for kernel in registry.compatible_kernels(&args)? {
        assert!(!kernel.name.contains("VL"), "{} leaked into the registry", kernel.name);
    }

    let full = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    assert!(full.len() > registry.len());
    assert_eq!(full.candidates().count(), GEMM_FP32_METHODS.len() - 2);
    Ok(())
}

#[test]
fn quantized_small_k_needs_pretransposition() -> Result<()> {
    let registry = <i8 as GemmTypes<i32>>::registry(BuildCapabilities::all_aarch64());
    let cpu = Arc::new(CpuInfo::generic().with_extension(Extension::Dotprod));
    let args = GemmArgs::new(cpu, 128, 64, 16);

    let chosen = registry.select(&args)?;
    assert_ne!(chosen.name, "smallK_hybrid_s8s32_dot_4x8");
    assert!(matches!(chosen.scoring, Scoring::Estimated(_)));

    let hinted = args.clone().with_pretransposed_hint(true);
    assert_eq!(registry.select(&hinted)?.name, "smallK_hybrid_s8s32_dot_4x8");
    assert!(GEMM_S8_METHODS.iter().any(|record| record.name == "gemm_s8_12x8"));
    Ok(())
}

#[test]
fn selected_strategies_compute_the_product() -> Result<()> {
    let registry = <f32 as GemmTypes<f32>>::registry(BuildCapabilities::all_aarch64());
    let mut rng = fastrand::Rng::with_seed(37);

    for (m, n, k, batches) in [(1, 33, 17, 1), (1, 20, 9, 5), (40, 8, 12, 1), (29, 70, 3, 2), (65, 45, 300, 1)] {
        let args = GemmArgs::new(Arc::new(CpuInfo::generic()), m, n, k)
            .with_batches(batches)
            .with_max_threads(4);
        let executor = registry.instantiate_best(&args)?;

        let a = Array4::from_shape_fn((1, batches, m, k), |_| rng.f32() - 0.5);
        let b = Array3::from_shape_fn((1, k, n), |_| rng.f32() - 0.5);
        let c = executor.execute(a.view(), b.view())?;

        for batch in 0..batches {
            let lhs_view: ndarray::ArrayView2<f32> = a.slice(s![0, batch, .., ..]);
            let rhs_view: ndarray::ArrayView2<f32> = b.slice(s![0, .., ..]);
            let expected = lhs_view.dot(&rhs_view);
            let actual = c.slice(s![0, batch, .., ..]);
            for (lhs, rhs) in actual.iter().zip(expected.iter()) {
                assert_abs_diff_eq!(*lhs, *rhs, epsilon = 1e-3);
            }
        }
    }
    Ok(())
}
