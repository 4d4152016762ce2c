use super::*;
use crate::audio::synthetic::{sine, white_noise};
use crate::config::NormalizationConfig;
use crate::error::ErrorCode;

fn clip(samples: Vec<f32>) -> Waveform {
    Waveform::new(samples, 16_000).unwrap()
}

#[test]
fn test_one_second_clip_yields_expected_tensor() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let tensor = pipeline.extract(&clip(white_noise(16_000, 0.5, 3))).unwrap();
    assert_eq!(tensor.shape(), [1, 64, 59]);
    assert_eq!(tensor.data.len(), 64 * 59);
    assert!(tensor.data.iter().all(|v| v.is_finite()));
}

#[test]
fn test_silent_clip_is_log_eps_everywhere() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let tensor = pipeline.extract(&clip(vec![0.0; 16_000])).unwrap();
    let floor = (1e-9f32).ln();
    assert!(tensor.data.iter().all(|&v| (v - floor).abs() < 1e-5));
}

#[test]
fn test_short_clip_yields_zero_frames() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let tensor = pipeline.extract(&clip(vec![0.1; 1_000])).unwrap();
    assert_eq!(tensor.shape(), [1, 64, 0]);
    assert!(tensor.data.is_empty());
}

#[test]
fn test_rate_mismatch_is_rejected() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let wrong = Waveform::new(vec![0.0; 48_000], 48_000).unwrap();
    let err = pipeline.extract(&wrong).unwrap_err();
    assert!(matches!(err, PipelineError::InvalidConfig { .. }));
    assert_eq!(err.code(), 3002);
}

#[test]
fn test_invalid_config_fails_at_construction() {
    let config = FeatureConfig {
        hop_length: 0,
        ..Default::default()
    };
    assert!(matches!(
        FeaturePipeline::new(&config),
        Err(PipelineError::InvalidConfig { .. })
    ));
}

#[test]
fn test_filterbank_shared_between_pipelines() {
    let cache = FilterbankCache::new();
    let config = FeatureConfig::default();
    let a = FeaturePipeline::with_cache(&config, &cache).unwrap();
    let b = FeaturePipeline::with_cache(&config, &cache).unwrap();
    assert!(Arc::ptr_eq(a.filterbank(), b.filterbank()));
    assert!(Arc::ptr_eq(a.filterbank(), a.clone().filterbank()));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_pipelines_with_different_configs_coexist() {
    let cache = FilterbankCache::new();
    let small = FeatureConfig {
        n_fft: 512,
        hop_length: 128,
        n_mels: 40,
        ..Default::default()
    };
    let a = FeaturePipeline::with_cache(&FeatureConfig::default(), &cache).unwrap();
    let b = FeaturePipeline::with_cache(&small, &cache).unwrap();

    let waveform = clip(white_noise(16_000, 0.5, 9));
    assert_eq!(a.extract(&waveform).unwrap().shape(), [1, 64, 59]);
    // floor((16000 - 512) / 128) + 1 = 122
    assert_eq!(b.extract(&waveform).unwrap().shape(), [1, 40, 122]);
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_extraction_is_deterministic() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let waveform = clip(white_noise(16_000, 0.7, 42));
    assert_eq!(
        pipeline.extract(&waveform).unwrap(),
        pipeline.extract(&waveform).unwrap()
    );
}

#[test]
fn test_batch_matches_sequential_and_keeps_order() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let waveforms: Vec<Waveform> = (0..7)
        .map(|i| clip(sine(16_000, 200.0 + 150.0 * i as f32, 16_000, 0.5)))
        .collect();

    let sequential: Vec<FeatureTensor> = waveforms
        .iter()
        .map(|w| pipeline.extract(w).unwrap())
        .collect();

    for workers in [1, 3, 4, 16] {
        let batch = pipeline.extract_batch(&waveforms, workers);
        assert_eq!(batch.len(), waveforms.len());
        for (got, want) in batch.into_iter().zip(&sequential) {
            assert_eq!(&got.unwrap(), want);
        }
    }
}

#[test]
fn test_batch_reports_failures_per_clip() {
    let pipeline = FeaturePipeline::new(&FeatureConfig::default()).unwrap();
    let waveforms = vec![
        clip(white_noise(16_000, 0.5, 1)),
        Waveform::new(vec![0.0; 8_000], 8_000).unwrap(),
        clip(white_noise(16_000, 0.5, 2)),
    ];
    let results = pipeline.extract_batch(&waveforms, 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert!(results[2].is_ok());
    assert!(pipeline.extract_batch(&[], 4).is_empty());
}

#[test]
fn test_normalized_pipeline_output_is_bounded() {
    let config = FeatureConfig {
        normalization: Some(NormalizationConfig::default()),
        ..Default::default()
    };
    let pipeline = FeaturePipeline::new(&config).unwrap();
    let tensor = pipeline.extract(&clip(white_noise(16_000, 1.0, 5))).unwrap();
    assert!(tensor.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}
