// Preprocess - slice long recordings into fixed-length training clips
//
// For each raw recording of a label: decode, downmix, resample to the
// canonical rate, cut into non-overlapping clips and write each clip as
// `<stem>_<NNNN>.wav`. The trailing partial clip is dropped.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::audio::{load_waveform, slice_clips, write_wav};
use crate::config::FeatureConfig;
use crate::error::{PipelineError, Result};

use super::list_wav_files;

/// Clip file name: source stem plus a 4-digit zero-padded index.
pub fn clip_file_name(stem: &str, index: usize) -> String {
    format!("{}_{:04}.wav", stem, index)
}

/// Clips produced from one source recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSliceCount {
    pub source: PathBuf,
    pub clips: usize,
}

/// Outcome of slicing one label directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SliceReport {
    pub label: String,
    pub output_dir: PathBuf,
    pub files: Vec<FileSliceCount>,
    pub total_clips: usize,
}

/// Slice every recording in `raw_root/label` into `clips_root/label`.
///
/// Files are processed in sorted order and the output directory is created
/// when missing. A recording shorter than one clip contributes zero clips.
///
/// # Errors
/// `DecodeError` for an unreadable recording, `Io` when the output directory
/// or a clip cannot be written, `InvalidConfig` for an invalid configuration
pub fn slice_split(
    raw_root: &Path,
    clips_root: &Path,
    label: &str,
    config: &FeatureConfig,
) -> Result<SliceReport> {
    config.validate()?;

    let input_dir = raw_root.join(label);
    let output_dir = clips_root.join(label);
    fs::create_dir_all(&output_dir).map_err(|e| PipelineError::io(&output_dir, e))?;

    let sources = list_wav_files(&input_dir)?;
    if sources.is_empty() {
        warn!(dir = %input_dir.display(), "no recordings found");
    }

    let clip_samples = config.clip_samples();
    let mut files = Vec::with_capacity(sources.len());
    let mut total_clips = 0;

    for source in sources {
        let waveform = load_waveform(&source, config.sample_rate)?;
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("clip")
            .to_string();

        let clips = slice_clips(&waveform, clip_samples)?;
        for (index, clip) in clips.iter().enumerate() {
            write_wav(&output_dir.join(clip_file_name(&stem, index)), clip)?;
        }

        info!(
            file = %source.display(),
            clips = clips.len(),
            "sliced recording"
        );
        total_clips += clips.len();
        files.push(FileSliceCount {
            source,
            clips: clips.len(),
        });
    }

    info!(label, total_clips, "label sliced");

    Ok(SliceReport {
        label: label.to_string(),
        output_dir,
        files,
        total_clips,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{read_wav, synthetic::sine, Waveform};

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "snore_preprocess_{}_{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_clip_file_name_is_zero_padded() {
        assert_eq!(clip_file_name("night1", 0), "night1_0000.wav");
        assert_eq!(clip_file_name("night1", 42), "night1_0042.wav");
        assert_eq!(clip_file_name("a", 12345), "a_12345.wav");
    }

    #[test]
    fn test_slice_split_writes_named_clips() {
        let root = scratch_dir("named");
        let raw = root.join("raw");
        let clips = root.join("clips");
        fs::create_dir_all(raw.join("snore")).unwrap();

        let five_seconds = Waveform::new(sine(16_000, 220.0, 80_000, 0.4), 16_000).unwrap();
        write_wav(&raw.join("snore").join("night.wav"), &five_seconds).unwrap();
        // 1.5 s: one full clip, remainder dropped
        let short = Waveform::new(sine(16_000, 110.0, 24_000, 0.4), 16_000).unwrap();
        write_wav(&raw.join("snore").join("another.wav"), &short).unwrap();

        let report = slice_split(&raw, &clips, "snore", &FeatureConfig::default()).unwrap();
        assert_eq!(report.total_clips, 6);
        assert_eq!(report.files.len(), 2);
        // Sorted: another.wav before night.wav
        assert_eq!(report.files[0].clips, 1);
        assert_eq!(report.files[1].clips, 5);

        let written = list_wav_files(&clips.join("snore")).unwrap();
        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![
                "another_0000.wav",
                "night_0000.wav",
                "night_0001.wav",
                "night_0002.wav",
                "night_0003.wav",
                "night_0004.wav",
            ]
        );

        // Clip 2 holds samples [32000, 48000) of the source
        let third = read_wav(&clips.join("snore").join("night_0002.wav")).unwrap();
        assert_eq!(third.sample_rate(), 16_000);
        assert_eq!(third.frames(), 16_000);
        assert_eq!(third.interleaved(), &five_seconds.samples()[32_000..48_000]);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_slice_split_resamples_to_canonical_rate() {
        let root = scratch_dir("resample");
        let raw = root.join("raw");
        let clips = root.join("clips");
        fs::create_dir_all(raw.join("non_snore")).unwrap();

        let two_seconds = Waveform::new(sine(48_000, 440.0, 96_000, 0.5), 48_000).unwrap();
        write_wav(&raw.join("non_snore").join("hum.wav"), &two_seconds).unwrap();

        let report = slice_split(&raw, &clips, "non_snore", &FeatureConfig::default()).unwrap();
        assert_eq!(report.total_clips, 2);
        let clip = read_wav(&clips.join("non_snore").join("hum_0001.wav")).unwrap();
        assert_eq!(clip.sample_rate(), 16_000);
        assert_eq!(clip.frames(), 16_000);

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_missing_input_dir_yields_empty_report() {
        let root = scratch_dir("missing");
        let report = slice_split(
            &root.join("raw"),
            &root.join("clips"),
            "snore",
            &FeatureConfig::default(),
        )
        .unwrap();
        assert_eq!(report.total_clips, 0);
        assert!(report.files.is_empty());
        assert!(root.join("clips").join("snore").is_dir());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_corrupt_recording_is_decode_error() {
        let root = scratch_dir("corrupt");
        let raw = root.join("raw");
        fs::create_dir_all(raw.join("snore")).unwrap();
        fs::write(raw.join("snore").join("broken.wav"), b"not a wav file").unwrap();

        let result = slice_split(&raw, &root.join("clips"), "snore", &FeatureConfig::default());
        assert!(matches!(result, Err(PipelineError::DecodeError { .. })));

        fs::remove_dir_all(&root).unwrap();
    }
}
