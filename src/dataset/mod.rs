// Dataset module - labeled clip layout on disk
//
// This module provides three components:
// 1. preprocess: Slice raw recordings into fixed-length clips
// 2. inspect: Sanity-check stored clips against the configuration
// 3. ClipDataset: Indexed (features, label) access for training code
//
// On-disk layout:
//   <raw_dir>/<label>/*.wav            long recordings, any rate/channels
//   <clips_dir>/<label>/<stem>_NNNN.wav mono clips at the canonical rate

use std::fs;
use std::path::{Path, PathBuf};

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use crate::analysis::features::FeatureTensor;
use crate::analysis::FeaturePipeline;
use crate::audio::{load_waveform, Label, LabelSet};
use crate::error::{PipelineError, Result};

pub mod inspect;
pub mod preprocess;

pub use inspect::{check_split, check_split_with_tolerance, ClipCheckReport, ClipWarning};
pub use preprocess::{clip_file_name, slice_split, FileSliceCount, SliceReport};

/// Sorted `*.wav` files directly inside `dir`.
///
/// A missing directory yields an empty list.
pub fn list_wav_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| PipelineError::io(dir, e))? {
        let entry = entry.map_err(|e| PipelineError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if is_wav {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// One stored clip and its class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetEntry {
    pub path: PathBuf,
    pub label: Label,
}

/// Clip index over `<root>/<label>/*.wav`
///
/// Entries are ordered by label id, then by file name. Features are computed
/// on access; nothing is cached per clip.
#[derive(Debug, Clone)]
pub struct ClipDataset {
    root: PathBuf,
    entries: Vec<DatasetEntry>,
}

impl ClipDataset {
    /// Index every clip under `root` for the given labels.
    pub fn discover(root: impl AsRef<Path>, labels: &LabelSet) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut entries = Vec::new();

        for (label, name) in labels.iter() {
            let files = list_wav_files(&root.join(name))?;
            debug!(label = name, clips = files.len(), "indexed label directory");
            entries.extend(files.into_iter().map(|path| DatasetEntry { path, label }));
        }

        info!(root = %root.display(), clips = entries.len(), "dataset discovered");
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[DatasetEntry] {
        &self.entries
    }

    /// Number of clips carrying `label`.
    pub fn count_for(&self, label: Label) -> usize {
        self.entries.iter().filter(|e| e.label == label).count()
    }

    /// Decode, resample and featurize clip `idx`.
    ///
    /// # Errors
    /// `InvalidConfig` for an out-of-range index, `DecodeError` for an
    /// unreadable clip
    pub fn get(&self, idx: usize, pipeline: &FeaturePipeline) -> Result<(FeatureTensor, Label)> {
        let entry = self.entries.get(idx).ok_or_else(|| {
            PipelineError::invalid_config(format!(
                "dataset index {} out of range ({} clips)",
                idx,
                self.entries.len()
            ))
        })?;

        let waveform = load_waveform(&entry.path, pipeline.config().sample_rate)?;
        let tensor = pipeline.extract(&waveform)?;
        Ok((tensor, entry.label))
    }

    /// Shuffle indices with a seeded generator and split them into
    /// `(train, validation)`; the train side holds `floor(fraction * len)`.
    pub fn split_indices(&self, train_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
        if !(0.0..=1.0).contains(&train_fraction) {
            return Err(PipelineError::invalid_config(format!(
                "train_fraction must be within [0, 1] (got {})",
                train_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..self.entries.len()).collect();
        indices.shuffle(&mut StdRng::seed_from_u64(seed));

        let train_len = (train_fraction * self.entries.len() as f64).floor() as usize;
        let validation = indices.split_off(train_len);
        Ok((indices, validation))
    }
}
