// Clip slicer - fixed-length, non-overlapping partition of a waveform
//
// Clips start at offset 0 and advance by exactly `clip_samples`. A trailing
// remainder shorter than one clip is dropped; nothing is ever padded.

use serde::{Deserialize, Serialize};

use crate::audio::waveform::Waveform;
use crate::error::{PipelineError, Result};

/// Class identifier attached to a clip
///
/// The id is the label's position in the configured label list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

impl Label {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Ordered set of class names; ids follow list order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(PipelineError::invalid_config(
                "label set must name at least one class",
            ));
        }
        for (idx, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(PipelineError::invalid_config("label names must not be empty"));
            }
            if names[..idx].contains(name) {
                return Err(PipelineError::invalid_config(format!(
                    "label '{}' listed twice",
                    name
                )));
            }
        }
        Ok(Self { names })
    }

    pub fn label(&self, name: &str) -> Option<Label> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| Label(idx as u32))
    }

    pub fn name(&self, label: Label) -> Option<&str> {
        self.names.get(label.0 as usize).map(String::as_str)
    }

    /// Labels paired with their names, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Label, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (Label(idx as u32), name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A waveform of exactly one clip length, tagged with its class
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub waveform: Waveform,
    pub label: Label,
}

/// Split `waveform` into consecutive clips of exactly `clip_samples`.
///
/// Returns an empty vector when the waveform is shorter than one clip.
pub fn slice_clips(waveform: &Waveform, clip_samples: usize) -> Result<Vec<Waveform>> {
    if clip_samples == 0 {
        return Err(PipelineError::invalid_config("clip_samples must be > 0"));
    }

    waveform
        .samples()
        .chunks_exact(clip_samples)
        .map(|chunk| Waveform::new(chunk.to_vec(), waveform.sample_rate()))
        .collect()
}

/// Slice and tag every clip with `label`.
pub fn slice_labeled(waveform: &Waveform, clip_samples: usize, label: Label) -> Result<Vec<Clip>> {
    Ok(slice_clips(waveform, clip_samples)?
        .into_iter()
        .map(|waveform| Clip { waveform, label })
        .collect())
}
