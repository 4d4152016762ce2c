// Audio module - decoding boundary, resampling and clip slicing
//
// Everything here runs in the offline preprocessing stage, before any
// spectral analysis: decode -> downmix -> resample -> slice.

pub mod resampler;
pub mod slicer;
pub mod synthetic;
pub mod waveform;
pub mod wav;

pub use resampler::Resampler;
pub use slicer::{slice_clips, slice_labeled, Clip, Label, LabelSet};
pub use waveform::{DecodedAudio, Waveform};
pub use wav::{load_waveform, read_wav, write_wav};
