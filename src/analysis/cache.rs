//! Configuration-keyed filterbank cache.
//!
//! A filterbank depends only on `(n_fft, n_mels, sample_rate, f_min, f_max)`,
//! so it is built once per key and handed out as a shared `Arc`. Callers
//! never rebuild it per clip and never mutate it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::analysis::features::MelFilterbank;
use crate::config::FeatureConfig;
use crate::error::Result;

/// Process-wide cache shared by pipelines that do not bring their own.
static GLOBAL_CACHE: Lazy<FilterbankCache> = Lazy::new(FilterbankCache::default);

/// Identity of a filterbank; frequencies compare by bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterbankKey {
    pub n_fft: usize,
    pub n_mels: usize,
    pub sample_rate: u32,
    f_min_bits: u64,
    f_max_bits: u64,
}

impl FilterbankKey {
    pub fn new(n_fft: usize, n_mels: usize, sample_rate: u32, f_min: f64, f_max: f64) -> Self {
        Self {
            n_fft,
            n_mels,
            sample_rate,
            f_min_bits: f_min.to_bits(),
            f_max_bits: f_max.to_bits(),
        }
    }

    pub fn from_config(config: &FeatureConfig) -> Self {
        Self::new(
            config.n_fft,
            config.n_mels,
            config.sample_rate,
            config.f_min,
            config.f_max_hz(),
        )
    }

    pub fn f_min(&self) -> f64 {
        f64::from_bits(self.f_min_bits)
    }

    pub fn f_max(&self) -> f64 {
        f64::from_bits(self.f_max_bits)
    }
}

/// Build-once store of immutable filterbanks
#[derive(Debug, Default)]
pub struct FilterbankCache {
    entries: Mutex<HashMap<FilterbankKey, Arc<MelFilterbank>>>,
}

impl FilterbankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the process-wide cache.
    pub fn global() -> &'static FilterbankCache {
        &GLOBAL_CACHE
    }

    /// Return the filterbank for `key`, building it on first request.
    ///
    /// The build runs under the cache lock, so concurrent first requests for
    /// the same key still produce a single instance.
    pub fn get_or_build(&self, key: FilterbankKey) -> Result<Arc<MelFilterbank>> {
        // Entries are inserted only once fully built, so a poisoned map is still consistent.
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = entries.get(&key) {
            return Ok(Arc::clone(existing));
        }

        let filterbank = Arc::new(MelFilterbank::build(
            key.n_fft,
            key.n_mels,
            key.sample_rate,
            key.f_min(),
            key.f_max(),
        )?);

        let degenerate = filterbank.degenerate_bands();
        if !degenerate.is_empty() {
            warn!(
                n_fft = key.n_fft,
                n_mels = key.n_mels,
                sample_rate = key.sample_rate,
                bands = ?degenerate,
                "mel filterbank has zero-weight bands"
            );
        }
        debug!(
            n_fft = key.n_fft,
            n_mels = key.n_mels,
            sample_rate = key.sample_rate,
            "built mel filterbank"
        );

        entries.insert(key, Arc::clone(&filterbank));
        Ok(filterbank)
    }

    /// Shortcut for [`FilterbankCache::get_or_build`] with a config-derived key.
    pub fn for_config(&self, config: &FeatureConfig) -> Result<Arc<MelFilterbank>> {
        self.get_or_build(FilterbankKey::from_config(config))
    }

    /// Number of distinct filterbanks built so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
