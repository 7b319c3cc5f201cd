//! Process-wide memo of built filter banks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::{debug, info};

use crate::bank::{FilterBank, FilterBankConfig, build_validated};
use crate::error::WaveletError;
use crate::family::{FilterNormalization, WaveletFamily};

/// Hashable parameter signature; the cutoff is keyed by its bit pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct Signature {
    len: usize,
    j: usize,
    q: usize,
    family: WaveletFamily,
    cutoff_bits: u64,
    normalization: FilterNormalization,
}

impl From<&FilterBankConfig> for Signature {
    fn from(config: &FilterBankConfig) -> Self {
        Self {
            len: config.len(),
            j: config.j(),
            q: config.q(),
            family: config.family(),
            cutoff_bits: config.cutoff().to_bits(),
            normalization: config.normalization(),
        }
    }
}

type Slot = Arc<OnceLock<Arc<FilterBank>>>;

static BANKS: OnceLock<Mutex<HashMap<Signature, Slot>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<Signature, Slot>> {
    BANKS.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared filter bank for `config`, building it on first use.
///
/// Concurrent callers with the same signature block on a single build and
/// then share the same [`Arc`]. Invalid configurations are rejected before
/// the memo is touched, so failures are never cached.
///
/// # Errors
///
/// Same as [`FilterBankConfig::validate`].
pub fn filter_bank(config: &FilterBankConfig) -> Result<Arc<FilterBank>, WaveletError> {
    config.validate()?;
    let signature = Signature::from(config);

    let slot = {
        let mut map = registry().lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(signature).or_default())
    };

    if let Some(bank) = slot.get() {
        debug!(len = config.len(), j = config.j(), q = config.q(), "filter bank cache hit");
        return Ok(Arc::clone(bank));
    }

    let bank = slot.get_or_init(|| {
        info!(
            len = config.len(),
            j = config.j(),
            q = config.q(),
            family = %config.family(),
            "building filter bank"
        );
        Arc::new(build_validated(config))
    });
    Ok(Arc::clone(bank))
}

/// Number of distinct signatures currently memoized.
pub fn cached_bank_count() -> usize {
    registry()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .values()
        .filter(|slot| slot.get().is_some())
        .count()
}
