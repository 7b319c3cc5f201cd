//! Enumeration of scattering scale paths.

use std::collections::HashMap;

/// Numbers the admissible scale paths of a scattering network.
///
/// Layer `r` has `K_r = J·Q_r` band-pass scales, and index `K_r` denotes its
/// low-pass filter. Scale `j` of layer `r` lies in octave `j / Q_r`.
///
/// | Order | Paths |
/// |-------|-------|
/// | 1 | `(j1)` for `0 <= j1 <= K_1` |
/// | 2 | `(j1, j2)` for `j1 < K_1` with `j1 / Q_1 < j2 / Q_2`, plus the diagonal `(j1, j1)` |
///
/// The second layer only keeps envelopes filtered at a strictly coarser
/// octave. The diagonal paths carry the skewness envelopes `|W_j| ⋆ ψ_j`.
///
/// Ids are assigned order-1 first, then order-2, each lexicographically.
#[derive(Clone, Debug)]
pub struct ScaleIndexer {
    j: usize,
    qs: [usize; 2],
    max_order: usize,
    paths: Vec<Vec<usize>>,
    ids: HashMap<Vec<usize>, usize>,
}

impl ScaleIndexer {
    /// Builds the indexer for `j` octaves with `qs[r]` wavelets per octave on
    /// layer `r + 1`, up to `max_order` (1 or 2).
    pub fn new(j: usize, qs: [usize; 2], max_order: usize) -> Self {
        let qs = qs.map(|q| q.max(1));
        let max_order = max_order.clamp(1, 2);
        let (k1, k2) = (j * qs[0], j * qs[1]);
        let mut paths: Vec<Vec<usize>> = (0..=k1).map(|j1| vec![j1]).collect();
        if max_order == 2 {
            for j1 in 0..k1 {
                for j2 in 0..=k2 {
                    if j1 == j2 || j1 / qs[0] < j2 / qs[1] {
                        paths.push(vec![j1, j2]);
                    }
                }
            }
        }
        let ids = paths
            .iter()
            .enumerate()
            .map(|(i, p)| (p.clone(), i))
            .collect();
        Self {
            j,
            qs,
            max_order,
            paths,
            ids,
        }
    }

    /// Number of octaves `J`.
    pub fn n_octaves(&self) -> usize {
        self.j
    }

    /// Wavelets per octave on each layer.
    pub fn qs(&self) -> [usize; 2] {
        self.qs
    }

    /// Number of first-layer band-pass scales `K_1 = J·Q_1`.
    pub fn n_scales(&self) -> usize {
        self.j * self.qs[0]
    }

    /// Highest scattering order enumerated.
    pub fn max_order(&self) -> usize {
        self.max_order
    }

    /// Index standing for the first-layer low-pass filter.
    pub fn low_pass_index(&self) -> usize {
        self.n_scales()
    }

    /// Octave of scale `j` on `layer` (1 or 2).
    pub fn octave(&self, layer: usize, j: usize) -> usize {
        j / self.qs[layer.clamp(1, 2) - 1]
    }

    /// Whether the envelope of first-layer scale `j1` is kept at
    /// second-layer scale `j2`.
    pub fn admissible(&self, j1: usize, j2: usize) -> bool {
        self.ids.contains_key(&[j1, j2][..])
    }

    /// Total number of paths over all orders.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths of a given order, in id order.
    pub fn paths(&self, order: usize) -> impl Iterator<Item = &[usize]> + '_ {
        self.paths
            .iter()
            .filter(move |p| p.len() == order)
            .map(Vec::as_slice)
    }

    /// Id of `path`, or `None` if the path is not admissible.
    pub fn path_to_idx(&self, path: &[usize]) -> Option<usize> {
        self.ids.get(path).copied()
    }

    /// Path with id `idx`.
    pub fn idx_to_path(&self, idx: usize) -> Option<&[usize]> {
        self.paths.get(idx).map(Vec::as_slice)
    }

    /// Scattering order of the path with id `idx`.
    pub fn order(&self, idx: usize) -> Option<usize> {
        self.paths.get(idx).map(Vec::len)
    }

    /// Whether the path with id `idx` ends with the low-pass filter of its layer.
    pub fn is_low_pass(&self, idx: usize) -> bool {
        self.paths
            .get(idx)
            .and_then(|p| p.last().map(|&j| j >= self.j * self.qs[p.len() - 1]))
            .unwrap_or(false)
    }
}
