//! Row layout of a described tensor.

use scat_described::{CoeffDescriptor, CoeffType, DescriptorTable};

use crate::indexer::ScaleIndexer;

/// Recipe for one statistic row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RowSpec {
    /// `avg x_n`.
    Mean { n: usize },
    /// `avg |W_{n,k}| / σ_{n,k}`.
    Spars { n: usize, k: usize },
    /// `avg W_{nl,k} · conj(W_{nr,k})`.
    Variance { nl: usize, nr: usize, k: usize },
    /// `avg U_{n,k1,k2} · conj(W_{n,k2}) / (σ_{k1} σ_{k2})`.
    Skewness { n: usize, k1: usize, k2: usize },
    /// `avg U_{n,k1,k3} · conj(U_{n,k2,k3}) / (σ_{k1} σ_{k2})`.
    Kurtosis {
        n: usize,
        k1: usize,
        k2: usize,
        k3: usize,
    },
}

/// Ordered row recipes paired with their descriptor table.
///
/// Rows follow the canonical type order; within a type scales ascend
/// lexicographically and channels vary fastest.
#[derive(Clone, Debug)]
pub(crate) struct StatisticPlan {
    rows: Vec<RowSpec>,
    table: DescriptorTable,
    needs_second_order: bool,
}

impl StatisticPlan {
    /// Lays out the rows for `coeff_types` (sorted, deduplicated) over
    /// `n_channels` channels.
    pub(crate) fn new(coeff_types: &[CoeffType], indexer: &ScaleIndexer, n_channels: usize) -> Self {
        let k = indexer.n_scales();
        let id1 = |j: usize| indexer.path_to_idx(&[j]);
        let id2 = |j1: usize, j2: usize| indexer.path_to_idx(&[j1, j2]);
        let mut rows = Vec::new();
        let mut table = DescriptorTable::new();

        for &coeff_type in coeff_types {
            let base = |nl: usize, nr: usize| CoeffDescriptor {
                nl: Some(nl),
                nr: Some(nr),
                q: Some(coeff_type.moment_order()),
                al: Some(0),
                ar: Some(0),
                ..CoeffDescriptor::empty(coeff_type)
            };
            match coeff_type {
                CoeffType::Mean => {
                    for n in 0..n_channels {
                        rows.push(RowSpec::Mean { n });
                        table.push(CoeffDescriptor {
                            rl: Some(0),
                            rr: Some(0),
                            scl: id1(indexer.low_pass_index()),
                            scr: id1(indexer.low_pass_index()),
                            al: None,
                            ar: None,
                            is_low: true,
                            ..base(n, n)
                        });
                    }
                }
                CoeffType::Spars => {
                    for j in 0..k {
                        for n in 0..n_channels {
                            rows.push(RowSpec::Spars { n, k: j });
                            table.push(CoeffDescriptor {
                                rl: Some(1),
                                rr: Some(1),
                                scl: id1(j),
                                scr: id1(j),
                                jl1: Some(j),
                                jr1: Some(j),
                                ..base(n, n)
                            });
                        }
                    }
                }
                CoeffType::Variance => {
                    for j in 0..k {
                        for nl in 0..n_channels {
                            for nr in nl..n_channels {
                                rows.push(RowSpec::Variance { nl, nr, k: j });
                                table.push(CoeffDescriptor {
                                    rl: Some(1),
                                    rr: Some(1),
                                    scl: id1(j),
                                    scr: id1(j),
                                    jl1: Some(j),
                                    jr1: Some(j),
                                    ..base(nl, nr)
                                });
                            }
                        }
                    }
                }
                CoeffType::Skewness => {
                    for k1 in 0..k {
                        for k2 in (k1..k).filter(|&k2| indexer.admissible(k1, k2)) {
                            for n in 0..n_channels {
                                rows.push(RowSpec::Skewness { n, k1, k2 });
                                table.push(CoeffDescriptor {
                                    rl: Some(2),
                                    rr: Some(1),
                                    scl: id2(k1, k2),
                                    scr: id1(k2),
                                    jl1: Some(k1),
                                    jr1: Some(k2),
                                    j2: Some(k2),
                                    ..base(n, n)
                                });
                            }
                        }
                    }
                }
                CoeffType::Kurtosis => {
                    for k1 in 0..k {
                        for k2 in k1..k {
                            // k3 sits at a coarser octave than k2, hence than k1.
                            let coarser = (k2 + 1..k).filter(|&k3| {
                                indexer.octave(1, k2) < indexer.octave(2, k3) && indexer.admissible(k1, k3)
                            });
                            for k3 in coarser {
                                for n in 0..n_channels {
                                    rows.push(RowSpec::Kurtosis { n, k1, k2, k3 });
                                    table.push(CoeffDescriptor {
                                        rl: Some(2),
                                        rr: Some(2),
                                        scl: id2(k1, k3),
                                        scr: id2(k2, k3),
                                        jl1: Some(k1),
                                        jr1: Some(k2),
                                        j2: Some(k3),
                                        ..base(n, n)
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }

        let needs_second_order = coeff_types
            .iter()
            .any(|t| matches!(t, CoeffType::Skewness | CoeffType::Kurtosis));
        Self {
            rows,
            table,
            needs_second_order,
        }
    }

    pub(crate) fn rows(&self) -> &[RowSpec] {
        &self.rows
    }

    pub(crate) fn table(&self) -> &DescriptorTable {
        &self.table
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    /// Scattering order the forward pass must reach.
    pub(crate) fn max_order(&self) -> usize {
        if self.needs_second_order { 2 } else { 1 }
    }
}

/// Number of rows for one channel, `j` octaves and `q` wavelets per octave
/// with every coefficient type.
///
/// With `K = J·Q`: one mean, `K` sparsity and `K` variance rows, `K`
/// diagonal plus `Q²·J(J-1)/2` cross-octave skewness rows, and one kurtosis
/// row per `k1 <= k2` with `k3` at a strictly coarser octave than `k2`.
/// For `Q = 1` this is `1 + 2K + K(K+1)/2 + (K-1)K(K+1)/6`.
pub fn single_channel_row_count(j: usize, q: usize) -> usize {
    let k = j * q;
    let skewness = k + q * q * j * j.saturating_sub(1) / 2;
    let kurtosis: usize = (0..j)
        .map(|octave| (j - 1 - octave) * q * (q * q * octave + q * (q + 1) / 2))
        .sum();
    1 + k + k + skewness + kurtosis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_count_formula() {
        for k in [1, 2, 3, 6, 8] {
            let indexer = ScaleIndexer::new(k, [1, 1], 2);
            let plan = StatisticPlan::new(&CoeffType::ALL, &indexer, 1);
            assert_eq!(plan.len(), single_channel_row_count(k, 1), "K = {k}");
            assert_eq!(plan.table().len(), plan.len());
            let closed_form = 1 + 2 * k + k * (k + 1) / 2 + (k - 1) * k * (k + 1) / 6;
            assert_eq!(single_channel_row_count(k, 1), closed_form);
        }
        assert_eq!(single_channel_row_count(6, 1), 69);
    }

    #[test]
    fn row_count_with_several_wavelets_per_octave() {
        for (j, q, expected) in [(4, 2, 117), (3, 4, 269), (2, 2, 23)] {
            let indexer = ScaleIndexer::new(j, [q, q], 2);
            let plan = StatisticPlan::new(&CoeffType::ALL, &indexer, 1);
            assert_eq!(plan.len(), expected, "J = {j}, Q = {q}");
            assert_eq!(single_channel_row_count(j, q), expected, "J = {j}, Q = {q}");
        }
    }

    #[test]
    fn second_order_rows_use_admissible_paths() {
        let indexer = ScaleIndexer::new(3, [2, 2], 2);
        let plan = StatisticPlan::new(&[CoeffType::Skewness, CoeffType::Kurtosis], &indexer, 1);
        for row in plan.rows() {
            match *row {
                RowSpec::Skewness { k1, k2, .. } => {
                    assert!(k1 == k2 || indexer.octave(1, k1) < indexer.octave(2, k2));
                }
                RowSpec::Kurtosis { k1, k2, k3, .. } => {
                    assert!(k1 <= k2);
                    assert!(indexer.octave(1, k2) < indexer.octave(2, k3));
                }
                _ => unreachable!(),
            }
        }
        for d in plan.table().rows() {
            assert!(d.scl.is_some() && d.scr.is_some());
        }
        assert!(!plan.rows().contains(&RowSpec::Skewness { n: 0, k1: 0, k2: 1 }));
        assert!(plan.rows().contains(&RowSpec::Skewness { n: 0, k1: 1, k2: 1 }));
    }

    #[test]
    fn multichannel_counts() {
        let (k, n) = (3, 2);
        let indexer = ScaleIndexer::new(k, [1, 1], 2);
        let plan = StatisticPlan::new(&CoeffType::ALL, &indexer, n);
        let expected = n + n * k + k * n * (n + 1) / 2 + n * k * (k + 1) / 2 + n * 4;
        assert_eq!(plan.len(), expected);
    }

    #[test]
    fn channels_vary_fastest() {
        let indexer = ScaleIndexer::new(2, [1, 1], 1);
        let plan = StatisticPlan::new(&[CoeffType::Spars], &indexer, 2);
        assert_eq!(
            plan.rows(),
            &[
                RowSpec::Spars { n: 0, k: 0 },
                RowSpec::Spars { n: 1, k: 0 },
                RowSpec::Spars { n: 0, k: 1 },
                RowSpec::Spars { n: 1, k: 1 },
            ]
        );
    }

    #[test]
    fn descriptors_label_rows() {
        let indexer = ScaleIndexer::new(3, [1, 1], 2);
        let plan = StatisticPlan::new(&CoeffType::ALL, &indexer, 1);
        let mean = plan.table().row(0);
        assert!(mean.is_low);
        assert_eq!(mean.q, Some(1));
        assert_eq!(mean.scl, Some(3));
        assert_eq!(mean.jl1, None);

        let skew = plan
            .table()
            .rows()
            .find(|d| d.coeff_type == CoeffType::Skewness && d.jl1 == Some(0) && d.jr1 == Some(2))
            .unwrap();
        assert_eq!((skew.rl, skew.rr), (Some(2), Some(1)));
        assert_eq!(indexer.idx_to_path(skew.scl.unwrap()), Some(&[0, 2][..]));
        assert_eq!(indexer.idx_to_path(skew.scr.unwrap()), Some(&[2][..]));

        let kurt = plan
            .table()
            .rows()
            .find(|d| d.coeff_type == CoeffType::Kurtosis)
            .unwrap();
        assert_eq!((kurt.jl1, kurt.jr1, kurt.j2), (Some(0), Some(0), Some(1)));
        assert_eq!(kurt.q, Some(2));
        assert_eq!(kurt.al, Some(0));
    }

    #[test]
    fn max_order_follows_types() {
        let indexer = ScaleIndexer::new(3, [1, 1], 2);
        let covariance = StatisticPlan::new(&[CoeffType::Mean, CoeffType::Variance], &indexer, 1);
        assert_eq!(covariance.max_order(), 1);
        let full = StatisticPlan::new(&CoeffType::ALL, &indexer, 1);
        assert_eq!(full.max_order(), 2);
    }
}
