//! Integration tests for querying described tensors.

use ndarray::Array3;
use num_complex::Complex64;
use scat_described::{
    CoeffDescriptor, CoeffType, DescribedTensor, DescriptorTable, Match, Query,
};

/// One channel, three scales, every coefficient type.
fn full_tensor() -> DescribedTensor {
    let k = 3;
    let mut table = DescriptorTable::new();
    table.push(CoeffDescriptor {
        nl: Some(0),
        nr: Some(0),
        q: Some(1),
        is_low: true,
        ..CoeffDescriptor::empty(CoeffType::Mean)
    });
    for j in 0..k {
        table.push(CoeffDescriptor {
            nl: Some(0),
            nr: Some(0),
            q: Some(1),
            jl1: Some(j),
            jr1: Some(j),
            ..CoeffDescriptor::empty(CoeffType::Spars)
        });
    }
    for j in 0..k {
        table.push(CoeffDescriptor {
            nl: Some(0),
            nr: Some(0),
            q: Some(2),
            jl1: Some(j),
            jr1: Some(j),
            ..CoeffDescriptor::empty(CoeffType::Variance)
        });
    }
    for j1 in 0..k {
        for j2 in j1..k {
            table.push(CoeffDescriptor {
                nl: Some(0),
                nr: Some(0),
                q: Some(2),
                jl1: Some(j1),
                jr1: Some(j2),
                j2: Some(j2),
                ..CoeffDescriptor::empty(CoeffType::Skewness)
            });
        }
    }
    for jl in 0..k {
        for jr in jl..k {
            for j2 in jr + 1..k {
                table.push(CoeffDescriptor {
                    nl: Some(0),
                    nr: Some(0),
                    q: Some(2),
                    jl1: Some(jl),
                    jr1: Some(jr),
                    j2: Some(j2),
                    ..CoeffDescriptor::empty(CoeffType::Kurtosis)
                });
            }
        }
    }
    let c = table.len();
    let values = Array3::from_shape_fn((4, c, 2), |(r, i, t)| {
        Complex64::new(i as f64 + 0.1 * r as f64, t as f64)
    });
    DescribedTensor::new(values, table).unwrap()
}

#[test]
fn no_filter_is_identity() {
    let tensor = full_tensor();
    assert_eq!(tensor.query(&Query::new()), tensor);
}

#[test]
fn coeff_type_queries_partition_the_table() {
    let tensor = full_tensor();
    let mut seen = vec![0usize; tensor.n_coeffs()];
    for t in CoeffType::ALL {
        let indices = Query::new().coeff_type(t).select(tensor.descriptors());
        for i in indices {
            seen[i] += 1;
        }
    }
    assert!(seen.iter().all(|&count| count == 1), "{seen:?}");
}

#[test]
fn disjoint_queries_never_intersect() {
    let tensor = full_tensor();
    let a = Query::new()
        .coeff_type(Match::any_of([CoeffType::Mean, CoeffType::Variance]))
        .select(tensor.descriptors());
    let b = Query::new()
        .coeff_type(Match::any_of([CoeffType::Skewness, CoeffType::Kurtosis]))
        .select(tensor.descriptors());
    assert!(a.iter().all(|i| !b.contains(i)));
    assert_eq!(a.len(), 1 + 3);
    assert_eq!(b.len(), 6 + 4);
}

#[test]
fn query_preserves_order_and_values() {
    let tensor = full_tensor();
    let sub = tensor.query(&Query::new().coeff_type(CoeffType::Skewness).jl1(0));
    assert_eq!(sub.n_coeffs(), 3);
    let jr1: Vec<_> = sub.descriptors().rows().map(|d| d.jr1).collect();
    assert_eq!(jr1, vec![Some(0), Some(1), Some(2)]);
    // First skewness row sits after 1 mean + 3 spars + 3 variance rows.
    assert_eq!(sub.values()[[2, 0, 1]], Complex64::new(7.2, 1.0));
}

#[test]
fn textual_filters_match_typed_queries() {
    let tensor = full_tensor();
    let typed = Query::new()
        .coeff_type(CoeffType::Kurtosis)
        .j2(Match::any_of([2]));
    let parsed = Query::parse_filter("coeff_type=kurtosis")
        .and_then(|q| q.with_filter("j2=2"))
        .unwrap();
    assert_eq!(
        typed.select(tensor.descriptors()),
        parsed.select(tensor.descriptors())
    );
}

#[test]
fn mean_batch_then_query_commute() {
    let tensor = full_tensor();
    let q = Query::new().coeff_type(CoeffType::Variance);
    assert_eq!(tensor.mean_batch().query(&q), tensor.query(&q).mean_batch());
}
