mod common;
use common::test_vocab;

use brain2en::{Collator, DatasetExample, PipelineConfig};
use ndarray::Array2;

fn example(t: usize, labels: &[u32]) -> DatasetExample {
    DatasetExample {
        signal: Array2::from_elem((t, 2), 1.0),
        labels: labels.to_vec(),
    }
}

#[test]
fn pad_mask_marks_trailing_positions_of_the_shorter_row() {
    let vocab = test_vocab();
    let collator = Collator::new(&PipelineConfig::default(), &vocab).unwrap();

    // label lengths 3 and 5
    let a = example(4, &[2, 4, 3]);
    let b = example(4, &[2, 4, 5, 6, 3]);
    let batch = collator.collate(&[&a, &b]).unwrap();

    assert_eq!(batch.pad_mask.shape(), &[2, 4]);
    assert_eq!(
        batch.pad_mask.row(0).to_vec(),
        vec![false, false, true, true]
    );
    assert!(batch.pad_mask.row(1).iter().all(|&p| !p));
}

#[test]
fn collation_is_deterministic() {
    let vocab = test_vocab();
    let collator = Collator::new(&PipelineConfig::default(), &vocab).unwrap();
    let a = example(3, &[2, 4, 5, 3]);
    let b = example(5, &[2, 6, 3]);

    let x = collator.collate(&[&a, &b]).unwrap();
    let y = collator.collate(&[&a, &b]).unwrap();
    assert_eq!(x.src, y.src);
    assert_eq!(x.trg, y.trg);
    assert_eq!(x.trg_y, y.trg_y);
    assert_eq!(x.pos_mask, y.pos_mask);
    assert_eq!(x.pad_mask, y.pad_mask);
}

#[test]
fn teacher_forcing_shift_lines_up() {
    let vocab = test_vocab();
    let collator = Collator::new(&PipelineConfig::default(), &vocab).unwrap();
    let a = example(2, &[2, 4, 5, 3]);
    let batch = collator.collate(&[&a]).unwrap();

    // trg one-hots positions 0..3 of the labels, trg_y holds positions 1..4
    assert_eq!(batch.trg.shape(), &[1, 3, vocab.len()]);
    assert_eq!(batch.trg_y.row(0).to_vec(), vec![4, 5, 3]);
    for (pos, &tok) in [2_u32, 4, 5].iter().enumerate() {
        assert_eq!(batch.trg[[0, pos, tok as usize]], 1.0);
    }
}

#[test]
fn causal_mask_is_lower_triangular_zeros() {
    let vocab = test_vocab();
    let collator = Collator::new(&PipelineConfig::default(), &vocab).unwrap();
    let a = example(2, &[2, 4, 5, 3]);
    let batch = collator.collate(&[&a]).unwrap();

    let l = batch.trg_y.shape()[1];
    assert_eq!(batch.pos_mask.shape(), &[1, l, l]);
    for i in 0..l {
        for j in 0..l {
            let v = batch.pos_mask[[0, i, j]];
            if j <= i {
                assert_eq!(v, 0.0);
            } else {
                assert_eq!(v, f32::NEG_INFINITY);
            }
        }
    }
}
