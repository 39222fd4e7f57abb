mod common;
use common::{scratch_dir, write_electrode_file};

use brain2en::{electrode_matrix, find_electrode_file, load_electrode};

#[test]
fn missing_electrodes_are_excluded_not_fatal() {
    let conv = scratch_dir("signal-missing");
    write_electrode_file(&conv, 1, &[1.0, 2.0, 3.0, 4.0]);
    write_electrode_file(&conv, 3, &[4.0, 3.0, 2.0, 1.0]);

    // electrode 2 has no file: the matrix narrows to the 2 present columns
    let ecogs = electrode_matrix(&conv, &[1, 2, 3]).unwrap();
    assert_eq!(ecogs.shape(), &[4, 2]);
}

#[test]
fn columns_are_z_scored_per_electrode() {
    let conv = scratch_dir("signal-zscore");
    write_electrode_file(&conv, 1, &[0.0, 10.0, 20.0, 30.0]);
    write_electrode_file(&conv, 2, &[5.0, 5.0, 5.0, 5.0]);

    let ecogs = electrode_matrix(&conv, &[1, 2]).unwrap();
    let col0: Vec<f32> = (0..4).map(|t| ecogs[[t, 0]]).collect();
    let mean: f32 = col0.iter().sum::<f32>() / 4.0;
    let std: f32 = (col0.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / 4.0).sqrt();
    approx::assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-5_f32);
    approx::assert_abs_diff_eq!(std, 1.0, epsilon = 1e-4_f32);
    // constant series has zero variance and stays unscaled
    assert_eq!(ecogs[[0, 1]], 5.0);
}

#[test]
fn column_order_follows_electrode_order() {
    let conv = scratch_dir("signal-order");
    write_electrode_file(&conv, 7, &[0.0, 2.0]);
    write_electrode_file(&conv, 4, &[2.0, 0.0]);

    let ecogs = electrode_matrix(&conv, &[7, 4]).unwrap();
    // electrode 7 rises, electrode 4 falls
    assert!(ecogs[[0, 0]] < ecogs[[1, 0]]);
    assert!(ecogs[[0, 1]] > ecogs[[1, 1]]);
}

#[test]
fn ragged_series_lengths_are_an_error() {
    let conv = scratch_dir("signal-ragged");
    write_electrode_file(&conv, 1, &[1.0, 2.0, 3.0]);
    write_electrode_file(&conv, 2, &[1.0, 2.0]);
    assert!(electrode_matrix(&conv, &[1, 2]).is_err());
}

#[test]
fn no_surviving_electrodes_is_an_error() {
    let conv = scratch_dir("signal-none");
    std::fs::create_dir_all(conv.join("preprocessed")).unwrap();
    assert!(electrode_matrix(&conv, &[1, 2]).is_err());
}

#[test]
fn file_discovery_matches_the_id_suffix() {
    let conv = scratch_dir("signal-discovery");
    write_electrode_file(&conv, 1, &[1.0]);
    write_electrode_file(&conv, 11, &[1.0]);

    let path = find_electrode_file(&conv, 1).unwrap();
    assert!(path.to_str().unwrap().ends_with("_1.mat"));
    // _11.mat must not shadow _1.mat
    assert!(!path.to_str().unwrap().ends_with("_11.mat"));

    assert!(load_electrode(&conv, 99).unwrap().is_none());
}
