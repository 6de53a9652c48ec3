use pretty_assertions::assert_eq;

use genr_ir::Dummy;
use genr_value::{Complex64, EvalErrorKind, Matrix};

use super::*;

fn m22() -> Matrix {
    Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap()
}

#[test]
fn position_is_one_based_and_checked() {
    assert_eq!(position(1.0, 3).unwrap(), 0);
    assert_eq!(position(3.0, 3).unwrap(), 2);
    let err = position(4.0, 3).unwrap_err();
    assert!(matches!(
        err.kind,
        EvalErrorKind::IndexOutOfBounds { index: 4, len: 3 }
    ));
    assert!(position(0.0, 3).is_err());
    assert!(position(1.5, 3).is_err());
}

#[test]
fn single_element() {
    let m = m22();
    let sel = MatrixSel::resolve(&[SubArg::Num(2.0), SubArg::Num(1.0)], m.shape()).unwrap();
    let got = extract(&m, &sel);
    assert_eq!(got, Matrix::scalar(3.0));
    assert!(matches!(sel, MatrixSel::Block { single: true, .. }));
}

#[test]
fn empty_slot_selects_whole_dimension() {
    let m = m22();
    let sel = MatrixSel::resolve(&[SubArg::All, SubArg::Num(2.0)], m.shape()).unwrap();
    assert_eq!(extract(&m, &sel), Matrix::column(vec![2.0, 4.0]));
}

#[test]
fn ranges_are_inclusive() {
    let m = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap();
    let sel = MatrixSel::resolve(&[SubArg::Range(2.0, 3.0), SubArg::Range(1.0, 2.0)], m.shape())
        .unwrap();
    let want = Matrix::from_rows(&[[4.0, 5.0], [7.0, 8.0]]).unwrap();
    assert_eq!(extract(&m, &sel), want);
}

#[test]
fn single_subscript_is_linear_on_non_vectors() {
    let m = m22();
    // column-major: 1, 3, 2, 4
    let sel = MatrixSel::resolve(&[SubArg::Num(2.0)], m.shape()).unwrap();
    assert_eq!(extract(&m, &sel), Matrix::scalar(3.0));
}

#[test]
fn row_vector_keeps_orientation() {
    let m = Matrix::row(vec![1.0, 2.0, 3.0, 4.0]);
    let sel = MatrixSel::resolve(&[SubArg::Range(2.0, 3.0)], m.shape()).unwrap();
    assert_eq!(extract(&m, &sel), Matrix::row(vec![2.0, 3.0]));
}

#[test]
fn zero_one_matrix_of_same_shape_is_a_mask() {
    let m = m22();
    let mask = Matrix::from_rows(&[[1.0, 0.0], [0.0, 1.0]]).unwrap();
    let sel = MatrixSel::resolve(&[SubArg::Matrix(mask)], m.shape()).unwrap();
    assert_eq!(extract(&m, &sel), Matrix::column(vec![1.0, 4.0]));
}

#[test]
fn other_matrix_is_an_index_vector() {
    let m = Matrix::column(vec![10.0, 20.0, 30.0]);
    let idx = Matrix::row(vec![3.0, 1.0]);
    let sel = MatrixSel::resolve(&[SubArg::Matrix(idx)], m.shape()).unwrap();
    assert_eq!(extract(&m, &sel), Matrix::column(vec![30.0, 10.0]));
}

#[test]
fn triangles_exclude_the_diagonal() {
    let m = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap();
    let diag = MatrixSel::resolve(&[SubArg::Dummy(Dummy::Diag)], m.shape()).unwrap();
    let upper = MatrixSel::resolve(&[SubArg::Dummy(Dummy::Upper)], m.shape()).unwrap();
    let lower = MatrixSel::resolve(&[SubArg::Dummy(Dummy::Lower)], m.shape()).unwrap();
    assert_eq!(extract(&m, &diag), Matrix::column(vec![1.0, 5.0, 9.0]));
    assert_eq!(extract(&m, &upper), Matrix::column(vec![2.0, 3.0, 6.0]));
    assert_eq!(extract(&m, &lower), Matrix::column(vec![4.0, 7.0, 8.0]));
}

#[test]
fn splice_broadcasts_a_scalar() {
    let mut m = m22();
    let sel = MatrixSel::resolve(&[SubArg::All, SubArg::Num(1.0)], m.shape()).unwrap();
    splice(&mut m, &sel, &Matrix::scalar(0.0)).unwrap();
    assert_eq!(m, Matrix::from_rows(&[[0.0, 2.0], [0.0, 4.0]]).unwrap());
}

#[test]
fn splice_rejects_wrong_block_size() {
    let mut m = m22();
    let sel = MatrixSel::resolve(&[SubArg::Num(1.0), SubArg::All], m.shape()).unwrap();
    let err = splice(&mut m, &sel, &Matrix::column(vec![1.0, 2.0, 3.0])).unwrap_err();
    assert!(matches!(err.kind, EvalErrorKind::NonConformable { .. }));
}

#[test]
fn imaginary_part_write_promotes_and_real_write_demotes() {
    let mut m = m22();
    let imag = MatrixSel::resolve(&[SubArg::Dummy(Dummy::Imag)], m.shape()).unwrap();
    splice(&mut m, &imag, &Matrix::scalar(1.0)).unwrap();
    assert!(m.is_complex());
    assert_eq!(m.at_complex(0), Complex64::new(1.0, 1.0));

    splice(&mut m, &imag, &Matrix::scalar(0.0)).unwrap();
    assert!(!m.is_complex());
    assert_eq!(m, m22());
}

#[test]
fn substring_counts_characters() {
    assert_eq!(substring("héllo", 1, 2), "él");
}
