use pretty_assertions::assert_eq;

use super::*;

#[test]
fn from_rows_is_column_major() {
    let m = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    assert_eq!(m.shape(), (2, 2));
    assert_eq!(m.real().unwrap(), &[1.0, 3.0, 2.0, 4.0]);
    assert_eq!(m.get(0, 1), 2.0);
}

#[test]
fn from_rows_rejects_ragged() {
    let rows: [&[f64]; 2] = [&[1.0, 2.0], &[3.0]];
    assert!(Matrix::from_rows(&rows).is_err());
}

#[test]
fn transpose_real() {
    let m = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    let t = m.transpose();
    assert_eq!(t, Matrix::from_rows(&[[1.0, 4.0], [2.0, 5.0], [3.0, 6.0]]).unwrap());
}

#[test]
fn transpose_conjugates_complex() {
    let m = Matrix::complex_from_col_major(
        1,
        2,
        vec![Complex64::new(1.0, 2.0), Complex64::new(3.0, -1.0)],
    )
    .unwrap();
    let t = m.transpose();
    assert_eq!(t.shape(), (2, 1));
    assert_eq!(t.get_complex(0, 0), Complex64::new(1.0, -2.0));
    assert_eq!(t.get_complex(1, 0), Complex64::new(3.0, 1.0));
}

#[test]
fn reshape_reuses_and_clears_span() {
    let mut m = Matrix::filled(3, 3, 7.0);
    m.set_span(Some(ObsSpan { t1: 0, t2: 2 }));
    let data = m.reshape_real(2, 1);
    assert_eq!(data, &[0.0, 0.0]);
    assert_eq!(m.shape(), (2, 1));
    assert_eq!(m.span(), None);
}

#[test]
fn set_promotes_on_imaginary_part() {
    let mut m = Matrix::zeros(1, 2);
    m.set_at(1, Complex64::new(0.0, 1.0));
    assert!(m.is_complex());
    m.set_at(1, Complex64::new(2.0, 0.0));
    m.demote_if_real();
    assert!(!m.is_complex());
    assert_eq!(m.real().unwrap(), &[0.0, 2.0]);
}

#[test]
fn equality_ignores_span_and_matches_na() {
    let mut a = Matrix::column(vec![1.0, f64::NAN]);
    let b = Matrix::column(vec![1.0, f64::NAN]);
    a.set_span(Some(ObsSpan { t1: 3, t2: 4 }));
    assert_eq!(a, b);
    assert_ne!(a, Matrix::row(vec![1.0, f64::NAN]));
}

#[test]
fn display() {
    let m = Matrix::from_rows(&[[1.0, f64::NAN]]).unwrap();
    assert_eq!(m.to_string(), "{1, NA}");
}
