use pretty_assertions::assert_eq;

use super::*;
use crate::{ArrayKind, Bundle, GArray, List, Matrix, SeriesId};

#[test]
fn series_buf_retags_and_fills_na() {
    let mut v = Value::Scalar(3.0);
    let buf = v.series_buf(3);
    assert_eq!(buf.len(), 3);
    assert!(buf.iter().all(|x| x.is_nan()));
    assert_eq!(v.kind(), ValueKind::Series);
}

#[test]
fn series_buf_keeps_allocation() {
    let mut v = Value::Series(Vec::with_capacity(64));
    let before = v.as_series().unwrap().as_ptr();
    v.series_buf(10);
    assert_eq!(v.as_series().unwrap().as_ptr(), before);
}

#[test]
fn matrix_buf_retags_from_string() {
    let mut v = Value::string("abc");
    let m = v.matrix_buf(2, 3);
    assert_eq!(m.shape(), (2, 3));
    assert_eq!(v.kind(), ValueKind::Matrix);
}

#[test]
fn one_by_one_matrix_is_scalar() {
    let v = Value::Matrix(Matrix::scalar(4.0));
    assert_eq!(v.as_scalar(), Some(4.0));
    assert_eq!(Value::Matrix(Matrix::zeros(1, 2)).as_scalar(), None);
    assert_eq!(Value::Scalar(2.0).as_operand().scalar(), Some(2.0));
}

#[test]
fn copy_from_reuses_series_storage() {
    let mut dst = Value::Series(vec![0.0; 8]);
    let src = Value::Series(vec![1.0, 2.0]);
    dst.copy_from(&src);
    assert_eq!(dst, src);

    let mut dst = Value::Scalar(1.0);
    dst.copy_operand(Operand::Str("x"));
    assert_eq!(dst, Value::string("x"));
}

#[test]
fn operand_round_trip_of_containers() {
    let mut b = Bundle::new();
    b.insert("n", Value::Scalar(1.0));
    let list = List::from_ids(vec![SeriesId::new(1), SeriesId::new(2)]);
    let mut arr = GArray::new();
    arr.push(Value::string("a")).unwrap();

    for v in [Value::Bundle(b), Value::List(list), Value::Array(arr)] {
        assert_eq!(v.as_operand().to_value(), v);
    }
}

#[test]
fn array_kind_is_fixed_on_first_push() {
    let mut arr = GArray::new();
    arr.push(Value::Matrix(Matrix::identity(2))).unwrap();
    assert_eq!(arr.kind(), Some(ArrayKind::Matrices));
    assert!(arr.push(Value::string("x")).is_err());
    assert!(arr.push(Value::Scalar(1.0)).is_err());
    assert_eq!(arr.len(), 1);
}

#[test]
fn scalars_and_series_cannot_start_an_array() {
    let mut arr = GArray::new();
    assert!(arr.push(Value::Series(vec![1.0])).is_err());
    assert_eq!(arr.kind(), None);
}

#[test]
fn bundle_union_left_wins_and_keeps_order() {
    let mut a = Bundle::new();
    a.insert("x", Value::Scalar(1.0));
    a.insert("y", Value::Scalar(2.0));
    let mut b = Bundle::new();
    b.insert("y", Value::Scalar(20.0));
    b.insert("z", Value::Scalar(30.0));
    let u = a.union(&b);
    assert_eq!(u.keys().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    assert_eq!(u.get("y"), Some(&Value::Scalar(2.0)));
}

#[test]
fn bundle_remove_keeps_order() {
    let mut a = Bundle::new();
    for k in ["a", "b", "c"] {
        a.insert(k, Value::Undefined);
    }
    a.remove("b");
    assert_eq!(a.keys().collect::<Vec<_>>(), vec!["a", "c"]);
}

#[test]
fn list_set_operations() {
    let ids = |v: &[u32]| v.iter().map(|&i| SeriesId::new(i)).collect::<List>();
    let a = ids(&[1, 2, 3]);
    let b = ids(&[3, 4]);
    assert_eq!(a.union(&b), ids(&[1, 2, 3, 4]));
    assert_eq!(a.intersect(&b), ids(&[3]));
    assert_eq!(a.difference(&b), ids(&[1, 2]));
}

#[test]
fn display() {
    assert_eq!(Value::Scalar(f64::NAN).to_string(), "NA");
    assert_eq!(Value::Series(vec![0.0; 4]).to_string(), "series(4 obs)");
    assert_eq!(Value::Undefined.to_string(), "null");
}
