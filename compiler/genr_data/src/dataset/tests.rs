use pretty_assertions::assert_eq;

use super::*;

#[test]
fn new_dataset_has_const() {
    let ds = Dataset::new(4);
    assert_eq!(ds.lookup("const"), Some(SeriesId::CONST));
    assert_eq!(ds.values(SeriesId::CONST), Some(&[1.0; 4][..]));
    assert_eq!(ds.sample(), (0, 3));
    assert_eq!(ds.sample_len(), 4);
}

#[test]
fn add_and_lookup() {
    let mut ds = Dataset::new(3);
    let id = ds.add_series("x", vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(ds.lookup("x"), Some(id));
    assert_eq!(ds.name_of(id), Some("x"));
    assert!(ds.is_modified());
}

#[test]
fn add_rejects_bad_input() {
    let mut ds = Dataset::new(2);
    assert!(matches!(
        ds.add_series("1x", vec![0.0; 2]),
        Err(DataError::InvalidName { .. })
    ));
    assert!(matches!(
        ds.add_series("x", vec![0.0; 3]),
        Err(DataError::LengthMismatch { expected: 2, got: 3 })
    ));
    ds.add_series("x", vec![0.0; 2]).unwrap();
    assert!(matches!(
        ds.add_series("x", vec![0.0; 2]),
        Err(DataError::DuplicateName { .. })
    ));
}

#[test]
fn const_is_read_only() {
    let mut ds = Dataset::new(2);
    assert_eq!(ds.series_mut(SeriesId::CONST).err(), Some(DataError::ConstSeries));
    assert_eq!(ds.delete_series(SeriesId::CONST).err(), Some(DataError::ConstSeries));
}

#[test]
fn rename_and_delete_bump_epoch() {
    let mut ds = Dataset::new(2);
    let x = ds.add_series("x", vec![0.0; 2]).unwrap();
    let y = ds.add_series("y", vec![1.0; 2]).unwrap();
    let e0 = ds.epoch();
    ds.rename_series(x, "z").unwrap();
    assert_eq!(ds.lookup("x"), None);
    assert_eq!(ds.lookup("z"), Some(x));
    assert!(ds.epoch() > e0);

    let e1 = ds.epoch();
    ds.delete_series(x).unwrap();
    assert!(ds.epoch() > e1);
    // y moved down into x's slot
    assert_eq!(ds.lookup("y"), Some(x));
    assert_ne!(ds.lookup("y"), Some(y));
}

#[test]
fn resize_pads_with_na() {
    let mut ds = Dataset::new(2);
    let x = ds.add_series("x", vec![5.0, 6.0]).unwrap();
    ds.set_sample(1, 1).unwrap();
    ds.resize(3).unwrap();
    assert_eq!(ds.sample(), (0, 2));
    assert_eq!(ds.values(SeriesId::CONST), Some(&[1.0; 3][..]));
    let v = ds.values(x).unwrap();
    assert_eq!(&v[..2], &[5.0, 6.0]);
    assert!(v[2].is_nan());
}

#[test]
fn bad_sample() {
    let mut ds = Dataset::new(3);
    assert!(ds.set_sample(2, 1).is_err());
    assert!(ds.set_sample(0, 3).is_err());
}

#[test]
fn time_series_labels() {
    let ds = Dataset::with_structure(6, Structure::TimeSeries { pd: 4, start: 1990 }).unwrap();
    assert_eq!(ds.obs_label(0), "1990:1");
    assert_eq!(ds.obs_label(5), "1991:2");
    assert_eq!(ds.find_obs("1991:1"), Some(4));

    let monthly = Dataset::with_structure(13, Structure::TimeSeries { pd: 12, start: 2000 }).unwrap();
    assert_eq!(monthly.obs_label(12), "2001:01");
}

#[test]
fn markers_take_precedence() {
    let mut ds = Dataset::new(2);
    ds.set_markers(vec!["AL".into(), "AK".into()]).unwrap();
    assert_eq!(ds.obs_label(1), "AK");
    assert_eq!(ds.find_obs("AL"), Some(0));
    assert_eq!(ds.find_obs("CA"), None);
}

#[test]
fn panel_lags_stay_within_unit() {
    let ds = Dataset::with_structure(6, Structure::Panel { units: 2, periods: 3 }).unwrap();
    assert_eq!(ds.lag_source(1, -1), Some(0));
    assert_eq!(ds.lag_source(3, -1), None);
    assert_eq!(ds.lag_source(2, 1), None);
    assert_eq!(ds.lag_source(4, 1), Some(5));
    assert_eq!(ds.obs_label(4), "2:2");
}

#[test]
fn plain_lags_stop_at_edges() {
    let ds = Dataset::new(3);
    assert_eq!(ds.lag_source(0, -1), None);
    assert_eq!(ds.lag_source(2, 1), None);
    assert_eq!(ds.lag_source(2, -2), Some(0));
}

#[test]
fn panel_shape_must_match() {
    assert!(Dataset::with_structure(5, Structure::Panel { units: 2, periods: 3 }).is_err());
}
