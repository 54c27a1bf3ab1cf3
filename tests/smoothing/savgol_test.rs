//! Behaviour of `savgol` on known signals.

use termplot::smoothing::{savgol, window_size};

fn close(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-6)
}

fn ramp(len: u32) -> Vec<f64> {
    (0..len).map(|i| 2.0 * f64::from(i) - 3.0).collect()
}

#[test]
fn constant_series_is_unchanged() {
    let y = vec![4.2; 40];
    assert!(close(&savgol(&y, 0.3, 3), &y));
}

#[test]
fn polynomials_within_the_order_are_preserved() {
    let y = ramp(30);
    for factor in [0.0, 0.25, 1.0] {
        assert!(close(&savgol(&y, factor, 3), &y), "factor {factor}");
    }

    let quadratic: Vec<f64> = (0..25u32)
        .map(|i| {
            let t = f64::from(i);
            0.5 * t * t - t + 1.0
        })
        .collect();
    assert!(close(&savgol(&quadratic, 0.5, 2), &quadratic));
}

#[test]
fn short_series_are_returned_as_is() {
    let y = vec![1.0, 5.0, 2.0, 8.0];
    assert_eq!(window_size(y.len(), 0.5, 3), None);
    assert_eq!(savgol(&y, 0.5, 3), y);
    assert!(savgol(&[], 0.5, 3).is_empty());
}

#[test]
fn output_length_matches_input() {
    for len in [6u32, 7, 50, 51] {
        let y = ramp(len);
        assert_eq!(savgol(&y, 0.4, 3).len(), y.len(), "len {len}");
    }
}

#[test]
fn alternating_noise_is_damped() {
    let y: Vec<f64> = (0..60)
        .map(|i| if i % 2 == 0 { 1.0 } else { -1.0 })
        .collect();
    let smoothed = savgol(&y, 0.2, 3);
    let energy = |v: &[f64]| v.iter().map(|x| x * x).sum::<f64>();
    assert!(energy(&smoothed) < energy(&y) / 2.0);
}

#[test]
fn larger_factor_widens_the_window() {
    let narrow = window_size(100, 0.1, 3).expect("window");
    let wide = window_size(100, 0.9, 3).expect("window");
    assert!(narrow < wide);
    assert_eq!(narrow % 2, 1);
    assert_eq!(wide % 2, 1);
}
