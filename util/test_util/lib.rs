use cgmath as cg;
use float_cmp::approx_eq;

pub fn assert_equal_vec_unordered<T: Eq + std::fmt::Debug>(vec1: Vec<T>, vec2: Vec<T>) {
    // Without assuming anything about T besides Eq and Debug (like Hash or Ord),
    // the best we can do is O(n^2). This is OK for tests.
    assert_eq!(
        vec1.len(),
        vec2.len(),
        "Vectors have different lengths: {:?}, {:?}",
        vec1,
        vec2
    );
    'outer: for item1 in vec1.iter() {
        for item2 in vec2.iter() {
            if item1 == item2 {
                continue 'outer;
            }
        }
        panic!(
            "Vectors are not order-independent equal:\n  {:?}\n  {:?}",
            vec1, vec2
        );
    }
}

pub fn assert_coord_approx_eq(actual: cg::Vector2<f64>, expected: (f64, f64)) {
    assert!(
        approx_eq!(f64, actual.x, expected.0, epsilon = 1e-6)
            && approx_eq!(f64, actual.y, expected.1, epsilon = 1e-6),
        "Coordinates differ: {:?}, expected {:?}",
        actual,
        expected
    );
}

/// Checks that a polyline starts and ends at the given coordinates.
pub fn assert_polyline_ends(
    polyline: &[cg::Vector2<f64>],
    start: (f64, f64),
    end: (f64, f64),
) {
    assert!(
        polyline.len() >= 2,
        "Polyline has fewer than two points: {:?}",
        polyline
    );
    assert_coord_approx_eq(polyline[0], start);
    assert_coord_approx_eq(polyline[polyline.len() - 1], end);
}
