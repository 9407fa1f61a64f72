use cgmath as cg;

pub type Vertex = cg::Vector2<f64>;

/// Total length of the polyline through `vertices`.
pub fn polyline_length(vertices: &[Vertex]) -> f64 {
    use cg::MetricSpace;
    use itertools::Itertools;

    vertices
        .iter()
        .tuple_windows()
        .map(|(a, b)| a.distance(*b))
        .sum()
}

/// Number of intervals needed to cover `length` with intervals no longer than `step`.
pub fn interval_count(length: f64, step: f64) -> usize {
    ((length / step).ceil() as usize).max(1)
}

#[cfg(test)]
mod spline_util_tests {
    use crate::*;
    use float_cmp::assert_approx_eq;

    fn v(x: f64, y: f64) -> Vertex {
        Vertex::new(x, y)
    }

    #[test]
    fn length() {
        assert_approx_eq!(f64, polyline_length(&[]), 0.0);
        assert_approx_eq!(f64, polyline_length(&[v(0.0, 0.0), v(3.0, 4.0)]), 5.0);
        assert_approx_eq!(
            f64,
            polyline_length(&[v(0.0, 0.0), v(1.0, 0.0), v(1.0, 2.0)]),
            3.0
        );
    }

    #[test]
    fn intervals() {
        assert_eq!(interval_count(0.2, 1.0), 1);
        assert_eq!(interval_count(10.0, 1.0), 10);
        assert_eq!(interval_count(10.5, 1.0), 11);
        assert_eq!(interval_count(0.0, 1.0), 1);
    }
}
