use crate::shape::{left_normal, Offset, Pose, Shape};
use crate::Coord;

/// Turns a shape and a lateral offset into a polyline.
pub trait GeometrySampler {
    fn sample(&self, shape: &Shape, offset: Offset) -> Samples;

    fn polyline(&self, shape: &Shape, offset: Offset) -> Vec<Coord> {
        self.sample(shape, offset).collect()
    }
}

/// Samples every shape at (roughly) the same arc-length step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformSampler {
    pub step: f64,
}

impl UniformSampler {
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Default for UniformSampler {
    fn default() -> Self {
        Self { step: 1.0 }
    }
}

impl GeometrySampler for UniformSampler {
    fn sample(&self, shape: &Shape, offset: Offset) -> Samples {
        Samples::new(*shape, offset, self.step)
    }
}

/// Lazy, finite sequence of points along an offset curve. A clone taken
/// before iterating replays the same points.
#[derive(Debug, Clone)]
pub struct Samples {
    shape: Shape,
    offset: Offset,
    /// arc length -> Bezier parameter, only for Bezier shapes
    parametrisation: Option<splines::Spline<f64, f64>>,
    length: f64,
    intervals: usize,
    index: usize,
}

impl Samples {
    fn new(shape: Shape, offset: Offset, step: f64) -> Self {
        let (parametrisation, length) = match shape {
            Shape::Bezier { .. } => {
                let (spline, length) = bezier_parametrisation(&shape);
                (Some(spline), length)
            }
            _ => (None, shape.nominal_length()),
        };

        Self {
            shape,
            offset,
            parametrisation,
            length,
            intervals: spline_util::interval_count(length, step),
            index: 0,
        }
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    fn pose(&self, s: f64) -> Pose {
        match &self.parametrisation {
            Some(spline) => {
                let t = spline.clamped_sample(s).unwrap_or(0.0);
                self.shape.bezier_pose(t)
            }
            None => self.shape.pose_at_length(s),
        }
    }
}

impl Iterator for Samples {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        if self.index > self.intervals {
            return None;
        }

        // a closed circle ends exactly where it started
        let index = match self.shape {
            Shape::Circle { .. } if self.index == self.intervals => 0,
            _ => self.index,
        };
        self.index += 1;

        let fraction = index as f64 / self.intervals as f64;
        let pose = self.pose(fraction * self.length);
        Some(pose.position + left_normal(pose.heading) * self.offset.at(fraction))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.intervals + 1).saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples {}

/// Tabulates arc length against the Bezier parameter so samples can be spaced evenly.
fn bezier_parametrisation(shape: &Shape) -> (splines::Spline<f64, f64>, f64) {
    use cgmath::MetricSpace;

    const STEPS: usize = 512;

    let mut keys = vec![splines::Key::new(0.0, 0.0, splines::Interpolation::Linear)];
    let mut s = 0.0;
    let mut last = shape.bezier_point(0.0);
    for i in 1..=STEPS {
        let t = i as f64 / STEPS as f64;
        let point = shape.bezier_point(t);
        let ds = point.distance(last);
        if ds > 0.0 {
            s += ds;
            keys.push(splines::Key::new(s, t, splines::Interpolation::Linear));
        }
        last = point;
    }

    (splines::Spline::from_vec(keys), s)
}
