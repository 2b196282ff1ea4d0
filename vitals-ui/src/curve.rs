//! Monotone cubic interpolation along x (Steffen's method) rendered as SVG path data.
//!
//! The curve passes through every point and never overshoots between two
//! neighbours, which keeps vital-sign lines from inventing peaks.

use crate::svg::fmt_num;

/// SVG `d` attribute for a smooth line through `points`, which must be sorted by x.
pub fn monotone_x_path(points: &[(f64, f64)]) -> String {
    match points {
        [] => String::new(),
        [(x, y)] => format!("M{},{}", fmt_num(*x), fmt_num(*y)),
        [(x0, y0), (x1, y1)] => format!(
            "M{},{}L{},{}",
            fmt_num(*x0),
            fmt_num(*y0),
            fmt_num(*x1),
            fmt_num(*y1)
        ),
        _ => {
            let tangents = tangents(points);
            let (x0, y0) = points[0];
            let mut path = format!("M{},{}", fmt_num(x0), fmt_num(y0));
            for (i, window) in points.windows(2).enumerate() {
                let (xa, ya) = window[0];
                let (xb, yb) = window[1];
                let dx = (xb - xa) / 3.0;
                path.push_str(&format!(
                    "C{},{},{},{},{},{}",
                    fmt_num(xa + dx),
                    fmt_num(ya + dx * tangents[i]),
                    fmt_num(xb - dx),
                    fmt_num(yb - dx * tangents[i + 1]),
                    fmt_num(xb),
                    fmt_num(yb)
                ));
            }
            path
        }
    }
}

fn tangents(points: &[(f64, f64)]) -> Vec<f64> {
    let n = points.len();
    let mut tangents = vec![0.0; n];
    for i in 1..n - 1 {
        tangents[i] = interior_slope(points[i - 1], points[i], points[i + 1]);
    }
    tangents[0] = endpoint_slope(points[0], points[1], tangents[1]);
    tangents[n - 1] = endpoint_slope(points[n - 2], points[n - 1], tangents[n - 2]);
    tangents
}

fn secant(a: (f64, f64), b: (f64, f64)) -> f64 {
    let h = b.0 - a.0;
    if h == 0.0 {
        0.0
    } else {
        (b.1 - a.1) / h
    }
}

fn interior_slope(p0: (f64, f64), p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let h0 = p1.0 - p0.0;
    let h1 = p2.0 - p1.0;
    let s0 = secant(p0, p1);
    let s1 = secant(p1, p2);
    if h0 + h1 == 0.0 {
        return 0.0;
    }
    let p = (s0 * h1 + s1 * h0) / (h0 + h1);
    let slope = (sign(s0) + sign(s1)) * s0.abs().min(s1.abs()).min(0.5 * p.abs());
    if slope.is_finite() {
        slope
    } else {
        0.0
    }
}

fn endpoint_slope(a: (f64, f64), b: (f64, f64), neighbour: f64) -> f64 {
    let h = b.0 - a.0;
    if h == 0.0 {
        neighbour
    } else {
        (3.0 * (b.1 - a.1) / h - neighbour) / 2.0
    }
}

fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}
