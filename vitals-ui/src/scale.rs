//! Axis scales mapping data domains onto pixel ranges.

use chrono::{DateTime, Duration, Utc};

const E10: f64 = 7.0710678118654755; // sqrt(50)
const E5: f64 = 3.1622776601683795; // sqrt(10)
const E2: f64 = std::f64::consts::SQRT_2;

/// Continuous numeric scale. A zero-width domain maps to the middle of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn map(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Round tick values (1, 2 or 5 times a power of ten) inside the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (d0, d1) = self.domain;
        if d0 > d1 {
            let mut ticks = nice_ticks(d1, d0, count);
            ticks.reverse();
            ticks
        } else {
            nice_ticks(d0, d1, count)
        }
    }
}

fn nice_ticks(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 0 || !start.is_finite() || !stop.is_finite() {
        return Vec::new();
    }
    if start == stop {
        return vec![start];
    }

    let Some((i1, i2, increment)) = tick_spec(start, stop, count as f64) else {
        return Vec::new();
    };
    if i2 < i1 {
        return Vec::new();
    }

    (i1..=i2)
        .map(|i| {
            let i = i as f64;
            match increment {
                TickIncrement::Divide(inc) => i / inc,
                TickIncrement::Multiply(inc) => i * inc,
            }
        })
        .collect()
}

#[derive(Clone, Copy)]
enum TickIncrement {
    Divide(f64),
    Multiply(f64),
}

fn tick_spec(start: f64, stop: f64, count: f64) -> Option<(i64, i64, TickIncrement)> {
    let step = (stop - start) / count.max(0.0);
    if !(step > 0.0) || !step.is_finite() {
        return None;
    }
    let power = step.log10().floor();
    let error = step / 10f64.powf(power);
    let factor = if error >= E10 {
        10.0
    } else if error >= E5 {
        5.0
    } else if error >= E2 {
        2.0
    } else {
        1.0
    };

    let (mut i1, mut i2, increment);
    if power < 0.0 {
        let inc = 10f64.powf(-power) / factor;
        i1 = (start * inc).round() as i64;
        i2 = (stop * inc).round() as i64;
        if (i1 as f64) / inc < start {
            i1 += 1;
        }
        if (i2 as f64) / inc > stop {
            i2 -= 1;
        }
        increment = TickIncrement::Divide(inc);
    } else {
        let inc = 10f64.powf(power) * factor;
        i1 = (start / inc).round() as i64;
        i2 = (stop / inc).round() as i64;
        if (i1 as f64) * inc < start {
            i1 += 1;
        }
        if (i2 as f64) * inc > stop {
            i2 -= 1;
        }
        increment = TickIncrement::Multiply(inc);
    }

    if i2 < i1 && (0.5..2.0).contains(&count) {
        return tick_spec(start, stop, count * 2.0);
    }
    Some((i1, i2, increment))
}

/// Time scale over `[start, end]`. Equal endpoints map to the middle of the range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, range: (f64, f64)) -> Self {
        Self { start, end, range }
    }

    /// Scale spanning the earliest and latest of `timestamps`.
    pub fn from_extent<I>(timestamps: I, range: (f64, f64)) -> Option<Self>
    where
        I: IntoIterator<Item = DateTime<Utc>>,
    {
        let mut iter = timestamps.into_iter();
        let first = iter.next()?;
        let (start, end) = iter.fold((first, first), |(lo, hi), ts| (lo.min(ts), hi.max(ts)));
        Some(Self::new(start, end, range))
    }

    pub fn map(&self, timestamp: DateTime<Utc>) -> f64 {
        let linear = LinearScale::new(
            (
                self.start.timestamp_millis() as f64,
                self.end.timestamp_millis() as f64,
            ),
            self.range,
        );
        linear.map(timestamp.timestamp_millis() as f64)
    }

    /// `count` evenly spaced instants from start to end inclusive.
    pub fn ticks(&self, count: usize) -> Vec<DateTime<Utc>> {
        if count == 0 {
            return Vec::new();
        }
        let span = self.end.signed_duration_since(self.start).num_milliseconds();
        if span == 0 || count == 1 {
            return vec![self.start];
        }
        let last = (count - 1) as i64;
        (0..=last)
            .map(|i| self.start + Duration::milliseconds(span * i / last))
            .collect()
    }
}

/// Discrete scale dividing the range into equal bands, one per category.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale {
    domain: Vec<String>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    /// `padding` is applied both between bands and at the outer edges.
    pub fn new(domain: Vec<String>, range: (f64, f64), padding: f64) -> Self {
        let (r0, r1) = range;
        let n = domain.len() as f64;
        let padding = padding.clamp(0.0, 1.0);
        let step = (r1 - r0) / (n - padding + padding * 2.0).max(1.0);
        let start = r0 + (r1 - r0 - step * (n - padding)) * 0.5;
        Self {
            domain,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        }
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Leading edge of the band for `category`.
    pub fn position(&self, category: &str) -> Option<f64> {
        self.domain
            .iter()
            .position(|entry| entry == category)
            .map(|index| self.start + self.step * index as f64)
    }

    pub fn center(&self, category: &str) -> Option<f64> {
        self.position(category)
            .map(|edge| edge + self.bandwidth / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn linear_maps_inverted_pixel_range() {
        let scale = LinearScale::new((34.5, 39.5), (340.0, 0.0));
        assert_eq!(scale.map(34.5), 340.0);
        assert_eq!(scale.map(39.5), 0.0);
        assert_eq!(scale.map(37.0), 170.0);
    }

    #[test]
    fn degenerate_domain_maps_to_midpoint() {
        let scale = LinearScale::new((72.0, 72.0), (0.0, 300.0));
        assert_eq!(scale.map(72.0), 150.0);

        let at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let time = TimeScale::new(at, at, (0.0, 710.0));
        assert_eq!(time.map(at), 355.0);
        assert_eq!(time.ticks(5), vec![at]);
    }

    #[test]
    fn ticks_land_on_round_steps() {
        let scale = LinearScale::new((34.5, 39.5), (340.0, 0.0));
        let ticks = scale.ticks(10);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks.first(), Some(&34.5));
        assert_eq!(ticks.last(), Some(&39.5));

        let heart = LinearScale::new((62.0, 82.0), (340.0, 0.0));
        assert_eq!(
            heart.ticks(10),
            vec![62.0, 64.0, 66.0, 68.0, 70.0, 72.0, 74.0, 76.0, 78.0, 80.0, 82.0]
        );

        let wide = LinearScale::new((0.0, 100.0), (0.0, 1.0));
        assert_eq!(wide.ticks(5), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
    }

    #[test]
    fn time_ticks_cover_extent() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();
        let scale = TimeScale::from_extent([end, start], (0.0, 400.0)).unwrap();

        let ticks = scale.ticks(5);
        assert_eq!(ticks.len(), 5);
        assert_eq!(ticks[1], Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap());
        assert_eq!(scale.map(ticks[2]), 200.0);
    }

    #[test]
    fn band_scale_pads_inner_and_outer_edges() {
        let scale = BandScale::new(
            vec!["Metformin".to_string(), "Lisinopril".to_string()],
            (0.0, 220.0),
            0.2,
        );
        // step = 220 / (2 - 0.2 + 0.4) = 100
        assert!((scale.bandwidth() - 80.0).abs() < 1e-9);
        assert!((scale.position("Metformin").unwrap() - 20.0).abs() < 1e-9);
        assert!((scale.center("Lisinopril").unwrap() - 160.0).abs() < 1e-9);
        assert_eq!(scale.position("Aspirin"), None);
    }
}
