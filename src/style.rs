//! Color scales used to fill district polygons.
//!
//! Both scales are ordered-table lookups so their tie-break rules can be
//! checked without a renderer. Each named scheme is an independent
//! configuration.

use crate::error::StyleError;
use crate::types::Color;
use geojson::Feature;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Continuous scale: a value lands in the bucket above every breakpoint it
/// strictly exceeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawThresholdScale")]
pub struct ThresholdScale {
    breakpoints: Vec<f64>,
    colors: Vec<Color>,
}

#[derive(Deserialize)]
struct RawThresholdScale {
    breakpoints: Vec<f64>,
    colors: Vec<Color>,
}

impl TryFrom<RawThresholdScale> for ThresholdScale {
    type Error = StyleError;

    fn try_from(raw: RawThresholdScale) -> Result<Self, Self::Error> {
        ThresholdScale::new(raw.breakpoints, raw.colors)
    }
}

impl ThresholdScale {
    /// `colors[0]` is the lowest bucket; `colors.len()` must be
    /// `breakpoints.len() + 1`.
    pub fn new(breakpoints: Vec<f64>, colors: Vec<Color>) -> Result<Self, StyleError> {
        if colors.len() != breakpoints.len() + 1 {
            return Err(StyleError::ColorCount {
                breakpoints: breakpoints.len(),
                expected: breakpoints.len() + 1,
                actual: colors.len(),
            });
        }
        if let Some(i) = breakpoints.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(StyleError::Unordered(i + 1));
        }
        Ok(Self { breakpoints, colors })
    }

    /// Equal-count classes over `values`, one class per color.
    ///
    /// Breakpoints are the interior quantiles, linearly interpolated between
    /// neighbouring sorted values. NaN values are ignored.
    pub fn quantiles(values: &[f64], colors: Vec<Color>) -> Result<Self, StyleError> {
        if colors.is_empty() {
            return Err(StyleError::ColorCount {
                breakpoints: 0,
                expected: 1,
                actual: 0,
            });
        }
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return Err(StyleError::NoValues);
        }
        sorted.sort_by(f64::total_cmp);

        let classes = colors.len();
        let last = (sorted.len() - 1) as f64;
        let breakpoints = (1..classes)
            .map(|i| {
                let p = last * i as f64 / classes as f64;
                let below = p.floor() as usize;
                let frac = p - below as f64;
                match sorted.get(below + 1) {
                    Some(above) if frac > 0.0 => sorted[below] * (1.0 - frac) + above * frac,
                    _ => sorted[below],
                }
            })
            .collect();
        Self::new(breakpoints, colors)
    }

    /// The six-step district value ramp (2, 4, 6, 8, 10).
    pub fn district_values() -> Self {
        Self {
            breakpoints: vec![2.0, 4.0, 6.0, 8.0, 10.0],
            colors: ["#FEB24C", "#FD8D3C", "#FC4E2A", "#E31A1C", "#BD0026", "#800026"]
                .into_iter()
                .map(Color::from)
                .collect(),
        }
    }

    pub fn breakpoints(&self) -> &[f64] {
        &self.breakpoints
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// NaN exceeds no breakpoint and so falls into the lowest bucket.
    pub fn color_for(&self, value: f64) -> &Color {
        let bucket = self.breakpoints.partition_point(|b| *b < value);
        &self.colors[bucket]
    }

    /// Missing or non-numeric properties resolve to the lowest bucket.
    pub fn color_for_property(&self, feature: &Feature, key: &str) -> &Color {
        match numeric_property(feature, key) {
            Some(v) => self.color_for(v),
            None => &self.colors[0],
        }
    }
}

/// Categorical scale: exact integer ids map to fixed colors, everything else
/// to the fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalScale {
    entries: BTreeMap<i64, Color>,
    fallback: Color,
}

impl CategoricalScale {
    pub fn new(entries: impl IntoIterator<Item = (i64, Color)>, fallback: Color) -> Self {
        Self {
            entries: entries.into_iter().collect(),
            fallback,
        }
    }

    /// Ten distinct colors for district ids 1 through 10.
    pub fn ten_districts() -> Self {
        Self::new(
            [
                (1, "#ff0000"),
                (2, "#009933"),
                (3, "#0000ff"),
                (4, "#ff0066"),
                (5, "#9933ff"),
                (6, "#ff9900"),
                (7, "#00ffff"),
                (8, "#66ff33"),
                (9, "#ff66cc"),
                (10, "#6699ff"),
            ]
            .into_iter()
            .map(|(id, c)| (id, Color::from(c))),
            Color::from("#ffffff"),
        )
    }

    /// Highlights four of the Tartu city districts; the rest stay white.
    pub fn tartu_districts() -> Self {
        Self::new(
            [(1, "#ff0000"), (13, "#009933"), (6, "#0000ff"), (7, "#ff0066")]
                .into_iter()
                .map(|(id, c)| (id, Color::from(c))),
            Color::from("#ffffff"),
        )
    }

    pub fn fallback(&self) -> &Color {
        &self.fallback
    }

    pub fn color_for_id(&self, id: i64) -> &Color {
        self.entries.get(&id).unwrap_or(&self.fallback)
    }

    /// Only JSON numbers with an exact integral value can match an entry.
    pub fn color_for(&self, value: &Value) -> &Color {
        match value.as_f64().and_then(exact_integer) {
            Some(id) => self.color_for_id(id),
            None => &self.fallback,
        }
    }

    pub fn color_for_property(&self, feature: &Feature, key: &str) -> &Color {
        match feature.property(key) {
            Some(value) => self.color_for(value),
            None => &self.fallback,
        }
    }
}

/// Named categorical schemes selectable from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteName {
    #[default]
    Ten,
    Tartu,
}

impl PaletteName {
    pub fn scale(self) -> CategoricalScale {
        match self {
            PaletteName::Ten => CategoricalScale::ten_districts(),
            PaletteName::Tartu => CategoricalScale::tartu_districts(),
        }
    }
}

/// A property that is a JSON number; strings, null and NaN don't count.
pub fn numeric_property(feature: &Feature, key: &str) -> Option<f64> {
    feature
        .property(key)
        .and_then(Value::as_f64)
        .filter(|v| !v.is_nan())
}

fn exact_integer(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
