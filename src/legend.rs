use crate::error::LegendError;
use crate::overlays::escape_html;
use crate::style::ThresholdScale;
use crate::types::{Color, ControlPosition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendSpec {
    pub title: String,
    pub position: ControlPosition,
    pub breakpoints: Vec<f64>,
    pub colors: Vec<Color>,
}

impl Default for LegendSpec {
    fn default() -> Self {
        Self::for_scale("District Values", 0.0, &ThresholdScale::district_values())
    }
}

impl LegendSpec {
    /// Legend whose buckets line up with a threshold scale, starting at `floor`.
    pub fn for_scale(title: &str, floor: f64, scale: &ThresholdScale) -> Self {
        let mut breakpoints = Vec::with_capacity(scale.breakpoints().len() + 1);
        breakpoints.push(floor);
        breakpoints.extend_from_slice(scale.breakpoints());
        Self {
            title: title.to_string(),
            position: ControlPosition::BottomLeft,
            breakpoints,
            colors: scale.colors().to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: Color,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendFragment {
    pub title: String,
    pub position: ControlPosition,
    pub entries: Vec<LegendEntry>,
}

/// Builds a fresh fragment every call; nothing is shared between results.
pub fn build_legend(spec: &LegendSpec) -> Result<LegendFragment, LegendError> {
    if spec.breakpoints.is_empty() {
        return Err(LegendError::Empty);
    }
    if spec.breakpoints.len() != spec.colors.len() {
        return Err(LegendError::LengthMismatch {
            breakpoints: spec.breakpoints.len(),
            colors: spec.colors.len(),
        });
    }
    if let Some(i) = spec.breakpoints.windows(2).position(|w| !(w[0] < w[1])) {
        return Err(LegendError::Unordered(i + 1));
    }

    let entries = spec
        .breakpoints
        .iter()
        .zip(&spec.colors)
        .enumerate()
        .map(|(i, (from, color))| {
            let label = match spec.breakpoints.get(i + 1) {
                Some(to) => format!("{}\u{2013}{}", format_number(*from), format_number(*to)),
                None => format!("{}+", format_number(*from)),
            };
            LegendEntry {
                color: color.clone(),
                label,
            }
        })
        .collect();

    Ok(LegendFragment {
        title: spec.title.clone(),
        position: spec.position,
        entries,
    })
}

impl LegendFragment {
    /// Markup for an `info legend` control body.
    pub fn to_html(&self) -> String {
        let mut html = format!("<div><strong>{}</strong></div>", escape_html(&self.title));
        for entry in &self.entries {
            html.push_str(&format!(
                "<i style=\"background:{}\"></i> {}<br>",
                entry.color,
                entry.label.replace('\u{2013}', "&ndash;")
            ));
        }
        html
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_legend_has_open_ended_last_bucket() {
        let legend = build_legend(&LegendSpec::default()).unwrap();
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(
            labels,
            vec!["0\u{2013}2", "2\u{2013}4", "4\u{2013}6", "6\u{2013}8", "8\u{2013}10", "10+"]
        );
        assert_eq!(legend.entries[0].color.as_str(), "#FEB24C");
        assert_eq!(legend.entries[5].color.as_str(), "#800026");
        assert_eq!(legend.position, ControlPosition::BottomLeft);
    }

    #[test]
    fn repeated_builds_are_independent() {
        let spec = LegendSpec::default();
        let first = build_legend(&spec).unwrap();
        let mut second = build_legend(&spec).unwrap();
        assert_eq!(first, second);
        second.entries.clear();
        assert_eq!(first.entries.len(), 6);
    }

    #[test]
    fn html_lists_every_bucket() {
        let html = build_legend(&LegendSpec::default()).unwrap().to_html();
        assert!(html.starts_with("<div><strong>District Values</strong></div>"));
        assert_eq!(html.matches("<br>").count(), 6);
        assert!(html.contains("<i style=\"background:#FEB24C\"></i> 0&ndash;2<br>"));
        assert!(html.ends_with("<i style=\"background:#800026\"></i> 10+<br>"));
    }

    #[test]
    fn html_escapes_the_title() {
        let spec = LegendSpec {
            title: "Values <b>&</b>".into(),
            ..LegendSpec::default()
        };
        let html = build_legend(&spec).unwrap().to_html();
        assert!(html.starts_with("<div><strong>Values &lt;b&gt;&amp;&lt;/b&gt;</strong></div>"));
    }

    #[test]
    fn quantile_scale_lines_up_with_legend() {
        let ids = [1.0, 2.0, 3.0, 4.0, 5.0];
        let colors: Vec<Color> = vec!["#ffffcc".into(), "#800026".into()];
        let scale = ThresholdScale::quantiles(&ids, colors).unwrap();
        let legend = build_legend(&LegendSpec::for_scale("District Values", 1.0, &scale)).unwrap();
        let labels: Vec<&str> = legend.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["1\u{2013}3", "3+"]);
    }

    #[test]
    fn fractional_breakpoints_keep_decimals() {
        let spec = LegendSpec {
            title: "Density".into(),
            position: ControlPosition::BottomRight,
            breakpoints: vec![0.5, 1.0],
            colors: vec!["#fff".into(), "#000".into()],
        };
        let legend = build_legend(&spec).unwrap();
        assert_eq!(legend.entries[0].label, "0.5\u{2013}1");
        assert_eq!(legend.entries[1].label, "1+");
    }

    #[test]
    fn invalid_specs_are_rejected() {
        let mut spec = LegendSpec::default();
        spec.colors.pop();
        assert_eq!(
            build_legend(&spec),
            Err(LegendError::LengthMismatch {
                breakpoints: 6,
                colors: 5
            })
        );

        spec.breakpoints.clear();
        spec.colors.clear();
        assert_eq!(build_legend(&spec), Err(LegendError::Empty));

        let unordered = LegendSpec {
            breakpoints: vec![0.0, 4.0, 2.0],
            colors: vec!["#a".into(), "#b".into(), "#c".into()],
            ..LegendSpec::default()
        };
        assert_eq!(build_legend(&unordered), Err(LegendError::Unordered(2)));
    }
}
