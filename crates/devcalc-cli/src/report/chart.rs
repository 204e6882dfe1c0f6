//! Horizontal text bar charts.
//!
//! One line per quarter. Negative values extend left of the axis, positive
//! values to the right, all scaled against the largest magnitude.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const BAR_WIDTH: u32 = 40;

/// One labelled bar group; each value is drawn with its own glyph.
pub struct Series<'a> {
    pub name: &'a str,
    pub glyph: char,
}

pub struct BarChart<'a> {
    pub title: String,
    pub series: Vec<Series<'a>>,
    /// (row label, one value per series)
    pub rows: Vec<(String, Vec<Decimal>)>,
    pub annotation: String,
}

impl BarChart<'_> {
    pub fn render(&self) -> String {
        let scale = self
            .rows
            .iter()
            .flat_map(|(_, values)| values.iter())
            .map(|v| v.abs())
            .max()
            .unwrap_or(Decimal::ZERO);
        let has_negative = self
            .rows
            .iter()
            .flat_map(|(_, values)| values.iter())
            .any(|v| v.is_sign_negative() && !v.is_zero());
        let label_width = self.rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        if self.series.len() > 1 {
            let legend: Vec<String> = self
                .series
                .iter()
                .map(|s| format!("{} {}", s.glyph, s.name))
                .collect();
            out.push_str(&legend.join("   "));
            out.push('\n');
        }
        out.push('\n');

        for (label, values) in &self.rows {
            for (i, value) in values.iter().enumerate() {
                let glyph = self.series.get(i).map(|s| s.glyph).unwrap_or('#');
                let shown = if i == 0 { label.as_str() } else { "" };
                out.push_str(&format!(
                    "{shown:>label_width$} {} {}\n",
                    bar(*value, scale, glyph, has_negative),
                    value.round_dp(0)
                ));
            }
        }

        if !self.annotation.is_empty() {
            out.push('\n');
            out.push_str(&self.annotation);
            out.push('\n');
        }
        out
    }
}

fn bar_len(value: Decimal, scale: Decimal) -> usize {
    if scale.is_zero() {
        return 0;
    }
    (value.abs() / scale * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or(0)
}

fn bar(value: Decimal, scale: Decimal, glyph: char, has_negative: bool) -> String {
    let width = BAR_WIDTH as usize;
    let len = bar_len(value, scale);
    let body: String = std::iter::repeat(glyph).take(len).collect();

    if value.is_sign_negative() && !value.is_zero() {
        format!("{body:>width$}|{:width$}", "")
    } else if has_negative {
        format!("{:width$}|{body:<width$}", "")
    } else {
        format!("|{body:<width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_largest_value_fills_the_width() {
        assert_eq!(bar_len(dec!(-50), dec!(50)), BAR_WIDTH as usize);
        assert_eq!(bar_len(dec!(25), dec!(50)), 20);
        assert_eq!(bar_len(dec!(25), Decimal::ZERO), 0);
    }

    #[test]
    fn test_negative_bars_sit_left_of_the_axis() {
        let neg = bar(dec!(-10), dec!(10), '#', true);
        let pos = bar(dec!(10), dec!(10), '#', true);
        let axis = BAR_WIDTH as usize;
        assert_eq!(neg.find('|'), Some(axis));
        assert_eq!(pos.find('|'), Some(axis));
        assert!(neg[..axis].ends_with('#'));
        assert!(pos[axis + 1..].starts_with('#'));
    }

    #[test]
    fn test_render_includes_annotation() {
        let chart = BarChart {
            title: "Sales".into(),
            series: vec![Series { name: "m²", glyph: '#' }],
            rows: vec![("Q1".into(), vec![dec!(10)]), ("Q2".into(), vec![dec!(5)])],
            annotation: "NPV = 1".into(),
        };
        let text = chart.render();
        assert!(text.starts_with("Sales\n"));
        assert!(text.contains("Q1 |"));
        assert!(text.trim_end().ends_with("NPV = 1"));
    }
}
