use std::collections::BTreeMap;

use plotters::style::RGBColor;

/// matplotlib "tab10"
pub const TAB10: [RGBColor; 10] = [
    RGBColor(0x1f, 0x77, 0xb4),
    RGBColor(0xff, 0x7f, 0x0e),
    RGBColor(0x2c, 0xa0, 0x2c),
    RGBColor(0xd6, 0x27, 0x28),
    RGBColor(0x94, 0x67, 0xbd),
    RGBColor(0x8c, 0x56, 0x4b),
    RGBColor(0xe3, 0x77, 0xc2),
    RGBColor(0x7f, 0x7f, 0x7f),
    RGBColor(0xbc, 0xbd, 0x22),
    RGBColor(0x17, 0xbe, 0xcf),
];

const OVERLAY_ALPHA: f64 = 0.7;
const OVERLAY_ALPHA_STEP: f64 = 0.15;
const MIN_ALPHA: f64 = 0.1;

/// Stable CPU id -> color binding, shared by every chart of a run.
/// Ids are ranked in ascending order; the palette cycles past ten CPUs.
#[derive(Clone, Debug, Default)]
pub struct ColorMap {
    colors: BTreeMap<u32, RGBColor>,
}

impl ColorMap {
    pub fn new(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut colors = BTreeMap::new();
        for id in ids {
            colors.entry(id).or_insert(TAB10[0]);
        }
        for (rank, color) in colors.values_mut().enumerate() {
            *color = TAB10[rank % TAB10.len()];
        }
        Self { colors }
    }

    pub fn color(&self, id: u32) -> RGBColor {
        self.colors.get(&id).copied().unwrap_or(TAB10[0])
    }
}

/// Alpha of the `index`-th series in an overlay chart.
pub fn overlay_alpha(index: usize) -> f64 {
    (OVERLAY_ALPHA - index as f64 * OVERLAY_ALPHA_STEP).max(MIN_ALPHA)
}
