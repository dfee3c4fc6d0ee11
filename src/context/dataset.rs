//! Dataset summary block.

use serde::{Deserialize, Serialize};

/// Series listed at most, counting the constant at index 0.
pub const MAX_LISTED_SERIES: usize = 30;

pub const NO_DATASET: &str = "(no dataset loaded)\n";

/// Shape of the dataset currently loaded in the host session.
///
/// `var_names[0]` is the constant and is never listed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub nobs: usize,
    pub nvars: usize,
    pub pd: u32,
    pub sample_start: String,
    pub sample_end: String,
    #[serde(default)]
    pub var_names: Vec<String>,
}

impl DatasetInfo {
    pub fn is_empty(&self) -> bool {
        self.nobs == 0 || self.nvars == 0
    }

    /// Two-line summary: observation counts, then the first series names.
    pub fn render(&self) -> String {
        let limit = self.nvars.min(MAX_LISTED_SERIES);
        let names: Vec<&str> = (1..limit)
            .filter_map(|i| self.var_names.get(i).map(String::as_str))
            .collect();

        let mut out = format!(
            "nobs={}, vars={}, pd={}, sample={}..{}\nvars: {}",
            self.nobs,
            self.nvars,
            self.pd,
            self.sample_start,
            self.sample_end,
            names.join(", ")
        );
        if self.nvars > limit {
            out.push_str(", ...");
        }
        out.push('\n');
        out
    }
}

/// `[Dataset]` block, with a placeholder when nothing is loaded.
pub fn dataset_block(info: Option<&DatasetInfo>) -> String {
    match info.filter(|info| !info.is_empty()) {
        Some(info) => format!("[Dataset]\n{}", info.render()),
        None => format!("[Dataset]\n{NO_DATASET}"),
    }
}
