//! Historical draws.

use serde::{Deserialize, Serialize};

/// One draw: the numbers drawn, optionally tagged with its contest number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draw {
    pub contest: Option<u32>,
    pub numbers: Vec<u32>,
}

impl Draw {
    /// Numbers are stored sorted ascending. Validity against a lottery
    /// variant is checked later by the grid mapper.
    pub fn new(contest: Option<u32>, mut numbers: Vec<u32>) -> Self {
        numbers.sort_unstable();
        Self { contest, numbers }
    }
}
