//! Data-subset selections for white-noise parameters.
//!
//! A selection splits the N TOAs of a pulsar into labelled subsets, each of
//! which gets its own copy of the noise parameters. Masks are over the
//! single-stream (length N) TOAs in base sort order; wideband signals apply
//! the same mask to the timing block and the DM block.

use std::collections::BTreeSet;

use crate::domain::SelectionKind;
use crate::pulsar::WidebandPulsar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// All TOAs in one subset with an empty label.
    #[default]
    NoSelection,
    /// One subset per backend flag, labelled by the flag.
    ByBackend,
}

impl From<SelectionKind> for Selection {
    fn from(kind: SelectionKind) -> Self {
        match kind {
            SelectionKind::None => Selection::NoSelection,
            SelectionKind::Backend => Selection::ByBackend,
        }
    }
}

impl Selection {
    /// `(label, mask)` pairs; labels are sorted for deterministic parameter order.
    pub fn masks(&self, psr: &WidebandPulsar) -> Vec<(String, Vec<bool>)> {
        match self {
            Selection::NoSelection => vec![(String::new(), vec![true; psr.ntoa()])],
            Selection::ByBackend => {
                let backends = psr.backends();
                let labels: BTreeSet<&String> = backends.iter().collect();
                labels
                    .into_iter()
                    .map(|label| {
                        let mask = backends.iter().map(|b| b == label).collect();
                        (label.clone(), mask)
                    })
                    .collect()
            }
        }
    }
}
