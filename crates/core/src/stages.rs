//! The ordered stage plan with fixed progress bands.
//!
//! The executor iterates this table rather than branching per stage, so
//! stages can be added or reordered without touching its control flow.
//! Each stage reports progress at its band edges.

/// Identifies which adapter (or executor-internal step) a stage invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    /// Executor-owned sanity check of the stored original.
    Validate,
    /// BackgroundRemover adapter.
    RemoveBackground,
    /// VectorTracer adapter.
    Vectorize,
    /// FormatRenderer adapter, once per output format.
    Render,
}

/// One row of the stage plan.
#[derive(Debug, Clone, Copy)]
pub struct StageSpec {
    pub kind: StageKind,
    /// Client-visible stage label.
    pub label: &'static str,
    /// Inclusive progress band `(lower, upper)`.
    pub band: (u8, u8),
}

/// The pipeline's ordered stage sequence.
pub const STAGE_PLAN: [StageSpec; 4] = [
    StageSpec {
        kind: StageKind::Validate,
        label: "Validating upload",
        band: (0, 10),
    },
    StageSpec {
        kind: StageKind::RemoveBackground,
        label: "Removing background",
        band: (10, 40),
    },
    StageSpec {
        kind: StageKind::Vectorize,
        label: "Converting to vectors",
        band: (40, 80),
    },
    StageSpec {
        kind: StageKind::Render,
        label: "Generating outputs",
        band: (80, 100),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_cover_zero_to_hundred_contiguously() {
        assert_eq!(STAGE_PLAN[0].band.0, 0);
        assert_eq!(STAGE_PLAN[STAGE_PLAN.len() - 1].band.1, 100);
        for pair in STAGE_PLAN.windows(2) {
            assert_eq!(
                pair[0].band.1, pair[1].band.0,
                "band of {:?} must end where {:?} begins",
                pair[0].kind, pair[1].kind
            );
        }
    }

    #[test]
    fn bands_match_the_published_contract() {
        let bands: Vec<(u8, u8)> = STAGE_PLAN.iter().map(|s| s.band).collect();
        assert_eq!(bands, vec![(0, 10), (10, 40), (40, 80), (80, 100)]);
    }
}
