/// What happened to one file during an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Ingested { chunks: usize },
    Skipped,
    Failed { error: String },
}

/// Per-file outcomes plus aggregate totals for one run.
///
/// A run with failed files is still a completed run; the caller decides
/// what partial failure means for the process exit code.
#[derive(Debug, Default)]
pub struct IngestionReport {
    outcomes: Vec<(String, FileOutcome)>,
}

impl IngestionReport {
    pub fn new(mut outcomes: Vec<(String, FileOutcome)>) -> Self {
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        Self { outcomes }
    }

    pub fn outcomes(&self) -> &[(String, FileOutcome)] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn total_chunks(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                FileOutcome::Ingested { chunks } => *chunks,
                _ => 0,
            })
            .sum()
    }

    pub fn ingested_files(&self) -> usize {
        self.count_matching(|outcome| matches!(outcome, FileOutcome::Ingested { .. }))
    }

    pub fn skipped_files(&self) -> usize {
        self.count_matching(|outcome| matches!(outcome, FileOutcome::Skipped))
    }

    pub fn failed_files(&self) -> usize {
        self.count_matching(|outcome| matches!(outcome, FileOutcome::Failed { .. }))
    }

    fn count_matching(&self, predicate: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}
