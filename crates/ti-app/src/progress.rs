use ti_core::LineId;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStage {
    LoadingCase,
    CheckingCache,
    LoadingCachedResult,
    CompilingNetwork,
    AnalyzingLines,
    SavingResults,
    Completed,
}

impl RunStage {
    pub fn label(&self) -> &'static str {
        match self {
            RunStage::LoadingCase => "loading-case",
            RunStage::CheckingCache => "checking-cache",
            RunStage::LoadingCachedResult => "loading-cache",
            RunStage::CompilingNetwork => "compiling",
            RunStage::AnalyzingLines => "analyzing",
            RunStage::SavingResults => "saving",
            RunStage::Completed => "completed",
        }
    }
}

/// Completion of one line solve.
#[derive(Debug, Clone)]
pub struct LineProgress {
    pub line: LineId,
    pub name: String,
    pub completed: usize,
    pub total: usize,
    pub score: f64,
}

impl LineProgress {
    pub fn fraction_complete(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub line: Option<LineProgress>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message,
            line: None,
        }
    }

    pub fn line(elapsed_wall_s: f64, line: LineProgress) -> Self {
        Self {
            stage: RunStage::AnalyzingLines,
            elapsed_wall_s,
            message: None,
            line: Some(line),
        }
    }
}
