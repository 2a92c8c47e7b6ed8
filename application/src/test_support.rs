//! Hand-written mocks shared by the use case tests.

use crate::ports::llm_gateway::GatewayError;
use crate::ports::llm_service::{LlmService, LlmServiceError};
use async_trait::async_trait;
use council_domain::{
    AnalysisType, ChangedFile, Finding, LlmAnalysis, Model, PrContext, Priority, Recommendation,
    Severity,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// How the mock answers an analysis call for one agent type
#[derive(Clone)]
pub(crate) enum Reply {
    Analysis(LlmAnalysis),
    Fail,
    Hang,
    Panic,
}

pub(crate) struct MockLlmService {
    replies: Mutex<HashMap<AnalysisType, Reply>>,
    critique: Mutex<Option<String>>,
    /// Model and prompt of the most recent analysis call
    pub(crate) last_analysis_prompt: Mutex<Option<(Model, String)>>,
    pub(crate) analysis_calls: AtomicUsize,
    pub(crate) critique_calls: AtomicUsize,
}

impl MockLlmService {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(HashMap::new()),
            critique: Mutex::new(None),
            last_analysis_prompt: Mutex::new(None),
            analysis_calls: AtomicUsize::new(0),
            critique_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_reply(self, analysis_type: AnalysisType, reply: Reply) -> Self {
        self.replies.lock().unwrap().insert(analysis_type, reply);
        self
    }

    /// Text returned by every `generate_text` call; `None` makes it fail
    pub(crate) fn with_critique(self, critique: &str) -> Self {
        *self.critique.lock().unwrap() = Some(critique.to_string());
        self
    }
}

#[async_trait]
impl LlmService for MockLlmService {
    async fn generate_analysis(
        &self,
        model: &Model,
        analysis_type: AnalysisType,
        _context: &PrContext,
        prompt: &str,
    ) -> Result<LlmAnalysis, LlmServiceError> {
        self.analysis_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_analysis_prompt.lock().unwrap() = Some((model.clone(), prompt.to_string()));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&analysis_type)
            .cloned()
            .unwrap_or(Reply::Fail);
        match reply {
            Reply::Analysis(analysis) => Ok(analysis),
            Reply::Fail => Err(LlmServiceError::Gateway(GatewayError::RequestFailed(
                "mock failure".to_string(),
            ))),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(LlmServiceError::Timeout(3600))
            }
            Reply::Panic => panic!("mock panic"),
        }
    }

    async fn generate_text(
        &self,
        _model: &Model,
        _system_prompt: &str,
        _prompt: &str,
    ) -> Result<String, LlmServiceError> {
        self.critique_calls.fetch_add(1, Ordering::SeqCst);
        self.critique
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| LlmServiceError::MalformedResponse("no critique".to_string()))
    }
}

pub(crate) fn context() -> PrContext {
    PrContext::new("Add weekly digest emails")
        .with_description("Sends a digest to every active user")
        .with_file(ChangedFile::new(
            "services/email.js",
            "@@ -40,3 +40,5 @@\n+const q = `SELECT * FROM users WHERE id = ${id}`;\n+db.query(q);",
        ))
}

/// A well-formed response that clears every quality gate on its own
pub(crate) fn good_analysis(analysis_type: AnalysisType) -> LlmAnalysis {
    let (finding_type, message, category) = match analysis_type {
        AnalysisType::Security => (
            "injection-vulnerability",
            "SQL injection through string-built query",
            "security",
        ),
        AnalysisType::Performance => (
            "n-plus-one-query",
            "N+1 query while loading digest recipients",
            "performance",
        ),
        AnalysisType::Architectural => (
            "coupling-issue",
            "Email service is tightly coupled to the database driver",
            "architecture",
        ),
        AnalysisType::Testing => (
            "missing-tests",
            "No test covers the digest query",
            "testing",
        ),
    };
    let prefix = analysis_type.as_str();
    LlmAnalysis {
        analysis: format!("{} review of the digest change", analysis_type.display_name()),
        findings: vec![
            Finding::new(format!("{prefix}-f1"), finding_type, Severity::High, message)
                .at("services/email.js", Some(42))
                .with_evidence("services/email.js:42 const q = `SELECT * FROM users WHERE id = ${id}`")
                .with_confidence(0.85),
        ],
        recommendations: vec![
            Recommendation::new(
                format!("{prefix}-r1"),
                Priority::MustFix,
                category,
                format!("Fix the {} problem in the digest query", prefix),
            )
            .with_rationale("The digest runs for every active user")
            .with_implementation("Replace the template string with db.query('... WHERE id = $1', [id]) and add a test")
            .with_confidence(0.8)
            .related_to(format!("{prefix}-f1")),
        ],
        confidence: 0.85,
        heuristic: false,
    }
}

/// A response missing evidence and implementation text
pub(crate) fn thin_analysis(analysis_type: AnalysisType) -> LlmAnalysis {
    let mut analysis = good_analysis(analysis_type);
    for f in &mut analysis.findings {
        f.evidence.clear();
        f.confidence = 0.4;
    }
    for r in &mut analysis.recommendations {
        r.implementation.clear();
        r.rationale.clear();
    }
    analysis.confidence = 0.5;
    analysis
}
