//! The question-answering orchestrator.
//!
//! A [`QaSystem`] owns an ordered list of retrieval strategies (semantic
//! first, lexical second). `initialize` commits to the first strategy that
//! builds its index; `answer` queries it and falls forward to later
//! strategies when a search fails mid-request.

pub mod plan;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::classify::{RegexSectionClassifier, SectionClassifier};
use crate::config::Config;
use crate::error::QaError;
use crate::llm::answer::{AnswerGenerator, LlmAnswerGenerator};
use crate::llm::embeddings::HttpEmbedder;
use crate::models::{Chunk, QaStatus};
use crate::resume::load_resume;
use crate::search::lexical::LexicalSearch;
use crate::search::semantic::SemanticSearch;
use crate::search::SearchBackend;

pub use plan::{plan_answer, select_backend, AnswerPlan};

pub const NOT_INITIALIZED_MESSAGE: &str = "The QA system has not been initialized yet.";
pub const NO_INFORMATION_MESSAGE: &str =
    "I don't have enough information to answer that question based on the resume.";
pub const ERROR_MESSAGE: &str = "Sorry, I encountered an error while processing your question.";

/// State committed by a successful `initialize`.
struct Session {
    resume: String,
    /// Index into `QaSystem::backends`
    active: usize,
    /// One slot per backend after `active`. Each fallback index is built at
    /// most once per session; a failed build is kept and not retried.
    fallback_builds: Vec<OnceCell<Result<(), String>>>,
}

pub struct QaSystem {
    resume_path: PathBuf,
    top_k: usize,
    backends: Vec<Arc<dyn SearchBackend>>,
    classifier: Box<dyn SectionClassifier>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    session: OnceCell<Session>,
}

impl QaSystem {
    /// `backends` are tried in order; the first is the primary strategy.
    pub fn new(
        resume_path: impl Into<PathBuf>,
        top_k: usize,
        backends: Vec<Arc<dyn SearchBackend>>,
    ) -> Self {
        Self {
            resume_path: resume_path.into(),
            top_k,
            backends,
            classifier: Box::new(RegexSectionClassifier::default()),
            generator: None,
            session: OnceCell::new(),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_classifier(mut self, classifier: Box<dyn SectionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Semantic search over HTTP embeddings, lexical fallback, and the HTTP
    /// answer generator, all from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()?;

        let embedder = Arc::new(HttpEmbedder::new(http_client.clone(), config.llm.clone()));
        let backends: Vec<Arc<dyn SearchBackend>> = vec![
            Arc::new(SemanticSearch::new(embedder, &config.search)),
            Arc::new(LexicalSearch::from_config(&config.search)),
        ];
        let generator = Arc::new(LlmAnswerGenerator::new(
            http_client,
            config.generator.clone(),
        ));

        Ok(Self::new(config.resume_path.clone(), config.search.top_k, backends)
            .with_generator(generator))
    }

    /// Load the resume and build the first index that succeeds.
    ///
    /// Returns `false` if the resume cannot be loaded or every backend fails.
    /// Once this has returned `true`, later calls return `true` immediately.
    pub async fn initialize(&self) -> bool {
        match self.session.get_or_try_init(|| self.start_session()).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Error initializing QA system: {e}");
                false
            }
        }
    }

    async fn start_session(&self) -> Result<Session, QaError> {
        let doc = load_resume(&self.resume_path)
            .await
            .map_err(|cause| QaError::ResumeLoad {
                path: self.resume_path.clone(),
                cause,
            })?;

        let mut outcomes = Vec::with_capacity(self.backends.len());
        for backend in &self.backends {
            tracing::info!("Initializing {} search", backend.kind());
            let outcome = backend.initialize(&doc.resume_content).await;
            if let Err(e) = &outcome {
                tracing::warn!("{} search initialization failed: {e:#}", backend.kind());
            }
            let succeeded = outcome.is_ok();
            outcomes.push(outcome);
            if succeeded {
                break;
            }
        }

        let Some(active) = select_backend(&outcomes) else {
            let failures = self
                .backends
                .iter()
                .zip(outcomes)
                .filter_map(|(b, outcome)| outcome.err().map(|e| (b.kind(), format!("{e:#}"))))
                .collect();
            return Err(QaError::NoBackend(failures));
        };

        let kind = self.backends[active].kind();
        if active == 0 {
            tracing::info!("QA system initialized with {kind} search");
        } else {
            tracing::info!("QA system initialized with fallback {kind} search");
        }

        Ok(Session {
            resume: doc.resume_content,
            active,
            fallback_builds: (active + 1..self.backends.len())
                .map(|_| OnceCell::new())
                .collect(),
        })
    }

    pub fn status(&self) -> QaStatus {
        match self.session.get() {
            Some(session) => QaStatus {
                initialized: true,
                using_fallback: session.active != 0,
                backend: Some(self.backends[session.active].kind()),
            },
            None => QaStatus {
                initialized: false,
                using_fallback: false,
                backend: None,
            },
        }
    }

    /// Answer a question about the resume. Never fails: errors are logged
    /// and reported with a fixed message.
    pub async fn answer(&self, question: &str) -> String {
        let Some(session) = self.session.get() else {
            return NOT_INITIALIZED_MESSAGE.to_string();
        };

        match self.try_answer(session, question).await {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!("Error processing question: {e}");
                ERROR_MESSAGE.to_string()
            }
        }
    }

    async fn try_answer(&self, session: &Session, question: &str) -> Result<String, QaError> {
        let chunks = self.retrieve(session, question).await?;
        tracing::debug!("Retrieved {} chunks for question", chunks.len());

        match plan_answer(question, &chunks, self.classifier.as_ref()) {
            AnswerPlan::NoInformation => Ok(NO_INFORMATION_MESSAGE.to_string()),
            AnswerPlan::Section {
                keyword,
                full_section,
            } => {
                tracing::debug!("Answering from the '{keyword}' section");
                self.generate_or(&full_section, &full_section, question)
                    .await
            }
            AnswerPlan::Context { context, top_chunk } => {
                self.generate_or(&context, &top_chunk, question).await
            }
        }
    }

    /// Generated answer when a generator is configured, `verbatim` otherwise.
    async fn generate_or(
        &self,
        context: &str,
        verbatim: &str,
        question: &str,
    ) -> Result<String, QaError> {
        match &self.generator {
            Some(generator) if generator.is_configured() => generator
                .generate_answer(context, question)
                .await
                .map_err(QaError::Generation),
            _ => Ok(verbatim.to_string()),
        }
    }

    /// Search the active backend, moving to later backends on error.
    async fn retrieve(&self, session: &Session, question: &str) -> Result<Vec<Chunk>, QaError> {
        let mut last_error = None;

        for (offset, backend) in self.backends[session.active..].iter().enumerate() {
            if offset > 0 {
                if let Err(e) = self.ensure_fallback(session, offset - 1).await {
                    last_error = Some(e);
                    continue;
                }
            }

            match backend.search(question, self.top_k).await {
                Ok(mut chunks) => {
                    chunks.truncate(self.top_k);
                    return Ok(chunks);
                }
                Err(e) => {
                    tracing::warn!(
                        "Error with {} search, falling back to the next backend: {e:#}",
                        backend.kind()
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(QaError::Retrieval(
            last_error.unwrap_or_else(|| anyhow::anyhow!("no search backend available")),
        ))
    }

    /// Build the fallback index in slot `slot` on first use. Concurrent
    /// callers wait for the one build in flight.
    async fn ensure_fallback(&self, session: &Session, slot: usize) -> anyhow::Result<()> {
        let backend = &self.backends[session.active + 1 + slot];
        let outcome = session.fallback_builds[slot]
            .get_or_init(|| async {
                if backend.is_ready() {
                    return Ok(());
                }
                tracing::info!("Initializing {} search for fallback retrieval", backend.kind());
                backend.initialize(&session.resume).await.map_err(|e| {
                    tracing::warn!("{} search initialization failed: {e:#}", backend.kind());
                    format!("{e:#}")
                })
            })
            .await;

        outcome
            .clone()
            .map_err(|e| anyhow::anyhow!("{} search unavailable: {e}", backend.kind()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BackendKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Scripted backend that records how it was used.
    struct FakeBackend {
        kind: BackendKind,
        init_ok: bool,
        search_ok: bool,
        chunks: Vec<Chunk>,
        ready: AtomicBool,
        init_calls: AtomicUsize,
        search_calls: AtomicUsize,
    }

    impl FakeBackend {
        fn new(kind: BackendKind, init_ok: bool, search_ok: bool, chunks: Vec<Chunk>) -> Arc<Self> {
            Arc::new(Self {
                kind,
                init_ok,
                search_ok,
                chunks,
                ready: AtomicBool::new(false),
                init_calls: AtomicUsize::new(0),
                search_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn initialize(&self, _content: &str) -> anyhow::Result<()> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            // Let concurrent callers interleave with the build
            tokio::task::yield_now().await;
            if !self.init_ok {
                anyhow::bail!("{} index unavailable", self.kind);
            }
            self.ready.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn search(&self, _query: &str, _top_k: usize) -> anyhow::Result<Vec<Chunk>> {
            self.search_calls.fetch_add(1, Ordering::SeqCst);
            if !self.search_ok {
                anyhow::bail!("{} search exploded", self.kind);
            }
            Ok(self.chunks.clone())
        }
    }

    struct FakeGenerator {
        configured: bool,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnswerGenerator for FakeGenerator {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate_answer(&self, context: &str, question: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("model overloaded");
            }
            Ok(format!("generated[{question}]<{context}>"))
        }
    }

    fn generator(configured: bool, fail: bool) -> Arc<FakeGenerator> {
        Arc::new(FakeGenerator {
            configured,
            fail,
            calls: AtomicUsize::new(0),
        })
    }

    fn chunk(section: &str, text: &str, full: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            section: section.to_string(),
            full_section: full.to_string(),
            score: 0.8,
        }
    }

    fn skills_chunks() -> Vec<Chunk> {
        vec![
            chunk("Skills", "Go, Rust", "Skills\nGo, Rust, distributed systems"),
            chunk("Experience", "Acme Corp", "Experience\nAcme Corp"),
        ]
    }

    fn resume_file() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("resume.json"),
            r#"{"resume_content": "Skills\nGo, Rust, distributed systems"}"#,
        )
        .unwrap();
        dir
    }

    fn system(dir: &tempfile::TempDir, backends: Vec<Arc<FakeBackend>>) -> QaSystem {
        let backends: Vec<Arc<dyn SearchBackend>> = backends
            .into_iter()
            .map(|b| b as Arc<dyn SearchBackend>)
            .collect();
        QaSystem::new(dir.path().join("resume.json"), 15, backends)
    }

    #[tokio::test]
    async fn test_answer_before_initialize() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic.clone()]);

        assert_eq!(qa.answer("tell me about your skills").await, NOT_INITIALIZED_MESSAGE);
        assert_eq!(semantic.search_calls.load(Ordering::SeqCst), 0);
        assert!(!qa.status().initialized);
    }

    #[tokio::test]
    async fn test_initialize_prefers_semantic() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, true, true, vec![]);
        let qa = system(&dir, vec![semantic.clone(), lexical.clone()]);

        assert!(qa.initialize().await);
        assert_eq!(
            qa.status(),
            QaStatus {
                initialized: true,
                using_fallback: false,
                backend: Some(BackendKind::Semantic),
            }
        );
        assert_eq!(lexical.init_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_falls_back_to_lexical() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, false, true, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, true, true, vec![]);
        let qa = system(&dir, vec![semantic.clone(), lexical.clone()]);

        assert!(qa.initialize().await);
        let status = qa.status();
        assert!(status.using_fallback);
        assert_eq!(status.backend, Some(BackendKind::Lexical));
        assert_eq!(semantic.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lexical.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_initialize_all_fail() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, false, true, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, false, true, vec![]);
        let qa = system(&dir, vec![semantic, lexical]);

        assert!(!qa.initialize().await);
        assert!(!qa.status().initialized);
        assert_eq!(qa.answer("anything").await, NOT_INITIALIZED_MESSAGE);
    }

    #[tokio::test]
    async fn test_initialize_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, vec![]);
        let qa = system(&dir, vec![semantic.clone()]);

        assert!(!qa.initialize().await);
        assert_eq!(semantic.init_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, vec![]);
        let qa = system(&dir, vec![semantic.clone()]);

        assert!(qa.initialize().await);
        assert!(qa.initialize().await);
        assert_eq!(semantic.init_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_error_falls_back_mid_request() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, false, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic.clone(), lexical.clone()]);

        assert!(qa.initialize().await);
        let answer = qa.answer("Where do you work now?").await;
        assert_eq!(answer, "Go, Rust");
        // Lexical was built lazily for the fallback search
        assert_eq!(lexical.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lexical.search_calls.load(Ordering::SeqCst), 1);
        // The committed backend does not change
        assert_eq!(qa.status().backend, Some(BackendKind::Semantic));
    }

    #[tokio::test]
    async fn test_concurrent_answers_build_fallback_once() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, false, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic, lexical.clone()]);

        assert!(qa.initialize().await);
        let (a, b, c) = tokio::join!(
            qa.answer("Where do you live?"),
            qa.answer("Where do you work?"),
            qa.answer("Who are you?")
        );
        for answer in [a, b, c] {
            assert_eq!(answer, "Go, Rust");
        }
        assert_eq!(lexical.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lexical.search_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_fallback_build_is_not_retried() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, false, vec![]);
        let lexical = FakeBackend::new(BackendKind::Lexical, false, true, skills_chunks());
        let qa = system(&dir, vec![semantic.clone(), lexical.clone()]);

        assert!(qa.initialize().await);
        for _ in 0..5 {
            assert_eq!(qa.answer("Where do you live?").await, ERROR_MESSAGE);
        }
        assert_eq!(lexical.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(lexical.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(semantic.search_calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_lexical_failure_has_no_reverse_fallback() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, false, true, skills_chunks());
        let lexical = FakeBackend::new(BackendKind::Lexical, true, false, vec![]);
        let qa = system(&dir, vec![semantic.clone(), lexical]);

        assert!(qa.initialize().await);
        assert_eq!(qa.answer("What are your skills?").await, ERROR_MESSAGE);
        assert_eq!(semantic.search_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_results_no_information() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, vec![]);
        let gen = generator(true, false);
        let qa = system(&dir, vec![semantic]).with_generator(gen.clone());

        assert!(qa.initialize().await);
        assert_eq!(qa.answer("tell me about your skills").await, NO_INFORMATION_MESSAGE);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_section_answer_verbatim() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic]).with_generator(generator(false, false));

        assert!(qa.initialize().await);
        assert_eq!(
            qa.answer("tell me about your skills").await,
            "Skills\nGo, Rust, distributed systems"
        );
    }

    #[tokio::test]
    async fn test_section_answer_generated_from_full_section() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic]).with_generator(generator(true, false));

        assert!(qa.initialize().await);
        assert_eq!(
            qa.answer("tell me about your skills").await,
            "generated[tell me about your skills]<Skills\nGo, Rust, distributed systems>"
        );
    }

    #[tokio::test]
    async fn test_default_answer_generated_from_context() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic]).with_generator(generator(true, false));

        assert!(qa.initialize().await);
        assert_eq!(
            qa.answer("Where are you based?").await,
            "generated[Where are you based?]<Go, Rust\n\nAcme Corp>"
        );
    }

    #[tokio::test]
    async fn test_generation_failure_in_either_path_is_error_message() {
        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let gen = generator(true, true);
        let qa = system(&dir, vec![semantic]).with_generator(gen.clone());

        assert!(qa.initialize().await);
        assert_eq!(qa.answer("tell me about your skills").await, ERROR_MESSAGE);
        assert_eq!(qa.answer("Where are you based?").await, ERROR_MESSAGE);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_results_truncated_to_top_k() {
        let dir = resume_file();
        let many: Vec<Chunk> = (0..20)
            .map(|i| chunk("Experience", &format!("job {i}"), "Experience"))
            .collect();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, many);
        let backends: Vec<Arc<dyn SearchBackend>> = vec![semantic];
        let qa = QaSystem::new(dir.path().join("resume.json"), 3, backends)
            .with_generator(generator(true, false));

        assert!(qa.initialize().await);
        assert_eq!(
            qa.answer("Where are you based?").await,
            "generated[Where are you based?]<job 0\n\njob 1\n\njob 2>"
        );
    }

    #[tokio::test]
    async fn test_custom_classifier() {
        struct NeverSection;
        impl SectionClassifier for NeverSection {
            fn section_keyword(&self, _question: &str) -> Option<String> {
                None
            }
        }

        let dir = resume_file();
        let semantic = FakeBackend::new(BackendKind::Semantic, true, true, skills_chunks());
        let qa = system(&dir, vec![semantic]).with_classifier(Box::new(NeverSection));

        assert!(qa.initialize().await);
        assert_eq!(qa.answer("tell me about your skills").await, "Go, Rust");
    }
}
