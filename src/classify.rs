//! Script classification: source tables, destination tables, business logic.
//!
//! A script is classified with three independent generation requests, one
//! per [`Category`]. Each request carries the category's fixed instruction
//! followed by the full, verbatim script text. The requests are issued
//! concurrently and every one of them runs to completion, so a failure in
//! one category never cancels the other two.
//!
//! [`ScriptClassifier::classify`] reports failures as a typed
//! [`ClassificationError`]. [`ScriptClassifier::analyze`] applies the
//! configured [`ErrorPolicy`] and always yields all three fields.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::ClassificationError,
    llm::{GenerationRequest, TextGenerator}
};

/// Persona sent as the system message of every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that analyzes SQL scripts.";

/// Marker that prefixes every failure rendered into a result field.
pub const ERROR_MARKER: &str = "Error analyzing script";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

const PREAMBLE: &str = "Analyze the following SQL script and identify source tables, \
                        destination tables, and business logic.";

/// What a single request extracts from the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    SourceTables,
    DestinationTables,
    BusinessLogic
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::SourceTables,
        Category::DestinationTables,
        Category::BusinessLogic
    ];

    pub fn instruction(self) -> &'static str {
        match self {
            Self::SourceTables => "Provide the source tables:",
            Self::DestinationTables => "Provide the destination tables:",
            Self::BusinessLogic => "Provide the business logic:"
        }
    }

    /// Output ceiling. Table lists are short, logic narratives longer.
    pub fn max_tokens(self) -> u32 {
        match self {
            Self::SourceTables | Self::DestinationTables => 150,
            Self::BusinessLogic => 250
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SourceTables => "Source Tables",
            Self::DestinationTables => "Destination Tables",
            Self::BusinessLogic => "Business Logic"
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceTables => write!(f, "source tables"),
            Self::DestinationTables => write!(f, "destination tables"),
            Self::BusinessLogic => write!(f, "business logic")
        }
    }
}

/// How generation failures are rendered by [`ScriptClassifier::analyze`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Any failure yields `("", "", "Error analyzing script: ...")`
    #[default]
    Collapse,
    /// Successful fields are kept; each failed field holds its own error text
    PerCategory
}

/// The three model-produced text fields for one script.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub source_tables:      String,
    pub destination_tables: String,
    pub business_logic:     String
}

impl ClassificationResult {
    /// Presentation of a failed classification: empty table fields and the
    /// error text in `business_logic`.
    pub fn failed(error: &impl fmt::Display) -> Self {
        Self {
            source_tables:      String::new(),
            destination_tables: String::new(),
            business_logic:     error_text(error)
        }
    }

    pub fn field(&self, category: Category) -> &str {
        match category {
            Category::SourceTables => &self.source_tables,
            Category::DestinationTables => &self.destination_tables,
            Category::BusinessLogic => &self.business_logic
        }
    }
}

fn error_text(error: &impl fmt::Display) -> String {
    format!("{}: {}", ERROR_MARKER, error)
}

/// Build the user message for one category.
pub fn build_prompt(category: Category, script: &str) -> String {
    format!("{} {}\n\n{}", PREAMBLE, category.instruction(), script)
}

/// A request paired with the category it extracts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPreview {
    pub category: Category,
    pub request:  GenerationRequest
}

fn build_request(category: Category, script: &str, temperature: f32) -> GenerationRequest {
    GenerationRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt: build_prompt(category, script),
        max_tokens: category.max_tokens(),
        temperature
    }
}

/// The three requests for `script`, in category order, without a generator.
pub fn preview_requests(script: &str, temperature: f32) -> Vec<GenerationPreview> {
    Category::ALL
        .into_iter()
        .map(|category| GenerationPreview {
            category,
            request: build_request(category, script, temperature)
        })
        .collect()
}

type Outcome = Result<String, ClassificationError>;

/// Classifies scripts through any [`TextGenerator`].
#[derive(Clone)]
pub struct ScriptClassifier {
    generator:   Arc<dyn TextGenerator>,
    temperature: f32,
    policy:      ErrorPolicy
}

impl ScriptClassifier {
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self::from_arc(Arc::new(generator))
    }

    pub fn from_arc(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            temperature: DEFAULT_TEMPERATURE,
            policy: ErrorPolicy::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn request(&self, category: Category, script: &str) -> GenerationRequest {
        build_request(category, script, self.temperature)
    }

    /// The three requests a classification would send, in category order.
    pub fn prompts(&self, script: &str) -> Vec<GenerationPreview> {
        preview_requests(script, self.temperature)
    }

    async fn run(&self, category: Category, script: &str) -> Outcome {
        let request = self.request(category, script);
        let text = self
            .generator
            .generate(&request)
            .await
            .map_err(|source| ClassificationError {
                category,
                source
            })?;
        debug!(%category, chars = text.len(), "category classified");
        Ok(text.trim().to_string())
    }

    async fn run_all(&self, script: &str) -> (Outcome, Outcome, Outcome) {
        tokio::join!(
            self.run(Category::SourceTables, script),
            self.run(Category::DestinationTables, script),
            self.run(Category::BusinessLogic, script)
        )
    }

    /// Classify a script. The first failing category, in category order,
    /// is reported.
    pub async fn classify(
        &self,
        script: &str
    ) -> Result<ClassificationResult, ClassificationError> {
        let (source, destination, logic) = self.run_all(script).await;
        Ok(ClassificationResult {
            source_tables:      source?,
            destination_tables: destination?,
            business_logic:     logic?
        })
    }

    /// Classify a script and render failures according to the error policy.
    pub async fn analyze(&self, script: &str) -> ClassificationResult {
        match self.policy {
            ErrorPolicy::Collapse => match self.classify(script).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "classification failed");
                    ClassificationResult::failed(&e)
                }
            },
            ErrorPolicy::PerCategory => {
                let (source, destination, logic) = self.run_all(script).await;
                let render = |outcome: Outcome| {
                    outcome.unwrap_or_else(|e| {
                        warn!(error = %e, "category failed");
                        error_text(&e)
                    })
                };
                ClassificationResult {
                    source_tables:      render(source),
                    destination_tables: render(destination),
                    business_logic:     render(logic)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering}
    };

    use async_trait::async_trait;

    use super::*;
    use crate::error::GenerationError;

    /// Echoes the category named in the instruction.
    struct EchoGenerator {
        calls: AtomicUsize
    }

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let category = Category::ALL
                .into_iter()
                .find(|c| request.prompt.contains(c.instruction()))
                .map(|c| c.label())
                .unwrap_or("unknown");
            Ok(format!("  echo {}\n", category))
        }
    }

    /// Fails whenever the instruction matches `failing`.
    struct FailingGenerator {
        failing: Vec<Category>,
        seen:    Mutex<Vec<u32>>
    }

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
            self.seen.lock().unwrap().push(request.max_tokens);
            if self
                .failing
                .iter()
                .any(|c| request.prompt.contains(c.instruction()))
            {
                return Err(GenerationError::Transport("connection reset".to_string()));
            }
            Ok("ok".to_string())
        }
    }

    fn echo() -> EchoGenerator {
        EchoGenerator {
            calls: AtomicUsize::new(0)
        }
    }

    #[test]
    fn test_prompt_contains_instruction_and_script() {
        let prompt = build_prompt(Category::BusinessLogic, "SELECT 1;");
        assert!(prompt.starts_with("Analyze the following SQL script"));
        assert!(prompt.contains("Provide the business logic:\n\nSELECT 1;"));
    }

    #[test]
    fn test_max_tokens_per_category() {
        assert_eq!(Category::SourceTables.max_tokens(), 150);
        assert_eq!(Category::DestinationTables.max_tokens(), 150);
        assert_eq!(Category::BusinessLogic.max_tokens(), 250);
    }

    #[test]
    fn test_prompts_are_in_category_order() {
        let classifier = ScriptClassifier::new(echo()).with_temperature(0.2);
        let prompts = classifier.prompts("SELECT 1");
        assert_eq!(prompts.len(), 3);
        assert_eq!(prompts[0].category, Category::SourceTables);
        assert_eq!(prompts[2].request.max_tokens, 250);
        assert_eq!(prompts[1].request.temperature, 0.2);
        assert_eq!(prompts[0].request.system, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_classify_routes_and_trims() {
        let classifier = ScriptClassifier::new(echo());
        let result = classifier.classify("SELECT 1").await.unwrap();
        assert_eq!(result.source_tables, "echo Source Tables");
        assert_eq!(result.destination_tables, "echo Destination Tables");
        assert_eq!(result.business_logic, "echo Business Logic");
    }

    #[tokio::test]
    async fn test_classify_issues_three_requests() {
        let generator = Arc::new(echo());
        let classifier = ScriptClassifier::from_arc(generator.clone());
        classifier.classify("SELECT 1").await.unwrap();
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_classify_reports_typed_error() {
        let classifier = ScriptClassifier::new(FailingGenerator {
            failing: vec![Category::DestinationTables],
            seen:    Mutex::new(Vec::new())
        });
        let err = classifier.classify("SELECT 1").await.unwrap_err();
        assert_eq!(err.category, Category::DestinationTables);
        assert_eq!(
            err.source,
            GenerationError::Transport("connection reset".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_cancel_other_requests() {
        let generator = Arc::new(FailingGenerator {
            failing: vec![Category::SourceTables],
            seen:    Mutex::new(Vec::new())
        });
        let classifier = ScriptClassifier::from_arc(generator.clone());
        assert!(classifier.classify("SELECT 1").await.is_err());
        let mut seen = generator.seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec![150, 150, 250]);
    }

    #[tokio::test]
    async fn test_analyze_collapses_on_failure() {
        let classifier = ScriptClassifier::new(FailingGenerator {
            failing: vec![Category::BusinessLogic],
            seen:    Mutex::new(Vec::new())
        });
        let result = classifier.analyze("SELECT 1").await;
        assert_eq!(result.source_tables, "");
        assert_eq!(result.destination_tables, "");
        assert!(result.business_logic.starts_with(ERROR_MARKER));
        assert!(result.business_logic.contains("connection reset"));
        assert!(result.business_logic.contains("business logic"));
    }

    #[tokio::test]
    async fn test_analyze_per_category_keeps_successes() {
        let classifier = ScriptClassifier::new(FailingGenerator {
            failing: vec![Category::SourceTables],
            seen:    Mutex::new(Vec::new())
        })
        .with_error_policy(ErrorPolicy::PerCategory);
        let result = classifier.analyze("SELECT 1").await;
        assert!(result.source_tables.starts_with(ERROR_MARKER));
        assert_eq!(result.destination_tables, "ok");
        assert_eq!(result.business_logic, "ok");
    }

    #[tokio::test]
    async fn test_analyze_is_deterministic_with_deterministic_backend() {
        let classifier = ScriptClassifier::new(echo()).with_temperature(0.0);
        let first = classifier.analyze("INSERT INTO a SELECT * FROM b").await;
        let second = classifier.analyze("INSERT INTO a SELECT * FROM b").await;
        assert_eq!(first, second);
    }

    #[test]
    fn test_failed_result_shape() {
        let result = ClassificationResult::failed(&"boom");
        assert_eq!(result.field(Category::SourceTables), "");
        assert_eq!(result.field(Category::DestinationTables), "");
        assert_eq!(result.field(Category::BusinessLogic), "Error analyzing script: boom");
    }
}
