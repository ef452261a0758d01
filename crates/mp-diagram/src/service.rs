//! Candidate-model fallback around an external text generator.

use std::future::Future;
use std::path::Path;

use mp_config::DiagramConfig;
use serde::{Deserialize, Serialize};

use crate::prompt::{build_prompt, load_report};
use crate::{DetailLevel, DiagramError, Notation, sanitize};

/// What the caller wants diagrammed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRequest {
    pub run_id: String,
    /// Candidate models, tried in order until one succeeds.
    pub models: Vec<String>,
    pub max_input_chars: usize,
    pub notation: Notation,
    #[serde(default)]
    pub detail: DetailLevel,
}

impl DiagramRequest {
    /// A request using the configured models, budget and detail level.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::InvalidValue`] if the configured detail level
    /// is not recognised.
    pub fn from_config(
        run_id: impl Into<String>,
        notation: Notation,
        config: &DiagramConfig,
    ) -> Result<Self, DiagramError> {
        Ok(Self {
            run_id: run_id.into(),
            models: config.models.clone(),
            max_input_chars: config.max_input_chars,
            notation,
            detail: config.detail.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramResponse {
    pub run_id: String,
    /// The model whose output was used.
    pub model: String,
    pub diagram: String,
}

/// The text-generation call. Transport, retries and timeouts live with the
/// implementor.
pub trait TextGenerator {
    fn generate(
        &self,
        model: &str,
        prompt: &str,
    ) -> impl Future<Output = Result<String, DiagramError>> + Send;
}

pub struct DiagramService<G> {
    generator: G,
}

impl<G: TextGenerator> DiagramService<G> {
    pub const fn new(generator: G) -> Self {
        Self { generator }
    }

    /// Ask each candidate model in turn; sanitize the first answer.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::NoModels`] for an empty candidate list and
    /// [`DiagramError::AllModelsFailed`] when every model errors.
    pub async fn generate(&self, request: &DiagramRequest, report: &str) -> Result<DiagramResponse, DiagramError> {
        if request.models.iter().all(|m| m.trim().is_empty()) {
            return Err(DiagramError::NoModels);
        }

        let prompt = build_prompt(report, request.notation, request.detail);
        let mut failures = Vec::new();

        for model in request.models.iter().filter(|m| !m.trim().is_empty()) {
            match self.generator.generate(model, &prompt).await {
                Ok(text) => {
                    tracing::info!(run_id = %request.run_id, %model, notation = %request.notation, "diagram generated");
                    return Ok(DiagramResponse {
                        run_id: request.run_id.clone(),
                        model: model.clone(),
                        diagram: sanitize(&text, request.notation),
                    });
                }
                Err(error) => {
                    tracing::warn!(run_id = %request.run_id, %model, %error, "model failed; trying next candidate");
                    failures.push(format!("{model}: {error}"));
                }
            }
        }

        Err(DiagramError::AllModelsFailed(failures))
    }

    /// [`Self::generate`] over a text report on disk, truncated to the
    /// request's character budget.
    ///
    /// # Errors
    ///
    /// Returns [`DiagramError::Report`] if the report cannot be read, or any
    /// error from [`Self::generate`].
    pub async fn generate_from_report(
        &self,
        request: &DiagramRequest,
        report_path: &Path,
    ) -> Result<DiagramResponse, DiagramError> {
        let report = load_report(report_path, request.max_input_chars)?;
        self.generate(request, &report).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Fails for every model except `good`, recording the call order.
    struct Scripted {
        calls: Mutex<Vec<String>>,
    }

    impl TextGenerator for Scripted {
        async fn generate(&self, model: &str, _prompt: &str) -> Result<String, DiagramError> {
            self.calls.lock().unwrap().push(model.to_string());
            if model == "good" {
                Ok("```mermaid\nflowchart TD\n  db --> schema\n```".to_string())
            } else {
                Err(DiagramError::Generator {
                    model: model.to_string(),
                    message: "timeout".to_string(),
                })
            }
        }
    }

    fn request(models: &[&str]) -> DiagramRequest {
        DiagramRequest {
            run_id: "r1".into(),
            models: models.iter().map(ToString::to_string).collect(),
            max_input_chars: 100,
            notation: Notation::Flowchart,
            detail: DetailLevel::Basic,
        }
    }

    #[tokio::test]
    async fn falls_back_to_next_candidate() {
        let service = DiagramService::new(Scripted {
            calls: Mutex::new(Vec::new()),
        });
        let response = service.generate(&request(&["bad", "good", "unused"]), "report").await.unwrap();

        assert_eq!(response.model, "good");
        assert_eq!(response.diagram, "flowchart TD\n    db --> schema");
        assert_eq!(*service.generator.calls.lock().unwrap(), vec!["bad", "good"]);
    }

    #[tokio::test]
    async fn all_failures_are_listed() {
        let service = DiagramService::new(Scripted {
            calls: Mutex::new(Vec::new()),
        });
        let err = service.generate(&request(&["a", "b"]), "report").await.unwrap_err();
        assert!(matches!(err, DiagramError::AllModelsFailed(ref f) if f.len() == 2));
    }

    #[tokio::test]
    async fn empty_candidate_list_is_rejected() {
        let service = DiagramService::new(Scripted {
            calls: Mutex::new(Vec::new()),
        });
        let err = service.generate(&request(&[" "]), "report").await.unwrap_err();
        assert!(matches!(err, DiagramError::NoModels));
    }

    #[test]
    fn request_from_config_parses_detail() {
        let config = DiagramConfig {
            detail: "detailed".into(),
            ..Default::default()
        };
        let request = DiagramRequest::from_config("r9", Notation::Er, &config).unwrap();
        assert_eq!(request.detail, DetailLevel::Detailed);
        assert_eq!(request.models, vec!["llama3.1"]);
    }
}
