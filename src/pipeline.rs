use serde_json::Value;
use tracing::{info, warn};

use crate::assembler::assemble;
use crate::config::Config;
use crate::corpus::{Corpus, Passage};
use crate::embeddings::provider_from_config;
use crate::error::{CorepError, Result};
use crate::llm::{GeminiClient, Generator, generate_json};
use crate::models::ReportOutput;
use crate::prompts::{build_system_prompt, build_user_prompt};
use crate::retriever::Retriever;
use crate::validator::Validator;
use crate::vector_db::RetrievalResult;

/// Question in, validated own funds report out.
pub struct CorepPipeline {
    retriever: Retriever,
    generator: Box<dyn Generator>,
    validator: Validator,
    top_k: usize,
}

impl CorepPipeline {
    pub fn new(
        retriever: Retriever,
        generator: Box<dyn Generator>,
        validator: Validator,
        top_k: usize,
    ) -> Self {
        CorepPipeline {
            retriever,
            generator,
            validator,
            top_k,
        }
    }

    pub fn from_config(config: &Config, corpus: Corpus) -> Result<Self> {
        let embedder = provider_from_config(&config.embedding)?;
        let generator = GeminiClient::new(config.generation.clone())?;
        Ok(Self::new(
            Retriever::new(corpus, embedder),
            Box::new(generator),
            Validator::new(config.tolerance),
            config.top_k,
        ))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn retrieve_passages(&self, question: &str) -> Result<RetrievalResult> {
        let results = self.retriever.retrieve(question, self.top_k)?;
        info!(count = results.len(), "retrieved regulatory passages");
        Ok(results)
    }

    /// `None` when the model produced nothing parseable.
    pub fn reason_with_llm(&self, question: &str, passages: &[Passage]) -> Option<Value> {
        info!("calling LLM for regulatory interpretation");
        let system_prompt = build_system_prompt();
        let user_prompt = build_user_prompt(question, passages);
        generate_json(self.generator.as_ref(), &system_prompt, &user_prompt)
    }

    /// Assembles the candidate and appends the validator's warnings.
    pub fn validate_and_build(&self, candidate: &Value) -> ReportOutput {
        let mut output = assemble(candidate);
        let warnings = self.validator.run_all(&output);
        if warnings.is_empty() {
            info!("all validations passed");
        } else {
            warn!(count = warnings.len(), "validation warnings found");
        }
        output.extend_warnings(warnings);
        output
    }

    pub fn run(&self, question: &str) -> Result<ReportOutput> {
        info!(question, "starting COREP reporting pipeline");

        let passages: Vec<Passage> = self
            .retrieve_passages(question)?
            .into_iter()
            .map(|hit| hit.passage)
            .collect();

        let candidate = self.reason_with_llm(question, &passages).ok_or_else(|| {
            CorepError::GenerationUnavailable("LLM failed to generate valid output".to_string())
        })?;

        let output = self.validate_and_build(&candidate);
        info!(warnings = output.warnings.len(), "pipeline complete");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashingEmbedder;
    use crate::models::CapitalFigures;
    use std::sync::{Arc, Mutex};

    /// Replays a fixed response and records the prompts it was given.
    struct ScriptedGenerator {
        response: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(response: Option<&str>) -> Self {
            ScriptedGenerator {
                response: response.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl Generator for Arc<ScriptedGenerator> {
        fn generate(&self, _system: &str, user: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(user.to_string());
            self.response
                .clone()
                .ok_or_else(|| CorepError::GenerationUnavailable("offline".to_string()))
        }
    }

    fn pipeline(generator: &Arc<ScriptedGenerator>) -> CorepPipeline {
        let retriever = Retriever::new(
            Corpus::own_funds(),
            Box::new(HashingEmbedder::new(128).unwrap()),
        );
        CorepPipeline::new(retriever, Box::new(generator.clone()), Validator::default(), 3)
    }

    #[test]
    fn test_run_consistent_output() -> Result<()> {
        let generator = Arc::new(ScriptedGenerator::new(Some(
            r#"```json
            {
                "own_funds": {
                    "common_equity_tier_1": 100,
                    "additional_tier_1": 20,
                    "tier_2": 15,
                    "total_own_funds": 135
                },
                "audit_log": [
                    {"field": "total_own_funds", "value": 135, "rule_ids": ["PRA_OWNFUNDS_008"]}
                ],
                "warnings": []
            }
            ```"#,
        )));

        let output = pipeline(&generator).run("How is total own funds calculated?")?;
        assert_eq!(output.figures, CapitalFigures::new(100.0, 20.0, 15.0, 135.0));
        assert!(output.warnings.is_empty());
        assert_eq!(output.justifications[0].explanation, "No explanation provided");

        let prompts = generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("How is total own funds calculated?"));
        assert_eq!(prompts[0].matches("[PRA_OWNFUNDS_").count(), 3);
        Ok(())
    }

    #[test]
    fn test_run_appends_validation_warnings() -> Result<()> {
        let generator = Arc::new(ScriptedGenerator::new(Some(
            r#"{"own_funds": {"cet1": 100, "at1": 20, "tier2": 15, "total": 140},
                "warnings": ["model note"]}"#,
        )));

        let output = pipeline(&generator).run("CET1 reporting")?;
        assert_eq!(output.warnings.len(), 2);
        assert_eq!(output.warnings[0], "model note");
        assert!(output.warnings[1].contains("Difference: 5.00"));
        Ok(())
    }

    #[test]
    fn test_unparseable_generation_is_fatal() {
        let generator = Arc::new(ScriptedGenerator::new(Some("I cannot help with that.")));
        let err = pipeline(&generator).run("anything").unwrap_err();
        assert!(matches!(err, CorepError::GenerationUnavailable(_)));
    }

    #[test]
    fn test_generator_failure_is_fatal() {
        let generator = Arc::new(ScriptedGenerator::new(None));
        let err = pipeline(&generator).run("anything").unwrap_err();
        assert!(matches!(err, CorepError::GenerationUnavailable(_)));
    }

    #[test]
    fn test_retrieval_is_idempotent() -> Result<()> {
        let p = pipeline(&Arc::new(ScriptedGenerator::new(None)));
        let ids = |r: RetrievalResult| r.into_iter().map(|h| h.passage.id).collect::<Vec<_>>();
        let first = ids(p.retrieve_passages("Additional Tier 1 instruments")?);
        let second = ids(p.retrieve_passages("Additional Tier 1 instruments")?);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn test_from_config_requires_gemini_key() {
        let err = CorepPipeline::from_config(&Config::default(), Corpus::own_funds())
            .err()
            .unwrap();
        assert!(matches!(err, CorepError::Config(_)));
    }
}
