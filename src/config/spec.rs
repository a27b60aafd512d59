//! Extractor specification types.
//!
//! An [`ExtractorSpec`] selects the tagging strategy, the title vocabulary,
//! normalization limits and the NER service location. It is the input to the
//! [`super::validation::ValidationEngine`] and, once valid, builds a ready
//! [`DynPipeline`].
//!
//! # JSON shape
//!
//! ```json
//! {
//!   "v": 1,
//!   "grammar": "external",
//!   "keyword_file": "keywords.json",
//!   "keyword_category": "academic_title",
//!   "limits": { "max_title_chars": 255, "max_last_name_words": 5 },
//!   "ner": { "host": "localhost", "port": 9199, "timeout_ms": 10000 },
//!   "strict": false
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::validation::{ValidationEngine, ValidationReport};
use crate::chunk::grammar::{Grammar, GrammarKind};
use crate::error::{Error, Result};
use crate::extract::{NameNormalizer, TitleNormalizer};
use crate::keywords::{TitleKeywordSet, DEFAULT_KEYWORD_CATEGORY};
use crate::nlp::ner::{StanfordNerClient, DEFAULT_NER_PORT};
use crate::pipeline::runner::{DynPipeline, Pipeline};
use crate::pipeline::traits::{ExternalTagging, LocalTagging, SentenceTagger};

/// Current spec version
pub const SPEC_VERSION: u32 = 1;

pub const DEFAULT_NER_HOST: &str = "localhost";
pub const DEFAULT_NER_TIMEOUT_MS: u64 = 10_000;

/// Top-level extractor specification (v1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorSpec {
    /// Spec version (currently `1`).
    pub v: u32,

    /// Tagging strategy; also picks the built-in grammar.
    #[serde(default)]
    pub grammar: GrammarKind,

    /// Optional grammar text file replacing the built-in grammar.
    #[serde(default)]
    pub grammar_file: Option<PathBuf>,

    /// Inline title keywords. Takes precedence over `keyword_file`.
    #[serde(default)]
    pub keywords: Option<Vec<String>>,

    /// Keyword file (`.json` grouped by category, or one keyword per line).
    #[serde(default)]
    pub keyword_file: Option<PathBuf>,

    /// Category read from a JSON keyword file.
    #[serde(default)]
    pub keyword_category: Option<String>,

    #[serde(default)]
    pub limits: LimitsSpec,

    #[serde(default)]
    pub ner: NerSpec,

    /// If `true`, unrecognized fields are errors; if `false`, warnings.
    #[serde(default)]
    pub strict: bool,

    /// Captures any fields not recognized by the schema.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Output field limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsSpec {
    #[serde(default)]
    pub max_title_chars: Option<usize>,

    #[serde(default)]
    pub max_last_name_words: Option<usize>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

/// Location of the Stanford NER server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NerSpec {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub timeout_ms: Option<u64>,

    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_json::Value>,
}

impl NerSpec {
    /// Whether any setting was given
    pub fn is_set(&self) -> bool {
        self.host.is_some() || self.port.is_some() || self.timeout_ms.is_some()
    }
}

impl Default for ExtractorSpec {
    fn default() -> Self {
        Self {
            v: SPEC_VERSION,
            grammar: GrammarKind::default(),
            grammar_file: None,
            keywords: None,
            keyword_file: None,
            keyword_category: None,
            limits: LimitsSpec::default(),
            ner: NerSpec::default(),
            strict: false,
            unknown_fields: HashMap::new(),
        }
    }
}

impl ExtractorSpec {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a spec file. Relative `keyword_file` and `grammar_file` paths are
    /// resolved against the spec file's directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut spec = Self::from_json_str(&std::fs::read_to_string(path)?)?;
        if let Some(dir) = path.parent() {
            for file in [&mut spec.keyword_file, &mut spec.grammar_file].into_iter().flatten() {
                if file.is_relative() {
                    *file = dir.join(&*file);
                }
            }
        }
        Ok(spec)
    }

    /// Run the default validation rules
    pub fn validate(&self) -> ValidationReport {
        ValidationEngine::with_defaults().validate(self)
    }

    /// Validate, logging warnings; any error rejects the spec.
    pub fn ensure_valid(&self) -> Result<()> {
        let report = self.validate();
        for warning in report.warnings() {
            tracing::warn!(code = %warning.code, path = %warning.path, "{}", warning.message);
        }
        if report.has_errors() {
            let messages: Vec<String> = report.errors().map(ToString::to_string).collect();
            return Err(Error::config(messages.join("; ")));
        }
        Ok(())
    }

    /// Inline keywords, then the keyword file, then the built-in academic list.
    pub fn keyword_set(&self) -> Result<TitleKeywordSet> {
        if let Some(words) = &self.keywords {
            return TitleKeywordSet::new(words);
        }
        match &self.keyword_file {
            Some(path) => TitleKeywordSet::from_path(
                path,
                self.keyword_category
                    .as_deref()
                    .unwrap_or(DEFAULT_KEYWORD_CATEGORY),
            ),
            None => TitleKeywordSet::academic(),
        }
    }

    /// Custom grammar from `grammar_file`, if set
    pub fn custom_grammar(&self) -> Result<Option<Grammar>> {
        let Some(path) = &self.grammar_file else {
            return Ok(None);
        };
        let source = std::fs::read_to_string(path)?;
        Grammar::parse(&source).map(Some)
    }

    pub fn ner_client(&self) -> StanfordNerClient {
        StanfordNerClient::new(
            self.ner.host.as_deref().unwrap_or(DEFAULT_NER_HOST),
            self.ner.port.unwrap_or(DEFAULT_NER_PORT),
        )
        .with_timeout(Duration::from_millis(
            self.ner.timeout_ms.unwrap_or(DEFAULT_NER_TIMEOUT_MS),
        ))
    }

    pub fn name_normalizer(&self) -> NameNormalizer {
        match self.limits.max_last_name_words {
            Some(max) => NameNormalizer::new().with_max_last_name_words(max),
            None => NameNormalizer::new(),
        }
    }

    pub fn title_normalizer(&self) -> TitleNormalizer {
        match self.limits.max_title_chars {
            Some(max) => TitleNormalizer::new().with_max_chars(max),
            None => TitleNormalizer::new(),
        }
    }

    /// Validate and assemble a pipeline for this spec.
    pub fn build_pipeline(&self) -> Result<DynPipeline> {
        self.ensure_valid()?;

        let tagger: Box<dyn SentenceTagger> = match self.grammar {
            GrammarKind::External => Box::new(ExternalTagging::new(self.ner_client())),
            GrammarKind::Local => Box::new(LocalTagging::new()),
        };
        let mut pipeline = Pipeline::new(tagger, self.keyword_set()?)
            .with_name_normalizer(self.name_normalizer())
            .with_title_normalizer(self.title_normalizer());
        if let Some(grammar) = self.custom_grammar()? {
            pipeline = pipeline.with_grammar(grammar);
        }

        tracing::info!(
            grammar = self.grammar.as_str(),
            keywords = pipeline.keywords.len(),
            "pipeline ready"
        );
        Ok(pipeline)
    }
}
