//! Validation engine for extractor specifications.
//!
//! The engine runs all registered [`ValidationRule`]s against an
//! [`ExtractorSpec`] and collects every diagnostic into a
//! [`ValidationReport`]. It never short-circuits on the first error, so users
//! see all problems at once.

use std::collections::HashMap;

use serde::Serialize;

use super::error_code::{ErrorCode, SpecError};
use super::spec::{ExtractorSpec, SPEC_VERSION};
use crate::chunk::grammar::GrammarKind;
use crate::types::MAX_TITLE_CHARS;

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding with its severity.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: SpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: SpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: SpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn errors(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// No errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects an [`ExtractorSpec`] and returns
/// zero or more diagnostics.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"limits"`).
    fn name(&self) -> &str;

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s and collects all diagnostics.
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(VersionRule));
        engine.add_rule(Box::new(KeywordSourceRule));
        engine.add_rule(Box::new(LimitsRule));
        engine.add_rule(Box::new(NerRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run all rules against `spec` and return the collected report.
    pub fn validate(&self, spec: &ExtractorSpec) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(spec));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. Known spec version ──────────────────────────────────────────────────

struct VersionRule;

impl ValidationRule for VersionRule {
    fn name(&self) -> &str {
        "version"
    }

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic> {
        if spec.v == SPEC_VERSION {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            SpecError::new(
                ErrorCode::UnsupportedVersion,
                "/v",
                format!("spec version {} is not supported", spec.v),
            )
            .with_hint(format!("Set \"v\": {SPEC_VERSION}")),
        )]
    }
}

// ─── 2. Keyword source must yield keywords ──────────────────────────────────

struct KeywordSourceRule;

impl ValidationRule for KeywordSourceRule {
    fn name(&self) -> &str {
        "keyword_source"
    }

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        if let Some(words) = &spec.keywords {
            if words.iter().all(|w| w.trim().is_empty()) {
                out.push(ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::EmptyKeywords,
                        "/keywords",
                        "keywords must contain at least one non-blank entry",
                    )
                    .with_hint("Remove \"keywords\" to use the built-in academic titles"),
                ));
            }
            if spec.keyword_file.is_some() {
                out.push(ValidationDiagnostic::warning(
                    SpecError::new(
                        ErrorCode::InvalidCombo,
                        "/keyword_file",
                        "keyword_file is ignored because keywords is set",
                    )
                    .with_hint("Keep only one keyword source"),
                ));
            }
        }

        let category_unused = spec.keyword_file.is_none() || spec.keywords.is_some();
        if spec.keyword_category.is_some() && category_unused {
            out.push(ValidationDiagnostic::warning(
                SpecError::new(
                    ErrorCode::UnusedSetting,
                    "/keyword_category",
                    "keyword_category only applies to a keyword_file",
                ),
            ));
        }

        out
    }
}

// ─── 3. Limits must be positive and fit the output columns ──────────────────

struct LimitsRule;

impl ValidationRule for LimitsRule {
    fn name(&self) -> &str {
        "limits"
    }

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        let checks: &[(&str, Option<usize>)] = &[
            ("max_title_chars", spec.limits.max_title_chars),
            ("max_last_name_words", spec.limits.max_last_name_words),
        ];
        for &(field, value) in checks {
            if value == Some(0) {
                out.push(ValidationDiagnostic::error(
                    SpecError::new(
                        ErrorCode::InvalidValue,
                        format!("/limits/{field}"),
                        format!("{field} must be greater than 0"),
                    )
                    .with_hint(format!("Remove {field} to use the default")),
                ));
            }
        }

        if let Some(max) = spec.limits.max_title_chars.filter(|&m| m > MAX_TITLE_CHARS) {
            out.push(ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::LimitExceeded,
                    "/limits/max_title_chars",
                    format!(
                        "max_title_chars {max} exceeds the {MAX_TITLE_CHARS}-character title column"
                    ),
                )
                .with_hint(format!("Use a value between 1 and {MAX_TITLE_CHARS}")),
            ));
        }

        out
    }
}

// ─── 4. NER settings ────────────────────────────────────────────────────────

struct NerRule;

impl ValidationRule for NerRule {
    fn name(&self) -> &str {
        "ner"
    }

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();

        if spec.ner.host.as_deref().is_some_and(|h| h.trim().is_empty()) {
            out.push(ValidationDiagnostic::error(SpecError::new(
                ErrorCode::InvalidValue,
                "/ner/host",
                "host must not be empty",
            )));
        }
        if spec.ner.port == Some(0) {
            out.push(ValidationDiagnostic::error(SpecError::new(
                ErrorCode::InvalidValue,
                "/ner/port",
                "port must be non-zero",
            )));
        }
        if spec.ner.timeout_ms == Some(0) {
            out.push(ValidationDiagnostic::error(
                SpecError::new(
                    ErrorCode::InvalidValue,
                    "/ner/timeout_ms",
                    "timeout_ms must be non-zero",
                )
                .with_hint("Remove timeout_ms to use the default"),
            ));
        }

        if spec.grammar == GrammarKind::Local && spec.ner.is_set() {
            out.push(ValidationDiagnostic::warning(
                SpecError::new(
                    ErrorCode::UnusedSetting,
                    "/ner",
                    "ner settings are ignored by the local grammar",
                )
                .with_hint("Set \"grammar\": \"external\" to use the NER service"),
            ));
        }

        out
    }
}

// ─── 5. Unknown fields (strict → error, non-strict → warning) ──────────────

struct UnknownFieldsRule;

impl UnknownFieldsRule {
    /// Diagnostics for extra fields captured by `#[serde(flatten)]` at `path`.
    fn check_unknowns(
        path: &str,
        unknowns: &HashMap<String, serde_json::Value>,
        strict: bool,
    ) -> Vec<ValidationDiagnostic> {
        let mut keys: Vec<&String> = unknowns.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(|key| {
                let diag_fn = if strict {
                    ValidationDiagnostic::error
                } else {
                    ValidationDiagnostic::warning
                };
                diag_fn(
                    SpecError::new(
                        ErrorCode::UnknownField,
                        format!("{path}/{key}"),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(&self, spec: &ExtractorSpec) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();
        out.extend(Self::check_unknowns("", &spec.unknown_fields, spec.strict));
        out.extend(Self::check_unknowns(
            "/limits",
            &spec.limits.unknown_fields,
            spec.strict,
        ));
        out.extend(Self::check_unknowns("/ner", &spec.ner.unknown_fields, spec.strict));
        out
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
