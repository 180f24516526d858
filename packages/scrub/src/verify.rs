//! Smoke test runner for a built gazetteer.
//!
//! Loads queries from the embedded `smoke_tests.toml` file, scrubs each
//! one and checks the matched city's country, name and score.
//!
//! All tests must pass against a full `GeoNames` build. If a place is
//! missing from the current data, update or remove its entry.

use serde::Deserialize;

use crate::{Resolver, ScrubError};

/// Embedded smoke test configuration (compiled into the binary).
const SMOKE_TESTS_TOML: &str = include_str!("../smoke_tests.toml");

/// Parsed smoke test configuration.
#[derive(Debug, Deserialize)]
struct SmokeTestConfig {
    /// Minimum score for tests that don't set their own.
    default_min_score: f64,
    /// Individual test cases.
    tests: Vec<SmokeTestEntry>,
}

/// A single smoke test entry from the TOML file.
#[derive(Debug, Deserialize)]
struct SmokeTestEntry {
    city: String,
    state: Option<String>,
    country: Option<String>,
    /// ISO code the match must be in.
    expected_country: String,
    /// Canonical name the match must have.
    expected_name: Option<String>,
    /// Per-test minimum score override.
    min_score: Option<f64>,
}

impl SmokeTestEntry {
    fn label(&self) -> String {
        [
            Some(self.city.as_str()),
            self.state.as_deref(),
            self.country.as_deref(),
        ]
        .into_iter()
        .map(|part| part.unwrap_or("-"))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Result of a single smoke test.
#[derive(Debug)]
pub struct SmokeTestResult {
    /// The query, as `city, state, country`.
    pub query: String,
    /// Expected country code.
    pub expected_country: String,
    /// Matched entity id (if found).
    pub matched_id: Option<u64>,
    /// Matched entity name and country (if found).
    pub matched: Option<String>,
    /// Score (if found).
    pub score: Option<f64>,
    /// Minimum score used for this test.
    pub min_score: f64,
    /// Whether the test passed.
    pub passed: bool,
    /// Reason for failure (if any).
    pub failure_reason: Option<String>,
}

/// Aggregate report from running all smoke tests.
#[derive(Debug)]
pub struct SmokeTestReport {
    /// Individual test results.
    pub results: Vec<SmokeTestResult>,
    /// Number of tests that passed.
    pub passed: usize,
    /// Total number of tests.
    pub total: usize,
}

impl SmokeTestReport {
    /// Returns `true` if all tests passed.
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Runs all smoke tests with the given resolver.
///
/// # Errors
///
/// Returns an error if the TOML configuration cannot be parsed.
pub fn run_smoke_tests(resolver: &Resolver) -> Result<SmokeTestReport, ScrubError> {
    let config: SmokeTestConfig = toml::from_str(SMOKE_TESTS_TOML).map_err(|e| {
        ScrubError::InvalidArgument(format!("Failed to parse smoke_tests.toml: {e}"))
    })?;

    let results: Vec<SmokeTestResult> = config
        .tests
        .iter()
        .map(|entry| {
            run_single_test(
                resolver,
                entry,
                entry.min_score.unwrap_or(config.default_min_score),
            )
        })
        .collect();

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    Ok(SmokeTestReport {
        results,
        passed,
        total,
    })
}

fn run_single_test(resolver: &Resolver, entry: &SmokeTestEntry, min_score: f64) -> SmokeTestResult {
    let resolution = resolver.scrub_sync(
        Some(&entry.city),
        entry.state.as_deref(),
        entry.country.as_deref(),
    );

    let Some(result) = resolution.into_matched() else {
        return SmokeTestResult {
            query: entry.label(),
            expected_country: entry.expected_country.clone(),
            matched_id: None,
            matched: None,
            score: None,
            min_score,
            passed: false,
            failure_reason: Some("no match found".to_string()),
        };
    };

    let mut failures = Vec::new();
    if result.entity.country_code != entry.expected_country {
        failures.push(format!(
            "country {} != {}",
            result.entity.country_code, entry.expected_country
        ));
    }
    if let Some(name) = &entry.expected_name
        && result.entity.name != *name
    {
        failures.push(format!("name {:?} != {name:?}", result.entity.name));
    }
    if result.score < min_score {
        failures.push(format!("score {} < {min_score}", result.score));
    }

    SmokeTestResult {
        query: entry.label(),
        expected_country: entry.expected_country.clone(),
        matched_id: Some(result.entity.id),
        matched: Some(format!(
            "{}, {}",
            result.entity.name, result.entity.country_code
        )),
        score: Some(result.score),
        min_score,
        passed: failures.is_empty(),
        failure_reason: (!failures.is_empty()).then(|| failures.join("; ")),
    }
}
