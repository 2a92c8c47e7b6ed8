//! Keyword heuristics that map free-text finding messages to sub-types.
//!
//! Model output is noisy, so agents reclassify findings by looking for
//! domain keywords in the message. The tables are ordered: the first rule
//! whose keyword appears wins.

use super::finding::Finding;
use super::specialized::AnalysisType;

type Rule = (&'static [&'static str], &'static str);

const ARCHITECTURAL_RULES: &[Rule] = &[
    (&["circular", "cyclic dependency", "dependency cycle"], "circular-dependency"),
    (&["coupling", "tightly coupled"], "coupling-issue"),
    (&["cohesion"], "cohesion-issue"),
    (&["layer", "boundary"], "layering-violation"),
    (&["god object", "god class", "single responsibility", "responsibilit"], "responsibility-violation"),
    (&["abstraction", "interface"], "abstraction-issue"),
    (&["pattern", "anti-pattern"], "design-pattern-issue"),
];

const SECURITY_RULES: &[Rule] = &[
    (&["sql injection", "injection", "unsanitized query"], "injection-vulnerability"),
    (&["xss", "cross-site scripting"], "xss-vulnerability"),
    (&["csrf", "cross-site request"], "csrf-vulnerability"),
    (&["secret", "password", "api key", "credential", "hardcoded token"], "secret-exposure"),
    (&["authentication", "authorization", "auth "], "auth-issue"),
    (&["encrypt", "crypto", "hashing", "md5", "sha1"], "crypto-weakness"),
    (&["sanitiz", "input validation", "untrusted input"], "input-validation"),
];

const PERFORMANCE_RULES: &[Rule] = &[
    (&["n+1", "n + 1"], "n-plus-one-query"),
    (&["memory leak", "memory", "allocation"], "memory-issue"),
    (&["blocking", "synchronous", "sync io"], "blocking-operation"),
    (&["cache", "caching", "memoiz"], "caching-opportunity"),
    (&["query", "database", "index"], "database-performance"),
    (&["loop", "complexity", "o(n", "quadratic"], "algorithmic-complexity"),
];

const TESTING_RULES: &[Rule] = &[
    (&["no test", "missing test", "untested", "not tested"], "missing-tests"),
    (&["coverage"], "coverage-gap"),
    (&["edge case", "boundary condition"], "edge-case-missing"),
    (&["flaky", "nondeterministic", "non-deterministic"], "flaky-test"),
    (&["mock", "stub"], "mocking-issue"),
    (&["assert"], "assertion-weakness"),
    (&["integration"], "integration-gap"),
];

fn rules_for(analysis_type: AnalysisType) -> &'static [Rule] {
    match analysis_type {
        AnalysisType::Architectural => ARCHITECTURAL_RULES,
        AnalysisType::Security => SECURITY_RULES,
        AnalysisType::Performance => PERFORMANCE_RULES,
        AnalysisType::Testing => TESTING_RULES,
    }
}

/// Sub-types that count as domain-specific for an analysis type.
pub fn domain_finding_types(analysis_type: AnalysisType) -> impl Iterator<Item = &'static str> {
    rules_for(analysis_type).iter().map(|(_, t)| *t)
}

/// Whether `finding_type` is one of the domain sub-types for `analysis_type`.
pub fn is_domain_specific(analysis_type: AnalysisType, finding_type: &str) -> bool {
    domain_finding_types(analysis_type).any(|t| t == finding_type)
}

/// Classify a message into a domain sub-type, if any keyword matches.
pub fn classify_message(analysis_type: AnalysisType, message: &str) -> Option<&'static str> {
    let lower = message.to_lowercase();
    rules_for(analysis_type)
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(_, finding_type)| *finding_type)
}

/// Reclassify a finding into a domain sub-type.
///
/// Findings that already carry a domain-specific type keep it; others take
/// the classified type when a keyword matches.
pub fn classify_finding(analysis_type: AnalysisType, finding: Finding) -> Finding {
    if is_domain_specific(analysis_type, &finding.finding_type) {
        return finding;
    }
    match classify_message(analysis_type, &finding.message) {
        Some(finding_type) => finding.with_type(finding_type),
        None => finding,
    }
}
