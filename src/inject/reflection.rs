//! Literal canary reflection detection.

use crate::core::{Finding, Job, CANARY, PAYLOAD_PLACEHOLDER};
use crate::inject::injector::CandidateProbe;
use crate::inject::target::ParsedTarget;

/// Checks response bodies for the canary and builds redacted findings.
///
/// Detection is a plain byte-substring match. There is no awareness of
/// HTML context and no false-positive suppression.
#[derive(Debug, Clone)]
pub struct ReflectionDetector {
    canary: String,
    placeholder: String,
}

impl ReflectionDetector {
    /// Creates a detector for the default canary and placeholder.
    pub fn new() -> Self {
        Self {
            canary: CANARY.to_string(),
            placeholder: PAYLOAD_PLACEHOLDER.to_string(),
        }
    }

    /// Uses a different canary. Must match the injector's.
    pub fn with_canary(mut self, canary: impl Into<String>) -> Self {
        self.canary = canary.into();
        self
    }

    /// Returns `true` if `body` contains the canary.
    pub fn is_reflected(&self, body: &[u8]) -> bool {
        let needle = self.canary.as_bytes();
        if needle.is_empty() || body.len() < needle.len() {
            return false;
        }
        body.windows(needle.len()).any(|window| window == needle)
    }

    /// Inspects a successful probe response.
    ///
    /// Returns a finding whose URL is the target with the probed parameter
    /// set to the placeholder, or `None` if the canary is absent.
    pub fn inspect(
        &self,
        job: &Job,
        target: &ParsedTarget,
        probe: &CandidateProbe,
        body: &[u8],
    ) -> Option<Finding> {
        if !self.is_reflected(body) {
            return None;
        }

        let url = target.with_value(&probe.parameter, &self.placeholder)?;
        Some(Finding::new(url, probe.parameter.clone(), job.clone()))
    }

    /// Rebuilds the request URL a finding came from by putting this
    /// detector's canary back into the reported parameter.
    ///
    /// Other parameters are left as written, even if their value happens
    /// to be the placeholder text. Returns `None` if the finding's URL no
    /// longer parses or lacks the parameter.
    pub fn canary_url(&self, finding: &Finding) -> Option<String> {
        ParsedTarget::parse(&finding.url)
            .ok()?
            .with_value(&finding.parameter, &self.canary)
    }
}

impl Default for ReflectionDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inject::injector::MarkerInjector;

    fn probes_for(raw: &str) -> (Job, ParsedTarget, Vec<CandidateProbe>) {
        let (target, probes) = MarkerInjector::new().inject(raw).unwrap();
        (Job::from(raw), target, probes)
    }

    #[test]
    fn test_reflection_produces_placeholder_finding() {
        let (job, target, probes) = probes_for("http://t/x?q=1&r=2");
        let detector = ReflectionDetector::new();

        let body = b"<html>you searched for ReflectCheckXSS</html>";
        let finding = detector.inspect(&job, &target, &probes[0], body).unwrap();
        assert_eq!(finding.url, "http://t/x?q={payload}&r=2");
        assert_eq!(finding.parameter, "q");
        assert_eq!(finding.job, job);

        assert!(detector.inspect(&job, &target, &probes[1], b"nothing here").is_none());
    }

    #[test]
    fn test_finding_round_trips_to_canary_url() {
        let (job, target, probes) = probes_for("http://t/a?x=%20y&flag&z=3#frag");
        let detector = ReflectionDetector::new();

        for probe in &probes {
            let finding = detector
                .inspect(&job, &target, probe, b"..ReflectCheckXSS..")
                .unwrap();
            assert!(!finding.url.contains(CANARY));
            assert_eq!(
                detector.canary_url(&finding).as_deref(),
                Some(probe.url.as_str())
            );
        }
    }

    #[test]
    fn test_custom_canary_round_trips() {
        let raw = "http://t/x?q=1&r=2";
        let (target, probes) = MarkerInjector::new()
            .with_canary("zz9Plural")
            .inject(raw)
            .unwrap();
        let detector = ReflectionDetector::new().with_canary("zz9Plural");

        let finding = detector
            .inspect(&Job::from(raw), &target, &probes[1], b"..zz9Plural..")
            .unwrap();
        assert_eq!(finding.url, "http://t/x?q=1&r={payload}");
        assert_eq!(
            detector.canary_url(&finding).as_deref(),
            Some("http://t/x?q=1&r=zz9Plural")
        );
    }

    #[test]
    fn test_literal_placeholder_in_other_parameter_is_kept() {
        let finding = Finding::new(
            "http://t/x?a={payload}&b={payload}",
            "b",
            Job::from("http://t/x?a={payload}&b=1"),
        );
        let detector = ReflectionDetector::new();

        assert_eq!(
            detector.canary_url(&finding).as_deref(),
            Some("http://t/x?a={payload}&b=ReflectCheckXSS")
        );
    }

    #[test]
    fn test_partial_canary_is_not_a_reflection() {
        let detector = ReflectionDetector::new();
        assert!(!detector.is_reflected(b"ReflectCheck"));
        assert!(!detector.is_reflected(b""));
        assert!(detector.is_reflected(b"ReflectCheckXSS"));
    }

    #[test]
    fn test_encoded_canary_is_not_a_reflection() {
        let detector = ReflectionDetector::new().with_canary("<b>");
        assert!(!detector.is_reflected(b"&lt;b&gt;"));
        assert!(detector.is_reflected(b"x<b>y"));
    }
}
