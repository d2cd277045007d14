//! Candidate probe generation.

use crate::core::{ReflexError, CANARY};
use crate::inject::target::ParsedTarget;

/// One concrete request URL with a single parameter carrying the canary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateProbe {
    /// The parameter that carries the canary.
    pub parameter: String,
    /// The URL to request.
    pub url: String,
}

/// Produces one [`CandidateProbe`] per query parameter.
#[derive(Debug, Clone)]
pub struct MarkerInjector {
    canary: String,
}

impl MarkerInjector {
    /// Creates an injector that uses the default [`CANARY`].
    pub fn new() -> Self {
        Self {
            canary: CANARY.to_string(),
        }
    }

    /// Uses a different canary.
    ///
    /// The value is written into the query verbatim, so it must be made
    /// of unreserved characters only.
    pub fn with_canary(mut self, canary: impl Into<String>) -> Self {
        self.canary = canary.into();
        self
    }

    /// Returns the canary.
    pub fn canary(&self) -> &str {
        &self.canary
    }

    /// Builds the probe for a single parameter.
    pub fn probe_for(&self, target: &ParsedTarget, parameter: &str) -> Option<CandidateProbe> {
        target
            .with_value(parameter, &self.canary)
            .map(|url| CandidateProbe {
                parameter: parameter.to_string(),
                url,
            })
    }

    /// Builds one probe per distinct parameter, in parameter order.
    ///
    /// A target without parameters yields no probes.
    pub fn candidates(&self, target: &ParsedTarget) -> Vec<CandidateProbe> {
        target
            .names()
            .filter_map(|name| self.probe_for(target, name))
            .collect()
    }

    /// Parses `raw` and builds its probes.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InvalidUrl`] when `raw` does not parse; the
    /// worker pool drops such jobs without reporting them.
    pub fn inject(&self, raw: &str) -> Result<(ParsedTarget, Vec<CandidateProbe>), ReflexError> {
        let target = ParsedTarget::parse(raw)?;
        let probes = self.candidates(&target);
        Ok((target, probes))
    }
}

impl Default for MarkerInjector {
    fn default() -> Self {
        Self::new()
    }
}
