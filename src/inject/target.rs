//! URL decomposition into a base and its query parameters.

use crate::core::ReflexError;

use url::{form_urlencoded, Url};

/// One `&`-separated piece of the raw query string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    /// The segment exactly as it appeared in the query.
    raw: String,
    /// Decoded parameter name, `None` for empty segments (`a=1&&b=2`).
    name: Option<String>,
}

impl Segment {
    fn parse(raw: &str) -> Self {
        let name = if raw.is_empty() {
            None
        } else {
            form_urlencoded::parse(raw.as_bytes())
                .next()
                .map(|(name, _)| name.into_owned())
        };

        Self {
            raw: raw.to_string(),
            name,
        }
    }

    /// The name part of the raw segment, still encoded.
    fn raw_name(&self) -> &str {
        self.raw
            .split_once('=')
            .map(|(name, _)| name)
            .unwrap_or(&self.raw)
    }

    fn decoded_value(&self) -> String {
        form_urlencoded::parse(self.raw.as_bytes())
            .next()
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }
}

/// A query parameter with every value it carried, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Decoded parameter name.
    pub name: String,
    /// Decoded values. A bare flag (`?debug`) has a single empty value.
    pub values: Vec<String>,
}

/// A URL split into its base and its query parameters.
///
/// Parameter names are unique and kept in first-appearance order. The raw
/// query segments are retained so that any parameter which is not being
/// rewritten is reproduced byte for byte.
#[derive(Debug, Clone)]
pub struct ParsedTarget {
    url: Url,
    segments: Vec<Segment>,
    params: Vec<Parameter>,
}

impl ParsedTarget {
    /// Parses a raw URL.
    ///
    /// # Errors
    ///
    /// Returns [`ReflexError::InvalidUrl`] if the input is not an absolute
    /// URI.
    pub fn parse(raw: &str) -> Result<Self, ReflexError> {
        let url = Url::parse(raw).map_err(|e| ReflexError::invalid_url(raw, e.to_string()))?;

        let segments: Vec<Segment> = match url.query() {
            Some(query) if !query.is_empty() => query.split('&').map(Segment::parse).collect(),
            _ => Vec::new(),
        };

        let mut params: Vec<Parameter> = Vec::new();
        for segment in &segments {
            let Some(name) = &segment.name else {
                continue;
            };
            let value = segment.decoded_value();
            match params.iter_mut().find(|p| &p.name == name) {
                Some(param) => param.values.push(value),
                None => params.push(Parameter {
                    name: name.clone(),
                    values: vec![value],
                }),
            }
        }

        Ok(Self {
            url,
            segments,
            params,
        })
    }

    /// Returns scheme, host and path without query or fragment.
    pub fn base(&self) -> String {
        let mut base = self.url.clone();
        base.set_query(None);
        base.set_fragment(None);
        base.to_string()
    }

    /// Returns the parameters in first-appearance order.
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Returns the parameter names in first-appearance order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Returns the values for `name`, if present.
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.values.as_slice())
    }

    /// Returns the number of distinct parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if the URL carries no query parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Materializes the URL with `name` set to the single value `value`.
    ///
    /// `value` is inserted verbatim; callers pass only query-safe text. The
    /// rewritten parameter keeps the position of its first occurrence and
    /// any later occurrences are dropped. Every other segment is copied
    /// unchanged. Returns `None` if `name` is not a parameter of this URL.
    pub fn with_value(&self, name: &str, value: &str) -> Option<String> {
        let first = self
            .segments
            .iter()
            .position(|s| s.name.as_deref() == Some(name))?;

        let query = self
            .segments
            .iter()
            .enumerate()
            .filter_map(|(i, segment)| {
                if segment.name.as_deref() != Some(name) {
                    Some(segment.raw.clone())
                } else if i == first {
                    Some(format!("{}={}", segment.raw_name(), value))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("&");

        let mut url = self.url.clone();
        url.set_query(Some(&query));
        Some(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_preserves_order_and_groups_repeats() {
        let target = ParsedTarget::parse("http://t/x?b=1&a=2&b=3").unwrap();
        assert_eq!(target.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(target.values("b").unwrap(), &["1".to_string(), "3".to_string()]);
        assert_eq!(target.len(), 2);
    }

    #[test]
    fn test_bare_flag_has_empty_value() {
        let target = ParsedTarget::parse("http://t/x?debug&q=1").unwrap();
        assert_eq!(target.values("debug").unwrap(), &[String::new()]);
    }

    #[test]
    fn test_no_query_is_empty() {
        let target = ParsedTarget::parse("http://t/x").unwrap();
        assert!(target.is_empty());

        let target = ParsedTarget::parse("http://t/x?").unwrap();
        assert!(target.is_empty());
    }

    #[test]
    fn test_malformed_url_is_rejected() {
        let err = ParsedTarget::parse("not a url").unwrap_err();
        assert!(matches!(err, ReflexError::InvalidUrl { .. }));

        assert!(ParsedTarget::parse("http://[::1/x?q=1").is_err());
    }

    #[test]
    fn test_base_strips_query_and_fragment() {
        let target = ParsedTarget::parse("https://t.example:8443/a/b?q=1#frag").unwrap();
        assert_eq!(target.base(), "https://t.example:8443/a/b");
    }

    #[test]
    fn test_with_value_keeps_other_segments_raw() {
        let target = ParsedTarget::parse("http://t/x?q=1&r=a%2Fb+c&s=%7E").unwrap();
        assert_eq!(
            target.with_value("q", "X").unwrap(),
            "http://t/x?q=X&r=a%2Fb+c&s=%7E"
        );
    }

    #[test]
    fn test_with_value_collapses_repeats() {
        let target = ParsedTarget::parse("http://t/x?a=1&b=2&a=3").unwrap();
        assert_eq!(target.with_value("a", "X").unwrap(), "http://t/x?a=X&b=2");
        assert_eq!(target.with_value("b", "X").unwrap(), "http://t/x?a=1&b=X&a=3");
    }

    #[test]
    fn test_with_value_keeps_fragment_and_empty_segments() {
        let target = ParsedTarget::parse("http://t/x?a=1&&b=2#top").unwrap();
        assert_eq!(target.len(), 2);
        assert_eq!(target.with_value("b", "X").unwrap(), "http://t/x?a=1&&b=X#top");
    }

    #[test]
    fn test_with_value_matches_decoded_name() {
        let target = ParsedTarget::parse("http://t/x?user%5Bname%5D=bob").unwrap();
        assert_eq!(target.names().collect::<Vec<_>>(), vec!["user[name]"]);
        assert_eq!(
            target.with_value("user[name]", "X").unwrap(),
            "http://t/x?user%5Bname%5D=X"
        );
    }

    #[test]
    fn test_with_value_unknown_name() {
        let target = ParsedTarget::parse("http://t/x?a=1").unwrap();
        assert!(target.with_value("zzz", "X").is_none());
    }
}
