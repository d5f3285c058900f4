//! URI templates for resource addressing.
//!
//! A template such as `user://{user_id}/profile` is parsed once into
//! alternating literal and parameter segments. Matching is anchored and
//! case-sensitive; each `{name}` captures one or more characters other than
//! `/`, and every other character (including `.`, `+`, `?`) is literal text.
//!
//! When a template is ambiguous (`{a}.{b}` against `x.y.z`) the earlier
//! parameter takes the longest capture that still lets the rest match, so
//! `a = "x.y"` and `b = "z"`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::{DefinitionError, DispatchError};

/// Parameters extracted from a concrete URI, keyed by placeholder name.
pub type UriParams = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed URI template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns [`DefinitionError::InvalidUriTemplate`] for an unclosed or
    /// nested `{`, an empty or non-identifier parameter name, or a parameter
    /// name used twice.
    pub fn parse(template: &str) -> Result<Self, DefinitionError> {
        let invalid = |reason: String| DefinitionError::InvalidUriTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(ch) = chars.next() {
            if ch != '{' {
                literal.push(ch);
                continue;
            }

            let mut name = String::new();
            let mut closed = false;
            for next in chars.by_ref() {
                match next {
                    '}' => {
                        closed = true;
                        break;
                    }
                    '{' => return Err(invalid("nested '{'".to_string())),
                    _ => name.push(next),
                }
            }

            if !closed {
                return Err(invalid("unclosed '{'".to_string()));
            }
            if name.is_empty() {
                return Err(invalid("empty parameter name".to_string()));
            }
            if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(invalid(format!("invalid parameter name '{name}'")));
            }
            if segments
                .iter()
                .any(|s| matches!(s, Segment::Param(existing) if *existing == name))
            {
                return Err(invalid(format!("duplicate parameter '{name}'")));
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Param(name));
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// The template text as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Returns `true` if the template has no parameters.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        self.segments
            .iter()
            .all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Matches a concrete URI and extracts the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UriNotMatched`] if the whole URI does not
    /// match the template.
    pub fn match_uri(&self, uri: &str) -> Result<UriParams, DispatchError> {
        let mut params = UriParams::new();
        if Matcher::new(&self.segments, uri).run(&mut params) {
            Ok(params)
        } else {
            Err(DispatchError::UriNotMatched {
                uri: uri.to_string(),
            })
        }
    }

    /// Returns `true` if `uri` matches the template.
    #[must_use]
    pub fn matches(&self, uri: &str) -> bool {
        Matcher::new(&self.segments, uri).run(&mut UriParams::new())
    }
}

impl fmt::Display for UriTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// Backtracking matcher over `(segment, byte offset)` states.
///
/// A state that failed once fails again, so failures are remembered and each
/// state is explored at most once. Parameters are inserted only along the
/// successful path.
struct Matcher<'a> {
    segments: &'a [Segment],
    uri: &'a str,
    failed: HashSet<(usize, usize)>,
}

impl<'a> Matcher<'a> {
    fn new(segments: &'a [Segment], uri: &'a str) -> Self {
        Self {
            segments,
            uri,
            failed: HashSet::new(),
        }
    }

    fn run(&mut self, params: &mut UriParams) -> bool {
        self.match_at(0, 0, params)
    }

    fn match_at(&mut self, index: usize, offset: usize, params: &mut UriParams) -> bool {
        if self.failed.contains(&(index, offset)) {
            return false;
        }

        let (segments, uri) = (self.segments, self.uri);
        let matched = match segments.get(index) {
            None => offset == uri.len(),
            Some(Segment::Literal(literal)) => {
                uri[offset..].starts_with(literal.as_str())
                    && self.match_at(index + 1, offset + literal.len(), params)
            }
            Some(Segment::Param(name)) => self.match_param(index, name, offset, params),
        };

        if !matched {
            self.failed.insert((index, offset));
        }
        matched
    }

    fn match_param(
        &mut self,
        index: usize,
        name: &str,
        offset: usize,
        params: &mut UriParams,
    ) -> bool {
        let (segments, uri) = (self.segments, self.uri);
        let input = &uri[offset..];
        let span = input.find('/').unwrap_or(input.len());
        let next_literal = match segments.get(index + 1) {
            Some(Segment::Literal(literal)) => Some(literal.as_str()),
            _ => None,
        };

        let ends: Vec<usize> = input[..span]
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();

        for end in ends.into_iter().rev() {
            if next_literal.is_some_and(|literal| !input[end..].starts_with(literal)) {
                continue;
            }
            if self.match_at(index + 1, offset + end, params) {
                params.insert(name.to_string(), input[..end].to_string());
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> UriParams {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn extracts_single_parameter() {
        let template = UriTemplate::parse("user://{user_id}/profile").unwrap();
        assert_eq!(
            template.match_uri("user://42/profile").unwrap(),
            params(&[("user_id", "42")])
        );
    }

    #[test]
    fn rejects_other_schemes() {
        let template = UriTemplate::parse("user://{user_id}/profile").unwrap();
        let err = template.match_uri("order://99").unwrap_err();
        assert_eq!(err.kind(), "uri_not_matched");
    }

    #[test]
    fn matching_is_anchored() {
        let template = UriTemplate::parse("user://{id}").unwrap();
        assert!(!template.matches("xuser://1"));
        assert!(!template.matches("user://1/extra"));
        assert!(template.matches("user://1"));
    }

    #[test]
    fn parameters_do_not_cross_slashes() {
        let template = UriTemplate::parse("files://{path}").unwrap();
        assert!(!template.matches("files://a/b"));
    }

    #[test]
    fn parameters_need_at_least_one_character() {
        let template = UriTemplate::parse("user://{id}/profile").unwrap();
        assert!(!template.matches("user:///profile"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let template = UriTemplate::parse("User://{id}").unwrap();
        assert!(!template.matches("user://1"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let template = UriTemplate::parse("data://{name}.json?v+1").unwrap();
        assert_eq!(
            template.match_uri("data://report.json?v+1").unwrap(),
            params(&[("name", "report")])
        );
        assert!(!template.matches("data://reportXjson?v+1"));
        assert!(!template.matches("data://report.jsonv1"));
    }

    #[test]
    fn ambiguous_templates_prefer_longest_first_capture() {
        let template = UriTemplate::parse("file://{stem}.{ext}").unwrap();
        assert_eq!(
            template.match_uri("file://archive.tar.gz").unwrap(),
            params(&[("stem", "archive.tar"), ("ext", "gz")])
        );
    }

    #[test]
    fn adjacent_parameters_backtrack() {
        let template = UriTemplate::parse("x://{a}{b}").unwrap();
        assert_eq!(
            template.match_uri("x://abc").unwrap(),
            params(&[("a", "ab"), ("b", "c")])
        );
        assert!(!template.matches("x://a"));
    }

    #[test]
    fn multiple_parameters() {
        let template = UriTemplate::parse("repo://{owner}/{repo}/issues/{number}").unwrap();
        assert_eq!(
            template.match_uri("repo://rust-lang/rust/issues/1").unwrap(),
            params(&[("owner", "rust-lang"), ("repo", "rust"), ("number", "1")])
        );
        assert_eq!(
            template.param_names().collect::<Vec<_>>(),
            vec!["owner", "repo", "number"]
        );
    }

    #[test]
    fn literal_templates_match_themselves() {
        let template = UriTemplate::parse("config://app").unwrap();
        assert!(template.is_literal());
        assert!(template.match_uri("config://app").unwrap().is_empty());
    }

    #[test]
    fn matching_is_deterministic() {
        let template = UriTemplate::parse("a://{x}-{y}").unwrap();
        let first = template.match_uri("a://1-2-3").unwrap();
        let second = template.match_uri("a://1-2-3").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, params(&[("x", "1-2"), ("y", "3")]));
    }

    #[test]
    fn failed_states_are_not_revisited() {
        let template = UriTemplate::parse("v://{a}-{b}-{c}-{d}-{e}!").unwrap();
        let uri = format!("v://{}1", "1-".repeat(60));
        assert!(!template.matches(&uri));

        let uri = format!("v://{}1!", "1-".repeat(60));
        let matched = template.match_uri(&uri).unwrap();
        assert_eq!(matched["e"], "1");
        assert_eq!(matched["a"].len(), "1-".repeat(56).len() + 1);
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(UriTemplate::parse("a://{id").is_err());
        assert!(UriTemplate::parse("a://{}").is_err());
        assert!(UriTemplate::parse("a://{x{y}}").is_err());
        assert!(UriTemplate::parse("a://{x}/{x}").is_err());
        assert!(UriTemplate::parse("a://{x-y}").is_err());
    }
}
