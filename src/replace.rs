//! Replacement strategies: from a confirmed match to substitute text.

use crate::error::WeirError;
use crate::matcher::Found;

/// What the engine should do after applying a replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flow {
    #[default]
    Continue,
    /// Stop matching here; the rest of the stream passes through unmodified.
    Halt,
}

/// A computed replacement plus control flow.
#[derive(Debug, Clone)]
pub struct Replacement {
    pub text: String,
    pub flow: Flow,
}

impl Replacement {
    pub fn new(text: impl Into<String>) -> Self {
        Replacement {
            text: text.into(),
            flow: Flow::Continue,
        }
    }

    /// Replace this one match, then pass the remainder through.
    pub fn and_halt(text: impl Into<String>) -> Self {
        Replacement {
            text: text.into(),
            flow: Flow::Halt,
        }
    }
}

/// Produces replacement text for a confirmed match. Must be pure text
/// computation — the engine owns all window edits.
pub trait Replacer {
    fn replace(&mut self, haystack: &str, m: &Found) -> Replacement;
}

impl<F> Replacer for F
where
    F: FnMut(&str, &Found) -> Replacement,
{
    fn replace(&mut self, haystack: &str, m: &Found) -> Replacement {
        self(haystack, m)
    }
}

/// The canonical strategy: a textual template referencing capture groups
/// positionally — `$0` the whole match, `$1`.. the groups, `${10}` for
/// delimiting, `$$` a literal dollar. Parsed once at construction; group
/// references beyond the pattern's group count are rejected there. A group
/// that did not participate in a given match expands to empty text.
#[derive(Debug)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug)]
enum Segment {
    Literal(String),
    Group(usize),
}

impl Template {
    pub(crate) fn parse(template: &str, group_count: usize) -> Result<Self, WeirError> {
        let err = |reason: String| WeirError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = template;
        while let Some(dollar) = rest.find('$') {
            literal.push_str(&rest[..dollar]);
            rest = &rest[dollar + 1..];
            let mut chars = rest.chars();
            match chars.next() {
                Some('$') => {
                    literal.push('$');
                    rest = &rest[1..];
                }
                Some('{') => {
                    let Some(close) = rest.find('}') else {
                        return Err(err("unterminated ${".to_string()));
                    };
                    let index: usize = rest[1..close]
                        .parse()
                        .map_err(|_| err(format!("bad group reference ${{{}}}", &rest[1..close])))?;
                    flush(&mut segments, &mut literal);
                    segments.push(Segment::Group(index));
                    rest = &rest[close + 1..];
                }
                Some(c) if c.is_ascii_digit() => {
                    let digits = rest
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(rest.len());
                    let index: usize = rest[..digits]
                        .parse()
                        .map_err(|_| err(format!("bad group reference ${}", &rest[..digits])))?;
                    flush(&mut segments, &mut literal);
                    segments.push(Segment::Group(index));
                    rest = &rest[digits..];
                }
                // Trailing or non-reference dollar stays literal.
                _ => literal.push('$'),
            }
        }
        literal.push_str(rest);
        flush(&mut segments, &mut literal);

        for seg in &segments {
            if let Segment::Group(i) = seg {
                if *i >= group_count {
                    return Err(err(format!(
                        "group ${i} out of range (pattern has {} groups)",
                        group_count.saturating_sub(1)
                    )));
                }
            }
        }
        Ok(Template { segments })
    }
}

fn flush(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

impl Replacer for Template {
    fn replace(&mut self, haystack: &str, m: &Found) -> Replacement {
        let mut text = String::new();
        for seg in &self.segments {
            match seg {
                Segment::Literal(s) => text.push_str(s),
                Segment::Group(i) => {
                    if let Some(Some((a, b))) = m.groups.get(*i) {
                        text.push_str(&haystack[*a..*b]);
                    }
                }
            }
        }
        Replacement::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(groups: Vec<Option<(usize, usize)>>) -> Found {
        let (start, end) = groups[0].unwrap();
        Found { start, end, groups }
    }

    fn expand(template: &str, group_count: usize, haystack: &str, f: &Found) -> String {
        let mut t = Template::parse(template, group_count).unwrap();
        t.replace(haystack, f).text
    }

    #[test]
    fn plain_literal() {
        let f = found(vec![Some((0, 4))]);
        assert_eq!(expand("modify", 1, "edit", &f), "modify");
    }

    #[test]
    fn group_references() {
        // "key=42" with (\w+)=(\d+)
        let f = found(vec![Some((0, 6)), Some((0, 3)), Some((4, 6))]);
        assert_eq!(expand("$2:$1", 3, "key=42", &f), "42:key");
        assert_eq!(expand("[$0]", 3, "key=42", &f), "[key=42]");
    }

    #[test]
    fn braced_reference_delimits_digits() {
        let f = found(vec![Some((0, 2)), Some((0, 1))]);
        assert_eq!(expand("${1}5", 2, "ab", &f), "a5");
        // Without braces the digits run together into one reference.
        assert!(Template::parse("$15", 2).is_err());
    }

    #[test]
    fn dollar_escapes() {
        let f = found(vec![Some((0, 2))]);
        assert_eq!(expand("$$1", 1, "ab", &f), "$1");
        assert_eq!(expand("cost: $", 1, "ab", &f), "cost: $");
    }

    #[test]
    fn absent_group_expands_empty() {
        let f = found(vec![Some((0, 4)), None]);
        assert_eq!(expand("<$1>", 2, "key=", &f), "<>");
    }

    #[test]
    fn out_of_range_group_is_rejected() {
        let err = Template::parse("$3", 2).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn unterminated_brace_is_rejected() {
        assert!(Template::parse("${1", 2).is_err());
    }
}
