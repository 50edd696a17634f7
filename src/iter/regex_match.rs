//! Lazy regex matches over a string
//!
//! Each element is the whole match as a string, or, when the pattern has
//! capture groups, an array of the groups (null for a group that did not
//! participate). A non-global regex yields at most one match.
//!
//! The compiled matcher is held only while more matches are possible: it is
//! dropped at exhaustion, right after the single match of a non-global
//! regex, and on close.

use super::protocol::{Cursor, JsonIter};
use crate::error::Result;
use crate::value::{JsonRegex, Value};

pub struct RegexMatchIter {
    regex: Option<JsonRegex>,
    text: String,
    position: usize,
    global: bool,
    cursor: Cursor,
}

impl RegexMatchIter {
    /// Matches as the regex flags dictate (`g` for all matches)
    pub fn new(regex: JsonRegex, text: impl Into<String>) -> Self {
        let global = regex.is_global();
        Self::build(regex, text.into(), global)
    }

    /// Every match, whatever the flags say
    pub fn all(regex: JsonRegex, text: impl Into<String>) -> Self {
        Self::build(regex, text.into(), true)
    }

    fn build(regex: JsonRegex, text: String, global: bool) -> Self {
        Self {
            regex: Some(regex),
            text,
            position: 0,
            global,
            cursor: Cursor::new(),
        }
    }

    /// Whether the matcher is still held
    pub fn holds_matcher(&self) -> bool {
        self.regex.is_some()
    }

    fn next_match(&mut self) -> Option<Value> {
        let regex = self.regex.as_ref()?;
        if self.position > self.text.len() {
            self.regex = None;
            return None;
        }
        let matcher = regex.matcher();
        let Some(caps) = matcher.captures_at(&self.text, self.position) else {
            self.regex = None;
            return None;
        };
        let whole = caps.get(0)?;
        let value = if caps.len() > 1 {
            Value::Array(
                (1..caps.len())
                    .map(|i| match caps.get(i) {
                        Some(g) => Value::string(g.as_str()),
                        None => Value::Null,
                    })
                    .collect(),
            )
        } else {
            Value::string(whole.as_str())
        };
        self.position = if whole.end() > whole.start() {
            whole.end()
        } else {
            // step over one character after an empty match
            self.text[whole.end()..]
                .chars()
                .next()
                .map_or(self.text.len() + 1, |c| whole.end() + c.len_utf8())
        };
        if !self.global {
            self.regex = None;
        }
        Some(value)
    }
}

impl JsonIter for RegexMatchIter {
    fn move_next(&mut self) -> Result<bool> {
        let next = self.next_match();
        self.cursor.advance(|| Ok(next))
    }

    fn current(&self) -> &Value {
        self.cursor.current()
    }

    fn close(&mut self) -> Result<()> {
        self.regex = None;
        self.cursor.finish();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iter::collect_values;

    #[test]
    fn test_global_matches_then_release() {
        let re = JsonRegex::new("[0-9]+", "g").unwrap();
        let mut it = RegexMatchIter::new(re, "a1 b22 c333");
        assert!(it.move_next().unwrap());
        assert_eq!(it.current(), &Value::string("1"));
        assert!(it.holds_matcher());
        assert!(it.move_next().unwrap());
        assert!(it.move_next().unwrap());
        assert_eq!(it.current(), &Value::string("333"));
        assert!(!it.move_next().unwrap());
        assert!(!it.holds_matcher());
    }

    #[test]
    fn test_single_match_releases_immediately() {
        let re = JsonRegex::new("b+", "").unwrap();
        let mut it = RegexMatchIter::new(re, "abbcbb");
        assert!(it.move_next().unwrap());
        assert_eq!(it.current(), &Value::string("bb"));
        assert!(!it.holds_matcher());
        assert!(!it.move_next().unwrap());
    }

    #[test]
    fn test_groups_become_arrays() {
        let re = JsonRegex::new("(\\w)=(\\d)?", "").unwrap();
        let out = collect_values(&mut RegexMatchIter::all(re, "a=1 b=")).unwrap();
        assert_eq!(
            out,
            vec![
                Value::Array(vec![Value::string("a"), Value::string("1")]),
                Value::Array(vec![Value::string("b"), Value::Null]),
            ]
        );
    }

    #[test]
    fn test_empty_matches_advance() {
        let re = JsonRegex::new("x*", "g").unwrap();
        let out = collect_values(&mut RegexMatchIter::new(re, "ab")).unwrap();
        assert_eq!(out.len(), 3);
    }
}
