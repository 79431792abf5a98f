// ── Response value mappers ──
//
// Ordered transformations applied to a raw response body before integer
// parsing. A mapper that cannot match its input passes it through
// unchanged rather than failing; the only fatal condition is malformed
// markup handed to the xpath mapper, since document parsing must precede
// any query. The closed enum keeps the dispatch exhaustive -- adding a
// mapper kind is a compile-checked exercise.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// Which regex capture group to extract: by number or by name.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CaptureGroup {
    Index(usize),
    Name(String),
}

impl Default for CaptureGroup {
    fn default() -> Self {
        Self::Index(1)
    }
}

/// Declarative mapper configuration, tagged by the `type` key.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MapperSpec {
    /// Dictionary lookup; a miss returns the input unchanged.
    Static { mapping: HashMap<String, String> },
    /// First match of `pattern`, extracting the configured capture group.
    Regex {
        pattern: String,
        #[serde(default)]
        capture: CaptureGroup,
    },
    /// Element-path query over a markup document, selecting the text of
    /// the match at `index`.
    Xpath {
        expression: String,
        #[serde(default)]
        index: usize,
    },
}

/// A compiled mapper ready to transform values.
#[derive(Debug)]
pub enum Mapper {
    Static {
        mapping: HashMap<String, String>,
    },
    Regex {
        regex: Regex,
        capture: CaptureGroup,
    },
    Xpath {
        expression: String,
        index: usize,
    },
}

impl Mapper {
    /// Compile a spec. Invalid regex patterns are a configuration error
    /// caught here, at startup, never at mapping time.
    pub fn build(spec: &MapperSpec) -> Result<Self, CoreError> {
        match spec {
            MapperSpec::Static { mapping } => Ok(Self::Static {
                mapping: mapping.clone(),
            }),
            MapperSpec::Regex { pattern, capture } => {
                let regex = Regex::new(pattern).map_err(|e| CoreError::Config {
                    message: format!("invalid regex mapper pattern {pattern:?}: {e}"),
                })?;
                Ok(Self::Regex {
                    regex,
                    capture: capture.clone(),
                })
            }
            MapperSpec::Xpath { expression, index } => Ok(Self::Xpath {
                expression: expression.clone(),
                index: *index,
            }),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::Regex { .. } => "regex",
            Self::Xpath { .. } => "xpath",
        }
    }

    /// Transform one value. Unmatched input is returned unchanged; only
    /// the xpath variant can fail, and only on malformed markup.
    pub fn map(&self, input: &str) -> Result<String, CoreError> {
        match self {
            Self::Static { mapping } => Ok(mapping
                .get(input)
                .cloned()
                .unwrap_or_else(|| input.to_owned())),
            Self::Regex { regex, capture } => {
                let extracted = regex.captures(input).and_then(|caps| {
                    let group = match capture {
                        CaptureGroup::Index(i) => caps.get(*i),
                        CaptureGroup::Name(name) => caps.name(name),
                    };
                    group.map(|m| m.as_str().to_owned())
                });
                Ok(extracted.unwrap_or_else(|| input.to_owned()))
            }
            Self::Xpath { expression, index } => {
                let found =
                    evaluate_path(input, expression, *index).map_err(|e| CoreError::Mapper {
                        message: format!("xpath mapper failed to parse document: {e}"),
                    })?;
                Ok(found.unwrap_or_else(|| input.to_owned()))
            }
        }
    }
}

/// Ordered chain of mappers, applied left-to-right.
///
/// The order is fixed at construction and never changes at runtime.
/// An empty pipeline is the identity function.
#[derive(Debug, Default)]
pub struct MapperPipeline {
    mappers: Vec<Mapper>,
    log_steps: bool,
}

impl MapperPipeline {
    /// Compile all specs in configured order.
    pub fn build(specs: &[MapperSpec], log_steps: bool) -> Result<Self, CoreError> {
        let mappers = specs.iter().map(Mapper::build).collect::<Result<_, _>>()?;
        Ok(Self { mappers, log_steps })
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    /// Run the raw body through every mapper in sequence, each consuming
    /// the previous mapper's output.
    pub fn apply(&self, raw: &str) -> Result<String, CoreError> {
        let mut value = raw.to_owned();
        for (step, mapper) in self.mappers.iter().enumerate() {
            let next = mapper.map(&value)?;
            if self.log_steps {
                debug!(step, kind = mapper.kind(), input = %value, output = %next, "mapper step");
            }
            value = next;
        }
        Ok(value)
    }
}

// ── Element-path evaluation ─────────────────────────────────────────

/// Evaluate an element-path expression against a markup document,
/// collecting the text content of every matching element and returning
/// the match at `index` (`None` when unmatched or out of range).
///
/// Supported dialect: absolute paths (`/alarm/state`) match from the
/// document root; descendant paths (`//state`) match at any depth.
/// Malformed markup is an error -- the caller decides whether that is
/// fatal.
fn evaluate_path(
    doc: &str,
    expression: &str,
    index: usize,
) -> Result<Option<String>, quick_xml::Error> {
    let descendant = expression.starts_with("//");
    let parts: Vec<&str> = expression.split('/').filter(|s| !s.is_empty()).collect();
    if parts.is_empty() {
        return Ok(None);
    }

    let mut reader = Reader::from_str(doc);
    let mut stack: Vec<String> = Vec::new();
    let mut matches: Vec<String> = Vec::new();
    // Depth at which the currently-captured element started.
    let mut capture_depth: Option<usize> = None;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                stack.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                if capture_depth.is_none() && path_matches(&stack, &parts, descendant) {
                    capture_depth = Some(stack.len());
                    text.clear();
                }
            }
            Event::Text(t) => {
                if capture_depth.is_some() {
                    let unescaped = t.unescape().map_err(quick_xml::Error::from)?;
                    text.push_str(&unescaped);
                }
            }
            Event::End(_) => {
                if capture_depth == Some(stack.len()) {
                    matches.push(text.trim().to_owned());
                    capture_depth = None;
                }
                stack.pop();
            }
            Event::Empty(empty) => {
                stack.push(String::from_utf8_lossy(empty.name().as_ref()).into_owned());
                if capture_depth.is_none() && path_matches(&stack, &parts, descendant) {
                    matches.push(String::new());
                }
                stack.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(matches.into_iter().nth(index))
}

fn path_matches(stack: &[String], parts: &[&str], descendant: bool) -> bool {
    if stack.len() < parts.len() || (!descendant && stack.len() != parts.len()) {
        return false;
    }
    stack[stack.len() - parts.len()..]
        .iter()
        .zip(parts)
        .all(|(elem, part)| elem == part)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn static_mapper(pairs: &[(&str, &str)]) -> Mapper {
        let mapping: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Mapper::Static { mapping }
    }

    // ── Static ──────────────────────────────────────────────────────

    #[test]
    fn static_maps_every_configured_pair() {
        let mapper = static_mapper(&[("armed", "1"), ("disarmed", "3")]);
        assert_eq!(mapper.map("armed").unwrap(), "1");
        assert_eq!(mapper.map("disarmed").unwrap(), "3");
    }

    #[test]
    fn static_miss_passes_through() {
        let mapper = static_mapper(&[("armed", "1")]);
        assert_eq!(mapper.map("unknown").unwrap(), "unknown");
    }

    // ── Regex ───────────────────────────────────────────────────────

    #[test]
    fn regex_extracts_numbered_group() {
        let spec = MapperSpec::Regex {
            pattern: r"(\d+)".into(),
            capture: CaptureGroup::Index(1),
        };
        let mapper = Mapper::build(&spec).unwrap();
        assert_eq!(mapper.map("temp:42").unwrap(), "42");
    }

    #[test]
    fn regex_extracts_named_group() {
        let spec = MapperSpec::Regex {
            pattern: r"state=(?P<code>\d)".into(),
            capture: CaptureGroup::Name("code".into()),
        };
        let mapper = Mapper::build(&spec).unwrap();
        assert_eq!(mapper.map("state=2;ok").unwrap(), "2");
    }

    #[test]
    fn regex_non_match_passes_through() {
        let spec = MapperSpec::Regex {
            pattern: r"(\d+)".into(),
            capture: CaptureGroup::default(),
        };
        let mapper = Mapper::build(&spec).unwrap();
        assert_eq!(mapper.map("no digits here").unwrap(), "no digits here");
    }

    #[test]
    fn regex_missing_group_passes_through() {
        let spec = MapperSpec::Regex {
            pattern: r"\d+".into(),
            capture: CaptureGroup::Index(3),
        };
        let mapper = Mapper::build(&spec).unwrap();
        assert_eq!(mapper.map("42").unwrap(), "42");
    }

    #[test]
    fn regex_invalid_pattern_is_config_error() {
        let spec = MapperSpec::Regex {
            pattern: "(unclosed".into(),
            capture: CaptureGroup::default(),
        };
        assert!(matches!(
            Mapper::build(&spec),
            Err(CoreError::Config { .. })
        ));
    }

    // ── Xpath ───────────────────────────────────────────────────────

    #[test]
    fn xpath_extracts_absolute_path() {
        let spec = MapperSpec::Xpath {
            expression: "/alarm/state".into(),
            index: 0,
        };
        let mapper = Mapper::build(&spec).unwrap();
        let doc = "<alarm><name>home</name><state>2</state></alarm>";
        assert_eq!(mapper.map(doc).unwrap(), "2");
    }

    #[test]
    fn xpath_descendant_path_and_index() {
        let spec = MapperSpec::Xpath {
            expression: "//zone".into(),
            index: 1,
        };
        let mapper = Mapper::build(&spec).unwrap();
        let doc = "<panel><zones><zone>front</zone><zone>back</zone></zones></panel>";
        assert_eq!(mapper.map(doc).unwrap(), "back");
    }

    #[test]
    fn xpath_index_out_of_range_passes_through() {
        let spec = MapperSpec::Xpath {
            expression: "/alarm/state".into(),
            index: 5,
        };
        let mapper = Mapper::build(&spec).unwrap();
        let doc = "<alarm><state>1</state></alarm>";
        assert_eq!(mapper.map(doc).unwrap(), doc);
    }

    #[test]
    fn xpath_malformed_markup_is_fatal() {
        let spec = MapperSpec::Xpath {
            expression: "/alarm/state".into(),
            index: 0,
        };
        let mapper = Mapper::build(&spec).unwrap();
        assert!(matches!(
            mapper.map("<alarm><state>1</alarm>"),
            Err(CoreError::Mapper { .. })
        ));
    }

    // ── Pipeline ────────────────────────────────────────────────────

    #[test]
    fn empty_pipeline_is_identity() {
        let pipeline = MapperPipeline::build(&[], false).unwrap();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.apply("anything at all").unwrap(), "anything at all");
    }

    #[test]
    fn pipeline_applies_in_configured_order() {
        let specs = vec![
            MapperSpec::Regex {
                pattern: r"stay:(\w+)".into(),
                capture: CaptureGroup::Index(1),
            },
            MapperSpec::Static {
                mapping: HashMap::from([("armed".to_owned(), "0".to_owned())]),
            },
        ];
        let pipeline = MapperPipeline::build(&specs, true).unwrap();
        assert_eq!(pipeline.apply("stay:armed").unwrap(), "0");
    }
}
