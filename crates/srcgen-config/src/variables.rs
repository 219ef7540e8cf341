//! Variables and `${name}` resolution.
//!
//! A value may reference other variables as `${name}`. Resolution orders
//! the variables by the length of their longest reference chain, so every
//! referenced value is final before it is substituted. References to names
//! that are not known stay in the text verbatim.

use regex::{Captures, Regex};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{LazyLock, OnceLock};
use tracing::debug;
use url::Url;

use crate::scope::{Named, name_identity};
use crate::{ConfigError, ConfigResult};

/// Encoding assumed when a source does not name one.
pub const DEFAULT_ENCODING: &str = "UTF-8";

// A marker runs from `${` to the first `}`. An unterminated marker never matches.
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Replace every `${key}` whose key is in `vars` with its value.
///
/// Unknown keys are left untouched, as is everything after an unterminated
/// `${`.
pub fn replace_vars(text: &str, vars: &HashMap<String, String>) -> String {
    if text.is_empty() || vars.is_empty() {
        return text.to_string();
    }
    VAR_REGEX
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Apply [`replace_vars`] to each entry of a list.
pub fn replace_vars_all(texts: &[String], vars: &HashMap<String, String>) -> Vec<String> {
    texts.iter().map(|t| replace_vars(t, vars)).collect()
}

/// Names referenced by `text`, in order of appearance.
pub fn references(text: &str) -> Vec<&str> {
    VAR_REGEX
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect()
}

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Fully substituted value per name.
    pub resolved: HashMap<String, String>,
    /// Length of the longest reference chain starting at each name.
    pub depth: HashMap<String, usize>,
}

/// Resolve a set of variables that may reference each other.
///
/// Fails with [`ConfigError::CycleDetected`] if a name can reach itself.
pub fn resolve(vars: &HashMap<String, String>) -> ConfigResult<Resolution> {
    let mut names: Vec<&str> = vars.keys().map(String::as_str).collect();
    names.sort_unstable();

    let mut depth = HashMap::with_capacity(vars.len());
    for name in &names {
        depth_of(name, vars, &mut depth)?;
    }

    let mut order: Vec<(usize, &str)> = names
        .iter()
        .map(|name| (depth.get(*name).copied().unwrap_or(0), *name))
        .collect();
    order.sort_unstable();

    let mut resolved = HashMap::with_capacity(vars.len());
    for (_, name) in order {
        let value = replace_vars(&vars[name], &resolved);
        resolved.insert(name.to_string(), value);
    }

    Ok(Resolution { resolved, depth })
}

struct Visit<'a> {
    name: &'a str,
    pending: std::vec::IntoIter<&'a str>,
    depth: usize,
}

impl<'a> Visit<'a> {
    fn new(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            pending: references(value).into_iter(),
            depth: 0,
        }
    }
}

// Iterative depth-first walk. `stack` holds the current reference path.
fn depth_of<'a>(
    name: &'a str,
    vars: &'a HashMap<String, String>,
    memo: &mut HashMap<String, usize>,
) -> ConfigResult<usize> {
    if let Some(depth) = memo.get(name) {
        return Ok(*depth);
    }
    let Some(value) = vars.get(name) else {
        return Ok(0);
    };

    let mut on_path: HashSet<&str> = HashSet::from([name]);
    let mut stack = vec![Visit::new(name, value)];

    while let Some(visit) = stack.last_mut() {
        let Some(reference) = visit.pending.next() else {
            let Some(done) = stack.pop() else { break };
            on_path.remove(done.name);
            memo.insert(done.name.to_string(), done.depth);
            match stack.last_mut() {
                Some(parent) => parent.depth = parent.depth.max(1 + done.depth),
                None => return Ok(done.depth),
            }
            continue;
        };

        let Some(value) = vars.get(reference) else {
            continue;
        };
        if let Some(depth) = memo.get(reference) {
            visit.depth = visit.depth.max(1 + depth);
            continue;
        }

        if on_path.contains(reference) {
            let start = stack
                .iter()
                .position(|v| v.name == reference)
                .unwrap_or_default();
            let mut cycle: Vec<&str> = stack[start..].iter().map(|v| v.name).collect();
            cycle.push(reference);
            return Err(ConfigError::CycleDetected(cycle.join(" > ")));
        }

        on_path.insert(reference);
        stack.push(Visit::new(reference, value));
    }

    Ok(0)
}

/// External text a variable value is read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSource {
    /// A `file:` URL or a plain filesystem path.
    pub location: String,
    /// Character encoding, UTF-8 if not set.
    pub encoding: Option<String>,
}

impl VariableSource {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            encoding: None,
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Read the whole resource as text.
    pub fn load(&self) -> ConfigResult<String> {
        let encoding = self.encoding.as_deref().unwrap_or(DEFAULT_ENCODING);
        if !matches!(encoding.to_ascii_lowercase().as_str(), "utf-8" | "utf8") {
            return Err(ConfigError::UnsupportedEncoding {
                location: self.location.clone(),
                encoding: encoding.to_string(),
            });
        }

        let path = self.path()?;
        fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            location: self.location.clone(),
            source,
        })
    }

    fn path(&self) -> ConfigResult<PathBuf> {
        match Url::parse(&self.location) {
            Ok(url) if url.scheme() == "file" => {
                url.to_file_path().map_err(|_| ConfigError::InvalidValue {
                    field: "variable source".to_string(),
                    message: format!("not a local file URL: {}", self.location),
                })
            }
            // Single letter schemes are Windows drive letters.
            Ok(url) if url.scheme().len() > 1 => Err(ConfigError::InvalidValue {
                field: "variable source".to_string(),
                message: format!("unsupported URL scheme '{}'", url.scheme()),
            }),
            _ => Ok(PathBuf::from(&self.location)),
        }
    }
}

/// A named value, identified by its name only.
#[derive(Debug, Clone, Default)]
pub struct Variable {
    name: String,
    value: OnceLock<String>,
    source: Option<VariableSource>,
}

impl Variable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: OnceLock::from(value.into()),
            source: None,
        }
    }

    /// A variable declared without a value.
    pub fn unset(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A variable whose value is read from `source` on first access.
    pub fn from_source(name: impl Into<String>, source: VariableSource) -> Self {
        Self {
            name: name.into(),
            value: OnceLock::new(),
            source: Some(source),
        }
    }

    pub fn source(&self) -> Option<&VariableSource> {
        self.source.as_ref()
    }

    /// The value without triggering a load.
    pub fn raw_value(&self) -> Option<&str> {
        self.value.get().map(String::as_str)
    }

    /// The value, loading it from the source once if needed.
    ///
    /// A variable with neither a value nor a source yields the empty string.
    pub fn value(&self) -> ConfigResult<&str> {
        if self.value.get().is_none() {
            if let Some(source) = &self.source {
                let text = source.load()?;
                debug!(variable = %self.name, location = %source.location, "Loaded variable value");
                let _ = self.value.set(text);
            }
        }
        Ok(self.value.get().map(String::as_str).unwrap_or_default())
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = OnceLock::from(value.into());
    }
}

impl Named for Variable {
    fn name(&self) -> &str {
        &self.name
    }
}

name_identity!(Variable);

impl Serialize for Variable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Variable", 3)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("value", &self.raw_value())?;
        state.serialize_field("source", &self.source)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replace_known_variables() {
        let v = vars(&[("name", "srcgen"), ("version", "1.0")]);
        assert_eq!(replace_vars("${name}-${version}.jar", &v), "srcgen-1.0.jar");
    }

    #[test]
    fn test_unknown_variable_preserved() {
        assert_eq!(replace_vars("${missing}", &HashMap::new()), "${missing}");
        let v = vars(&[("a", "1")]);
        assert_eq!(replace_vars("${a}/${missing}", &v), "1/${missing}");
    }

    #[test]
    fn test_unterminated_marker_is_literal() {
        let v = vars(&[("a", "1"), ("b", "2")]);
        assert_eq!(replace_vars("${a}/${b", &v), "1/${b");
        // The first `}` closes the marker, so the key is `a ${b`.
        assert_eq!(replace_vars("${a ${b}", &v), "${a ${b}");
    }

    #[test]
    fn test_replace_is_idempotent_without_chains() {
        let v = vars(&[("x", "X"), ("y", "Y")]);
        let once = replace_vars("${x}.${y}.${z}", &v);
        assert_eq!(replace_vars(&once, &v), once);
    }

    #[test]
    fn test_replace_vars_all() {
        let v = vars(&[("dir", "/tmp")]);
        let out = replace_vars_all(&["${dir}/a".to_string(), "b".to_string()], &v);
        assert_eq!(out, vec!["/tmp/a", "b"]);
    }

    #[test]
    fn test_references_in_order() {
        assert_eq!(references("${a}x${b}${a}${c"), vec!["a", "b", "a"]);
        assert!(references("plain").is_empty());
    }

    #[test]
    fn test_chained_resolution() {
        let v = vars(&[("a", "1${b}"), ("b", "2${c}"), ("c", "3")]);
        let resolution = resolve(&v).unwrap();

        assert_eq!(resolution.resolved, vars(&[("a", "123"), ("b", "23"), ("c", "3")]));
        assert_eq!(resolution.depth["a"], 2);
        assert_eq!(resolution.depth["b"], 1);
        assert_eq!(resolution.depth["c"], 0);
    }

    #[test]
    fn test_depth_is_monotonic() {
        let v = vars(&[
            ("root", "/r"),
            ("src", "${root}/src"),
            ("gen", "${src}/gen"),
            ("both", "${gen}:${root}:${unknown}"),
        ]);
        let resolution = resolve(&v).unwrap();
        for (name, value) in &v {
            for reference in references(value) {
                if let Some(depth) = resolution.depth.get(reference) {
                    assert!(*depth < resolution.depth[name], "{name} -> {reference}");
                }
            }
        }
        assert_eq!(resolution.resolved["both"], "/r/src/gen:/r:${unknown}");
    }

    #[test]
    fn test_unknown_reference_has_depth_zero() {
        let v = vars(&[("a", "${nowhere}")]);
        let resolution = resolve(&v).unwrap();
        assert_eq!(resolution.depth["a"], 0);
        assert_eq!(resolution.resolved["a"], "${nowhere}");
    }

    #[test]
    fn test_long_reference_chain() {
        let count = 50_000;
        let mut v: HashMap<String, String> = (0..count - 1)
            .map(|i| (format!("v{i}"), format!("${{v{}}}", i + 1)))
            .collect();
        v.insert(format!("v{}", count - 1), "end".to_string());

        let resolution = resolve(&v).unwrap();
        assert_eq!(resolution.depth["v0"], count - 1);
        assert_eq!(resolution.resolved["v0"], "end");
    }

    #[test]
    fn test_cycle_at_end_of_long_chain() {
        let count = 20_000;
        let mut v: HashMap<String, String> = (0..count)
            .map(|i| (format!("v{i:05}"), format!("${{v{:05}}}", i + 1)))
            .collect();
        v.insert(format!("v{count:05}"), format!("${{v{:05}}}", count - 1));

        match resolve(&v) {
            Err(ConfigError::CycleDetected(path)) => {
                assert_eq!(path, format!("v{:05} > v{count:05} > v{:05}", count - 1, count - 1));
            }
            other => panic!("expected cycle, got {:?}", other.map(|r| r.depth.len())),
        }
    }

    #[test]
    fn test_detect_two_node_cycle() {
        let v = vars(&[("a", "${b}"), ("b", "${a}")]);
        match resolve(&v) {
            Err(ConfigError::CycleDetected(path)) => assert_eq!(path, "a > b > a"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_three_node_cycle() {
        let v = vars(&[("a", "${b}"), ("b", "${c}"), ("c", "${a}")]);
        match resolve(&v) {
            Err(ConfigError::CycleDetected(path)) => assert_eq!(path, "a > b > c > a"),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_detect_self_reference() {
        let v = vars(&[("a", "x${a}")]);
        assert!(matches!(resolve(&v), Err(ConfigError::CycleDetected(p)) if p == "a > a"));
    }

    #[test]
    fn test_variable_identity_by_name() {
        assert_eq!(Variable::new("a", "1"), Variable::new("a", "2"));
        assert_ne!(Variable::new("a", "1"), Variable::new("b", "1"));
    }

    #[test]
    fn test_variable_without_value_is_empty() {
        let variable = Variable::unset("a");
        assert_eq!(variable.value().unwrap(), "");
        assert_eq!(variable.raw_value(), None);
    }

    #[test]
    fn test_variable_loaded_from_file_once() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "from file").unwrap();

        let url = Url::from_file_path(file.path()).unwrap();
        let variable = Variable::from_source("text", VariableSource::new(url.as_str()));
        assert_eq!(variable.raw_value(), None);
        assert_eq!(variable.value().unwrap(), "from file");

        // Cached: changing the file does not change the value.
        write!(file, " and more").unwrap();
        assert_eq!(variable.value().unwrap(), "from file");
    }

    #[test]
    fn test_variable_loaded_from_plain_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "plain").unwrap();

        let source = VariableSource::new(file.path().display().to_string()).with_encoding("utf8");
        let variable = Variable::from_source("text", source);
        assert_eq!(variable.value().unwrap(), "plain");
    }

    #[test]
    fn test_unsupported_encoding() {
        let source = VariableSource::new("/does/not/matter").with_encoding("ISO-8859-1");
        let variable = Variable::from_source("text", source);
        assert!(matches!(
            variable.value(),
            Err(ConfigError::UnsupportedEncoding { .. })
        ));
    }

    #[test]
    fn test_missing_source_file() {
        let variable = Variable::from_source("text", VariableSource::new("/no/such/file.txt"));
        assert!(matches!(variable.value(), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_unsupported_url_scheme() {
        let variable = Variable::from_source("text", VariableSource::new("https://example.com/x"));
        assert!(matches!(
            variable.value(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
