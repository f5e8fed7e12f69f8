//! Template-variable expansion for metric paths.
//!
//! A metric path such as `$app/$container/memory/usage` may reference any
//! number of dashboard variables. Each variable resolves to one or more
//! literal alternatives and the path expands to the cartesian product of
//! all of them.
//!
//! Ordering contract: the first placeholder discovered in the path varies
//! fastest. Every newly discovered placeholder becomes the new outer loop,
//! so for `$x/$y` with `x = {1,2}` and `y = {3,4}` the output is
//! `1/3, 2/3, 1/4, 2/4`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `$` followed by a run of ASCII letters, digits or underscores.
static PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$[A-Za-z0-9_]+").ok());

// ---------------------------------------------------------------------------
// Resolver capability
// ---------------------------------------------------------------------------

/// Maps a placeholder token (including its leading `$`) to literal values.
///
/// Implementations return the token itself, as a single element, when they
/// do not know the variable; expansion then keeps it as literal text.
pub trait VariableResolver: Send + Sync {
    /// Resolve `placeholder` (for example `"$app"`) to its alternatives.
    fn resolve(&self, placeholder: &str) -> Vec<String>;
}

/// Dashboard variables held as a name-to-values map.
///
/// Names are stored without the leading `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables {
    values: HashMap<String, Vec<String>>,
}

impl TemplateVariables {
    /// Create an empty variable set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to the given alternatives, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        let name = name.strip_prefix('$').map(str::to_owned).unwrap_or(name);
        self.values.insert(name, values);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, values: Vec<String>) -> Self {
        self.insert(name, values);
        self
    }

    /// Parse a `name=value` assignment where `value` is a literal, a
    /// comma list `a,b` or a brace list `{a,b}`.
    ///
    /// Returns `None` if there is no `=` or the name is empty.
    pub fn parse_assignment(assignment: &str) -> Option<(String, Vec<String>)> {
        let (name, raw) = assignment.split_once('=')?;
        let name = name.trim().trim_start_matches('$');
        if name.is_empty() {
            return None;
        }
        let raw = raw.trim();
        let values = if raw.starts_with('{') {
            parse_brace_list(raw)
        } else {
            raw.split(',').map(|v| v.trim().to_owned()).collect()
        };
        Some((name.to_owned(), values))
    }

    /// Number of variables defined.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variables are defined.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, Vec<String>)> for TemplateVariables {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        let mut vars = Self::new();
        for (name, values) in iter {
            vars.insert(name, values);
        }
        vars
    }
}

impl VariableResolver for TemplateVariables {
    fn resolve(&self, placeholder: &str) -> Vec<String> {
        let name = placeholder.trim_start_matches('$');
        match self.values.get(name) {
            Some(values) => values.clone(),
            None => vec![placeholder.to_owned()],
        }
    }
}

/// Adapts a host-style replace function (`"$app"` to `"{app_1,app_2}"`)
/// into a [`VariableResolver`].
pub struct ReplaceResolver<F> {
    replace: F,
}

impl<F> ReplaceResolver<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    /// Wrap `replace`.
    pub fn new(replace: F) -> Self {
        Self { replace }
    }
}

impl<F> VariableResolver for ReplaceResolver<F>
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn resolve(&self, placeholder: &str) -> Vec<String> {
        parse_brace_list(&(self.replace)(placeholder))
    }
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

/// Parse a resolver result into ordered alternatives.
///
/// `{a,b,c}` becomes `["a", "b", "c"]` with each item trimmed; `{}` has no
/// alternatives; anything without surrounding braces is a single literal.
pub fn parse_brace_list(raw: &str) -> Vec<String> {
    let Some(inner) = raw
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
    else {
        return vec![raw.to_owned()];
    };
    if inner.trim().is_empty() {
        return Vec::new();
    }
    inner.split(',').map(|item| item.trim().to_owned()).collect()
}

/// Distinct placeholder tokens of `path`, in order of first appearance.
pub fn placeholders(path: &str) -> Vec<&str> {
    let Some(re) = PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut found: Vec<&str> = Vec::new();
    for m in re.find_iter(path) {
        if !found.contains(&m.as_str()) {
            found.push(m.as_str());
        }
    }
    found
}

/// Expand every placeholder of `path` into concrete paths.
///
/// The resolver is called once per distinct placeholder. See the module
/// docs for the ordering contract.
pub fn expand_path(path: &str, resolver: &dyn VariableResolver) -> Vec<String> {
    let tokens = placeholders(path);
    let Some(re) = PLACEHOLDER.as_ref().filter(|_| !tokens.is_empty()) else {
        return vec![path.to_owned()];
    };

    let alternatives: Vec<Vec<String>> = tokens.iter().map(|t| resolver.resolve(t)).collect();

    let mut combos: Vec<Vec<&str>> = vec![Vec::new()];
    for values in &alternatives {
        let mut next = Vec::with_capacity(combos.len().saturating_mul(values.len()));
        for value in values {
            for combo in &combos {
                let mut extended = combo.clone();
                extended.push(value.as_str());
                next.push(extended);
            }
        }
        combos = next;
    }

    combos
        .iter()
        .map(|combo| {
            re.replace_all(path, |caps: &Captures<'_>| {
                let token = &caps[0];
                tokens
                    .iter()
                    .position(|t| *t == token)
                    .and_then(|idx| combo.get(idx))
                    .map_or_else(|| token.to_owned(), |value| (*value).to_owned())
            })
            .into_owned()
        })
        .collect()
}
