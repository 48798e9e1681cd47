//! Dot-path navigation over untyped JSON data (§4.1 `getNested`).

use serde_json::Value;

/// Split `path` on `.`, walking maps and arrays. `[n]` indexes into an
/// array segment. The `$json.` and `$input.` prefixes are recognised and
/// stripped so both forms navigate the same `input` value -- the
/// executor binds `$json` to the primary upstream output and `$input`
/// to the trigger payload, but from the resolver's point of view they
/// are just two names for "the current scope".
///
/// A missing key returns `None`, never an error (§4.1 guarantee).
#[must_use]
pub fn get_nested<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let path = strip_known_prefix(path);
    if path.is_empty() {
        return Some(data);
    }

    let mut current = data;
    for segment in Segments::new(path) {
        current = match segment {
            Segment::Key(key) => current.as_object()?.get(key)?,
            Segment::Index(i) => current.as_array()?.get(i)?,
        };
    }
    Some(current)
}

fn strip_known_prefix(path: &str) -> &str {
    for prefix in ["$json.", "$input.", "$json", "$input"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            return rest;
        }
    }
    path
}

#[derive(Debug, PartialEq, Eq)]
enum Segment<'a> {
    Key(&'a str),
    Index(usize),
}

/// Iterator splitting a path like `a.b[0].c` into `Key("a")`,
/// `Key("b")`, `Index(0)`, `Key("c")`.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(path: &'a str) -> Self {
        Self { rest: path }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }
        // A leading `[n]` is an index segment on its own.
        if let Some(stripped) = self.rest.strip_prefix('[') {
            let end = stripped.find(']')?;
            let idx: usize = stripped[..end].parse().ok()?;
            self.rest = stripped[end + 1..].trim_start_matches('.');
            return Some(Segment::Index(idx));
        }

        let dot = self.rest.find('.');
        let bracket = self.rest.find('[');
        let end = match (dot, bracket) {
            (Some(d), Some(b)) => d.min(b),
            (Some(d), None) => d,
            (None, Some(b)) => b,
            (None, None) => self.rest.len(),
        };
        let key = &self.rest[..end];
        self.rest = if end == self.rest.len() {
            ""
        } else if self.rest.as_bytes()[end] == b'.' {
            &self.rest[end + 1..]
        } else {
            &self.rest[end..]
        };
        Some(Segment::Key(key))
    }
}
