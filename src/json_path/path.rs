// Copyright 2024 The DocAssert Authors
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use std::iter::Peekable;
use std::str::CharIndices;

use serde_json::Value;

use super::{child_field, child_index, JsonPathError, ROOT};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    Root,
    Keys(Vec<Key>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    /// `[n]`, negative values count from the end of the array.
    Idx(isize),
    /// `[start:end]`, negative bounds count from the end of the array like indexes do.
    IdxRange(isize, isize),
    /// `[start:]`
    IdxRangeStart(isize),
    /// `[:end]`
    IdxRangeEnd(isize),
    /// `.*`
    Wildcard,
    /// `[*]`
    WildcardArray,
    Field(String),
    /// `[0,2]` or `['a','b']`
    Union(Vec<Key>),
    /// `..key`, applies the key to a node and all of its descendants.
    Descendant(Box<Key>),
}

pub trait JSONPath {
    fn jsonpath(&self) -> Result<Path, JsonPathError>;
}

impl JSONPath for str {
    fn jsonpath(&self) -> Result<Path, JsonPathError> {
        Path::from_jsonpath(self)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Idx(idx) => write!(f, "[{}]", idx),
            Key::Field(name) => write!(f, "{}", &child_field("", name)),
            Key::IdxRange(start, end) => write!(f, "[{}:{}]", start, end),
            Key::IdxRangeStart(start) => write!(f, "[{}:]", start),
            Key::IdxRangeEnd(end) => write!(f, "[:{}]", end),
            Key::Wildcard => write!(f, ".*"),
            Key::WildcardArray => write!(f, "[*]"),
            Key::Union(keys) => {
                write!(f, "[")?;
                for (i, key) in keys.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    let key = key.to_string();
                    write!(f, "{}", &key[1..key.len() - 1])?;
                }
                write!(f, "]")
            }
            Key::Descendant(key) => match key.as_ref() {
                Key::Wildcard => write!(f, "..*"),
                key => write!(f, "..{}", key),
            },
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", ROOT)?;
        if let Path::Keys(keys) = self {
            for key in keys {
                write!(f, "{}", key)?;
            }
        }
        Ok(())
    }
}

impl Key {
    /// Pushes the nodes this key selects below `value` (located at `path`) into `acc`.
    fn select<'v>(&self, path: &str, value: &'v Value, acc: &mut Vec<(String, &'v Value)>) {
        match (self, value) {
            (Key::Field(name), Value::Object(map)) => {
                if let Some(child) = map.get(name) {
                    acc.push((child_field(path, name), child));
                }
            }
            (Key::Idx(idx), Value::Array(items)) => {
                let idx = if *idx < 0 {
                    items.len().checked_sub(idx.unsigned_abs())
                } else {
                    Some(*idx as usize)
                };
                if let Some((idx, child)) = idx.and_then(|idx| items.get(idx).map(|c| (idx, c))) {
                    acc.push((child_index(path, idx), child));
                }
            }
            (Key::IdxRange(start, end), Value::Array(items)) => select_range(
                path,
                items,
                slice_bound(*start, items.len()),
                slice_bound(*end, items.len()),
                acc,
            ),
            (Key::IdxRangeStart(start), Value::Array(items)) => {
                select_range(path, items, slice_bound(*start, items.len()), items.len(), acc)
            }
            (Key::IdxRangeEnd(end), Value::Array(items)) => {
                select_range(path, items, 0, slice_bound(*end, items.len()), acc)
            }
            (Key::Wildcard | Key::WildcardArray, Value::Array(items)) => {
                select_range(path, items, 0, items.len(), acc)
            }
            (Key::Wildcard | Key::WildcardArray, Value::Object(map)) => {
                for (name, child) in map {
                    acc.push((child_field(path, name), child));
                }
            }
            (Key::Union(keys), _) => {
                for key in keys {
                    key.select(path, value, acc);
                }
            }
            (Key::Descendant(key), _) => key.select_descendants(path, value, acc),
            _ => {}
        }
    }

    fn select_descendants<'v>(
        &self,
        path: &str,
        value: &'v Value,
        acc: &mut Vec<(String, &'v Value)>,
    ) {
        self.select(path, value, acc);

        match value {
            Value::Array(items) => {
                for (idx, child) in items.iter().enumerate() {
                    self.select_descendants(&child_index(path, idx), child, acc);
                }
            }
            Value::Object(map) => {
                for (name, child) in map {
                    self.select_descendants(&child_field(path, name), child, acc);
                }
            }
            _ => {}
        }
    }
}

/// Resolves a slice bound against an array of `len` elements, clamped to `0..=len`.
fn slice_bound(bound: isize, len: usize) -> usize {
    if bound < 0 {
        len.saturating_sub(bound.unsigned_abs())
    } else {
        (bound as usize).min(len)
    }
}

fn select_range<'v>(
    path: &str,
    items: &'v [Value],
    start: usize,
    end: usize,
    acc: &mut Vec<(String, &'v Value)>,
) {
    for idx in start..end {
        acc.push((child_index(path, idx), &items[idx]));
    }
}

impl Path {
    /// Evaluates the path against `root`, returning every matched node together with its
    /// normalized path, in document order.
    pub fn query_located<'v>(&self, root: &'v Value) -> Vec<(String, &'v Value)> {
        let mut current = vec![(ROOT.to_string(), root)];

        if let Path::Keys(keys) = self {
            for key in keys {
                let mut next = vec![];
                for (path, value) in &current {
                    key.select(path, value, &mut next);
                }
                current = next;
            }
        }

        current
    }

    /// First node matched by the path, if any.
    pub fn resolve<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.query_located(root)
            .into_iter()
            .next()
            .map(|(_, value)| value)
    }

    pub fn from_jsonpath(jsonpath: &str) -> Result<Self, JsonPathError> {
        let mut scanner = Scanner::new(jsonpath);

        match scanner.next() {
            Some((_, '$')) => {}
            _ => return Err(JsonPathError::MissingRoot),
        }

        let mut keys = Vec::new();

        while let Some((offset, c)) = scanner.next() {
            match c {
                '.' => {
                    if scanner.eat('.') {
                        keys.push(Key::Descendant(Box::new(scanner.parse_dot_key(true)?)));
                    } else {
                        keys.push(scanner.parse_dot_key(false)?);
                    }
                }
                '[' => keys.push(scanner.parse_bracket()?),
                found => return Err(JsonPathError::UnexpectedChar { found, offset }),
            }
        }

        if keys.is_empty() {
            Ok(Path::Root)
        } else {
            Ok(Path::Keys(keys))
        }
    }
}

struct Scanner<'a> {
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
        }
    }

    fn next(&mut self) -> Option<(usize, char)> {
        self.chars.next()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), JsonPathError> {
        match self.next() {
            Some((_, c)) if c == expected => Ok(()),
            Some((offset, found)) => Err(JsonPathError::UnexpectedChar { found, offset }),
            None => Err(JsonPathError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    /// Key following a `.` (or `..` when `descendant` is set).
    fn parse_dot_key(&mut self, descendant: bool) -> Result<Key, JsonPathError> {
        match self.peek() {
            Some('*') => {
                self.chars.next();
                Ok(Key::Wildcard)
            }
            Some('[') if descendant => {
                self.chars.next();
                self.parse_bracket()
            }
            Some(c) if is_name_char(c) => {
                let mut name = String::new();
                while let Some(c) = self.peek().filter(|c| is_name_char(*c)) {
                    name.push(c);
                    self.chars.next();
                }
                Ok(Key::Field(name))
            }
            Some(found) => {
                let (offset, _) = self.next().ok_or(JsonPathError::UnexpectedEnd)?;
                Err(JsonPathError::UnexpectedChar { found, offset })
            }
            None => Err(JsonPathError::UnexpectedEnd),
        }
    }

    /// Bracketed selector, the opening `[` already consumed.
    fn parse_bracket(&mut self) -> Result<Key, JsonPathError> {
        self.skip_whitespace();

        match self.peek() {
            Some('*') => {
                self.chars.next();
                self.skip_whitespace();
                self.expect(']')?;
                return Ok(Key::WildcardArray);
            }
            Some('?') | Some('(') => return Err(JsonPathError::UnsupportedFilter),
            _ => {}
        }

        let mut keys = vec![self.parse_bracket_item()?];
        loop {
            self.skip_whitespace();
            match self.next() {
                Some((_, ']')) => break,
                Some((_, ',')) => {
                    self.skip_whitespace();
                    keys.push(self.parse_bracket_item()?);
                }
                Some((offset, found)) => return Err(JsonPathError::UnexpectedChar { found, offset }),
                None => return Err(JsonPathError::UnexpectedEnd),
            }
        }

        if keys.len() == 1 {
            Ok(keys.remove(0))
        } else {
            Ok(Key::Union(keys))
        }
    }

    fn parse_bracket_item(&mut self) -> Result<Key, JsonPathError> {
        match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                self.parse_quoted(quote).map(Key::Field)
            }
            Some(c) if c == ':' || c == '-' || c.is_ascii_digit() => self.parse_index(),
            Some(found) => {
                let (offset, _) = self.next().ok_or(JsonPathError::UnexpectedEnd)?;
                Err(JsonPathError::UnexpectedChar { found, offset })
            }
            None => Err(JsonPathError::UnexpectedEnd),
        }
    }

    fn parse_quoted(&mut self, quote: char) -> Result<String, JsonPathError> {
        let mut name = String::new();
        loop {
            match self.next() {
                Some((_, '\\')) => match self.next() {
                    Some((_, c)) => name.push(c),
                    None => return Err(JsonPathError::UnexpectedEnd),
                },
                Some((_, c)) if c == quote => return Ok(name),
                Some((_, c)) => name.push(c),
                None => return Err(JsonPathError::UnexpectedEnd),
            }
        }
    }

    fn parse_index(&mut self) -> Result<Key, JsonPathError> {
        let start = self.take_number();

        if !self.eat(':') {
            return start
                .parse::<isize>()
                .map(Key::Idx)
                .map_err(|_| JsonPathError::InvalidIndex(start));
        }

        let end = self.take_number();
        let bound = |token: &str| {
            token
                .parse::<isize>()
                .map_err(|_| JsonPathError::InvalidIndex(token.to_string()))
        };

        match (start.is_empty(), end.is_empty()) {
            (true, true) => Ok(Key::WildcardArray),
            (false, true) => Ok(Key::IdxRangeStart(bound(&start)?)),
            (true, false) => Ok(Key::IdxRangeEnd(bound(&end)?)),
            (false, false) => Ok(Key::IdxRange(bound(&start)?, bound(&end)?)),
        }
    }

    fn take_number(&mut self) -> String {
        let mut token = String::new();
        while let Some(c) = self.peek().filter(|c| *c == '-' || c.is_ascii_digit()) {
            token.push(c);
            self.chars.next();
        }
        token
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
