//! Brace-delimited configuration documents.
//!
//! ```text
//! EXPERIMENT_DEFINITION
//! {
//!     id = crewReport
//!     RESULTS
//!     {
//!         default = Nothing to report.
//!         Situation { name = Kerbin }
//!     }
//! }
//! ```
//!
//! A bare word names a node and must be followed by `{`. Each `key = value`
//! line adds one value; braces may share its line. `//` starts a comment.
//! Values keep duplicate keys in order.

use std::fmt;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::multimap::MultiMap;

/// Node of a configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigNode {
    pub name: String,
    pub values: MultiMap<String, String>,
    pub nodes: Vec<ConfigNode>,
}

impl ConfigNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_value(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.add(key.into(), value.into());
    }

    /// First value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.values.try_get(key).map(String::as_str)
    }

    pub fn add_node(&mut self, node: ConfigNode) {
        self.nodes.push(node);
    }

    /// First child node called `name`.
    pub fn get_node(&self, name: &str) -> Option<&ConfigNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn get_node_mut(&mut self, name: &str) -> Option<&mut ConfigNode> {
        self.nodes.iter_mut().find(|n| n.name == name)
    }

    /// All child nodes called `name`, in document order.
    pub fn get_nodes<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ConfigNode> + 'a {
        self.nodes.iter().filter(move |n| n.name == name)
    }

    pub fn get_nodes_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut ConfigNode> + 'a {
        self.nodes.iter_mut().filter(move |n| n.name == name)
    }

    /// Removes every child node called `name`, returning how many were removed.
    pub fn remove_nodes(&mut self, name: &str) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.name != name);
        before - self.nodes.len()
    }

    /// Parses a document into an unnamed root node.
    pub fn parse(content: &str) -> DomainResult<Self> {
        Parser::default().run(content)
    }

    /// Serializes the node. The root's own name and braces are omitted when the
    /// name is empty.
    pub fn to_cfg_string(&self) -> String {
        self.to_string()
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "\t".repeat(depth);
        writeln!(f, "{indent}{}", self.name)?;
        writeln!(f, "{indent}{{")?;
        self.write_body(f, depth + 1)?;
        writeln!(f, "{indent}}}")
    }

    fn write_body(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "\t".repeat(depth);
        for (key, value) in &self.values {
            writeln!(f, "{indent}{key} = {value}")?;
        }
        for node in &self.nodes {
            node.write_node(f, depth)?;
        }
        Ok(())
    }
}

impl fmt::Display for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            self.write_body(f, 0)
        } else {
            self.write_node(f, 0)
        }
    }
}

#[derive(Debug)]
enum Token<'a> {
    Open,
    Close,
    Text(&'a str),
}

/// Stack-based parser; the bottom of the stack is the unnamed root.
#[derive(Default)]
struct Parser {
    stack: Vec<ConfigNode>,
    /// Bare word waiting for its opening brace, with the line it appeared on.
    pending: Option<(String, usize)>,
}

impl Parser {
    fn run(mut self, content: &str) -> DomainResult<ConfigNode> {
        self.stack.push(ConfigNode::default());

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = match raw_line.find("//") {
                Some(pos) => &raw_line[..pos],
                None => raw_line,
            };
            for token in tokenize(line) {
                self.accept(token, line_no)?;
            }
        }

        if let Some((name, line)) = self.pending.take() {
            return Err(DomainError::Parse {
                line,
                message: format!("expected '{{' after node name '{name}'"),
            });
        }
        if self.stack.len() > 1 {
            let open = self.stack.last().map(|n| n.name.clone()).unwrap_or_default();
            return Err(DomainError::Parse {
                line: content.lines().count(),
                message: format!("unclosed node '{open}' at end of input"),
            });
        }
        self.stack.pop().ok_or_else(|| DomainError::Parse {
            line: 0,
            message: "empty parser stack".to_string(),
        })
    }

    fn accept(&mut self, token: Token<'_>, line: usize) -> DomainResult<()> {
        match token {
            Token::Open => {
                let (name, _) = self.pending.take().ok_or_else(|| DomainError::Parse {
                    line,
                    message: "'{' without a node name".to_string(),
                })?;
                self.stack.push(ConfigNode::new(name));
            }
            Token::Close => {
                self.reject_pending()?;
                if self.stack.len() < 2 {
                    return Err(DomainError::Parse {
                        line,
                        message: "unbalanced '}'".to_string(),
                    });
                }
                if let Some(node) = self.stack.pop() {
                    self.current()?.add_node(node);
                }
            }
            Token::Text(text) => {
                self.reject_pending()?;
                match text.split_once('=') {
                    Some((key, value)) => {
                        let key = key.trim();
                        if key.is_empty() {
                            return Err(DomainError::Parse {
                                line,
                                message: format!("value without a key: '{text}'"),
                            });
                        }
                        self.current()?.add_value(key, value.trim());
                    }
                    None => self.pending = Some((text.to_string(), line)),
                }
            }
        }
        Ok(())
    }

    fn reject_pending(&mut self) -> DomainResult<()> {
        match self.pending.take() {
            Some((name, line)) => Err(DomainError::Parse {
                line,
                message: format!("expected '{{' after node name '{name}'"),
            }),
            None => Ok(()),
        }
    }

    fn current(&mut self) -> DomainResult<&mut ConfigNode> {
        self.stack.last_mut().ok_or_else(|| DomainError::Parse {
            line: 0,
            message: "empty parser stack".to_string(),
        })
    }
}

/// Splits a comment-free line into braces and trimmed, non-empty text runs.
fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (pos, ch) in line.char_indices() {
        if ch == '{' || ch == '}' {
            push_text(&mut tokens, &line[start..pos]);
            tokens.push(if ch == '{' { Token::Open } else { Token::Close });
            start = pos + 1;
        }
    }
    push_text(&mut tokens, &line[start..]);
    tokens
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    let text = text.trim();
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
}
