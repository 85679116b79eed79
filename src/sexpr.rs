use std::fmt::Display;

use crate::error::ParseError;

mod lexer;
mod parser;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SExpr<'a> {
    SExpr(&'a str, Box<[SExpr<'a>]>),
    Atom(&'a str),
}

impl<'a> Display for SExpr<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SExpr::SExpr(label, children) => {
                write!(f, "({}", label)?;
                for child in children.iter() {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
            SExpr::Atom(s) => write!(f, "\"{}\"", s),
        }
    }
}

impl<'a> SExpr<'a> {
    pub fn label(&self) -> Option<&'a str> {
        match self {
            SExpr::SExpr(label, _) => Some(label),
            SExpr::Atom(_) => None,
        }
    }

    /// The atoms directly below this expression, in order
    pub fn atoms(&self) -> impl Iterator<Item = &'a str> + '_ {
        let children: &[SExpr<'a>] = match self {
            SExpr::SExpr(_, children) => children,
            SExpr::Atom(_) => &[],
        };
        children.iter().filter_map(|child| match child {
            SExpr::Atom(s) => Some(*s),
            SExpr::SExpr(_, _) => None,
        })
    }

    /// Every child expression, whatever its label
    pub fn records(&self) -> impl Iterator<Item = &SExpr<'a>> + '_ {
        let children: &[SExpr<'a>] = match self {
            SExpr::SExpr(_, children) => children,
            SExpr::Atom(_) => &[],
        };
        children
            .iter()
            .filter(|child| matches!(child, SExpr::SExpr(_, _)))
    }

    /// First atom of the child labeled `label`
    pub fn value(&self, label: &str) -> Result<&'a str, ParseError> {
        self.optional_value(label)?
            .ok_or_else(|| ParseError::MissingChild(label.to_owned()))
    }

    /// Like [`SExpr::value`], but a missing child is not an error. A child
    /// without an atom still is.
    pub fn optional_value(&self, label: &str) -> Result<Option<&'a str>, ParseError> {
        let Some(child) = self.children(label).next() else {
            return Ok(None);
        };
        child
            .atoms()
            .next()
            .map(Some)
            .ok_or_else(|| ParseError::MissingValue(label.to_owned()))
    }

    pub fn children<'b, 'c>(&'b self, label: &'c str) -> LabeledChildIterator<'a, 'b, 'c> {
        let iter = match self {
            SExpr::Atom(_) => None,
            SExpr::SExpr(_, children) => Some(children.iter()),
        };
        LabeledChildIterator { iter, label }
    }

    pub fn child<'b>(&self, label: &'b str) -> Result<&SExpr<'a>, ParseError> {
        let mut iter = self.children(label);
        iter.next()
            .ok_or(ParseError::MissingChild(label.to_owned()))
    }
}

#[derive(Debug)]
pub struct LabeledChildIterator<'a, 'b, 'c> {
    iter: Option<std::slice::Iter<'b, SExpr<'a>>>,
    label: &'c str,
}

impl<'a, 'b, 'c> Iterator for LabeledChildIterator<'a, 'b, 'c> {
    type Item = &'b SExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let label = self.label;
        self.iter
            .as_mut()?
            .find(|item| matches!(item, SExpr::SExpr(l, _) if *l == label))
    }
}
