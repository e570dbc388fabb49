//! Address expressions
//!
//! A tiny language for walking pointer chains:
//!
//! ```text
//! [[Ruleset + 0x68] + 0x38] + 0x64
//! ```
//!
//! Brackets dereference a 4-byte pointer, `+` and `-` add offsets, and
//! identifiers are looked up through a [`VariableResolver`] when the
//! expression is evaluated. Expressions are parsed once and evaluated on every
//! read.

mod lexer;
mod parser;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// How deep derived variables may nest before evaluation gives up
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Literal(i64),
    Variable(String),
    Deref(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Deref(inner) => inner.collect_variables(out),
            Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
        }
    }

    fn eval<R: VariableResolver + ?Sized>(
        &self,
        resolver: &R,
        deref: &mut dyn FnMut(i64) -> Result<i64>,
        depth: usize,
    ) -> Result<i64> {
        match self {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(name) => match resolver.resolve(name) {
                None => Err(Error::UnknownVariable(name.clone())),
                Some(Binding::Unresolved) => Err(Error::UnresolvedAddress(name.clone())),
                Some(Binding::Value(value)) => Ok(value),
                Some(Binding::Expression(derived)) => {
                    if depth >= MAX_DEPTH {
                        return Err(Error::RecursiveVariable(name.clone()));
                    }
                    derived.root.eval(resolver, deref, depth + 1)
                }
            },
            Expr::Deref(inner) => {
                let address = inner.eval(resolver, deref, depth)?;
                deref(address)
            }
            Expr::Add(lhs, rhs) => {
                let lhs = lhs.eval(resolver, deref, depth)?;
                let rhs = rhs.eval(resolver, deref, depth)?;
                Ok(lhs.wrapping_add(rhs))
            }
            Expr::Sub(lhs, rhs) => {
                let lhs = lhs.eval(resolver, deref, depth)?;
                let rhs = rhs.eval(resolver, deref, depth)?;
                Ok(lhs.wrapping_sub(rhs))
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) if *value < 10 && *value > -10 => write!(f, "{}", value),
            Expr::Literal(value) if *value < 0 => write!(f, "-0x{:X}", value.unsigned_abs()),
            Expr::Literal(value) => write!(f, "0x{:X}", value),
            Expr::Variable(name) => f.write_str(name),
            Expr::Deref(inner) => write!(f, "[{}]", inner),
            Expr::Add(lhs, rhs) => write!(f, "{} + {}", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "{} - {}", lhs, rhs),
        }
    }
}

/// A parsed address expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressExpr {
    source: String,
    root: Expr,
}

impl AddressExpr {
    pub fn parse(source: &str) -> Result<Self> {
        let root = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// The text this expression was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// Identifiers referenced by this expression, in order of first use
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.root.collect_variables(&mut out);
        out
    }

    /// Evaluate the expression.
    ///
    /// `deref` is called with the value inside each pair of brackets, after
    /// everything inside them has been evaluated, and returns the pointer
    /// stored there. Arithmetic wraps.
    pub fn evaluate<R, F>(&self, resolver: &R, mut deref: F) -> Result<i64>
    where
        R: VariableResolver + ?Sized,
        F: FnMut(i64) -> Result<i64>,
    {
        self.root.eval(resolver, &mut deref, 0)
    }
}

impl fmt::Display for AddressExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

impl FromStr for AddressExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// What an identifier is bound to
#[derive(Debug, Clone, Copy)]
pub enum Binding<'a> {
    Value(i64),
    /// Evaluate this expression in its place
    Expression(&'a AddressExpr),
    /// Declared, but no address is known yet
    Unresolved,
}

/// Looks up identifiers during evaluation.
///
/// Returning `None` means the name is not declared at all.
pub trait VariableResolver {
    fn resolve(&self, name: &str) -> Option<Binding<'_>>;
}

impl<T: VariableResolver + ?Sized> VariableResolver for &T {
    fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        (**self).resolve(name)
    }
}

impl VariableResolver for HashMap<String, i64> {
    fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        self.get(name).copied().map(Binding::Value)
    }
}

impl VariableResolver for BTreeMap<String, i64> {
    fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        self.get(name).copied().map(Binding::Value)
    }
}

impl VariableResolver for HashMap<String, AddressExpr> {
    fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        self.get(name).map(Binding::Expression)
    }
}
