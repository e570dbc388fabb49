use std::collections::{BTreeMap, HashMap};

use crate::error::{Error, Result};
use crate::expr::{AddressExpr, Binding, VariableResolver};
use crate::signature::Pattern;

/// How a named address is obtained
#[derive(Debug, Clone)]
pub enum AddressKind {
    /// Found once by scanning for a signature
    Signature(Pattern),
    /// Computed from other addresses on every evaluation
    Derived(AddressExpr),
}

#[derive(Debug, Clone)]
pub struct AddressEntry {
    name: String,
    kind: AddressKind,
}

impl AddressEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &AddressKind {
        &self.kind
    }
}

/// The set of named addresses record expressions may refer to
///
/// Built through [`AddressSchemaBuilder`], which rejects bad patterns, bad
/// expressions, duplicate names, references to undeclared names and cycles
/// among derived addresses.
#[derive(Debug, Clone)]
pub struct AddressSchema {
    entries: Vec<AddressEntry>,
    index: HashMap<String, usize>,
}

impl AddressSchema {
    pub fn builder() -> AddressSchemaBuilder {
        AddressSchemaBuilder::default()
    }

    /// All entries in declaration order
    pub fn entries(&self) -> &[AddressEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&AddressKind> {
        self.index.get(name).map(|&i| &self.entries[i].kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn signatures(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.entries.iter().filter_map(|e| match &e.kind {
            AddressKind::Signature(pattern) => Some((e.name.as_str(), pattern)),
            AddressKind::Derived(_) => None,
        })
    }

    pub fn derived(&self) -> impl Iterator<Item = (&str, &AddressExpr)> {
        self.entries.iter().filter_map(|e| match &e.kind {
            AddressKind::Derived(expr) => Some((e.name.as_str(), expr)),
            AddressKind::Signature(_) => None,
        })
    }

    /// Check that every identifier in `expr` names an entry
    pub fn check_expr(&self, expr: &AddressExpr) -> Result<()> {
        for name in expr.variables() {
            if !self.contains(name) {
                return Err(Error::InvalidSchema(format!(
                    "'{}' refers to undeclared address {}",
                    expr.source(),
                    name
                )));
            }
        }
        Ok(())
    }

    fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit<'a>(
            schema: &'a AddressSchema,
            name: &'a str,
            marks: &mut HashMap<&'a str, Mark>,
            path: &mut Vec<&'a str>,
        ) -> Result<()> {
            match marks.get(name) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    path.push(name);
                    return Err(Error::InvalidSchema(format!(
                        "derived addresses form a cycle: {}",
                        path.join(" -> ")
                    )));
                }
                None => {}
            }

            if let Some(AddressKind::Derived(expr)) = schema.get(name) {
                marks.insert(name, Mark::Visiting);
                path.push(name);
                for dep in expr.variables() {
                    visit(schema, dep, marks, path)?;
                }
                path.pop();
            }
            marks.insert(name, Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for (name, _) in self.derived() {
            visit(self, name, &mut marks, &mut Vec::new())?;
        }
        Ok(())
    }
}

#[derive(Debug)]
enum Declaration {
    Signature(String),
    Derived(String),
}

/// Collects declarations; nothing is compiled until [`build`](Self::build)
#[derive(Debug, Default)]
pub struct AddressSchemaBuilder {
    declarations: Vec<(String, Declaration)>,
}

impl AddressSchemaBuilder {
    pub fn signature(mut self, name: impl Into<String>, signature: impl Into<String>) -> Self {
        self.declarations
            .push((name.into(), Declaration::Signature(signature.into())));
        self
    }

    pub fn derived(mut self, name: impl Into<String>, expr: impl Into<String>) -> Self {
        self.declarations
            .push((name.into(), Declaration::Derived(expr.into())));
        self
    }

    pub fn build(self) -> Result<AddressSchema> {
        let mut entries = Vec::with_capacity(self.declarations.len());
        let mut index = HashMap::new();

        for (name, declaration) in self.declarations {
            if index.contains_key(&name) {
                return Err(Error::InvalidSchema(format!("address {} is declared twice", name)));
            }
            let kind = match declaration {
                Declaration::Signature(source) => {
                    AddressKind::Signature(Pattern::compile(&source).map_err(|e| {
                        Error::InvalidSchema(format!("signature {}: {}", name, e))
                    })?)
                }
                Declaration::Derived(source) => {
                    AddressKind::Derived(AddressExpr::parse(&source).map_err(|e| {
                        Error::InvalidSchema(format!("derived address {}: {}", name, e))
                    })?)
                }
            };
            index.insert(name.clone(), entries.len());
            entries.push(AddressEntry { name, kind });
        }

        let schema = AddressSchema { entries, index };
        for (_, expr) in schema.derived() {
            schema.check_expr(expr)?;
        }
        schema.check_cycles()?;
        Ok(schema)
    }
}

/// Resolved signature addresses for one process
///
/// Acts as the [`VariableResolver`] for record expressions: resolved
/// signatures evaluate to their address, derived entries to their
/// expression, and unresolved signatures fail with
/// [`Error::UnresolvedAddress`].
#[derive(Debug, Clone)]
pub struct AddressTable {
    schema: AddressSchema,
    resolved: BTreeMap<String, u64>,
}

impl AddressTable {
    pub fn new(schema: AddressSchema) -> Self {
        Self {
            schema,
            resolved: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &AddressSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.resolved.get(name).copied()
    }

    /// Record the address of a signature entry
    pub fn set(&mut self, name: &str, address: u64) -> Result<()> {
        match self.schema.get(name) {
            Some(AddressKind::Signature(_)) => {
                self.resolved.insert(name.to_string(), address);
                Ok(())
            }
            Some(AddressKind::Derived(_)) => Err(Error::InvalidSchema(format!(
                "{} is derived and cannot be assigned",
                name
            ))),
            None => Err(Error::UnknownVariable(name.to_string())),
        }
    }

    /// Forget a resolved address
    pub fn remove(&mut self, name: &str) -> Option<u64> {
        self.resolved.remove(name)
    }

    pub fn is_resolved(&self, name: &str) -> bool {
        self.resolved.contains_key(name)
    }

    /// Signature entries that have no address yet, in declaration order
    pub fn unresolved(&self) -> Vec<&str> {
        self.schema
            .signatures()
            .map(|(name, _)| name)
            .filter(|name| !self.resolved.contains_key(*name))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved().is_empty()
    }

    pub fn resolved(&self) -> &BTreeMap<String, u64> {
        &self.resolved
    }

    pub fn clear(&mut self) {
        self.resolved.clear();
    }
}

impl VariableResolver for AddressTable {
    fn resolve(&self, name: &str) -> Option<Binding<'_>> {
        match self.schema.get(name)? {
            AddressKind::Signature(_) => Some(match self.resolved.get(name) {
                Some(&address) => Binding::Value(address as i64),
                None => Binding::Unresolved,
            }),
            AddressKind::Derived(expr) => Some(Binding::Expression(expr)),
        }
    }
}
