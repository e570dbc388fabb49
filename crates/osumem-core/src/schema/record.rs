use std::fmt;

use super::AddressSchema;
use crate::error::{Error, Result};
use crate::expr::AddressExpr;
use crate::memory::{FieldValue, Shape, Value};

type Assign<R> = Box<dyn Fn(&mut R, Value) -> Result<()> + Send + Sync>;

/// One expression-backed field of a record
pub struct RecordField<R> {
    name: &'static str,
    expr: AddressExpr,
    shape: Shape,
    assign: Assign<R>,
}

impl<R> RecordField<R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn expr(&self) -> &AddressExpr {
        &self.expr
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Store a decoded value into `record`
    pub fn assign(&self, record: &mut R, value: Value) -> Result<()> {
        (self.assign)(record, value)
    }
}

impl<R> fmt::Debug for RecordField<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordField")
            .field("name", &self.name)
            .field("expr", &self.expr.source())
            .field("shape", &self.shape)
            .finish()
    }
}

/// Field table for a record type
///
/// Fields are read in declaration order. Each field's [`Shape`] comes from
/// the Rust type of the struct member it writes to.
pub struct RecordSchema<R> {
    name: &'static str,
    fields: Vec<RecordField<R>>,
}

impl<R: 'static> RecordSchema<R> {
    pub fn builder(name: &'static str) -> RecordSchemaBuilder<R> {
        RecordSchemaBuilder {
            name,
            fields: Vec::new(),
            error: None,
        }
    }
}

impl<R> RecordSchema<R> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[RecordField<R>] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&RecordField<R>> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check every field expression against the addresses it may use
    pub fn validate(&self, addresses: &AddressSchema) -> Result<()> {
        for field in &self.fields {
            addresses.check_expr(&field.expr).map_err(|e| {
                Error::InvalidSchema(format!("{}.{}: {}", self.name, field.name, e))
            })?;
        }
        Ok(())
    }
}

impl<R> fmt::Debug for RecordSchema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

pub struct RecordSchemaBuilder<R> {
    name: &'static str,
    fields: Vec<RecordField<R>>,
    error: Option<Error>,
}

impl<R: 'static> RecordSchemaBuilder<R> {
    /// Declare a field read from `expr` and stored through `slot`
    pub fn field<T, F>(mut self, name: &'static str, expr: &str, slot: F) -> Self
    where
        T: FieldValue + 'static,
        F: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        if self.fields.iter().any(|f| f.name == name) {
            self.error = Some(Error::InvalidSchema(format!(
                "{}.{} is declared twice",
                self.name, name
            )));
            return self;
        }

        let expr = match AddressExpr::parse(expr) {
            Ok(expr) => expr,
            Err(e) => {
                self.error = Some(Error::InvalidSchema(format!("{}.{}: {}", self.name, name, e)));
                return self;
            }
        };

        let assign: Assign<R> = Box::new(move |record, value| {
            let shape = value.shape();
            let value = T::from_value(value).ok_or_else(|| Error::ShapeMismatch {
                field: name.to_string(),
                shape: shape.to_string(),
            })?;
            *slot(record) = value;
            Ok(())
        });

        self.fields.push(RecordField {
            name,
            expr,
            shape: T::SHAPE,
            assign,
        });
        self
    }

    pub fn build(self) -> Result<RecordSchema<R>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(RecordSchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// A struct that can be populated from process memory
pub trait Record: Default + Sized + 'static {
    fn schema() -> Result<RecordSchema<Self>>;
}
