//! Reading records from one attached process

use std::path::Path;

use tracing::{debug, trace, warn};

use crate::cache;
use crate::error::{AggregateError, FieldError, Result};
use crate::expr::AddressExpr;
use crate::memory::{MemoryReader, Process, Shape, Value};
use crate::schema::{AddressSchema, AddressTable, RecordSchema};
use crate::signature::Scanner;

/// A process together with the addresses resolved inside it
///
/// Signature addresses are found once by [`resolve_signatures`] and reused;
/// record fields are evaluated and decoded again on every [`read`].
///
/// [`resolve_signatures`]: Session::resolve_signatures
/// [`read`]: Session::read
pub struct Session<P: Process> {
    process: P,
    scanner: Scanner,
    addresses: AddressTable,
}

impl<P: Process> Session<P> {
    pub fn new(process: P, schema: AddressSchema) -> Self {
        Self {
            process,
            scanner: Scanner::default(),
            addresses: AddressTable::new(schema),
        }
    }

    pub fn with_scanner(mut self, scanner: Scanner) -> Self {
        self.scanner = scanner;
        self
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn into_process(self) -> P {
        self.process
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn reader(&self) -> MemoryReader<'_, P> {
        MemoryReader::new(&self.process)
    }

    pub fn addresses(&self) -> &AddressTable {
        &self.addresses
    }

    pub fn addresses_mut(&mut self) -> &mut AddressTable {
        &mut self.addresses
    }

    /// Scan for every signature address.
    ///
    /// Every signature is attempted even if an earlier one fails. Found
    /// addresses are stored; a signature that is not found loses any address
    /// it had. Returns the first failure.
    pub fn resolve_signatures(&mut self) -> Result<()> {
        self.resolve(false)
    }

    /// Scan only for signatures that have no address yet
    pub fn resolve_missing(&mut self) -> Result<()> {
        self.resolve(true)
    }

    fn resolve(&mut self, only_missing: bool) -> Result<()> {
        let results: Vec<(String, Result<u64>)> = self
            .addresses
            .schema()
            .signatures()
            .filter(|(name, _)| !only_missing || !self.addresses.is_resolved(name))
            .map(|(name, pattern)| {
                (
                    name.to_string(),
                    self.scanner.scan(&self.process, pattern),
                )
            })
            .collect();

        let mut first_error = None;
        for (name, result) in results {
            match result {
                Ok(address) => {
                    debug!("Resolved {} at {:#x}", name, address);
                    self.addresses.set(&name, address)?;
                }
                Err(e) => {
                    warn!("Failed to resolve {}: {}", name, e);
                    self.addresses.remove(&name);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Take signature addresses from the cache at `path` if it was written
    /// for this process. Returns how many were applied.
    pub fn load_cache(&mut self, path: &Path) -> usize {
        cache::try_apply_cached(path, &self.process, &mut self.addresses)
    }

    /// Forget every resolved address and delete the cache at `path`, so the
    /// next resolve scans again
    pub fn discard_cache(&mut self, path: &Path) {
        self.addresses.clear();
        cache::remove(path);
    }

    /// Write the resolved signature addresses to `path`
    pub fn save_cache(&self, path: &Path) {
        cache::save_table(path, &self.process, &self.addresses);
    }

    /// Evaluate an expression against the resolved addresses
    pub fn evaluate(&self, expr: &AddressExpr) -> Result<u64> {
        self.reader().evaluate(expr, &self.addresses)
    }

    /// Evaluate an expression and decode `shape` at the result
    pub fn read_value(&self, expr: &AddressExpr, shape: Shape) -> Result<Value> {
        let address = self.evaluate(expr)?;
        self.reader().read_value(address, shape)
    }

    /// Populate `record` from memory.
    ///
    /// Fields are read in declaration order. A field that fails keeps its
    /// previous value and is reported in the returned [`AggregateError`];
    /// the remaining fields are still read.
    pub fn read<R>(
        &self,
        schema: &RecordSchema<R>,
        record: &mut R,
    ) -> std::result::Result<(), AggregateError> {
        let mut failures = Vec::new();

        for field in schema.fields() {
            let result = self
                .read_value(field.expr(), field.shape())
                .and_then(|value| field.assign(record, value));
            if let Err(source) = result {
                trace!("{}.{} failed: {}", schema.name(), field.name(), source);
                failures.push(FieldError {
                    field: field.name(),
                    source,
                });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(schema.name(), failures))
        }
    }
}

impl<P: Process> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("pid", &self.process.pid())
            .field("scanner", &self.scanner)
            .field("addresses", &self.addresses.resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::cache::AddressCache;
    use crate::error::Error;
    use crate::memory::{MockProcess, MockProcessBuilder};
    use crate::schema::Record;

    const SIG: &str = "00 20 00 00 C3 A1 ?? ??";

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        base: u32,
        misses: i16,
    }

    impl Record for Counter {
        fn schema() -> Result<RecordSchema<Self>> {
            RecordSchema::builder("Counter")
                .field("base", "Base", |r: &mut Counter| &mut r.base)
                .field("misses", "[[Base] + 0x92]", |r: &mut Counter| &mut r.misses)
                .build()
        }
    }

    fn addresses() -> AddressSchema {
        AddressSchema::builder()
            .signature("Base", SIG)
            .derived("Beatmap", "[Base - 0xC]")
            .build()
            .unwrap()
    }

    /// Base at 0x1010 holds 0x2000; 0x2092 points at the miss counter
    fn process() -> MockProcess {
        MockProcessBuilder::new()
            .region(0x1000, 0x100)
            .region(0x2000, 0x100)
            .region(0x3000, 0x100)
            .write_bytes(0x1000, &[0xFF; 0x10])
            .write_bytes(0x1010, &[0x00, 0x20, 0x00, 0x00, 0xC3, 0xA1, 0x12, 0x34])
            .write_ptr(0x2092, 0x3000)
            .write(0x3000, 7i16)
            .build()
    }

    #[test]
    fn test_end_to_end_read() {
        let mut session = Session::new(process(), addresses());
        session.resolve_signatures().unwrap();
        assert_eq!(session.addresses().get("Base"), Some(0x1010));

        let schema = Counter::schema().unwrap();
        schema.validate(session.addresses().schema()).unwrap();

        let mut counter = Counter::default();
        session.read(&schema, &mut counter).unwrap();
        assert_eq!(
            counter,
            Counter {
                base: 0x2000,
                misses: 7
            }
        );
    }

    #[derive(Debug, Default)]
    struct Three {
        first: i16,
        second: i16,
        third: String,
    }

    #[test]
    fn test_read_collects_field_failures() {
        let process = MockProcessBuilder::new()
            .region(0x1000, 0x100)
            .write(0x1000, 11i16)
            .write_ptr(0x1004, 0xDEAD_0000)
            .write_string(0x1040, "ok")
            .write_ptr(0x1008, 0x1040)
            .build();
        let schema = RecordSchema::builder("Three")
            .field("first", "0x1000", |r: &mut Three| &mut r.first)
            .field("second", "[0x1004]", |r: &mut Three| &mut r.second)
            .field("third", "[0x1008]", |r: &mut Three| &mut r.third)
            .build()
            .unwrap();
        let session = Session::new(process, AddressSchema::builder().build().unwrap());

        let mut record = Three {
            second: -1,
            ..Default::default()
        };
        let err = session.read(&schema, &mut record).unwrap_err();

        assert_eq!(record.first, 11);
        assert_eq!(record.second, -1);
        assert_eq!(record.third, "ok");
        assert_eq!(err.record(), "Three");
        assert_eq!(err.fields().collect::<Vec<_>>(), vec!["second"]);
        assert!(err.failures()[0].source.is_memory_fault());
    }

    #[test]
    fn test_read_before_resolve_is_unresolved() {
        let session = Session::new(process(), addresses());
        let schema = Counter::schema().unwrap();

        let err = session.read(&schema, &mut Counter::default()).unwrap_err();
        assert_eq!(err.len(), 2);
        assert!(err
            .failures()
            .iter()
            .all(|f| matches!(f.source, Error::UnresolvedAddress(_))));
    }

    #[test]
    fn test_resolve_keeps_going_after_failure() {
        let schema = AddressSchema::builder()
            .signature("Missing", "0A D7 23 3C")
            .signature("Base", SIG)
            .signature("AlsoMissing", "75 21 8B 1D")
            .build()
            .unwrap();
        let mut session = Session::new(process(), schema);

        let err = session.resolve_signatures().unwrap_err();
        assert!(matches!(err, Error::PatternNotFound(ref source) if source == "0A D7 23 3C"));
        assert_eq!(session.addresses().get("Base"), Some(0x1010));
        assert_eq!(session.addresses().unresolved(), vec!["Missing", "AlsoMissing"]);
    }

    #[test]
    fn test_resolve_missing_only_scans_unresolved() {
        let mut session = Session::new(process(), addresses());
        // A stale address that a full rescan would overwrite
        session.addresses_mut().set("Base", 0x1234).unwrap();

        session.resolve_missing().unwrap();
        assert_eq!(session.addresses().get("Base"), Some(0x1234));

        session.resolve_signatures().unwrap();
        assert_eq!(session.addresses().get("Base"), Some(0x1010));
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let mut session = Session::new(process(), addresses());
        session.resolve_signatures().unwrap();

        let expr = AddressExpr::parse("[[Base] + 0x92]").unwrap();
        let first = session.evaluate(&expr).unwrap();
        let second = session.evaluate(&expr).unwrap();
        assert_eq!(first, 0x3000);
        assert_eq!(first, second);
    }

    #[test]
    fn test_read_value_through_derived() {
        let mut session = Session::new(process(), addresses());
        session.resolve_signatures().unwrap();

        // Beatmap = [Base - 0xC] reads the 0xFF filler
        let expr = AddressExpr::parse("Beatmap").unwrap();
        assert_eq!(session.evaluate(&expr).unwrap(), 0xFFFF_FFFF);
    }

    #[test]
    fn test_cache_skips_scan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut session = Session::new(process(), addresses());
        assert_eq!(session.load_cache(&path), 0);
        session.resolve_signatures().unwrap();
        session.save_cache(&path);

        let mut reattached = Session::new(process(), addresses());
        assert_eq!(reattached.load_cache(&path), 1);
        assert!(reattached.addresses().is_complete());
        assert_eq!(reattached.addresses().get("Base"), Some(0x1010));
    }

    #[test]
    fn test_discarded_cache_forces_rescan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut session = Session::new(process(), addresses());
        let mut stale = BTreeMap::new();
        stale.insert("Base".to_string(), 0xDEAD_0000);
        AddressCache::new(
            session.process().pid(),
            session.process().executable_path().unwrap(),
            stale,
        )
        .save(&path)
        .unwrap();

        // A cache for the same process is trusted over scanning
        assert_eq!(session.load_cache(&path), 1);
        session.resolve_missing().unwrap();
        assert_eq!(session.addresses().get("Base"), Some(0xDEAD_0000));

        session.discard_cache(&path);
        assert!(!path.exists());
        assert_eq!(session.load_cache(&path), 0);
        session.resolve_missing().unwrap();
        assert_eq!(session.addresses().get("Base"), Some(0x1010));
    }
}
