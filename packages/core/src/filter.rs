//! Filter: guard a handler's reads and writes with test predicates.
//!
//! A failing read test short-circuits the read and yields [`MISSING`]; a
//! failing write test skips the write. Writes of `MISSING` itself are always
//! skipped. Neither case is an error.
//!
//! Filters compose by wrapping: the outer filter's tests run first, in
//! declaration order, and only if they all pass is the inner filter consulted.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::handler::{Handler, HandlerRef};
use crate::{Result, Value, MISSING};

type ReadTestFn = dyn Fn(&Path) -> bool + Send + Sync;
type WriteTestFn = dyn Fn(&Path, &Value, bool) -> bool + Send + Sync;

/// A labelled predicate over the path passed to `read`.
#[derive(Clone)]
pub struct ReadTest {
    label: String,
    test: Arc<ReadTestFn>,
}

impl ReadTest {
    pub fn new<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            test: Arc::new(test),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn check(&self, path: &Path) -> bool {
        (self.test)(path)
    }
}

impl fmt::Debug for ReadTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadTest").field(&self.label).finish()
    }
}

/// A labelled predicate over the arguments passed to `write`:
/// the path, the data and the overwrite flag.
#[derive(Clone)]
pub struct WriteTest {
    label: String,
    test: Arc<WriteTestFn>,
}

impl WriteTest {
    pub fn new<F>(label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Path, &Value, bool) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            test: Arc::new(test),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn check(&self, path: &Path, data: &Value, overwrite_ok: bool) -> bool {
        (self.test)(path, data, overwrite_ok)
    }
}

impl fmt::Debug for WriteTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WriteTest").field(&self.label).finish()
    }
}

/// Read only paths that exist.
pub fn path_exists() -> ReadTest {
    ReadTest::new("path exists", |path| path.exists())
}

/// Read only relative paths.
pub fn path_is_relative() -> ReadTest {
    ReadTest::new("path is relative", |path| path.is_relative())
}

/// Write only when the destination does not exist yet, whatever the
/// overwrite flag says.
pub fn destination_absent() -> WriteTest {
    WriteTest::new("destination absent", |path, _, _| !path.exists())
}

/// A handler whose reads and writes are guarded by test predicates.
#[derive(Clone)]
pub struct Filter {
    inner: HandlerRef,
    read_tests: Vec<ReadTest>,
    write_tests: Vec<WriteTest>,
    warn: bool,
}

impl Filter {
    /// Wrap a handler with no tests. Only `MISSING` writes are skipped.
    pub fn new<H: Handler + 'static>(inner: H) -> Self {
        Self::wrap(Arc::new(inner))
    }

    /// Wrap a shared handler with no tests.
    pub fn wrap(inner: HandlerRef) -> Self {
        Self {
            inner,
            read_tests: Vec::new(),
            write_tests: Vec::new(),
            warn: false,
        }
    }

    /// The `filter_missing` specialization: reads of absent paths yield
    /// `MISSING`, writes of `MISSING` are skipped.
    pub fn missing(inner: HandlerRef) -> Self {
        Self::wrap(inner).with_read_test(path_exists())
    }

    #[must_use]
    pub fn with_read_test(mut self, test: ReadTest) -> Self {
        self.read_tests.push(test);
        self
    }

    #[must_use]
    pub fn read_if<F>(self, label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Path) -> bool + Send + Sync + 'static,
    {
        self.with_read_test(ReadTest::new(label, test))
    }

    #[must_use]
    pub fn with_write_test(mut self, test: WriteTest) -> Self {
        self.write_tests.push(test);
        self
    }

    #[must_use]
    pub fn write_if<F>(self, label: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Path, &Value, bool) -> bool + Send + Sync + 'static,
    {
        self.with_write_test(WriteTest::new(label, test))
    }

    /// Emit a warning whenever a read or write is filtered out.
    #[must_use]
    pub fn warn(mut self, warn: bool) -> Self {
        self.warn = warn;
        self
    }

    pub fn inner(&self) -> &HandlerRef {
        &self.inner
    }

    pub fn read_tests(&self) -> &[ReadTest] {
        &self.read_tests
    }

    pub fn write_tests(&self) -> &[WriteTest] {
        &self.write_tests
    }

    pub fn into_ref(self) -> HandlerRef {
        Arc::new(self)
    }

    fn failed_read_test(&self, path: &Path) -> Option<&ReadTest> {
        self.read_tests.iter().find(|test| !test.check(path))
    }

    fn failed_write_test(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Option<&str> {
        if data.is_missing() {
            return Some("data is not MISSING");
        }
        self.write_tests
            .iter()
            .find(|test| !test.check(path, data, overwrite_ok))
            .map(WriteTest::label)
    }
}

impl Handler for Filter {
    fn read(&self, path: &Path) -> Result<Value> {
        if let Some(test) = self.failed_read_test(path) {
            if self.warn {
                log::warn!(
                    "read('{}') filtered out by test '{}'; returning MISSING",
                    path.display(),
                    test.label()
                );
            }
            return Ok(MISSING);
        }
        self.inner.read(path)
    }

    fn write(&self, path: &Path, data: &Value, overwrite_ok: bool) -> Result<()> {
        if let Some(label) = self.failed_write_test(path, data, overwrite_ok) {
            if self.warn {
                log::warn!(
                    "write('{}') filtered out by test '{}'; skipping",
                    path.display(),
                    label
                );
            }
            return Ok(());
        }
        self.inner.write(path, data, overwrite_ok)
    }

    fn name(&self) -> String {
        format!("Filter({})", self.inner.name())
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("inner", &self.inner.name())
            .field("read_tests", &self.read_tests)
            .field("write_tests", &self.write_tests)
            .field("warn", &self.warn)
            .finish()
    }
}

/// Shorthand for [`Filter::missing`] as a shared handler.
pub fn filter_missing(inner: HandlerRef, warn: bool) -> HandlerRef {
    Filter::missing(inner).warn(warn).into_ref()
}
