//! Incremental JSON object writer.
//!
//! Emits `{"key":[...],...}` one value at a time without building the
//! document in memory. Separators and closing brackets are written by the
//! writer itself: a section is closed when its closure returns, and the
//! object is closed by [`JsonDocumentWriter::finish`], which is the only way
//! to get the inner writer back.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::ExportError;

pub struct JsonDocumentWriter<W: Write> {
    inner: W,
    entries: usize,
}

impl<W: Write> JsonDocumentWriter<W> {
    /// Open the document.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the opening brace cannot be written.
    pub fn new(mut inner: W) -> Result<Self, ExportError> {
        inner.write_all(b"{")?;
        Ok(Self { inner, entries: 0 })
    }

    /// Write `"key":[ ... ]`, letting `fill` push the elements.
    /// Returns the number of elements pushed.
    ///
    /// # Errors
    ///
    /// Propagates the first error from `fill` or from the writer. The
    /// document is then unusable; callers abandon the underlying file.
    pub fn section<F>(&mut self, key: &str, fill: F) -> Result<u64, ExportError>
    where
        F: FnOnce(&mut ArrayWriter<'_, W>) -> Result<(), ExportError>,
    {
        self.key(key)?;
        self.inner.write_all(b"[")?;
        let mut array = ArrayWriter {
            inner: &mut self.inner,
            len: 0,
        };
        fill(&mut array)?;
        let len = array.len;
        if len > 0 {
            self.inner.write_all(b"\n")?;
        }
        self.inner.write_all(b"]")?;
        Ok(len)
    }

    /// Write the trailing `"metadata"` entry, close the object, and return
    /// the inner writer.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError`] if serialization or the write fails.
    pub fn finish<M: Serialize>(mut self, metadata: &M) -> Result<W, ExportError> {
        self.key("metadata")?;
        serde_json::to_writer(&mut self.inner, metadata)?;
        self.inner.write_all(b"\n}\n")?;
        Ok(self.inner)
    }

    fn key(&mut self, key: &str) -> Result<(), ExportError> {
        let separator: &[u8] = if self.entries == 0 { b"\n" } else { b",\n" };
        self.inner.write_all(separator)?;
        serde_json::to_writer(&mut self.inner, key)?;
        self.inner.write_all(b":")?;
        self.entries += 1;
        Ok(())
    }
}

/// Element writer for one open array.
pub struct ArrayWriter<'a, W: Write> {
    inner: &'a mut W,
    len: u64,
}

impl<W: Write> ArrayWriter<'_, W> {
    /// Append one element on its own line.
    ///
    /// Objects are encoded field by field: a field whose value fails to
    /// serialize is written as its string form instead of failing the element.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Io`] if the write fails.
    pub fn push(&mut self, value: &Value) -> Result<(), ExportError> {
        let encoded = encode_value(value)?;
        let separator: &[u8] = if self.len == 0 { b"\n" } else { b",\n" };
        self.inner.write_all(separator)?;
        self.inner.write_all(&encoded)?;
        self.len += 1;
        Ok(())
    }

    #[must_use]
    pub const fn len(&self) -> u64 {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Encode into a buffer first so a failed element leaves no partial bytes.
fn encode_value(value: &Value) -> Result<Vec<u8>, ExportError> {
    let Value::Object(fields) = value else {
        return encode_field(value);
    };

    let mut buf = Vec::with_capacity(64);
    buf.push(b'{');
    for (i, (key, field)) in fields.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        serde_json::to_writer(&mut buf, key)?;
        buf.push(b':');
        buf.extend_from_slice(&encode_field(field)?);
    }
    buf.push(b'}');
    Ok(buf)
}

fn encode_field(value: &Value) -> Result<Vec<u8>, ExportError> {
    match serde_json::to_vec(value) {
        Ok(bytes) => Ok(bytes),
        Err(error) => {
            tracing::warn!(%error, "field not serializable; writing string form");
            Ok(serde_json::to_vec(&value.to_string())?)
        }
    }
}
