//! Incremental decoding of one huge top-level JSON array.
//!
//! Bulk exports are a single array of hundreds of thousands of objects. The
//! array is walked with serde_json's streaming deserializer and each element
//! is handed over as an owned raw fragment, so only one element is held at a
//! time. Callers parse fragments into typed records themselves.

use std::fmt;
use std::io::Read;

use serde::Deserializer as _;
use serde::de::{self, SeqAccess, Visitor};
use serde_json::value::RawValue;

/// Failure while walking a JSON array.
#[derive(Debug)]
pub enum ArrayError<E> {
    /// Malformed JSON, truncated stream or underlying I/O error
    Decode(serde_json::Error),
    /// The element handler asked to stop
    Element(E),
}

impl<E: fmt::Display> fmt::Display for ArrayError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) if e.is_io() => write!(f, "stream: {e}"),
            Self::Decode(e) => write!(f, "decode: {e}"),
            Self::Element(e) => write!(f, "{e}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for ArrayError<E> {}

/// Feed every element of the array in `reader` to `on_element`.
///
/// Returns the number of elements visited. Trailing non-whitespace after the
/// closing bracket is a decode error.
pub fn for_each_element<R, E, F>(reader: R, mut on_element: F) -> Result<usize, ArrayError<E>>
where
    R: Read,
    F: FnMut(Box<RawValue>) -> Result<(), E>,
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    let mut failure = None;
    let visitor = ElementVisitor {
        on_element: &mut on_element,
        failure: &mut failure,
    };

    match (&mut de).deserialize_seq(visitor) {
        Ok(count) => {
            de.end().map_err(ArrayError::Decode)?;
            Ok(count)
        }
        Err(e) => match failure {
            Some(handler_err) => Err(ArrayError::Element(handler_err)),
            None => Err(ArrayError::Decode(e)),
        },
    }
}

struct ElementVisitor<'a, F, E> {
    on_element: &'a mut F,
    failure: &'a mut Option<E>,
}

impl<'de, F, E> Visitor<'de> for ElementVisitor<'_, F, E>
where
    F: FnMut(Box<RawValue>) -> Result<(), E>,
{
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<usize, A::Error> {
        let mut count = 0usize;
        while let Some(raw) = seq.next_element::<Box<RawValue>>()? {
            count += 1;
            if let Err(e) = (self.on_element)(raw) {
                *self.failure = Some(e);
                return Err(de::Error::custom("element handler failed"));
            }
        }
        Ok(count)
    }
}
