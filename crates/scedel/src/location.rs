//! Facilities for working with locations inside validated JSON documents.
//!
//! Locations are rendered in the Scedel path grammar: `$` for the root,
//! `.field` for record fields and dictionary values, `[idx]` for array
//! items and `.{key:k}` for dictionary keys.
use std::fmt::{self, Write};

/// A single step from a value to one of its children.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LocationSegment<'a> {
    /// Record field or dictionary value access.
    Field(&'a str),
    /// Index within a JSON array.
    Index(usize),
    /// A dictionary key, validated against the dictionary's key type.
    Key(&'a str),
}

/// A node in a parent-linked list built while the matcher descends into the
/// instance.
///
/// The linked list lives on the call stack, so extending a location while
/// recursing does not allocate. Rendering walks the chain once, which only
/// happens when an error is actually reported.
#[derive(Copy, Clone, Debug)]
pub struct LazyLocation<'a, 'b> {
    pub(crate) segment: LocationSegment<'a>,
    pub(crate) parent: Option<&'b LazyLocation<'b, 'a>>,
}

impl Default for LazyLocation<'_, '_> {
    fn default() -> Self {
        LazyLocation::new()
    }
}

impl<'a, 'b> LazyLocation<'a, 'b> {
    /// Create a root location (`$`).
    pub const fn new() -> Self {
        LazyLocation {
            // The value does not matter, the root segment is never rendered
            segment: LocationSegment::Index(0),
            parent: None,
        }
    }

    /// Extend the location with one more segment.
    #[inline]
    pub fn push(&'a self, segment: impl Into<LocationSegment<'a>>) -> Self {
        LazyLocation {
            segment: segment.into(),
            parent: Some(self),
        }
    }

    fn to_vec(&self) -> Vec<LocationSegment<'_>> {
        let mut capacity = 0;
        let mut head = self;
        while let Some(next) = head.parent {
            head = next;
            capacity += 1;
        }
        let mut buffer = Vec::with_capacity(capacity);
        let mut head = self;
        if head.parent.is_some() {
            buffer.push(head.segment);
        }
        while let Some(next) = head.parent {
            head = next;
            if head.parent.is_some() {
                buffer.push(head.segment);
            }
        }
        buffer.reverse();
        buffer
    }
}

impl fmt::Display for LazyLocation<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('$')?;
        for segment in self.to_vec() {
            match segment {
                LocationSegment::Field(name) => {
                    f.write_char('.')?;
                    f.write_str(name)?;
                }
                LocationSegment::Index(idx) => {
                    f.write_char('[')?;
                    f.write_str(itoa::Buffer::new().format(idx))?;
                    f.write_char(']')?;
                }
                LocationSegment::Key(name) => {
                    f.write_str(".{key:")?;
                    f.write_str(name)?;
                    f.write_char('}')?;
                }
            }
        }
        Ok(())
    }
}

impl From<&LazyLocation<'_, '_>> for String {
    #[inline]
    fn from(location: &LazyLocation<'_, '_>) -> Self {
        location.to_string()
    }
}

impl<'a> From<&'a str> for LocationSegment<'a> {
    #[inline]
    fn from(value: &'a str) -> LocationSegment<'a> {
        LocationSegment::Field(value)
    }
}

impl From<usize> for LocationSegment<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        LocationSegment::Index(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{LazyLocation, LocationSegment};

    #[test]
    fn root_renders_as_dollar() {
        assert_eq!(LazyLocation::new().to_string(), "$");
    }

    #[test]
    fn segments_render_in_traversal_order() {
        let root = LazyLocation::new();
        let items = root.push("items");
        let first = items.push(0);
        let name = first.push("name");
        assert_eq!(name.to_string(), "$.items[0].name");
    }

    #[test]
    fn dictionary_keys_use_the_key_form() {
        let root = LazyLocation::new();
        let meta = root.push("meta");
        let key = meta.push(LocationSegment::Key("priority"));
        assert_eq!(key.to_string(), "$.meta.{key:priority}");
    }
}
