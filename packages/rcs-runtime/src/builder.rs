//! Resource builder: writes one resource's binary layout into a stream.
//!
//! A root builder owns its stream. A nested builder checks the stream out of
//! its parent for as long as it is open and checks it back in when it is
//! built (or dropped unbuilt), so only one writer ever touches a stream.
//! The mutable borrow of the parent makes this a compile-time property for
//! safe code; the parent additionally tracks the checkout in its state and
//! panics if it is used while locked.

use std::fmt;
use std::io::Write;

use crate::error::{Result, RuntimeError};
use crate::reference::Ref;
use crate::stream::ResourceStream;
use crate::view::{ArrayView, RefArrayView, ResourceView, StringView};
use crate::wire::{Flat, OffsetType, SizeType, HEADER_WIDTH, OFFSET_WIDTH};

/// A stream handed from a parent builder to a nested one.
#[derive(Debug)]
pub struct StreamLease {
    stream: ResourceStream,
    parent_base: u32,
}

/// Something that can lend its stream to a nested builder.
///
/// Implemented by [`ResourceBuilder`] and by every generated builder.
pub trait StreamOwner {
    /// Hands the stream to a nested builder. The owner is locked until the
    /// lease comes back through [`StreamOwner::check_in`].
    fn check_out(&mut self) -> StreamLease;

    /// Takes the stream back from a finished nested builder.
    fn check_in(&mut self, lease: StreamLease);
}

/// Builder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Accepting writes
    Open,
    /// A nested builder holds the stream
    CheckedOut,
    /// `build()` has been called
    Built,
}

/// Writes a resource: `[u32 payload length][field slots][child data]`.
///
/// Offsets returned by the `create_*` methods are relative to this
/// resource's payload base and are turned into field-relative offsets when
/// stored with [`ResourceBuilder::store_ref`].
pub struct ResourceBuilder<'p> {
    parent: Option<&'p mut (dyn StreamOwner + 'p)>,
    stream: Option<ResourceStream>,
    root_offset: u32,
    parent_base: u32,
    fields_size: u32,
    state: BuilderState,
}

impl ResourceBuilder<'static> {
    /// Creates a root builder with `fields_size` bytes of field slots.
    pub fn new(fields_size: u32) -> Self {
        let mut stream = ResourceStream::with_capacity(fields_size as usize + HEADER_WIDTH);
        // An empty stream always has room for one resource header and its slots
        let root_offset = match stream.widen(fields_size as usize + HEADER_WIDTH) {
            Ok(offset) => offset,
            Err(_) => panic!("field slots of {fields_size} bytes exceed the 32-bit wire format"),
        };
        Self {
            parent: None,
            stream: Some(stream),
            root_offset,
            parent_base: 0,
            fields_size,
            state: BuilderState::Open,
        }
    }
}

impl<'p> ResourceBuilder<'p> {
    /// Creates a builder nested inside `parent`, taking over its stream.
    ///
    /// The parent cannot be written to until this builder is built or
    /// dropped.
    pub fn nested(parent: &'p mut (dyn StreamOwner + 'p), fields_size: u32) -> Result<Self> {
        let StreamLease {
            mut stream,
            parent_base,
        } = parent.check_out();

        match stream.widen(fields_size as usize + HEADER_WIDTH) {
            Ok(root_offset) => Ok(Self {
                parent: Some(parent),
                stream: Some(stream),
                root_offset,
                parent_base,
                fields_size,
                state: BuilderState::Open,
            }),
            Err(e) => {
                parent.check_in(StreamLease {
                    stream,
                    parent_base,
                });
                Err(e)
            }
        }
    }

    /// Returns `true` if this builder owns its stream outright.
    pub fn is_root(&self) -> bool {
        // the root resource always starts the stream
        self.root_offset == 0
    }

    /// Returns `true` if this builder borrowed its stream from a parent.
    pub fn is_nested(&self) -> bool {
        !self.is_root()
    }

    /// Returns `true` once `build()` has been called.
    pub fn is_built(&self) -> bool {
        self.state == BuilderState::Built
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Size of the fixed field slots in bytes.
    pub fn fields_size(&self) -> u32 {
        self.fields_size
    }

    /// Stream offset of the first byte after the length header.
    fn base(&self) -> u32 {
        self.root_offset + HEADER_WIDTH as u32
    }

    /// The stream, if this builder may write to it.
    ///
    /// # Panics
    /// Panics if the builder is built or a nested builder holds the stream.
    fn writable(&mut self) -> &mut ResourceStream {
        match self.state {
            BuilderState::Open => {}
            BuilderState::CheckedOut => {
                panic!("ResourceBuilder is locked while a nested builder holds its stream")
            }
            BuilderState::Built => panic!("ResourceBuilder::build() has already been called"),
        }
        let Some(stream) = self.stream.as_mut() else {
            panic!("open ResourceBuilder has no stream")
        };
        stream
    }

    /// Appends an array of inline values: `[u32 byte length][elements]`.
    pub fn create_array<T: Flat>(&mut self, data: &[T]) -> Result<Ref<ArrayView<'static, T>>> {
        let base = self.base();
        let byte_len = data
            .len()
            .checked_mul(T::WIDTH)
            .and_then(|len| SizeType::try_from(len).ok())
            .ok_or(RuntimeError::CapacityOverflow {
                operation: "create_array",
            })?;

        let stream = self.writable();
        let root = stream.write_value(&byte_len)?;
        let start = stream.widen(byte_len as usize)?;
        for (i, item) in data.iter().enumerate() {
            stream.patch(start + (i * T::WIDTH) as u32, item);
        }

        Ok(Ref::new(root - base))
    }

    /// Appends an array of references: `[u32 byte length][i32 slots]`.
    ///
    /// Every slot stores its target relative to the slot itself.
    pub fn create_array_of_refs<V>(
        &mut self,
        refs: &[Ref<V>],
    ) -> Result<Ref<RefArrayView<'static, V>>> {
        let base = self.base();
        let byte_len = refs
            .len()
            .checked_mul(OFFSET_WIDTH)
            .and_then(|len| SizeType::try_from(len).ok())
            .ok_or(RuntimeError::CapacityOverflow {
                operation: "create_array_of_refs",
            })?;

        let stream = self.writable();
        let root = stream.write_value(&byte_len)?;
        let first = stream.widen(byte_len as usize)?;
        for (i, target) in refs.iter().enumerate() {
            let slot = first + (i * OFFSET_WIDTH) as u32;
            let value = relative_offset(target.offset(), slot - base)?;
            stream.patch(slot, &value);
        }

        Ok(Ref::new(root - base))
    }

    /// Appends every string, then an array of references to them.
    pub fn create_array_of_strings<S: AsRef<str>>(
        &mut self,
        strings: &[S],
    ) -> Result<Ref<RefArrayView<'static, StringView<'static>>>> {
        let refs = strings
            .iter()
            .map(|s| self.create_string(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.create_array_of_refs(&refs)
    }

    /// Appends a NUL-terminated string. The stored length counts the NUL.
    pub fn create_string(&mut self, value: &str) -> Result<Ref<StringView<'static>>> {
        let mut chars = Vec::with_capacity(value.len() + 1);
        chars.extend_from_slice(value.as_bytes());
        chars.push(0);
        Ok(self.create_array(&chars)?.cast())
    }

    /// Appends a raw byte buffer.
    pub fn create_buffer(&mut self, data: &[u8]) -> Result<Ref<ArrayView<'static, u8>>> {
        self.create_array(data)
    }

    /// Writes an inline value into the slot at `field`.
    ///
    /// # Panics
    /// Panics if the slot does not fit inside the field slots, or if the
    /// builder cannot be written to.
    pub fn store_field<T: Flat>(&mut self, field: u32, value: T) {
        assert!(
            field as usize + T::WIDTH <= self.fields_size as usize,
            "field slot {field}+{} outside {} bytes of field slots",
            T::WIDTH,
            self.fields_size
        );
        let slot = self.base() + field;
        self.writable().patch(slot, &value);
    }

    /// Stores `target` in the reference slot at `field` as an offset
    /// relative to the slot.
    pub fn store_ref<V: ?Sized>(&mut self, field: u32, target: Ref<V>) -> Result<()> {
        assert!(
            field as usize + OFFSET_WIDTH <= self.fields_size as usize,
            "reference slot {field} outside {} bytes of field slots",
            self.fields_size
        );
        let value = relative_offset(target.offset(), field)?;
        let slot = self.base() + field;
        self.writable().patch(slot, &value);
        Ok(())
    }

    /// Writes the payload length into the header.
    fn finalize_header(&mut self) -> Result<()> {
        let root = self.root_offset;
        let base = self.base();
        let stream = self.writable();
        let payload = stream.size()? - base;
        stream.patch(root, &payload);
        Ok(())
    }

    /// Marks the builder built and hands the stream back to the parent.
    fn release(&mut self) -> Ref<ResourceView<'static>> {
        self.state = BuilderState::Built;
        match self.parent.take() {
            None => Ref::root(),
            Some(parent) => {
                if let Some(stream) = self.stream.take() {
                    parent.check_in(StreamLease {
                        stream,
                        parent_base: self.parent_base,
                    });
                }
                Ref::new(self.root_offset - self.parent_base)
            }
        }
    }

    /// Finalizes the resource.
    ///
    /// A root builder returns the root marker and keeps its bytes for
    /// [`ResourceBuilder::bytes`]. A nested builder returns its offset
    /// relative to the parent's payload base, ready to be stored in one of
    /// the parent's reference fields.
    pub fn build(&mut self) -> Result<Ref<ResourceView<'static>>> {
        self.finalize_header()?;
        let root = self.release();
        tracing::trace!(
            offset = root.offset(),
            fields_size = self.fields_size,
            "Built resource"
        );
        Ok(root)
    }

    /// Finalizes the resource and copies it, with everything appended after
    /// it, to `sink`.
    pub fn build_into<W: Write>(&mut self, sink: &mut W) -> Result<Ref<ResourceView<'static>>> {
        self.finalize_header()?;
        if let Some(stream) = self.stream.as_ref() {
            sink.write_all(&stream.as_slice()[self.root_offset as usize..])?;
        }
        Ok(self.release())
    }

    /// The bytes of a root builder's resource.
    ///
    /// Empty for a nested builder, whose bytes live in the parent's stream.
    pub fn bytes(&self) -> &[u8] {
        match self.stream.as_ref() {
            Some(stream) if self.is_root() => stream.as_slice(),
            _ => &[],
        }
    }

    /// Consumes a root builder, returning its bytes.
    ///
    /// # Panics
    /// Panics on a nested builder or while a nested builder is open.
    pub fn into_bytes(mut self) -> Vec<u8> {
        assert!(self.is_root(), "into_bytes() called on a nested builder");
        assert!(
            self.state != BuilderState::CheckedOut,
            "into_bytes() called while a nested builder holds the stream"
        );
        self.stream.take().map(ResourceStream::into_vec).unwrap_or_default()
    }
}

impl StreamOwner for ResourceBuilder<'_> {
    fn check_out(&mut self) -> StreamLease {
        let parent_base = self.base();
        self.writable();
        let Some(stream) = self.stream.take() else {
            panic!("open ResourceBuilder has no stream")
        };
        self.state = BuilderState::CheckedOut;
        StreamLease {
            stream,
            parent_base,
        }
    }

    fn check_in(&mut self, lease: StreamLease) {
        assert_eq!(
            self.state,
            BuilderState::CheckedOut,
            "stream returned to a builder that did not lend it"
        );
        self.stream = Some(lease.stream);
        self.state = BuilderState::Open;
    }
}

impl Drop for ResourceBuilder<'_> {
    fn drop(&mut self) {
        // Nested builders dropped without build() still finalize and hand
        // the stream back.
        if self.state != BuilderState::Open || self.parent.is_none() {
            return;
        }
        if let Err(e) = self.finalize_header() {
            tracing::warn!("Failed to finalize nested resource on drop: {}", e);
        }
        self.release();
    }
}

impl fmt::Debug for ResourceBuilder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBuilder")
            .field("root_offset", &self.root_offset)
            .field("fields_size", &self.fields_size)
            .field("nested", &self.parent.is_some())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Offset of `target` as seen from `slot`; both are payload-relative.
fn relative_offset(target: u32, slot: u32) -> Result<OffsetType> {
    OffsetType::try_from(i64::from(target) - i64::from(slot)).map_err(|_| {
        RuntimeError::CapacityOverflow {
            operation: "relative offset",
        }
    })
}
