//! Runtime for relocatable binary resources.
//!
//! Provides the append-only stream, resource builders with nested
//! checkout, the loader and bounds-checked views that generated code is
//! written against.

pub mod builder;
pub mod error;
pub mod loader;
pub mod reference;
pub mod stream;
pub mod view;
pub mod wire;

pub use builder::{BuilderState, ResourceBuilder, StreamLease, StreamOwner};
pub use error::{Result, RuntimeError};
pub use loader::ResourceLoader;
pub use reference::{Ref, RelRef};
pub use stream::ResourceStream;
pub use view::{ArrayView, RefArrayView, ResourceView, StringView, ViewAt};
pub use wire::{Flat, OffsetType, SizeType, HEADER_WIDTH, OFFSET_WIDTH};

/// Handle to an array of inline values.
pub type ArrayRef<T> = Ref<ArrayView<'static, T>>;

/// Handle to a string.
pub type StringRef = Ref<StringView<'static>>;

/// Handle to a raw byte buffer.
pub type BufferRef = Ref<ArrayView<'static, u8>>;

/// Handle to a nested resource.
pub type ResourceRef = Ref<ResourceView<'static>>;

/// Handle to an array of references.
pub type RefArrayRef<V> = Ref<RefArrayView<'static, V>>;
