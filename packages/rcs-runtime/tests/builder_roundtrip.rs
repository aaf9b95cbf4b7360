//! Integration tests for building, relocating and loading resource blobs.

use std::io::Cursor;

use ntest::timeout;
use rcs_runtime::{
    ArrayView, BuilderState, Ref, RefArrayView, ResourceBuilder, ResourceLoader, ResourceView,
    RuntimeError, StringView, ViewAt,
};

// Slots used by the tests below: u32 @0, u32 @4, string ref @8
const INDEX_OFFSET: u32 = 0;
const INDEX_COUNT: u32 = 4;
const MATERIAL_NAME: u32 = 8;
const FIELDS_SIZE: u32 = 12;

fn build_mesh(name: &str) -> Vec<u8> {
    let mut builder = ResourceBuilder::new(FIELDS_SIZE);
    builder.store_field(INDEX_OFFSET, 10u32);
    builder.store_field(INDEX_COUNT, 36u32);
    let name = builder.create_string(name).unwrap();
    builder.store_ref(MATERIAL_NAME, name).unwrap();
    builder.build().unwrap();
    builder.into_bytes()
}

#[timeout(1000)]
#[test]
fn test_build_and_read_back() {
    let bytes = build_mesh("brick");

    let view = ResourceView::new(&bytes)
        .unwrap()
        .expect_fields(FIELDS_SIZE)
        .unwrap();
    assert_eq!(view.read::<u32>(INDEX_OFFSET), 10);
    assert_eq!(view.read::<u32>(INDEX_COUNT), 36);
    assert!(view.has(MATERIAL_NAME));

    let name: StringView = view.deref(MATERIAL_NAME).unwrap();
    assert_eq!(name.to_str().unwrap(), "brick");
    assert_eq!(name.len(), 6);
}

#[timeout(1000)]
#[test]
fn test_blob_is_relocatable() {
    let bytes = build_mesh("brick");

    // Copy the blob behind an odd-sized prefix and in front of trailing junk
    let prefix = 13;
    let mut buffer = vec![0xcd; prefix];
    buffer.extend_from_slice(&bytes);
    buffer.extend_from_slice(&[0xee; 7]);

    let view = ResourceView::view_at(&buffer, prefix).unwrap();
    assert_eq!(view.as_bytes(), &bytes[..]);
    assert_eq!(view.read::<u32>(INDEX_COUNT), 36);
    let name: StringView = view.deref(MATERIAL_NAME).unwrap();
    assert_eq!(name.to_str().unwrap(), "brick");
}

#[timeout(1000)]
#[test]
fn test_unassigned_reference() {
    let mut builder = ResourceBuilder::new(FIELDS_SIZE);
    builder.build().unwrap();
    let view = ResourceView::new(builder.bytes()).unwrap();

    assert!(!view.has(MATERIAL_NAME));
    assert!(matches!(
        view.deref::<StringView>(MATERIAL_NAME),
        Err(RuntimeError::NullReference { field: 12 })
    ));
}

#[timeout(1000)]
#[test]
fn test_arrays_and_buffers() {
    let mut builder = ResourceBuilder::new(12);
    let floats = builder.create_array(&[1.5f32, -2.0, 4.25]).unwrap();
    let empty = builder.create_array::<u64>(&[]).unwrap();
    let buffer = builder.create_buffer(b"\x00\x01\x02\xff").unwrap();
    builder.store_ref(0, floats).unwrap();
    builder.store_ref(4, empty).unwrap();
    builder.store_ref(8, buffer).unwrap();
    builder.build().unwrap();

    let view = ResourceView::new(builder.bytes()).unwrap();
    let floats: ArrayView<f32> = view.deref(0).unwrap();
    assert_eq!(floats.len(), 3);
    assert_eq!(floats.byte_len(), 12);
    assert_eq!(floats.to_vec(), vec![1.5, -2.0, 4.25]);

    let empty: ArrayView<u64> = view.deref(4).unwrap();
    assert!(empty.is_empty());

    let buffer: ArrayView<u8> = view.deref(8).unwrap();
    assert_eq!(buffer.as_bytes(), b"\x00\x01\x02\xff");
}

#[timeout(1000)]
#[test]
fn test_string_with_interior_nul() {
    let bytes = build_mesh("a\0b");

    let view = ResourceView::new(&bytes).unwrap();
    let name: StringView = view.deref(MATERIAL_NAME).unwrap();
    assert_eq!(name.len(), 4);
    assert_eq!(name.as_bytes_with_nul(), b"a\0b\0");
    assert_eq!(name.to_str().unwrap(), "a\0b");
}

#[timeout(1000)]
#[test]
fn test_array_of_strings() {
    let mut builder = ResourceBuilder::new(4);
    let names = builder
        .create_array_of_strings(&["vertex", "", "fragment"])
        .unwrap();
    builder.store_ref(0, names).unwrap();
    builder.build().unwrap();

    let view = ResourceView::new(builder.bytes()).unwrap();
    let names: RefArrayView<StringView> = view.deref(0).unwrap();
    assert_eq!(names.len(), 3);
    let collected = names
        .iter()
        .map(|s| s.unwrap().to_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert_eq!(collected, vec!["vertex", "", "fragment"]);
    assert!(names.get(3).is_err());
}

#[timeout(1000)]
#[test]
fn test_nested_resources_are_isolated() {
    // Parent: ref @0, ref @4, u32 @8. Child: u32 @0, string ref @4.
    let mut parent = ResourceBuilder::new(12);

    let first = {
        let mut child = ResourceBuilder::nested(&mut parent, 8).unwrap();
        assert_eq!(child.state(), BuilderState::Open);
        child.store_field(0, 1u32);
        let s = child.create_string("first").unwrap();
        child.store_ref(4, s).unwrap();
        child.build().unwrap()
    };
    assert_eq!(parent.state(), BuilderState::Open);

    let second = {
        let mut child = ResourceBuilder::nested(&mut parent, 8).unwrap();
        child.store_field(0, 2u32);
        let s = child.create_string("second").unwrap();
        child.store_ref(4, s).unwrap();
        child.build().unwrap()
    };

    parent.store_ref(0, first).unwrap();
    parent.store_ref(4, second).unwrap();
    parent.store_field(8, 99u32);
    parent.build().unwrap();
    let bytes = parent.into_bytes();

    let view = ResourceView::new(&bytes).unwrap();
    assert_eq!(view.read::<u32>(8), 99);

    for (field, id, text) in [(0, 1u32, "first"), (4, 2, "second")] {
        let child: ResourceView = view.deref(field).unwrap();
        assert_eq!(child.read::<u32>(0), id);
        let name: StringView = child.deref(4).unwrap();
        assert_eq!(name.to_str().unwrap(), text);

        // The child is self-contained: copied out on its own it still reads
        let copy = child.as_bytes().to_vec();
        let alone = ResourceView::new(&copy).unwrap();
        let name: StringView = alone.deref(4).unwrap();
        assert_eq!(name.to_str().unwrap(), text);
    }
}

#[timeout(1000)]
#[test]
fn test_nested_build_into_copies_child_span() {
    let mut parent = ResourceBuilder::new(4);
    let mut out = Vec::new();
    let child_ref = {
        let mut child = ResourceBuilder::nested(&mut parent, 4).unwrap();
        let data = child.create_array(&[7u16, 8]).unwrap();
        child.store_ref(0, data).unwrap();
        child.build_into(&mut out).unwrap()
    };
    parent.store_ref(0, child_ref).unwrap();
    parent.build().unwrap();

    let copied = ResourceView::new(&out).unwrap();
    let data: ArrayView<u16> = copied.deref(0).unwrap();
    assert_eq!(data.to_vec(), vec![7, 8]);

    let view = ResourceView::new(parent.bytes()).unwrap();
    let child: ResourceView = view.deref(0).unwrap();
    assert_eq!(child.as_bytes(), &out[..]);
}

#[test]
#[should_panic(expected = "locked")]
fn test_parent_locked_while_stream_checked_out() {
    use rcs_runtime::StreamOwner;

    let mut parent = ResourceBuilder::new(4);
    let _lease = parent.check_out();
    assert_eq!(parent.state(), BuilderState::CheckedOut);
    parent.store_field(0, 1u32);
}

#[timeout(1000)]
#[test]
fn test_loader_roundtrip() {
    let bytes = build_mesh("stone");
    let mut file = Vec::new();
    file.extend_from_slice(&bytes);
    file.extend_from_slice(&build_mesh("moss"));

    let mut cursor = Cursor::new(file);
    let first = ResourceLoader::load(&mut cursor).unwrap();
    let second = ResourceLoader::load(&mut cursor).unwrap();

    let name: StringView = first.view().unwrap().deref(MATERIAL_NAME).unwrap();
    assert_eq!(name.to_str().unwrap(), "stone");
    let view: ResourceView = second.deserialize().unwrap();
    let name: StringView = view.deref(MATERIAL_NAME).unwrap();
    assert_eq!(name.to_str().unwrap(), "moss");
}

#[timeout(1000)]
#[test]
fn test_corrupt_reference_is_rejected() {
    let mut bytes = build_mesh("brick");
    // Point the name reference far past the end of the blob
    bytes[4 + MATERIAL_NAME as usize..][..4].copy_from_slice(&1000i32.to_le_bytes());
    let view = ResourceView::new(&bytes).unwrap();
    assert!(matches!(
        view.deref::<StringView>(MATERIAL_NAME),
        Err(RuntimeError::DanglingReference { value: 1000, .. })
    ));

    // And before the start of the resource
    bytes[4 + MATERIAL_NAME as usize..][..4].copy_from_slice(&(-100i32).to_le_bytes());
    let view = ResourceView::new(&bytes).unwrap();
    assert!(view.deref::<StringView>(MATERIAL_NAME).is_err());
}

#[timeout(1000)]
#[test]
fn test_root_marker() {
    let mut builder = ResourceBuilder::new(0);
    assert!(builder.is_root());
    let root: Ref<ResourceView> = builder.build().unwrap();
    assert_eq!(root, Ref::root());
    assert!(builder.is_built());
    assert_eq!(builder.bytes(), &[0, 0, 0, 0]);
}
