//! Rust source emitter.
//!
//! Every resource becomes a marker type holding its field layout, a
//! builder, a view and a loader. Data types become `Copy` structs and enums
//! become `u32` newtypes; both implement the runtime's `Flat` so they can
//! sit in field slots and arrays. The output only contains items, so it can
//! be pulled in with `include!`.

use crate::config::GeneratorConfig;
use crate::model::{CompositeType, EnumType, Field, Primitive, Resource, Schema, TypeInfo, TypeKind};

use super::writer::CodeWriter;

/// Words that need a raw identifier to be used as a Rust name.
const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// Prelude items are spelled out in full so schema types named like them
/// cannot shadow them.
const OK: &str = "::core::result::Result::Ok";
const DEFAULT: &str = "::core::default::Default";
const AS_REF: &str = "::core::convert::AsRef";

/// `name` as a Rust identifier, raw if it is a keyword.
pub fn rust_ident(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

/// Rust type of a built-in primitive.
pub fn primitive_type(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::Byte => "u8",
        Primitive::Bool => "bool",
        Primitive::Int16 => "i16",
        Primitive::Int32 => "i32",
        Primitive::Int64 => "i64",
        Primitive::Uint16 => "u16",
        Primitive::Uint32 => "u32",
        Primitive::Uint64 => "u64",
        Primitive::Float32 => "f32",
        Primitive::Float64 => "f64",
    }
}

/// How a field is written and read.
enum Shape<'s> {
    /// Inline value of the given Rust type
    Value(String),
    String,
    Resource(&'s str),
    /// `byte[]`
    Bytes,
    /// Array of inline values of the given Rust type
    Array(String),
    StringArray,
    ResourceArray(&'s str),
}

impl Shape<'_> {
    fn is_reference(&self) -> bool {
        !matches!(self, Shape::Value(_))
    }
}

struct Emitter<'s> {
    schema: &'s Schema,
    rt: &'s str,
    emit_builder: bool,
    emit_loader: bool,
    w: CodeWriter,
}

/// Renders `schema` as Rust source.
pub fn emit(schema: &Schema, config: &GeneratorConfig) -> String {
    let mut emitter = Emitter {
        schema,
        rt: &config.runtime_path,
        emit_builder: config.emit_builder,
        emit_loader: config.emit_loader,
        w: CodeWriter::new(),
    };
    emitter.emit_schema();
    emitter.w.finish()
}

impl<'s> Emitter<'s> {
    fn emit_schema(&mut self) {
        self.w.line(format!(
            "// Generated by rcs-gen from schema `{}`. Do not edit.",
            self.schema.name()
        ));
        self.w.blank();

        for enum_type in self.schema.enums() {
            self.emit_enum(enum_type);
        }
        for composite in self.schema.composites() {
            self.emit_composite(composite);
        }
        for resource in self.schema.resources() {
            self.emit_layout(resource);
            if self.emit_builder {
                self.emit_builder(resource);
            }
            if self.emit_loader {
                self.emit_view(resource);
                self.emit_loader(resource);
            }
        }
    }

    fn value_type(&self, ty: &TypeInfo) -> String {
        match self.schema.kind_of(ty) {
            TypeKind::Builtin(primitive) => primitive_type(primitive).to_string(),
            _ => rust_ident(&ty.name),
        }
    }

    fn shape(&self, ty: &'s TypeInfo) -> Shape<'s> {
        match self.schema.kind_of(ty) {
            TypeKind::String => Shape::String,
            TypeKind::Resource => Shape::Resource(&ty.name),
            TypeKind::Array => match ty.element() {
                Some(element) => match self.schema.kind_of(element) {
                    TypeKind::String => Shape::StringArray,
                    TypeKind::Resource => Shape::ResourceArray(&element.name),
                    TypeKind::Builtin(Primitive::Byte) => Shape::Bytes,
                    _ => Shape::Array(self.value_type(element)),
                },
                None => Shape::Bytes,
            },
            _ => Shape::Value(self.value_type(ty)),
        }
    }

    fn emit_enum(&mut self, enum_type: &EnumType) {
        let rt = self.rt;
        let name = rust_ident(enum_type.name());

        self.w.line(format!("/// Enum `{}`.", enum_type.name()));
        self.w.line("#[allow(non_camel_case_types)]");
        self.w
            .line("#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]");
        self.w.line("#[repr(transparent)]");
        self.w.line(format!("pub struct {name}(pub u32);"));
        self.w.blank();

        self.w.line("#[allow(non_upper_case_globals)]");
        self.w.open(format!("impl {name}"));
        for (i, value) in enum_type.values().iter().enumerate() {
            self.w
                .line(format!("pub const {}: Self = Self({i});", rust_ident(value)));
        }
        self.w.close();
        self.w.blank();

        self.w.open(format!("impl ::std::fmt::Display for {name}"));
        self.w
            .open("fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result");
        self.w.open("match self.0");
        for (i, value) in enum_type.values().iter().enumerate() {
            self.w.line(format!("{i} => f.write_str(\"{value}\"),"));
        }
        self.w.line(format!(
            "other => write!(f, \"{}({{}})\", other),",
            enum_type.name()
        ));
        self.w.close();
        self.w.close();
        self.w.close();
        self.w.blank();

        self.w.open(format!("impl {rt}::Flat for {name}"));
        self.w.line("const WIDTH: usize = 4;");
        self.w.blank();
        self.w.open("fn write_to(&self, out: &mut [u8])");
        self.w.line(format!("{rt}::Flat::write_to(&self.0, out)"));
        self.w.close();
        self.w.blank();
        self.w.open("fn read_from(bytes: &[u8]) -> Self");
        self.w
            .line(format!("Self(<u32 as {rt}::Flat>::read_from(bytes))"));
        self.w.close();
        self.w.close();
        self.w.blank();
    }

    fn emit_composite(&mut self, composite: &CompositeType) {
        let rt = self.rt;
        let name = rust_ident(composite.name());
        let fields = composite.fields();

        self.w.line(format!(
            "/// Data type `{}` ({} bytes inline).",
            composite.name(),
            fields.size()
        ));
        self.w.line("#[allow(non_camel_case_types, non_snake_case)]");
        self.w.line("#[derive(Debug, Clone, Copy, PartialEq, Default)]");
        self.w.open(format!("pub struct {name}"));
        for field in fields {
            let ty = self.value_type(&field.ty);
            self.w.line(format!("pub {}: {ty},", rust_ident(&field.name)));
        }
        self.w.close();
        self.w.blank();

        let unused = fields.is_empty();

        self.w.open(format!("impl {rt}::Flat for {name}"));
        self.w.line(format!("const WIDTH: usize = {};", fields.size()));
        self.w.blank();
        if unused {
            self.w.line("#[allow(unused_variables)]");
        }
        self.w.open("fn write_to(&self, out: &mut [u8])");
        for field in fields {
            self.w.line(format!(
                "{rt}::Flat::write_to(&self.{}, &mut out[{}..{}]);",
                rust_ident(&field.name),
                field.offset,
                field.offset + field.ty.size
            ));
        }
        self.w.close();
        self.w.blank();
        if unused {
            self.w.line("#[allow(unused_variables)]");
        }
        self.w.open("fn read_from(bytes: &[u8]) -> Self");
        self.w.open("Self");
        for field in fields {
            self.w.line(format!(
                "{}: {rt}::Flat::read_from(&bytes[{}..{}]),",
                rust_ident(&field.name),
                field.offset,
                field.offset + field.ty.size
            ));
        }
        self.w.close();
        self.w.close();
        self.w.close();
        self.w.blank();
    }

    /// Marker type carrying the field offsets.
    fn emit_layout(&mut self, resource: &Resource) {
        let name = rust_ident(resource.name());
        let fields = resource.fields();

        self.w
            .line(format!("/// Field layout of resource `{}`.", resource.name()));
        self.w.line("#[allow(non_camel_case_types)]");
        self.w
            .line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]");
        self.w.line(format!("pub struct {name};"));
        self.w.blank();

        self.w.line("#[allow(non_upper_case_globals)]");
        self.w.open(format!("impl {name}"));
        self.w.line("/// Bytes of fixed field slots.");
        self.w
            .line(format!("pub const FIELDS_SIZE: u32 = {};", fields.size()));
        for field in fields {
            self.w
                .line(format!("/// `{} {}`", field.ty.name, field.name));
            self.w.line(format!(
                "pub const FIELD_{}: u32 = {};",
                field.name, field.offset
            ));
        }
        self.w.close();
        self.w.blank();
    }

    fn emit_builder(&mut self, resource: &'s Resource) {
        let rt = self.rt;
        let marker = rust_ident(resource.name());
        let builder = format!("{}Builder", resource.name());
        let target = format!("{rt}::Ref<{marker}>");

        self.w.line(format!("/// Writes `{}` resources.", resource.name()));
        self.w.line("#[allow(non_camel_case_types)]");
        self.w.line("#[derive(Debug)]");
        self.w.open(format!("pub struct {builder}<'p>"));
        self.w.line(format!("inner: {rt}::ResourceBuilder<'p>,"));
        self.w.close();
        self.w.blank();

        self.w.open(format!("impl {builder}<'static>"));
        self.w.line("/// Starts a root resource in a fresh stream.");
        self.w.open("pub fn new() -> Self");
        self.w.open("Self");
        self.w.line(format!(
            "inner: {rt}::ResourceBuilder::new({marker}::FIELDS_SIZE),"
        ));
        self.w.close();
        self.w.close();
        self.w.close();
        self.w.blank();

        self.w.open(format!("impl {DEFAULT} for {builder}<'static>"));
        self.w.open("fn default() -> Self");
        self.w.line("Self::new()");
        self.w.close();
        self.w.close();
        self.w.blank();

        self.w.line("#[allow(non_snake_case)]");
        self.w.open(format!("impl<'p> {builder}<'p>"));
        self.w.line("/// Starts a resource nested in `parent`'s stream. `parent` stays");
        self.w.line("/// locked until this builder is built or dropped.");
        self.w.open(format!(
            "pub fn nested(parent: &'p mut (dyn {rt}::StreamOwner + 'p)) -> {rt}::Result<Self>"
        ));
        self.w.open(format!("{OK}(Self"));
        self.w.line(format!(
            "inner: {rt}::ResourceBuilder::nested(parent, {marker}::FIELDS_SIZE)?,"
        ));
        self.w.close_with("})");
        self.w.close();

        for field in resource.fields() {
            self.w.blank();
            self.emit_setter(&marker, field);
        }

        self.w.blank();
        self.w.line("/// Finalizes the resource. A nested builder's result can be stored");
        self.w.line("/// in a reference field of its parent.");
        self.w
            .open(format!("pub fn build(&mut self) -> {rt}::Result<{target}>"));
        self.w.line(format!("{OK}(self.inner.build()?.cast())"));
        self.w.close();
        self.w.blank();
        self.w.line("/// Finalizes the resource and copies its bytes to `sink`.");
        self.w.open(format!(
            "pub fn build_into<W: ::std::io::Write>(&mut self, sink: &mut W) -> {rt}::Result<{target}>"
        ));
        self.w.line(format!("{OK}(self.inner.build_into(sink)?.cast())"));
        self.w.close();
        self.w.blank();
        self.w.line("/// Bytes written so far; empty for a nested builder.");
        self.w.open("pub fn bytes(&self) -> &[u8]");
        self.w.line("self.inner.bytes()");
        self.w.close();
        self.w.blank();
        self.w.open("pub fn into_bytes(self) -> ::std::vec::Vec<u8>");
        self.w.line("self.inner.into_bytes()");
        self.w.close();
        self.w.close();
        self.w.blank();

        self.w
            .open(format!("impl {rt}::StreamOwner for {builder}<'_>"));
        self.w.open(format!("fn check_out(&mut self) -> {rt}::StreamLease"));
        self.w
            .line(format!("{rt}::StreamOwner::check_out(&mut self.inner)"));
        self.w.close();
        self.w.blank();
        self.w
            .open(format!("fn check_in(&mut self, lease: {rt}::StreamLease)"));
        self.w
            .line(format!("{rt}::StreamOwner::check_in(&mut self.inner, lease)"));
        self.w.close();
        self.w.close();
        self.w.blank();
    }

    fn emit_setter(&mut self, marker: &str, field: &'s Field) {
        let rt = self.rt;
        let slot = format!("{marker}::FIELD_{}", field.name);
        let setter = format!("set_{}", field.name);

        let (signature, create) = match self.shape(&field.ty) {
            Shape::Value(ty) => {
                self.w.open(format!(
                    "pub fn {setter}(&mut self, value: {ty}) -> &mut Self"
                ));
                self.w
                    .line(format!("self.inner.store_field({slot}, value);"));
                self.w.line("self");
                self.w.close();
                return;
            }
            Shape::String => (
                format!("{setter}(&mut self, value: &str)"),
                "self.inner.create_string(value)?".to_string(),
            ),
            Shape::Resource(name) => (
                format!("{setter}(&mut self, value: {rt}::Ref<{}>)", rust_ident(name)),
                "value".to_string(),
            ),
            Shape::Bytes => (
                format!("{setter}(&mut self, values: &[u8])"),
                "self.inner.create_buffer(values)?".to_string(),
            ),
            Shape::Array(ty) => (
                format!("{setter}(&mut self, values: &[{ty}])"),
                "self.inner.create_array(values)?".to_string(),
            ),
            Shape::StringArray => (
                format!("{setter}<S: {AS_REF}<str>>(&mut self, values: &[S])"),
                "self.inner.create_array_of_strings(values)?".to_string(),
            ),
            Shape::ResourceArray(name) => (
                format!(
                    "{setter}(&mut self, values: &[{rt}::Ref<{}>])",
                    rust_ident(name)
                ),
                "self.inner.create_array_of_refs(values)?".to_string(),
            ),
        };

        self.w
            .open(format!("pub fn {signature} -> {rt}::Result<&mut Self>"));
        self.w.line(format!("let target = {create};"));
        self.w.line(format!("self.inner.store_ref({slot}, target)?;"));
        self.w.line(format!("{OK}(self)"));
        self.w.close();
    }

    fn emit_view(&mut self, resource: &'s Resource) {
        let rt = self.rt;
        let marker = rust_ident(resource.name());
        let view = format!("{}View", resource.name());

        self.w
            .line(format!("/// Read access to a `{}` resource.", resource.name()));
        self.w.line("#[allow(non_camel_case_types)]");
        self.w.line("#[derive(Debug, Clone, Copy)]");
        self.w.open(format!("pub struct {view}<'a>"));
        self.w.line(format!("view: {rt}::ResourceView<'a>,"));
        self.w.close();
        self.w.blank();

        self.w.line("#[allow(non_snake_case)]");
        self.w.open(format!("impl<'a> {view}<'a>"));
        self.w.line("/// Views the resource at the start of `bytes`.");
        self.w
            .open(format!("pub fn new(bytes: &'a [u8]) -> {rt}::Result<Self>"));
        self.w
            .line(format!("<Self as {rt}::ViewAt<'a>>::view_at(bytes, 0)"));
        self.w.close();
        self.w.blank();
        self.w.line("/// Payload size in bytes, child data included.");
        self.w.open("pub fn byte_size(&self) -> usize");
        self.w.line("self.view.byte_size()");
        self.w.close();
        self.w.blank();
        self.w
            .open(format!("pub fn as_resource(&self) -> {rt}::ResourceView<'a>"));
        self.w.line("self.view");
        self.w.close();

        for field in resource.fields() {
            self.w.blank();
            self.emit_getters(&marker, field);
        }
        self.w.close();
        self.w.blank();

        self.w.open(format!("impl<'a> {rt}::ViewAt<'a> for {view}<'a>"));
        self.w.open(format!(
            "fn view_at(bytes: &'a [u8], pos: usize) -> {rt}::Result<Self>"
        ));
        self.w.line(format!(
            "let view = <{rt}::ResourceView<'a> as {rt}::ViewAt<'a>>::view_at(bytes, pos)?;"
        ));
        self.w.open(format!("{OK}(Self"));
        self.w
            .line(format!("view: view.expect_fields({marker}::FIELDS_SIZE)?,"));
        self.w.close_with("})");
        self.w.close();
        self.w.close();
        self.w.blank();
    }

    /// Return type of `get_<field>` on a view with lifetime `lt`.
    fn getter_type(&self, shape: &Shape<'_>, lt: &str) -> String {
        let rt = self.rt;
        match shape {
            Shape::Value(ty) => ty.clone(),
            Shape::String => format!("{rt}::Result<&{lt} str>"),
            Shape::Resource(name) => format!("{rt}::Result<{name}View<{lt}>>"),
            Shape::Bytes => format!("{rt}::Result<{rt}::ArrayView<{lt}, u8>>"),
            Shape::Array(ty) => format!("{rt}::Result<{rt}::ArrayView<{lt}, {ty}>>"),
            Shape::StringArray => {
                format!("{rt}::Result<{rt}::RefArrayView<{lt}, {rt}::StringView<{lt}>>>")
            }
            Shape::ResourceArray(name) => {
                format!("{rt}::Result<{rt}::RefArrayView<{lt}, {name}View<{lt}>>>")
            }
        }
    }

    fn emit_getters(&mut self, marker: &str, field: &'s Field) {
        let rt = self.rt;
        let slot = format!("{marker}::FIELD_{}", field.name);
        let shape = self.shape(&field.ty);
        let name = &field.name;

        self.w
            .line(format!("/// `{} {}`", field.ty.name, field.name));
        self.w.open(format!(
            "pub fn get_{name}(&self) -> {}",
            self.getter_type(&shape, "'a")
        ));
        match shape {
            Shape::Value(_) => self.w.line(format!("self.view.read({slot})")),
            Shape::String => self.w.line(format!(
                "self.view.deref::<{rt}::StringView<'a>>({slot})?.to_str()"
            )),
            _ => self.w.line(format!("self.view.deref({slot})")),
        }
        self.w.close();

        if !shape.is_reference() {
            return;
        }

        if !matches!(shape, Shape::Resource(_)) {
            self.w.blank();
            match shape {
                Shape::String => {
                    self.w.line("/// Stored length, terminator included.");
                    self.w.open(format!(
                        "pub fn length_{name}(&self) -> {rt}::Result<usize>"
                    ));
                    self.w.line(format!(
                        "{OK}(self.view.deref::<{rt}::StringView<'a>>({slot})?.len())"
                    ));
                }
                _ => {
                    self.w.line("/// Number of elements.");
                    self.w.open(format!(
                        "pub fn length_{name}(&self) -> {rt}::Result<usize>"
                    ));
                    self.w.line(format!("{OK}(self.get_{name}()?.len())"));
                }
            }
            self.w.close();
        }

        self.w.blank();
        self.w.open(format!("pub fn has_{name}(&self) -> bool"));
        self.w.line(format!("self.view.has({slot})"));
        self.w.close();
    }

    fn emit_loader(&mut self, resource: &'s Resource) {
        let rt = self.rt;
        let view = format!("{}View", resource.name());
        let loader = format!("{}Loader", resource.name());

        self.w.line(format!(
            "/// Owns a loaded `{}` resource.",
            resource.name()
        ));
        self.w.line("#[allow(non_camel_case_types)]");
        self.w.line("#[derive(Debug, Clone)]");
        self.w.open(format!("pub struct {loader}"));
        self.w.line(format!("loader: {rt}::ResourceLoader,"));
        self.w.close();
        self.w.blank();

        self.w.line("#[allow(non_snake_case)]");
        self.w.open(format!("impl {loader}"));
        self.w.line("/// Reads one resource from the reader's current position.");
        self.w.open(format!(
            "pub fn load<R: ::std::io::Read + ::std::io::Seek>(reader: &mut R) -> {rt}::Result<Self>"
        ));
        self.w
            .line(format!("Self::from_loader({rt}::ResourceLoader::load(reader)?)"));
        self.w.close();
        self.w.blank();
        self.w.open(format!(
            "pub fn from_bytes(bytes: ::std::vec::Vec<u8>) -> {rt}::Result<Self>"
        ));
        self.w.line(format!(
            "Self::from_loader({rt}::ResourceLoader::from_bytes(bytes)?)"
        ));
        self.w.close();
        self.w.blank();
        self.w.open(format!(
            "fn from_loader(loader: {rt}::ResourceLoader) -> {rt}::Result<Self>"
        ));
        self.w.line(format!("loader.deserialize::<{view}<'_>>()?;"));
        self.w.line(format!("{OK}(Self {{ loader }})"));
        self.w.close();
        self.w.blank();
        self.w.open("pub fn as_bytes(&self) -> &[u8]");
        self.w.line("self.loader.as_bytes()");
        self.w.close();
        self.w.blank();
        self.w.open(format!("pub fn view(&self) -> {view}<'_>"));
        self.w.open(view.as_str());
        self.w.line("view: self.loader.resource(),");
        self.w.close();
        self.w.close();

        for field in resource.fields() {
            let shape = self.shape(&field.ty);
            let name = &field.name;

            self.w.blank();
            self.w.open(format!(
                "pub fn get_{name}(&self) -> {}",
                self.getter_type(&shape, "'_")
            ));
            self.w.line(format!("self.view().get_{name}()"));
            self.w.close();

            if !shape.is_reference() {
                continue;
            }
            if !matches!(shape, Shape::Resource(_)) {
                self.w.blank();
                self.w.open(format!(
                    "pub fn length_{name}(&self) -> {rt}::Result<usize>"
                ));
                self.w.line(format!("self.view().length_{name}()"));
                self.w.close();
            }
            self.w.blank();
            self.w.open(format!("pub fn has_{name}(&self) -> bool"));
            self.w.line(format!("self.view().has_{name}()"));
            self.w.close();
        }
        self.w.close();
        self.w.blank();
    }
}
