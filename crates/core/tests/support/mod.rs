//! Synthetic PE images for tests.
//!
//! Builds a minimal PE32 image with a single `.rdata` section that can carry an
//! export directory, a version resource, and CLI metadata, so fixtures never
//! need checked-in binaries.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

const PE_OFFSET: usize = 0x80;
const OPTIONAL_HEADER: usize = PE_OFFSET + 4 + 20;
const DATA_DIRECTORIES: usize = OPTIONAL_HEADER + 96;
const SECTION_HEADER: usize = OPTIONAL_HEADER + 224;
const HEADERS_SIZE: usize = 0x200;
const SECTION_RVA: u32 = 0x1000;

const DIR_EXPORT: usize = 0;
const DIR_RESOURCE: usize = 2;
const DIR_CLR: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureKind {
    Dll,
    Exe,
    Driver,
    /// No executable-image characteristic.
    Object,
}

/// Shape of the `#~` table stream emitted by [`PeFixture::with_clr_layout`].
///
/// Rows other than Module and Assembly are zero-filled; only their sizes matter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClrLayout {
    pub type_refs: u32,
    pub type_defs: u32,
    pub method_defs: u32,
    pub member_refs: u32,
    /// Heap-size bit 0x01: 4-byte `#Strings` indices.
    pub wide_strings: bool,
    /// Heap-size bit 0x04: 4-byte `#Blob` indices.
    pub wide_blobs: bool,
    /// Heap-size bit 0x40: four extra bytes after the row counts.
    pub extra_data: bool,
}

impl ClrLayout {
    fn heap_sizes(&self) -> u8 {
        let mut bits = 0;
        if self.wide_strings {
            bits |= 0x01;
        }
        if self.wide_blobs {
            bits |= 0x04;
        }
        if self.extra_data {
            bits |= 0x40;
        }
        bits
    }

    fn string_width(&self) -> usize {
        if self.wide_strings { 4 } else { 2 }
    }

    fn blob_width(&self) -> usize {
        if self.wide_blobs { 4 } else { 2 }
    }

    /// Row counts by table number, Assembly included.
    fn rows(&self) -> [(usize, u32); 6] {
        [
            (0x00, 1),
            (0x01, self.type_refs),
            (0x02, self.type_defs),
            (0x06, self.method_defs),
            (0x0A, self.member_refs),
            (0x20, 1),
        ]
    }

    /// Bytes of every row preceding the Assembly table, Module excluded.
    fn filler_rows(&self) -> usize {
        let (s, b) = (self.string_width(), self.blob_width());
        let simple = |rows: u32| if rows > 0xFFFF { 4 } else { 2 };
        let coded = |max_rows: u32, tag_bits: u32| if max_rows < (1 << (16 - tag_bits)) { 2 } else { 4 };

        // ResolutionScope: Module, ModuleRef, AssemblyRef, TypeRef.
        let resolution_scope = coded(self.type_refs.max(1), 2);
        // TypeDefOrRef: TypeDef, TypeRef, TypeSpec.
        let type_def_or_ref = coded(self.type_defs.max(self.type_refs), 2);
        // MemberRefParent: TypeDef, TypeRef, ModuleRef, MethodDef, TypeSpec.
        let member_ref_parent = coded(self.type_defs.max(self.type_refs).max(self.method_defs), 3);

        let type_ref = resolution_scope + s + s;
        let type_def = 4 + s + s + type_def_or_ref + simple(0) + simple(self.method_defs);
        let method_def = 4 + 2 + 2 + s + b + simple(0);
        let member_ref = member_ref_parent + s + b;

        self.type_refs as usize * type_ref
            + self.type_defs as usize * type_def
            + self.method_defs as usize * method_def
            + self.member_refs as usize * member_ref
    }
}

#[derive(Debug, Clone)]
pub struct PeFixture {
    kind: FixtureKind,
    export: Option<(String, [u16; 2])>,
    resource_version: [u16; 2],
    version_strings: Vec<(String, String)>,
    clr: Option<(String, [u16; 4], ClrLayout)>,
}

impl PeFixture {
    pub fn new(kind: FixtureKind) -> Self {
        Self { kind, export: None, resource_version: [0, 0], version_strings: Vec::new(), clr: None }
    }

    pub fn dll() -> Self {
        Self::new(FixtureKind::Dll)
    }

    pub fn exe() -> Self {
        Self::new(FixtureKind::Exe)
    }

    pub fn driver() -> Self {
        Self::new(FixtureKind::Driver)
    }

    pub fn with_export(mut self, name: &str) -> Self {
        self.export = Some((name.to_string(), [0, 0]));
        self
    }

    pub fn with_export_version(mut self, major: u16, minor: u16) -> Self {
        let name = self.export.take().map(|(n, _)| n).unwrap_or_default();
        self.export = Some((name, [major, minor]));
        self
    }

    pub fn with_resource_version(mut self, major: u16, minor: u16) -> Self {
        self.resource_version = [major, minor];
        self
    }

    pub fn with_version_string(mut self, key: &str, value: &str) -> Self {
        self.version_strings.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_clr(self, module_name: &str, version: [u16; 4]) -> Self {
        self.with_clr_layout(module_name, version, ClrLayout::default())
    }

    pub fn with_clr_layout(mut self, module_name: &str, version: [u16; 4], layout: ClrLayout) -> Self {
        self.clr = Some((module_name.to_string(), version, layout));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut section = vec![0xC3, 0, 0, 0];
        let mut directories = [(0u32, 0u32); 16];

        if let Some((name, version)) = &self.export {
            let (rva, size) = append_export(&mut section, name, *version);
            directories[DIR_EXPORT] = (rva, size);
        }
        if !self.version_strings.is_empty() || self.resource_version != [0, 0] {
            let (rva, size) = append_resources(&mut section, self.resource_version, &self.version_strings);
            directories[DIR_RESOURCE] = (rva, size);
        }
        if let Some((name, version, layout)) = &self.clr {
            let (rva, size) = append_clr(&mut section, name, *version, layout);
            directories[DIR_CLR] = (rva, size);
        }

        let raw_size = align(section.len().max(1), 0x200);
        section.resize(raw_size, 0);

        let mut image = vec![0u8; HEADERS_SIZE];
        image[0..2].copy_from_slice(b"MZ");
        put_u32(&mut image, 0x3C, PE_OFFSET as u32);
        image[PE_OFFSET..PE_OFFSET + 4].copy_from_slice(b"PE\0\0");

        let (characteristics, subsystem) = match self.kind {
            FixtureKind::Dll => (0x2102u16, 3u16),
            FixtureKind::Exe => (0x0102, 3),
            FixtureKind::Driver => (0x0102, 1),
            FixtureKind::Object => (0x0100, 3),
        };
        let coff = PE_OFFSET + 4;
        put_u16(&mut image, coff, 0x14C);
        put_u16(&mut image, coff + 2, 1);
        put_u16(&mut image, coff + 16, 224);
        put_u16(&mut image, coff + 18, characteristics);

        let oh = OPTIONAL_HEADER;
        put_u16(&mut image, oh, 0x10B);
        put_u32(&mut image, oh + 16, SECTION_RVA);
        put_u32(&mut image, oh + 20, SECTION_RVA);
        put_u32(&mut image, oh + 24, SECTION_RVA);
        put_u32(&mut image, oh + 28, 0x0040_0000);
        put_u32(&mut image, oh + 32, 0x1000);
        put_u32(&mut image, oh + 36, 0x200);
        put_u16(&mut image, oh + 40, 4);
        put_u16(&mut image, oh + 48, 4);
        put_u32(&mut image, oh + 56, SECTION_RVA + align(raw_size, 0x1000) as u32);
        put_u32(&mut image, oh + 60, HEADERS_SIZE as u32);
        put_u16(&mut image, oh + 68, subsystem);
        put_u32(&mut image, oh + 72, 0x0010_0000);
        put_u32(&mut image, oh + 76, 0x1000);
        put_u32(&mut image, oh + 80, 0x0010_0000);
        put_u32(&mut image, oh + 84, 0x1000);
        put_u32(&mut image, oh + 92, 16);

        for (index, (rva, size)) in directories.iter().enumerate() {
            put_u32(&mut image, DATA_DIRECTORIES + index * 8, *rva);
            put_u32(&mut image, DATA_DIRECTORIES + index * 8 + 4, *size);
        }

        let sh = SECTION_HEADER;
        image[sh..sh + 6].copy_from_slice(b".rdata");
        put_u32(&mut image, sh + 8, raw_size as u32);
        put_u32(&mut image, sh + 12, SECTION_RVA);
        put_u32(&mut image, sh + 16, raw_size as u32);
        put_u32(&mut image, sh + 20, HEADERS_SIZE as u32);
        put_u32(&mut image, sh + 36, 0x4000_0040);

        image.extend_from_slice(&section);
        image
    }

    pub fn write_to(&self, path: &Path) -> PathBuf {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(path, self.build()).expect("write fixture");
        path.to_path_buf()
    }
}

/// Bytes that are clearly not a PE image (PNG signature and padding).
pub fn not_a_pe() -> Vec<u8> {
    let mut bytes = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    bytes.resize(64, 0);
    bytes
}

fn align(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

fn pad4(buf: &mut Vec<u8>) {
    buf.resize(align(buf.len(), 4), 0);
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn push_u16(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_le_bytes());
}

fn rva_of(offset: usize) -> u32 {
    SECTION_RVA + offset as u32
}

/// Export directory with one named function pointing at the `ret` stub.
fn append_export(section: &mut Vec<u8>, dll_name: &str, version: [u16; 2]) -> (u32, u32) {
    pad4(section);
    let base = section.len();
    let eat = base + 40;
    let names = eat + 4;
    let ordinals = names + 4;
    let function_name = ordinals + 4;
    let dll_name_at = function_name + b"Entry\0".len();

    push_u32(section, 0);
    push_u32(section, 0);
    push_u16(section, version[0]);
    push_u16(section, version[1]);
    push_u32(section, rva_of(dll_name_at));
    push_u32(section, 1);
    push_u32(section, 1);
    push_u32(section, 1);
    push_u32(section, rva_of(eat));
    push_u32(section, rva_of(names));
    push_u32(section, rva_of(ordinals));

    push_u32(section, SECTION_RVA);
    push_u32(section, rva_of(function_name));
    push_u16(section, 0);
    push_u16(section, 0);
    section.extend_from_slice(b"Entry\0");
    section.extend_from_slice(dll_name.as_bytes());
    section.push(0);

    (rva_of(base), (section.len() - base) as u32)
}

fn utf16z(text: &str) -> Vec<u8> {
    text.encode_utf16().chain(std::iter::once(0)).flat_map(u16::to_le_bytes).collect()
}

fn version_block(key: &str, value: &[u8], value_length: u16, text: bool, children: &[Vec<u8>]) -> Vec<u8> {
    let mut block = vec![0u8; 6];
    block.extend_from_slice(&utf16z(key));
    pad4(&mut block);
    block.extend_from_slice(value);
    for child in children {
        pad4(&mut block);
        block.extend_from_slice(child);
    }
    let length = block.len() as u16;
    put_u16(&mut block, 0, length);
    put_u16(&mut block, 2, value_length);
    put_u16(&mut block, 4, u16::from(text));
    block
}

fn version_info_blob(strings: &[(String, String)]) -> Vec<u8> {
    let string_blocks: Vec<Vec<u8>> = strings
        .iter()
        .map(|(key, value)| {
            let encoded = utf16z(value);
            version_block(key, &encoded, (encoded.len() / 2) as u16, true, &[])
        })
        .collect();
    let table = version_block("040904b0", &[], 0, true, &string_blocks);
    let string_file_info = version_block("StringFileInfo", &[], 0, true, &[table]);

    let mut fixed = Vec::with_capacity(52);
    push_u32(&mut fixed, 0xFEEF_04BD);
    push_u32(&mut fixed, 0x0001_0000);
    fixed.resize(52, 0);

    version_block("VS_VERSION_INFO", &fixed, 52, false, &[string_file_info])
}

fn resource_directory(buf: &mut Vec<u8>, major: u16, minor: u16, id: u32, target: u32) {
    push_u32(buf, 0);
    push_u32(buf, 0);
    push_u16(buf, major);
    push_u16(buf, minor);
    push_u16(buf, 0);
    push_u16(buf, 1);
    push_u32(buf, id);
    push_u32(buf, target);
}

/// Resource tree: root -> RT_VERSION -> id 1 -> language 0x409 -> data.
fn append_resources(section: &mut Vec<u8>, version: [u16; 2], strings: &[(String, String)]) -> (u32, u32) {
    const SUBDIR: u32 = 0x8000_0000;
    pad4(section);
    let base = section.len();

    let mut tree = Vec::new();
    resource_directory(&mut tree, version[0], version[1], 16, SUBDIR | 24);
    resource_directory(&mut tree, 0, 0, 1, SUBDIR | 48);
    resource_directory(&mut tree, 0, 0, 0x409, 72);

    let blob = if strings.is_empty() { Vec::new() } else { version_info_blob(strings) };
    push_u32(&mut tree, rva_of(base + 88));
    push_u32(&mut tree, blob.len() as u32);
    push_u32(&mut tree, 0);
    push_u32(&mut tree, 0);
    tree.extend_from_slice(&blob);

    section.extend_from_slice(&tree);
    (rva_of(base), tree.len() as u32)
}

/// CLI header, metadata root, `#~` stream laid out per `layout`, and a
/// `#Strings` heap holding the module name.
fn append_clr(section: &mut Vec<u8>, module_name: &str, version: [u16; 4], layout: &ClrLayout) -> (u32, u32) {
    pad4(section);
    let header_at = section.len();
    let metadata_at = header_at + 72;
    let rows: Vec<(usize, u32)> = layout.rows().into_iter().filter(|(_, count)| *count > 0).collect();
    let push_str_index = |buf: &mut Vec<u8>, index: u32| {
        if layout.wide_strings {
            push_u32(buf, index);
        } else {
            push_u16(buf, index as u16);
        }
    };

    let mut tables = Vec::new();
    push_u32(&mut tables, 0);
    tables.extend_from_slice(&[2, 0, layout.heap_sizes(), 1]);
    let valid = rows.iter().fold(0u64, |mask, (table, _)| mask | (1u64 << table));
    tables.extend_from_slice(&valid.to_le_bytes());
    tables.extend_from_slice(&0u64.to_le_bytes());
    for (_, count) in &rows {
        push_u32(&mut tables, *count);
    }
    if layout.extra_data {
        push_u32(&mut tables, 0xDEAD_BEEF);
    }
    // Module: Generation, Name, Mvid, EncId, EncBaseId.
    push_u16(&mut tables, 0);
    push_str_index(&mut tables, 1);
    for _ in 0..3 {
        push_u16(&mut tables, 0);
    }
    tables.resize(tables.len() + layout.filler_rows(), 0);
    // Assembly: HashAlgId, version, Flags, PublicKey, Name, Culture.
    push_u32(&mut tables, 0x8004);
    for part in version {
        push_u16(&mut tables, part);
    }
    push_u32(&mut tables, 0);
    tables.resize(tables.len() + layout.blob_width(), 0);
    push_str_index(&mut tables, 1);
    push_str_index(&mut tables, 0);
    pad4(&mut tables);

    let mut strings = vec![0u8];
    strings.extend_from_slice(module_name.as_bytes());
    strings.push(0);
    pad4(&mut strings);

    let tables_offset = 64u32;
    let strings_offset = tables_offset + tables.len() as u32;

    let mut metadata = Vec::new();
    push_u32(&mut metadata, 0x424A_5342);
    push_u16(&mut metadata, 1);
    push_u16(&mut metadata, 1);
    push_u32(&mut metadata, 0);
    push_u32(&mut metadata, 12);
    metadata.extend_from_slice(b"v4.0.30319\0\0");
    push_u16(&mut metadata, 0);
    push_u16(&mut metadata, 2);
    push_u32(&mut metadata, tables_offset);
    push_u32(&mut metadata, tables.len() as u32);
    metadata.extend_from_slice(b"#~\0\0");
    push_u32(&mut metadata, strings_offset);
    push_u32(&mut metadata, strings.len() as u32);
    metadata.extend_from_slice(b"#Strings\0\0\0\0");
    metadata.extend_from_slice(&tables);
    metadata.extend_from_slice(&strings);

    let mut header = Vec::with_capacity(72);
    push_u32(&mut header, 72);
    push_u16(&mut header, 2);
    push_u16(&mut header, 5);
    push_u32(&mut header, rva_of(metadata_at));
    push_u32(&mut header, metadata.len() as u32);
    push_u32(&mut header, 1);
    header.resize(72, 0);

    section.extend_from_slice(&header);
    section.extend_from_slice(&metadata);
    (rva_of(header_at), 72)
}
