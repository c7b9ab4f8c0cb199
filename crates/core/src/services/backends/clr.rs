//! CLI (.NET) metadata: module name and assembly version.
//!
//! Only the `#~` table stream and the `#Strings` heap are consulted. The
//! Module table is always first, so its name sits right after the row counts;
//! reaching the Assembly table requires the row size of every table before it.

use crate::model::ModuleVersion;
use crate::services::backends::image::{align4, read_cstr, read_u16, read_u32, read_u64, read_u8, ImageView};

const METADATA_SIGNATURE: u32 = 0x424A_5342;
const MODULE_TABLE: usize = 0x00;
const ASSEMBLY_TABLE: usize = 0x20;
const EXTRA_DATA_FLAG: u8 = 0x40;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClrInfo {
    pub module_name: Option<String>,
    pub assembly_version: Option<ModuleVersion>,
}

struct CodedIndex {
    tables: &'static [usize],
    tag_bits: u32,
}

const TYPE_DEF_OR_REF: CodedIndex = CodedIndex { tables: &[0x02, 0x01, 0x1B], tag_bits: 2 };
const HAS_CONSTANT: CodedIndex = CodedIndex { tables: &[0x04, 0x08, 0x17], tag_bits: 2 };
const HAS_CUSTOM_ATTRIBUTE: CodedIndex = CodedIndex {
    tables: &[
        0x06, 0x04, 0x01, 0x02, 0x08, 0x09, 0x0A, 0x00, 0x0E, 0x17, 0x14, 0x11, 0x1A, 0x1B, 0x20,
        0x23, 0x26, 0x27, 0x28, 0x2A, 0x2C, 0x2B,
    ],
    tag_bits: 5,
};
const HAS_FIELD_MARSHAL: CodedIndex = CodedIndex { tables: &[0x04, 0x08], tag_bits: 1 };
const HAS_DECL_SECURITY: CodedIndex = CodedIndex { tables: &[0x02, 0x06, 0x20], tag_bits: 2 };
const MEMBER_REF_PARENT: CodedIndex =
    CodedIndex { tables: &[0x02, 0x01, 0x1A, 0x06, 0x1B], tag_bits: 3 };
const HAS_SEMANTICS: CodedIndex = CodedIndex { tables: &[0x14, 0x17], tag_bits: 1 };
const METHOD_DEF_OR_REF: CodedIndex = CodedIndex { tables: &[0x06, 0x0A], tag_bits: 1 };
const MEMBER_FORWARDED: CodedIndex = CodedIndex { tables: &[0x04, 0x06], tag_bits: 1 };
const CUSTOM_ATTRIBUTE_TYPE: CodedIndex = CodedIndex { tables: &[0x06, 0x0A], tag_bits: 3 };
const RESOLUTION_SCOPE: CodedIndex = CodedIndex { tables: &[0x00, 0x1A, 0x23, 0x01], tag_bits: 2 };

enum Col {
    U16,
    U32,
    Str,
    Guid,
    Blob,
    Table(usize),
    Coded(&'static CodedIndex),
}

use Col::*;

/// Column layout of tables 0x00..0x1F (everything preceding Assembly).
const TABLE_COLUMNS: [&[Col]; ASSEMBLY_TABLE] = [
    &[U16, Str, Guid, Guid, Guid],                                    // Module
    &[Coded(&RESOLUTION_SCOPE), Str, Str],                            // TypeRef
    &[U32, Str, Str, Coded(&TYPE_DEF_OR_REF), Table(0x04), Table(0x06)], // TypeDef
    &[Table(0x04)],                                                   // FieldPtr
    &[U16, Str, Blob],                                                // Field
    &[Table(0x06)],                                                   // MethodPtr
    &[U32, U16, U16, Str, Blob, Table(0x08)],                         // MethodDef
    &[Table(0x08)],                                                   // ParamPtr
    &[U16, U16, Str],                                                 // Param
    &[Table(0x02), Coded(&TYPE_DEF_OR_REF)],                          // InterfaceImpl
    &[Coded(&MEMBER_REF_PARENT), Str, Blob],                          // MemberRef
    &[U16, Coded(&HAS_CONSTANT), Blob],                               // Constant
    &[Coded(&HAS_CUSTOM_ATTRIBUTE), Coded(&CUSTOM_ATTRIBUTE_TYPE), Blob], // CustomAttribute
    &[Coded(&HAS_FIELD_MARSHAL), Blob],                               // FieldMarshal
    &[U16, Coded(&HAS_DECL_SECURITY), Blob],                          // DeclSecurity
    &[U16, U32, Table(0x02)],                                         // ClassLayout
    &[U32, Table(0x04)],                                              // FieldLayout
    &[Blob],                                                          // StandAloneSig
    &[Table(0x02), Table(0x14)],                                      // EventMap
    &[Table(0x14)],                                                   // EventPtr
    &[U16, Str, Coded(&TYPE_DEF_OR_REF)],                             // Event
    &[Table(0x02), Table(0x17)],                                      // PropertyMap
    &[Table(0x17)],                                                   // PropertyPtr
    &[U16, Str, Blob],                                                // Property
    &[U16, Table(0x06), Coded(&HAS_SEMANTICS)],                       // MethodSemantics
    &[Table(0x02), Coded(&METHOD_DEF_OR_REF), Coded(&METHOD_DEF_OR_REF)], // MethodImpl
    &[Str],                                                           // ModuleRef
    &[Blob],                                                          // TypeSpec
    &[U16, Coded(&MEMBER_FORWARDED), Str, Table(0x1A)],               // ImplMap
    &[U32, Table(0x04)],                                              // FieldRVA
    &[U32, U32],                                                      // EncLog
    &[U32],                                                           // EncMap
];

struct TableStream {
    rows: [u32; 64],
    string_index: usize,
    guid_index: usize,
    blob_index: usize,
    /// Offset (within the stream) of the first table row.
    data_start: usize,
}

impl TableStream {
    fn parse(stream: &[u8]) -> Option<Self> {
        let heap_sizes = read_u8(stream, 6)?;
        let valid = read_u64(stream, 8)?;
        let mut rows = [0u32; 64];
        let mut cursor = 24;
        for (table, count) in rows.iter_mut().enumerate() {
            if valid & (1u64 << table) != 0 {
                *count = read_u32(stream, cursor)?;
                cursor += 4;
            }
        }
        if heap_sizes & EXTRA_DATA_FLAG != 0 {
            cursor += 4;
        }
        Some(Self {
            rows,
            string_index: if heap_sizes & 0x01 != 0 { 4 } else { 2 },
            guid_index: if heap_sizes & 0x02 != 0 { 4 } else { 2 },
            blob_index: if heap_sizes & 0x04 != 0 { 4 } else { 2 },
            data_start: cursor,
        })
    }

    fn column_size(&self, col: &Col) -> usize {
        match col {
            U16 => 2,
            U32 => 4,
            Str => self.string_index,
            Guid => self.guid_index,
            Blob => self.blob_index,
            Table(t) => {
                if self.rows[*t] > 0xFFFF {
                    4
                } else {
                    2
                }
            }
            Coded(index) => {
                let max_rows = index.tables.iter().map(|t| self.rows[*t]).max().unwrap_or(0);
                if (max_rows as u64) < (1u64 << (16 - index.tag_bits)) {
                    2
                } else {
                    4
                }
            }
        }
    }

    fn row_size(&self, table: usize) -> usize {
        TABLE_COLUMNS[table].iter().map(|col| self.column_size(col)).sum()
    }

    fn table_offset(&self, table: usize) -> usize {
        self.data_start
            + (0..table).map(|t| self.rows[t] as usize * self.row_size(t)).sum::<usize>()
    }

    fn read_string_index(&self, stream: &[u8], offset: usize) -> Option<u32> {
        if self.string_index == 4 {
            read_u32(stream, offset)
        } else {
            read_u16(stream, offset).map(u32::from)
        }
    }
}

/// Locate the metadata streams named `#~` (or `#-`) and `#Strings`.
fn find_streams<'a>(metadata: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
    if read_u32(metadata, 0)? != METADATA_SIGNATURE {
        return None;
    }
    let version_len = read_u32(metadata, 12)? as usize;
    let header = 16usize.checked_add(version_len)?;
    let stream_count = read_u16(metadata, header + 2)? as usize;

    let mut tables = None;
    let mut strings = None;
    let mut cursor = header + 4;
    for _ in 0..stream_count {
        let offset = read_u32(metadata, cursor)? as usize;
        let size = read_u32(metadata, cursor + 4)? as usize;
        let name = read_cstr(metadata, cursor + 8, cursor + 8 + 32)?;
        cursor = align4(cursor + 8 + name.len() + 1);

        let end = offset.checked_add(size)?.min(metadata.len());
        let data = metadata.get(offset..end)?;
        match name.as_str() {
            "#~" | "#-" => tables = Some(data),
            "#Strings" => strings = Some(data),
            _ => {}
        }
    }
    Some((tables?, strings?))
}

/// Read module name and assembly version through the CLI header at `cli_header_rva`.
pub fn read_clr(image: &ImageView, cli_header_rva: u32) -> Option<ClrInfo> {
    let header = image.offset_of(cli_header_rva)?;
    let metadata_rva = image.u32_at(header + 8)?;
    let metadata_size = image.u32_at(header + 12)?;
    let metadata = image.slice_at_rva(metadata_rva, metadata_size as usize)?;

    let (stream, strings) = find_streams(metadata)?;
    let tables = TableStream::parse(stream)?;
    let mut info = ClrInfo::default();

    if tables.rows[MODULE_TABLE] > 0 {
        let name_at = tables.table_offset(MODULE_TABLE) + 2;
        info.module_name = tables
            .read_string_index(stream, name_at)
            .and_then(|idx| read_cstr(strings, idx as usize, strings.len()))
            .filter(|name| !name.is_empty());
    }

    if tables.rows[ASSEMBLY_TABLE] > 0 {
        // HashAlgId (u32) precedes the four version words.
        let row = tables.table_offset(ASSEMBLY_TABLE) + 4;
        let parts: Option<Vec<u16>> = (0..4).map(|i| read_u16(stream, row + i * 2)).collect();
        info.assembly_version = parts.map(ModuleVersion::new);
    }

    Some(info)
}
