//! Resource directory walking and `VS_VERSIONINFO` decoding.

use crate::model::ModuleVersion;
use crate::services::backends::image::{align4, read_u16, ImageView};
use crate::services::inspector::VersionEntries;

/// Resource type id of version resources.
const RT_VERSION: u32 = 16;
/// Directory nesting is type / name / language.
const MAX_DEPTH: usize = 3;
const SUBDIRECTORY_FLAG: u32 = 0x8000_0000;
const TEXT_VALUE: u16 = 1;

/// What the resource directory contributes to a binary identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceInfo {
    /// Major/minor from the root resource directory, when present.
    pub version: Option<ModuleVersion>,
    pub version_entries: Vec<VersionEntries>,
}

/// Read the resource directory whose root lives at `root_rva`.
pub fn read_resources(image: &ImageView, root_rva: u32) -> Option<ResourceInfo> {
    let root = image.offset_of(root_rva)?;
    let major = image.u16_at(root + 8)?;
    let minor = image.u16_at(root + 10)?;

    let mut info = ResourceInfo { version: Some(ModuleVersion::new([major, minor])), ..Default::default() };

    let Some(version_dir) = find_type_directory(image, root, RT_VERSION) else {
        return Some(info);
    };
    let mut data_entries = Vec::new();
    collect_data_entries(image, root, version_dir, 2, &mut data_entries);

    for entry in data_entries {
        let Some(rva) = image.u32_at(entry) else { continue };
        let Some(size) = image.u32_at(entry + 4) else { continue };
        if let Some(blob) = image.slice_at_rva(rva, size as usize) {
            info.version_entries.extend(parse_version_info(blob));
        }
    }
    Some(info)
}

fn directory_entries(image: &ImageView, dir: usize) -> Vec<(u32, u32)> {
    let named = image.u16_at(dir + 12).unwrap_or(0) as usize;
    let ids = image.u16_at(dir + 14).unwrap_or(0) as usize;
    (0..named + ids)
        .map_while(|i| {
            let at = dir + 16 + i * 8;
            Some((image.u32_at(at)?, image.u32_at(at + 4)?))
        })
        .collect()
}

fn find_type_directory(image: &ImageView, root: usize, type_id: u32) -> Option<usize> {
    directory_entries(image, root).into_iter().find_map(|(name, data)| {
        let is_id = name & SUBDIRECTORY_FLAG == 0;
        if is_id && name == type_id && data & SUBDIRECTORY_FLAG != 0 {
            Some(root + (data & !SUBDIRECTORY_FLAG) as usize)
        } else {
            None
        }
    })
}

fn collect_data_entries(image: &ImageView, root: usize, dir: usize, depth: usize, out: &mut Vec<usize>) {
    if depth > MAX_DEPTH {
        return;
    }
    for (_, data) in directory_entries(image, dir) {
        let target = root + (data & !SUBDIRECTORY_FLAG) as usize;
        if data & SUBDIRECTORY_FLAG != 0 {
            if target != dir {
                collect_data_entries(image, root, target, depth + 1, out);
            }
        } else {
            out.push(target);
        }
    }
}

struct Block<'a> {
    key: String,
    is_text: bool,
    value_area: &'a [u8],
    children: Vec<Block<'a>>,
    end: usize,
}

fn read_utf16z(data: &[u8], start: usize, end: usize) -> (String, usize) {
    let mut units = Vec::new();
    let mut cursor = start;
    while cursor + 2 <= end {
        let Some(unit) = read_u16(data, cursor) else { break };
        cursor += 2;
        if unit == 0 {
            break;
        }
        units.push(unit);
    }
    (String::from_utf16_lossy(&units), cursor)
}

fn parse_block(data: &[u8], start: usize) -> Option<Block<'_>> {
    let length = read_u16(data, start)? as usize;
    let value_length = read_u16(data, start + 2)? as usize;
    let kind = read_u16(data, start + 4)?;
    if length < 6 {
        return None;
    }
    let end = (start + length).min(data.len());
    let (key, after_key) = read_utf16z(data, start + 6, end);
    let value_start = align4(after_key).min(end);
    let value_bytes = if kind == TEXT_VALUE { value_length * 2 } else { value_length };

    let mut children = Vec::new();
    let mut cursor = align4(value_start + value_bytes);
    while cursor + 6 <= end {
        match parse_block(data, cursor) {
            Some(child) => {
                cursor = align4(child.end);
                children.push(child);
            }
            None => break,
        }
    }

    Some(Block { key, is_text: kind == TEXT_VALUE, value_area: &data[value_start..end], children, end })
}

fn text_value(block: &Block) -> String {
    let (text, _) = read_utf16z(block.value_area, 0, block.value_area.len());
    text
}

/// Decode the `StringFileInfo` tables of a raw `VS_VERSIONINFO` blob.
///
/// Returns one map per language/codepage table, in file order. Malformed
/// trailing data is ignored.
pub fn parse_version_info(blob: &[u8]) -> Vec<VersionEntries> {
    let Some(root) = parse_block(blob, 0) else {
        return Vec::new();
    };

    let mut tables = Vec::new();
    for info in root.children.iter().filter(|c| c.key == "StringFileInfo") {
        for table in &info.children {
            let entries: VersionEntries = table
                .children
                .iter()
                .filter(|s| s.is_text || !s.value_area.is_empty())
                .map(|s| (s.key.clone(), text_value(s)))
                .collect();
            if !entries.is_empty() {
                tables.push(entries);
            }
        }
    }
    tables
}
