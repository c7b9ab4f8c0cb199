use goblin::pe::section_table::SectionTable;

/// Little-endian reads over a PE file image, addressed by file offset or RVA.
///
/// Every accessor is bounds-checked and returns `None` instead of panicking,
/// since the structures it reads come straight from untrusted files.
pub struct ImageView<'a> {
    bytes: &'a [u8],
    sections: &'a [SectionTable],
}

impl<'a> ImageView<'a> {
    pub fn new(bytes: &'a [u8], sections: &'a [SectionTable]) -> Self {
        Self { bytes, sections }
    }

    /// Map an RVA to a file offset through the section table.
    pub fn offset_of(&self, rva: u32) -> Option<usize> {
        let rva = rva as u64;
        for sec in self.sections {
            let start = sec.virtual_address as u64;
            let size = if sec.virtual_size == 0 {
                sec.size_of_raw_data as u64
            } else {
                sec.virtual_size as u64
            };
            if rva >= start && rva < start + size {
                let delta = rva - start;
                if delta >= sec.size_of_raw_data as u64 {
                    return None;
                }
                let offset = sec.pointer_to_raw_data as u64 + delta;
                return if (offset as usize) < self.bytes.len() { Some(offset as usize) } else { None };
            }
        }
        None
    }

    /// Bytes `[rva, rva + len)`, truncated to what the file actually holds.
    pub fn slice_at_rva(&self, rva: u32, len: usize) -> Option<&'a [u8]> {
        let start = self.offset_of(rva)?;
        let end = start.saturating_add(len).min(self.bytes.len());
        self.bytes.get(start..end)
    }

    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        read_u16(self.bytes, offset)
    }

    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        read_u32(self.bytes, offset)
    }
}

pub fn read_u8(bytes: &[u8], offset: usize) -> Option<u8> {
    bytes.get(offset).copied()
}

pub fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let b = bytes.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes([b[0], b[1]]))
}

pub fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let b = bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn read_u64(bytes: &[u8], offset: usize) -> Option<u64> {
    let b = bytes.get(offset..offset.checked_add(8)?)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    Some(u64::from_le_bytes(buf))
}

/// NUL-terminated UTF-8 string starting at `offset`, bounded by `limit`.
pub fn read_cstr(bytes: &[u8], offset: usize, limit: usize) -> Option<String> {
    let end = limit.min(bytes.len());
    let tail = bytes.get(offset..end)?;
    let len = tail.iter().position(|b| *b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..len]).into_owned())
}

pub fn align4(value: usize) -> usize {
    (value + 3) & !3
}
