use crate::EventMask;

/// Size of the fixed `struct inotify_event` header: wd, mask, cookie, len.
pub const HEADER_SIZE: usize = 16;
/// Longest name the kernel puts after a header: NAME_MAX plus the NUL.
pub const MAX_NAME_SIZE: usize = 255 + 1;

/// One change record, borrowed from the read buffer it was decoded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawChangeRecord<'a> {
    pub handle: i32,
    pub mask: EventMask,
    pub cookie: u32,
    /// Length of the name field as reported by the kernel, padding included.
    pub name_len: u32,
    /// Name field with its trailing NUL padding, exactly `name_len` bytes.
    pub name: &'a [u8],
}

impl<'a> RawChangeRecord<'a> {
    /// The name with NUL padding stripped; empty for events on the watched
    /// path itself.
    pub fn name_bytes(&self) -> &'a [u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(self.name.len());
        &self.name[..end]
    }
}

/// Iterator over the complete records in the first `length` bytes of a
/// buffer. A partial trailing record is dropped, never patched up.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    buffer: &'a [u8],
    cursor: usize,
}

impl<'a> Records<'a> {
    pub fn new(buffer: &'a [u8], length: usize) -> Self {
        let length = length.min(buffer.len());
        Self {
            buffer: &buffer[..length],
            cursor: 0,
        }
    }

    /// Bytes consumed by the records yielded so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = RawChangeRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.buffer.get(self.cursor..)?;
        let header = rest.get(..HEADER_SIZE)?;
        let name_len = read_u32(header, 12);
        let name = rest.get(HEADER_SIZE..HEADER_SIZE.checked_add(name_len as usize)?)?;
        let record = RawChangeRecord {
            handle: read_u32(header, 0) as i32,
            mask: EventMask::from_bits_retain(read_u32(header, 4)),
            cookie: read_u32(header, 8),
            name_len,
            name,
        };
        self.cursor += HEADER_SIZE + name.len();
        Some(record)
    }
}

fn read_u32(header: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&header[offset..offset + 4]);
    u32::from_ne_bytes(bytes)
}

/// Lays a record out the way the kernel does: the name is NUL terminated and
/// padded to a multiple of the header size.
#[cfg(test)]
pub(crate) fn encode_record(handle: i32, mask: EventMask, cookie: u32, name: &str) -> Vec<u8> {
    let name_len = if name.is_empty() {
        0
    } else {
        (name.len() + 1).next_multiple_of(HEADER_SIZE)
    };
    let mut out = Vec::with_capacity(HEADER_SIZE + name_len);
    out.extend_from_slice(&handle.to_ne_bytes());
    out.extend_from_slice(&mask.bits().to_ne_bytes());
    out.extend_from_slice(&cookie.to_ne_bytes());
    out.extend_from_slice(&(name_len as u32).to_ne_bytes());
    out.extend_from_slice(name.as_bytes());
    out.resize(HEADER_SIZE + name_len, 0);
    out
}
