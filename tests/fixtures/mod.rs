//! Synthetic QuickTime/MP4 files for tests
//!
//! Real media is not needed: the rewrite only cares about box layout and the
//! chunk offset tables, so the fixtures are built byte by byte.

#![allow(dead_code)]

/// Build a box with a 32-bit size header
pub fn make_box(atom_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&((body.len() + 8) as u32).to_be_bytes());
    data.extend_from_slice(atom_type);
    data.extend_from_slice(body);
    data
}

/// Build a box with a 64-bit extended size header
pub fn make_large_box(atom_type: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&1u32.to_be_bytes());
    data.extend_from_slice(atom_type);
    data.extend_from_slice(&((body.len() + 16) as u64).to_be_bytes());
    data.extend_from_slice(body);
    data
}

pub fn make_ftyp() -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(b"isom"); // major brand
    body.extend_from_slice(&0x200u32.to_be_bytes()); // minor version
    body.extend_from_slice(b"isomiso2mp41"); // compatible brands
    make_box(b"ftyp", &body)
}

pub fn make_stco(entries: &[u32]) -> Vec<u8> {
    let mut body = 0u32.to_be_bytes().to_vec(); // version + flags
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        body.extend_from_slice(&entry.to_be_bytes());
    }
    make_box(b"stco", &body)
}

pub fn make_co64(entries: &[u64]) -> Vec<u8> {
    let mut body = 0u32.to_be_bytes().to_vec(); // version + flags
    body.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for entry in entries {
        body.extend_from_slice(&entry.to_be_bytes());
    }
    make_box(b"co64", &body)
}

fn moov_body(table: &[u8]) -> Vec<u8> {
    let stbl = make_box(b"stbl", table);
    let minf = make_box(b"minf", &stbl);
    let mdia = make_box(b"mdia", &minf);
    let trak = make_box(b"trak", &mdia);
    let mut body = make_box(b"mvhd", &[0u8; 100]);
    body.extend(trak);
    body
}

/// Build moov { mvhd, trak { mdia { minf { stbl { <table> } } } } }
pub fn make_moov(table: &[u8]) -> Vec<u8> {
    make_box(b"moov", &moov_body(table))
}

/// Same as [`make_moov`] but with a 64-bit size header
pub fn make_large_moov(table: &[u8]) -> Vec<u8> {
    make_large_box(b"moov", &moov_body(table))
}

/// Media chunks stored in the mdat of the fixtures
pub const CHUNKS: [&[u8]; 3] = [b"first chunk.", b"second chunk", b"third chunk!"];

fn mdat_body() -> Vec<u8> {
    CHUNKS.concat()
}

/// Absolute offsets of the chunks when the mdat header ends at `data_start`
pub fn chunk_offsets(data_start: u64) -> Vec<u64> {
    let mut offsets = Vec::new();
    let mut pos = data_start;
    for chunk in CHUNKS {
        offsets.push(pos);
        pos += chunk.len() as u64;
    }
    offsets
}

/// ftyp | free | mdat | moov(stco)
pub fn slow_start_mp4() -> Vec<u8> {
    let mut data = make_ftyp();
    data.extend(make_box(b"free", &[0u8; 8]));
    let data_start = (data.len() + 8) as u64;
    data.extend(make_box(b"mdat", &mdat_body()));
    let offsets: Vec<u32> = chunk_offsets(data_start)
        .into_iter()
        .map(|o| o as u32)
        .collect();
    data.extend(make_moov(&make_stco(&offsets)));
    data
}

/// ftyp | mdat (64-bit size) | moov(co64)
pub fn slow_start_mp4_co64() -> Vec<u8> {
    let mut data = make_ftyp();
    let data_start = (data.len() + 16) as u64;
    data.extend(make_large_box(b"mdat", &mdat_body()));
    data.extend(make_moov(&make_co64(&chunk_offsets(data_start))));
    data
}

/// ftyp | mdat | moov(stco) where moov carries a 64-bit size
pub fn slow_start_mp4_large_moov() -> Vec<u8> {
    let mut data = make_ftyp();
    let data_start = (data.len() + 8) as u64;
    data.extend(make_box(b"mdat", &mdat_body()));
    let offsets: Vec<u32> = chunk_offsets(data_start)
        .into_iter()
        .map(|o| o as u32)
        .collect();
    data.extend(make_large_moov(&make_stco(&offsets)));
    data
}

/// mdat | moov(stco), without an ftyp box
pub fn slow_start_mov_without_ftyp() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend(make_box(b"mdat", &mdat_body()));
    let offsets: Vec<u32> = chunk_offsets(8).into_iter().map(|o| o as u32).collect();
    data.extend(make_moov(&make_stco(&offsets)));
    data
}

pub fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

pub fn read_u64(data: &[u8], pos: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[pos..pos + 8]);
    u64::from_be_bytes(bytes)
}

/// Locate the first box of the given type by scanning for its tag
pub fn find_tag(data: &[u8], tag: &[u8; 4]) -> Option<usize> {
    data.windows(4).position(|w| w == tag).map(|p| p - 4)
}

/// Chunk offsets listed in the first stco or co64 table of a file
pub fn table_entries(data: &[u8]) -> Vec<u64> {
    if let Some(start) = find_tag(data, b"stco") {
        let count = read_u32(data, start + 12) as usize;
        (0..count)
            .map(|i| read_u32(data, start + 16 + i * 4) as u64)
            .collect()
    } else if let Some(start) = find_tag(data, b"co64") {
        let count = read_u32(data, start + 12) as usize;
        (0..count)
            .map(|i| read_u64(data, start + 16 + i * 8))
            .collect()
    } else {
        Vec::new()
    }
}
