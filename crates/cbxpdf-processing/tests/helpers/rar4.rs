//! RAR 4.x archives with stored (uncompressed) entries, byte for byte

use flate2::Crc;

const MARKER: [u8; 7] = [0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00];

const MAIN_HEAD: u8 = 0x73;
const FILE_HEAD: u8 = 0x74;
const END_HEAD: u8 = 0x7B;

const LHD_PASSWORD: u16 = 0x0004;
const LONG_BLOCK: u16 = 0x8000;
const SKIP_IF_UNKNOWN: u16 = 0x4000;

const HOST_WIN32: u8 = 2;
const UNPACK_VERSION: u8 = 29;
const METHOD_STORE: u8 = 0x30;
const ATTR_ARCHIVE: u32 = 0x20;
// 2024-01-01 00:00 in DOS format
const DOS_TIME: u32 = 0x5821_0000;

fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc::new();
    crc.update(data);
    crc.sum()
}

/// Block header: CRC16 (low half of CRC32 over the rest), type, flags, size
fn block(head_type: u8, flags: u16, body: &[u8]) -> Vec<u8> {
    let mut head = vec![head_type];
    head.extend_from_slice(&flags.to_le_bytes());
    head.extend_from_slice(&((7 + body.len()) as u16).to_le_bytes());
    head.extend_from_slice(body);

    let mut out = ((crc32(&head) & 0xFFFF) as u16).to_le_bytes().to_vec();
    out.extend(head);
    out
}

fn file_block(name: &str, data: &[u8], encrypted: bool) -> Vec<u8> {
    let size = (data.len() as u32).to_le_bytes();
    let mut body = Vec::new();
    body.extend_from_slice(&size); // packed
    body.extend_from_slice(&size); // unpacked
    body.push(HOST_WIN32);
    body.extend_from_slice(&crc32(data).to_le_bytes());
    body.extend_from_slice(&DOS_TIME.to_le_bytes());
    body.push(UNPACK_VERSION);
    body.push(METHOD_STORE);
    body.extend_from_slice(&(name.len() as u16).to_le_bytes());
    body.extend_from_slice(&ATTR_ARCHIVE.to_le_bytes());
    body.extend_from_slice(name.as_bytes());

    let flags = LONG_BLOCK | if encrypted { LHD_PASSWORD } else { 0 };
    let mut out = block(FILE_HEAD, flags, &body);
    out.extend_from_slice(data);
    out
}

fn build(entries: &[(&str, Vec<u8>)], encrypted: bool) -> Vec<u8> {
    let mut out = MARKER.to_vec();
    out.extend(block(MAIN_HEAD, 0, &[0u8; 6]));
    for (name, data) in entries {
        out.extend(file_block(name, data, encrypted));
    }
    out.extend(block(END_HEAD, SKIP_IF_UNKNOWN, &[]));
    out
}

/// Plain RAR holding `entries` in the given order
pub fn rar(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    build(entries, false)
}

/// RAR whose entries are all flagged password-protected. The payload is
/// opaque filler; only the headers are meant to be read.
pub fn encrypted_rar(names: &[&str]) -> Vec<u8> {
    let entries: Vec<(&str, Vec<u8>)> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, vec![i as u8 ^ 0x5A; 32]))
        .collect();
    build(&entries, true)
}
