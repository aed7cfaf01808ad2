/// 32-byte blake3 digest of `input`; used as the seed of a search run.
pub fn u8s_from_str(input: &str) -> [u8; 32] {
    blake3::hash(input.as_bytes()).into()
}

pub fn hex_from_u8s(input: &[u8]) -> String {
    input.iter().map(|b| format!("{:02x}", b)).collect()
}
