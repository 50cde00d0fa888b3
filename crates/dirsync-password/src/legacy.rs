use des::Des;
use des::cipher::generic_array::GenericArray;
use des::cipher::{BlockEncrypt, KeyInit};
use md4::{Digest, Md4};

const LM_MAGIC: &[u8; 8] = b"KGS!@#$%";
const LM_PASSWORD_LEN: usize = 14;

/// LAN Manager hash, uppercase hex.
///
/// The password is ASCII-uppercased, truncated or NUL-padded to 14 bytes and
/// split into two DES keys that each encrypt a fixed magic block.
pub fn encode_lm(plaintext: &str) -> String {
    let mut padded = [0u8; LM_PASSWORD_LEN];
    for (slot, byte) in padded.iter_mut().zip(plaintext.as_bytes()) {
        *slot = byte.to_ascii_uppercase();
    }
    let mut out = Vec::with_capacity(16);
    for half in padded.chunks_exact(7) {
        let key = expand_des_key(half);
        let cipher = Des::new(GenericArray::from_slice(&key));
        let mut block = GenericArray::clone_from_slice(LM_MAGIC);
        cipher.encrypt_block(&mut block);
        out.extend_from_slice(&block);
    }
    hex::encode_upper(out)
}

/// NT hash: MD4 over the UTF-16LE password, uppercase hex.
pub fn encode_nt(plaintext: &str) -> String {
    let utf16: Vec<u8> = plaintext
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect();
    hex::encode_upper(Md4::digest(&utf16))
}

/// Spread 56 key bits over 8 bytes; the low bit of each byte is DES parity.
fn expand_des_key(b: &[u8]) -> [u8; 8] {
    let key = [
        b[0] >> 1,
        ((b[0] & 0x01) << 6) | (b[1] >> 2),
        ((b[1] & 0x03) << 5) | (b[2] >> 3),
        ((b[2] & 0x07) << 4) | (b[3] >> 4),
        ((b[3] & 0x0F) << 3) | (b[4] >> 5),
        ((b[4] & 0x1F) << 2) | (b[5] >> 6),
        ((b[5] & 0x3F) << 1) | (b[6] >> 7),
        b[6] & 0x7F,
    ];
    key.map(|k| k << 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_match_known_lm_vectors() {
        assert_eq!(encode_lm(""), "AAD3B435B51404EEAAD3B435B51404EE");
        assert_eq!(encode_lm("password"), "E52CAC67419A9A224A3B108F3FA6CB6D");
    }

    #[test]
    fn should_ignore_case_for_lm() {
        assert_eq!(encode_lm("PassWord"), encode_lm("password"));
    }

    #[test]
    fn should_truncate_lm_input_to_fourteen_bytes() {
        assert_eq!(encode_lm("abcdefghijklmn"), encode_lm("abcdefghijklmnopqrst"));
    }

    #[test]
    fn should_match_known_nt_vectors() {
        assert_eq!(encode_nt(""), "31D6CFE0D16AE931B73C59D7E0C089C0");
        assert_eq!(encode_nt("password"), "8846F7EAEE8FB117AD06BDD830B7586C");
    }

    #[test]
    fn should_keep_case_for_nt() {
        assert_ne!(encode_nt("Password"), encode_nt("password"));
    }
}
