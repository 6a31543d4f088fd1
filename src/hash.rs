// src/hash.rs
use sha2::{Digest, Sha256};

/// One item fed to [`hash`]. The set of accepted inputs is closed, so nothing
/// can be silently skipped.
#[derive(Debug, Clone, Copy)]
pub enum HashInput<'a> {
    Text(&'a str),
    Integer(i64),
    Bytes(&'a [u8]),
}

impl HashInput<'_> {
    fn tag(&self) -> u8 {
        match self {
            HashInput::Text(_) => b's',
            HashInput::Integer(_) => b'i',
            HashInput::Bytes(_) => b'b',
        }
    }
}

/// SHA-256 over the framed items, as lower-case hex.
///
/// Every item is written as `tag | len (u64 BE) | bytes`, integers as decimal
/// text. The framing keeps neighbouring items from trading bytes.
pub fn hash(items: &[HashInput<'_>]) -> String {
    let mut hasher = Sha256::new();
    for item in items {
        hasher.update([item.tag()]);
        match item {
            HashInput::Text(s) => write_framed(&mut hasher, s.as_bytes()),
            HashInput::Integer(n) => write_framed(&mut hasher, n.to_string().as_bytes()),
            HashInput::Bytes(b) => write_framed(&mut hasher, b),
        }
    }
    hex::encode(hasher.finalize())
}

fn write_framed(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable_and_path_safe() {
        let a = hash(&[HashInput::Text("hello"), HashInput::Integer(42)]);
        let b = hash(&[HashInput::Text("hello"), HashInput::Integer(42)]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn adjacent_items_do_not_collide() {
        let a = hash(&[HashInput::Integer(1), HashInput::Integer(23)]);
        let b = hash(&[HashInput::Integer(12), HashInput::Integer(3)]);
        assert_ne!(a, b);

        let c = hash(&[HashInput::Text("ab"), HashInput::Text("c")]);
        let d = hash(&[HashInput::Text("a"), HashInput::Text("bc")]);
        assert_ne!(c, d);
    }

    #[test]
    fn variant_is_part_of_the_digest() {
        let text = hash(&[HashInput::Text("7")]);
        let int = hash(&[HashInput::Integer(7)]);
        let bytes = hash(&[HashInput::Bytes(b"7")]);
        assert_ne!(text, int);
        assert_ne!(text, bytes);
        assert_ne!(int, bytes);
    }

    #[test]
    fn order_matters() {
        let a = hash(&[HashInput::Text("x"), HashInput::Text("y")]);
        let b = hash(&[HashInput::Text("y"), HashInput::Text("x")]);
        assert_ne!(a, b);
    }
}
