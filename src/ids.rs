use rand::{rngs::OsRng, Rng};

/// Nanoid alphabet without lookalike characters (`0`, `I`, `l`, `O`).
const ID_ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Base32-ish alphabet for session tokens.
const SESSION_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

const ID_RANDOM_LEN: usize = 12;
const SESSION_ID_LEN: usize = 40;

/// Generate a prefixed record id, e.g. `usr_4QkT8mZp2WnX`. The prefix is
/// three characters plus an underscore, so the whole id is 16 characters,
/// the width of the id columns.
pub fn generate_id(prefix: &str) -> String {
    debug_assert_eq!(prefix.len(), 3);
    let mut rng = OsRng;
    let mut id = String::with_capacity(prefix.len() + 1 + ID_RANDOM_LEN);
    id.push_str(prefix);
    id.push('_');
    for _ in 0..ID_RANDOM_LEN {
        id.push(ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char);
    }
    id
}

/// Generate an unguessable session token from the OS CSPRNG.
pub fn generate_session_id() -> String {
    let mut rng = OsRng;
    (0..SESSION_ID_LEN)
        .map(|_| SESSION_ALPHABET[rng.gen_range(0..SESSION_ALPHABET.len())] as char)
        .collect()
}
