use rand::rngs::OsRng;
use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of the opaque path segment GitHub posts deliveries to.
pub const HOOK_PATH_LEN: usize = 20;
pub const HOOK_SECRET_LEN: usize = 40;

/// Random string of `length` ASCII letters drawn from the OS CSPRNG.
///
/// Both callback tokens and HMAC secrets come from here, so the source must
/// stay unpredictable.
pub fn generate(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
