use rand::RngExt;

/// Length of generated default passwords.
pub const DEFAULT_SECRET_LEN: usize = 32;

const CHARSET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#$%^&*()_+=[]{};',./|\\";

/// Random password drawn from letters, digits and a fixed symbol set.
pub fn generate_random_secret(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_generate_requested_length() {
        assert_eq!(generate_random_secret(DEFAULT_SECRET_LEN).len(), 32);
        assert_eq!(generate_random_secret(8).len(), 8);
        assert!(generate_random_secret(0).is_empty());
    }

    #[test]
    fn should_draw_from_charset() {
        let secret = generate_random_secret(256);
        assert!(secret.bytes().all(|b| CHARSET.contains(&b)));
    }

    #[test]
    fn should_not_repeat() {
        assert_ne!(generate_random_secret(32), generate_random_secret(32));
    }
}
