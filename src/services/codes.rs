use rand::{distributions::Alphanumeric, Rng};

/// Check-in code alphabet; drops 0/O and 1/I so codes can be read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const API_TOKEN_LEN: usize = 40;
pub const ATTENDEE_CODE_LEN: usize = 10;

pub fn api_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(API_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn attendee_code() -> String {
    let mut rng = rand::thread_rng();
    (0..ATTENDEE_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_token_shape() {
        let token = api_token();
        assert_eq!(token.len(), API_TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(token, api_token());
    }

    #[test]
    fn test_attendee_code_uses_unambiguous_alphabet() {
        for _ in 0..50 {
            let code = attendee_code();
            assert_eq!(code.len(), ATTENDEE_CODE_LEN);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}
