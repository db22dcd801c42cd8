use base64::{Engine, engine::general_purpose::{STANDARD, URL_SAFE, URL_SAFE_NO_PAD}};
use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::Rng;
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const ITERATIONS: u32 = 260000;
const KEY_LENGTH: usize = 32;
const SALT_LENGTH: usize = 16;

/// Hash un mot de passe au format Werkzeug (compatible Python)
/// Format: `pbkdf2:sha256:<iterations>$<salt>$<hash>`
pub fn hash_password_with(password: &str, iterations: u32) -> Result<String, String> {
    // Générer un salt aléatoire de 16 bytes
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill(&mut salt);

    let mut key = [0u8; KEY_LENGTH];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut key)
        .map_err(|e| format!("PBKDF2 hash generation failed: {}", e))?;

    Ok(format!(
        "pbkdf2:sha256:{}${}${}",
        iterations,
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(key)
    ))
}

/// Check a password against a stored Werkzeug-style hash.
/// The iteration count is read back from the hash itself.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, String> {
    let mut parts = stored_hash.split('$');
    let (Some(header), Some(salt_str), Some(hash_str), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err("Invalid hash format".to_string());
    };

    let iterations = match header.split(':').collect::<Vec<_>>().as_slice() {
        ["pbkdf2", "sha256", iterations] => iterations
            .parse::<u32>()
            .map_err(|_| "Invalid iterations".to_string())?,
        _ => return Err("Invalid header".to_string()),
    };

    let salt = decode_flexible(salt_str)?;
    let expected = decode_flexible(hash_str)?;

    let mut computed = vec![0u8; expected.len()];
    pbkdf2::<HmacSha256>(password.as_bytes(), &salt, iterations, &mut computed)
        .map_err(|e| format!("PBKDF2 hash verification failed: {}", e))?;

    // Comparaison en temps constant
    Ok(computed.ct_eq(&expected).into())
}

// Anciens hashes Python: hexadécimal ou base64 avec padding
fn decode_flexible(input: &str) -> Result<Vec<u8>, String> {
    if input.len() == 64 && input.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(input).map_err(|e| format!("Hex decode failed: {}", e));
    }

    URL_SAFE_NO_PAD
        .decode(input.trim_end_matches('='))
        .or_else(|_| URL_SAFE.decode(input))
        .or_else(|_| STANDARD.decode(input))
        .map_err(|_| "Failed to decode".to_string())
}
