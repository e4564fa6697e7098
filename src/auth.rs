use anyhow::{Result, bail};
use std::io::{self, BufRead, IsTerminal};
use zeroize::Zeroizing;

pub const SECRET_ENV: &str = "HASHCRYPT_SECRET";

/// Reads the encryption secret.
///
/// Sources, in order: `HASHCRYPT_SECRET`, one line of piped stdin, an
/// interactive prompt. With `confirm`, the prompt asks twice and the
/// answers must match; piped and environment secrets are taken as given.
pub fn read_secret(confirm: bool) -> Result<Zeroizing<String>> {
    //  HASHCRYPT_SECRET="supersecret" hashcrypt encrypt --text hi
    if let Ok(secret) = std::env::var(SECRET_ENV) {
        if !secret.is_empty() {
            return Ok(Zeroizing::new(secret));
        }
    }

    //  printf "%s" "$SECRET" | hashcrypt decrypt --input data.bin
    if !io::stdin().is_terminal() {
        let mut line = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut line)?;
        trim_newline(&mut line);
        if !line.is_empty() {
            return Ok(line);
        }
        bail!("no secret provided");
    }

    let secret = Zeroizing::new(rpassword::prompt_password("Secret: ")?);
    if secret.is_empty() {
        bail!("secret cannot be empty");
    }

    if confirm {
        let again = Zeroizing::new(rpassword::prompt_password("Confirm secret: ")?);
        if *secret != *again {
            bail!("secrets do not match");
        }
    }

    Ok(secret)
}

fn trim_newline(s: &mut String) {
    while s.ends_with('\n') || s.ends_with('\r') {
        s.pop();
    }
}
