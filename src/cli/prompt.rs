//! Terminal prompts. Secrets are read without echo.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use zeroize::Zeroizing;

/// Read a secret without echoing it.
pub fn secret(prompt: &str) -> Result<Zeroizing<String>> {
    rpassword::prompt_password(prompt)
        .map(Zeroizing::new)
        .context("Failed to read from terminal")
}

/// Ask for a new password twice.
pub fn new_password() -> Result<Zeroizing<String>> {
    let password = secret("Enter password to encrypt wallet: ")?;
    if password.is_empty() {
        bail!("Password must not be empty");
    }
    let confirmation = secret("Confirm password: ")?;
    if *password != *confirmation {
        bail!("Passwords don't match");
    }
    Ok(password)
}

/// Yes/no question on stdin. Anything but an explicit yes is a no.
pub fn confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read from stdin")?;
    Ok(is_affirmative(&answer))
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_affirmative() {
        assert!(is_affirmative("yes\n"));
        assert!(is_affirmative(" Y "));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("no"));
        assert!(!is_affirmative("yess"));
    }
}
