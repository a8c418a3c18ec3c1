//! Interactive yes/no confirmation.

use std::io::{self, BufRead, Write};

/// Ask `question` on the terminal. Only `y` or `yes` confirms.
pub fn confirm(question: &str) -> bool {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    confirm_with(question, &mut input, &mut io::stderr())
}

/// Ask `question` on `out` and read the answer from `input`.
///
/// Read failures and end of input decline.
pub fn confirm_with<R: BufRead, W: Write>(question: &str, input: &mut R, out: &mut W) -> bool {
    if write!(out, "{} [y/N]: ", question)
        .and_then(|_| out.flush())
        .is_err()
    {
        return false;
    }

    let mut answer = String::new();
    match input.read_line(&mut answer) {
        Ok(0) | Err(_) => false,
        Ok(_) => matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"),
    }
}
