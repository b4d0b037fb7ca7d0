use std::io::{self, BufRead, Write};

use pathsync_io_fs::Confirmer;

/// Blocking y/n prompt on stdin; re-asks until the reply starts with `y` or `n`.
///
/// End of input counts as "no".
pub struct ConfirmConsole;

impl Confirmer for ConfirmConsole {
    fn confirm(&self, prompt: &str) -> bool {
        let stdin = io::stdin();
        ask_until_answered(prompt, &mut stdin.lock(), &mut io::stderr())
    }
}

fn ask_until_answered<R, W>(prompt: &str, reader: &mut R, writer: &mut W) -> bool
where
    R: BufRead,
    W: Write,
{
    loop {
        let _ = write!(writer, "{prompt} (y/n): ");
        let _ = writer.flush();

        let mut c_reply = String::new();
        match reader.read_line(&mut c_reply) {
            Ok(0) | Err(_) => return false,
            Ok(_) => {}
        }
        match c_reply.trim().to_lowercase().chars().next() {
            Some('y') => return true,
            Some('n') => return false,
            _ => continue,
        }
    }
}
