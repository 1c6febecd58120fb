use std::io::{self, Write};

/// Writes to stdout, treating a closed pipe (`pricebands run | head`) as success.
pub fn write_stdout_text(text: &str) -> io::Result<()> {
    write_tolerant(&mut io::stdout().lock(), text.as_bytes())
}

pub fn write_stdout_line(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write_tolerant(&mut stdout, text.as_bytes())?;
    write_tolerant(&mut stdout, b"\n")
}

fn write_tolerant<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    ignore_broken_pipe(writer.write_all(bytes))?;
    ignore_broken_pipe(writer.flush())
}

fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}
