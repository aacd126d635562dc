//! Terminal password prompt.
//!
//! Writes the prompt to stderr and reads a line from stdin with terminal
//! echo disabled. When stdin is not a terminal (piped input), echo
//! suppression is skipped and the line is read as-is.

use std::io::{self, BufRead, Write};

/// Prompts for a password on the controlling terminal.
///
/// # Errors
///
/// Fails on end of input or when the terminal attributes cannot be
/// changed.
pub fn getpass(prompt: &str) -> io::Result<String> {
    let mut stderr = io::stderr().lock();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;

    set_echo(false)?;
    let result = read_password_line();
    set_echo(true)?;
    result
}

fn read_password_line() -> io::Result<String> {
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "end of input while reading password",
        ));
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(line)
}

#[cfg(unix)]
fn set_echo(enabled: bool) -> io::Result<()> {
    use std::mem::MaybeUninit;

    // Safety: tcgetattr/tcsetattr write to and read from a plain struct.
    unsafe {
        let mut flags = MaybeUninit::<libc::termios>::uninit();
        if libc::tcgetattr(libc::STDIN_FILENO, flags.as_mut_ptr()) != 0 {
            let error = io::Error::last_os_error();
            if error.raw_os_error() == Some(libc::ENOTTY) {
                // Not a terminal, nothing echoes anyway.
                return Ok(());
            }
            return Err(error);
        }
        let mut flags = flags.assume_init();

        if enabled {
            flags.c_lflag |= libc::ECHO;
        } else {
            flags.c_lflag &= !libc::ECHO;
        }
        // Keep echoing the newline so the terminal advances a line when
        // the user hits enter.
        flags.c_lflag |= libc::ECHONL;

        if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &flags) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn set_echo(_enabled: bool) -> io::Result<()> {
    Ok(())
}
