//! Connection and authorization workflow.
//!
//! Dialing is delegated to a caller-supplied function so the workflow can
//! be exercised against a fake connection, and the interactive password
//! prompt is injected the same way so no terminal I/O happens in here.
//!
//! The password workflow, in order:
//! 1. If the user supplied a password (inline `password@host`), apply it
//!    unconditionally; rejection alone is not fatal.
//! 2. Check that every required command may be run.
//! 3. If commands are missing and *no* password was supplied, prompt for
//!    one until the server accepts it, then check again.
//! 4. Still missing commands: fail, listing them.

use std::io;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mpd::{Address, Mpd, PasswordStatus};

/// Commands shuffled cannot run without.
pub const REQUIRED_COMMANDS: [&str; 5] = ["add", "status", "play", "pause", "idle"];

/// Interactive password source. Errors are fatal (e.g. end of input).
pub type PasswordFn<'a> = &'a mut dyn FnMut() -> io::Result<String>;

/// Host string split into its optional inline password and the bare host,
/// from the `password@host` form `MPD_HOST` supports.
#[derive(Clone, Debug, PartialEq, Eq)]
struct HostSpec {
    host: String,
    password: Option<String>,
}

impl HostSpec {
    fn parse(raw: &str) -> Self {
        match raw.split_once('@') {
            Some((password, host)) => Self {
                host: host.to_string(),
                password: Some(password.to_string()),
            },
            None => Self {
                host: raw.to_string(),
                password: None,
            },
        }
    }
}

/// Dials the server and runs the authorization workflow, returning a
/// connection that may run every required command.
pub fn connect<C, D>(dial: D, config: &Config, mut getpass: Option<PasswordFn<'_>>) -> Result<C>
where
    C: Mpd,
    D: Fn(&Address) -> Result<C>,
{
    let spec = HostSpec::parse(config.host.as_deref().unwrap_or("localhost"));
    let address = Address {
        host: spec.host.clone(),
        port: config.port.unwrap_or(6600),
    };

    debug!("connecting to {address}");
    let mut mpd = dial(&address)?;

    if let Some(password) = &spec.password {
        // Whether the password is accepted does not matter yet; the
        // required-command check below decides.
        let _ = mpd.apply_password(password);
    }

    let mut auth = mpd.check_commands(&REQUIRED_COMMANDS)?;
    if spec.password.is_none() && !auth.authorized {
        // No password was supplied and we are missing commands, so this
        // server probably wants one. Ask until it sticks, then re-check.
        if let Some(getpass) = getpass.as_mut() {
            prompt_password(&mut mpd, getpass)?;
            auth = mpd.check_commands(&REQUIRED_COMMANDS)?;
        }
    }

    if !auth.authorized {
        return Err(Error::Unauthorized {
            missing: auth.missing,
        });
    }
    Ok(mpd)
}

/// Keeps prompting until the server accepts a password. Rejections and
/// apply failures re-prompt; only a failing password source is fatal.
fn prompt_password<C>(mpd: &mut C, getpass: &mut PasswordFn<'_>) -> Result<()>
where
    C: Mpd,
{
    loop {
        let password = getpass()?;
        match mpd.apply_password(&password) {
            Ok(PasswordStatus::Accepted) => return Ok(()),
            Ok(PasswordStatus::Rejected) => eprintln!("incorrect password."),
            Err(e) => error!("failed to apply password: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_spec_with_password() {
        let spec = HostSpec::parse("secret@example.com");
        assert_eq!(spec.host, "example.com");
        assert_eq!(spec.password.as_deref(), Some("secret"));
    }

    #[test]
    fn host_spec_without_password() {
        let spec = HostSpec::parse("localhost");
        assert_eq!(spec.host, "localhost");
        assert_eq!(spec.password, None);
    }
}
