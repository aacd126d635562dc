//! TCP implementation of the [`Mpd`] trait.
//!
//! Speaks the MPD line protocol directly: commands are single lines with
//! quoted arguments, responses are `key: value` pairs terminated by `OK`
//! or an `ACK [code@index] {command} message` failure.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::mpd::{
    Address, Authorization, IdleEvent, IdleEventSet, MetadataOption, Mpd, PasswordStatus, Song,
    Status, Tag,
};

/// Server error code for an incorrect password.
const ACK_ERROR_PASSWORD: u32 = 3;

pub struct Client {
    stream: BufReader<TcpStream>,
    /// Protocol version from the server greeting.
    version: String,
}

impl Client {
    /// Connects to the server and consumes its greeting. The timeout
    /// bounds only the connection attempt; established connections have no
    /// read deadline because `idle` blocks indefinitely by design.
    pub fn dial(address: &Address, timeout: Duration) -> Result<Self> {
        let mut last_error = None;
        for socket_addr in (address.host.as_str(), address.port).to_socket_addrs()? {
            match TcpStream::connect_timeout(&socket_addr, timeout) {
                Ok(stream) => return Self::greet(stream),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error
            .unwrap_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no addresses found for {address}"),
                )
            })
            .into())
    }

    fn greet(stream: TcpStream) -> Result<Self> {
        let _ = stream.set_nodelay(true);
        let mut client = Self {
            stream: BufReader::new(stream),
            version: String::new(),
        };

        let greeting = client.read_line()?;
        let Some(version) = greeting.strip_prefix("OK MPD ") else {
            return Err(Error::Protocol(format!("unexpected greeting: {greeting}")));
        };
        client.version = version.to_string();
        debug!("connected to MPD {}", client.version);
        Ok(client)
    }

    /// Protocol version reported by the server.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    fn send(&mut self, command: &str) -> Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(command.as_bytes())?;
        stream.write_all(b"\n")?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        if self.stream.read_line(&mut line)? == 0 {
            return Err(Error::Protocol("connection closed by server".to_string()));
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(line)
    }

    /// Reads one response line. `None` is the terminal `OK`; an `ACK`
    /// becomes an error.
    fn response_line(&mut self) -> Result<Option<String>> {
        let line = self.read_line()?;
        if line == "OK" {
            return Ok(None);
        }
        if let Some(ack) = line.strip_prefix("ACK ") {
            return Err(parse_ack(ack));
        }
        Ok(Some(line))
    }

    /// Runs a command and collects its `key: value` response pairs.
    fn run(&mut self, command: &str) -> Result<Vec<(String, String)>> {
        self.send(command)?;
        let mut pairs = Vec::new();
        while let Some(line) = self.response_line()? {
            pairs.push(split_pair(&line)?);
        }
        Ok(pairs)
    }

    /// Runs a command whose response carries no data.
    fn run_ok(&mut self, command: &str) -> Result<()> {
        self.run(command).map(|_| ())
    }
}

impl Mpd for Client {
    fn current_status(&mut self) -> Result<Status> {
        let pairs = self.run("status")?;
        parse_status(&pairs)
    }

    fn list_all(
        &mut self,
        metadata: MetadataOption,
    ) -> Result<Box<dyn Iterator<Item = Result<Song>> + '_>> {
        match metadata {
            MetadataOption::Include => self.send("listallinfo")?,
            MetadataOption::Omit => self.send("listall")?,
        }
        Ok(Box::new(SongIter {
            client: self,
            pending: None,
            done: false,
        }))
    }

    fn add(&mut self, uri: &str) -> Result<()> {
        self.run_ok(&format!("add {}", quote(uri)))
    }

    fn play_at(&mut self, position: usize) -> Result<()> {
        self.run_ok(&format!("play {position}"))
    }

    fn play(&mut self) -> Result<()> {
        self.run_ok("pause 0")
    }

    fn pause(&mut self) -> Result<()> {
        self.run_ok("pause 1")
    }

    fn idle(&mut self, mask: IdleEventSet) -> Result<IdleEventSet> {
        let mut command = String::from("idle");
        for event in mask.iter() {
            command.push(' ');
            command.push_str(event.subsystem());
        }

        let mut events = IdleEventSet::default();
        for (key, value) in self.run(&command)? {
            if key == "changed" {
                if let Some(event) = IdleEvent::from_subsystem(&value) {
                    events.add(event);
                }
            }
        }
        Ok(events)
    }

    fn apply_password(&mut self, password: &str) -> Result<PasswordStatus> {
        match self.run_ok(&format!("password {}", quote(password))) {
            Ok(()) => Ok(PasswordStatus::Accepted),
            Err(Error::Server {
                code: ACK_ERROR_PASSWORD,
                ..
            }) => Ok(PasswordStatus::Rejected),
            Err(e) => Err(e),
        }
    }

    fn check_commands(&mut self, commands: &[&str]) -> Result<Authorization> {
        if commands.is_empty() {
            // Nothing required, no round trip needed.
            return Ok(Authorization {
                authorized: true,
                missing: Vec::new(),
            });
        }

        // In most installs the disallowed list is empty.
        let disallowed: Vec<String> = self
            .run("notcommands")?
            .into_iter()
            .filter_map(|(key, value)| (key == "command").then_some(value))
            .collect();

        let missing: Vec<String> = commands
            .iter()
            .filter(|command| disallowed.iter().any(|d| d == *command))
            .map(ToString::to_string)
            .collect();
        Ok(Authorization {
            authorized: missing.is_empty(),
            missing,
        })
    }
}

/// Lazy song stream over a `listall`/`listallinfo` response. Must be
/// consumed to completion before the connection can be used again.
struct SongIter<'a> {
    client: &'a mut Client,
    pending: Option<Song>,
    done: bool,
}

impl Iterator for SongIter<'_> {
    type Item = Result<Song>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let line = match self.client.response_line() {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Ok(None) => {
                    self.done = true;
                    return self.pending.take().map(Ok);
                }
                Ok(Some(line)) => line,
            };

            let (key, value) = match split_pair(&line) {
                Ok(pair) => pair,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            match key.as_str() {
                "file" => {
                    let next = Song::new(value, []);
                    if let Some(song) = self.pending.replace(next) {
                        return Some(Ok(song));
                    }
                }
                // Directory and playlist entries end any song in progress.
                "directory" | "playlist" => {
                    if let Some(song) = self.pending.take() {
                        return Some(Ok(song));
                    }
                }
                _ => {
                    // Tag lines belong to the song in progress; anything
                    // else (Last-Modified, duration, ...) is skipped.
                    if let Some(song) = &mut self.pending {
                        if let Ok(tag) = key.parse::<Tag>() {
                            song.set_tag(tag, value);
                        }
                    }
                }
            }
        }
    }
}

fn split_pair(line: &str) -> Result<(String, String)> {
    line.split_once(": ")
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| Error::Protocol(format!("expected a key-value pair, got: {line}")))
}

fn parse_status(pairs: &[(String, String)]) -> Result<Status> {
    let mut status = Status::default();
    for (key, value) in pairs {
        match key.as_str() {
            "playlistlength" => {
                status.queue_length = value
                    .parse()
                    .map_err(|_| Error::Protocol(format!("bad playlistlength: {value}")))?;
            }
            "song" => {
                status.song_position = Some(
                    value
                        .parse()
                        .map_err(|_| Error::Protocol(format!("bad song position: {value}")))?,
                );
            }
            // "oneshot" deliberately counts as off; it clears itself.
            "single" => status.single = value == "1",
            "state" => status.playing = value == "play",
            _ => {}
        }
    }
    Ok(status)
}

/// Parses the tail of an `ACK [code@index] {command} message` line.
fn parse_ack(ack: &str) -> Error {
    fn split(ack: &str) -> Option<(u32, String)> {
        let rest = ack.strip_prefix('[')?;
        let (code, rest) = rest.split_once('@')?;
        let (_, rest) = rest.split_once(']')?;
        let rest = rest.trim_start().strip_prefix('{')?;
        let (_, message) = rest.split_once('}')?;
        Some((code.parse().ok()?, message.trim_start().to_string()))
    }

    match split(ack) {
        Some((code, message)) => Error::Server { code, message },
        None => Error::Protocol(format!("unparseable ACK: {ack}")),
    }
}

/// Quotes a command argument, escaping backslashes and double quotes.
fn quote(argument: &str) -> String {
    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('"');
    for chr in argument.chars() {
        if chr == '"' || chr == '\\' {
            quoted.push('\\');
        }
        quoted.push(chr);
    }
    quoted.push('"');
    quoted
}
