//! Connection and password workflow against a fake server.

mod common;

use common::{FakeMpd, State};
use shuffled::config::Config;
use shuffled::connect;
use shuffled::error::Error;
use shuffled::mpd::Address;

fn server(state: State) -> FakeMpd {
    FakeMpd::new(state)
}

fn dialer(mpd: &FakeMpd) -> impl Fn(&Address) -> shuffled::error::Result<FakeMpd> + '_ {
    move |_address| Ok(mpd.clone())
}

#[test]
fn open_server_needs_no_password() {
    let mpd = server(State::default());
    let config = Config::default();

    let mut prompts = 0;
    let mut prompt = || {
        prompts += 1;
        Ok("should not be asked".to_string())
    };
    let got = connect::connect(dialer(&mpd), &config, Some(&mut prompt));

    assert!(got.is_ok());
    assert_eq!(prompts, 0);
    mpd.with(|state| assert!(state.applied_passwords.is_empty()));
}

#[test]
fn inline_password_is_applied() {
    let mpd = server(State {
        accepted_password: Some("hunter2".to_string()),
        disallowed: vec!["add".to_string()],
        ..State::default()
    });
    let config = Config {
        host: Some("hunter2@example.com".to_string()),
        ..Config::default()
    };

    connect::connect(dialer(&mpd), &config, None).unwrap();

    mpd.with(|state| assert_eq!(state.applied_passwords, ["hunter2"]));
}

#[test]
fn wrong_inline_password_fails_without_prompting() {
    // The user already supplied a password on the command line; a prompt
    // would only confuse a scripted invocation.
    let mpd = server(State {
        accepted_password: Some("hunter2".to_string()),
        disallowed: vec!["add".to_string(), "play".to_string()],
        ..State::default()
    });
    let config = Config {
        host: Some("wrong@localhost".to_string()),
        ..Config::default()
    };

    let mut prompts = 0;
    let mut prompt = || {
        prompts += 1;
        Ok("hunter2".to_string())
    };
    let got = connect::connect(dialer(&mpd), &config, Some(&mut prompt));

    assert_eq!(prompts, 0, "inline password suppresses the prompt");
    match got {
        Err(Error::Unauthorized { missing }) => {
            assert_eq!(missing, ["add", "play"]);
        }
        Err(other) => panic!("expected Unauthorized, got {other}"),
        Ok(_) => panic!("expected Unauthorized, got a connection"),
    }
}

#[test]
fn prompts_when_commands_are_missing() {
    let mpd = server(State {
        accepted_password: Some("hunter2".to_string()),
        disallowed: vec!["idle".to_string()],
        ..State::default()
    });
    let config = Config::default();

    let mut prompts = 0;
    let mut prompt = || {
        prompts += 1;
        Ok("hunter2".to_string())
    };
    connect::connect(dialer(&mpd), &config, Some(&mut prompt)).unwrap();

    assert_eq!(prompts, 1);
    mpd.with(|state| {
        assert_eq!(state.applied_passwords, ["hunter2"]);
        assert!(state.disallowed.is_empty());
    });
}

#[test]
fn reprompts_until_the_password_sticks() {
    let mpd = server(State {
        accepted_password: Some("hunter2".to_string()),
        disallowed: vec!["status".to_string()],
        ..State::default()
    });
    let config = Config::default();

    let mut attempts = ["wrong", "also wrong", "hunter2"].iter();
    let mut prompt = || Ok(attempts.next().expect("ran out of attempts").to_string());
    connect::connect(dialer(&mpd), &config, Some(&mut prompt)).unwrap();

    mpd.with(|state| {
        assert_eq!(state.applied_passwords, ["wrong", "also wrong", "hunter2"]);
    });
}

#[test]
fn locked_server_without_prompt_fails() {
    let mpd = server(State {
        disallowed: vec!["pause".to_string()],
        ..State::default()
    });
    let config = Config::default();

    let got = connect::connect(dialer(&mpd), &config, None);

    match got {
        Err(Error::Unauthorized { missing }) => assert_eq!(missing, ["pause"]),
        Err(other) => panic!("expected Unauthorized, got {other}"),
        Ok(_) => panic!("expected Unauthorized, got a connection"),
    }
}
