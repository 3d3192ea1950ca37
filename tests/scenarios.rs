//! Full games of Simon driven through the public API

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use msp430_labs::buzzer::Buzzer;
use msp430_labs::display::Display;
use msp430_labs::keypad::Keypad;
use msp430_labs::simon::{pitch, Simon, SimonConfig, SimonState, SEQUENCE_LEN};

const SEQ: [u8; SEQUENCE_LEN] = [2, 1, 3, 4, 1, 1, 2, 4, 3, 2];

#[derive(Default)]
struct Screen {
    texts: Vec<String>,
}

impl Display for Screen {
    fn clear(&mut self) {}

    fn draw_centered(&mut self, text: &str, _x: i32, _y: i32) {
        self.texts.push(text.to_string());
    }

    fn draw_hline(&mut self, _x1: i32, _x2: i32, _y: i32) {}

    fn flush(&mut self) {}
}

#[derive(Default)]
struct Keys(VecDeque<Option<u8>>);

impl Keypad for Keys {
    fn get_key(&mut self) -> Option<u8> {
        self.0.pop_front().flatten()
    }
}

#[derive(Default)]
struct Tones(Vec<u16>);

impl Buzzer for Tones {
    fn start(&mut self, period: u16) {
        self.0.push(period);
    }

    fn stop(&mut self) {}
}

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

type Game = Simon<Screen, Keys, Tones, NoDelay>;

fn game() -> Game {
    Simon::with_sequence(
        Screen::default(),
        Keys::default(),
        Tones::default(),
        NoDelay,
        SimonConfig::default(),
        SEQ,
    )
}

fn press(game: &mut Game, keys: &[u8]) {
    for &k in keys {
        game.keypad_mut().0.push_back(Some(k));
        game.keypad_mut().0.push_back(None);
    }
}

fn step_until(game: &mut Game, target: SimonState) {
    for _ in 0..100 {
        if game.step() == target {
            return;
        }
    }
    panic!("never reached {:?}, stuck in {:?}", target, game.state());
}

fn digits(keys: &[u8]) -> Vec<u8> {
    keys.iter().map(|k| k - b'0').collect()
}

#[test]
fn replaying_prefixes_reaches_round_four_faster() {
    let mut game = game();
    press(&mut game, b"*");
    step_until(&mut game, SimonState::PlaySequence);
    let start_speed = game.game().speed();

    let answers: [&[u8]; 3] = [b"2", b"21", b"213"];
    for (round, keys) in answers.iter().enumerate() {
        assert_eq!(game.step(), SimonState::CheckInput);
        assert_eq!(game.game().round(), round);
        // The prefix was played before any key was read
        let played: Vec<u16> = game.game().prefix().iter().map(|&d| pitch(d)).collect();
        assert!(game.buzzer().0.ends_with(&played));
        assert_eq!(game.game().prefix(), &digits(keys)[..]);

        press(&mut game, keys);
        step_until(&mut game, SimonState::PlaySequence);
    }

    assert_eq!(game.step(), SimonState::CheckInput);
    assert_eq!(game.game().round(), 3);
    assert_eq!(game.game().prefix(), &[2, 1, 3, 4]);
    assert!(game.game().speed() < start_speed);
    assert!(!game.screen_shows("GAME OVER!"));
}

#[test]
fn wrong_digit_in_round_two_loses() {
    let mut game = game();
    press(&mut game, b"*");
    step_until(&mut game, SimonState::PlaySequence);
    press(&mut game, b"2");
    step_until(&mut game, SimonState::PlaySequence);
    assert_eq!(game.step(), SimonState::CheckInput);
    assert_eq!(game.game().round(), 1);

    press(&mut game, b"1");
    step_until(&mut game, SimonState::GameOver);
    assert!(game.game().mismatch());
    assert_eq!(game.step(), SimonState::Idle);
    assert!(game.screen_shows("GAME OVER!"));
    assert!(game.screen_shows("YOU LOST!"));
}

trait ScreenExt {
    fn screen_shows(&self, text: &str) -> bool;
}

impl ScreenExt for Game {
    fn screen_shows(&self, text: &str) -> bool {
        self.display().texts.iter().any(|t| t == text)
    }
}
