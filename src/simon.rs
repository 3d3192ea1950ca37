//! Simon memory game
//!
//! The board plays a growing sequence of digits 1 to 4, each shown at its own column of the screen
//! with its own pitch, and the player repeats it on the keypad. Every round adds one digit and
//! plays a little faster. Ten correct rounds win the game, any wrong key loses it.
//!
//! ```text
//! Idle -> WaitStart -(*)-> Countdown -> PlaySequence -> CheckInput -+-> PlaySequence
//!                                                                   +-> GameOver -> Idle
//!                                                                   +-> Won      -> Idle
//! ```
//!
//! `CheckInput` handles at most one key per [`Simon::step`] so the loop never blocks waiting for
//! the player.

use crate::buzzer::Buzzer;
use crate::display::{Display, CENTER_X};
use crate::keypad::Keypad;
use crate::text;
use embedded_hal::delay::DelayNs;
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Number of digits in a sequence, which is also the number of rounds
pub const SEQUENCE_LEN: usize = 10;

/// Buzzer period for each digit, in ACLK ticks. Higher digits sound higher.
pub const DIGIT_PITCHES: [u16; 4] = [128, 96, 64, 32];

/// Buzzer periods of the game-over jingle
pub const GAME_OVER_PITCHES: [u16; 6] = [64, 56, 52, 48, 68, 68];

/// Row the sequence digits and the countdown are drawn on
const DIGIT_ROW: i32 = 70;

/// Whether `key` is one of the four game digits
#[inline]
pub fn is_valid_key(key: u8) -> bool {
    (b'1'..=b'4').contains(&key)
}

/// Buzzer period for a digit from 1 to 4
#[inline]
pub fn pitch(digit: u8) -> u16 {
    DIGIT_PITCHES[(digit.clamp(1, 4) - 1) as usize]
}

/// Screen column of a digit, spacing the four digits evenly across the screen
#[inline]
pub fn column(digit: u8) -> i32 {
    digit as i32 * 32 - 16
}

/// Pacing of the game. All durations are multiples of `unit_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SimonConfig {
    /// Length of one delay unit in milliseconds
    pub unit_ms: u32,
    /// Units each digit is shown in the first round. Drops by one every round, down to 1.
    pub start_speed: u8,
    /// Units each countdown number stays on screen
    pub countdown_units: u32,
    /// Silent units between two digits
    pub gap_units: u32,
    /// Units each note of the game-over jingle lasts
    pub jingle_note_units: u32,
    /// Units the final screen stays up
    pub outro_units: u32,
}

impl Default for SimonConfig {
    fn default() -> Self {
        SimonConfig {
            unit_ms: 50,
            start_speed: 10,
            countdown_units: 10,
            gap_units: 1,
            jingle_note_units: 4,
            outro_units: 40,
        }
    }
}

impl SimonConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length of one delay unit
    #[inline]
    pub fn unit_ms(mut self, unit_ms: u32) -> Self {
        self.unit_ms = unit_ms;
        self
    }

    /// Set the first round's speed
    #[inline]
    pub fn start_speed(mut self, speed: u8) -> Self {
        self.start_speed = speed.max(1);
        self
    }
}

/// Result of feeding one keypad reading to a [`Game`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Input {
    /// No key, nothing happened
    Ignored,
    /// The expected digit
    Correct(u8),
    /// A game digit, but not the expected one
    Wrong(u8),
    /// A key that is not a game digit
    Invalid,
}

/// Progress of one game
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Game {
    sequence: [u8; SEQUENCE_LEN],
    round: usize,
    mismatch: bool,
    replayed: usize,
    speed: u8,
}

impl Game {
    /// New game over `sequence`, whose entries must be digits 1 to 4
    pub fn new(sequence: [u8; SEQUENCE_LEN], speed: u8) -> Self {
        Game {
            sequence: sequence.map(|d| d.clamp(1, 4)),
            round: 0,
            mismatch: false,
            replayed: 0,
            speed: speed.max(1),
        }
    }

    /// New game over a random sequence
    pub fn random<R: Rng>(rng: &mut R, speed: u8) -> Self {
        let mut sequence = [0; SEQUENCE_LEN];
        for digit in sequence.iter_mut() {
            *digit = rng.gen_range(1..=4);
        }
        Self::new(sequence, speed)
    }

    /// Full sequence of the game
    pub fn sequence(&self) -> &[u8; SEQUENCE_LEN] {
        &self.sequence
    }

    /// Zero-based round number
    #[inline]
    pub fn round(&self) -> usize {
        self.round
    }

    /// Units each digit is shown for this round
    #[inline]
    pub fn speed(&self) -> u8 {
        self.speed
    }

    /// Whether a wrong key was entered. Stays set until the next game.
    #[inline]
    pub fn mismatch(&self) -> bool {
        self.mismatch
    }

    /// Digits played back this round
    pub fn prefix(&self) -> &[u8] {
        &self.sequence[..=self.round]
    }

    /// Digits the player still has to enter this round
    pub fn remaining(&self) -> usize {
        self.round + 1 - self.replayed.min(self.round + 1)
    }

    /// Whether this is the last round
    #[inline]
    pub fn is_final_round(&self) -> bool {
        self.round == SEQUENCE_LEN - 1
    }

    /// Whether the round needs no more input, either because the player made a mistake or
    /// because the whole prefix was repeated
    #[inline]
    pub fn is_round_over(&self) -> bool {
        self.mismatch || self.replayed > self.round
    }

    /// Check one keypad reading against the sequence
    pub fn enter(&mut self, key: Option<u8>) -> Input {
        let key = match key {
            None => return Input::Ignored,
            Some(key) => key,
        };
        if self.is_round_over() {
            return Input::Ignored;
        }
        if !is_valid_key(key) {
            self.mismatch = true;
            return Input::Invalid;
        }
        let digit = key - b'0';
        if digit == self.sequence[self.replayed] {
            self.replayed += 1;
            Input::Correct(digit)
        } else {
            self.mismatch = true;
            Input::Wrong(digit)
        }
    }

    /// Move to the next round, one unit faster. Does nothing after the final round.
    pub fn advance(&mut self) {
        if self.is_final_round() {
            return;
        }
        self.round += 1;
        self.replayed = 0;
        self.speed = self.speed.saturating_sub(1).max(1);
    }
}

/// States of the game loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SimonState {
    /// Show the title screen
    Idle,
    /// Wait for `*`
    WaitStart,
    /// 3, 2, 1, 0
    Countdown,
    /// Play this round's prefix
    PlaySequence,
    /// Read the player's keys
    CheckInput,
    /// Lost screen and jingle
    GameOver,
    /// Won screen
    Won,
}

/// The memory game bound to its peripherals
pub struct Simon<D, K, B, T> {
    display: D,
    keypad: K,
    buzzer: B,
    delay: T,
    config: SimonConfig,
    rng: Option<SmallRng>,
    game: Game,
    state: SimonState,
    last_key: Option<u8>,
}

impl<D, K, B, T> Simon<D, K, B, T>
where
    D: Display,
    K: Keypad,
    B: Buzzer,
    T: DelayNs,
{
    /// Game drawing a fresh random sequence each time `*` is pressed
    pub fn new(display: D, keypad: K, buzzer: B, delay: T, config: SimonConfig, seed: u64) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let game = Game::random(&mut rng, config.start_speed);
        Self::build(display, keypad, buzzer, delay, config, Some(rng), game)
    }

    /// Game always playing the same sequence
    pub fn with_sequence(
        display: D,
        keypad: K,
        buzzer: B,
        delay: T,
        config: SimonConfig,
        sequence: [u8; SEQUENCE_LEN],
    ) -> Self {
        let game = Game::new(sequence, config.start_speed);
        Self::build(display, keypad, buzzer, delay, config, None, game)
    }

    fn build(
        display: D,
        keypad: K,
        mut buzzer: B,
        delay: T,
        config: SimonConfig,
        rng: Option<SmallRng>,
        game: Game,
    ) -> Self {
        buzzer.stop();
        Simon {
            display,
            keypad,
            buzzer,
            delay,
            config,
            rng,
            game,
            state: SimonState::Idle,
            last_key: None,
        }
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> SimonState {
        self.state
    }

    /// Current game
    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Borrow the display
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Borrow the buzzer
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    /// Borrow the keypad
    pub fn keypad_mut(&mut self) -> &mut K {
        &mut self.keypad
    }

    /// Release the peripherals
    pub fn free(self) -> (D, K, B, T) {
        (self.display, self.keypad, self.buzzer, self.delay)
    }

    /// Run one state and return the next one
    pub fn step(&mut self) -> SimonState {
        let next = match self.state {
            SimonState::Idle => {
                self.display.clear();
                self.display.draw_centered("SIMON", CENTER_X, 60);
                self.display.draw_centered("Start Game", CENTER_X, 80);
                self.display.draw_centered("Press *", CENTER_X, 90);
                self.display.flush();
                SimonState::WaitStart
            }
            SimonState::WaitStart => {
                if self.fresh_key() == Some(b'*') {
                    self.display.clear_and_flush();
                    self.new_game();
                    SimonState::Countdown
                } else {
                    SimonState::WaitStart
                }
            }
            SimonState::Countdown => {
                for n in (0..=3).rev() {
                    self.display
                        .draw_centered(&text::digit(n), CENTER_X, DIGIT_ROW);
                    self.display.flush();
                    self.wait(self.config.countdown_units);
                    self.display.clear_and_flush();
                }
                SimonState::PlaySequence
            }
            SimonState::PlaySequence => {
                let speed = self.game.speed() as u32;
                for i in 0..self.game.prefix().len() {
                    let digit = self.game.prefix()[i];
                    self.show_digit(digit, speed);
                }
                SimonState::CheckInput
            }
            SimonState::CheckInput => self.check_input(),
            SimonState::GameOver => {
                self.display.draw_centered("GAME OVER!", CENTER_X, 70);
                self.display.draw_centered("YOU LOST!", CENTER_X, 80);
                self.display.flush();
                for &p in GAME_OVER_PITCHES.iter() {
                    self.buzzer.start(p);
                    self.wait(self.config.jingle_note_units);
                }
                self.wait(self.config.outro_units);
                self.buzzer.stop();
                self.display.clear_and_flush();
                SimonState::Idle
            }
            SimonState::Won => {
                self.display.draw_centered("CONGRATULATIONS!", CENTER_X, 70);
                self.display.draw_centered("YOU WON!", CENTER_X, 90);
                self.display.flush();
                self.wait(self.config.outro_units);
                self.display.clear_and_flush();
                SimonState::Idle
            }
        };
        if next != self.state {
            debug!("simon: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Run the game forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn check_input(&mut self) -> SimonState {
        let key = self.fresh_key();
        match self.game.enter(key) {
            Input::Correct(digit) | Input::Wrong(digit) => {
                self.show_digit(digit, self.game.speed() as u32);
            }
            Input::Invalid | Input::Ignored => {}
        }

        if !self.game.is_round_over() {
            return SimonState::CheckInput;
        }
        if self.game.mismatch() {
            info!("simon: lost in round {}", self.game.round());
            self.display.clear_and_flush();
            SimonState::GameOver
        } else if self.game.is_final_round() {
            info!("simon: won");
            SimonState::Won
        } else {
            self.display.clear_and_flush();
            self.game.advance();
            SimonState::PlaySequence
        }
    }

    fn new_game(&mut self) {
        self.game = match self.rng.as_mut() {
            Some(rng) => Game::random(rng, self.config.start_speed),
            None => Game::new(*self.game.sequence(), self.config.start_speed),
        };
    }

    /// Keypad reading, reported only when it differs from the previous one so a held key counts
    /// once
    fn fresh_key(&mut self) -> Option<u8> {
        let key = self.keypad.get_key();
        let fresh = if key != self.last_key { key } else { None };
        self.last_key = key;
        fresh
    }

    fn show_digit(&mut self, digit: u8, units: u32) {
        self.display
            .draw_centered(&text::digit(digit), column(digit), DIGIT_ROW);
        self.display.flush();
        self.buzzer.start(pitch(digit));
        self.wait(units);
        self.display.clear_and_flush();
        self.buzzer.stop();
        self.wait(self.config.gap_units);
    }

    fn wait(&mut self, units: u32) {
        self.delay.delay_ms(units.saturating_mul(self.config.unit_ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeBuzzer, FakeDelay, FakeDisplay, ScriptedKeypad};
    use std::vec::Vec;

    const SEQ: [u8; SEQUENCE_LEN] = [2, 1, 3, 4, 4, 1, 2, 3, 1, 2];

    type TestSimon = Simon<FakeDisplay, ScriptedKeypad, FakeBuzzer, FakeDelay>;

    fn simon() -> TestSimon {
        Simon::with_sequence(
            FakeDisplay::default(),
            ScriptedKeypad::default(),
            FakeBuzzer::default(),
            FakeDelay::default(),
            SimonConfig::default(),
            SEQ,
        )
    }

    // Each press is followed by a release so repeated digits register
    fn press(simon: &mut TestSimon, keys: &[u8]) {
        for &k in keys {
            simon.keypad_mut().push(Some(k));
            simon.keypad_mut().push(None);
        }
    }

    fn run_until(simon: &mut TestSimon, target: SimonState, limit: usize) {
        for _ in 0..limit {
            if simon.step() == target {
                return;
            }
        }
        panic!("never reached {:?}, stuck in {:?}", target, simon.state());
    }

    fn start(simon: &mut TestSimon) {
        press(simon, b"*");
        run_until(simon, SimonState::CheckInput, 10);
    }

    #[test]
    fn key_predicate() {
        assert!(is_valid_key(b'1'));
        assert!(is_valid_key(b'4'));
        assert!(!is_valid_key(b'0'));
        assert!(!is_valid_key(b'5'));
        assert!(!is_valid_key(b'*'));
    }

    #[test]
    fn game_rounds_and_speed() {
        let mut game = Game::new(SEQ, 10);
        assert_eq!(game.prefix(), &[2]);
        assert_eq!(game.enter(None), Input::Ignored);
        assert_eq!(game.enter(Some(b'2')), Input::Correct(2));
        assert!(game.is_round_over());
        game.advance();
        assert_eq!(game.round(), 1);
        assert_eq!(game.speed(), 9);
        assert_eq!(game.prefix(), &[2, 1]);
        assert_eq!(game.remaining(), 2);
        assert_eq!(game.enter(Some(b'2')), Input::Correct(2));
        assert_eq!(game.enter(Some(b'3')), Input::Wrong(3));
        assert!(game.mismatch());
        // The flag is latched
        assert_eq!(game.enter(Some(b'1')), Input::Ignored);
        assert!(game.mismatch());
    }

    #[test]
    fn speed_never_reaches_zero() {
        let mut game = Game::new(SEQ, 2);
        for _ in 0..SEQUENCE_LEN {
            game.advance();
        }
        assert_eq!(game.speed(), 1);
        assert!(game.is_final_round());
    }

    #[test]
    fn random_sequences_are_game_digits() {
        let mut rng = SmallRng::seed_from_u64(7);
        let game = Game::random(&mut rng, 10);
        assert!(game.sequence().iter().all(|d| (1..=4).contains(d)));
    }

    #[test]
    fn title_screen_then_wait_for_star() {
        let mut simon = simon();
        assert_eq!(simon.step(), SimonState::WaitStart);
        assert_eq!(
            simon.display().screen(),
            ["SIMON", "Start Game", "Press *"]
        );
        press(&mut simon, b"1#");
        for _ in 0..4 {
            assert_eq!(simon.step(), SimonState::WaitStart);
        }
        press(&mut simon, b"*");
        assert_eq!(simon.step(), SimonState::Countdown);
        assert_eq!(simon.step(), SimonState::PlaySequence);
        for n in ["3", "2", "1", "0"] {
            assert_eq!(simon.display().position_of(n), Some((CENTER_X, DIGIT_ROW)));
        }
    }

    #[test]
    fn prefix_is_played_before_input_is_read() {
        let mut simon = simon();
        start(&mut simon);
        assert_eq!(simon.buzzer().tones(), [pitch(2)]);
        assert_eq!(simon.display().position_of("2"), Some((column(2), DIGIT_ROW)));

        press(&mut simon, b"2");
        run_until(&mut simon, SimonState::PlaySequence, 5);
        assert_eq!(simon.step(), SimonState::CheckInput);
        assert_eq!(simon.game().round(), 1);
        // Round 0 playback, the echoed key, then the two digits of round 1
        assert_eq!(
            simon.buzzer().tones(),
            [pitch(2), pitch(2), pitch(2), pitch(1)]
        );
    }

    #[test]
    fn long_unit_saturates_delay() {
        let mut simon = Simon::with_sequence(
            FakeDisplay::default(),
            ScriptedKeypad::default(),
            FakeBuzzer::default(),
            FakeDelay::default(),
            SimonConfig::default().unit_ms(u32::MAX),
            SEQ,
        );
        start(&mut simon);
        let (_, _, _, delay) = simon.free();
        assert_eq!(delay.total_ms, u32::MAX);
    }

    #[test]
    fn waits_while_no_key() {
        let mut simon = simon();
        start(&mut simon);
        for _ in 0..20 {
            assert_eq!(simon.step(), SimonState::CheckInput);
        }
        assert_eq!(simon.game().round(), 0);
    }

    #[test]
    fn invalid_key_ends_game() {
        let mut simon = simon();
        start(&mut simon);
        press(&mut simon, b"7");
        run_until(&mut simon, SimonState::GameOver, 5);
        assert_eq!(simon.game().round(), 0);
        assert_eq!(simon.step(), SimonState::Idle);
        assert!(simon.display().ever_drew("GAME OVER!"));
        assert!(simon.display().ever_drew("YOU LOST!"));
        let tones = simon.buzzer().tones();
        assert_eq!(&tones[tones.len() - 6..], &GAME_OVER_PITCHES);
        assert_eq!(simon.buzzer().sounding(), None);
    }

    #[test]
    fn held_key_counts_once() {
        let mut simon = simon();
        start(&mut simon);
        press(&mut simon, b"2");
        run_until(&mut simon, SimonState::PlaySequence, 5);
        assert_eq!(simon.step(), SimonState::CheckInput);
        // Holding 2 across three polls is a single 2, which is correct, then 1 completes the round
        for _ in 0..3 {
            simon.keypad_mut().push(Some(b'2'));
        }
        simon.keypad_mut().push(Some(b'1'));
        run_until(&mut simon, SimonState::PlaySequence, 6);
        assert_eq!(simon.game().round(), 2);
        assert!(!simon.game().mismatch());
    }

    #[test]
    fn ten_rounds_win() {
        let mut simon = simon();
        start(&mut simon);
        for round in 0..SEQUENCE_LEN {
            press(&mut simon, &SEQ[..=round].iter().map(|d| b'0' + d).collect::<Vec<_>>());
            let target = if round == SEQUENCE_LEN - 1 {
                SimonState::Won
            } else {
                SimonState::PlaySequence
            };
            run_until(&mut simon, target, 4 * SEQUENCE_LEN);
        }
        assert_eq!(simon.game().speed(), 1);
        assert_eq!(simon.step(), SimonState::Idle);
        assert!(simon.display().ever_drew("CONGRATULATIONS!"));
        assert!(simon.display().ever_drew("YOU WON!"));
    }

    #[test]
    fn random_game_is_redrawn_on_restart() {
        let mut simon = Simon::new(
            FakeDisplay::default(),
            ScriptedKeypad::default(),
            FakeBuzzer::default(),
            FakeDelay::default(),
            SimonConfig::default(),
            42,
        );
        let before = *simon.game().sequence();
        simon.keypad_mut().push(None);
        simon.step();
        simon.keypad_mut().push(Some(b'*'));
        simon.step();
        simon.step();
        assert_eq!(simon.state(), SimonState::Countdown);
        assert_ne!(simon.game().sequence(), &before);
    }
}
