//! Music player
//!
//! A welcome screen leads to a song menu. Picking a song starts a four second countdown, then the
//! song plays note by note while the keypad adjusts it:
//!
//! | key | welcome    | song menu    | countdown | playing / paused        |
//! |-----|------------|--------------|-----------|-------------------------|
//! | `*` | song menu  |              |           |                         |
//! | `1` |            | first song   |           | pause / resume          |
//! | `2` |            | second song  |           | faster                  |
//! | `3` |            |              |           | slower                  |
//! | `4` |            |              |           | back to the song menu   |
//! | `#` |            | welcome      | welcome   | welcome (playing only)  |
//!
//! Playback never blocks. Each [`Player::step`] checks whether the current note has lasted long
//! enough against a [`Monotonic`] millisecond clock and moves on if so. Pausing freezes the note's
//! stopwatch, so a resumed song picks up the same note where it stopped.

pub mod songs;

use crate::buzzer::Buzzer;
use crate::display::{Display, CENTER_X};
use crate::gpio::{Indicators, LedMask};
use crate::keypad::Keypad;
use crate::text::Line;
use crate::timer::{elapsed_since, Monotonic, Stopwatch};
use core::fmt::Write;

/// A melody with one duration per note
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Song {
    /// Name shown in the song menu
    pub title: &'static str,
    /// Note frequencies in Hz, 0 for a rest
    pub notes: &'static [u16],
    /// Note units: 1 is a whole note, 4 a quarter note
    pub durations: &'static [u8],
}

impl Song {
    /// Pair up a melody and its durations. Extra entries in the longer table are ignored.
    pub const fn new(title: &'static str, notes: &'static [u16], durations: &'static [u8]) -> Self {
        Song {
            title,
            notes,
            durations,
        }
    }

    /// Number of playable notes
    #[inline]
    pub fn len(&self) -> usize {
        self.notes.len().min(self.durations.len())
    }

    /// Whether the song has no notes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Tempo and input timing of the player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PlayerConfig {
    /// Length of a whole note at normal speed
    pub whole_note_ms: u32,
    /// Speed change per key press, in percent
    pub speed_step_pct: u16,
    /// Slowest allowed speed, in percent
    pub min_speed_pct: u16,
    /// Fastest allowed speed, in percent
    pub max_speed_pct: u16,
    /// How long a settings key must be held before it counts
    pub debounce_ms: u32,
    /// Length of each countdown step
    pub countdown_ms: u32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        PlayerConfig {
            whole_note_ms: 1500,
            speed_step_pct: 15,
            min_speed_pct: 10,
            max_speed_pct: 400,
            debounce_ms: 75,
            countdown_ms: 1000,
        }
    }
}

impl PlayerConfig {
    /// Creates the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length of a whole note
    #[inline]
    pub fn whole_note_ms(mut self, ms: u32) -> Self {
        self.whole_note_ms = ms;
        self
    }

    /// Set the debounce window
    #[inline]
    pub fn debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the allowed speed range. The bounds are swapped if given in the wrong order.
    #[inline]
    pub fn speed_range(mut self, min_pct: u16, max_pct: u16) -> Self {
        self.min_speed_pct = min_pct.min(max_pct).max(1);
        self.max_speed_pct = max_pct.max(min_pct).max(1);
        self
    }
}

/// Duration in milliseconds of a note of `unit` (4 for a quarter note) at `speed_pct` percent of
/// normal speed
#[inline]
pub fn note_ms(whole_note_ms: u32, unit: u8, speed_pct: u16) -> u32 {
    (whole_note_ms * 100) / (unit as u32 * speed_pct as u32).max(1)
}

/// Accepts a key only once it has been held for longer than the debounce window.
///
/// Each press is accepted at most once; the key has to be released before it counts again.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    window_ms: u32,
    key: Option<u8>,
    pressed_at: u32,
    fired: bool,
}

impl Debouncer {
    /// Debouncer with the given window
    pub const fn new(window_ms: u32) -> Self {
        Debouncer {
            window_ms,
            key: None,
            pressed_at: 0,
            fired: false,
        }
    }

    /// Whether the key held since `pressed_at` has outlasted the window
    #[inline]
    pub fn is_settled(&self, now: u32) -> bool {
        elapsed_since(now, self.pressed_at) > self.window_ms
    }

    /// Feed the current keypad reading. Returns the key on the reading that accepts it.
    pub fn update(&mut self, key: Option<u8>, now: u32) -> Option<u8> {
        if key != self.key {
            self.key = key;
            self.pressed_at = now;
            self.fired = false;
            return None;
        }
        match key {
            Some(k) if !self.fired && self.is_settled(now) => {
                self.fired = true;
                Some(k)
            }
            _ => None,
        }
    }

    /// Forget any key in progress
    pub fn reset(&mut self) {
        self.key = None;
        self.fired = false;
    }
}

/// Steps of the countdown before a song
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Count {
    /// "3", first LED
    Three,
    /// "2", second LED
    Two,
    /// "1", first LED
    One,
    /// "GO", both LEDs
    Go,
}

impl Count {
    /// Text shown for this step
    pub fn label(self) -> &'static str {
        match self {
            Count::Three => "3",
            Count::Two => "2",
            Count::One => "1",
            Count::Go => "GO",
        }
    }

    /// LEDs lit during this step
    pub fn leds(self) -> LedMask {
        match self {
            Count::Three | Count::One => LedMask::LED1,
            Count::Two => LedMask::LED2,
            Count::Go => LedMask::LED1 | LedMask::LED2,
        }
    }

    /// Following step, `None` after "GO"
    pub fn next(self) -> Option<Count> {
        match self {
            Count::Three => Some(Count::Two),
            Count::Two => Some(Count::One),
            Count::One => Some(Count::Go),
            Count::Go => None,
        }
    }
}

/// States of the player
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerState {
    /// Welcome screen, waiting for `*`
    Welcome,
    /// Waiting for a song number
    SongMenu,
    /// Countdown before the song
    Countdown(Count),
    /// Show the settings screen before playback
    Settings,
    /// Song playing
    Playing,
    /// Song paused
    Paused,
}

const MENU_TOP: i32 = 50;
const MENU_FIRST_ITEM: i32 = 70;
const MENU_SPACING: i32 = 10;

/// The music player bound to its peripherals
pub struct Player<D, K, B, L, C> {
    display: D,
    keypad: K,
    buzzer: B,
    leds: L,
    clock: C,
    config: PlayerConfig,
    songs: &'static [Song],
    state: PlayerState,
    song: Song,
    index: usize,
    first_time: bool,
    speed_pct: u16,
    note_watch: Stopwatch,
    count_watch: Stopwatch,
    debouncer: Debouncer,
}

impl<D, K, B, L, C> Player<D, K, B, L, C>
where
    D: Display,
    K: Keypad,
    B: Buzzer,
    L: Indicators,
    C: Monotonic,
{
    /// Player offering the built-in songs. Shows the welcome screen.
    pub fn new(display: D, keypad: K, buzzer: B, leds: L, clock: C, config: PlayerConfig) -> Self {
        Self::with_songs(display, keypad, buzzer, leds, clock, config, &songs::SONGS)
    }

    /// Player offering `songs`, selected with keys `1` to `9` in order. Shows the welcome screen.
    pub fn with_songs(
        display: D,
        keypad: K,
        buzzer: B,
        leds: L,
        clock: C,
        config: PlayerConfig,
        songs: &'static [Song],
    ) -> Self {
        let now = clock.now();
        let mut player = Player {
            display,
            keypad,
            buzzer,
            leds,
            clock,
            config,
            songs,
            state: PlayerState::Welcome,
            song: songs::MARIO,
            index: 0,
            first_time: true,
            speed_pct: 100,
            note_watch: Stopwatch::started_at(now),
            count_watch: Stopwatch::started_at(now),
            debouncer: Debouncer::new(config.debounce_ms),
        };
        player.state = player.go_main_menu();
        player
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Index of the note being played
    #[inline]
    pub fn note_index(&self) -> usize {
        self.index
    }

    /// Playback speed in percent
    #[inline]
    pub fn speed_pct(&self) -> u16 {
        self.speed_pct
    }

    /// Song selected last
    #[inline]
    pub fn song(&self) -> &Song {
        &self.song
    }

    /// Borrow the display
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Borrow the buzzer
    pub fn buzzer(&self) -> &B {
        &self.buzzer
    }

    /// Borrow the LEDs
    pub fn leds(&self) -> &L {
        &self.leds
    }

    /// Borrow the keypad
    pub fn keypad_mut(&mut self) -> &mut K {
        &mut self.keypad
    }

    /// Release the peripherals
    pub fn free(self) -> (D, K, B, L, C) {
        (self.display, self.keypad, self.buzzer, self.leds, self.clock)
    }

    /// Duration of the current note at the current speed
    pub fn current_note_ms(&self) -> u32 {
        let unit = self.song.durations.get(self.index).copied().unwrap_or(1);
        note_ms(self.config.whole_note_ms, unit, self.speed_pct)
    }

    /// Run one iteration of the player and return the next state
    pub fn step(&mut self) -> PlayerState {
        let now = self.clock.now();
        let next = match self.state {
            PlayerState::Welcome => match self.keypad.get_key() {
                Some(b'*') => self.go_song_menu(),
                _ => PlayerState::Welcome,
            },
            PlayerState::SongMenu => self.song_menu(),
            PlayerState::Countdown(count) => self.countdown(count, now),
            PlayerState::Settings => {
                self.draw_settings();
                self.note_watch.restart(now);
                self.debouncer.reset();
                self.leds.show(LedMask::LED2);
                PlayerState::Playing
            }
            PlayerState::Playing => self.playing(now),
            PlayerState::Paused => self.paused(now),
        };
        if next != self.state {
            debug!("player: {} -> {}", self.state, next);
        }
        self.state = next;
        next
    }

    /// Run the player forever
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    fn song_menu(&mut self) -> PlayerState {
        match self.keypad.get_key() {
            Some(b'#') => self.go_main_menu(),
            Some(key @ b'1'..=b'9') => {
                let choice = (key - b'1') as usize;
                match self.songs.get(choice) {
                    Some(&song) => {
                        info!("player: song {}", choice + 1);
                        self.song = song;
                        self.index = 0;
                        self.first_time = true;
                        self.speed_pct = 100;
                        self.display.clear_and_flush();
                        // Song timing counts from the selection
                        self.clock.reset();
                        let now = self.clock.now();
                        self.start_count(Count::Three, now)
                    }
                    None => PlayerState::SongMenu,
                }
            }
            _ => PlayerState::SongMenu,
        }
    }

    fn countdown(&mut self, count: Count, now: u32) -> PlayerState {
        if self.keypad.get_key() == Some(b'#') {
            return self.go_main_menu();
        }
        if self.count_watch.elapsed(now) < self.config.countdown_ms {
            return PlayerState::Countdown(count);
        }
        self.display.clear_and_flush();
        match count.next() {
            Some(next) => self.start_count(next, now),
            None => {
                self.leds.all_off();
                PlayerState::Settings
            }
        }
    }

    fn playing(&mut self, now: u32) -> PlayerState {
        if self.index >= self.song.len() {
            info!("player: song finished");
            return self.go_main_menu();
        }
        self.play_note(now);

        let key = self.keypad.get_key();
        if key == Some(b'#') {
            return self.go_main_menu();
        }
        match self.debouncer.update(key, now) {
            Some(b'1') => {
                self.note_watch.pause(now);
                self.buzzer.stop();
                self.leds.show(LedMask::LED1);
                PlayerState::Paused
            }
            Some(b'4') => self.go_song_menu(),
            Some(other) => {
                self.adjust_speed(other);
                PlayerState::Playing
            }
            None => PlayerState::Playing,
        }
    }

    fn paused(&mut self, now: u32) -> PlayerState {
        let key = self.keypad.get_key();
        match self.debouncer.update(key, now) {
            Some(b'1') => {
                self.note_watch.resume(now);
                self.first_time = true;
                self.leds.show(LedMask::LED2);
                PlayerState::Playing
            }
            Some(b'4') => self.go_song_menu(),
            Some(other) => {
                self.adjust_speed(other);
                PlayerState::Paused
            }
            None => PlayerState::Paused,
        }
    }

    /// Sound the current note once, then move to the next note when it has lasted long enough
    fn play_note(&mut self, now: u32) {
        if self.first_time {
            self.buzzer.tone(self.song.notes[self.index]);
            self.first_time = false;
        } else if self.note_watch.elapsed(now) > self.current_note_ms() {
            self.note_watch.restart(now);
            self.index += 1;
            self.first_time = true;
        }
    }

    fn adjust_speed(&mut self, key: u8) {
        let step = self.config.speed_step_pct;
        let speed = match key {
            b'2' => self.speed_pct.saturating_add(step),
            b'3' => self.speed_pct.saturating_sub(step),
            _ => return,
        };
        self.speed_pct = speed.clamp(self.config.min_speed_pct, self.config.max_speed_pct);
        debug!("player: speed {}%", self.speed_pct);
    }

    fn start_count(&mut self, count: Count, now: u32) -> PlayerState {
        self.leds.show(count.leds());
        self.display.draw_centered(count.label(), CENTER_X, 64);
        self.display.flush();
        self.count_watch.restart(now);
        PlayerState::Countdown(count)
    }

    fn go_main_menu(&mut self) -> PlayerState {
        self.buzzer.stop();
        self.display.clear_and_flush();
        self.leds.all_off();
        self.display.draw_centered("MUSIC PLAYER", CENTER_X, 50);
        self.display.draw_centered("Go to Menu", CENTER_X, 70);
        self.display.draw_centered("Press *", CENTER_X, 80);
        self.display.flush();
        PlayerState::Welcome
    }

    fn go_song_menu(&mut self) -> PlayerState {
        self.buzzer.stop();
        self.display.clear();
        self.leds.all_off();
        self.display.draw_centered("CHOOSE SONG", CENTER_X, MENU_TOP);
        let mut y = MENU_FIRST_ITEM;
        for (i, song) in self.songs.iter().enumerate().take(9) {
            let mut item = Line::new();
            write!(item, "{}. {}", i + 1, song.title).ok();
            self.display.draw_centered(&item, CENTER_X, y);
            y += MENU_SPACING;
        }
        self.display.flush();
        PlayerState::SongMenu
    }

    fn draw_settings(&mut self) {
        self.display.clear();
        self.display.draw_centered("CHOOSE SETTING", CENTER_X, MENU_TOP);
        let items = ["1. Pause/Play", "2. Play faster", "3. Play slower", "4. Return"];
        let mut y = MENU_FIRST_ITEM;
        for item in items {
            self.display.draw_centered(item, CENTER_X, y);
            y += MENU_SPACING;
        }
        self.display.flush();
    }
}
