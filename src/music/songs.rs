//! Built-in melodies
//!
//! Notes are frequencies in Hz, 0 is a rest. Durations are note units: 4 is a quarter note, 12 a
//! twelfth (triplet eighth).

use super::Song;

// Equal temperament, A4 = 440 Hz
const C4: u16 = 262;
const D4: u16 = 294;
const E4: u16 = 330;
const F4: u16 = 349;
const G4: u16 = 392;
const A4: u16 = 440;
const AS4: u16 = 466;
const C5: u16 = 523;
const E6: u16 = 1319;
const G6: u16 = 1568;
const A6: u16 = 1760;
const AS6: u16 = 1865;
const B6: u16 = 1976;
const C7: u16 = 2093;
const D7: u16 = 2349;
const E7: u16 = 2637;
const F7: u16 = 2794;
const G7: u16 = 3136;
const A7: u16 = 3520;
const REST: u16 = 0;

const MARIO_NOTES: [u16; 46] = [
    E7, E7, REST, E7, REST, C7, E7, REST, G7, REST, REST, REST, G6, REST, REST, REST, //
    C7, REST, REST, G6, REST, REST, E6, REST, REST, A6, REST, B6, REST, AS6, A6, REST, //
    G6, E7, G7, A7, REST, F7, G7, REST, E7, REST, C7, D7, B6, REST,
];

const MARIO_DURATIONS: [u8; 46] = [
    12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, //
    12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, //
    9, 9, 9, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12,
];

const BIRTHDAY_NOTES: [u16; 25] = [
    C4, C4, D4, C4, F4, E4, //
    C4, C4, D4, C4, G4, F4, //
    C4, C4, C5, A4, F4, E4, D4, //
    AS4, AS4, A4, F4, G4, F4,
];

const BIRTHDAY_DURATIONS: [u8; 25] = [
    8, 8, 4, 4, 4, 2, //
    8, 8, 4, 4, 4, 2, //
    8, 8, 4, 4, 4, 4, 4, //
    8, 8, 4, 4, 4, 2,
];

/// Opening of the Super Mario Bros. overworld theme
pub const MARIO: Song = Song::new("Mario Theme Song", &MARIO_NOTES, &MARIO_DURATIONS);

/// Happy Birthday
pub const BIRTHDAY: Song = Song::new("HBD Song", &BIRTHDAY_NOTES, &BIRTHDAY_DURATIONS);

/// Songs offered in the song menu, in menu order
pub static SONGS: [Song; 2] = [MARIO, BIRTHDAY];
