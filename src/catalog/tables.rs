//! Constant lookup tables shared by the voices and the mixer

use crate::generator::fixed::UNITY;

/// Lowest playable melodic note (A0); lower notes are clamped up to it
pub const MIN_NOTE: u8 = 21;
/// Highest playable melodic note (C8); higher notes are clamped down to it
pub const MAX_NOTE: u8 = 108;
/// Number of playable melodic notes
pub const NUM_NOTES: usize = (MAX_NOTE - MIN_NOTE + 1) as usize;

/// Equal-tempered note frequencies in Hz, scaled by 4096, for notes 21..=108
pub const FREQ4096: [u32; NUM_NOTES] = [
    112640, 119338, 126434, 133952, 141918, 150356, 159297, //
    168769, 178805, 189437, 200702, 212636, 225280, 238676, 252868, //
    267905, 283835, 300713, 318594, 337539, 357610, 378874, 401403, //
    425272, 450560, 477352, 505737, 535809, 567670, 601425, 637188, //
    675077, 715219, 757749, 802807, 850544, 901120, 954703, 1011473, //
    1071618, 1135340, 1202851, 1274376, 1350154, 1430439, 1515497, //
    1605613, 1701088, 1802240, 1909407, 2022946, 2143237, 2270680, //
    2405702, 2548752, 2700309, 2860878, 3030994, 3211227, 3402176, //
    3604480, 3818814, 4045892, 4286473, 4541360, 4811404, 5097505, //
    5400618, 5721755, 6061989, 6422453, 6804352, 7208960, 7637627, //
    8091784, 8572947, 9082720, 9622807, 10195009, 10801236, 11443511, //
    12123977, 12844906, 13608704, 14417920, 15275254, 16183568, //
    17145893,
];

/// Maximum number of tone generators mixed together
pub const MAX_GENERATORS: usize = 16;

/// Q16 gain applied to every voice before summing, indexed by how many
/// generators may sound at once. Entry 0 (nothing playing) is unity.
pub const MIXER_ATTENUATION: [i32; MAX_GENERATORS + 1] = [
    UNITY, // 0
    UNITY, // 1: 1.00
    39321, // 2: 0.60
    32768, // 3: 0.50
    26214, // 4: 0.40
    19660, // 5: 0.30
    16384, // 6: 0.25
    15073, // 7: 0.23
    13107, // 8: 0.20
    11796, // 9: 0.18
    10485, // 10: 0.16
    9830,  // 11: 0.15
    9175,  // 12: 0.14
    8519,  // 13: 0.13
    7864,  // 14: 0.12
    7208,  // 15: 0.11
    6553,  // 16: 0.10
];

/// Clamp a melodic note number into the playable range
#[inline(always)]
pub fn clamp_note(note: u8) -> u8 {
    note.clamp(MIN_NOTE, MAX_NOTE)
}

/// Scaled frequency of a melodic note (clamped into range first)
#[inline(always)]
pub fn note_freq4096(note: u8) -> u32 {
    FREQ4096[(clamp_note(note) - MIN_NOTE) as usize]
}

/// Attenuation for a generator count; counts above the maximum use the
/// last entry
#[inline(always)]
pub fn attenuation_for(generators: usize) -> i32 {
    MIXER_ATTENUATION[generators.min(MAX_GENERATORS)]
}
