//! Part-of-speech aggregation over a word's senses.

use lexcore_shared::PartOfSpeech;

use crate::base::SenseEntry;

/// Label of a category code; unknown codes are kept verbatim.
pub fn pos_label(code: &str) -> String {
    PartOfSpeech::from_code(code)
        .map(|pos| pos.label().to_string())
        .unwrap_or_else(|| code.to_string())
}

/// The most frequent category across `senses`.
///
/// Ties go to the earlier entry of [`PartOfSpeech::PRIORITY`]. Senses with
/// unknown codes are not counted; with nothing counted the result is noun.
pub fn dominant_pos(senses: &[SenseEntry]) -> PartOfSpeech {
    let mut counts = [0usize; PartOfSpeech::PRIORITY.len()];
    for pos in senses.iter().filter_map(SenseEntry::part_of_speech) {
        if let Some(slot) = PartOfSpeech::PRIORITY.iter().position(|p| *p == pos) {
            counts[slot] += 1;
        }
    }

    let mut best = 0;
    for (slot, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = slot;
        }
    }
    PartOfSpeech::PRIORITY[best]
}
