//! Character-level similarity ratio (Ratcliff/Obershelp gestalt matching).

use std::collections::HashMap;

/// `b` strings at least this long drop their popular characters from the
/// match index.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Similarity of `a` and `b` in `[0.0, 1.0]`: `2 * M / T`, where `T` is the
/// total number of characters and `M` the number of characters in matching
/// blocks.
///
/// Blocks are found by taking the longest common substring (earliest on
/// ties) and recursing on the unmatched pieces to its left and right. Two
/// empty strings are identical.
///
/// When `b` has at least 200 characters, a character occurring more than
/// `1 + len(b) / 100` times in it cannot start a block, though blocks found
/// elsewhere still grow across it. Long values made of a few repeated
/// characters therefore score lower than their longest common substring
/// would suggest.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let index = BlockIndex::new(&b);
    (2 * index.matching_characters(&a)) as f64 / total as f64
}

/// Positions of each character of `b`, minus popular ones.
struct BlockIndex<'a> {
    b: &'a [char],
    positions: HashMap<char, Vec<usize>>,
}

impl<'a> BlockIndex<'a> {
    fn new(b: &'a [char]) -> Self {
        let mut positions: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            positions.entry(c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            positions.retain(|_, at| at.len() <= limit);
        }
        Self { b, positions }
    }

    /// Total size of all matching blocks.
    fn matching_characters(&self, a: &[char]) -> usize {
        let mut matched = 0;
        let mut pending = vec![(0, a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, size) = self.longest_match(a, alo, ahi, blo, bhi);
            if size == 0 {
                continue;
            }
            matched += size;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + size < ahi && j + size < bhi {
                pending.push((i + size, ahi, j + size, bhi));
            }
        }

        matched
    }

    /// Longest block `a[i..i+size] == b[j..j+size]` inside the given windows.
    ///
    /// Among equally long indexed blocks the one ending first in `a` wins,
    /// then the one starting first in `b`. The winner is then extended over
    /// equal neighbours, popular ones included.
    fn longest_match(
        &self,
        a: &[char],
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let b = self.b;
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
        // run[j]: length of the indexed match ending at a[i - 1], b[j]
        let mut run: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next = HashMap::new();
            let Some(at) = self.positions.get(&a[i]) else {
                run = next;
                continue;
            };
            for &j in at.iter().skip_while(|&&j| j < blo).take_while(|&&j| j < bhi) {
                let size = j
                    .checked_sub(1)
                    .and_then(|prev| run.get(&prev))
                    .copied()
                    .unwrap_or(0)
                    + 1;
                next.insert(j, size);
                if size > best_size {
                    best_i = i + 1 - size;
                    best_j = j + 1 - size;
                    best_size = size;
                }
            }
            run = next;
        }

        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }
}
