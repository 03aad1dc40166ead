//! Static Huffman coding over small integer alphabets (§4.7).
//!
//! A [`HuffmanTable`] is a binary tree built once (from an arbitrary
//! distribution, or from one of the five fixed Gaussian tables used by
//! the entropy dispatcher) and then reused for encode/decode and for
//! direct sampling: walking the tree with random bits rather than coded
//! bits draws exactly from the distribution the tree was built for, which
//! is what [`sample_huffman`] does.
//!
//! Grounded in `original_source/src/utils/entropy/huffman.c` and the
//! fixed-table layout in `huffman.h`. All five of the header's built-in
//! `(code, bits)` tables (`huff_code_gaussian_2` through `_6`) are
//! transcribed verbatim into `HUFF_CODE_GAUSSIAN_2`..`_6` below and
//! exposed via [`fixed_gaussian_table`] — the first three happen to be
//! literal unary codes (`1` terminates, `0` continues, MSB first) and
//! the last two are full priority-queue trees, but all five are
//! embedded data rather than regenerated, so the wire format matches
//! the original bit-for-bit.
//! [`create_huffman_gaussian`]/[`create_huffman_gaussian_sampler`] remain
//! for the runtime-built tables the original itself constructs at
//! arbitrary `(bits, sigma)` — used by the entropy dispatcher's
//! non-fixed parameters and by the sampling façade's signed sampler
//! tables, neither of which has a verbatim literal counterpart in
//! `huffman.h`.

use crate::packer::BitPacker;
use std::collections::{BinaryHeap, HashMap};

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum HuffmanError {
    #[error("distribution must have at least one non-zero-probability symbol")]
    EmptyDistribution,
    #[error("constructed code exceeds the 64-bit hard limit")]
    CodeTooLong,
    #[error("symbol is not present in this table")]
    UnknownSymbol,
    #[error("ran out of packed bits while decoding")]
    Truncated,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(i64),
    Internal { zero: usize, one: usize },
}

/// A complete, prefix-free binary code over a fixed alphabet of `i64`
/// symbols.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    nodes: Vec<Node>,
    root: usize,
    codes: HashMap<i64, (u64, u8)>,
}

/// The five fixed `(bits, sigma)` pairs used by the original's built-in
/// Gaussian tables 2..6 (spec.md §4.7).
pub const FIXED_TABLE_PARAMS: [(u32, f64); 5] = [(2, 0.8), (3, 0.4), (4, 0.8), (5, 1.6), (6, 12.8)];

/// `huff_code_gaussian_2` from `huffman.h`, symbol `i` at array index `i`.
const HUFF_CODE_GAUSSIAN_2: [(u32, u8); 4] = [(0x00000001, 1), (0x00000001, 2), (0x00000001, 3), (0x00000000, 3)];

/// `huff_code_gaussian_3`.
const HUFF_CODE_GAUSSIAN_3: [(u32, u8); 8] = [
    (0x00000001, 1),
    (0x00000001, 2),
    (0x00000001, 3),
    (0x00000001, 4),
    (0x00000001, 5),
    (0x00000001, 6),
    (0x00000001, 7),
    (0x00000000, 7),
];

/// `huff_code_gaussian_4`.
const HUFF_CODE_GAUSSIAN_4: [(u32, u8); 16] = [
    (0x00000001, 1),
    (0x00000001, 2),
    (0x00000001, 3),
    (0x00000001, 4),
    (0x00000001, 5),
    (0x00000001, 6),
    (0x00000001, 7),
    (0x00000001, 8),
    (0x00000001, 9),
    (0x00000001, 10),
    (0x00000001, 11),
    (0x00000001, 12),
    (0x00000001, 13),
    (0x00000001, 14),
    (0x00000001, 15),
    (0x00000000, 15),
];

/// `huff_code_gaussian_5` (5 bits, sigma=1.6).
const HUFF_CODE_GAUSSIAN_5: [(u32, u8); 32] = [
    (0x00000000, 1),
    (0x00000003, 2),
    (0x00000005, 3),
    (0x00000009, 4),
    (0x00000011, 5),
    (0x00000021, 6),
    (0x00000041, 7),
    (0x00000081, 8),
    (0x00000101, 9),
    (0x00000201, 10),
    (0x00000401, 11),
    (0x00000801, 12),
    (0x00001001, 13),
    (0x00002001, 14),
    (0x00004001, 15),
    (0x00008001, 16),
    (0x00010001, 17),
    (0x00020001, 18),
    (0x00040001, 19),
    (0x00080001, 20),
    (0x00100001, 21),
    (0x00200001, 22),
    (0x00400001, 23),
    (0x00800001, 24),
    (0x01000001, 25),
    (0x02000001, 26),
    (0x04000001, 27),
    (0x08000001, 28),
    (0x10000001, 29),
    (0x20000001, 30),
    (0x40000001, 31),
    (0x40000000, 31),
];

/// `huff_code_gaussian_6` (6 bits, sigma=12.8).
const HUFF_CODE_GAUSSIAN_6: [(u32, u8); 64] = [
    (0x0000000A, 4),
    (0x00000009, 4),
    (0x00000008, 4),
    (0x00000007, 4),
    (0x00000006, 4),
    (0x00000005, 4),
    (0x00000003, 4),
    (0x00000002, 4),
    (0x00000001, 4),
    (0x0000001F, 5),
    (0x0000001E, 5),
    (0x0000001C, 5),
    (0x0000001B, 5),
    (0x00000019, 5),
    (0x00000018, 5),
    (0x00000016, 5),
    (0x00000008, 5),
    (0x00000001, 5),
    (0x0000003B, 6),
    (0x00000035, 6),
    (0x00000034, 6),
    (0x0000002E, 6),
    (0x00000012, 6),
    (0x00000000, 6),
    (0x00000075, 7),
    (0x0000005F, 7),
    (0x00000027, 7),
    (0x00000003, 7),
    (0x00000002, 7),
    (0x000000E8, 8),
    (0x000000BC, 8),
    (0x0000004C, 8),
    (0x000001D2, 9),
    (0x0000017A, 9),
    (0x0000009B, 9),
    (0x000003A7, 10),
    (0x000002F7, 10),
    (0x00000135, 10),
    (0x0000074D, 11),
    (0x000005ED, 11),
    (0x00000269, 11),
    (0x00000E99, 12),
    (0x00000BD9, 12),
    (0x00000BD8, 12),
    (0x000004D0, 12),
    (0x00001D30, 13),
    (0x000009A2, 13),
    (0x00003A62, 14),
    (0x00001346, 14),
    (0x000074C6, 15),
    (0x0000268E, 15),
    (0x0000E98E, 16),
    (0x00004D1E, 16),
    (0x0001D31F, 17),
    (0x00009A3F, 17),
    (0x0003A63D, 18),
    (0x0001347D, 18),
    (0x00074C79, 19),
    (0x000268F9, 19),
    (0x000E98F1, 20),
    (0x000E98F0, 20),
    (0x0004D1F0, 20),
    (0x0009A3E3, 21),
    (0x0009A3E2, 21),
];

impl HuffmanTable {
    /// Build from an explicit, unnormalized probability distribution over
    /// symbols `0..probs.len()`. Ties are broken by symbol index, giving
    /// deterministic, reproducible trees.
    pub fn from_distribution(probs: &[f64]) -> Result<HuffmanTable, HuffmanError> {
        let symbols: Vec<i64> = (0..probs.len() as i64).collect();
        Self::from_weighted_symbols(&symbols, probs)
    }

    /// Build from an explicit `(symbol, weight)` pairing — used for the
    /// signed-symbol sampler tables where the alphabet isn't a dense
    /// `0..n` range.
    pub fn from_weighted_symbols(symbols: &[i64], weights: &[f64]) -> Result<HuffmanTable, HuffmanError> {
        assert_eq!(symbols.len(), weights.len());
        let present: Vec<(i64, f64)> = symbols.iter().copied().zip(weights.iter().copied()).filter(|(_, w)| *w > 0.0).collect();
        if present.is_empty() {
            return Err(HuffmanError::EmptyDistribution);
        }
        tracing::debug!(symbols = present.len(), "building huffman table");
        if present.len() == 1 {
            let mut nodes = Vec::new();
            nodes.push(Node::Leaf(present[0].0));
            let mut codes = HashMap::new();
            codes.insert(present[0].0, (0u64, 1u8));
            return Ok(HuffmanTable { nodes, root: 0, codes });
        }

        #[derive(PartialEq)]
        struct HeapItem {
            weight: f64,
            order: u64,
            node: usize,
        }
        impl Eq for HeapItem {}
        impl Ord for HeapItem {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                other.weight.partial_cmp(&self.weight).unwrap_or(std::cmp::Ordering::Equal).then_with(|| other.order.cmp(&self.order))
            }
        }
        impl PartialOrd for HeapItem {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        let mut nodes = Vec::new();
        let mut heap = BinaryHeap::new();
        let mut order = 0u64;
        for (sym, w) in &present {
            nodes.push(Node::Leaf(*sym));
            heap.push(HeapItem { weight: *w, order, node: nodes.len() - 1 });
            order += 1;
        }
        let mut weight_of: Vec<f64> = present.iter().map(|(_, w)| *w).collect();

        while heap.len() > 1 {
            let a = heap.pop().unwrap();
            let b = heap.pop().unwrap();
            nodes.push(Node::Internal { zero: a.node, one: b.node });
            let new_weight = a.weight + b.weight;
            weight_of.push(new_weight);
            heap.push(HeapItem { weight: new_weight, order, node: nodes.len() - 1 });
            order += 1;
        }
        let root = heap.pop().unwrap().node;

        let mut codes = HashMap::new();
        assign_codes(&nodes, root, 0, 0, &mut codes)?;
        Ok(HuffmanTable { nodes, root, codes })
    }

    pub fn code_of(&self, symbol: i64) -> Result<(u64, u8), HuffmanError> {
        self.codes.get(&symbol).copied().ok_or(HuffmanError::UnknownSymbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &i64> {
        self.codes.keys()
    }
}

fn assign_codes(nodes: &[Node], at: usize, code: u64, len: u8, out: &mut HashMap<i64, (u64, u8)>) -> Result<(), HuffmanError> {
    if len > 64 {
        return Err(HuffmanError::CodeTooLong);
    }
    match &nodes[at] {
        Node::Leaf(sym) => {
            out.insert(*sym, (code, len.max(1)));
            Ok(())
        }
        Node::Internal { zero, one } => {
            assign_codes(nodes, *zero, code << 1, len + 1, out)?;
            assign_codes(nodes, *one, (code << 1) | 1, len + 1, out)
        }
    }
}

/// Build a [`HuffmanTable`] from a literal `(code, bits)` array as found
/// in `huffman.h`, symbol `i` taken from array index `i`. Reconstructs an
/// explicit node tree consistent with the given codes for decode/sample
/// tree-walks; the codes themselves are exactly the transcribed literal
/// values, so the wire format matches the original bit-for-bit.
fn embedded_table_from_literal(entries: &[(u32, u8)]) -> HuffmanTable {
    let mut codes = HashMap::new();
    for (sym, &(code, bits)) in entries.iter().enumerate() {
        codes.insert(sym as i64, (code as u64, bits));
    }
    HuffmanTable { nodes: build_tree_from_codes(&codes), root: 0, codes }
}

fn build_tree_from_codes(codes: &HashMap<i64, (u64, u8)>) -> Vec<Node> {
    let mut nodes = vec![Node::Internal { zero: usize::MAX, one: usize::MAX }];
    let mut entries: Vec<(i64, u64, u8)> = codes.iter().map(|(&s, &(c, l))| (s, c, l)).collect();
    entries.sort_by_key(|&(_, _, l)| l);
    for (sym, code, len) in entries {
        let mut at = 0usize;
        for bit_pos in (0..len).rev() {
            let bit = (code >> bit_pos) & 1;
            let is_last = bit_pos == 0;
            let child = match &nodes[at] {
                Node::Internal { zero, one } => {
                    if bit == 0 {
                        *zero
                    } else {
                        *one
                    }
                }
                Node::Leaf(_) => unreachable!("prefix collision while rebuilding huffman tree"),
            };
            if is_last {
                let leaf_idx = nodes.len();
                nodes.push(Node::Leaf(sym));
                set_child(&mut nodes, at, bit, leaf_idx);
            } else if child == usize::MAX {
                let new_idx = nodes.len();
                nodes.push(Node::Internal { zero: usize::MAX, one: usize::MAX });
                set_child(&mut nodes, at, bit, new_idx);
                at = new_idx;
            } else {
                at = child;
            }
        }
    }
    nodes
}

fn set_child(nodes: &mut [Node], at: usize, bit: u64, child: usize) {
    if let Node::Internal { zero, one } = &mut nodes[at] {
        if bit == 0 {
            *zero = child;
        } else {
            *one = child;
        }
    }
}

fn half_gaussian_weights(bits: u32, sigma: f64) -> Vec<f64> {
    let n = 1usize << bits;
    (0..n).map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp()).collect()
}

/// Build the unsigned-magnitude Gaussian table for parameter index
/// `bits` (symbols `0..2^bits`, weight `exp(-i^2/(2 sigma^2))`).
pub fn create_huffman_gaussian(bits: u32, sigma: f64) -> Result<HuffmanTable, HuffmanError> {
    HuffmanTable::from_distribution(&half_gaussian_weights(bits, sigma))
}

/// Build a signed sampler table: symbol `0` keeps the unsigned weight;
/// every non-zero magnitude `i` is split into `+i`/`-i`, each carrying
/// half the unsigned weight (the two-sided discrete Gaussian).
pub fn create_huffman_gaussian_sampler(bits: u32, sigma: f64) -> Result<HuffmanTable, HuffmanError> {
    let unsigned = half_gaussian_weights(bits, sigma);
    let mut symbols = Vec::with_capacity(2 * unsigned.len() - 1);
    let mut weights = Vec::with_capacity(2 * unsigned.len() - 1);
    symbols.push(0i64);
    weights.push(unsigned[0]);
    for (i, &w) in unsigned.iter().enumerate().skip(1) {
        symbols.push(i as i64);
        weights.push(w / 2.0);
        symbols.push(-(i as i64));
        weights.push(w / 2.0);
    }
    HuffmanTable::from_weighted_symbols(&symbols, &weights)
}

/// One of the five fixed tables from spec.md §4.7, by index `0..=4`
/// (bit-widths 2..6), built from the literal `(code, bits)` arrays
/// transcribed from `huffman.h` so the wire format is bit-identical to
/// the original for all five.
pub fn fixed_gaussian_table(index: usize) -> HuffmanTable {
    match index {
        0 => embedded_table_from_literal(&HUFF_CODE_GAUSSIAN_2),
        1 => embedded_table_from_literal(&HUFF_CODE_GAUSSIAN_3),
        2 => embedded_table_from_literal(&HUFF_CODE_GAUSSIAN_4),
        3 => embedded_table_from_literal(&HUFF_CODE_GAUSSIAN_5),
        4 => embedded_table_from_literal(&HUFF_CODE_GAUSSIAN_6),
        _ => panic!("fixed Gaussian table index out of range (0..=4): {index}"),
    }
}

pub fn encode_huffman(table: &HuffmanTable, symbol: i64, packer: &mut BitPacker) -> Result<(), HuffmanError> {
    let (code, len) = table.code_of(symbol)?;
    packer.write(code, len as u32).map_err(|_| HuffmanError::CodeTooLong)
}

pub fn decode_huffman(table: &HuffmanTable, packer: &mut BitPacker) -> Result<i64, HuffmanError> {
    let mut at = table.root;
    loop {
        match &table.nodes[at] {
            Node::Leaf(sym) => return Ok(*sym),
            Node::Internal { zero, one } => {
                let bit = packer.read(1).map_err(|_| HuffmanError::Truncated)?;
                at = if bit == 0 { *zero } else { *one };
            }
        }
    }
}

/// Draw a symbol by walking the tree with fair random bits: the standard
/// entropy-optimal way to sample from a distribution given its Huffman
/// tree, using on average the tree's own entropy in random bits.
pub fn sample_huffman(table: &HuffmanTable, rng: &mut dyn crate::prng::Prng) -> i64 {
    use rand::Rng;
    let mut at = table.root;
    loop {
        match &table.nodes[at] {
            Node::Leaf(sym) => return *sym,
            Node::Internal { zero, one } => {
                at = if rng.gen_bool(0.5) { *one } else { *zero };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn fixed_table2_matches_transcribed_huffman_h() {
        // huff_code_gaussian_2: symbol i's code/length taken verbatim from
        // huffman.h ("1" terminates, "0" continues, MSB first).
        let t = fixed_gaussian_table(0);
        assert_eq!(t.code_of(0).unwrap(), (0x1, 1));
        assert_eq!(t.code_of(1).unwrap(), (0x1, 2));
        assert_eq!(t.code_of(2).unwrap(), (0x1, 3));
        assert_eq!(t.code_of(3).unwrap(), (0x0, 3));
    }

    #[test]
    fn fixed_table3_matches_transcribed_huffman_h() {
        let t = fixed_gaussian_table(1);
        assert_eq!(t.code_of(0).unwrap(), (0x1, 1));
        assert_eq!(t.code_of(6).unwrap(), (0x1, 7));
        assert_eq!(t.code_of(7).unwrap(), (0x0, 7));
    }

    #[test]
    fn encode_decode_roundtrips_every_symbol() {
        let t = create_huffman_gaussian(4, 0.8).unwrap();
        for sym in 0i64..16 {
            let mut p = BitPacker::new(usize::MAX, None);
            encode_huffman(&t, sym, &mut p).unwrap();
            p.flush().unwrap();
            let buf = p.get_buffer().to_vec();
            let mut r = BitPacker::new(usize::MAX, Some(buf));
            assert_eq!(decode_huffman(&t, &mut r).unwrap(), sym);
        }
    }

    #[test]
    fn fixed_table3_encode_decode_roundtrips() {
        let t = fixed_gaussian_table(1);
        for sym in 0i64..8 {
            let mut p = BitPacker::new(usize::MAX, None);
            encode_huffman(&t, sym, &mut p).unwrap();
            p.flush().unwrap();
            let buf = p.get_buffer().to_vec();
            let mut r = BitPacker::new(usize::MAX, Some(buf));
            assert_eq!(decode_huffman(&t, &mut r).unwrap(), sym);
        }
    }

    #[test]
    fn sample_huffman_only_returns_known_symbols() {
        let t = create_huffman_gaussian_sampler(3, 1.6).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let s = sample_huffman(&t, &mut rng);
            assert!(t.code_of(s).is_ok());
        }
    }

    #[test]
    fn fixed_tables_build_without_panicking() {
        for i in 0..5 {
            let _ = fixed_gaussian_table(i);
        }
    }
}
