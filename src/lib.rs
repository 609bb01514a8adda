//! # Huffman coding over a noisy channel
//!
//! `huffman-channel` builds minimum-redundancy prefix codes with the
//! [Huffman coding](https://en.wikipedia.org/wiki/Huffman_coding) algorithm,
//! encodes and decodes text against the derived code table, and can damage an
//! encoded stream with a deterministic pattern of bit flips to show how a
//! prefix code falls apart on a noisy channel.
//!
//! The decoder does not resynchronize: a single flipped bit can shift every
//! later code boundary, and a trailing run of bits that matches no code is
//! dropped without complaint. [`corrupt`] exists to make that failure mode
//! easy to reproduce.
//!
//! Input is expected to arrive already normalized (case-folded, stripped of
//! unwanted characters); this crate treats every
//! [Unicode grapheme cluster](http://www.unicode.org/reports/tr29/#Grapheme_Cluster_Boundaries)
//! of its input as one symbol and does not inspect symbol content further.
//!
//! ## References
//!
//! * _Huffman, D.A., 1952. A method for the construction of minimum-redundancy codes. Proceedings of the IRE, 40(9), pp.1098-1101._

use bitvec::prelude::*;
use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Errors raised while building a tree or encoding against a code table.
///
/// Decoding has no error path: a damaged stream decodes to whatever symbols
/// the surviving code boundaries spell out (see [`decode`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The operation was handed an input it cannot work with, such as an
    /// empty frequency table or a corruption rate outside `[0, 1)`.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A symbol in the input has no entry in the code table.
    #[error("no code for symbol {0:?}")]
    UnknownSymbol(String),
}

/// An encoded stream of bits, represented as a
/// [`bitvec::vec::BitVec`](https://docs.rs/bitvec/0.22.3/bitvec/vec/struct.BitVec.html),
/// a contiguous array of bits.
pub type Encoded = BitVec;
/// A code table mapping each symbol (a grapheme cluster, stored as an owned
/// `String`) to its [`Encoded`] code. Derived from one tree by [`code_table`];
/// no code in the table is a prefix of another.
pub type CodeTable = std::collections::HashMap<String, Encoded>;

const ZERO: bool = false;
const ONE: bool = true;

/// Creates and returns a list of the symbols found in the input paired with
/// their occurrence count, ordered by decreasing count.
///
/// The counts sum to the number of graphemes in the input, and every distinct
/// grapheme appears exactly once.
///
/// # Examples
///
/// Basic usage:
///
/// ```
/// let freqs = huffman_channel::frequencies("abracadabra");
/// let mut iter = freqs.iter();
///
/// assert_eq!(iter.next(), Some(&("a", 5)));
/// assert_eq!(iter.next(), Some(&("b", 2)));
/// assert_eq!(iter.next(), Some(&("r", 2)));
/// assert_eq!(iter.next(), Some(&("c", 1)));
/// assert_eq!(iter.next(), Some(&("d", 1)));
/// assert_eq!(iter.next(), None);
/// ```
pub fn frequencies<'a>(s: &'a str) -> Vec<(&'a str, usize)> {
    let mut counts = ::std::collections::HashMap::new();

    for g in UnicodeSegmentation::graphemes(s, true) {
        *(counts.entry(g).or_insert(0)) += 1;
    }
    let mut freqs = counts.into_iter().collect::<Vec<(&str, usize)>>();
    freqs.sort_by(|a, b| {
        // Equal counts are ordered by comparing the symbols themselves, so
        // the table comes out the same no matter what order the symbols
        // appear in the input stream.
        b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
    });
    freqs
}

/// Builds the Huffman tree for a frequency table.
///
/// One leaf is created per table entry, all leaves go into a min-priority
/// queue keyed by count, and the two lowest nodes are repeatedly merged under
/// a fresh internal node (the first one extracted becomes the left child)
/// until a single root remains. Nodes with equal counts leave the queue in
/// creation order: leaves in frequency-table order, then merged nodes in the
/// order they were formed. The tie-break changes code shapes but never the
/// prefix-free property.
///
/// A table with a single entry yields a lone [`Node::Leaf`].
///
/// # Examples
///
/// ```
/// use huffman_channel::*;
///
/// let root = build_tree(&frequencies("aab")).unwrap();
/// assert_eq!(root.count(), 3);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the frequency table is empty.
pub fn build_tree<'a>(freqs: &[(&'a str, usize)]) -> Result<Node<'a>, Error> {
    if freqs.is_empty() {
        return Err(Error::InvalidInput(
            "cannot build a tree from an empty frequency table".to_string(),
        ));
    }

    let mut heap = ::std::collections::BinaryHeap::with_capacity(freqs.len());
    for (order, &(symbol, count)) in freqs.iter().enumerate() {
        heap.push(Ranked {
            count,
            order,
            node: Node::Leaf { symbol, count },
        });
    }
    let mut next_order = freqs.len();
    while heap.len() > 1 {
        let first = heap.pop().unwrap();
        let second = heap.pop().unwrap();
        heap.push(Ranked {
            count: first.count + second.count,
            order: next_order,
            node: Node::Internal {
                left: Box::new(first.node),
                right: Box::new(second.node),
            },
        });
        next_order += 1;
    }
    Ok(heap.pop().unwrap().node)
}

/// Derives the code table for a tree: every leaf's symbol maps to the path
/// from the root to that leaf, with `0` for a left edge and `1` for a right
/// edge.
///
/// Only leaves receive codes, so no code is a prefix of another. A tree that
/// is a lone leaf gets the one-bit code `0` for its symbol, never an empty
/// code (an empty code could not be recognized during decode).
///
/// # Examples
///
/// ```
/// use huffman_channel::*;
/// use bitvec::prelude::*;
///
/// let codes = code_table(&build_tree(&frequencies("aabbbc")).unwrap());
/// assert_eq!(codes.get("b"), Some(&bitvec![0]));
/// assert_eq!(codes.get("c"), Some(&bitvec![1, 0]));
/// assert_eq!(codes.get("a"), Some(&bitvec![1, 1]));
/// ```
pub fn code_table(root: &Node) -> CodeTable {
    let mut codes = CodeTable::new();
    if let Node::Leaf { symbol, .. } = root {
        codes.insert(symbol.to_string(), bitvec![0]);
    } else {
        assign(root, &BitVec::new(), &mut codes);
    }
    codes
}

// Walks the tree depth-first, left subtree before right. The path from the
// root is threaded down as a growing prefix, and each leaf's accumulated
// prefix is recorded as its code.
fn assign(node: &Node, prefix: &Encoded, codes: &mut CodeTable) {
    match node {
        Node::Leaf { symbol, .. } => {
            codes.insert(symbol.to_string(), prefix.to_bitvec());
        }
        Node::Internal { left, right } => {
            let mut lprefix = prefix.to_bitvec();
            lprefix.push(ZERO);
            assign(left, &lprefix, codes);
            let mut rprefix = prefix.to_bitvec();
            rprefix.push(ONE);
            assign(right, &rprefix, codes);
        }
    }
}

/// Encodes an input string against a code table, concatenating the code of
/// each symbol in input order.
///
/// # Examples
///
/// ```
/// use huffman_channel::*;
/// use bitvec::prelude::*;
///
/// let codes = code_table(&build_tree(&frequencies("aab")).unwrap());
/// assert_eq!(encode("aab", &codes).unwrap(), bitvec![1, 1, 0]);
/// ```
///
/// # Errors
///
/// Returns [`Error::UnknownSymbol`] naming the first symbol of the input that
/// has no entry in the table. This cannot happen when the table was derived
/// from a tree built over this input's own frequencies, but a mismatched
/// table must be caught:
///
/// ```
/// use huffman_channel::*;
///
/// let codes = code_table(&build_tree(&frequencies("aaa")).unwrap());
/// assert_eq!(
///     encode("ab", &codes),
///     Err(Error::UnknownSymbol("b".to_string()))
/// );
/// ```
pub fn encode(s: &str, codes: &CodeTable) -> Result<Encoded, Error> {
    let mut encoded = Encoded::new();
    for g in UnicodeSegmentation::graphemes(s, true) {
        match codes.get(g) {
            Some(code) => encoded.extend(code),
            None => return Err(Error::UnknownSymbol(g.to_string())),
        }
    }
    Ok(encoded)
}

/// Decodes an encoded stream against a code table.
///
/// Bits are fed one at a time into an accumulator; whenever the accumulator
/// exactly matches a code, the corresponding symbol is emitted and the
/// accumulator is cleared. A trailing run of bits that never completes a code
/// is silently discarded: it produces no symbol and no error.
///
/// Decoding never fails, which is exactly what makes it fragile on a damaged
/// stream. One flipped bit can land the accumulator on an unintended code
/// boundary, after which every later symbol may come out wrong:
///
/// ```
/// use huffman_channel::*;
/// use bitvec::prelude::*;
///
/// let mut codes = CodeTable::new();
/// codes.insert("a".to_string(), bitvec![0]);
/// codes.insert("b".to_string(), bitvec![1, 0]);
/// codes.insert("c".to_string(), bitvec![1, 1]);
///
/// assert_eq!(decode(&codes, &bitvec![0, 1, 0, 1, 1]), "abc");
/// // The same stream with its first bit flipped:
/// assert_eq!(decode(&codes, &bitvec![1, 1, 0, 1, 1]), "cac");
/// ```
pub fn decode(codes: &CodeTable, encoded: &Encoded) -> String {
    let dict = codes
        .iter()
        .map(|(sym, code)| (code, sym.as_str()))
        .collect::<std::collections::HashMap<&Encoded, &str>>();

    let mut acc = Encoded::new();
    let mut decoded = Vec::<&str>::new();
    for bit in encoded.iter() {
        acc.push(*bit);
        if let Some(&sym) = dict.get(&acc) {
            decoded.push(sym);
            acc.truncate(0);
        }
    }
    // Whatever is left in the accumulator matched no code; it is dropped.
    decoded.join("")
}

/// Runs the whole pipeline on an input string: count frequencies, build the
/// tree, derive the code table, and encode. Returns the code table together
/// with the encoded stream; both are needed to [`decode`] later.
///
/// # Examples
///
/// Basic usage:
///
/// ```
/// use huffman_channel::*;
/// use bitvec::prelude::*;
///
/// let (codes, encoded) = compress("baba").unwrap();
/// assert_eq!(encoded, bitvec![1, 0, 1, 0]);
/// assert_eq!(decode(&codes, &encoded), "baba");
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] on an empty input, for which no tree can
/// be built.
pub fn compress(s: &str) -> Result<(CodeTable, Encoded), Error> {
    let freqs = frequencies(s);
    let root = build_tree(&freqs)?;
    let codes = code_table(&root);
    let encoded = encode(s, &codes)?;
    Ok((codes, encoded))
}

/// Flips a deterministic subset of bits in an encoded stream, simulating
/// transmission errors.
///
/// The number of errors is `⌊len × error_rate⌋`; the bits at every multiple
/// of `⌊len / errors⌋` are flipped, starting from index 0. A positive rate
/// too small to damage even one bit still flips the first bit, while a rate
/// of exactly `0.0` leaves the stream untouched. The same arguments always
/// produce the same output, so decode failures can be replayed bit for bit.
///
/// # Examples
///
/// ```
/// use huffman_channel::corrupt;
/// use bitvec::prelude::*;
///
/// let clean = bitvec![0, 0, 0, 0, 0, 0];
/// assert_eq!(corrupt(&clean, 0.5).unwrap(), bitvec![1, 0, 1, 0, 1, 0]);
/// assert_eq!(corrupt(&clean, 0.0).unwrap(), clean);
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `error_rate` is outside `[0, 1)`.
pub fn corrupt(encoded: &Encoded, error_rate: f64) -> Result<Encoded, Error> {
    if !(0.0..1.0).contains(&error_rate) {
        return Err(Error::InvalidInput(format!(
            "error rate {} is outside [0, 1)",
            error_rate
        )));
    }

    let total = encoded.len();
    let mut damaged = encoded.clone();
    if total == 0 || error_rate == 0.0 {
        return Ok(damaged);
    }

    let error_count = (total as f64 * error_rate) as usize;
    let stride = if error_count == 0 {
        total
    } else {
        total / error_count
    };
    let mut i = 0;
    while i < total {
        let flipped = !damaged[i];
        damaged.set(i, flipped);
        i += stride;
    }
    Ok(damaged)
}

/// A node of the Huffman tree.
///
/// A tree over `n` distinct symbols has exactly `n` leaves and `n - 1`
/// internal nodes; a single-symbol input collapses to a lone [`Node::Leaf`].
/// Each node exclusively owns its children, so subtrees are never shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node<'a> {
    /// Holds one symbol and its occurrence count; has no children.
    Leaf { symbol: &'a str, count: usize },
    /// Holds no symbol and exactly two children; its count is the sum of its
    /// children's counts.
    Internal {
        left: Box<Node<'a>>,
        right: Box<Node<'a>>,
    },
}

impl Node<'_> {
    /// Returns the number of input symbols covered by this subtree.
    pub fn count(&self) -> usize {
        match self {
            Node::Leaf { count, .. } => *count,
            Node::Internal { left, right } => left.count() + right.count(),
        }
    }
}

// A priority-queue entry: a node together with the keys it is ranked by.
// `order` is the node's creation rank (leaves take the position of their
// symbol in the frequency table, merged nodes follow on from there), so
// equal counts leave the queue oldest-first.
#[derive(Debug)]
struct Ranked<'a> {
    count: usize,
    order: usize,
    node: Node<'a>,
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // We flip the order of the arguments as the standard BinaryHeap is a
        // max-heap and we want the smallest entries extracted first.
        (other.count, other.order).cmp(&(self.count, self.order))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        (self.count, self.order) == (other.count, other.order)
    }
}
impl Eq for Ranked<'_> {}
