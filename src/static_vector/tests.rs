use super::*;
use pretty_assertions::assert_eq;
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use test_case::test_case;

/// Bit-by-bit reference answers next to the vector under test.
struct Reference {
    bits: Vec<bool>,
    prefix_ones: Vec<u64>,
    one_positions: Vec<u64>,
    zero_positions: Vec<u64>,
}

impl Reference {
    fn new(bits: Vec<bool>) -> Self {
        let mut prefix_ones = Vec::with_capacity(bits.len());
        let mut one_positions = Vec::new();
        let mut zero_positions = Vec::new();
        let mut count = 0u64;
        for (i, &bit) in bits.iter().enumerate() {
            if bit {
                count += 1;
                one_positions.push(i as u64);
            } else {
                zero_positions.push(i as u64);
            }
            prefix_ones.push(count);
        }
        Reference {
            bits,
            prefix_ones,
            one_positions,
            zero_positions,
        }
    }

    fn vector(&self) -> StaticVector {
        let mut words = vec![0u64; self.bits.len().div_ceil(64).max(1)];
        for (i, &bit) in self.bits.iter().enumerate() {
            if bit {
                words[i / 64] |= 1 << (i % 64);
            }
        }
        StaticVector::from_bits(words, self.bits.len() as u64)
    }
}

fn random_reference(len: usize, density: f64, seed: u64) -> Reference {
    let mut rng = StdRng::seed_from_u64(seed);
    Reference::new((0..len).map(|_| rng.gen_bool(density)).collect())
}

/// Positions worth probing: directory boundaries and their neighbors plus
/// an even sample.
fn probe_points(n: u64) -> Vec<u64> {
    let mut points = vec![0, n - 1];
    for boundary in [256u64, 65536] {
        let mut b = boundary;
        while b < n {
            points.push(b - 1);
            points.push(b);
            if b + 1 < n {
                points.push(b + 1);
            }
            b += boundary;
        }
    }
    let step = (n / 997).max(1);
    points.extend((0..n).step_by(step as usize));
    points
}

#[test_case(1_000, 0.5, 1)]
#[test_case(65_536, 0.5, 2)]
#[test_case(65_537, 0.03, 3)]
#[test_case(200_000, 0.5, 4)]
#[test_case(200_000, 0.01, 5)]
#[test_case(1_200_000, 0.2, 6; "many superblocks")]
fn rank_matches_reference(len: usize, density: f64, seed: u64) {
    let reference = random_reference(len, density, seed);
    let v = reference.vector();
    assert_eq!(v.len(), len as u64);
    assert_eq!(v.ones(), *reference.prefix_ones.last().unwrap());
    for i in probe_points(len as u64) {
        assert_eq!(v.rank1(i), reference.prefix_ones[i as usize], "rank1({i})");
        assert_eq!(v.rank0(i), i + 1 - reference.prefix_ones[i as usize]);
        assert_eq!(v.access(i), reference.bits[i as usize]);
    }
}

#[test_case(1_000, 0.5, 7)]
#[test_case(65_537, 0.03, 8)]
#[test_case(200_000, 0.5, 9)]
#[test_case(200_000, 0.97, 10)]
#[test_case(1_200_000, 0.2, 11; "many superblocks")]
fn select_matches_reference(len: usize, density: f64, seed: u64) {
    let reference = random_reference(len, density, seed);
    let v = reference.vector();
    let ones = v.ones();
    let step = (ones / 997).max(1);
    for j in (1..=ones).step_by(step as usize) {
        assert_eq!(
            v.select1(j),
            reference.one_positions[j as usize - 1],
            "select1({j})"
        );
        assert_eq!(v.rank1(v.select1(j)), j);
    }
    assert_eq!(v.select1(ones), *reference.one_positions.last().unwrap());
    let zeros = v.len() - ones;
    let step = (zeros / 997).max(1);
    for j in (1..=zeros).step_by(step as usize) {
        assert_eq!(
            v.select0(j),
            reference.zero_positions[j as usize - 1],
            "select0({j})"
        );
        assert_eq!(v.rank0(v.select0(j)), j);
    }
    assert_eq!(v.select0(zeros), *reference.zero_positions.last().unwrap());
}

#[test]
fn select_on_back_loaded_content() {
    // every interpolation guess lands far off target here
    let mut bits = vec![false; 190_000];
    bits.extend(std::iter::repeat(true).take(10_000));
    let reference = Reference::new(bits);
    let v = reference.vector();
    assert_eq!(v.select1(1), 190_000);
    assert_eq!(v.select1(10_000), 199_999);
    assert_eq!(v.select0(190_000), 189_999);
    for j in (1..=10_000).step_by(101) {
        assert_eq!(v.select1(j), 190_000 + j - 1);
    }
}

#[test]
fn next_walk_matches_select() {
    let reference = random_reference(150_000, 0.001, 12);
    let v = reference.vector();
    let mut walked = Vec::new();
    let mut pos = 0;
    while pos < v.len() {
        match v.next1(pos) {
            Some(hit) => {
                walked.push(hit);
                pos = hit + 1;
            }
            None => break,
        }
    }
    assert_eq!(walked, reference.one_positions);
}

#[test]
fn next0_walk_matches_select0() {
    let reference = random_reference(150_000, 0.999, 13);
    let v = reference.vector();
    let mut walked = Vec::new();
    let mut pos = 0;
    while pos < v.len() {
        match v.next0(pos) {
            Some(hit) => {
                walked.push(hit);
                pos = hit + 1;
            }
            None => break,
        }
    }
    assert_eq!(walked, reference.zero_positions);
}

#[test]
fn next_sees_no_phantom_bits_past_the_end() {
    // all ones, length straddling a word: the complement of the tail word
    // must not invent zeros
    let n = 65_536 + 100;
    let v = StaticVector::from_bits(vec![u64::MAX; words_for(n)], n);
    assert_eq!(v.ones(), n);
    assert_eq!(v.next0(0), None);
    assert_eq!(v.next0(n - 1), None);
    assert_eq!(v.next1(n - 1), Some(n - 1));
    assert_eq!(v.rank0(n - 1), 0);
}

#[test]
fn single_one_far_out() {
    let n = 300_000u64;
    let p = 250_007u64;
    let mut words = vec![0u64; words_for(n)];
    words[(p / 64) as usize] |= 1 << (p % 64);
    let v = StaticVector::from_bits(words, n);
    assert_eq!(v.ones(), 1);
    assert_eq!(v.select1(1), p);
    assert_eq!(v.next1(0), Some(p));
    assert_eq!(v.next1(p), Some(p));
    assert_eq!(v.next1(p + 1), None);
    assert_eq!(v.rank1(n - 1), 1);
    assert_eq!(v.rank1(p - 1), 0);
}

#[test]
fn all_zeros() {
    let n = 100_000;
    let v = StaticVector::from_bits(vec![0u64; words_for(n)], n);
    assert_eq!(v.ones(), 0);
    assert_eq!(v.next1(0), None);
    assert_eq!(v.rank1(n - 1), 0);
    assert_eq!(v.select0(n), n - 1);
}

#[test]
fn from_bits_drops_tail_bits() {
    let n = 10_000;
    let v = StaticVector::from_bits(vec![u64::MAX; words_for(n) + 3], n);
    assert_eq!(v.ones(), n);
    assert_eq!(v.rank1(n - 1), n);
}

#[test]
fn read_round_trips() {
    let reference = random_reference(40_000, 0.4, 14);
    let v = reference.vector();
    let mut buf = vec![0u64; words_for(20_000) + 1];
    v.read(7_001, 20_000, &mut buf, 3);
    for i in 0..20_000u64 {
        let got = (buf[((3 + i) / 64) as usize] >> ((3 + i) % 64)) & 1 == 1;
        assert_eq!(got, reference.bits[7_001 + i as usize], "bit {i}");
    }
}

#[test]
fn save_emits_the_data_words() {
    let reference = random_reference(5_000, 0.5, 15);
    let v = reference.vector();
    let mut sink = Vec::new();
    v.save(&mut sink).unwrap();
    assert_eq!(sink.len(), words_for(5_000) * 8);
    for (chunk, word) in sink.chunks_exact(8).zip(v.data.iter()) {
        assert_eq!(chunk, word.to_le_bytes().as_slice());
    }
}

#[quickcheck]
fn rank_duality(bits: Vec<bool>) -> TestResult {
    if bits.is_empty() {
        return TestResult::discard();
    }
    let reference = Reference::new(bits);
    let v = reference.vector();
    let n = v.len();
    TestResult::from_bool((0..n).all(|i| v.rank1(i) + v.rank0(i) == i + 1))
}

#[quickcheck]
fn select_inverts_rank(bits: Vec<bool>) -> TestResult {
    if bits.is_empty() {
        return TestResult::discard();
    }
    let reference = Reference::new(bits);
    let v = reference.vector();
    for j in 1..=v.ones() {
        if v.rank1(v.select1(j)) != j || !v.access(v.select1(j)) {
            return TestResult::failed();
        }
    }
    for j in 1..=v.len() - v.ones() {
        if v.rank0(v.select0(j)) != j || v.access(v.select0(j)) {
            return TestResult::failed();
        }
    }
    TestResult::passed()
}
