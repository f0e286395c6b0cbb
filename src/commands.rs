//! The four drivers behind the binary: a random op mix, a space
//! measurement, a functional sanity storm and a next/select iteration
//! smoke test. None of them belong to the library contract.

use crate::bits::words_for;
use crate::config::Config;
use crate::HybridBitVector;
use rand::Rng;
use std::time::Instant;

/// Bit vector of `n` uniformly random bits.
fn random_vector(n: u64) -> HybridBitVector {
    let mut rng = rand::thread_rng();
    let words = (0..words_for(n)).map(|_| rng.gen()).collect();
    HybridBitVector::from_bits(words, n)
}

/// Apply `ops` operations: an `update_share` fraction of inserts/deletes
/// (50/50), the rest split between rank and select at random positions.
/// Returns the final length.
fn apply_mix(bv: &mut HybridBitVector, mut n: u64, ops: u64, update_share: f64) -> u64 {
    let mut rng = rand::thread_rng();
    for _ in 0..ops {
        if rng.gen::<f64>() < update_share {
            if rng.gen::<bool>() {
                n += 1;
                bv.insert(rng.gen_range(0..n), rng.gen());
            } else {
                bv.delete(rng.gen_range(0..n));
                n -= 1;
            }
        } else if rng.gen::<bool>() || bv.ones() == 0 {
            bv.rank1(rng.gen_range(0..n));
        } else {
            bv.select1(rng.gen_range(0..bv.ones()) + 1);
        }
    }
    n
}

/// Random op mix over a `2^logn`-bit vector; prints microseconds per
/// operation.
pub fn run_access(config: &Config) {
    let n = 1u64 << config.logn;
    let ops = (config.alpha * n as f64) as u64;
    let mut bv = random_vector(n);
    if let Some(theta) = config.theta {
        bv.set_theta(theta);
    }
    let start = Instant::now();
    apply_mix(&mut bv, n, ops, config.update_share);
    println!(
        "time = {:.2} microseconds",
        start.elapsed().as_secs_f64() * 1e6 / ops as f64
    );
}

/// Same mix, but reports the space the structure settles at.
pub fn run_memory(config: &Config) {
    let n = 1u64 << config.logn;
    let ops = (config.alpha * n as f64) as u64;
    let mut bv = random_vector(n);
    if let Some(theta) = config.theta {
        bv.set_theta(theta);
    }
    let len = apply_mix(&mut bv, n, ops, config.update_share);
    let words = bv.space_words();
    println!(
        "space = {} words ({:.3} bits per bit)",
        words,
        words as f64 * 64.0 / len as f64
    );
}

/// Functional storm: the access mix interleaved with rank/select/next
/// cross-checks and periodic aggregate validation. Prints microseconds per
/// operation on success, panics on the first mismatch.
pub fn run_sanity(config: &Config) {
    let mut n = 1u64 << config.logn;
    let ops = (config.alpha * n as f64) as u64;
    let mut bv = random_vector(n);
    if let Some(theta) = config.theta {
        bv.set_theta(theta);
    }
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    for step in 0..ops {
        if rng.gen::<f64>() < config.update_share {
            if rng.gen::<bool>() {
                n += 1;
                bv.insert(rng.gen_range(0..n), rng.gen());
            } else {
                bv.delete(rng.gen_range(0..n));
                n -= 1;
            }
        } else if rng.gen::<bool>() {
            let ones = bv.ones();
            if ones > 0 {
                let j = rng.gen_range(0..ones) + 1;
                let pos = bv.select1(j);
                assert!(bv.access(pos), "select1({j}) landed on a zero");
                assert_eq!(bv.rank1(pos), j, "rank1/select1 disagree at {j}");
            }
        } else {
            let zeros = n - bv.ones();
            if zeros > 0 {
                let j = rng.gen_range(0..zeros) + 1;
                let pos = bv.select0(j);
                assert!(!bv.access(pos), "select0({j}) landed on a one");
                assert_eq!(bv.rank0(pos), j, "rank0/select0 disagree at {j}");
            }
        }
        if step % 8192 == 0 {
            if let Err(broken) = bv.check() {
                panic!("structure check failed after {step} ops: {broken}");
            }
        }
    }
    println!(
        "time = {:.2} microseconds",
        start.elapsed().as_secs_f64() * 1e6 / ops as f64
    );
}

/// Sprinkle ones over a zeroed vector, then walk it with `next1`,
/// cross-checking every hop against `select1`. Prints microseconds per hop.
pub fn run_next(config: &Config) {
    let n = 1u64 << config.logn;
    let sprinkle = (n as f64 * config.update_share) as u64;
    let mut rng = rand::thread_rng();
    let mut words = vec![0u64; words_for(n)];
    for _ in 0..sprinkle {
        let j = rng.gen_range(0..n);
        words[(j / 64) as usize] |= 1u64 << (j % 64);
    }
    let mut bv = HybridBitVector::from_bits(words, n);
    if let Some(theta) = config.theta {
        bv.set_theta(theta);
    }
    let start = Instant::now();
    let mut pos = 0u64;
    let mut rank = 0u64;
    loop {
        let Some(hit) = bv.next1(pos) else {
            break;
        };
        rank += 1;
        assert_eq!(bv.select1(rank), hit, "next1/select1 disagree at rank {rank}");
        pos = hit + 1;
        if pos >= n {
            break;
        }
    }
    assert_eq!(bv.rank1(n - 1), rank, "rank1 disagrees after the walk");
    println!(
        "time = {:.2} microseconds",
        start.elapsed().as_secs_f64() * 1e6 / rank.max(1) as f64
    );
}
