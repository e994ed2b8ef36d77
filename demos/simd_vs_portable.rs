//! Benchmark comparing SIMD vs portable ChaCha20 block functions.
//!
//! This example runs the ChaCha20 stream cipher over 1 GB of random data using both the
//! SIMD-optimized and portable implementations of the block function, measuring the performance
//! difference.
//!
//! **Performance characteristics by platform:**
//! - **x86_64**: Hand-written SSE2 processes the four state rows as vectors
//! - **Other platforms**: Both variants run the portable code
//!
//! Run with: cargo run --release --example simd_vs_portable

use chacha_poly::{BLOCK_SIZE, KEY_SIZE, NONCE_SIZE, bench};
use std::time::Instant;

const ONE_GB: usize = 1024 * 1024 * 1024; // 1 GB
const CHUNK_SIZE: usize = 1024 * 1024; // 1 MB chunks

/// XOR data with the ChaCha20 keystream using a specific block function implementation.
fn encrypt_with_impl<F>(
    key: &[u8; KEY_SIZE],
    nonce: &[u8; NONCE_SIZE],
    data: &mut [u8],
    block_fn: F,
) where
    F: Fn(&mut bench::State),
{
    use bench::State;

    let input = State::init(key, 1, nonce);
    let mut words = *input.words();

    for chunk in data.chunks_mut(BLOCK_SIZE) {
        let mut block = State::from_words(words);
        block_fn(&mut block);

        for (byte, k) in chunk.iter_mut().zip(block.to_bytes()) {
            *byte ^= k;
        }

        words[12] = words[12].wrapping_add(1);
    }
}

fn main() {
    println!("ChaCha20 SIMD vs Portable Benchmark");
    println!("===================================");

    #[cfg(target_arch = "x86_64")]
    println!("Platform: x86_64 - Comparing hand-written SSE2 vs portable\n");

    #[cfg(not(target_arch = "x86_64"))]
    println!("Platform: {} - Both use portable\n", std::env::consts::ARCH);

    // Generate random key and nonce
    println!("Generating random key and nonce...");
    let key: [u8; KEY_SIZE] = std::array::from_fn(|_| rand::random());
    let nonce: [u8; NONCE_SIZE] = std::array::from_fn(|_| rand::random());

    println!("Generating 1 GB of random data...");
    let mut data_simd = vec![0u8; ONE_GB];
    let mut data_portable = vec![0u8; ONE_GB];

    // Fill with random data
    for i in (0..ONE_GB).step_by(CHUNK_SIZE) {
        let end = (i + CHUNK_SIZE).min(ONE_GB);
        for byte in &mut data_simd[i..end] {
            *byte = rand::random();
        }
    }

    // Copy for portable version
    data_portable.copy_from_slice(&data_simd);

    println!("Data prepared. Starting benchmarks...\n");

    println!("Running SIMD version...");
    let start_simd = Instant::now();
    encrypt_with_impl(&key, &nonce, &mut data_simd, bench::chacha20_simd);
    let duration_simd = start_simd.elapsed();

    println!("SIMD completed in: {:.2?}", duration_simd);
    let throughput_simd = (ONE_GB as f64) / duration_simd.as_secs_f64() / (1024.0 * 1024.0);
    println!("SIMD throughput: {:.2} MB/s\n", throughput_simd);

    println!("Running portable version...");
    let start_portable = Instant::now();
    encrypt_with_impl(&key, &nonce, &mut data_portable, bench::chacha20_portable);
    let duration_portable = start_portable.elapsed();

    println!("Portable completed in: {:.2?}", duration_portable);
    let throughput_portable = (ONE_GB as f64) / duration_portable.as_secs_f64() / (1024.0 * 1024.0);
    println!("Portable throughput: {:.2} MB/s\n", throughput_portable);

    let speedup = duration_portable.as_secs_f64() / duration_simd.as_secs_f64();
    println!("===================================");
    println!("Results Summary:");
    println!("===================================");
    println!("SIMD:     {:.2?} ({:.2} MB/s)", duration_simd, throughput_simd);
    println!("Portable: {:.2?} ({:.2} MB/s)", duration_portable, throughput_portable);
    println!("Speedup:  {:.2}x", speedup);

    // Verify both produce the same output
    if data_simd == data_portable {
        println!("\n✓ Both implementations produce identical results");
    } else {
        println!("\n✗ WARNING: Implementations produce different results!");
    }
}
