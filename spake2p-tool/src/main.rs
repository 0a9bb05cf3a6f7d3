// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! SPAKE2+ command-line tool
//!
//! - `gen-verifier`: writes a CSV of PIN verifiers for device provisioning
//! - `pair`: runs a prover and a verifier against each other in-process
//! - `csr`: generates a P-256 key pair and a PKCS#10 signing request

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rand_core::{OsRng, RngCore};
use spake2p_common::{MIN_CSR_BUFFER_SIZE, SYMMETRIC_KEY_LENGTH};
use spake2p_crypto_rustcrypto::{verify_certificate_signing_request, P256Keypair, P256Sha256HkdfHmac};
use spake2p_protocol::verifier::{
    SPAKE2P_MAX_PBKDF_ITERATIONS, SPAKE2P_MAX_PBKDF_SALT_LENGTH, SPAKE2P_MIN_PBKDF_ITERATIONS,
    SPAKE2P_MIN_PBKDF_SALT_LENGTH,
};
use spake2p_protocol::{PbkdfParameters, Spake2p, Spake2pVerifier};
use tracing::{debug, error, info, warn};

/// Prefix of the commissioning PAKE context
const PAKE_CONTEXT_PREFIX: &[u8] = b"CHIP PAKE V1 Commissioning";

/// Largest PIN representable as 8 decimal digits
const MAX_PIN: u32 = 99_999_999;

const CSR_BUFFER_SIZE: usize = 4 * MIN_CSR_BUFFER_SIZE;

#[derive(Parser, Debug)]
#[command(name = "spake2p")]
#[command(about = "SPAKE2+ verifier generation and pairing self-test", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate PIN verifiers as CSV
    GenVerifier(GenVerifierArgs),
    /// Run a prover and a verifier against each other
    Pair(PairArgs),
    /// Generate a P-256 key pair and print a base64 CSR
    Csr,
}

/// PBKDF2 settings shared by the subcommands
#[derive(Args, Debug)]
struct PbkdfArgs {
    /// PBKDF2 iteration count
    #[arg(short, long, default_value_t = SPAKE2P_MIN_PBKDF_ITERATIONS)]
    iterations: u32,

    /// Salt as base64; a random salt is used when omitted
    #[arg(short, long)]
    salt: Option<String>,

    /// Length of the random salt in bytes
    #[arg(long, default_value_t = SPAKE2P_MAX_PBKDF_SALT_LENGTH)]
    salt_len: usize,
}

#[derive(Args, Debug)]
struct GenVerifierArgs {
    /// First PIN code
    #[arg(short, long, default_value_t = 20_202_021)]
    pin: u32,

    /// Number of consecutive PIN codes to generate
    #[arg(short, long, default_value_t = 1)]
    count: u32,

    #[command(flatten)]
    pbkdf: PbkdfArgs,

    /// Output CSV file (stdout when omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PairArgs {
    /// PIN code held by the verifier
    #[arg(short, long, default_value_t = 20_202_021)]
    pin: u32,

    /// PIN code entered on the prover (defaults to --pin)
    #[arg(long)]
    prover_pin: Option<u32>,

    #[command(flatten)]
    pbkdf: PbkdfArgs,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::GenVerifier(args) => run_gen_verifier(args),
        Command::Pair(args) => run_pair(args),
        Command::Csr => run_csr(),
    };

    if let Err(e) = result {
        error!("{:?}", e);
        eprintln!("{} {:#}", "FAIL:".bright_red().bold(), e);
        std::process::exit(1);
    }
    Ok(())
}

fn check_pin(pin: u32) -> Result<()> {
    if pin == 0 || pin > MAX_PIN {
        bail!("PIN code {pin} is outside 1..={MAX_PIN}");
    }
    Ok(())
}

/// Resolve the salt argument, drawing a random one if none was given.
fn salt_from_args(args: &PbkdfArgs) -> Result<Vec<u8>> {
    match &args.salt {
        Some(encoded) => STANDARD.decode(encoded).context("salt is not valid base64"),
        None => {
            let mut salt = vec![0u8; args.salt_len];
            OsRng
                .try_fill_bytes(&mut salt)
                .context("failed to draw a random salt")?;
            Ok(salt)
        }
    }
}

fn pbkdf_params(args: &PbkdfArgs) -> Result<PbkdfParameters> {
    let salt = salt_from_args(args)?;
    PbkdfParameters::new(args.iterations, &salt).with_context(|| {
        format!(
            "invalid PBKDF2 parameters: {} iterations with a {}-byte salt \
             (allowed: {SPAKE2P_MIN_PBKDF_ITERATIONS}..={SPAKE2P_MAX_PBKDF_ITERATIONS} iterations, \
             {SPAKE2P_MIN_PBKDF_SALT_LENGTH}..={SPAKE2P_MAX_PBKDF_SALT_LENGTH}-byte salt)",
            args.iterations,
            salt.len()
        )
    })
}

fn run_gen_verifier(args: &GenVerifierArgs) -> Result<()> {
    if args.count == 0 {
        bail!("--count must be at least 1");
    }
    let last_pin = args
        .pin
        .checked_add(args.count - 1)
        .context("PIN range overflows")?;
    check_pin(args.pin)?;
    check_pin(last_pin)?;

    let mut writer: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };

    let suite = P256Sha256HkdfHmac::default();
    writeln!(writer, "Index,PIN Code,Iteration Count,Salt,Verifier")?;
    for (index, pin) in (args.pin..=last_pin).enumerate() {
        // Each row gets its own random salt unless one was given
        let params = pbkdf_params(&args.pbkdf)?;
        let verifier = Spake2pVerifier::generate_with(&suite, &params, pin)
            .with_context(|| format!("verifier generation failed for row {index}"))?;
        let encoded = verifier.to_base64().context("verifier encoding failed")?;

        writeln!(
            writer,
            "{},{:08},{},{},{}",
            index,
            pin,
            params.iterations(),
            STANDARD.encode(params.salt()),
            encoded.as_str()
        )?;
        debug!("Generated verifier row {index}");
    }
    writer.flush()?;

    if let Some(path) = &args.out {
        info!("Wrote {} verifier(s) to {}", args.count, path.display());
    }
    Ok(())
}

fn run_pair(args: &PairArgs) -> Result<()> {
    let prover_pin = args.prover_pin.unwrap_or(args.pin);
    check_pin(args.pin)?;
    check_pin(prover_pin)?;

    let params = pbkdf_params(&args.pbkdf)?;
    let mut context = PAKE_CONTEXT_PREFIX.to_vec();
    context.extend_from_slice(params.salt());

    println!();
    println!("{}", "=== SPAKE2+ pairing self-test ===".bright_cyan().bold());
    println!("  Iterations: {}", params.iterations());
    println!("  Salt: {}", STANDARD.encode(params.salt()));

    // Verifier side only ever sees the (w0, L) record
    let record = Spake2pVerifier::generate_with(&P256Sha256HkdfHmac::default(), &params, args.pin)
        .context("verifier generation failed")?;
    let mut verifier = Spake2p::new(P256Sha256HkdfHmac::default());
    verifier.init(&context)?;
    verifier.begin_verifier(&[], &[], &record.w0, &record.l)?;

    let prover_suite = P256Sha256HkdfHmac::default();
    let ws = Spake2pVerifier::compute_ws(&prover_suite, &params, prover_pin)
        .context("PBKDF2 failed")?;
    let mut prover = Spake2p::new(prover_suite);
    prover.init(&context)?;
    prover.begin_prover(&[], &[], ws.w0s(), ws.w1s())?;

    let mut x = [0u8; 65];
    let mut y = [0u8; 65];
    let x_len = prover.compute_round_one(None, &mut x)?;
    let y_len = verifier.compute_round_one(Some(&x[..x_len]), &mut y)?;
    println!("- Exchanged shares ({x_len} and {y_len} bytes)");

    let mut mac_prover = [0u8; 32];
    let mut mac_verifier = [0u8; 32];
    let mac_v_len = verifier.compute_round_two(&x[..x_len], &mut mac_verifier)?;
    let mac_p_len = prover.compute_round_two(&y[..y_len], &mut mac_prover)?;
    println!("- Exchanged confirmation MACs");

    let verifier_ok = verifier.key_confirm(&mac_prover[..mac_p_len]).is_ok();
    let prover_ok = prover.key_confirm(&mac_verifier[..mac_v_len]).is_ok();
    if !(verifier_ok && prover_ok) {
        warn!("Key confirmation failed: prover={prover_ok} verifier={verifier_ok}");
        bail!("key confirmation failed; PIN codes do not match");
    }

    let mut ke_prover = [0u8; SYMMETRIC_KEY_LENGTH];
    let mut ke_verifier = [0u8; SYMMETRIC_KEY_LENGTH];
    prover.get_keys(&mut ke_prover)?;
    verifier.get_keys(&mut ke_verifier)?;
    if ke_prover != ke_verifier {
        bail!("session keys differ after confirmation");
    }

    println!();
    println!("{}", "OK: Keys confirmed".bright_green().bold());
    Ok(())
}

fn run_csr() -> Result<()> {
    let keypair = P256Keypair::generate(&mut OsRng).context("key generation failed")?;

    let mut csr = [0u8; CSR_BUFFER_SIZE];
    let len = keypair
        .new_certificate_signing_request(&mut csr)
        .context("CSR generation failed")?;
    let public_key =
        verify_certificate_signing_request(&csr[..len]).context("generated CSR did not verify")?;
    if &public_key != keypair.public_key() {
        bail!("CSR public key does not match the generated key");
    }
    info!("Generated {len}-byte CSR");

    println!("{}", STANDARD.encode(&csr[..len]));
    Ok(())
}
