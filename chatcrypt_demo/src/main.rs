use anyhow::{Context, Result, bail, ensure};
use chatcrypt_core::{
    ChatSession, DhParams, ExchangeBounds, KeyBundle, STANDARD_MODULUS_MAX, STANDARD_MODULUS_MIN,
    bit_balance, derive_session_rng, generate_parameters_with_rng,
};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{LevelFilter, debug, info};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "chatcrypt",
    author,
    version,
    about = "Diffie-Hellman + Blum Blum Shub + S-DES chat crypto (toy, not for real traffic)"
)]
struct Cli {
    #[arg(long, global = true)]
    debug: bool,
    /// Replays every random choice from this seed instead of the OS RNG.
    #[arg(long, global = true, value_name = "TEXT")]
    seed: Option<String>,
    #[arg(long, global = true, value_name = "N")]
    modulus_min: Option<u64>,
    #[arg(long, global = true, value_name = "N")]
    modulus_max: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate session parameters (prime modulus and primitive root).
    Params {
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Generate a participant key bundle for stored parameters.
    Keygen {
        #[arg(long, value_name = "FILE")]
        params: PathBuf,
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Print the shared secret and cipher key agreed with a peer.
    Shared {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "N")]
        peer_public: u64,
    },
    /// Encrypt a message for a peer.
    Encrypt {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "N")]
        peer_public: u64,
        #[arg(long, value_name = "TEXT")]
        message: Option<String>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Decrypt a binary-digit ciphertext received from a peer.
    Decrypt {
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,
        #[arg(long, value_name = "N")]
        peer_public: u64,
        #[arg(long, value_name = "BITS")]
        cipher: Option<String>,
        #[arg(long, value_name = "FILE")]
        input: Option<PathBuf>,
    },
    /// Run a full Alice/Bob exchange inline.
    Simulate {
        /// Message text, or a path to a file holding it.
        #[arg(long, default_value = "Hello Bob, this line is encrypted.")]
        alice: String,
        #[arg(long, default_value = "Hi Alice, got it.")]
        bob: String,
    },
    /// Check that the bit generator's output is balanced.
    Selftest {
        #[arg(long, default_value_t = 1000)]
        sessions: usize,
        #[arg(long, default_value_t = 50)]
        bits: usize,
        /// Largest accepted distance of the ones ratio from 0.5.
        #[arg(long, default_value_t = 0.02)]
        tolerance: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);
    let bounds = ExchangeBounds::new(
        cli.modulus_min.unwrap_or(STANDARD_MODULUS_MIN),
        cli.modulus_max.unwrap_or(STANDARD_MODULUS_MAX),
    )
    .context("invalid modulus bounds")?;
    let seed = cli.seed.as_deref();
    match cli.command {
        Commands::Params { out } => cmd_params(out, bounds, seed),
        Commands::Keygen { params, out } => cmd_keygen(params, out, bounds, seed),
        Commands::Shared { keys, peer_public } => cmd_shared(keys, peer_public),
        Commands::Encrypt {
            keys,
            peer_public,
            message,
            input,
            out,
        } => cmd_encrypt(keys, peer_public, message, input, out),
        Commands::Decrypt {
            keys,
            peer_public,
            cipher,
            input,
        } => cmd_decrypt(keys, peer_public, cipher, input),
        Commands::Simulate { alice, bob } => cmd_simulate(&alice, &bob, bounds, seed),
        Commands::Selftest {
            sessions,
            bits,
            tolerance,
        } => cmd_selftest(sessions, bits, tolerance, seed),
    }
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or(default));
    builder.format_timestamp(None);
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    let _ = builder.try_init();
}

fn session_rng(seed: Option<&str>, label: &str) -> Box<dyn RngCore> {
    match seed {
        Some(text) => {
            debug!("deterministic rng label={}", label);
            Box::new(derive_session_rng(text.as_bytes(), label.as_bytes()))
        }
        None => Box::new(OsRng),
    }
}

fn cmd_params(out: PathBuf, bounds: ExchangeBounds, seed: Option<&str>) -> Result<()> {
    let mut rng = session_rng(seed, "params");
    let params = generate_parameters_with_rng(bounds, &mut *rng)?;
    save_json(&out, "parameters", &params)?;
    println!(
        "Wrote parameters q={} a={} to {}",
        params.modulus,
        params.generator,
        out.display()
    );
    Ok(())
}

fn cmd_keygen(
    params_path: PathBuf,
    out: PathBuf,
    bounds: ExchangeBounds,
    seed: Option<&str>,
) -> Result<()> {
    let params: DhParams = load_json(&params_path, "parameters")?;
    let mut rng = session_rng(seed, "keygen");
    let session = ChatSession::join_with_rng(params, &bounds, &mut *rng)?;
    save_json(&out, "key bundle", &session.bundle())?;
    println!(
        "Wrote key bundle to {} (public key {})",
        out.display(),
        session.public_key()
    );
    Ok(())
}

fn cmd_shared(keys: PathBuf, peer_public: u64) -> Result<()> {
    let session = load_session(&keys)?;
    check_peer(&session, peer_public)?;
    let secret = session.shared_secret(peer_public);
    let key = session.cipher_key(peer_public)?;
    println!("Shared secret: {secret}");
    println!("Cipher key (10-bit): {key} ({})", key.value());
    Ok(())
}

fn cmd_encrypt(
    keys: PathBuf,
    peer_public: u64,
    message: Option<String>,
    input: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let session = load_session(&keys)?;
    check_peer(&session, peer_public)?;
    let plaintext = resolve_plaintext(message, input)?;
    let bits = session.encrypt_for(peer_public, &plaintext)?;
    info!("encrypted {} characters", plaintext.chars().count());
    match out {
        Some(path) => {
            fs::write(&path, &bits)
                .with_context(|| format!("writing ciphertext to {}", path.display()))?;
            println!("Wrote ciphertext to {}", path.display());
        }
        None => println!("{bits}"),
    }
    Ok(())
}

fn cmd_decrypt(
    keys: PathBuf,
    peer_public: u64,
    cipher: Option<String>,
    input: Option<PathBuf>,
) -> Result<()> {
    let session = load_session(&keys)?;
    check_peer(&session, peer_public)?;
    let bits = match (cipher, input) {
        (Some(bits), None) => bits,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("reading ciphertext from {}", path.display()))?,
        (Some(_), Some(_)) => bail!("Provide either --cipher or --input, not both."),
        (None, None) => bail!("Provide --cipher BITS or --input FILE for data to decrypt."),
    };
    let plaintext = session.decrypt_from(peer_public, bits.trim())?;
    println!("{plaintext}");
    Ok(())
}

fn cmd_simulate(
    alice_text: &str,
    bob_text: &str,
    bounds: ExchangeBounds,
    seed: Option<&str>,
) -> Result<()> {
    let mut rng = session_rng(seed, "simulate");
    let params = generate_parameters_with_rng(bounds, &mut *rng)?;
    let alice = ChatSession::join_with_rng(params, &bounds, &mut *rng)?;
    let bob = ChatSession::join_with_rng(params, &bounds, &mut *rng)?;

    let alice_secret = alice.shared_secret(bob.public_key());
    let bob_secret = bob.shared_secret(alice.public_key());
    ensure!(
        alice_secret == bob_secret,
        "shared secrets disagree: {alice_secret} != {bob_secret}"
    );
    let key = alice.cipher_key(bob.public_key())?;

    println!(
        "Diffie-Hellman parameters: q={}, a={}",
        params.modulus, params.generator
    );
    println!("Alice's public key {}", alice.public_key());
    println!("Bob's public key {}", bob.public_key());
    println!("Shared secret {alice_secret}={bob_secret}");
    println!("S-DES key (10-bit) {key} ({})", key.value());
    println!();

    let to_bob = fetch_message(alice_text);
    let to_alice = fetch_message(bob_text);

    let to_bob_bits = alice.encrypt_for(bob.public_key(), &to_bob)?;
    println!("Alice is sending to Bob: {to_bob}\nEncrypted: {to_bob_bits}");
    let received = bob.decrypt_from(alice.public_key(), &to_bob_bits)?;
    println!("Bob decrypted: {received}");
    ensure!(received == to_bob, "Bob recovered a different message");
    println!();

    let to_alice_bits = bob.encrypt_for(alice.public_key(), &to_alice)?;
    println!("Bob is sending to Alice: {to_alice}\nEncrypted: {to_alice_bits}");
    let received = alice.decrypt_from(bob.public_key(), &to_alice_bits)?;
    println!("Alice decrypted: {received}");
    ensure!(received == to_alice, "Alice recovered a different message");
    Ok(())
}

fn cmd_selftest(sessions: usize, bits: usize, tolerance: f64, seed: Option<&str>) -> Result<()> {
    ensure!(sessions > 0 && bits > 0, "--sessions and --bits must be positive");
    let mut rng = session_rng(seed, "selftest");
    let balance = bit_balance(sessions, bits, &mut *rng)?;
    let ratio = balance.ones_ratio();
    println!(
        "{} bits over {} sessions: zeros={} ones={} ratio={:.4}",
        balance.total(),
        sessions,
        balance.zeros,
        balance.ones,
        ratio
    );
    if (ratio - 0.5).abs() > tolerance {
        bail!("ones ratio {ratio:.4} is further than {tolerance} from 0.5");
    }
    println!("Bit balance within {tolerance} of 0.5");
    Ok(())
}

fn check_peer(session: &ChatSession, peer_public: u64) -> Result<()> {
    let modulus = session.params().modulus;
    ensure!(
        (1..modulus).contains(&peer_public),
        "peer public key {peer_public} must lie in [1, {modulus})"
    );
    Ok(())
}

fn resolve_plaintext(message: Option<String>, input: Option<PathBuf>) -> Result<String> {
    match (message, input) {
        (Some(text), None) => Ok(text),
        (None, Some(path)) => fs::read_to_string(&path)
            .map(|text| normalize_message(&text))
            .with_context(|| format!("reading plaintext from {}", path.display())),
        (Some(_), Some(_)) => bail!("Provide either --message or --input, not both."),
        (None, None) => bail!("Provide --message TEXT or --input FILE for data to encrypt."),
    }
}

/// Treats `arg` as a file path when it names a readable file, else as the
/// message itself.
fn fetch_message(arg: &str) -> String {
    let path = arg.replace('\\', "/");
    match fs::read_to_string(&path) {
        Ok(text) => {
            debug!("message read from {}", path);
            normalize_message(&text)
        }
        Err(_) => normalize_message(arg),
    }
}

/// Folds text onto a single line: trims it, drops carriage returns, turns
/// tabs and newlines into spaces and collapses whitespace runs.
fn normalize_message(text: &str) -> String {
    let flattened: String = text
        .trim()
        .chars()
        .filter(|&c| c != '\r')
        .map(|c| if c == '\t' || c == '\n' { ' ' } else { c })
        .collect();
    let mut out = String::with_capacity(flattened.len());
    let mut run = String::new();
    for c in flattened.chars() {
        if c.is_whitespace() {
            run.push(c);
            continue;
        }
        match run.chars().count() {
            0 => {}
            1 => out.push_str(&run),
            _ => out.push(' '),
        }
        run.clear();
        out.push(c);
    }
    out
}

fn load_session(path: &Path) -> Result<ChatSession> {
    let bundle: KeyBundle = load_json(path, "key bundle")?;
    ChatSession::from_bundle(&bundle).with_context(|| format!("validating {}", path.display()))
}

fn load_json<T: DeserializeOwned>(path: &Path, label: &str) -> Result<T> {
    let data =
        fs::read(path).with_context(|| format!("reading {} from {}", label, path.display()))?;
    let value = serde_json::from_slice(&data)
        .with_context(|| format!("parsing {} from {}", label, path.display()))?;
    Ok(value)
}

fn save_json<T: ?Sized + serde::Serialize>(path: &Path, label: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string_pretty(value)?;
    fs::write(path, serialized)
        .with_context(|| format!("writing {} to {}", label, path.display()))?;
    Ok(())
}
