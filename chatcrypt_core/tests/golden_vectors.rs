use chatcrypt_core::bbs::BlumBlumShub;
use chatcrypt_core::dh::{DhParams, KeyPair, public_key};
use chatcrypt_core::primes::{prime_table, primitive_root};
use chatcrypt_core::sdes::{CipherKey, Sdes};
use chatcrypt_core::session::ChatSession;
use serde_json::{Value, json};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Each vector is rendered to JSON and compared with `tests/vectors/<name>.json`.
const VECTORS: &[(&str, fn() -> Value)] = &[
    ("prime_field", vector_prime_field),
    ("bbs_streams", vector_bbs_streams),
    ("sdes_reference", vector_sdes_reference),
    ("exchange_flow", vector_exchange_flow),
];

const UPDATE_ENV: &str = "CHATCRYPT_UPDATE_VECTORS";

fn vector_path(name: &str) -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "tests", "vectors"]
        .iter()
        .collect::<PathBuf>()
        .join(name)
        .with_extension("json")
}

#[test]
fn stored_vectors_still_hold() {
    let rewrite = env::var(UPDATE_ENV).as_deref() == Ok("1");
    for &(name, render) in VECTORS {
        let rendered = render();
        let path = vector_path(name);
        if rewrite {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, serde_json::to_string_pretty(&rendered).unwrap()).unwrap();
        }
        let stored = fs::read_to_string(&path).unwrap_or_else(|err| {
            panic!(
                "cannot read {} ({err}); set {UPDATE_ENV}=1 and rerun to write it",
                path.display()
            )
        });
        let stored: Value = serde_json::from_str(&stored).unwrap();
        assert_eq!(
            stored, rendered,
            "vector {name} changed; rerun with {UPDATE_ENV}=1 only if the change is intended"
        );
    }
}

fn vector_prime_field() -> Value {
    let table = prime_table();
    let roots: Vec<_> = [2u64, 3, 7, 9, 8, 2053, 65521]
        .into_iter()
        .map(|modulus| json!({ "modulus": modulus, "root": primitive_root(modulus) }))
        .collect();
    json!({
        "description": "Sieve table and primitive roots",
        "table_len": table.len(),
        "table_last": table.primes().last(),
        "next_prime_past_table": table.next_prime(131071).unwrap(),
        "primitive_roots": roots,
    })
}

fn vector_bbs_streams() -> Value {
    let streams: Vec<_> = [1u64, 2, 1234, 4321, 32773, 65535]
        .into_iter()
        .map(|seed| {
            let mut generator = BlumBlumShub::from_seed(seed).expect("seed in range");
            let (p, q, modulus) = (generator.p(), generator.q(), generator.modulus());
            let bits = generator.next_bit_string(16);
            let key = u64::from_str_radix(&bits[..10], 2).unwrap();
            json!({
                "seed": seed,
                "p": p,
                "q": q,
                "modulus": modulus,
                "key": key,
                "bits": bits,
            })
        })
        .collect();
    json!({
        "description": "Blum Blum Shub moduli and leading bits per seed",
        "streams": streams,
    })
}

fn vector_sdes_reference() -> Value {
    let key = CipherKey::new(0b1010000010).unwrap();
    let cipher = Sdes::new(key);
    let subkeys = cipher.subkeys();
    let blocks: Vec<_> = [0u8, 1, 65, 128, 151, 255]
        .into_iter()
        .map(|plain| json!({ "plain": plain, "cipher": cipher.encrypt_byte(plain) }))
        .collect();
    let text = "Hello, chat!";
    json!({
        "description": "S-DES under key 1010000010",
        "key": key.to_string(),
        "subkeys": [subkeys.first, subkeys.second],
        "blocks": blocks,
        "text": text,
        "ciphertext": cipher.encrypt(text).unwrap(),
    })
}

fn vector_exchange_flow() -> Value {
    let params = DhParams::for_modulus(65521).unwrap();
    let alice = fixed_session(params, 2053);
    let bob = fixed_session(params, 4099);
    let shared = alice.shared_secret(bob.public_key());
    assert_eq!(shared, bob.shared_secret(alice.public_key()));
    json!({
        "description": "Fixed-key exchange over modulus 65521",
        "modulus": params.modulus,
        "generator": params.generator,
        "alice_public": alice.public_key(),
        "bob_public": bob.public_key(),
        "shared_secret": shared,
        "cipher_key": alice.cipher_key(bob.public_key()).unwrap().value(),
        "alice_to_bob": alice.encrypt_for(bob.public_key(), "hello bob").unwrap(),
        "bob_to_alice": bob.encrypt_for(alice.public_key(), "hi alice").unwrap(),
    })
}

fn fixed_session(params: DhParams, private: u64) -> ChatSession {
    let keys = KeyPair {
        private,
        public: public_key(private, &params),
    };
    ChatSession::from_keys(params, keys).expect("consistent key pair")
}
