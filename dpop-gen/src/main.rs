use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use clap::{Parser, Subcommand};
use p256::ecdsa::{Signature, SigningKey, signature::Signer};
use p256::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

type Result<T> = std::result::Result<T, Box<dyn Error>>;

/// Development helper for the fare API's DPoP flow.
///
/// - `keygen`: P-256 key pair (PKCS#8 private / SPKI public PEM). Use it for the
///   server's token-signing keys or for a client proof key.
/// - `proof`: an ES256 DPoP proof for one request, plus the key thumbprint
///   (`jkt`) an access token issued for it will carry in `cnf.jkt`.
#[derive(Parser, Debug)]
#[command(name = "dpop-gen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write private.pem and public.pem into a directory
    Keygen {
        #[arg(long, value_name = "DIR", default_value = "keys")]
        out: PathBuf,

        /// Overwrite existing files
        #[arg(long, default_value_t = false)]
        force: bool,
    },

    /// Sign a DPoP proof
    Proof {
        /// HTTP method (htm), e.g. GET/POST
        #[arg(long, default_value = "GET")]
        method: String,

        /// Full request URL used as htu, without query
        /// (e.g. http://localhost:3000/api/v1/auth/profile)
        #[arg(long)]
        url: String,

        /// Client P-256 private key in PEM (PKCS#8)
        #[arg(long, value_name = "FILE")]
        key: PathBuf,

        /// Override iat (unix seconds). Default: now.
        #[arg(long)]
        iat: Option<i64>,

        /// Seconds from iat until exp.
        #[arg(long, default_value_t = 60)]
        exp_in: i64,

        /// Override jti. Default: random UUID v4.
        #[arg(long)]
        jti: Option<String>,

        /// Print only the proof
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

fn b64url(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn now_unix() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

/// `{kty, crv, x, y}` of the public half.
fn public_jwk(signing_key: &SigningKey) -> Result<(String, String)> {
    let point = signing_key.verifying_key().to_encoded_point(false);
    let (Some(x), Some(y)) = (point.x(), point.y()) else {
        return Err("public key has no affine coordinates".into());
    };
    Ok((b64url(x), b64url(y)))
}

/// RFC 7638: required members in lexicographic order, no whitespace.
fn thumbprint(x: &str, y: &str) -> String {
    let canonical = format!(r#"{{"crv":"P-256","kty":"EC","x":"{x}","y":"{y}"}}"#);
    b64url(Sha256::digest(canonical.as_bytes()))
}

fn keygen(out: &Path, force: bool) -> Result<()> {
    let private_path = out.join("private.pem");
    let public_path = out.join("public.pem");
    if !force && (private_path.exists() || public_path.exists()) {
        return Err(format!("{} already has keys (use --force)", out.display()).into());
    }

    let signing_key = SigningKey::random(&mut OsRng);
    let private_pem = signing_key.to_pkcs8_pem(LineEnding::LF)?;
    let public_pem = signing_key
        .verifying_key()
        .to_public_key_pem(LineEnding::LF)?;

    fs::create_dir_all(out)?;
    fs::write(&private_path, private_pem.as_bytes())?;
    fs::write(&public_path, public_pem.as_bytes())?;

    let (x, y) = public_jwk(&signing_key)?;
    println!("private: {}", private_path.display());
    println!("public:  {}", public_path.display());
    println!("jkt:     {}", thumbprint(&x, &y));
    Ok(())
}

struct ProofArgs {
    method: String,
    url: String,
    iat: i64,
    exp: i64,
    jti: String,
}

fn sign_proof(signing_key: &SigningKey, args: &ProofArgs) -> Result<String> {
    let (x, y) = public_jwk(signing_key)?;

    let header = serde_json::json!({
        "typ": "dpop+jwt",
        "alg": "ES256",
        "jwk": { "kty": "EC", "crv": "P-256", "x": x, "y": y },
    });
    let claims = serde_json::json!({
        "htm": args.method.to_uppercase(),
        "htu": args.url,
        "jti": args.jti,
        "iat": args.iat,
        "exp": args.exp,
    });

    let signing_input = format!(
        "{}.{}",
        b64url(serde_json::to_vec(&header)?),
        b64url(serde_json::to_vec(&claims)?)
    );
    // raw r || s, 64 bytes
    let signature: Signature = signing_key.sign(signing_input.as_bytes());

    Ok(format!("{}.{}", signing_input, b64url(signature.to_bytes())))
}

fn main() -> Result<()> {
    match Cli::parse().command {
        Command::Keygen { out, force } => keygen(&out, force),
        Command::Proof {
            method,
            url,
            key,
            iat,
            exp_in,
            jti,
            quiet,
        } => {
            let pem = fs::read_to_string(&key)?;
            let signing_key = SigningKey::from_pkcs8_pem(&pem)?;

            let iat = match iat {
                Some(iat) => iat,
                None => now_unix()?,
            };
            let args = ProofArgs {
                method,
                url,
                iat,
                exp: iat + exp_in,
                jti: jti.unwrap_or_else(|| Uuid::new_v4().to_string()),
            };
            let proof = sign_proof(&signing_key, &args)?;

            if quiet {
                println!("{}", proof);
                return Ok(());
            }

            let (x, y) = public_jwk(&signing_key)?;
            println!("DPoP: {}", proof);
            println!("jkt (cnf.jkt): {}", thumbprint(&x, &y));
            println!("iat: {}", args.iat);
            println!("exp: {}", args.exp);
            println!("jti: {}", args.jti);
            Ok(())
        }
    }
}
