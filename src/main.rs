use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
mod auth;
use hashcrypt::config::{Settings, default_config_path};
use hashcrypt::encoding::from_hex;
use hashcrypt::storage::OutputFile;
use hashcrypt::{Cipher, Encoding, HashId, HashWidth, KeySize};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use tracing::{debug, warn};
use zeroize::Zeroizing;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    Hex,
    Base64,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Hex => Encoding::Hex,
            EncodingArg::Base64 => Encoding::Base64,
        }
    }
}

fn parse_key_size(s: &str) -> Result<KeySize, String> {
    let bits: u16 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    KeySize::try_from(bits).map_err(|e| e.to_string())
}

fn parse_hash_width(s: &str) -> Result<HashWidth, String> {
    let bits: u16 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    HashWidth::try_from(bits).map_err(|e| e.to_string())
}

#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// Use this text (UTF-8) as input
    #[arg(long)]
    text: Option<String>,

    /// Read input from this file
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

impl InputArgs {
    fn read(&self) -> Result<Vec<u8>> {
        read_input(self.text.as_deref(), self.input.as_ref())
    }
}

#[derive(Debug, clap::Args)]
#[group(required = false, multiple = false)]
struct OptionalInputArgs {
    /// Use this text (UTF-8) as input
    #[arg(long)]
    text: Option<String>,

    /// Read input from this file
    #[arg(long, value_name = "PATH")]
    input: Option<PathBuf>,
}

fn read_input(text: Option<&str>, path: Option<&PathBuf>) -> Result<Vec<u8>> {
    match (text, path) {
        (Some(text), _) => Ok(text.as_bytes().to_vec()),
        (None, Some(path)) => {
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))
        }
        (None, None) => anyhow::bail!("no input given; use --text or --input"),
    }
}

fn digest_input(text: Option<&str>, path: Option<&PathBuf>, width: HashWidth) -> Result<Vec<u8>> {
    match (text, path) {
        (None, Some(path)) => {
            let file =
                File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
            Ok(width.digest_reader(file)?)
        }
        _ => Ok(width.digest(read_input(text, path)?)),
    }
}

#[derive(Debug, Parser)]
#[command(name = "hashcrypt")]
#[command(
    version,
    about = "SHA-2 digests, AES-CBC encryption with derived keys, and 256-bit hash IDs."
)]
struct Cli {
    /// Path to the JSON settings file
    #[arg(long, global = true, value_name = "PATH", env = "HASHCRYPT_CONFIG")]
    config: Option<PathBuf>,

    /// Log filter such as `debug` (HASHCRYPT_LOG takes precedence)
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Computes a SHA-2 digest, optionally salted
    Hash {
        /// Digest width: 256, 384 or 512
        #[arg(long, value_parser = parse_hash_width)]
        bits: Option<HashWidth>,

        /// Salt as hex bytes
        #[arg(long, value_name = "HEX", conflicts_with = "salt_text")]
        salt: Option<String>,

        /// Salt as UTF-8 text
        #[arg(long, value_name = "TEXT")]
        salt_text: Option<String>,

        /// Output encoding
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Encrypts data with a key derived from the secret
    Encrypt {
        /// AES key size: 128, 192 or 256
        #[arg(long, value_parser = parse_key_size)]
        key_size: Option<KeySize>,

        /// Write raw ciphertext to this file instead of printing it encoded
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Encoding of printed ciphertext
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Decrypts data produced by `encrypt`
    ///
    /// `--text` takes encoded ciphertext, `--input` a file of raw ciphertext.
    Decrypt {
        /// AES key size: 128, 192 or 256
        #[arg(long, value_parser = parse_key_size)]
        key_size: Option<KeySize>,

        /// Write plaintext to this file instead of stdout
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Encoding of `--text` ciphertext
        #[arg(long, value_enum)]
        encoding: Option<EncodingArg>,

        #[command(flatten)]
        input: InputArgs,
    },

    /// Creates and inspects 256-bit hash IDs
    #[command(subcommand)]
    Id(IdCommands),

    /// Shows the settings file path and effective settings
    Config,
}

#[derive(Debug, Subcommand)]
enum IdCommands {
    /// Hash ID of the given data, or a random one when no data is given
    New {
        #[command(flatten)]
        input: OptionalInputArgs,
    },

    /// Prints the hex, compact and GUID forms of a hash ID
    #[command(arg_required_else_help = true)]
    Inspect { hex: String },
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_env("HASHCRYPT_LOG").unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    let config_path = args.config.clone().or_else(|| default_config_path().ok());
    let settings = Settings::load_or_default(config_path.as_deref())?;
    init_logging(
        args.log_level.as_deref().unwrap_or(&settings.log_level),
        args.log_format,
    );
    if config_path.is_none() {
        warn!("could not determine the config location; using default settings");
    }
    debug!(config = ?config_path, "settings loaded");

    match args.command {
        Commands::Hash {
            bits,
            salt,
            salt_text,
            encoding,
            input,
        } => {
            let width = bits.unwrap_or(settings.hash_bits);
            let salt = match (salt, salt_text) {
                (Some(hex), _) => Some(from_hex(hex.trim())?),
                (None, Some(text)) => Some(text.into_bytes()),
                (None, None) => None,
            };
            let digest = match salt {
                Some(salt) => width.salted_digest(input.read()?, salt),
                None => digest_input(input.text.as_deref(), input.input.as_ref(), width)?,
            };
            let encoding = encoding.map_or(settings.encoding, Encoding::from);
            println!("{}", encoding.encode(&digest));
        }
        Commands::Encrypt {
            key_size,
            output,
            encoding,
            input,
        } => {
            let cipher = Cipher::new(key_size.unwrap_or(settings.key_size));
            let plaintext = Zeroizing::new(input.read()?);
            let secret = auth::read_secret(true)?;
            let ciphertext = cipher.encrypt(&*plaintext, secret.as_bytes())?;
            drop(secret);

            match output {
                Some(path) => {
                    OutputFile::new(&path).write(&ciphertext)?;
                    println!(
                        "wrote {} bytes of ciphertext to {}",
                        ciphertext.len(),
                        path.display()
                    );
                }
                None => {
                    let encoding = encoding.map_or(settings.encoding, Encoding::from);
                    println!("{}", encoding.encode(&ciphertext));
                }
            }
        }
        Commands::Decrypt {
            key_size,
            output,
            encoding,
            input,
        } => {
            let cipher = Cipher::new(key_size.unwrap_or(settings.key_size));
            let ciphertext = match &input.text {
                Some(text) => encoding.map_or(settings.encoding, Encoding::from).decode(text)?,
                None => input.read()?,
            };
            let secret = auth::read_secret(false)?;
            let plaintext = Zeroizing::new(
                cipher
                    .decrypt(&ciphertext, secret.as_bytes())
                    .context("unable to decrypt; wrong secret, key size or corrupted data")?,
            );
            drop(secret);

            match output {
                Some(path) => {
                    OutputFile::new(&path).write(&plaintext)?;
                    println!("wrote {} bytes of plaintext to {}", plaintext.len(), path.display());
                }
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&plaintext)?;
                    stdout.flush()?;
                }
            }
        }
        Commands::Id(IdCommands::New { input }) => {
            let id = match (input.text.as_deref(), input.input.as_ref()) {
                (None, None) => HashId::random()?,
                (text, path) => HashId::from_bytes(&digest_input(text, path, HashWidth::Sha256)?)?,
            };
            println!("{id}");
        }
        Commands::Id(IdCommands::Inspect { hex }) => {
            let id: HashId = hex.trim().parse()?;
            println!("hex:     {id}");
            println!("compact: {}", hashcrypt::encoding::to_hex(&id.to_compact()));
            println!("guid:    {}", id.to_guid_string());
        }
        Commands::Config => {
            match &config_path {
                Some(path) => println!("{}", path.display()),
                None => println!("(no config location)"),
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
