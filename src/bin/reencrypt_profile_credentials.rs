//! Seals profile credentials that were stored as plaintext before
//! encryption at rest was enabled.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use ipaas_dashboard::{config::ConfigLoader, crypto::CryptoKey, db, repositories::ProfileRepository};
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(about = "Re-encrypt legacy plaintext provider credentials on profiles")]
struct Args {
    /// Report affected profiles without writing anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;

    let key_bytes = config
        .crypto_key
        .clone()
        .ok_or_else(|| anyhow!("crypto key not present in configuration"))?;
    let crypto_key = CryptoKey::new(key_bytes).context("initializing crypto key")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    let profiles = ProfileRepository::new(Arc::new(db), crypto_key);

    let mut profile_count = 0usize;
    let mut field_count = 0usize;

    for profile in profiles.list_all().await.context("listing profiles")? {
        let legacy = ProfileRepository::legacy_fields(&profile);
        if legacy.is_empty() {
            continue;
        }

        let user_id = profile.user_id;
        let names: Vec<&str> = legacy.iter().map(|field| field.as_str()).collect();

        if args.dry_run {
            println!("{}: {}", user_id, names.join(", "));
            field_count += legacy.len();
        } else {
            field_count += profiles
                .reencrypt_legacy(profile)
                .await
                .with_context(|| format!("re-encrypting profile {}", user_id))?;
        }
        profile_count += 1;
    }

    if args.dry_run {
        println!(
            "{} profile(s) hold {} plaintext credential(s); nothing written.",
            profile_count, field_count
        );
    } else {
        println!(
            "Re-encrypted {} credential(s) across {} profile(s).",
            field_count, profile_count
        );
    }

    Ok(())
}
