mod test_utils;

use ipaas_dashboard::config::{IntegrationAppConfig, ParagonConfig};
use ipaas_dashboard::token_issuer::{ParagonClaims, TokenIssuer};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use test_utils::{PARAGON_PRIVATE_KEY, PARAGON_PUBLIC_KEY};
use uuid::Uuid;

fn paragon_config(signing_key: &str) -> ParagonConfig {
    ParagonConfig {
        project_id: Some("proj-123".to_string()),
        signing_key: Some(signing_key.to_string()),
        ..Default::default()
    }
}

fn decode_paragon(token: &str) -> ParagonClaims {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["useparagon.com/proj-123"]);
    let key = DecodingKey::from_rsa_pem(PARAGON_PUBLIC_KEY.as_bytes()).unwrap();
    decode::<ParagonClaims>(token, &key, &validation)
        .unwrap()
        .claims
}

#[test]
fn paragon_token_is_rs256_and_verifies_with_public_key() {
    let issuer = TokenIssuer::new(
        paragon_config(PARAGON_PRIVATE_KEY),
        IntegrationAppConfig::default(),
    );
    let user = Uuid::new_v4();

    let token = issuer.sign_paragon_token(user).unwrap();

    assert_eq!(decode_header(&token).unwrap().alg, Algorithm::RS256);
    let claims = decode_paragon(&token);
    assert_eq!(claims.sub, format!("{}/Meta", user));
    assert_eq!(claims.aud, "useparagon.com/proj-123");
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn paragon_key_with_escaped_newlines_is_accepted() {
    let escaped = PARAGON_PRIVATE_KEY.trim_end().replace('\n', "\\n");
    let issuer = TokenIssuer::new(paragon_config(&escaped), IntegrationAppConfig::default());

    let token = issuer.sign_paragon_token(Uuid::new_v4()).unwrap();
    decode_paragon(&token);
}

#[test]
fn paragon_custom_ttl_is_honored() {
    let mut config = paragon_config(PARAGON_PRIVATE_KEY);
    config.token_ttl_seconds = 600;
    let issuer = TokenIssuer::new(config, IntegrationAppConfig::default());

    let claims = decode_paragon(&issuer.sign_paragon_token(Uuid::new_v4()).unwrap());
    assert_eq!(claims.exp - claims.iat, 600);
}
