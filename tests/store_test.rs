use std::{fs, path::PathBuf, sync::Arc, thread};

use chrono::{TimeZone, Utc};
use termify::{
    management::{
        CredentialStore, ENV_ACCESS_TOKEN, ENV_TOKEN_EXPIRY, SqliteStore, mirror_tokens,
    },
    types::{Credentials, Grant, TokenSet},
    utils::generate_state,
};

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("termify-test-{}", generate_state()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn full_row() -> Credentials {
    Credentials {
        client_id: "client-id".into(),
        client_secret: "client-secret".into(),
        access_token: Some("T1".into()),
        refresh_token: Some("R1".into()),
        expiry: Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()),
        grant: Some(Grant::User),
    }
}

#[test]
fn save_then_load_returns_every_field() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.save(&full_row()).unwrap();
    assert_eq!(store.load().unwrap(), Some(full_row()));
}

#[test]
fn absent_token_fields_stay_absent() {
    let store = SqliteStore::open_in_memory().unwrap();
    let row = Credentials::new("client-id", "client-secret");
    store.save(&row).unwrap();
    assert_eq!(store.load().unwrap(), Some(row));
}

#[test]
fn later_save_replaces_the_row() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.save(&full_row()).unwrap();

    let tokens = TokenSet {
        access_token: "A2".into(),
        refresh_token: None,
        expires_in: 3600,
        obtained_at: Utc.with_ymd_and_hms(2030, 6, 1, 0, 0, 0).unwrap(),
        grant: Grant::App,
    };
    store
        .save_tokens(&Credentials::new("client-id", "client-secret"), &tokens)
        .unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.access_token.as_deref(), Some("A2"));
    assert_eq!(loaded.refresh_token, None);
    assert_eq!(loaded.grant, Some(Grant::App));
    assert_eq!(
        loaded.expiry,
        Some(Utc.with_ymd_and_hms(2030, 6, 1, 1, 0, 0).unwrap())
    );
}

#[test]
fn file_store_survives_reopen() {
    let dir = scratch_dir();
    let path = dir.join("nested").join("termify.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        store.save(&full_row()).unwrap();
    }

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.load().unwrap(), Some(full_row()));

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn env_mirror_rewrites_only_token_keys() {
    let dir = scratch_dir();
    let env = dir.join(".env");
    fs::write(
        &env,
        "SPOTIFY_API_AUTH_CLIENT_ID=abc\nSPOTIFY_ACCESS_TOKEN=old\n# comment\n",
    )
    .unwrap();

    let store = SqliteStore::open_in_memory().unwrap().with_env_mirror(&env);
    store.save(&full_row()).unwrap();

    let content = fs::read_to_string(&env).unwrap();
    assert!(content.contains("SPOTIFY_API_AUTH_CLIENT_ID=abc"));
    assert!(content.contains("# comment"));
    assert!(content.contains(&format!("{ENV_ACCESS_TOKEN}=T1")));
    assert!(!content.contains("=old"));
    assert_eq!(content.matches(ENV_ACCESS_TOKEN).count(), 1);

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn mirror_drops_keys_for_cleared_tokens() {
    let dir = scratch_dir();
    let env = dir.join(".env");

    mirror_tokens(&env, &full_row()).unwrap();
    assert!(fs::read_to_string(&env).unwrap().contains(ENV_TOKEN_EXPIRY));

    mirror_tokens(&env, &full_row().without_tokens()).unwrap();
    let content = fs::read_to_string(&env).unwrap();
    assert!(!content.contains(ENV_ACCESS_TOKEN));
    assert!(!content.contains(ENV_TOKEN_EXPIRY));

    fs::remove_dir_all(dir).unwrap();
}

#[test]
fn clear_tokens_keeps_client_pair() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.save(&full_row()).unwrap();

    store.clear_tokens().unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, Credentials::new("client-id", "client-secret"));
    assert!(!loaded.has_token());
}

#[test]
fn concurrent_saves_leave_mirror_matching_the_row() {
    let dir = scratch_dir();
    let env = dir.join(".env");
    let store = Arc::new(SqliteStore::open_in_memory().unwrap().with_env_mirror(&env));

    let writers: Vec<_> = (0..8)
        .map(|n| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for round in 0..10 {
                    let mut row = full_row();
                    row.access_token = Some(format!("T{n}-{round}"));
                    store.save(&row).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }

    let stored = store.load().unwrap().unwrap();
    let content = fs::read_to_string(&env).unwrap();
    let mirrored = content
        .lines()
        .find_map(|line| line.strip_prefix(&format!("{ENV_ACCESS_TOKEN}=")))
        .map(str::to_string);
    assert_eq!(mirrored, stored.access_token);

    fs::remove_dir_all(dir).unwrap();
}
