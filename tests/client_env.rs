use serial_test::serial;
use std::env;

use wiki_mirror::fetch::ConfluenceFetcher;

#[test]
#[serial]
fn fetcher_from_env_requires_base_url_and_token() {
    env::remove_var("CONFLUENCE_BASE_URL");
    env::remove_var("CONFLUENCE_API_TOKEN");

    assert!(ConfluenceFetcher::new_from_env().is_err());
}

#[test]
#[serial]
fn fetcher_from_env_constructs_with_credentials() {
    env::set_var("CONFLUENCE_BASE_URL", "https://wiki.example.com/");
    env::set_var("CONFLUENCE_API_TOKEN", "token-123");

    assert!(ConfluenceFetcher::new_from_env().is_ok());

    env::remove_var("CONFLUENCE_BASE_URL");
    env::remove_var("CONFLUENCE_API_TOKEN");
}
