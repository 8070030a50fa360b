use super::*;

#[test]
fn explicit_session_file_wins() {
    let path = session_path(Some(PathBuf::from("/tmp/s")), Some(PathBuf::from("/home/u"))).unwrap();
    assert_eq!(path, PathBuf::from("/tmp/s"));
}

#[test]
fn session_file_defaults_under_home() {
    let path = session_path(None, Some(PathBuf::from("/home/u"))).unwrap();
    assert_eq!(path, PathBuf::from("/home/u/.customer-portal/session"));
}

#[test]
fn session_file_without_home_is_an_error() {
    assert!(matches!(session_path(None, None), Err(CliError::NoSessionPath)));
    assert!(matches!(session_path(None, Some(PathBuf::new())), Err(CliError::NoSessionPath)));
}

#[test]
fn parses_customer_update() {
    let cli = Cli::try_parse_from([
        "portal-cli",
        "--data-url",
        "http://data.test",
        "customers",
        "update",
        "7",
        "--name",
        "Ada",
        "--email",
        "ada@example.com",
    ])
    .unwrap();

    assert_eq!(cli.data_url.as_deref(), Some("http://data.test"));
    match cli.command {
        Command::Customers(CustomersCommand {
            command: CustomersSubcommand::Update { id, name, email },
        }) => {
            assert_eq!(id, 7);
            assert_eq!(name, "Ada");
            assert_eq!(email, "ada@example.com");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn customer_commands_are_gated_when_signed_out() {
    let config = ServiceConfig::default();
    let portal = Portal::new(&config, SessionStore::new()).unwrap();

    let err = require_access(&portal, Route::Customers).unwrap_err();

    assert!(matches!(err, CliError::AccessDenied { path: "/customers", to: "/login" }));
}

#[test]
fn public_routes_are_not_gated() {
    let portal = Portal::new(&ServiceConfig::default(), SessionStore::new()).unwrap();
    assert!(require_access(&portal, Route::Register).is_ok());
}
