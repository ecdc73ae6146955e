use breccia_core::config::{init_settings, settings, ConfigError, ExportedSettings, Settings};
use breccia_core::db::open_db_in_memory;
use breccia_core::web::{Mapper, Request, Response};

fn lookup(key: &str) -> Option<String> {
    match key {
        "SECRET_KEY" => Some("not-a-secret".to_string()),
        "GOOGLE_MAPS_API_KEY" => Some("maps-key".to_string()),
        _ => None,
    }
}

// One test per binary: the settings cell is process-wide.
#[test]
fn published_settings_reach_rendered_pages() {
    let conn = open_db_in_memory().unwrap();
    let before = Mapper::configured(&conn)
        .handle(&Request::get("/activities"))
        .unwrap();
    match before {
        Response::Render(page) => assert_eq!(page.settings, ExportedSettings::default()),
        other => panic!("expected a page, got {other:?}"),
    }

    init_settings(Settings::from_lookup(lookup).unwrap()).unwrap();
    let again = init_settings(Settings::from_lookup(lookup).unwrap());
    assert!(matches!(again, Err(ConfigError::AlreadyInitialized)));
    assert_eq!(
        settings().and_then(|active| active.google_maps_api_key.as_deref()),
        Some("maps-key")
    );

    let after = Mapper::configured(&conn)
        .handle(&Request::get("/activities"))
        .unwrap();
    match after {
        Response::Render(page) => {
            assert!(!page.settings.debug);
            assert_eq!(page.settings.google_maps_api_key.as_deref(), Some("maps-key"));
        }
        other => panic!("expected a page, got {other:?}"),
    }
}
