#![cfg(test)]

use std::sync::Arc;

use thunklink::{PointerWidth, RegionError};
use winthunk_abi::{D3D11, USER32};

use super::*;
use crate::{
    config::{ConfigError, HostConfig, TransportKind},
    runtime::HostRuntime,
    synthetic::{SyntheticDisplay, SyntheticQueries},
};

// === Configuration === //

#[test]
fn empty_config_uses_defaults() {
    let config = HostConfig::from_toml("").unwrap();

    assert_eq!(config, HostConfig::default());
    assert_eq!(config.transport.kind, TransportKind::Worker);
    assert_eq!(config.transport.max_callback_depth, 16);
    assert_eq!(config.diagnostics.log_filter, "info");
    assert!(!config.diagnostics.unverified_warnings);

    let region = config.region().unwrap();
    assert_eq!(region.base(), 0);
    assert_eq!(region.width(), PointerWidth::Bits64);
}

#[test]
fn full_config_parses() {
    let config = HostConfig::from_toml(
        r#"
        [region]
        base = 0x1000_0000
        size = 0x1_0000_0000
        guest_pointer_width = "bits32"

        [diagnostics]
        unverified_warnings = true
        log_filter = "thunklink=trace"

        [transport]
        kind = "direct"
        max_callback_depth = 4
        "#,
    )
    .unwrap();

    assert_eq!(config.transport.kind, TransportKind::Direct);
    assert_eq!(config.transport.max_callback_depth, 4);
    assert!(config.diagnostics.unverified_warnings);
    assert_eq!(config.diagnostics.log_filter, "thunklink=trace");

    let region = config.region().unwrap();
    assert_eq!(region.base(), 0x1000_0000);
    assert_eq!(region.size(), 0x1_0000_0000);
    assert_eq!(region.width(), PointerWidth::Bits32);
}

#[test]
fn narrow_region_defaults_to_four_gib() {
    let config = HostConfig::from_toml(
        r#"
        [region]
        guest_pointer_width = "bits32"
        "#,
    )
    .unwrap();

    assert_eq!(config.region().unwrap().size(), 1 << 32);
}

#[test]
fn invalid_regions_are_rejected() {
    let cases = [
        ("[region]\nsize = 0", RegionError::Empty),
        (
            "[region]\nsize = 0x1_0000_0001\nguest_pointer_width = \"bits32\"",
            RegionError::TooLarge {
                size: 0x1_0000_0001,
                bits: 32,
            },
        ),
    ];

    for (text, expected) in cases {
        match HostConfig::from_toml(text) {
            Err(ConfigError::Region(err)) => assert_eq!(err, expected),
            other => panic!("expected a region error for {text:?}, got {other:?}"),
        }
    }
}

#[test]
fn overflowing_region_is_rejected() {
    let mut config = HostConfig::default();
    config.region.base = u64::MAX - 0xfff;
    config.region.size = Some(0x2000);

    match config.validate() {
        Err(ConfigError::Region(RegionError::Overflow { base, size })) => {
            assert_eq!((base, size), (u64::MAX - 0xfff, 0x2000));
        }
        other => panic!("expected an overflow, got {other:?}"),
    }
}

#[test]
fn zero_callback_depth_is_rejected() {
    let res = HostConfig::from_toml("[transport]\nmax_callback_depth = 0");
    assert!(matches!(res, Err(ConfigError::CallbackDepth)));
}

#[test]
fn unknown_keys_are_rejected() {
    let res = HostConfig::from_toml("[transport]\nretries = 3");
    assert!(matches!(res, Err(ConfigError::Parse(_))));
}

#[test]
fn missing_config_file_names_the_path() {
    let err = HostConfig::load("/nonexistent/winthunk.toml").unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/winthunk.toml"));
}

// === Runtime === //

#[test]
fn runtime_binds_only_registered_areas() {
    let runtime = HostRuntime::builder(HostConfig::default())
        .display(Arc::new(SyntheticDisplay::default()))
        .build()
        .unwrap();

    assert_eq!(runtime.dispatcher().ids(USER32).count(), 10);
    assert_eq!(runtime.dispatcher().ids(D3D11).count(), 0);

    let names = runtime
        .dispatcher()
        .ids(USER32)
        .filter_map(|id| runtime.dispatcher().name_of(id))
        .collect::<Vec<_>>();

    assert!(names.contains(&"EnumDisplayMonitors"));
    assert!(names.contains(&"MonitorFromPoint"));
    assert!(!names.contains(&"SetLastErrorEx"));
}

#[test]
fn query_areas_register_independently() {
    let queries = Arc::new(SyntheticQueries::default());

    let runtime = HostRuntime::builder(HostConfig::default())
        .d3d10_queries(queries)
        .build()
        .unwrap();

    assert_eq!(runtime.dispatcher().ids(D3D11).count(), 12);
}

#[test]
fn runtime_refuses_invalid_config() {
    let mut config = HostConfig::default();
    config.transport.max_callback_depth = 0;

    assert!(HostRuntime::builder(config).build().is_err());
}

// === Logging === //

#[test]
fn logging_init_is_idempotent() {
    let config = HostConfig::default();

    logging::init(&config.diagnostics);
    assert!(!logging::init(&config.diagnostics));
}
