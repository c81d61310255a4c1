//! Modules configured from TOML files on disk.

use normalize_convgen::plan::Plan;
use normalize_convgen::{
    Compiler, ConfigError, ConversionModule, ErrorKind, Request, Type, Universe,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn universe() -> Universe {
    Universe::builder()
        .scope("a", |s| {
            s.record("Profile", |r| {
                r.field("Nick", "string")
                    .field("Joined", "int64")
                    .field("Name", "string");
            })
            .record("Wrapper", |r| {
                r.field("Item", "a.Item");
            })
            .record("Item", |r| {
                r.field("OldName", "string").field("OldSize", "int32");
            });
        })
        .scope("b", |s| {
            s.record("Profile", |r| {
                r.field("Alias", "string")
                    .field("Joined", "string")
                    .field("Name", "string");
            })
            .record("Wrapper", |r| {
                r.field("Item", "b.Item");
            })
            .record("Item", |r| {
                r.field("Name", "string").field("Size", "int64");
            });
        })
        .build()
        .unwrap()
}

fn write_config(text: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shop.toml");
    std::fs::write(&path, text).unwrap();
    (dir, path)
}

fn strategies(plan: &Plan) -> Vec<(String, &'static str)> {
    let Plan::Record(record) = plan else {
        panic!("expected a record plan");
    };
    record
        .assignments
        .iter()
        .map(|a| (a.target.name().to_string(), a.plan.strategy()))
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

mod loading {
    use super::*;

    #[test]
    fn forced_pairs_and_imports() {
        let (_dir, path) = write_config(
            r#"match = [{ source = "Nick", target = "Alias" }]

[[import]]
name = "formatTime"
source = "int64"
target = "string"
"#,
        );
        let mut universe = universe();
        let module = ConversionModule::load("shop", &path, universe.source_map_mut())
            .unwrap()
            .request(Request::record(
                "ProfileToProfile",
                Type::named("a", "Profile"),
                Type::named("b", "Profile"),
            ));
        let output = Compiler::new(&universe).module(module).compile().unwrap();

        let conversion = &output.conversions[0];
        assert_eq!(conversion.module, "shop");
        assert_eq!(
            strategies(&conversion.plan),
            [
                ("Alias".to_string(), "identity"),
                ("Joined".to_string(), "func"),
                ("Name".to_string(), "identity"),
            ]
        );
    }

    #[test]
    fn record_overlay_reaches_subplans() {
        let (_dir, path) = write_config(
            r#"[record]
rename = { source = [{ rule = "trim-prefix", prefix = "Old" }] }
"#,
        );
        let mut universe = universe();
        let module = ConversionModule::load("shop", &path, universe.source_map_mut())
            .unwrap()
            .request(Request::record(
                "WrapperToWrapper",
                Type::named("a", "Wrapper"),
                Type::named("b", "Wrapper"),
            ));
        let output = Compiler::new(&universe).module(module).compile().unwrap();

        let item = output.subplan("convgen_shop_Item_Item").unwrap();
        assert_eq!(
            strategies(item.plan.as_ref().unwrap()),
            [("Name".to_string(), "identity"), ("Size".to_string(), "numeric")]
        );
    }

    #[test]
    fn ineffective_skip_points_at_the_file() {
        let (_dir, path) = write_config("skip = [{ source = \"Name\" }]\n");
        let mut universe = universe();
        let module = ConversionModule::load("shop", &path, universe.source_map_mut())
            .unwrap()
            .request(Request::record(
                "ProfileToProfile",
                Type::named("a", "Profile"),
                Type::named("b", "Profile"),
            ));
        let errs = Compiler::new(&universe).module(module).compile().unwrap_err();
        assert!(errs.kinds().contains(&ErrorKind::IneffectiveSkip));

        let rendered = errs.render(universe.source_map());
        assert!(rendered.contains("ineffective skip at "));
        assert!(rendered.contains("shop.toml:1:"));
    }
}

// ============================================================================
// Errors
// ============================================================================

mod errors {
    use super::*;

    #[test]
    fn unreadable_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut universe = universe();
        let nope = dir.path().join("nope.toml");
        let missing = ConversionModule::load("shop", &nope, universe.source_map_mut());
        assert!(matches!(missing, Err(ConfigError::Io { .. })));

        let (_dir, path) = write_config("[discover]\ngetters = 3\n");
        let malformed = ConversionModule::load("shop", &path, universe.source_map_mut());
        assert!(matches!(malformed, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn invalid_directives_surface_at_compile_time() {
        let (_dir, path) = write_config("skip = [{}]\n");
        let mut universe = universe();
        let module = ConversionModule::load("shop", &path, universe.source_map_mut())
            .unwrap()
            .request(Request::record(
                "ProfileToProfile",
                Type::named("a", "Profile"),
                Type::named("b", "Profile"),
            ));
        let errs = Compiler::new(&universe).module(module).compile().unwrap_err();
        assert_eq!(errs.kinds(), [ErrorKind::Config]);
        let rendered = errs.render(universe.source_map());
        assert!(rendered.ends_with("skip needs at least one side"));
        assert!(rendered.contains("shop.toml:1:"));
    }
}
