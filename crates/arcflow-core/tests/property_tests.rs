//! Property-based tests for filtering, size scaling and archive
//! round-trips.

#![allow(clippy::unwrap_used)]

use std::path::Path;

use arcflow_core::Event;
use arcflow_core::Extractor;
use arcflow_core::Output;
use arcflow_core::filter::EntryFilter;
use arcflow_core::metadata::scaled_size;
use arcflow_core::test_utils::create_test_tar;
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

proptest! {
    #[test]
    fn prop_scaled_size_unit_matches_magnitude(bytes in 0u64..=1u64 << 40) {
        let (scaled, unit) = scaled_size(bytes);
        match unit {
            "None" => prop_assert_eq!(bytes, 0),
            "Bytes" => {
                prop_assert!(bytes > 0 && bytes < 1024);
                prop_assert_eq!(scaled, bytes);
            }
            "KiB" => prop_assert_eq!(scaled, bytes / 1024),
            "MiB" => prop_assert_eq!(scaled, bytes / (1024 * 1024)),
            "GiB" => prop_assert_eq!(scaled, bytes / (1024 * 1024 * 1024)),
            other => prop_assert!(false, "unexpected unit {}", other),
        }
        // Scaled values stay in presentable range.
        if unit != "GiB" {
            prop_assert!(scaled < 1024);
        }
    }

    #[test]
    fn prop_explicit_filter_is_exact(
        kept in "[a-z]{1,12}\\.txt",
        other in "[a-z]{1,12}\\.txt",
    ) {
        let mut filter = EntryFilter::new();
        filter.add_filter(kept.clone());

        prop_assert!(!filter.evaluate(Path::new(&kept)).is_excluded());
        if other != kept {
            prop_assert!(filter.evaluate(Path::new(&other)).is_excluded());
        }
    }

    #[test]
    fn prop_exclude_always_wins(name in "[a-z]{1,12}\\.log") {
        let mut filter = EntryFilter::new();
        filter.add_include_pattern("*.log").unwrap();
        filter.add_exclude_pattern("*.log").unwrap();
        prop_assert!(filter.evaluate(Path::new(&name)).is_excluded());
    }

    #[test]
    fn prop_base_path_never_escapes(
        base in "[a-z]{1,8}",
        rest in "[a-z]{1,8}(/[a-z]{1,8}){0,3}",
    ) {
        let mut filter = EntryFilter::new();
        filter.set_base_path(base.clone());

        let inside = format!("{base}/{rest}");
        match filter.evaluate(Path::new(&inside)) {
            arcflow_core::filter::FilterDecision::Included(rewritten) => {
                prop_assert_eq!(rewritten, std::path::PathBuf::from(&rest));
            }
            arcflow_core::filter::FilterDecision::Excluded => {
                prop_assert!(false, "entry under base was excluded");
            }
        }

        let outside = format!("not-{base}/{rest}");
        prop_assert!(filter.evaluate(Path::new(&outside)).is_excluded());
    }
}

proptest! {
    // Engine round-trips spawn threads and real archives; keep the
    // case count modest.
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_tar_roundtrip_preserves_contents(
        files in proptest::collection::btree_map(
            "[a-z]{1,10}\\.dat",
            proptest::collection::vec(any::<u8>(), 0..2048),
            1..6,
        ),
    ) {
        let entries: Vec<(&str, &[u8])> = files
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()))
            .collect();
        let archive = create_test_tar(&entries);

        let extractor = Extractor::to_memory();
        extractor.set_archive_bytes(archive);
        extractor.start();

        let output = loop {
            match extractor.events().recv().unwrap() {
                Event::Finished(output) => break output,
                Event::Error(e) => return Err(TestCaseError::fail(e.to_string())),
                _ => {}
            }
        };

        match output {
            Output::Memory(extracted) => {
                prop_assert_eq!(extracted.len(), files.len());
                for file in extracted {
                    let expected = files.get(&file.info.file_name).unwrap();
                    prop_assert_eq!(&file.data, expected);
                }
            }
            other => return Err(TestCaseError::fail(format!("unexpected output {other:?}"))),
        }
    }
}
