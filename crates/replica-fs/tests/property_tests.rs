use proptest::prelude::*;
use replica_fs::NormalizedPath;

proptest! {
    #[test]
    fn test_normalization_has_no_backslashes(s in "\\PC*") {
        let path = NormalizedPath::new(&s);
        prop_assert!(!path.as_str().contains('\\'));

        let roundtripped = NormalizedPath::new(path.to_native());
        prop_assert_eq!(path, roundtripped);
    }

    #[test]
    fn test_join_then_file_name(dir in "[a-z]{1,8}", name in "[a-z0-9_.]{1,12}") {
        prop_assume!(name != "." && name != "..");
        let joined = NormalizedPath::new(&dir).join(&name);
        prop_assert_eq!(joined.file_name(), Some(name.as_str()));
    }
}
