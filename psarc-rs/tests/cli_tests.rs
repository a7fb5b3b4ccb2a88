use std::path::{Path, PathBuf};

use psarc_rs::determine_extract_output;

/// Extract output path inference
mod extract_output_tests {
    use super::*;

    #[test]
    fn test_extract_default_strips_psarc_extension() {
        let input = Path::new("/path/to/songs.psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/path/to/songs"));
    }

    #[test]
    fn test_extract_default_is_case_insensitive() {
        let input = Path::new("/path/to/DLC_P.PSARC");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/path/to/DLC_P"));
    }

    #[test]
    fn test_extract_to_specified_output_not_separate() {
        let input = Path::new("/path/to/songs.psarc");
        let output = determine_extract_output(input, Some(Path::new("/output")), false);
        assert_eq!(output, PathBuf::from("/output"));
    }

    #[test]
    fn test_extract_to_specified_output_with_separate() {
        let input = Path::new("/path/to/songs.psarc");
        let output = determine_extract_output(input, Some(Path::new("/output")), true);
        assert_eq!(output, PathBuf::from("/output/songs"));
    }

    #[test]
    fn test_extract_relative_path() {
        let input = Path::new("songs.psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("songs"));
    }

    #[test]
    fn test_extract_current_dir() {
        let input = Path::new("./songs.psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("./songs"));
    }

    #[test]
    fn test_extract_with_dots_in_name() {
        let input = Path::new("/path/rs1.compat.disc.psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/path/rs1.compat.disc"));
    }
}

/// Path edge cases
mod path_edge_cases {
    use super::*;

    #[test]
    fn test_extract_other_extension_is_stripped() {
        let input = Path::new("/path/to/archive.dat");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/path/to/archive"));
    }

    #[test]
    fn test_extract_without_extension_never_reuses_input() {
        let input = Path::new("/path/to/archive");
        let output = determine_extract_output(input, None, false);
        assert_ne!(output, input);
        assert_eq!(output, PathBuf::from("/path/to/archive.extracted"));
    }

    #[test]
    fn test_extract_unicode_filename() {
        let input = Path::new("/path/曲.psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/path/曲"));
    }

    #[test]
    fn test_extract_spaces_in_path() {
        let input = Path::new("/my path/to songs/my song (v2).psarc");
        let output = determine_extract_output(input, None, false);
        assert_eq!(output, PathBuf::from("/my path/to songs/my song (v2)"));
    }

    #[test]
    fn test_separate_keeps_name_of_non_psarc_input() {
        let input = Path::new("/path/archive.bin");
        let output = determine_extract_output(input, Some(Path::new("out")), true);
        assert_eq!(output, PathBuf::from("out/archive.bin"));
    }
}
