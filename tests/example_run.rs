//! Integration tests for the `example run` command.
use pvcast::cli::RunOpts;
use pvcast::cli::example::handle_example_run_command;
use pvcast::settings::Settings;
use tempfile::tempdir;

/// An integration test for the `example run` command.
#[test]
fn test_handle_example_run_command() {
    unsafe { std::env::set_var("PVCAST_LOG_LEVEL", "off") };

    let output_dir = tempdir().unwrap();
    let opts = RunOpts {
        output_dir: Some(output_dir.path().to_path_buf()),
        overwrite: true,
    };
    handle_example_run_command("simple", &opts, Some(Settings::default())).unwrap();

    assert!(output_dir.path().join("summary.csv").exists());
    assert!(output_dir.path().join("input_1_flat.csv").exists());
    assert!(output_dir.path().join("input_1_growth.csv").exists());
}
