use std::process::Command;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use more_asserts::assert_ge;
use more_asserts::assert_gt;
use more_asserts::assert_lt;
use wlgen::config::Args;
use wlgen::workloads::context::Context;
use wlgen::workloads::params::WorkerKind;

fn run(args: &[&str]) -> Result<wlgen::workloads::context::RunSummary> {
    let argv = std::iter::once("wlgen").chain(args.iter().copied());
    let spec = Args::try_parse_from(argv)?.into_spec();
    Context::from_spec(&spec).run()
}

#[test]
fn test_two_batch_workers_for_one_second() -> Result<()> {
    let summary = run(&["-b", "2", "-d", "1"])?;
    let names: Vec<&str> = summary.reports.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["B001", "B002"]);
    for (_, report) in &summary.reports {
        assert_gt!(report.iterations, 0);
    }
    assert_ge!(summary.elapsed(), Duration::from_secs(1));
    assert_lt!(summary.elapsed(), Duration::from_millis(1500));
    Ok(())
}

#[test]
fn test_interactive_worker_for_two_seconds() -> Result<()> {
    let summary = run(&["-i", "1,1000,500", "-d", "2"])?;
    assert_eq!(summary.reports.len(), 1);
    let (name, report) = &summary.reports[0];
    assert_eq!(name, "I001");
    // Each iteration is at most 1000us of sleep plus 500us of compute.
    assert_gt!(report.iterations, 100);
    assert_ge!(summary.elapsed(), Duration::from_secs(2));
    assert_lt!(summary.elapsed(), Duration::from_millis(2500));
    Ok(())
}

#[test]
fn test_mixed_workers_stop_together() -> Result<()> {
    let summary = run(&["-b", "1", "-p", "2,2000,25", "-y", "1,1000,250", "-d", "1"])?;
    let names: Vec<&str> = summary.reports.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["B001", "P001", "P002", "Y001"]);
    assert_lt!(summary.elapsed(), Duration::from_millis(1500));
    Ok(())
}

#[test]
fn test_invalid_duty_cycle_is_rejected_before_launch() {
    let argv = ["wlgen", "-p", "1,1000,150"];
    assert!(Args::try_parse_from(argv).is_err());
}

#[test]
fn test_spec_counts() -> Result<()> {
    let spec = Args::try_parse_from(["wlgen", "-i", "2,1000,500,2000,100"])?.into_spec();
    assert_eq!(spec.count(WorkerKind::Interactive), 2);
    assert_eq!(spec.total_workers(), 2);
    Ok(())
}

#[test]
fn test_binary_exit_codes() -> Result<()> {
    let bin = env!("CARGO_BIN_EXE_wlgen");

    let output = Command::new(bin).args(["-b", "1", "-d", "1"]).output()?;
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Time: 1."), "unexpected output: {stderr}");

    let output = Command::new(bin).args(["-p", "1,1000,150"]).output()?;
    assert!(!output.status.success());

    let output = Command::new(bin).args(["-y", "1,100,200"]).output()?;
    assert!(!output.status.success());

    let output = Command::new(bin).arg("-h").output()?;
    assert!(output.status.success());
    Ok(())
}
