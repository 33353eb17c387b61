use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const STRIPES: &str = r#"
    (
        model: Overlapping(n: 3),
        periodic: true,
        samples: [["aab", "aab", "aab"]],
    )
    "#;

// Two tiles that may sit next to each other in any arrangement.
const FREE: &str = r##"
    (
        model: Adjacent,
        adjacency: [
            ("#", "#", "+x"), ("#", ".", "+x"), (".", "#", "+x"), (".", ".", "+x"),
            ("#", "#", "+y"), ("#", ".", "+y"), (".", "#", "+y"), (".", ".", "+y"),
        ],
    )
    "##;

fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn tessera() -> Command {
    let mut cmd = Command::cargo_bin("tessera-cli").expect("binary should build");
    cmd.env("RUST_LOG", "info");
    cmd
}

fn read_rows(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("output should exist")
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_stripes_run() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "stripes.ron", STRIPES);
    let output_file = tmp_dir.path().join("out.txt");

    tessera()
        .arg("--sample-file")
        .arg(&sample)
        .args(["--width", "6", "--height", "3", "--boundary", "periodic", "--seed", "3"])
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .success()
        .stderr(predicate::str::contains("WFC completed"));

    let rows = read_rows(&output_file);
    assert_eq!(rows.len(), 3);
    for row in &rows {
        assert_eq!(row.len(), 6);
        assert_eq!(row.matches('b').count(), 2, "{row}");
    }
    Ok(())
}

#[test]
fn test_contradiction_fails() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "stripes.ron", STRIPES);
    let output_file = tmp_dir.path().join("out.txt");

    tessera()
        .arg("--sample-file")
        .arg(&sample)
        .args(["--width", "4", "--height", "3", "--boundary", "periodic"])
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Contradiction"));

    assert!(!output_file.exists(), "No output should be written on failure");
    Ok(())
}

#[test]
fn test_missing_sample_file() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    tessera()
        .arg("--sample-file")
        .arg(tmp_dir.path().join("missing.ron"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sample Error"));
    Ok(())
}

#[test]
fn test_config_file_and_environment() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "stripes.ron", STRIPES);
    let config = write_file(
        &tmp_dir,
        "tessera.toml",
        "width = 3\nheight = 2\nboundary = \"Periodic\"\nseed = 9\n",
    );
    let output_file = tmp_dir.path().join("out.txt");

    tessera()
        .env("TESSERA_HEIGHT", "5")
        .arg("--sample-file")
        .arg(&sample)
        .arg("--config-file")
        .arg(&config)
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .success();

    let rows = read_rows(&output_file);
    assert_eq!(rows.len(), 5);
    assert!(rows.iter().all(|row| row.len() == 3));
    Ok(())
}

#[test]
fn test_connected_path_reaches_relevant_cells() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "free.ron", FREE);
    let output_file = tmp_dir.path().join("out.txt");
    let progress_file = tmp_dir.path().join("progress.log");

    tessera()
        .arg("--sample-file")
        .arg(&sample)
        .args(["--width", "4", "--height", "4", "--seed", "21", "--unbounded-backtracking"])
        .args(["--path-tile", "#", "--path-constraint", "connected"])
        .args(["--relevant-cell", "0", "--relevant-cell", "15"])
        .arg("--progress-log-file")
        .arg(&progress_file)
        .arg("--output-path")
        .arg(&output_file)
        .assert()
        .success();

    let cells: Vec<char> = read_rows(&output_file).concat().chars().collect();
    assert_eq!(cells.len(), 16);
    assert_eq!(cells[0], '#');
    assert_eq!(cells[15], '#');

    let mut seen = [false; 16];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    while let Some(cell) = queue.pop_front() {
        let (x, y) = (cell % 4, cell / 4);
        let mut next = Vec::new();
        if x > 0 {
            next.push(cell - 1);
        }
        if x < 3 {
            next.push(cell + 1);
        }
        if y > 0 {
            next.push(cell - 4);
        }
        if y < 3 {
            next.push(cell + 4);
        }
        for n in next {
            if !seen[n] && cells[n] == '#' {
                seen[n] = true;
                queue.push_back(n);
            }
        }
    }
    assert!(seen[15], "corners are not joined: {cells:?}");

    let progress = fs::read_to_string(&progress_file)?;
    assert!(progress.contains("Finished:"), "{progress}");
    Ok(())
}

#[test]
fn test_path_constraint_needs_tiles() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "free.ron", FREE);
    tessera()
        .arg("--sample-file")
        .arg(&sample)
        .args(["--path-constraint", "loop"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("path constraints need at least one path tile"));
    Ok(())
}

#[test]
fn test_terminal_visualization() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let sample = write_file(&tmp_dir, "stripes.ron", STRIPES);
    tessera()
        .arg("--sample-file")
        .arg(&sample)
        .args(["--width", "3", "--height", "2", "--boundary", "periodic"])
        .args(["--visualization-mode", "terminal"])
        .arg("--output-path")
        .arg(tmp_dir.path().join("out.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("--- 3x2x1 ---"));
    Ok(())
}
