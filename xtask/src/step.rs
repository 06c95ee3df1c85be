use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

/// Outcome of a step whose failure is reported but not fatal.
pub enum Soft {
    Passed,
    Failed,
}

/// Run `cargo <args>`, printing a timed pass line. A failure prints the
/// captured stderr and aborts the task.
pub fn cargo(label: &str, args: &[&str]) -> Result<Output> {
    println!("{}", format!("  {label}...").cyan());
    let start = Instant::now();

    let output = Command::new("cargo")
        .args(args)
        .output()
        .with_context(|| format!("Failed to run cargo {}", args.join(" ")))?;

    if !output.status.success() {
        eprintln!("{}", format!("  ✗ {label} failed").red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        eprintln!("{}", String::from_utf8_lossy(&output.stdout));
        anyhow::bail!("{label} failed");
    }

    println!(
        "{}",
        format!(
            "  ✓ {label} passed {}in {:.2}s",
            summary(&output),
            start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    Ok(output)
}

/// Like [`cargo`], but a failure only warns.
pub fn cargo_soft(label: &str, args: &[&str], hint: &str) -> Result<Soft> {
    match cargo(label, args) {
        Ok(_) => Ok(Soft::Passed),
        Err(e) if e.to_string().ends_with("failed") => {
            eprintln!("{}", format!("  ⚠ {hint}").yellow());
            println!();
            Ok(Soft::Failed)
        }
        Err(e) => Err(e),
    }
}

/// `(5 passed; 0 failed; ...)` summed over every test binary in the output,
/// or nothing for non-test commands.
fn summary(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let (mut passed, mut failed, mut seen) = (0u32, 0u32, false);
    // "test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out"
    for line in stdout.lines().filter(|l| l.contains("test result:")) {
        seen = true;
        for part in line.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<u32>() else {
                continue;
            };
            match kind {
                "passed" => passed += count,
                "failed" => failed += count,
                _ => {}
            }
        }
    }
    if seen {
        format!("({passed} passed; {failed} failed) ")
    } else {
        String::new()
    }
}

pub fn banner(text: &str) {
    println!();
    println!("{}", text.cyan().bold());
    println!();
}

pub fn done(what: &str, start: Instant) {
    println!(
        "{}",
        format!("✓ {what} completed in {:.2}s", start.elapsed().as_secs_f64())
            .green()
            .bold()
    );
    println!();
}
