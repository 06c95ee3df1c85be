use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::{self, banner, done};

pub fn run(open: bool) -> Result<()> {
    banner("📚 Building documentation...");
    let start = Instant::now();

    let mut args = vec!["doc", "--workspace", "--no-deps", "--exclude", "xtask"];
    if open {
        args.push("--open");
    }
    step::cargo("Documentation", &args)?;

    if !open {
        println!(
            "   {}",
            "Open target/doc/comlink/index.html in your browser".dimmed()
        );
        println!("   {}", "Or run 'cargo run -p xtask -- doc --open'".dimmed());
        println!();
    }

    done("Documentation", start);
    Ok(())
}
